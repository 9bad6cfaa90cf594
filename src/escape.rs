//! Bidirectional character escaping for a configured special-character set.
//!
//! [`EscapeCodec`] owns the active special set of one composite kind: its
//! escape character, null marker, delimiter(s), and borders. Encoding
//! prefixes the escape character before every special character in a value's
//! rendered text; decoding reverses it, and additionally recognizes a bare
//! (unescaped) null marker as [`Decoded::Null`] — the "no value" result,
//! distinct from an empty string. An *escaped* null marker decodes to the
//! literal marker character and is handed to the element parser unchanged.
//!
//! Both directions avoid allocation when nothing needs (un)escaping:
//! `encode` returns `Cow::Borrowed` for clean text, and `decode` borrows
//! segments that contain no escape character.
//!
//! Law: `decode(encode(s))` yields `s` for every `s`, and `encode(s) == s`
//! whenever `s` contains none of the special characters.
//!
//! ## Examples
//!
//! ```rust
//! use textform::{Decoded, EscapeCodec};
//!
//! let codec = EscapeCodec::new('\\', '∅', &['|']);
//!
//! assert_eq!(codec.encode("a|b"), r"a\|b");
//! assert_eq!(codec.decode(r"a\|b")?, Decoded::Text("a|b".into()));
//! assert_eq!(codec.decode("∅")?, Decoded::Null);
//! assert_eq!(codec.decode(r"\∅")?, Decoded::Text("∅".into()));
//! # Ok::<(), textform::FormatError>(())
//! ```

use crate::buffer::TextBuffer;
use crate::error::FormatError;
use crate::grammar::{Grammar, MapGrammar};
use smallvec::SmallVec;
use std::borrow::Cow;

/// The result of decoding one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// The segment was exactly the unescaped null marker.
    Null,
    /// The decoded text; borrowed when no escape was present.
    Text(Cow<'a, str>),
}

/// Escaping/unescaping for one composite kind's special-character set.
#[derive(Debug, Clone)]
pub struct EscapeCodec {
    escape: char,
    null_marker: char,
    specials: SmallVec<[char; 6]>,
}

impl EscapeCodec {
    /// Creates a codec for `escape`, `null_marker`, and any further special
    /// characters (delimiters, borders). The escape character and null
    /// marker are always part of the special set.
    pub fn new(escape: char, null_marker: char, others: &[char]) -> Self {
        let mut specials: SmallVec<[char; 6]> = SmallVec::from_slice(&[escape, null_marker]);
        for &ch in others {
            if !specials.contains(&ch) {
                specials.push(ch);
            }
        }
        EscapeCodec {
            escape,
            null_marker,
            specials,
        }
    }

    pub(crate) fn for_grammar(grammar: &Grammar) -> Self {
        EscapeCodec {
            escape: grammar.escape(),
            null_marker: grammar.null_marker(),
            specials: grammar.specials(),
        }
    }

    pub(crate) fn for_map_grammar(grammar: &MapGrammar) -> Self {
        EscapeCodec {
            escape: grammar.escape(),
            null_marker: grammar.null_marker(),
            specials: grammar.specials(),
        }
    }

    #[must_use]
    pub fn null_marker(&self) -> char {
        self.null_marker
    }

    fn is_special(&self, ch: char) -> bool {
        self.specials.contains(&ch)
    }

    /// Decodes one raw segment.
    ///
    /// # Errors
    ///
    /// [`FormatError::IllegalEscape`] when the escape character precedes a
    /// character outside the special set; [`FormatError::UnfinishedEscape`]
    /// when it is the last character of the segment.
    pub fn decode<'a>(&self, segment: &'a str) -> Result<Decoded<'a>, FormatError> {
        if !segment.contains(self.escape) {
            if is_exactly(segment, self.null_marker) {
                return Ok(Decoded::Null);
            }
            return Ok(Decoded::Text(Cow::Borrowed(segment)));
        }

        let mut decoded = String::with_capacity(segment.len());
        let mut chars = segment.chars();
        while let Some(ch) = chars.next() {
            if ch != self.escape {
                decoded.push(ch);
                continue;
            }
            match chars.next() {
                Some(escaped) if self.is_special(escaped) => decoded.push(escaped),
                Some(escaped) => return Err(FormatError::illegal_escape(escaped)),
                None => return Err(FormatError::unfinished_escape(segment)),
            }
        }
        Ok(Decoded::Text(Cow::Owned(decoded)))
    }

    /// Escapes every special character in `text`, borrowing when none occur.
    #[must_use]
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.chars().any(|ch| self.is_special(ch)) {
            return Cow::Borrowed(text);
        }
        let mut encoded = String::with_capacity(text.len() + 2);
        for ch in text.chars() {
            if self.is_special(ch) {
                encoded.push(self.escape);
            }
            encoded.push(ch);
        }
        Cow::Owned(encoded)
    }

    /// Escapes `text` directly into an output buffer.
    pub fn encode_into(&self, text: &str, out: &mut TextBuffer) {
        for ch in text.chars() {
            if self.is_special(ch) {
                out.push(self.escape);
            }
            out.push(ch);
        }
    }
}

pub(crate) fn is_exactly(text: &str, ch: char) -> bool {
    text.len() == ch.len_utf8() && text.starts_with(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> EscapeCodec {
        EscapeCodec::new('\\', '∅', &['|'])
    }

    fn text(decoded: Decoded<'_>) -> String {
        match decoded {
            Decoded::Text(cow) => cow.into_owned(),
            Decoded::Null => panic!("expected text, got null"),
        }
    }

    #[test]
    fn clean_text_is_borrowed() {
        let decoded = codec().decode("plain").unwrap();
        assert!(matches!(decoded, Decoded::Text(Cow::Borrowed("plain"))));

        let encoded = codec().encode("plain");
        assert!(matches!(encoded, Cow::Borrowed("plain")));
    }

    #[test]
    fn bare_marker_is_null_escaped_marker_is_literal() {
        assert_eq!(codec().decode("∅").unwrap(), Decoded::Null);
        assert_eq!(text(codec().decode(r"\∅").unwrap()), "∅");
        // a marker inside longer text is just a character
        assert_eq!(text(codec().decode("x∅y").unwrap()), "x∅y");
    }

    #[test]
    fn round_trip_through_encode() {
        let original = r"a|b\c∅d";
        let encoded = codec().encode(original);
        assert_eq!(encoded, r"a\|b\\c\∅d");
        assert_eq!(text(codec().decode(&encoded).unwrap()), original);
    }

    #[test]
    fn illegal_escape_names_the_character() {
        let err = codec().decode(r"a\xb").unwrap_err();
        assert_eq!(err, FormatError::illegal_escape('x'));
    }

    #[test]
    fn unfinished_escape() {
        let err = codec().decode(r"ab\").unwrap_err();
        assert_eq!(err, FormatError::unfinished_escape(r"ab\"));
    }

    #[test]
    fn encode_into_buffer() {
        let mut out = TextBuffer::new();
        codec().encode_into("a|b", &mut out);
        assert_eq!(out.as_str(), r"a\|b");
    }

    #[test]
    fn empty_segment_is_empty_text() {
        assert_eq!(text(codec().decode("").unwrap()), "");
    }
}
