//! Escape-aware, lazy delimiter splitting.
//!
//! [`Segments`] walks its input exactly once, left to right, and yields raw
//! (still-escaped) segments bounded by unescaped delimiters. A delimiter is
//! a boundary only when preceded by an even run of escape characters; the
//! escaped state toggles on each escape character and resets on anything
//! else, so no backtracking is ever needed.
//!
//! Decoding is a separate concern: segments come out still escaped, and an
//! escape character dangling at the very end of input is *not* an error
//! here. It surfaces later, when [`EscapeCodec::decode`](crate::EscapeCodec::decode)
//! walks the segment.
//!
//! Each call site builds a fresh iterator, so scanning is restartable per
//! call; a single iterator is single-pass.
//!
//! ## Examples
//!
//! ```rust
//! use textform::scan::Segments;
//!
//! let texts: Vec<&str> = Segments::new(r"a|b\|c|", '|', '\\', true)
//!     .map(|segment| segment.text)
//!     .collect();
//! assert_eq!(texts, vec!["a", r"b\|c", ""]);
//! ```

/// A set of characters that end a segment.
///
/// Scanning is the same algorithm for one delimiter or many; only the
/// membership test changes.
pub trait DelimiterSet: Copy {
    fn matches(&self, ch: char) -> bool;
}

impl DelimiterSet for char {
    fn matches(&self, ch: char) -> bool {
        *self == ch
    }
}

impl DelimiterSet for [char; 2] {
    fn matches(&self, ch: char) -> bool {
        self[0] == ch || self[1] == ch
    }
}

impl DelimiterSet for &[char] {
    fn matches(&self, ch: char) -> bool {
        self.contains(&ch)
    }
}

/// One raw segment: its text and the delimiter that ended it (`None` at the
/// end of input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub terminator: Option<char>,
}

impl Segment<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lazy iterator over unescaped-delimiter-bounded segments.
#[derive(Debug, Clone)]
pub struct Segments<'a, D: DelimiterSet> {
    input: &'a str,
    pos: usize,
    delimiters: D,
    escape: char,
    done: bool,
}

impl<'a, D: DelimiterSet> Segments<'a, D> {
    /// Starts a scan over `input`.
    ///
    /// `empty_yields_segment` decides whether an empty input produces one
    /// empty segment or none at all. Composite parsers pick per their
    /// empty-input policy.
    pub fn new(input: &'a str, delimiters: D, escape: char, empty_yields_segment: bool) -> Self {
        Segments {
            input,
            pos: 0,
            delimiters,
            escape,
            done: input.is_empty() && !empty_yields_segment,
        }
    }

    /// The text after the last yielded segment's terminator.
    #[must_use]
    pub fn remainder(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

impl<'a, D: DelimiterSet> Iterator for Segments<'a, D> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.done {
            return None;
        }
        let rest = &self.input[self.pos..];
        let mut escaped = false;
        for (offset, ch) in rest.char_indices() {
            if ch == self.escape {
                escaped = !escaped;
                continue;
            }
            if !escaped && self.delimiters.matches(ch) {
                self.pos += offset + ch.len_utf8();
                return Some(Segment {
                    text: &rest[..offset],
                    terminator: Some(ch),
                });
            }
            escaped = false;
        }
        self.done = true;
        self.pos = self.input.len();
        Some(Segment {
            text: rest,
            terminator: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        Segments::new(input, '|', '\\', true)
            .map(|segment| segment.text)
            .collect()
    }

    #[test]
    fn plain_split() {
        assert_eq!(texts("a|b|c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn escaped_delimiter_is_not_a_boundary() {
        assert_eq!(texts(r"a\|b|c"), vec![r"a\|b", "c"]);
    }

    #[test]
    fn even_escape_run_keeps_the_boundary() {
        // "a\\|b": the backslash is escaped, the pipe is not
        assert_eq!(texts(r"a\\|b"), vec![r"a\\", "b"]);
        // odd run of three escapes the pipe again
        assert_eq!(texts(r"a\\\|b"), vec![r"a\\\|b"]);
    }

    #[test]
    fn leading_and_trailing_delimiters_yield_empty_segments() {
        assert_eq!(texts("|a|"), vec!["", "a", ""]);
        assert_eq!(texts("||"), vec!["", "", ""]);
    }

    #[test]
    fn empty_input_policy() {
        assert_eq!(texts(""), vec![""]);
        let none: Vec<Segment<'_>> = Segments::new("", '|', '\\', false).collect();
        assert!(none.is_empty());
    }

    #[test]
    fn dangling_escape_is_not_an_error_here() {
        assert_eq!(texts(r"ab\"), vec![r"ab\"]);
    }

    #[test]
    fn terminators_and_remainder() {
        let mut segments = Segments::new("a,b)rest", [',', ')'], '\\', true);
        let first = segments.next().unwrap();
        assert_eq!((first.text, first.terminator), ("a", Some(',')));
        let second = segments.next().unwrap();
        assert_eq!((second.text, second.terminator), ("b", Some(')')));
        assert_eq!(segments.remainder(), "rest");
    }

    #[test]
    fn arbitrary_delimiter_set() {
        let delimiters: &[char] = &[',', ';', ':'];
        let parts: Vec<&str> = Segments::new("a,b;c:d", delimiters, '\\', true)
            .map(|segment| segment.text)
            .collect();
        assert_eq!(parts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn restartable_per_call() {
        let input = "a|b";
        assert_eq!(texts(input), vec!["a", "b"]);
        assert_eq!(texts(input), vec!["a", "b"]);
    }
}
