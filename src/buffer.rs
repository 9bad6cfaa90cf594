//! Append-only output buffer used while formatting.
//!
//! [`TextBuffer`] starts with a small inline capacity and spills to the heap
//! only when a rendering outgrows it, so formatting short values never
//! allocates. It is a stack-discipline value: create it inside the call that
//! needs it, never let it (or a borrowed view of it) outlive that call.
//!
//! ## Examples
//!
//! ```rust
//! use textform::TextBuffer;
//!
//! let mut out = TextBuffer::new();
//! out.push_str("a,b,c");
//! out.push(',');
//! out.pop(); // trim the trailing delimiter
//! assert_eq!(out.as_str(), "a,b,c");
//! ```

use smallvec::SmallVec;
use std::fmt;

const INLINE_CAPACITY: usize = 128;

/// A growable UTF-8 buffer with inline storage for short renderings.
#[derive(Debug, Default, Clone)]
pub struct TextBuffer {
    bytes: SmallVec<[u8; INLINE_CAPACITY]>,
}

impl TextBuffer {
    #[must_use]
    pub fn new() -> Self {
        TextBuffer {
            bytes: SmallVec::new(),
        }
    }

    /// Appends a single character. Amortized O(1).
    pub fn push(&mut self, ch: char) {
        let mut utf8 = [0u8; 4];
        self.bytes
            .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }

    /// Appends a string slice.
    pub fn push_str(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    /// Appends a value's `Display` rendering.
    pub fn push_display(&mut self, value: &dyn fmt::Display) {
        use fmt::Write as _;
        // the Write impl below never fails
        let _ = write!(self, "{value}");
    }

    /// Removes and returns the last character, if any. Used to trim the
    /// trailing delimiter after building a repeated sequence.
    pub fn pop(&mut self) -> Option<char> {
        let last = self.as_str().chars().next_back()?;
        let new_len = self.bytes.len() - last.len_utf8();
        self.bytes.truncate(new_len);
        Some(last)
    }

    /// Borrows the contents as a string slice without copying.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).expect("TextBuffer only stores complete UTF-8 sequences")
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Empties the buffer, keeping its storage for reuse.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Consumes the buffer, materializing its contents.
    #[must_use]
    pub fn into_string(self) -> String {
        String::from_utf8(self.bytes.into_vec())
            .expect("TextBuffer only stores complete UTF-8 sequences")
    }
}

impl fmt::Write for TextBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        self.push(c);
        Ok(())
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut buffer = TextBuffer::new();
        buffer.push('a');
        buffer.push_str("bc");
        assert_eq!(buffer.as_str(), "abc");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn pop_handles_multibyte() {
        let mut buffer = TextBuffer::new();
        buffer.push_str("x∅");
        assert_eq!(buffer.pop(), Some('∅'));
        assert_eq!(buffer.as_str(), "x");
        assert_eq!(buffer.pop(), Some('x'));
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn grows_past_inline_capacity() {
        let mut buffer = TextBuffer::new();
        let long = "y".repeat(INLINE_CAPACITY * 3);
        buffer.push_str(&long);
        assert_eq!(buffer.as_str(), long);
        assert_eq!(buffer.into_string(), long);
    }

    #[test]
    fn display_rendering() {
        let mut buffer = TextBuffer::new();
        buffer.push_display(&42);
        buffer.push(',');
        buffer.push_display(&true);
        assert_eq!(buffer.as_str(), "42,true");
    }

    #[test]
    fn clear_keeps_working() {
        let mut buffer = TextBuffer::new();
        buffer.push_str("abc");
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.push_str("d");
        assert_eq!(buffer.as_str(), "d");
    }
}
