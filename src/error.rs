//! Error types for parsing, formatting, and registry configuration.
//!
//! Errors fall into three families, mirroring where they can arise:
//!
//! - [`FormatError`]: the input text does not match the composite grammar
//!   (bad escapes, wrong arity, missing borders, malformed key/value tokens)
//! - [`Error::Overflow`]: a leaf value parsed cleanly but is out of range for
//!   the target type
//! - [`ConfigurationError`]: the registry or a grammar is misconfigured;
//!   these surface at first resolution of a type, never during a later parse
//!
//! No layer catches and re-wraps a child error: a failure deep inside a
//! nested composite propagates with its original kind and message intact, so
//! the reported error always names the specific failing fragment.
//!
//! ## Examples
//!
//! ```rust
//! use textform::{Error, TransformerRegistry};
//!
//! let registry = TransformerRegistry::new();
//! let result: Result<(String, u32), Error> = registry.parse("(Wrocław)");
//!
//! let err = result.unwrap_err();
//! assert_eq!(err.to_string(), "2nd element was not found after 'Wrocław'");
//! assert!(err.is_format());
//! ```

use thiserror::Error;

/// An input-text error: the text does not match the configured grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The escape character was the last character of a segment.
    #[error("unfinished escape sequence at end of '{segment}'")]
    UnfinishedEscape { segment: String },

    /// The escape character was followed by a character that is not part of
    /// the active special-character set.
    #[error("illegal escape sequence: '{ch}' cannot follow the escape character")]
    IllegalEscape { ch: char },

    /// A fixed-arity composite ended before all elements were read.
    #[error("{} element was not found after '{after}'", self::ordinal(.ordinal))]
    ElementNotFound { ordinal: usize, after: String },

    /// A fixed-arity composite contained extra elements.
    #[error("cannot have more than {arity} elements: '{extra}'")]
    TooManyElements { arity: usize, extra: String },

    /// A configured border character was missing or did not match.
    #[error("expected {} border '{border}' in '{input}'", side(.at_start))]
    BorderMismatch {
        border: char,
        at_start: bool,
        input: String,
    },

    /// Characters followed the closing border.
    #[error("unexpected characters after the closing border: '{text}'")]
    TrailingCharacters { text: String },

    /// A map token did not split into exactly one key and one value.
    #[error("'{token}' does not split into exactly one key and one value")]
    KeyValuePair { token: String },

    /// A map key decoded to the null marker.
    #[error("map keys cannot be the null marker")]
    NullKey,

    /// The null marker was used where the target type cannot express it.
    #[error("{type_name} does not accept the null marker")]
    UnexpectedNull { type_name: &'static str },

    /// A leaf value could not be parsed at all (not an overflow).
    #[error("cannot parse '{input}' as {type_name}")]
    InvalidValue {
        type_name: &'static str,
        input: String,
    },
}

impl FormatError {
    pub fn unfinished_escape(segment: &str) -> Self {
        FormatError::UnfinishedEscape {
            segment: segment.to_string(),
        }
    }

    pub fn illegal_escape(ch: char) -> Self {
        FormatError::IllegalEscape { ch }
    }

    /// Missing element in a fixed-arity composite; `ordinal` is 1-based.
    pub fn element_not_found(ordinal: usize, after: &str) -> Self {
        FormatError::ElementNotFound {
            ordinal,
            after: after.to_string(),
        }
    }

    pub fn too_many_elements(arity: usize, extra: &str) -> Self {
        FormatError::TooManyElements {
            arity,
            extra: extra.to_string(),
        }
    }

    pub fn border_mismatch(border: char, at_start: bool, input: &str) -> Self {
        FormatError::BorderMismatch {
            border,
            at_start,
            input: input.to_string(),
        }
    }

    pub fn trailing_characters(text: &str) -> Self {
        FormatError::TrailingCharacters {
            text: text.to_string(),
        }
    }

    pub fn key_value_pair(token: &str) -> Self {
        FormatError::KeyValuePair {
            token: token.to_string(),
        }
    }
}

/// A registry or grammar misconfiguration.
///
/// These are raised when a grammar is constructed or when a type is first
/// resolved, never while parsing individual elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Two grammar characters collide.
    #[error("grammar characters must be pairwise distinct: '{ch}' is used more than once")]
    GrammarConflict { ch: char },

    /// Two providers were registered with the same priority.
    #[error("provider priority {priority} is already registered")]
    DuplicatePriority { priority: u16 },

    /// No provider in the chain can build a transformer for the type.
    #[error("no transformer capability can handle {type_name}")]
    NotSupported { type_name: &'static str },

    /// Resolution recursed past the nesting ceiling (a self-referential
    /// type graph).
    #[error("resolving {type_name} exceeded the nesting limit of {limit}")]
    RecursionLimit {
        type_name: &'static str,
        limit: usize,
    },

    /// A provider produced a transformer for a different type than requested.
    #[error("provider '{provider}' produced a transformer of the wrong type for {type_name}")]
    ProviderMismatch {
        type_name: &'static str,
        provider: &'static str,
    },
}

/// Any error this crate can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A leaf value parsed as a number but does not fit the target type.
    #[error("value '{input}' is out of range for {type_name}")]
    Overflow {
        type_name: &'static str,
        input: String,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl Error {
    /// Creates the error for a leaf value that cannot be parsed as `T`.
    pub fn invalid_value<T>(input: &str) -> Self {
        FormatError::InvalidValue {
            type_name: std::any::type_name::<T>(),
            input: input.to_string(),
        }
        .into()
    }

    /// Creates the error for a numeric value out of range for `T`.
    pub fn overflow<T>(input: &str) -> Self {
        Error::Overflow {
            type_name: std::any::type_name::<T>(),
            input: input.to_string(),
        }
    }

    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    #[must_use]
    pub fn is_overflow(&self) -> bool {
        matches!(self, Error::Overflow { .. })
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn ordinal(n: &usize) -> String {
    let n = *n;
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn side(at_start: &bool) -> &'static str {
    if *at_start {
        "opening"
    } else {
        "closing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(&1), "1st");
        assert_eq!(ordinal(&2), "2nd");
        assert_eq!(ordinal(&3), "3rd");
        assert_eq!(ordinal(&4), "4th");
        assert_eq!(ordinal(&11), "11th");
        assert_eq!(ordinal(&12), "12th");
        assert_eq!(ordinal(&13), "13th");
        assert_eq!(ordinal(&21), "21st");
        assert_eq!(ordinal(&103), "103rd");
    }

    #[test]
    fn arity_messages() {
        let err = FormatError::element_not_found(2, "Wrocław");
        assert_eq!(err.to_string(), "2nd element was not found after 'Wrocław'");

        let err = FormatError::too_many_elements(3, "d");
        assert_eq!(err.to_string(), "cannot have more than 3 elements: 'd'");
    }

    #[test]
    fn error_families() {
        let format: Error = FormatError::NullKey.into();
        assert!(format.is_format());
        assert!(!format.is_overflow());

        let overflow = Error::overflow::<u8>("300");
        assert!(overflow.is_overflow());
        assert_eq!(overflow.to_string(), "value '300' is out of range for u8");

        let config: Error = ConfigurationError::DuplicatePriority { priority: 30 }.into();
        assert!(config.is_configuration());
    }

    #[test]
    fn transparent_display() {
        let err: Error = FormatError::illegal_escape('x').into();
        assert_eq!(
            err.to_string(),
            "illegal escape sequence: 'x' cannot follow the escape character"
        );
    }

    #[test]
    fn border_messages() {
        let err = FormatError::border_mismatch('(', true, "1,2)");
        assert_eq!(err.to_string(), "expected opening border '(' in '1,2)'");

        let err = FormatError::border_mismatch(')', false, "(1,2");
        assert_eq!(err.to_string(), "expected closing border ')' in '(1,2'");
    }
}
