//! # textform
//!
//! Compact escaped-text parsing and formatting for plain Rust values.
//!
//! ## What is the format?
//!
//! A value renders as short delimited text: tuples as `(1,2)`, sequences as
//! `1|2|3`, maps as `key=value;key=value`, a missing value as a single null
//! marker (`∅` by default). Every special character can appear inside
//! element text by escaping it, so the format round-trips arbitrary strings
//! without quoting. The same grammar drives both directions: what `format`
//! writes, `parse` reads back.
//!
//! ## Key Features
//!
//! - **Round-trip by construction**: formatting escapes exactly what parsing
//!   unescapes, layer by layer through nested composites
//! - **Single-pass parsing**: one left-to-right scan per composite, no
//!   backtracking, segments borrowed from the input wherever possible
//! - **Pluggable**: leaf transformers, whole providers, and every grammar
//!   character can be replaced per registry
//! - **Null-aware**: `Option` and the null marker are routed out of band, so
//!   an escaped marker stays ordinary text
//! - **No Unsafe Code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use textform::TransformerRegistry;
//!
//! let registry = TransformerRegistry::new();
//!
//! let values: Vec<Option<String>> = registry.parse("B|∅|A|∅")?;
//! assert_eq!(values, vec![Some("B".into()), None, Some("A".into()), None]);
//!
//! assert_eq!(registry.format(&values)?, "B|∅|A|∅");
//! # Ok::<(), textform::Error>(())
//! ```
//!
//! ### Nesting
//!
//! Composites nest freely; each layer escapes its children's text with its
//! own special characters:
//!
//! ```rust
//! use indexmap::IndexMap;
//! use textform::TransformerRegistry;
//!
//! let registry = TransformerRegistry::new();
//!
//! let map: IndexMap<String, (i32, i32)> = registry.parse("alpha=(1,2);beta=(3,4)")?;
//! assert_eq!(map["beta"], (3, 4));
//! assert_eq!(registry.format(&map)?, "alpha=(1,2);beta=(3,4)");
//! # Ok::<(), textform::Error>(())
//! ```
//!
//! ### Escaping
//!
//! ```rust
//! use textform::TransformerRegistry;
//!
//! let registry = TransformerRegistry::new();
//!
//! let rendered = registry.format(&vec!["a|b".to_string(), "c".to_string()])?;
//! assert_eq!(rendered, r"a\|b|c");
//!
//! let back: Vec<String> = registry.parse(&rendered)?;
//! assert_eq!(back, vec!["a|b", "c"]);
//! # Ok::<(), textform::Error>(())
//! ```
//!
//! ### Custom grammars
//!
//! ```rust
//! use textform::{Grammar, GrammarConfig, TransformerRegistry};
//!
//! let config = GrammarConfig::default().with_sequence(Grammar::new(',', '∅', '\\')?);
//! let registry = TransformerRegistry::with_config(config);
//!
//! assert_eq!(registry.format(&vec![1, 2, 3])?, "1,2,3");
//! # Ok::<(), textform::Error>(())
//! ```
//!
//! ### Errors
//!
//! Errors carry the specific failing fragment, however deeply nested:
//!
//! ```rust
//! use textform::TransformerRegistry;
//!
//! let registry = TransformerRegistry::new();
//! let err = registry.parse::<(String, u32)>("(Wrocław)").unwrap_err();
//! assert_eq!(err.to_string(), "2nd element was not found after 'Wrocław'");
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - No panics in public API (except for logic errors that indicate bugs)

#![forbid(unsafe_code)]

pub mod buffer;
pub mod composite;
pub mod error;
pub mod escape;
pub mod grammar;
mod macros;
pub mod registry;
pub mod scan;
pub mod shape;
pub mod transformer;

pub use buffer::TextBuffer;
pub use composite::{KeyValue, OptionalTransformer, PairTransformer};
pub use error::{ConfigurationError, Error, FormatError, Result};
pub use escape::{Decoded, EscapeCodec};
pub use grammar::{Grammar, GrammarConfig, MapGrammar};
pub use registry::{Provider, RegistryBuilder, Request, ResolveContext, TransformerRegistry};
pub use scan::{DelimiterSet, Segment, Segments};
pub use shape::{Shape, Shaped};
pub use transformer::{FromStrTransformer, SharedTransformer, Transformer};

use std::sync::OnceLock;

fn default_registry() -> &'static TransformerRegistry {
    static REGISTRY: OnceLock<TransformerRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TransformerRegistry::new)
}

/// Parse text into any `T: Shaped` using the default grammar.
///
/// Convenience for one-off calls; for a custom grammar, or to keep resolved
/// transformers together with their configuration, hold a
/// [`TransformerRegistry`] instead.
///
/// # Examples
///
/// ```rust
/// let point: (i32, i32) = textform::from_text("(3,-4)")?;
/// assert_eq!(point, (3, -4));
/// # Ok::<(), textform::Error>(())
/// ```
///
/// # Errors
///
/// Returns an error when the text does not match the grammar or a leaf value
/// cannot be parsed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_text<T: Shaped + 'static>(input: &str) -> Result<T> {
    default_registry().parse(input)
}

/// Format any `T: Shaped` to text using the default grammar.
///
/// # Examples
///
/// ```rust
/// assert_eq!(textform::to_text(&(3, -4))?, "(3,-4)");
/// # Ok::<(), textform::Error>(())
/// ```
///
/// # Errors
///
/// Returns an error when no transformer can be resolved for `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text<T: Shaped + 'static>(value: &T) -> Result<String> {
    default_registry().format(value)
}
