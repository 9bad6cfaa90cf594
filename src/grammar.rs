//! Grammar configuration: the special characters governing each composite
//! kind's text representation.
//!
//! Every composite kind is driven by a small set of characters: a delimiter,
//! a null marker, an escape character, and optional start/end borders. The
//! characters of one grammar must be pairwise distinct (the two borders may
//! be equal); a violation is a [`ConfigurationError`] raised when the grammar
//! is constructed, never later during parsing.
//!
//! ## Defaults
//!
//! | Kind | Delimiter | Null | Escape | Borders |
//! |---|---|---|---|---|
//! | Tuples | `,` | `∅` | `\` | `(` `)` |
//! | Sequences | `\|` | `∅` | `\` | — |
//! | Maps | `;` (pairs), `=` (key/value) | `∅` | `\` | — |
//!
//! ## Examples
//!
//! ```rust
//! use textform::{Grammar, GrammarConfig, TransformerRegistry};
//!
//! let tuples = Grammar::new(';', '∅', '\\')?.with_borders('(', ')')?;
//! let config = GrammarConfig::default().with_tuple(tuples);
//!
//! let registry = TransformerRegistry::with_config(config);
//! let (city, zip): (String, u32) = registry.parse("(Wrocław;52200)")?;
//! assert_eq!(city, "Wrocław");
//! assert_eq!(zip, 52200);
//! # Ok::<(), textform::Error>(())
//! ```

use crate::error::ConfigurationError;
use smallvec::SmallVec;

/// The special characters for one single-delimiter composite kind
/// (tuples, sequences, fixed-length arrays).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    delimiter: char,
    null_marker: char,
    escape: char,
    start: Option<char>,
    end: Option<char>,
}

impl Grammar {
    /// Creates a borderless grammar, validating that the three characters
    /// are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::GrammarConflict`] when two characters
    /// collide.
    pub fn new(
        delimiter: char,
        null_marker: char,
        escape: char,
    ) -> Result<Self, ConfigurationError> {
        let grammar = Grammar {
            delimiter,
            null_marker,
            escape,
            start: None,
            end: None,
        };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Adds start and end borders. The two borders may be equal, but neither
    /// may collide with any other grammar character.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::GrammarConflict`] when a border collides
    /// with another grammar character.
    pub fn with_borders(mut self, start: char, end: char) -> Result<Self, ConfigurationError> {
        self.start = Some(start);
        self.end = Some(end);
        self.validate()?;
        Ok(self)
    }

    pub(crate) const fn new_unchecked(
        delimiter: char,
        null_marker: char,
        escape: char,
        start: Option<char>,
        end: Option<char>,
    ) -> Self {
        Grammar {
            delimiter,
            null_marker,
            escape,
            start,
            end,
        }
    }

    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    #[must_use]
    pub fn null_marker(&self) -> char {
        self.null_marker
    }

    #[must_use]
    pub fn escape(&self) -> char {
        self.escape
    }

    #[must_use]
    pub fn start(&self) -> Option<char> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<char> {
        self.end
    }

    /// Every character that must be escaped inside element text.
    pub(crate) fn specials(&self) -> SmallVec<[char; 6]> {
        let mut specials: SmallVec<[char; 6]> =
            SmallVec::from_slice(&[self.escape, self.null_marker, self.delimiter]);
        specials.extend(self.start);
        specials.extend(self.end);
        specials
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let mut chars: SmallVec<[char; 5]> =
            SmallVec::from_slice(&[self.delimiter, self.null_marker, self.escape]);
        chars.extend(self.start);
        if self.end != self.start {
            chars.extend(self.end);
        }
        distinct(&chars)
    }
}

/// The special characters for map-like kinds, which carry two delimiters:
/// one between entries and one between a key and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapGrammar {
    pair_delimiter: char,
    key_value_delimiter: char,
    null_marker: char,
    escape: char,
    start: Option<char>,
    end: Option<char>,
}

impl MapGrammar {
    /// Creates a borderless map grammar, validating distinctness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::GrammarConflict`] when two characters
    /// collide.
    pub fn new(
        pair_delimiter: char,
        key_value_delimiter: char,
        null_marker: char,
        escape: char,
    ) -> Result<Self, ConfigurationError> {
        let grammar = MapGrammar {
            pair_delimiter,
            key_value_delimiter,
            null_marker,
            escape,
            start: None,
            end: None,
        };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Adds start and end borders, revalidating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::GrammarConflict`] when a border collides
    /// with another grammar character.
    pub fn with_borders(mut self, start: char, end: char) -> Result<Self, ConfigurationError> {
        self.start = Some(start);
        self.end = Some(end);
        self.validate()?;
        Ok(self)
    }

    pub(crate) const fn new_unchecked(
        pair_delimiter: char,
        key_value_delimiter: char,
        null_marker: char,
        escape: char,
    ) -> Self {
        MapGrammar {
            pair_delimiter,
            key_value_delimiter,
            null_marker,
            escape,
            start: None,
            end: None,
        }
    }

    #[must_use]
    pub fn pair_delimiter(&self) -> char {
        self.pair_delimiter
    }

    #[must_use]
    pub fn key_value_delimiter(&self) -> char {
        self.key_value_delimiter
    }

    #[must_use]
    pub fn null_marker(&self) -> char {
        self.null_marker
    }

    #[must_use]
    pub fn escape(&self) -> char {
        self.escape
    }

    #[must_use]
    pub fn start(&self) -> Option<char> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<char> {
        self.end
    }

    pub(crate) fn specials(&self) -> SmallVec<[char; 6]> {
        let mut specials: SmallVec<[char; 6]> = SmallVec::from_slice(&[
            self.escape,
            self.null_marker,
            self.pair_delimiter,
            self.key_value_delimiter,
        ]);
        specials.extend(self.start);
        specials.extend(self.end);
        specials
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let mut chars: SmallVec<[char; 6]> = SmallVec::from_slice(&[
            self.pair_delimiter,
            self.key_value_delimiter,
            self.null_marker,
            self.escape,
        ]);
        chars.extend(self.start);
        if self.end != self.start {
            chars.extend(self.end);
        }
        distinct(&chars)
    }
}

fn distinct(chars: &[char]) -> Result<(), ConfigurationError> {
    for (i, &ch) in chars.iter().enumerate() {
        if chars[i + 1..].contains(&ch) {
            return Err(ConfigurationError::GrammarConflict { ch });
        }
    }
    Ok(())
}

/// The full per-kind grammar configuration consumed by a
/// [`TransformerRegistry`](crate::TransformerRegistry).
///
/// Construct with [`GrammarConfig::default`] and override individual kinds
/// with the `with_*` methods.
///
/// # Examples
///
/// ```rust
/// use textform::{Grammar, GrammarConfig};
///
/// let config = GrammarConfig::default()
///     .with_sequence(Grammar::new(',', '␀', '\\')?)
///     .with_empty_sequence_as_single_element(true);
/// # Ok::<(), textform::ConfigurationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GrammarConfig {
    tuple: Grammar,
    sequence: Grammar,
    map: MapGrammar,
    null_marker: char,
    empty_sequence_is_element: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            tuple: Grammar::new_unchecked(',', '∅', '\\', Some('('), Some(')')),
            sequence: Grammar::new_unchecked('|', '∅', '\\', None, None),
            map: MapGrammar::new_unchecked(';', '=', '∅', '\\'),
            null_marker: '∅',
            empty_sequence_is_element: false,
        }
    }
}

impl GrammarConfig {
    /// Overrides the grammar used by tuples.
    #[must_use]
    pub fn with_tuple(mut self, grammar: Grammar) -> Self {
        self.tuple = grammar;
        self
    }

    /// Overrides the grammar used by sequences and fixed-length arrays.
    #[must_use]
    pub fn with_sequence(mut self, grammar: Grammar) -> Self {
        self.sequence = grammar;
        self
    }

    /// Overrides the grammar used by maps and key/value pairs.
    #[must_use]
    pub fn with_map(mut self, grammar: MapGrammar) -> Self {
        self.map = grammar;
        self
    }

    /// Overrides the marker a top-level null renders as.
    #[must_use]
    pub fn with_null_marker(mut self, marker: char) -> Self {
        self.null_marker = marker;
        self
    }

    /// Controls the empty-input disambiguation for sequences.
    ///
    /// By default an empty input parses to an empty collection. With this
    /// flag set it parses to a one-element collection holding an empty
    /// value instead. The two readings are mutually exclusive; pick the one
    /// your data needs.
    #[must_use]
    pub fn with_empty_sequence_as_single_element(mut self, flag: bool) -> Self {
        self.empty_sequence_is_element = flag;
        self
    }

    #[must_use]
    pub fn tuple(&self) -> &Grammar {
        &self.tuple
    }

    #[must_use]
    pub fn sequence(&self) -> &Grammar {
        &self.sequence
    }

    #[must_use]
    pub fn map(&self) -> &MapGrammar {
        &self.map
    }

    #[must_use]
    pub fn null_marker(&self) -> char {
        self.null_marker
    }

    #[must_use]
    pub fn empty_sequence_is_element(&self) -> bool {
        self.empty_sequence_is_element
    }
}
