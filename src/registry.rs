//! The transformer registry: a priority-ordered provider chain with a
//! per-type memo.
//!
//! Resolution asks each provider, in ascending priority order, whether it can
//! handle the requested type's [`Shape`]; the first taker builds the
//! transformer. Built transformers are cached by `TypeId`, so every
//! resolution of a type after the first is a map lookup and an `Arc` clone.
//! Under concurrent first resolutions of the same type the first insert
//! wins; the losing builds are discarded, which is harmless because
//! transformers are stateless.
//!
//! The default chain, lowest priority first:
//!
//! | Priority | Provider |
//! |---|---|
//! | 10 | registered leaf transformers |
//! | 20 | enumerations |
//! | 30 | optionals |
//! | 40 | key/value pairs |
//! | 50 | maps |
//! | 60 | fixed-length sequences |
//! | 70 | collections |
//! | 80 | tuples |
//! | 90 | catch-all (`FromStr`/`Display` fallback) |
//!
//! Custom providers slot in at any unused priority via
//! [`RegistryBuilder::with_provider`]; a lower number beats the built-ins.
//!
//! ## Examples
//!
//! ```rust
//! use textform::TransformerRegistry;
//!
//! let registry = TransformerRegistry::new();
//!
//! let values: Vec<Option<String>> = registry.parse("B|∅|A|∅")?;
//! assert_eq!(
//!     values,
//!     vec![Some("B".into()), None, Some("A".into()), None]
//! );
//! assert_eq!(registry.format(&values)?, "B|∅|A|∅");
//! # Ok::<(), textform::Error>(())
//! ```

use crate::buffer::TextBuffer;
use crate::error::{ConfigurationError, Result};
use crate::escape::is_exactly;
use crate::grammar::GrammarConfig;
use crate::shape::{erase, ErasedTransformer, Shape, Shaped};
use crate::transformer::{
    BoolTransformer, CharTransformer, DateTimeTransformer, DateTransformer, FromStrTransformer,
    NumberTransformer, SharedTransformer, StringTransformer, TimeTransformer, Transformer,
    UtcDateTimeTransformer,
};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Priority of the built-in leaf provider.
pub const LEAF_PRIORITY: u16 = 10;
/// Priority of the built-in enumeration provider.
pub const ENUMERATION_PRIORITY: u16 = 20;
/// Priority of the built-in optional provider.
pub const OPTIONAL_PRIORITY: u16 = 30;
/// Priority of the built-in key/value pair provider.
pub const PAIR_PRIORITY: u16 = 40;
/// Priority of the built-in map provider.
pub const MAP_PRIORITY: u16 = 50;
/// Priority of the built-in fixed-length sequence provider.
pub const FIXED_SEQUENCE_PRIORITY: u16 = 60;
/// Priority of the built-in collection provider.
pub const COLLECTION_PRIORITY: u16 = 70;
/// Priority of the built-in tuple provider.
pub const TUPLE_PRIORITY: u16 = 80;
/// Priority of the built-in catch-all provider; it always matches, so
/// nothing above it is ever consulted.
pub const CATCH_ALL_PRIORITY: u16 = 90;

/// Nesting ceiling for one resolution. Deeper graphs than this are
/// self-referential in practice and would otherwise recurse forever.
const MAX_RESOLVE_DEPTH: usize = 64;

/// One resolution request, as seen by a [`Provider`].
#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub shape: Shape,
}

/// A transformer source in the registry's chain.
///
/// `can_handle` must be cheap and side-effect free; `create` may resolve
/// component transformers through the [`ResolveContext`].
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, request: &Request) -> bool;

    fn create(&self, request: &Request, ctx: &ResolveContext<'_>) -> Result<ErasedTransformer>;
}

/// Resolution state threaded through composite factories: the registry to
/// resolve components against, plus the current nesting depth.
pub struct ResolveContext<'a> {
    registry: &'a TransformerRegistry,
    depth: usize,
}

impl ResolveContext<'_> {
    /// Resolves a component transformer, one nesting level deeper.
    pub fn resolve<T: Shaped + 'static>(&self) -> Result<SharedTransformer<T>> {
        self.registry.resolve_at::<T>(self.depth + 1)
    }

    /// The active grammar configuration.
    #[must_use]
    pub fn config(&self) -> &GrammarConfig {
        &self.registry.config
    }
}

struct ChainEntry {
    priority: u16,
    provider: Box<dyn Provider>,
}

/// Serves the transformers registered up front for leaf types.
struct LeafProvider {
    leaves: HashMap<TypeId, ErasedTransformer>,
}

impl Provider for LeafProvider {
    fn name(&self) -> &'static str {
        "leaf"
    }

    fn can_handle(&self, request: &Request) -> bool {
        self.leaves.contains_key(&request.type_id)
    }

    fn create(&self, request: &Request, _ctx: &ResolveContext<'_>) -> Result<ErasedTransformer> {
        match self.leaves.get(&request.type_id) {
            Some(transformer) => Ok(transformer.clone_boxed()),
            None => Err(ConfigurationError::ProviderMismatch {
                type_name: request.type_name,
                provider: self.name(),
            }
            .into()),
        }
    }
}

macro_rules! shape_provider {
    ($name:ident, $label:literal, $variant:ident) => {
        struct $name;

        impl Provider for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn can_handle(&self, request: &Request) -> bool {
                matches!(request.shape, Shape::$variant { .. })
            }

            fn create(
                &self,
                request: &Request,
                ctx: &ResolveContext<'_>,
            ) -> Result<ErasedTransformer> {
                match request.shape {
                    Shape::$variant { factory, .. } => factory(ctx),
                    _ => Err(ConfigurationError::ProviderMismatch {
                        type_name: request.type_name,
                        provider: $label,
                    }
                    .into()),
                }
            }
        }
    };
}

shape_provider!(EnumerationProvider, "enumeration", Enumeration);
shape_provider!(OptionalProvider, "optional", Optional);
shape_provider!(PairProvider, "pair", Pair);
shape_provider!(MapProvider, "map", Map);
shape_provider!(FixedSequenceProvider, "fixed-sequence", FixedSequence);
shape_provider!(CollectionProvider, "collection", Collection);
shape_provider!(TupleProvider, "tuple", Tuple);

/// Last resort: a scalar's own `FromStr`/`Display` pair, when its shape
/// carries one.
struct CatchAllProvider;

impl Provider for CatchAllProvider {
    fn name(&self) -> &'static str {
        "catch-all"
    }

    fn can_handle(&self, _request: &Request) -> bool {
        true
    }

    fn create(&self, request: &Request, ctx: &ResolveContext<'_>) -> Result<ErasedTransformer> {
        match request.shape {
            Shape::Scalar {
                fallback: Some(factory),
            } => factory(ctx),
            _ => Err(ConfigurationError::NotSupported {
                type_name: request.type_name,
            }
            .into()),
        }
    }
}

fn default_leaves() -> HashMap<TypeId, ErasedTransformer> {
    let mut leaves = HashMap::new();
    macro_rules! leaf {
        ($ty:ty, $transformer:expr) => {
            leaves.insert(
                TypeId::of::<$ty>(),
                erase(Arc::new($transformer) as Arc<dyn Transformer<$ty>>),
            );
        };
    }
    leaf!(String, StringTransformer);
    leaf!(bool, BoolTransformer);
    leaf!(char, CharTransformer);
    leaf!(i8, NumberTransformer::<i8>::new());
    leaf!(i16, NumberTransformer::<i16>::new());
    leaf!(i32, NumberTransformer::<i32>::new());
    leaf!(i64, NumberTransformer::<i64>::new());
    leaf!(i128, NumberTransformer::<i128>::new());
    leaf!(isize, NumberTransformer::<isize>::new());
    leaf!(u8, NumberTransformer::<u8>::new());
    leaf!(u16, NumberTransformer::<u16>::new());
    leaf!(u32, NumberTransformer::<u32>::new());
    leaf!(u64, NumberTransformer::<u64>::new());
    leaf!(u128, NumberTransformer::<u128>::new());
    leaf!(usize, NumberTransformer::<usize>::new());
    leaf!(f32, NumberTransformer::<f32>::new());
    leaf!(f64, NumberTransformer::<f64>::new());
    leaf!(chrono::NaiveDate, DateTransformer);
    leaf!(chrono::NaiveTime, TimeTransformer);
    leaf!(chrono::NaiveDateTime, DateTimeTransformer);
    leaf!(chrono::DateTime<chrono::Utc>, UtcDateTimeTransformer);
    leaf!(
        num_bigint::BigInt,
        FromStrTransformer::<num_bigint::BigInt>::new()
    );
    leaf!(
        num_bigint::BigUint,
        FromStrTransformer::<num_bigint::BigUint>::new()
    );
    leaves
}

/// Configures and assembles a [`TransformerRegistry`].
///
/// ## Examples
///
/// ```rust
/// use textform::transformer::FromStrTransformer;
/// use textform::TransformerRegistry;
/// use num_bigint::BigInt;
///
/// let registry = TransformerRegistry::builder()
///     .register_leaf::<BigInt>(FromStrTransformer::new())
///     .build()?;
/// # Ok::<(), textform::ConfigurationError>(())
/// ```
pub struct RegistryBuilder {
    config: GrammarConfig,
    leaves: HashMap<TypeId, ErasedTransformer>,
    extra: Vec<ChainEntry>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        TransformerRegistry::builder()
    }
}

impl RegistryBuilder {
    /// Replaces the grammar configuration.
    #[must_use]
    pub fn with_config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers (or overrides) the leaf transformer for `T`.
    #[must_use]
    pub fn register_leaf<T: 'static>(mut self, transformer: impl Transformer<T> + 'static) -> Self {
        self.leaves.insert(
            TypeId::of::<T>(),
            erase(Arc::new(transformer) as Arc<dyn Transformer<T>>),
        );
        self
    }

    /// Inserts a custom provider at `priority`. Each priority may be used
    /// once across the whole chain.
    #[must_use]
    pub fn with_provider(mut self, priority: u16, provider: Box<dyn Provider>) -> Self {
        self.extra.push(ChainEntry { priority, provider });
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicatePriority`] when two providers
    /// share a priority.
    pub fn build(self) -> std::result::Result<TransformerRegistry, ConfigurationError> {
        let mut chain: Vec<ChainEntry> = vec![
            ChainEntry {
                priority: LEAF_PRIORITY,
                provider: Box::new(LeafProvider {
                    leaves: self.leaves,
                }),
            },
            ChainEntry {
                priority: ENUMERATION_PRIORITY,
                provider: Box::new(EnumerationProvider),
            },
            ChainEntry {
                priority: OPTIONAL_PRIORITY,
                provider: Box::new(OptionalProvider),
            },
            ChainEntry {
                priority: PAIR_PRIORITY,
                provider: Box::new(PairProvider),
            },
            ChainEntry {
                priority: MAP_PRIORITY,
                provider: Box::new(MapProvider),
            },
            ChainEntry {
                priority: FIXED_SEQUENCE_PRIORITY,
                provider: Box::new(FixedSequenceProvider),
            },
            ChainEntry {
                priority: COLLECTION_PRIORITY,
                provider: Box::new(CollectionProvider),
            },
            ChainEntry {
                priority: TUPLE_PRIORITY,
                provider: Box::new(TupleProvider),
            },
            ChainEntry {
                priority: CATCH_ALL_PRIORITY,
                provider: Box::new(CatchAllProvider),
            },
        ];
        chain.extend(self.extra);
        chain.sort_by_key(|entry| entry.priority);
        for pair in chain.windows(2) {
            if pair[0].priority == pair[1].priority {
                return Err(ConfigurationError::DuplicatePriority {
                    priority: pair[0].priority,
                });
            }
        }
        Ok(TransformerRegistry {
            config: self.config,
            chain,
            resolved: RwLock::new(HashMap::new()),
        })
    }
}

/// The entry point: resolves, caches, and applies transformers.
///
/// A registry is immutable once built and safe to share across threads;
/// typical use is one registry per grammar configuration for the lifetime of
/// the program.
///
/// ## Examples
///
/// ```rust
/// use textform::TransformerRegistry;
///
/// let registry = TransformerRegistry::new();
/// let point: (i32, i32) = registry.parse("(3,-4)")?;
/// assert_eq!(point, (3, -4));
/// assert_eq!(registry.format(&point)?, "(3,-4)");
/// # Ok::<(), textform::Error>(())
/// ```
pub struct TransformerRegistry {
    config: GrammarConfig,
    chain: Vec<ChainEntry>,
    resolved: RwLock<HashMap<TypeId, ErasedTransformer>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        TransformerRegistry::new()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry").finish_non_exhaustive()
    }
}

impl TransformerRegistry {
    /// A registry with the default grammar, leaves, and provider chain.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GrammarConfig::default())
    }

    /// A registry with the default chain and a custom grammar configuration.
    #[must_use]
    pub fn with_config(config: GrammarConfig) -> Self {
        match Self::builder().with_config(config).build() {
            Ok(registry) => registry,
            // default chain priorities are pairwise distinct
            Err(_) => unreachable!("default provider chain failed to build"),
        }
    }

    /// Starts a builder seeded with the default leaves and grammar.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            config: GrammarConfig::default(),
            leaves: default_leaves(),
            extra: Vec::new(),
        }
    }

    /// The active grammar configuration.
    #[must_use]
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Resolves the transformer for `T`, building and caching it on first
    /// use.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::NotSupported`] when no provider can handle the
    /// type, [`ConfigurationError::RecursionLimit`] for self-referential
    /// type graphs.
    pub fn resolve<T: Shaped + 'static>(&self) -> Result<SharedTransformer<T>> {
        self.resolve_at::<T>(0)
    }

    /// Parses top-level text into a `T`.
    ///
    /// Empty input and the bare null marker route to the transformer's null
    /// handling when it has any; for all other transformers they are
    /// ordinary text.
    pub fn parse<T: Shaped + 'static>(&self, input: &str) -> Result<T> {
        let transformer = self.resolve::<T>()?;
        if transformer.handles_null()
            && (input.is_empty() || is_exactly(input, self.config.null_marker()))
        {
            return transformer.parse_null();
        }
        transformer.parse(input)
    }

    /// Formats a value to its top-level text. A value that renders as null
    /// becomes the bare null marker.
    pub fn format<T: Shaped + 'static>(&self, value: &T) -> Result<String> {
        let transformer = self.resolve::<T>()?;
        if transformer.formats_as_null(value) {
            return Ok(self.config.null_marker().to_string());
        }
        let mut out = TextBuffer::new();
        transformer.format(value, &mut out)?;
        Ok(out.into_string())
    }

    fn resolve_at<T: Shaped + 'static>(&self, depth: usize) -> Result<SharedTransformer<T>> {
        let type_id = TypeId::of::<T>();
        if let Some(found) = self.resolved.read().get(&type_id).and_then(downcast::<T>) {
            return Ok(found);
        }
        if depth >= MAX_RESOLVE_DEPTH {
            return Err(ConfigurationError::RecursionLimit {
                type_name: std::any::type_name::<T>(),
                limit: MAX_RESOLVE_DEPTH,
            }
            .into());
        }

        let request = Request {
            type_id,
            type_name: std::any::type_name::<T>(),
            shape: T::shape(),
        };
        let ctx = ResolveContext {
            registry: self,
            depth,
        };
        // Build outside the lock: factories recurse into resolve_at for
        // their components.
        let mut built = None;
        for entry in &self.chain {
            if entry.provider.can_handle(&request) {
                built = Some((entry.provider.name(), entry.provider.create(&request, &ctx)?));
                break;
            }
        }
        let (provider_name, built) = match built {
            Some(found) => found,
            None => {
                return Err(ConfigurationError::NotSupported {
                    type_name: request.type_name,
                }
                .into())
            }
        };
        if downcast::<T>(&built).is_none() {
            return Err(ConfigurationError::ProviderMismatch {
                type_name: request.type_name,
                provider: provider_name,
            }
            .into());
        }

        let mut resolved = self.resolved.write();
        let stored = resolved.entry(type_id).or_insert(built);
        match downcast::<T>(stored) {
            Some(transformer) => Ok(transformer),
            // every stored entry was verified against its TypeId key
            None => unreachable!("cached transformer has the wrong type"),
        }
    }
}

fn downcast<T: 'static>(erased: &ErasedTransformer) -> Option<SharedTransformer<T>> {
    erased
        .as_any()
        .downcast_ref::<SharedTransformer<T>>()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn resolution_is_memoized() {
        let registry = TransformerRegistry::new();
        let first = registry.resolve::<Vec<i32>>().unwrap();
        let second = registry.resolve::<Vec<i32>>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn chain_order_picks_the_leaf_over_the_catch_all() {
        struct ShoutingStrings;
        impl Transformer<String> for ShoutingStrings {
            fn parse(&self, input: &str) -> Result<String> {
                Ok(input.to_uppercase())
            }
            fn format(&self, value: &String, out: &mut TextBuffer) -> Result<()> {
                out.push_str(value);
                Ok(())
            }
        }

        let registry = TransformerRegistry::builder()
            .register_leaf::<String>(ShoutingStrings)
            .build()
            .unwrap();
        assert_eq!(registry.parse::<String>("abc").unwrap(), "ABC");
    }

    #[test]
    fn unregistered_scalar_without_fallback_is_not_supported() {
        struct Opaque;
        impl Shaped for Opaque {
            fn shape() -> Shape {
                Shape::scalar()
            }
        }

        let err = TransformerRegistry::new().resolve::<Opaque>().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::NotSupported { .. })
        ));
    }

    #[test]
    fn duplicate_priority_is_rejected_at_build() {
        let err = TransformerRegistry::builder()
            .with_provider(MAP_PRIORITY, Box::new(CatchAllProvider))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicatePriority {
                priority: MAP_PRIORITY
            }
        );
    }

    #[test]
    fn self_referential_resolution_hits_the_nesting_limit() {
        struct Looping;
        impl Shaped for Looping {
            fn shape() -> Shape {
                Shape::Enumeration {
                    factory: |ctx| ctx.resolve::<Looping>().map(erase),
                }
            }
        }

        let err = TransformerRegistry::new().resolve::<Looping>().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::RecursionLimit { .. })
        ));
    }

    #[test]
    fn top_level_null_routing() {
        let registry = TransformerRegistry::new();
        assert_eq!(registry.parse::<Option<i32>>("∅").unwrap(), None);
        assert_eq!(registry.parse::<Option<i32>>("").unwrap(), None);
        assert_eq!(registry.format(&None::<i32>).unwrap(), "∅");

        // non-null-aware types read the marker as ordinary text
        assert_eq!(registry.parse::<String>("∅").unwrap(), "∅");
    }

    #[test]
    fn custom_provider_outranks_built_ins() {
        struct FixedStrings;
        impl Provider for FixedStrings {
            fn name(&self) -> &'static str {
                "fixed-strings"
            }
            fn can_handle(&self, request: &Request) -> bool {
                request.type_id == TypeId::of::<String>()
            }
            fn create(
                &self,
                _request: &Request,
                _ctx: &ResolveContext<'_>,
            ) -> Result<ErasedTransformer> {
                struct Fixed;
                impl Transformer<String> for Fixed {
                    fn parse(&self, _input: &str) -> Result<String> {
                        Ok("fixed".to_string())
                    }
                    fn format(&self, value: &String, out: &mut TextBuffer) -> Result<()> {
                        out.push_str(value);
                        Ok(())
                    }
                }
                Ok(erase(Arc::new(Fixed) as Arc<dyn Transformer<String>>))
            }
        }

        let registry = TransformerRegistry::builder()
            .with_provider(5, Box::new(FixedStrings))
            .build()
            .unwrap();
        assert_eq!(registry.parse::<String>("anything").unwrap(), "fixed");
    }
}
