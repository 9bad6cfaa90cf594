//! Structural shape descriptors: how a type decomposes into components.
//!
//! The registry never inspects types at runtime. Instead every participating
//! type implements [`Shaped`], whose [`Shape`] names the type's structural
//! family and, for composites, carries a monomorphized factory that knows
//! how to resolve the component transformers and assemble the composite one.
//! This is the compile-time equivalent of a reflection-driven
//! `TryDescribe(type)` capability: the shape is the descriptor, the factory
//! is the recomposition function.
//!
//! Scalar shapes may carry a fallback factory built from the type's
//! `FromStr`/`Display` pair; the registry's catch-all provider uses it when
//! no dedicated leaf transformer is registered.
//!
//! ## Examples
//!
//! ```rust
//! use std::fmt;
//! use std::str::FromStr;
//! use textform::{Shape, Shaped, TransformerRegistry};
//!
//! #[derive(Debug, PartialEq)]
//! struct Celsius(f64);
//!
//! impl FromStr for Celsius {
//!     type Err = std::num::ParseFloatError;
//!     fn from_str(s: &str) -> Result<Self, Self::Err> {
//!         s.parse().map(Celsius)
//!     }
//! }
//!
//! impl fmt::Display for Celsius {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "{}", self.0)
//!     }
//! }
//!
//! impl Shaped for Celsius {
//!     fn shape() -> Shape {
//!         Shape::scalar_from_str::<Celsius>()
//!     }
//! }
//!
//! let registry = TransformerRegistry::new();
//! assert_eq!(registry.parse::<Celsius>("21.5")?, Celsius(21.5));
//! # Ok::<(), textform::Error>(())
//! ```

use crate::error::Result;
use crate::registry::ResolveContext;
use crate::transformer::{FromStrTransformer, Transformer};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A type-erased, clonable handle to an `Arc<dyn Transformer<T>>`.
///
/// The registry's memo map and the provider chain traffic in these; callers
/// get the typed `Arc` back via downcast.
pub trait AnyTransformer: Send + Sync {
    fn clone_boxed(&self) -> Box<dyn AnyTransformer>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AnyTransformer for Arc<dyn Transformer<T>> {
    fn clone_boxed(&self) -> Box<dyn AnyTransformer> {
        Box::new(Arc::clone(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub type ErasedTransformer = Box<dyn AnyTransformer>;

/// Erases a typed transformer for storage in the registry.
pub fn erase<T: 'static>(transformer: Arc<dyn Transformer<T>>) -> ErasedTransformer {
    Box::new(transformer)
}

/// A monomorphized transformer factory carried inside a [`Shape`].
pub type Factory = fn(&ResolveContext<'_>) -> Result<ErasedTransformer>;

/// The structural family of a type, as consumed by the provider chain.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Not a composite. The optional fallback delegates to the type's own
    /// string conversion when no leaf transformer is registered.
    Scalar { fallback: Option<Factory> },
    /// A named-variant enumeration.
    Enumeration { factory: Factory },
    /// An optional value wrapping one component type.
    Optional { factory: Factory },
    /// A single key/value pair.
    Pair { factory: Factory },
    /// A map-like collection of key/value pairs.
    Map { factory: Factory },
    /// A sequence of statically known length.
    FixedSequence { len: usize, factory: Factory },
    /// A homogeneous variable-length collection.
    Collection { factory: Factory },
    /// A fixed-arity heterogeneous tuple.
    Tuple { arity: usize, factory: Factory },
}

impl Shape {
    /// A scalar with no fallback: the type must have a leaf transformer
    /// registered, or resolution fails with a configuration error.
    #[must_use]
    pub fn scalar() -> Shape {
        Shape::Scalar { fallback: None }
    }

    /// A scalar whose fallback is the type's `FromStr`/`Display` pair.
    #[must_use]
    pub fn scalar_from_str<T>() -> Shape
    where
        T: FromStr + fmt::Display + Send + Sync + 'static,
    {
        Shape::Scalar {
            fallback: Some(|_ctx| {
                Ok(erase(
                    Arc::new(FromStrTransformer::<T>::new()) as Arc<dyn Transformer<T>>
                ))
            }),
        }
    }
}

/// A type that can describe its own structural shape.
///
/// Implementations exist for the primitives, `String`, `char`, the chrono
/// and bigint leaves, `Option<T>`, tuples up to arity 16, `[T; N]`, the
/// standard collections and maps, and [`KeyValue`](crate::KeyValue). The
/// [`text_enum!`](crate::text_enum) macro generates one for enumerations.
pub trait Shaped {
    fn shape() -> Shape;
}

macro_rules! scalar_shapes {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::scalar()
                }
            }
        )+
    };
}

scalar_shapes!(
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    bool,
    char,
    String,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    num_bigint::BigInt,
    num_bigint::BigUint,
);
