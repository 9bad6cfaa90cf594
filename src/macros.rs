//! The [`text_enum!`] macro.

/// Defines a unit-variant enum together with its registry wiring.
///
/// The generated enum derives `Clone`, `Copy`, `Debug`, `PartialEq`, `Eq`,
/// and `Hash`, and implements [`Shaped`](crate::Shaped) with an enumeration
/// shape. Its transformer parses a variant by exact (trimmed) name, or by
/// numeric discriminant when the input parses as an integer; it formats a
/// variant as its name.
///
/// ## Examples
///
/// ```rust
/// use textform::{text_enum, TransformerRegistry};
///
/// text_enum! {
///     /// CSS-ish base colors.
///     pub enum Color {
///         Red,
///         Green = 5,
///         Blue,
///     }
/// }
///
/// let registry = TransformerRegistry::new();
/// assert_eq!(registry.parse::<Color>("Green")?, Color::Green);
/// assert_eq!(registry.parse::<Color>("6")?, Color::Blue);
/// assert_eq!(registry.format(&Color::Red)?, "Red");
/// # Ok::<(), textform::Error>(())
/// ```
#[macro_export]
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident $(= $value:expr)?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant $(= $value)?),+
        }

        impl $crate::Shaped for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::Enumeration {
                    factory: |_ctx| {
                        struct VariantTransformer;

                        impl $crate::Transformer<$name> for VariantTransformer {
                            fn parse(&self, input: &str) -> $crate::Result<$name> {
                                let trimmed = input.trim();
                                $(
                                    if trimmed == stringify!($variant) {
                                        return Ok($name::$variant);
                                    }
                                )+
                                if let Ok(number) = trimmed.parse::<i128>() {
                                    $(
                                        if number == $name::$variant as i128 {
                                            return Ok($name::$variant);
                                        }
                                    )+
                                }
                                Err($crate::Error::invalid_value::<$name>(input))
                            }

                            fn format(
                                &self,
                                value: &$name,
                                out: &mut $crate::TextBuffer,
                            ) -> $crate::Result<()> {
                                out.push_str(match value {
                                    $($name::$variant => stringify!($variant)),+
                                });
                                Ok(())
                            }
                        }

                        Ok($crate::shape::erase(
                            ::std::sync::Arc::new(VariantTransformer)
                                as ::std::sync::Arc<dyn $crate::Transformer<$name>>,
                        ))
                    },
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::TransformerRegistry;

    text_enum! {
        enum Direction {
            North,
            East = 90,
            South = 180,
            West = 270,
        }
    }

    #[test]
    fn parses_by_name() {
        let registry = TransformerRegistry::new();
        assert_eq!(
            registry.parse::<Direction>("North").unwrap(),
            Direction::North
        );
        assert_eq!(
            registry.parse::<Direction>(" West ").unwrap(),
            Direction::West
        );
    }

    #[test]
    fn parses_by_discriminant() {
        let registry = TransformerRegistry::new();
        assert_eq!(registry.parse::<Direction>("0").unwrap(), Direction::North);
        assert_eq!(registry.parse::<Direction>("180").unwrap(), Direction::South);
    }

    #[test]
    fn unknown_variant_is_an_error() {
        let registry = TransformerRegistry::new();
        assert!(registry.parse::<Direction>("Up").unwrap_err().is_format());
        assert!(registry.parse::<Direction>("91").unwrap_err().is_format());
    }

    #[test]
    fn formats_as_the_variant_name() {
        let registry = TransformerRegistry::new();
        assert_eq!(registry.format(&Direction::East).unwrap(), "East");
    }

    #[test]
    fn composes_with_collections() {
        let registry = TransformerRegistry::new();
        let route: Vec<Direction> = registry.parse("North|East|South").unwrap();
        assert_eq!(
            route,
            vec![Direction::North, Direction::East, Direction::South]
        );
        assert_eq!(registry.format(&route).unwrap(), "North|East|South");
    }
}
