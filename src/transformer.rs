//! The [`Transformer`] capability and the built-in leaf transformers.
//!
//! A transformer is an immutable parse/format pair for one type. Composite
//! transformers own the transformers of their component types; leaves stand
//! on their own. All transformers are shared read-only behind `Arc` once a
//! registry has resolved them.
//!
//! ## Examples
//!
//! ```rust
//! use textform::{TextBuffer, Transformer};
//! use textform::transformer::NumberTransformer;
//!
//! let numbers = NumberTransformer::<i32>::new();
//! assert_eq!(numbers.parse("42")?, 42);
//!
//! let mut out = TextBuffer::new();
//! numbers.format(&42, &mut out)?;
//! assert_eq!(out.as_str(), "42");
//! # Ok::<(), textform::Error>(())
//! ```

use crate::buffer::TextBuffer;
use crate::error::{Error, FormatError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use std::fmt;
use std::marker::PhantomData;
use std::num::IntErrorKind;
use std::str::FromStr;
use std::sync::Arc;

/// Paired parse/format capability for one type.
///
/// The null-related methods let composites route the null marker without
/// in-band sentinels: a parent that decodes a bare null marker calls
/// [`parse_null`](Transformer::parse_null), and checks
/// [`formats_as_null`](Transformer::formats_as_null) before rendering a
/// component. Only null-aware transformers (such as the one for `Option`)
/// override the defaults.
pub trait Transformer<T>: Send + Sync {
    /// Parses decoded text into a value.
    fn parse(&self, input: &str) -> Result<T>;

    /// Produces the "no value" result, if the type can express one.
    fn parse_null(&self) -> Result<T> {
        Err(FormatError::UnexpectedNull {
            type_name: std::any::type_name::<T>(),
        }
        .into())
    }

    /// Renders a value into the output buffer. The caller escapes the
    /// rendering for its own grammar, so implementations write plain text.
    fn format(&self, value: &T, out: &mut TextBuffer) -> Result<()>;

    /// Whether this value renders as the null marker rather than as text.
    fn formats_as_null(&self, _value: &T) -> bool {
        false
    }

    /// Whether [`parse_null`](Transformer::parse_null) can succeed.
    fn handles_null(&self) -> bool {
        false
    }
}

impl<T> fmt::Debug for dyn Transformer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transformer<{}>", std::any::type_name::<T>())
    }
}

/// A resolved transformer as handed out by the registry.
pub type SharedTransformer<T> = Arc<dyn Transformer<T>>;

/// Leaf for `String`: the identity transformer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTransformer;

impl Transformer<String> for StringTransformer {
    fn parse(&self, input: &str) -> Result<String> {
        Ok(input.to_string())
    }

    fn format(&self, value: &String, out: &mut TextBuffer) -> Result<()> {
        out.push_str(value);
        Ok(())
    }
}

/// Leaf for `bool`; parsing trims and ignores ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolTransformer;

impl Transformer<bool> for BoolTransformer {
    fn parse(&self, input: &str) -> Result<bool> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(Error::invalid_value::<bool>(input))
        }
    }

    fn format(&self, value: &bool, out: &mut TextBuffer) -> Result<()> {
        out.push_str(if *value { "true" } else { "false" });
        Ok(())
    }
}

/// Leaf for `char`: input must be exactly one character, untrimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTransformer;

impl Transformer<char> for CharTransformer {
    fn parse(&self, input: &str) -> Result<char> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(Error::invalid_value::<char>(input)),
        }
    }

    fn format(&self, value: &char, out: &mut TextBuffer) -> Result<()> {
        out.push(*value);
        Ok(())
    }
}

/// Leaf for the numeric primitives.
///
/// Integer parsing distinguishes out-of-range input ([`Error::Overflow`])
/// from unparseable input ([`FormatError::InvalidValue`]).
#[derive(Debug, Default)]
pub struct NumberTransformer<T>(PhantomData<fn() -> T>);

impl<T> NumberTransformer<T> {
    #[must_use]
    pub const fn new() -> Self {
        NumberTransformer(PhantomData)
    }
}

macro_rules! integer_transformers {
    ($($ty:ty),+) => {
        $(
            impl Transformer<$ty> for NumberTransformer<$ty> {
                fn parse(&self, input: &str) -> Result<$ty> {
                    let trimmed = input.trim();
                    trimmed.parse::<$ty>().map_err(|err| match err.kind() {
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                            Error::overflow::<$ty>(trimmed)
                        }
                        _ => Error::invalid_value::<$ty>(input),
                    })
                }

                fn format(&self, value: &$ty, out: &mut TextBuffer) -> Result<()> {
                    out.push_display(value);
                    Ok(())
                }
            }
        )+
    };
}

integer_transformers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_transformers {
    ($($ty:ty),+) => {
        $(
            impl Transformer<$ty> for NumberTransformer<$ty> {
                fn parse(&self, input: &str) -> Result<$ty> {
                    input
                        .trim()
                        .parse::<$ty>()
                        .map_err(|_| Error::invalid_value::<$ty>(input))
                }

                fn format(&self, value: &$ty, out: &mut TextBuffer) -> Result<()> {
                    out.push_display(value);
                    Ok(())
                }
            }
        )+
    };
}

float_transformers!(f32, f64);

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Leaf for `chrono::NaiveDate` (ISO 8601 calendar date).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTransformer;

impl Transformer<NaiveDate> for DateTransformer {
    fn parse(&self, input: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
            .map_err(|_| Error::invalid_value::<NaiveDate>(input))
    }

    fn format(&self, value: &NaiveDate, out: &mut TextBuffer) -> Result<()> {
        out.push_display(&value.format(DATE_FORMAT));
        Ok(())
    }
}

/// Leaf for `chrono::NaiveTime` with optional fractional seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeTransformer;

impl Transformer<NaiveTime> for TimeTransformer {
    fn parse(&self, input: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
            .map_err(|_| Error::invalid_value::<NaiveTime>(input))
    }

    fn format(&self, value: &NaiveTime, out: &mut TextBuffer) -> Result<()> {
        out.push_display(&value.format(TIME_FORMAT));
        Ok(())
    }
}

/// Leaf for `chrono::NaiveDateTime` (ISO 8601, `T`-separated).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeTransformer;

impl Transformer<NaiveDateTime> for DateTimeTransformer {
    fn parse(&self, input: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(input.trim(), DATE_TIME_FORMAT)
            .map_err(|_| Error::invalid_value::<NaiveDateTime>(input))
    }

    fn format(&self, value: &NaiveDateTime, out: &mut TextBuffer) -> Result<()> {
        out.push_display(&value.format(DATE_TIME_FORMAT));
        Ok(())
    }
}

/// Leaf for `chrono::DateTime<Utc>` in RFC 3339.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcDateTimeTransformer;

impl Transformer<DateTime<Utc>> for UtcDateTimeTransformer {
    fn parse(&self, input: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| Error::invalid_value::<DateTime<Utc>>(input))
    }

    fn format(&self, value: &DateTime<Utc>, out: &mut TextBuffer) -> Result<()> {
        out.push_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        Ok(())
    }
}

/// Delegates to a type's own `FromStr`/`Display` pair.
///
/// This is the string-conversion capability the catch-all provider uses, and
/// the easiest way to plug a custom scalar type into the registry: give it a
/// `FromStr` and `Display` impl and a
/// [`Shape::scalar_from_str`](crate::Shape::scalar_from_str) shape.
#[derive(Debug, Default)]
pub struct FromStrTransformer<T>(PhantomData<fn() -> T>);

impl<T> FromStrTransformer<T> {
    #[must_use]
    pub const fn new() -> Self {
        FromStrTransformer(PhantomData)
    }
}

impl<T> Transformer<T> for FromStrTransformer<T>
where
    T: FromStr + fmt::Display + Send + Sync + 'static,
{
    fn parse(&self, input: &str) -> Result<T> {
        input
            .parse::<T>()
            .map_err(|_| Error::invalid_value::<T>(input))
    }

    fn format(&self, value: &T, out: &mut TextBuffer) -> Result<()> {
        out.push_display(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T>(transformer: &dyn Transformer<T>, value: &T) -> String {
        let mut out = TextBuffer::new();
        transformer.format(value, &mut out).unwrap();
        out.into_string()
    }

    #[test]
    fn integers_distinguish_overflow_from_garbage() {
        let bytes = NumberTransformer::<u8>::new();
        assert_eq!(bytes.parse("255").unwrap(), 255);
        assert!(bytes.parse("300").unwrap_err().is_overflow());
        assert!(bytes.parse("abc").unwrap_err().is_format());
        assert!(bytes.parse("-1").unwrap_err().is_overflow());
    }

    #[test]
    fn integers_trim_whitespace() {
        let numbers = NumberTransformer::<i32>::new();
        assert_eq!(numbers.parse(" -17 ").unwrap(), -17);
        assert_eq!(render(&numbers, &-17), "-17");
    }

    #[test]
    fn bools_are_lenient_on_case() {
        let bools = BoolTransformer;
        assert!(bools.parse("TRUE").unwrap());
        assert!(!bools.parse(" False ").unwrap());
        assert!(bools.parse("yes").is_err());
        assert_eq!(render(&bools, &true), "true");
    }

    #[test]
    fn chars_are_exact() {
        let chars = CharTransformer;
        assert_eq!(chars.parse(" ").unwrap(), ' ');
        assert_eq!(chars.parse("∅").unwrap(), '∅');
        assert!(chars.parse("ab").is_err());
        assert!(chars.parse("").is_err());
    }

    #[test]
    fn default_parse_null_is_an_error() {
        let strings = StringTransformer;
        let err = strings.parse_null().unwrap_err();
        assert!(err.to_string().contains("does not accept the null marker"));
        assert!(!strings.handles_null());
    }

    #[test]
    fn date_round_trips() {
        let dates = DateTransformer;
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let rendered = render(&dates, &date);
        assert_eq!(rendered, "2024-02-29");
        assert_eq!(dates.parse(&rendered).unwrap(), date);
    }

    #[test]
    fn utc_date_time_round_trips() {
        use chrono::TimeZone;
        let stamps = UtcDateTimeTransformer;
        let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let rendered = render(&stamps, &stamp);
        assert_eq!(stamps.parse(&rendered).unwrap(), stamp);
    }

    #[test]
    fn from_str_delegate() {
        use num_bigint::BigInt;
        let bigints = FromStrTransformer::<BigInt>::new();
        let value: BigInt = "123456789012345678901234567890".parse().unwrap();
        let rendered = render(&bigints, &value);
        assert_eq!(bigints.parse(&rendered).unwrap(), value);
        assert!(bigints.parse("not-a-number").unwrap_err().is_format());
    }

    #[test]
    fn floats_round_trip_shortest() {
        let floats = NumberTransformer::<f64>::new();
        for value in [0.1, -2.5, 1e300, f64::MIN_POSITIVE] {
            let rendered = render(&floats, &value);
            assert_eq!(floats.parse(&rendered).unwrap(), value);
        }
    }
}
