//! Composite transformers: optionals, pairs, tuples, arrays, sequences,
//! and maps.
//!
//! Every parse here follows the same state machine: an optional border
//! check, a single scanning pass, decode-then-delegate per segment, an
//! optional trailing check. Errors are terminal for the call and propagate
//! with their original kind; nothing is retried or re-wrapped.
//!
//! Formatting is the mirror image: each component is rendered into a scratch
//! buffer by its own transformer, then escaped for the parent grammar while
//! being appended. A component that renders as null is written as the bare
//! (unescaped) null marker, which is what lets `parse` tell a null apart
//! from a literal value whose text equals the marker.

use crate::buffer::TextBuffer;
use crate::error::{FormatError, Result};
use crate::escape::{Decoded, EscapeCodec};
use crate::grammar::{Grammar, MapGrammar};
use crate::registry::ResolveContext;
use crate::scan::Segments;
use crate::shape::{erase, ErasedTransformer, Shape, Shaped};
use crate::transformer::Transformer;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Strips configured borders, tolerating whitespace only outside them.
fn strip_borders<'a>(
    input: &'a str,
    start: Option<char>,
    end: Option<char>,
) -> std::result::Result<&'a str, FormatError> {
    if start.is_none() && end.is_none() {
        return Ok(input);
    }
    let trimmed = input.trim();
    let after_start = match start {
        Some(border) => trimmed
            .strip_prefix(border)
            .ok_or_else(|| FormatError::border_mismatch(border, true, trimmed))?,
        None => trimmed,
    };
    match end {
        Some(border) => after_start
            .strip_suffix(border)
            .ok_or_else(|| FormatError::border_mismatch(border, false, trimmed)),
        None => Ok(after_start),
    }
}

/// Wraps a component transformer, mapping the null marker to `None`.
///
/// Empty input also parses as `None`, so a resolved optional accepts both
/// `""` and the bare marker at the top level.
pub struct OptionalTransformer<T> {
    inner: Arc<dyn Transformer<T>>,
}

impl<T: 'static> Transformer<Option<T>> for OptionalTransformer<T> {
    fn parse(&self, input: &str) -> Result<Option<T>> {
        if input.is_empty() {
            return Ok(None);
        }
        self.inner.parse(input).map(Some)
    }

    fn parse_null(&self) -> Result<Option<T>> {
        Ok(None)
    }

    fn format(&self, value: &Option<T>, out: &mut TextBuffer) -> Result<()> {
        match value {
            Some(inner) => self.inner.format(inner, out),
            None => Ok(()),
        }
    }

    fn formats_as_null(&self, value: &Option<T>) -> bool {
        value.is_none()
    }

    fn handles_null(&self) -> bool {
        true
    }
}

impl<T: Shaped + 'static> Shaped for Option<T> {
    fn shape() -> Shape {
        Shape::Optional {
            factory: |ctx| {
                let inner = ctx.resolve::<T>()?;
                Ok(erase(Arc::new(OptionalTransformer { inner })
                    as Arc<dyn Transformer<Option<T>>>))
            },
        }
    }
}

/// A single key/value pair with its own text representation (`key=value`
/// under the default map grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        KeyValue { key, value }
    }
}

/// Parses and formats one `key=value` token; also the per-entry engine of
/// [`MapTransformer`].
pub struct PairTransformer<K, V> {
    key: Arc<dyn Transformer<K>>,
    value: Arc<dyn Transformer<V>>,
    grammar: MapGrammar,
    codec: EscapeCodec,
}

impl<K: 'static, V: 'static> PairTransformer<K, V> {
    /// Splits a token once on the key/value delimiter; anything other than
    /// exactly two parts is a hard parse error, as is a null key.
    fn parse_token(&self, token: &str) -> Result<(K, V)> {
        let mut parts = Segments::new(
            token,
            self.grammar.key_value_delimiter(),
            self.grammar.escape(),
            true,
        );
        let key_segment = match parts.next() {
            Some(segment) if segment.terminator.is_some() => segment,
            _ => return Err(FormatError::key_value_pair(token).into()),
        };
        let value_segment = match parts.next() {
            Some(segment) if segment.terminator.is_none() => segment,
            _ => return Err(FormatError::key_value_pair(token).into()),
        };
        let key = match self.codec.decode(key_segment.text)? {
            Decoded::Null => return Err(FormatError::NullKey.into()),
            Decoded::Text(text) => self.key.parse(&text)?,
        };
        let value = match self.codec.decode(value_segment.text)? {
            Decoded::Null => self.value.parse_null()?,
            Decoded::Text(text) => self.value.parse(&text)?,
        };
        Ok((key, value))
    }

    fn format_entry(&self, key: &K, value: &V, out: &mut TextBuffer) -> Result<()> {
        if self.key.formats_as_null(key) {
            return Err(FormatError::NullKey.into());
        }
        let mut scratch = TextBuffer::new();
        self.key.format(key, &mut scratch)?;
        self.codec.encode_into(scratch.as_str(), out);
        out.push(self.grammar.key_value_delimiter());
        if self.value.formats_as_null(value) {
            out.push(self.grammar.null_marker());
        } else {
            scratch.clear();
            self.value.format(value, &mut scratch)?;
            self.codec.encode_into(scratch.as_str(), out);
        }
        Ok(())
    }
}

impl<K: 'static, V: 'static> Transformer<KeyValue<K, V>> for PairTransformer<K, V> {
    fn parse(&self, input: &str) -> Result<KeyValue<K, V>> {
        let (key, value) = self.parse_token(input)?;
        Ok(KeyValue { key, value })
    }

    fn format(&self, pair: &KeyValue<K, V>, out: &mut TextBuffer) -> Result<()> {
        self.format_entry(&pair.key, &pair.value, out)
    }
}

fn build_pair<K, V>(ctx: &ResolveContext<'_>) -> Result<PairTransformer<K, V>>
where
    K: Shaped + 'static,
    V: Shaped + 'static,
{
    let grammar = *ctx.config().map();
    let codec = EscapeCodec::for_map_grammar(&grammar);
    Ok(PairTransformer {
        key: ctx.resolve::<K>()?,
        value: ctx.resolve::<V>()?,
        grammar,
        codec,
    })
}

fn pair_factory<K, V>(ctx: &ResolveContext<'_>) -> Result<ErasedTransformer>
where
    K: Shaped + 'static,
    V: Shaped + 'static,
{
    Ok(erase(Arc::new(build_pair::<K, V>(ctx)?)
        as Arc<dyn Transformer<KeyValue<K, V>>>))
}

impl<K: Shaped + 'static, V: Shaped + 'static> Shaped for KeyValue<K, V> {
    fn shape() -> Shape {
        Shape::Pair {
            factory: pair_factory::<K, V>,
        }
    }
}

/// Fixed-arity tuple transformer; the concrete arity comes from the
/// `children` tuple of component transformers.
pub struct TupleTransformer<C> {
    children: C,
    grammar: Grammar,
    codec: EscapeCodec,
}

/// Scanning state for one tuple parse: start border already stripped,
/// segments end at the delimiter or at the first unescaped end border.
struct TupleCursor<'a> {
    segments: Segments<'a, [char; 2]>,
    codec: &'a EscapeCodec,
    delimiter: char,
    end: Option<char>,
    source: &'a str,
    prev_raw: &'a str,
    last_terminator: Option<char>,
    saw_end: bool,
}

impl<'a> TupleCursor<'a> {
    fn new(input: &'a str, grammar: &Grammar, codec: &'a EscapeCodec) -> Result<Self> {
        let source = input.trim();
        let inner = match grammar.start() {
            Some(border) => source
                .strip_prefix(border)
                .ok_or_else(|| FormatError::border_mismatch(border, true, source))?,
            None => source,
        };
        let delimiter = grammar.delimiter();
        let scan_set = [delimiter, grammar.end().unwrap_or(delimiter)];
        Ok(TupleCursor {
            segments: Segments::new(inner, scan_set, grammar.escape(), true),
            codec,
            delimiter,
            end: grammar.end(),
            source,
            prev_raw: "",
            last_terminator: None,
            saw_end: false,
        })
    }

    fn element<T>(&mut self, child: &dyn Transformer<T>, ordinal: usize) -> Result<T> {
        if self.saw_end {
            return Err(FormatError::element_not_found(ordinal, self.prev_raw).into());
        }
        let segment = match self.segments.next() {
            Some(segment) => segment,
            None => return Err(FormatError::element_not_found(ordinal, self.prev_raw).into()),
        };
        if segment.terminator.is_some() && segment.terminator == self.end {
            self.saw_end = true;
        }
        self.last_terminator = segment.terminator;
        self.prev_raw = segment.text;
        match self.codec.decode(segment.text)? {
            Decoded::Null => child.parse_null(),
            Decoded::Text(text) => child.parse(&text),
        }
    }

    fn finish(&mut self, arity: usize) -> Result<()> {
        if self.last_terminator == Some(self.delimiter) {
            let extra = self
                .segments
                .next()
                .map(|segment| segment.text)
                .unwrap_or_default();
            return Err(FormatError::too_many_elements(arity, extra).into());
        }
        if self.saw_end {
            let rest = self.segments.remainder().trim();
            if !rest.is_empty() {
                return Err(FormatError::trailing_characters(rest).into());
            }
            return Ok(());
        }
        if let Some(border) = self.end {
            return Err(FormatError::border_mismatch(border, false, self.source).into());
        }
        Ok(())
    }
}

macro_rules! tuple_transformers {
    ($arity:expr => $($T:ident : $idx:tt),+) => {
        impl<$($T: 'static),+> Transformer<($($T,)+)>
            for TupleTransformer<($(Arc<dyn Transformer<$T>>,)+)>
        {
            fn parse(&self, input: &str) -> Result<($($T,)+)> {
                let mut cursor = TupleCursor::new(input, &self.grammar, &self.codec)?;
                let value = ($(cursor.element(&*self.children.$idx, $idx + 1)?,)+);
                cursor.finish($arity)?;
                Ok(value)
            }

            fn format(&self, value: &($($T,)+), out: &mut TextBuffer) -> Result<()> {
                if let Some(border) = self.grammar.start() {
                    out.push(border);
                }
                let mut scratch = TextBuffer::new();
                $(
                    if $idx > 0 {
                        out.push(self.grammar.delimiter());
                    }
                    if self.children.$idx.formats_as_null(&value.$idx) {
                        out.push(self.grammar.null_marker());
                    } else {
                        scratch.clear();
                        self.children.$idx.format(&value.$idx, &mut scratch)?;
                        self.codec.encode_into(scratch.as_str(), out);
                    }
                )+
                if let Some(border) = self.grammar.end() {
                    out.push(border);
                }
                Ok(())
            }
        }

        impl<$($T: Shaped + 'static),+> Shaped for ($($T,)+) {
            fn shape() -> Shape {
                Shape::Tuple {
                    arity: $arity,
                    factory: |ctx| {
                        let grammar = *ctx.config().tuple();
                        let codec = EscapeCodec::for_grammar(&grammar);
                        let transformer = TupleTransformer {
                            children: ($(ctx.resolve::<$T>()?,)+),
                            grammar,
                            codec,
                        };
                        Ok(erase(Arc::new(transformer)
                            as Arc<dyn Transformer<($($T,)+)>>))
                    },
                }
            }
        }
    };
}

tuple_transformers!(1 => A:0);
tuple_transformers!(2 => A:0, B:1);
tuple_transformers!(3 => A:0, B:1, C:2);
tuple_transformers!(4 => A:0, B:1, C:2, D:3);
tuple_transformers!(5 => A:0, B:1, C:2, D:3, E:4);
tuple_transformers!(6 => A:0, B:1, C:2, D:3, E:4, F:5);
tuple_transformers!(7 => A:0, B:1, C:2, D:3, E:4, F:5, G:6);
tuple_transformers!(8 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7);
tuple_transformers!(9 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8);
tuple_transformers!(10 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9);
tuple_transformers!(11 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10);
tuple_transformers!(12 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10, L:11);
tuple_transformers!(13 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10, L:11, M:12);
tuple_transformers!(14 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10, L:11, M:12, N:13);
tuple_transformers!(15 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10, L:11, M:12, N:13, O:14);
tuple_transformers!(16 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7, I:8, J:9, K:10, L:11, M:12, N:13, O:14, P:15);

/// Homogeneous variable-length sequence transformer. `C` is the concrete
/// collection to reconstruct after parsing.
pub struct SequenceTransformer<C, T> {
    element: Arc<dyn Transformer<T>>,
    grammar: Grammar,
    codec: EscapeCodec,
    empty_is_single_element: bool,
    _collection: PhantomData<fn() -> C>,
}

impl<C, T> Transformer<C> for SequenceTransformer<C, T>
where
    C: FromIterator<T> + Send + Sync + 'static,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
    T: 'static,
{
    fn parse(&self, input: &str) -> Result<C> {
        let inner = strip_borders(input, self.grammar.start(), self.grammar.end())?;
        Segments::new(
            inner,
            self.grammar.delimiter(),
            self.grammar.escape(),
            self.empty_is_single_element,
        )
        .map(|segment| -> Result<T> {
            match self.codec.decode(segment.text)? {
                Decoded::Null => self.element.parse_null(),
                Decoded::Text(text) => self.element.parse(&text),
            }
        })
        .collect()
    }

    fn format(&self, value: &C, out: &mut TextBuffer) -> Result<()> {
        if let Some(border) = self.grammar.start() {
            out.push(border);
        }
        let mut scratch = TextBuffer::new();
        let mut wrote_any = false;
        for item in value {
            if self.element.formats_as_null(item) {
                out.push(self.grammar.null_marker());
            } else {
                scratch.clear();
                self.element.format(item, &mut scratch)?;
                self.codec.encode_into(scratch.as_str(), out);
            }
            out.push(self.grammar.delimiter());
            wrote_any = true;
        }
        if wrote_any {
            out.pop();
        }
        if let Some(border) = self.grammar.end() {
            out.push(border);
        }
        Ok(())
    }
}

fn sequence_factory<C, T>(ctx: &ResolveContext<'_>) -> Result<ErasedTransformer>
where
    C: FromIterator<T> + Send + Sync + 'static,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
    T: Shaped + 'static,
{
    let grammar = *ctx.config().sequence();
    let codec = EscapeCodec::for_grammar(&grammar);
    let transformer = SequenceTransformer::<C, T> {
        element: ctx.resolve::<T>()?,
        grammar,
        codec,
        empty_is_single_element: ctx.config().empty_sequence_is_element(),
        _collection: PhantomData,
    };
    Ok(erase(Arc::new(transformer) as Arc<dyn Transformer<C>>))
}

impl<T: Shaped + Send + Sync + 'static> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::Collection {
            factory: sequence_factory::<Vec<T>, T>,
        }
    }
}

impl<T: Shaped + Send + Sync + 'static> Shaped for VecDeque<T> {
    fn shape() -> Shape {
        Shape::Collection {
            factory: sequence_factory::<VecDeque<T>, T>,
        }
    }
}

impl<T: Shaped + Send + Sync + 'static> Shaped for LinkedList<T> {
    fn shape() -> Shape {
        Shape::Collection {
            factory: sequence_factory::<LinkedList<T>, T>,
        }
    }
}

impl<T: Shaped + Eq + Hash + Send + Sync + 'static> Shaped for HashSet<T> {
    fn shape() -> Shape {
        Shape::Collection {
            factory: sequence_factory::<HashSet<T>, T>,
        }
    }
}

impl<T: Shaped + Ord + Send + Sync + 'static> Shaped for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::Collection {
            factory: sequence_factory::<BTreeSet<T>, T>,
        }
    }
}

/// Fixed-length array transformer: sequence grammar, tuple-style exact-arity
/// enforcement.
pub struct ArrayTransformer<T, const N: usize> {
    element: Arc<dyn Transformer<T>>,
    grammar: Grammar,
    codec: EscapeCodec,
}

impl<T: 'static, const N: usize> Transformer<[T; N]> for ArrayTransformer<T, N> {
    fn parse(&self, input: &str) -> Result<[T; N]> {
        let inner = strip_borders(input, self.grammar.start(), self.grammar.end())?;
        let mut items: SmallVec<[T; 8]> = SmallVec::new();
        if N == 0 {
            if !inner.is_empty() {
                return Err(FormatError::too_many_elements(0, inner).into());
            }
        } else {
            let mut segments = Segments::new(
                inner,
                self.grammar.delimiter(),
                self.grammar.escape(),
                true,
            );
            let mut prev_raw = "";
            let mut last_terminator = None;
            while items.len() < N {
                let segment = match segments.next() {
                    Some(segment) => segment,
                    None => {
                        return Err(
                            FormatError::element_not_found(items.len() + 1, prev_raw).into()
                        )
                    }
                };
                let item = match self.codec.decode(segment.text)? {
                    Decoded::Null => self.element.parse_null()?,
                    Decoded::Text(text) => self.element.parse(&text)?,
                };
                items.push(item);
                prev_raw = segment.text;
                last_terminator = segment.terminator;
            }
            if last_terminator.is_some() {
                let extra = segments
                    .next()
                    .map(|segment| segment.text)
                    .unwrap_or_default();
                return Err(FormatError::too_many_elements(N, extra).into());
            }
        }
        match <[T; N]>::try_from(items.into_vec()) {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("element count was verified against N"),
        }
    }

    fn format(&self, value: &[T; N], out: &mut TextBuffer) -> Result<()> {
        if let Some(border) = self.grammar.start() {
            out.push(border);
        }
        let mut scratch = TextBuffer::new();
        for (index, item) in value.iter().enumerate() {
            if index > 0 {
                out.push(self.grammar.delimiter());
            }
            if self.element.formats_as_null(item) {
                out.push(self.grammar.null_marker());
            } else {
                scratch.clear();
                self.element.format(item, &mut scratch)?;
                self.codec.encode_into(scratch.as_str(), out);
            }
        }
        if let Some(border) = self.grammar.end() {
            out.push(border);
        }
        Ok(())
    }
}

fn array_factory<T, const N: usize>(ctx: &ResolveContext<'_>) -> Result<ErasedTransformer>
where
    T: Shaped + 'static,
{
    let grammar = *ctx.config().sequence();
    let codec = EscapeCodec::for_grammar(&grammar);
    let transformer = ArrayTransformer::<T, N> {
        element: ctx.resolve::<T>()?,
        grammar,
        codec,
    };
    Ok(erase(Arc::new(transformer) as Arc<dyn Transformer<[T; N]>>))
}

impl<T: Shaped + 'static, const N: usize> Shaped for [T; N] {
    fn shape() -> Shape {
        Shape::FixedSequence {
            len: N,
            factory: array_factory::<T, N>,
        }
    }
}

/// Map-like transformer. `M` is the concrete map kind to reconstruct:
/// `HashMap` (unordered), `BTreeMap` (sorted), or `IndexMap` (insertion
/// order preserved).
pub struct MapTransformer<M, K, V> {
    entries: PairTransformer<K, V>,
    _map: PhantomData<fn() -> M>,
}

impl<M, K, V> Transformer<M> for MapTransformer<M, K, V>
where
    M: FromIterator<(K, V)> + Send + Sync + 'static,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
    K: 'static,
    V: 'static,
{
    fn parse(&self, input: &str) -> Result<M> {
        let grammar = &self.entries.grammar;
        let inner = strip_borders(input, grammar.start(), grammar.end())?;
        Segments::new(inner, grammar.pair_delimiter(), grammar.escape(), false)
            .map(|segment| self.entries.parse_token(segment.text))
            .collect()
    }

    fn format(&self, value: &M, out: &mut TextBuffer) -> Result<()> {
        let pair_delimiter = self.entries.grammar.pair_delimiter();
        if let Some(border) = self.entries.grammar.start() {
            out.push(border);
        }
        let mut wrote_any = false;
        for (key, entry_value) in value {
            self.entries.format_entry(key, entry_value, out)?;
            out.push(pair_delimiter);
            wrote_any = true;
        }
        if wrote_any {
            out.pop();
        }
        if let Some(border) = self.entries.grammar.end() {
            out.push(border);
        }
        Ok(())
    }
}

fn map_factory<M, K, V>(ctx: &ResolveContext<'_>) -> Result<ErasedTransformer>
where
    M: FromIterator<(K, V)> + Send + Sync + 'static,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
    K: Shaped + 'static,
    V: Shaped + 'static,
{
    let transformer = MapTransformer::<M, K, V> {
        entries: build_pair::<K, V>(ctx)?,
        _map: PhantomData,
    };
    Ok(erase(Arc::new(transformer) as Arc<dyn Transformer<M>>))
}

impl<K, V> Shaped for HashMap<K, V>
where
    K: Shaped + Eq + Hash + Send + Sync + 'static,
    V: Shaped + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Map {
            factory: map_factory::<HashMap<K, V>, K, V>,
        }
    }
}

impl<K, V> Shaped for BTreeMap<K, V>
where
    K: Shaped + Ord + Send + Sync + 'static,
    V: Shaped + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Map {
            factory: map_factory::<BTreeMap<K, V>, K, V>,
        }
    }
}

impl<K, V> Shaped for IndexMap<K, V>
where
    K: Shaped + Eq + Hash + Send + Sync + 'static,
    V: Shaped + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Map {
            factory: map_factory::<IndexMap<K, V>, K, V>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_borders_requires_both() {
        assert_eq!(strip_borders("(a,b)", Some('('), Some(')')).unwrap(), "a,b");
        assert_eq!(strip_borders("  (a)  ", Some('('), Some(')')).unwrap(), "a");
        assert_eq!(strip_borders("a|b", None, None).unwrap(), "a|b");

        let err = strip_borders("a,b)", Some('('), Some(')')).unwrap_err();
        assert_eq!(err, FormatError::border_mismatch('(', true, "a,b)"));

        let err = strip_borders("(a,b", Some('('), Some(')')).unwrap_err();
        assert_eq!(err, FormatError::border_mismatch(')', false, "(a,b"));
    }

    #[test]
    fn borderless_input_is_not_trimmed() {
        assert_eq!(strip_borders(" a ", None, None).unwrap(), " a ");
    }
}
