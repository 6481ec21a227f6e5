//! Heterogeneous values stored in and ingested by a [`Dict`].
//!
//! [`Value`] is a closed tagged variant. Every shape the dictionary can ingest or store
//! has exactly one variant, so the ingestion dispatch in [`ingest`](crate::ingest) is an
//! exhaustive `match` instead of runtime type inspection.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Display};
use std::hash::BuildHasher;
use std::sync::Arc;

use crate::dict::Dict;
#[cfg(feature = "stream")]
use crate::stream::ValueStream;

// ─── Kind ─────────────────────────────────────────────────────────────────────

/// The shape tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Text,
    Opaque,
    Seq,
    Map,
    Dict,
    Item,
    Stream,
}

impl Kind {
    /// Returns `true` if values of this kind have a canonical text form and can
    /// therefore be used as dictionary keys.
    #[inline]
    pub const fn is_key_kind(self) -> bool {
        matches!(
            self,
            Kind::Int | Kind::UInt | Kind::Float | Kind::Str | Kind::Text
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::UInt => "uint",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::Text => "text",
            Kind::Opaque => "opaque",
            Kind::Seq => "seq",
            Kind::Map => "map",
            Kind::Dict => "dict",
            Kind::Item => "item",
            Kind::Stream => "stream",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static kind of a Rust type, used to tag the key type of a [`KeyedMap`] built from a
/// native map.
pub trait KindOf {
    const KIND: Kind;
}

// ─── Value ────────────────────────────────────────────────────────────────────

/// A dynamically-typed value.
///
/// | Variant | Usable as key |
/// |---------|---------------|
/// | `Int`, `UInt`, `Float`, `Str`, `Text` | yes |
/// | everything else | no |
///
/// All signed integer widths widen into `Int`, all unsigned widths into `UInt`, and
/// `f32` into `Float`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Any object with a textual form. Keyed by its `Display` output.
    Text(Arc<dyn Display + Send + Sync>),
    /// Any other caller object. Stored and returned, never usable as a key.
    Opaque(Arc<dyn Any + Send + Sync>),
    Seq(Vec<Value>),
    Map(KeyedMap),
    Dict(Box<Dict>),
    Item(Box<Item>),
    #[cfg(feature = "stream")]
    Stream(ValueStream),
}

impl Value {
    /// Wraps a displayable object. It is usable as a key through its `Display` output.
    pub fn text<T>(object: T) -> Self
    where
        T: Display + Send + Sync + 'static,
    {
        Value::Text(Arc::new(object))
    }

    /// Wraps an arbitrary object that has no textual form.
    pub fn opaque<T>(object: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Value::Opaque(Arc::new(object))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::UInt(_) => Kind::UInt,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Text(_) => Kind::Text,
            Value::Opaque(_) => Kind::Opaque,
            Value::Seq(_) => Kind::Seq,
            Value::Map(_) => Kind::Map,
            Value::Dict(_) => Kind::Dict,
            Value::Item(_) => Kind::Item,
            #[cfg(feature = "stream")]
            Value::Stream(_) => Kind::Stream,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer that fits.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Returns a reference to the wrapped object if this is an `Opaque` holding a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(object) => object.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Text(t) => f.debug_tuple("Text").field(&format_args!("{t}")).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
            Value::Seq(s) => f.debug_tuple("Seq").field(s).finish(),
            Value::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Value::Dict(d) => f.debug_tuple("Dict").field(d).finish(),
            Value::Item(i) => f.debug_tuple("Item").field(i).finish(),
            #[cfg(feature = "stream")]
            Value::Stream(s) => f.debug_tuple("Stream").field(s).finish(),
        }
    }
}

/// Structural equality. `Text` compares by rendered text, `Opaque` and `Stream` by
/// identity of the shared object.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => Arc::ptr_eq(a, b) || a.to_string() == b.to_string(),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Item(a), Value::Item(b)) => a == b,
            #[cfg(feature = "stream")]
            (Value::Stream(a), Value::Stream(b)) => a.shares_source(b),
            _ => false,
        }
    }
}

// --- Conversions ---

macro_rules! impl_from_int {
    ($variant:ident, $kind:ident, $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }

            impl KindOf for $t {
                const KIND: Kind = Kind::$kind;
            }
        )*
    };
}

impl_from_int!(Int, Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(UInt, UInt, u64: u8, u16, u32, u64, usize);

impl From<f64> for Value {
    #[inline]
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl KindOf for f32 {
    const KIND: Kind = Kind::Float;
}

impl KindOf for f64 {
    const KIND: Kind = Kind::Float;
}

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl KindOf for bool {
    const KIND: Kind = Kind::Bool;
}

impl From<String> for Value {
    #[inline]
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl KindOf for String {
    const KIND: Kind = Kind::Str;
}

impl KindOf for &str {
    const KIND: Kind = Kind::Str;
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Value
where
    K: KindOf + Into<Value>,
    V: Into<Value>,
    S: BuildHasher,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        Value::Map(KeyedMap::with_entries(K::KIND, map))
    }
}

impl<K, V> From<BTreeMap<K, V>> for Value
where
    K: KindOf + Into<Value>,
    V: Into<Value>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::Map(KeyedMap::with_entries(K::KIND, map))
    }
}

impl From<KeyedMap> for Value {
    #[inline]
    fn from(map: KeyedMap) -> Self {
        Value::Map(map)
    }
}

impl From<Item> for Value {
    #[inline]
    fn from(item: Item) -> Self {
        Value::Item(Box::new(item))
    }
}

impl From<Dict> for Value {
    #[inline]
    fn from(dict: Dict) -> Self {
        Value::Dict(Box::new(dict))
    }
}

impl From<&Dict> for Value {
    #[inline]
    fn from(dict: &Dict) -> Self {
        Value::Dict(Box::new(dict.clone()))
    }
}

#[cfg(feature = "stream")]
impl From<ValueStream> for Value {
    #[inline]
    fn from(stream: ValueStream) -> Self {
        Value::Stream(stream)
    }
}

// ─── Item ─────────────────────────────────────────────────────────────────────

/// A key/value pair exchanged between ingestion and the dictionary.
///
/// An item without a key is keyed by the dictionary's length at the moment it is
/// inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: Option<Value>,
    pub value: Value,
}

impl Item {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }

    pub fn unkeyed(value: impl Into<Value>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }
}

// ─── KeyedMap ─────────────────────────────────────────────────────────────────

/// A keyed map whose key type is declared up front.
///
/// When the declared key kind cannot be a dictionary key, ingestion skips the whole map,
/// not individual entries.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMap {
    key_kind: Kind,
    entries: Vec<(Value, Value)>,
}

impl KeyedMap {
    pub fn new(key_kind: Kind) -> Self {
        Self {
            key_kind,
            entries: Vec::new(),
        }
    }

    /// Builds a map from entries whose keys are already distinct, such as the contents
    /// of a native map. Duplicate keys are kept as separate entries; use
    /// [`insert`](Self::insert) to replace instead.
    pub fn with_entries<K, V, I>(key_kind: Kind, entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            key_kind,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    #[inline]
    pub fn key_kind(&self) -> Kind {
        self.key_kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, replacing the value of an equal key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> std::vec::IntoIter<(Value, Value)> {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_integer_widths_widen() {
        assert_eq!(Value::from(7i8), Value::Int(7));
        assert_eq!(Value::from(-7isize), Value::Int(-7));
        assert_eq!(Value::from(7u16), Value::UInt(7));
        assert_eq!(Value::from(usize::MAX), Value::UInt(usize::MAX as u64));
        assert_eq!(Value::from(0.5f32), Value::Float(0.5));
    }

    #[test]
    fn test_value_kinds_and_key_predicate() {
        assert!(Value::from(1).kind().is_key_kind());
        assert!(Value::from(1u8).kind().is_key_kind());
        assert!(Value::from(1.5).kind().is_key_kind());
        assert!(Value::from("a").kind().is_key_kind());
        assert!(Value::text(42).kind().is_key_kind());

        assert!(!Value::Null.kind().is_key_kind());
        assert!(!Value::from(true).kind().is_key_kind());
        assert!(!Value::from(vec![1, 2]).kind().is_key_kind());
        assert!(!Value::opaque(()).kind().is_key_kind());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(3u8).as_int(), Some(3));
        assert_eq!(Value::from(-3).as_uint(), None);
        assert_eq!(Value::from(u64::MAX).as_int(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(2)), Value::Int(2));
        assert_eq!(Value::from([1, 2]).as_seq().map(<[Value]>::len), Some(2));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(1).as_bool(), None);
        assert_eq!(Value::from(2.5f64).as_float(), Some(2.5));
        assert_eq!(Value::from(2).as_float(), None);
        assert!(Value::Null.is_null());
        assert!(!Value::from(0).is_null());

        let mut d = Dict::new();
        d.set("k", 1);
        assert_eq!(Value::from(&d).as_dict(), Some(&d));
        assert_eq!(Value::from("k").as_dict(), None);
    }

    #[test]
    fn test_value_opaque_downcast_and_identity() {
        #[derive(Debug, PartialEq)]
        struct Car {
            recalls: u32,
        }

        let v = Value::opaque(Car { recalls: 5 });
        assert_eq!(v.downcast_ref::<Car>(), Some(&Car { recalls: 5 }));
        assert_eq!(v.downcast_ref::<String>(), None);

        let same = v.clone();
        assert_eq!(v, same);
        assert_ne!(v, Value::opaque(Car { recalls: 5 }));
        assert_eq!(format!("{:?}", v), "Opaque(..)");
    }

    #[test]
    fn test_value_text_compares_rendered_form() {
        assert_eq!(Value::text("abc"), Value::text(String::from("abc")));
        assert_eq!(format!("{:?}", Value::text(12)), "Text(12)");
    }

    #[test]
    fn test_keyed_map_from_native_maps() {
        let mut native = HashMap::new();
        native.insert("a", 1);
        native.insert("b", 2);
        let Value::Map(map) = Value::from(native) else {
            panic!("expected a map");
        };
        assert_eq!(map.key_kind(), Kind::Str);
        assert_eq!(map.len(), 2);

        let mut tree = BTreeMap::new();
        tree.insert(true, 1);
        let Value::Map(map) = Value::from(tree) else {
            panic!("expected a map");
        };
        assert_eq!(map.key_kind(), Kind::Bool);
        assert!(!map.key_kind().is_key_kind());
    }

    #[test]
    fn test_keyed_map_from_large_native_map() {
        let native: BTreeMap<u64, u64> = (0..50_000).map(|i| (i, i * 2)).collect();
        let Value::Map(map) = Value::from(native) else {
            panic!("expected a map");
        };
        assert_eq!(map.len(), 50_000);
        assert_eq!(map.key_kind(), Kind::UInt);
        assert_eq!(map.iter().nth(49_999), Some(&(Value::UInt(49_999), Value::UInt(99_998))));
    }

    #[test]
    fn test_keyed_map_with_entries_keeps_source_order() {
        let map = KeyedMap::with_entries(Kind::Str, [("b", 1), ("a", 2)]);
        let keys: Vec<_> = map.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Value::from("b"), Value::from("a")]);
    }

    #[test]
    fn test_keyed_map_insert_replaces_equal_key() {
        let mut map = KeyedMap::new(Kind::Int);
        assert_eq!(map.insert(1, "a"), None);
        assert_eq!(map.insert(1, "b"), Some(Value::from("a")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some(&(Value::Int(1), Value::from("b"))));
    }
}
