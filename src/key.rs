//! Key normalization.
//!
//! A raw [`Value`] becomes a [`Key`] by rendering it to its canonical text and hashing
//! that text with 64-bit FNV-1a. Keys compare by hash only: two values whose canonical
//! texts are equal are the same dictionary key, regardless of their original type.
//!
//! | Kind | Canonical text |
//! |------|----------------|
//! | `Int`, `UInt` | base-10, no separators |
//! | `Float` | shortest round-trip decimal, never exponent notation; `NaN`, `+Inf`, `-Inf` |
//! | `Str` | the string itself |
//! | `Text` | the object's `Display` output |
//!
//! # Limitation
//! Distinct canonical texts that hash to the same [`KeyId`] are treated as one key. The
//! dictionary logs a warning when it notices this on insert, but does not separate them.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

use crate::error::KeyError;
use crate::value::{Kind, Value};

/// Identity of a key: the FNV-1a hash of its canonical text.
pub type KeyId = u64;

/// A normalized dictionary key.
#[derive(Debug, Clone)]
pub struct Key {
    id: KeyId,
    name: String,
}

impl Key {
    /// Normalizes `raw` into a key.
    pub fn new(raw: &Value) -> Result<Self, KeyError> {
        canonical_text(raw)
            .map(Self::from_name)
            .ok_or(KeyError::Unhashable { kind: raw.kind() })
    }

    /// Builds a key directly from an already canonical text.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: key_id(&name),
            name,
        }
    }

    #[inline]
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// The canonical text of the key, as returned by [`Dict::keys`](crate::Dict::keys).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn into_name(self) -> String {
        self.name
    }
}

impl TryFrom<&Value> for Key {
    type Error = KeyError;

    fn try_from(raw: &Value) -> Result<Self, Self::Error> {
        Key::new(raw)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// --- ToKey ---

/// Types that can be normalized into a [`Key`] without first building a [`Value`].
///
/// Lookups take `&Q where Q: ToKey`, so `dict.get("name")` and `dict.get(&7)` hash the
/// canonical text directly.
pub trait ToKey {
    fn to_key(&self) -> Result<Key, KeyError>;
}

impl ToKey for Value {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        Key::new(self)
    }
}

impl ToKey for Key {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        Ok(self.clone())
    }
}

impl ToKey for str {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        Ok(Key::from_name(self))
    }
}

impl ToKey for String {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        Ok(Key::from_name(self.as_str()))
    }
}

impl ToKey for bool {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        Err(KeyError::Unhashable { kind: Kind::Bool })
    }
}

macro_rules! impl_to_key_via_value {
    ($($t:ty),*) => {
        $(
            impl ToKey for $t {
                #[inline]
                fn to_key(&self) -> Result<Key, KeyError> {
                    Key::new(&Value::from(*self))
                }
            }
        )*
    };
}

impl_to_key_via_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: ToKey + ?Sized> ToKey for &T {
    #[inline]
    fn to_key(&self) -> Result<Key, KeyError> {
        (**self).to_key()
    }
}

/// Normalizes `raw`, or returns `None` if it cannot be a key.
#[inline]
pub fn normalize(raw: &Value) -> Option<Key> {
    Key::new(raw).ok()
}

/// Renders a key-kind value to its canonical text.
pub fn canonical_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Int(i) => Some(i.to_string()),
        Value::UInt(u) => Some(u.to_string()),
        Value::Float(f) => Some(float_text(*f)),
        Value::Str(s) => Some(s.clone()),
        Value::Text(t) => Some(t.to_string()),
        _ => None,
    }
}

/// FNV-1a over the UTF-8 bytes of `text`.
#[inline]
pub fn key_id(text: &str) -> KeyId {
    let mut hasher = FnvHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

// `Display` for f64 is already the shortest round-trip form without an exponent.
fn float_text(f: f64) -> String {
    if f.is_infinite() {
        if f.is_sign_positive() { "+Inf" } else { "-Inf" }.to_owned()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(v: impl Into<Value>) -> String {
        canonical_text(&v.into()).unwrap()
    }

    #[test]
    fn test_key_integer_text() {
        assert_eq!(name(0), "0");
        assert_eq!(name(-42i8), "-42");
        assert_eq!(name(1_000_000u32), "1000000");
        assert_eq!(name(i64::MIN), "-9223372036854775808");
        assert_eq!(name(u64::MAX), "18446744073709551615");
    }

    #[test]
    fn test_key_float_text_shortest_round_trip() {
        assert_eq!(name(1.0), "1");
        assert_eq!(name(0.1), "0.1");
        assert_eq!(name(-2.5), "-2.5");
        assert_eq!(name(1e21), "1000000000000000000000");
        assert_eq!(name(1e-7), "0.0000001");
        assert_eq!(name(f64::NAN), "NaN");
        assert_eq!(name(f64::INFINITY), "+Inf");
        assert_eq!(name(f64::NEG_INFINITY), "-Inf");
        // f32 widens before rendering.
        assert_eq!(name(0.5f32), "0.5");
    }

    #[test]
    fn test_key_string_and_text() {
        assert_eq!(name("hello world"), "hello world");
        assert_eq!(name(""), "");

        struct Vin(&'static str);
        impl Display for Vin {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "VIN:{}", self.0)
            }
        }
        assert_eq!(canonical_text(&Value::text(Vin("WDD"))).unwrap(), "VIN:WDD");
    }

    #[test]
    fn test_key_identity_is_textual() {
        let a = Key::new(&Value::from(1)).unwrap();
        let b = Key::new(&Value::from(1u8)).unwrap();
        let c = Key::new(&Value::from(1.0)).unwrap();
        let d = Key::new(&Value::from("1")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert_ne!(a, Key::new(&Value::from(1.5)).unwrap());
    }

    #[test]
    fn test_key_fnv1a_vectors() {
        assert_eq!(key_id(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(key_id("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(Key::from_name("a").id(), key_id("a"));
    }

    #[test]
    fn test_key_rejects_unusable_kinds() {
        assert_eq!(
            Key::new(&Value::Null),
            Err(KeyError::Unhashable { kind: Kind::Null })
        );
        assert_eq!(
            Key::try_from(&Value::from(true)),
            Err(KeyError::Unhashable { kind: Kind::Bool })
        );
        assert!(normalize(&Value::from(vec![1])).is_none());
        assert!(normalize(&Value::opaque(3u8)).is_none());
    }

    #[test]
    fn test_to_key_matches_value_normalization() {
        assert_eq!("abc".to_key().unwrap().id(), key_id("abc"));
        assert_eq!(7u16.to_key().unwrap(), Key::new(&Value::from(7)).unwrap());
        assert_eq!(2.5f64.to_key().unwrap().name(), "2.5");
        assert_eq!((&&String::from("s")).to_key().unwrap().name(), "s");
        assert!(true.to_key().is_err());
        assert!(Value::Null.to_key().is_err());
    }
}
