//! # Small Dict
//!
//! An insertion-ordered dictionary over heterogeneous keys and values, in the spirit of
//! a dynamic-language `dict`: stable iteration order, replace-on-duplicate insert, pop
//! by key or by recency, and bulk ingestion from arbitrarily shaped sources.
//!
//! ## Key Features
//!
//! * **Textual key identity:** Integers, floats, strings and any `Display` object are
//!   usable as keys. Keys are compared by their canonical text, so `1`, `1u8`, `1.0` and
//!   `"1"` address the same entry.
//! * **Stack Optimization:** Up to [`INLINE_CAPACITY`] entries are stored inline; the
//!   dictionary spills to a heap `OrderMap` when it grows larger.
//! * **Versioning:** [`Dict::version`] counts structural changes only (keys added or
//!   removed), never value replacement.
//! * **Lossy by design:** A key that cannot be normalized is silently ignored.
//! * **Bulk ingestion:** [`Dict::update`] flattens sequences, keyed maps, single items,
//!   other dictionaries and value streams into entries.
//!
//! ## Feature flags
//!
//! * `stream` (default): [`ValueStream`] and stream ingestion.
//!
//! ## Examples
//!
//! ### Building and mutating
//!
//! ```rust
//! use small_dict::{Value, dict};
//!
//! // Sequences are keyed by position.
//! let mut d = dict![vec![10, 20, 30]];
//! assert_eq!(d.get(&1), Some(&Value::Int(20)));
//!
//! d.set("name", "small");
//! d.set(1, 21); // replaces in place, version unchanged
//! assert_eq!(d.keys().collect::<Vec<_>>(), ["0", "1", "2", "name"]);
//! assert_eq!(d.version(), 4);
//!
//! assert!(d.del(&0));
//! assert_eq!(d.keys().collect::<Vec<_>>(), ["1", "2", "name"]);
//! ```
//!
//! ### Merging
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use small_dict::{Dict, Value};
//!
//! let mut prices = BTreeMap::new();
//! prices.insert("apple", 3);
//! prices.insert("pear", 4);
//!
//! let base = Dict::from_values([prices]);
//! let mut merged = Dict::from_values([&base]);
//! merged.update([Value::from("unkeyed")]);
//!
//! assert_eq!(merged.keys().collect::<Vec<_>>(), ["apple", "pear", "2"]);
//! assert_eq!(base.len(), 2);
//! ```

// --- Module Declarations ---

pub mod dict;
pub mod error;
pub mod ingest;
pub mod key;
mod store;
#[cfg(feature = "stream")]
pub mod stream;
pub mod value;

// --- Re-exports ---

pub use dict::{Dict, OptionDictExt};
pub use error::KeyError;
pub use ingest::{Ingest, flatten};
pub use key::{Key, KeyId, ToKey};
pub use store::INLINE_CAPACITY;
#[cfg(feature = "stream")]
pub use stream::ValueStream;
pub use value::{Item, KeyedMap, Kind, KindOf, Value};

/// Builds a [`Dict`] from any number of sources, like [`Dict::from_values`].
///
/// ```rust
/// use small_dict::{Item, dict};
///
/// let d = dict![Item::new("a", 1), vec!["x", "y"]];
/// assert_eq!(d.keys().collect::<Vec<_>>(), ["a", "0", "1"]);
/// ```
#[macro_export]
macro_rules! dict {
    () => {
        $crate::Dict::new()
    };
    ($($source:expr),+ $(,)?) => {
        $crate::Dict::from_values([$($crate::Value::from($source)),+])
    };
}
