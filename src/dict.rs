//! The insertion-ordered dictionary.
//!
//! [`Dict`] maps normalized [`Key`]s to [`Value`]s and remembers the order in which keys
//! were first inserted. Replacing the value of a present key keeps its position.
//!
//! # Versioning
//! [`Dict::version`] counts structural mutations: a key added, a key removed, or a
//! non-empty dictionary cleared. Replacing a value is not structural and leaves the
//! version unchanged.
//!
//! # Lossy keys
//! A key that cannot be normalized (see [`Key::new`]) turns [`Dict::set`] into a no-op.
//! Nothing panics or returns an error for the shape of the data.

use std::fmt::{self, Debug};
use std::iter::FusedIterator;

use crate::ingest::flatten;
use crate::key::{Key, KeyId, ToKey};
use crate::store::{self, Entry, EntryStore};
use crate::value::{Item, Value};

/// An insertion-ordered dictionary over heterogeneous keys and values.
///
/// Entries live inline for small dictionaries and spill to the heap once more than
/// [`INLINE_CAPACITY`](crate::INLINE_CAPACITY) keys are present.
///
/// # Example
/// ```rust
/// use small_dict::{Dict, Value};
///
/// let mut d = Dict::from_values([Value::from(vec![10, 20, 30])]);
/// assert_eq!(d.keys().collect::<Vec<_>>(), ["0", "1", "2"]);
///
/// d.set("x", 1).set("y", 2);
/// assert_eq!(d.get("x"), Some(&Value::Int(1)));
///
/// let last = d.pop_item().unwrap();
/// assert_eq!(last.key, Some(Value::from("y")));
/// ```
#[derive(Clone, Default)]
pub struct Dict {
    version: u64,
    store: EntryStore,
}

impl Dict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self {
            version: 0,
            store: EntryStore::new(),
        }
    }

    /// Creates a dictionary and [`update`](Self::update)s it from `sources`.
    pub fn from_values<I, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut dict = Self::new();
        dict.update(sources);
        dict
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of structural mutations since creation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` while the entries are still stored inline.
    #[inline]
    pub fn is_on_stack(&self) -> bool {
        self.store.is_on_stack()
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// A new key is appended after every existing key and bumps the version. A present
    /// key keeps its position and only its value is replaced. A key that cannot be
    /// normalized is ignored.
    pub fn set<K>(&mut self, key: K, value: impl Into<Value>) -> &mut Self
    where
        K: ToKey,
    {
        match key.to_key() {
            Ok(key) => self.insert_key(key, value.into()),
            Err(err) => tracing::trace!(%err, "ignoring entry with unusable key"),
        }
        self
    }

    fn insert_key(&mut self, key: Key, value: Value) {
        if let Some(entry) = self.store.get_mut(key.id()) {
            if entry.key.name() != key.name() {
                tracing::warn!(
                    id = key.id(),
                    existing = entry.key.name(),
                    incoming = key.name(),
                    "key identity collision, replacing existing value"
                );
            }
            entry.value = value;
            return;
        }
        self.store.push(Entry { key, value });
        self.version += 1;
    }

    /// Returns the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        Q: ToKey + ?Sized,
    {
        let id = self.get_key_id(key)?;
        self.store.get(id).map(|entry| &entry.value)
    }

    /// Returns the value stored for `key`, or `default` if there is none.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a Value) -> &'a Value
    where
        Q: ToKey + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns a mutable reference to the value stored for `key`.
    ///
    /// Editing a value in place is not a structural change.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Value>
    where
        Q: ToKey + ?Sized,
    {
        let id = self.get_key_id(key)?;
        self.store.get_mut(id).map(|entry| &mut entry.value)
    }

    /// Returns the identity of `key` if it is present.
    pub fn get_key_id<Q>(&self, key: &Q) -> Option<KeyId>
    where
        Q: ToKey + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let id = key.to_key().ok()?.id();
        self.store.get(id).map(|_| id)
    }

    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ToKey + ?Sized,
    {
        self.get_key_id(key).is_some()
    }

    /// Removes `key`, keeping the relative order of the remaining keys.
    ///
    /// Returns `true` if an entry was removed.
    pub fn del<Q>(&mut self, key: &Q) -> bool
    where
        Q: ToKey + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn pop<Q>(&mut self, key: &Q) -> Option<Value>
    where
        Q: ToKey + ?Sized,
    {
        self.remove_entry(key).map(|entry| entry.value)
    }

    /// Removes `key` and returns its value, or returns `default` if it is absent.
    pub fn pop_or<Q>(&mut self, key: &Q, default: impl Into<Value>) -> Value
    where
        Q: ToKey + ?Sized,
    {
        self.pop(key).unwrap_or_else(|| default.into())
    }

    fn remove_entry<Q>(&mut self, key: &Q) -> Option<Entry>
    where
        Q: ToKey + ?Sized,
    {
        let id = self.get_key_id(key)?;
        let entry = self.store.remove(id)?;
        self.version += 1;
        Some(entry)
    }

    /// Removes the most recently inserted entry.
    ///
    /// The returned item is keyed by the entry's display name.
    pub fn pop_item(&mut self) -> Option<Item> {
        let entry = self.store.pop()?;
        self.version += 1;
        Some(Item::new(entry.key.into_name(), entry.value))
    }

    /// Removes every entry. Returns `false`, without touching the version, if the
    /// dictionary was already empty.
    pub fn clear(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.store.clear();
        self.version += 1;
        true
    }

    /// Display names of the keys, in insertion order.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.store.iter(),
        }
    }

    /// Values, in insertion order.
    pub fn values(&self) -> Values<'_> {
        Values {
            inner: self.store.iter(),
        }
    }

    /// `(display name, value)` pairs, in insertion order.
    ///
    /// The iterator borrows the dictionary, so it cannot be mutated while iterating.
    /// [`into_items`](Self::into_items) yields owned [`Item`]s instead.
    /// Dropping the iterator early releases nothing but the borrow.
    pub fn items(&self) -> Items<'_> {
        Items {
            inner: self.store.iter(),
        }
    }

    /// Consumes the dictionary, yielding owned items in insertion order.
    pub fn into_items(self) -> IntoItems {
        IntoItems {
            inner: self.store.into_iter(),
        }
    }

    /// Merges every source into the dictionary.
    ///
    /// A `Value::Dict` source is merged entry by entry in its insertion order: keys
    /// already present keep their position and take the new value, others are appended.
    /// Any other source is flattened (see [`flatten`](crate::ingest::flatten)); an item
    /// without a key is keyed by the dictionary's length at the moment it is inserted,
    /// so consecutive unkeyed items get consecutive integer keys.
    ///
    /// Returns `true` if the version changed.
    pub fn update<I, V>(&mut self, sources: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let version = self.version;
        for source in sources {
            match source.into() {
                Value::Dict(other) => {
                    for entry in other.store {
                        self.insert_key(entry.key, entry.value);
                    }
                }
                other => {
                    for item in flatten(other) {
                        let key = item.key.unwrap_or_else(|| Value::from(self.len()));
                        self.set(key, item.value);
                    }
                }
            }
        }
        version != self.version
    }
}

// --- Traits ---

impl Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items()).finish()
    }
}

/// Two dictionaries are equal if they hold equal entries in the same order. The
/// version is not compared.
impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items().eq(other.items())
    }
}

impl<K, V> FromIterator<(K, V)> for Dict
where
    K: ToKey,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dict = Dict::new();
        dict.extend(iter);
        dict
    }
}

impl<K, V> Extend<(K, V)> for Dict
where
    K: ToKey,
    V: Into<Value>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a str, &'a Value);
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}

impl IntoIterator for Dict {
    type Item = Item;
    type IntoIter = IntoItems;

    fn into_iter(self) -> Self::IntoIter {
        self.into_items()
    }
}

// --- Iterators ---

/// Iterator over display names, returned by [`Dict::keys`].
pub struct Keys<'a> {
    inner: store::Iter<'a>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| entry.key.name())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Keys<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| entry.key.name())
    }
}

impl ExactSizeIterator for Keys<'_> {}

impl FusedIterator for Keys<'_> {}

/// Iterator over values, returned by [`Dict::values`].
pub struct Values<'a> {
    inner: store::Iter<'a>,
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Value;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| &entry.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Values<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| &entry.value)
    }
}

impl ExactSizeIterator for Values<'_> {}

impl FusedIterator for Values<'_> {}

/// Iterator over `(display name, value)` pairs, returned by [`Dict::items`].
///
/// This is a borrowing view. For owned [`Item`]s, use [`Dict::into_items`] or
/// [`Dict::pop_item`].
pub struct Items<'a> {
    inner: store::Iter<'a>,
}

impl<'a> Iterator for Items<'a> {
    type Item = (&'a str, &'a Value);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (entry.key.name(), &entry.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Items<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| (entry.key.name(), &entry.value))
    }
}

impl ExactSizeIterator for Items<'_> {}

impl FusedIterator for Items<'_> {}

/// Owning iterator returned by [`Dict::into_items`].
pub struct IntoItems {
    inner: store::IntoIter,
}

impl Iterator for IntoItems {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        self.inner
            .next()
            .map(|entry| Item::new(entry.key.into_name(), entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

// ─── Absent dictionaries ──────────────────────────────────────────────────────

/// Read-tolerant and self-healing access to a dictionary that may not exist yet.
///
/// Queries treat `None` as an empty dictionary. [`set`](Self::set) creates the
/// dictionary on first use.
pub trait OptionDictExt {
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn version(&self) -> u64;
    fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        Q: ToKey + ?Sized;
    fn set<K>(&mut self, key: K, value: impl Into<Value>) -> &mut Dict
    where
        K: ToKey;
}

impl OptionDictExt for Option<Dict> {
    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(Dict::is_empty)
    }

    fn len(&self) -> usize {
        self.as_ref().map_or(0, Dict::len)
    }

    fn version(&self) -> u64 {
        self.as_ref().map_or(0, Dict::version)
    }

    fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        Q: ToKey + ?Sized,
    {
        self.as_ref()?.get(key)
    }

    fn set<K>(&mut self, key: K, value: impl Into<Value>) -> &mut Dict
    where
        K: ToKey,
    {
        self.get_or_insert_with(Dict::new).set(key, value)
    }
}
