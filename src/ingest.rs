//! Flattening arbitrary values into key/value items.
//!
//! [`flatten`] turns one [`Value`] into a lazy, single-use sequence of [`Item`]s:
//!
//! | Input | Items |
//! |-------|-------|
//! | `Item` | that item, unchanged |
//! | `Map` with a key-kind key type | one per entry, keyed by the entry key |
//! | `Map` with any other key type | none; the whole map is skipped |
//! | `Seq` | one per element, keyed by position |
//! | `Stream` | one per received value, unkeyed, until the stream ends |
//! | `Null` | none |
//! | anything else | the value itself, unkeyed |
//!
//! Unkeyed items are keyed by the consumer, see [`Dict::update`](crate::Dict::update).
//!
//! A stream-backed [`Ingest`] that is dropped before the stream ends closes the stream,
//! so a producer pushing into it is disconnected instead of blocking forever.

use std::iter::Enumerate;
use std::vec;

use crate::value::{Item, Value};
#[cfg(feature = "stream")]
use crate::stream::ValueStream;

/// Lazy sequence of items produced by [`flatten`].
#[derive(Debug)]
pub struct Ingest {
    state: State,
}

#[derive(Debug)]
enum State {
    Single(Option<Item>),
    Entries(vec::IntoIter<(Value, Value)>),
    Elements(Enumerate<vec::IntoIter<Value>>),
    #[cfg(feature = "stream")]
    Stream(ValueStream),
    Done,
}

/// Flattens `value` into the items it contributes to a dictionary.
pub fn flatten(value: Value) -> Ingest {
    let state = match value {
        Value::Null => State::Done,
        Value::Item(item) => State::Single(Some(*item)),
        Value::Map(map) => {
            if map.key_kind().is_key_kind() {
                State::Entries(map.into_entries())
            } else {
                tracing::debug!(
                    key_kind = %map.key_kind(),
                    entries = map.len(),
                    "skipping map with unusable key type"
                );
                State::Done
            }
        }
        Value::Seq(elements) => State::Elements(elements.into_iter().enumerate()),
        #[cfg(feature = "stream")]
        Value::Stream(stream) => State::Stream(stream),
        other => State::Single(Some(Item::unkeyed(other))),
    };
    Ingest { state }
}

impl Ingest {
    /// Stops ingestion early, closing a stream-backed source.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        match std::mem::replace(&mut self.state, State::Done) {
            #[cfg(feature = "stream")]
            State::Stream(stream) => {
                tracing::debug!("closing stream abandoned before exhaustion");
                stream.close();
            }
            _ => {}
        }
    }
}

impl Iterator for Ingest {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let next = match &mut self.state {
            State::Single(item) => item.take(),
            State::Entries(entries) => entries.next().map(|(k, v)| Item::new(k, v)),
            State::Elements(elements) => elements.next().map(|(i, v)| Item::new(i, v)),
            #[cfg(feature = "stream")]
            State::Stream(stream) => stream.recv().map(Item::unkeyed),
            State::Done => None,
        };
        if next.is_none() {
            self.state = State::Done;
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::Single(item) => {
                let n = usize::from(item.is_some());
                (n, Some(n))
            }
            State::Entries(entries) => entries.size_hint(),
            State::Elements(elements) => elements.size_hint(),
            #[cfg(feature = "stream")]
            State::Stream(_) => (0, None),
            State::Done => (0, Some(0)),
        }
    }
}

impl Drop for Ingest {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Kind, KeyedMap};
    use std::collections::HashMap;

    #[test]
    fn test_flatten_item_passes_through() {
        let items: Vec<_> = flatten(Item::new("k", 1).into()).collect();
        assert_eq!(items, vec![Item::new("k", 1)]);

        let items: Vec<_> = flatten(Item::unkeyed(2).into()).collect();
        assert_eq!(items, vec![Item::unkeyed(2)]);
    }

    #[test]
    fn test_flatten_seq_keys_by_position() {
        let items: Vec<_> = flatten(vec![10, 20, 30].into()).collect();
        assert_eq!(
            items,
            vec![Item::new(0usize, 10), Item::new(1usize, 20), Item::new(2usize, 30)]
        );
    }

    #[test]
    fn test_flatten_empty_seq_yields_nothing() {
        assert_eq!(flatten(Vec::<i32>::new().into()).count(), 0);
    }

    #[test]
    fn test_flatten_map_with_key_kind() {
        let mut native = HashMap::new();
        native.insert("x", 1);
        native.insert("y", 2);
        let mut items: Vec<_> = flatten(native.into()).collect();
        items.sort_by_key(|item| item.key.as_ref().and_then(Value::as_str).map(str::to_owned));
        assert_eq!(items, vec![Item::new("x", 1), Item::new("y", 2)]);
    }

    #[test]
    fn test_flatten_map_with_unusable_key_kind_is_skipped_whole() {
        let mut map = KeyedMap::new(Kind::Bool);
        map.insert(true, 1);
        map.insert(false, 0);
        assert!(!map.is_empty());
        let mut ingest = flatten(map.into());
        assert_eq!(ingest.size_hint(), (0, Some(0)));
        assert_eq!(ingest.next(), None);
    }

    #[test]
    fn test_flatten_scalar_fallback() {
        for value in [Value::from(true), Value::from(3.5), Value::from("s")] {
            let items: Vec<_> = flatten(value.clone()).collect();
            assert_eq!(items, vec![Item::unkeyed(value)]);
        }
    }

    #[test]
    fn test_flatten_null_yields_nothing() {
        let mut ingest = flatten(Value::Null);
        assert_eq!(ingest.size_hint(), (0, Some(0)));
        assert_eq!(ingest.next(), None);
        assert_eq!(flatten(None::<i32>.into()).count(), 0);
    }

    #[test]
    fn test_flatten_is_single_use() {
        let mut ingest = flatten(Value::from(1));
        assert_eq!(ingest.size_hint(), (1, Some(1)));
        assert!(ingest.next().is_some());
        assert!(ingest.next().is_none());
        assert!(ingest.next().is_none());
    }

    #[cfg(feature = "stream")]
    #[test]
    fn test_flatten_stream_yields_unkeyed_values() {
        let stream = ValueStream::new(vec![Value::from("a"), Value::from("b")]);
        let items: Vec<_> = flatten(stream.clone().into()).collect();
        assert_eq!(items, vec![Item::unkeyed("a"), Item::unkeyed("b")]);
        assert!(stream.is_closed());
    }

    #[cfg(feature = "stream")]
    #[test]
    fn test_flatten_abandoned_stream_disconnects_producer() {
        use std::sync::mpsc;
        use std::thread;

        let (tx, rx) = mpsc::sync_channel(0);
        let producer = thread::spawn(move || {
            let mut sent = 0u32;
            while tx.send(Value::from(sent)).is_ok() {
                sent += 1;
            }
            sent
        });

        let stream = ValueStream::from_receiver(rx);
        let mut ingest = flatten(stream.clone().into());
        assert_eq!(ingest.next(), Some(Item::unkeyed(0u32)));
        drop(ingest);

        assert!(stream.is_closed());
        assert!(producer.join().unwrap() >= 1);
    }

    #[cfg(feature = "stream")]
    #[test]
    fn test_flatten_explicit_close() {
        let stream = ValueStream::new((0..100).map(Value::from));
        let mut ingest = flatten(stream.clone().into());
        assert!(ingest.next().is_some());
        ingest.close();
        assert!(stream.is_closed());
    }
}
