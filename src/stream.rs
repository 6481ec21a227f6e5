#![cfg(feature = "stream")]
//! Externally produced value streams.
//!
//! A [`ValueStream`] is a shared handle over a source of values that carry no keys of
//! their own. The source is either pulled (any `Iterator`) or pushed into a
//! `std::sync::mpsc` channel by a producer thread. Clones of the handle share the same
//! source, so the stream is consumed once no matter how many handles exist.
//!
//! Closing the stream drops the source. For a push source this drops the `Receiver`,
//! which wakes any producer blocked in `send` with a disconnection error.

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use parking_lot::Mutex;

use crate::value::Value;

enum Source {
    Pull(Box<dyn Iterator<Item = Value> + Send>),
    Push(Receiver<Value>),
}

struct Shared {
    source: Mutex<Option<Source>>,
    closed: AtomicBool,
}

/// A cloneable, single-consumer handle over a value source.
#[derive(Clone)]
pub struct ValueStream {
    shared: Arc<Shared>,
}

impl ValueStream {
    /// Creates a stream that pulls its values from `iter`.
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::with_source(Source::Pull(Box::new(iter.into_iter())))
    }

    /// Creates a stream that receives values pushed by the senders of `rx`.
    pub fn from_receiver(rx: Receiver<Value>) -> Self {
        Self::with_source(Source::Push(rx))
    }

    fn with_source(source: Source) -> Self {
        Self {
            shared: Arc::new(Shared {
                source: Mutex::new(Some(source)),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the next value, blocking on a push source until one arrives.
    ///
    /// Returns `None` once the source is exhausted, disconnected or closed. An
    /// exhausted source is released immediately. A value that arrives after the stream
    /// was closed is discarded.
    pub fn recv(&self) -> Option<Value> {
        if self.is_closed() {
            return None;
        }
        let mut guard = self.shared.source.lock();
        let next = match guard.as_mut()? {
            Source::Pull(iter) => iter.next(),
            Source::Push(rx) => rx.recv().ok(),
        };
        if next.is_none() || self.is_closed() {
            *guard = None;
            self.shared.closed.store(true, Ordering::Release);
            return None;
        }
        next
    }

    /// Closes the stream. Later calls to [`recv`](Self::recv) return `None`.
    ///
    /// Never blocks. If another handle is waiting in `recv`, the source is dropped by
    /// that handle as soon as its wait ends; otherwise it is dropped here.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        if let Some(mut guard) = self.shared.source.try_lock() {
            guard.take();
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Returns `true` if both handles refer to the same source.
    #[inline]
    pub fn shares_source(&self, other: &ValueStream) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Debug for ValueStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_closed() {
            "closed"
        } else {
            match self.shared.source.try_lock() {
                Some(guard) => match guard.as_ref() {
                    Some(Source::Pull(_)) => "pull",
                    Some(Source::Push(_)) => "push",
                    None => "closed",
                },
                None => "busy",
            }
        };
        f.debug_struct("ValueStream").field("source", &state).finish()
    }
}

impl From<Receiver<Value>> for ValueStream {
    fn from(rx: Receiver<Value>) -> Self {
        Self::from_receiver(rx)
    }
}

impl Iterator for ValueStream {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.recv()
    }
}
