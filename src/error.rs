//! Error types.
//!
//! The dictionary itself never fails on bad input: an unusable key turns [`Dict::set`]
//! into a no-op. [`KeyError`] is the typed reason behind that no-op, surfaced by
//! [`Key::new`] for callers that want to know why a value was rejected.
//!
//! [`Dict::set`]: crate::Dict::set
//! [`Key::new`]: crate::Key::new

use thiserror::Error;

use crate::value::Kind;

/// Why a value cannot be turned into a dictionary key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Only integers, floats, strings and displayable objects have a canonical text form.
    #[error("a value of kind `{kind}` cannot be used as a dictionary key")]
    Unhashable { kind: Kind },
}
