//! Error taxonomy for construction, lookup, and combinator failures.
//!
//! Every error is raised synchronously at the point of violation; nothing is
//! retried internally. Combinators are fallible-but-pure: a failed operation
//! leaves its receiver untouched, since sealed instances expose no mutation.

use std::fmt;

/// Alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All the ways a frozen-map operation can fail.
///
/// `Clone` is required because the structural-hash cache memoizes the first
/// failure and returns the very same error on every later attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A construction source that is not a mapping or a sequence of
    /// key-value pairs.
    InvalidSource {
        kind: &'static str,
        why: &'static str,
    },
    /// A key whose hash cannot be computed, rejected at construction time.
    UnhashableKey { kind: &'static str },
    /// A value whose hash cannot be computed. For a whole map this failure
    /// is memoized: once observed it is re-raised forever, never retried.
    Unhashable { kind: &'static str },
    /// A missing-key read.
    KeyNotFound { key: String },
    /// A positional accessor past either end of the table.
    IndexOutOfRange { index: isize, len: usize },
    /// An arithmetic-style combinator given an incompatible operand.
    UnsupportedOperand {
        op: &'static str,
        kind: &'static str,
    },
    /// A value that is neither hashable nor convertible by the freeze
    /// conversion table.
    Unfreezable { kind: &'static str },
    /// A conflicting or missing entry in the freeze converter registry.
    FreezeRegistry {
        kind: &'static str,
        why: &'static str,
    },
}

impl Error {
    /// Reinterprets a value-hashing failure as a key-hashing failure.
    ///
    /// Used on paths where the unhashable value was about to become a key.
    pub(crate) fn into_key_error(self) -> Error {
        match self {
            Error::Unhashable { kind } => Error::UnhashableKey { kind },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSource { kind, why } => {
                write!(f, "invalid construction source of type {kind}: {why}")
            }
            Error::UnhashableKey { kind } => {
                write!(f, "unhashable key of type {kind}")
            }
            Error::Unhashable { kind } => {
                write!(f, "unhashable value of type {kind}")
            }
            Error::KeyNotFound { key } => write!(f, "key not found: {key}"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} entries")
            }
            Error::UnsupportedOperand { op, kind } => {
                write!(f, "unsupported operand type for {op}: {kind}")
            }
            Error::Unfreezable { kind } => {
                write!(f, "type {kind} is not hashable and has no freeze conversion")
            }
            Error::FreezeRegistry { kind, why } => {
                write!(f, "freeze registry: {kind}: {why}")
            }
        }
    }
}

impl std::error::Error for Error {}
