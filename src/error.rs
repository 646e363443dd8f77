//! Error types returned by every fallible operation in this crate.
//!
//! Following the flat-enum style used throughout the `rdms` codebase
//! (the original `error.rs` was a bare `enum BognError`), no intermediate
//! error-crate is used; every variant is propagated explicitly and nothing
//! panics except genuine programmer errors (mismatched bit-vector lengths,
//! corrupted tree invariants under `debug_assertions`).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `KeyDef::new` was asked for a dimension outside `[1, 20]`.
    UnsupportedDimension(u8),
    /// `part_count` passed to `get`/`create_iterator`/`replace` did not
    /// match `d`, `2*d` or (for iterators) `0`.
    InvalidKeyShape { expected: String, got: usize },
    /// `create_iterator` was asked for an iterator type other than
    /// `All`, `Eq`, `Ge`.
    UnsupportedIteratorType(&'static str),
    /// insert collided with an existing record and the replace mode
    /// forbade clobbering it.
    DuplicateConflict,
    /// a scalar value's runtime variant did not match the `ScalarType`
    /// declared for that key part.
    ScalarTypeMismatch { expected: &'static str, part: usize },
    /// the growable build buffer could not be sized (stands in for the
    /// allocator-failure path of the host's mempool).
    Oom,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedDimension(d) => {
                write!(f, "dimension {} is outside the supported range [1, 20]", d)
            }
            Error::InvalidKeyShape { expected, got } => write!(
                f,
                "invalid key shape: expected part_count in {{{}}}, got {}",
                expected, got
            ),
            Error::UnsupportedIteratorType(t) => {
                write!(f, "unsupported iterator type: {}", t)
            }
            Error::DuplicateConflict => {
                write!(f, "duplicate z-address conflicts with an existing record")
            }
            Error::ScalarTypeMismatch { expected, part } => {
                write!(f, "key part {} does not carry a {} value", part, expected)
            }
            Error::Oom => write!(f, "allocation failed"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
