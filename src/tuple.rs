//! Module `tuple` defines the seams this crate uses to reach the host
//! database engine's tuple storage, kept deliberately thin per `spec.md`
//! §1's Out-of-scope list: the tuple allocator, its reference counting, and
//! the wire/message-pack decoder are all external collaborators here.
//!
//! Grounded in `rdms`'s generic `K, V` type parameters threaded through
//! `Llrb<K, V>`/`Entry<K, V>` (`rdms/src/llrb.rs`, `rdms/src/core.rs`): this
//! crate plays the same role with a single `T: Clone` tuple handle type
//! instead of a split key/value pair, since the key lives in the Z-address
//! and `T` is opaque payload.

use crate::scalar::ScalarValue;

/// A host-owned tuple handle. Cheap to clone (typically a reference-counted
/// pointer into the host's tuple arena); the index never inspects its
/// contents except through a [`KeyExtractor`].
pub trait TupleHandle: Clone {}

impl<T: Clone> TupleHandle for T {}

/// Resolves the scalar values of an indexed key from a tuple, standing in
/// for the host's tuple-format/field-extraction service (`spec.md` §1,
/// §9 "Global state").
pub trait KeyExtractor<T> {
    /// Extract the `dim` scalar values making up the indexed key of
    /// `tuple`, in key-part order.
    fn extract(&self, tuple: &T) -> Vec<ScalarValue>;
}
