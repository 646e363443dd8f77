//! Module `key` defines the index's configuration object: the shape and
//! typing of the composite key the index is built over.
//!
//! Grounded in `rdms/src/llrb.rs`'s `LlrbFactory` (a small builder struct
//! fixing an index's name/lsm-mode/spinlatch before any tree exists) —
//! `KeyDef` plays the analogous role here, fixed once at construction and
//! threaded through every subsequent operation (spec §3 "Key definition").

use crate::error::{Error, Result};
use crate::scalar::ScalarType;

/// Upper bound on index dimension (spec §3; also `bitvec::MAX_WORDS`).
pub const MAX_DIMENSION: u8 = 20;

/// Fixed, immutable description of the composite key an index is ordered
/// on: how many dimensions, each dimension's scalar type, whether the key
/// must be unique, and whether parts may carry SQL-style NULL.
#[derive(Debug, Clone)]
pub struct KeyDef {
    parts: Vec<ScalarType>,
    unique: bool,
    nullable: bool,
}

impl KeyDef {
    /// Construct a key definition over `parts` (one [`ScalarType`] per
    /// dimension). Fails if `parts` is empty or exceeds
    /// [`MAX_DIMENSION`].
    pub fn new(parts: Vec<ScalarType>, unique: bool, nullable: bool) -> Result<KeyDef> {
        let d = parts.len();
        if d == 0 || d > MAX_DIMENSION as usize {
            return Err(Error::UnsupportedDimension(d as u8));
        }
        Ok(KeyDef {
            parts,
            unique,
            nullable,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn part_type(&self, i: usize) -> ScalarType {
        self.parts[i]
    }

    #[inline]
    pub fn parts(&self) -> &[ScalarType] {
        &self.parts
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Number of 64-bit words a [`crate::bitvec::BitVec`] built from this
    /// key must have to hold one bit per dimension per source bit
    /// (`dim` words for 64-bit lanes, spec §4.A/§4.D).
    #[inline]
    pub fn words(&self) -> usize {
        self.dimension()
    }

    /// Validate that a flat key-part or box-bound slice matches this
    /// key's shape. `expected_multiplier` is `1` for a point key, `2` for
    /// a lo/hi box bound.
    pub fn validate_shape(&self, got: usize, expected_multiplier: usize) -> Result<()> {
        let expected = self.dimension() * expected_multiplier;
        if got != expected {
            return Err(Error::InvalidKeyShape {
                expected: expected.to_string(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(KeyDef::new(vec![], false, false).is_err());
        let too_many = vec![ScalarType::Unsigned; MAX_DIMENSION as usize + 1];
        assert!(KeyDef::new(too_many, false, false).is_err());
    }

    #[test]
    fn accepts_max_dimension() {
        let parts = vec![ScalarType::Unsigned; MAX_DIMENSION as usize];
        let kd = KeyDef::new(parts, true, false).unwrap();
        assert_eq!(kd.dimension(), MAX_DIMENSION as usize);
        assert_eq!(kd.words(), MAX_DIMENSION as usize);
    }

    #[test]
    fn validate_shape_point_vs_box() {
        let kd = KeyDef::new(
            vec![ScalarType::Unsigned, ScalarType::String],
            false,
            true,
        )
        .unwrap();
        assert!(kd.validate_shape(2, 1).is_ok());
        assert!(kd.validate_shape(4, 2).is_ok());
        assert!(kd.validate_shape(3, 1).is_err());
    }
}
