//! Module `zaddress` builds [`BitVec`] Z-addresses from typed key parts and
//! provides the full-range sentinel constructors used by a whole-index
//! scan.
//!
//! Grounded in `examples/original_source/src/box/memtx_zcurve.c`'s
//! `memtx_zcurve_build_key`, which decodes a tuple's key parts, normalizes
//! each to a lane, and interleaves them via the `bit_array_interleave_*`
//! family — the same three-stage pipeline `scalar::normalize` →
//! `InterleaveTables::interleave` implements here.

use crate::bitvec::BitVec;
use crate::error::Result;
use crate::interleave::InterleaveTables;
use crate::key::KeyDef;
use crate::scalar::{normalize, Corner, ScalarValue};

/// A Z-order address: the interleaved, order-preserving encoding of a
/// composite key. Newtype over [`BitVec`] so comparisons and iteration
/// code read in domain terms rather than raw bit-vector terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZAddress(pub BitVec);

impl ZAddress {
    /// The smallest Z-address for a `dim`-dimensional key (all dimensions
    /// at their minimum), used by `create_iterator(ALL)` as the scan's
    /// lower sentinel (spec §9 supplemented feature 1; `zcurve.c: zeros()`).
    pub fn zeros(dim: usize) -> ZAddress {
        ZAddress(BitVec::zeros(dim))
    }

    /// The largest Z-address for a `dim`-dimensional key, the scan's upper
    /// sentinel (`zcurve.c: ones()`).
    pub fn ones(dim: usize) -> ZAddress {
        ZAddress(BitVec::ones(dim))
    }

    pub fn bitvec(&self) -> &BitVec {
        &self.0
    }
}

/// Builds Z-addresses for a fixed [`KeyDef`], owning the interleave tables
/// so repeated builds (one per inserted tuple) don't reallocate them.
pub struct ZAddressBuilder {
    key_def: KeyDef,
    tables: InterleaveTables,
}

impl ZAddressBuilder {
    pub fn new(key_def: KeyDef) -> ZAddressBuilder {
        let dim = key_def.dimension();
        let tables = InterleaveTables::new(dim, key_def.words());
        ZAddressBuilder { key_def, tables }
    }

    pub fn key_def(&self) -> &KeyDef {
        &self.key_def
    }

    /// Encode one point key: `values.len()` must equal the key's
    /// dimension. A `Nil` part normalizes to the all-zero lane, matching
    /// the lower-corner convention (spec §4.C) since a point has no
    /// upper/lower distinction of its own.
    pub fn encode_point(&self, values: &[ScalarValue]) -> Result<ZAddress> {
        self.key_def.validate_shape(values.len(), 1)?;
        let mut lanes = Vec::with_capacity(values.len());
        for (i, v) in values.iter().enumerate() {
            lanes.push(normalize(v, self.key_def.part_type(i), i, Corner::Lower)?);
        }
        let mut out = BitVec::zeros(self.key_def.words());
        self.tables.interleave(&lanes, &mut out);
        Ok(ZAddress(out))
    }

    /// Encode a box's lo/hi bounds: `values` holds `2 * dim` scalars,
    /// `values[2*i]` the lower bound and `values[2*i+1]` the upper bound
    /// of dimension `i` (spec §3 "Range/box key"). A `Nil` lower bound
    /// normalizes to `0`, a `Nil` upper bound to `u64::MAX` (spec §4.C),
    /// so a half-open range widens to the dimension's full extent instead
    /// of collapsing to an empty box.
    pub fn encode_box(&self, values: &[ScalarValue]) -> Result<(ZAddress, ZAddress)> {
        self.key_def.validate_shape(values.len(), 2)?;
        let dim = self.key_def.dimension();
        let mut lo_lanes = Vec::with_capacity(dim);
        let mut hi_lanes = Vec::with_capacity(dim);
        for i in 0..dim {
            lo_lanes.push(normalize(&values[2 * i], self.key_def.part_type(i), i, Corner::Lower)?);
            hi_lanes.push(normalize(&values[2 * i + 1], self.key_def.part_type(i), i, Corner::Upper)?);
        }
        let mut lo = BitVec::zeros(self.key_def.words());
        let mut hi = BitVec::zeros(self.key_def.words());
        self.tables.interleave(&lo_lanes, &mut lo);
        self.tables.interleave(&hi_lanes, &mut hi);
        Ok((ZAddress(lo), ZAddress(hi)))
    }
}
