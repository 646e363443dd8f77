//! Module `interleave` builds the per-dimension lookup tables that turn `d`
//! normalized 64-bit lanes into one interleaved [`BitVec`] (a Morton/Z-order
//! address), and applies them.
//!
//! Grounded in `salad/bit_array.c`'s `fill_table`/
//! `bit_array_interleave_new_lookup_tables`/`bit_array_interleave` from
//! `examples/original_source`: for each dimension `k` and each possible byte
//! value `0..=255`, a table entry pre-spreads that byte's 8 bits to their
//! final interleaved bit positions (`j*dim + k`). Encoding then walks the
//! lanes one octet at a time, ORing in the appropriate table entries and
//! shifting by `dim*8` bits per octet, instead of interleaving bit-by-bit.

use crate::bitvec::BitVec;

/// Precomputed interleave tables for a fixed dimension `dim`.
///
/// `tables[k][byte]` is a `BitVec` with the 8 bits of `byte` spread to
/// position `bit*dim + k`, for dimension `k` in `0..dim`.
pub struct InterleaveTables {
    dim: usize,
    words: usize,
    tables: Vec<Vec<BitVec>>,
}

impl InterleaveTables {
    /// Build the lookup tables for `dim` lanes producing a `words`-word
    /// output [`BitVec`] (`words = ceil(dim * 8 / 64)`, spec §4.B).
    pub fn new(dim: usize, words: usize) -> InterleaveTables {
        assert!(dim >= 1, "interleave: dim must be >= 1");
        let mut tables = Vec::with_capacity(dim);
        for k in 0..dim {
            let mut per_byte = Vec::with_capacity(256);
            for byte in 0u32..256 {
                let mut entry = BitVec::zeros(words);
                for bit in 0..8u32 {
                    if (byte >> bit) & 1 == 1 {
                        entry.set(bit as usize * dim + k);
                    }
                }
                per_byte.push(entry);
            }
            tables.push(per_byte);
        }
        InterleaveTables { dim, words, tables }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn words(&self) -> usize {
        self.words
    }

    /// Interleave `lanes` (one normalized 64-bit value per dimension) into
    /// `out`, an already-zeroed `BitVec` of `self.words()` words.
    ///
    /// Mirrors `bit_array_interleave`: 8 octets, most-significant octet
    /// first, each octet of each lane contributing its spread bits at an
    /// offset of `octet_index * dim * 8`.
    pub fn interleave(&self, lanes: &[u64], out: &mut BitVec) {
        assert_eq!(lanes.len(), self.dim, "interleave: lane count mismatch");
        out.clear_all();
        let mut scratch = BitVec::zeros(self.words);
        for octet_index in 0..8 {
            scratch.clear_all();
            let shift = (8 - octet_index) * 8;
            for (k, &lane) in lanes.iter().enumerate() {
                let byte = ((lane >> (shift - 8)) & 0xff) as usize;
                BitVec::or(&mut scratch, &self.tables[k][byte]);
            }
            scratch.shift_left((7 - octet_index) * self.dim * 8);
            BitVec::or(out, &scratch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_dim_interleave_matches_manual_bits() {
        let words = (2 * 64 + 63) / 64;
        let tables = InterleaveTables::new(2, words);
        let mut out = BitVec::zeros(words);
        // lane0 = 0b01 (x), lane1 = 0b10 (y) -> interleaved low bits:
        // bit0 = x_bit0 = 1 at position 0*2+0=0
        // bit1 = y_bit0 = 0 at position 0*2+1=1 -> but y=0b10 has bit0=0, bit1=1
        tables.interleave(&[0b01, 0b10], &mut out);
        assert!(out.get(0)); // x bit0
        assert!(!out.get(1)); // y bit0
        assert!(!out.get(2)); // x bit1
        assert!(out.get(3)); // y bit1
    }

    #[test]
    fn three_dim_zero_lanes_yield_zero() {
        let words = (3 * 64 + 63) / 64;
        let tables = InterleaveTables::new(3, words);
        let mut out = BitVec::ones(words);
        tables.interleave(&[0, 0, 0], &mut out);
        for i in 0..out.bit_len() {
            assert!(!out.get(i));
        }
    }

    #[test]
    fn all_ones_lanes_set_every_bit_up_to_dim_times_64() {
        let dim = 2;
        let words = (dim * 64 + 63) / 64;
        let tables = InterleaveTables::new(dim, words);
        let mut out = BitVec::zeros(words);
        tables.interleave(&[u64::MAX, u64::MAX], &mut out);
        for i in 0..dim * 64 {
            assert!(out.get(i), "bit {} should be set", i);
        }
    }
}
