//! Module `iter` implements the index façade's iterator types: the
//! box-scan scroll loop (spec §4.E.3) and the frozen snapshot iterator
//! (spec §4.G `create_snapshot_iterator`).
//!
//! Grounded in `rdms/src/llrb_common.rs`'s `Iter<'a, K, V>` (a path-stack
//! `Iterator` over `Llrb`) for the underlying cursor, and in `rdms`'s
//! `PiecewiseScan`/`pw_scan` (`rdms/src/llrb.rs`) for the idea of an
//! iterator that re-seeks itself as it walks rather than holding a single
//! linear cursor.

use log::trace;

use crate::boxscan::{get_next_zvalue, is_relevant};
use crate::llrb::{Iter, Llrb};
use crate::llrb_node::Record;
use crate::tuple::TupleHandle;
use crate::zaddress::ZAddress;

/// Forward iterator over an axis-aligned box `[lo, hi]`, implementing the
/// is_relevant / get_next_zvalue scroll of spec §4.E.3.
///
/// Ordinary advances reuse the same underlying [`Iter`] cursor (so records
/// tied on the same Z-address and distinguished only by `hint` are never
/// skipped); the cursor is only replaced, via [`Llrb::iter_from`], when a
/// non-relevant run is jumped over. A mutation of the tree between calls
/// to `next()` is an ordinary borrow-checker error, not a stale-cursor
/// hazard to recover from (spec §4.E.4; see `DESIGN.md`).
pub struct BoxIter<'a, T: TupleHandle> {
    tree: &'a Llrb<T>,
    dim: usize,
    lo: ZAddress,
    hi: ZAddress,
    cursor: Iter<'a, T>,
    exhausted: bool,
}

impl<'a, T: TupleHandle> BoxIter<'a, T> {
    pub fn new(tree: &'a Llrb<T>, dim: usize, lo: ZAddress, hi: ZAddress) -> BoxIter<'a, T> {
        let cursor = tree.iter_from(&lo);
        BoxIter {
            tree,
            dim,
            lo,
            hi,
            cursor,
            exhausted: false,
        }
    }
}

impl<'a, T: TupleHandle> Iterator for BoxIter<'a, T> {
    type Item = Record<T>;

    fn next(&mut self) -> Option<Record<T>> {
        if self.exhausted {
            return None;
        }
        loop {
            let candidate = match self.cursor.next() {
                None => {
                    self.exhausted = true;
                    return None;
                }
                Some(r) => r,
            };
            if candidate.z > self.hi {
                self.exhausted = true;
                return None;
            }
            if is_relevant(candidate.z.bitvec(), self.lo.bitvec(), self.hi.bitvec(), self.dim) {
                return Some(candidate.clone());
            }
            trace!("boxscan: jumping past non-relevant z");
            let jumped = ZAddress(get_next_zvalue(
                candidate.z.bitvec(),
                self.lo.bitvec(),
                self.hi.bitvec(),
                self.dim,
            ));
            if jumped > self.hi {
                self.exhausted = true;
                return None;
            }
            self.cursor = self.tree.iter_from(&jumped);
        }
    }
}

/// Frozen full-range iterator over a snapshot vector (spec §4.G
/// `create_snapshot_iterator`): the host's "delayed free" window keeps
/// tuples alive while this is live (spec §5 "Snapshot iteration").
pub struct SnapshotIter<T: TupleHandle> {
    records: std::vec::IntoIter<Record<T>>,
}

impl<T: TupleHandle> SnapshotIter<T> {
    pub fn new(records: Vec<Record<T>>) -> SnapshotIter<T> {
        SnapshotIter {
            records: records.into_iter(),
        }
    }
}

impl<T: TupleHandle> Iterator for SnapshotIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.records.next().map(|r| r.tuple)
    }
}
