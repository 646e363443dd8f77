//! Module `index` is the top-level façade (spec §4.G / §6 vtable): the
//! type an embedding query planner actually holds. It owns a [`KeyDef`],
//! a [`ZAddressBuilder`], and the [`Llrb`] ordered container, and
//! translates key-part slices and iterator-type requests into the
//! lower-level bit-vector operations of `boxscan`/`zaddress`.
//!
//! Grounded in `rdms/src/llrb.rs`'s `Llrb<K, V>` inherent API (`get`,
//! `set`/`set_cas`, `iter`, `range`) and in `examples/original_source/src/box/memtx_zcurve.c`'s
//! `memtx_zcurve_*` vtable functions (`replace`, `create_iterator`,
//! `build_next`/`end_build`, `size`/`bsize`, `count`), which this module's
//! public methods are named and shaped after one-for-one.

use log::{debug, warn};
use rand::Rng;

use crate::boxscan::is_relevant;
use crate::error::{Error, Result};
use crate::iter::{BoxIter, SnapshotIter};
use crate::key::KeyDef;
use crate::llrb::Llrb;
use crate::llrb_node::Record;
use crate::scalar::ScalarValue;
use crate::stats::Stats;
use crate::tuple::{KeyExtractor, TupleHandle};
use crate::zaddress::{ZAddress, ZAddressBuilder};

/// How a `replace` collision with an existing Z-address/hint pair should
/// be handled (spec §4.G "replace modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Overwrite the existing record.
    Clobber,
    /// Keep the existing record; report the conflict.
    NoClobber,
}

/// The iterator shapes this index can hand back (spec §6.3): a full
/// scan, an exact point lookup, a from-point-to-the-curve's-end scan, and
/// an orthogonal box scan. `Unsupported` stands in for the wire-level
/// iterator kinds the host vtable can be asked for but this index refuses
/// — strict `>`/`<` and reverse orders (spec §6.3, §9 Open Question 1) —
/// carrying the requested kind's name through to
/// [`Error::UnsupportedIteratorType`].
pub enum IterRequest<'a> {
    All,
    Eq(&'a [ScalarValue]),
    /// `part_count == d` under `GE` (spec §4.G): scan every record whose
    /// Z-address is at or past the point `values` encodes, per lane.
    GePoint(&'a [ScalarValue]),
    /// `part_count == 2*d` under `GE` (spec §4.G): scan the orthogonal box
    /// `values` encodes as alternating lo/hi bounds per dimension.
    Ge(&'a [ScalarValue]),
    Unsupported(&'static str),
}

/// A multidimensional secondary index: a Z-order-curve-ordered container
/// of `(ZAddress, hint, tuple)` records, queryable by point, full scan,
/// or orthogonal range.
pub struct ZIndex<T: TupleHandle> {
    key_def: KeyDef,
    builder: ZAddressBuilder,
    tree: Llrb<T>,
    /// Growable accumulator used between `build_next` and `end_build`
    /// (spec §4.G "Bulk build").
    build_buf: Option<Vec<Record<T>>>,
}

impl<T: TupleHandle> ZIndex<T> {
    pub fn new(key_def: KeyDef) -> ZIndex<T> {
        debug!(
            "zindex: constructed, dimension={} unique={}",
            key_def.dimension(),
            key_def.is_unique()
        );
        let builder = ZAddressBuilder::new(key_def.clone());
        ZIndex {
            key_def,
            builder,
            tree: Llrb::new(),
            build_buf: None,
        }
    }

    pub fn key_def(&self) -> &KeyDef {
        &self.key_def
    }

    /// Exact point lookup: `values` is one scalar per dimension.
    /// Extracts the tuple from the first matching record, if any.
    pub fn get(&self, values: &[ScalarValue]) -> Result<Option<&T>> {
        let z = self.builder.encode_point(values)?;
        Ok(self.tree.find_first(&z).map(|r| &r.tuple))
    }

    /// Insert or overwrite a tuple under the key extracted via `extractor`.
    /// `hint` breaks ties between distinct tuples colliding on the same
    /// Z-address (spec §3 "Indexed record").
    ///
    /// Duplicate conflicts (spec §7 "Duplicate conflict") are detected at
    /// two levels: the container only ever treats an exact `(z, hint)`
    /// match as the same record, but a unique [`KeyDef`] additionally
    /// forbids two distinct tuples from sharing a Z-address at all, so a
    /// `NoClobber` replace on a unique index also rejects any existing
    /// record with equal `z` regardless of `hint`.
    pub fn replace<E: KeyExtractor<T>>(
        &mut self,
        tuple: T,
        hint: u64,
        extractor: &E,
        mode: ReplaceMode,
    ) -> Result<Option<T>> {
        let values = extractor.extract(&tuple);
        let z = self.builder.encode_point(&values)?;
        if mode == ReplaceMode::NoClobber
            && self.key_def.is_unique()
            && self.tree.find_first(&z).is_some()
        {
            return Err(Error::DuplicateConflict);
        }
        let record = Record::new(z, hint, tuple);
        let clobber = mode == ReplaceMode::Clobber;
        match self.tree.insert(record, clobber) {
            None => Err(Error::DuplicateConflict),
            Some(displaced) => {
                if !clobber && displaced.is_some() {
                    warn!("zindex: replace displaced a record unexpectedly in NoClobber mode");
                }
                Ok(displaced.map(|r| r.tuple))
            }
        }
    }

    pub fn remove(&mut self, values: &[ScalarValue], hint: u64) -> Result<Option<T>> {
        let z = self.builder.encode_point(values)?;
        Ok(self.tree.delete(&z, hint).map(|r| r.tuple))
    }

    /// Build an iterator per spec §6.2's `part_count` convention: `All`
    /// needs no key parts, `Eq`/`GePoint` need `d` (a point — `Eq` pins
    /// both corners to it, `GePoint` leaves the upper corner at `ones`),
    /// `Ge` needs `2*d` (a box's lo/hi bounds, scanned from `lo` onward and
    /// filtered to the box — the only range shape this index supports,
    /// spec §1 Non-goal "arbitrary predicate pushdown").
    pub fn create_iterator(&self, request: IterRequest<'_>) -> Result<BoxIter<'_, T>> {
        let dim = self.key_def.dimension();
        match request {
            IterRequest::All => {
                let lo = ZAddress::zeros(dim);
                let hi = ZAddress::ones(dim);
                Ok(BoxIter::new(&self.tree, dim, lo, hi))
            }
            IterRequest::Eq(values) => {
                let z = self.builder.encode_point(values)?;
                Ok(BoxIter::new(&self.tree, dim, z.clone(), z))
            }
            IterRequest::GePoint(values) => {
                let lo = self.builder.encode_point(values)?;
                let hi = ZAddress::ones(dim);
                Ok(BoxIter::new(&self.tree, dim, lo, hi))
            }
            IterRequest::Ge(values) => {
                let (lo, hi) = self.builder.encode_box(values)?;
                Ok(BoxIter::new(&self.tree, dim, lo, hi))
            }
            IterRequest::Unsupported(kind) => Err(Error::UnsupportedIteratorType(kind)),
        }
    }

    /// A frozen, host-delayed-free iterator over every tuple currently in
    /// the index (spec §4.G `create_snapshot_iterator`).
    pub fn create_snapshot_iterator(&self) -> SnapshotIter<T> {
        let records = self.tree.freeze();
        debug!("zindex: snapshot frozen, entries={}", records.len());
        SnapshotIter::new(records)
    }

    /// Count records matching `request` without materializing them
    /// (spec §4.G `count`).
    pub fn count(&self, request: IterRequest<'_>) -> Result<usize> {
        Ok(self.create_iterator(request)?.count())
    }

    /// Accumulate one tuple into the bulk-build buffer (spec §4.G
    /// `build_next`). Must be paired with [`ZIndex::end_build`]; any
    /// records already in the tree are discarded once `end_build` runs,
    /// matching the host's "index rebuild" use of this pair. Growing the
    /// buffer is fallible (`Error::Oom`) rather than aborting the
    /// process, standing in for the host mempool returning `NULL`.
    pub fn build_next<E: KeyExtractor<T>>(
        &mut self,
        tuple: T,
        hint: u64,
        extractor: &E,
    ) -> Result<()> {
        let values = extractor.extract(&tuple);
        let z = self.builder.encode_point(&values)?;
        let buf = self.build_buf.get_or_insert_with(Vec::new);
        buf.try_reserve(1).map_err(|_| Error::Oom)?;
        buf.push(Record::new(z, hint, tuple));
        Ok(())
    }

    /// Commit the accumulated `build_next` calls, replacing the tree in
    /// one balanced build (spec §4.G `end_build`; `Llrb::build`).
    pub fn end_build(&mut self) {
        let buf = self.build_buf.take().unwrap_or_default();
        debug!("zindex: end_build committing {} records", buf.len());
        self.tree.build(buf);
    }

    /// Entry count (spec §4.G `size`).
    pub fn size(&self) -> usize {
        self.tree.len()
    }

    /// Approximate total footprint: the tree's node storage plus one
    /// packed Z-address per entry (spec §4.G `bsize`).
    pub fn bsize(&self) -> usize {
        let words = self.key_def.words();
        self.tree.mem_used() + self.tree.len() * crate::bitvec::BitVec::bsize(words)
    }

    pub fn stats(&self) -> Stats {
        self.tree.stats()
    }

    /// Uniformly sampled record (spec §4.G `random`).
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        self.tree.random(rng).map(|r| &r.tuple)
    }

    /// Tear the index down. Unlike the host's chunked background
    /// teardown (spec §4.G/§5, `N` records freed per yield point), a
    /// safe-Rust owned tree has no per-node deallocation hazard for a
    /// cooperative scheduler to interleave around: dropping `self.tree`
    /// is a single synchronous, non-suspending operation. See
    /// `DESIGN.md` for the open-question resolution.
    pub fn destroy(self) {
        drop(self);
    }

    #[cfg(debug_assertions)]
    pub fn validate(&self) -> std::result::Result<usize, String> {
        self.tree.validate()
    }
}

/// Exercise `is_relevant` directly against a raw box, bypassing the
/// tree — used by `count`'s callers that already hold decoded bounds.
/// Kept free-standing rather than a method since it needs no `&self`.
pub fn box_contains(z: &ZAddress, lo: &ZAddress, hi: &ZAddress, dim: usize) -> bool {
    is_relevant(z.bitvec(), lo.bitvec(), hi.bitvec(), dim)
}
