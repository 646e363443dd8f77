//! Module `llrb` implements the index's ordered container: a left-leaning
//! red-black tree of `(z, hint, tuple)` records (spec §4.F).
//!
//! Grounded in `rdms/src/llrb.rs`, which implements the same rotation
//! vocabulary (`rotate_left`, `rotate_right`, `flip`, `fixup`,
//! `move_red_left`, `move_red_right`) over its own `Node<K, V>`. That
//! implementation additionally supports multi-threaded MVCC snapshots via
//! `Arc`/`AtomicPtr` and unsafe reader/writer handles (`src/mvcc.rs`,
//! `Llrb::to_reader`/`to_writer`); this module drops that machinery since
//! `spec.md` §5 mandates a single-fiber cooperative concurrency model with
//! no concurrent access to the same index, and exposes a safe
//! eagerly-materialized [`Llrb::freeze`] for snapshot iteration instead
//! (see `SPEC_FULL.md` §11).

use std::cmp::Ordering;

use log::error;
use rand::Rng;

use crate::llrb_node::{Node, Record, BLACK, RED};
use crate::stats::Stats;
use crate::tuple::TupleHandle;
use crate::zaddress::ZAddress;

/// A left-leaning red-black tree, ordered by `(z, hint)` (spec §4.F
/// "Comparator").
pub struct Llrb<T: TupleHandle> {
    root: Option<Box<Node<T>>>,
    n_count: usize,
}

impl<T: TupleHandle> Default for Llrb<T> {
    fn default() -> Self {
        Llrb::new()
    }
}

impl<T: TupleHandle> Llrb<T> {
    pub fn new() -> Llrb<T> {
        Llrb {
            root: None,
            n_count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Approximate byte footprint of the tree's nodes (spec §4.F
    /// "mem_used"). Does not include the host tuple's own allocation.
    pub fn mem_used(&self) -> usize {
        self.n_count * std::mem::size_of::<Node<T>>()
    }

    /// Insert `record`. If an equal `(z, hint)` record already existed and
    /// `clobber` is true, it is displaced and returned; if `clobber` is
    /// false, the tree is left untouched and `None` is returned to signal
    /// the caller should raise a duplicate-conflict error (checked before
    /// any mutation, so there is nothing to roll back).
    pub fn insert(&mut self, record: Record<T>, clobber: bool) -> Option<Option<Record<T>>> {
        if !clobber && self.find_exact(&record.z, record.hint).is_some() {
            return None;
        }
        let (mut root, displaced) = Self::do_insert(self.root.take(), record);
        root.color = BLACK;
        self.root = Some(root);
        if displaced.is_none() {
            self.n_count += 1;
        }
        Some(displaced)
    }

    fn do_insert(node: Option<Box<Node<T>>>, record: Record<T>) -> (Box<Node<T>>, Option<Record<T>>) {
        let mut n = match node {
            None => return (Box::new(Node::new(record)), None),
            Some(n) => n,
        };
        let displaced = match record.cmp(&n.record) {
            Ordering::Less => {
                let (left, d) = Self::do_insert(n.left.take(), record);
                n.left = Some(left);
                d
            }
            Ordering::Greater => {
                let (right, d) = Self::do_insert(n.right.take(), record);
                n.right = Some(right);
                d
            }
            Ordering::Equal => Some(std::mem::replace(&mut n.record, record)),
        };
        (Self::fixup(n), displaced)
    }

    /// Remove the record with exact `(z, hint)`, returning it if present.
    pub fn delete(&mut self, z: &ZAddress, hint: u64) -> Option<Record<T>> {
        let (new_root, removed) = Self::do_delete(self.root.take(), z, hint);
        self.root = new_root.map(|mut n| {
            n.color = BLACK;
            n
        });
        if removed.is_some() {
            self.n_count -= 1;
        }
        removed
    }

    fn do_delete(
        node: Option<Box<Node<T>>>,
        z: &ZAddress,
        hint: u64,
    ) -> (Option<Box<Node<T>>>, Option<Record<T>>) {
        let mut n = match node {
            None => return (None, None),
            Some(n) => n,
        };
        if Self::cmp_key(z, hint, &n.record) == Ordering::Less {
            if n.left.is_none() {
                return (Some(n), None);
            }
            if !Node::is_red(&n.left) && !Node::is_red(&n.left.as_ref().unwrap().left) {
                n = Self::move_red_left(n);
            }
            let (left, removed) = Self::do_delete(n.left.take(), z, hint);
            n.left = left;
            (Some(Self::fixup(n)), removed)
        } else {
            if Node::is_red(&n.left) {
                n = Self::rotate_right(n);
            }
            if Self::cmp_key(z, hint, &n.record) == Ordering::Equal && n.right.is_none() {
                return (None, Some(n.record));
            }
            let right_present = n.right.is_some();
            if right_present
                && !Node::is_red(&n.right)
                && !Node::is_red(&n.right.as_ref().unwrap().left)
            {
                n = Self::move_red_right(n);
            }
            if Self::cmp_key(z, hint, &n.record) == Ordering::Equal {
                let (right, min) = Self::delete_min(n.right.take().unwrap());
                let removed = std::mem::replace(&mut n.record, min);
                n.right = right;
                (Some(Self::fixup(n)), Some(removed))
            } else {
                let (right, removed) = Self::do_delete(n.right.take(), z, hint);
                n.right = right;
                (Some(Self::fixup(n)), removed)
            }
        }
    }

    fn delete_min(mut n: Box<Node<T>>) -> (Option<Box<Node<T>>>, Record<T>) {
        if n.left.is_none() {
            return (None, n.record);
        }
        if !Node::is_red(&n.left) && !Node::is_red(&n.left.as_ref().unwrap().left) {
            n = Self::move_red_left(n);
        }
        let (left, min) = Self::delete_min(n.left.take().unwrap());
        n.left = left;
        (Some(Self::fixup(n)), min)
    }

    #[inline]
    fn cmp_key(z: &ZAddress, hint: u64, rec: &Record<T>) -> Ordering {
        z.cmp(&rec.z).then_with(|| hint.cmp(&rec.hint))
    }

    fn rotate_left(mut n: Box<Node<T>>) -> Box<Node<T>> {
        let mut r = n.right.take().expect("rotate_left: missing right child");
        n.right = r.left.take();
        r.color = n.color;
        n.color = RED;
        r.left = Some(n);
        r
    }

    fn rotate_right(mut n: Box<Node<T>>) -> Box<Node<T>> {
        let mut l = n.left.take().expect("rotate_right: missing left child");
        n.left = l.right.take();
        l.color = n.color;
        n.color = RED;
        l.right = Some(n);
        l
    }

    fn flip_colors(n: &mut Box<Node<T>>) {
        n.color = !n.color;
        if let Some(ref mut l) = n.left {
            l.color = !l.color;
        }
        if let Some(ref mut r) = n.right {
            r.color = !r.color;
        }
    }

    fn fixup(mut n: Box<Node<T>>) -> Box<Node<T>> {
        if Node::is_red(&n.right) && !Node::is_red(&n.left) {
            n = Self::rotate_left(n);
        }
        if Node::is_red(&n.left) {
            let left_left_red = matches!(&n.left, Some(l) if Node::is_red(&l.left));
            if left_left_red {
                n = Self::rotate_right(n);
            }
        }
        if Node::is_red(&n.left) && Node::is_red(&n.right) {
            Self::flip_colors(&mut n);
        }
        n
    }

    fn move_red_left(mut n: Box<Node<T>>) -> Box<Node<T>> {
        Self::flip_colors(&mut n);
        if Node::is_red(&n.right.as_ref().unwrap().left) {
            let mut right = n.right.take().unwrap();
            right.left = Some(Self::rotate_right(right.left.take().unwrap()));
            n.right = Some(right);
            n = Self::rotate_left(n);
            Self::flip_colors(&mut n);
        }
        n
    }

    fn move_red_right(mut n: Box<Node<T>>) -> Box<Node<T>> {
        Self::flip_colors(&mut n);
        if Node::is_red(&n.left.as_ref().unwrap().left) {
            n = Self::rotate_right(n);
            Self::flip_colors(&mut n);
        }
        n
    }

    /// Leftmost record with exact Z-address `z`, i.e. the smallest `hint`
    /// among ties (spec §4.F `find`).
    pub fn find_first(&self, z: &ZAddress) -> Option<&Record<T>> {
        let stack = Self::seek_stack(&self.root, z);
        stack.last().filter(|n| &n.record.z == z).map(|n| &n.record)
    }

    /// Record matching exact `(z, hint)`, the container's own notion of
    /// "equal record" (spec §4.F comparator), used to detect true
    /// duplicates independent of any index-level uniqueness policy.
    fn find_exact(&self, z: &ZAddress, hint: u64) -> Option<&Record<T>> {
        let mut cur = self.root.as_deref();
        while let Some(n) = cur {
            match Self::cmp_key(z, hint, &n.record) {
                Ordering::Less => cur = n.left.as_deref(),
                Ordering::Greater => cur = n.right.as_deref(),
                Ordering::Equal => return Some(&n.record),
            }
        }
        None
    }

    /// Build the descent stack whose top is the first node with
    /// `node.record.z >= z` (spec §4.F `lower_bound`); an empty stack means
    /// every record in the tree sorts below `z`.
    fn seek_stack<'a>(root: &'a Option<Box<Node<T>>>, z: &ZAddress) -> Vec<&'a Node<T>> {
        let mut stack = Vec::new();
        let mut cur = root.as_deref();
        while let Some(n) = cur {
            if z.cmp(&n.record.z) == Ordering::Greater {
                cur = n.right.as_deref();
            } else {
                stack.push(n);
                cur = n.left.as_deref();
            }
        }
        stack
    }

    /// Forward iterator over every record, Z-address non-decreasing (spec
    /// §3 invariant, §4.F `iterator_first`/`iterator_next`).
    pub fn iter(&self) -> Iter<'_, T> {
        let mut stack = Vec::new();
        Self::push_left_spine(&mut stack, self.root.as_deref());
        Iter { stack }
    }

    /// Forward iterator seated at the first record with `z' >= z` (spec
    /// §4.F `lower_bound` plus `iterator_next`).
    pub fn iter_from(&self, z: &ZAddress) -> Iter<'_, T> {
        Iter {
            stack: Self::seek_stack(&self.root, z),
        }
    }

    fn push_left_spine<'a>(stack: &mut Vec<&'a Node<T>>, mut cur: Option<&'a Node<T>>) {
        while let Some(n) = cur {
            stack.push(n);
            cur = n.left.as_deref();
        }
    }

    /// Bulk-load a pre-sorted array, replacing any existing content (spec
    /// §4.F `build`).
    pub fn build(&mut self, mut sorted: Vec<Record<T>>) {
        sorted.sort();
        self.n_count = sorted.len();
        self.root = Self::build_balanced(sorted);
    }

    fn build_balanced(mut items: Vec<Record<T>>) -> Option<Box<Node<T>>> {
        if items.is_empty() {
            return None;
        }
        let mid = items.len() / 2;
        let right_items = items.split_off(mid + 1);
        let mid_item = items.pop().expect("mid item must exist after split_off");
        let left_items = items;
        let mut node = Node::new(mid_item);
        node.color = BLACK;
        node.left = Self::build_balanced(left_items);
        node.right = Self::build_balanced(right_items);
        Some(Box::new(node))
    }

    /// Uniformly-random record (spec §4.F `random`); `O(n)` since the tree
    /// carries no subtree-size augmentation.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<&Record<T>> {
        if self.n_count == 0 {
            return None;
        }
        let idx = rng.gen_range(0..self.n_count);
        self.iter().nth(idx)
    }

    /// Eagerly materialize every record in Z-order, standing in for the
    /// teacher's MVCC `iterator_freeze` under the single-fiber concurrency
    /// model (`SPEC_FULL.md` §11): subsequent mutation of `self` cannot
    /// disturb the returned vector.
    pub fn freeze(&self) -> Vec<Record<T>> {
        self.iter().cloned().collect()
    }

    /// Depth/footprint accounting (spec §4.G `bsize`'s `C.mem_used`
    /// dependency; ambient diagnostics in the teacher's `Stats`/
    /// `LlrbDepth` style).
    pub fn stats(&self) -> Stats {
        let mut s = Stats::empty(std::mem::size_of::<Node<T>>());
        Self::stats_node(self.root.as_deref(), 1, &mut s);
        s
    }

    fn stats_node(node: Option<&Node<T>>, depth: usize, s: &mut Stats) {
        let n = match node {
            None => return,
            Some(n) => n,
        };
        s.entries += 1;
        s.depth_total += depth as u64;
        s.depth_min = if s.entries == 1 {
            depth
        } else {
            s.depth_min.min(depth)
        };
        s.depth_max = s.depth_max.max(depth);
        Self::stats_node(n.left.as_deref(), depth + 1, s);
        Self::stats_node(n.right.as_deref(), depth + 1, s);
    }

    /// Debug-only structural validation: no red node has a red child, and
    /// every root-to-leaf path carries the same black height. Mirrors
    /// `rdms`'s `Llrb::validate`/`llrb_common::validate_tree`.
    #[cfg(debug_assertions)]
    pub fn validate(&self) -> std::result::Result<usize, String> {
        match Self::validate_node(self.root.as_deref()) {
            Ok(bh) => Ok(bh),
            Err(msg) => {
                error!("llrb: invariant violation: {}", msg);
                Err(msg)
            }
        }
    }

    #[cfg(debug_assertions)]
    fn validate_node(node: Option<&Node<T>>) -> std::result::Result<usize, String> {
        let n = match node {
            None => return Ok(0),
            Some(n) => n,
        };
        if n.color == RED && (Node::is_red(&n.left) || Node::is_red(&n.right)) {
            return Err("consecutive red nodes".to_string());
        }
        if Node::is_red(&n.right) && !Node::is_red(&n.left) {
            return Err("right-leaning red link".to_string());
        }
        let lbh = Self::validate_node(n.left.as_deref())?;
        let rbh = Self::validate_node(n.right.as_deref())?;
        if lbh != rbh {
            return Err(format!("unbalanced black heights: {} vs {}", lbh, rbh));
        }
        Ok(lbh + if n.color == BLACK { 1 } else { 0 })
    }
}

/// Forward in-order iterator produced by [`Llrb::iter`]/[`Llrb::iter_from`].
pub struct Iter<'a, T: TupleHandle> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T: TupleHandle> Iterator for Iter<'a, T> {
    type Item = &'a Record<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        Llrb::push_left_spine(&mut self.stack, n.right.as_deref());
        Some(&n.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvec::BitVec;

    fn z(v: u64) -> ZAddress {
        let mut b = BitVec::zeros(1);
        b.set_word(0, v);
        ZAddress(b)
    }

    fn rec(v: u64, hint: u64) -> Record<u64> {
        Record::new(z(v), hint, v)
    }

    #[test]
    fn insert_find_delete_roundtrip() {
        let mut t = Llrb::new();
        assert!(t.insert(rec(5, 0), true).unwrap().is_none());
        assert!(t.insert(rec(2, 0), true).unwrap().is_none());
        assert!(t.insert(rec(9, 0), true).unwrap().is_none());
        assert_eq!(t.len(), 3);
        assert!(t.find_first(&z(2)).is_some());
        assert!(t.find_first(&z(7)).is_none());
        let removed = t.delete(&z(2), 0);
        assert!(removed.is_some());
        assert_eq!(t.len(), 2);
        assert!(t.find_first(&z(2)).is_none());
        t.validate().unwrap();
    }

    #[test]
    fn duplicate_without_clobber_is_rejected() {
        let mut t = Llrb::new();
        assert!(t.insert(rec(1, 0), true).unwrap().is_none());
        assert!(t.insert(rec(1, 0), false).is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn no_clobber_allows_distinct_hints_on_same_zaddress() {
        let mut t = Llrb::new();
        assert!(t.insert(rec(1, 0), false).unwrap().is_none());
        assert!(t.insert(rec(1, 1), false).unwrap().is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn duplicate_with_clobber_displaces() {
        let mut t = Llrb::new();
        t.insert(rec(1, 0), true);
        let displaced = t.insert(rec(1, 0), true).unwrap();
        assert!(displaced.is_some());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn iteration_is_non_decreasing() {
        let mut t = Llrb::new();
        for v in [8u64, 3, 10, 1, 6, 14, 4, 7, 13] {
            t.insert(rec(v, 0), true);
        }
        let zs: Vec<u64> = t.iter().map(|r| r.z.0.word(0)).collect();
        let mut sorted = zs.clone();
        sorted.sort_unstable();
        assert_eq!(zs, sorted);
        t.validate().unwrap();
    }

    #[test]
    fn iter_from_seeks_correctly() {
        let mut t = Llrb::new();
        for v in [2u64, 4, 6, 8, 10] {
            t.insert(rec(v, 0), true);
        }
        let got: Vec<u64> = t.iter_from(&z(5)).map(|r| r.z.0.word(0)).collect();
        assert_eq!(got, vec![6, 8, 10]);
    }

    #[test]
    fn build_from_sorted_matches_iteration() {
        let mut t = Llrb::new();
        let items: Vec<Record<u64>> = (0u64..50).map(|v| rec(v, 0)).collect();
        t.build(items);
        assert_eq!(t.len(), 50);
        let zs: Vec<u64> = t.iter().map(|r| r.z.0.word(0)).collect();
        assert_eq!(zs, (0u64..50).collect::<Vec<_>>());
        t.validate().unwrap();
    }

    #[test]
    fn random_returns_member_when_nonempty() {
        let mut t = Llrb::new();
        for v in 0u64..20 {
            t.insert(rec(v, 0), true);
        }
        let mut rng = rand::thread_rng();
        let picked = t.random(&mut rng);
        assert!(picked.is_some());
        let empty: Llrb<u64> = Llrb::new();
        assert!(empty.random(&mut rng).is_none());
    }

    #[test]
    fn freeze_snapshots_current_contents() {
        let mut t = Llrb::new();
        for v in [3u64, 1, 2] {
            t.insert(rec(v, 0), true);
        }
        let snap = t.freeze();
        t.insert(rec(100, 0), true);
        assert_eq!(snap.len(), 3);
        assert!(!snap.iter().any(|r| r.z.0.word(0) == 100));
    }
}
