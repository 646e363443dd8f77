//! Module `stats` reports structural accounting for a built [`crate::llrb::Llrb`]
//! tree: node count, approximate memory footprint, and depth distribution.
//!
//! Grounded in `rdms/src/llrb_node.rs`'s `Stats`/`LlrbDepth` (there split
//! into `Full`/`Partial` variants to cope with MVCC-era trees that may not
//! know their own depth cheaply); this crate has exactly one tree shape, so
//! a single struct suffices.

/// Depth/footprint summary of an [`crate::llrb::Llrb`] tree at the moment
/// it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub entries: usize,
    pub node_size: usize,
    pub depth_min: usize,
    pub depth_max: usize,
    pub depth_total: u64,
}

impl Stats {
    pub fn empty(node_size: usize) -> Stats {
        Stats {
            entries: 0,
            node_size,
            depth_min: 0,
            depth_max: 0,
            depth_total: 0,
        }
    }

    pub fn mean_depth(&self) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            self.depth_total as f64 / self.entries as f64
        }
    }

    pub fn footprint(&self) -> usize {
        self.entries * self.node_size
    }
}
