//! A multidimensional in-memory secondary index, ordered on a Z-order
//! (Morton) space-filling curve.
//!
//! Composite keys are normalized into order-preserving unsigned lanes,
//! bit-interleaved into a single [`zaddress::ZAddress`], and stored in a
//! left-leaning red-black tree ([`llrb::Llrb`]) keyed on that address.
//! Point lookup and full scan fall straight out of the tree's ordering;
//! orthogonal range ("box") scans use the litmax/bigmin jump algorithm in
//! [`boxscan`] to skip runs of the curve that fall outside the query box
//! without visiting every record in between.
//!
//! [`index::ZIndex`] is the type applications hold; everything else is an
//! internal building block it composes.

mod bitvec;
mod boxscan;
mod error;
mod index;
mod interleave;
mod iter;
mod key;
mod llrb;
mod llrb_node;
mod scalar;
mod stats;
mod tuple;
mod zaddress;

pub use crate::boxscan::{get_next_zvalue, is_relevant};
pub use crate::error::{Error, Result};
pub use crate::index::{box_contains, IterRequest, ReplaceMode, ZIndex};
pub use crate::iter::{BoxIter, SnapshotIter};
pub use crate::key::{KeyDef, MAX_DIMENSION};
pub use crate::llrb::{Iter, Llrb};
pub use crate::llrb_node::Record;
pub use crate::scalar::{ScalarType, ScalarValue};
pub use crate::stats::Stats;
pub use crate::tuple::{KeyExtractor, TupleHandle};
pub use crate::zaddress::{ZAddress, ZAddressBuilder};
