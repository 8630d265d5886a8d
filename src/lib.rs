//! # treemap-stats
//!
//! An ordered map from `i64` keys to `i64` values, stored in an AVL tree whose
//! nodes also carry an aggregate of their subtree (count, sum, min and max of
//! the values by default).
//!
//! Both the height-balance invariant and the aggregate invariant are kept
//! through every insertion, deletion and rotation, so lookups, updates and
//! per-subtree statistics are all `O(log n)`.
//!
//! ## Example
//!
//! ```rust
//! use treemap_stats::TreeMapStats;
//!
//! let mut map = TreeMapStats::new();
//! map.put(10, 1);
//! map.put(20, 2);
//! map.put(30, 3);
//!
//! assert_eq!(map.find(20), Some(2));
//! let stats = map.get_stats(20).unwrap();
//! assert_eq!((stats.count, stats.sum, stats.min, stats.max), (3, 6, 1, 3));
//! assert_eq!(map.successor(20), Some(30));
//! ```

#![forbid(unsafe_code)]

mod balance;
mod error;
mod invariants;
mod map;
mod node;
mod stats;

pub use error::InvariantError;
pub use map::{AugmentedTree, Iter};
pub use stats::{Aggregate, Stats, SubtreeStats};

pub type Key = i64;
pub type Value = i64;

/// The count/sum/min/max ordered map.
pub type TreeMapStats = AugmentedTree<SubtreeStats>;

// =============================================================================
// Configuration
// =============================================================================

/// Initial capacity of traversal stacks. Covers the AVL height bound for any
/// tree the `u32`-indexed arena can hold, so they never reallocate.
const INITIAL_STACK_CAPACITY: usize = 48;

#[cfg(test)]
mod test_support;


#[cfg(test)]
mod proptests;
