use thiserror::Error;

use crate::Key;

/// A structural invariant found broken by
/// [`AugmentedTree::check_invariants`](crate::AugmentedTree::check_invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("key {key} is out of order relative to its ancestors")]
    Order { key: Key },

    #[error("node {key} has child heights {left} and {right}")]
    Unbalanced { key: Key, left: u8, right: u8 },

    #[error("node {key} stores height {stored} but its children imply {expected}")]
    Height { key: Key, stored: u8, expected: u8 },

    #[error("node {key} carries a stale subtree aggregate")]
    Aggregate { key: Key },

    #[error("node {child} does not link back to its parent {parent:?}")]
    ParentLink { child: Key, parent: Option<Key> },

    #[error("tree reaches {reachable} nodes but records {recorded} entries")]
    Size { reachable: usize, recorded: usize },
}
