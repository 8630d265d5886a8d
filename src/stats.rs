//! Subtree aggregates and the walks that keep them current.

use std::fmt;

use crate::map::AugmentedTree;
use crate::node::NodeId;
use crate::Value;

/// Combine strategy for per-subtree summaries.
///
/// `combine` must be a pure function of a node's own value and the summaries
/// of its (possibly absent) children. The tree calls it bottom-up whenever a
/// node's value or child set changes.
pub trait Aggregate {
    type Summary: Clone + PartialEq + fmt::Debug;

    fn combine(
        value: Value,
        left: Option<&Self::Summary>,
        right: Option<&Self::Summary>,
    ) -> Self::Summary;
}

/// Count, sum, minimum and maximum of the values in one subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub count: usize,
    /// Widened so that no sequence of `i64` values can overflow it.
    pub sum: i128,
    pub min: Value,
    pub max: Value,
}

impl Stats {
    pub fn leaf(value: Value) -> Self {
        Self {
            count: 1,
            sum: i128::from(value),
            min: value,
            max: value,
        }
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }

    fn absorb(&mut self, other: &Stats) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{},{},{}}}", self.count, self.sum, self.min, self.max)
    }
}

/// The [`Stats`] strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubtreeStats;

impl Aggregate for SubtreeStats {
    type Summary = Stats;

    fn combine(value: Value, left: Option<&Stats>, right: Option<&Stats>) -> Stats {
        let mut stats = Stats::leaf(value);
        for child in left.into_iter().chain(right) {
            stats.absorb(child);
        }
        stats
    }
}

impl<A: Aggregate> AugmentedTree<A> {
    /// Recomputes the summary of `id` from its value and its children's
    /// current summaries.
    pub(crate) fn refresh_summary(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let left = node.left.map(|l| &self.nodes[l].summary);
        let right = node.right.map(|r| &self.nodes[r].summary);
        let summary = A::combine(node.value, left, right);
        self.nodes[id].summary = summary;
    }

    /// Recomputes summaries from `start` up to the root.
    ///
    /// Unlike the height walk this never stops early: a value change moves
    /// every ancestor's aggregate even when no height moves.
    pub(crate) fn resync_to_root(&mut self, start: Option<NodeId>) {
        let mut cursor = start;
        while let Some(id) = cursor {
            self.refresh_summary(id);
            cursor = self.nodes[id].parent;
        }
    }
}
