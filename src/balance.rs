//! AVL height bookkeeping, rotations and the upward rebalancing walk.

use tracing::trace;

use crate::map::AugmentedTree;
use crate::node::{NodeId, Side};
use crate::stats::Aggregate;

impl<A: Aggregate> AugmentedTree<A> {
    #[inline]
    pub(crate) fn height_of(&self, id: Option<NodeId>) -> u8 {
        id.map_or(0, |id| self.nodes[id].height)
    }

    fn reset_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let height = self.height_of(node.left).max(self.height_of(node.right)) + 1;
        self.nodes[id].height = height;
    }

    fn is_balanced(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        self.height_of(node.left).abs_diff(self.height_of(node.right)) <= 1
    }

    /// Taller child of `id`; on a tie, the left child if `prefer_left`.
    fn tallest_child(&self, id: NodeId, prefer_left: bool) -> Option<NodeId> {
        let node = &self.nodes[id];
        let (l, r) = (self.height_of(node.left), self.height_of(node.right));
        if l > r || (l == r && prefer_left) {
            node.left
        } else {
            node.right
        }
    }

    /// Pivots `pivot` up over its parent `displaced`.
    ///
    /// `pivot` takes the displaced node's place (becoming the root if needed),
    /// its inner subtree moves across, and the displaced node hangs below it.
    /// Heights and summaries of both are recomputed, displaced node first.
    fn single_rotation(&mut self, pivot: NodeId, displaced: NodeId) {
        let grandparent = self.nodes[displaced].parent;
        match grandparent {
            Some(g) => {
                let side = self.nodes.side_of(g, displaced);
                self.nodes.attach(Some(g), Some(pivot), side);
            }
            None => {
                self.nodes[pivot].parent = None;
                self.root = Some(pivot);
            }
        }

        // The side of `pivot` that faces `displaced`.
        let inner = self.nodes.side_of(displaced, pivot).opposite();
        let moved = self.nodes[pivot].child(inner);
        self.nodes.attach(Some(displaced), moved, inner.opposite());
        self.nodes.attach(Some(pivot), Some(displaced), inner);

        self.reset_height(displaced);
        self.reset_height(pivot);
        self.refresh_summary(displaced);
        self.refresh_summary(pivot);

        trace!(
            pivot = self.nodes[pivot].key,
            displaced = self.nodes[displaced].key,
            direction = ?inner,
            "rotated"
        );
    }

    fn double_rotation(&mut self, x: NodeId, y: NodeId, z: NodeId) {
        self.single_rotation(x, y);
        self.single_rotation(x, z);
    }

    /// Restores balance at `z`, whose children differ in height by exactly 2.
    /// Returns the new root of the subtree `z` used to root.
    fn rebalance(&mut self, z: NodeId) -> NodeId {
        let Some(y) = self.tallest_child(z, true) else {
            debug_assert!(false, "unbalanced node without children");
            return z;
        };
        let y_side = self.nodes.side_of(z, y);
        // Break ties toward the straight-line shape.
        let Some(x) = self.tallest_child(y, y_side == Side::Left) else {
            debug_assert!(false, "taller child of an unbalanced node is a leaf");
            return z;
        };

        if self.nodes.side_of(y, x) == y_side {
            self.single_rotation(y, z);
            y
        } else {
            self.double_rotation(x, y, z);
            x
        }
    }

    /// Walks from `start` towards the root fixing heights and rotating where
    /// a node is out of balance. Stops as soon as a subtree's height comes
    /// out unchanged, since nothing above it can be affected.
    pub(crate) fn rebalance_ancestors(&mut self, start: Option<NodeId>) {
        let mut cursor = start;
        while let Some(w) = cursor {
            let parent = self.nodes[w].parent;
            let old_height = self.nodes[w].height;
            let top = if self.is_balanced(w) {
                self.reset_height(w);
                w
            } else {
                self.rebalance(w)
            };
            cursor = if self.nodes[top].height == old_height {
                None
            } else {
                parent
            };
        }
    }
}
