use crate::error::InvariantError;
use crate::map::AugmentedTree;
use crate::node::NodeId;
use crate::stats::Aggregate;
use crate::{Key, INITIAL_STACK_CAPACITY};

struct Frame {
    id: NodeId,
    parent: Option<NodeId>,
    /// Exclusive key bounds inherited from the ancestors.
    lower: Option<Key>,
    upper: Option<Key>,
}

impl<A: Aggregate> AugmentedTree<A> {
    /// Walks the whole tree and checks key order, AVL balance, stored
    /// heights, subtree aggregates, parent back-links and the entry count.
    ///
    /// This is `O(n)`; it is meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut stack = Vec::with_capacity(INITIAL_STACK_CAPACITY);
        if let Some(root) = self.root {
            stack.push(Frame {
                id: root,
                parent: None,
                lower: None,
                upper: None,
            });
        }

        let mut reachable = 0usize;
        while let Some(frame) = stack.pop() {
            reachable += 1;
            let node = &self.nodes[frame.id];
            let key = node.key;

            if node.parent != frame.parent {
                return Err(InvariantError::ParentLink {
                    child: key,
                    parent: frame.parent.map(|p| self.nodes[p].key),
                });
            }
            if frame.lower.is_some_and(|lo| key <= lo) || frame.upper.is_some_and(|hi| key >= hi) {
                return Err(InvariantError::Order { key });
            }

            let (left, right) = (self.height_of(node.left), self.height_of(node.right));
            let expected = left.max(right) + 1;
            if node.height != expected {
                return Err(InvariantError::Height {
                    key,
                    stored: node.height,
                    expected,
                });
            }
            if left.abs_diff(right) > 1 {
                return Err(InvariantError::Unbalanced { key, left, right });
            }

            let summary = A::combine(
                node.value,
                node.left.map(|l| &self.nodes[l].summary),
                node.right.map(|r| &self.nodes[r].summary),
            );
            if summary != node.summary {
                return Err(InvariantError::Aggregate { key });
            }

            if let Some(l) = node.left {
                stack.push(Frame {
                    id: l,
                    parent: Some(frame.id),
                    lower: frame.lower,
                    upper: Some(key),
                });
            }
            if let Some(r) = node.right {
                stack.push(Frame {
                    id: r,
                    parent: Some(frame.id),
                    lower: Some(key),
                    upper: frame.upper,
                });
            }
        }

        if reachable != self.len || self.nodes.len() != self.len {
            return Err(InvariantError::Size {
                reachable,
                recorded: self.len,
            });
        }
        Ok(())
    }
}
