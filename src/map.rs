use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use tracing::debug;

use crate::node::{Node, NodeArena, NodeId, Side};
use crate::stats::Aggregate;
use crate::{Key, Value, INITIAL_STACK_CAPACITY};

/// Ordered map from `i64` keys to `i64` values on an AVL tree whose nodes
/// carry a summary of their subtree, computed by the strategy `A`.
///
/// Every operation is `O(log n)`. Balancing is always on; only the
/// aggregate is pluggable.
pub struct AugmentedTree<A: Aggregate> {
    pub(crate) nodes: NodeArena<A::Summary>,
    pub(crate) root: Option<NodeId>,
    pub(crate) len: usize,
    _strategy: PhantomData<A>,
}

impl<A: Aggregate> AugmentedTree<A> {
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            len: 0,
            _strategy: PhantomData,
        }
    }

    /// Pre-sizes node storage for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            ..Self::new()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Same as [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Same as [`is_empty`](Self::is_empty).
    #[inline]
    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.allocated_bytes()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    pub fn clear(&mut self) {
        if self.len > 0 {
            debug!(entries = self.len, "clearing tree");
        }
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// The node holding `key`, or else the last node visited looking for it.
    /// `None` only when the tree is empty.
    fn search(&self, key: Key) -> Option<NodeId> {
        let mut last = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.key == key {
                return Some(id);
            }
            last = Some(id);
            cursor = if key < node.key { node.left } else { node.right };
        }
        last
    }

    pub(crate) fn find_node(&self, key: Key) -> Option<NodeId> {
        self.search(key).filter(|&id| self.nodes[id].key == key)
    }

    pub fn find(&self, key: Key) -> Option<Value> {
        self.find_node(key).map(|id| self.nodes[id].value)
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.find_node(key).is_some()
    }

    /// Summary of the subtree rooted at `key`'s node (not of the whole map).
    pub fn get_stats(&self, key: Key) -> Option<&A::Summary> {
        self.find_node(key).map(|id| &self.nodes[id].summary)
    }

    /// Summary of the whole map.
    pub fn root_stats(&self) -> Option<&A::Summary> {
        self.root.map(|id| &self.nodes[id].summary)
    }

    /// Inserts `key` or overwrites its value. Returns the previous value.
    pub fn put(&mut self, key: Key, value: Value) -> Option<Value> {
        let (id, previous) = self.put_node(key, value);
        let parent = self.nodes[id].parent;
        self.rebalance_ancestors(parent);
        self.resync_to_root(Some(id));
        previous
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn erase(&mut self, key: Key) -> Option<Value> {
        let (parent, removed) = self.erase_node(key)?;
        self.rebalance_ancestors(parent);
        self.resync_to_root(parent);
        Some(removed)
    }

    /// Plain BST insertion. Returns the touched node, which is where
    /// rebalancing and resync start, and the overwritten value if any.
    fn put_node(&mut self, key: Key, value: Value) -> (NodeId, Option<Value>) {
        let last = self.search(key);
        if let Some(w) = last {
            if self.nodes[w].key == key {
                let previous = std::mem::replace(&mut self.nodes[w].value, value);
                return (w, Some(previous));
            }
        }

        let id = self
            .nodes
            .alloc(Node::leaf(key, value, A::combine(value, None, None)));
        match last {
            Some(w) => {
                let side = if key < self.nodes[w].key {
                    Side::Left
                } else {
                    Side::Right
                };
                self.nodes.attach(Some(w), Some(id), side);
            }
            None => self.root = Some(id),
        }
        self.len += 1;
        (id, None)
    }

    /// Plain BST deletion. A node with two children takes over its in-order
    /// successor's entry and the successor is unlinked instead. Returns the
    /// parent of the unlinked node and the erased value.
    fn erase_node(&mut self, key: Key) -> Option<(Option<NodeId>, Value)> {
        let mut target = self.find_node(key)?;
        let removed = self.nodes[target].value;

        if self.nodes[target].has_both_children() {
            let successor = self.successor_node(target)?;
            let (k, v) = (self.nodes[successor].key, self.nodes[successor].value);
            let node = &mut self.nodes[target];
            node.key = k;
            node.value = v;
            target = successor;
        }

        Some((self.unlink(target), removed))
    }

    /// Removes `id`, which has at most one child, splicing that child into
    /// its place. Returns the former parent.
    pub(crate) fn unlink(&mut self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        debug_assert!(!node.has_both_children());
        let parent = node.parent;
        let child = node.left.or(node.right);

        match parent {
            Some(z) => {
                let side = self.nodes.side_of(z, id);
                self.nodes.attach(Some(z), child, side);
            }
            None => {
                if let Some(c) = child {
                    self.nodes[c].parent = None;
                }
                self.root = child;
            }
        }

        self.nodes.free(id);
        self.len -= 1;
        parent
    }

    pub(crate) fn successor_node(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id].right {
            Some(r) => Some(self.nodes.outermost(r, Side::Left)),
            None => self.nodes.ancestor_via(id, Side::Left),
        }
    }

    pub(crate) fn predecessor_node(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id].left {
            Some(l) => Some(self.nodes.outermost(l, Side::Right)),
            None => self.nodes.ancestor_via(id, Side::Right),
        }
    }

    /// Next key after `key` in order. `None` if `key` is absent or largest.
    pub fn successor(&self, key: Key) -> Option<Key> {
        let id = self.find_node(key)?;
        self.successor_node(id).map(|s| self.nodes[s].key)
    }

    /// Previous key before `key` in order. `None` if `key` is absent or smallest.
    pub fn predecessor(&self, key: Key) -> Option<Key> {
        let id = self.find_node(key)?;
        self.predecessor_node(id).map(|p| self.nodes[p].key)
    }

    pub fn first(&self) -> Option<(Key, Value)> {
        let id = self.nodes.outermost(self.root?, Side::Left);
        Some((self.nodes[id].key, self.nodes[id].value))
    }

    pub fn last(&self) -> Option<(Key, Value)> {
        let id = self.nodes.outermost(self.root?, Side::Right);
        Some((self.nodes[id].key, self.nodes[id].value))
    }

    pub fn iter(&self) -> Iter<'_, A> {
        let mut it = Iter {
            tree: self,
            stack: Vec::with_capacity(INITIAL_STACK_CAPACITY),
            remaining: self.len,
        };
        it.push_left_spine(self.root);
        it
    }
}

impl<A: Aggregate> Default for AugmentedTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> Clone for AugmentedTree<A> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
            _strategy: PhantomData,
        }
    }
}

impl<A: Aggregate> fmt::Debug for AugmentedTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<A: Aggregate> Extend<(Key, Value)> for AugmentedTree<A> {
    fn extend<I: IntoIterator<Item = (Key, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<A: Aggregate> FromIterator<(Key, Value)> for AugmentedTree<A> {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, A: Aggregate> IntoIterator for &'a AugmentedTree<A> {
    type Item = (Key, Value);
    type IntoIter = Iter<'a, A>;

    fn into_iter(self) -> Iter<'a, A> {
        self.iter()
    }
}

/// In-order iterator over `(key, value)` pairs.
pub struct Iter<'a, A: Aggregate> {
    tree: &'a AugmentedTree<A>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<A: Aggregate> Iter<'_, A> {
    fn push_left_spine(&mut self, mut cursor: Option<NodeId>) {
        while let Some(id) = cursor {
            self.stack.push(id);
            cursor = self.tree.nodes[id].left;
        }
    }
}

impl<A: Aggregate> Iterator for Iter<'_, A> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[id];
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<A: Aggregate> ExactSizeIterator for Iter<'_, A> {}

impl<A: Aggregate> FusedIterator for Iter<'_, A> {}
