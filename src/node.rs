//! Node storage and parent/child linkage.
//!
//! Nodes live in a slot arena and refer to each other by [`NodeId`]. The child
//! links own their targets; `parent` is a back-link used only for upward walks
//! and is kept in sync by [`NodeArena::attach`].

use std::ops::{Index, IndexMut};

use crate::{Key, Value};

/// Index of a node slot in a [`NodeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<S> {
    pub(crate) key: Key,
    pub(crate) value: Value,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// 1 + max(height(left), height(right)); absent children count as 0.
    pub(crate) height: u8,
    pub(crate) summary: S,
}

impl<S> Node<S> {
    pub(crate) fn leaf(key: Key, value: Value, summary: S) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
            parent: None,
            height: 1,
            summary,
        }
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    #[inline]
    pub(crate) fn has_both_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Slot arena for tree nodes, with a free list of vacated slots.
#[derive(Clone)]
pub(crate) struct NodeArena<S> {
    slots: Vec<Option<Node<S>>>,
    free: Vec<u32>,
    live: usize,
}

impl<S> NodeArena<S> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Bytes held by the slot vector and the free list.
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<S>>>()
            + self.free.capacity() * std::mem::size_of::<u32>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing vacant slots can go; interior holes stay on the free list.
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let end = self.slots.len() as u32;
        self.free.retain(|&slot| slot < end);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    pub(crate) fn alloc(&mut self, node: Node<S>) -> NodeId {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(node);
            return NodeId(slot);
        }
        let slot = u32::try_from(self.slots.len()).expect("node arena exceeds u32::MAX slots");
        self.slots.push(Some(node));
        NodeId(slot)
    }

    /// Vacates the slot of `id`. The caller must have unlinked it first.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<S> {
        let node = self.slots[id.index()]
            .take()
            .expect("freeing a vacant node slot");
        self.free.push(id.0);
        self.live -= 1;
        node
    }

    /// Drops every node at once; no per-node traversal is needed.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    /// Makes `child` the `side` child of `parent` and points `child` back at
    /// `parent`. Either end may be absent: a missing parent only resets the
    /// back-link, a missing child only clears the child slot.
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, child: Option<NodeId>, side: Side) {
        if let Some(p) = parent {
            self[p].set_child(side, child);
        }
        if let Some(c) = child {
            self[c].parent = parent;
        }
    }

    /// Side on which `child` hangs below `parent`.
    #[inline]
    pub(crate) fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
        if self[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Follows `side` links from `id` as far as they go.
    pub(crate) fn outermost(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(next) = self[id].child(side) {
            id = next;
        }
        id
    }

    /// First ancestor of `id` entered from its `side` child, if any.
    pub(crate) fn ancestor_via(&self, id: NodeId, side: Side) -> Option<NodeId> {
        let mut child = id;
        let mut up = self[id].parent;
        while let Some(ancestor) = up {
            if self[ancestor].child(side) == Some(child) {
                return Some(ancestor);
            }
            child = ancestor;
            up = self[ancestor].parent;
        }
        None
    }
}

impl<S> Index<NodeId> for NodeArena<S> {
    type Output = Node<S>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<S> {
        self.slots[id.index()]
            .as_ref()
            .expect("dangling node id")
    }
}

impl<S> IndexMut<NodeId> for NodeArena<S> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<S> {
        self.slots[id.index()]
            .as_mut()
            .expect("dangling node id")
    }
}
