//! Node arena for tree nodes.
//!
//! Nodes live in one contiguous `Vec` and refer to each other by 32-bit index
//! instead of by pointer. This gives:
//! - parent back-links without reference cycles
//! - slot reuse through an intrusive free list
//! - fallible allocation (`try_reserve`) so exhaustion can be reported
//! - cheap compaction by relocating live nodes

use std::fmt;
use std::mem;

use crate::error::Error;

/// Number of addressable slots. `u32::MAX` itself is reserved for [`NodeId::NIL`].
const MAX_SLOTS: usize = u32::MAX as usize;

// =============================================================================
// Links
// =============================================================================

/// Index of a node slot in a [`NodeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// "No node". Reads as a black leaf.
    pub(crate) const NIL: NodeId = NodeId(u32::MAX);

    #[inline]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == Self::NIL.0
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_nil());
        self.0 as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index < MAX_SLOTS);
        Self(index as u32)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            f.write_str("NIL")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Which child link of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// =============================================================================
// Nodes and slots
// =============================================================================

#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) item: T,
    pub(crate) parent: NodeId,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    pub(crate) color: Color,
}

#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: NodeId },
}

/// Slot storage for tree nodes with a free list of vacated slots.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    /// Most recently vacated slot, threading through `Slot::Vacant::next_free`.
    free_head: NodeId,
    live: usize,
    /// Slot count past which `alloc` fails.
    max_slots: usize,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: NodeId::NIL,
            live: 0,
            max_slots: MAX_SLOTS,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_max_slots(&mut self, max_slots: usize) {
        self.max_slots = max_slots.min(MAX_SLOTS);
    }

    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut arena = Self::new();
        arena
            .slots
            .try_reserve_exact(capacity.min(MAX_SLOTS))
            .map_err(|_| Error::OutOfMemory)?;
        Ok(arena)
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Number of slots waiting on the free list.
    #[inline]
    pub(crate) fn vacant(&self) -> usize {
        self.slots.len() - self.live
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.slots.capacity() * mem::size_of::<Slot<T>>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.slots.shrink_to_fit();
    }

    /// Place `item` in a fresh red node under `parent`.
    ///
    /// Hands the item back if no slot can be allocated.
    pub(crate) fn alloc(&mut self, item: T, parent: NodeId) -> Result<NodeId, T> {
        let node = Node {
            item,
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
            color: Color::Red,
        };

        if !self.free_head.is_nil() {
            let id = self.free_head;
            let slot = &mut self.slots[id.index()];
            match slot {
                Slot::Vacant { next_free } => self.free_head = *next_free,
                Slot::Occupied(_) => panic!("free list points at occupied slot {id:?}"),
            }
            *slot = Slot::Occupied(node);
            self.live += 1;
            log::trace!("reusing node slot {id:?}");
            return Ok(id);
        }

        if self.slots.len() >= self.max_slots {
            return Err(node.item);
        }
        if self.slots.len() == self.slots.capacity() {
            if self.slots.try_reserve(1).is_err() {
                return Err(node.item);
            }
            log::trace!("node arena grew to {} slots", self.slots.capacity());
        }

        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Slot::Occupied(node));
        self.live += 1;
        Ok(id)
    }

    /// Vacate `id` and return the item it held.
    pub(crate) fn free(&mut self, id: NodeId) -> T {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match mem::replace(&mut self.slots[id.index()], vacant) {
            Slot::Occupied(node) => {
                self.free_head = id;
                self.live -= 1;
                node.item
            }
            Slot::Vacant { .. } => panic!("node slot {id:?} freed twice"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = NodeId::NIL;
        self.live = 0;
    }

    /// Move every live node to the front of a dense arena, rewriting links.
    ///
    /// Returns the new id of `root` and the number of nodes whose index
    /// changed. All other ids held outside the arena are invalidated.
    pub(crate) fn compact(&mut self, root: NodeId) -> (NodeId, usize) {
        let old = mem::take(&mut self.slots);

        let mut remap = vec![NodeId::NIL; old.len()];
        let mut next = 0usize;
        let mut moved = 0usize;
        for (index, slot) in old.iter().enumerate() {
            if let Slot::Occupied(_) = slot {
                remap[index] = NodeId::from_index(next);
                moved += usize::from(index != next);
                next += 1;
            }
        }
        debug_assert_eq!(next, self.live);

        let relink = |id: NodeId| if id.is_nil() { id } else { remap[id.index()] };

        let mut slots = Vec::with_capacity(next);
        for slot in old {
            if let Slot::Occupied(mut node) = slot {
                node.parent = relink(node.parent);
                node.left = relink(node.left);
                node.right = relink(node.right);
                slots.push(Slot::Occupied(node));
            }
        }

        self.slots = slots;
        self.free_head = NodeId::NIL;
        (relink(root), moved)
    }

    // =========================================================================
    // Node access
    // =========================================================================

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("live link to vacant node slot {id:?}"),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("live link to vacant node slot {id:?}"),
        }
    }

    #[inline]
    pub(crate) fn item(&self, id: NodeId) -> &T {
        &self.node(id).item
    }

    #[inline]
    pub(crate) fn item_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.node_mut(id).item
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    #[inline]
    pub(crate) fn left(&self, id: NodeId) -> NodeId {
        self.node(id).left
    }

    #[inline]
    pub(crate) fn right(&self, id: NodeId) -> NodeId {
        self.node(id).right
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, side: Side) -> NodeId {
        match side {
            Side::Left => self.left(id),
            Side::Right => self.right(id),
        }
    }

    /// Colour of `id`, with NIL reading as black.
    #[inline]
    pub(crate) fn color(&self, id: NodeId) -> Color {
        if id.is_nil() {
            Color::Black
        } else {
            self.node(id).color
        }
    }

    /// No-op on NIL.
    #[inline]
    pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
        if !id.is_nil() {
            self.node_mut(id).color = color;
        }
    }

    /// No-op on NIL.
    #[inline]
    pub(crate) fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        if !id.is_nil() {
            self.node_mut(id).parent = parent;
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: NodeId) {
        let node = self.node_mut(id);
        match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    pub(crate) fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
        if self.left(parent) == child {
            Side::Left
        } else {
            debug_assert_eq!(self.right(parent), child);
            Side::Right
        }
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
