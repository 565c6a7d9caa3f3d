//! Red-black tree over an index-addressed node arena.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::arena::{Color, NodeArena, NodeId, Side};
use crate::config::Config;
use crate::error::{Error, InsertError};
use crate::iter::Iter;

/// Hook receiving items the tree gives up: deleted, replaced, or torn down.
pub type DestroyFn<T> = Box<dyn FnMut(T) + Send>;

/// An ordered set kept balanced as a red-black tree.
///
/// Items are ordered by their [`Ord`] implementation and stored at most once.
/// All queries and mutations run in O(log n) worst case; [`size`](Self::size)
/// is O(1).
///
/// Ownership of an item moves into the tree on [`insert`](Self::insert) and
/// leaves it exactly once: handed back to the caller, or passed to the destroy
/// hook registered with [`set_destroy`](Self::set_destroy). Without a hook,
/// destroyed items are simply dropped.
///
/// Features:
/// - Nodes addressed by `u32` index with parent back-links (no `Rc`, no `unsafe`)
/// - Freed node slots reused by later inserts
/// - Fallible node allocation reported as [`Error::OutOfMemory`]
/// - Optional arena compaction, manual or after deletions
pub struct BalancedTree<T> {
    pub(crate) nodes: NodeArena<T>,
    pub(crate) root: NodeId,
    pub(crate) count: usize,
    destroy: Option<DestroyFn<T>>,
    config: Config,
}

// =============================================================================
// Lifecycle and order-independent operations
// =============================================================================

impl<T> BalancedTree<T> {
    /// Create an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::from_parts(NodeArena::new(), Config::default())
    }

    /// Create an empty tree, reserving `config.initial_capacity` node slots.
    ///
    /// # Panics
    /// Panics if the initial reservation cannot be allocated. Use
    /// [`try_with_config`](Self::try_with_config) to handle that case.
    pub fn with_config(config: Config) -> Self {
        match Self::try_with_config(config) {
            Ok(tree) => tree,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create an empty tree, reporting a failed initial reservation.
    pub fn try_with_config(config: Config) -> Result<Self, Error> {
        let nodes = NodeArena::try_with_capacity(config.initial_capacity)?;
        Ok(Self::from_parts(nodes, config))
    }

    fn from_parts(nodes: NodeArena<T>, config: Config) -> Self {
        Self {
            nodes,
            root: NodeId::NIL,
            count: 0,
            destroy: None,
            config,
        }
    }

    /// Number of stored items.
    #[inline]
    pub fn size(&self) -> usize {
        self.count
    }

    /// Number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the hook that receives every item the tree destroys.
    ///
    /// Replaces any previously registered hook.
    pub fn set_destroy<F>(&mut self, hook: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        self.destroy = Some(Box::new(hook));
    }

    /// Bytes reserved for node storage.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Compact the node arena by moving live nodes over vacated slots.
    ///
    /// Returns the number of nodes moved to a new slot, or 0 if the arena had
    /// no holes.
    pub fn compact(&mut self) -> usize {
        let vacant = self.nodes.vacant();
        if vacant == 0 {
            return 0;
        }
        let (root, moved) = self.nodes.compact(self.root);
        self.root = root;
        log::debug!(
            "compacted node arena: {} live nodes, {} moved, {} slots reclaimed",
            self.count,
            moved,
            vacant
        );
        moved
    }

    /// Destroy every item, leaving an empty tree that can be reused.
    pub fn clear(&mut self) {
        self.release_post_order();
    }

    /// Tear the tree down.
    ///
    /// With `destroy_items`, every item goes to the destroy hook and the
    /// returned vector is empty. Otherwise no hook runs and ownership of all
    /// items returns to the caller in ascending order.
    pub fn deinit(mut self, destroy_items: bool) -> Vec<T> {
        if destroy_items {
            self.release_post_order();
            Vec::new()
        } else {
            self.drain_in_order()
        }
    }

    /// Hand every item back in ascending order without running the hook.
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.deinit(false)
    }

    /// In-order iterator over the stored items.
    pub fn iter(&self) -> Iter<'_, T> {
        if self.root.is_nil() {
            return Iter::new(self, NodeId::NIL, NodeId::NIL, 0);
        }
        let front = self.extreme(self.root, Side::Left);
        let back = self.extreme(self.root, Side::Right);
        Iter::new(self, front, back, self.count)
    }

    fn destroy_item(&mut self, item: T) {
        match self.destroy.as_mut() {
            Some(hook) => hook(item),
            None => drop(item),
        }
    }

    fn release_post_order(&mut self) {
        if self.root.is_nil() {
            return;
        }
        log::debug!("destroying {} tree items", self.count);

        // The hook may panic: the tree must already be empty by then.
        let root = mem::replace(&mut self.root, NodeId::NIL);
        let mut nodes = mem::take(&mut self.nodes);
        self.count = 0;

        // (node, children already released)
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        while let Some((id, released)) = stack.pop() {
            if released {
                let item = nodes.free(id);
                self.destroy_item(item);
                continue;
            }
            stack.push((id, true));
            for child in [nodes.right(id), nodes.left(id)] {
                if !child.is_nil() {
                    stack.push((child, false));
                }
            }
        }

        nodes.clear();
        self.nodes = nodes;
    }

    fn drain_in_order(&mut self) -> Vec<T> {
        let order: Vec<NodeId> = {
            let mut order = Vec::with_capacity(self.count);
            let mut id = if self.root.is_nil() {
                NodeId::NIL
            } else {
                self.extreme(self.root, Side::Left)
            };
            while !id.is_nil() {
                order.push(id);
                id = self.neighbour(id, Side::Right);
            }
            order
        };
        log::debug!("handing back {} tree items", order.len());

        let items: Vec<T> = order.into_iter().map(|id| self.nodes.free(id)).collect();
        self.nodes.clear();
        self.root = NodeId::NIL;
        self.count = 0;
        items
    }

    // =========================================================================
    // Structural navigation
    // =========================================================================

    /// Farthest node from `id` following `side` links.
    pub(crate) fn extreme(&self, mut id: NodeId, side: Side) -> NodeId {
        loop {
            let next = self.nodes.child(id, side);
            if next.is_nil() {
                return id;
            }
            id = next;
        }
    }

    /// In-order neighbour of `id`: successor for `Side::Right`, predecessor
    /// for `Side::Left`. NIL past either end.
    pub(crate) fn neighbour(&self, id: NodeId, side: Side) -> NodeId {
        let child = self.nodes.child(id, side);
        if !child.is_nil() {
            return self.extreme(child, side.opposite());
        }

        let mut current = id;
        let mut parent = self.nodes.parent(current);
        while !parent.is_nil() && self.nodes.child(parent, side) == current {
            current = parent;
            parent = self.nodes.parent(current);
        }
        parent
    }

    // =========================================================================
    // Rebalancing primitives
    // =========================================================================

    /// Rotate `x` down towards `dir`; its `dir.opposite()` child takes its place.
    fn rotate(&mut self, x: NodeId, dir: Side) {
        let y = self.nodes.child(x, dir.opposite());
        debug_assert!(!y.is_nil(), "rotation pivot {x:?} lacks a child");

        let inner = self.nodes.child(y, dir);
        self.nodes.set_child(x, dir.opposite(), inner);
        self.nodes.set_parent(inner, x);

        let parent = self.nodes.parent(x);
        self.nodes.set_parent(y, parent);
        if parent.is_nil() {
            self.root = y;
        } else {
            let side = self.nodes.side_of(parent, x);
            self.nodes.set_child(parent, side, y);
        }

        self.nodes.set_child(y, dir, x);
        self.nodes.set_parent(x, y);
    }

    /// Put subtree `v` where `u` hangs. `u` keeps its own links.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let parent = self.nodes.parent(u);
        if parent.is_nil() {
            self.root = v;
        } else {
            let side = self.nodes.side_of(parent, u);
            self.nodes.set_child(parent, side, v);
        }
        self.nodes.set_parent(v, parent);
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        // A red parent is never the root, so the grandparent exists.
        while self.nodes.color(self.nodes.parent(z)) == Color::Red {
            let parent = self.nodes.parent(z);
            let grandparent = self.nodes.parent(parent);
            let side = self.nodes.side_of(grandparent, parent);
            let uncle = self.nodes.child(grandparent, side.opposite());

            if self.nodes.color(uncle) == Color::Red {
                self.nodes.set_color(parent, Color::Black);
                self.nodes.set_color(uncle, Color::Black);
                self.nodes.set_color(grandparent, Color::Red);
                z = grandparent;
                continue;
            }

            if z == self.nodes.child(parent, side.opposite()) {
                z = parent;
                self.rotate(z, side);
            }

            let parent = self.nodes.parent(z);
            let grandparent = self.nodes.parent(parent);
            self.nodes.set_color(parent, Color::Black);
            self.nodes.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
        }

        let root = self.root;
        self.nodes.set_color(root, Color::Black);
    }

    /// Detach `z` from the tree, rebalance, and return its item.
    fn unlink(&mut self, z: NodeId) -> T {
        let left = self.nodes.left(z);
        let right = self.nodes.right(z);
        let mut removed_color = self.nodes.color(z);

        // `x` takes the place of the physically removed node; it may be NIL,
        // so its parent is tracked separately.
        let x;
        let x_parent;
        if left.is_nil() {
            x = right;
            x_parent = self.nodes.parent(z);
            self.transplant(z, right);
        } else if right.is_nil() {
            x = left;
            x_parent = self.nodes.parent(z);
            self.transplant(z, left);
        } else {
            let successor = self.extreme(right, Side::Left);
            removed_color = self.nodes.color(successor);
            x = self.nodes.right(successor);

            if self.nodes.parent(successor) == z {
                x_parent = successor;
            } else {
                x_parent = self.nodes.parent(successor);
                self.transplant(successor, x);
                self.nodes.set_child(successor, Side::Right, right);
                self.nodes.set_parent(right, successor);
            }

            self.transplant(z, successor);
            self.nodes.set_child(successor, Side::Left, left);
            self.nodes.set_parent(left, successor);
            let color = self.nodes.color(z);
            self.nodes.set_color(successor, color);
        }

        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }

        self.count -= 1;
        self.nodes.free(z)
    }

    fn delete_fixup(&mut self, mut x: NodeId, mut parent: NodeId) {
        while x != self.root && self.nodes.color(x) == Color::Black {
            // `x` carries an extra black, so its sibling is never NIL.
            let side = if self.nodes.left(parent) == x {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.opposite();
            let mut sibling = self.nodes.child(parent, far);

            if self.nodes.color(sibling) == Color::Red {
                self.nodes.set_color(sibling, Color::Black);
                self.nodes.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.nodes.child(parent, far);
            }

            let near_black = self.nodes.color(self.nodes.child(sibling, side)) == Color::Black;
            let far_black = self.nodes.color(self.nodes.child(sibling, far)) == Color::Black;

            if near_black && far_black {
                self.nodes.set_color(sibling, Color::Red);
                x = parent;
                parent = self.nodes.parent(x);
                continue;
            }

            if far_black {
                let near = self.nodes.child(sibling, side);
                self.nodes.set_color(near, Color::Black);
                self.nodes.set_color(sibling, Color::Red);
                self.rotate(sibling, far);
                sibling = self.nodes.child(parent, far);
            }

            let parent_color = self.nodes.color(parent);
            self.nodes.set_color(sibling, parent_color);
            self.nodes.set_color(parent, Color::Black);
            let far_child = self.nodes.child(sibling, far);
            self.nodes.set_color(far_child, Color::Black);
            self.rotate(parent, side);
            x = self.root;
        }

        self.nodes.set_color(x, Color::Black);
    }

    fn maybe_compact(&mut self) {
        if self
            .config
            .wants_compaction(self.nodes.len(), self.nodes.vacant())
        {
            self.compact();
        }
    }
}

// =============================================================================
// Ordered operations
// =============================================================================

impl<T: Ord> BalancedTree<T> {
    /// Insert `item`.
    ///
    /// If an equal item is already stored, `replace` decides: `true` swaps the
    /// new item in and passes the old one to the destroy hook, `false` rejects
    /// the new item with [`Error::Duplicate`].
    ///
    /// On failure the tree is unchanged and the item is returned inside the
    /// error.
    pub fn insert(&mut self, item: T, replace: bool) -> Result<(), InsertError<T>> {
        let mut parent = NodeId::NIL;
        let mut side = Side::Left;
        let mut current = self.root;
        while !current.is_nil() {
            parent = current;
            side = match item.cmp(self.nodes.item(current)) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => {
                    if !replace {
                        return Err(InsertError::new(Error::Duplicate, item));
                    }
                    let old = mem::replace(self.nodes.item_mut(current), item);
                    self.destroy_item(old);
                    return Ok(());
                }
            };
            current = self.nodes.child(current, side);
        }

        let id = match self.nodes.alloc(item, parent) {
            Ok(id) => id,
            Err(item) => {
                log::warn!("node allocation failed with {} items stored", self.count);
                return Err(InsertError::new(Error::OutOfMemory, item));
            }
        };

        if parent.is_nil() {
            self.root = id;
        } else {
            self.nodes.set_child(parent, side, id);
        }
        self.count += 1;
        self.insert_fixup(id);
        Ok(())
    }

    /// Remove the item equal to `item`.
    ///
    /// With `destroy`, the removed item goes to the destroy hook and `Ok(None)`
    /// is returned. Otherwise the item is handed back as `Ok(Some(item))`.
    pub fn delete(&mut self, item: &T, destroy: bool) -> Result<Option<T>, Error> {
        let removed = self.take(item)?;
        if destroy {
            self.destroy_item(removed);
            Ok(None)
        } else {
            Ok(Some(removed))
        }
    }

    /// Remove the item equal to `item` and hand it back.
    pub fn take(&mut self, item: &T) -> Result<T, Error> {
        let id = self.find(item);
        if id.is_nil() {
            return Err(Error::NotFound);
        }
        let removed = self.unlink(id);
        self.maybe_compact();
        Ok(removed)
    }

    /// The stored item equal to `item`.
    ///
    /// The result may be a different value than the query, as long as the two
    /// compare equal.
    pub fn search(&self, item: &T) -> Result<&T, Error> {
        let id = self.find(item);
        if id.is_nil() {
            return Err(Error::NotFound);
        }
        Ok(self.nodes.item(id))
    }

    pub fn contains(&self, item: &T) -> bool {
        !self.find(item).is_nil()
    }

    /// The item immediately before `item`.
    ///
    /// [`Error::NotFound`] if `item` is not stored or is the minimum.
    pub fn predecessor(&self, item: &T) -> Result<&T, Error> {
        self.adjacent(item, Side::Left)
    }

    /// The item immediately after `item`.
    ///
    /// [`Error::NotFound`] if `item` is not stored or is the maximum.
    pub fn successor(&self, item: &T) -> Result<&T, Error> {
        self.adjacent(item, Side::Right)
    }

    /// The smallest item, or [`Error::Empty`].
    pub fn minimum(&self) -> Result<&T, Error> {
        self.bound(Side::Left)
    }

    /// The largest item, or [`Error::Empty`].
    pub fn maximum(&self) -> Result<&T, Error> {
        self.bound(Side::Right)
    }

    fn find(&self, item: &T) -> NodeId {
        let mut current = self.root;
        while !current.is_nil() {
            current = match item.cmp(self.nodes.item(current)) {
                Ordering::Less => self.nodes.left(current),
                Ordering::Greater => self.nodes.right(current),
                Ordering::Equal => return current,
            };
        }
        NodeId::NIL
    }

    fn adjacent(&self, item: &T, side: Side) -> Result<&T, Error> {
        let id = self.find(item);
        if id.is_nil() {
            return Err(Error::NotFound);
        }
        let next = self.neighbour(id, side);
        if next.is_nil() {
            return Err(Error::NotFound);
        }
        Ok(self.nodes.item(next))
    }

    fn bound(&self, side: Side) -> Result<&T, Error> {
        if self.root.is_nil() {
            return Err(Error::Empty);
        }
        Ok(self.nodes.item(self.extreme(self.root, side)))
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<T> Drop for BalancedTree<T> {
    fn drop(&mut self) {
        self.release_post_order();
    }
}

impl<T> Default for BalancedTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The clone has no destroy hook; items it releases are dropped.
impl<T: Clone> Clone for BalancedTree<T> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            count: self.count,
            destroy: None,
            config: self.config.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BalancedTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Later items replace earlier equal ones.
impl<T: Ord> Extend<T> for BalancedTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            if let Err(err) = self.insert(item, true) {
                panic!("extend failed: {}", err.kind());
            }
        }
    }
}

impl<T: Ord> FromIterator<T> for BalancedTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T> IntoIterator for BalancedTree<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_sorted_vec().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a BalancedTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
