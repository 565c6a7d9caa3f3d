//! Borrowing in-order iteration.

use std::iter::FusedIterator;

use crate::arena::{NodeId, Side};
use crate::tree::BalancedTree;

/// In-order iterator over a [`BalancedTree`], created by
/// [`BalancedTree::iter`].
///
/// Steps along parent links, so it needs no stack and each step is O(1)
/// amortized.
pub struct Iter<'a, T> {
    tree: &'a BalancedTree<T>,
    front: NodeId,
    back: NodeId,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(tree: &'a BalancedTree<T>, front: NodeId, back: NodeId, remaining: usize) -> Self {
        Self {
            tree,
            front,
            back,
            remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.tree.neighbour(id, Side::Right);
        }
        Some(self.tree.nodes.item(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.tree.neighbour(id, Side::Left);
        }
        Some(self.tree.nodes.item(id))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}
