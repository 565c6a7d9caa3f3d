//! Operation set of an ordered container.

use crate::error::{Error, InsertError};
use crate::tree::BalancedTree;

/// An ordered container of owned items.
///
/// Mirrors the operation table callers program against; [`BalancedTree`] is
/// the implementation.
pub trait OrderedContainer<T: Ord> {
    /// Insert `item`; `replace` decides what happens to an equal stored item.
    fn insert(&mut self, item: T, replace: bool) -> Result<(), InsertError<T>>;

    /// Remove the item equal to `item`; `destroy` decides whether it goes to
    /// the destroy hook or back to the caller.
    fn delete(&mut self, item: &T, destroy: bool) -> Result<Option<T>, Error>;

    fn search(&self, item: &T) -> Result<&T, Error>;

    fn predecessor(&self, item: &T) -> Result<&T, Error>;

    fn successor(&self, item: &T) -> Result<&T, Error>;

    fn minimum(&self) -> Result<&T, Error>;

    fn maximum(&self) -> Result<&T, Error>;

    fn size(&self) -> usize;

    /// Register the hook that receives destroyed items.
    fn set_destroy<F>(&mut self, hook: F)
    where
        F: FnMut(T) + Send + 'static;
}

impl<T: Ord> OrderedContainer<T> for BalancedTree<T> {
    fn insert(&mut self, item: T, replace: bool) -> Result<(), InsertError<T>> {
        BalancedTree::insert(self, item, replace)
    }

    fn delete(&mut self, item: &T, destroy: bool) -> Result<Option<T>, Error> {
        BalancedTree::delete(self, item, destroy)
    }

    fn search(&self, item: &T) -> Result<&T, Error> {
        BalancedTree::search(self, item)
    }

    fn predecessor(&self, item: &T) -> Result<&T, Error> {
        BalancedTree::predecessor(self, item)
    }

    fn successor(&self, item: &T) -> Result<&T, Error> {
        BalancedTree::successor(self, item)
    }

    fn minimum(&self) -> Result<&T, Error> {
        BalancedTree::minimum(self)
    }

    fn maximum(&self) -> Result<&T, Error> {
        BalancedTree::maximum(self)
    }

    fn size(&self) -> usize {
        BalancedTree::size(self)
    }

    fn set_destroy<F>(&mut self, hook: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        BalancedTree::set_destroy(self, hook)
    }
}
