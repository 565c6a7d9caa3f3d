//! Error types surfaced by tree operations.

/// Errors triggered by tree operations.
///
/// Every variant is non-fatal: the tree is left exactly as it was before the
/// failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A node could not be allocated.
    #[error("out of memory while allocating a tree node")]
    OutOfMemory,
    /// No stored item compares equal to the query, or the requested neighbour
    /// does not exist.
    #[error("item not found")]
    NotFound,
    /// `minimum` or `maximum` was asked of an empty tree.
    #[error("container is empty")]
    Empty,
    /// An equal item is already stored and replacement was not requested.
    #[error("an equal item is already stored")]
    Duplicate,
}

/// Error returned by a failed insertion.
///
/// Insertion takes ownership of the item, so a rejected item travels back to
/// the caller inside the error.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct InsertError<T> {
    kind: Error,
    item: T,
}

impl<T> InsertError<T> {
    pub(crate) fn new(kind: Error, item: T) -> Self {
        Self { kind, item }
    }

    /// Why the insertion failed: [`Error::OutOfMemory`] or [`Error::Duplicate`].
    pub fn kind(&self) -> Error {
        self.kind
    }

    /// Borrow the rejected item.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Take the rejected item back.
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> From<InsertError<T>> for Error {
    fn from(err: InsertError<T>) -> Self {
        err.kind
    }
}
