//! # baltree
//!
//! An order-maintaining balanced search tree over caller-owned items.
//!
//! [`BalancedTree`] is a red-black tree whose nodes live in an index-addressed
//! arena. Every insert and delete rebalances, so the height stays below
//! `2 * log2(n + 1)` and every query is O(log n) worst case.
//!
//! Ownership moves into the tree on insert. An item leaves the tree exactly
//! once: either it goes back to the caller, or it is passed to the destroy hook
//! registered with [`BalancedTree::set_destroy`].
//!
//! ## Example
//!
//! ```rust
//! use baltree::{BalancedTree, Error};
//!
//! let mut tree = BalancedTree::new();
//! for item in [10, 15, 20, 25, 22, 9, 6, 1, 4, 7] {
//!     tree.insert(item, false).unwrap();
//! }
//!
//! assert_eq!(tree.predecessor(&4), Ok(&1));
//! assert_eq!(tree.successor(&9), Ok(&10));
//! assert_eq!(tree.minimum(), Ok(&1));
//! assert_eq!(tree.maximum(), Ok(&25));
//! assert_eq!(tree.size(), 10);
//!
//! // Handed back to the caller...
//! assert_eq!(tree.delete(&22, false), Ok(Some(22)));
//! // ...or destroyed in place.
//! assert_eq!(tree.delete(&25, true), Ok(None));
//! assert_eq!(tree.delete(&25, true), Err(Error::NotFound));
//! ```

#![forbid(unsafe_code)]

mod arena;
mod config;
mod container;
mod error;
mod iter;
mod tree;

pub use config::Config;
pub use container::OrderedContainer;
pub use error::{Error, InsertError};
pub use iter::Iter;
pub use tree::{BalancedTree, DestroyFn};

#[cfg(test)]
mod proptests;
