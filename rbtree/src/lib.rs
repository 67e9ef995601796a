//! Ordered key collections: a plain binary search tree and a red-black tree
//! built on top of it, both with a resumable in-order iterator.
//!
//! ```
//! use rbtree::{RedBlackTree, StartPoint};
//!
//! let mut tree = RedBlackTree::new();
//! for k in [4, 2, 1, 5, 3] {
//!     tree.insert(k);
//! }
//!
//! let from_three: Vec<_> = tree.iter_from(StartPoint::Key(&3)).copied().collect();
//! assert_eq!(from_three, [3, 4, 5]);
//! ```

mod binary_search_tree;
mod error;
mod iter;
mod node;
mod red_black_tree;

pub use binary_search_tree::{BinarySearchTree, DuplicatePolicy};
pub use error::{Error, Result};
pub use iter::{Iter, StartPoint};
pub use node::{Color, Node, NodeId};
pub use red_black_tree::RedBlackTree;
