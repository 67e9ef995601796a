use thiserror::Error;

use crate::node::NodeId;

/// Errors reported by the trees and their iterators.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A key argument was absent.
    #[error("cannot insert or look up an absent key")]
    NullKey,

    /// `rotate` was called with nodes that are not linked as child and parent.
    #[error("{child:?} is not a child of {parent:?}, cannot rotate")]
    InvalidRotation { child: NodeId, parent: NodeId },

    /// The iterator has no more keys.
    #[error("iterator is exhausted")]
    EndOfSequence,

    /// A traversal visited more nodes than the tree holds, which means the
    /// links contain a cycle or a node is linked twice.
    #[error(
        "visited {visited} nodes during traversal but the tree holds {len}; \
         the tree structure contains a loop"
    )]
    StructuralCorruption { visited: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
