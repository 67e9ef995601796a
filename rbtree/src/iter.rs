use core::fmt;
use std::iter::FusedIterator;

use crate::binary_search_tree::BinarySearchTree;
use crate::error::{Error, Result};
use crate::node::NodeId;

/// Where an [`Iter`] starts emitting keys.
///
/// `Unbounded` and `Absent` are deliberately separate: the first emits every
/// key, the second emits none. Converting `None::<&K>` gives `Absent`.
pub enum StartPoint<'s, K> {
    /// Before every possible key, the whole tree is emitted.
    Unbounded,
    /// No key qualifies, the iterator is empty.
    Absent,
    /// Keys `>= key` are emitted.
    Key(&'s K),
    /// Keys for which the predicate returns `true` are considered to be
    /// before the start point and are skipped. The predicate must be monotone
    /// with respect to the key order.
    Before(&'s dyn Fn(&K) -> bool),
}

impl<K> StartPoint<'_, K>
where
    K: Ord,
{
    /// Returns `true` if `key` lies strictly before the start point.
    #[inline]
    pub fn is_before(&self, key: &K) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Absent => true,
            Self::Key(start) => key < *start,
            Self::Before(pred) => pred(key),
        }
    }
}

impl<K> Default for StartPoint<'_, K> {
    fn default() -> Self {
        Self::Unbounded
    }
}

impl<K> Clone for StartPoint<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for StartPoint<'_, K> {}

impl<'s, K> From<Option<&'s K>> for StartPoint<'s, K> {
    fn from(start: Option<&'s K>) -> Self {
        match start {
            Some(key) => Self::Key(key),
            None => Self::Absent,
        }
    }
}

impl<K> fmt::Debug for StartPoint<'_, K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("Unbounded"),
            Self::Absent => f.write_str("Absent"),
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Before(_) => f.write_str("Before(..)"),
        }
    }
}

/// In-order iterator over the keys of a tree.
///
/// The stack always holds the left spine of the part of the tree that is yet
/// to be emitted, with the next key on top. Keys before the start point are
/// never pushed, so their left subtrees are never visited.
pub struct Iter<'a, K> {
    tree: &'a BinarySearchTree<K>,
    start: StartPoint<'a, K>,
    stack: Vec<NodeId>,
}

impl<'a, K> Iter<'a, K>
where
    K: Ord,
{
    pub(crate) fn new(tree: &'a BinarySearchTree<K>, start: StartPoint<'a, K>) -> Self {
        let mut iter = Self {
            tree,
            start,
            stack: Vec::new(),
        };
        iter.push_from(tree.root());
        iter
    }

    fn push_from(&mut self, mut maybe_node: Option<NodeId>) {
        while let Some(id) = maybe_node {
            let node = self.tree.node_ref(id);
            if self.start.is_before(&node.key) {
                // everything in the left subtree is before the start point too
                maybe_node = node.right;
            } else {
                self.stack.push(id);
                maybe_node = node.left;
            }
        }
    }

    pub(crate) fn next_node(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.push_from(self.tree.node_ref(id).right);
        Some(id)
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Like [`Iterator::next`] but reports exhaustion as an error.
    pub fn try_next(&mut self) -> Result<&'a K> {
        self.next().ok_or(Error::EndOfSequence)
    }
}

impl<'a, K> Iterator for Iter<'a, K>
where
    K: Ord,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        self.next_node().map(|id| &tree.node_ref(id).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.stack.len(), Some(self.tree.len()))
    }
}

impl<K> FusedIterator for Iter<'_, K> where K: Ord {}

impl<K> fmt::Debug for Iter<'_, K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: Vec<_> = self
            .stack
            .iter()
            .rev()
            .map(|id| &self.tree.node_ref(*id).key)
            .collect();
        f.debug_struct("Iter")
            .field("start", &self.start)
            .field("stack", &pending)
            .finish()
    }
}
