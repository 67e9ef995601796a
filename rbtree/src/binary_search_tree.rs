use core::fmt;
use std::borrow::Borrow;
use std::collections::VecDeque;

use log::{error, trace};

use crate::error::{Error, Result};
use crate::iter::{Iter, StartPoint};
use crate::node::{Color, Node, NodeId, NodePos};

/// What `insert` does with a key equal to one already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Leave the tree unchanged and report `false`.
    #[default]
    Reject,
    /// Store the key anyway, descending left on equality.
    AllowLeft,
}

/// An unbalanced binary search tree of keys.
///
/// Nodes live in an arena and refer to each other by [`NodeId`], so the
/// parent back-links never take part in ownership.
pub struct BinarySearchTree<K> {
    // INVARIANTS:
    //  * `root` is `None` iff `nodes` is empty
    //  * every node in `nodes` is reachable from `root`
    nodes: Vec<Node<K>>,
    root: Option<NodeId>,
    policy: DuplicatePolicy,
}

impl<K> Default for BinarySearchTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for BinarySearchTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct TreeDebug<'a, K> {
            tree: &'a BinarySearchTree<K>,
        }

        impl<K> fmt::Debug for TreeDebug<'_, K>
        where
            K: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                let walked = self.tree.inorder_for_each_core(|id| {
                    f.entry(&(id, self.tree.node_ref(id)));
                });
                if let Err(e) = walked {
                    f.entry(&format_args!("<{e}>"));
                }
                f.finish()
            }
        }

        f.debug_struct("BinarySearchTree")
            .field("len", &self.len())
            .field("policy", &self.policy)
            .field("root", &self.root)
            .field("nodes", &TreeDebug { tree: self })
            .finish()
    }
}

impl<K> fmt::Display for BinarySearchTree<K>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.level_order_string(), self.in_order_string()) {
            (Ok(level_order), Ok(in_order)) => {
                write!(f, "level order: {level_order}\nin order: {in_order}")
            }
            (Err(e), _) | (_, Err(e)) => write!(f, "<{e}>"),
        }
    }
}

impl<K> BinarySearchTree<K> {
    pub fn new() -> Self {
        Self::with_duplicate_policy(DuplicatePolicy::Reject)
    }

    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            policy,
        }
    }

    #[inline]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every key. Previously obtained [`NodeId`]s become invalid.
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node behind `id`, or `None` if `id` does not belong to
    /// this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id.index())
    }

    /// Inserts `key` according to the tree's [`DuplicatePolicy`].
    ///
    /// Returns `false` if the key was rejected as a duplicate.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        self.insert_leaf(key, Color::Black).is_some()
    }

    /// Same as [`insert`] but fails with [`Error::NullKey`] on an absent key.
    ///
    /// [`insert`]: BinarySearchTree::insert
    pub fn try_insert(&mut self, key: Option<K>) -> Result<bool>
    where
        K: Ord,
    {
        key.map(|key| self.insert(key)).ok_or(Error::NullKey)
    }

    /// Attaches `key` as a new leaf without any rebalancing and returns the
    /// new node, or `None` if the policy rejected it.
    pub(crate) fn insert_leaf(&mut self, key: K, color: Color) -> Option<NodeId>
    where
        K: Ord,
    {
        // Move left/right down the tree until we find empty slot
        let mut parent = None;
        let mut maybe_node = self.root;
        let mut pos = NodePos::Root;
        while let Some(node) = maybe_node {
            parent = maybe_node;
            match (key.cmp(self.key(node)), self.policy) {
                (std::cmp::Ordering::Equal, DuplicatePolicy::Reject) => return None,
                (std::cmp::Ordering::Less, _)
                | (std::cmp::Ordering::Equal, DuplicatePolicy::AllowLeft) => {
                    pos = NodePos::Left;
                    maybe_node = self.left(node);
                }
                (std::cmp::Ordering::Greater, _) => {
                    pos = NodePos::Right;
                    maybe_node = self.right(node);
                }
            }
        }

        // new node is a leaf, it cannot have left or right subtrees
        let new_node = NodeId::new(self.nodes.len());
        self.nodes.push(Node::leaf(key, color, parent));
        // update parent to point to the new node
        match (parent, pos) {
            (Some(parent), NodePos::Left) => self.set_left(parent, Some(new_node)),
            (Some(parent), NodePos::Right) => self.set_right(parent, Some(new_node)),
            _ => self.root = Some(new_node),
        }

        Some(new_node)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Same as [`contains`] but fails with [`Error::NullKey`] on an absent key.
    ///
    /// [`contains`]: BinarySearchTree::contains
    pub fn try_contains<Q>(&self, key: Option<&Q>) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        key.map(|key| self.contains(key)).ok_or(Error::NullKey)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| self.key(id))
    }

    /// Returns the node holding a key equal to `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut maybe_node = self.root;
        while let Some(x) = maybe_node {
            match key.cmp(self.key(x).borrow()) {
                std::cmp::Ordering::Less => maybe_node = self.left(x),
                std::cmp::Ordering::Equal => return Some(x),
                std::cmp::Ordering::Greater => maybe_node = self.right(x),
            }
        }

        None
    }

    pub fn min(&self) -> Option<&K> {
        let mut x = self.root?;
        while let Some(left) = self.left(x) {
            x = left;
        }
        Some(self.key(x))
    }

    pub fn max(&self) -> Option<&K> {
        let mut x = self.root?;
        while let Some(right) = self.right(x) {
            x = right;
        }
        Some(self.key(x))
    }

    /// Rotates `child` above its `parent`.
    ///
    /// A left child is rotated right and a right child is rotated left; the
    /// in-order sequence of keys is unchanged. Fails with
    /// [`Error::InvalidRotation`] unless `child`'s parent is exactly `parent`.
    pub fn rotate(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        let related = match self.node(child) {
            Some(node) => node.parent == Some(parent),
            None => false,
        };
        if !related || self.node(parent).is_none() {
            return Err(Error::InvalidRotation { child, parent });
        }

        let grand_parent = self.parent(parent);
        let parent_pos = self.pos(parent);
        match self.pos(child) {
            NodePos::Left => {
                //         g              g
                //         |              |
                //    +-parent-+     +-child-+
                //    |        |     |       |
                // +-child-+   c --> a  +-parent-+
                // |       |            |        |
                // a       b            b        c
                // where a, b, c can be any subtrees
                let b = self.right(child);
                self.set_left(parent, b);
                if let Some(b) = b {
                    self.set_parent(b, Some(parent));
                }
                self.set_right(child, Some(parent));
            }
            NodePos::Right => {
                //      g                     g
                //      |                     |
                // +-parent-+             +-child-+
                // |        |     -->     |       |
                // a    +-child-+     +-parent-+  c
                //      |       |     |        |
                //      b       c     a        b
                let b = self.left(child);
                self.set_right(parent, b);
                if let Some(b) = b {
                    self.set_parent(b, Some(parent));
                }
                self.set_left(child, Some(parent));
            }
            NodePos::Root => unreachable!("child has a parent"),
        }

        self.set_parent(child, grand_parent);
        self.set_parent(parent, Some(child));
        match (grand_parent, parent_pos) {
            (Some(g), NodePos::Left) => self.set_left(g, Some(child)),
            (Some(g), NodePos::Right) => self.set_right(g, Some(child)),
            _ => self.root = Some(child),
        }

        trace!("rotated {child:?} above {parent:?}");
        Ok(())
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, K>
    where
        K: Ord,
    {
        Iter::new(self, StartPoint::Unbounded)
    }

    #[inline]
    pub fn iter_from<'a>(&'a self, start: StartPoint<'a, K>) -> Iter<'a, K>
    where
        K: Ord,
    {
        Iter::new(self, start)
    }

    /// Visits every node in order using an explicit stack.
    ///
    /// Fails with [`Error::StructuralCorruption`] as soon as more nodes are
    /// visited than the tree holds.
    pub(crate) fn inorder_for_each_core<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId),
    {
        let mut stack = Vec::new();
        // counted on push so that a loop along left links is caught too
        let mut visited = 0;
        let mut current = self.root;
        loop {
            while let Some(id) = current {
                visited += 1;
                self.check_visited(visited)?;
                stack.push(id);
                current = self.left(id);
            }
            let Some(id) = stack.pop() else {
                return Ok(());
            };
            f(id);
            current = self.right(id);
        }
    }

    /// Visits every node level by level, left to right.
    pub(crate) fn level_order_for_each_core<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId),
    {
        let mut queue = VecDeque::from_iter(self.root);
        let mut visited = 0;
        while let Some(id) = queue.pop_front() {
            visited += 1;
            self.check_visited(visited)?;
            queue.extend(self.left(id));
            queue.extend(self.right(id));
            f(id);
        }

        Ok(())
    }

    fn check_visited(&self, visited: usize) -> Result<()> {
        if visited > self.len() {
            error!(
                "visited {visited} nodes but the tree holds {}, the links contain a loop",
                self.len()
            );
            return Err(Error::StructuralCorruption {
                visited,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Keys in order, formatted as `[ a, b, c ]`.
    pub fn in_order_string(&self) -> Result<String>
    where
        K: fmt::Display,
    {
        let mut keys = Vec::with_capacity(self.len());
        self.inorder_for_each_core(|id| keys.push(id))?;
        Ok(self.bracketed(&keys))
    }

    /// Keys in level order, formatted as `[ a, b, c ]`.
    pub fn level_order_string(&self) -> Result<String>
    where
        K: fmt::Display,
    {
        let mut keys = Vec::with_capacity(self.len());
        self.level_order_for_each_core(|id| keys.push(id))?;
        Ok(self.bracketed(&keys))
    }

    fn bracketed(&self, ids: &[NodeId]) -> String
    where
        K: fmt::Display,
    {
        let keys: Vec<String> = ids.iter().map(|id| self.key(*id).to_string()).collect();
        format!("[ {} ]", keys.join(", "))
    }

    #[inline]
    pub(crate) fn node_ref(&self, id: NodeId) -> &Node<K> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> &K {
        &self.node_ref(id).key
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_ref(id).parent
    }

    #[inline]
    fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        self.node_mut(id).parent = new_parent;
    }

    #[inline]
    pub(crate) fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node_ref(id).left
    }

    #[inline]
    fn set_left(&mut self, id: NodeId, new_left: Option<NodeId>) {
        self.node_mut(id).left = new_left;
    }

    #[inline]
    pub(crate) fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node_ref(id).right
    }

    #[inline]
    fn set_right(&mut self, id: NodeId, new_right: Option<NodeId>) {
        self.node_mut(id).right = new_right;
    }

    #[inline]
    pub(crate) fn color(&self, id: NodeId) -> Color {
        self.node_ref(id).color
    }

    #[inline]
    pub(crate) fn set_color(&mut self, id: NodeId, new_color: Color) {
        self.node_mut(id).color = new_color;
    }

    #[inline]
    pub(crate) fn pos(&self, id: NodeId) -> NodePos {
        match self.parent(id) {
            Some(p) if self.left(p) == Some(id) => NodePos::Left,
            Some(p) => {
                debug_assert_eq!(self.right(p), Some(id));
                NodePos::Right
            }
            None => NodePos::Root,
        }
    }
}

impl<K> Extend<K> for BinarySearchTree<K>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K> FromIterator<K> for BinarySearchTree<K>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K> IntoIterator for &'a BinarySearchTree<K>
where
    K: Ord,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
