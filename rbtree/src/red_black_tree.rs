use core::fmt;
use std::borrow::Borrow;

use log::trace;

use crate::binary_search_tree::{BinarySearchTree, DuplicatePolicy};
use crate::error::{Error, Result};
use crate::iter::{Iter, StartPoint};
use crate::node::{Color, Node, NodeId, NodePos};

/// A self-balancing binary search tree.
///
/// Equal keys are kept by default and placed left of the keys they are equal
/// to, use [`with_duplicate_policy`] to reject them instead.
///
/// [`with_duplicate_policy`]: RedBlackTree::with_duplicate_policy
pub struct RedBlackTree<K> {
    tree: BinarySearchTree<K>,
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for RedBlackTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedBlackTree")
            .field("tree", &self.tree)
            .finish()
    }
}

impl<K> fmt::Display for RedBlackTree<K>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

impl<K> RedBlackTree<K> {
    pub fn new() -> Self {
        Self::with_duplicate_policy(DuplicatePolicy::AllowLeft)
    }

    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            tree: BinarySearchTree::with_duplicate_policy(policy),
        }
    }

    /// Read-only view of the underlying tree, for node level inspection.
    #[inline]
    pub fn as_tree(&self) -> &BinarySearchTree<K> {
        &self.tree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.tree.node(id)
    }

    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        match self.tree.insert_leaf(key, Color::Red) {
            Some(new_node) => {
                self.insert_fixup(new_node);
                true
            }
            None => false,
        }
    }

    /// Same as [`insert`] but fails with [`Error::NullKey`] on an absent key.
    ///
    /// [`insert`]: RedBlackTree::insert
    pub fn try_insert(&mut self, key: Option<K>) -> Result<bool>
    where
        K: Ord,
    {
        key.map(|key| self.insert(key)).ok_or(Error::NullKey)
    }

    fn insert_fixup(&mut self, new_node: NodeId) {
        let mut node = new_node;
        while let Some(mut parent) = self.tree.parent(node) {
            if self.tree.color(parent).is_black() {
                break;
            }
            // red-black properties are violated because red parent has a red child
            //
            // Note that there is only one violation at this point.
            // At first iteration it's the new node and its parent.
            // If we take the "red aunt" branch then at next iteration it will be
            // the grand parent and its parent that violate the red-black properties.
            // If we take the other branch, the violation is fixed locally.
            debug_assert!(self.tree.color(node).is_red());

            // parent is red and thus not the root, as the root is always black
            let grand_parent = self
                .tree
                .parent(parent)
                .expect("red parent is never the root");
            debug_assert!(self.tree.color(grand_parent).is_black());

            let parent_pos = self.tree.pos(parent);
            let aunt = match parent_pos {
                NodePos::Left => self.tree.right(grand_parent),
                NodePos::Right => self.tree.left(grand_parent),
                NodePos::Root => unreachable!("red parent is never the root"),
            };

            match aunt {
                Some(aunt) if self.tree.color(aunt).is_red() => {
                    //     +--- gp:b ---+               +--- gp:r ---+
                    //     |            |               |            |
                    //  + p:r +      + a:r +   -->   + p:b +      + a:b +
                    //  |     |      |     |         |     |      |     |
                    // n:r   x:b    y:b   z:b       n:r   x:b    y:b   z:b
                    //
                    // Coloring parent and aunt black and grand parent red keeps
                    // the black height unchanged. The grand parent may now have a
                    // red parent, repeat as if it was the new node.
                    trace!("red aunt: recolor and continue at {grand_parent:?}");
                    self.tree.set_color(parent, Color::Black);
                    self.tree.set_color(aunt, Color::Black);
                    self.tree.set_color(grand_parent, Color::Red);
                    node = grand_parent;
                }
                _ => {
                    // black or missing aunt
                    if self.tree.pos(node) != parent_pos {
                        //       +-- gp:b --+                 +-- gp:b --+
                        //       |          |                 |          |
                        //  +-- p:r --+    a:b  -->       +- n:r --+    a:b
                        //  |         |                   |        |
                        // x:b    +- n:r -+           +- p:r -+   z:b
                        //        |       |           |       |
                        //       y:b     z:b         x:b     y:b
                        //
                        // Inner grandchild, rotate it over its parent so that it's
                        // in line with the grand parent and swap the roles.
                        trace!("black aunt, inner grandchild: double rotation");
                        self.rotate_up(node, parent);
                        std::mem::swap(&mut node, &mut parent);
                    } else {
                        trace!("black aunt, outer grandchild: single rotation");
                    }

                    //           +-- gp:b --+            +----- p:b -----+
                    //           |          |            |               |
                    //      +-- p:r --+    a:b  -->   +- n:r -+     +- gp:r -+
                    //      |         |               |       |     |        |
                    //  +- n:r -+    z:b             x:b     y:b   z:b      a:b
                    //  |       |
                    // x:b     y:b
                    self.tree.set_color(parent, Color::Black);
                    self.tree.set_color(grand_parent, Color::Red);
                    self.rotate_up(parent, grand_parent);
                    break;
                }
            }
        }

        if let Some(root) = self.tree.root() {
            self.tree.set_color(root, Color::Black);
        }
    }

    fn rotate_up(&mut self, child: NodeId, parent: NodeId) {
        self.tree
            .rotate(child, parent)
            .expect("fixup only rotates a node with its own parent");
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(key)
    }

    /// Same as [`contains`] but fails with [`Error::NullKey`] on an absent key.
    ///
    /// [`contains`]: RedBlackTree::contains
    pub fn try_contains<Q>(&self, key: Option<&Q>) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.try_contains(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key)
    }

    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key)
    }

    pub fn min(&self) -> Option<&K> {
        self.tree.min()
    }

    pub fn max(&self) -> Option<&K> {
        self.tree.max()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, K>
    where
        K: Ord,
    {
        self.tree.iter()
    }

    #[inline]
    pub fn iter_from<'a>(&'a self, start: StartPoint<'a, K>) -> Iter<'a, K>
    where
        K: Ord,
    {
        self.tree.iter_from(start)
    }

    pub fn in_order_string(&self) -> Result<String>
    where
        K: fmt::Display,
    {
        self.tree.in_order_string()
    }

    pub fn level_order_string(&self) -> Result<String>
    where
        K: fmt::Display,
    {
        self.tree.level_order_string()
    }
}

impl<K> Extend<K> for RedBlackTree<K>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K> FromIterator<K> for RedBlackTree<K>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K> IntoIterator for &'a RedBlackTree<K>
where
    K: Ord,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_search_tree::tests::{assert_shape, init_logging, TestNode};

    fn assert_red_blackness<K>(tree: &RedBlackTree<K>) {
        let tree = tree.as_tree();
        let Some(root) = tree.root() else {
            return;
        };
        assert_eq!(tree.color(root), Color::Black, "root must be black");
        assert_eq!(tree.parent(root), None, "root has no parent");

        let mut nodes = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            nodes += 1;
            for child in [tree.left(id), tree.right(id)].into_iter().flatten() {
                assert_eq!(tree.parent(child), Some(id), "child must link back to its parent");
                if tree.color(id).is_red() {
                    assert!(tree.color(child).is_black(), "child of red node must be black");
                }
                stack.push(child);
            }
        }
        assert_eq!(nodes, tree.len());

        // Find the black height by going down the left subtrees.
        // The black height must be the same in all path taken,
        // so choose the simplest one to determine the expected value.
        let mut black_count = 1;
        let mut node = root;
        while let Some(left) = tree.left(node) {
            if tree.color(left).is_black() {
                black_count += 1;
            }
            node = left;
        }

        let mut stack = vec![(root, 1)];
        while let Some((id, blacks)) = stack.pop() {
            let children = [tree.left(id), tree.right(id)];
            if children.iter().any(Option::is_none) {
                // a path ends in a gap below this node
                assert_eq!(blacks, black_count, "black height differs at {id:?}");
            }
            for child in children.into_iter().flatten() {
                stack.push((child, blacks + tree.color(child).is_black() as u64));
            }
        }
    }

    fn assert_colors(tree: &RedBlackTree<i32>, expected: &[(i32, Color)]) {
        for (key, color) in expected {
            let id = tree.find(key).unwrap();
            assert_eq!(tree.node(id).unwrap().color(), *color, "color of {key}");
        }
    }

    fn child_key(tree: &RedBlackTree<i32>, id: NodeId, pos: NodePos) -> Option<i32> {
        let node = tree.node(id)?;
        let child = match pos {
            NodePos::Left => node.left(),
            NodePos::Right => node.right(),
            NodePos::Root => None,
        };
        child.map(|c| *tree.node(c).unwrap().key())
    }

    #[test]
    fn test() {
        init_logging();
        let mut tree = RedBlackTree::new();
        assert!(tree.is_empty());
        tree.insert(12);
        assert_eq!(tree.len(), 1);
        tree.insert(15);
        assert_red_blackness(&tree);
        tree.insert(14);
        assert_red_blackness(&tree);
        tree.insert(16);
        assert_red_blackness(&tree);
        println!("{tree:#?}");
    }

    #[test]
    fn inner_grandchild_double_rotation() {
        init_logging();
        let tree: RedBlackTree<i32> = [5, 15, 10].into_iter().collect();

        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).unwrap().key(), &10);
        assert_eq!(child_key(&tree, root, NodePos::Left), Some(5));
        assert_eq!(child_key(&tree, root, NodePos::Right), Some(15));
        assert_colors(&tree, &[(10, Color::Black), (5, Color::Red), (15, Color::Red)]);
        assert_red_blackness(&tree);
    }

    #[test]
    fn outer_grandchild_single_rotation() {
        init_logging();
        let tree: RedBlackTree<i32> = [1, 2, 3].into_iter().collect();
        assert_shape(
            &TestNode {
                key: 2,
                parent_k: None,
                left_k: Some(Box::new(TestNode::leaf(1, 2))),
                right_k: Some(Box::new(TestNode::leaf(3, 2))),
            },
            tree.as_tree(),
        );
        assert_colors(&tree, &[(2, Color::Black), (1, Color::Red), (3, Color::Red)]);
    }

    #[test]
    fn red_aunt_recolors() {
        init_logging();
        let tree: RedBlackTree<i32> = [10, 5, 15, 3].into_iter().collect();
        assert_shape(
            &TestNode {
                key: 10,
                parent_k: None,
                left_k: Some(Box::new(TestNode {
                    key: 5,
                    parent_k: Some(10),
                    left_k: Some(Box::new(TestNode::leaf(3, 5))),
                    right_k: None,
                })),
                right_k: Some(Box::new(TestNode::leaf(15, 10))),
            },
            tree.as_tree(),
        );
        assert_colors(
            &tree,
            &[
                (10, Color::Black),
                (5, Color::Black),
                (15, Color::Black),
                (3, Color::Red),
            ],
        );
    }

    #[test]
    fn larger_sequence() {
        init_logging();
        let tree: RedBlackTree<i32> = [2, 1, 4, 5, 9, 3, 6, 7].into_iter().collect();
        assert_shape(
            &TestNode {
                key: 2,
                parent_k: None,
                left_k: Some(Box::new(TestNode::leaf(1, 2))),
                right_k: Some(Box::new(TestNode {
                    key: 5,
                    parent_k: Some(2),
                    left_k: Some(Box::new(TestNode {
                        key: 4,
                        parent_k: Some(5),
                        left_k: Some(Box::new(TestNode::leaf(3, 4))),
                        right_k: None,
                    })),
                    right_k: Some(Box::new(TestNode {
                        key: 7,
                        parent_k: Some(5),
                        left_k: Some(Box::new(TestNode::leaf(6, 7))),
                        right_k: Some(Box::new(TestNode::leaf(9, 7))),
                    })),
                })),
            },
            tree.as_tree(),
        );
        assert_colors(
            &tree,
            &[
                (2, Color::Black),
                (1, Color::Black),
                (5, Color::Red),
                (4, Color::Black),
                (7, Color::Black),
                (3, Color::Red),
                (6, Color::Red),
                (9, Color::Red),
            ],
        );
        assert_red_blackness(&tree);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        init_logging();
        let tree: RedBlackTree<i32> = (0..1024).collect();
        assert_red_blackness(&tree);

        // height of a red-black tree is at most 2 * log2(n + 1)
        let inner = tree.as_tree();
        let mut max_depth = 0usize;
        let mut stack = vec![(tree.root().unwrap(), 1usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in [inner.left(id), inner.right(id)].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        assert!(max_depth <= 20, "depth {max_depth}");
    }

    #[test]
    fn duplicates() {
        init_logging();
        let mut tree = RedBlackTree::new();
        for _ in 0..3 {
            assert!(tree.insert(7));
        }
        assert!(tree.insert(3));
        assert!(tree.insert(7));
        assert_eq!(tree.len(), 5);
        assert_red_blackness(&tree);
        assert_eq!(tree.in_order_string().unwrap(), "[ 3, 7, 7, 7, 7 ]");

        let mut tree = RedBlackTree::with_duplicate_policy(DuplicatePolicy::Reject);
        assert!(tree.insert(7));
        assert!(!tree.insert(7));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn null_key() {
        let mut tree = RedBlackTree::new();
        assert_eq!(tree.try_insert(None), Err(Error::NullKey));
        assert!(tree.is_empty());
        assert_eq!(tree.try_insert(Some(4)), Ok(true));
        assert_eq!(tree.try_contains(Some(&4)), Ok(true));
        assert_eq!(tree.try_contains(None::<&i32>), Err(Error::NullKey));
    }

    #[test]
    fn clear() {
        let mut tree: RedBlackTree<i32> = (0..10).collect();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.iter().next(), None);
        tree.insert(3);
        assert_red_blackness(&tree);
        assert_eq!(tree.to_string(), "level order: [ 3 ]\nin order: [ 3 ]");
    }

    #[test]
    fn get() {
        let mut tree = RedBlackTree::new();
        assert_eq!(tree.get(&4), None);
        for k in [12, 5, 9, 2, 18, 15, 13, 17, 19] {
            tree.insert(k);
        }
        for it in [2, 5, 9, 18, 12, 15, 13, 17, 19] {
            assert_eq!(tree.get(&it), Some(&it));
        }
        assert_eq!(tree.min(), Some(&2));
        assert_eq!(tree.max(), Some(&19));
    }

    mod proptests {
        use std::collections::hash_map::RandomState;
        use std::collections::HashSet;

        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        use super::*;

        #[cfg(not(miri))]
        const MAP_SIZE: usize = 1000;
        #[cfg(miri)]
        const MAP_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 1000;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            fn insert_contains(
                mut inserts in proptest::collection::vec(0..10000i32, 0..MAP_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let reference = HashSet::<i32, RandomState>::from_iter(inserts.iter().copied());
                let mut rbt = RedBlackTree::new();
                for v in &inserts {
                    rbt.insert(*v);
                }
                assert_red_blackness(&rbt);
                assert_eq!(rbt.len(), inserts.len());

                inserts.shuffle(&mut thread_rng());
                for key in inserts.iter().chain(access.iter()) {
                    assert_eq!(reference.contains(key), rbt.contains(key));
                }
            }

            #[test]
            fn order(
                inserts in proptest::collection::vec(0..10000i32, 0..MAP_SIZE),
            ) {
                let rbt: RedBlackTree<i32> = inserts.iter().copied().collect();

                let mut inserts = inserts;
                inserts.sort();

                let items: Vec<_> = rbt.iter().copied().collect();
                assert_eq!(&items, &inserts);
            }

            #[test]
            fn order_rejecting_duplicates(
                inserts in proptest::collection::vec(0..10000i32, 0..MAP_SIZE),
            ) {
                let mut rbt = RedBlackTree::with_duplicate_policy(DuplicatePolicy::Reject);
                for v in &inserts {
                    rbt.insert(*v);
                }
                assert_red_blackness(&rbt);

                let unique = HashSet::<_, RandomState>::from_iter(inserts.into_iter());
                let mut inserts: Vec<_> = unique.into_iter().collect();
                inserts.sort();

                let items: Vec<_> = rbt.iter().copied().collect();
                assert_eq!(&items, &inserts);
            }
        );
    }
}
