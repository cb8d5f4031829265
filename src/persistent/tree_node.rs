//! Persistent (immutable) ordered tree based on an AVL tree.
//!
//! This module provides [`TreeNode`], the node engine behind persistent
//! ordered maps and sets. Keys are ordered by a [`Comparator`] that the
//! caller passes to every operation; the tree itself never stores it.
//!
//! # Overview
//!
//! - O(log N) `find`, `assign`, `update`, `delete`
//! - O(log N) positional access with `entry_at`
//! - O(N) balanced construction from sorted entries
//! - In-order traversal with optional `(offset, limit)` window
//!
//! Every path copy rebuilds only the ancestors of the changed entry. All
//! other subtrees are shared with the original tree.
//!
//! # Examples
//!
//! ```rust
//! use arboreal::persistent::{NaturalOrder, TreeNode};
//!
//! let tree = [5, 3, 8, 1, 4, 7, 9]
//!     .into_iter()
//!     .fold(TreeNode::empty(), |tree, key| tree.assign(&NaturalOrder, key, key * 10));
//!
//! let keys: Vec<i32> = tree.keys().copied().collect();
//! assert_eq!(keys, vec![1, 3, 4, 5, 7, 8, 9]);
//!
//! let smaller = tree.delete(&NaturalOrder, &5);
//! assert_eq!(smaller.size(), 6);
//! assert_eq!(tree.find(&NaturalOrder, &5), Some(&50)); // Original unchanged
//! assert!(smaller.check_invariants(&NaturalOrder).is_ok());
//! ```

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::comparator::Comparator;
use super::error::{InvariantViolation, NodeError};

/// Inline capacity of the traversal stack.
///
/// An AVL tree of depth 32 holds several million entries.
const STACK_CAPACITY: usize = 32;

// =============================================================================
// Node Definition
// =============================================================================

struct ValueNode<K, V> {
    key: K,
    value: V,
    left: TreeNode<K, V>,
    right: TreeNode<K, V>,
    size: usize,
    depth: usize,
}

/// A persistent (immutable) AVL tree node.
///
/// An empty tree (the fringe) has size 0 and depth 0. Every value node
/// caches `size = 1 + left.size + right.size` and
/// `depth = 1 + max(left.depth, right.depth)`, and the depths of its two
/// children differ by at most one.
///
/// A tree must always be used with the comparator it was built with.
///
/// [`assign`](Self::assign) and [`update`](Self::update) compare the new
/// value with the stored one and return the same root when they are equal,
/// so they need `V: PartialEq`. [`replace`](Self::replace) and
/// [`replace_with`](Self::replace_with) work for any `V: Clone` and always
/// rebuild the path to a present key.
///
/// # Time Complexity
///
/// | Operation         | Complexity |
/// |-------------------|------------|
/// | `find`            | O(log N)   |
/// | `assign`/`update` | O(log N)   |
/// | `delete`          | O(log N)   |
/// | `entry_at`        | O(log N)   |
/// | `size`/`depth`    | O(1)       |
pub struct TreeNode<K, V> {
    root: Option<ReferenceCounter<ValueNode<K, V>>>,
}

impl<K, V> TreeNode<K, V> {
    /// Creates an empty tree.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { root: None }
    }

    /// Returns `true` if the tree has no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.node().map_or(0, |node| node.size)
    }

    /// Returns the height of the tree. The empty tree has depth 0.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.node().map_or(0, |node| node.depth)
    }

    /// Returns the value stored under `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TreeNode};
    ///
    /// let tree = TreeNode::empty().assign(&NaturalOrder, "one", 1);
    /// assert_eq!(tree.find(&NaturalOrder, &"one"), Some(&1));
    /// assert_eq!(tree.find(&NaturalOrder, &"two"), None);
    /// ```
    pub fn find<C>(&self, comparator: &C, key: &K) -> Option<&V>
    where
        C: Comparator<K> + ?Sized,
    {
        self.find_entry(comparator, key).map(|(_, value)| value)
    }

    /// Returns the stored key and value matching `key`.
    pub fn find_entry<C>(&self, comparator: &C, key: &K) -> Option<(&K, &V)>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self.node();
        while let Some(node) = current {
            match comparator.compare(key, &node.key) {
                Ordering::Less => current = node.left.node(),
                Ordering::Greater => current = node.right.node(),
                Ordering::Equal => return Some((&node.key, &node.value)),
            }
        }
        None
    }

    /// Returns the value stored under `key`, or `default` if absent.
    pub fn get<'a, C>(&'a self, comparator: &C, key: &K, default: &'a V) -> &'a V
    where
        C: Comparator<K> + ?Sized,
    {
        self.find(comparator, key).unwrap_or(default)
    }

    /// Returns `true` if an entry matches `key`.
    pub fn contains_key<C>(&self, comparator: &C, key: &K) -> bool
    where
        C: Comparator<K> + ?Sized,
    {
        self.find_entry(comparator, key).is_some()
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        let mut node = self.node()?;
        while let Some(left) = node.left.node() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        let mut node = self.node()?;
        while let Some(right) = node.right.node() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// Returns the entry at in-order position `index`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<(&K, &V)> {
        let mut current = self.node();
        let mut index = index;
        while let Some(node) = current {
            let left_size = node.left.size();
            match index.cmp(&left_size) {
                Ordering::Less => current = node.left.node(),
                Ordering::Equal => return Some((&node.key, &node.value)),
                Ordering::Greater => {
                    index -= left_size + 1;
                    current = node.right.node();
                }
            }
        }
        None
    }

    /// Returns an in-order iterator over all entries.
    #[must_use]
    pub fn iter(&self) -> TreeIterator<'_, K, V> {
        TreeIterator::new(self, 0, self.size())
    }

    /// Returns an in-order iterator over the entries at positions `offset..limit`.
    ///
    /// Both bounds are clamped to the size of the tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TreeNode};
    ///
    /// let tree = TreeNode::from_entries(&NaturalOrder, (0..100).map(|key| (key, ())));
    /// let keys: Vec<i32> = tree.iter_range(10, 13).map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![10, 11, 12]);
    /// ```
    #[must_use]
    pub fn iter_range(&self, offset: usize, limit: usize) -> TreeIterator<'_, K, V> {
        TreeIterator::new(self, offset, limit)
    }

    /// Returns an in-order iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an in-order iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Returns `true` if both handles refer to the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(first), Some(second)) => ReferenceCounter::ptr_eq(first, second),
            _ => false,
        }
    }

    /// Verifies the cached sizes and depths, the balance of every node and
    /// the strict ordering of keys under `comparator`.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants<C>(&self, comparator: &C) -> Result<(), InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        let result = self
            .check_structure()
            .and_then(|()| self.check_order(comparator));
        if let Err(violation) = &result {
            tracing::debug!(%violation, size = self.size(), "tree node invariant check failed");
        }
        result
    }

    fn check_structure(&self) -> Result<(), InvariantViolation> {
        let Some(node) = self.node() else {
            return Ok(());
        };
        node.left.check_structure()?;
        node.right.check_structure()?;

        let computed_size = 1 + node.left.size() + node.right.size();
        if node.size != computed_size {
            return Err(InvariantViolation::SizeMismatch {
                cached: node.size,
                computed: computed_size,
            });
        }
        let computed_depth = 1 + node.left.depth().max(node.right.depth());
        if node.depth != computed_depth {
            return Err(InvariantViolation::DepthMismatch {
                cached: node.depth,
                computed: computed_depth,
            });
        }
        if node.left.depth().abs_diff(node.right.depth()) > 1 {
            return Err(InvariantViolation::Unbalanced {
                left_depth: node.left.depth(),
                right_depth: node.right.depth(),
            });
        }
        Ok(())
    }

    fn check_order<C>(&self, comparator: &C) -> Result<(), InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut previous: Option<&K> = None;
        for (position, key) in self.keys().enumerate() {
            if let Some(previous_key) = previous
                && comparator.compare(previous_key, key) != Ordering::Less
            {
                return Err(InvariantViolation::OutOfOrder { position });
            }
            previous = Some(key);
        }
        Ok(())
    }

    #[inline]
    fn node(&self) -> Option<&ValueNode<K, V>> {
        self.root.as_deref()
    }
}

// =============================================================================
// Structural Operations
// =============================================================================

impl<K: Clone, V: Clone> TreeNode<K, V> {
    /// Returns a tree without the entry matching `key`.
    ///
    /// Deleting an absent key returns the same root.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn delete<C>(&self, comparator: &C, key: &K) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.delete_node(comparator, key).unwrap_or_else(|| self.clone())
    }

    /// Builds a perfectly balanced tree from entries in strictly ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::UnsortedInput`] with the position of the first
    /// entry whose key is not greater than its predecessor.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, NodeError, TreeNode};
    ///
    /// let entries = (0..1000).map(|key| (key, key));
    /// let tree = TreeNode::from_sorted_entries(&NaturalOrder, entries).unwrap();
    /// assert_eq!(tree.size(), 1000);
    /// assert_eq!(tree.depth(), 10);
    ///
    /// let unsorted = TreeNode::from_sorted_entries(&NaturalOrder, [(1, ()), (3, ()), (2, ())]);
    /// assert_eq!(unsorted.map(|tree| tree.size()), Err(NodeError::UnsortedInput { position: 2 }));
    /// ```
    pub fn from_sorted_entries<C, I>(comparator: &C, entries: I) -> Result<Self, NodeError>
    where
        C: Comparator<K> + ?Sized,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        if let Some(index) = entries
            .windows(2)
            .position(|pair| comparator.compare(&pair[0].0, &pair[1].0) != Ordering::Less)
        {
            let position = index + 1;
            tracing::debug!(position, length = entries.len(), "rejected unsorted entries");
            return Err(NodeError::UnsortedInput { position });
        }
        let count = entries.len();
        Ok(Self::build_sorted(count, &mut entries.into_iter()))
    }

    fn build_sorted<I: Iterator<Item = (K, V)>>(count: usize, entries: &mut I) -> Self {
        if count == 0 {
            return Self::empty();
        }
        let left_count = count / 2;
        let left = Self::build_sorted(left_count, entries);
        let Some((key, value)) = entries.next() else {
            return left;
        };
        let right = Self::build_sorted(count - left_count - 1, entries);
        Self::branch(key, value, left, right)
    }

    fn delete_node<C>(&self, comparator: &C, key: &K) -> Option<Self>
    where
        C: Comparator<K> + ?Sized,
    {
        let node = self.node()?;
        match comparator.compare(key, &node.key) {
            Ordering::Less => node.left.delete_node(comparator, key).map(|left| {
                Self::balance(node.key.clone(), node.value.clone(), left, node.right.clone())
            }),
            Ordering::Greater => node.right.delete_node(comparator, key).map(|right| {
                Self::balance(node.key.clone(), node.value.clone(), node.left.clone(), right)
            }),
            Ordering::Equal => Some(Self::splice(node)),
        }
    }

    /// Removes the entry of `node` itself, promoting a neighbor from the
    /// deeper subtree when both children are present.
    fn splice(node: &ValueNode<K, V>) -> Self {
        match (node.left.node(), node.right.node()) {
            (None, _) => node.right.clone(),
            (_, None) => node.left.clone(),
            (Some(left), Some(right)) => {
                if left.depth > right.depth {
                    let (key, value, rest) = left.pop_last();
                    Self::balance(key, value, rest, node.right.clone())
                } else {
                    let (key, value, rest) = right.pop_first();
                    Self::balance(key, value, node.left.clone(), rest)
                }
            }
        }
    }

    fn leaf(key: K, value: V) -> Self {
        Self::branch(key, value, Self::empty(), Self::empty())
    }

    fn branch(key: K, value: V, left: Self, right: Self) -> Self {
        let size = 1 + left.size() + right.size();
        let depth = 1 + left.depth().max(right.depth());
        Self {
            root: Some(ReferenceCounter::new(ValueNode {
                key,
                value,
                left,
                right,
                size,
                depth,
            })),
        }
    }

    /// Creates a node from children whose depths differ by at most two,
    /// rotating when they differ by exactly two.
    fn balance(key: K, value: V, left: Self, right: Self) -> Self {
        let left_depth = left.depth();
        let right_depth = right.depth();

        if left_depth > right_depth + 1
            && let Some(pivot) = left.node()
        {
            if pivot.left.depth() >= pivot.right.depth() {
                return Self::branch(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    pivot.left.clone(),
                    Self::branch(key, value, pivot.right.clone(), right),
                );
            }
            if let Some(inner) = pivot.right.node() {
                return Self::branch(
                    inner.key.clone(),
                    inner.value.clone(),
                    Self::branch(
                        pivot.key.clone(),
                        pivot.value.clone(),
                        pivot.left.clone(),
                        inner.left.clone(),
                    ),
                    Self::branch(key, value, inner.right.clone(), right),
                );
            }
        }

        if right_depth > left_depth + 1
            && let Some(pivot) = right.node()
        {
            if pivot.right.depth() >= pivot.left.depth() {
                return Self::branch(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    Self::branch(key, value, left, pivot.left.clone()),
                    pivot.right.clone(),
                );
            }
            if let Some(inner) = pivot.left.node() {
                return Self::branch(
                    inner.key.clone(),
                    inner.value.clone(),
                    Self::branch(key, value, left, inner.left.clone()),
                    Self::branch(
                        pivot.key.clone(),
                        pivot.value.clone(),
                        inner.right.clone(),
                        pivot.right.clone(),
                    ),
                );
            }
        }

        Self::branch(key, value, left, right)
    }
}

impl<K: Clone, V: Clone> ValueNode<K, V> {
    /// Removes the largest entry, returning it with the remaining subtree.
    fn pop_last(&self) -> (K, V, TreeNode<K, V>) {
        match self.right.node() {
            None => (self.key.clone(), self.value.clone(), self.left.clone()),
            Some(right) => {
                let (key, value, rest) = right.pop_last();
                let remaining = TreeNode::balance(
                    self.key.clone(),
                    self.value.clone(),
                    self.left.clone(),
                    rest,
                );
                (key, value, remaining)
            }
        }
    }

    /// Removes the smallest entry, returning it with the remaining subtree.
    fn pop_first(&self) -> (K, V, TreeNode<K, V>) {
        match self.left.node() {
            None => (self.key.clone(), self.value.clone(), self.right.clone()),
            Some(left) => {
                let (key, value, rest) = left.pop_first();
                let remaining = TreeNode::balance(
                    self.key.clone(),
                    self.value.clone(),
                    rest,
                    self.right.clone(),
                );
                (key, value, remaining)
            }
        }
    }
}

impl<K: Clone, V: Clone + PartialEq> TreeNode<K, V> {
    /// Returns a tree with `value` stored under `key`.
    ///
    /// If an entry with an equal value is already stored under `key`, the
    /// same root is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TreeNode};
    ///
    /// let tree = TreeNode::empty().assign(&NaturalOrder, 1, "a");
    /// assert!(tree.assign(&NaturalOrder, 1, "a").ptr_eq(&tree));
    /// assert!(!tree.assign(&NaturalOrder, 1, "b").ptr_eq(&tree));
    /// ```
    #[must_use]
    pub fn assign<C>(&self, comparator: &C, key: K, value: V) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.update(comparator, key, move |_| value)
    }

    /// Returns a tree where the entry for `key` holds `generator(current)`.
    ///
    /// `generator` receives the current value, or `None` when the key is
    /// absent, and is called exactly once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TreeNode};
    ///
    /// let mut tree: TreeNode<&str, u32> = TreeNode::empty();
    /// for word in ["x", "y", "x"] {
    ///     tree = tree.update(&NaturalOrder, word, |current| current.map_or(1, |n| n + 1));
    /// }
    /// assert_eq!(tree.find(&NaturalOrder, &"x"), Some(&2));
    /// assert_eq!(tree.find(&NaturalOrder, &"y"), Some(&1));
    /// ```
    #[must_use]
    pub fn update<C, F>(&self, comparator: &C, key: K, generator: F) -> Self
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
    {
        self.update_node(comparator, key, generator, |value, stored| value == stored)
            .unwrap_or_else(|| self.clone())
    }
}

impl<K: Clone, V: Clone> TreeNode<K, V> {
    /// Returns a tree with `value` stored under `key`, without comparing values.
    ///
    /// A present key always yields a new root that keeps the stored key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TreeNode};
    ///
    /// #[derive(Clone)]
    /// struct Opaque(u8);
    ///
    /// let tree = TreeNode::empty().replace(&NaturalOrder, 1, Opaque(1));
    /// let replaced = tree.replace(&NaturalOrder, 1, Opaque(2));
    /// assert_eq!(replaced.find(&NaturalOrder, &1).map(|value| value.0), Some(2));
    /// ```
    #[must_use]
    pub fn replace<C>(&self, comparator: &C, key: K, value: V) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.replace_with(comparator, key, move |_| value)
    }

    /// Returns a tree where the entry for `key` holds `generator(current)`,
    /// without comparing values.
    #[must_use]
    pub fn replace_with<C, F>(&self, comparator: &C, key: K, generator: F) -> Self
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
    {
        self.update_node(comparator, key, generator, |_, _| false)
            .unwrap_or_else(|| self.clone())
    }

    /// Builds a tree by assigning each entry in turn. Later duplicates win.
    #[must_use]
    pub fn from_entries<C, I>(comparator: &C, entries: I) -> Self
    where
        C: Comparator<K> + ?Sized,
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .fold(Self::empty(), |tree, (key, value)| tree.replace(comparator, key, value))
    }

    /// Returns `None` when the tree is unchanged.
    fn update_node<C, F, S>(
        &self,
        comparator: &C,
        key: K,
        generator: F,
        unchanged: S,
    ) -> Option<Self>
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
        S: FnOnce(&V, &V) -> bool,
    {
        let Some(node) = self.node() else {
            return Some(Self::leaf(key, generator(None)));
        };
        match comparator.compare(&key, &node.key) {
            Ordering::Less => node
                .left
                .update_node(comparator, key, generator, unchanged)
                .map(|left| {
                    Self::balance(node.key.clone(), node.value.clone(), left, node.right.clone())
                }),
            Ordering::Greater => node
                .right
                .update_node(comparator, key, generator, unchanged)
                .map(|right| {
                    Self::balance(node.key.clone(), node.value.clone(), node.left.clone(), right)
                }),
            Ordering::Equal => {
                let value = generator(Some(&node.value));
                (!unchanged(&value, &node.value)).then(|| {
                    Self::branch(node.key.clone(), value, node.left.clone(), node.right.clone())
                })
            }
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An in-order iterator over a range of entries of a [`TreeNode`].
pub struct TreeIterator<'a, K, V> {
    /// Nodes whose entry (and right subtree) are still to be visited
    pending: SmallVec<[&'a ValueNode<K, V>; STACK_CAPACITY]>,
    remaining: usize,
}

impl<'a, K, V> TreeIterator<'a, K, V> {
    fn new(root: &'a TreeNode<K, V>, offset: usize, limit: usize) -> Self {
        let limit = limit.min(root.size());
        let offset = offset.min(limit);

        let mut pending = SmallVec::new();
        let mut current = root.node();
        let mut skip = offset;
        while let Some(node) = current {
            let left_size = node.left.size();
            match skip.cmp(&left_size) {
                Ordering::Less => {
                    pending.push(node);
                    current = node.left.node();
                }
                Ordering::Equal => {
                    pending.push(node);
                    break;
                }
                Ordering::Greater => {
                    skip -= left_size + 1;
                    current = node.right.node();
                }
            }
        }

        Self {
            pending,
            remaining: limit - offset,
        }
    }

    fn push_left_spine(&mut self, tree: &'a TreeNode<K, V>) {
        let mut current = tree.node();
        while let Some(node) = current {
            self.pending.push(node);
            current = node.left.node();
        }
    }
}

impl<'a, K, V> Iterator for TreeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.pending.pop()?;
        self.push_left_spine(&node.right);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for TreeIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> std::iter::FusedIterator for TreeIterator<'_, K, V> {}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V> Clone for TreeNode<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for TreeNode<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, K, V> IntoIterator for &'a TreeNode<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = TreeIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for TreeNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq> Eq for TreeNode<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeNode<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
