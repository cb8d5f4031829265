//! Persistent (immutable) list tree based on a height-balanced binary tree.
//!
//! This module provides [`ListNode`], the node engine behind persistent
//! lists. A node is one of four shapes:
//!
//! - **Empty**: no elements
//! - **One value**: exactly one element
//! - **Multi value**: a leaf array of 2 to [`MAX_LEAF_SIZE`] elements
//! - **Branch**: two non-empty children with cached size and depth
//!
//! # Overview
//!
//! - O(log N) `get`, `assign`, `insert`, `delete`
//! - O(log N) `append`/`prepend` of a value (into the edge leaf)
//! - O(log N) concatenation of two trees (`append_node`/`prepend_node`)
//! - O(log N) `prefix`/`suffix` truncation
//! - O(N) bulk construction from a slice or iterator
//!
//! Every operation returns a new root. Children that are not on the path to
//! the change are shared with the original node.
//!
//! # Examples
//!
//! ```rust
//! use arboreal::persistent::ListNode;
//!
//! let node: ListNode<i32> = (0..1000).collect();
//! assert_eq!(node.size(), 1000);
//! assert_eq!(node.get(500), Some(&500));
//!
//! let longer = node.append(1000);
//! assert_eq!(node.size(), 1000);   // Original unchanged
//! assert_eq!(longer.size(), 1001); // New version
//! assert!(longer.check_invariants().is_ok());
//! ```
//!
//! # Internal Structure
//!
//! Every branch satisfies:
//! 1. Both children are non-empty
//! 2. `size == left.size + right.size` and `size > MAX_LEAF_SIZE`
//! 3. `depth == 1 + max(left.depth, right.depth)`
//! 4. `|left.depth - right.depth| <= 1`
//!
//! Leaves always have depth 0.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::error::{InvariantViolation, NodeError};
use super::tree_builder::TreeBuilder;

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of elements stored in a single leaf array.
pub const MAX_LEAF_SIZE: usize = 128;

/// Inline capacity of the traversal stack (one entry per level).
const STACK_CAPACITY: usize = 24;

// =============================================================================
// Node Definition
// =============================================================================

#[derive(Clone)]
enum Node<T> {
    Empty,
    OneValue(T),
    MultiValue(ReferenceCounter<[T]>),
    Branch(ReferenceCounter<BranchNode<T>>),
}

struct BranchNode<T> {
    left: ListNode<T>,
    right: ListNode<T>,
    size: usize,
    depth: usize,
}

/// A persistent (immutable) list tree node.
///
/// `ListNode` is the root handle of a list tree. Cloning it is O(1) and
/// shares the whole tree. All "mutating" operations return a new root.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `get`          | O(log N)   |
/// | `assign`       | O(log N)   |
/// | `insert`       | O(log N)   |
/// | `delete`       | O(log N)   |
/// | `append`       | O(log N)   |
/// | `append_node`  | O(log N)   |
/// | `prefix`       | O(log N)   |
/// | `suffix`       | O(log N)   |
/// | `reverse`      | O(N)       |
/// | `size`/`depth` | O(1)       |
///
/// # Examples
///
/// ```rust
/// use arboreal::persistent::ListNode;
///
/// let node = ListNode::empty().append(1).append(2).prepend(0);
/// let values: Vec<&i32> = node.iter().collect();
/// assert_eq!(values, vec![&0, &1, &2]);
/// ```
#[derive(Clone)]
pub struct ListNode<T> {
    node: Node<T>,
}

impl<T> ListNode<T> {
    /// Creates an empty node.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node: ListNode<i32> = ListNode::empty();
    /// assert!(node.is_empty());
    /// assert_eq!(node.depth(), 0);
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { node: Node::Empty }
    }

    /// Returns the number of elements in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.node {
            Node::Empty => 0,
            Node::OneValue(_) => 1,
            Node::MultiValue(elements) => elements.len(),
            Node::Branch(branch) => branch.size,
        }
    }

    /// Returns the height of the tree. Leaves have depth 0.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        match &self.node {
            Node::Branch(branch) => branch.depth,
            _ => 0,
        }
    }

    /// Returns `true` if the tree contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.node, Node::Empty)
    }

    /// Returns a reference to the element at `index`, or `None` if out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node = ListNode::from_slice(&[10, 20, 30]);
    /// assert_eq!(node.get(1), Some(&20));
    /// assert_eq!(node.get(3), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let mut current = self;
        let mut index = index;
        loop {
            match &current.node {
                Node::Branch(branch) => {
                    let left_size = branch.left.size();
                    if index < left_size {
                        current = &branch.left;
                    } else {
                        index -= left_size;
                        current = &branch.right;
                    }
                }
                _ => return current.as_leaf().and_then(|elements| elements.get(index)),
            }
        }
    }

    /// Returns the first element, or `None` if the tree is empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.first_leaf().first()
    }

    /// Returns the last element, or `None` if the tree is empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.last_leaf().last()
    }

    /// Returns an iterator over all elements in order.
    ///
    /// Each call creates a fresh traversal starting at the first element.
    #[must_use]
    pub fn iter(&self) -> NodeIterator<'_, T> {
        NodeIterator::new(self, 0, self.size())
    }

    /// Returns an iterator over the elements at positions `offset..limit`.
    ///
    /// Both bounds are clamped to the size of the tree, so an oversized
    /// range yields the available elements only.
    ///
    /// # Complexity
    ///
    /// O(log N) to create, O(1) amortized per element
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node: ListNode<i32> = (0..500).collect();
    /// let window: Vec<i32> = node.iter_range(250, 253).copied().collect();
    /// assert_eq!(window, vec![250, 251, 252]);
    /// ```
    #[must_use]
    pub fn iter_range(&self, offset: usize, limit: usize) -> NodeIterator<'_, T> {
        NodeIterator::new(self, offset, limit)
    }

    /// Returns `true` if both handles refer to the same node allocation.
    ///
    /// Two empty nodes are always identical. Single-value nodes own their
    /// element inline and are never identical to another handle.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (Node::Empty, Node::Empty) => true,
            (Node::MultiValue(first), Node::MultiValue(second)) => {
                ReferenceCounter::ptr_eq(first, second)
            }
            (Node::Branch(first), Node::Branch(second)) => ReferenceCounter::ptr_eq(first, second),
            _ => false,
        }
    }

    /// Verifies every structural invariant of the tree.
    ///
    /// This walks the whole tree and is intended for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let result = self.check_node();
        if let Err(violation) = &result {
            tracing::debug!(%violation, size = self.size(), "list node invariant check failed");
        }
        result
    }

    fn check_node(&self) -> Result<(), InvariantViolation> {
        match &self.node {
            Node::Empty | Node::OneValue(_) => Ok(()),
            Node::MultiValue(elements) => {
                if (2..=MAX_LEAF_SIZE).contains(&elements.len()) {
                    Ok(())
                } else {
                    Err(InvariantViolation::LeafSize {
                        length: elements.len(),
                    })
                }
            }
            Node::Branch(branch) => {
                let (left, right) = (&branch.left, &branch.right);
                if left.is_empty() || right.is_empty() {
                    return Err(InvariantViolation::EmptyChild);
                }
                left.check_node()?;
                right.check_node()?;

                let computed_size = left.size() + right.size();
                if branch.size != computed_size {
                    return Err(InvariantViolation::SizeMismatch {
                        cached: branch.size,
                        computed: computed_size,
                    });
                }
                let computed_depth = 1 + left.depth().max(right.depth());
                if branch.depth != computed_depth {
                    return Err(InvariantViolation::DepthMismatch {
                        cached: branch.depth,
                        computed: computed_depth,
                    });
                }
                if left.depth().abs_diff(right.depth()) > 1 {
                    return Err(InvariantViolation::Unbalanced {
                        left_depth: left.depth(),
                        right_depth: right.depth(),
                    });
                }
                if branch.size <= MAX_LEAF_SIZE {
                    return Err(InvariantViolation::UndersizedBranch { size: branch.size });
                }
                Ok(())
            }
        }
    }

    /// Returns the leaf array of a non-branch node.
    fn as_leaf(&self) -> Option<&[T]> {
        match &self.node {
            Node::Empty => Some(Default::default()),
            Node::OneValue(value) => Some(std::slice::from_ref(value)),
            Node::MultiValue(elements) => Some(&elements[..]),
            Node::Branch(_) => None,
        }
    }

    /// Returns the children of a branch.
    fn children(&self) -> Option<(&Self, &Self)> {
        match &self.node {
            Node::Branch(branch) => Some((&branch.left, &branch.right)),
            _ => None,
        }
    }

    /// Returns the leftmost leaf array.
    fn first_leaf(&self) -> &[T] {
        let mut current = self;
        while let Some((left, _)) = current.children() {
            current = left;
        }
        current.as_leaf().unwrap_or_default()
    }

    /// Returns the rightmost leaf array.
    pub(super) fn last_leaf(&self) -> &[T] {
        let mut current = self;
        while let Some((_, right)) = current.children() {
            current = right;
        }
        current.as_leaf().unwrap_or_default()
    }
}

impl<T: Clone> ListNode<T> {
    /// Builds a balanced tree from an indexed source in O(N).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let source: Vec<i32> = (1..=1000).collect();
    /// let node = ListNode::from_slice(&source);
    /// assert_eq!(node.size(), 1000);
    /// assert_eq!(node.get(500), Some(&501));
    /// ```
    #[must_use]
    pub fn from_slice(values: &[T]) -> Self {
        let mut builder = TreeBuilder::new();
        builder.add_slice(values);
        builder.build()
    }

    /// Returns a new tree with `value` added after the last element.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn append(&self, value: T) -> Self {
        self.insert_unchecked(self.size(), value)
    }

    /// Returns a new tree with `value` added before the first element.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn prepend(&self, value: T) -> Self {
        self.insert_unchecked(0, value)
    }

    /// Returns the concatenation of this tree followed by `other`.
    ///
    /// Whole subtrees of both inputs are shared into the result.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let first: ListNode<i32> = (1..=100).collect();
    /// let second: ListNode<i32> = (101..=150).collect();
    /// let joined = first.append_node(&second);
    /// assert_eq!(joined.size(), 150);
    /// assert!(joined.iter().copied().eq(1..=150));
    /// ```
    #[must_use]
    pub fn append_node(&self, other: &Self) -> Self {
        Self::concat(self.clone(), other.clone())
    }

    /// Returns the concatenation of `other` followed by this tree.
    #[must_use]
    pub fn prepend_node(&self, other: &Self) -> Self {
        Self::concat(other.clone(), self.clone())
    }

    /// Returns a new tree with the element at `index` replaced by `value`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IndexOutOfBounds`] if `index >= size()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node = ListNode::from_slice(&[1, 2, 3]);
    /// let updated = node.assign(1, 20).unwrap();
    /// assert_eq!(node.get(1), Some(&2));
    /// assert_eq!(updated.get(1), Some(&20));
    /// ```
    pub fn assign(&self, index: usize, value: T) -> Result<Self, NodeError> {
        check_index(index, self.size())?;
        Ok(self.assign_unchecked(index, value))
    }

    /// Returns a new tree with `value` inserted before position `index`.
    ///
    /// `index == size()` appends.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IndexOutOfBounds`] if `index > size()`.
    pub fn insert(&self, index: usize, value: T) -> Result<Self, NodeError> {
        check_position(index, self.size())?;
        Ok(self.insert_unchecked(index, value))
    }

    /// Returns a new tree with all elements of `other` inserted before position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IndexOutOfBounds`] if `index > size()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node = ListNode::from_slice(&[1, 5]);
    /// let spliced = node.insert_all(1, &ListNode::from_slice(&[2, 3, 4])).unwrap();
    /// assert!(spliced.iter().copied().eq(1..=5));
    /// ```
    pub fn insert_all(&self, index: usize, other: &Self) -> Result<Self, NodeError> {
        check_position(index, self.size())?;
        let head = Self::concat(self.prefix_unchecked(index), other.clone());
        Ok(Self::concat(head, self.suffix_unchecked(index)))
    }

    /// Returns a new tree without the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyNode`] for an empty tree and
    /// [`NodeError::IndexOutOfBounds`] if `index >= size()`.
    pub fn delete(&self, index: usize) -> Result<Self, NodeError> {
        if self.is_empty() {
            return Err(NodeError::EmptyNode);
        }
        check_index(index, self.size())?;
        Ok(self.delete_unchecked(index))
    }

    /// Returns a new tree without its first element.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyNode`] if the tree is empty.
    pub fn delete_first(&self) -> Result<Self, NodeError> {
        if self.is_empty() {
            return Err(NodeError::EmptyNode);
        }
        Ok(self.delete_unchecked(0))
    }

    /// Returns a new tree without its last element.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyNode`] if the tree is empty.
    pub fn delete_last(&self) -> Result<Self, NodeError> {
        if self.is_empty() {
            return Err(NodeError::EmptyNode);
        }
        Ok(self.delete_unchecked(self.size() - 1))
    }

    /// Returns a tree holding the first `limit` elements.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IndexOutOfBounds`] if `limit > size()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::ListNode;
    ///
    /// let node: ListNode<i32> = (0..300).collect();
    /// let head = node.prefix(130).unwrap();
    /// let tail = node.suffix(130).unwrap();
    /// assert_eq!(head.size(), 130);
    /// assert_eq!(tail.first(), Some(&130));
    /// assert_eq!(head.append_node(&tail), node);
    /// ```
    pub fn prefix(&self, limit: usize) -> Result<Self, NodeError> {
        check_position(limit, self.size())?;
        Ok(self.prefix_unchecked(limit))
    }

    /// Returns a tree holding the elements from position `offset` onward.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IndexOutOfBounds`] if `offset > size()`.
    pub fn suffix(&self, offset: usize) -> Result<Self, NodeError> {
        check_position(offset, self.size())?;
        Ok(self.suffix_unchecked(offset))
    }

    /// Returns a tree holding the elements at positions `offset..limit`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidRange`] unless `offset <= limit <= size()`.
    pub fn slice(&self, offset: usize, limit: usize) -> Result<Self, NodeError> {
        let length = self.size();
        if offset > limit || limit > length {
            return Err(NodeError::InvalidRange {
                offset,
                limit,
                length,
            });
        }
        Ok(self.prefix_unchecked(limit).suffix_unchecked(offset))
    }

    /// Returns a tree holding the same elements in reverse order.
    ///
    /// Branch children are swapped recursively, which keeps the tree balanced.
    ///
    /// # Complexity
    ///
    /// O(N)
    #[must_use]
    pub fn reverse(&self) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                Self::branch_unchecked(branch.right.reverse(), branch.left.reverse())
            }
            Node::MultiValue(elements) => Self {
                node: Node::MultiValue(elements.iter().rev().cloned().collect()),
            },
            Node::Empty | Node::OneValue(_) => self.clone(),
        }
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    /// Wraps at most `MAX_LEAF_SIZE` elements in the matching leaf shape.
    pub(super) fn from_leaf_vec(mut elements: Vec<T>) -> Self {
        debug_assert!(elements.len() <= MAX_LEAF_SIZE);
        match elements.len() {
            0 => Self::empty(),
            1 => elements.pop().map_or_else(Self::empty, |value| Self {
                node: Node::OneValue(value),
            }),
            _ => Self {
                node: Node::MultiValue(ReferenceCounter::from(elements)),
            },
        }
    }

    /// Creates a branch without checking balance or leaf merging.
    pub(super) fn branch_unchecked(left: Self, right: Self) -> Self {
        let size = left.size() + right.size();
        let depth = 1 + left.depth().max(right.depth());
        Self {
            node: Node::Branch(ReferenceCounter::new(BranchNode {
                left,
                right,
                size,
                depth,
            })),
        }
    }

    /// Joins two subtrees whose depths differ by at most one.
    ///
    /// Empty sides collapse to the other side, and two leaves that fit in a
    /// single array are merged.
    fn make_branch(left: Self, right: Self) -> Self {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }
        if left.size() + right.size() <= MAX_LEAF_SIZE
            && let (Some(left_elements), Some(right_elements)) = (left.as_leaf(), right.as_leaf())
        {
            return Self::from_leaf_vec([left_elements, right_elements].concat());
        }
        Self::branch_unchecked(left, right)
    }

    /// Joins two subtrees whose depths differ by at most two, rotating once
    /// (or twice) when the difference is exactly two.
    fn balance(left: Self, right: Self) -> Self {
        let left_depth = left.depth();
        let right_depth = right.depth();

        if left_depth > right_depth + 1
            && let Node::Branch(outer) = &left.node
        {
            if outer.left.depth() >= outer.right.depth() {
                return Self::make_branch(
                    outer.left.clone(),
                    Self::make_branch(outer.right.clone(), right),
                );
            }
            if let Node::Branch(inner) = &outer.right.node {
                return Self::make_branch(
                    Self::make_branch(outer.left.clone(), inner.left.clone()),
                    Self::make_branch(inner.right.clone(), right),
                );
            }
        }

        if right_depth > left_depth + 1
            && let Node::Branch(outer) = &right.node
        {
            if outer.right.depth() >= outer.left.depth() {
                return Self::make_branch(
                    Self::make_branch(left, outer.left.clone()),
                    outer.right.clone(),
                );
            }
            if let Node::Branch(inner) = &outer.left.node {
                return Self::make_branch(
                    Self::make_branch(left, inner.left.clone()),
                    Self::make_branch(inner.right.clone(), outer.right.clone()),
                );
            }
        }

        Self::make_branch(left, right)
    }

    /// Concatenates two trees of arbitrary depth.
    ///
    /// The shallower tree is pushed down the facing spine of the deeper one
    /// until the depths are within one, rebalancing on the way back up.
    pub(super) fn concat(left: Self, right: Self) -> Self {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }

        let left_depth = left.depth();
        let right_depth = right.depth();

        if left_depth > right_depth + 1
            && let Node::Branch(branch) = &left.node
        {
            return Self::balance(
                branch.left.clone(),
                Self::concat(branch.right.clone(), right),
            );
        }
        if right_depth > left_depth + 1
            && let Node::Branch(branch) = &right.node
        {
            return Self::balance(
                Self::concat(left, branch.left.clone()),
                branch.right.clone(),
            );
        }

        if let Some(elements) = right.as_leaf()
            && left.last_leaf().len() + elements.len() <= MAX_LEAF_SIZE
        {
            return left.extend_last_leaf(elements);
        }
        if let Some(elements) = left.as_leaf()
            && right.first_leaf().len() + elements.len() <= MAX_LEAF_SIZE
        {
            return right.extend_first_leaf(elements);
        }

        Self::make_branch(left, right)
    }

    /// Appends `extra` to the rightmost leaf. The caller guarantees it fits.
    fn extend_last_leaf(&self, extra: &[T]) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                Self::branch_unchecked(branch.left.clone(), branch.right.extend_last_leaf(extra))
            }
            _ => Self::from_leaf_vec([self.as_leaf().unwrap_or_default(), extra].concat()),
        }
    }

    /// Prepends `extra` to the leftmost leaf. The caller guarantees it fits.
    fn extend_first_leaf(&self, extra: &[T]) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                Self::branch_unchecked(branch.left.extend_first_leaf(extra), branch.right.clone())
            }
            _ => Self::from_leaf_vec([extra, self.as_leaf().unwrap_or_default()].concat()),
        }
    }

    // =========================================================================
    // Positional operations (indices already validated)
    // =========================================================================

    fn assign_unchecked(&self, index: usize, value: T) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                let left_size = branch.left.size();
                if index < left_size {
                    Self::branch_unchecked(
                        branch.left.assign_unchecked(index, value),
                        branch.right.clone(),
                    )
                } else {
                    Self::branch_unchecked(
                        branch.left.clone(),
                        branch.right.assign_unchecked(index - left_size, value),
                    )
                }
            }
            _ => {
                let mut elements = self.as_leaf().unwrap_or_default().to_vec();
                if let Some(slot) = elements.get_mut(index) {
                    *slot = value;
                }
                Self::from_leaf_vec(elements)
            }
        }
    }

    fn insert_unchecked(&self, index: usize, value: T) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                let left_size = branch.left.size();
                if index < left_size {
                    Self::balance(
                        branch.left.insert_unchecked(index, value),
                        branch.right.clone(),
                    )
                } else {
                    Self::balance(
                        branch.left.clone(),
                        branch.right.insert_unchecked(index - left_size, value),
                    )
                }
            }
            _ => {
                let elements = self.as_leaf().unwrap_or_default();
                let mut combined = Vec::with_capacity(elements.len() + 1);
                combined.extend_from_slice(&elements[..index]);
                combined.push(value);
                combined.extend_from_slice(&elements[index..]);
                if combined.len() <= MAX_LEAF_SIZE {
                    Self::from_leaf_vec(combined)
                } else {
                    // Full leaf: split the MAX_LEAF_SIZE + 1 elements at the midpoint.
                    let upper = combined.split_off(combined.len() / 2);
                    Self::branch_unchecked(
                        Self::from_leaf_vec(combined),
                        Self::from_leaf_vec(upper),
                    )
                }
            }
        }
    }

    fn delete_unchecked(&self, index: usize) -> Self {
        match &self.node {
            Node::Branch(branch) => {
                let left_size = branch.left.size();
                if index < left_size {
                    Self::balance(branch.left.delete_unchecked(index), branch.right.clone())
                } else {
                    Self::balance(
                        branch.left.clone(),
                        branch.right.delete_unchecked(index - left_size),
                    )
                }
            }
            _ => {
                let elements = self.as_leaf().unwrap_or_default();
                Self::from_leaf_vec([&elements[..index], &elements[index + 1..]].concat())
            }
        }
    }

    /// Keeps the first `limit` elements.
    pub(super) fn prefix_unchecked(&self, limit: usize) -> Self {
        if limit == 0 {
            return Self::empty();
        }
        if limit >= self.size() {
            return self.clone();
        }
        match &self.node {
            Node::Branch(branch) => {
                let left_size = branch.left.size();
                if limit <= left_size {
                    branch.left.prefix_unchecked(limit)
                } else {
                    Self::concat(
                        branch.left.clone(),
                        branch.right.prefix_unchecked(limit - left_size),
                    )
                }
            }
            _ => Self::from_leaf_vec(self.as_leaf().unwrap_or_default()[..limit].to_vec()),
        }
    }

    /// Drops the first `offset` elements.
    fn suffix_unchecked(&self, offset: usize) -> Self {
        if offset == 0 {
            return self.clone();
        }
        if offset >= self.size() {
            return Self::empty();
        }
        match &self.node {
            Node::Branch(branch) => {
                let left_size = branch.left.size();
                if offset >= left_size {
                    branch.right.suffix_unchecked(offset - left_size)
                } else {
                    Self::concat(
                        branch.left.suffix_unchecked(offset),
                        branch.right.clone(),
                    )
                }
            }
            _ => Self::from_leaf_vec(self.as_leaf().unwrap_or_default()[offset..].to_vec()),
        }
    }
}

/// Accepts `index` when it addresses an element.
const fn check_index(index: usize, length: usize) -> Result<(), NodeError> {
    if index < length {
        Ok(())
    } else {
        Err(NodeError::IndexOutOfBounds { index, length })
    }
}

/// Accepts `position` when it addresses a gap between elements (or either end).
const fn check_position(position: usize, length: usize) -> Result<(), NodeError> {
    if position <= length {
        Ok(())
    } else {
        Err(NodeError::IndexOutOfBounds {
            index: position,
            length,
        })
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An in-order iterator over a range of elements of a [`ListNode`].
///
/// The iterator keeps a stack of the right subtrees still to visit and a
/// cursor into the current leaf array.
pub struct NodeIterator<'a, T> {
    /// Right subtrees not yet visited, innermost on top
    pending: SmallVec<[&'a ListNode<T>; STACK_CAPACITY]>,
    /// Cursor into the current leaf
    leaf: std::slice::Iter<'a, T>,
    /// Elements left to yield
    remaining: usize,
}

impl<'a, T> NodeIterator<'a, T> {
    fn new(root: &'a ListNode<T>, offset: usize, limit: usize) -> Self {
        let limit = limit.min(root.size());
        let offset = offset.min(limit);

        let mut pending = SmallVec::new();
        let mut current = root;
        let mut skip = offset;
        while let Some((left, right)) = current.children() {
            let left_size = left.size();
            if skip < left_size {
                pending.push(right);
                current = left;
            } else {
                skip -= left_size;
                current = right;
            }
        }

        let elements = current.as_leaf().unwrap_or_default();
        Self {
            pending,
            leaf: elements.get(skip..).unwrap_or_default().iter(),
            remaining: limit - offset,
        }
    }

    /// Descends to the leftmost leaf of `node`, stacking right siblings.
    fn descend(&mut self, node: &'a ListNode<T>) {
        let mut current = node;
        while let Some((left, right)) = current.children() {
            self.pending.push(right);
            current = left;
        }
        self.leaf = current.as_leaf().unwrap_or_default().iter();
    }
}

impl<'a, T> Iterator for NodeIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(element) = self.leaf.next() {
                self.remaining -= 1;
                return Some(element);
            }
            let next_subtree = self.pending.pop()?;
            self.descend(next_subtree);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for NodeIterator<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for NodeIterator<'_, T> {}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for ListNode<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> FromIterator<T> for ListNode<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut builder = TreeBuilder::new();
        builder.add_all(iter);
        builder.build()
    }
}

impl<'a, T> IntoIterator for &'a ListNode<T> {
    type Item = &'a T;
    type IntoIter = NodeIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for ListNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<T: Eq> Eq for ListNode<T> {}

impl<T: Hash> Hash for ListNode<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ListNode<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for ListNode<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Rayon Support
// =============================================================================

#[cfg(feature = "rayon")]
impl<T: Send + Sync> ListNode<T> {
    /// Returns a parallel iterator over all elements in order.
    ///
    /// The position range is split in halves down to leaf-sized pieces,
    /// each of which is walked with [`iter_range`](Self::iter_range).
    pub fn par_iter(&self) -> impl rayon::iter::ParallelIterator<Item = &T> + '_ {
        use rayon::iter::ParallelIterator;

        rayon::iter::split((0, self.size()), |(offset, limit): (usize, usize)| {
            if limit - offset <= MAX_LEAF_SIZE {
                ((offset, limit), None)
            } else {
                let middle = offset + (limit - offset) / 2;
                ((offset, middle), Some((middle, limit)))
            }
        })
        .flat_map_iter(move |(offset, limit)| self.iter_range(offset, limit))
    }
}

#[cfg(feature = "rayon")]
impl<T: Clone + Send + Sync> rayon::iter::FromParallelIterator<T> for ListNode<T> {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: rayon::iter::IntoParallelIterator<Item = T>,
    {
        use rayon::iter::ParallelIterator;

        par_iter
            .into_par_iter()
            .fold(TreeBuilder::new, |mut builder, value| {
                builder.add(value);
                builder
            })
            .reduce(TreeBuilder::new, TreeBuilder::combine_with)
            .build()
    }
}

// =============================================================================
// Tests
// =============================================================================
