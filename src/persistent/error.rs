//! Error types for the node engines.
//!
//! Two families of errors exist:
//!
//! - [`NodeError`] reports a precondition violation by the caller (an index
//!   past the end, a delete from an empty node, unsorted bulk input). It is
//!   returned before any node is built, so the receiver is always intact.
//! - [`InvariantViolation`] is only produced by the `check_invariants` walks
//!   and indicates a bug in the engine itself.

use thiserror::Error;

/// A precondition violated by the caller of a node operation.
///
/// # Examples
///
/// ```rust
/// use arboreal::persistent::{ListNode, NodeError};
///
/// let node: ListNode<i32> = (0..3).collect();
/// assert_eq!(
///     node.delete(7),
///     Err(NodeError::IndexOutOfBounds { index: 7, length: 3 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A positional argument does not address an element (or gap) of the node.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// The size of the node at the time of the call.
        length: usize,
    },
    /// `delete_first`/`delete_last` was called on an empty node.
    #[error("cannot delete from an empty node")]
    EmptyNode,
    /// An `(offset, limit)` pair does not describe a range of the source.
    #[error("range {offset}..{limit} is invalid for length {length}")]
    InvalidRange {
        /// Start of the requested range.
        offset: usize,
        /// Exclusive end of the requested range.
        limit: usize,
        /// Length of the source.
        length: usize,
    },
    /// Sorted bulk input contained a key not strictly greater than its predecessor.
    #[error("entries are not strictly ascending at position {position}")]
    UnsortedInput {
        /// Position of the first offending entry.
        position: usize,
    },
}

/// A structural invariant found broken by a `check_invariants` walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A cached size disagrees with the size computed from the children.
    #[error("cached size {cached} does not match computed size {computed}")]
    SizeMismatch {
        /// Value stored in the node.
        cached: usize,
        /// Value recomputed from the children.
        computed: usize,
    },
    /// A cached depth disagrees with the depth computed from the children.
    #[error("cached depth {cached} does not match computed depth {computed}")]
    DepthMismatch {
        /// Value stored in the node.
        cached: usize,
        /// Value recomputed from the children.
        computed: usize,
    },
    /// Child depths differ by more than one.
    #[error("children are unbalanced: left depth {left_depth}, right depth {right_depth}")]
    Unbalanced {
        /// Depth of the left child.
        left_depth: usize,
        /// Depth of the right child.
        right_depth: usize,
    },
    /// A list branch holds no more elements than a single leaf could.
    #[error("branch of size {size} should have been collapsed into a leaf")]
    UndersizedBranch {
        /// Combined size of the branch.
        size: usize,
    },
    /// A list branch has an empty child.
    #[error("branch has an empty child")]
    EmptyChild,
    /// A multi-value leaf holds fewer than two or more than the maximum elements.
    #[error("leaf holds {length} elements")]
    LeafSize {
        /// Number of elements in the leaf.
        length: usize,
    },
    /// In-order traversal produced a key not strictly greater than its predecessor.
    #[error("keys out of order at position {position}")]
    OutOfOrder {
        /// Position of the first out-of-order entry.
        position: usize,
    },
    /// Leaves of a 2-3 tree are not all at the same depth.
    #[error("leaf depths differ: {first} and {second}")]
    UnevenLeafDepth {
        /// Leaf depth of one child.
        first: usize,
        /// Leaf depth of a sibling.
        second: usize,
    },
    /// A cached maximum key of a 2-3 node differs from the child's real maximum.
    #[error("cached maximum key is stale")]
    StaleMaxKey,
    /// A builder slot does not hold a perfect tree of the expected shape.
    #[error("slot {level} holds size {size} at depth {depth}, expected size {expected_size}")]
    SlotShape {
        /// Slot level.
        level: usize,
        /// Size of the subtree in the slot.
        size: usize,
        /// Depth of the subtree in the slot.
        depth: usize,
        /// Size required at this level.
        expected_size: usize,
    },
    /// The builder staging buffer reached a full leaf without being flushed.
    #[error("builder buffer holds {length} elements")]
    BufferOverflow {
        /// Number of buffered elements.
        length: usize,
    },
}
