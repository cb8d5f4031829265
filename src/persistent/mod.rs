//! Persistent (immutable) node engines.
//!
//! This module provides the structurally shared trees that persistent
//! collections are built on:
//!
//! - [`ListNode`]: Height-balanced list tree with array leaves
//! - [`TreeBuilder`]: Append-only builder producing balanced [`ListNode`]s
//! - [`TreeNode`]: AVL search tree over key/value entries
//! - [`TwoThreeNode`]: 2-3 search tree with the same contract as [`TreeNode`]
//!
//! # Structural Sharing
//!
//! No operation mutates an existing node. Each one returns a new root that
//! reuses every subtree off the changed path, so old and new versions can
//! be used side by side.
//!
//! # Examples
//!
//! ## `ListNode`
//!
//! ```rust
//! use arboreal::persistent::ListNode;
//!
//! let node: ListNode<i32> = (0..100).collect();
//! let updated = node.assign(50, 999).unwrap();
//! assert_eq!(node.get(50), Some(&50));     // Original unchanged
//! assert_eq!(updated.get(50), Some(&999)); // New version
//! ```
//!
//! ## `TreeNode`
//!
//! ```rust
//! use arboreal::persistent::{NaturalOrder, TreeNode};
//!
//! let tree = TreeNode::empty()
//!     .assign(&NaturalOrder, 3, "three")
//!     .assign(&NaturalOrder, 1, "one")
//!     .assign(&NaturalOrder, 2, "two");
//!
//! // Entries are always in comparator order
//! let keys: Vec<&i32> = tree.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod comparator;
mod error;
mod list_node;
mod tree_builder;
mod tree_node;
mod two_three_node;

pub use comparator::Comparator;
pub use comparator::NaturalOrder;
pub use comparator::ReverseOrder;
pub use error::InvariantViolation;
pub use error::NodeError;
pub use list_node::ListNode;
pub use list_node::MAX_LEAF_SIZE;
pub use list_node::NodeIterator;
pub use tree_builder::TreeBuilder;
pub use tree_node::TreeIterator;
pub use tree_node::TreeNode;
pub use two_three_node::TwoThreeIterator;
pub use two_three_node::TwoThreeNode;

// =============================================================================
// Tests
// =============================================================================
