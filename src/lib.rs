//! # arboreal
//!
//! Structurally shared tree engines for persistent collections.
//!
//! ## Overview
//!
//! The crate provides the node-level machinery that persistent lists,
//! ordered maps and ordered sets are built on:
//!
//! - **List Tree**: [`ListNode`](persistent::ListNode), a height-balanced
//!   binary tree with array leaves supporting O(log N) index access,
//!   insertion, deletion, concatenation and splitting
//! - **Bulk Builder**: [`TreeBuilder`](persistent::TreeBuilder), amortized
//!   O(1) appends that fold leaves into balanced subtrees
//! - **Search Trees**: [`TreeNode`](persistent::TreeNode) (AVL) and
//!   [`TwoThreeNode`](persistent::TwoThreeNode) (2-3), ordered by a
//!   caller-supplied [`Comparator`](persistent::Comparator)
//!
//! ## Feature Flags
//!
//! - `arc`: Use `Arc` instead of `Rc` so node graphs are `Send + Sync`
//! - `rayon`: Parallel traversal and collection for `ListNode` (implies `arc`)
//!
//! ## Example
//!
//! ```rust
//! use arboreal::prelude::*;
//!
//! let list: ListNode<i32> = (1..=1000).collect();
//! assert_eq!(list.get(500), Some(&501));
//!
//! let tree = TreeNode::from_entries(&NaturalOrder, [(2, "b"), (1, "a")]);
//! assert_eq!(tree.first_entry(), Some((&1, &"a")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports every public type of [`persistent`].
///
/// # Usage
///
/// ```rust
/// use arboreal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
