//! Caller-supplied key orderings for the search tree engines.
//!
//! The search trees never store their comparator. Every operation receives
//! it explicitly, and a given tree must always be used with the same one.
//! Any `Fn(&K, &K) -> Ordering` closure is a comparator.
//!
//! # Examples
//!
//! ```rust
//! use arboreal::persistent::{NaturalOrder, TreeNode};
//! use std::cmp::Ordering;
//!
//! let by_length = |left: &String, right: &String| left.len().cmp(&right.len());
//! let tree = TreeNode::empty()
//!     .assign(&by_length, "ccc".to_string(), 3)
//!     .assign(&by_length, "a".to_string(), 1);
//! assert_eq!(tree.find(&by_length, &"x".to_string()), Some(&1));
//!
//! let numbers = TreeNode::empty().assign(&NaturalOrder, 2, "two");
//! assert_eq!(numbers.find(&NaturalOrder, &2), Some(&"two"));
//! ```

use std::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Implementations that are not a valid total order produce an undefined
/// (but memory-safe) tree shape.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, left: &K, right: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self(left, right)
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        right.cmp(left)
    }
}
