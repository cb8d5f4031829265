//! Persistent (immutable) ordered tree based on a 2-3 tree.
//!
//! [`TwoThreeNode`] implements the same ordered-map contract as
//! [`TreeNode`](super::TreeNode) with a different balancing scheme. Entries
//! live only in leaves, and every internal node has two or three children
//! together with the maximum key of each child. All leaves are at the same
//! depth at all times.
//!
//! Instead of rotations, changes propagate bottom-up as explicit outcomes:
//!
//! - an insert returns [`UpdateResult`]: the subtree is unchanged, replaced
//!   in place, or split into two siblings the parent must absorb
//! - a delete returns [`DeleteResult`]: the subtree is unchanged, replaced in
//!   place, eliminated, or reduced to a remnant one level too short that the
//!   parent merges with (or redistributes into) an adjacent sibling
//!
//! A split reaching the root adds a level, and a remnant reaching the root
//! removes one.
//!
//! # Examples
//!
//! ```rust
//! use arboreal::persistent::{NaturalOrder, TwoThreeNode};
//!
//! let mut tree = TwoThreeNode::empty();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree = tree.assign(&NaturalOrder, key, key.to_string());
//! }
//! assert_eq!(tree.size(), 7);
//! assert_eq!(tree.find(&NaturalOrder, &4).map(String::as_str), Some("4"));
//!
//! let smaller = tree.delete(&NaturalOrder, &5);
//! let keys: Vec<i32> = smaller.iter().map(|(key, _)| *key).collect();
//! assert_eq!(keys, vec![1, 3, 4, 7, 8, 9]);
//! assert!(smaller.check_invariants(&NaturalOrder).is_ok());
//! ```

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::comparator::Comparator;
use super::error::InvariantViolation;

const STACK_CAPACITY: usize = 48;

// =============================================================================
// Node Definitions
// =============================================================================

struct LeafEntry<K, V> {
    key: K,
    value: V,
}

struct TwoNode<K, V> {
    left: Subtree<K, V>,
    right: Subtree<K, V>,
    left_max: K,
    right_max: K,
    size: usize,
    depth: usize,
}

struct ThreeNode<K, V> {
    left: Subtree<K, V>,
    middle: Subtree<K, V>,
    right: Subtree<K, V>,
    left_max: K,
    middle_max: K,
    right_max: K,
    size: usize,
    depth: usize,
}

enum Subtree<K, V> {
    Leaf(ReferenceCounter<LeafEntry<K, V>>),
    Two(ReferenceCounter<TwoNode<K, V>>),
    Three(ReferenceCounter<ThreeNode<K, V>>),
}

/// Outcome of inserting into or updating a subtree.
enum UpdateResult<K, V> {
    /// The stored value already equals the new one.
    Unchanged,
    /// The subtree was replaced by one of the same depth.
    InPlace(Subtree<K, V>),
    /// The subtree overflowed into two siblings of the same depth.
    Split(Subtree<K, V>, Subtree<K, V>),
}

/// Outcome of deleting from a subtree.
enum DeleteResult<K, V> {
    /// The key was not found.
    Unchanged,
    /// The subtree was replaced by one of the same depth.
    InPlace(Subtree<K, V>),
    /// The subtree was a single leaf and is gone.
    Eliminated,
    /// The subtree shrank to a single child one level shorter than its siblings.
    Remnant(Subtree<K, V>),
}

/// Outcome of pushing a short subtree into an adjacent sibling.
enum Absorbed<K, V> {
    /// The sibling had room and now has three children.
    Merged(Subtree<K, V>),
    /// The sibling was full and was split into two nodes of two children.
    Split(Subtree<K, V>, Subtree<K, V>),
}

impl<K, V> Clone for Subtree<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(entry) => Self::Leaf(entry.clone()),
            Self::Two(node) => Self::Two(node.clone()),
            Self::Three(node) => Self::Three(node.clone()),
        }
    }
}

impl<K, V> Subtree<K, V> {
    fn size(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Two(node) => node.size,
            Self::Three(node) => node.size,
        }
    }

    /// Leaves have depth 0.
    fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Two(node) => node.depth,
            Self::Three(node) => node.depth,
        }
    }

    fn max_key(&self) -> &K {
        match self {
            Self::Leaf(entry) => &entry.key,
            Self::Two(node) => &node.right_max,
            Self::Three(node) => &node.right_max,
        }
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Leaf(first), Self::Leaf(second)) => ReferenceCounter::ptr_eq(first, second),
            (Self::Two(first), Self::Two(second)) => ReferenceCounter::ptr_eq(first, second),
            (Self::Three(first), Self::Three(second)) => ReferenceCounter::ptr_eq(first, second),
            _ => false,
        }
    }

    fn check<C>(&self, comparator: &C) -> Result<(), InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        match self {
            Self::Leaf(_) => Ok(()),
            Self::Two(node) => {
                let children = [
                    (&node.left, &node.left_max),
                    (&node.right, &node.right_max),
                ];
                check_children(comparator, &children, node.size, node.depth)
            }
            Self::Three(node) => {
                let children = [
                    (&node.left, &node.left_max),
                    (&node.middle, &node.middle_max),
                    (&node.right, &node.right_max),
                ];
                check_children(comparator, &children, node.size, node.depth)
            }
        }
    }
}

fn check_children<K, V, C>(
    comparator: &C,
    children: &[(&Subtree<K, V>, &K)],
    cached_size: usize,
    cached_depth: usize,
) -> Result<(), InvariantViolation>
where
    C: Comparator<K> + ?Sized,
{
    let mut computed_size = 0;
    for (child, cached_max) in children {
        child.check(comparator)?;
        if comparator.compare(cached_max, child.max_key()) != Ordering::Equal {
            return Err(InvariantViolation::StaleMaxKey);
        }
        computed_size += child.size();
    }

    for pair in children.windows(2) {
        let (first, second) = (pair[0].0.depth(), pair[1].0.depth());
        if first != second {
            return Err(InvariantViolation::UnevenLeafDepth { first, second });
        }
    }

    let computed_depth = children.first().map_or(0, |(child, _)| child.depth() + 1);
    if cached_depth != computed_depth {
        return Err(InvariantViolation::DepthMismatch {
            cached: cached_depth,
            computed: computed_depth,
        });
    }
    if cached_size != computed_size {
        return Err(InvariantViolation::SizeMismatch {
            cached: cached_size,
            computed: computed_size,
        });
    }
    Ok(())
}

impl<K: Clone, V> Subtree<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self::Leaf(ReferenceCounter::new(LeafEntry { key, value }))
    }

    fn two(left: Self, right: Self) -> Self {
        Self::Two(ReferenceCounter::new(TwoNode {
            left_max: left.max_key().clone(),
            right_max: right.max_key().clone(),
            size: left.size() + right.size(),
            depth: left.depth() + 1,
            left,
            right,
        }))
    }

    fn three(left: Self, middle: Self, right: Self) -> Self {
        Self::Three(ReferenceCounter::new(ThreeNode {
            left_max: left.max_key().clone(),
            middle_max: middle.max_key().clone(),
            right_max: right.max_key().clone(),
            size: left.size() + middle.size() + right.size(),
            depth: left.depth() + 1,
            left,
            middle,
            right,
        }))
    }

    /// Places `orphan` before the children of `sibling`.
    fn absorb_before(orphan: Self, sibling: &Self) -> Absorbed<K, V> {
        match sibling {
            Self::Two(node) => {
                Absorbed::Merged(Self::three(orphan, node.left.clone(), node.right.clone()))
            }
            Self::Three(node) => Absorbed::Split(
                Self::two(orphan, node.left.clone()),
                Self::two(node.middle.clone(), node.right.clone()),
            ),
            Self::Leaf(_) => unreachable!("a remnant always has an internal sibling"),
        }
    }

    /// Places `orphan` after the children of `sibling`.
    fn absorb_after(sibling: &Self, orphan: Self) -> Absorbed<K, V> {
        match sibling {
            Self::Two(node) => {
                Absorbed::Merged(Self::three(node.left.clone(), node.right.clone(), orphan))
            }
            Self::Three(node) => Absorbed::Split(
                Self::two(node.left.clone(), node.middle.clone()),
                Self::two(node.right.clone(), orphan),
            ),
            Self::Leaf(_) => unreachable!("a remnant always has an internal sibling"),
        }
    }

    fn delete<C>(&self, comparator: &C, key: &K) -> DeleteResult<K, V>
    where
        C: Comparator<K> + ?Sized,
    {
        match self {
            Self::Leaf(entry) => {
                if comparator.compare(key, &entry.key) == Ordering::Equal {
                    DeleteResult::Eliminated
                } else {
                    DeleteResult::Unchanged
                }
            }
            Self::Two(node) => {
                if comparator.compare(key, &node.left_max) != Ordering::Greater {
                    match node.left.delete(comparator, key) {
                        DeleteResult::Unchanged => DeleteResult::Unchanged,
                        DeleteResult::InPlace(left) => {
                            DeleteResult::InPlace(Self::two(left, node.right.clone()))
                        }
                        DeleteResult::Eliminated => DeleteResult::Remnant(node.right.clone()),
                        DeleteResult::Remnant(orphan) => {
                            match Self::absorb_before(orphan, &node.right) {
                                Absorbed::Merged(merged) => DeleteResult::Remnant(merged),
                                Absorbed::Split(first, second) => {
                                    DeleteResult::InPlace(Self::two(first, second))
                                }
                            }
                        }
                    }
                } else {
                    match node.right.delete(comparator, key) {
                        DeleteResult::Unchanged => DeleteResult::Unchanged,
                        DeleteResult::InPlace(right) => {
                            DeleteResult::InPlace(Self::two(node.left.clone(), right))
                        }
                        DeleteResult::Eliminated => DeleteResult::Remnant(node.left.clone()),
                        DeleteResult::Remnant(orphan) => {
                            match Self::absorb_after(&node.left, orphan) {
                                Absorbed::Merged(merged) => DeleteResult::Remnant(merged),
                                Absorbed::Split(first, second) => {
                                    DeleteResult::InPlace(Self::two(first, second))
                                }
                            }
                        }
                    }
                }
            }
            Self::Three(node) => {
                let (left, middle, right) = (&node.left, &node.middle, &node.right);
                if comparator.compare(key, &node.left_max) != Ordering::Greater {
                    match left.delete(comparator, key) {
                        DeleteResult::Unchanged => DeleteResult::Unchanged,
                        DeleteResult::InPlace(changed) => DeleteResult::InPlace(Self::three(
                            changed,
                            middle.clone(),
                            right.clone(),
                        )),
                        DeleteResult::Eliminated => {
                            DeleteResult::InPlace(Self::two(middle.clone(), right.clone()))
                        }
                        DeleteResult::Remnant(orphan) => match Self::absorb_before(orphan, middle) {
                            Absorbed::Merged(merged) => {
                                DeleteResult::InPlace(Self::two(merged, right.clone()))
                            }
                            Absorbed::Split(first, second) => {
                                DeleteResult::InPlace(Self::three(first, second, right.clone()))
                            }
                        },
                    }
                } else if comparator.compare(key, &node.middle_max) != Ordering::Greater {
                    match middle.delete(comparator, key) {
                        DeleteResult::Unchanged => DeleteResult::Unchanged,
                        DeleteResult::InPlace(changed) => DeleteResult::InPlace(Self::three(
                            left.clone(),
                            changed,
                            right.clone(),
                        )),
                        DeleteResult::Eliminated => {
                            DeleteResult::InPlace(Self::two(left.clone(), right.clone()))
                        }
                        DeleteResult::Remnant(orphan) => match Self::absorb_after(left, orphan) {
                            Absorbed::Merged(merged) => {
                                DeleteResult::InPlace(Self::two(merged, right.clone()))
                            }
                            Absorbed::Split(first, second) => {
                                DeleteResult::InPlace(Self::three(first, second, right.clone()))
                            }
                        },
                    }
                } else {
                    match right.delete(comparator, key) {
                        DeleteResult::Unchanged => DeleteResult::Unchanged,
                        DeleteResult::InPlace(changed) => DeleteResult::InPlace(Self::three(
                            left.clone(),
                            middle.clone(),
                            changed,
                        )),
                        DeleteResult::Eliminated => {
                            DeleteResult::InPlace(Self::two(left.clone(), middle.clone()))
                        }
                        DeleteResult::Remnant(orphan) => match Self::absorb_after(middle, orphan) {
                            Absorbed::Merged(merged) => {
                                DeleteResult::InPlace(Self::two(left.clone(), merged))
                            }
                            Absorbed::Split(first, second) => {
                                DeleteResult::InPlace(Self::three(left.clone(), first, second))
                            }
                        },
                    }
                }
            }
        }
    }
}

impl<K: Clone, V> Subtree<K, V> {
    fn update<C, F, S>(
        &self,
        comparator: &C,
        key: K,
        generator: F,
        unchanged: S,
    ) -> UpdateResult<K, V>
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
        S: FnOnce(&V, &V) -> bool,
    {
        match self {
            Self::Leaf(entry) => match comparator.compare(&key, &entry.key) {
                Ordering::Equal => {
                    let value = generator(Some(&entry.value));
                    if unchanged(&value, &entry.value) {
                        UpdateResult::Unchanged
                    } else {
                        UpdateResult::InPlace(Self::leaf(entry.key.clone(), value))
                    }
                }
                Ordering::Less => {
                    UpdateResult::Split(Self::leaf(key, generator(None)), self.clone())
                }
                Ordering::Greater => {
                    UpdateResult::Split(self.clone(), Self::leaf(key, generator(None)))
                }
            },
            Self::Two(node) => {
                if comparator.compare(&key, &node.left_max) != Ordering::Greater {
                    match node.left.update(comparator, key, generator, unchanged) {
                        UpdateResult::Unchanged => UpdateResult::Unchanged,
                        UpdateResult::InPlace(left) => {
                            UpdateResult::InPlace(Self::two(left, node.right.clone()))
                        }
                        UpdateResult::Split(first, second) => {
                            UpdateResult::InPlace(Self::three(first, second, node.right.clone()))
                        }
                    }
                } else {
                    match node.right.update(comparator, key, generator, unchanged) {
                        UpdateResult::Unchanged => UpdateResult::Unchanged,
                        UpdateResult::InPlace(right) => {
                            UpdateResult::InPlace(Self::two(node.left.clone(), right))
                        }
                        UpdateResult::Split(first, second) => {
                            UpdateResult::InPlace(Self::three(node.left.clone(), first, second))
                        }
                    }
                }
            }
            Self::Three(node) => {
                let (left, middle, right) = (&node.left, &node.middle, &node.right);
                if comparator.compare(&key, &node.left_max) != Ordering::Greater {
                    match left.update(comparator, key, generator, unchanged) {
                        UpdateResult::Unchanged => UpdateResult::Unchanged,
                        UpdateResult::InPlace(changed) => UpdateResult::InPlace(Self::three(
                            changed,
                            middle.clone(),
                            right.clone(),
                        )),
                        UpdateResult::Split(first, second) => UpdateResult::Split(
                            Self::two(first, second),
                            Self::two(middle.clone(), right.clone()),
                        ),
                    }
                } else if comparator.compare(&key, &node.middle_max) != Ordering::Greater {
                    match middle.update(comparator, key, generator, unchanged) {
                        UpdateResult::Unchanged => UpdateResult::Unchanged,
                        UpdateResult::InPlace(changed) => UpdateResult::InPlace(Self::three(
                            left.clone(),
                            changed,
                            right.clone(),
                        )),
                        UpdateResult::Split(first, second) => UpdateResult::Split(
                            Self::two(left.clone(), first),
                            Self::two(second, right.clone()),
                        ),
                    }
                } else {
                    match right.update(comparator, key, generator, unchanged) {
                        UpdateResult::Unchanged => UpdateResult::Unchanged,
                        UpdateResult::InPlace(changed) => UpdateResult::InPlace(Self::three(
                            left.clone(),
                            middle.clone(),
                            changed,
                        )),
                        UpdateResult::Split(first, second) => UpdateResult::Split(
                            Self::two(left.clone(), middle.clone()),
                            Self::two(first, second),
                        ),
                    }
                }
            }
        }
    }
}

// =============================================================================
// TwoThreeNode
// =============================================================================

/// A persistent (immutable) 2-3 tree holding key/value entries.
///
/// As with [`TreeNode`](super::TreeNode), `assign`/`update` need
/// `V: PartialEq` to detect unchanged values, while `replace`/`replace_with`
/// accept any value type.
///
/// # Time Complexity
///
/// | Operation         | Complexity |
/// |-------------------|------------|
/// | `find`            | O(log N)   |
/// | `assign`/`update` | O(log N)   |
/// | `delete`          | O(log N)   |
/// | `size`/`depth`    | O(1)       |
pub struct TwoThreeNode<K, V> {
    root: Option<Subtree<K, V>>,
}

impl<K, V> TwoThreeNode<K, V> {
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
        self.root.as_ref().map_or(0, Subtree::size)
    }

    /// Returns the number of internal levels above the leaves.
    ///
    /// Empty and single-entry trees have depth 0.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Subtree::depth)
    }

    /// Returns the value stored under `key`.
    pub fn find<C>(&self, comparator: &C, key: &K) -> Option<&V>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self.root.as_ref()?;
        loop {
            current = match current {
                Subtree::Leaf(entry) => {
                    return (comparator.compare(key, &entry.key) == Ordering::Equal)
                        .then_some(&entry.value);
                }
                Subtree::Two(node) => {
                    if comparator.compare(key, &node.left_max) == Ordering::Greater {
                        &node.right
                    } else {
                        &node.left
                    }
                }
                Subtree::Three(node) => {
                    if comparator.compare(key, &node.left_max) != Ordering::Greater {
                        &node.left
                    } else if comparator.compare(key, &node.middle_max) != Ordering::Greater {
                        &node.middle
                    } else {
                        &node.right
                    }
                }
            };
        }
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
        self.find(comparator, key).is_some()
    }

    /// Returns an in-order iterator over all entries.
    #[must_use]
    pub fn iter(&self) -> TwoThreeIterator<'_, K, V> {
        TwoThreeIterator::new(self, 0, self.size())
    }

    /// Returns an in-order iterator over the entries at positions `offset..limit`.
    ///
    /// Both bounds are clamped to the size of the tree.
    #[must_use]
    pub fn iter_range(&self, offset: usize, limit: usize) -> TwoThreeIterator<'_, K, V> {
        TwoThreeIterator::new(self, offset, limit)
    }

    /// Returns `true` if both handles refer to the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(first), Some(second)) => first.ptr_eq(second),
            _ => false,
        }
    }

    /// Verifies equal leaf depth, cached maximum keys, sizes and key order.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants<C>(&self, comparator: &C) -> Result<(), InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        let structure = self
            .root
            .as_ref()
            .map_or(Ok(()), |root| root.check(comparator));
        let result = structure.and_then(|()| {
            let mut previous: Option<&K> = None;
            for (position, (key, _)) in self.iter().enumerate() {
                if let Some(previous_key) = previous
                    && comparator.compare(previous_key, key) != Ordering::Less
                {
                    return Err(InvariantViolation::OutOfOrder { position });
                }
                previous = Some(key);
            }
            Ok(())
        });
        if let Err(violation) = &result {
            tracing::debug!(%violation, size = self.size(), "2-3 node invariant check failed");
        }
        result
    }
}

impl<K: Clone, V> TwoThreeNode<K, V> {
    /// Returns a tree without the entry matching `key`.
    ///
    /// Deleting an absent key returns the same root.
    #[must_use]
    pub fn delete<C>(&self, comparator: &C, key: &K) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        let Some(root) = &self.root else {
            return Self::empty();
        };
        match root.delete(comparator, key) {
            DeleteResult::Unchanged => self.clone(),
            DeleteResult::InPlace(subtree) | DeleteResult::Remnant(subtree) => Self {
                root: Some(subtree),
            },
            DeleteResult::Eliminated => Self::empty(),
        }
    }

    /// Returns a tree with `value` stored under `key`, without comparing values.
    ///
    /// A present key always yields a new root. Use [`assign`](Self::assign)
    /// when `V: PartialEq` and unchanged values should keep the same root.
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
        self.update_by(comparator, key, generator, |_, _| false)
    }

    fn update_by<C, F, S>(&self, comparator: &C, key: K, generator: F, unchanged: S) -> Self
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
        S: FnOnce(&V, &V) -> bool,
    {
        let Some(root) = &self.root else {
            return Self {
                root: Some(Subtree::leaf(key, generator(None))),
            };
        };
        match root.update(comparator, key, generator, unchanged) {
            UpdateResult::Unchanged => self.clone(),
            UpdateResult::InPlace(subtree) => Self {
                root: Some(subtree),
            },
            UpdateResult::Split(first, second) => Self {
                root: Some(Subtree::two(first, second)),
            },
        }
    }
}

impl<K: Clone, V: PartialEq> TwoThreeNode<K, V> {
    /// Returns a tree with `value` stored under `key`.
    ///
    /// Assigning a value equal to the stored one returns the same root.
    #[must_use]
    pub fn assign<C>(&self, comparator: &C, key: K, value: V) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.update(comparator, key, move |_| value)
    }

    /// Returns a tree where the entry for `key` holds `generator(current)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NaturalOrder, TwoThreeNode};
    ///
    /// let tree = TwoThreeNode::empty()
    ///     .update(&NaturalOrder, 'a', |current: Option<&u8>| current.map_or(0, |n| n + 1))
    ///     .update(&NaturalOrder, 'a', |current| current.map_or(0, |n| n + 1));
    /// assert_eq!(tree.find(&NaturalOrder, &'a'), Some(&1));
    /// ```
    #[must_use]
    pub fn update<C, F>(&self, comparator: &C, key: K, generator: F) -> Self
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce(Option<&V>) -> V,
    {
        self.update_by(comparator, key, generator, |value, stored| value == stored)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An in-order iterator over a range of entries of a [`TwoThreeNode`].
pub struct TwoThreeIterator<'a, K, V> {
    /// Subtrees still to visit, leftmost on top
    pending: SmallVec<[&'a Subtree<K, V>; STACK_CAPACITY]>,
    remaining: usize,
}

impl<'a, K, V> TwoThreeIterator<'a, K, V> {
    fn new(tree: &'a TwoThreeNode<K, V>, offset: usize, limit: usize) -> Self {
        let limit = limit.min(tree.size());
        let offset = offset.min(limit);
        let mut pending = SmallVec::new();

        if let Some(root) = tree.root.as_ref()
            && offset < limit
        {
            let mut current = root;
            let mut skip = offset;
            loop {
                let children: SmallVec<[&'a Subtree<K, V>; 3]> = match current {
                    Subtree::Leaf(_) => {
                        pending.push(current);
                        break;
                    }
                    Subtree::Two(node) => [&node.left, &node.right].into_iter().collect(),
                    Subtree::Three(node) => {
                        [&node.left, &node.middle, &node.right].into_iter().collect()
                    }
                };
                let mut chosen = children.len() - 1;
                for (index, child) in children.iter().enumerate() {
                    if skip < child.size() {
                        chosen = index;
                        break;
                    }
                    skip -= child.size();
                }
                pending.extend(children[chosen + 1..].iter().rev().copied());
                current = children[chosen];
            }
        }

        Self {
            pending,
            remaining: limit - offset,
        }
    }
}

impl<'a, K, V> Iterator for TwoThreeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            match self.pending.pop()? {
                Subtree::Leaf(entry) => {
                    self.remaining -= 1;
                    return Some((&entry.key, &entry.value));
                }
                Subtree::Two(node) => {
                    self.pending.push(&node.right);
                    self.pending.push(&node.left);
                }
                Subtree::Three(node) => {
                    self.pending.push(&node.right);
                    self.pending.push(&node.middle);
                    self.pending.push(&node.left);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for TwoThreeIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> std::iter::FusedIterator for TwoThreeIterator<'_, K, V> {}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V> Clone for TwoThreeNode<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for TwoThreeNode<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, K, V> IntoIterator for &'a TwoThreeNode<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = TwoThreeIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TwoThreeNode<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}
