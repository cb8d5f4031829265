//! Append-only staging structure for building list trees.
//!
//! [`TreeBuilder`] collects elements into a leaf-sized buffer. Each full
//! leaf is pushed into a chain of slots that behaves like a binary counter:
//! slot `k` is either empty or holds a perfect tree of `2^k` full leaves.
//! Pushing a leaf into an occupied slot joins the two and carries the result
//! into the next slot.
//!
//! # Examples
//!
//! ```rust
//! use arboreal::persistent::TreeBuilder;
//!
//! let mut builder = TreeBuilder::new();
//! for value in 0..1000 {
//!     builder.add(value);
//! }
//! let node = builder.build();
//! assert_eq!(node.size(), 1000);
//! assert!(node.check_invariants().is_ok());
//!
//! // The builder is still usable after `build`.
//! builder.add(1000);
//! assert_eq!(builder.build().last(), Some(&1000));
//! ```

use arrayvec::ArrayVec;

use super::error::{InvariantViolation, NodeError};
use super::list_node::{ListNode, MAX_LEAF_SIZE};

/// Incremental builder producing balanced [`ListNode`] trees.
///
/// The builder is mutable staging state and is not meant to be shared
/// between threads while it is being filled. The trees it returns are
/// ordinary immutable nodes.
pub struct TreeBuilder<T> {
    /// Tree holding elements that precede every slot (set by `rebuild`)
    prefix: ListNode<T>,
    /// Slot `k` holds a perfect tree of `2^k` full leaves
    slots: Vec<Option<ListNode<T>>>,
    /// Elements not yet forming a full leaf
    buffer: ArrayVec<T, MAX_LEAF_SIZE>,
    size: usize,
}

impl<T> TreeBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prefix: ListNode::empty(),
            slots: Vec::new(),
            buffer: ArrayVec::new_const(),
            size: 0,
        }
    }

    /// Returns the number of elements added so far.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if no element has been added.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Verifies the slot chain and the staging buffer.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let result = self.check_state();
        if let Err(violation) = &result {
            tracing::debug!(%violation, size = self.size, "tree builder invariant check failed");
        }
        result
    }

    fn check_state(&self) -> Result<(), InvariantViolation> {
        if self.buffer.len() >= MAX_LEAF_SIZE {
            return Err(InvariantViolation::BufferOverflow {
                length: self.buffer.len(),
            });
        }
        self.prefix.check_invariants()?;

        let mut computed = self.prefix.size() + self.buffer.len();
        for (level, slot) in self.slots.iter().enumerate() {
            let Some(tree) = slot else { continue };
            let expected_size = MAX_LEAF_SIZE << level;
            if tree.size() != expected_size || tree.depth() != level {
                return Err(InvariantViolation::SlotShape {
                    level,
                    size: tree.size(),
                    depth: tree.depth(),
                    expected_size,
                });
            }
            tree.check_invariants()?;
            computed += tree.size();
        }

        if computed == self.size {
            Ok(())
        } else {
            Err(InvariantViolation::SizeMismatch {
                cached: self.size,
                computed,
            })
        }
    }
}

impl<T: Clone> TreeBuilder<T> {
    /// Adds one element after all previously added elements.
    ///
    /// # Complexity
    ///
    /// O(1) amortized
    pub fn add(&mut self, value: T) -> &mut Self {
        self.buffer.push(value);
        self.size += 1;
        if self.buffer.is_full() {
            self.flush();
        }
        self
    }

    /// Adds every element of `values` in order.
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, values: I) -> &mut Self {
        for value in values {
            self.add(value);
        }
        self
    }

    /// Adds every element of `values` in order, one leaf-sized chunk at a time.
    pub fn add_slice(&mut self, values: &[T]) -> &mut Self {
        let mut rest = values;
        while !rest.is_empty() {
            let room = self.buffer.remaining_capacity().min(rest.len());
            let (chunk, tail) = rest.split_at(room);
            self.buffer.extend(chunk.iter().cloned());
            self.size += chunk.len();
            if self.buffer.is_full() {
                self.flush();
            }
            rest = tail;
        }
        self
    }

    /// Adds the elements of `values` at positions `offset..limit`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidRange`] unless `offset <= limit <= values.len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arboreal::persistent::{NodeError, TreeBuilder};
    ///
    /// let source = [1, 2, 3, 4, 5];
    /// let mut builder = TreeBuilder::new();
    /// builder.add_range(&source, 1, 4).unwrap();
    /// assert!(builder.build().iter().copied().eq([2, 3, 4]));
    /// assert_eq!(
    ///     builder.add_range(&source, 4, 9).map(|_| ()),
    ///     Err(NodeError::InvalidRange { offset: 4, limit: 9, length: 5 })
    /// );
    /// ```
    pub fn add_range(
        &mut self,
        values: &[T],
        offset: usize,
        limit: usize,
    ) -> Result<&mut Self, NodeError> {
        match values.get(offset..limit) {
            Some(range) => Ok(self.add_slice(range)),
            None => Err(NodeError::InvalidRange {
                offset,
                limit,
                length: values.len(),
            }),
        }
    }

    /// Returns a balanced tree holding every added element.
    ///
    /// The builder is left untouched, so more elements may be added and
    /// `build` called again.
    ///
    /// # Complexity
    ///
    /// O(log N) joins plus one copy of the partial leaf
    #[must_use]
    pub fn build(&self) -> ListNode<T> {
        let mut tree = ListNode::from_leaf_vec(self.buffer.to_vec());
        for slot in self.slots.iter().flatten() {
            tree = ListNode::concat(slot.clone(), tree);
        }
        let tree = ListNode::concat(self.prefix.clone(), tree);
        tracing::trace!(
            size = self.size,
            slots = self.slots.len(),
            depth = tree.depth(),
            "built list tree"
        );
        tree
    }

    /// Merges two builders, keeping the elements of `self` first.
    ///
    /// Both builders are finalized and the resulting trees are concatenated.
    #[must_use]
    pub fn combine_with(self, other: Self) -> Self {
        let combined = self.build().append_node(&other.build());
        tracing::trace!(
            left = self.size,
            right = other.size,
            "combining tree builders"
        );
        let mut builder = self;
        builder.rebuild(&combined);
        builder
    }

    /// Resets the builder so it represents `node`.
    ///
    /// The rightmost leaf of `node`, if partial, is moved back into the
    /// staging buffer so later additions keep filling it.
    pub fn rebuild(&mut self, node: &ListNode<T>) {
        self.slots.clear();
        self.buffer.clear();
        self.size = node.size();

        let last_leaf = node.last_leaf();
        if last_leaf.len() < MAX_LEAF_SIZE {
            self.buffer.extend(last_leaf.iter().cloned());
            self.prefix = node.prefix_unchecked(node.size() - last_leaf.len());
        } else {
            self.prefix = node.clone();
        }
        tracing::trace!(
            size = self.size,
            buffered = self.buffer.len(),
            "rebuilt tree builder from node"
        );
    }

    /// Moves the full buffer into the slot chain.
    fn flush(&mut self) {
        let leaf = ListNode::from_leaf_vec(self.buffer.drain(..).collect());
        let mut carried = leaf;
        for slot in &mut self.slots {
            match slot.take() {
                None => {
                    *slot = Some(carried);
                    return;
                }
                Some(existing) => carried = ListNode::branch_unchecked(existing, carried),
            }
        }
        self.slots.push(Some(carried));
    }
}

impl<T> Default for TreeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Extend<T> for TreeBuilder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_empty_builder_builds_empty_node() {
        let builder: TreeBuilder<i32> = TreeBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
        assert!(builder.check_invariants().is_ok());
    }

    #[rstest]
    fn test_slots_follow_binary_counter() {
        let mut builder = TreeBuilder::new();
        builder.add_all(0..(MAX_LEAF_SIZE * 5) as i32);

        // 5 leaves = 0b101: slots 0 and 2 occupied.
        assert_eq!(builder.slots.len(), 3);
        assert!(builder.slots[0].is_some());
        assert!(builder.slots[1].is_none());
        assert!(builder.slots[2].is_some());
        assert!(builder.buffer.is_empty());
        assert!(builder.check_invariants().is_ok());
    }

    #[rstest]
    fn test_invariants_hold_after_every_add() {
        let mut builder = TreeBuilder::new();
        for value in 0..3000 {
            builder.add(value);
            assert!(builder.check_invariants().is_ok());
        }
        assert_eq!(builder.size(), 3000);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(127)]
    #[case(128)]
    #[case(129)]
    #[case(1000)]
    #[case(4096)]
    fn test_slice_and_single_adds_build_same_shape(#[case] count: i32) {
        let source: Vec<i32> = (0..count).collect();

        let mut single = TreeBuilder::new();
        for value in &source {
            single.add(*value);
        }
        let mut chunked = TreeBuilder::new();
        chunked.add_slice(&source[..source.len() / 3]);
        chunked.add_slice(&source[source.len() / 3..]);

        let first = single.build();
        let second = chunked.build();
        assert_eq!(first, second);
        assert_eq!(first.depth(), second.depth());
        assert!(first.check_invariants().is_ok());
        assert!(first.iter().copied().eq(source.iter().copied()));
    }

    #[rstest]
    fn test_add_range_rejects_invalid_ranges() {
        let source = [1, 2, 3];
        let mut builder = TreeBuilder::new();
        assert!(builder.add_range(&source, 2, 1).is_err());
        assert!(builder.add_range(&source, 0, 4).is_err());
        assert!(builder.is_empty());
        assert!(builder.add_range(&source, 0, 3).is_ok());
        assert_eq!(builder.size(), 3);
    }

    #[rstest]
    fn test_rebuild_moves_partial_leaf_into_buffer() {
        let node: ListNode<i32> = (0..300).collect();
        let mut builder = TreeBuilder::new();
        builder.rebuild(&node);

        assert_eq!(builder.size(), 300);
        assert_eq!(builder.buffer.len(), node.last_leaf().len());
        assert!(builder.check_invariants().is_ok());

        builder.add_all(300..600);
        let extended = builder.build();
        assert!(extended.check_invariants().is_ok());
        assert!(extended.iter().copied().eq(0..600));
    }

    #[rstest]
    fn test_rebuild_from_full_last_leaf_keeps_node_as_prefix() {
        let node: ListNode<i32> = (0..MAX_LEAF_SIZE as i32 * 2).collect();
        let mut builder = TreeBuilder::new();
        builder.rebuild(&node);
        assert!(builder.buffer.is_empty());
        assert!(builder.build().ptr_eq(&node));
    }

    #[rstest]
    fn test_combine_with_keeps_order() {
        let mut first = TreeBuilder::new();
        first.add_all(0..500);
        let mut second = TreeBuilder::new();
        second.add_all(500..777);

        let mut combined = first.combine_with(second);
        assert_eq!(combined.size(), 777);
        combined.add(777);
        let node = combined.build();
        assert!(node.check_invariants().is_ok());
        assert!(node.iter().copied().eq(0..778));
    }

    #[rstest]
    fn test_extend_trait() {
        let mut builder = TreeBuilder::default();
        builder.extend(vec!["a", "b"]);
        builder.extend(["c"]);
        assert_eq!(format!("{}", builder.build()), "[a, b, c]");
    }
}
