//! Property-based tests for TreeNode and TwoThreeNode.
//!
//! Both search tree engines are driven by the same operation sequences and
//! compared against a `BTreeMap` model.

use arboreal::persistent::{NaturalOrder, ReverseOrder, TreeNode, TwoThreeNode};
use proptest::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

#[derive(Debug, Clone)]
enum Operation {
    Assign(i16, i32),
    Increment(i16),
    Delete(i16),
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        5 => (any::<i16>(), any::<i32>()).prop_map(|(key, value)| Operation::Assign(key, value)),
        2 => any::<i16>().prop_map(Operation::Increment),
        3 => any::<i16>().prop_map(Operation::Delete),
    ]
}

/// Keys drawn from a narrow range so deletes and updates hit existing entries.
fn narrow_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (0i16..64, any::<i32>()).prop_map(|(key, value)| Operation::Assign(key, value)),
        (0i16..64).prop_map(Operation::Increment),
        (0i16..64).prop_map(Operation::Delete),
    ]
}

fn increment(current: Option<&i32>) -> i32 {
    current.map_or(0, |value| value.wrapping_add(1))
}

// =============================================================================
// Model Laws
// =============================================================================

fn run_model(operations: &[Operation]) -> Result<(), TestCaseError> {
    let mut model = BTreeMap::new();
    let mut avl = TreeNode::empty();
    let mut two_three = TwoThreeNode::empty();

    for operation in operations {
        match *operation {
            Operation::Assign(key, value) => {
                model.insert(key, value);
                avl = avl.assign(&NaturalOrder, key, value);
                two_three = two_three.assign(&NaturalOrder, key, value);
            }
            Operation::Increment(key) => {
                let next = increment(model.get(&key));
                model.insert(key, next);
                avl = avl.update(&NaturalOrder, key, increment);
                two_three = two_three.update(&NaturalOrder, key, increment);
            }
            Operation::Delete(key) => {
                model.remove(&key);
                avl = avl.delete(&NaturalOrder, &key);
                two_three = two_three.delete(&NaturalOrder, &key);
            }
        }
        prop_assert!(avl.check_invariants(&NaturalOrder).is_ok());
        prop_assert!(two_three.check_invariants(&NaturalOrder).is_ok());
        prop_assert_eq!(avl.size(), model.len());
        prop_assert_eq!(two_three.size(), model.len());
    }

    let expected: Vec<(i16, i32)> = model.iter().map(|(key, value)| (*key, *value)).collect();
    let from_avl: Vec<(i16, i32)> = avl.iter().map(|(key, value)| (*key, *value)).collect();
    let from_two_three: Vec<(i16, i32)> =
        two_three.iter().map(|(key, value)| (*key, *value)).collect();
    prop_assert_eq!(&from_avl, &expected);
    prop_assert_eq!(&from_two_three, &expected);
    Ok(())
}

proptest! {
    /// Law: both engines match the BTreeMap model after any operation sequence.
    #[test]
    fn prop_operations_match_btreemap(operations in prop::collection::vec(operation(), 0..200)) {
        run_model(&operations)?;
    }

    /// Law: the model agrees when operations collide on a small key space.
    #[test]
    fn prop_dense_operations_match_btreemap(
        operations in prop::collection::vec(narrow_operation(), 0..300)
    ) {
        run_model(&operations)?;
    }
}

// =============================================================================
// Lookup Laws
// =============================================================================

proptest! {
    /// Law: find after assign returns the assigned value.
    #[test]
    fn prop_find_assign_law(
        entries in prop::collection::vec((any::<i16>(), any::<i32>()), 0..50),
        key: i16,
        value: i32
    ) {
        let avl = TreeNode::from_entries(&NaturalOrder, entries.iter().copied())
            .assign(&NaturalOrder, key, value);
        prop_assert_eq!(avl.find(&NaturalOrder, &key), Some(&value));

        let two_three = entries
            .into_iter()
            .fold(TwoThreeNode::empty(), |tree, (k, v)| tree.assign(&NaturalOrder, k, v))
            .assign(&NaturalOrder, key, value);
        prop_assert_eq!(two_three.find(&NaturalOrder, &key), Some(&value));
    }

    /// Law: assign does not affect other keys.
    #[test]
    fn prop_assign_other_key_law(
        entries in prop::collection::vec((any::<i16>(), any::<i32>()), 0..50),
        first: i16,
        second: i16,
        value: i32
    ) {
        prop_assume!(first != second);
        let tree = TreeNode::from_entries(&NaturalOrder, entries);
        let updated = tree.assign(&NaturalOrder, first, value);
        prop_assert_eq!(updated.find(&NaturalOrder, &second), tree.find(&NaturalOrder, &second));
    }

    /// Law: find after delete returns None, and the receiver keeps its entry.
    #[test]
    fn prop_delete_law(
        entries in prop::collection::vec((any::<i16>(), any::<i32>()), 1..50),
        pick in any::<prop::sample::Index>()
    ) {
        let key = entries[pick.index(entries.len())].0;
        let tree = TreeNode::from_entries(&NaturalOrder, entries);
        let removed = tree.delete(&NaturalOrder, &key);
        prop_assert_eq!(removed.find(&NaturalOrder, &key), None);
        prop_assert!(tree.contains_key(&NaturalOrder, &key));
        prop_assert_eq!(removed.size() + 1, tree.size());
    }
}

// =============================================================================
// Structural Laws
// =============================================================================

proptest! {
    /// Law: sorted bulk construction equals incremental construction element-wise.
    #[test]
    fn prop_sorted_build_matches_incremental(
        keys in prop::collection::btree_set(any::<i32>(), 0..500)
    ) {
        let entries: Vec<(i32, i32)> = keys.iter().map(|key| (*key, key.wrapping_mul(3))).collect();
        let bulk = TreeNode::from_sorted_entries(&NaturalOrder, entries.iter().copied()).unwrap();
        let incremental = TreeNode::from_entries(&NaturalOrder, entries.iter().copied());
        prop_assert!(bulk.check_invariants(&NaturalOrder).is_ok());
        prop_assert_eq!(bulk, incremental);
    }

    /// Law: entry_at agrees with in-order traversal.
    #[test]
    fn prop_entry_at_matches_iteration(keys in prop::collection::btree_set(any::<i32>(), 0..300)) {
        let tree = TreeNode::from_entries(&NaturalOrder, keys.iter().map(|key| (*key, ())));
        for (index, (key, _)) in tree.iter().enumerate() {
            prop_assert_eq!(tree.entry_at(index).map(|(found, _)| found), Some(key));
        }
    }

    /// Law: a reversed comparator yields the reversed key sequence.
    #[test]
    fn prop_reverse_order_reverses_keys(keys in prop::collection::vec(any::<i32>(), 0..200)) {
        let natural = TreeNode::from_entries(&NaturalOrder, keys.iter().map(|key| (*key, ())));
        let reversed = TreeNode::from_entries(&ReverseOrder, keys.iter().map(|key| (*key, ())));
        let mut expected: Vec<i32> = natural.keys().copied().collect();
        expected.reverse();
        prop_assert_eq!(reversed.keys().copied().collect::<Vec<_>>(), expected);
        prop_assert!(reversed.check_invariants(&ReverseOrder).is_ok());
    }

    /// Law: iter_range on both engines yields the clamped window of the full traversal.
    #[test]
    fn prop_iter_range_windows(
        keys in prop::collection::btree_set(any::<i32>(), 0..300),
        offset in 0usize..400,
        limit in 0usize..400
    ) {
        let avl = TreeNode::from_entries(&NaturalOrder, keys.iter().map(|key| (*key, ())));
        let two_three = keys
            .iter()
            .fold(TwoThreeNode::empty(), |tree, key| tree.assign(&NaturalOrder, *key, ()));
        let all: Vec<i32> = keys.iter().copied().collect();
        let clamped_limit = limit.min(all.len());
        let clamped_offset = offset.min(clamped_limit);
        let expected = &all[clamped_offset..clamped_limit];

        let avl_window: Vec<i32> = avl.iter_range(offset, limit).map(|(key, _)| *key).collect();
        let two_three_window: Vec<i32> =
            two_three.iter_range(offset, limit).map(|(key, _)| *key).collect();
        prop_assert_eq!(avl_window.as_slice(), expected);
        prop_assert_eq!(two_three_window.as_slice(), expected);
    }
}
