//! Integration tests for the search tree engines.

use arboreal::persistent::{Comparator, NaturalOrder, NodeError, TreeNode, TwoThreeNode};
use rstest::rstest;
use std::cmp::Ordering;

// =============================================================================
// Scenario Tests
// =============================================================================

#[rstest]
fn test_insert_sequence_stays_balanced() {
    let mut tree = TreeNode::empty();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        tree = tree.assign(&NaturalOrder, key, ());
        assert!(tree.check_invariants(&NaturalOrder).is_ok());
    }
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, vec![1, 3, 4, 5, 7, 8, 9]);

    let without_five = tree.delete(&NaturalOrder, &5);
    let keys: Vec<i32> = without_five.keys().copied().collect();
    assert_eq!(keys, vec![1, 3, 4, 7, 8, 9]);
    assert!(without_five.check_invariants(&NaturalOrder).is_ok());
}

#[rstest]
fn test_engines_agree_on_scenario() {
    let keys = [5, 3, 8, 1, 4, 7, 9];
    let avl = keys
        .iter()
        .fold(TreeNode::empty(), |tree, key| tree.assign(&NaturalOrder, *key, key * 2));
    let two_three = keys
        .iter()
        .fold(TwoThreeNode::empty(), |tree, key| tree.assign(&NaturalOrder, *key, key * 2));

    assert!(avl.iter().eq(two_three.iter()));
    assert!(
        avl.delete(&NaturalOrder, &5)
            .iter()
            .eq(two_three.delete(&NaturalOrder, &5).iter())
    );
}

// =============================================================================
// Comparator Tests
// =============================================================================

struct CaseInsensitive;

impl Comparator<String> for CaseInsensitive {
    fn compare(&self, left: &String, right: &String) -> Ordering {
        left.to_lowercase().cmp(&right.to_lowercase())
    }
}

#[rstest]
fn test_custom_comparator_keeps_first_key() {
    let tree = TreeNode::empty()
        .assign(&CaseInsensitive, "Apple".to_string(), 1)
        .assign(&CaseInsensitive, "APPLE".to_string(), 2);

    assert_eq!(tree.size(), 1);
    assert_eq!(
        tree.find_entry(&CaseInsensitive, &"apple".to_string()),
        Some((&"Apple".to_string(), &2))
    );
}

#[rstest]
fn test_dyn_comparator() {
    let comparator: &dyn Comparator<i32> = &NaturalOrder;
    let tree = TreeNode::empty()
        .assign(comparator, 2, 'b')
        .assign(comparator, 1, 'a');
    assert_eq!(tree.first_entry(), Some((&1, &'a')));
    assert!(tree.check_invariants(comparator).is_ok());
}

#[rstest]
fn test_closure_comparator_with_two_three_node() {
    let descending = |left: &u32, right: &u32| right.cmp(left);
    let tree = (0..50u32).fold(TwoThreeNode::empty(), |tree, key| {
        tree.assign(&descending, key, ())
    });
    let keys: Vec<u32> = tree.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, (0..50).rev().collect::<Vec<_>>());
    assert!(tree.check_invariants(&descending).is_ok());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[rstest]
fn test_versions_coexist() {
    let base = TreeNode::from_entries(&NaturalOrder, (0..100).map(|key| (key, key)));
    let versions: Vec<TreeNode<i32, i32>> = (0..10)
        .map(|round| base.assign(&NaturalOrder, round, -round))
        .collect();

    for (round, version) in versions.iter().enumerate() {
        let round = i32::try_from(round).unwrap();
        assert_eq!(version.find(&NaturalOrder, &round), Some(&-round));
        assert_eq!(base.find(&NaturalOrder, &round), Some(&round));
    }
}

#[rstest]
fn test_no_op_operations_share_root() {
    let avl = TreeNode::from_entries(&NaturalOrder, [(1, "a"), (2, "b")]);
    assert!(avl.assign(&NaturalOrder, 2, "b").ptr_eq(&avl));
    assert!(avl.delete(&NaturalOrder, &3).ptr_eq(&avl));

    let two_three = TwoThreeNode::empty()
        .assign(&NaturalOrder, 1, "a")
        .assign(&NaturalOrder, 2, "b");
    assert!(two_three.assign(&NaturalOrder, 1, "a").ptr_eq(&two_three));
    assert!(two_three.delete(&NaturalOrder, &3).ptr_eq(&two_three));
}

// =============================================================================
// Bulk Construction Tests
// =============================================================================

#[rstest]
#[case(vec![(1, ()), (1, ())], 1)]
#[case(vec![(3, ()), (2, ())], 1)]
#[case(vec![(1, ()), (2, ()), (4, ()), (3, ())], 3)]
fn test_from_sorted_entries_rejects(#[case] entries: Vec<(i32, ())>, #[case] position: usize) {
    assert_eq!(
        TreeNode::from_sorted_entries(&NaturalOrder, entries).map(|tree| tree.size()),
        Err(NodeError::UnsortedInput { position })
    );
}

#[rstest]
fn test_from_entries_last_duplicate_wins() {
    let tree = TreeNode::from_entries(&NaturalOrder, [(1, "first"), (1, "second")]);
    assert_eq!(tree.size(), 1);
    assert_eq!(tree.find(&NaturalOrder, &1), Some(&"second"));
}
