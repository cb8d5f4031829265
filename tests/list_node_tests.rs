//! Integration tests for ListNode.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use arboreal::persistent::{ListNode, MAX_LEAF_SIZE, NodeError};
use rstest::rstest;
use std::collections::HashSet;

fn collect(node: &ListNode<i32>) -> Vec<i32> {
    node.iter().copied().collect()
}

// =============================================================================
// Construction Tests
// =============================================================================

#[rstest]
fn test_default_is_empty() {
    let node: ListNode<String> = ListNode::default();
    assert!(node.is_empty());
    assert_eq!(node.first(), None);
    assert_eq!(node.last(), None);
}

#[rstest]
fn test_bulk_build_from_slice() {
    let source: Vec<i32> = (1..=1000).collect();
    let node = ListNode::from_slice(&source);
    assert_eq!(node.size(), 1000);
    assert_eq!(node.get(500), Some(&501));
    assert!(node.check_invariants().is_ok());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(MAX_LEAF_SIZE)]
#[case(MAX_LEAF_SIZE + 1)]
#[case(10 * MAX_LEAF_SIZE + 7)]
fn test_build_paths_agree(#[case] count: usize) {
    let source: Vec<i32> = (0..count as i32).collect();
    let from_slice = ListNode::from_slice(&source);
    let from_iter: ListNode<i32> = source.iter().copied().collect();
    assert_eq!(from_slice, from_iter);
    assert_eq!(from_slice.depth(), from_iter.depth());
    assert_eq!(collect(&from_slice), source);
}

// =============================================================================
// Sequential Growth Tests
// =============================================================================

#[rstest]
fn test_append_sequence_depth_stays_small() {
    let mut node = ListNode::empty();
    let mut max_depth = 0;
    for value in 0..300 {
        node = node.append(value);
        max_depth = max_depth.max(node.depth());
    }
    assert_eq!(collect(&node), (0..300).collect::<Vec<_>>());
    assert!(max_depth <= 6);
    assert!(node.check_invariants().is_ok());
}

#[rstest]
fn test_mixed_edge_growth() {
    let mut node = ListNode::empty();
    for value in 0..1000 {
        node = if value % 2 == 0 {
            node.append(value)
        } else {
            node.prepend(-value)
        };
    }
    assert!(node.check_invariants().is_ok());
    assert_eq!(node.first(), Some(&-999));
    assert_eq!(node.last(), Some(&998));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[rstest]
fn test_operations_leave_receiver_unchanged() {
    let original: ListNode<i32> = (0..2000).collect();
    let snapshot = collect(&original);

    let _ = original.append(1);
    let _ = original.prepend(1);
    let _ = original.insert(1000, 1).unwrap();
    let _ = original.delete(1000).unwrap();
    let _ = original.assign(5, 1).unwrap();
    let _ = original.prefix(3).unwrap();
    let _ = original.suffix(3).unwrap();
    let _ = original.reverse();
    let _ = original.append_node(&original);

    assert_eq!(collect(&original), snapshot);
    assert!(original.check_invariants().is_ok());
}

#[rstest]
fn test_failed_operation_reports_error() {
    let node: ListNode<i32> = (0..10).collect();
    assert_eq!(
        node.insert(11, 0),
        Err(NodeError::IndexOutOfBounds {
            index: 11,
            length: 10
        })
    );
    assert_eq!(
        node.slice(4, 20),
        Err(NodeError::InvalidRange {
            offset: 4,
            limit: 20,
            length: 10
        })
    );
    assert_eq!(collect(&node), (0..10).collect::<Vec<_>>());
}

// =============================================================================
// Concatenation and Splitting Tests
// =============================================================================

#[rstest]
fn test_append_node_sequence() {
    let first: ListNode<i32> = (1..=100).collect();
    let second: ListNode<i32> = (101..=150).collect();
    let joined = first.append_node(&second);
    assert_eq!(collect(&joined), (1..=150).collect::<Vec<_>>());
    assert!(joined.check_invariants().is_ok());
}

#[rstest]
fn test_prepend_node_sequence() {
    let tail: ListNode<i32> = (500..5000).collect();
    let head: ListNode<i32> = (0..500).collect();
    let joined = tail.prepend_node(&head);
    assert_eq!(collect(&joined), (0..5000).collect::<Vec<_>>());
    assert!(joined.check_invariants().is_ok());
}

#[rstest]
fn test_repeated_concat_of_small_pieces() {
    let mut node = ListNode::empty();
    for chunk in 0..200 {
        let piece: ListNode<i32> = (chunk * 7..chunk * 7 + 7).collect();
        node = node.append_node(&piece);
        assert!(node.check_invariants().is_ok());
    }
    assert_eq!(collect(&node), (0..1400).collect::<Vec<_>>());
}

#[rstest]
fn test_insert_all_in_middle() {
    let outer: ListNode<i32> = (0..100).chain(400..1000).collect();
    let inner: ListNode<i32> = (100..400).collect();
    let spliced = outer.insert_all(100, &inner).unwrap();
    assert_eq!(collect(&spliced), (0..1000).collect::<Vec<_>>());
    assert!(spliced.check_invariants().is_ok());
}

#[rstest]
fn test_prefix_suffix_every_split_point() {
    let node: ListNode<i32> = (0..400).collect();
    for split in 0..=400 {
        let rejoined = node
            .prefix(split)
            .unwrap()
            .append_node(&node.suffix(split).unwrap());
        assert_eq!(rejoined, node);
    }
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[rstest]
fn test_iter_range_windows_cover_tree() {
    let node: ListNode<i32> = (0..1000).collect();
    let mut stitched = Vec::new();
    for offset in (0..1000).step_by(97) {
        stitched.extend(node.iter_range(offset, offset + 97).copied());
    }
    assert_eq!(stitched, collect(&node));
}

#[rstest]
fn test_into_iterator_for_reference() {
    let node = ListNode::from_slice(&["a", "b", "c"]);
    let mut joined = String::new();
    for element in &node {
        joined.push_str(element);
    }
    assert_eq!(joined, "abc");
}

#[rstest]
fn test_hash_follows_equality() {
    let built: ListNode<i32> = (0..300).collect();
    let assembled = ListNode::from_slice(&[0])
        .append_node(&(1..300).collect::<ListNode<i32>>());
    let mut set = HashSet::new();
    set.insert(built);
    assert!(set.contains(&assembled));
}
