//! Tests for the variable partition.
#![cfg(feature = "std")]

use octagon_domain::impls::VariablePartition;

/// Helper building a partition over 8 variables with blocks {0, 2, 5}
/// and {1, 7}.
fn sample_partition() -> VariablePartition {
    let mut partition = VariablePartition::new(8);
    let first = partition.singleton(2);
    partition.insert(0, first);
    partition.insert(5, first);
    let second = partition.singleton(7);
    partition.insert(1, second);
    partition
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_find_and_connectivity() {
    let partition = sample_partition();
    assert_eq!(partition.find(0), partition.find(5));
    assert!(partition.is_connected(0, 2));
    assert!(partition.is_connected(1, 7));
    assert!(!partition.is_connected(0, 7));
    assert!(!partition.is_connected(3, 4));
    assert!(partition.find(3).is_none());
    assert_eq!(partition.constrained_variables(), 5);
    assert_eq!(partition.number_of_components(), 2);
}

#[test]
fn test_blocks_stay_sorted() {
    let partition = sample_partition();
    for component in partition.components() {
        assert!(component.as_slice().is_sorted());
    }
    let id = partition.find(0).unwrap();
    assert_eq!(partition.component(id).as_slice(), &[0, 2, 5]);
}

#[test]
fn test_membership_bitmap() {
    let partition = sample_partition();
    let bitmap = partition.membership_bitmap();
    assert_eq!(bitmap.count_ones(), 5);
    assert!(bitmap[0] && bitmap[1] && bitmap[2] && bitmap[5] && bitmap[7]);
    assert!(!bitmap[3] && !bitmap[4] && !bitmap[6]);
}

// ============================================================================
// Merging and detaching
// ============================================================================

#[test]
fn test_merge_preserves_order() {
    let mut partition = sample_partition();
    let id = partition.merge_containing(2, 7);
    assert_eq!(partition.component(id).as_slice(), &[0, 1, 2, 5, 7]);
    assert_eq!(partition.number_of_components(), 1);
    for variable in [0, 1, 2, 5, 7] {
        assert_eq!(partition.find(variable), Some(id));
    }
}

#[test]
fn test_merge_with_fresh_variables() {
    let mut partition = VariablePartition::new(4);
    let id = partition.merge_containing(3, 1);
    assert_eq!(partition.component(id).as_slice(), &[1, 3]);
}

#[test]
fn test_detach() {
    let mut partition = sample_partition();
    partition.detach(2);
    assert!(partition.find(2).is_none());
    let id = partition.find(0).unwrap();
    assert_eq!(partition.component(id).as_slice(), &[0, 5]);

    // emptying a block removes it
    partition.detach(1);
    partition.detach(7);
    assert_eq!(partition.number_of_components(), 1);
    assert_eq!(partition.constrained_variables(), 2);
}

// ============================================================================
// Union and refinement
// ============================================================================

#[test]
fn test_union_with_merges_overlapping_blocks() {
    let mut left = sample_partition();
    let mut right = VariablePartition::new(8);
    let id = right.singleton(5);
    right.insert(7, id);
    left.union_with(&right);
    // 5 was connected to {0, 2}, 7 to {1}; the union links them all
    assert!(left.is_connected(0, 1));
    assert!(left.is_connected(2, 7));
    assert_eq!(left.number_of_components(), 1);
}

#[test]
fn test_common_refinement_splits_blocks() {
    let left = sample_partition();
    let mut right = VariablePartition::new(8);
    let id = right.singleton(0);
    right.insert(2, id);
    let other = right.singleton(5);
    right.insert(7, other);
    let refined = left.common_refinement(&right);
    // {0, 2, 5} ∩-splits into {0, 2} and {5}; 1 is absent on the right
    assert!(refined.is_connected(0, 2));
    assert!(!refined.is_connected(0, 5));
    assert!(refined.contains(5));
    assert!(!refined.contains(1));
}

#[test]
fn test_permuted_relabels_blocks() {
    let partition = sample_partition();
    let permutation = [7, 6, 5, 4, 3, 2, 1, 0];
    let permuted = partition.permuted(&permutation);
    assert!(permuted.is_connected(7, 5));
    assert!(permuted.is_connected(2, 7));
    assert!(permuted.is_connected(6, 0));
    assert!(!permuted.contains(4));
    let id = permuted.find(2).unwrap();
    assert_eq!(permuted.component(id).as_slice(), &[2, 5, 7]);
}

#[test]
fn test_partition_equality_ignores_block_identifiers() {
    let mut left = VariablePartition::new(3);
    let id = left.singleton(0);
    left.insert(1, id);
    let mut right = VariablePartition::new(3);
    let _ = right.singleton(2);
    let id = right.singleton(1);
    right.insert(0, id);
    right.detach(2);
    assert_eq!(left, right);
}
