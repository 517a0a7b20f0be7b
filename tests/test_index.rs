//! Tests for the half-matrix offset functions.
#![cfg(feature = "std")]

use octagon_domain::impls::index::{matpos, matpos2, matrix_size};

#[test]
fn test_matrix_size() {
    assert_eq!(matrix_size(0), 0);
    assert_eq!(matrix_size(1), 4);
    assert_eq!(matrix_size(2), 12);
    assert_eq!(matrix_size(5), 60);
}

#[test]
fn test_matpos_row_major_layout() {
    // Row 0 holds (0,0) and (0,1), row 1 holds (1,0) and (1,1), ...
    assert_eq!(matpos(0, 0), 0);
    assert_eq!(matpos(0, 1), 1);
    assert_eq!(matpos(1, 0), 2);
    assert_eq!(matpos(1, 1), 3);
    assert_eq!(matpos(2, 0), 4);
    assert_eq!(matpos(3, 3), 11);
}

#[test]
fn test_matpos_is_dense_and_injective() {
    let dim = 5;
    let mut seen = vec![false; matrix_size(dim)];
    for i in 0..2 * dim {
        for j in 0..=(i | 1) {
            let offset = matpos(i, j);
            assert!(!seen[offset], "offset {offset} assigned twice");
            seen[offset] = true;
        }
    }
    assert!(seen.iter().all(|&used| used), "the layout leaves holes");
}

#[test]
fn test_matpos2_redirects_to_coherence_partner() {
    let dim = 4;
    for i in 0..2 * dim {
        for j in 0..2 * dim {
            assert_eq!(
                matpos2(i, j),
                matpos2(j ^ 1, i ^ 1),
                "({i}, {j}) and its partner disagree",
            );
        }
    }
}

#[test]
fn test_matpos2_agrees_with_matpos_inside_the_triangle() {
    for i in 0..8 {
        for j in 0..=(i | 1) {
            assert_eq!(matpos2(i, j), matpos(i, j));
        }
    }
}
