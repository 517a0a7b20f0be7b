//! Tests for the lattice predicates and operators over octagon values.
#![cfg(feature = "std")]

use octagon_domain::impls::{Interval, LinCons, LinExpr, Octagon, OctagonManager};

/// Helper building `X_v ≤ bound` as an `e ≥ 0` constraint.
fn at_most(v: usize, bound: f64) -> LinCons {
    LinCons::sup_eq(LinExpr::from_constant(Interval::singleton(bound)).plus_term(v, -1.0))
}

/// Helper building `X_v ≥ bound`.
fn at_least(v: usize, bound: f64) -> LinCons {
    LinCons::sup_eq(LinExpr::from_constant(Interval::singleton(-bound)).plus_term(v, 1.0))
}

/// Helper building `X_i − X_j ≤ bound`.
fn difference_at_most(i: usize, j: usize, bound: f64) -> LinCons {
    LinCons::sup_eq(
        LinExpr::from_constant(Interval::singleton(bound)).plus_term(i, -1.0).plus_term(j, 1.0),
    )
}

/// Helper meeting the top octagon with the given constraints.
fn octagon_of(
    manager: &mut OctagonManager,
    dim: usize,
    constraints: &[LinCons],
) -> Octagon {
    let mut top = Octagon::top(dim, 0);
    manager.meet_lincons_array(&mut top, constraints)
}

// ============================================================================
// Predicates
// ============================================================================

#[test]
fn test_top_and_bottom_predicates() {
    let mut manager = OctagonManager::new();
    let mut top = Octagon::top(2, 0);
    assert!(manager.is_top(&top));
    assert!(!manager.is_bottom(&mut top));

    let mut bottom = Octagon::bottom(2, 0);
    assert!(manager.is_bottom(&mut bottom));
    assert!(!manager.is_top(&bottom));
}

#[test]
fn test_contradiction_becomes_bottom() {
    let mut manager = OctagonManager::new();
    let mut octagon = octagon_of(&mut manager, 2, &[at_most(0, 1.0), at_least(0, 2.0)]);
    assert!(manager.is_bottom(&mut octagon));
}

#[test]
fn test_is_leq_on_nested_boxes() {
    let mut manager = OctagonManager::new();
    let mut small = octagon_of(&mut manager, 2, &[at_least(0, 1.0), at_most(0, 2.0)]);
    let mut large = octagon_of(&mut manager, 2, &[at_least(0, 0.0), at_most(0, 5.0)]);
    assert!(manager.is_leq(&mut small, &large));
    assert!(!manager.is_leq(&mut large, &small));
    let top = Octagon::top(2, 0);
    assert!(manager.is_leq(&mut small, &top));
    let mut bottom = Octagon::bottom(2, 0);
    assert!(manager.is_leq(&mut bottom, &small));
    assert!(!manager.is_leq(&mut small, &bottom));
}

#[test]
fn test_is_eq_on_identically_built_values() {
    let mut manager = OctagonManager::new();
    let constraints = [at_least(0, 1.0), at_most(0, 3.0), difference_at_most(0, 1, 2.0)];
    let mut first = octagon_of(&mut manager, 3, &constraints);
    let mut second = octagon_of(&mut manager, 3, &constraints);
    assert!(manager.is_eq(&mut first, &mut second));

    let mut third = octagon_of(&mut manager, 3, &[at_least(0, 1.0)]);
    assert!(!manager.is_eq(&mut first, &mut third));
}

// ============================================================================
// Meet and join
// ============================================================================

#[test]
fn test_lattice_laws() {
    let mut manager = OctagonManager::new();
    let mut a = octagon_of(
        &mut manager,
        2,
        &[at_least(0, 0.0), at_most(0, 4.0), difference_at_most(0, 1, 1.0)],
    );
    let mut b = octagon_of(&mut manager, 2, &[at_least(0, 2.0), at_most(0, 6.0)]);

    let mut meet = manager.meet(&a, &b).unwrap();
    assert!(manager.is_leq(&mut meet, &a));
    assert!(manager.is_leq(&mut meet, &b));

    let join = manager.join(&mut a, &mut b).unwrap();
    assert!(manager.is_leq(&mut a, &join));
    assert!(manager.is_leq(&mut b, &join));

    let mut meet_again = manager.meet(&a, &b).unwrap();
    assert!(manager.is_leq(&mut meet_again, &join));
}

#[test]
fn test_meet_with_bottom_is_bottom() {
    let mut manager = OctagonManager::new();
    let a = octagon_of(&mut manager, 2, &[at_most(0, 4.0)]);
    let bottom = Octagon::bottom(2, 0);
    let mut met = manager.meet(&a, &bottom).unwrap();
    assert!(manager.is_bottom(&mut met));
}

#[test]
fn test_join_of_disjoint_ranges_spans_both() {
    let mut manager = OctagonManager::new();
    let mut a = octagon_of(&mut manager, 2, &[at_least(0, 0.0), at_most(0, 1.0)]);
    let mut b = octagon_of(&mut manager, 2, &[at_least(0, 3.0), at_most(0, 4.0)]);
    let mut join = manager.join(&mut a, &mut b).unwrap();
    let ranges = manager.to_box(&mut join);
    assert_eq!(ranges[0], Interval::new(0.0, 4.0));
    assert!(ranges[1].is_top());
    assert!(manager.is_leq(&mut a, &join));
    assert!(manager.is_leq(&mut b, &join));
}

#[test]
fn test_join_with_bottom_is_identity() {
    let mut manager = OctagonManager::new();
    let mut a = octagon_of(&mut manager, 2, &[at_most(0, 4.0)]);
    let mut bottom = Octagon::bottom(2, 0);
    let mut join = manager.join(&mut a, &mut bottom).unwrap();
    assert!(manager.is_eq(&mut join, &mut a));
}

#[test]
fn test_dimension_mismatch_is_rejected() {
    let mut manager = OctagonManager::new();
    let a = Octagon::top(2, 0);
    let b = Octagon::top(3, 0);
    assert!(manager.meet(&a, &b).is_err());
}

// ============================================================================
// Widening and narrowing
// ============================================================================

#[test]
fn test_widening_drops_grown_bounds() {
    let mut manager = OctagonManager::new();
    let a = octagon_of(&mut manager, 1, &[at_least(0, 0.0), at_most(0, 1.0)]);
    let mut b = octagon_of(&mut manager, 1, &[at_least(0, 0.0), at_most(0, 2.0)]);
    let mut widened = manager.widening(&a, &mut b).unwrap();
    let ranges = manager.to_box(&mut widened);
    assert_eq!(ranges[0].inf, 0.0);
    assert_eq!(ranges[0].sup, f64::INFINITY);
}

#[test]
fn test_widening_keeps_stable_bounds() {
    let mut manager = OctagonManager::new();
    let a = octagon_of(&mut manager, 2, &[at_most(0, 5.0), difference_at_most(0, 1, 2.0)]);
    let mut b = octagon_of(&mut manager, 2, &[at_most(0, 5.0), difference_at_most(0, 1, 2.0)]);
    let mut widened = manager.widening(&a, &mut b).unwrap();
    let mut expected = octagon_of(&mut manager, 2, &[at_most(0, 5.0), difference_at_most(0, 1, 2.0)]);
    assert!(manager.is_eq(&mut widened, &mut expected));
}

#[test]
fn test_widening_with_thresholds_climbs_the_ladder() {
    let mut manager = OctagonManager::new();
    let a = octagon_of(&mut manager, 1, &[at_most(0, 1.0)]);
    let mut b = octagon_of(&mut manager, 1, &[at_most(0, 3.0)]);
    let mut widened =
        manager.widening_thresholds(&a, &mut b, &[4.0, 16.0, 64.0]).unwrap();
    let ranges = manager.to_box(&mut widened);
    // 2·X0 ≤ 6 grew past 2·X0 ≤ 2 and lands on the first threshold ≥ 6
    assert_eq!(ranges[0].sup, 8.0);

    let mut far = octagon_of(&mut manager, 1, &[at_most(0, 100.0)]);
    let mut unbounded = manager.widening_thresholds(&a, &mut far, &[4.0, 16.0, 64.0]).unwrap();
    assert_eq!(manager.to_box(&mut unbounded)[0].sup, f64::INFINITY);
}

#[test]
fn test_widening_iteration_terminates() {
    let mut manager = OctagonManager::new();
    let mut state = octagon_of(&mut manager, 1, &[at_least(0, 0.0), at_most(0, 0.0)]);
    let mut steps = 0usize;
    loop {
        // F grows the upper bound by one each round
        let upper = manager.to_box(&mut state)[0].sup;
        let mut grown = octagon_of(
            &mut manager,
            1,
            &[at_least(0, 0.0), at_most(0, if upper.is_finite() { upper + 1.0 } else { 0.0 })],
        );
        let mut joined = manager.join(&mut state, &mut grown).unwrap();
        let mut next = manager.widening(&state, &mut joined).unwrap();
        if manager.is_eq(&mut next, &mut state) {
            break;
        }
        state = next;
        steps += 1;
        assert!(steps < 5, "widening failed to stabilise");
    }
}

#[test]
fn test_narrowing_refines_only_unbounded_entries() {
    let mut manager = OctagonManager::new();
    let a = octagon_of(&mut manager, 1, &[at_least(0, 0.0)]);
    let mut b = octagon_of(&mut manager, 1, &[at_least(0, 1.0), at_most(0, 5.0)]);
    let mut narrowed = manager.narrowing(&a, &mut b).unwrap();
    let ranges = manager.to_box(&mut narrowed);
    // the missing upper bound is refilled, the stable lower bound kept
    assert_eq!(ranges[0], Interval::new(0.0, 5.0));

    // A ⊓ B ⊑ A △ B ⊑ A
    let mut meet = manager.meet(&a, &b).unwrap();
    assert!(manager.is_leq(&mut meet, &narrowed));
    assert!(manager.is_leq(&mut narrowed, &a));
}
