//! Testing utilities constructing octagon values from raw bytes and
//! shared invariant-checking functions used by both fuzz targets and
//! regression tests, so crash files produced by fuzzing can be directly
//! replayed as unit tests.
//!
//! This module is available when the `arbitrary` feature is enabled.

use alloc::vec::Vec;

use arbitrary::{Arbitrary, Unstructured};

use crate::impls::{
    ConstraintKind, HalfMatrix, Interval, LinCons, LinExpr, Octagon, OctagonManager,
};

/// Construct a value of type `T` from raw bytes using the [`Arbitrary`]
/// trait.
///
/// Returns `None` if the bytes are insufficient or do not produce a
/// valid instance.
pub fn from_bytes<T: for<'a> Arbitrary<'a>>(bytes: &[u8]) -> Option<T> {
    let mut unstructured = Unstructured::new(bytes);
    T::arbitrary(&mut unstructured).ok()
}

/// A byte-driven recipe for a small octagon: a dimension count and a
/// list of octagonal constraints to meet with.
#[derive(Debug, Clone)]
pub struct OctagonRecipe {
    /// Number of variables, kept small so closures stay cheap.
    pub dim: usize,
    /// Number of leading integer-typed variables.
    pub intdim: usize,
    /// The constraints the octagon is built from.
    pub constraints: Vec<LinCons>,
}

impl<'a> Arbitrary<'a> for OctagonRecipe {
    fn arbitrary(unstructured: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let dim = unstructured.int_in_range(1..=6)?;
        let intdim = unstructured.int_in_range(0..=dim)?;
        let count = unstructured.int_in_range(0..=12)?;
        let mut constraints = Vec::with_capacity(count);
        for _ in 0..count {
            let i = unstructured.int_in_range(0..=dim - 1)?;
            let j = unstructured.int_in_range(0..=dim - 1)?;
            let coefficient_i = if unstructured.arbitrary()? { 1.0 } else { -1.0 };
            let coefficient_j = if unstructured.arbitrary()? { 1.0 } else { -1.0 };
            let constant = f64::from(unstructured.int_in_range(-64i16..=64)?);
            let kind = match unstructured.int_in_range(0u8..=2)? {
                0 => ConstraintKind::Eq,
                1 => ConstraintKind::Sup,
                _ => ConstraintKind::SupEq,
            };
            let mut expr = LinExpr::from_constant(Interval::singleton(constant))
                .plus_term(i, coefficient_i);
            if i != j {
                expr = expr.plus_term(j, coefficient_j);
            }
            constraints.push(LinCons::new(expr, kind));
        }
        Ok(Self { dim, intdim, constraints })
    }
}

impl OctagonRecipe {
    /// Builds the octagon described by the recipe.
    #[must_use]
    pub fn build(&self, manager: &mut OctagonManager) -> Octagon {
        let mut top = Octagon::top(self.dim, self.intdim);
        manager.meet_lincons_array(&mut top, &self.constraints)
    }
}

/// Check that the coherent accessor sees the same bound through a slot
/// and through its coherence partner.
///
/// # Panics
///
/// Panics if any pair of literals disagrees with its partner.
pub fn check_coherence(matrix: &HalfMatrix) {
    let dim = matrix.dim();
    for i in 0..2 * dim {
        for j in 0..2 * dim {
            let direct = matrix.bound_or_top(i, j);
            let partner = matrix.bound_or_top(j ^ 1, i ^ 1);
            assert!(
                direct == partner || (direct.is_nan() && partner.is_nan()),
                "coherence violated at ({i}, {j}): {direct} vs {partner}",
            );
        }
    }
}

/// Check that strong closure is idempotent on the given octagon.
///
/// # Panics
///
/// Panics if re-closing a closed matrix changes it or empties it.
pub fn check_closure_idempotent(manager: &mut OctagonManager, octagon: &Octagon) {
    let mut once = octagon.clone();
    manager.cache_closure(&mut once);
    let Some(closed) = once.matrix() else {
        // ⊥ stays ⊥
        return;
    };
    let mut reclosed = closed.clone();
    assert!(!reclosed.strong_closure(), "a closed matrix closed to bottom");
    assert!(reclosed.is_eq(closed), "strong closure is not idempotent");
}

/// Check that a join soundly over-approximates both of its operands.
///
/// # Panics
///
/// Panics if either operand escapes the join.
pub fn check_join_sound(manager: &mut OctagonManager, lhs: &Octagon, rhs: &Octagon) {
    let mut left = lhs.clone();
    let mut right = rhs.clone();
    let Ok(join) = manager.join(&mut left, &mut right) else {
        panic!("join failed on same-dimension operands");
    };
    assert!(manager.is_leq(&mut left, &join), "the left operand escapes the join");
    assert!(manager.is_leq(&mut right, &join), "the right operand escapes the join");
}
