//! Bound arithmetic shared by the closure kernels.

use core::fmt::Debug;

use num_traits::{Float, Zero};

/// Arithmetic of one octagonal bound, the right-hand side of a constraint
/// `lit(j) − lit(i) ≤ c`.
///
/// The closure kernels only ever add two bounds (saturating at the
/// absent-constraint element), keep the tighter of two bounds and halve a
/// sum of unary bounds, so the trait stays deliberately small; backends
/// are free to instantiate it with a scalar or a SIMD lane type.
///
/// Implementations must never produce a bound below every other bound
/// (`−∞` for floats): absent constraints are `unbounded()` and sums with
/// it must stay `unbounded()`.
pub trait Bound: Copy + PartialOrd + Zero + Debug {
    /// The bound encoding the absence of a constraint.
    fn unbounded() -> Self;

    /// Whether this bound encodes the absence of a constraint.
    fn is_unbounded(self) -> bool;

    /// Addition, saturating at the absent-constraint element.
    fn sum(self, rhs: Self) -> Self;

    /// The tighter (smaller) of two bounds.
    fn tighten(self, rhs: Self) -> Self;

    /// Halves the bound; sums of the two literals of one variable encode
    /// doubled variable bounds.
    fn halved(self) -> Self;

    /// Doubles the bound.
    fn doubled(self) -> Self;

    /// Rounds the bound down to the nearest integer.
    fn floored(self) -> Self;
}

impl<F: Float + Debug> Bound for F {
    #[inline]
    fn unbounded() -> Self {
        F::infinity()
    }

    #[inline]
    fn is_unbounded(self) -> bool {
        self == F::infinity()
    }

    #[inline]
    fn sum(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline]
    fn tighten(self, rhs: Self) -> Self {
        self.min(rhs)
    }

    #[inline]
    fn halved(self) -> Self {
        self / (F::one() + F::one())
    }

    #[inline]
    fn doubled(self) -> Self {
        self + self
    }

    #[inline]
    fn floored(self) -> Self {
        self.floor()
    }
}
