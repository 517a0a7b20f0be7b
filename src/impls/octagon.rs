//! The octagon abstract value and the manager driving its operations.
//!
//! An [`Octagon`] caches up to two matrices: `mat` holds the latest
//! (possibly unclosed) constraints, `closed` their strong closure once it
//! has been computed. Both absent means the value is ⊥. The
//! [`OctagonManager`] carries the closure policy, the per-operation
//! result flags and the scratch buffer shared by the transfer functions,
//! mirroring the usual manager object of numerical abstract domains.

mod dimensions;
mod lattice;
mod transfer;

use alloc::vec::Vec;
use core::fmt;

use crate::impls::half_matrix::HalfMatrix;

/// Flags describing the quality of the last completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFlags {
    /// The result is exactly the rational one.
    pub exact: bool,
    /// The result is the best the domain can represent.
    pub best: bool,
    /// Finite-precision rounding occurred while converting bounds.
    pub conv: bool,
}

impl Default for ResultFlags {
    fn default() -> Self {
        Self { exact: true, best: true, conv: false }
    }
}

/// Policy and scratch state shared by the domain operations.
///
/// The scratch buffer is reused across calls; a manager must therefore
/// not be shared between concurrently running operations.
#[derive(Debug, Clone)]
pub struct OctagonManager {
    algorithm: i32,
    flags: ResultFlags,
    tmp: Vec<f64>,
}

impl Default for OctagonManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OctagonManager {
    /// Returns a manager with the default policy: closures are cached
    /// eagerly before the operations that benefit from them.
    #[must_use]
    pub fn new() -> Self {
        Self { algorithm: 0, flags: ResultFlags::default(), tmp: Vec::new() }
    }

    /// Returns a manager with an explicit algorithm policy; a negative
    /// value disables the automatic closure caching.
    #[must_use]
    pub fn with_algorithm(algorithm: i32) -> Self {
        Self { algorithm, ..Self::new() }
    }

    /// Flags describing the last completed operation.
    #[must_use]
    pub fn flags(&self) -> ResultFlags {
        self.flags
    }

    /// Whether the automatic closure caching is enabled.
    #[must_use]
    pub fn auto_closure(&self) -> bool {
        self.algorithm >= 0
    }

    /// Resets the flags and sizes the scratch buffer for an operation
    /// over `dim` variables.
    pub(crate) fn begin(&mut self, dim: usize) {
        self.flags = ResultFlags::default();
        let needed = 2 * (dim + 1);
        if self.tmp.len() < needed {
            self.tmp.resize(needed, 0.0);
        }
    }

    pub(crate) fn mark_inexact(&mut self) {
        self.flags.exact = false;
        self.flags.best = false;
    }

    /// Computes and caches the strong closure of `octagon` when absent.
    /// A closure discovering unsatisfiability turns the value into ⊥.
    pub fn cache_closure(&mut self, octagon: &mut Octagon) {
        if octagon.closed.is_some() {
            return;
        }
        let Some(mat) = octagon.mat.as_ref() else {
            return;
        };
        let mut closed = mat.clone();
        if closed.strong_closure() {
            octagon.set_bottom();
        } else {
            octagon.closed = Some(closed);
        }
    }

    /// Whether the octagon is the empty set.
    pub fn is_bottom(&mut self, octagon: &mut Octagon) -> bool {
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        if octagon.closed.is_some() {
            if octagon.intdim > 0 {
                self.mark_inexact();
            }
            false
        } else if octagon.mat.is_none() {
            true
        } else {
            self.mark_inexact();
            false
        }
    }

    /// Whether the octagon is the whole space.
    pub fn is_top(&mut self, octagon: &Octagon) -> bool {
        self.begin(octagon.dim);
        octagon.best().is_some_and(HalfMatrix::is_top)
    }

    /// Whether `lhs` is included in `rhs`. Operands of mismatched
    /// dimensions compare as `false`.
    pub fn is_leq(&mut self, lhs: &mut Octagon, rhs: &Octagon) -> bool {
        if lhs.dim != rhs.dim || lhs.intdim != rhs.intdim {
            debug_assert!(false, "comparing octagons of mismatched dimensions");
            return false;
        }
        self.begin(lhs.dim);
        if self.auto_closure() {
            self.cache_closure(lhs);
        }
        if lhs.is_bottom_raw() {
            return true;
        }
        if rhs.is_bottom_raw() {
            if lhs.closed.is_some() {
                if lhs.intdim > 0 {
                    self.mark_inexact();
                }
            } else {
                self.mark_inexact();
            }
            return false;
        }
        let Some(left) = lhs.best() else { return true };
        let Some(right) = rhs.best() else { return false };
        left.is_leq(right)
    }

    /// Whether the two octagons describe the same set. Operands of
    /// mismatched dimensions compare as `false`.
    pub fn is_eq(&mut self, lhs: &mut Octagon, rhs: &mut Octagon) -> bool {
        if lhs.dim != rhs.dim || lhs.intdim != rhs.intdim {
            debug_assert!(false, "comparing octagons of mismatched dimensions");
            return false;
        }
        self.begin(lhs.dim);
        if self.auto_closure() {
            self.cache_closure(lhs);
            self.cache_closure(rhs);
        }
        match (lhs.is_bottom_raw(), rhs.is_bottom_raw()) {
            (true, true) => true,
            (true, false) | (false, true) => {
                if lhs.intdim > 0 || lhs.closed.is_none() || rhs.closed.is_none() {
                    self.mark_inexact();
                }
                false
            }
            (false, false) => {
                let Some(left) = lhs.best() else { return false };
                let Some(right) = rhs.best() else { return false };
                left.is_eq(right)
            }
        }
    }

    /// Whether no constraint mentions the given variable.
    pub fn is_dimension_unconstrained(&mut self, octagon: &Octagon, dimension: usize) -> bool {
        self.begin(octagon.dim);
        if dimension >= octagon.dim {
            return false;
        }
        let Some(matrix) = octagon.best() else {
            return false;
        };
        if let Some(partition) = matrix.partition() {
            let Some(id) = partition.find(dimension) else {
                return true;
            };
            for other in partition.component(id).iter() {
                if other == dimension {
                    if matrix.bound_at(2 * dimension, 2 * dimension + 1) != f64::INFINITY
                        || matrix.bound_at(2 * dimension + 1, 2 * dimension) != f64::INFINITY
                    {
                        return false;
                    }
                } else {
                    for s in 0..2 {
                        for t in 0..2 {
                            if matrix.bound_at(2 * other + s, 2 * dimension + t) != f64::INFINITY
                            {
                                return false;
                            }
                        }
                    }
                }
            }
            true
        } else {
            for literal in 0..2 * octagon.dim {
                for t in 0..2 {
                    let target = 2 * dimension + t;
                    if literal == target {
                        continue;
                    }
                    if matrix.bound_at(literal, target) != f64::INFINITY {
                        return false;
                    }
                }
            }
            true
        }
    }
}

/// An octagonal set of program states over `dim` variables, the first
/// `intdim` of which are integer-typed.
#[derive(Debug, Clone)]
pub struct Octagon {
    dim: usize,
    intdim: usize,
    mat: Option<HalfMatrix>,
    closed: Option<HalfMatrix>,
}

impl Octagon {
    /// The unconstrained octagon.
    #[must_use]
    pub fn top(dim: usize, intdim: usize) -> Self {
        debug_assert!(intdim <= dim, "more integer dimensions than dimensions");
        Self { dim, intdim, mat: None, closed: Some(HalfMatrix::top(dim)) }
    }

    /// The empty octagon.
    #[must_use]
    pub fn bottom(dim: usize, intdim: usize) -> Self {
        debug_assert!(intdim <= dim, "more integer dimensions than dimensions");
        Self { dim, intdim, mat: None, closed: None }
    }

    /// Number of variables.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of leading integer-typed variables.
    #[must_use]
    pub fn integer_dimensions(&self) -> usize {
        self.intdim
    }

    /// The constraint matrix, preferring the strongly closed one.
    #[must_use]
    pub fn matrix(&self) -> Option<&HalfMatrix> {
        self.best()
    }

    /// Whether the strong closure is currently cached.
    #[must_use]
    pub fn has_closure(&self) -> bool {
        self.closed.is_some()
    }

    pub(crate) fn best(&self) -> Option<&HalfMatrix> {
        self.closed.as_ref().or(self.mat.as_ref())
    }

    pub(crate) fn is_bottom_raw(&self) -> bool {
        self.mat.is_none() && self.closed.is_none()
    }

    pub(crate) fn set_bottom(&mut self) {
        self.mat = None;
        self.closed = None;
    }

    pub(crate) fn with_unclosed(dim: usize, intdim: usize, matrix: HalfMatrix) -> Self {
        Self { dim, intdim, mat: Some(matrix), closed: None }
    }

    pub(crate) fn with_closed(dim: usize, intdim: usize, matrix: HalfMatrix) -> Self {
        Self { dim, intdim, mat: None, closed: Some(matrix) }
    }
}

impl fmt::Display for Octagon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom_raw() {
            return write!(f, "bottom");
        }
        let constraints = self.constraints();
        if constraints.is_empty() {
            return write!(f, "top");
        }
        for (position, constraint) in constraints.iter().enumerate() {
            if position > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{constraint}")?;
        }
        Ok(())
    }
}
