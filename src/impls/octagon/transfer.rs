//! Transfer functions: constraint addition, assignment and substitution
//! of interval linear expressions, bound extraction and entailment.
//!
//! Every expression is first classified into its octagonal shape. Unit
//! unary and unit binary shapes map onto single matrix slots and stay
//! exact; everything else goes through a sound interval fallback and
//! poisons the exactness flag. Strict inequalities tighten to the next
//! representable bound on integer-typed variables at application time
//! and degrade to their non-strict version (inexactly) on real-typed
//! ones.

use alloc::vec::Vec;

use bitvec::vec::BitVec;

use super::{Octagon, OctagonManager};
use crate::errors::OctagonError;
use crate::impls::half_matrix::{HalfMatrix, block_literal};
use crate::impls::linexpr::{
    ConstraintKind, Interval, LinCons, LinExpr, OctagonalShape, octagonal_shape, unit_literal,
};

/// Range of variable `v`, decoded from its two unary slots.
fn variable_interval(matrix: &HalfMatrix, v: usize) -> Interval {
    let negated_double = matrix.bound_or_top(2 * v, 2 * v + 1);
    let double = matrix.bound_or_top(2 * v + 1, 2 * v);
    Interval::new(-negated_double / 2.0, double / 2.0)
}

/// Sound range of an expression over the matrix, exact for the zero,
/// unary and binary shapes of a strongly closed matrix.
fn bound_of_shape(
    matrix: &HalfMatrix,
    expr: &LinExpr,
    shape: OctagonalShape,
    a: f64,
    b: f64,
) -> Interval {
    let constant = Interval::new(-a, b);
    match shape {
        OctagonalShape::Empty => Interval::bottom(),
        OctagonalShape::Zero => constant,
        OctagonalShape::Unary { i, positive } => {
            let ui = unit_literal(i, positive);
            let upper = matrix.bound_or_top(ui ^ 1, ui) / 2.0;
            let lower = -(matrix.bound_or_top(ui, ui ^ 1) / 2.0);
            Interval::new(lower, upper) + constant
        }
        OctagonalShape::Binary { i, positive_i, j, positive_j } => {
            let ui = unit_literal(i, positive_i);
            let uj = unit_literal(j, positive_j);
            let upper = matrix.bound_or_top(uj ^ 1, ui);
            let lower = -matrix.bound_or_top(uj, ui ^ 1);
            Interval::new(lower, upper) + constant
        }
        OctagonalShape::Other => expr.evaluate(|v| variable_interval(matrix, v)),
    }
}

/// Tightens a doubled unary bound to the integer grid.
fn tighten_unary(doubled: f64, integer: bool, strict: bool) -> f64 {
    if !integer || !doubled.is_finite() {
        return doubled;
    }
    let bound = (doubled / 2.0).floor();
    let bound = if strict && 2.0 * bound == doubled { bound - 1.0 } else { bound };
    2.0 * bound
}

/// Tightens a binary bound to the integer grid.
fn tighten_binary(bound: f64, integer: bool, strict: bool) -> f64 {
    if !integer || !bound.is_finite() {
        return bound;
    }
    let floored = bound.floor();
    if strict && floored == bound { floored - 1.0 } else { floored }
}

/// Pins the unary slots of `target` to the given range; infinite sides
/// stay unconstrained.
fn pin_interval(matrix: &mut HalfMatrix, target: usize, value: Interval) {
    if value.inf == f64::NEG_INFINITY && value.sup == f64::INFINITY {
        return;
    }
    matrix.ensure_unary_relation(target);
    if value.sup < f64::INFINITY {
        matrix.set_bound(2 * target + 1, 2 * target, 2.0 * value.sup);
    }
    if value.inf > f64::NEG_INFINITY {
        matrix.set_bound(2 * target, 2 * target + 1, -2.0 * value.inf);
    }
}

/// One `e ≥ 0` constraint per stored finite bound.
fn lincons_of_bound(i: usize, j: usize, value: f64) -> LinCons {
    if i >> 1 == j >> 1 {
        // unary bound, halved back into a coefficient-one constraint
        let positive = i % 2 == 0;
        LinCons::sup_eq(
            LinExpr::from_constant(Interval::singleton(value / 2.0))
                .plus_term(i >> 1, if positive { 1.0 } else { -1.0 }),
        )
    } else {
        let coefficient_i = if i % 2 == 0 { 1.0 } else { -1.0 };
        let coefficient_j = if j % 2 == 0 { -1.0 } else { 1.0 };
        LinCons::sup_eq(
            LinExpr::from_constant(Interval::singleton(value))
                .plus_term(i >> 1, coefficient_i)
                .plus_term(j >> 1, coefficient_j),
        )
    }
}

impl Octagon {
    /// The constraint list of the best matrix available; ⊥ yields the
    /// single unsatisfiable constraint.
    #[must_use]
    pub fn constraints(&self) -> Vec<LinCons> {
        let Some(matrix) = self.best() else {
            return vec![LinCons::unsat()];
        };
        let mut result = Vec::new();
        let mut push = |i: usize, j: usize| {
            if i == j {
                return;
            }
            let value = matrix.bound_at(i, j);
            if value != f64::INFINITY {
                result.push(lincons_of_bound(i, j, value));
            }
        };
        if let Some(partition) = matrix.partition() {
            for component in partition.components() {
                let vars = component.as_slice();
                for ii in 0..2 * vars.len() {
                    let i = block_literal(vars, ii);
                    for jj in 0..=(ii | 1) {
                        push(i, block_literal(vars, jj));
                    }
                }
            }
        } else {
            for i in 0..2 * self.dim {
                for j in 0..=(i | 1) {
                    push(i, j);
                }
            }
        }
        result
    }
}

/// Outcome of applying a constraint batch to a matrix.
enum ApplyOutcome {
    /// The constraints made the matrix unsatisfiable.
    Bottom,
    /// The constraints were applied; `exact` tells whether faithfully.
    Applied {
        /// Whether every constraint was represented exactly.
        exact: bool,
    },
}

impl OctagonManager {
    /// Applies the constraints to the matrix in place. With
    /// `keep_closed` the matrix is assumed strongly closed on entry and
    /// is incrementally re-closed after every constraint.
    fn apply_constraints(
        &mut self,
        matrix: &mut HalfMatrix,
        dim: usize,
        intdim: usize,
        keep_closed: bool,
        constraints: &[LinCons],
    ) -> ApplyOutcome {
        let mut exact = true;
        for constraint in constraints {
            let kind = constraint.kind();
            if matches!(kind, ConstraintKind::EqMod | ConstraintKind::DisEq) {
                exact = false;
                continue;
            }
            let strict = matches!(kind, ConstraintKind::Sup);
            let shape = octagonal_shape(constraint.expr(), dim, &mut self.tmp);
            let (a, b) = (self.tmp[0], self.tmp[1]);
            match shape {
                OctagonalShape::Empty => return ApplyOutcome::Bottom,
                OctagonalShape::Zero => {
                    let satisfiable = match kind {
                        ConstraintKind::SupEq => b >= 0.0,
                        ConstraintKind::Sup => b > 0.0,
                        _ => b >= 0.0 && a >= 0.0,
                    };
                    if !satisfiable {
                        return ApplyOutcome::Bottom;
                    }
                }
                OctagonalShape::Unary { i, positive } => {
                    let ui = unit_literal(i, positive);
                    let integer = i < intdim;
                    if strict && !integer {
                        exact = false;
                    }
                    matrix.ensure_unary_relation(i);
                    matrix.min_assign(ui, ui ^ 1, tighten_unary(2.0 * b, integer, strict));
                    if kind == ConstraintKind::Eq {
                        matrix.min_assign(ui ^ 1, ui, tighten_unary(2.0 * a, integer, false));
                    }
                    if keep_closed && matrix.incremental_closure(i) {
                        return ApplyOutcome::Bottom;
                    }
                }
                OctagonalShape::Binary { i, positive_i, j, positive_j } => {
                    let ui = unit_literal(i, positive_i);
                    let uj = unit_literal(j, positive_j);
                    let integer = i < intdim && j < intdim;
                    if strict && !integer {
                        exact = false;
                    }
                    matrix.ensure_binary_relation(i, j);
                    matrix.min_assign(uj, ui ^ 1, tighten_binary(b, integer, strict));
                    if kind == ConstraintKind::Eq {
                        matrix.min_assign(uj ^ 1, ui, tighten_binary(a, integer, false));
                    }
                    if keep_closed && matrix.incremental_closure(i) {
                        return ApplyOutcome::Bottom;
                    }
                }
                OctagonalShape::Other => exact = false,
            }
        }
        ApplyOutcome::Applied { exact }
    }

    /// Intersection with a batch of linear constraints.
    ///
    /// Unit unary and unit binary constraints are applied exactly;
    /// other shapes, disequalities and congruences are skipped and the
    /// result is flagged inexact. A closed input is incrementally
    /// re-closed, so the result keeps a cached closure.
    pub fn meet_lincons_array(
        &mut self,
        octagon: &mut Octagon,
        constraints: &[LinCons],
    ) -> Octagon {
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let (dim, intdim) = (octagon.dim, octagon.intdim);
        let was_closed = octagon.closed.is_some();
        let Some(source) = octagon.best() else {
            return Octagon::bottom(dim, intdim);
        };
        let mut matrix = source.clone();
        match self.apply_constraints(&mut matrix, dim, intdim, was_closed, constraints) {
            ApplyOutcome::Bottom => Octagon::bottom(dim, intdim),
            ApplyOutcome::Applied { exact } => {
                if !exact || intdim > 0 {
                    self.mark_inexact();
                }
                matrix.maybe_densify();
                if was_closed {
                    Octagon::with_closed(dim, intdim, matrix)
                } else {
                    Octagon::with_unclosed(dim, intdim, matrix)
                }
            }
        }
    }

    /// Range of the given variable.
    ///
    /// # Errors
    ///
    /// Returns an error when `dimension` is out of range.
    pub fn bound_dimension(
        &mut self,
        octagon: &mut Octagon,
        dimension: usize,
    ) -> Result<Interval, OctagonError> {
        if dimension >= octagon.dim {
            return Err(OctagonError::DimensionOutOfBounds {
                dimension,
                dim: octagon.dim,
            });
        }
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let Some(matrix) = octagon.best() else {
            return Ok(Interval::bottom());
        };
        let range = variable_interval(matrix, dimension);
        if octagon.closed.is_none() || octagon.intdim > 0 {
            self.mark_inexact();
        }
        Ok(range)
    }

    /// Sound range of an interval linear expression, exact for the
    /// octagonal shapes of a closed octagon.
    pub fn bound_linexpr(&mut self, octagon: &mut Octagon, expr: &LinExpr) -> Interval {
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let shape = octagonal_shape(expr, octagon.dim, &mut self.tmp);
        let (a, b) = (self.tmp[0], self.tmp[1]);
        let Some(matrix) = octagon.best() else {
            return Interval::bottom();
        };
        let range = bound_of_shape(matrix, expr, shape, a, b);
        if octagon.closed.is_none()
            || octagon.intdim > 0
            || matches!(shape, OctagonalShape::Other)
        {
            self.mark_inexact();
        }
        range
    }

    /// The box hull: one interval per variable.
    pub fn to_box(&mut self, octagon: &mut Octagon) -> Vec<Interval> {
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let Some(matrix) = octagon.best() else {
            return vec![Interval::bottom(); octagon.dim];
        };
        let result = (0..octagon.dim).map(|v| variable_interval(matrix, v)).collect();
        // projecting onto intervals drops the relational information
        self.flags.exact = false;
        if octagon.closed.is_none() || octagon.intdim > 0 {
            self.mark_inexact();
        }
        result
    }

    /// The constraint list of the octagon.
    pub fn to_lincons_array(&mut self, octagon: &Octagon) -> Vec<LinCons> {
        self.begin(octagon.dim);
        octagon.constraints()
    }

    /// Whether the variable's range is contained in the given interval.
    pub fn sat_interval(
        &mut self,
        octagon: &mut Octagon,
        dimension: usize,
        interval: &Interval,
    ) -> bool {
        self.begin(octagon.dim);
        if dimension >= octagon.dim {
            return false;
        }
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let Some(matrix) = octagon.best() else {
            return true;
        };
        let range = variable_interval(matrix, dimension);
        if interval.contains(&range) {
            return true;
        }
        if octagon.intdim > 0 || octagon.closed.is_none() {
            self.mark_inexact();
        }
        false
    }

    /// Whether the octagon entails the given constraint.
    pub fn sat_lincons(&mut self, octagon: &mut Octagon, constraint: &LinCons) -> bool {
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        if octagon.is_bottom_raw() {
            return true;
        }
        let kind = constraint.kind();
        if matches!(kind, ConstraintKind::EqMod | ConstraintKind::DisEq) {
            return false;
        }
        let shape = octagonal_shape(constraint.expr(), octagon.dim, &mut self.tmp);
        let (mut neg, mut pos) = (self.tmp[0], self.tmp[1]);
        let Some(matrix) = octagon.best() else {
            return true;
        };
        let entailed = match shape {
            OctagonalShape::Empty => return true,
            OctagonalShape::Zero => {
                neg <= 0.0
                    && (kind != ConstraintKind::Sup || neg < 0.0)
                    && (kind != ConstraintKind::Eq || pos <= 0.0)
            }
            OctagonalShape::Unary { i, positive } => {
                let ui = unit_literal(i, positive);
                neg = 2.0 * neg + matrix.bound_or_top(ui, ui ^ 1);
                pos = 2.0 * pos + matrix.bound_or_top(ui ^ 1, ui);
                neg <= 0.0
                    && (kind != ConstraintKind::Sup || neg < 0.0)
                    && (kind != ConstraintKind::Eq || pos <= 0.0)
            }
            OctagonalShape::Binary { i, positive_i, j, positive_j } => {
                let ui = unit_literal(i, positive_i);
                let uj = unit_literal(j, positive_j);
                neg += matrix.bound_or_top(uj, ui ^ 1);
                pos += matrix.bound_or_top(uj ^ 1, ui);
                neg <= 0.0
                    && (kind != ConstraintKind::Sup || neg < 0.0)
                    && (kind != ConstraintKind::Eq || pos <= 0.0)
            }
            OctagonalShape::Other => {
                self.mark_inexact();
                return false;
            }
        };
        if entailed {
            return true;
        }
        if octagon.intdim > 0 || octagon.closed.is_none() {
            self.mark_inexact();
        }
        false
    }

    fn assign_inner(&mut self, octagon: &mut Octagon, target: usize, expr: &LinExpr) -> Octagon {
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let (dim, intdim) = (octagon.dim, octagon.intdim);
        let shape = octagonal_shape(expr, dim, &mut self.tmp);
        let (a, b) = (self.tmp[0], self.tmp[1]);
        let was_closed = octagon.closed.is_some();
        let Some(source) = octagon.best() else {
            return Octagon::bottom(dim, intdim);
        };
        if intdim > 0 {
            self.mark_inexact();
        }
        let mut matrix = source.clone();
        let emptied = match shape {
            OctagonalShape::Empty => return Octagon::bottom(dim, intdim),
            OctagonalShape::Unary { i, positive } if i == target => {
                // an invertible update of the target alone translates its
                // rows and columns and keeps the matrix closed
                if !positive {
                    matrix.negate_var(target);
                }
                matrix.translate_var(target, a, b);
                false
            }
            OctagonalShape::Unary { i, positive } => {
                let ui = unit_literal(i, positive);
                matrix.forget(target, false);
                matrix.ensure_binary_relation(target, i);
                matrix.set_bound(ui, 2 * target, b);
                matrix.set_bound(2 * target, ui, a);
                was_closed && matrix.incremental_closure(target)
            }
            OctagonalShape::Zero => {
                matrix.forget(target, false);
                pin_interval(&mut matrix, target, Interval::new(-a, b));
                was_closed && matrix.incremental_closure(target)
            }
            OctagonalShape::Binary { .. } | OctagonalShape::Other => {
                // not expressible on the target's slots; keep the sound
                // range of the expression and drop the relations
                let value = bound_of_shape(&matrix, expr, shape, a, b);
                self.mark_inexact();
                if value.is_empty() {
                    return Octagon::bottom(dim, intdim);
                }
                matrix.forget(target, false);
                pin_interval(&mut matrix, target, value);
                was_closed && matrix.incremental_closure(target)
            }
        };
        if emptied {
            return Octagon::bottom(dim, intdim);
        }
        if was_closed {
            Octagon::with_closed(dim, intdim, matrix)
        } else {
            Octagon::with_unclosed(dim, intdim, matrix)
        }
    }

    fn substitute_inner(
        &mut self,
        octagon: &mut Octagon,
        target: usize,
        expr: &LinExpr,
    ) -> Octagon {
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let (dim, intdim) = (octagon.dim, octagon.intdim);
        let shape = octagonal_shape(expr, dim, &mut self.tmp);
        let (a, b) = (self.tmp[0], self.tmp[1]);
        let was_closed = octagon.closed.is_some();
        let Some(source) = octagon.best() else {
            return Octagon::bottom(dim, intdim);
        };
        if intdim > 0 {
            self.mark_inexact();
        }
        match shape {
            OctagonalShape::Empty => Octagon::bottom(dim, intdim),
            OctagonalShape::Unary { i, positive } if i == target => {
                // the preimage of an invertible update of the target is
                // the inverse update, again a literal swap and a shift
                let mut matrix = source.clone();
                if positive {
                    matrix.translate_var(target, b, a);
                } else {
                    matrix.negate_var(target);
                    matrix.translate_var(target, a, b);
                }
                if was_closed {
                    Octagon::with_closed(dim, intdim, matrix)
                } else {
                    Octagon::with_unclosed(dim, intdim, matrix)
                }
            }
            OctagonalShape::Unary { .. } | OctagonalShape::Zero => {
                // target-free expression: meet with `target = e`, then
                // drop the target
                let equality = LinCons::eq(expr.negated().plus_term(target, 1.0));
                let mut matrix = source.clone();
                match self.apply_constraints(&mut matrix, dim, intdim, was_closed, &[equality])
                {
                    ApplyOutcome::Bottom => Octagon::bottom(dim, intdim),
                    ApplyOutcome::Applied { .. } => {
                        matrix.forget(target, false);
                        if was_closed {
                            Octagon::with_closed(dim, intdim, matrix)
                        } else {
                            Octagon::with_unclosed(dim, intdim, matrix)
                        }
                    }
                }
            }
            OctagonalShape::Binary { i, positive_i, j, positive_j }
                if i == target || j == target =>
            {
                // invertible in the target: substitute by assigning the
                // inverse expression
                let (other, positive_other, positive_target) = if i == target {
                    (j, positive_j, positive_i)
                } else {
                    (i, positive_i, positive_j)
                };
                let inverse = if positive_target {
                    LinExpr::from_constant(-Interval::new(-a, b))
                        .plus_term(target, 1.0)
                        .plus_term(other, if positive_other { -1.0 } else { 1.0 })
                } else {
                    LinExpr::from_constant(Interval::new(-a, b))
                        .plus_term(target, -1.0)
                        .plus_term(other, if positive_other { 1.0 } else { -1.0 })
                };
                self.assign_inner(octagon, target, &inverse)
            }
            OctagonalShape::Binary { .. } | OctagonalShape::Other => {
                // constrain the expression by the target's old range,
                // then drop the target
                let range = variable_interval(source, target);
                let mut matrix = source.clone();
                matrix.forget(target, false);
                let mut bounds: Vec<LinCons> = Vec::new();
                if range.sup < f64::INFINITY {
                    bounds.push(LinCons::sup_eq(
                        expr.negated().plus_constant(Interval::singleton(range.sup)),
                    ));
                }
                if range.inf > f64::NEG_INFINITY {
                    bounds.push(LinCons::sup_eq(
                        expr.clone().plus_constant(Interval::singleton(-range.inf)),
                    ));
                }
                self.mark_inexact();
                match self.apply_constraints(&mut matrix, dim, intdim, was_closed, &bounds) {
                    ApplyOutcome::Bottom => Octagon::bottom(dim, intdim),
                    ApplyOutcome::Applied { .. } => {
                        if was_closed {
                            Octagon::with_closed(dim, intdim, matrix)
                        } else {
                            Octagon::with_unclosed(dim, intdim, matrix)
                        }
                    }
                }
            }
        }
    }

    /// Assignment `X_target := e`.
    ///
    /// # Errors
    ///
    /// Returns an error when `target` is out of range.
    pub fn assign_linexpr(
        &mut self,
        octagon: &mut Octagon,
        target: usize,
        expr: &LinExpr,
    ) -> Result<Octagon, OctagonError> {
        if target >= octagon.dim {
            return Err(OctagonError::DimensionOutOfBounds {
                dimension: target,
                dim: octagon.dim,
            });
        }
        self.begin(octagon.dim);
        Ok(self.assign_inner(octagon, target, expr))
    }

    /// Substitution (backwards assignment) `X_target := e`.
    ///
    /// # Errors
    ///
    /// Returns an error when `target` is out of range.
    pub fn substitute_linexpr(
        &mut self,
        octagon: &mut Octagon,
        target: usize,
        expr: &LinExpr,
    ) -> Result<Octagon, OctagonError> {
        if target >= octagon.dim {
            return Err(OctagonError::DimensionOutOfBounds {
                dimension: target,
                dim: octagon.dim,
            });
        }
        self.begin(octagon.dim);
        Ok(self.substitute_inner(octagon, target, expr))
    }

    fn check_parallel_targets(
        targets: &[usize],
        expressions: usize,
        dim: usize,
    ) -> Result<(), OctagonError> {
        if targets.len() != expressions {
            return Err(OctagonError::ArityMismatch {
                targets: targets.len(),
                expressions,
            });
        }
        let mut seen: BitVec = BitVec::repeat(false, dim);
        for &target in targets {
            if target >= dim {
                return Err(OctagonError::DimensionOutOfBounds { dimension: target, dim });
            }
            if seen[target] {
                return Err(OctagonError::DuplicateDimensions);
            }
            seen.set(target, true);
        }
        Ok(())
    }

    /// Parallel assignment `X_targets := exprs`, exact through temporary
    /// dimensions when several targets are given.
    ///
    /// # Errors
    ///
    /// Returns an error when the arities mismatch, a target repeats or
    /// lies out of range.
    pub fn assign_linexpr_array(
        &mut self,
        octagon: &mut Octagon,
        targets: &[usize],
        exprs: &[LinExpr],
    ) -> Result<Octagon, OctagonError> {
        Self::check_parallel_targets(targets, exprs.len(), octagon.dim)?;
        self.begin(octagon.dim);
        if targets.is_empty() {
            return Ok(octagon.clone());
        }
        if targets.len() == 1 {
            return Ok(self.assign_inner(octagon, targets[0], &exprs[0]));
        }
        let dim = octagon.dim;
        let mut exact = true;
        let positions = vec![dim; targets.len()];
        let mut work = self.add_dimensions(octagon, &positions, 0)?;
        for (index, expr) in exprs.iter().enumerate() {
            work = self.assign_inner(&mut work, dim + index, expr);
            exact &= self.flags.exact;
        }
        for (index, &target) in targets.iter().enumerate() {
            let copy = LinExpr::zero().plus_term(dim + index, 1.0);
            work = self.assign_inner(&mut work, target, &copy);
            exact &= self.flags.exact;
        }
        let temporaries: Vec<usize> = (dim..dim + targets.len()).collect();
        let result = self.remove_dimensions(&mut work, &temporaries)?;
        if !exact {
            self.mark_inexact();
        }
        Ok(result)
    }

    /// Parallel substitution, the preimage of the parallel assignment.
    ///
    /// # Errors
    ///
    /// Returns an error when the arities mismatch, a target repeats or
    /// lies out of range.
    pub fn substitute_linexpr_array(
        &mut self,
        octagon: &mut Octagon,
        targets: &[usize],
        exprs: &[LinExpr],
    ) -> Result<Octagon, OctagonError> {
        Self::check_parallel_targets(targets, exprs.len(), octagon.dim)?;
        self.begin(octagon.dim);
        if targets.is_empty() {
            return Ok(octagon.clone());
        }
        if targets.len() == 1 {
            return Ok(self.substitute_inner(octagon, targets[0], &exprs[0]));
        }
        let dim = octagon.dim;
        let mut exact = true;
        let positions = vec![dim; targets.len()];
        let mut work = self.add_dimensions(octagon, &positions, 0)?;
        for (index, &target) in targets.iter().enumerate() {
            let copy = LinExpr::zero().plus_term(dim + index, 1.0);
            work = self.substitute_inner(&mut work, target, &copy);
            exact &= self.flags.exact;
        }
        for (index, expr) in exprs.iter().enumerate() {
            work = self.substitute_inner(&mut work, dim + index, expr);
            exact &= self.flags.exact;
        }
        let temporaries: Vec<usize> = (dim..dim + targets.len()).collect();
        let result = self.remove_dimensions(&mut work, &temporaries)?;
        if !exact {
            self.mark_inexact();
        }
        Ok(result)
    }
}
