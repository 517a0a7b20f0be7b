//! Half-matrix storage of octagonal bounds.
//!
//! Entry `(i, j)` of the conceptual `2n × 2n` matrix stores the tightest
//! known upper bound of `lit(j) − lit(i)`, so `m[2v, 2v+1]` bounds `−2X_v`
//! and `m[2v+1, 2v]` bounds `2X_v`. Coherence (`m[i, j] = m[j⊕1, i⊕1]`)
//! halves the storage: only slots with `j ≤ i|1` exist, and
//! [`matpos2`](crate::impls::index::matpos2) redirects the rest.
//!
//! The matrix is either dense or decomposed. A decomposed matrix carries a
//! [`VariablePartition`] and only the entries inside its blocks are
//! meaningful; everything else is stale and is read through
//! [`HalfMatrix::bound_or_top`], which substitutes the trivial bound.

mod combine;
mod reshape;

use alloc::vec::Vec;

use super::closure;
use crate::impls::index::{matpos, matpos2, matrix_size};
use crate::impls::partition::VariablePartition;

/// Storage backing a [`HalfMatrix`].
#[derive(Debug, Clone)]
enum Storage {
    /// Every pair of literals may carry a finite bound.
    Dense(Vec<f64>),
    /// Finite bounds only occur inside the blocks of the partition.
    Decomposed {
        /// The shared bound buffer; entries outside the blocks are stale.
        bounds: Vec<f64>,
        /// Blocks of jointly constrained variables.
        partition: VariablePartition,
    },
}

/// Upper-triangular coherent matrix of octagonal bounds over `2·dim`
/// literals.
#[derive(Debug, Clone)]
pub struct HalfMatrix {
    dim: usize,
    storage: Storage,
}

fn top_bounds(dim: usize) -> Vec<f64> {
    let mut bounds = vec![f64::INFINITY; matrix_size(dim)];
    for i in 0..2 * dim {
        bounds[matpos(i, i)] = 0.0;
    }
    bounds
}

/// Resets the four entries relating variables `i` and `j` to the trivial
/// bounds, making them safe to read after the pair enters a block.
fn init_relation(bounds: &mut [f64], i: usize, j: usize) {
    let ind1 = matpos2(2 * i, 2 * j);
    let ind2 = matpos2(2 * i + 1, 2 * j + 1);
    if i == j {
        bounds[ind1] = 0.0;
        bounds[ind2] = 0.0;
    } else {
        bounds[ind1] = f64::INFINITY;
        bounds[ind2] = f64::INFINITY;
    }
    bounds[matpos2(2 * i, 2 * j + 1)] = f64::INFINITY;
    bounds[matpos2(2 * i + 1, 2 * j)] = f64::INFINITY;
}

/// Whether the four entries relating `i` and `j` carry no information.
fn trivial_relation(bounds: &[f64], i: usize, j: usize) -> bool {
    let ind1 = matpos2(2 * i, 2 * j);
    let ind2 = matpos2(2 * i + 1, 2 * j + 1);
    if i == j {
        if bounds[ind1] != 0.0 || bounds[ind2] != 0.0 {
            return false;
        }
    } else if bounds[ind1] != f64::INFINITY || bounds[ind2] != f64::INFINITY {
        return false;
    }
    bounds[matpos2(2 * i, 2 * j + 1)] == f64::INFINITY
        && bounds[matpos2(2 * i + 1, 2 * j)] == f64::INFINITY
}

fn block_is_trivial(bounds: &[f64], vars: &[usize]) -> bool {
    for (position, &vi) in vars.iter().enumerate() {
        for &vj in &vars[..position] {
            if !trivial_relation(bounds, vi, vj) {
                return false;
            }
        }
        if !trivial_relation(bounds, vi, vi) {
            return false;
        }
    }
    true
}

/// Whether any of the four entries relating distinct variables `i` and
/// `j` carries a finite bound.
fn relation_is_finite(bounds: &[f64], i: usize, j: usize) -> bool {
    bounds[matpos2(2 * i, 2 * j)] != f64::INFINITY
        || bounds[matpos2(2 * i + 1, 2 * j + 1)] != f64::INFINITY
        || bounds[matpos2(2 * i, 2 * j + 1)] != f64::INFINITY
        || bounds[matpos2(2 * i + 1, 2 * j)] != f64::INFINITY
}

fn unary_is_finite(bounds: &[f64], v: usize) -> bool {
    bounds[matpos(2 * v, 2 * v + 1)] != f64::INFINITY
        || bounds[matpos(2 * v + 1, 2 * v)] != f64::INFINITY
}

impl HalfMatrix {
    /// The unconstrained matrix over `dim` variables, in decomposed form
    /// with an empty partition.
    #[must_use]
    pub fn top(dim: usize) -> Self {
        Self {
            dim,
            storage: Storage::Decomposed {
                bounds: top_bounds(dim),
                partition: VariablePartition::new(dim),
            },
        }
    }

    /// The unconstrained matrix over `dim` variables, in dense form.
    #[must_use]
    pub fn dense_top(dim: usize) -> Self {
        Self { dim, storage: Storage::Dense(top_bounds(dim)) }
    }

    /// Number of variables the matrix ranges over.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Whether the matrix is in dense form.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        matches!(self.storage, Storage::Dense(_))
    }

    /// The partition of a decomposed matrix.
    #[must_use]
    pub fn partition(&self) -> Option<&VariablePartition> {
        match &self.storage {
            Storage::Dense(_) => None,
            Storage::Decomposed { partition, .. } => Some(partition),
        }
    }

    pub(crate) fn bounds(&self) -> &[f64] {
        match &self.storage {
            Storage::Dense(bounds) | Storage::Decomposed { bounds, .. } => bounds,
        }
    }

    pub(crate) fn bounds_mut(&mut self) -> &mut [f64] {
        match &mut self.storage {
            Storage::Dense(bounds) | Storage::Decomposed { bounds, .. } => bounds,
        }
    }

    /// Raw read of the canonical slot of `(i, j)`.
    ///
    /// On a decomposed matrix the slot is only meaningful when the two
    /// variables share a block; use [`HalfMatrix::bound_or_top`] when that
    /// is not known to hold.
    #[must_use]
    pub fn bound_at(&self, i: usize, j: usize) -> f64 {
        self.bounds()[matpos2(i, j)]
    }

    /// Writes the canonical slot of `(i, j)`.
    ///
    /// On a decomposed matrix the caller is responsible for the two
    /// variables sharing a block.
    pub fn set_bound(&mut self, i: usize, j: usize, value: f64) {
        self.bounds_mut()[matpos2(i, j)] = value;
    }

    pub(crate) fn min_assign(&mut self, i: usize, j: usize, value: f64) {
        let index = matpos2(i, j);
        let bounds = self.bounds_mut();
        bounds[index] = bounds[index].min(value);
    }

    /// Partition-aware read: stale entries of a decomposed matrix read as
    /// the trivial bound (`0` on the diagonal, `+∞` elsewhere).
    #[must_use]
    pub fn bound_or_top(&self, i: usize, j: usize) -> f64 {
        match &self.storage {
            Storage::Dense(bounds) => bounds[matpos2(i, j)],
            Storage::Decomposed { bounds, partition } => {
                if i == j {
                    return 0.0;
                }
                let (vi, vj) = (i >> 1, j >> 1);
                let meaningful = if vi == vj {
                    partition.contains(vi)
                } else {
                    partition.is_connected(vi, vj)
                };
                if meaningful { bounds[matpos2(i, j)] } else { f64::INFINITY }
            }
        }
    }

    /// Whether the matrix carries no constraint at all.
    #[must_use]
    pub fn is_top(&self) -> bool {
        let dim = self.dim;
        match &self.storage {
            Storage::Dense(bounds) => {
                for i in 0..2 * dim {
                    for j in 0..=(i | 1) {
                        let value = bounds[matpos(i, j)];
                        if i == j {
                            if value != 0.0 {
                                return false;
                            }
                        } else if value != f64::INFINITY {
                            return false;
                        }
                    }
                }
                true
            }
            Storage::Decomposed { bounds, partition } => partition
                .components()
                .all(|component| block_is_trivial(bounds, component.as_slice())),
        }
    }

    /// Entry-wise inclusion test; the receiver should be strongly closed
    /// for the test to be conclusive.
    #[must_use]
    pub fn is_leq(&self, other: &HalfMatrix) -> bool {
        debug_assert_eq!(self.dim, other.dim, "matrix dimensions differ");
        let dim = self.dim;
        match &other.storage {
            Storage::Dense(theirs) => {
                for i in 0..2 * dim {
                    for j in 0..=(i | 1) {
                        if self.bound_or_top(i, j) > theirs[matpos(i, j)] {
                            return false;
                        }
                    }
                }
                true
            }
            Storage::Decomposed { bounds, partition } => {
                for component in partition.components() {
                    let vars = component.as_slice();
                    for ii in 0..2 * vars.len() {
                        let i = block_literal(vars, ii);
                        for jj in 0..=(ii | 1) {
                            let j = block_literal(vars, jj);
                            if self.bound_or_top(i, j) > bounds[matpos(i, j)] {
                                return false;
                            }
                        }
                    }
                }
                true
            }
        }
    }

    /// Entry-wise equality over the union of the two partitions; both
    /// sides should be strongly closed for the test to be conclusive.
    #[must_use]
    pub fn is_eq(&self, other: &HalfMatrix) -> bool {
        debug_assert_eq!(self.dim, other.dim, "matrix dimensions differ");
        match (&self.storage, &other.storage) {
            (Storage::Dense(mine), Storage::Dense(theirs)) => mine == theirs,
            _ => self.entries_match(other) && other.entries_match(self),
        }
    }

    /// Whether every meaningful entry of `self` equals `other`'s view of
    /// the same slot.
    fn entries_match(&self, other: &HalfMatrix) -> bool {
        let dim = self.dim;
        match &self.storage {
            Storage::Dense(bounds) => {
                for i in 0..2 * dim {
                    for j in 0..=(i | 1) {
                        if bounds[matpos(i, j)] != other.bound_or_top(i, j) {
                            return false;
                        }
                    }
                }
                true
            }
            Storage::Decomposed { bounds, partition } => {
                for component in partition.components() {
                    let vars = component.as_slice();
                    for ii in 0..2 * vars.len() {
                        let i = block_literal(vars, ii);
                        for jj in 0..=(ii | 1) {
                            let j = block_literal(vars, jj);
                            if bounds[matpos(i, j)] != other.bound_or_top(i, j) {
                                return false;
                            }
                        }
                    }
                }
                true
            }
        }
    }

    /// Drops every constraint on variable `d`. With `project` the variable
    /// is additionally pinned to exactly `0`. Preserves strong closure.
    pub fn forget(&mut self, d: usize, project: bool) {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => {
                for k in 0..2 * dim {
                    if k >> 1 == d {
                        continue;
                    }
                    bounds[matpos2(k, 2 * d)] = f64::INFINITY;
                    bounds[matpos2(k, 2 * d + 1)] = f64::INFINITY;
                }
                let pinned = if project { 0.0 } else { f64::INFINITY };
                bounds[matpos(2 * d, 2 * d + 1)] = pinned;
                bounds[matpos(2 * d + 1, 2 * d)] = pinned;
            }
            Storage::Decomposed { bounds, partition } => {
                if let Some(id) = partition.find(d) {
                    for w in partition.component(id).clone().iter() {
                        if w == d {
                            continue;
                        }
                        init_relation(bounds, w, d);
                    }
                    partition.detach(d);
                }
                if project {
                    init_relation(bounds, d, d);
                    bounds[matpos(2 * d, 2 * d + 1)] = 0.0;
                    bounds[matpos(2 * d + 1, 2 * d)] = 0.0;
                    let _ = partition.singleton(d);
                }
            }
        }
    }

    /// Ensures variable `v` belongs to a block so its unary slots can be
    /// written.
    pub(crate) fn ensure_unary_relation(&mut self, v: usize) {
        if let Storage::Decomposed { bounds, partition } = &mut self.storage {
            if !partition.contains(v) {
                init_relation(bounds, v, v);
                let _ = partition.singleton(v);
            }
        }
    }

    /// Ensures variables `i` and `j` share a block, initialising every
    /// freshly exposed slot to the trivial bound.
    pub(crate) fn ensure_binary_relation(&mut self, i: usize, j: usize) {
        if i == j {
            self.ensure_unary_relation(i);
            return;
        }
        let Storage::Decomposed { bounds, partition } = &mut self.storage else {
            return;
        };
        match (partition.find(i), partition.find(j)) {
            (None, None) => {
                init_relation(bounds, i, i);
                init_relation(bounds, j, j);
                init_relation(bounds, i, j);
                let id = partition.singleton(i);
                partition.insert(j, id);
            }
            (None, Some(cj)) => {
                init_relation(bounds, i, i);
                for w in partition.component(cj).iter() {
                    init_relation(bounds, w, i);
                }
                partition.insert(i, cj);
            }
            (Some(ci), None) => {
                init_relation(bounds, j, j);
                for w in partition.component(ci).iter() {
                    init_relation(bounds, w, j);
                }
                partition.insert(j, ci);
            }
            (Some(ci), Some(cj)) => {
                if ci != cj {
                    for wi in partition.component(ci).iter() {
                        for wj in partition.component(cj).iter() {
                            init_relation(bounds, wi, wj);
                        }
                    }
                    let _ = partition.merge(ci, cj);
                }
            }
        }
    }

    /// Materialises every stale entry and switches to the dense form,
    /// returning the retired partition for callers that want to keep it.
    pub fn convert_to_dense(&mut self) -> Option<VariablePartition> {
        if self.is_dense() {
            return None;
        }
        let storage = core::mem::replace(&mut self.storage, Storage::Dense(Vec::new()));
        let Storage::Decomposed { mut bounds, partition } = storage else {
            unreachable!("the dense case returned above");
        };
        for vi in 0..self.dim {
            for vj in 0..=vi {
                let meaningful = if vi == vj {
                    partition.contains(vi)
                } else {
                    partition.is_connected(vi, vj)
                };
                if !meaningful {
                    init_relation(&mut bounds, vi, vj);
                }
            }
        }
        self.storage = Storage::Dense(bounds);
        Some(partition)
    }

    /// Switches a dense matrix to the decomposed form, detecting the
    /// blocks from its finite entries.
    pub fn refine_to_decomposed(&mut self) {
        if !self.is_dense() {
            return;
        }
        let partition = self.detect_components();
        let storage = core::mem::replace(&mut self.storage, Storage::Dense(Vec::new()));
        let Storage::Dense(bounds) = storage else {
            unreachable!("the decomposed case returned above");
        };
        self.storage = Storage::Decomposed { bounds, partition };
    }

    /// Rebuilds the partition implied by the finite entries of the
    /// matrix: variables linked by a finite bound share a block,
    /// variables with a finite unary bound get at least a singleton.
    #[must_use]
    pub fn detect_components(&self) -> VariablePartition {
        let dim = self.dim;
        let mut result = VariablePartition::new(dim);
        match &self.storage {
            Storage::Dense(bounds) => {
                for vi in 0..dim {
                    for vj in 0..vi {
                        if relation_is_finite(bounds, vi, vj) {
                            let _ = result.merge_containing(vi, vj);
                        }
                    }
                    if unary_is_finite(bounds, vi) {
                        let _ = result.ensure(vi);
                    }
                }
            }
            Storage::Decomposed { bounds, partition } => {
                for component in partition.components() {
                    let vars = component.as_slice();
                    for (position, &vi) in vars.iter().enumerate() {
                        for &vj in &vars[..position] {
                            if relation_is_finite(bounds, vi, vj) {
                                let _ = result.merge_containing(vi, vj);
                            }
                        }
                        if unary_is_finite(bounds, vi) {
                            let _ = result.ensure(vi);
                        }
                    }
                }
            }
        }
        result
    }

    /// Converts to dense form once the blocks cover enough of the matrix
    /// that the decomposed bookkeeping stops paying off.
    pub(crate) fn maybe_densify(&mut self) {
        let should = match &self.storage {
            Storage::Dense(_) => false,
            Storage::Decomposed { partition, .. } => {
                let covered: usize = partition
                    .components()
                    .map(|component| component.len() * (component.len() + 1))
                    .sum();
                2 * covered >= self.dim * (self.dim + 1)
            }
        };
        if should {
            let _ = self.convert_to_dense();
        }
    }

    /// Replaces the matrix with its strong closure, block by block on a
    /// decomposed matrix. Returns `true` when the constraint set turned
    /// out unsatisfiable, in which case the contents are meaningless.
    pub fn strong_closure(&mut self) -> bool {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => closure::close_full(bounds, dim),
            Storage::Decomposed { bounds, partition } => {
                for component in partition.components() {
                    if closure::close_block(bounds, component.as_slice()) {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Restores strong closure after the rows and columns of `variable`
    /// were tightened on an otherwise closed matrix. On a decomposed
    /// matrix every block that gained a bound towards `variable` must
    /// already have been merged into its block. Returns `true` when the
    /// constraint set turned out unsatisfiable.
    pub fn incremental_closure(&mut self, variable: usize) -> bool {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => closure::close_incremental_full(bounds, dim, variable),
            Storage::Decomposed { bounds, partition } => match partition.find(variable) {
                Some(id) => closure::close_incremental_block(
                    bounds,
                    partition.component(id).as_slice(),
                    variable,
                ),
                None => false,
            },
        }
    }

    /// Shifts variable `d` by the interval `[−a, b]`, the image of the
    /// assignment `X_d := X_d + [−a, b]`. Preserves strong closure.
    pub(crate) fn translate_var(&mut self, d: usize, a: f64, b: f64) {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => {
                for w in 0..dim {
                    translate_cross_entries(bounds, d, w, a, b);
                }
                translate_unary_entries(bounds, d, a, b);
            }
            Storage::Decomposed { bounds, partition } => {
                if let Some(id) = partition.find(d) {
                    for w in partition.component(id).iter() {
                        translate_cross_entries(bounds, d, w, a, b);
                    }
                    translate_unary_entries(bounds, d, a, b);
                }
            }
        }
    }

    /// Swaps the roles of the two literals of `d`, the image of the
    /// assignment `X_d := −X_d`. Preserves strong closure.
    pub(crate) fn negate_var(&mut self, d: usize) {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => {
                for w in 0..dim {
                    negate_cross_entries(bounds, d, w);
                }
                bounds.swap(matpos(2 * d, 2 * d + 1), matpos(2 * d + 1, 2 * d));
            }
            Storage::Decomposed { bounds, partition } => {
                if let Some(id) = partition.find(d) {
                    for w in partition.component(id).iter() {
                        negate_cross_entries(bounds, d, w);
                    }
                    bounds.swap(matpos(2 * d, 2 * d + 1), matpos(2 * d + 1, 2 * d));
                }
            }
        }
    }

    /// Gives the (previously unconstrained) variable `dst` the same
    /// constraints as `src`, leaving the two mutually unconstrained.
    pub(crate) fn copy_variable_relations(&mut self, src: usize, dst: usize) {
        let dim = self.dim;
        match &mut self.storage {
            Storage::Dense(bounds) => {
                for k in 0..2 * dim {
                    if k >> 1 == src || k >> 1 == dst {
                        continue;
                    }
                    bounds[matpos2(k, 2 * dst)] = bounds[matpos2(k, 2 * src)];
                    bounds[matpos2(k, 2 * dst + 1)] = bounds[matpos2(k, 2 * src + 1)];
                }
                bounds[matpos(2 * dst, 2 * dst + 1)] = bounds[matpos(2 * src, 2 * src + 1)];
                bounds[matpos(2 * dst + 1, 2 * dst)] = bounds[matpos(2 * src + 1, 2 * src)];
            }
            Storage::Decomposed { bounds, partition } => {
                let Some(id) = partition.find(src) else {
                    return;
                };
                let members = partition.component(id).clone();
                for w in &members {
                    init_relation(bounds, w, dst);
                }
                init_relation(bounds, dst, dst);
                for w in &members {
                    if w == src {
                        continue;
                    }
                    for s in 0..2 {
                        for t in 0..2 {
                            bounds[matpos2(2 * w + s, 2 * dst + t)] =
                                bounds[matpos2(2 * w + s, 2 * src + t)];
                        }
                    }
                }
                bounds[matpos(2 * dst, 2 * dst + 1)] = bounds[matpos(2 * src, 2 * src + 1)];
                bounds[matpos(2 * dst + 1, 2 * dst)] = bounds[matpos(2 * src + 1, 2 * src)];
                partition.insert(dst, id);
            }
        }
    }
}

/// Literal at `position` within the literal sequence of a sorted block.
pub(crate) fn block_literal(vars: &[usize], position: usize) -> usize {
    2 * vars[position >> 1] + (position & 1)
}

fn translate_cross_entries(bounds: &mut [f64], d: usize, w: usize, a: f64, b: f64) {
    if w == d {
        return;
    }
    for lit in [2 * w, 2 * w + 1] {
        let upper = matpos2(lit, 2 * d);
        bounds[upper] += b;
        let lower = matpos2(lit, 2 * d + 1);
        bounds[lower] += a;
    }
}

fn translate_unary_entries(bounds: &mut [f64], d: usize, a: f64, b: f64) {
    bounds[matpos(2 * d, 2 * d + 1)] += 2.0 * a;
    bounds[matpos(2 * d + 1, 2 * d)] += 2.0 * b;
}

fn negate_cross_entries(bounds: &mut [f64], d: usize, w: usize) {
    if w == d {
        return;
    }
    for lit in [2 * w, 2 * w + 1] {
        bounds.swap(matpos2(lit, 2 * d), matpos2(lit, 2 * d + 1));
    }
}
