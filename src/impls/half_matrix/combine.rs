//! Pointwise lattice combinators over pairs of half-matrices.
//!
//! Every combinator allocates a fresh result. When both operands are
//! decomposed the result stays decomposed: meet and narrowing work over
//! the union of the partitions, join and the widenings over their
//! common refinement, as only entries finite on both sides can stay
//! finite there. Mixed representations fall back to a dense result.

use alloc::vec::Vec;

use super::{HalfMatrix, Storage, block_is_trivial, block_literal, top_bounds};
use crate::impls::index::matpos;
use crate::impls::partition::VariablePartition;

fn fill_dense(bounds: &mut [f64], dim: usize, mut entry: impl FnMut(usize, usize) -> f64) {
    for i in 0..2 * dim {
        for j in 0..=(i | 1) {
            bounds[matpos(i, j)] = entry(i, j);
        }
    }
}

fn fill_blocks(
    bounds: &mut [f64],
    partition: &VariablePartition,
    mut entry: impl FnMut(usize, usize) -> f64,
) {
    for component in partition.components() {
        let vars = component.as_slice();
        for ii in 0..2 * vars.len() {
            let i = block_literal(vars, ii);
            for jj in 0..=(ii | 1) {
                let j = block_literal(vars, jj);
                bounds[matpos(i, j)] = entry(i, j);
            }
        }
    }
}

impl HalfMatrix {
    fn combine(
        a: &HalfMatrix,
        b: &HalfMatrix,
        partition: Option<VariablePartition>,
        mut entry: impl FnMut(f64, f64) -> f64,
    ) -> HalfMatrix {
        debug_assert_eq!(a.dim, b.dim, "matrix dimensions differ");
        let dim = a.dim;
        let mut bounds = top_bounds(dim);
        match partition {
            Some(partition) => {
                fill_blocks(&mut bounds, &partition, |i, j| {
                    entry(a.bound_or_top(i, j), b.bound_or_top(i, j))
                });
                HalfMatrix { dim, storage: Storage::Decomposed { bounds, partition } }
            }
            None => {
                fill_dense(&mut bounds, dim, |i, j| {
                    entry(a.bound_or_top(i, j), b.bound_or_top(i, j))
                });
                HalfMatrix { dim, storage: Storage::Dense(bounds) }
            }
        }
    }

    fn union_partition(a: &HalfMatrix, b: &HalfMatrix) -> Option<VariablePartition> {
        match (&a.storage, &b.storage) {
            (
                Storage::Decomposed { partition: pa, .. },
                Storage::Decomposed { partition: pb, .. },
            ) => {
                let mut partition = pa.clone();
                partition.union_with(pb);
                Some(partition)
            }
            _ => None,
        }
    }

    fn refined_partition(a: &HalfMatrix, b: &HalfMatrix) -> Option<VariablePartition> {
        match (&a.storage, &b.storage) {
            (
                Storage::Decomposed { partition: pa, .. },
                Storage::Decomposed { partition: pb, .. },
            ) => Some(pa.common_refinement(pb)),
            _ => None,
        }
    }

    /// Pointwise minimum of the bounds; the partitions are unioned.
    #[must_use]
    pub fn meet(a: &HalfMatrix, b: &HalfMatrix) -> HalfMatrix {
        let mut result = Self::combine(a, b, Self::union_partition(a, b), f64::min);
        result.maybe_densify();
        result
    }

    /// Pointwise maximum of the bounds; both operands should be strongly
    /// closed. The partition of the result is the common refinement,
    /// pruned of blocks left without any finite entry.
    #[must_use]
    pub fn join(a: &HalfMatrix, b: &HalfMatrix) -> HalfMatrix {
        let mut result = Self::combine(a, b, Self::refined_partition(a, b), f64::max);
        result.prune_trivial();
        result
    }

    /// Keeps the bounds the right side did not grow past and drops the
    /// rest to `+∞`; the left side must be included in the right one.
    #[must_use]
    pub fn widening(a: &HalfMatrix, b: &HalfMatrix) -> HalfMatrix {
        let mut result = Self::combine(a, b, Self::refined_partition(a, b), |ra, rb| {
            if rb > ra { f64::INFINITY } else { ra }
        });
        result.prune_trivial();
        result
    }

    /// Like [`HalfMatrix::widening`], but grown bounds climb the given
    /// ascending threshold ladder before jumping to `+∞`.
    #[must_use]
    pub fn widening_thresholds(
        a: &HalfMatrix,
        b: &HalfMatrix,
        thresholds: &[f64],
    ) -> HalfMatrix {
        let mut result = Self::combine(a, b, Self::refined_partition(a, b), |ra, rb| {
            if rb > ra {
                thresholds.iter().copied().find(|&t| rb <= t).unwrap_or(f64::INFINITY)
            } else {
                ra
            }
        });
        result.prune_trivial();
        result
    }

    /// Refills only the bounds the left side left unconstrained from the
    /// right side; the partitions are unioned.
    #[must_use]
    pub fn narrowing(a: &HalfMatrix, b: &HalfMatrix) -> HalfMatrix {
        Self::combine(a, b, Self::union_partition(a, b), |ra, rb| {
            if ra == f64::INFINITY { rb } else { ra }
        })
    }

    /// Detaches every block whose entries are all trivial.
    pub(crate) fn prune_trivial(&mut self) {
        let Storage::Decomposed { bounds, partition } = &mut self.storage else {
            return;
        };
        let mut dropped: Vec<usize> = Vec::new();
        for component in partition.components() {
            if block_is_trivial(bounds, component.as_slice()) {
                dropped.extend(component.iter());
            }
        }
        for variable in dropped {
            partition.detach(variable);
        }
    }
}
