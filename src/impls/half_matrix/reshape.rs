//! Dimension reshaping of half-matrices: insertion, removal and
//! permutation of variables, plus the row merge backing `fold`.

use alloc::vec::Vec;

use bitvec::vec::BitVec;

use super::{HalfMatrix, Storage, relation_is_finite, top_bounds, unary_is_finite};
use crate::impls::index::{matpos, matpos2};
use crate::impls::partition::VariablePartition;

/// Maps each old variable to its index after inserting one variable
/// before every listed position.
fn insertion_map(dim: usize, positions: &[usize]) -> Vec<usize> {
    let mut map = Vec::with_capacity(dim);
    let mut inserted = 0usize;
    for v in 0..dim {
        while inserted < positions.len() && positions[inserted] <= v {
            inserted += 1;
        }
        map.push(v + inserted);
    }
    map
}

fn mapped_literal(map: &[usize], literal: usize) -> usize {
    2 * map[literal >> 1] + (literal & 1)
}

/// Splits a sorted set of variables into its connected blocks under the
/// finite entries of `bounds`. Variables without any finite bound are
/// left out entirely.
fn split_into_blocks(bounds: &[f64], members: &[usize]) -> Vec<Vec<usize>> {
    let mut assigned: BitVec = BitVec::repeat(false, members.len());
    let mut blocks = Vec::new();
    for start in 0..members.len() {
        if assigned[start] {
            continue;
        }
        assigned.set(start, true);
        let mut block = alloc::vec![members[start]];
        let mut frontier = alloc::vec![start];
        while let Some(current) = frontier.pop() {
            for other in 0..members.len() {
                if assigned[other] {
                    continue;
                }
                if relation_is_finite(bounds, members[current], members[other]) {
                    assigned.set(other, true);
                    block.push(members[other]);
                    frontier.push(other);
                }
            }
        }
        if block.len() > 1 || unary_is_finite(bounds, block[0]) {
            block.sort_unstable();
            blocks.push(block);
        }
    }
    blocks
}

impl HalfMatrix {
    /// Inserts one fresh unconstrained variable before every listed
    /// position (sorted, repetitions allowed). Fresh variables stay out
    /// of every block. Preserves strong closure.
    #[must_use]
    pub fn with_dimensions_added(&self, positions: &[usize]) -> HalfMatrix {
        debug_assert!(positions.is_sorted(), "insertion points must be sorted");
        let new_dim = self.dim + positions.len();
        let map = insertion_map(self.dim, positions);
        let mut new_bounds = top_bounds(new_dim);
        match &self.storage {
            Storage::Dense(bounds) => {
                for i in 0..2 * self.dim {
                    for j in 0..=(i | 1) {
                        new_bounds[matpos2(mapped_literal(&map, i), mapped_literal(&map, j))] =
                            bounds[matpos(i, j)];
                    }
                }
                HalfMatrix { dim: new_dim, storage: Storage::Dense(new_bounds) }
            }
            Storage::Decomposed { bounds, partition } => {
                let mut new_partition = VariablePartition::new(new_dim);
                for component in partition.components() {
                    let vars = component.as_slice();
                    for ii in 0..2 * vars.len() {
                        let i = super::block_literal(vars, ii);
                        for jj in 0..=(ii | 1) {
                            let j = super::block_literal(vars, jj);
                            new_bounds
                                [matpos2(mapped_literal(&map, i), mapped_literal(&map, j))] =
                                bounds[matpos(i, j)];
                        }
                    }
                    let _ = new_partition.push_block(vars.iter().map(|&v| map[v]).collect());
                }
                HalfMatrix {
                    dim: new_dim,
                    storage: Storage::Decomposed { bounds: new_bounds, partition: new_partition },
                }
            }
        }
    }

    /// Removes the listed variables (sorted, duplicate-free). On a
    /// decomposed matrix each surviving block is re-split along its
    /// remaining finite entries, since a removal may disconnect it.
    /// Preserves strong closure.
    #[must_use]
    pub fn with_dimensions_removed(&self, victims: &[usize]) -> HalfMatrix {
        debug_assert!(victims.is_sorted(), "removed dimensions must be sorted");
        let new_dim = self.dim - victims.len();
        let mut map: Vec<Option<usize>> = Vec::with_capacity(self.dim);
        let mut removed = 0usize;
        for v in 0..self.dim {
            if removed < victims.len() && victims[removed] == v {
                removed += 1;
                map.push(None);
            } else {
                map.push(Some(v - removed));
            }
        }
        let mut new_bounds = top_bounds(new_dim);
        match &self.storage {
            Storage::Dense(bounds) => {
                for i in 0..2 * self.dim {
                    let Some(mi) = map[i >> 1] else { continue };
                    for j in 0..=(i | 1) {
                        let Some(mj) = map[j >> 1] else { continue };
                        new_bounds[matpos2(2 * mi + (i & 1), 2 * mj + (j & 1))] =
                            bounds[matpos(i, j)];
                    }
                }
                HalfMatrix { dim: new_dim, storage: Storage::Dense(new_bounds) }
            }
            Storage::Decomposed { bounds, partition } => {
                let mut new_partition = VariablePartition::new(new_dim);
                for component in partition.components() {
                    let vars = component.as_slice();
                    let survivors: Vec<usize> =
                        vars.iter().filter_map(|&v| map[v]).collect();
                    for ii in 0..2 * vars.len() {
                        let i = super::block_literal(vars, ii);
                        let Some(mi) = map[i >> 1] else { continue };
                        for jj in 0..=(ii | 1) {
                            let j = super::block_literal(vars, jj);
                            let Some(mj) = map[j >> 1] else { continue };
                            new_bounds[matpos2(2 * mi + (i & 1), 2 * mj + (j & 1))] =
                                bounds[matpos(i, j)];
                        }
                    }
                    for block in split_into_blocks(&new_bounds, &survivors) {
                        let _ = new_partition.push_block(block);
                    }
                }
                HalfMatrix {
                    dim: new_dim,
                    storage: Storage::Decomposed { bounds: new_bounds, partition: new_partition },
                }
            }
        }
    }

    /// The matrix with the variables renamed by the given bijection:
    /// entry `(i, j)` lands on `(π(i), π(j))`. Preserves strong closure.
    #[must_use]
    pub fn permuted(&self, permutation: &[usize]) -> HalfMatrix {
        debug_assert_eq!(permutation.len(), self.dim, "permutation length differs");
        let dim = self.dim;
        let mut new_bounds = top_bounds(dim);
        match &self.storage {
            Storage::Dense(bounds) => {
                for i in 0..2 * dim {
                    for j in 0..=(i | 1) {
                        new_bounds
                            [matpos2(mapped_literal(permutation, i), mapped_literal(permutation, j))] =
                            bounds[matpos(i, j)];
                    }
                }
                HalfMatrix { dim, storage: Storage::Dense(new_bounds) }
            }
            Storage::Decomposed { bounds, partition } => {
                for component in partition.components() {
                    let vars = component.as_slice();
                    for ii in 0..2 * vars.len() {
                        let i = super::block_literal(vars, ii);
                        for jj in 0..=(ii | 1) {
                            let j = super::block_literal(vars, jj);
                            new_bounds[matpos2(
                                mapped_literal(permutation, i),
                                mapped_literal(permutation, j),
                            )] = bounds[matpos(i, j)];
                        }
                    }
                }
                HalfMatrix {
                    dim,
                    storage: Storage::Decomposed {
                        bounds: new_bounds,
                        partition: partition.permuted(permutation),
                    },
                }
            }
        }
    }

    /// Merges the rows and columns of every listed variable into the
    /// first one by pointwise maximum, the matrix-level half of `fold`.
    /// The matrix must be dense and strongly closed; the caller removes
    /// the other listed variables afterwards.
    pub(crate) fn fold_into(&mut self, targets: &[usize]) {
        let dim = self.dim;
        let target = targets[0];
        let Storage::Dense(bounds) = &mut self.storage else {
            debug_assert!(false, "fold_into expects a dense matrix");
            return;
        };
        for &source in &targets[1..] {
            for k in 0..2 * dim {
                if targets.contains(&(k >> 1)) {
                    continue;
                }
                for s in 0..2 {
                    let into = matpos2(k, 2 * target + s);
                    let from = matpos2(k, 2 * source + s);
                    bounds[into] = bounds[into].max(bounds[from]);
                }
            }
            let into = matpos(2 * target, 2 * target + 1);
            let from = matpos(2 * source, 2 * source + 1);
            bounds[into] = bounds[into].max(bounds[from]);
            let into = matpos(2 * target + 1, 2 * target);
            let from = matpos(2 * source + 1, 2 * source);
            bounds[into] = bounds[into].max(bounds[from]);
        }
    }
}
