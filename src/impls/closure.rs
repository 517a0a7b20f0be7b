//! Strong and incremental closure kernels.
//!
//! Strong closure is the normal form every other operation relies on: a
//! Floyd–Warshall shortest-path pass over the literal graph, interleaved
//! with the octagonal strengthening step `m[i, j] ← min(m[i, j],
//! (m[i, i⊕1] + m[j⊕1, j]) / 2)` after each variable, and an emptiness
//! check on the diagonal. The kernel is written once over a block of
//! variables and a generic [`Bound`]; the dense entry point runs it over
//! all variables, the decomposed one per partition block.

use alloc::vec::Vec;

use super::half_matrix::block_literal;
use crate::impls::index::{matpos, matpos2};
use crate::traits::Bound;

/// Propagates every path through the pivot literal `k`.
fn shortest_path_step<B: Bound>(m: &mut [B], vars: &[usize], k: usize) {
    let literals = 2 * vars.len();
    for ii in 0..literals {
        let i = block_literal(vars, ii);
        let ik = m[matpos2(i, k)];
        if ik.is_unbounded() {
            continue;
        }
        for jj in 0..=(ii | 1) {
            let j = block_literal(vars, jj);
            let kj = m[matpos2(k, j)];
            let index = matpos(i, j);
            m[index] = m[index].tighten(ik.sum(kj));
        }
    }
}

/// Tightens every entry against the unary bounds of its two variables.
fn strengthening_step<B: Bound>(m: &mut [B], vars: &[usize]) {
    let literals = 2 * vars.len();
    for ii in 0..literals {
        let i = block_literal(vars, ii);
        let ti = m[matpos(i, i ^ 1)];
        if ti.is_unbounded() {
            continue;
        }
        for jj in 0..=(ii | 1) {
            let j = block_literal(vars, jj);
            let tj = m[matpos(j ^ 1, j)];
            let index = matpos(i, j);
            m[index] = m[index].tighten(ti.sum(tj).halved());
        }
    }
}

fn has_negative_diagonal<B: Bound>(m: &[B], vars: &[usize]) -> bool {
    vars.iter().any(|&v| {
        m[matpos(2 * v, 2 * v)] < B::zero() || m[matpos(2 * v + 1, 2 * v + 1)] < B::zero()
    })
}

fn zero_diagonal<B: Bound>(m: &mut [B], vars: &[usize]) {
    for &v in vars {
        m[matpos(2 * v, 2 * v)] = B::zero();
        m[matpos(2 * v + 1, 2 * v + 1)] = B::zero();
    }
}

/// Strong closure of the entries relating the given sorted block of
/// variables. Returns `true` when the constraints are unsatisfiable.
pub(crate) fn close_block<B: Bound>(m: &mut [B], vars: &[usize]) -> bool {
    for &pivot_var in vars {
        shortest_path_step(m, vars, 2 * pivot_var);
        shortest_path_step(m, vars, 2 * pivot_var + 1);
        strengthening_step(m, vars);
        if has_negative_diagonal(m, vars) {
            return true;
        }
    }
    zero_diagonal(m, vars);
    false
}

/// Strong closure of a dense matrix over `dim` variables.
pub(crate) fn close_full<B: Bound>(m: &mut [B], dim: usize) -> bool {
    let vars: Vec<usize> = (0..dim).collect();
    close_block(m, &vars)
}

/// Incremental closure of a block after the rows and columns of
/// `variable` were tightened on an otherwise strongly closed matrix.
///
/// The modified rows and columns are first tightened against the closed
/// remainder (any shortest path ending in a literal of `variable` has a
/// closed prefix), then the two pivots of `variable` propagate the new
/// bounds everywhere, and one strengthening sweep restores the octagonal
/// tightening. Runs in `O(k²)` for a block of `k` variables.
pub(crate) fn close_incremental_block<B: Bound>(
    m: &mut [B],
    vars: &[usize],
    variable: usize,
) -> bool {
    let literals = 2 * vars.len();
    for target in [2 * variable, 2 * variable + 1] {
        for ii in 0..literals {
            let i = block_literal(vars, ii);
            for kk in 0..literals {
                let k = block_literal(vars, kk);
                let into = matpos2(i, target);
                m[into] = m[into].tighten(m[matpos2(i, k)].sum(m[matpos2(k, target)]));
                let from = matpos2(target, i);
                m[from] = m[from].tighten(m[matpos2(target, k)].sum(m[matpos2(k, i)]));
            }
        }
    }
    shortest_path_step(m, vars, 2 * variable);
    shortest_path_step(m, vars, 2 * variable + 1);
    strengthening_step(m, vars);
    if has_negative_diagonal(m, vars) {
        return true;
    }
    zero_diagonal(m, vars);
    false
}

/// Incremental closure of a dense matrix over `dim` variables.
pub(crate) fn close_incremental_full<B: Bound>(m: &mut [B], dim: usize, variable: usize) -> bool {
    let vars: Vec<usize> = (0..dim).collect();
    close_incremental_block(m, &vars, variable)
}
