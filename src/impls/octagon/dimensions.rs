//! Dimension reshaping of octagon values: adding, removing and permuting
//! variables, forgetting, expansion and folding.
//!
//! Apart from expansion and folding these transformations preserve
//! strong closure, so they are applied to the closed matrix when one is
//! cached and the result keeps the closure slot it started from.

use bitvec::vec::BitVec;

use super::{Octagon, OctagonManager};
use crate::errors::OctagonError;
use crate::impls::half_matrix::HalfMatrix;

fn check_sorted_dimensions(dims: &[usize], dim: usize) -> Result<(), OctagonError> {
    for window in dims.windows(2) {
        if window[0] >= window[1] {
            return Err(OctagonError::UnsortedDimensions);
        }
    }
    if let Some(&last) = dims.last() {
        if last >= dim {
            return Err(OctagonError::DimensionOutOfBounds { dimension: last, dim });
        }
    }
    Ok(())
}

impl OctagonManager {
    /// Applies a closure-preserving matrix transformation to the best
    /// matrix available, keeping the slot it came from.
    fn reshape(
        &mut self,
        octagon: &mut Octagon,
        dim: usize,
        intdim: usize,
        transform: impl FnOnce(&HalfMatrix) -> HalfMatrix,
    ) -> Octagon {
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        if let Some(closed) = octagon.closed.as_ref() {
            Octagon::with_closed(dim, intdim, transform(closed))
        } else if let Some(mat) = octagon.mat.as_ref() {
            Octagon::with_unclosed(dim, intdim, transform(mat))
        } else {
            Octagon::bottom(dim, intdim)
        }
    }

    /// Inserts one fresh unconstrained variable before every listed
    /// position; the first `int_added` insertions are integer-typed.
    ///
    /// # Errors
    ///
    /// Returns an error when the positions are not sorted, point past the
    /// end, or `int_added` exceeds their number.
    pub fn add_dimensions(
        &mut self,
        octagon: &mut Octagon,
        positions: &[usize],
        int_added: usize,
    ) -> Result<Octagon, OctagonError> {
        if !positions.is_sorted() {
            return Err(OctagonError::UnsortedDimensions);
        }
        if let Some(&last) = positions.last() {
            if last > octagon.dim {
                return Err(OctagonError::DimensionOutOfBounds {
                    dimension: last,
                    dim: octagon.dim,
                });
            }
        }
        debug_assert!(
            int_added <= positions.len(),
            "more integer insertions than insertion points",
        );
        self.begin(octagon.dim);
        let dim = octagon.dim + positions.len();
        let intdim = octagon.intdim + int_added;
        Ok(self.reshape(octagon, dim, intdim, |matrix| {
            matrix.with_dimensions_added(positions)
        }))
    }

    /// Removes the listed variables (sorted, duplicate-free).
    ///
    /// # Errors
    ///
    /// Returns an error when the list is unsorted or out of range.
    pub fn remove_dimensions(
        &mut self,
        octagon: &mut Octagon,
        victims: &[usize],
    ) -> Result<Octagon, OctagonError> {
        check_sorted_dimensions(victims, octagon.dim)?;
        self.begin(octagon.dim);
        let removed_integers =
            victims.iter().take_while(|&&victim| victim < octagon.intdim).count();
        let dim = octagon.dim - victims.len();
        let intdim = octagon.intdim - removed_integers;
        Ok(self.reshape(octagon, dim, intdim, |matrix| {
            matrix.with_dimensions_removed(victims)
        }))
    }

    /// Renames the variables with the given bijection.
    ///
    /// # Errors
    ///
    /// Returns an error when `permutation` is not a bijection of the
    /// variables.
    pub fn permute_dimensions(
        &mut self,
        octagon: &mut Octagon,
        permutation: &[usize],
    ) -> Result<Octagon, OctagonError> {
        if permutation.len() != octagon.dim {
            return Err(OctagonError::InvalidPermutation { dim: octagon.dim });
        }
        let mut seen: BitVec = BitVec::repeat(false, octagon.dim);
        for &image in permutation {
            if image >= octagon.dim || seen[image] {
                return Err(OctagonError::InvalidPermutation { dim: octagon.dim });
            }
            seen.set(image, true);
        }
        self.begin(octagon.dim);
        let (dim, intdim) = (octagon.dim, octagon.intdim);
        Ok(self.reshape(octagon, dim, intdim, |matrix| matrix.permuted(permutation)))
    }

    /// Drops every constraint on the listed variables; with `project`
    /// each of them is instead pinned to exactly `0`.
    ///
    /// # Errors
    ///
    /// Returns an error when the list is unsorted or out of range.
    pub fn forget_array(
        &mut self,
        octagon: &mut Octagon,
        variables: &[usize],
        project: bool,
    ) -> Result<Octagon, OctagonError> {
        check_sorted_dimensions(variables, octagon.dim)?;
        self.begin(octagon.dim);
        let (dim, intdim) = (octagon.dim, octagon.intdim);
        Ok(self.reshape(octagon, dim, intdim, |matrix| {
            let mut result = matrix.clone();
            for &variable in variables {
                result.forget(variable, project);
            }
            result
        }))
    }

    /// Appends `count` fresh copies of variable `variable`: each copy
    /// carries the same constraints, while the copies and the original
    /// stay mutually unconstrained. Copies of an integer-typed variable
    /// are inserted at the end of the integer block.
    ///
    /// # Errors
    ///
    /// Returns an error when `variable` is out of range.
    pub fn expand(
        &mut self,
        octagon: &mut Octagon,
        variable: usize,
        count: usize,
    ) -> Result<Octagon, OctagonError> {
        if variable >= octagon.dim {
            return Err(OctagonError::DimensionOutOfBounds {
                dimension: variable,
                dim: octagon.dim,
            });
        }
        self.begin(octagon.dim);
        if self.auto_closure() {
            self.cache_closure(octagon);
        }
        let integer = variable < octagon.intdim;
        let position = if integer { octagon.intdim } else { octagon.dim };
        let dim = octagon.dim + count;
        let intdim = if integer { octagon.intdim + count } else { octagon.intdim };
        let Some(source) = octagon.best() else {
            return Ok(Octagon::bottom(dim, intdim));
        };
        let mut matrix = source.with_dimensions_added(&vec![position; count]);
        for copy in 0..count {
            matrix.copy_variable_relations(variable, position + copy);
        }
        if octagon.intdim > 0 {
            self.mark_inexact();
        }
        Ok(Octagon::with_unclosed(dim, intdim, matrix))
    }

    /// Collapses the listed variables (sorted, duplicate-free) into the
    /// first one by joining their constraints, then removes the others.
    ///
    /// # Errors
    ///
    /// Returns an error when the list is empty, unsorted or out of range.
    pub fn fold(
        &mut self,
        octagon: &mut Octagon,
        variables: &[usize],
    ) -> Result<Octagon, OctagonError> {
        if variables.is_empty() {
            return Err(OctagonError::EmptyFold);
        }
        check_sorted_dimensions(variables, octagon.dim)?;
        self.begin(octagon.dim);
        self.cache_closure(octagon);
        let removed_integers =
            variables[1..].iter().filter(|&&variable| variable < octagon.intdim).count();
        let dim = octagon.dim - (variables.len() - 1);
        let intdim = octagon.intdim - removed_integers;
        let Some(source) = octagon.best() else {
            return Ok(Octagon::bottom(dim, intdim));
        };
        let mut work = source.clone();
        let _ = work.convert_to_dense();
        work.fold_into(variables);
        let folded = work.with_dimensions_removed(&variables[1..]);
        if octagon.intdim > 0 {
            self.mark_inexact();
        }
        Ok(Octagon::with_closed(dim, intdim, folded))
    }
}
