//! Lattice operators over octagon values.
//!
//! Binary operators work on the best matrix available on each side and
//! leave their result in the unclosed slot: callers re-close lazily
//! through the manager's closure cache. Join and the widenings close
//! their operands first, as their precision (and the widening contract)
//! depends on it.

use super::{Octagon, OctagonManager};
use crate::errors::OctagonError;
use crate::impls::half_matrix::HalfMatrix;

fn check_dimensions(lhs: &Octagon, rhs: &Octagon) -> Result<(), OctagonError> {
    if lhs.dim != rhs.dim || lhs.intdim != rhs.intdim {
        return Err(OctagonError::DimensionMismatch { left: lhs.dim, right: rhs.dim });
    }
    Ok(())
}

impl OctagonManager {
    /// Intersection of the two octagons.
    ///
    /// # Errors
    ///
    /// Returns an error when the operands disagree on their dimensions.
    pub fn meet(&mut self, lhs: &Octagon, rhs: &Octagon) -> Result<Octagon, OctagonError> {
        check_dimensions(lhs, rhs)?;
        self.begin(lhs.dim);
        let (Some(left), Some(right)) = (lhs.best(), rhs.best()) else {
            return Ok(Octagon::bottom(lhs.dim, lhs.intdim));
        };
        Ok(Octagon::with_unclosed(lhs.dim, lhs.intdim, HalfMatrix::meet(left, right)))
    }

    /// Union (convex hull within the domain) of the two octagons.
    ///
    /// # Errors
    ///
    /// Returns an error when the operands disagree on their dimensions.
    pub fn join(&mut self, lhs: &mut Octagon, rhs: &mut Octagon) -> Result<Octagon, OctagonError> {
        check_dimensions(lhs, rhs)?;
        self.begin(lhs.dim);
        self.cache_closure(lhs);
        self.cache_closure(rhs);
        if lhs.intdim > 0 {
            // the hull of two integer octagons need not be the tightest
            self.mark_inexact();
        }
        match (lhs.is_bottom_raw(), rhs.is_bottom_raw()) {
            (true, _) => Ok(rhs.clone()),
            (false, true) => Ok(lhs.clone()),
            (false, false) => {
                let (Some(left), Some(right)) = (lhs.best(), rhs.best()) else {
                    return Ok(Octagon::bottom(lhs.dim, lhs.intdim));
                };
                Ok(Octagon::with_unclosed(lhs.dim, lhs.intdim, HalfMatrix::join(left, right)))
            }
        }
    }

    /// Widening: bounds the right side grew past are dropped to `+∞`.
    /// The left side is expected to be included in the right one.
    ///
    /// # Errors
    ///
    /// Returns an error when the operands disagree on their dimensions.
    pub fn widening(&mut self, lhs: &Octagon, rhs: &mut Octagon) -> Result<Octagon, OctagonError> {
        check_dimensions(lhs, rhs)?;
        self.begin(lhs.dim);
        self.cache_closure(rhs);
        self.widening_on(lhs, rhs, HalfMatrix::widening)
    }

    /// Widening climbing the given ascending threshold ladder before
    /// jumping to `+∞`.
    ///
    /// # Errors
    ///
    /// Returns an error when the operands disagree on their dimensions or
    /// the thresholds are not sorted in ascending order.
    pub fn widening_thresholds(
        &mut self,
        lhs: &Octagon,
        rhs: &mut Octagon,
        thresholds: &[f64],
    ) -> Result<Octagon, OctagonError> {
        check_dimensions(lhs, rhs)?;
        if !thresholds.is_sorted() {
            return Err(OctagonError::UnsortedThresholds);
        }
        self.begin(lhs.dim);
        self.cache_closure(rhs);
        self.widening_on(lhs, rhs, |left, right| {
            HalfMatrix::widening_thresholds(left, right, thresholds)
        })
    }

    fn widening_on(
        &mut self,
        lhs: &Octagon,
        rhs: &Octagon,
        widen: impl FnOnce(&HalfMatrix, &HalfMatrix) -> HalfMatrix,
    ) -> Result<Octagon, OctagonError> {
        match (lhs.is_bottom_raw(), rhs.is_bottom_raw()) {
            (true, _) => Ok(rhs.clone()),
            (false, true) => Ok(lhs.clone()),
            (false, false) => {
                let (Some(left), Some(right)) = (lhs.best(), rhs.best()) else {
                    return Ok(Octagon::bottom(lhs.dim, lhs.intdim));
                };
                Ok(Octagon::with_unclosed(lhs.dim, lhs.intdim, widen(left, right)))
            }
        }
    }

    /// Narrowing: bounds the left side left unconstrained are refilled
    /// from the right side.
    ///
    /// # Errors
    ///
    /// Returns an error when the operands disagree on their dimensions.
    pub fn narrowing(
        &mut self,
        lhs: &Octagon,
        rhs: &mut Octagon,
    ) -> Result<Octagon, OctagonError> {
        check_dimensions(lhs, rhs)?;
        self.begin(lhs.dim);
        self.cache_closure(rhs);
        if lhs.is_bottom_raw() || rhs.is_bottom_raw() {
            return Ok(Octagon::bottom(lhs.dim, lhs.intdim));
        }
        let (Some(left), Some(right)) = (lhs.best(), rhs.best()) else {
            return Ok(Octagon::bottom(lhs.dim, lhs.intdim));
        };
        Ok(Octagon::with_unclosed(lhs.dim, lhs.intdim, HalfMatrix::narrowing(left, right)))
    }
}
