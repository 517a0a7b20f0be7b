//! Offsets into the half-matrix of literal bounds.
//!
//! An octagon over `n` variables is stored as a matrix over `2n` literals,
//! literal `2k` standing for `+X_k` and literal `2k+1` for `−X_k`. The
//! coherence redundancy `m[i, j] = m[j⊕1, i⊕1]` means only the triangle
//! `j ≤ i|1` has to be kept; these functions map literal pairs to offsets
//! into that triangle and are on the hot path of the closure kernels.

/// Number of stored entries of the half-matrix over `dim` variables.
#[must_use]
#[inline]
pub const fn matrix_size(dim: usize) -> usize {
    2 * dim * (dim + 1)
}

/// Offset of the entry `(i, j)`; requires `j ≤ i|1`.
#[must_use]
#[inline]
pub const fn matpos(i: usize, j: usize) -> usize {
    debug_assert!(j <= (i | 1));
    j + ((i + 1) * (i + 1)) / 2
}

/// Offset of the canonical slot of an arbitrary literal pair `(i, j)`.
///
/// Pairs outside the stored triangle are redirected to their coherence
/// partner `(j⊕1, i⊕1)`.
#[must_use]
#[inline]
pub const fn matpos2(i: usize, j: usize) -> usize {
    if j > (i | 1) { matpos(j ^ 1, i ^ 1) } else { matpos(i, j) }
}
