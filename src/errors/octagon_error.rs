//! Errors that may occur when shaping or combining octagon values.

/// Error enumeration for octagon operations.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum OctagonError {
    /// The two operands do not agree on their dimensions.
    #[error("the operands have incompatible dimensions ({left} vs {right})")]
    DimensionMismatch {
        /// Number of variables of the left operand.
        left: usize,
        /// Number of variables of the right operand.
        right: usize,
    },
    /// A variable index lies outside the octagon.
    #[error("dimension {dimension} is out of range for an octagon over {dim} variables")]
    DimensionOutOfBounds {
        /// The offending variable index.
        dimension: usize,
        /// Number of variables of the octagon.
        dim: usize,
    },
    /// The provided permutation is not a bijection of the variables.
    #[error("the permutation is not a bijection over {dim} variables")]
    InvalidPermutation {
        /// Number of variables of the octagon.
        dim: usize,
    },
    /// A dimension list that must be sorted and duplicate-free is not.
    #[error("the dimension list must be strictly increasing")]
    UnsortedDimensions,
    /// The same target dimension appears twice in a parallel operation.
    #[error("duplicate target dimension in a parallel operation")]
    DuplicateDimensions,
    /// A parallel operation received mismatching target and expression counts.
    #[error("{targets} target dimensions but {expressions} expressions")]
    ArityMismatch {
        /// Number of target dimensions.
        targets: usize,
        /// Number of expressions.
        expressions: usize,
    },
    /// Folding requires at least one source dimension.
    #[error("folding requires at least one source dimension")]
    EmptyFold,
    /// Widening thresholds must be sorted in ascending order.
    #[error("widening thresholds must be sorted in ascending order")]
    UnsortedThresholds,
}
