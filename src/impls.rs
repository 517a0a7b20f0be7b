//! Concrete data structures implementing the octagon domain.

mod closure;
pub mod half_matrix;
pub mod index;
pub mod linexpr;
pub mod octagon;
pub mod partition;

pub use half_matrix::HalfMatrix;
pub use linexpr::{ConstraintKind, Interval, LinCons, LinExpr};
pub use octagon::{Octagon, OctagonManager, ResultFlags};
pub use partition::{Component, ComponentId, VariablePartition};
