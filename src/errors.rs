//! Submodule defining common errors for the octagon crate.

pub mod octagon_error;
pub use octagon_error::OctagonError;
