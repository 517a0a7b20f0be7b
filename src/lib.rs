#![doc = include_str!("../README.md")]
#![cfg(feature = "alloc")]
extern crate alloc;

pub mod errors;
pub mod impls;
pub mod traits;

#[cfg(feature = "arbitrary")]
pub mod test_utils;

/// Prelude module for the octagon crate.
pub mod prelude {
    pub use crate::{impls::*, traits::*};
}
