//! Tensor operations

pub mod broadcast;
pub mod distance;
pub mod elementwise;
pub mod reduce;

pub use distance::{DistanceKind, DistanceOp};
