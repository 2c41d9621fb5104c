//! Prelude module for common imports in tensorgrad
//!
//! Re-exports the most commonly used types for convenient use in examples
//! and user code.

pub use crate::autograd::{GradCheckConfig, GradientChecker, Graph, NodeId, Operation, Var};
pub use crate::error::{TensorError, TensorResult};
pub use crate::ops::{DistanceKind, DistanceOp};
pub use crate::registry::{OpCategory, OpDescriptor, OpRegistry};
pub use crate::tensor::{FloatType, ReduceDims, Tensor, TensorShape};

// Common half precision type
pub use half::f16;
