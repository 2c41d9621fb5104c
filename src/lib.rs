//! tensorgrad: symbolic tensor graph core with reverse-mode differentiation
//!
//! The crate provides the operator-definition and differentiation layer of
//! a symbolic tensor computation graph:
//!
//! - **tensor**: dense CPU tensors, shapes, broadcasting, reduction
//!   dimension sets
//! - **ops**: element-wise operand algebra and the reduce-3 distance
//!   kernels (euclidean, manhattan)
//! - **autograd**: the computation graph, per-operation differentiation
//!   rules, and a finite-difference gradient checker
//! - **registry**: the operator identity catalog (names, opcodes,
//!   interchange-format export names)
//!
//! Graph construction and differentiation are purely symbolic; numeric
//! execution happens through the reference CPU executor (`Graph::eval`) or
//! the eager `DistanceOp` form.

pub mod autograd;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod registry;
pub mod tensor;

// Re-export main types
pub use autograd::{Graph, Var};
pub use error::{TensorError, TensorResult};
pub use ops::{DistanceKind, DistanceOp};
pub use tensor::{FloatType, ReduceDims, Tensor, TensorShape};
