//! Tensor type and shape utilities

mod float_type;
mod shape;
mod tensor;

pub use float_type::FloatType;
pub use shape::{ReduceDims, TensorShape};
pub use tensor::Tensor;

pub(crate) use shape::elementwise_shapes;
