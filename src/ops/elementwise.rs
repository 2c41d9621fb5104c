//! Element-wise tensor operations

use crate::error::TensorResult;
use crate::tensor::{elementwise_shapes, FloatType, Tensor};

impl<T: FloatType> Tensor<T> {
    /// Element-wise addition
    pub fn add(&self, other: &Tensor<T>) -> TensorResult<Self> {
        self.binary_op(other, |x, y| x + y)
    }

    /// Element-wise subtraction
    pub fn sub(&self, other: &Tensor<T>) -> TensorResult<Self> {
        self.binary_op(other, |x, y| x - y)
    }

    /// Element-wise multiplication
    pub fn mul(&self, other: &Tensor<T>) -> TensorResult<Self> {
        self.binary_op(other, |x, y| x * y)
    }

    /// Element-wise division
    pub fn div(&self, other: &Tensor<T>) -> TensorResult<Self> {
        self.binary_op(other, |x, y| x / y)
    }

    /// Element-wise negation
    pub fn neg(&self) -> Self {
        self.unary_op(|x| -x)
    }

    /// Element-wise sign (-1, 0, or 1)
    pub fn sign(&self) -> Self {
        self.unary_op(|x| x.signum())
    }

    fn unary_op(&self, f: impl Fn(T) -> T) -> Self {
        let data: Vec<T> = self.data().iter().map(|&x| f(x)).collect();
        Tensor::from_parts(data, self.shape().clone())
    }

    /// Shared binary path: same-shape fast path, otherwise align and
    /// broadcast both operands to the common output shape.
    fn binary_op(&self, other: &Tensor<T>, f: impl Fn(T, T) -> T) -> TensorResult<Self> {
        if self.shape().is_same(other.shape()) {
            let data: Vec<T> = self
                .data()
                .iter()
                .zip(other.data().iter())
                .map(|(&x, &y)| f(x, y))
                .collect();
            return Tensor::from_vec(data, self.dims().to_vec());
        }

        let (realign_a, realign_b, out_shape) = elementwise_shapes(self.shape(), other.shape())?;

        let a = match realign_a {
            Some(shape) => self.reshape(shape.dims().to_vec())?,
            None => self.clone(),
        };
        let b = match realign_b {
            Some(shape) => other.reshape(shape.dims().to_vec())?,
            None => other.clone(),
        };

        let a = a.broadcast_to(&out_shape)?;
        let b = b.broadcast_to(&out_shape)?;

        let data: Vec<T> = a
            .data()
            .iter()
            .zip(b.data().iter())
            .map(|(&x, &y)| f(x, y))
            .collect();

        Tensor::from_vec(data, out_shape.dims().to_vec())
    }
}
