//! Core Tensor type

use crate::error::{TensorError, TensorResult};
use crate::tensor::{FloatType, TensorShape};

/// Dense CPU tensor with row-major layout
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: FloatType> {
    /// Tensor shape
    shape: TensorShape,

    /// Strides for memory layout (row-major)
    strides: Vec<usize>,

    /// Flat data buffer
    data: Vec<T>,
}

impl<T: FloatType> Tensor<T> {
    /// Create a new tensor from a flat buffer and shape
    pub fn new(data: Vec<T>, shape: TensorShape) -> TensorResult<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![shape.numel()],
                actual: vec![data.len()],
            });
        }

        let strides = shape.compute_strides();

        Ok(Self {
            shape,
            strides,
            data,
        })
    }

    /// Create a tensor from a vector with the given dimensions
    pub fn from_vec(data: Vec<T>, dims: Vec<usize>) -> TensorResult<Self> {
        Self::new(data, TensorShape::new(dims))
    }

    /// Construct from parts already known to be consistent (callers must
    /// guarantee `data.len() == shape.numel()`)
    pub(crate) fn from_parts(data: Vec<T>, shape: TensorShape) -> Self {
        let strides = shape.compute_strides();
        Self {
            shape,
            strides,
            data,
        }
    }

    /// Create a tensor filled with zeros
    pub fn zeros(dims: Vec<usize>) -> Self {
        let shape = TensorShape::new(dims);
        let data = vec![T::zero(); shape.numel()];
        let strides = shape.compute_strides();
        Self {
            shape,
            strides,
            data,
        }
    }

    /// Create a tensor filled with ones
    pub fn ones(dims: Vec<usize>) -> Self {
        let shape = TensorShape::new(dims);
        let data = vec![T::one(); shape.numel()];
        let strides = shape.compute_strides();
        Self {
            shape,
            strides,
            data,
        }
    }

    /// Create a rank-0 scalar tensor
    pub fn scalar(value: T) -> Self {
        Self {
            shape: TensorShape::scalar(),
            strides: Vec::new(),
            data: vec![value],
        }
    }

    /// Get the tensor shape
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// Get the dimensions
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Get the rank
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Get the total number of elements
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Get the strides
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Read the flat data buffer
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Borrow the flat data buffer
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Reinterpret the buffer under a new shape (same element count)
    pub fn reshape(&self, dims: Vec<usize>) -> TensorResult<Self> {
        let new_shape = self.shape.reshape(dims)?;
        Self::new(self.data.clone(), new_shape)
    }
}
