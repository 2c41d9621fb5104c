//! Broadcasting operations for tensors

use crate::error::{TensorError, TensorResult};
use crate::tensor::{FloatType, Tensor, TensorShape};

impl<T: FloatType> Tensor<T> {
    /// Broadcast this tensor to a target shape
    pub fn broadcast_to(&self, target_shape: &TensorShape) -> TensorResult<Self> {
        // Check if broadcasting is needed
        if !self.shape().needs_broadcast(target_shape) {
            return Ok(self.clone());
        }

        // Check if broadcasting is valid
        if !self.shape().can_broadcast_to(target_shape) {
            return Err(TensorError::ShapeMismatch {
                expected: target_shape.dims().to_vec(),
                actual: self.shape().dims().to_vec(),
            });
        }

        let input = self.data();
        let input_dims = self.dims();

        let target_numel = target_shape.numel();
        let mut output = vec![T::zero(); target_numel];

        // Compute strides for input and output
        let input_strides = self.strides();
        let target_strides = target_shape.compute_strides();

        // Align dimensions from the right
        let rank_diff = target_shape.rank() - self.rank();

        for (target_idx, out) in output.iter_mut().enumerate() {
            // Compute multi-dimensional index for target
            let mut target_coords = vec![0; target_shape.rank()];
            let mut remaining = target_idx;
            for i in 0..target_shape.rank() {
                target_coords[i] = remaining / target_strides[i];
                remaining %= target_strides[i];
            }

            // Map to input index
            let mut input_idx = 0;
            for i in rank_diff..target_shape.rank() {
                let input_i = i - rank_diff;
                let coord = if input_dims[input_i] == 1 {
                    0
                } else {
                    target_coords[i]
                };
                input_idx += coord * input_strides[input_i];
            }

            *out = input[input_idx];
        }

        Tensor::from_vec(output, target_shape.dims().to_vec())
    }

    /// Sum this tensor down to a broadcast-compatible target shape.
    ///
    /// Inverse of `broadcast_to`: axes that were expanded (missing or size 1
    /// in the target) are summed. Accumulation happens in f32.
    pub fn sum_to(&self, target_shape: &TensorShape) -> TensorResult<Self> {
        if self.shape().is_same(target_shape) {
            return Ok(self.clone());
        }

        if !target_shape.can_broadcast_to(self.shape()) {
            // Reduced-rank target: sum to the rank-preserving alignment,
            // then drop the singleton axes
            if let Some(aligned) = target_shape.align_reduced(self.shape()) {
                let summed = self.sum_to(&aligned)?;
                return summed.reshape(target_shape.dims().to_vec());
            }
            return Err(TensorError::ShapeMismatch {
                expected: target_shape.dims().to_vec(),
                actual: self.dims().to_vec(),
            });
        }

        let mut accum = vec![0.0f32; target_shape.numel()];
        let self_strides = self.strides();
        let target_dims = target_shape.dims();
        let target_strides = target_shape.compute_strides();
        let rank_diff = self.rank() - target_shape.rank();

        for (idx, &value) in self.data().iter().enumerate() {
            let mut remaining = idx;
            let mut target_idx = 0;
            for i in 0..self.rank() {
                let coord = remaining / self_strides[i];
                remaining %= self_strides[i];

                if i >= rank_diff {
                    let j = i - rank_diff;
                    let target_coord = if target_dims[j] == 1 { 0 } else { coord };
                    target_idx += target_coord * target_strides[j];
                }
            }
            accum[target_idx] += value.to_f32();
        }

        let output: Vec<T> = accum.into_iter().map(T::from_f32).collect();
        Tensor::from_vec(output, target_dims.to_vec())
    }

    /// Re-expand a reduced gradient to the rank-preserving broadcast shape:
    /// size-1 axes are re-inserted at each reduced position.
    ///
    /// The result broadcasts against full-rank tensors in subsequent
    /// elementwise operations; the buffer itself is unchanged.
    pub fn expand_reduced(&self, axes: &[usize], rank: usize) -> TensorResult<Self> {
        let expanded = self.shape().unsqueeze_axes(axes, rank)?;
        self.reshape(expanded.dims().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_1d_to_2d() {
        // [3] -> [2, 3]
        let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], vec![3]).unwrap();
        let target_shape = TensorShape::new(vec![2, 3]);
        let b = a.broadcast_to(&target_shape).unwrap();

        assert_eq!(b.to_vec(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_broadcast_column_to_matrix() {
        // [2, 1] -> [2, 3]
        let a = Tensor::from_vec(vec![10.0f32, 20.0], vec![2, 1]).unwrap();
        let target_shape = TensorShape::new(vec![2, 3]);
        let b = a.broadcast_to(&target_shape).unwrap();

        assert_eq!(b.to_vec(), vec![10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_broadcast_scalar() {
        let a = Tensor::scalar(42.0f32);
        let target_shape = TensorShape::new(vec![5]);
        let b = a.broadcast_to(&target_shape).unwrap();

        assert_eq!(b.numel(), 5);
        assert!(b.to_vec().iter().all(|&x| x == 42.0));
    }

    #[test]
    fn test_broadcast_error() {
        // [3] cannot broadcast to [2]
        let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], vec![3]).unwrap();
        let target_shape = TensorShape::new(vec![2]);
        assert!(a.broadcast_to(&target_shape).is_err());
    }

    #[test]
    fn test_sum_to_column() {
        // [2, 3] summed to [2, 1]
        let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let target = TensorShape::new(vec![2, 1]);
        let s = a.sum_to(&target).unwrap();

        assert_eq!(s.dims(), &[2, 1]);
        assert_eq!(s.to_vec(), vec![6.0, 15.0]);
    }

    #[test]
    fn test_sum_to_scalar() {
        let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let s = a.sum_to(&TensorShape::scalar()).unwrap();

        assert!(s.shape().is_scalar());
        assert_eq!(s.to_vec(), vec![10.0]);
    }

    #[test]
    fn test_sum_to_roundtrip() {
        // broadcast then sum back: each source element scaled by expansion factor
        let a = Tensor::from_vec(vec![1.0f32, 2.0], vec![2, 1]).unwrap();
        let big = a.broadcast_to(&TensorShape::new(vec![2, 3])).unwrap();
        let back = big.sum_to(&TensorShape::new(vec![2, 1])).unwrap();
        assert_eq!(back.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_expand_reduced() {
        // (2,) with axis 1 reduced from rank 2 -> (2, 1)
        let g = Tensor::from_vec(vec![1.0f32, 2.0], vec![2]).unwrap();
        let e = g.expand_reduced(&[1], 2).unwrap();
        assert_eq!(e.dims(), &[2, 1]);
        assert_eq!(e.to_vec(), vec![1.0, 2.0]);

        // scalar with both axes reduced -> (1, 1)
        let s = Tensor::scalar(3.0f32);
        let e = s.expand_reduced(&[0, 1], 2).unwrap();
        assert_eq!(e.dims(), &[1, 1]);
    }
}
