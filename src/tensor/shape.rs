//! Tensor shape utilities and reduction-dimension handling

use crate::error::{TensorError, TensorResult};

/// Tensor shape representation
///
/// Rank-0 (empty) shapes denote scalars and have `numel() == 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    dims: Vec<usize>,
}

impl TensorShape {
    /// Create a new shape
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// The rank-0 scalar shape
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Get the dimensions
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get the rank (number of dimensions)
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Get the total number of elements
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether this is the rank-0 scalar shape
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Check if this shape can be broadcast to another shape
    pub fn can_broadcast_to(&self, other: &TensorShape) -> bool {
        if self.rank() > other.rank() {
            return false;
        }

        for (a, b) in self.dims.iter().rev().zip(other.dims.iter().rev()) {
            if *a != *b && *a != 1 {
                return false;
            }
        }

        true
    }

    /// Compute the broadcasted shape of two shapes (right-aligned)
    pub fn broadcast_with(&self, other: &TensorShape) -> TensorResult<TensorShape> {
        let max_rank = self.rank().max(other.rank());
        let mut result_dims = vec![1; max_rank];

        // Align shapes from the right
        let self_offset = max_rank - self.rank();
        let other_offset = max_rank - other.rank();

        for i in 0..max_rank {
            let self_dim = if i >= self_offset {
                self.dims[i - self_offset]
            } else {
                1
            };

            let other_dim = if i >= other_offset {
                other.dims[i - other_offset]
            } else {
                1
            };

            if self_dim == other_dim {
                result_dims[i] = self_dim;
            } else if self_dim == 1 {
                result_dims[i] = other_dim;
            } else if other_dim == 1 {
                result_dims[i] = self_dim;
            } else {
                return Err(TensorError::ShapeMismatch {
                    expected: self.dims.clone(),
                    actual: other.dims.clone(),
                });
            }
        }

        Ok(TensorShape::new(result_dims))
    }

    /// Check if this shape needs broadcasting to match target shape
    pub fn needs_broadcast(&self, target: &TensorShape) -> bool {
        self.dims != target.dims
    }

    /// Compute strides for this shape (row-major / C-contiguous)
    pub fn compute_strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.rank()];

        for i in (0..self.rank().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }

        strides
    }

    /// Check if two shapes are equal for element-wise operations
    pub fn is_same(&self, other: &TensorShape) -> bool {
        self.dims == other.dims
    }

    /// Reshape to a new shape (must have same number of elements)
    pub fn reshape(&self, new_dims: Vec<usize>) -> TensorResult<TensorShape> {
        let new_shape = TensorShape::new(new_dims);

        if self.numel() != new_shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.dims.clone(),
                actual: new_shape.dims.clone(),
            });
        }

        Ok(new_shape)
    }

    /// Shape after reducing along `dims`: reduced axes are removed,
    /// a full reduction yields the rank-0 scalar shape.
    pub fn reduced(&self, dims: &ReduceDims) -> TensorResult<TensorShape> {
        match dims {
            ReduceDims::All => Ok(TensorShape::scalar()),
            ReduceDims::Axes(axes) => {
                for &axis in axes {
                    if axis >= self.rank() {
                        return Err(TensorError::InvalidDimension { dim: axis });
                    }
                }
                let kept: Vec<usize> = self
                    .dims
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !axes.contains(i))
                    .map(|(_, &d)| d)
                    .collect();
                Ok(TensorShape::new(kept))
            }
        }
    }

    /// Re-insert reduced axes as size-1 dimensions, producing the
    /// rank-preserving broadcast shape for a reduced gradient.
    ///
    /// `self` is the reduced shape; `axes` are positions in the full-rank
    /// shape; `rank` is the full rank being restored.
    pub fn unsqueeze_axes(&self, axes: &[usize], rank: usize) -> TensorResult<TensorShape> {
        if self.rank() + axes.len() != rank {
            return Err(TensorError::InvalidOperation(format!(
                "cannot restore rank {} from rank {} with {} reduced axes",
                rank,
                self.rank(),
                axes.len()
            )));
        }

        let mut result = Vec::with_capacity(rank);
        let mut src = self.dims.iter();
        for i in 0..rank {
            if axes.contains(&i) {
                result.push(1);
            } else {
                match src.next() {
                    Some(&d) => result.push(d),
                    None => {
                        return Err(TensorError::InvalidDimension { dim: i });
                    }
                }
            }
        }

        Ok(TensorShape::new(result))
    }

    /// Align a reduced-rank shape against a full-rank target by re-inserting
    /// singleton axes (greedy left-to-right subsequence match).
    ///
    /// Returns the rank-preserving shape that broadcasts to `target`, or
    /// `None` when `self` is not a subsequence of `target`.
    pub fn align_reduced(&self, target: &TensorShape) -> Option<TensorShape> {
        if self.rank() >= target.rank() {
            return None;
        }

        let mut result = Vec::with_capacity(target.rank());
        let mut next = 0;
        for (i, &t) in target.dims.iter().enumerate() {
            let remaining = self.dims.len() - next;
            // Only consume when enough target axes remain for the rest
            if next < self.dims.len() && self.dims[next] == t && remaining <= target.rank() - i {
                result.push(self.dims[next]);
                next += 1;
            } else {
                result.push(1);
            }
        }

        if next < self.dims.len() {
            return None;
        }

        Some(TensorShape::new(result))
    }
}

impl From<Vec<usize>> for TensorShape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for TensorShape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

/// Reduction dimension set: either the "all axes" sentinel or an explicit,
/// sorted, duplicate-free list of axis indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceDims {
    /// Reduce over every axis (scalar output)
    All,
    /// Reduce over the listed axes only
    Axes(Vec<usize>),
}

impl ReduceDims {
    /// Create an explicit axis list. The list must be non-empty; it is
    /// normalized to sorted order and duplicates are rejected.
    pub fn axes(mut axes: Vec<usize>) -> TensorResult<Self> {
        if axes.is_empty() {
            return Err(TensorError::InvalidOperation(
                "reduction axis list must not be empty".to_string(),
            ));
        }

        axes.sort_unstable();
        for pair in axes.windows(2) {
            if pair[0] == pair[1] {
                return Err(TensorError::InvalidDimension { dim: pair[0] });
            }
        }

        Ok(ReduceDims::Axes(axes))
    }

    /// Whether this is the "all axes" sentinel
    pub fn is_all(&self) -> bool {
        matches!(self, ReduceDims::All)
    }

    /// Resolve to a concrete axis list for a tensor of the given rank
    pub fn resolve(&self, rank: usize) -> TensorResult<Vec<usize>> {
        match self {
            ReduceDims::All => Ok((0..rank).collect()),
            ReduceDims::Axes(axes) => {
                for &axis in axes {
                    if axis >= rank {
                        return Err(TensorError::InvalidDimension { dim: axis });
                    }
                }
                Ok(axes.clone())
            }
        }
    }
}

/// Resolve the shapes an elementwise binary op works over: rank-preserving
/// realignments for each operand (when needed) and the output shape.
///
/// Broadcasting is numpy-style right-aligned; a reduced-rank operand that
/// fails right alignment is re-aligned by re-inserting singleton axes at
/// the deleted positions.
pub(crate) fn elementwise_shapes(
    a: &TensorShape,
    b: &TensorShape,
) -> TensorResult<(Option<TensorShape>, Option<TensorShape>, TensorShape)> {
    match a.broadcast_with(b) {
        Ok(out) => Ok((None, None, out)),
        Err(err) => {
            if a.rank() < b.rank() {
                if let Some(aligned) = a.align_reduced(b) {
                    let out = aligned.broadcast_with(b)?;
                    return Ok((Some(aligned), None, out));
                }
            } else if b.rank() < a.rank() {
                if let Some(aligned) = b.align_reduced(a) {
                    let out = a.broadcast_with(&aligned)?;
                    return Ok((None, Some(aligned), out));
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_numel() {
        let shape = TensorShape::new(vec![2, 3, 4]);
        assert_eq!(shape.numel(), 24);
    }

    #[test]
    fn test_scalar_shape() {
        let shape = TensorShape::scalar();
        assert_eq!(shape.rank(), 0);
        assert_eq!(shape.numel(), 1);
        assert!(shape.is_scalar());
    }

    #[test]
    fn test_shape_strides() {
        let shape = TensorShape::new(vec![2, 3, 4]);
        let strides = shape.compute_strides();
        assert_eq!(strides, vec![12, 4, 1]);
    }

    #[test]
    fn test_reshape() {
        let shape = TensorShape::new(vec![2, 3, 4]);
        let reshaped = shape.reshape(vec![6, 4]).unwrap();
        assert_eq!(reshaped.dims(), &[6, 4]);
    }

    #[test]
    fn test_broadcast_with() {
        let a = TensorShape::new(vec![2, 1]);
        let b = TensorShape::new(vec![2, 3]);
        let c = a.broadcast_with(&b).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
    }

    #[test]
    fn test_broadcast_with_scalar() {
        let a = TensorShape::scalar();
        let b = TensorShape::new(vec![4, 2]);
        let c = a.broadcast_with(&b).unwrap();
        assert_eq!(c.dims(), &[4, 2]);
    }

    #[test]
    fn test_broadcast_error() {
        let a = TensorShape::new(vec![3]);
        let b = TensorShape::new(vec![2]);
        assert!(a.broadcast_with(&b).is_err());
    }

    #[test]
    fn test_reduced_all() {
        let shape = TensorShape::new(vec![2, 3]);
        let reduced = shape.reduced(&ReduceDims::All).unwrap();
        assert!(reduced.is_scalar());
    }

    #[test]
    fn test_reduced_axes() {
        let shape = TensorShape::new(vec![2, 3, 4]);
        let dims = ReduceDims::axes(vec![1]).unwrap();
        let reduced = shape.reduced(&dims).unwrap();
        assert_eq!(reduced.dims(), &[2, 4]);
    }

    #[test]
    fn test_reduced_axis_out_of_range() {
        let shape = TensorShape::new(vec![2, 3]);
        let dims = ReduceDims::axes(vec![5]).unwrap();
        assert!(shape.reduced(&dims).is_err());
    }

    #[test]
    fn test_reduce_dims_rejects_empty() {
        assert!(ReduceDims::axes(vec![]).is_err());
    }

    #[test]
    fn test_reduce_dims_rejects_duplicates() {
        assert!(ReduceDims::axes(vec![1, 1]).is_err());
    }

    #[test]
    fn test_reduce_dims_sorts() {
        let dims = ReduceDims::axes(vec![2, 0]).unwrap();
        assert_eq!(dims, ReduceDims::Axes(vec![0, 2]));
    }

    #[test]
    fn test_unsqueeze_axes() {
        // (2,) restored to rank 2 with axis 1 reduced -> (2, 1)
        let reduced = TensorShape::new(vec![2]);
        let restored = reduced.unsqueeze_axes(&[1], 2).unwrap();
        assert_eq!(restored.dims(), &[2, 1]);

        // scalar restored to rank 2 with both axes reduced -> (1, 1)
        let scalar = TensorShape::scalar();
        let restored = scalar.unsqueeze_axes(&[0, 1], 2).unwrap();
        assert_eq!(restored.dims(), &[1, 1]);
    }

    #[test]
    fn test_align_reduced_trailing_axis() {
        // (2,) against (2, 3): axis 1 was reduced -> (2, 1)
        let small = TensorShape::new(vec![2]);
        let target = TensorShape::new(vec![2, 3]);
        let aligned = small.align_reduced(&target).unwrap();
        assert_eq!(aligned.dims(), &[2, 1]);
    }

    #[test]
    fn test_align_reduced_middle_axis() {
        // (2, 3) against (2, 4, 3) -> (2, 1, 3)
        let small = TensorShape::new(vec![2, 3]);
        let target = TensorShape::new(vec![2, 4, 3]);
        let aligned = small.align_reduced(&target).unwrap();
        assert_eq!(aligned.dims(), &[2, 1, 3]);
    }

    #[test]
    fn test_align_reduced_not_subsequence() {
        let small = TensorShape::new(vec![5]);
        let target = TensorShape::new(vec![2, 3]);
        assert!(small.align_reduced(&target).is_none());
    }

    #[test]
    fn test_elementwise_shapes_reduced_operand() {
        let a = TensorShape::new(vec![2, 3]);
        let b = TensorShape::new(vec![2]);
        let (ra, rb, out) = elementwise_shapes(&a, &b).unwrap();
        assert!(ra.is_none());
        assert_eq!(rb.unwrap().dims(), &[2, 1]);
        assert_eq!(out.dims(), &[2, 3]);
    }
}
