//! Reduce-3 distance operators
//!
//! `DistanceKind` is the pluggable strategy selecting which metric a
//! reduce-3 node computes; the shared node data lives in `autograd::node`.
//! `DistanceOp` is the eager form for running a kernel directly over
//! concrete tensors, outside any graph.

use crate::error::{TensorError, TensorResult};
use crate::ops::reduce::{reduce3_all, reduce3_axes, reduce3_map};
use crate::registry::{OpDescriptor, EUCLIDEAN, MANHATTAN};
use crate::tensor::{FloatType, ReduceDims, Tensor, TensorShape};

/// Distance metric computed by a reduce-3 operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceKind {
    /// sum(|x - y|) over the reduced axes
    Manhattan,
    /// sqrt(sum((x - y)^2)) over the reduced axes
    Euclidean,
}

impl DistanceKind {
    /// Stable symbolic operator name
    pub fn op_name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Numeric opcode within the reduce-3 category
    pub fn opcode(&self) -> u16 {
        self.descriptor().opcode
    }

    /// Identity record in the operator catalog
    pub fn descriptor(&self) -> &'static OpDescriptor {
        match self {
            DistanceKind::Manhattan => &MANHATTAN,
            DistanceKind::Euclidean => &EUCLIDEAN,
        }
    }

    /// Per-element contribution to the accumulator
    pub(crate) fn accumulate(&self, diff: f32) -> f32 {
        match self {
            DistanceKind::Manhattan => diff.abs(),
            DistanceKind::Euclidean => diff * diff,
        }
    }

    /// Finish an accumulated value
    pub(crate) fn finalize(&self, accum: f32) -> f32 {
        match self {
            DistanceKind::Manhattan => accum,
            DistanceKind::Euclidean => accum.sqrt(),
        }
    }
}

/// Eager reduce-3 distance op over concrete tensors
///
/// Mirrors the graph node's forward contract but executes immediately via
/// the CPU kernel. The two kernel scalar placeholders are initialized here
/// (and only here — graph construction carries no kernel parameters).
#[derive(Debug, Clone)]
pub struct DistanceOp<T: FloatType> {
    kind: DistanceKind,
    x: Tensor<T>,
    y: Tensor<T>,
    output: Option<Tensor<T>>,
    dims: ReduceDims,
    all_distances: bool,
    kernel_params: [T; 2],
}

impl<T: FloatType> DistanceOp<T> {
    /// Full reduction over two tensors; `n` is the explicit element count
    pub fn new(kind: DistanceKind, x: Tensor<T>, y: Tensor<T>, n: usize) -> TensorResult<Self> {
        Self::build(kind, x, y, None, ReduceDims::All, false, n)
    }

    /// Full reduction with a pre-supplied output tensor
    pub fn with_output(
        kind: DistanceKind,
        x: Tensor<T>,
        y: Tensor<T>,
        output: Tensor<T>,
        n: usize,
    ) -> TensorResult<Self> {
        Self::build(kind, x, y, Some(output), ReduceDims::All, false, n)
    }

    /// Reduction along an explicit dimension set
    pub fn along(
        kind: DistanceKind,
        x: Tensor<T>,
        y: Tensor<T>,
        dims: ReduceDims,
    ) -> TensorResult<Self> {
        let n = x.numel();
        Self::build(kind, x, y, None, dims, false, n)
    }

    /// Self-comparison: distance of a tensor to itself, full reduction
    pub fn self_distance(kind: DistanceKind, x: Tensor<T>) -> TensorResult<Self> {
        let n = x.numel();
        let y = x.clone();
        Self::build(kind, x, y, None, ReduceDims::All, false, n)
    }

    /// Choose between the scalar aggregate (`false`) and the element-wise
    /// distance map (`true`)
    pub fn all_distances(
        kind: DistanceKind,
        x: Tensor<T>,
        y: Tensor<T>,
        all_distances: bool,
    ) -> TensorResult<Self> {
        let n = x.numel();
        Self::build(kind, x, y, None, ReduceDims::All, all_distances, n)
    }

    fn build(
        kind: DistanceKind,
        x: Tensor<T>,
        y: Tensor<T>,
        output: Option<Tensor<T>>,
        dims: ReduceDims,
        all_distances: bool,
        n: usize,
    ) -> TensorResult<Self> {
        if all_distances && !dims.is_all() {
            return Err(TensorError::InvalidOperation(
                "all-distances mode is incompatible with an explicit reduction axis list"
                    .to_string(),
            ));
        }

        if n != x.numel() {
            return Err(TensorError::InvalidOperation(format!(
                "element count {} does not match input length {}",
                n,
                x.numel()
            )));
        }

        let common = x.shape().broadcast_with(y.shape())?;
        let expected = infer_output_shape(&common, &dims, all_distances)?;

        if let Some(ref out) = output {
            if !out.shape().is_same(&expected) {
                return Err(TensorError::ShapeMismatch {
                    expected: expected.dims().to_vec(),
                    actual: out.dims().to_vec(),
                });
            }
        }

        Ok(Self {
            kind,
            x,
            y,
            output,
            dims,
            all_distances,
            kernel_params: [T::zero(), T::zero()],
        })
    }

    /// The metric this op computes
    pub fn kind(&self) -> DistanceKind {
        self.kind
    }

    /// The reduction dimension set
    pub fn dims(&self) -> &ReduceDims {
        &self.dims
    }

    /// Whether the element-wise distance map mode is selected
    pub fn is_all_distances(&self) -> bool {
        self.all_distances
    }

    /// The kernel scalar placeholders (always two, zero-valued)
    pub fn kernel_params(&self) -> &[T] {
        &self.kernel_params
    }

    /// The pre-supplied output tensor, if any
    pub fn output(&self) -> Option<&Tensor<T>> {
        self.output.as_ref()
    }

    /// Run the kernel
    pub fn exec(&self) -> TensorResult<Tensor<T>> {
        let common = self.x.shape().broadcast_with(self.y.shape())?;
        let x = self.x.broadcast_to(&common)?;
        let y = self.y.broadcast_to(&common)?;

        if self.all_distances {
            return reduce3_map(self.kind, &x, &y);
        }

        match &self.dims {
            ReduceDims::All => reduce3_all(self.kind, &x, &y),
            ReduceDims::Axes(axes) => reduce3_axes(self.kind, &x, &y, axes),
        }
    }
}

/// Output shape of a reduce-3 op over inputs of the given common shape
pub(crate) fn infer_output_shape(
    common: &TensorShape,
    dims: &ReduceDims,
    all_distances: bool,
) -> TensorResult<TensorShape> {
    if all_distances {
        Ok(common.clone())
    } else {
        common.reduced(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_identity() {
        assert_eq!(DistanceKind::Euclidean.op_name(), "euclidean");
        assert_eq!(DistanceKind::Euclidean.opcode(), 1);
        assert_eq!(DistanceKind::Manhattan.op_name(), "manhattan");
        assert_eq!(DistanceKind::Manhattan.opcode(), 0);
    }

    #[test]
    fn test_eager_euclidean() {
        let x = Tensor::from_vec(vec![0.0f32, 0.0], vec![2]).unwrap();
        let y = Tensor::from_vec(vec![3.0f32, 4.0], vec![2]).unwrap();

        let op = DistanceOp::new(DistanceKind::Euclidean, x, y, 2).unwrap();
        assert_eq!(op.kernel_params(), &[0.0, 0.0]);

        let d = op.exec().unwrap();
        assert_eq!(d.to_vec(), vec![5.0]);
    }

    #[test]
    fn test_eager_self_distance() {
        let x = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], vec![3]).unwrap();
        let op = DistanceOp::self_distance(DistanceKind::Euclidean, x).unwrap();
        let d = op.exec().unwrap();
        assert_eq!(d.to_vec(), vec![0.0]);
    }

    #[test]
    fn test_eager_with_output_shape_check() {
        let x = Tensor::from_vec(vec![0.0f32, 0.0], vec![2]).unwrap();
        let y = Tensor::from_vec(vec![3.0f32, 4.0], vec![2]).unwrap();

        // Scalar output accepted
        let out = Tensor::scalar(0.0f32);
        assert!(
            DistanceOp::with_output(DistanceKind::Euclidean, x.clone(), y.clone(), out, 2).is_ok()
        );

        // Wrong-shaped output rejected
        let bad = Tensor::from_vec(vec![0.0f32, 0.0], vec![2]).unwrap();
        assert!(matches!(
            DistanceOp::with_output(DistanceKind::Euclidean, x, y, bad, 2),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_eager_wrong_element_count() {
        let x = Tensor::from_vec(vec![0.0f32, 0.0], vec![2]).unwrap();
        let y = Tensor::from_vec(vec![3.0f32, 4.0], vec![2]).unwrap();
        assert!(DistanceOp::new(DistanceKind::Euclidean, x, y, 3).is_err());
    }

    #[test]
    fn test_eager_all_distances() {
        let x = Tensor::from_vec(vec![1.0f32, 5.0], vec![2]).unwrap();
        let y = Tensor::from_vec(vec![4.0f32, 5.0], vec![2]).unwrap();

        let op = DistanceOp::all_distances(DistanceKind::Euclidean, x, y, true).unwrap();
        assert!(op.is_all_distances());

        let d = op.exec().unwrap();
        assert_eq!(d.dims(), &[2]);
        assert_eq!(d.to_vec(), vec![3.0, 0.0]);
    }

    #[test]
    fn test_eager_incompatible_shapes() {
        let x = Tensor::from_vec(vec![0.0f32; 6], vec![2, 3]).unwrap();
        let y = Tensor::from_vec(vec![0.0f32; 6], vec![3, 2]).unwrap();
        assert!(matches!(
            DistanceOp::new(DistanceKind::Euclidean, x, y, 6),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
