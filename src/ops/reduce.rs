//! Reduce-3 distance kernels
//!
//! Naive CPU reference kernels: two equal-shaped input buffers are reduced
//! along the requested dimension set. Accumulation happens in f32
//! regardless of the element type.

use crate::error::{TensorError, TensorResult};
use crate::ops::distance::DistanceKind;
use crate::tensor::{FloatType, ReduceDims, Tensor};

fn check_same_shape<T: FloatType>(x: &Tensor<T>, y: &Tensor<T>) -> TensorResult<()> {
    if !x.shape().is_same(y.shape()) {
        return Err(TensorError::ShapeMismatch {
            expected: x.dims().to_vec(),
            actual: y.dims().to_vec(),
        });
    }
    Ok(())
}

/// Reduce over all axes to a rank-0 scalar
pub(crate) fn reduce3_all<T: FloatType>(
    kind: DistanceKind,
    x: &Tensor<T>,
    y: &Tensor<T>,
) -> TensorResult<Tensor<T>> {
    check_same_shape(x, y)?;

    let mut accum = 0.0f32;
    for (&a, &b) in x.data().iter().zip(y.data().iter()) {
        accum += kind.accumulate(a.to_f32() - b.to_f32());
    }

    Ok(Tensor::scalar(T::from_f32(kind.finalize(accum))))
}

/// Reduce along the listed axes; reduced axes are removed from the output
/// shape
pub(crate) fn reduce3_axes<T: FloatType>(
    kind: DistanceKind,
    x: &Tensor<T>,
    y: &Tensor<T>,
    axes: &[usize],
) -> TensorResult<Tensor<T>> {
    check_same_shape(x, y)?;

    let out_shape = x.shape().reduced(&ReduceDims::Axes(axes.to_vec()))?;
    let out_strides = out_shape.compute_strides();
    let in_strides = x.strides();

    let mut accum = vec![0.0f32; out_shape.numel()];

    for (idx, (&a, &b)) in x.data().iter().zip(y.data().iter()).enumerate() {
        // Decode input coordinates, drop reduced axes to find the output cell
        let mut remaining = idx;
        let mut out_idx = 0;
        let mut out_axis = 0;
        for (axis, &stride) in in_strides.iter().enumerate() {
            let coord = remaining / stride;
            remaining %= stride;

            if !axes.contains(&axis) {
                out_idx += coord * out_strides[out_axis];
                out_axis += 1;
            }
        }

        accum[out_idx] += kind.accumulate(a.to_f32() - b.to_f32());
    }

    let output: Vec<T> = accum
        .into_iter()
        .map(|acc| T::from_f32(kind.finalize(acc)))
        .collect();

    Tensor::from_vec(output, out_shape.dims().to_vec())
}

/// Element-wise distance map: no reduction, output shape equals the input
/// shape
pub(crate) fn reduce3_map<T: FloatType>(
    kind: DistanceKind,
    x: &Tensor<T>,
    y: &Tensor<T>,
) -> TensorResult<Tensor<T>> {
    check_same_shape(x, y)?;

    let output: Vec<T> = x
        .data()
        .iter()
        .zip(y.data().iter())
        .map(|(&a, &b)| {
            let diff = a.to_f32() - b.to_f32();
            T::from_f32(kind.finalize(kind.accumulate(diff)))
        })
        .collect();

    Tensor::from_vec(output, x.dims().to_vec())
}
