//! Element-wise演算の勾配規則

use crate::autograd::gradients::resolved_shape;
use crate::autograd::graph::{Graph, Var};
use crate::error::TensorResult;
use crate::tensor::TensorShape;

/// ブロードキャストされた勾配を元の形状に縮約
pub(crate) fn reduce_grad_for_broadcast(
    graph: &mut Graph,
    grad: Var,
    original_shape: &TensorShape,
) -> TensorResult<Var> {
    if graph.shape_of(grad) == Some(original_shape) {
        return Ok(grad);
    }
    graph.sum_to(grad, original_shape.clone())
}

/// c = a + b:
/// ∂L/∂a = grad_output, ∂L/∂b = grad_output
pub(crate) fn add(graph: &mut Graph, a: Var, b: Var, grad: Var) -> TensorResult<Vec<Var>> {
    let a_shape = resolved_shape(graph, a)?;
    let b_shape = resolved_shape(graph, b)?;

    let grad_a = reduce_grad_for_broadcast(graph, grad, &a_shape)?;
    let grad_b = reduce_grad_for_broadcast(graph, grad, &b_shape)?;
    Ok(vec![grad_a, grad_b])
}

/// c = a - b:
/// ∂L/∂a = grad_output, ∂L/∂b = -grad_output
pub(crate) fn sub(graph: &mut Graph, a: Var, b: Var, grad: Var) -> TensorResult<Vec<Var>> {
    let a_shape = resolved_shape(graph, a)?;
    let b_shape = resolved_shape(graph, b)?;

    let grad_a = reduce_grad_for_broadcast(graph, grad, &a_shape)?;
    let neg_grad = graph.neg(grad);
    let grad_b = reduce_grad_for_broadcast(graph, neg_grad, &b_shape)?;
    Ok(vec![grad_a, grad_b])
}

/// c = a * b:
/// ∂L/∂a = grad_output * b, ∂L/∂b = grad_output * a
pub(crate) fn mul(graph: &mut Graph, a: Var, b: Var, grad: Var) -> TensorResult<Vec<Var>> {
    let a_shape = resolved_shape(graph, a)?;
    let b_shape = resolved_shape(graph, b)?;

    let raw_a = graph.mul(grad, b)?;
    let raw_b = graph.mul(grad, a)?;

    let grad_a = reduce_grad_for_broadcast(graph, raw_a, &a_shape)?;
    let grad_b = reduce_grad_for_broadcast(graph, raw_b, &b_shape)?;
    Ok(vec![grad_a, grad_b])
}

/// c = a / b:
/// ∂L/∂a = grad_output / b, ∂L/∂b = -grad_output * a / b²
pub(crate) fn div(graph: &mut Graph, a: Var, b: Var, grad: Var) -> TensorResult<Vec<Var>> {
    let a_shape = resolved_shape(graph, a)?;
    let b_shape = resolved_shape(graph, b)?;

    let raw_a = graph.div(grad, b)?;

    let numerator = graph.mul(grad, a)?;
    let b_squared = graph.mul(b, b)?;
    let quotient = graph.div(numerator, b_squared)?;
    let raw_b = graph.neg(quotient);

    let grad_a = reduce_grad_for_broadcast(graph, raw_a, &a_shape)?;
    let grad_b = reduce_grad_for_broadcast(graph, raw_b, &b_shape)?;
    Ok(vec![grad_a, grad_b])
}
