//! Reduce-3 distance演算の勾配規則
//!
//! d = dist(x, y, dims) の場合 (euclidean):
//! ∂d/∂x_i = (x_i - y_i) / d
//! ∂d/∂y_i = -(x_i - y_i) / d

use crate::autograd::graph::{Graph, Var};
use crate::autograd::node::NodeId;
use crate::error::TensorResult;
use crate::ops::distance::DistanceKind;
use crate::tensor::ReduceDims;

/// Gradient rule for a reduce-3 distance node.
///
/// The full-reduction case re-expands the scalar incoming gradient through
/// an explicit rank-preserving broadcast node; the partial-reduction and
/// all-distances cases divide directly and rely on the engine's implicit
/// broadcasting. The two paths must not be collapsed: only the scalar case
/// loses rank information that the graph has to restore itself.
#[allow(clippy::too_many_arguments)]
pub(crate) fn diff(
    graph: &mut Graph,
    node_id: NodeId,
    kind: DistanceKind,
    dims: &ReduceDims,
    all_distances: bool,
    x: Var,
    y: Var,
    grad: Var,
) -> TensorResult<Vec<Var>> {
    let d = graph.create_variable(node_id, 0);
    let difference = graph.sub(x, y)?;
    let orig_rank = graph.rank_of(x)?;

    let grad_x = match kind {
        DistanceKind::Euclidean => {
            let quotient = if !all_distances && dims.is_all() {
                // Scalar output: broadcast the incoming gradient back to
                // the input rank before dividing by the (implicitly
                // broadcast) distance
                let expanded = graph.broadcast_reduction_gradient(orig_rank, dims, grad)?;
                graph.div(expanded, d)?
            } else {
                // Output retains unreduced axes; implicit broadcasting
                // aligns the quotient in the multiply below
                graph.div(grad, d)?
            };
            graph.mul(difference, quotient)?
        }
        DistanceKind::Manhattan => {
            // ∂|x - y|/∂x = sign(x - y)
            let direction = graph.sign(difference);
            let aligned_grad = if !all_distances && dims.is_all() {
                graph.broadcast_reduction_gradient(orig_rank, dims, grad)?
            } else {
                grad
            };
            graph.mul(direction, aligned_grad)?
        }
    };

    let grad_y = graph.neg(grad_x);
    Ok(vec![grad_x, grad_y])
}
