//! Per-operation differentiation rules
//!
//! Each rule receives the incoming gradient variable for a node's output
//! and returns one gradient variable per input, in input order. Rules are
//! pure: they append gradient nodes to the graph and never mutate existing
//! nodes.

mod elementwise;
mod reduce3;

use crate::autograd::graph::{Graph, Var};
use crate::autograd::node::{NodeId, Operation};
use crate::error::{TensorError, TensorResult};

/// Dispatch the differentiation rule for one node
pub(crate) fn diff(
    graph: &mut Graph,
    node_id: NodeId,
    operation: &Operation,
    inputs: &[NodeId],
    grad: Var,
) -> TensorResult<Vec<Var>> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let first = graph.create_variable(inputs[0], 0);

    match operation {
        Operation::Leaf => Ok(Vec::new()),

        // Constant outputs: no gradient flows to the shape source
        Operation::OnesLike | Operation::ZerosLike => {
            let zero = graph.zeros_like(first);
            Ok(vec![zero])
        }

        Operation::Add => {
            let second = graph.create_variable(inputs[1], 0);
            elementwise::add(graph, first, second, grad)
        }
        Operation::Sub => {
            let second = graph.create_variable(inputs[1], 0);
            elementwise::sub(graph, first, second, grad)
        }
        Operation::Mul => {
            let second = graph.create_variable(inputs[1], 0);
            elementwise::mul(graph, first, second, grad)
        }
        Operation::Div => {
            let second = graph.create_variable(inputs[1], 0);
            elementwise::div(graph, first, second, grad)
        }
        Operation::Neg => Ok(vec![graph.neg(grad)]),

        // sign is flat almost everywhere
        Operation::Sign => {
            let zero = graph.zeros_like(first);
            Ok(vec![zero])
        }

        Operation::BroadcastTo(_) => {
            let input_shape = resolved_shape(graph, first)?;
            Ok(vec![graph.sum_to(grad, input_shape)?])
        }

        Operation::SumTo(_) => {
            let input_shape = resolved_shape(graph, first)?;
            Ok(vec![graph.broadcast_to(grad, input_shape)?])
        }

        // The re-expansion is a reshape, so gradient flows back by summing
        // to the reduced shape
        Operation::ReductionGradBroadcast { .. } => {
            let input_shape = resolved_shape(graph, first)?;
            Ok(vec![graph.sum_to(grad, input_shape)?])
        }

        Operation::Reduce3 {
            kind,
            dims,
            all_distances,
        } => {
            let second = graph.create_variable(inputs[1], 0);
            reduce3::diff(
                graph,
                node_id,
                *kind,
                dims,
                *all_distances,
                first,
                second,
                grad,
            )
        }
    }
}

pub(crate) fn resolved_shape(graph: &Graph, var: Var) -> TensorResult<crate::tensor::TensorShape> {
    graph.shape_of(var).cloned().ok_or_else(|| {
        TensorError::ShapeNotResolved(format!(
            "node {} must have a resolved shape before backward",
            var.node_id()
        ))
    })
}
