use crate::ops::distance::DistanceKind;
use crate::tensor::{ReduceDims, TensorShape};

/// ノードID（計算グラフ内のノードを識別）
pub type NodeId = usize;

/// 演算の種類
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Input variable or placeholder (no producer)
    Leaf,
    /// Constant tensor of ones with the input's shape
    OnesLike,
    /// Constant tensor of zeros with the input's shape
    ZerosLike,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Sign,
    /// Broadcast the input up to the given shape
    BroadcastTo(TensorShape),
    /// Sum the input down to the given broadcast-compatible shape
    SumTo(TensorShape),
    /// Re-expand a reduced gradient to the rank-preserving broadcast shape
    /// (size-1 axes re-inserted at each reduced position)
    ReductionGradBroadcast { rank: usize, axes: Vec<usize> },
    /// Reduce-3 distance over two operands
    Reduce3 {
        kind: DistanceKind,
        dims: ReduceDims,
        all_distances: bool,
    },
}

impl Operation {
    /// Short name for logging and registry correlation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Leaf => "leaf",
            Operation::OnesLike => "ones_like",
            Operation::ZerosLike => "zeros_like",
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Mul => "mul",
            Operation::Div => "div",
            Operation::Neg => "neg",
            Operation::Sign => "sign",
            Operation::BroadcastTo(_) => "broadcast_to",
            Operation::SumTo(_) => "sum_to",
            Operation::ReductionGradBroadcast { .. } => "reduction_grad_broadcast",
            Operation::Reduce3 { kind, .. } => kind.op_name(),
        }
    }
}

/// 計算グラフのノード
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub operation: Operation,
    pub inputs: Vec<NodeId>,
    pub(crate) output_shape: Option<TensorShape>,
}

impl Node {
    pub fn new(
        id: NodeId,
        operation: Operation,
        inputs: Vec<NodeId>,
        output_shape: Option<TensorShape>,
    ) -> Self {
        Self {
            id,
            operation,
            inputs,
            output_shape,
        }
    }

    /// Inferred output shape, if resolved
    pub fn output_shape(&self) -> Option<&TensorShape> {
        self.output_shape.as_ref()
    }
}
