//! 計算グラフ（動的に構築される）
//!
//! Nodes are appended in construction order, which is already a
//! topological order of the forward graph. Differentiation builds new
//! gradient nodes into the same graph; existing nodes are never mutated
//! after their output shape is attached.

use crate::autograd::gradients;
use crate::autograd::node::{Node, NodeId, Operation};
use crate::error::{TensorError, TensorResult};
use crate::ops::distance::{infer_output_shape, DistanceKind};
use crate::tensor::{elementwise_shapes, FloatType, ReduceDims, Tensor, TensorShape};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Symbolic handle to a node output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var {
    pub(crate) node: NodeId,
    pub(crate) index: usize,
}

impl Var {
    /// The producing node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Output index on the producing node
    pub fn output_index(&self) -> usize {
        self.index
    }
}

/// Symbolic computation graph
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Borrow a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn push(&mut self, operation: Operation, inputs: Vec<NodeId>, shape: Option<TensorShape>) -> Var {
        let id = self.nodes.len();
        trace!("graph: node {} = {} {:?}", id, operation.name(), inputs);
        self.nodes.push(Node::new(id, operation, inputs, shape));
        Var { node: id, index: 0 }
    }

    /// Create an input variable with a known shape
    pub fn variable(&mut self, shape: TensorShape) -> Var {
        self.push(Operation::Leaf, Vec::new(), Some(shape))
    }

    /// Create an input variable whose shape is resolved later
    pub fn placeholder(&mut self) -> Var {
        self.push(Operation::Leaf, Vec::new(), None)
    }

    /// Symbolic handle to an existing node's output
    pub fn create_variable(&self, node: NodeId, index: usize) -> Var {
        Var { node, index }
    }

    /// The inferred shape of a variable, if resolved
    pub fn shape_of(&self, var: Var) -> Option<&TensorShape> {
        self.nodes.get(var.node)?.output_shape.as_ref()
    }

    /// The rank of a variable; fails when the shape is not yet resolved
    pub fn rank_of(&self, var: Var) -> TensorResult<usize> {
        self.shape_of(var).map(|s| s.rank()).ok_or_else(|| {
            TensorError::ShapeNotResolved(format!("node {} has no inferred shape", var.node))
        })
    }

    /// Bind the shape of a placeholder leaf
    pub fn bind_shape(&mut self, var: Var, shape: TensorShape) -> TensorResult<()> {
        let node = self
            .nodes
            .get_mut(var.node)
            .ok_or_else(|| TensorError::InvalidOperation(format!("no node {}", var.node)))?;

        if node.operation != Operation::Leaf {
            return Err(TensorError::InvalidOperation(
                "only leaf variables can be bound to a shape".to_string(),
            ));
        }

        match &node.output_shape {
            Some(existing) if !existing.is_same(&shape) => Err(TensorError::ShapeMismatch {
                expected: existing.dims().to_vec(),
                actual: shape.dims().to_vec(),
            }),
            _ => {
                node.output_shape = Some(shape);
                Ok(())
            }
        }
    }

    /// Run shape inference over nodes whose shapes are still unresolved.
    ///
    /// This is the one-time output attachment point; it must complete
    /// before `backward` and is not safe to run concurrently on the same
    /// graph.
    pub fn finalize_shapes(&mut self) -> TensorResult<()> {
        for id in 0..self.nodes.len() {
            if self.nodes[id].output_shape.is_some()
                || self.nodes[id].operation == Operation::Leaf
            {
                continue;
            }

            let operation = self.nodes[id].operation.clone();
            let input_shapes: Option<Vec<TensorShape>> = self.nodes[id]
                .inputs
                .iter()
                .map(|&input| self.nodes[input].output_shape.clone())
                .collect();

            if let Some(shapes) = input_shapes {
                let inferred = infer_shape(&operation, &shapes)?;
                self.nodes[id].output_shape = Some(inferred);
            }
        }

        Ok(())
    }

    fn unary(&mut self, operation: Operation, input: Var) -> Var {
        // Unary ops carry their input's shape through unchanged
        let shape = self.shape_of(input).cloned();
        self.push(operation, vec![input.node], shape)
    }

    fn binary(&mut self, operation: Operation, a: Var, b: Var) -> TensorResult<Var> {
        let shape = match (self.shape_of(a), self.shape_of(b)) {
            (Some(sa), Some(sb)) => Some(infer_shape(&operation, &[sa.clone(), sb.clone()])?),
            _ => None,
        };
        Ok(self.push(operation, vec![a.node, b.node], shape))
    }

    /// Element-wise addition of two operands
    pub fn add(&mut self, a: Var, b: Var) -> TensorResult<Var> {
        self.binary(Operation::Add, a, b)
    }

    /// Element-wise subtraction
    pub fn sub(&mut self, a: Var, b: Var) -> TensorResult<Var> {
        self.binary(Operation::Sub, a, b)
    }

    /// Element-wise multiplication
    pub fn mul(&mut self, a: Var, b: Var) -> TensorResult<Var> {
        self.binary(Operation::Mul, a, b)
    }

    /// Element-wise division
    pub fn div(&mut self, a: Var, b: Var) -> TensorResult<Var> {
        self.binary(Operation::Div, a, b)
    }

    /// Element-wise negation
    pub fn neg(&mut self, a: Var) -> Var {
        self.unary(Operation::Neg, a)
    }

    /// Element-wise sign
    pub fn sign(&mut self, a: Var) -> Var {
        self.unary(Operation::Sign, a)
    }

    pub(crate) fn ones_like(&mut self, a: Var) -> Var {
        self.unary(Operation::OnesLike, a)
    }

    pub(crate) fn zeros_like(&mut self, a: Var) -> Var {
        self.unary(Operation::ZerosLike, a)
    }

    /// Broadcast an operand up to the given shape
    pub fn broadcast_to(&mut self, a: Var, shape: TensorShape) -> TensorResult<Var> {
        let operation = Operation::BroadcastTo(shape);
        let inferred = match self.shape_of(a) {
            Some(s) => Some(infer_shape(&operation, std::slice::from_ref(s))?),
            None => None,
        };
        Ok(self.push(operation, vec![a.node], inferred))
    }

    /// Sum an operand down to a broadcast-compatible shape
    pub fn sum_to(&mut self, a: Var, shape: TensorShape) -> TensorResult<Var> {
        let operation = Operation::SumTo(shape);
        let inferred = match self.shape_of(a) {
            Some(s) => Some(infer_shape(&operation, std::slice::from_ref(s))?),
            None => None,
        };
        Ok(self.push(operation, vec![a.node], inferred))
    }

    /// Re-expand a reduced gradient to the rank-preserving broadcast shape
    /// for a tensor of rank `rank` reduced along `dims`
    pub fn broadcast_reduction_gradient(
        &mut self,
        rank: usize,
        dims: &ReduceDims,
        grad: Var,
    ) -> TensorResult<Var> {
        let axes = dims.resolve(rank)?;
        let operation = Operation::ReductionGradBroadcast { rank, axes };
        let inferred = match self.shape_of(grad) {
            Some(s) => Some(infer_shape(&operation, std::slice::from_ref(s))?),
            None => None,
        };
        Ok(self.push(operation, vec![grad.node], inferred))
    }

    /// Reduce-3 distance between two operands along `dims`
    pub fn distance(
        &mut self,
        kind: DistanceKind,
        x: Var,
        y: Var,
        dims: ReduceDims,
    ) -> TensorResult<Var> {
        self.distance_with_mode(kind, x, y, dims, false)
    }

    /// Self-comparison distance: both operands are the same variable,
    /// reduced over all axes
    pub fn distance_self(&mut self, kind: DistanceKind, x: Var) -> TensorResult<Var> {
        self.distance_with_mode(kind, x, x, ReduceDims::All, false)
    }

    /// Element-wise distance map of two operands
    pub fn all_distances(&mut self, kind: DistanceKind, x: Var, y: Var) -> TensorResult<Var> {
        self.distance_with_mode(kind, x, y, ReduceDims::All, true)
    }

    /// Reduce-3 distance with an explicit mode selector. All-distances
    /// mode and an explicit axis list are mutually exclusive.
    pub fn distance_with_mode(
        &mut self,
        kind: DistanceKind,
        x: Var,
        y: Var,
        dims: ReduceDims,
        all_distances: bool,
    ) -> TensorResult<Var> {
        if all_distances && !dims.is_all() {
            return Err(TensorError::InvalidOperation(
                "all-distances mode is incompatible with an explicit reduction axis list"
                    .to_string(),
            ));
        }

        debug!(
            "graph: {} node over ({}, {}), dims {:?}, all_distances {}",
            kind.op_name(),
            x.node,
            y.node,
            dims,
            all_distances
        );

        self.binary(
            Operation::Reduce3 {
                kind,
                dims,
                all_distances,
            },
            x,
            y,
        )
    }

    /// 逆伝播: build the gradient subgraph for every node feeding `output`.
    ///
    /// The seed gradient is a tensor of ones shaped like the output.
    /// Returns a map from node ID to the accumulated gradient variable.
    pub fn backward(&mut self, output: Var) -> TensorResult<HashMap<NodeId, Var>> {
        let checkpoint = self.nodes.len();
        let seed = self.ones_like(output);
        self.backward_checkpointed(output, seed, checkpoint)
    }

    /// 逆伝播 with an explicit incoming gradient for the output
    pub fn backward_with(
        &mut self,
        output: Var,
        grad: Var,
    ) -> TensorResult<HashMap<NodeId, Var>> {
        let checkpoint = self.nodes.len();
        self.backward_checkpointed(output, grad, checkpoint)
    }

    /// On failure no graph mutation stays observable: gradient nodes are
    /// only appended, so truncating to the checkpoint is a full rollback.
    fn backward_checkpointed(
        &mut self,
        output: Var,
        grad: Var,
        checkpoint: usize,
    ) -> TensorResult<HashMap<NodeId, Var>> {
        let result = self.backward_impl(output, grad);
        if result.is_err() {
            self.nodes.truncate(checkpoint);
        }
        result
    }

    fn backward_impl(&mut self, output: Var, grad: Var) -> TensorResult<HashMap<NodeId, Var>> {
        let order = self.topological_sort(output.node);
        debug!(
            "backward: {} nodes reachable from node {}",
            order.len(),
            output.node
        );

        let mut grads: HashMap<NodeId, Var> = HashMap::new();
        grads.insert(output.node, grad);

        // トポロジカル順の逆順で処理（根ノードから葉ノードへ）
        for &id in order.iter().rev() {
            let Some(&incoming) = grads.get(&id) else {
                continue;
            };

            let operation = self.nodes[id].operation.clone();
            let inputs = self.nodes[id].inputs.clone();
            if inputs.is_empty() {
                continue;
            }

            let input_grads = gradients::diff(self, id, &operation, &inputs, incoming)?;
            debug_assert_eq!(input_grads.len(), inputs.len());

            for (&input_id, &input_grad) in inputs.iter().zip(input_grads.iter()) {
                // 複数パスからの勾配を合算
                match grads.get(&input_id) {
                    Some(&existing) => {
                        let summed = self.add(existing, input_grad)?;
                        grads.insert(input_id, summed);
                    }
                    None => {
                        grads.insert(input_id, input_grad);
                    }
                }
            }
        }

        Ok(grads)
    }

    /// Evaluate a variable over concrete leaf bindings (reference CPU
    /// executor, topological walk)
    pub fn eval<T: FloatType>(
        &self,
        target: Var,
        bindings: &HashMap<Var, Tensor<T>>,
    ) -> TensorResult<Tensor<T>> {
        let order = self.topological_sort(target.node);
        let mut values: HashMap<NodeId, Tensor<T>> = HashMap::new();

        for &id in &order {
            let node = &self.nodes[id];
            let value = self.eval_node(node, bindings, &values)?;
            values.insert(id, value);
        }

        values
            .remove(&target.node)
            .ok_or_else(|| TensorError::InvalidOperation(format!("node {} not evaluated", target.node)))
    }

    fn eval_node<T: FloatType>(
        &self,
        node: &Node,
        bindings: &HashMap<Var, Tensor<T>>,
        values: &HashMap<NodeId, Tensor<T>>,
    ) -> TensorResult<Tensor<T>> {
        fn fetch<'a, T: FloatType>(
            values: &'a HashMap<NodeId, Tensor<T>>,
            node: &Node,
            k: usize,
        ) -> TensorResult<&'a Tensor<T>> {
            let id = node.inputs[k];
            values
                .get(&id)
                .ok_or_else(|| TensorError::InvalidOperation(format!("node {} not evaluated", id)))
        }

        let input = |k: usize| fetch(values, node, k);

        match &node.operation {
            Operation::Leaf => bindings
                .get(&Var {
                    node: node.id,
                    index: 0,
                })
                .cloned()
                .ok_or_else(|| {
                    TensorError::InvalidOperation(format!("no binding for leaf node {}", node.id))
                }),
            Operation::OnesLike => Ok(Tensor::ones(input(0)?.dims().to_vec())),
            Operation::ZerosLike => Ok(Tensor::zeros(input(0)?.dims().to_vec())),
            Operation::Add => input(0)?.add(input(1)?),
            Operation::Sub => input(0)?.sub(input(1)?),
            Operation::Mul => input(0)?.mul(input(1)?),
            Operation::Div => input(0)?.div(input(1)?),
            Operation::Neg => Ok(input(0)?.neg()),
            Operation::Sign => Ok(input(0)?.sign()),
            Operation::BroadcastTo(shape) => input(0)?.broadcast_to(shape),
            Operation::SumTo(shape) => input(0)?.sum_to(shape),
            Operation::ReductionGradBroadcast { rank, axes } => {
                input(0)?.expand_reduced(axes, *rank)
            }
            Operation::Reduce3 {
                kind,
                dims,
                all_distances,
            } => {
                let x = input(0)?;
                let y = input(1)?;
                let common = x.shape().broadcast_with(y.shape())?;
                let x = x.broadcast_to(&common)?;
                let y = y.broadcast_to(&common)?;

                if *all_distances {
                    crate::ops::reduce::reduce3_map(*kind, &x, &y)
                } else {
                    match dims {
                        ReduceDims::All => crate::ops::reduce::reduce3_all(*kind, &x, &y),
                        ReduceDims::Axes(axes) => {
                            crate::ops::reduce::reduce3_axes(*kind, &x, &y, axes)
                        }
                    }
                }
            }
        }
    }

    /// トポロジカルソート（DFS、帰りがけ順）
    fn topological_sort(&self, start: NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.dfs(start, &mut visited, &mut order);
        order
    }

    fn dfs(&self, id: NodeId, visited: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
        if !visited.insert(id) {
            return;
        }

        if let Some(node) = self.nodes.get(id) {
            for &input in &node.inputs {
                self.dfs(input, visited, order);
            }
        }

        order.push(id);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Output shape of an operation over the given input shapes
fn infer_shape(operation: &Operation, input_shapes: &[TensorShape]) -> TensorResult<TensorShape> {
    match operation {
        Operation::Leaf => Err(TensorError::ShapeNotResolved(
            "leaf shape must be bound, not inferred".to_string(),
        )),
        Operation::OnesLike
        | Operation::ZerosLike
        | Operation::Neg
        | Operation::Sign => Ok(input_shapes[0].clone()),
        Operation::Add | Operation::Sub | Operation::Mul | Operation::Div => {
            let (_, _, out) = elementwise_shapes(&input_shapes[0], &input_shapes[1])?;
            Ok(out)
        }
        Operation::BroadcastTo(target) => {
            if !input_shapes[0].can_broadcast_to(target) {
                return Err(TensorError::ShapeMismatch {
                    expected: target.dims().to_vec(),
                    actual: input_shapes[0].dims().to_vec(),
                });
            }
            Ok(target.clone())
        }
        Operation::SumTo(target) => {
            if !target.can_broadcast_to(&input_shapes[0])
                && target.align_reduced(&input_shapes[0]).is_none()
            {
                return Err(TensorError::ShapeMismatch {
                    expected: target.dims().to_vec(),
                    actual: input_shapes[0].dims().to_vec(),
                });
            }
            Ok(target.clone())
        }
        Operation::ReductionGradBroadcast { rank, axes } => {
            input_shapes[0].unsqueeze_axes(axes, *rank)
        }
        Operation::Reduce3 {
            dims,
            all_distances,
            ..
        } => {
            let common = input_shapes[0].broadcast_with(&input_shapes[1])?;
            infer_output_shape(&common, dims, *all_distances)
        }
    }
}
