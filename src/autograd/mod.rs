mod gradcheck;
mod gradients;
mod graph;
mod node;

pub use gradcheck::{GradCheckConfig, GradCheckResult, GradientChecker};
pub use graph::{Graph, Var};
pub use node::{Node, NodeId, Operation};
