//! Operator identity catalog
//!
//! Every operator carries a stable symbolic name (lookup/serialization), a
//! numeric opcode within its category (fast dispatch), and optional export
//! names for the ONNX and TensorFlow interchange formats. Export lookups
//! for unsupported operators fail with `NameNotFound`; downstream export
//! tooling uses that failure to fall back to a custom op encoding.

use crate::error::{TensorError, TensorResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Operator category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCategory {
    /// Two input operands reduced along a dimension set
    Reduce3,
    /// Element-wise binary transform
    Pairwise,
    /// Element-wise unary transform
    Unary,
}

/// Immutable operator identity record
#[derive(Debug)]
pub struct OpDescriptor {
    /// Stable symbolic name
    pub name: &'static str,
    /// Numeric opcode within the category
    pub opcode: u16,
    /// Operator category
    pub category: OpCategory,
    onnx: Option<&'static str>,
    tensorflow: Option<&'static str>,
}

impl OpDescriptor {
    pub const fn new(
        name: &'static str,
        opcode: u16,
        category: OpCategory,
        onnx: Option<&'static str>,
        tensorflow: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            opcode,
            category,
            onnx,
            tensorflow,
        }
    }

    /// ONNX export name, or `NameNotFound` when the operator has no ONNX
    /// equivalent
    pub fn onnx_name(&self) -> TensorResult<&'static str> {
        self.onnx.ok_or(TensorError::NameNotFound {
            op: self.name,
            format: "onnx",
        })
    }

    /// TensorFlow export name, or `NameNotFound` when the operator has no
    /// TensorFlow equivalent
    pub fn tensorflow_name(&self) -> TensorResult<&'static str> {
        self.tensorflow.ok_or(TensorError::NameNotFound {
            op: self.name,
            format: "tensorflow",
        })
    }
}

// The reduce-3 distance operators have no equivalent concept in either
// interchange format.
pub static MANHATTAN: OpDescriptor =
    OpDescriptor::new("manhattan", 0, OpCategory::Reduce3, None, None);
pub static EUCLIDEAN: OpDescriptor =
    OpDescriptor::new("euclidean", 1, OpCategory::Reduce3, None, None);

static ADD: OpDescriptor =
    OpDescriptor::new("add", 0, OpCategory::Pairwise, Some("Add"), Some("Add"));
static SUB: OpDescriptor =
    OpDescriptor::new("sub", 1, OpCategory::Pairwise, Some("Sub"), Some("Sub"));
static MUL: OpDescriptor =
    OpDescriptor::new("mul", 2, OpCategory::Pairwise, Some("Mul"), Some("Mul"));
static DIV: OpDescriptor = OpDescriptor::new(
    "div",
    3,
    OpCategory::Pairwise,
    Some("Div"),
    Some("RealDiv"),
);
static NEG: OpDescriptor =
    OpDescriptor::new("neg", 6, OpCategory::Unary, Some("Neg"), Some("Neg"));

/// Operator catalog keyed by name and by (category, opcode)
pub struct OpRegistry {
    by_name: HashMap<&'static str, &'static OpDescriptor>,
    by_opcode: HashMap<(OpCategory, u16), &'static OpDescriptor>,
}

impl OpRegistry {
    fn with_descriptors(descriptors: &[&'static OpDescriptor]) -> Self {
        let mut by_name = HashMap::new();
        let mut by_opcode = HashMap::new();

        for &desc in descriptors {
            by_name.insert(desc.name, desc);
            by_opcode.insert((desc.category, desc.opcode), desc);
        }

        Self { by_name, by_opcode }
    }

    /// The global operator catalog
    pub fn global() -> &'static OpRegistry {
        static REGISTRY: Lazy<OpRegistry> = Lazy::new(|| {
            OpRegistry::with_descriptors(&[
                &MANHATTAN,
                &EUCLIDEAN,
                &ADD,
                &SUB,
                &MUL,
                &DIV,
                &NEG,
            ])
        });
        &REGISTRY
    }

    /// Look up an operator by symbolic name
    pub fn by_name(&self, name: &str) -> Option<&'static OpDescriptor> {
        self.by_name.get(name).copied()
    }

    /// Look up an operator by category and opcode
    pub fn by_opcode(&self, category: OpCategory, opcode: u16) -> Option<&'static OpDescriptor> {
        self.by_opcode.get(&(category, opcode)).copied()
    }

    /// Number of registered operators
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let registry = OpRegistry::global();
        let desc = registry.by_name("euclidean").unwrap();
        assert_eq!(desc.opcode, 1);
        assert_eq!(desc.category, OpCategory::Reduce3);
    }

    #[test]
    fn test_lookup_by_opcode() {
        let registry = OpRegistry::global();
        let desc = registry.by_opcode(OpCategory::Reduce3, 0).unwrap();
        assert_eq!(desc.name, "manhattan");
    }

    #[test]
    fn test_unknown_name() {
        assert!(OpRegistry::global().by_name("hamming").is_none());
    }

    #[test]
    fn test_distance_export_names_unsupported() {
        for desc in [&EUCLIDEAN, &MANHATTAN] {
            assert!(matches!(
                desc.onnx_name(),
                Err(TensorError::NameNotFound { format: "onnx", .. })
            ));
            assert!(matches!(
                desc.tensorflow_name(),
                Err(TensorError::NameNotFound {
                    format: "tensorflow",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_pairwise_export_names() {
        let registry = OpRegistry::global();
        let div = registry.by_name("div").unwrap();
        assert_eq!(div.onnx_name().unwrap(), "Div");
        assert_eq!(div.tensorflow_name().unwrap(), "RealDiv");
    }
}
