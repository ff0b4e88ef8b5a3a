//! Predicate tree model: values, operators, and the node variants consumed
//! by the compiler.

/// Predicate tree node definitions.
pub mod ast;

/// Scalar value representation.
pub mod value;

pub use ast::{
    CompareOp, CompareOptions, ComparisonNode, CompoundKind, Modifier, Operand, PredicateNode,
};
pub use value::Value;
