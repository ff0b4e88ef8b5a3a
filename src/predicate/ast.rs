//! Predicate tree handed to the compiler.
//!
//! The tree arrives already parsed; this module only defines its shape. The
//! variants form a closed set so the compiler can match them exhaustively and
//! new node kinds cannot silently fall through to an "unsupported" default.

use serde::{Deserialize, Serialize};

use crate::predicate::Value;

/// Logical connective of a [`PredicateNode::Compound`] node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompoundKind {
    /// Every child must hold; an empty conjunction is vacuously true.
    And,
    /// At least one child must hold; an empty alternation matches nothing.
    Or,
    /// Exactly one child, whose result is inverted.
    Not,
}

/// Comparison operator attached to a [`ComparisonNode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// String/binary prefix match.
    BeginsWith,
    /// String/binary suffix match.
    EndsWith,
    /// String/binary containment.
    Contains,
    /// Inclusive range; the right operand is a pair of constants.
    Between,
    /// Membership; the right operand is a collection of constants.
    In,
}

impl CompareOp {
    /// Operator spelling used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::BeginsWith => "BEGINSWITH",
            CompareOp::EndsWith => "ENDSWITH",
            CompareOp::Contains => "CONTAINS",
            CompareOp::Between => "BETWEEN",
            CompareOp::In => "IN",
        }
    }
}

/// Aggregate modifier on a comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Modifier {
    /// Plain comparison against a to-one reachable value.
    #[default]
    Direct,
    /// Holds if at least one element of a to-many leaf satisfies the
    /// comparison. Legal only when the key path ends in a to-many link.
    Any,
    /// Universal quantification; never supported by the compiler.
    All,
}

/// Options attached to a comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Case-insensitive string matching.
    pub case_insensitive: bool,
    /// Diacritic-insensitive string matching; recognized but unsupported.
    pub diacritic_insensitive: bool,
}

impl CompareOptions {
    /// Options requesting case-insensitive string matching.
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            diacritic_insensitive: false,
        }
    }
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Dotted key path rooted at the entity under compilation.
    KeyPath(String),
    /// Constant value.
    Value(Value),
}

impl Operand {
    /// Builds a key-path operand.
    pub fn key_path(path: impl Into<String>) -> Self {
        Operand::KeyPath(path.into())
    }

    /// Builds a constant operand.
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }
}

/// Comparison leaf of the predicate tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonNode {
    /// Left operand; operand order is preserved because some operators are
    /// directional.
    pub left: Operand,
    /// Right operand.
    pub right: Operand,
    /// Comparison operator.
    pub op: CompareOp,
    /// String matching options.
    pub options: CompareOptions,
    /// Aggregate modifier.
    pub modifier: Modifier,
}

impl ComparisonNode {
    /// Builds a plain comparison with default options and modifier.
    pub fn new(left: Operand, op: CompareOp, right: Operand) -> Self {
        Self {
            left,
            right,
            op,
            options: CompareOptions::default(),
            modifier: Modifier::default(),
        }
    }

    /// Sets the comparison options.
    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the aggregate modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }
}

/// Immutable predicate tree; the input of one compilation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PredicateNode {
    /// Logical grouping of child predicates.
    Compound {
        /// Connective applied to the children.
        kind: CompoundKind,
        /// Ordered child predicates.
        children: Vec<PredicateNode>,
    },
    /// Comparison leaf.
    Comparison(ComparisonNode),
    /// Constant boolean predicate: matches every row or no row without
    /// inspecting any column.
    Literal(bool),
}

impl PredicateNode {
    /// Conjunction of `children`.
    pub fn and(children: Vec<PredicateNode>) -> Self {
        PredicateNode::Compound {
            kind: CompoundKind::And,
            children,
        }
    }

    /// Disjunction of `children`.
    pub fn or(children: Vec<PredicateNode>) -> Self {
        PredicateNode::Compound {
            kind: CompoundKind::Or,
            children,
        }
    }

    /// Negation of a single child.
    pub fn not(child: PredicateNode) -> Self {
        PredicateNode::Compound {
            kind: CompoundKind::Not,
            children: vec![child],
        }
    }

    /// Comparison leaf shorthand.
    pub fn cmp(left: Operand, op: CompareOp, right: Operand) -> Self {
        PredicateNode::Comparison(ComparisonNode::new(left, op, right))
    }
}
