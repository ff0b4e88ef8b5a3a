//! Structured errors emitted by the predicate compiler.

use thiserror::Error;

/// Convenience alias for compiler results.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Coarse error category; see [`CompileError::category`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Caller/programmer misuse: malformed tree shape, wrong operand arity,
    /// unrecognized node kinds.
    Misuse,
    /// Predicate validation: unsupported operators, type mismatches,
    /// unresolved key paths.
    Validation,
}

/// Errors raised while compiling a predicate tree into constraints.
///
/// Any error is fatal to the in-progress compilation and leaves the query
/// accumulator in an unspecified, discard-only state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Key path referenced an unknown entity or property.
    #[error("invalid key path '{key_path}': {detail}")]
    InvalidKeyPath {
        /// Offending key path.
        key_path: String,
        /// What failed to resolve.
        detail: String,
    },
    /// Structurally malformed predicate: bad arity, bad operand shape, or a
    /// modifier/type mismatch.
    #[error("invalid predicate: {detail}")]
    InvalidPredicate {
        /// Shape violation description.
        detail: String,
    },
    /// Node or operator the compiler does not recognize at all.
    #[error("unsupported predicate: {detail}")]
    UnsupportedPredicate {
        /// What was not recognized.
        detail: String,
    },
    /// Operator is not legal for the resolved property type.
    #[error("operator {operator} not supported for {type_name} properties")]
    UnsupportedOperator {
        /// Resolved property type name.
        type_name: &'static str,
        /// Operator spelling.
        operator: &'static str,
    },
    /// Predicate option the engine cannot honor.
    #[error("option '{option}' not supported with operator {operator}")]
    UnsupportedOption {
        /// Option name.
        option: &'static str,
        /// Operator spelling.
        operator: &'static str,
    },
    /// Compared operands resolve to different property types.
    #[error("cannot compare '{key_path}': expected {expected}, got {actual}")]
    PropertiesTypeMismatch {
        /// Key path of the left operand.
        key_path: String,
        /// Declared type of the left operand.
        expected: &'static str,
        /// Actual type of the right operand.
        actual: &'static str,
    },
    /// Direct key-path comparison crossed a link.
    #[error("key path '{key_path}' crosses a link; multi-level column comparison is unsupported")]
    MultiLevelComparisonUnsupported {
        /// Offending key path.
        key_path: String,
    },
    /// Leaf type cannot be reached through a link chain.
    #[error("{type_name} property at '{key_path}' cannot be queried through a link chain")]
    MultiLevelLinkUnsupported {
        /// Offending key path.
        key_path: String,
        /// Leaf type name.
        type_name: &'static str,
    },
    /// Sort key is not usable for ordering.
    #[error("cannot sort by '{property}': {detail}")]
    InvalidSortProperty {
        /// Requested sort property.
        property: String,
        /// Why it was rejected.
        detail: String,
    },
    /// Predicate tree nesting exceeds the allowed depth.
    #[error("predicate tree exceeds depth {max}")]
    PredicateTooDeep {
        /// Configured depth limit.
        max: usize,
    },
    /// Engine-side validation failed after a structurally successful walk;
    /// the engine's diagnostic is carried verbatim.
    #[error("engine validation failed: {message}")]
    EngineValidation {
        /// Engine diagnostic message.
        message: String,
    },
}

impl CompileError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::InvalidKeyPath { .. } => "InvalidKeyPath",
            CompileError::InvalidPredicate { .. } => "InvalidPredicate",
            CompileError::UnsupportedPredicate { .. } => "UnsupportedPredicate",
            CompileError::UnsupportedOperator { .. } => "UnsupportedOperator",
            CompileError::UnsupportedOption { .. } => "UnsupportedOption",
            CompileError::PropertiesTypeMismatch { .. } => "PropertiesTypeMismatch",
            CompileError::MultiLevelComparisonUnsupported { .. } => {
                "MultiLevelComparisonUnsupported"
            }
            CompileError::MultiLevelLinkUnsupported { .. } => "MultiLevelLinkUnsupported",
            CompileError::InvalidSortProperty { .. } => "InvalidSortProperty",
            CompileError::PredicateTooDeep { .. } => "PredicateTooDeep",
            CompileError::EngineValidation { .. } => "EngineValidation",
        }
    }

    /// Splits errors into programmer misuse and predicate validation.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompileError::InvalidPredicate { .. }
            | CompileError::UnsupportedPredicate { .. }
            | CompileError::PredicateTooDeep { .. } => ErrorCategory::Misuse,
            _ => ErrorCategory::Validation,
        }
    }

    pub(crate) fn invalid_predicate(detail: impl Into<String>) -> Self {
        CompileError::InvalidPredicate {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_key_path(key_path: &str, detail: impl Into<String>) -> Self {
        CompileError::InvalidKeyPath {
            key_path: key_path.to_owned(),
            detail: detail.into(),
        }
    }
}
