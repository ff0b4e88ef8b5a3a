//! Query accumulator boundary.
//!
//! The compiler produces constraints into an externally-owned, mutable
//! [`QuerySink`]. The trait mirrors the grouping primitives of the embedded
//! engine: explicit group scopes for AND/OR precedence, a negation toggle,
//! and scoped link-chain entry. Link chains are passed as data so sibling
//! constraint builds never share a hidden traversal cursor.

/// In-memory accumulator and row store used by tests and prototyping.
pub mod memory;

use crate::predicate::Value;
use crate::types::{ColumnIx, ObjRef, RowId};

pub use memory::{MemorySink, MemoryStore, QueryNode, Row};

/// Leaf comparison operator understood by the engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeafOp {
    /// Equality.
    Equal,
    /// Inequality.
    NotEqual,
    /// Strictly less than.
    Less,
    /// Less than or equal.
    LessOrEqual,
    /// Strictly greater than.
    Greater,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Prefix match.
    BeginsWith,
    /// Suffix match.
    EndsWith,
    /// Containment.
    Contains,
}

/// Leaf constraint over one resolved column.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Compares a column against a constant.
    Compare {
        /// Column holding the compared value.
        column: ColumnIx,
        /// Comparison operator.
        op: LeafOp,
        /// Constant operand.
        value: Value,
        /// Case-insensitive string matching.
        case_insensitive: bool,
    },
    /// Compares two columns of the same entity.
    CompareColumns {
        /// Left column.
        lhs: ColumnIx,
        /// Right column.
        rhs: ColumnIx,
        /// Comparison operator.
        op: LeafOp,
        /// Case-insensitive string matching.
        case_insensitive: bool,
    },
    /// Compares a link column against a row identity, or against "unset"
    /// when `target` is `None`.
    LinkCompare {
        /// Link column.
        column: ColumnIx,
        /// Target row identity; `None` matches unset links.
        target: Option<RowId>,
        /// Inverts the equality.
        negated: bool,
    },
    /// Synthetic leaf matching every row.
    MatchAll,
    /// Synthetic leaf matching no row.
    MatchNone,
}

/// Externally-owned, mutable query accumulator.
///
/// One compilation call owns the sink for its duration. On success the sink
/// is left populated; on failure its state is unspecified and must be
/// discarded. The compiler performs no locking; a single sink must never be
/// mutated by two compilations concurrently.
pub trait QuerySink {
    /// Opens a grouping scope.
    fn begin_group(&mut self);

    /// Closes the innermost grouping scope.
    fn end_group(&mut self);

    /// Signals that the next clause in the current scope is an alternative
    /// (OR) rather than a conjunct.
    fn or(&mut self);

    /// Toggles negation for the next clause in the current scope.
    fn not(&mut self);

    /// Enters a link chain; the columns are applied in traversal order and
    /// scope every constraint pushed before the matching [`end_links`].
    ///
    /// [`end_links`]: QuerySink::end_links
    fn begin_links(&mut self, chain: &[ColumnIx]);

    /// Leaves the innermost link chain.
    fn end_links(&mut self);

    /// Inserts a leaf constraint, conjoined with the current scope.
    fn push(&mut self, constraint: Constraint);

    /// Engine-side validation after a structurally successful walk; returns
    /// a diagnostic message for issues the compiler cannot detect locally.
    fn validate(&self) -> Option<String>;
}

/// Resolves object references to stored row identities.
pub trait RowResolver {
    /// Returns the row identity behind `obj`, if the row exists.
    fn row_id(&self, obj: &ObjRef) -> Option<RowId>;
}
