//! Sable: predicate-to-constraint compilation for an embedded row store.
//!
//! The crate turns a generic filter-predicate tree (logical combinators,
//! comparisons, key paths, aggregates) into executable leaf constraints,
//! emitted into an engine-owned query accumulator. Schema reflection, the
//! predicate parser, and the storage engine itself are external
//! collaborators reached through traits.

#![warn(missing_docs)]

pub mod compile;
pub mod predicate;
pub mod schema;
pub mod sink;
pub mod types;

pub use compile::{
    compile_predicate, validate_sort, validate_sort_key, CompileError, CompileResult,
    ErrorCategory, SortKey, MAX_PREDICATE_DEPTH,
};
pub use predicate::{
    CompareOp, CompareOptions, ComparisonNode, CompoundKind, Modifier, Operand, PredicateNode,
    Value,
};
pub use schema::{
    EntitySchema, InMemorySchema, PropertyDescriptor, PropertyKind, SchemaProvider,
};
pub use sink::{Constraint, LeafOp, QuerySink, RowResolver};
pub use types::{ColumnIx, ObjRef, RowId};
