//! Small identifier newtypes shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based column index within an entity's row layout.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
)]
pub struct ColumnIx(pub u32);

impl fmt::Display for ColumnIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a stored row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a row of a named entity, as carried inside predicate
/// constants and link-valued cells.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjRef {
    /// Entity the referenced row belongs to.
    pub entity: String,
    /// Caller-visible key of the referenced row.
    pub key: u64,
}

impl ObjRef {
    /// Builds a reference to `key` within `entity`.
    pub fn new(entity: impl Into<String>, key: u64) -> Self {
        Self {
            entity: entity.into(),
            key,
        }
    }
}
