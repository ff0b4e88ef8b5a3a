//! Schema reflection boundary.
//!
//! The compiler never owns schema state; it consults a [`SchemaProvider`] to
//! resolve entity names into typed property lists. [`InMemorySchema`] is the
//! builder-style implementation used by tests and prototyping callers.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::ColumnIx;

/// Type tag of a stored property.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Boolean column.
    Bool,
    /// Signed 64-bit integer column.
    Int,
    /// 32-bit floating point column.
    Float,
    /// 64-bit floating point column.
    Double,
    /// UTF-8 string column.
    String,
    /// Binary blob column.
    Binary,
    /// Timestamp column (nanoseconds since epoch).
    Date,
    /// Link to a single row of another entity (to-one).
    Object,
    /// Link to a collection of rows of another entity (to-many).
    List,
}

impl PropertyKind {
    /// Human-readable type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::Double => "double",
            PropertyKind::String => "string",
            PropertyKind::Binary => "binary",
            PropertyKind::Date => "date",
            PropertyKind::Object => "object",
            PropertyKind::List => "list",
        }
    }

    /// Whether the property is a link (to-one or to-many).
    pub fn is_link(&self) -> bool {
        matches!(self, PropertyKind::Object | PropertyKind::List)
    }

    /// Whether rows can be ordered by this property.
    pub fn is_sortable(&self) -> bool {
        matches!(
            self,
            PropertyKind::Bool
                | PropertyKind::Int
                | PropertyKind::Float
                | PropertyKind::Double
                | PropertyKind::String
                | PropertyKind::Date
        )
    }
}

/// Immutable description of one property, as resolved from the schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Type tag.
    pub kind: PropertyKind,
    /// Column index within the entity's row layout.
    pub column: ColumnIx,
    /// Target entity name; present only for link kinds.
    pub target: Option<String>,
}

impl PropertyDescriptor {
    /// Describes a scalar (non-link) property.
    pub fn scalar(name: impl Into<String>, kind: PropertyKind, column: ColumnIx) -> Self {
        Self {
            name: name.into(),
            kind,
            column,
            target: None,
        }
    }

    /// Describes a link property pointing at `target`.
    pub fn link(
        name: impl Into<String>,
        kind: PropertyKind,
        column: ColumnIx,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            column,
            target: Some(target.into()),
        }
    }
}

/// Ordered property list of one entity with by-name lookup.
#[derive(Clone, Debug)]
pub struct EntitySchema {
    name: String,
    properties: Vec<PropertyDescriptor>,
    by_name: FxHashMap<String, usize>,
}

impl EntitySchema {
    /// Creates an empty entity schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Appends a property, preserving declaration order.
    pub fn with_property(mut self, descriptor: PropertyDescriptor) -> Self {
        self.by_name
            .insert(descriptor.name.clone(), self.properties.len());
        self.properties.push(descriptor);
        self
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered property list.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.by_name.get(name).map(|ix| &self.properties[*ix])
    }
}

/// Resolves entity names to their typed property lists.
pub trait SchemaProvider {
    /// Returns the schema of `entity`, if it exists.
    fn entity(&self, entity: &str) -> Option<&EntitySchema>;
}

/// Simple in-memory schema provider used for tests or prototyping.
#[derive(Clone, Debug, Default)]
pub struct InMemorySchema {
    entities: FxHashMap<String, EntitySchema>,
}

impl InMemorySchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity schema.
    pub fn with_entity(mut self, entity: EntitySchema) -> Self {
        self.entities.insert(entity.name().to_owned(), entity);
        self
    }
}

impl SchemaProvider for InMemorySchema {
    fn entity(&self, entity: &str) -> Option<&EntitySchema> {
        self.entities.get(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_lookup_preserves_order() {
        let entity = EntitySchema::new("Person")
            .with_property(PropertyDescriptor::scalar(
                "name",
                PropertyKind::String,
                ColumnIx(0),
            ))
            .with_property(PropertyDescriptor::scalar(
                "age",
                PropertyKind::Int,
                ColumnIx(1),
            ));
        assert_eq!(entity.properties().len(), 2);
        assert_eq!(entity.property("age").map(|p| p.column), Some(ColumnIx(1)));
        assert!(entity.property("missing").is_none());
    }

    #[test]
    fn link_descriptor_carries_target() {
        let prop = PropertyDescriptor::link("address", PropertyKind::Object, ColumnIx(2), "Address");
        assert!(prop.kind.is_link());
        assert_eq!(prop.target.as_deref(), Some("Address"));
    }
}
