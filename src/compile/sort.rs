//! Order-by validation.

use crate::compile::errors::{CompileError, CompileResult};
use crate::schema::SchemaProvider;
use crate::types::ColumnIx;

/// One validated sort key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SortKey {
    /// Column to order by.
    pub column: ColumnIx,
    /// Ascending (`true`) or descending order.
    pub ascending: bool,
}

/// Validates a single requested sort key against the schema.
///
/// Dotted key paths, unknown properties, and non-sortable types (links,
/// to-many collections, binary) are rejected with
/// [`CompileError::InvalidSortProperty`].
pub fn validate_sort_key(
    schema: &dyn SchemaProvider,
    entity: &str,
    property: &str,
    ascending: bool,
) -> CompileResult<SortKey> {
    let reject = |detail: String| CompileError::InvalidSortProperty {
        property: property.to_owned(),
        detail,
    };
    if property.contains('.') {
        return Err(reject("key paths cannot be used for sorting".to_owned()));
    }
    let entity_schema = schema
        .entity(entity)
        .ok_or_else(|| reject(format!("unknown entity '{entity}'")))?;
    let descriptor = entity_schema
        .property(property)
        .ok_or_else(|| reject(format!("unknown property on entity '{entity}'")))?;
    if !descriptor.kind.is_sortable() {
        return Err(reject(format!(
            "{} properties are not sortable",
            descriptor.kind.type_name()
        )));
    }
    Ok(SortKey {
        column: descriptor.column,
        ascending,
    })
}

/// Validates all requested sort keys, preserving input order.
pub fn validate_sort(
    schema: &dyn SchemaProvider,
    entity: &str,
    keys: &[(&str, bool)],
) -> CompileResult<Vec<SortKey>> {
    keys.iter()
        .map(|(property, ascending)| validate_sort_key(schema, entity, property, *ascending))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchema, InMemorySchema, PropertyDescriptor, PropertyKind};

    fn schema() -> InMemorySchema {
        InMemorySchema::new().with_entity(
            EntitySchema::new("Person")
                .with_property(PropertyDescriptor::scalar(
                    "name",
                    PropertyKind::String,
                    ColumnIx(0),
                ))
                .with_property(PropertyDescriptor::scalar(
                    "age",
                    PropertyKind::Int,
                    ColumnIx(1),
                ))
                .with_property(PropertyDescriptor::scalar(
                    "photo",
                    PropertyKind::Binary,
                    ColumnIx(2),
                ))
                .with_property(PropertyDescriptor::link(
                    "address",
                    PropertyKind::Object,
                    ColumnIx(3),
                    "Address",
                ))
                .with_property(PropertyDescriptor::link(
                    "friends",
                    PropertyKind::List,
                    ColumnIx(4),
                    "Person",
                )),
        )
    }

    #[test]
    fn preserves_input_order() {
        let keys = validate_sort(&schema(), "Person", &[("age", false), ("name", true)])
            .expect("validate");
        assert_eq!(
            keys,
            vec![
                SortKey {
                    column: ColumnIx(1),
                    ascending: false
                },
                SortKey {
                    column: ColumnIx(0),
                    ascending: true
                },
            ]
        );
    }

    #[test]
    fn rejects_dotted_paths() {
        let err = validate_sort_key(&schema(), "Person", "address.city", true)
            .expect_err("should fail");
        assert!(matches!(err, CompileError::InvalidSortProperty { .. }));
    }

    #[test]
    fn rejects_unknown_property() {
        let err = validate_sort_key(&schema(), "Person", "height", true).expect_err("should fail");
        assert!(matches!(err, CompileError::InvalidSortProperty { .. }));
    }

    #[test]
    fn rejects_links_and_collections() {
        for property in ["address", "friends", "photo"] {
            let err =
                validate_sort_key(&schema(), "Person", property, true).expect_err("should fail");
            assert!(matches!(err, CompileError::InvalidSortProperty { .. }));
        }
    }
}
