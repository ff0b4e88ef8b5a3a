//! Dotted key-path resolution.

use smallvec::SmallVec;
use tracing::trace;

use crate::compile::errors::{CompileError, CompileResult};
use crate::schema::{PropertyDescriptor, PropertyKind, SchemaProvider};
use crate::types::ColumnIx;

/// Link columns crossed by a key path, in traversal order.
pub type LinkChain = SmallVec<[ColumnIx; 4]>;

/// Result of resolving a dotted key path against a schema.
#[derive(Clone, Debug)]
pub struct KeyPathResolution {
    /// Descriptor of the final path segment.
    pub leaf: PropertyDescriptor,
    /// Columns of the links crossed before the leaf.
    pub links: LinkChain,
}

/// Resolves `key_path` starting at `root_entity`.
///
/// Every non-final segment must name a link property; its column is appended
/// to the chain while resolution advances to the linked entity. The final
/// segment is validated against `any_modifier`: a to-many leaf requires the
/// modifier, every other leaf type forbids it.
pub fn resolve(
    schema: &dyn SchemaProvider,
    root_entity: &str,
    key_path: &str,
    any_modifier: bool,
) -> CompileResult<KeyPathResolution> {
    let mut entity = schema
        .entity(root_entity)
        .ok_or_else(|| CompileError::invalid_key_path(key_path, format!("unknown entity '{root_entity}'")))?;

    let mut links = LinkChain::new();
    let mut segments = key_path.split('.').peekable();
    loop {
        let segment = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CompileError::invalid_key_path(key_path, "empty path segment"))?;
        let property = entity.property(segment).ok_or_else(|| {
            CompileError::invalid_key_path(
                key_path,
                format!("unknown property '{segment}' on entity '{}'", entity.name()),
            )
        })?;

        if segments.peek().is_none() {
            check_modifier(property, key_path, any_modifier)?;
            trace!(key_path, links = links.len(), "resolved key path");
            return Ok(KeyPathResolution {
                leaf: property.clone(),
                links,
            });
        }

        if !property.kind.is_link() {
            return Err(CompileError::invalid_key_path(
                key_path,
                format!(
                    "intermediate property '{segment}' is {}, not a link",
                    property.kind.type_name()
                ),
            ));
        }
        let target = property.target.as_deref().ok_or_else(|| {
            CompileError::invalid_key_path(key_path, format!("link '{segment}' has no target entity"))
        })?;
        links.push(property.column);
        entity = schema
            .entity(target)
            .ok_or_else(|| CompileError::invalid_key_path(key_path, format!("unknown entity '{target}'")))?;
    }
}

fn check_modifier(
    leaf: &PropertyDescriptor,
    key_path: &str,
    any_modifier: bool,
) -> CompileResult<()> {
    let to_many = leaf.kind == PropertyKind::List;
    if to_many && !any_modifier {
        return Err(CompileError::invalid_predicate(format!(
            "key path '{key_path}' ends in a to-many link and requires the any-element modifier"
        )));
    }
    if !to_many && any_modifier {
        return Err(CompileError::invalid_predicate(format!(
            "any-element modifier on '{key_path}' requires a to-many leaf, got {}",
            leaf.kind.type_name()
        )));
    }
    Ok(())
}
