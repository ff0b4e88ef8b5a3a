//! Direct comparison of two key paths of the same entity.

use crate::compile::errors::{CompileError, CompileResult};
use crate::compile::keypath;
use crate::predicate::{CompareOp, CompareOptions};
use crate::schema::{PropertyKind, SchemaProvider};
use crate::sink::{Constraint, LeafOp, QuerySink};

/// Builds a constraint comparing `left_path` against `right_path` directly.
///
/// Both paths must resolve without crossing a link and to identical property
/// types; operator legality follows the type family of the shared type.
pub(crate) fn build(
    sink: &mut dyn QuerySink,
    schema: &dyn SchemaProvider,
    entity: &str,
    left_path: &str,
    right_path: &str,
    op: CompareOp,
    options: CompareOptions,
) -> CompileResult<()> {
    let left = keypath::resolve(schema, entity, left_path, false)?;
    let right = keypath::resolve(schema, entity, right_path, false)?;
    if !left.links.is_empty() {
        return Err(CompileError::MultiLevelComparisonUnsupported {
            key_path: left_path.to_owned(),
        });
    }
    if !right.links.is_empty() {
        return Err(CompileError::MultiLevelComparisonUnsupported {
            key_path: right_path.to_owned(),
        });
    }
    if left.leaf.kind != right.leaf.kind {
        return Err(CompileError::PropertiesTypeMismatch {
            key_path: left_path.to_owned(),
            expected: left.leaf.kind.type_name(),
            actual: right.leaf.kind.type_name(),
        });
    }

    let kind = left.leaf.kind;
    let (leaf_op, case_insensitive) = legal_op(kind, op, options)?;
    sink.push(Constraint::CompareColumns {
        lhs: left.leaf.column,
        rhs: right.leaf.column,
        op: leaf_op,
        case_insensitive,
    });
    Ok(())
}

fn legal_op(
    kind: PropertyKind,
    op: CompareOp,
    options: CompareOptions,
) -> CompileResult<(LeafOp, bool)> {
    let unsupported = || CompileError::UnsupportedOperator {
        type_name: kind.type_name(),
        operator: op.name(),
    };
    let ordered = |op: CompareOp| match op {
        CompareOp::Eq => Some(LeafOp::Equal),
        CompareOp::Ne => Some(LeafOp::NotEqual),
        CompareOp::Lt => Some(LeafOp::Less),
        CompareOp::Le => Some(LeafOp::LessOrEqual),
        CompareOp::Gt => Some(LeafOp::Greater),
        CompareOp::Ge => Some(LeafOp::GreaterOrEqual),
        _ => None,
    };
    match kind {
        PropertyKind::Bool
        | PropertyKind::Int
        | PropertyKind::Float
        | PropertyKind::Double
        | PropertyKind::Date => Ok((ordered(op).ok_or_else(unsupported)?, false)),
        PropertyKind::String => {
            if options.diacritic_insensitive {
                return Err(CompileError::UnsupportedOption {
                    option: "diacritic-insensitive",
                    operator: op.name(),
                });
            }
            let leaf_op = ordered(op)
                .or(match op {
                    CompareOp::BeginsWith => Some(LeafOp::BeginsWith),
                    CompareOp::EndsWith => Some(LeafOp::EndsWith),
                    CompareOp::Contains => Some(LeafOp::Contains),
                    _ => None,
                })
                .ok_or_else(unsupported)?;
            Ok((leaf_op, options.case_insensitive))
        }
        PropertyKind::Binary => {
            let leaf_op = match op {
                CompareOp::Eq => LeafOp::Equal,
                CompareOp::Ne => LeafOp::NotEqual,
                CompareOp::BeginsWith => LeafOp::BeginsWith,
                CompareOp::EndsWith => LeafOp::EndsWith,
                CompareOp::Contains => LeafOp::Contains,
                _ => return Err(unsupported()),
            };
            Ok((leaf_op, false))
        }
        // Identity comparison between two link columns is not part of the
        // engine's leaf vocabulary.
        PropertyKind::Object | PropertyKind::List => Err(unsupported()),
    }
}
