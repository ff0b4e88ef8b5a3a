//! Type-directed leaf constraint construction.
//!
//! A dispatch table keyed by the resolved property kind maps to a typed
//! builder function enumerating the legal operators for that kind. Illegal
//! combinations surface as structured errors before anything reaches the
//! sink.

use tracing::trace;

use crate::compile::errors::{CompileError, CompileResult};
use crate::compile::group::with_links;
use crate::predicate::{CompareOp, CompareOptions, Value};
use crate::schema::{PropertyDescriptor, PropertyKind};
use crate::sink::{Constraint, LeafOp, QuerySink, RowResolver};
use crate::types::ColumnIx;

/// Everything a typed builder needs to emit one leaf constraint.
struct LeafBuild<'a> {
    leaf: &'a PropertyDescriptor,
    op: CompareOp,
    value: &'a Value,
    options: CompareOptions,
    /// True when the constant was the left operand (`value OP keypath`).
    constant_on_left: bool,
    rows: &'a dyn RowResolver,
    key_path: &'a str,
}

type BuildFn = for<'a> fn(&LeafBuild<'a>, &mut dyn QuerySink) -> CompileResult<()>;

/// Dispatch table entry for a resolved property kind.
fn builder_for(kind: PropertyKind) -> BuildFn {
    match kind {
        PropertyKind::Bool => build_bool,
        PropertyKind::Int | PropertyKind::Float | PropertyKind::Double | PropertyKind::Date => {
            build_ordered
        }
        PropertyKind::String => build_string,
        PropertyKind::Binary => build_binary,
        PropertyKind::Object | PropertyKind::List => build_link,
    }
}

/// Builds one leaf constraint against `leaf`, entering `links` in traversal
/// order around it.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
    sink: &mut dyn QuerySink,
    rows: &dyn RowResolver,
    leaf: &PropertyDescriptor,
    links: &[ColumnIx],
    op: CompareOp,
    value: &Value,
    options: CompareOptions,
    constant_on_left: bool,
    key_path: &str,
) -> CompileResult<()> {
    if !links.is_empty()
        && matches!(
            leaf.kind,
            PropertyKind::Binary | PropertyKind::Object | PropertyKind::List
        )
    {
        return Err(CompileError::MultiLevelLinkUnsupported {
            key_path: key_path.to_owned(),
            type_name: leaf.kind.type_name(),
        });
    }
    check_operand_type(leaf, value, key_path)?;
    trace!(
        key_path,
        kind = leaf.kind.type_name(),
        op = op.name(),
        "building leaf constraint"
    );
    let build = builder_for(leaf.kind);
    let ctx = LeafBuild {
        leaf,
        op,
        value,
        options,
        constant_on_left,
        rows,
        key_path,
    };
    with_links(sink, links, |sink| build(&ctx, sink))
}

/// Validates the constant against the leaf's declared type.
fn check_operand_type(
    leaf: &PropertyDescriptor,
    value: &Value,
    key_path: &str,
) -> CompileResult<()> {
    let ok = match leaf.kind {
        PropertyKind::Bool => matches!(value, Value::Bool(_)),
        PropertyKind::Int => matches!(value, Value::Int(_)),
        PropertyKind::Float | PropertyKind::Double => {
            matches!(value, Value::Int(_) | Value::Float(_))
        }
        PropertyKind::String => matches!(value, Value::String(_)),
        PropertyKind::Binary => matches!(value, Value::Bytes(_)),
        PropertyKind::Date => matches!(value, Value::Date(_)),
        PropertyKind::Object | PropertyKind::List => {
            matches!(value, Value::Object(_) | Value::Null)
        }
    };
    if ok {
        Ok(())
    } else {
        Err(CompileError::PropertiesTypeMismatch {
            key_path: key_path.to_owned(),
            expected: leaf.kind.type_name(),
            actual: value.type_name(),
        })
    }
}

fn equality_leaf_op(op: CompareOp) -> Option<LeafOp> {
    match op {
        CompareOp::Eq => Some(LeafOp::Equal),
        CompareOp::Ne => Some(LeafOp::NotEqual),
        _ => None,
    }
}

fn ordered_leaf_op(op: CompareOp) -> Option<LeafOp> {
    match op {
        CompareOp::Eq => Some(LeafOp::Equal),
        CompareOp::Ne => Some(LeafOp::NotEqual),
        CompareOp::Lt => Some(LeafOp::Less),
        CompareOp::Le => Some(LeafOp::LessOrEqual),
        CompareOp::Gt => Some(LeafOp::Greater),
        CompareOp::Ge => Some(LeafOp::GreaterOrEqual),
        _ => None,
    }
}

fn string_leaf_op(op: CompareOp) -> Option<LeafOp> {
    match op {
        CompareOp::Eq => Some(LeafOp::Equal),
        CompareOp::Ne => Some(LeafOp::NotEqual),
        CompareOp::BeginsWith => Some(LeafOp::BeginsWith),
        CompareOp::EndsWith => Some(LeafOp::EndsWith),
        CompareOp::Contains => Some(LeafOp::Contains),
        _ => None,
    }
}

fn unsupported(kind: PropertyKind, op: CompareOp) -> CompileError {
    CompileError::UnsupportedOperator {
        type_name: kind.type_name(),
        operator: op.name(),
    }
}

fn build_bool(ctx: &LeafBuild<'_>, sink: &mut dyn QuerySink) -> CompileResult<()> {
    let op = equality_leaf_op(ctx.op).ok_or_else(|| unsupported(ctx.leaf.kind, ctx.op))?;
    sink.push(Constraint::Compare {
        column: ctx.leaf.column,
        op,
        value: ctx.value.clone(),
        case_insensitive: false,
    });
    Ok(())
}

fn build_ordered(ctx: &LeafBuild<'_>, sink: &mut dyn QuerySink) -> CompileResult<()> {
    let op = ordered_leaf_op(ctx.op).ok_or_else(|| unsupported(ctx.leaf.kind, ctx.op))?;
    sink.push(Constraint::Compare {
        column: ctx.leaf.column,
        op,
        value: ctx.value.clone(),
        case_insensitive: false,
    });
    Ok(())
}

fn build_string(ctx: &LeafBuild<'_>, sink: &mut dyn QuerySink) -> CompileResult<()> {
    if ctx.options.diacritic_insensitive {
        return Err(CompileError::UnsupportedOption {
            option: "diacritic-insensitive",
            operator: ctx.op.name(),
        });
    }
    // `value BEGINSWITH keypath` has no column-side interpretation.
    if ctx.constant_on_left && equality_leaf_op(ctx.op).is_none() {
        return Err(unsupported(ctx.leaf.kind, ctx.op));
    }
    let op = string_leaf_op(ctx.op).ok_or_else(|| unsupported(ctx.leaf.kind, ctx.op))?;
    sink.push(Constraint::Compare {
        column: ctx.leaf.column,
        op,
        value: ctx.value.clone(),
        case_insensitive: ctx.options.case_insensitive,
    });
    Ok(())
}

fn build_binary(ctx: &LeafBuild<'_>, sink: &mut dyn QuerySink) -> CompileResult<()> {
    if ctx.constant_on_left && equality_leaf_op(ctx.op).is_none() {
        return Err(unsupported(ctx.leaf.kind, ctx.op));
    }
    let op = string_leaf_op(ctx.op).ok_or_else(|| unsupported(ctx.leaf.kind, ctx.op))?;
    sink.push(Constraint::Compare {
        column: ctx.leaf.column,
        op,
        value: ctx.value.clone(),
        case_insensitive: false,
    });
    Ok(())
}

fn build_link(ctx: &LeafBuild<'_>, sink: &mut dyn QuerySink) -> CompileResult<()> {
    let negated = match ctx.op {
        CompareOp::Eq => false,
        CompareOp::Ne => true,
        _ => return Err(unsupported(ctx.leaf.kind, ctx.op)),
    };
    let target = match ctx.value {
        Value::Null => None,
        Value::Object(obj) => Some(ctx.rows.row_id(obj).ok_or_else(|| {
            CompileError::invalid_predicate(format!(
                "object constant for '{}' does not resolve to a stored row",
                ctx.key_path
            ))
        })?),
        _ => unreachable!("operand type checked before dispatch"),
    };
    sink.push(Constraint::LinkCompare {
        column: ctx.leaf.column,
        target,
        negated,
    });
    Ok(())
}
