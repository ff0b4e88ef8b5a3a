//! Predicate-to-constraint compilation.
//!
//! [`compile_predicate`] recursively walks an immutable [`PredicateNode`]
//! tree and populates an externally-owned [`QuerySink`] with executable
//! constraints, consulting the schema to resolve key paths. Any error is
//! fatal to the compilation and leaves the sink in a discard-only state.

/// Direct comparison of two key paths.
pub mod columns;

/// Structured compilation errors.
pub mod errors;

/// AND/OR/NOT grouping on sink primitives.
mod group;

/// Dotted key-path resolution.
pub mod keypath;

/// Type-directed leaf constraint construction.
mod leaf;

/// Order-by validation.
pub mod sort;

use tracing::debug;

use crate::predicate::{
    CompareOp, CompareOptions, ComparisonNode, CompoundKind, Modifier, Operand, PredicateNode,
    Value,
};
use crate::schema::SchemaProvider;
use crate::sink::{Constraint, QuerySink, RowResolver};

pub use errors::{CompileError, CompileResult, ErrorCategory};
pub use keypath::{KeyPathResolution, LinkChain};
pub use sort::{validate_sort, validate_sort_key, SortKey};

/// Predicate nesting limit; degenerate trees beyond it are rejected instead
/// of risking stack exhaustion.
pub const MAX_PREDICATE_DEPTH: usize = 256;

/// Compiles `predicate` against `entity`, emitting constraints into `sink`.
///
/// On success the sink holds a complete, engine-validated constraint set.
/// On failure the sink's contents are unspecified and must be discarded.
pub fn compile_predicate(
    schema: &dyn SchemaProvider,
    entity: &str,
    predicate: &PredicateNode,
    sink: &mut dyn QuerySink,
    rows: &dyn RowResolver,
) -> CompileResult<()> {
    debug!(entity, "compiling predicate tree");
    let compiler = Compiler {
        schema,
        rows,
        entity,
    };
    compiler.node(predicate, sink, 0)?;
    if let Some(message) = sink.validate() {
        return Err(CompileError::EngineValidation { message });
    }
    Ok(())
}

struct Compiler<'a> {
    schema: &'a dyn SchemaProvider,
    rows: &'a dyn RowResolver,
    entity: &'a str,
}

impl Compiler<'_> {
    fn node(
        &self,
        node: &PredicateNode,
        sink: &mut dyn QuerySink,
        depth: usize,
    ) -> CompileResult<()> {
        if depth > MAX_PREDICATE_DEPTH {
            return Err(CompileError::PredicateTooDeep {
                max: MAX_PREDICATE_DEPTH,
            });
        }
        match node {
            PredicateNode::Literal(true) => {
                sink.push(Constraint::MatchAll);
                Ok(())
            }
            PredicateNode::Literal(false) => {
                sink.push(Constraint::MatchNone);
                Ok(())
            }
            PredicateNode::Compound { kind, children } => match kind {
                CompoundKind::And => group::conjunction(sink, children.len(), |sink, ix| {
                    self.node(&children[ix], sink, depth + 1)
                }),
                CompoundKind::Or => group::alternation(sink, children.len(), |sink, ix| {
                    self.node(&children[ix], sink, depth + 1)
                }),
                CompoundKind::Not => {
                    if children.len() != 1 {
                        return Err(CompileError::invalid_predicate(format!(
                            "NOT requires exactly one child, got {}",
                            children.len()
                        )));
                    }
                    sink.not();
                    self.node(&children[0], sink, depth + 1)
                }
            },
            PredicateNode::Comparison(cmp) => self.comparison(cmp, sink),
        }
    }

    fn comparison(&self, cmp: &ComparisonNode, sink: &mut dyn QuerySink) -> CompileResult<()> {
        if cmp.modifier == Modifier::All {
            return Err(CompileError::invalid_predicate(
                "ALL modifier is not supported",
            ));
        }
        match cmp.op {
            CompareOp::Between => self.between(cmp, sink),
            CompareOp::In => self.membership(cmp, sink),
            _ => match (&cmp.left, &cmp.right) {
                (Operand::KeyPath(left), Operand::KeyPath(right)) => {
                    if cmp.modifier == Modifier::Any {
                        return Err(CompileError::invalid_predicate(
                            "any-element modifier requires a constant right operand",
                        ));
                    }
                    columns::build(
                        sink,
                        self.schema,
                        self.entity,
                        left,
                        right,
                        cmp.op,
                        cmp.options,
                    )
                }
                (Operand::KeyPath(path), Operand::Value(value)) => {
                    self.leaf(path, cmp.op, value, cmp.options, cmp.modifier, false, sink)
                }
                (Operand::Value(value), Operand::KeyPath(path)) => {
                    if cmp.modifier == Modifier::Any {
                        return Err(CompileError::invalid_predicate(
                            "any-element modifier requires the key path on the left",
                        ));
                    }
                    // Flip directional operators so the key path reads as the
                    // left-hand side; string asymmetry is handled downstream.
                    self.leaf(
                        path,
                        flip(cmp.op),
                        value,
                        cmp.options,
                        cmp.modifier,
                        true,
                        sink,
                    )
                }
                (Operand::Value(_), Operand::Value(_)) => Err(CompileError::UnsupportedPredicate {
                    detail: "comparison between two constants".to_owned(),
                }),
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn leaf(
        &self,
        path: &str,
        op: CompareOp,
        value: &Value,
        options: CompareOptions,
        modifier: Modifier,
        constant_on_left: bool,
        sink: &mut dyn QuerySink,
    ) -> CompileResult<()> {
        let resolution =
            keypath::resolve(self.schema, self.entity, path, modifier == Modifier::Any)?;
        leaf::build(
            sink,
            self.rows,
            &resolution.leaf,
            &resolution.links,
            op,
            value,
            options,
            constant_on_left,
            path,
        )
    }

    fn between(&self, cmp: &ComparisonNode, sink: &mut dyn QuerySink) -> CompileResult<()> {
        let (path, bounds) = aggregate_operands(cmp, "BETWEEN")?;
        if bounds.len() != 2 {
            return Err(CompileError::invalid_predicate(format!(
                "BETWEEN requires exactly two constants, got {}",
                bounds.len()
            )));
        }
        let resolution =
            keypath::resolve(self.schema, self.entity, path, cmp.modifier == Modifier::Any)?;
        group::with_links(sink, &resolution.links, |sink| {
            group::conjunction(sink, 2, |sink, ix| {
                let (op, bound) = if ix == 0 {
                    (CompareOp::Ge, &bounds[0])
                } else {
                    (CompareOp::Le, &bounds[1])
                };
                leaf::build(
                    sink,
                    self.rows,
                    &resolution.leaf,
                    &[],
                    op,
                    bound,
                    cmp.options,
                    false,
                    path,
                )
            })
        })
    }

    fn membership(&self, cmp: &ComparisonNode, sink: &mut dyn QuerySink) -> CompileResult<()> {
        let (path, values) = aggregate_operands(cmp, "IN")?;
        let resolution =
            keypath::resolve(self.schema, self.entity, path, cmp.modifier == Modifier::Any)?;
        group::alternation(sink, values.len(), |sink, ix| {
            leaf::build(
                sink,
                self.rows,
                &resolution.leaf,
                &resolution.links,
                CompareOp::Eq,
                &values[ix],
                cmp.options,
                false,
                path,
            )
        })
    }
}

/// BETWEEN and IN require a key path on the left and a constant collection
/// on the right.
fn aggregate_operands<'a>(
    cmp: &'a ComparisonNode,
    operator: &str,
) -> CompileResult<(&'a str, &'a [Value])> {
    let Operand::KeyPath(path) = &cmp.left else {
        return Err(CompileError::invalid_predicate(format!(
            "{operator} requires a key path as the left operand"
        )));
    };
    let Operand::Value(Value::List(values)) = &cmp.right else {
        return Err(CompileError::invalid_predicate(format!(
            "{operator} requires a constant collection as the right operand"
        )));
    };
    Ok((path, values))
}

fn flip(op: CompareOp) -> CompareOp {
    match op {
        CompareOp::Lt => CompareOp::Gt,
        CompareOp::Le => CompareOp::Ge,
        CompareOp::Gt => CompareOp::Lt,
        CompareOp::Ge => CompareOp::Le,
        other => other,
    }
}
