//! AND/OR grouping on top of the sink primitives.
//!
//! The engine cannot represent empty groups, so empty conjunctions and
//! alternations are lowered to synthetic always-match / never-match leaves.
//! An empty alternation must match nothing: no child can ever be true.

use crate::compile::errors::CompileResult;
use crate::sink::{Constraint, QuerySink};
use crate::types::ColumnIx;

/// Emits a conjunction of `count` clauses produced by `child`.
pub(crate) fn conjunction<F>(
    sink: &mut dyn QuerySink,
    count: usize,
    mut child: F,
) -> CompileResult<()>
where
    F: FnMut(&mut dyn QuerySink, usize) -> CompileResult<()>,
{
    if count == 0 {
        sink.push(Constraint::MatchAll);
        return Ok(());
    }
    sink.begin_group();
    for ix in 0..count {
        child(sink, ix)?;
    }
    sink.end_group();
    Ok(())
}

/// Emits an alternation of `count` clauses produced by `child`.
pub(crate) fn alternation<F>(
    sink: &mut dyn QuerySink,
    count: usize,
    mut child: F,
) -> CompileResult<()>
where
    F: FnMut(&mut dyn QuerySink, usize) -> CompileResult<()>,
{
    if count == 0 {
        sink.push(Constraint::MatchNone);
        return Ok(());
    }
    sink.begin_group();
    child(sink, 0)?;
    for ix in 1..count {
        sink.or();
        child(sink, ix)?;
    }
    sink.end_group();
    Ok(())
}

/// Runs `body` inside the link chain, entering the columns in traversal
/// order. An empty chain is a no-op wrapper.
pub(crate) fn with_links<F>(
    sink: &mut dyn QuerySink,
    chain: &[ColumnIx],
    body: F,
) -> CompileResult<()>
where
    F: FnOnce(&mut dyn QuerySink) -> CompileResult<()>,
{
    if chain.is_empty() {
        return body(sink);
    }
    sink.begin_links(chain);
    body(sink)?;
    sink.end_links();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemorySink, QueryNode};

    #[test]
    fn empty_conjunction_matches_everything() {
        let mut sink = MemorySink::new();
        conjunction(&mut sink, 0, |_, _| Ok(())).expect("compile");
        assert_eq!(sink.root(), Some(QueryNode::Leaf(Constraint::MatchAll)));
    }

    #[test]
    fn empty_alternation_matches_nothing() {
        let mut sink = MemorySink::new();
        alternation(&mut sink, 0, |_, _| Ok(())).expect("compile");
        assert_eq!(sink.root(), Some(QueryNode::Leaf(Constraint::MatchNone)));
    }

    #[test]
    fn alternation_separates_clauses() {
        let mut sink = MemorySink::new();
        alternation(&mut sink, 3, |sink, _| {
            sink.push(Constraint::MatchAll);
            Ok(())
        })
        .expect("compile");
        assert!(matches!(sink.root(), Some(QueryNode::Or(children)) if children.len() == 3));
    }
}
