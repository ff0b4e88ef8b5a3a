//! In-memory reference implementation of the accumulator and row store.
//!
//! [`MemorySink`] records the constraint tree the compiler emits and can
//! evaluate it against rows held in a [`MemoryStore`]. It exists for tests
//! and prototyping, the same role the in-memory schema provider plays for
//! reflection; production engines implement [`QuerySink`] over their own
//! execution machinery.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::predicate::Value;
use crate::sink::{Constraint, LeafOp, QuerySink, RowResolver};
use crate::types::{ColumnIx, ObjRef, RowId};

/// One stored row: values indexed by column.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from column-ordered values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the value stored at `column`.
    pub fn get(&self, column: ColumnIx) -> Option<&Value> {
        self.values.get(column.0 as usize)
    }
}

/// Row storage keyed by entity name and row key.
///
/// Link-valued cells hold [`Value::Object`] references (to-one) or a
/// [`Value::List`] of them (to-many), so traversal needs no schema access.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entities: FxHashMap<String, BTreeMap<u64, Row>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row under `entity` with the given key.
    pub fn insert(&mut self, entity: &str, key: u64, values: Vec<Value>) {
        self.entities
            .entry(entity.to_owned())
            .or_default()
            .insert(key, Row::new(values));
    }

    /// Returns the row stored under `entity`/`key`.
    pub fn row(&self, entity: &str, key: u64) -> Option<&Row> {
        self.entities.get(entity)?.get(&key)
    }

    /// Returns the keys of all rows of `entity`, in key order.
    pub fn keys(&self, entity: &str) -> Vec<u64> {
        self.entities
            .get(entity)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl RowResolver for MemoryStore {
    fn row_id(&self, obj: &ObjRef) -> Option<RowId> {
        self.row(&obj.entity, obj.key).map(|_| RowId(obj.key))
    }
}

/// Recorded constraint tree, comparable for structural equality.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode {
    /// Leaf constraint.
    Leaf(Constraint),
    /// Negated subtree.
    Not(Box<QueryNode>),
    /// Conjunction.
    And(Vec<QueryNode>),
    /// Disjunction.
    Or(Vec<QueryNode>),
    /// Subtree evaluated against the rows reached through `chain`; a
    /// to-many step matches if any element satisfies the subtree.
    Links {
        /// Link columns in traversal order.
        chain: Vec<ColumnIx>,
        /// Constraint applied to the reached rows.
        node: Box<QueryNode>,
    },
}

#[derive(Debug)]
enum FrameKind {
    Root,
    Group,
    Links(Vec<ColumnIx>),
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    children: Vec<QueryNode>,
    alternation: bool,
    negate_next: bool,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            alternation: false,
            negate_next: false,
        }
    }

    fn collapse(self) -> Option<QueryNode> {
        let mut children = self.children;
        match children.len() {
            0 => None,
            1 if !self.alternation => children.pop(),
            _ if self.alternation => Some(QueryNode::Or(children)),
            _ => Some(QueryNode::And(children)),
        }
    }

    fn clone_collapsed(&self) -> Option<QueryNode> {
        let mut children = self.children.clone();
        match children.len() {
            0 => None,
            1 if !self.alternation => children.pop(),
            _ if self.alternation => Some(QueryNode::Or(children)),
            _ => Some(QueryNode::And(children)),
        }
    }
}

/// Accumulator that records the emitted constraint tree.
#[derive(Debug)]
pub struct MemorySink {
    stack: Vec<Frame>,
    diagnostic: Option<String>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Creates an empty sink ready for one compilation.
    pub fn new() -> Self {
        Self {
            stack: vec![Frame::new(FrameKind::Root)],
            diagnostic: None,
        }
    }

    /// Returns the recorded tree, or `None` when the sink is empty or was
    /// left unbalanced by a failed compilation.
    pub fn root(&self) -> Option<QueryNode> {
        if self.diagnostic.is_some() || self.stack.len() != 1 {
            return None;
        }
        let root = self.stack.first()?;
        if root.negate_next {
            return None;
        }
        root.clone_collapsed()
    }

    /// Evaluates the recorded tree against one stored row.
    pub fn matches(&self, store: &MemoryStore, entity: &str, key: u64) -> bool {
        let Some(root) = self.root() else {
            return false;
        };
        store
            .row(entity, key)
            .is_some_and(|row| eval(&root, store, row))
    }

    /// Returns the keys of all rows of `entity` satisfying the tree.
    pub fn matching_keys(&self, store: &MemoryStore, entity: &str) -> Vec<u64> {
        store
            .keys(entity)
            .into_iter()
            .filter(|key| self.matches(store, entity, *key))
            .collect()
    }

    fn fail(&mut self, message: &str) {
        if self.diagnostic.is_none() {
            self.diagnostic = Some(message.to_owned());
        }
    }

    fn attach(&mut self, node: QueryNode) {
        let Some(frame) = self.stack.last_mut() else {
            self.fail("constraint pushed outside any scope");
            return;
        };
        let node = if frame.negate_next {
            frame.negate_next = false;
            QueryNode::Not(Box::new(node))
        } else {
            node
        };
        frame.children.push(node);
    }
}

impl QuerySink for MemorySink {
    fn begin_group(&mut self) {
        self.stack.push(Frame::new(FrameKind::Group));
    }

    fn end_group(&mut self) {
        match self.stack.pop() {
            Some(frame) if matches!(frame.kind, FrameKind::Group) => {
                if frame.negate_next {
                    self.fail("dangling negation inside group");
                    return;
                }
                match frame.collapse() {
                    Some(node) => self.attach(node),
                    None => self.fail("empty group"),
                }
            }
            Some(_) | None => self.fail("unbalanced group scopes"),
        }
    }

    fn or(&mut self) {
        match self.stack.last_mut() {
            Some(frame) => frame.alternation = true,
            None => self.fail("alternation outside any scope"),
        }
    }

    fn not(&mut self) {
        match self.stack.last_mut() {
            Some(frame) => frame.negate_next = !frame.negate_next,
            None => self.fail("negation outside any scope"),
        }
    }

    fn begin_links(&mut self, chain: &[ColumnIx]) {
        self.stack.push(Frame::new(FrameKind::Links(chain.to_vec())));
    }

    fn end_links(&mut self) {
        match self.stack.pop() {
            Some(mut frame) if matches!(frame.kind, FrameKind::Links(_)) => {
                if frame.negate_next {
                    self.fail("dangling negation inside link scope");
                    return;
                }
                let FrameKind::Links(chain) =
                    std::mem::replace(&mut frame.kind, FrameKind::Group)
                else {
                    return;
                };
                match frame.collapse() {
                    Some(node) => self.attach(QueryNode::Links {
                        chain,
                        node: Box::new(node),
                    }),
                    None => self.fail("empty link scope"),
                }
            }
            Some(_) | None => self.fail("unbalanced link scopes"),
        }
    }

    fn push(&mut self, constraint: Constraint) {
        self.attach(QueryNode::Leaf(constraint));
    }

    fn validate(&self) -> Option<String> {
        if let Some(message) = &self.diagnostic {
            return Some(message.clone());
        }
        if self.stack.len() != 1 {
            return Some("unbalanced group scopes".to_owned());
        }
        if self.stack.first().is_some_and(|frame| frame.negate_next) {
            return Some("dangling negation".to_owned());
        }
        None
    }
}

fn eval(node: &QueryNode, store: &MemoryStore, row: &Row) -> bool {
    match node {
        QueryNode::Leaf(constraint) => eval_leaf(constraint, store, row),
        QueryNode::Not(child) => !eval(child, store, row),
        QueryNode::And(children) => children.iter().all(|child| eval(child, store, row)),
        QueryNode::Or(children) => children.iter().any(|child| eval(child, store, row)),
        QueryNode::Links { chain, node } => {
            let mut reached = vec![row];
            for column in chain {
                let mut next = Vec::new();
                for current in reached {
                    follow_link(store, current, *column, &mut next);
                }
                reached = next;
            }
            reached.iter().any(|target| eval(node, store, target))
        }
    }
}

fn follow_link<'a>(store: &'a MemoryStore, row: &Row, column: ColumnIx, out: &mut Vec<&'a Row>) {
    match row.get(column) {
        Some(Value::Object(obj)) => {
            if let Some(target) = store.row(&obj.entity, obj.key) {
                out.push(target);
            }
        }
        Some(Value::List(items)) => {
            for item in items {
                if let Value::Object(obj) = item {
                    if let Some(target) = store.row(&obj.entity, obj.key) {
                        out.push(target);
                    }
                }
            }
        }
        _ => {}
    }
}

fn eval_leaf(constraint: &Constraint, _store: &MemoryStore, row: &Row) -> bool {
    match constraint {
        Constraint::MatchAll => true,
        Constraint::MatchNone => false,
        Constraint::Compare {
            column,
            op,
            value,
            case_insensitive,
        } => row
            .get(*column)
            .is_some_and(|actual| eval_compare(actual, *op, value, *case_insensitive)),
        Constraint::CompareColumns {
            lhs,
            rhs,
            op,
            case_insensitive,
        } => match (row.get(*lhs), row.get(*rhs)) {
            (Some(left), Some(right)) => eval_compare(left, *op, right, *case_insensitive),
            _ => false,
        },
        Constraint::LinkCompare {
            column,
            target,
            negated,
        } => {
            let hit = match row.get(*column) {
                Some(Value::Object(obj)) => target.is_some_and(|t| t.0 == obj.key),
                Some(Value::List(items)) => items.iter().any(|item| {
                    matches!(item, Value::Object(obj) if target.is_some_and(|t| t.0 == obj.key))
                }),
                Some(Value::Null) | None => target.is_none(),
                Some(_) => false,
            };
            if *negated {
                !hit
            } else {
                hit
            }
        }
    }
}

fn eval_compare(actual: &Value, op: LeafOp, expected: &Value, case_insensitive: bool) -> bool {
    match op {
        LeafOp::BeginsWith | LeafOp::EndsWith | LeafOp::Contains => {
            eval_substring(actual, op, expected, case_insensitive)
        }
        LeafOp::Equal | LeafOp::NotEqual
            if case_insensitive && matches!(actual, Value::String(_)) =>
        {
            match (actual, expected) {
                (Value::String(a), Value::String(b)) => {
                    let eq = a.to_lowercase() == b.to_lowercase();
                    (op == LeafOp::Equal) == eq
                }
                _ => false,
            }
        }
        _ => value_order(actual, expected).is_some_and(|ord| match op {
            LeafOp::Equal => ord == Ordering::Equal,
            LeafOp::NotEqual => ord != Ordering::Equal,
            LeafOp::Less => ord == Ordering::Less,
            LeafOp::LessOrEqual => ord != Ordering::Greater,
            LeafOp::Greater => ord == Ordering::Greater,
            LeafOp::GreaterOrEqual => ord != Ordering::Less,
            _ => false,
        }),
    }
}

fn eval_substring(actual: &Value, op: LeafOp, expected: &Value, case_insensitive: bool) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => {
            let (a, b) = if case_insensitive {
                (a.to_lowercase(), b.to_lowercase())
            } else {
                (a.clone(), b.clone())
            };
            match op {
                LeafOp::BeginsWith => a.starts_with(&b),
                LeafOp::EndsWith => a.ends_with(&b),
                LeafOp::Contains => a.contains(&b),
                _ => false,
            }
        }
        (Value::Bytes(a), Value::Bytes(b)) => match op {
            LeafOp::BeginsWith => a.starts_with(b),
            LeafOp::EndsWith => a.ends_with(b),
            LeafOp::Contains => {
                b.is_empty() || (a.len() >= b.len() && a.windows(b.len()).any(|w| w == &b[..]))
            }
            _ => false,
        },
        _ => false,
    }
}

fn value_order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
