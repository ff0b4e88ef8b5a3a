//! End-to-end row-matching semantics: predicates are compiled into a
//! recording sink and evaluated against an in-memory row store.

use sable::sink::{MemorySink, MemoryStore, QueryNode};
use sable::{
    compile_predicate, ColumnIx, CompareOp, CompareOptions, ComparisonNode, CompileError,
    EntitySchema, InMemorySchema, Modifier, ObjRef, Operand, PredicateNode, PropertyDescriptor,
    PropertyKind, Value,
};

const NAME: ColumnIx = ColumnIx(0);
const AGE: ColumnIx = ColumnIx(1);
const ADDRESS: ColumnIx = ColumnIx(2);
const FRIENDS: ColumnIx = ColumnIx(3);
const SCORE: ColumnIx = ColumnIx(4);

fn schema() -> InMemorySchema {
    InMemorySchema::new()
        .with_entity(
            EntitySchema::new("Person")
                .with_property(PropertyDescriptor::scalar("name", PropertyKind::String, NAME))
                .with_property(PropertyDescriptor::scalar("age", PropertyKind::Int, AGE))
                .with_property(PropertyDescriptor::link(
                    "address",
                    PropertyKind::Object,
                    ADDRESS,
                    "Address",
                ))
                .with_property(PropertyDescriptor::link(
                    "friends",
                    PropertyKind::List,
                    FRIENDS,
                    "Person",
                ))
                .with_property(PropertyDescriptor::scalar("score", PropertyKind::Int, SCORE)),
        )
        .with_entity(
            EntitySchema::new("Address")
                .with_property(PropertyDescriptor::scalar("city", PropertyKind::String, ColumnIx(0)))
                .with_property(PropertyDescriptor::scalar("zip", PropertyKind::Int, ColumnIx(1)))
                .with_property(PropertyDescriptor::link(
                    "country",
                    PropertyKind::Object,
                    ColumnIx(2),
                    "Country",
                )),
        )
        .with_entity(
            EntitySchema::new("Country").with_property(PropertyDescriptor::scalar(
                "name",
                PropertyKind::String,
                ColumnIx(0),
            )),
        )
}

fn obj(entity: &str, key: u64) -> Value {
    Value::Object(ObjRef::new(entity, key))
}

fn friends(keys: &[u64]) -> Value {
    Value::List(keys.iter().map(|k| obj("Person", *k)).collect())
}

fn store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert("Country", 1, vec![Value::from("France")]);
    store.insert("Country", 2, vec![Value::from("Spain")]);
    store.insert(
        "Address",
        10,
        vec![Value::from("Paris"), Value::Int(75001), obj("Country", 1)],
    );
    store.insert(
        "Address",
        11,
        vec![Value::from("Madrid"), Value::Int(28001), obj("Country", 2)],
    );
    store.insert(
        "Person",
        1,
        vec![
            Value::from("Ada"),
            Value::Int(17),
            obj("Address", 10),
            friends(&[2, 3]),
            Value::Int(10),
        ],
    );
    store.insert(
        "Person",
        2,
        vec![
            Value::from("Bob"),
            Value::Int(18),
            obj("Address", 11),
            friends(&[]),
            Value::Int(18),
        ],
    );
    store.insert(
        "Person",
        3,
        vec![
            Value::from("Cara"),
            Value::Int(30),
            obj("Address", 10),
            friends(&[1]),
            Value::Int(25),
        ],
    );
    store.insert(
        "Person",
        4,
        vec![
            Value::from("dave"),
            Value::Int(31),
            Value::Null,
            friends(&[2]),
            Value::Int(31),
        ],
    );
    store.insert(
        "Person",
        5,
        vec![
            Value::from("Foo"),
            Value::Int(22),
            obj("Address", 11),
            friends(&[]),
            Value::Int(40),
        ],
    );
    store
}

fn compile(predicate: &PredicateNode) -> MemorySink {
    let store = store();
    let mut sink = MemorySink::new();
    compile_predicate(&schema(), "Person", predicate, &mut sink, &store)
        .expect("compilation succeeds");
    sink
}

fn matched(predicate: &PredicateNode) -> Vec<u64> {
    compile(predicate).matching_keys(&store(), "Person")
}

fn age_cmp(op: CompareOp, value: i64) -> PredicateNode {
    PredicateNode::cmp(Operand::key_path("age"), op, Operand::value(value))
}

#[test]
fn between_is_inclusive_range_conjunction() {
    let between = PredicateNode::cmp(
        Operand::key_path("age"),
        CompareOp::Between,
        Operand::value(Value::List(vec![Value::Int(18), Value::Int(30)])),
    );
    assert_eq!(matched(&between), vec![2, 3, 5]);

    let conjunction = PredicateNode::and(vec![
        age_cmp(CompareOp::Ge, 18),
        age_cmp(CompareOp::Le, 30),
    ]);
    assert_eq!(matched(&between), matched(&conjunction));
}

#[test]
fn in_with_empty_list_matches_nothing() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("age"),
        CompareOp::In,
        Operand::value(Value::List(Vec::new())),
    );
    assert!(matched(&predicate).is_empty());
}

#[test]
fn in_matches_listed_constants() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("age"),
        CompareOp::In,
        Operand::value(Value::List(vec![Value::Int(17), Value::Int(31), Value::Int(99)])),
    );
    assert_eq!(matched(&predicate), vec![1, 4]);
}

#[test]
fn empty_and_matches_every_row() {
    assert_eq!(matched(&PredicateNode::and(Vec::new())), vec![1, 2, 3, 4, 5]);
}

#[test]
fn empty_or_matches_no_row() {
    assert!(matched(&PredicateNode::or(Vec::new())).is_empty());
}

#[test]
fn literal_predicates_match_all_or_none() {
    assert_eq!(matched(&PredicateNode::Literal(true)), vec![1, 2, 3, 4, 5]);
    assert!(matched(&PredicateNode::Literal(false)).is_empty());
}

#[test]
fn case_insensitive_equality_honors_option() {
    let sensitive = PredicateNode::cmp(
        Operand::key_path("name"),
        CompareOp::Eq,
        Operand::value("foo"),
    );
    assert!(matched(&sensitive).is_empty());

    let insensitive = PredicateNode::Comparison(
        ComparisonNode::new(
            Operand::key_path("name"),
            CompareOp::Eq,
            Operand::value("foo"),
        )
        .with_options(CompareOptions::case_insensitive()),
    );
    assert_eq!(matched(&insensitive), vec![5]);
}

#[test]
fn single_link_traversal_reaches_leaf() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("address.city"),
        CompareOp::Eq,
        Operand::value("Paris"),
    );
    let sink = compile(&predicate);
    match sink.root() {
        Some(QueryNode::Links { chain, .. }) => assert_eq!(chain, vec![ADDRESS]),
        other => panic!("expected link scope, got {other:?}"),
    }
    assert_eq!(matched(&predicate), vec![1, 3]);
}

#[test]
fn two_link_traversal_enters_links_in_order() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("address.country.name"),
        CompareOp::Eq,
        Operand::value("France"),
    );
    let sink = compile(&predicate);
    match sink.root() {
        Some(QueryNode::Links { chain, .. }) => {
            assert_eq!(chain, vec![ADDRESS, ColumnIx(2)]);
        }
        other => panic!("expected link scope, got {other:?}"),
    }
    assert_eq!(matched(&predicate), vec![1, 3]);
}

#[test]
fn to_many_traversal_matches_any_element() {
    // No modifier needed: the to-many link is an intermediate segment.
    let predicate = PredicateNode::cmp(
        Operand::key_path("friends.age"),
        CompareOp::Gt,
        Operand::value(20i64),
    );
    assert_eq!(matched(&predicate), vec![1]);
}

#[test]
fn any_modifier_on_to_many_leaf_matches_membership() {
    let predicate = PredicateNode::Comparison(
        ComparisonNode::new(
            Operand::key_path("friends"),
            CompareOp::Eq,
            Operand::value(obj("Person", 2)),
        )
        .with_modifier(Modifier::Any),
    );
    assert_eq!(matched(&predicate), vec![1, 4]);
}

#[test]
fn to_many_leaf_without_modifier_fails() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("friends"),
        CompareOp::Eq,
        Operand::value(obj("Person", 2)),
    );
    let store = store();
    let mut sink = MemorySink::new();
    let err = compile_predicate(&schema(), "Person", &predicate, &mut sink, &store)
        .expect_err("should fail");
    assert!(matches!(err, CompileError::InvalidPredicate { .. }));
}

#[test]
fn link_equality_against_row_and_unset() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("address"),
        CompareOp::Eq,
        Operand::value(obj("Address", 10)),
    );
    assert_eq!(matched(&predicate), vec![1, 3]);

    let unset = PredicateNode::cmp(
        Operand::key_path("address"),
        CompareOp::Eq,
        Operand::value(Value::Null),
    );
    assert_eq!(matched(&unset), vec![4]);

    let set = PredicateNode::cmp(
        Operand::key_path("address"),
        CompareOp::Ne,
        Operand::value(Value::Null),
    );
    assert_eq!(matched(&set), vec![1, 2, 3, 5]);
}

#[test]
fn not_matches_the_complement() {
    let inner = age_cmp(CompareOp::Eq, 18);
    let negated = PredicateNode::not(inner.clone());
    let all = matched(&PredicateNode::and(Vec::new()));
    let direct = matched(&inner);
    let complement = matched(&negated);
    let mut union = direct.clone();
    union.extend(&complement);
    union.sort_unstable();
    assert_eq!(union, all);
    assert!(direct.iter().all(|key| !complement.contains(key)));
}

#[test]
fn column_comparison_within_one_entity() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("age"),
        CompareOp::Eq,
        Operand::key_path("score"),
    );
    assert_eq!(matched(&predicate), vec![2, 4]);
}

#[test]
fn cross_type_column_comparison_fails_before_the_engine() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("age"),
        CompareOp::Eq,
        Operand::key_path("name"),
    );
    let store = store();
    let mut sink = MemorySink::new();
    let err = compile_predicate(&schema(), "Person", &predicate, &mut sink, &store)
        .expect_err("should fail");
    assert!(matches!(err, CompileError::PropertiesTypeMismatch { .. }));
}

#[test]
fn recompilation_yields_structurally_equal_sinks() {
    let predicate = PredicateNode::or(vec![
        PredicateNode::and(vec![age_cmp(CompareOp::Ge, 18), age_cmp(CompareOp::Le, 30)]),
        PredicateNode::not(age_cmp(CompareOp::Eq, 17)),
    ]);
    let first = compile(&predicate);
    let second = compile(&predicate);
    assert_eq!(first.root(), second.root());
}

#[test]
fn nested_compound_grouping_evaluates_correctly() {
    // (age >= 18 AND age <= 30) OR name == "Ada"
    let predicate = PredicateNode::or(vec![
        PredicateNode::and(vec![age_cmp(CompareOp::Ge, 18), age_cmp(CompareOp::Le, 30)]),
        PredicateNode::cmp(
            Operand::key_path("name"),
            CompareOp::Eq,
            Operand::value("Ada"),
        ),
    ]);
    assert_eq!(matched(&predicate), vec![1, 2, 3, 5]);
}

#[test]
fn between_through_link_chain_scopes_the_conjunction() {
    let predicate = PredicateNode::cmp(
        Operand::key_path("address.zip"),
        CompareOp::Between,
        Operand::value(Value::List(vec![Value::Int(70000), Value::Int(80000)])),
    );
    let sink = compile(&predicate);
    match sink.root() {
        Some(QueryNode::Links { chain, node }) => {
            assert_eq!(chain, vec![ADDRESS]);
            assert!(matches!(*node, QueryNode::And(ref children) if children.len() == 2));
        }
        other => panic!("expected link scope, got {other:?}"),
    }
    assert_eq!(matched(&predicate), vec![1, 3]);
}
