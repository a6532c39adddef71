//! Property-based tests for the mapping engine
//!
//! These tests check invariants that should hold for arbitrary object
//! graphs: mapping terminates, and the target graph has exactly the shape of
//! the source graph, shared references and cycles included.


use graphmap_core::{ClassBuilder, ClassRegistry, MapperOptions, ObjectRef, Value};
use proptest::prelude::*;
use std::sync::Arc;
use test_support::*;

fn node_classes() -> Arc<ClassRegistry> {
    let classes = Arc::new(ClassRegistry::new());
    classes
        .define(
            ClassBuilder::new("Node")
                .field("id", "int")
                .field("next", "?Node")
                .field("friend", "?Node"),
        )
        .unwrap();
    classes
        .define(
            ClassBuilder::new("NodeDto")
                .field("id", "int")
                .field("next", "?NodeDto")
                .field("friend", "?NodeDto"),
        )
        .unwrap();
    classes
}

/// Strategy for a graph: node count and two optional out-edges per node
fn graph_strategy() -> impl Strategy<Value = Vec<(Option<usize>, Option<usize>)>> {
    (1usize..8).prop_flat_map(|n| {
        proptest::collection::vec(
            (proptest::option::of(0..n), proptest::option::of(0..n)),
            n,
        )
    })
}

fn build_graph(edges: &[(Option<usize>, Option<usize>)]) -> Vec<ObjectRef> {
    let nodes: Vec<ObjectRef> = (0..edges.len())
        .map(|i| object("Node", vec![("id", Value::from(i as i64))]))
        .collect();
    for (node, (next, friend)) in nodes.iter().zip(edges) {
        node.set("next", next.map(|j| nodes[j].clone())).unwrap();
        node.set("friend", friend.map(|j| nodes[j].clone())).unwrap();
    }
    nodes
}

fn edge(node: &ObjectRef, name: &str) -> Option<ObjectRef> {
    field(node, name).as_object().cloned()
}

proptest! {
    #[test]
    fn prop_graph_shape_is_preserved(edges in graph_strategy(), lazy in any::<bool>()) {
        let mapper = mapper_with(node_classes(), MapperOptions::default().lazy_loading(lazy));
        let nodes = build_graph(&edges);

        let result = mapper.map_to(&Value::list(nodes.clone()), "list<NodeDto>").unwrap();
        let targets: Vec<ObjectRef> = result
            .as_array()
            .unwrap()
            .values()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        prop_assert_eq!(targets.len(), nodes.len());

        for (i, (next, friend)) in edges.iter().enumerate() {
            prop_assert_eq!(field(&targets[i], "id"), Value::Int(i as i64));
            for (name, expected) in [("next", next), ("friend", friend)] {
                match (edge(&targets[i], name), expected) {
                    (Some(actual), Some(j)) => prop_assert!(actual.ptr_eq(&targets[*j])),
                    (None, None) => {}
                    (actual, expected) => prop_assert!(false, "{}.{}: {:?} vs {:?}", i, name, actual, expected),
                }
            }
        }

        for (i, a) in targets.iter().enumerate() {
            for b in &targets[i + 1..] {
                prop_assert!(!a.ptr_eq(b));
            }
        }
    }

    #[test]
    fn prop_list_order_and_length(values in proptest::collection::vec(any::<i64>(), 0..20)) {
        let mapper = mapper(Arc::new(ClassRegistry::new()));
        let result = mapper.map_to(&Value::list(values.clone()), "list<string>").unwrap();

        let mapped: Vec<Value> = result.as_array().unwrap().values().cloned().collect();
        let expected: Vec<Value> = values.iter().map(|v| Value::from(v.to_string())).collect();
        prop_assert_eq!(mapped, expected);
    }

    #[test]
    fn prop_numeric_strings_cast_to_int(n in any::<i64>()) {
        let mapper = mapper(Arc::new(ClassRegistry::new()));
        let result = mapper.map_to(&Value::from(n.to_string()), "int").unwrap();
        prop_assert_eq!(result, Value::Int(n));
    }
}
