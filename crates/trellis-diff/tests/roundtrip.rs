//! Property-based tests for the diff engines.
//!
//! The round-trip law must hold for every pair of states:
//!  - patch(base, compute(base, target)) == target
//!  - compute(a, a) is empty
//!  - patch never mutates its base

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_diff::{DiffEngine, JsonDiff, WholeState};

fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]{1,2}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Todo {
    title: String,
    done: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TodoList {
    name: String,
    todos: Vec<Todo>,
    tags: std::collections::BTreeMap<String, u32>,
}

fn todo_list_strategy() -> impl Strategy<Value = TodoList> {
    (
        "[A-Za-z ]{0,12}",
        prop::collection::vec(("[a-z]{1,8}", any::<bool>()), 0..8),
        prop::collection::btree_map("[a-z]{1,4}", 0u32..100, 0..5),
    )
        .prop_map(|(name, todos, tags)| TodoList {
            name,
            todos: todos
                .into_iter()
                .map(|(title, done)| Todo { title, done })
                .collect(),
            tags,
        })
}

proptest! {
    #[test]
    fn json_diff_roundtrips_arbitrary_values(base in json_strategy(), target in json_strategy()) {
        let engine = JsonDiff::new();
        let delta = engine.diff_values(&base, &target);
        prop_assert_eq!(engine.patch_value(&base, &delta).unwrap(), target);
    }

    #[test]
    fn json_diff_of_identical_values_is_empty(value in json_strategy()) {
        let engine = JsonDiff::new();
        prop_assert!(engine.diff_values(&value, &value).is_empty());
    }

    #[test]
    fn json_diff_roundtrips_typed_states(base in todo_list_strategy(), target in todo_list_strategy()) {
        let engine = JsonDiff::new();
        let delta = engine.compute(&base, &target).unwrap();
        let patched: TodoList = engine.patch(&base, &delta).unwrap();
        prop_assert_eq!(patched, target);
    }

    #[test]
    fn json_patch_leaves_base_untouched(base in json_strategy(), target in json_strategy()) {
        let engine = JsonDiff::new();
        let snapshot = base.clone();
        let delta = engine.diff_values(&base, &target);
        let _ = engine.patch_value(&base, &delta);
        prop_assert_eq!(base, snapshot);
    }

    #[test]
    fn delta_survives_serialization(base in json_strategy(), target in json_strategy()) {
        let engine = JsonDiff::new();
        let delta = engine.diff_values(&base, &target);
        let encoded = serde_json::to_string(&delta).unwrap();
        let decoded: trellis_diff::JsonDelta = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(engine.patch_value(&base, &decoded).unwrap(), target);
    }

    #[test]
    fn whole_state_roundtrips(base in todo_list_strategy(), target in todo_list_strategy()) {
        let engine = WholeState;
        let delta = engine.compute(&base, &target).unwrap();
        prop_assert_eq!(engine.patch(&base, &delta).unwrap(), target);
    }
}
