//! End-to-end tests for the provenance tracker.
//!
//! Tests cover:
//! - Counter and todo-list scenarios
//! - Label validation and cursor advance
//! - Branch isolation after navigating to an ancestor
//! - Listener ordering, unsubscription and state observers
//! - Export/import and concurrent readers

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use trellis_sdk::{
    Action, ActionType, EventKind, Metadata, Provenance, ProvenanceConfig, ProvenanceError,
    ProvenanceEvent, StorageMode, WholeState,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Counter {
    counter: i64,
    message: String,
}

impl Counter {
    fn initial() -> Self {
        Counter {
            counter: 0,
            message: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Todo {
    title: String,
    description: String,
    status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TodoManager {
    name: String,
    todos: Vec<Todo>,
}

fn increment(state: &Counter, _: &[()]) -> Counter {
    Counter {
        counter: state.counter + 1,
        ..state.clone()
    }
}

fn change_message(state: &Counter, args: &[String]) -> Counter {
    Counter {
        message: args.first().cloned().unwrap_or_default(),
        ..state.clone()
    }
}

fn task_1() -> Todo {
    Todo {
        title: "Task 1".into(),
        description: "This is a test task".into(),
        status: "incomplete".into(),
    }
}

#[test]
fn test_increment_counter() {
    let provenance = Provenance::new(Counter::initial());
    let before = provenance.current_state().unwrap().counter;

    provenance
        .apply(&Action::new(increment).set_label("Increase Counter"))
        .unwrap();

    let after = provenance.current_state().unwrap().counter;
    assert_eq!(after - before, 1);
}

#[test]
fn test_change_message_from_args() {
    let provenance = Provenance::new(Counter::initial());
    let msg = "Hello, World!".to_string();

    provenance
        .apply(
            &Action::new(change_message)
                .set_label("Change Message")
                .set_args([msg.clone()]),
        )
        .unwrap();

    assert_eq!(provenance.current_state().unwrap().message, msg);
}

#[test]
fn test_metadata_and_event_type_on_node() {
    let provenance = Provenance::new(Counter::initial());
    let mut meta = Metadata::new();
    meta.insert("testMetaData".into(), "Hello, World!".into());

    provenance
        .apply(
            &Action::new(increment)
                .set_label("Increment counter")
                .set_metadata(meta)
                .set_event_type("IncreaseCounter"),
        )
        .unwrap();

    let current = provenance.current();
    assert!(!current.is_root());
    assert_eq!(current.metadata["testMetaData"], "Hello, World!");
    assert_eq!(current.event_type.as_deref(), Some("IncreaseCounter"));
}

#[test]
fn test_missing_label_is_rejected() {
    let provenance = Provenance::new(Counter::initial());
    let err = provenance.apply(&Action::new(increment)).unwrap_err();

    assert!(matches!(err, ProvenanceError::MissingLabel));
    assert_eq!(err.to_string(), "Please specify a label for the action");
    assert_eq!(provenance.len(), 1);
    assert_eq!(provenance.current_id(), provenance.root());
}

#[test]
fn test_cursor_advances_and_parent_gains_child() {
    let provenance = Provenance::new(Counter::initial());
    let parent = provenance.current_id();

    let node = provenance
        .apply(&Action::new(increment).set_label("inc"))
        .unwrap();

    assert_eq!(provenance.current_id(), node.id);
    assert_eq!(node.parent_id, Some(parent));
    assert_eq!(provenance.node(&parent).unwrap().child_ids, vec![node.id]);
}

#[test]
fn test_todo_manager_diff_then_complete() {
    let provenance = Provenance::new(TodoManager {
        name: String::new(),
        todos: vec![],
    });

    let change_name = Action::new(|state: &TodoManager, args: &[String]| TodoManager {
        name: args[0].clone(),
        ..state.clone()
    })
    .set_label("rename");
    let add_todo = Action::new(|state: &TodoManager, args: &[Todo]| {
        let mut next = state.clone();
        next.todos.extend_from_slice(args);
        next
    })
    .set_label("addTodo");

    let renamed = provenance
        .apply(&change_name.set_args(["New Name".to_string()]))
        .unwrap();
    assert_eq!(renamed.storage(), StorageMode::Diff);
    assert_eq!(
        provenance.get_state(&renamed.id).unwrap(),
        TodoManager {
            name: "New Name".into(),
            todos: vec![],
        }
    );

    let diff_todo = provenance
        .apply(&add_todo.clone().set_args([task_1()]))
        .unwrap();
    assert!(diff_todo.payload.is_diff());

    provenance.move_to(&renamed.id).unwrap();
    let full_todo = provenance
        .apply(
            &add_todo
                .set_args([task_1()])
                .save_state_mode(StorageMode::Complete),
        )
        .unwrap();

    let expected = TodoManager {
        name: "New Name".into(),
        todos: vec![task_1()],
    };
    assert_eq!(full_todo.payload.state(), Some(&expected));
    assert_eq!(provenance.get_state(&full_todo.id).unwrap(), expected);
    assert_eq!(provenance.get_state(&diff_todo.id).unwrap(), expected);
}

#[test]
fn test_branch_isolation() {
    let provenance = Provenance::new(Counter::initial());
    let root = provenance.root();

    let a = provenance
        .apply(&Action::new(increment).set_label("A"))
        .unwrap()
        .id;
    let b = provenance
        .apply(
            &Action::new(change_message)
                .set_label("B")
                .set_args(["from b".to_string()]),
        )
        .unwrap()
        .id;
    let b_state = provenance.get_state(&b).unwrap();

    provenance.move_to(&a).unwrap();
    let c = provenance
        .apply(
            &Action::new(change_message)
                .set_label("C")
                .set_args(["from c".to_string()]),
        )
        .unwrap()
        .id;

    assert_eq!(provenance.get_state(&b).unwrap(), b_state);
    assert_eq!(provenance.get_state(&c).unwrap().message, "from c");
    assert_eq!(provenance.node(&a).unwrap().child_ids, vec![b, c]);
    assert_eq!(provenance.node(&root).unwrap().child_ids, vec![a]);
}

#[test]
fn test_reconstruct_is_independent_of_cursor() {
    let provenance = Provenance::new(Counter::initial());
    let ids: Vec<_> = (0..4)
        .map(|i| {
            provenance
                .apply(&Action::new(increment).set_label(format!("inc {}", i)))
                .unwrap()
                .id
        })
        .collect();

    provenance.reset().unwrap();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(provenance.get_state(id).unwrap().counter, i as i64 + 1);
    }
}

#[test]
fn test_listeners_receive_events_in_order() {
    let provenance = Provenance::new(Counter::initial());
    let log: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    let subscription = provenance.subscribe(move |event: &ProvenanceEvent| {
        sink.lock().push(event.kind());
    });

    let a = provenance
        .apply(&Action::new(increment).set_label("a"))
        .unwrap()
        .id;
    provenance.reset().unwrap();
    provenance.move_to(&a).unwrap();
    // Moving onto the current node is not a change.
    provenance.move_to(&a).unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            EventKind::NodeAdded,
            EventKind::CurrentChanged,
            EventKind::CurrentChanged,
            EventKind::CurrentChanged,
        ]
    );

    assert!(subscription.unsubscribe());
    provenance.reset().unwrap();
    assert_eq!(log.lock().len(), 4);
}

#[test]
fn test_listener_can_read_state() {
    let provenance = Arc::new(Provenance::new(Counter::initial()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let reader = Arc::downgrade(&provenance);
    let sink = Arc::clone(&seen);
    let _subscription = provenance.subscribe(move |event: &ProvenanceEvent| {
        if let (ProvenanceEvent::CurrentChanged { current, .. }, Some(p)) = (event, reader.upgrade())
        {
            sink.lock().push(p.get_state(current).unwrap().counter);
        }
    });

    provenance
        .apply(&Action::new(increment).set_label("a"))
        .unwrap();
    provenance
        .apply(&Action::new(increment).set_label("b"))
        .unwrap();
    provenance.undo().unwrap();

    assert_eq!(*seen.lock(), vec![1, 2, 1]);
}

#[test]
fn test_observe_state_only_fires_on_change() {
    let provenance = Provenance::new(Counter::initial());
    let messages = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&messages);
    let _subscription = provenance
        .observe_state(
            |state: &Counter| state.message.clone(),
            move |message: &String| sink.lock().push(message.clone()),
        )
        .unwrap();

    provenance
        .apply(&Action::new(increment).set_label("inc"))
        .unwrap();
    provenance
        .apply(
            &Action::new(change_message)
                .set_label("msg")
                .set_args(["hi".to_string()]),
        )
        .unwrap();
    provenance.undo().unwrap();

    assert_eq!(*messages.lock(), vec!["hi".to_string(), String::new()]);
}

#[test]
fn test_ephemeral_nodes_are_recorded() {
    let provenance = Provenance::new(Counter::initial());
    let node = provenance
        .apply(
            &Action::new(increment)
                .set_label("hover")
                .set_action_type(ActionType::Ephemeral),
        )
        .unwrap();

    assert!(node.is_ephemeral());
    assert_eq!(provenance.get_state(&node.id).unwrap().counter, 1);
}

#[test]
fn test_json_export_import() {
    let provenance = Provenance::new(Counter::initial());
    let a = provenance
        .apply(&Action::new(increment).set_label("a"))
        .unwrap()
        .id;
    provenance
        .apply(
            &Action::new(change_message)
                .set_label("b")
                .set_args(["x".to_string()])
                .save_state_mode(StorageMode::Complete),
        )
        .unwrap();
    provenance.move_to(&a).unwrap();

    let json = provenance.to_json().unwrap();
    let restored: Provenance<Counter> =
        Provenance::from_json(&json, trellis_sdk::JsonDiff, ProvenanceConfig::default()).unwrap();

    assert_eq!(restored.to_json().unwrap(), json);
    assert_eq!(restored.current_id(), a);
    for node in provenance.read(|g| g.nodes().map(|n| n.id).collect::<Vec<_>>()) {
        assert_eq!(
            restored.get_state(&node).unwrap(),
            provenance.get_state(&node).unwrap()
        );
    }

    // The restored tracker keeps recording from the restored cursor.
    let next = restored
        .apply(&Action::new(increment).set_label("c"))
        .unwrap();
    assert_eq!(next.parent_id, Some(a));
}

#[test]
fn test_import_rejects_corrupt_export() {
    let provenance = Provenance::new(Counter::initial());
    provenance
        .apply(&Action::new(increment).set_label("a"))
        .unwrap();

    let mut export = provenance.export();
    export.nodes[1].parent_id = Some(trellis_sdk::NodeId::new());

    let result = Provenance::import(export, trellis_sdk::JsonDiff, ProvenanceConfig::default());
    assert!(matches!(result, Err(ProvenanceError::InvalidGraph(_))));
}

#[test]
fn test_whole_state_engine() {
    let provenance =
        Provenance::with_engine(Counter::initial(), WholeState, ProvenanceConfig::default());
    let node = provenance
        .apply(&Action::new(increment).set_label("a"))
        .unwrap();

    assert!(node.payload.is_diff());
    assert_eq!(provenance.get_state(&node.id).unwrap().counter, 1);
}

#[test]
fn test_concurrent_readers() {
    let provenance = Arc::new(Provenance::new(Counter::initial()));
    let ids: Vec<_> = (0..20)
        .map(|i| {
            provenance
                .apply(&Action::new(increment).set_label(format!("inc {}", i)))
                .unwrap()
                .id
        })
        .collect();
    let ids = Arc::new(ids);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let provenance = Arc::clone(&provenance);
            let ids = Arc::clone(&ids);
            thread::spawn(move || {
                for (i, id) in ids.iter().enumerate() {
                    assert_eq!(provenance.get_state(id).unwrap().counter, i as i64 + 1);
                }
            })
        })
        .collect();

    for i in 0..10 {
        provenance
            .apply(&Action::new(increment).set_label(format!("more {}", i)))
            .unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(provenance.len(), 31);
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Reading {
    value: f64,
}

#[test]
fn test_unencodable_state_is_rejected_before_commit() {
    let provenance = Provenance::new(Reading { value: 0.0 });
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let _subscription = provenance.subscribe(move |event: &ProvenanceEvent| {
        sink.lock().push(event.kind());
    });

    let record = Action::new(|_: &Reading, args: &[f64]| Reading { value: args[0] })
        .set_label("record");

    let result = provenance.apply(&record.clone().set_args([f64::NAN]));
    assert!(matches!(result, Err(ProvenanceError::Diff(_))));
    assert_eq!(provenance.len(), 1);
    assert_eq!(provenance.current_id(), provenance.root());
    assert!(events.lock().is_empty());

    // Complete storage holds the value as-is.
    let node = provenance
        .apply(&record.set_args([f64::NAN]).save_state_mode(StorageMode::Complete))
        .unwrap();
    assert!(provenance.get_state(&node.id).unwrap().value.is_nan());
}

#[test]
fn test_cached_and_uncached_states_agree() {
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Nested {
        v: Option<Option<i32>>,
    }

    let set = Action::new(|_: &Nested, args: &[Option<i32>]| Nested { v: Some(args[0]) })
        .set_label("set");

    let cached = Provenance::new(Nested { v: None });
    let uncached = Provenance::with_config(
        Nested { v: None },
        ProvenanceConfig {
            cache_capacity: 0,
            ..ProvenanceConfig::default()
        },
    );
    let a = cached.apply(&set.clone().set_args([None])).unwrap();
    let b = uncached.apply(&set.set_args([None])).unwrap();

    assert_eq!(
        cached.get_state(&a.id).unwrap(),
        uncached.get_state(&b.id).unwrap()
    );
}
