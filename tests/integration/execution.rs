//! Integration tests for change set execution and identifier back-fill

use super::test_utils::{content, context, field, root, tag};
use aggregate_change::mapping::{EntityDescriptor, PropertyDescriptor, Schema};
use aggregate_change::value::{EntityValue, SetValue, Value};
use aggregate_change::{
    Action, ActionKind, ChangePlanner, ConversionError, Executor, InMemoryStore, MappingContext,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Records every action it sees and hands out a fixed identifier for inserts
struct RecordingExecutor {
    generated: Value,
    fail_on: Option<usize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingExecutor {
    fn new(generated: Value) -> Self {
        Self {
            generated,
            fail_on: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing_on(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }
}

impl Executor for RecordingExecutor {
    fn run(&mut self, action: &Action, executed: &[Action]) -> anyhow::Result<Option<Value>> {
        let mut seen = self.seen.lock();
        seen.push(action.to_string());
        if self.fail_on == Some(executed.len()) {
            anyhow::bail!("connection reset");
        }
        Ok(action.kind().generates_id().then(|| self.generated.clone()))
    }
}

fn execute_with_23(aggregate: Value) -> Value {
    let context = context();
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_insert(aggregate)
        .unwrap();
    change_set
        .execute_with(&mut RecordingExecutor::new(Value::Int(23)), &context)
        .unwrap();
    change_set.into_entity().unwrap()
}

#[test]
fn test_back_fill_single_reference() {
    let stored = execute_with_23(root().with("single", content("a")).into());

    assert_eq!(field(&stored, "id"), Value::Int(23));
    assert_eq!(field(&field(&stored, "single"), "id"), Value::Int(23));
    assert_eq!(field(&field(&stored, "single"), "name"), Value::from("a"));
}

#[test]
fn test_back_fill_set_element() {
    let stored = execute_with_23(
        root()
            .with("content_set", SetValue::hashed([content("a")]))
            .into(),
    );

    match field(&stored, "content_set") {
        Value::Set(set) => {
            assert_eq!(set.len(), 1);
            assert_eq!(field(set.get(0).unwrap(), "id"), Value::Int(23));
        }
        other => panic!("expected set, got {}", other),
    }
}

#[test]
fn test_back_fill_list_element() {
    let stored = execute_with_23(
        root()
            .with("content_list", Value::List(vec![content("a")]))
            .into(),
    );

    match field(&stored, "content_list") {
        Value::List(items) => assert_eq!(field(&items[0], "id"), Value::Int(23)),
        other => panic!("expected list, got {}", other),
    }
}

#[test]
fn test_back_fill_map_entry() {
    let mut entries = BTreeMap::new();
    entries.insert(Value::from("one"), content("a"));
    let stored = execute_with_23(root().with("content_map", Value::Map(entries)).into());

    match field(&stored, "content_map") {
        Value::Map(entries) => {
            let entry = entries.get(&Value::from("one")).unwrap();
            assert_eq!(field(entry, "id"), Value::Int(23));
        }
        other => panic!("expected map, got {}", other),
    }
}

#[test]
fn test_back_fill_reaches_grandchildren() {
    let nested: Value = EntityValue::new("Content")
        .with("name", "a")
        .with("tags", Value::List(vec![tag("x"), tag("y")]))
        .into();
    let context = context();
    let mut store = InMemoryStore::new(Arc::clone(&context));
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_save(root().with("content_list", Value::List(vec![nested])).into())
        .unwrap();
    change_set.execute_with(&mut store, &context).unwrap();

    let stored = change_set.entity().unwrap();
    assert_eq!(field(stored, "id"), Value::Int(1));
    let list = field(stored, "content_list");
    let content = match &list {
        Value::List(items) => &items[0],
        other => panic!("expected list, got {}", other),
    };
    assert_eq!(field(content, "id"), Value::Int(2));
    assert_eq!(
        field(content, "tags"),
        Value::List(vec![
            EntityValue::new("Tag").with("id", 3i64).with("label", "x").into(),
            EntityValue::new("Tag").with("id", 4i64).with("label", "y").into(),
        ])
    );

    let tags = store.rows("Tag");
    assert_eq!(tags[1].parent_id, Some(Value::Int(2)));
    assert_eq!(tags[1].root_id, Value::Int(1));
    assert_eq!(tags[1].columns.get("content_key"), Some(&Value::Int(1)));
}

#[test]
fn test_executor_sees_executed_prefix() {
    let context = context();
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_insert(root().with("single", content("a")).into())
        .unwrap();

    let parents = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&parents);
    let mut executor = move |action: &Action, executed: &[Action]| -> anyhow::Result<Option<Value>> {
        let parent = action
            .dependency(executed)
            .and_then(|dependency| dependency.generated_id().cloned());
        recorded.lock().push(parent);
        Ok(Some(Value::Int(executed.len() as i64 + 100)))
    };
    change_set.execute_with(&mut executor, &context).unwrap();

    assert_eq!(*parents.lock(), vec![None, Some(Value::Int(100))]);
    let stored = change_set.entity().unwrap();
    assert_eq!(field(&field(stored, "single"), "id"), Value::Int(101));
}

#[test]
fn test_failure_names_action_and_value() {
    let context = context();
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_insert(root().into())
        .unwrap();
    let mut executor = RecordingExecutor::new(Value::Int(1)).failing_on(0);

    let err = change_set.execute_with(&mut executor, &context).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Insert"), "{}", message);
    assert!(message.contains("DummyEntity{some_name=root}"), "{}", message);
    assert_eq!(
        std::error::Error::source(&err).map(|cause| cause.to_string()),
        Some("connection reset".to_string())
    );
}

#[test]
fn test_failure_stops_remaining_actions() {
    let context = context();
    let aggregate: Value = root()
        .with("content_list", Value::List(vec![content("a"), content("b")]))
        .into();
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_insert(aggregate)
        .unwrap();
    let executor = RecordingExecutor::new(Value::Int(5)).failing_on(1);
    let seen = Arc::clone(&executor.seen);
    let mut executor = executor;

    let err = change_set.execute_with(&mut executor, &context).unwrap_err();
    match err {
        ConversionError::Execution(execution) => {
            assert_eq!(execution.kind, ActionKind::Insert);
            assert_eq!(execution.value, "Content{name=a}");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn test_generated_id_without_identifier_property_is_rejected() {
    let schema = Schema::builder()
        .entity(
            EntityDescriptor::new("Order")
                .with_id("id")
                .with_property(PropertyDescriptor::single("note", "Note")),
        )
        .entity(EntityDescriptor::new("Note").with_property(PropertyDescriptor::scalar("text")))
        .build()
        .unwrap();
    let context = Arc::new(MappingContext::new(schema));
    let order: Value = EntityValue::new("Order")
        .with("note", EntityValue::new("Note").with("text", "hi"))
        .into();
    let mut change_set = ChangePlanner::new(Arc::clone(&context))
        .plan_insert(order)
        .unwrap();

    let err = change_set
        .execute_with(&mut RecordingExecutor::new(Value::Int(8)), &context)
        .unwrap_err();
    assert!(matches!(err, ConversionError::Precondition(_)), "{:?}", err);
}

#[test]
fn test_save_round_trip_through_store() {
    let context = context();
    let planner = ChangePlanner::new(Arc::clone(&context));
    let mut store = InMemoryStore::new(Arc::clone(&context));

    let mut first = planner
        .plan_save(
            root()
                .with("single", content("kept"))
                .with("content_set", SetValue::hashed([content("a"), content("b")]))
                .into(),
        )
        .unwrap();
    first.execute_with(&mut store, &context).unwrap();
    assert_eq!(store.rows("Content").len(), 3);

    let stored = first.into_entity().unwrap();
    let trimmed = context
        .set_property(stored, "content_set", Value::Null)
        .unwrap();
    let mut second = planner.plan_save(trimmed).unwrap();
    second.execute_with(&mut store, &context).unwrap();

    let contents = store.rows("Content");
    assert_eq!(contents.len(), 1);
    assert_eq!(field(&contents[0].value, "name"), Value::from("kept"));
    assert_eq!(contents[0].id, Value::Int(2));
    assert_eq!(store.rows("DummyEntity").len(), 1);
}

#[test]
fn test_delete_after_save_clears_store() {
    let context = context();
    let planner = ChangePlanner::new(Arc::clone(&context));
    let mut store = InMemoryStore::new(Arc::clone(&context));
    let nested: Value = EntityValue::new("Content")
        .with("name", "a")
        .with("tags", Value::List(vec![tag("x")]))
        .into();

    let mut saved = planner
        .plan_save(root().with("single", nested).into())
        .unwrap();
    saved.execute_with(&mut store, &context).unwrap();
    let root_id = field(saved.entity().unwrap(), "id");
    assert_eq!(store.row_count(), 3);

    let mut delete = planner
        .plan_delete("DummyEntity", root_id, saved.into_entity())
        .unwrap();
    delete.execute_with(&mut store, &context).unwrap();
    assert_eq!(store.row_count(), 0);
}
