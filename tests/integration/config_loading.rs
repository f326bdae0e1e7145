//! Integration tests for configuration loading and schema construction

use super::test_utils::ENV_MUTEX;
use aggregate_change::mapping::PropertyShape;
use aggregate_change::value::{EntityValue, Value};
use aggregate_change::{
    ActionKind, ChangePlanner, ConfigLoader, ConversionError, MappingContext, Schema, SchemaReflector,
};
use std::sync::Arc;
use tempfile::TempDir;

const ORDER_CONFIG: &str = r#"
[planning]
max_depth = 6

[[entities]]
name = "Order"
id_property = "id"

[[entities.properties]]
name = "customer"
shape = "scalar"

[[entities.properties]]
name = "lines"
target = "OrderLine"
shape = "list"

[[entities.properties]]
name = "labels"
target = "Label"
shape = "map"
key_column = "label_name"

[[entities]]
name = "OrderLine"
id_property = "id"

[[entities]]
name = "Label"
id_property = "id"
"#;

#[test]
fn test_load_schema_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("aggregate.toml");
    std::fs::write(&config_file, ORDER_CONFIG).unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.planning.max_depth, 6);

    let schema = Schema::from_config(&config).unwrap();
    assert_eq!(schema.len(), 3);
    let order = schema.entity("Order").unwrap();
    assert_eq!(order.id_property(), Some("id"));
    assert_eq!(order.property("lines").unwrap().shape, PropertyShape::List);
    assert_eq!(
        order.entity_properties().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["lines", "labels"]
    );
}

#[test]
fn test_configured_schema_drives_planning() {
    let config = ConfigLoader::load_from_str(ORDER_CONFIG).unwrap();
    let context = Arc::new(MappingContext::new(Schema::from_config(&config).unwrap()));
    let planner = ChangePlanner::with_config(Arc::clone(&context), config.planning.clone());

    let mut labels = std::collections::BTreeMap::new();
    labels.insert(Value::from("rush"), EntityValue::new("Label").into());
    let order: Value = EntityValue::new("Order")
        .with("customer", "ada")
        .with(
            "lines",
            Value::List(vec![EntityValue::new("OrderLine").into()]),
        )
        .with("labels", Value::Map(labels))
        .into();

    let actions = planner.insert(order).unwrap();
    assert_eq!(
        actions.iter().map(|a| a.kind()).collect::<Vec<_>>(),
        vec![ActionKind::InsertRoot, ActionKind::Insert, ActionKind::Insert]
    );
    assert_eq!(
        actions[1].additional_values().and_then(|v| v.get("order_key")),
        Some(&Value::Int(0))
    );
    assert_eq!(
        actions[2].additional_values().and_then(|v| v.get("label_name")),
        Some(&Value::from("rush"))
    );
}

#[test]
fn test_missing_optional_file_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load(Some(&temp_dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.planning.max_depth, 32);
    assert_eq!(config.logging.level, "info");
    assert!(config.entities.is_empty());
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("aggregate.toml");
    std::fs::write(&config_file, ORDER_CONFIG).unwrap();

    std::env::set_var("AGGREGATE__PLANNING__MAX_DEPTH", "3");
    let loaded = ConfigLoader::load(Some(&config_file));
    std::env::remove_var("AGGREGATE__PLANNING__MAX_DEPTH");

    let config = loaded.unwrap();
    assert_eq!(config.planning.max_depth, 3);
    assert_eq!(config.entities.len(), 3);
}

#[test]
fn test_invalid_configuration_is_reported() {
    let err = ConfigLoader::load_from_str(
        r#"
[logging]
format = "xml"

[[entities]]
name = "Order"

[[entities.properties]]
name = "lines"
shape = "list"
"#,
    )
    .unwrap_err();

    match err {
        ConversionError::ConfigError(message) => {
            assert!(message.contains("Logging"), "{}", message);
            assert!(message.contains("Entity 'Order'"), "{}", message);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_duplicate_schema_entity_rejected() {
    let err = Schema::from_toml_str(
        r#"
[[entities]]
name = "Order"
id_property = "id"

[[entities]]
name = "Order"
id_property = "id"
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Order"));
}
