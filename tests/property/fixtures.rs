//! Generated aggregates over a fixed schema

use aggregate_change::mapping::{EntityDescriptor, PropertyDescriptor, Schema};
use aggregate_change::value::{EntityValue, SetValue, Value};
use aggregate_change::MappingContext;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn context() -> Arc<MappingContext> {
    let schema = Schema::builder()
        .entity(
            EntityDescriptor::new("DummyEntity")
                .with_id("id")
                .with_property(PropertyDescriptor::single("single", "Content"))
                .with_property(PropertyDescriptor::set("content_set", "Content"))
                .with_property(PropertyDescriptor::list("content_list", "Content"))
                .with_property(PropertyDescriptor::map("content_map", "Content")),
        )
        .entity(
            EntityDescriptor::new("Content")
                .with_id("id")
                .with_property(PropertyDescriptor::scalar("name"))
                .with_property(PropertyDescriptor::list("tags", "Tag")),
        )
        .entity(
            EntityDescriptor::new("Tag")
                .with_id("id")
                .with_property(PropertyDescriptor::scalar("label")),
        )
        .build()
        .unwrap();
    Arc::new(MappingContext::new(schema))
}

/// Content named `prefix-index` so siblings never collapse inside a set
fn content(prefix: &str, index: usize, tags: usize) -> Value {
    let tags: Vec<Value> = (0..tags)
        .map(|t| EntityValue::new("Tag").with("label", format!("t{}", t)).into())
        .collect();
    let mut entity = EntityValue::new("Content").with("name", format!("{}-{}", prefix, index));
    if !tags.is_empty() {
        entity = entity.with("tags", Value::List(tags));
    }
    entity.into()
}

/// Shape of a generated aggregate
#[derive(Debug, Clone)]
pub struct AggregateShape {
    pub id: Option<i64>,
    pub single: Option<usize>,
    pub set: Vec<usize>,
    pub list: Vec<usize>,
    pub map: Vec<usize>,
}

impl AggregateShape {
    pub fn build(&self) -> Value {
        let mut root = EntityValue::new("DummyEntity");
        if let Some(id) = self.id {
            root = root.with("id", id);
        }
        if let Some(tags) = self.single {
            root = root.with("single", content("single", 0, tags));
        }
        if !self.set.is_empty() {
            let elements = self.set.iter().enumerate().map(|(i, t)| content("set", i, *t));
            root = root.with("content_set", SetValue::hashed(elements));
        }
        if !self.list.is_empty() {
            let items = self.list.iter().enumerate().map(|(i, t)| content("list", i, *t));
            root = root.with("content_list", Value::List(items.collect()));
        }
        if !self.map.is_empty() {
            let entries: BTreeMap<Value, Value> = self
                .map
                .iter()
                .enumerate()
                .map(|(i, t)| (Value::from(format!("key{}", i)), content("map", i, *t)))
                .collect();
            root = root.with("content_map", Value::Map(entries));
        }
        root.into()
    }

    /// Entities below the root
    pub fn child_count(&self) -> usize {
        let contents = self
            .single
            .iter()
            .chain(&self.set)
            .chain(&self.list)
            .chain(&self.map);
        contents.map(|tags| 1 + tags).sum()
    }
}

pub fn aggregate_shape() -> impl Strategy<Value = AggregateShape> {
    let tags = 0usize..3;
    (
        proptest::option::of(1i64..1000),
        proptest::option::of(tags.clone()),
        proptest::collection::vec(tags.clone(), 0..4),
        proptest::collection::vec(tags.clone(), 0..4),
        proptest::collection::vec(tags, 0..4),
    )
        .prop_map(|(id, single, set, list, map)| AggregateShape {
            id,
            single,
            set,
            list,
            map,
        })
}
