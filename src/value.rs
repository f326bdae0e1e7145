//! Aggregate Values
//!
//! Owned, dynamically shaped representation of an aggregate. Entities carry their runtime
//! type name; containers (lists, sets, maps) hold further values. Every value is totally
//! ordered so it can serve as a map key or a qualifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single value inside an aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Entity(EntityValue),
    List(Vec<Value>),
    Set(SetValue),
    Map(BTreeMap<Value, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type name when this value is an entity
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Entity(entity) => Some(entity.type_name()),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityValue> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Short label for the value's shape, used in diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Entity(_) => "entity",
            Value::List(_) => "list",
            Value::Set(set) => match set.ordering() {
                SetOrdering::Hashed => "hashed set",
                SetOrdering::Linked => "linked set",
                SetOrdering::Sorted => "sorted set",
            },
            Value::Map(_) => "map",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<EntityValue> for Value {
    fn from(value: EntityValue) -> Self {
        Value::Entity(value)
    }
}

impl From<SetValue> for Value {
    fn from(value: SetValue) -> Self {
        Value::Set(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
            Value::Entity(entity) => write!(f, "{}", entity),
            Value::List(items) => {
                write!(f, "[")?;
                write_joined(f, items.iter())?;
                write!(f, "]")
            }
            Value::Set(set) => {
                write!(f, "{{")?;
                write_joined(f, set.iter())?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// An entity instance: runtime type plus named fields
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityValue {
    type_name: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl EntityValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field value; absent fields read as `Null`
    pub fn get(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn field(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Iteration guarantees of a set container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetOrdering {
    /// No stable iteration order; must be normalized before positional addressing
    Hashed,
    /// Insertion order
    Linked,
    /// Natural order of the elements
    Sorted,
}

/// A set of unique values
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SetValue {
    ordering: SetOrdering,
    elements: Vec<Value>,
}

impl SetValue {
    pub fn new(ordering: SetOrdering) -> Self {
        Self {
            ordering,
            elements: Vec::new(),
        }
    }

    pub fn hashed(elements: impl IntoIterator<Item = Value>) -> Self {
        Self::from_elements(SetOrdering::Hashed, elements)
    }

    pub fn linked(elements: impl IntoIterator<Item = Value>) -> Self {
        Self::from_elements(SetOrdering::Linked, elements)
    }

    pub fn sorted(elements: impl IntoIterator<Item = Value>) -> Self {
        Self::from_elements(SetOrdering::Sorted, elements)
    }

    pub fn from_elements(ordering: SetOrdering, elements: impl IntoIterator<Item = Value>) -> Self {
        let mut set = Self::new(ordering);
        for element in elements {
            set.insert(element);
        }
        set
    }

    /// Adds an element unless an equal one is present. Returns whether it was added.
    pub fn insert(&mut self, element: Value) -> bool {
        if self.elements.contains(&element) {
            return false;
        }
        match self.ordering {
            SetOrdering::Sorted => {
                let at = self
                    .elements
                    .binary_search(&element)
                    .unwrap_or_else(|position| position);
                self.elements.insert(at, element);
            }
            SetOrdering::Hashed | SetOrdering::Linked => self.elements.push(element),
        }
        true
    }

    pub fn ordering(&self) -> SetOrdering {
        self.ordering
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.elements.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Same elements in the same order, re-labelled as insertion ordered
    pub fn into_linked(self) -> Self {
        Self {
            ordering: SetOrdering::Linked,
            elements: self.elements,
        }
    }
}
