//! How a value sits inside its immediate container

use crate::value::{SetOrdering, SetValue, Value};
use std::fmt;

/// Failure to locate or replace an element inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// The container does not have the shape this strategy addresses
    Shape { expected: &'static str, found: String },
    /// The container has the right shape but not the addressed element
    Missing(String),
}

/// Identification strategy of one path address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentificationStrategy {
    /// The container value is the element
    Direct,
    /// Entry of a map
    MapKey(Value),
    /// Element of a list
    ListIndex(usize),
    /// Element of an insertion-ordered set
    SetPosition(usize),
    /// A value computed earlier; independent of any container
    KnownValue(Value),
}

impl IdentificationStrategy {
    /// Pull the addressed element out of its container
    pub fn extract(&self, container: Option<&Value>) -> Result<Value, StrategyError> {
        if let IdentificationStrategy::KnownValue(value) = self {
            return Ok(value.clone());
        }
        let container = container.ok_or(StrategyError::Shape {
            expected: self.expected_shape(),
            found: "no container".to_string(),
        })?;

        match (self, container) {
            (IdentificationStrategy::Direct, value) => Ok(value.clone()),
            (IdentificationStrategy::MapKey(key), Value::Map(entries)) => entries
                .get(key)
                .cloned()
                .ok_or_else(|| StrategyError::Missing(format!("key {}", key))),
            (IdentificationStrategy::ListIndex(index), Value::List(items)) => items
                .get(*index)
                .cloned()
                .ok_or_else(|| StrategyError::Missing(format!("index {}", index))),
            (IdentificationStrategy::SetPosition(position), Value::Set(set)) => set
                .get(*position)
                .cloned()
                .ok_or_else(|| StrategyError::Missing(format!("position {}", position))),
            (_, other) => Err(StrategyError::Shape {
                expected: self.expected_shape(),
                found: other.shape().to_string(),
            }),
        }
    }

    /// Qualifier to persist alongside the element: map key or list index
    pub fn external_identifier(&self) -> Option<Value> {
        match self {
            IdentificationStrategy::MapKey(key) => Some(key.clone()),
            IdentificationStrategy::ListIndex(index) => Some(Value::from(*index)),
            IdentificationStrategy::Direct
            | IdentificationStrategy::SetPosition(_)
            | IdentificationStrategy::KnownValue(_) => None,
        }
    }

    /// Container reflecting `element` at this strategy's position.
    ///
    /// Sets always come back insertion ordered so later positional reads stay stable.
    pub fn rebuild(&self, container: Value, element: Value) -> Result<Value, StrategyError> {
        match (self, container) {
            (IdentificationStrategy::Direct, _) | (IdentificationStrategy::KnownValue(_), _) => {
                Ok(element)
            }
            (IdentificationStrategy::MapKey(key), Value::Map(mut entries)) => {
                entries.insert(key.clone(), element);
                Ok(Value::Map(entries))
            }
            (IdentificationStrategy::ListIndex(index), Value::List(mut items)) => {
                let slot = items
                    .get_mut(*index)
                    .ok_or_else(|| StrategyError::Missing(format!("index {}", index)))?;
                *slot = element;
                Ok(Value::List(items))
            }
            (IdentificationStrategy::SetPosition(position), Value::Set(set)) => {
                if *position >= set.len() {
                    return Err(StrategyError::Missing(format!("position {}", position)));
                }
                let mut rebuilt = SetValue::new(SetOrdering::Linked);
                for (i, existing) in set.iter().enumerate() {
                    if i == *position {
                        rebuilt.insert(element.clone());
                    } else {
                        rebuilt.insert(existing.clone());
                    }
                }
                Ok(Value::Set(rebuilt))
            }
            (_, other) => Err(StrategyError::Shape {
                expected: self.expected_shape(),
                found: other.shape().to_string(),
            }),
        }
    }

    fn expected_shape(&self) -> &'static str {
        match self {
            IdentificationStrategy::Direct | IdentificationStrategy::KnownValue(_) => "value",
            IdentificationStrategy::MapKey(_) => "map",
            IdentificationStrategy::ListIndex(_) => "list",
            IdentificationStrategy::SetPosition(_) => "set",
        }
    }
}

impl fmt::Display for IdentificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentificationStrategy::Direct => write!(f, "direct"),
            IdentificationStrategy::MapKey(key) => write!(f, "key {}", key),
            IdentificationStrategy::ListIndex(index) => write!(f, "index {}", index),
            IdentificationStrategy::SetPosition(position) => write!(f, "position {}", position),
            IdentificationStrategy::KnownValue(_) => write!(f, "known value"),
        }
    }
}
