//! Persistence actions produced by the planner

use crate::conversion::address::PathAddress;
use crate::error::ResolutionError;
use crate::mapping::PropertyPath;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    InsertRoot,
    UpdateRoot,
    Insert,
    Delete,
}

impl ActionKind {
    /// Whether the store may generate an identifier for this action
    pub fn generates_id(self) -> bool {
        matches!(self, ActionKind::InsertRoot | ActionKind::Insert)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::InsertRoot => "InsertRoot",
            ActionKind::UpdateRoot => "UpdateRoot",
            ActionKind::Insert => "Insert",
            ActionKind::Delete => "Delete",
        };
        write!(f, "{}", label)
    }
}

/// Position of an action within its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(usize);

impl ActionId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// One persistence step
#[derive(Debug, Clone)]
pub enum Action {
    /// Insert the aggregate root
    InsertRoot {
        entity_type: String,
        address: Arc<PathAddress>,
        generated_id: Option<Value>,
    },
    /// Update the aggregate root row
    UpdateRoot {
        entity_type: String,
        address: Arc<PathAddress>,
    },
    /// Insert an entity referenced from within the aggregate
    Insert {
        entity_type: String,
        address: Arc<PathAddress>,
        /// Action that persisted the nearest ancestor
        depends_on: Option<ActionId>,
        /// Qualifier column and value for list and map elements
        additional_values: BTreeMap<String, Value>,
        generated_id: Option<Value>,
    },
    /// Remove every row reached from the root through `path`; an empty path is the root row
    Delete {
        entity_type: String,
        root_id: Value,
        path: PropertyPath,
    },
}

impl Action {
    pub fn insert_root(entity_type: impl Into<String>, address: Arc<PathAddress>) -> Self {
        Action::InsertRoot {
            entity_type: entity_type.into(),
            address,
            generated_id: None,
        }
    }

    pub fn update_root(entity_type: impl Into<String>, address: Arc<PathAddress>) -> Self {
        Action::UpdateRoot {
            entity_type: entity_type.into(),
            address,
        }
    }

    pub fn insert(
        entity_type: impl Into<String>,
        address: Arc<PathAddress>,
        depends_on: Option<ActionId>,
    ) -> Self {
        Action::Insert {
            entity_type: entity_type.into(),
            address,
            depends_on,
            additional_values: BTreeMap::new(),
            generated_id: None,
        }
    }

    pub fn delete(entity_type: impl Into<String>, root_id: Value, path: PropertyPath) -> Self {
        Action::Delete {
            entity_type: entity_type.into(),
            root_id,
            path,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::InsertRoot { .. } => ActionKind::InsertRoot,
            Action::UpdateRoot { .. } => ActionKind::UpdateRoot,
            Action::Insert { .. } => ActionKind::Insert,
            Action::Delete { .. } => ActionKind::Delete,
        }
    }

    pub fn entity_type(&self) -> &str {
        match self {
            Action::InsertRoot { entity_type, .. }
            | Action::UpdateRoot { entity_type, .. }
            | Action::Insert { entity_type, .. }
            | Action::Delete { entity_type, .. } => entity_type,
        }
    }

    /// Address of the value this action materializes; `Delete` has none
    pub fn address(&self) -> Option<&Arc<PathAddress>> {
        match self {
            Action::InsertRoot { address, .. }
            | Action::UpdateRoot { address, .. }
            | Action::Insert { address, .. } => Some(address),
            Action::Delete { .. } => None,
        }
    }

    pub fn depends_on(&self) -> Option<ActionId> {
        match self {
            Action::Insert { depends_on, .. } => *depends_on,
            Action::InsertRoot { .. } | Action::UpdateRoot { .. } | Action::Delete { .. } => None,
        }
    }

    /// The dependency among already executed actions
    pub fn dependency<'a>(&self, executed: &'a [Action]) -> Option<&'a Action> {
        self.depends_on().and_then(|id| executed.get(id.index()))
    }

    pub fn additional_values(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Action::Insert {
                additional_values, ..
            } => Some(additional_values),
            Action::InsertRoot { .. } | Action::UpdateRoot { .. } | Action::Delete { .. } => None,
        }
    }

    /// Attach an extra column for the executor. Only inserts carry extra data.
    pub fn put_additional_value(&mut self, column: impl Into<String>, value: Value) -> bool {
        match self {
            Action::Insert {
                additional_values, ..
            } => {
                additional_values.insert(column.into(), value);
                true
            }
            Action::InsertRoot { .. } | Action::UpdateRoot { .. } | Action::Delete { .. } => false,
        }
    }

    pub fn generated_id(&self) -> Option<&Value> {
        match self {
            Action::InsertRoot { generated_id, .. } | Action::Insert { generated_id, .. } => {
                generated_id.as_ref()
            }
            Action::UpdateRoot { .. } | Action::Delete { .. } => None,
        }
    }

    /// Record a store-generated identifier. Returns false for kinds that cannot carry one.
    pub fn set_generated_id(&mut self, id: Value) -> bool {
        match self {
            Action::InsertRoot { generated_id, .. } | Action::Insert { generated_id, .. } => {
                *generated_id = Some(id);
                true
            }
            Action::UpdateRoot { .. } | Action::Delete { .. } => false,
        }
    }

    /// Current value at the action's address
    pub fn value(&self) -> Result<Option<Value>, ResolutionError> {
        self.address().map(|a| a.current_value()).transpose()
    }

    /// Textual form of what the action writes, for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Action::Delete {
                entity_type,
                root_id,
                path,
            } => format!("{} at {} of root {}", entity_type, path, root_id),
            _ => match self.value() {
                Ok(Some(value)) => value.to_string(),
                Ok(None) => self.entity_type().to_string(),
                Err(err) => format!("{} (unresolvable: {})", self.entity_type(), err),
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.describe())
    }
}
