//! Row Store
//!
//! Reference executor that materializes planned actions as rows in memory. Each row keeps
//! the identity of the aggregate root it belongs to and the property path it was reached
//! through, which is what path-scoped deletes select on.

pub mod in_memory;

pub use in_memory::InMemoryStore;

use crate::mapping::PropertyPath;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One persisted entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: Value,
    /// Identifier of the aggregate root the row belongs to
    pub root_id: Value,
    /// Path from the root; empty for the root row
    pub path: PropertyPath,
    /// Identifier of the row this one was inserted under
    pub parent_id: Option<Value>,
    /// Qualifier columns supplied with the insert
    pub columns: BTreeMap<String, Value>,
    pub value: Value,
}

impl Row {
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }
}
