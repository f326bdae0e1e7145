//! Aggregate Change Execution
//!
//! A `ChangeSet` is the ordered plan for one aggregate. Executing it hands each action to
//! an [`Executor`] in order, then writes any store-generated identifier back into the
//! aggregate so later actions, and the caller, see the persisted state.

use crate::conversion::action::Action;
use crate::conversion::address::PathAddress;
use crate::conversion::executor::Executor;
use crate::error::{ConversionError, ExecutionError};
use crate::mapping::MappingContext;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Save,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Save => write!(f, "SAVE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeSet {
    kind: ChangeKind,
    entity_type: String,
    entity: Option<Value>,
    actions: Vec<Action>,
}

impl ChangeSet {
    pub fn new(kind: ChangeKind, entity_type: impl Into<String>, entity: Option<Value>) -> Self {
        Self {
            kind,
            entity_type: entity_type.into(),
            entity,
            actions: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Aggregate root; after execution, the root with generated identifiers filled in
    pub fn entity(&self) -> Option<&Value> {
        self.entity.as_ref()
    }

    pub fn into_entity(self) -> Option<Value> {
        self.entity
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action in order and back-fill generated identifiers.
    ///
    /// Stops at the first failing action; actions already run are not undone.
    #[instrument(skip_all, fields(kind = %self.kind, entity_type = %self.entity_type, actions = self.actions.len()))]
    pub fn execute_with<E>(
        &mut self,
        executor: &mut E,
        context: &MappingContext,
    ) -> Result<(), ConversionError>
    where
        E: Executor + ?Sized,
    {
        let mut root: Option<Arc<PathAddress>> = None;

        for index in 0..self.actions.len() {
            let (executed, pending) = self.actions.split_at_mut(index);
            let action = &mut pending[0];

            let generated = executor
                .run(action, executed)
                .map_err(|cause| ExecutionError {
                    kind: action.kind(),
                    value: action.describe(),
                    cause,
                })?;

            if let Some(id) = generated {
                if action.set_generated_id(id.clone()) {
                    debug!(action = %action.kind(), id = %id, "Store generated identifier");
                } else {
                    warn!(action = %action.kind(), id = %id, "Ignoring identifier returned for action that cannot generate one");
                }
            }

            if let Some(address) = root_address(action, &self.entity_type) {
                root = Some(address);
            }
            back_fill(action, context)?;
        }

        if let Some(root) = root {
            self.entity = Some(root.current_value()?);
        }
        Ok(())
    }
}

/// Address of a root action for the change set's entity type
fn root_address(action: &Action, entity_type: &str) -> Option<Arc<PathAddress>> {
    match action {
        Action::InsertRoot { address, .. } | Action::UpdateRoot { address, .. } => {
            let value = address.current_value().ok()?;
            (value.type_name() == Some(entity_type)).then(|| Arc::clone(address))
        }
        Action::Insert { .. } | Action::Delete { .. } => None,
    }
}

/// Write a generated identifier into the value the action inserted
fn back_fill(action: &Action, context: &MappingContext) -> Result<(), ConversionError> {
    let (id, address) = match (action.generated_id(), action.address()) {
        (Some(id), Some(address)) => (id.clone(), address),
        _ => return Ok(()),
    };

    let entity = context.reflector().entity(action.entity_type()).ok_or_else(|| {
        ConversionError::Precondition(format!(
            "{} is not a registered entity and cannot receive generated id {}",
            action.entity_type(),
            id
        ))
    })?;
    let id_property = entity.id_property().ok_or_else(|| {
        ConversionError::Precondition(format!(
            "{} has no identifier property to receive generated id {}",
            entity.name(),
            id
        ))
    })?;

    let current = address.current_value()?;
    if current.is_null() {
        return Err(ConversionError::Precondition(format!(
            "No value at {} to receive generated id {}",
            address, id
        )));
    }

    let mut accessor = context.accessor_for(action.entity_type(), current)?;
    accessor.set_property(id_property, id)?;
    let updated = accessor.into_bean();
    address.assign_value(updated)?;
    Ok(())
}
