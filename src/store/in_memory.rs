//! In-memory executor with auto-increment identifiers

use crate::conversion::{Action, ActionKind, Executor};
use crate::mapping::{MappingContext, PropertyPath};
use crate::store::Row;
use crate::value::Value;
use anyhow::{anyhow, bail};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub struct InMemoryStore {
    context: Arc<MappingContext>,
    tables: BTreeMap<String, Vec<Row>>,
    next_id: i64,
}

impl InMemoryStore {
    pub fn new(context: Arc<MappingContext>) -> Self {
        Self {
            context,
            tables: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rows of one entity type in insertion order
    pub fn rows(&self, entity_type: &str) -> &[Row] {
        self.tables
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn find(&self, entity_type: &str, id: &Value) -> Option<&Row> {
        self.rows(entity_type).iter().find(|row| &row.id == id)
    }

    /// Rows inserted under the row identified by `parent_id`
    pub fn children_of<'a>(
        &'a self,
        entity_type: &str,
        parent_id: &'a Value,
    ) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows(entity_type)
            .iter()
            .filter(move |row| row.parent_id.as_ref() == Some(parent_id))
    }

    /// Next counter value not already taken by a row of `entity_type`
    fn allocate(&mut self, entity_type: &str) -> Value {
        loop {
            let id = Value::Int(self.next_id);
            self.next_id += 1;
            if self.find(entity_type, &id).is_none() {
                return id;
            }
        }
    }

    /// Identifier the action's entity has or was given
    fn identity(&self, action: &Action) -> anyhow::Result<Value> {
        if let Some(id) = action.generated_id() {
            return Ok(id.clone());
        }
        let value = action
            .value()?
            .ok_or_else(|| anyhow!("{} addresses no value", action.kind()))?;
        let entity = self.context.reflector().required_entity(action.entity_type())?;
        Ok(self.context.get_property(&value, entity.required_id_property()?)?)
    }

    fn root_identity(&self, executed: &[Action]) -> anyhow::Result<Value> {
        let root = executed
            .iter()
            .rev()
            .find(|a| matches!(a.kind(), ActionKind::InsertRoot | ActionKind::UpdateRoot))
            .ok_or_else(|| anyhow!("No root action ran before this insert"))?;
        self.identity(root)
    }

    /// Value to store, its identifier, and the identifier if it was generated here
    fn prepare(&mut self, action: &Action) -> anyhow::Result<(Value, Value, Option<Value>)> {
        let value = action
            .value()?
            .ok_or_else(|| anyhow!("{} addresses no value", action.kind()))?;
        let id_property = self
            .context
            .reflector()
            .required_entity(action.entity_type())?
            .required_id_property()?
            .to_string();

        let existing = self.context.get_property(&value, &id_property)?;
        if !existing.is_null() {
            if self.find(action.entity_type(), &existing).is_some() {
                bail!("Duplicate key {} for {}", existing, action.entity_type());
            }
            return Ok((value, existing, None));
        }

        let id = self.allocate(action.entity_type());
        let value = self.context.set_property(value, &id_property, id.clone())?;
        Ok((value, id.clone(), Some(id)))
    }

    fn insert_root(&mut self, action: &Action) -> anyhow::Result<Option<Value>> {
        let (value, id, generated) = self.prepare(action)?;
        trace!(entity_type = action.entity_type(), id = %id, "Insert root row");
        self.table(action.entity_type()).push(Row {
            root_id: id.clone(),
            id,
            path: PropertyPath::root(),
            parent_id: None,
            columns: BTreeMap::new(),
            value,
        });
        Ok(generated)
    }

    fn update_root(&mut self, action: &Action) -> anyhow::Result<Option<Value>> {
        let id = self.identity(action)?;
        let value = action
            .value()?
            .ok_or_else(|| anyhow!("{} addresses no value", action.kind()))?;
        let row = self
            .table(action.entity_type())
            .iter_mut()
            .find(|row| row.is_root() && row.id == id)
            .ok_or_else(|| anyhow!("{} {} does not exist", action.entity_type(), id))?;
        row.value = value;
        trace!(entity_type = action.entity_type(), id = %id, "Update root row");
        Ok(None)
    }

    fn insert(&mut self, action: &Action, executed: &[Action]) -> anyhow::Result<Option<Value>> {
        let dependency = action
            .dependency(executed)
            .ok_or_else(|| anyhow!("Insert of {} ran before its dependency", action.entity_type()))?;
        let parent_id = self.identity(dependency)?;
        let root_id = self.root_identity(executed)?;
        let (value, id, generated) = self.prepare(action)?;
        let path = action
            .address()
            .map(|address| address.property_path())
            .unwrap_or_default();
        let columns = action.additional_values().cloned().unwrap_or_default();

        trace!(entity_type = action.entity_type(), id = %id, path = %path, "Insert row");
        self.table(action.entity_type()).push(Row {
            id,
            root_id,
            path,
            parent_id: Some(parent_id),
            columns,
            value,
        });
        Ok(generated)
    }

    fn delete(&mut self, entity_type: &str, root_id: &Value, path: &PropertyPath) {
        let table = self.table(entity_type);
        let before = table.len();
        table.retain(|row| !(&row.root_id == root_id && &row.path == path));
        trace!(entity_type, path = %path, removed = before - table.len(), "Delete rows");
    }

    fn table(&mut self, entity_type: &str) -> &mut Vec<Row> {
        self.tables.entry(entity_type.to_string()).or_default()
    }
}

impl Executor for InMemoryStore {
    fn run(&mut self, action: &Action, executed: &[Action]) -> anyhow::Result<Option<Value>> {
        match action {
            Action::InsertRoot { .. } => self.insert_root(action),
            Action::UpdateRoot { .. } => self.update_root(action),
            Action::Insert { .. } => self.insert(action, executed),
            Action::Delete {
                entity_type,
                root_id,
                path,
            } => {
                self.delete(entity_type, root_id, path);
                Ok(None)
            }
        }
    }
}
