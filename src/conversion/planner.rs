//! Change planner: walks an aggregate and emits a dependency-ordered action list.
//! Addresses are created lazily while walking; the node-to-action index lives only for one call.

use crate::config::PlanningConfig;
use crate::conversion::action::{Action, ActionId};
use crate::conversion::address::PathAddress;
use crate::conversion::change_set::{ChangeKind, ChangeSet};
use crate::error::{ConversionError, MappingError, ResolutionError};
use crate::mapping::{MappingContext, PropertyPath};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone)]
pub struct ChangePlanner {
    context: Arc<MappingContext>,
    config: PlanningConfig,
}

impl ChangePlanner {
    pub fn new(context: Arc<MappingContext>) -> Self {
        Self::with_config(context, PlanningConfig::default())
    }

    pub fn with_config(context: Arc<MappingContext>, config: PlanningConfig) -> Self {
        Self { context, config }
    }

    pub fn context(&self) -> &Arc<MappingContext> {
        &self.context
    }

    /// Insert the root and every referenced entity, parents before children
    #[instrument(skip_all)]
    pub fn insert(&self, root: Value) -> Result<Vec<Action>, ConversionError> {
        let entity_type = root_type(&root)?;
        let mut pass = PlanningPass::new(&self.config);

        let root_address = PathAddress::root(Arc::clone(&self.context), root);
        pass.record(
            &root_address,
            Action::insert_root(entity_type.clone(), Arc::clone(&root_address)),
        );
        pass.insert_referenced(&root_address)?;

        let actions = pass.finish();
        debug!(entity_type = %entity_type, action_count = actions.len(), "Planned insert");
        Ok(actions)
    }

    /// Clear every reachable entity type, update the root, then re-insert the current children.
    ///
    /// Rows are cleared per declared property path, not per removed element.
    #[instrument(skip_all)]
    pub fn update(&self, root: Value) -> Result<Vec<Action>, ConversionError> {
        let entity_type = root_type(&root)?;
        let root_id = self.root_id(&root)?;
        let mut pass = PlanningPass::new(&self.config);
        pass.extend(self.delete_referenced(&entity_type, &root_id)?);

        let root_address = PathAddress::root(Arc::clone(&self.context), root);
        pass.record(
            &root_address,
            Action::update_root(entity_type.clone(), Arc::clone(&root_address)),
        );
        pass.insert_referenced(&root_address)?;

        let actions = pass.finish();
        debug!(entity_type = %entity_type, action_count = actions.len(), "Planned update");
        Ok(actions)
    }

    /// Insert when the root was never persisted, update otherwise
    pub fn save(&self, root: Value) -> Result<Vec<Action>, ConversionError> {
        if self.context.reflector().is_new(&root)? {
            self.insert(root)
        } else {
            self.update(root)
        }
    }

    /// Clear everything reachable from the root, then the root row itself
    #[instrument(skip(self, root_id))]
    pub fn delete(&self, root_type: &str, root_id: Value) -> Result<Vec<Action>, ConversionError> {
        let mut actions = self.delete_referenced(root_type, &root_id)?;
        actions.push(Action::delete(root_type, root_id, PropertyPath::root()));
        debug!(action_count = actions.len(), "Planned delete");
        Ok(actions)
    }

    pub fn plan_insert(&self, root: Value) -> Result<ChangeSet, ConversionError> {
        let actions = self.insert(root.clone())?;
        self.change_set(ChangeKind::Save, root, actions)
    }

    pub fn plan_update(&self, root: Value) -> Result<ChangeSet, ConversionError> {
        let actions = self.update(root.clone())?;
        self.change_set(ChangeKind::Save, root, actions)
    }

    pub fn plan_save(&self, root: Value) -> Result<ChangeSet, ConversionError> {
        let actions = self.save(root.clone())?;
        self.change_set(ChangeKind::Save, root, actions)
    }

    /// Delete plan; `root` is the in-memory root when the caller has it
    pub fn plan_delete(
        &self,
        root_type: &str,
        root_id: Value,
        root: Option<Value>,
    ) -> Result<ChangeSet, ConversionError> {
        let mut change_set = ChangeSet::new(ChangeKind::Delete, root_type, root);
        for action in self.delete(root_type, root_id)? {
            change_set.add_action(action);
        }
        Ok(change_set)
    }

    fn change_set(
        &self,
        kind: ChangeKind,
        root: Value,
        actions: Vec<Action>,
    ) -> Result<ChangeSet, ConversionError> {
        let entity_type = root_type(&root)?;
        let mut change_set = ChangeSet::new(kind, entity_type, Some(root));
        for action in actions {
            change_set.add_action(action);
        }
        Ok(change_set)
    }

    fn root_id(&self, root: &Value) -> Result<Value, ConversionError> {
        let entity = self.context.reflector().entity_for(root)?;
        let id = self.context.get_property(root, entity.required_id_property()?)?;
        if id.is_null() {
            return Err(ConversionError::Precondition(format!(
                "Cannot update {} without an identifier",
                entity.name()
            )));
        }
        Ok(id)
    }

    /// One `Delete` per declared entity path below `root_type`, deepest first
    fn delete_referenced(
        &self,
        root_type: &str,
        root_id: &Value,
    ) -> Result<Vec<Action>, ResolutionError> {
        let mut paths = Vec::new();
        let mut lineage = vec![root_type.to_string()];
        self.collect_declared_paths(root_type, &PropertyPath::root(), &mut lineage, &mut paths)?;

        Ok(paths
            .into_iter()
            .rev()
            .map(|(path, target)| Action::delete(target, root_id.clone(), path))
            .collect())
    }

    fn collect_declared_paths(
        &self,
        entity_type: &str,
        prefix: &PropertyPath,
        lineage: &mut Vec<String>,
        paths: &mut Vec<(PropertyPath, String)>,
    ) -> Result<(), ResolutionError> {
        let entity = self.context.reflector().required_entity(entity_type)?;

        for property in entity.entity_properties() {
            let path = prefix.child(&property.name);
            if path.len() > self.config.max_depth {
                return Err(ResolutionError::DepthExceeded {
                    path: path.to_dot_path(),
                    max_depth: self.config.max_depth,
                });
            }
            let target = property.target().ok_or_else(|| MappingError::InvalidMapping {
                owner: entity_type.to_string(),
                message: format!("property '{}' has no target type", property.name),
            })?;
            if lineage.iter().any(|t| t == target) {
                return Err(ResolutionError::CyclicMapping {
                    path: path.to_dot_path(),
                    entity_type: target.to_string(),
                });
            }

            paths.push((path.clone(), target.to_string()));
            lineage.push(target.to_string());
            self.collect_declared_paths(target, &path, lineage, paths)?;
            lineage.pop();
        }
        Ok(())
    }
}

fn root_type(root: &Value) -> Result<String, MappingError> {
    root.type_name()
        .map(str::to_string)
        .ok_or_else(|| MappingError::NotAnEntity(root.to_string()))
}

/// Identity of one address node.
///
/// Only valid while the node is alive; every recorded node is kept alive by the
/// action holding its `Arc` for the whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AddressKey(*const PathAddress);

impl AddressKey {
    fn of(address: &Arc<PathAddress>) -> Self {
        Self(Arc::as_ptr(address))
    }
}

/// State of a single planning call
struct PlanningPass<'a> {
    config: &'a PlanningConfig,
    actions: Vec<Action>,
    recorded: HashMap<AddressKey, ActionId>,
}

impl<'a> PlanningPass<'a> {
    fn new(config: &'a PlanningConfig) -> Self {
        Self {
            config,
            actions: Vec::new(),
            recorded: HashMap::new(),
        }
    }

    fn extend(&mut self, actions: Vec<Action>) {
        self.actions.extend(actions);
    }

    fn record(&mut self, address: &Arc<PathAddress>, action: Action) -> ActionId {
        let id = ActionId::new(self.actions.len());
        self.recorded.insert(AddressKey::of(address), id);
        self.actions.push(action);
        id
    }

    fn nearest_ancestor_action(&self, address: &PathAddress) -> Option<ActionId> {
        let mut current = address.parent();
        while let Some(node) = current {
            if let Some(id) = self.recorded.get(&AddressKey::of(node)) {
                return Some(*id);
            }
            current = node.parent();
        }
        None
    }

    fn insert_referenced(&mut self, parent: &Arc<PathAddress>) -> Result<(), ConversionError> {
        for child in parent.child_addresses()? {
            self.insert_all(child)?;
        }
        Ok(())
    }

    fn insert_all(&mut self, node: Arc<PathAddress>) -> Result<(), ConversionError> {
        if node.depth() > self.config.max_depth {
            return Err(ResolutionError::DepthExceeded {
                path: node.property_path().to_dot_path(),
                max_depth: self.config.max_depth,
            }
            .into());
        }

        let value = node.current_value()?;
        let entity_type = root_type(&value)?;
        let mut insert = Action::insert(
            entity_type,
            Arc::clone(&node),
            self.nearest_ancestor_action(&node),
        );

        if let Some(relation) = node.relation() {
            if relation.property.is_qualified() {
                if let Some(qualifier) = node.external_identifier() {
                    insert.put_additional_value(relation.property.key_column(&relation.owner), qualifier);
                }
            }
        }

        trace!(path = %node.property_path(), strategy = %node.strategy(), "Planned child insert");
        self.record(&node, insert);
        self.insert_referenced(&node)
    }

    fn finish(self) -> Vec<Action> {
        self.actions
    }
}
