//! Path Addresses
//!
//! A `PathAddress` locates one value inside an aggregate: the root, or an element reached
//! from its parent through a single property and an identification strategy. Addresses
//! only point upwards, so the tree grows root to leaf and can never form a cycle.
//!
//! Values are never mutated in place. `assign_value` rebuilds every container between the
//! address and the root and pins the resulting root value on the root address.

use crate::conversion::strategy::{IdentificationStrategy, StrategyError};
use crate::error::ResolutionError;
use crate::mapping::{MappingContext, PropertyDescriptor, PropertyPath};
use crate::value::{SetOrdering, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// The single-level property connecting a parent value to a child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Entity type declaring the property
    pub owner: String,
    pub property: PropertyDescriptor,
    /// Path from the aggregate root, ending in `property`
    pub path: PropertyPath,
}

pub struct PathAddress {
    context: Arc<MappingContext>,
    parent: Option<Arc<PathAddress>>,
    relation: Option<Relation>,
    strategy: RwLock<IdentificationStrategy>,
}

impl PathAddress {
    /// Root address holding the aggregate root value
    pub fn root(context: Arc<MappingContext>, value: Value) -> Arc<Self> {
        Arc::new(Self {
            context,
            parent: None,
            relation: None,
            strategy: RwLock::new(IdentificationStrategy::KnownValue(value)),
        })
    }

    /// Child address reached from `parent` through `relation`
    pub fn child(
        parent: &Arc<PathAddress>,
        relation: Relation,
        strategy: IdentificationStrategy,
    ) -> Arc<Self> {
        Arc::new(Self {
            context: Arc::clone(&parent.context),
            parent: Some(Arc::clone(parent)),
            relation: Some(relation),
            strategy: RwLock::new(strategy),
        })
    }

    pub fn parent(&self) -> Option<&Arc<PathAddress>> {
        self.parent.as_ref()
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn context(&self) -> &Arc<MappingContext> {
        &self.context
    }

    /// Property path from the root; empty for the root itself
    pub fn property_path(&self) -> PropertyPath {
        self.relation
            .as_ref()
            .map(|r| r.path.clone())
            .unwrap_or_default()
    }

    pub fn strategy(&self) -> IdentificationStrategy {
        self.strategy.read().clone()
    }

    /// Qualifier (list index or map key) this address persists with, if any
    pub fn external_identifier(&self) -> Option<Value> {
        self.strategy.read().external_identifier()
    }

    /// Number of relations between the root and this address
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map(|p| p.depth() + 1).unwrap_or(0)
    }

    /// Resolve the addressed value through the parent chain
    pub fn current_value(&self) -> Result<Value, ResolutionError> {
        let strategy = self.strategy();
        if let IdentificationStrategy::KnownValue(value) = strategy {
            return Ok(value);
        }

        let (parent, relation) = match (&self.parent, &self.relation) {
            (Some(parent), Some(relation)) => (parent, relation),
            _ => return strategy.extract(None).map_err(|e| self.strategy_error(e)),
        };

        let parent_value = parent.current_value()?;
        let container = self.read_relation(&parent_value, relation)?;
        strategy
            .extract(Some(&container))
            .map_err(|e| self.strategy_error(e))
    }

    /// Replace the addressed value, rebuilding every container up to the root
    pub fn assign_value(&self, value: Value) -> Result<(), ResolutionError> {
        let mut node = self;
        let mut value = value;

        while let (Some(parent), Some(relation)) = (&node.parent, &node.relation) {
            let parent_value = parent.current_value()?;
            let container = node.read_relation(&parent_value, relation)?;
            let rebuilt = node
                .strategy()
                .rebuild(container, value)
                .map_err(|e| node.strategy_error(e))?;
            value = node
                .context
                .set_property(parent_value, &relation.property.name, rebuilt)
                .map_err(|source| ResolutionError::Property {
                    path: relation.path.to_dot_path(),
                    node: node.to_string(),
                    source,
                })?;
            node = parent.as_ref();
        }

        trace!(path = %self.property_path(), "Pinned rebuilt aggregate root");
        *node.strategy.write() = IdentificationStrategy::KnownValue(value);
        Ok(())
    }

    /// Addresses of the entity values directly referenced by this address's value.
    ///
    /// Hashed sets are normalized to insertion order (and written back) before their
    /// elements are addressed by position.
    pub fn child_addresses(self: &Arc<Self>) -> Result<Vec<Arc<PathAddress>>, ResolutionError> {
        let value = self.current_value()?;
        let entity = self.context.reflector().entity_for(&value)?;
        let owner = entity.name().to_string();
        let properties: Vec<PropertyDescriptor> = entity.entity_properties().cloned().collect();

        let mut children = Vec::new();
        for property in properties {
            children.extend(self.child_addresses_for(&owner, property)?);
        }
        Ok(children)
    }

    fn child_addresses_for(
        self: &Arc<Self>,
        owner: &str,
        property: PropertyDescriptor,
    ) -> Result<Vec<Arc<PathAddress>>, ResolutionError> {
        let relation = Relation {
            owner: owner.to_string(),
            path: self.property_path().child(&property.name),
            property,
        };
        let value = self.current_value()?;
        let child_value = self.read_relation(&value, &relation)?;

        if child_value.is_null() {
            return Ok(Vec::new());
        }

        let property = &relation.property;
        let strategies: Vec<IdentificationStrategy> = if property.is_embedded() {
            vec![IdentificationStrategy::Direct]
        } else if property.is_qualified() {
            match (&child_value, property.is_map()) {
                (Value::Map(entries), true) => entries
                    .keys()
                    .cloned()
                    .map(IdentificationStrategy::MapKey)
                    .collect(),
                (Value::List(items), false) => (0..items.len())
                    .map(IdentificationStrategy::ListIndex)
                    .collect(),
                (other, _) => return Err(self.unsupported_container(&relation, other)),
            }
        } else if property.is_collection_like() {
            match child_value {
                Value::Set(set) => {
                    let size = set.len();
                    if set.ordering() == SetOrdering::Hashed && !property.is_immutable() {
                        let normalized = Value::Set(set.into_linked());
                        let updated = self
                            .context
                            .set_property(value, &property.name, normalized)
                            .map_err(|source| ResolutionError::Property {
                                path: relation.path.to_dot_path(),
                                node: self.to_string(),
                                source,
                            })?;
                        self.assign_value(updated)?;
                    }
                    (0..size).map(IdentificationStrategy::SetPosition).collect()
                }
                other => return Err(self.unsupported_container(&relation, &other)),
            }
        } else {
            vec![IdentificationStrategy::Direct]
        };

        Ok(strategies
            .into_iter()
            .map(|strategy| PathAddress::child(self, relation.clone(), strategy))
            .collect())
    }

    fn read_relation(&self, owner_value: &Value, relation: &Relation) -> Result<Value, ResolutionError> {
        self.context
            .get_property(owner_value, &relation.property.name)
            .map_err(|source| ResolutionError::Property {
                path: relation.path.to_dot_path(),
                node: self.to_string(),
                source,
            })
    }

    fn unsupported_container(&self, relation: &Relation, found: &Value) -> ResolutionError {
        ResolutionError::UnsupportedContainer {
            path: relation.path.to_dot_path(),
            shape: found.shape().to_string(),
            node: self.to_string(),
        }
    }

    fn strategy_error(&self, error: StrategyError) -> ResolutionError {
        let path = self.property_path().to_string();
        match error {
            StrategyError::Shape { expected, found } => ResolutionError::UnexpectedShape {
                path,
                expected: expected.to_string(),
                found,
                node: self.to_string(),
            },
            StrategyError::Missing(position) => ResolutionError::ElementNotFound {
                path,
                position,
                node: self.to_string(),
            },
        }
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{} ({})", relation.path, self.strategy.read()),
            None => write!(f, "<root>"),
        }
    }
}

impl fmt::Debug for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathAddress")
            .field("path", &self.property_path())
            .field("strategy", &*self.strategy.read())
            .finish()
    }
}
