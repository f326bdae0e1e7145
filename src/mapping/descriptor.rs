//! Entity and property descriptors

use crate::error::MappingError;
use serde::{Deserialize, Serialize};

/// How a property holds its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyShape {
    /// Plain value stored in the owner's row
    Scalar,
    /// Single reference to another entity
    Single,
    /// Value object stored inline with its owner
    Embedded,
    /// Ordered list of entities, qualified by index
    List,
    /// Keyed map of entities, qualified by key
    Map,
    /// Unkeyed set of entities
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,

    /// Entity type of the referenced value (element type for containers)
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default = "default_shape")]
    pub shape: PropertyShape,

    /// Qualifier column for lists and maps
    #[serde(default)]
    pub key_column: Option<String>,

    /// Whether the container type cannot be replaced by a normalized one
    #[serde(default)]
    pub immutable: bool,
}

fn default_shape() -> PropertyShape {
    PropertyShape::Scalar
}

impl PropertyDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            shape: PropertyShape::Scalar,
            key_column: None,
            immutable: false,
        }
    }

    pub fn single(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::entity(name, target, PropertyShape::Single)
    }

    pub fn embedded(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::entity(name, target, PropertyShape::Embedded)
    }

    pub fn list(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::entity(name, target, PropertyShape::List)
    }

    pub fn map(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::entity(name, target, PropertyShape::Map)
    }

    pub fn set(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::entity(name, target, PropertyShape::Set)
    }

    fn entity(name: impl Into<String>, target: impl Into<String>, shape: PropertyShape) -> Self {
        Self {
            name: name.into(),
            target: Some(target.into()),
            shape,
            key_column: None,
            immutable: false,
        }
    }

    pub fn with_key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = Some(key_column.into());
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn is_entity(&self) -> bool {
        self.target.is_some() && self.shape != PropertyShape::Scalar
    }

    pub fn is_embedded(&self) -> bool {
        self.shape == PropertyShape::Embedded
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self.shape, PropertyShape::List | PropertyShape::Map)
    }

    pub fn is_map(&self) -> bool {
        self.shape == PropertyShape::Map
    }

    pub fn is_collection_like(&self) -> bool {
        matches!(
            self.shape,
            PropertyShape::List | PropertyShape::Map | PropertyShape::Set
        )
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Qualifier column; defaults to `<owner in snake case>_key`
    pub fn key_column(&self, owner: &str) -> String {
        self.key_column
            .clone()
            .unwrap_or_else(|| format!("{}_key", snake_case(owner)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,

    #[serde(default)]
    pub id_property: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_property: None,
            properties: Vec::new(),
        }
    }

    pub fn with_id(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = Some(id_property.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }

    pub fn required_id_property(&self) -> Result<&str, MappingError> {
        self.id_property()
            .ok_or_else(|| MappingError::MissingIdProperty(self.name.clone()))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Single-level, entity-valued, non-embedded properties in declaration order
    pub fn entity_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties
            .iter()
            .filter(|p| p.is_entity() && !p.is_embedded())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Entity name cannot be empty".to_string());
        }
        if matches!(self.id_property.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err("Identifier property cannot be empty".to_string());
        }
        for property in &self.properties {
            if property.shape != PropertyShape::Scalar && property.target.is_none() {
                return Err(format!("Property '{}' has no target type", property.name));
            }
            if matches!(property.key_column.as_deref(), Some(column) if column.trim().is_empty())
            {
                return Err(format!("Property '{}' has an empty key column", property.name));
            }
        }
        Ok(())
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
