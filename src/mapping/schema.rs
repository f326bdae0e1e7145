//! Registry-backed schema reflector

use crate::config::ConversionConfig;
use crate::error::{ConversionError, MappingError};
use crate::mapping::descriptor::EntityDescriptor;
use crate::mapping::SchemaReflector;
use serde::Deserialize;
use std::collections::HashMap;

/// Persistent entity descriptors keyed by type name
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, EntityDescriptor>,
}

#[derive(Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    entities: Vec<EntityDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Build a schema from validated descriptors
    pub fn from_entities(
        entities: impl IntoIterator<Item = EntityDescriptor>,
    ) -> Result<Self, MappingError> {
        let mut schema = Schema::new();
        for entity in entities {
            schema.register(entity)?;
        }
        Ok(schema)
    }

    pub fn from_config(config: &ConversionConfig) -> Result<Self, MappingError> {
        Self::from_entities(config.entities.iter().cloned())
    }

    /// Parse a TOML document made of `[[entities]]` tables
    pub fn from_toml_str(content: &str) -> Result<Self, ConversionError> {
        let document: SchemaDocument = toml::from_str(content)
            .map_err(|e| ConversionError::ConfigError(format!("Invalid schema document: {}", e)))?;
        Ok(Self::from_entities(document.entities)?)
    }

    pub fn register(&mut self, entity: EntityDescriptor) -> Result<(), MappingError> {
        entity
            .validate()
            .map_err(|message| MappingError::InvalidMapping {
                owner: entity.name.clone(),
                message,
            })?;
        if self.entities.contains_key(&entity.name) {
            return Err(MappingError::InvalidMapping {
                owner: entity.name.clone(),
                message: "entity registered twice".to_string(),
            });
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SchemaReflector for Schema {
    fn entity(&self, type_name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(type_name)
    }
}

/// Fluent construction of a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entities: Vec<EntityDescriptor>,
}

impl SchemaBuilder {
    pub fn entity(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn build(self) -> Result<Schema, MappingError> {
        Schema::from_entities(self.entities)
    }
}
