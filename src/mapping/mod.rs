//! Mapping Metadata
//!
//! Describes which properties of an entity type reference other entities, how they hold
//! them, and how to read and write them on a concrete instance. The planner and the
//! execution engine only ever see the aggregate through this layer.

pub mod accessor;
pub mod descriptor;
pub mod property_path;
pub mod schema;

pub use accessor::{AccessorFactory, FieldAccessors, PropertyAccessor};
pub use descriptor::{EntityDescriptor, PropertyDescriptor, PropertyShape};
pub use property_path::PropertyPath;
pub use schema::{Schema, SchemaBuilder};

use crate::error::MappingError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Type-level description of persistent entities
pub trait SchemaReflector: Send + Sync {
    /// Persistent entity registered for the type, if any
    fn entity(&self, type_name: &str) -> Option<&EntityDescriptor>;

    fn required_entity(&self, type_name: &str) -> Result<&EntityDescriptor, MappingError> {
        self.entity(type_name)
            .ok_or_else(|| MappingError::UnknownEntity(type_name.to_string()))
    }

    /// Persistent entity for the runtime type of `value`
    fn entity_for(&self, value: &Value) -> Result<&EntityDescriptor, MappingError> {
        match value.type_name() {
            Some(type_name) => self.required_entity(type_name),
            None => Err(MappingError::NotAnEntity(value.to_string())),
        }
    }

    /// Whether `value` has never been persisted: its identifier is still unset
    fn is_new(&self, value: &Value) -> Result<bool, MappingError> {
        let entity = self.entity_for(value)?;
        let id_property = entity.required_id_property()?;
        Ok(value
            .as_entity()
            .map(|e| e.get(id_property).is_null())
            .unwrap_or(true))
    }
}

/// Reflector and accessors shared by one planning and execution cycle
#[derive(Clone)]
pub struct MappingContext {
    reflector: Arc<dyn SchemaReflector>,
    accessors: Arc<dyn AccessorFactory>,
}

impl MappingContext {
    /// Context with field accessors
    pub fn new(reflector: impl SchemaReflector + 'static) -> Self {
        Self {
            reflector: Arc::new(reflector),
            accessors: Arc::new(FieldAccessors),
        }
    }

    pub fn with_accessors(
        reflector: Arc<dyn SchemaReflector>,
        accessors: Arc<dyn AccessorFactory>,
    ) -> Self {
        Self {
            reflector,
            accessors,
        }
    }

    pub fn reflector(&self) -> &dyn SchemaReflector {
        self.reflector.as_ref()
    }

    /// Accessor bound to `bean`, resolved through the bean's runtime type
    pub fn accessor(&self, bean: Value) -> Result<Box<dyn PropertyAccessor + '_>, MappingError> {
        let entity = self.reflector.entity_for(&bean)?;
        self.accessors.accessor(entity, bean)
    }

    /// Accessor bound to `bean` using an explicitly named entity type
    pub fn accessor_for(
        &self,
        type_name: &str,
        bean: Value,
    ) -> Result<Box<dyn PropertyAccessor + '_>, MappingError> {
        let entity = self.reflector.required_entity(type_name)?;
        self.accessors.accessor(entity, bean)
    }

    pub fn get_property(&self, bean: &Value, property: &str) -> Result<Value, MappingError> {
        self.accessor(bean.clone())?.get_property(property)
    }

    /// Returns `bean` with `property` replaced by `value`
    pub fn set_property(
        &self,
        bean: Value,
        property: &str,
        value: Value,
    ) -> Result<Value, MappingError> {
        let mut accessor = self.accessor(bean)?;
        accessor.set_property(property, value)?;
        Ok(accessor.into_bean())
    }
}

impl fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext").finish_non_exhaustive()
    }
}
