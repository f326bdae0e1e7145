//! Property access bound to a concrete entity instance
//!
//! Accessors are copy-on-write: setting a property changes the accessor's own bean,
//! which callers take back with `into_bean` and reassign wherever it lives.

use crate::error::MappingError;
use crate::mapping::descriptor::EntityDescriptor;
use crate::value::Value;

/// Get/set access to the properties of one bean
pub trait PropertyAccessor {
    fn bean(&self) -> &Value;

    fn get_property(&self, property: &str) -> Result<Value, MappingError>;

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), MappingError>;

    fn into_bean(self: Box<Self>) -> Value;
}

/// Creates accessors for instances of a persistent entity
pub trait AccessorFactory: Send + Sync {
    fn accessor<'a>(
        &self,
        entity: &'a EntityDescriptor,
        bean: Value,
    ) -> Result<Box<dyn PropertyAccessor + 'a>, MappingError>;
}

/// Accessors working directly on entity fields
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccessors;

impl AccessorFactory for FieldAccessors {
    fn accessor<'a>(
        &self,
        entity: &'a EntityDescriptor,
        bean: Value,
    ) -> Result<Box<dyn PropertyAccessor + 'a>, MappingError> {
        match &bean {
            Value::Entity(value) if value.type_name() == entity.name() => {}
            other => return Err(MappingError::NotAnEntity(format!("{} for {}", other, entity.name()))),
        }
        Ok(Box::new(FieldAccessor { entity, bean }))
    }
}

struct FieldAccessor<'a> {
    entity: &'a EntityDescriptor,
    bean: Value,
}

impl FieldAccessor<'_> {
    fn check_declared(&self, property: &str) -> Result<(), MappingError> {
        if self.entity.id_property() == Some(property) || self.entity.property(property).is_some() {
            Ok(())
        } else {
            Err(MappingError::UndeclaredProperty {
                owner: self.entity.name().to_string(),
                property: property.to_string(),
            })
        }
    }
}

impl PropertyAccessor for FieldAccessor<'_> {
    fn bean(&self) -> &Value {
        &self.bean
    }

    fn get_property(&self, property: &str) -> Result<Value, MappingError> {
        self.check_declared(property)?;
        match &self.bean {
            Value::Entity(entity) => Ok(entity.get(property)),
            other => Err(MappingError::NotAnEntity(other.to_string())),
        }
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), MappingError> {
        self.check_declared(property)?;
        match &mut self.bean {
            Value::Entity(entity) => {
                entity.set(property, value);
                Ok(())
            }
            other => Err(MappingError::NotAnEntity(other.to_string())),
        }
    }

    fn into_bean(self: Box<Self>) -> Value {
        self.bean
    }
}
