//! Configuration System
//!
//! Layered configuration for planning limits, logging, and the entity schema. Sources are
//! merged in order: built-in defaults, an optional TOML file, then `AGGREGATE__*`
//! environment variables.

use crate::error::ConversionError;
use crate::logging::LoggingConfig;
use crate::mapping::EntityDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use merge::merge_policy::DEFAULT_MAX_DEPTH;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Persistent entity declarations, one `[[entities]]` table each
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

/// Limits applied while walking an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Deepest relation nesting the planner follows before failing
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl PlanningConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Planning(String),
    Logging(String),
    Entity(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Planning(msg) => write!(f, "Planning: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Entity(name, msg) => write!(f, "Entity '{}': {}", name, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ConversionConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.planning.validate() {
            errors.push(ValidationError::Planning(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if let Err(e) = entity.validate() {
                errors.push(ValidationError::Entity(entity.name.clone(), e));
            }
            if !seen.insert(entity.name.as_str()) {
                errors.push(ValidationError::Entity(
                    entity.name.clone(),
                    "Duplicate entity declaration".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validation_failure(errors: Vec<ValidationError>) -> ConversionError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ConversionError::ConfigError(format!(
        "Configuration validation failed:\n{}",
        messages.join("\n")
    ))
}
