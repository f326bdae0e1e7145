//! Error types for aggregate change planning and execution.

use crate::conversion::ActionKind;
use thiserror::Error;

/// Schema lookup and property access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("No persistent entity registered for type {0}")]
    UnknownEntity(String),

    #[error("Entity type {0} has no identifier property")]
    MissingIdProperty(String),

    #[error("Property {property} is not declared on entity type {owner}")]
    UndeclaredProperty { owner: String, property: String },

    #[error("Expected an entity value but found {0}")]
    NotAnEntity(String),

    #[error("Invalid mapping for entity type {owner}: {message}")]
    InvalidMapping { owner: String, message: String },
}

/// Failures while walking or rebuilding the aggregate tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Failed to access property {path}: unsupported container {shape} at {node}")]
    UnsupportedContainer {
        path: String,
        shape: String,
        node: String,
    },

    #[error("Failed to access property {path}: no element at {position} in {node}")]
    ElementNotFound {
        path: String,
        position: String,
        node: String,
    },

    #[error("Failed to access property {path}: expected {expected} but found {found} at {node}")]
    UnexpectedShape {
        path: String,
        expected: String,
        found: String,
        node: String,
    },

    #[error("Failed to access property {path} at {node}: {source}")]
    Property {
        path: String,
        node: String,
        #[source]
        source: MappingError,
    },

    #[error("Aggregate nesting exceeds maximum depth {max_depth} at {path}")]
    DepthExceeded { path: String, max_depth: usize },

    #[error("Cyclic entity mapping through {path} (type {entity_type})")]
    CyclicMapping { path: String, entity_type: String },

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// An action the executor failed to carry out
#[derive(Debug, Error)]
#[error("Failed to execute {kind} for {value}")]
pub struct ExecutionError {
    pub kind: ActionKind,
    pub value: String,
    #[source]
    pub cause: anyhow::Error,
}

/// Top-level error for planning, execution, and configuration
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ConversionError {
    fn from(err: config::ConfigError) -> Self {
        ConversionError::ConfigError(err.to_string())
    }
}
