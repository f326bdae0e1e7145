//! Aggregate Change: persistence planning for object aggregates
//!
//! Converts an in-memory aggregate (a root entity plus every entity reachable from it through
//! references, embedded values, lists, sets, and maps) into an ordered list of insert,
//! update, and delete actions. Running those actions through an [`Executor`] writes the
//! aggregate to a store, and identifiers the store generates are written back into the
//! aggregate.
//!
//! ```no_run
//! use aggregate_change::{ChangePlanner, InMemoryStore, MappingContext, Schema};
//! use aggregate_change::mapping::{EntityDescriptor, PropertyDescriptor};
//! use aggregate_change::value::{EntityValue, Value};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder()
//!     .entity(
//!         EntityDescriptor::new("Order")
//!             .with_id("id")
//!             .with_property(PropertyDescriptor::list("lines", "OrderLine")),
//!     )
//!     .entity(EntityDescriptor::new("OrderLine").with_id("id"))
//!     .build()?;
//! let context = Arc::new(MappingContext::new(schema));
//!
//! let order: Value = EntityValue::new("Order")
//!     .with("lines", Value::List(vec![EntityValue::new("OrderLine").into()]))
//!     .into();
//! let mut change_set = ChangePlanner::new(Arc::clone(&context)).plan_save(order)?;
//! let mut store = InMemoryStore::new(Arc::clone(&context));
//! change_set.execute_with(&mut store, &context)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversion;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod store;
pub mod value;

pub use config::{ConfigLoader, ConversionConfig, PlanningConfig};
pub use conversion::{Action, ActionKind, ChangeKind, ChangePlanner, ChangeSet, Executor, PathAddress};
pub use error::{ConversionError, ExecutionError, MappingError, ResolutionError};
pub use mapping::{MappingContext, Schema, SchemaReflector};
pub use store::InMemoryStore;
pub use value::Value;
