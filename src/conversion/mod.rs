//! Aggregate Conversion
//!
//! Turns an in-memory aggregate into an ordered list of persistence actions and runs them
//! against an [`Executor`], back-filling store-generated identifiers as it goes.

pub mod action;
pub mod address;
pub mod change_set;
pub mod executor;
pub mod planner;
pub mod strategy;

pub use action::{Action, ActionId, ActionKind};
pub use address::{PathAddress, Relation};
pub use change_set::{ChangeKind, ChangeSet};
pub use executor::Executor;
pub use planner::ChangePlanner;
pub use strategy::{IdentificationStrategy, StrategyError};
