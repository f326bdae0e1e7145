//! The store-side collaborator that carries out planned actions

use crate::conversion::action::Action;
use crate::value::Value;

/// Runs one planned action against a backing store.
///
/// `executed` holds every action of the plan that already ran, in order, with their
/// generated identifiers recorded; an action's dependency is always among them. Returning
/// `Some(id)` for an insert reports a store-generated identifier.
pub trait Executor {
    fn run(&mut self, action: &Action, executed: &[Action]) -> anyhow::Result<Option<Value>>;
}

impl<F> Executor for F
where
    F: FnMut(&Action, &[Action]) -> anyhow::Result<Option<Value>>,
{
    fn run(&mut self, action: &Action, executed: &[Action]) -> anyhow::Result<Option<Value>> {
        self(action, executed)
    }
}
