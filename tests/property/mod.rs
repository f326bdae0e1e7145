//! Property-based tests for addressing and plan ordering

mod fixtures;
mod ordering;
