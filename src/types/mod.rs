//! Strongly-typed domain types.

mod indices;

pub use indices::{ElementIndex, NodeIndex};
