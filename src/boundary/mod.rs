//! Boundary-condition supply.
//!
//! - [`TimeFunction`] implementations for prescribed values
//! - [`PhysicsKey`] naming the quantity a function prescribes
//! - [`BoundaryConditionTable`] consumed once per model at setup

mod table;
mod time_function;

pub use table::{BoundaryConditionTable, BoundaryEntry, PhysicsKey};
pub use time_function::{
    Constant, FnFunction, Harmonic, Ramp, SharedFunction, TidalConstituent, TimeFunction,
    TimeSeries, shared,
};
