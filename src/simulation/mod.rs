//! Coupled simulation driver.
//!
//! [`CoupledSimulation`] owns the current model and every sub-model the
//! configuration enables, exchanges the coupling fields between them and
//! writes snapshots to a [`ResultSink`](crate::io::ResultSink).
//!
//! # Example
//! ```ignore
//! use coastal_fem::boundary::BoundaryConditionTable;
//! use coastal_fem::config::ModelConfig;
//! use coastal_fem::io::MemorySink;
//! use coastal_fem::simulation::CoupledSimulation;
//!
//! let config = ModelConfig::from_file("model.toml")?;
//! let mut sim = CoupledSimulation::new(mesh, &config, &mut table)?;
//! sim.initial_solution(0.0)?;
//! let mut sink = MemorySink::new();
//! let result = sim.run_until(86_400.0, 10.0, &mut sink)?;
//! ```

mod runner;

pub use runner::{CoupledSimulation, SimulationResult};
