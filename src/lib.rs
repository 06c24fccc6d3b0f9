//! # coastal-fem
//!
//! An explicit, stabilized finite-element engine for coupled coastal and
//! estuarine models on unstructured triangular meshes.
//!
//! This crate provides:
//! - Linear triangles with precomputed shape-function gradients ([`mesh`])
//! - Element assembly with SUPG stabilization and lumped mass
//! - The WATT wetting/drying treatment with its free-surface gradient limiter
//! - A variable-step second-order Adams–Bashforth driver ([`FemModel`])
//! - Physics strategies for currents, suspended sediment and morphology,
//!   fluid mud, groundwater, heat and wave action ([`physics`])
//! - A coupled driver stepping all enabled models in order ([`simulation`])
//!
//! Every physics model plugs into the shared engine through the
//! [`FemPhysics`] trait; coupling between models is by explicit fields.
//!
//! Logging goes through the `log` facade; no logger is installed here.

pub mod analysis;
pub mod boundary;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod physics;
pub mod simulation;
pub mod solver;
pub mod source;
pub mod time;
pub mod types;

pub use analysis::{StabilityMonitor, StabilityThresholds, divergence_report};
pub use boundary::{
    BoundaryConditionTable, Constant, Harmonic, PhysicsKey, SharedFunction, TimeFunction,
    TimeSeries, shared,
};
pub use config::ModelConfig;
pub use error::FemError;
pub use io::{BinarySnapshotWriter, MemorySink, ResultSink, Snapshot};
pub use mesh::{Kennung, MeshError, TriMesh, Triangle};
pub use physics::{
    CurrentModel, CurrentPhysics, FemPhysics, FluidMudModel, FluidMudPhysics, GroundwaterModel,
    GroundwaterPhysics, HeatModel, HeatPhysics, HydroField, SedimentModel, SedimentPhysics,
    WaveField, WaveModel, WavePhysics,
};
pub use simulation::{CoupledSimulation, SimulationResult};
pub use solver::{FemModel, StepReport, Watt};
pub use time::AdamsBashforth2;
pub use types::{ElementIndex, NodeIndex};
