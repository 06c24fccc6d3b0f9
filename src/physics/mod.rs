//! Physics strategies of the sub-models.
//!
//! Each sub-model implements [`FemPhysics`] and runs on the shared engine
//! [`FemModel`](crate::solver::FemModel):
//!
//! | model | unknowns |
//! |---|---|
//! | [`CurrentPhysics`] | η, u, v |
//! | [`SedimentPhysics`] | c, Δz_b |
//! | [`FluidMudPhysics`] | m, u, v |
//! | [`GroundwaterPhysics`] | h |
//! | [`HeatPhysics`] | T |
//! | [`WavePhysics`] | k_x, k_y, E |
//!
//! Models exchange state through the explicit fields in [`coupling`].

pub mod coupling;
pub mod current;
pub mod fluid_mud;
pub mod groundwater;
pub mod heat;
pub mod sediment;
pub mod traits;
pub mod waves;

pub use coupling::{
    HydroCoupled, HydroField, HydroState, WaveCoupled, WaveField, WaveState, couple_nodes,
};
pub use current::{CurrentCorrection, CurrentElement, CurrentNode, CurrentPhysics};
pub use fluid_mud::{FluidMudElement, FluidMudNode, FluidMudPhysics};
pub use groundwater::{GroundwaterElement, GroundwaterNode, GroundwaterPhysics};
pub use heat::{HeatElement, HeatNode, HeatPhysics};
pub use sediment::{SedimentElement, SedimentNode, SedimentPhysics};
pub use traits::{
    Dof, EXTRAPOLATION_RELAX, ElementContext, ElementTerms, FemPhysics, NodeState, Normalization,
    extrapolation_increment,
};
pub use waves::{
    WaveElement, WaveNode, WavePhysics, breaking_fraction, group_velocity, intrinsic_frequency,
    wavenumber,
};

use crate::solver::FemModel;

pub type CurrentModel = FemModel<CurrentPhysics, 3>;
pub type SedimentModel = FemModel<SedimentPhysics, 2>;
pub type FluidMudModel = FemModel<FluidMudPhysics, 3>;
pub type GroundwaterModel = FemModel<GroundwaterPhysics, 1>;
pub type HeatModel = FemModel<HeatPhysics, 1>;
pub type WaveModel = FemModel<WavePhysics, 3>;
