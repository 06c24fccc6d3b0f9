//! Physical laws shared by the sub-models.
//!
//! - Bottom friction (Strickler, Nikuradse/Colebrook–White)
//! - Wind stress with selectable drag law
//! - Eddy viscosity (molecular, Smagorinsky, Elder, Battjes)
//! - Weir discharge (Poleni, Villemonte)
//! - Equation of state (UNESCO surface density plus sediment)
//! - Sediment transport (settling, erosion, deposition, bed load)

pub mod equation_of_state;
pub mod friction;
pub mod sediment_transport;
pub mod turbulence;
pub mod weir;
pub mod wind_stress;

pub use equation_of_state::{EquationOfState, RHO_0, RHO_SEDIMENT};
pub use friction::{BottomFriction, FrictionLaw, NU_WATER, colebrook_white_lambda, strickler_cf};
pub use sediment_transport::{
    critical_shields, deposition_rate, erosion_rate, meyer_peter_mueller, settling_velocity,
    wave_current_shear,
};
pub use turbulence::{EddyViscosity, FlowGradients, KARMAN};
pub use weir::{WEIR_FRICTION, Weir, poleni_discharge, villemonte_factor};
pub use wind_stress::{DragCoefficient, RHO_AIR};
