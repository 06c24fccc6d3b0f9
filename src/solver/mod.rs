//! Explicit stabilized finite-element engine.
//!
//! - [`wetting_drying`]: wet fractions, element classification and the
//!   free-surface gradient limiter
//! - [`assembly`]: the per-triangle residual kernel with SUPG stabilization
//! - [`model`]: the time-step driver with Adams–Bashforth integration

pub mod assembly;
pub mod model;
pub mod wetting_drying;

pub use assembly::{Contribution, assemble_element, element_size, operator_norm};
pub use model::{FemModel, StepReport};
pub use wetting_drying::{
    LimitedLevels, Watt, Wetness, gl_factor, gl_matrix, limit_levels, limited_gradient,
};
