//! Wind stress at the water surface.
//!
//! τ = ρ_air · C_d · |U_10| · U_10
//!
//! where:
//! - ρ_air ≈ 1.225 kg/m³ (air density at sea level)
//! - C_d = drag coefficient (depends on wind speed)
//! - U_10 = (u_10, v_10) = 10 m wind velocity
//!
//! The depth-averaged momentum equation receives `τ / (ρ_water · H)`.

use serde::Deserialize;

/// Air density at sea level (kg/m³).
pub const RHO_AIR: f64 = 1.225;

/// Drag coefficient formulation for wind stress.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCoefficient {
    /// Constant drag coefficient (typically 1.0-2.0 × 10⁻³)
    Constant(f64),

    /// Large & Pond (1981).
    ///
    /// C_d = 1.2×10⁻³ for |U| ≤ 11 m/s,
    /// C_d = (0.49 + 0.065×|U|) × 10⁻³ above
    LargePond,

    /// Wu (1982): C_d = (0.8 + 0.065×|U|) × 10⁻³
    Wu,

    /// Smith (1988): C_d = (0.61 + 0.063×|U|) × 10⁻³
    Smith,
}

impl Default for DragCoefficient {
    fn default() -> Self {
        Self::Wu
    }
}

impl DragCoefficient {
    /// Drag coefficient for a 10 m wind speed (m/s).
    pub fn compute(&self, wind_speed: f64) -> f64 {
        match self {
            DragCoefficient::Constant(cd) => *cd,
            DragCoefficient::LargePond => {
                if wind_speed <= 11.0 {
                    1.2e-3
                } else {
                    (0.49 + 0.065 * wind_speed) * 1e-3
                }
            }
            DragCoefficient::Wu => (0.8 + 0.065 * wind_speed) * 1e-3,
            DragCoefficient::Smith => (0.61 + 0.063 * wind_speed) * 1e-3,
        }
    }

    /// Surface stress (τ_x, τ_y) in N/m².
    pub fn stress(&self, u_10: f64, v_10: f64) -> (f64, f64) {
        let wind_speed = (u_10 * u_10 + v_10 * v_10).sqrt();
        let cd = self.compute(wind_speed);
        (
            RHO_AIR * cd * wind_speed * u_10,
            RHO_AIR * cd * wind_speed * v_10,
        )
    }
}
