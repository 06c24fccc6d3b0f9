//! Bottom friction laws.
//!
//! Bottom shear stress is quadratic in the depth-averaged velocity:
//!
//!   τ_b / ρ = c_f |U| U
//!
//! The momentum equation therefore carries `c_f |U| U / H`. Two laws give
//! `c_f` from the bed roughness:
//!
//! - **Strickler** (Manning with `n = 1/k_st`): c_f = g / (k_st² H^{1/3})
//! - **Nikuradse / Colebrook–White**: Darcy–Weisbach λ from the implicit
//!   Colebrook–White relation with equivalent sand roughness `k_s`,
//!   c_f = λ / 8
//!
//! Friction becomes stiff in shallow water; depths are floored at `h_min`.

use serde::Deserialize;

/// Kinematic viscosity of water (m²/s).
pub const NU_WATER: f64 = 1.0e-6;

/// Friction law selected model-wide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionLaw {
    /// Strickler/Manning with roughness `k_st` (m^{1/3}/s)
    Strickler,
    /// Colebrook–White with sand roughness `k_s` (m)
    #[default]
    Nikuradse,
}

/// Bottom friction calculator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BottomFriction {
    pub law: FrictionLaw,
    /// Gravitational acceleration (m/s²)
    pub g: f64,
    /// Minimum depth for friction calculation (m)
    pub h_min: f64,
}

impl BottomFriction {
    pub fn new(law: FrictionLaw, g: f64, h_min: f64) -> Self {
        Self { law, g, h_min }
    }

    /// Friction coefficient `c_f` for depth `h`, speed `|U|` and roughness.
    ///
    /// `roughness` is `k_st` for Strickler and `k_s` for Nikuradse.
    pub fn coefficient(&self, h: f64, speed: f64, roughness: f64) -> f64 {
        let h_eff = h.max(self.h_min);
        match self.law {
            FrictionLaw::Strickler => strickler_cf(self.g, roughness, h_eff),
            FrictionLaw::Nikuradse => colebrook_white_lambda(h_eff, speed, roughness) / 8.0,
        }
    }

    /// Kinematic bottom stress `τ_b / ρ = c_f |U| U`.
    #[inline]
    pub fn kinematic_stress(cf: f64, u: f64, v: f64) -> (f64, f64) {
        let speed = (u * u + v * v).sqrt();
        (cf * speed * u, cf * speed * v)
    }
}

/// Strickler friction coefficient `g / (k_st² h^{1/3})`.
#[inline]
pub fn strickler_cf(g: f64, kst: f64, h: f64) -> f64 {
    g / (kst * kst * h.cbrt())
}

/// Darcy–Weisbach friction factor from Colebrook–White.
///
/// The hydraulic radius of a wide channel is the depth, so the relation is
/// written with `4h`:
///
/// 1/√λ = −2 log10( 2.51 / (Re √λ) + k_s / (14.84 h) ),  Re = 4 |U| h / ν
///
/// Fixed-point iteration from the fully rough limit. For vanishing
/// velocity the fully rough value is returned.
pub fn colebrook_white_lambda(h: f64, speed: f64, ks: f64) -> f64 {
    let rel = ks.max(1e-6) / (14.84 * h);
    let rough = (-2.0 * rel.log10()).powi(-2);
    let re = 4.0 * speed * h / NU_WATER;
    if re < 1.0 {
        return rough;
    }
    let mut inv_sqrt = 1.0 / rough.sqrt();
    for _ in 0..20 {
        let next = -2.0 * (2.51 * inv_sqrt / re + rel).log10();
        if (next - inv_sqrt).abs() < 1e-10 {
            inv_sqrt = next;
            break;
        }
        inv_sqrt = next;
    }
    1.0 / (inv_sqrt * inv_sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_strickler_matches_manning() {
        // k_st = 1/n
        let n = 0.025;
        let cf = strickler_cf(9.81, 1.0 / n, 8.0);
        assert_relative_eq!(cf, 9.81 * n * n / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_colebrook_white_converges_to_rough_limit() {
        // Very high Reynolds number → fully rough
        let lambda = colebrook_white_lambda(5.0, 100.0, 0.05);
        let rough = (-2.0 * (0.05_f64 / (14.84 * 5.0)).log10()).powi(-2);
        assert_relative_eq!(lambda, rough, max_relative = 1e-3);

        // Smoother flow has larger λ than the rough limit at low Re
        let slow = colebrook_white_lambda(1.0, 0.01, 0.001);
        let slow_rough = (-2.0 * (0.001_f64 / 14.84).log10()).powi(-2);
        assert!(slow > slow_rough);
    }

    #[test]
    fn test_coefficient_floors_depth() {
        let f = BottomFriction::new(FrictionLaw::Strickler, 9.81, 0.1);
        assert_relative_eq!(f.coefficient(0.0, 1.0, 30.0), f.coefficient(0.1, 1.0, 30.0));
        let nik = BottomFriction::new(FrictionLaw::Nikuradse, 9.81, 0.1);
        let cf = nik.coefficient(3.0, 0.5, 0.02);
        assert!(cf > 1e-4 && cf < 1e-2, "c_f = {cf} implausible");
    }

    #[test]
    fn test_kinematic_stress_is_quadratic() {
        let (tx, ty) = BottomFriction::kinematic_stress(0.003, 3.0, 4.0);
        assert_relative_eq!(tx, 0.003 * 5.0 * 3.0);
        assert_relative_eq!(ty, 0.003 * 5.0 * 4.0);
    }
}
