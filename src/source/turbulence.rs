//! Depth-averaged eddy viscosity.
//!
//! ν_t = ν_mol + ν_smag + ν_elder + ν_break
//!
//! - Smagorinsky: ν = (c_s² A) · √(2 u_x² + 2 v_y² + (u_y + v_x)²)
//! - Elder: ν = (κ/6) · u_* · H with u_* = √c_f · |U|
//! - Battjes: ν = M · H · (D / ρ)^{1/3} from wave-breaking dissipation D

use super::friction::NU_WATER;

/// Von Kármán constant.
pub const KARMAN: f64 = 0.41;

/// Eddy-viscosity model parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EddyViscosity {
    /// Molecular viscosity (m²/s)
    pub molecular: f64,
    /// Smagorinsky constant
    pub smagorinsky: f64,
    /// Factor on the Elder term (1 = κ/6)
    pub elder: f64,
    /// Battjes coefficient M
    pub battjes: f64,
}

impl Default for EddyViscosity {
    fn default() -> Self {
        Self {
            molecular: NU_WATER,
            smagorinsky: 0.1,
            elder: 1.0,
            battjes: 1.0,
        }
    }
}

/// Element quantities needed by [`EddyViscosity::evaluate`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowGradients {
    pub du_dx: f64,
    pub du_dy: f64,
    pub dv_dx: f64,
    pub dv_dy: f64,
}

impl FlowGradients {
    /// Strain-rate norm √(2 u_x² + 2 v_y² + (u_y + v_x)²).
    #[inline]
    pub fn strain_rate(&self) -> f64 {
        let shear = self.du_dy + self.dv_dx;
        (2.0 * self.du_dx * self.du_dx + 2.0 * self.dv_dy * self.dv_dy + shear * shear).sqrt()
    }
}

impl EddyViscosity {
    /// Smagorinsky subgrid viscosity.
    #[inline]
    pub fn smagorinsky_term(&self, area: f64, grads: &FlowGradients) -> f64 {
        self.smagorinsky * self.smagorinsky * area * grads.strain_rate()
    }

    /// Elder depth/friction viscosity.
    #[inline]
    pub fn elder_term(&self, depth: f64, cf: f64, speed: f64) -> f64 {
        self.elder * KARMAN / 6.0 * cf.max(0.0).sqrt() * speed * depth.max(0.0)
    }

    /// Battjes breaking-wave viscosity for dissipation `D` (W/m²).
    #[inline]
    pub fn battjes_term(&self, depth: f64, dissipation: f64, rho: f64) -> f64 {
        if dissipation <= 0.0 {
            return 0.0;
        }
        self.battjes * depth.max(0.0) * (dissipation / rho).cbrt()
    }

    /// Total eddy viscosity.
    pub fn evaluate(
        &self,
        area: f64,
        grads: &FlowGradients,
        depth: f64,
        cf: f64,
        speed: f64,
        dissipation: f64,
        rho: f64,
    ) -> f64 {
        self.molecular
            + self.smagorinsky_term(area, grads)
            + self.elder_term(depth, cf, speed)
            + self.battjes_term(depth, dissipation, rho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_still_water_is_molecular() {
        let ev = EddyViscosity::default();
        let nu = ev.evaluate(100.0, &FlowGradients::default(), 5.0, 0.003, 0.0, 0.0, 1025.0);
        assert_relative_eq!(nu, NU_WATER);
    }

    #[test]
    fn test_terms_add_up() {
        let ev = EddyViscosity::default();
        let grads = FlowGradients {
            du_dx: 0.01,
            du_dy: 0.0,
            dv_dx: 0.0,
            dv_dy: -0.01,
        };
        assert_relative_eq!(grads.strain_rate(), 0.0004_f64.sqrt(), epsilon = 1e-15);
        let smag = 0.01 * 50.0 * 0.02;
        let elder = KARMAN / 6.0 * 0.04 * 1.0 * 4.0;
        let battjes = 4.0 * (1025.0_f64 / 1025.0).cbrt();
        let total = ev.evaluate(50.0, &grads, 4.0, 0.0016, 1.0, 1025.0, 1025.0);
        assert_relative_eq!(total, NU_WATER + smag + elder + battjes, epsilon = 1e-12);
    }

    #[test]
    fn test_no_breaking_no_battjes() {
        let ev = EddyViscosity::default();
        assert_eq!(ev.battjes_term(3.0, 0.0, 1025.0), 0.0);
        assert_eq!(ev.battjes_term(3.0, -1.0, 1025.0), 0.0);
    }
}
