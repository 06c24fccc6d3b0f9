//! Equation of state for water density.
//!
//! UNESCO EOS-80 one-atmosphere density of seawater, plus the added mass of
//! suspended sediment:
//!
//! ρ = ρ_w(T, S) + c · (1 − ρ_w / ρ_s)
//!
//! with `c` the mass concentration (kg/m³) and `ρ_s` the grain density.
//!
//! # Units
//!
//! - Temperature: °C
//! - Salinity: PSU
//! - Concentration: kg/m³
//! - Density: kg/m³

/// Reference density for seawater (kg/m³).
pub const RHO_0: f64 = 1025.0;

/// Density of quartz sediment (kg/m³).
pub const RHO_SEDIMENT: f64 = 2650.0;

/// Equation of state calculator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquationOfState {
    /// Grain density of suspended sediment (kg/m³)
    pub rho_sediment: f64,
}

impl Default for EquationOfState {
    fn default() -> Self {
        Self {
            rho_sediment: RHO_SEDIMENT,
        }
    }
}

impl EquationOfState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seawater density at surface pressure.
    ///
    /// # Example
    /// ```
    /// use coastal_fem::source::EquationOfState;
    ///
    /// let eos = EquationOfState::new();
    /// let rho_fresh = eos.density_surface(4.0, 0.0);
    /// assert!((rho_fresh - 1000.0).abs() < 0.1);
    /// ```
    pub fn density_surface(&self, temperature: f64, salinity: f64) -> f64 {
        let t = temperature;
        let s = salinity.max(0.0);

        // Pure water density (Bigg formula)
        let rho_w = 999.842594 + 6.793952e-2 * t - 9.095290e-3 * t.powi(2)
            + 1.001685e-4 * t.powi(3)
            - 1.120083e-6 * t.powi(4)
            + 6.536336e-9 * t.powi(5);

        let a = 8.24493e-1 - 4.0899e-3 * t + 7.6438e-5 * t.powi(2) - 8.2467e-7 * t.powi(3)
            + 5.3875e-9 * t.powi(4);
        let b = -5.72466e-3 + 1.0227e-4 * t - 1.6546e-6 * t.powi(2);
        let c0 = 4.8314e-4;

        rho_w + a * s + b * s.powf(1.5) + c0 * s.powi(2)
    }

    /// Density including suspended sediment.
    pub fn density(&self, temperature: f64, salinity: f64, concentration: f64) -> f64 {
        let rho_w = self.density_surface(temperature, salinity);
        rho_w + concentration.max(0.0) * (1.0 - rho_w / self.rho_sediment)
    }

    /// Density anomaly σ = ρ − 1000.
    pub fn sigma(&self, temperature: f64, salinity: f64, concentration: f64) -> f64 {
        self.density(temperature, salinity, concentration) - 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 0.1; // 0.1 kg/m³ tolerance

    #[test]
    fn test_pure_water_density() {
        let eos = EquationOfState::new();
        assert!((eos.density_surface(4.0, 0.0) - 1000.0).abs() < TOL);
        assert!((eos.density_surface(0.0, 0.0) - 999.84).abs() < TOL);
        assert!((eos.density_surface(20.0, 0.0) - 998.2).abs() < TOL);
    }

    #[test]
    fn test_seawater_density() {
        let eos = EquationOfState::new();
        assert!((eos.density_surface(10.0, 35.0) - 1026.97).abs() < TOL);
        assert!((eos.density_surface(25.0, 35.0) - 1023.3).abs() < TOL);
    }

    #[test]
    fn test_sediment_makes_water_heavier() {
        let eos = EquationOfState::new();
        let clear = eos.density(10.0, 30.0, 0.0);
        let turbid = eos.density(10.0, 30.0, 10.0);
        // 10 kg/m³ of quartz adds about 6.1 kg/m³
        assert!((turbid - clear - 10.0 * (1.0 - clear / 2650.0)).abs() < 1e-10);
        assert!(turbid > clear);
        // Negative concentration is ignored
        assert_eq!(eos.density(10.0, 30.0, -1.0), clear);
        assert!((eos.sigma(4.0, 0.0, 0.0)).abs() < TOL);
    }
}
