//! Cohesive and non-cohesive sediment transport laws.
//!
//! - Settling velocity and critical Shields parameter after Soulsby (1997)
//! - Erosion after Partheniades, deposition after Krone
//! - Bed load after Meyer-Peter & Müller
//! - Combined wave-current bed shear after Soulsby (1995)

use std::f64::consts::PI;

/// Dimensionless grain size `D* = d ((s − 1) g / ν²)^{1/3}`.
#[inline]
pub fn dimensionless_grain_size(d50: f64, s: f64, g: f64, nu: f64) -> f64 {
    d50 * ((s - 1.0) * g / (nu * nu)).cbrt()
}

/// Settling velocity of a natural grain (m/s).
///
/// w_s = ν/d · (√(10.36² + 1.049 D*³) − 10.36)
pub fn settling_velocity(d50: f64, s: f64, g: f64, nu: f64) -> f64 {
    let d_star = dimensionless_grain_size(d50, s, g, nu);
    nu / d50 * ((10.36_f64.powi(2) + 1.049 * d_star.powi(3)).sqrt() - 10.36)
}

/// Critical Shields parameter (Soulsby–Whitehouse).
pub fn critical_shields(d_star: f64) -> f64 {
    0.30 / (1.0 + 1.2 * d_star) + 0.055 * (1.0 - (-0.020 * d_star).exp())
}

/// Partheniades erosion flux (kg/m²/s).
#[inline]
pub fn erosion_rate(m: f64, tau_b: f64, tau_ce: f64) -> f64 {
    if tau_b > tau_ce && tau_ce > 0.0 {
        m * (tau_b / tau_ce - 1.0)
    } else {
        0.0
    }
}

/// Krone deposition flux (kg/m²/s) for concentration `c`.
#[inline]
pub fn deposition_rate(ws: f64, c: f64, tau_b: f64, tau_cd: f64) -> f64 {
    if tau_b < tau_cd && c > 0.0 {
        ws * c * (1.0 - tau_b / tau_cd)
    } else {
        0.0
    }
}

/// Meyer-Peter & Müller bed-load magnitude (m²/s).
///
/// q_b = 8 (θ − θ_cr)^{3/2} √((s − 1) g d³)
#[inline]
pub fn meyer_peter_mueller(theta: f64, theta_cr: f64, s: f64, g: f64, d50: f64) -> f64 {
    if theta <= theta_cr {
        return 0.0;
    }
    8.0 * (theta - theta_cr).powf(1.5) * ((s - 1.0) * g * d50.powi(3)).sqrt()
}

/// Wave friction factor (Soulsby) for orbital velocity `u_w`, period `t`
/// and Nikuradse roughness `ks`.
pub fn wave_friction_factor(u_w: f64, period: f64, ks: f64) -> f64 {
    let z0 = ks.max(1e-6) / 30.0;
    let excursion = u_w * period / (2.0 * PI);
    if excursion <= z0 {
        return 0.3;
    }
    (1.39 * (excursion / z0).powf(-0.52)).min(0.3)
}

/// Maximum bed shear of combined waves and current (N/m²).
///
/// `angle` is the angle between wave propagation and current.
pub fn wave_current_shear(tau_c: f64, tau_w: f64, angle: f64) -> f64 {
    if tau_w <= 0.0 {
        return tau_c;
    }
    if tau_c <= 0.0 {
        return tau_w;
    }
    let tau_m = tau_c * (1.0 + 1.2 * (tau_w / (tau_c + tau_w)).powf(3.2));
    ((tau_m + tau_w * angle.cos().abs()).powi(2) + (tau_w * angle.sin().abs()).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const G: f64 = 9.81;
    const NU: f64 = 1.0e-6;

    #[test]
    fn test_settling_velocity_fine_sand() {
        // 0.2 mm quartz settles at roughly 2 cm/s
        let ws = settling_velocity(2.0e-4, 2.65, G, NU);
        assert!(ws > 0.015 && ws < 0.03, "w_s = {ws}");
    }

    #[test]
    fn test_critical_shields_range() {
        let d_star = dimensionless_grain_size(2.0e-4, 2.65, G, NU);
        let theta = critical_shields(d_star);
        assert!(theta > 0.03 && theta < 0.08, "θ_cr = {theta}");
    }

    #[test]
    fn test_erosion_deposition_thresholds() {
        assert_eq!(erosion_rate(1e-4, 0.1, 0.2), 0.0);
        assert_relative_eq!(erosion_rate(1e-4, 0.4, 0.2), 1e-4);
        assert_eq!(deposition_rate(1e-3, 0.5, 0.3, 0.2), 0.0);
        assert_relative_eq!(deposition_rate(1e-3, 0.5, 0.1, 0.2), 2.5e-4);
        assert_eq!(deposition_rate(1e-3, 0.0, 0.0, 0.2), 0.0);
    }

    #[test]
    fn test_mpm_zero_below_threshold() {
        assert_eq!(meyer_peter_mueller(0.04, 0.047, 2.65, G, 1e-3), 0.0);
        let q = meyer_peter_mueller(0.147, 0.047, 2.65, G, 1e-3);
        assert_relative_eq!(
            q,
            8.0 * 0.1_f64.powf(1.5) * (1.65 * G * 1e-9).sqrt(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_wave_current_shear() {
        assert_eq!(wave_current_shear(0.3, 0.0, 0.0), 0.3);
        assert_eq!(wave_current_shear(0.0, 0.4, 0.0), 0.4);
        let combined = wave_current_shear(0.3, 0.4, 0.0);
        assert!(combined > 0.7, "colinear waves add at least linearly");
        let fw = wave_friction_factor(0.5, 8.0, 0.01);
        assert!(fw > 0.0 && fw <= 0.3);
    }
}
