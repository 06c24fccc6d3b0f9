//! Stability monitoring for the explicit sub-models.
//!
//! The time-step driver already refuses to continue after a non-finite
//! value. The monitor adds softer diagnostics between steps: values that
//! grow beyond a plausible magnitude and steps larger than the smallest
//! stable candidate of the last assembly.
//!
//! # Example
//!
//! ```ignore
//! use coastal_fem::analysis::{StabilityMonitor, StabilityThresholds};
//!
//! let mut monitor = StabilityMonitor::new(StabilityThresholds::default());
//! let report = model.time_step(dt)?;
//! let status = monitor.check(&model, &report);
//! if monitor.should_stop() {
//!     break;
//! }
//! ```

use log::warn;

use crate::physics::{FemPhysics, NodeState};
use crate::solver::{FemModel, StepReport};

/// Thresholds for stability monitoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityThresholds {
    /// Largest plausible magnitude of any unknown.
    pub max_abs_value: f64,
    /// Allowed ratio of the used step to the smallest stable candidate.
    pub max_dt_ratio: f64,
    /// Maximum consecutive warnings before recommending stop.
    pub max_consecutive_warnings: usize,
}

impl Default for StabilityThresholds {
    fn default() -> Self {
        Self {
            max_abs_value: 1.0e6,
            max_dt_ratio: 1.0,
            max_consecutive_warnings: 10,
        }
    }
}

impl StabilityThresholds {
    /// Strict thresholds for detecting issues early.
    pub fn strict() -> Self {
        Self {
            max_abs_value: 1.0e4,
            max_dt_ratio: 0.5,
            max_consecutive_warnings: 3,
        }
    }

    pub fn with_max_abs_value(mut self, value: f64) -> Self {
        self.max_abs_value = value;
        self
    }

    pub fn with_max_dt_ratio(mut self, ratio: f64) -> Self {
        self.max_dt_ratio = ratio;
        self
    }
}

/// Types of stability warnings.
#[derive(Debug, Clone, PartialEq)]
pub enum StabilityWarning {
    /// Non-finite unknown or derivative.
    NonFiniteValue { node: usize, variable: &'static str },
    /// An unknown exceeds the plausible magnitude.
    ValueExceedsMax {
        node: usize,
        variable: &'static str,
        value: f64,
        threshold: f64,
    },
    /// The step used exceeds the stable candidate.
    TimestepExceedsStable { dt: f64, stable: f64 },
}

impl std::fmt::Display for StabilityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteValue { node, variable } => {
                write!(f, "Non-finite {variable} at node {node}")
            }
            Self::ValueExceedsMax {
                node,
                variable,
                value,
                threshold,
            } => write!(
                f,
                "{variable} exceeds max: |{value:.3e}| > {threshold:.3e} at node {node}"
            ),
            Self::TimestepExceedsStable { dt, stable } => {
                write!(f, "Timestep dt={dt:.3e}s exceeds stable dt={stable:.3e}s")
            }
        }
    }
}

/// Stability status after one step.
#[derive(Debug, Clone)]
pub struct StabilityStatus {
    /// Model time (s)
    pub time: f64,
    /// Largest magnitude per unknown
    pub max_abs: Vec<f64>,
    /// Whether no warning was raised
    pub is_stable: bool,
    pub warnings: Vec<StabilityWarning>,
}

impl StabilityStatus {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether a non-finite value was found.
    pub fn has_critical_warnings(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, StabilityWarning::NonFiniteValue { .. }))
    }
}

/// Monitor for tracking solution stability of one model.
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    thresholds: StabilityThresholds,
    consecutive_warnings: usize,
    total_checks: usize,
    total_warnings: usize,
    last_status: Option<StabilityStatus>,
}

impl StabilityMonitor {
    pub fn new(thresholds: StabilityThresholds) -> Self {
        Self {
            thresholds,
            consecutive_warnings: 0,
            total_checks: 0,
            total_warnings: 0,
            last_status: None,
        }
    }

    pub fn thresholds(&self) -> &StabilityThresholds {
        &self.thresholds
    }

    pub fn consecutive_warnings(&self) -> usize {
        self.consecutive_warnings
    }

    pub fn total_checks(&self) -> usize {
        self.total_checks
    }

    pub fn total_warnings(&self) -> usize {
        self.total_warnings
    }

    pub fn last_status(&self) -> Option<&StabilityStatus> {
        self.last_status.as_ref()
    }

    /// Check a model after the step described by `report`.
    pub fn check<P, const N: usize>(
        &mut self,
        model: &FemModel<P, N>,
        report: &StepReport,
    ) -> StabilityStatus
    where
        P: FemPhysics<N>,
    {
        self.total_checks += 1;
        let names = model.physics().variable_names();
        let mut warnings = Vec::new();
        let mut max_abs = vec![0.0_f64; N];

        for (i, node) in model.nodes().iter().enumerate() {
            let dof = node.dof();
            if let Some(k) = dof.first_non_finite() {
                warnings.push(StabilityWarning::NonFiniteValue {
                    node: i,
                    variable: names[k],
                });
                continue;
            }
            for k in 0..N {
                let value = dof.q[k].abs();
                max_abs[k] = max_abs[k].max(value);
                if value > self.thresholds.max_abs_value {
                    warnings.push(StabilityWarning::ValueExceedsMax {
                        node: i,
                        variable: names[k],
                        value: dof.q[k],
                        threshold: self.thresholds.max_abs_value,
                    });
                }
            }
        }

        if report.dt > self.thresholds.max_dt_ratio * report.min_stable_dt {
            warnings.push(StabilityWarning::TimestepExceedsStable {
                dt: report.dt,
                stable: report.min_stable_dt,
            });
        }

        let is_stable = warnings.is_empty();
        if is_stable {
            self.consecutive_warnings = 0;
        } else {
            self.consecutive_warnings += 1;
            self.total_warnings += warnings.len();
            for w in warnings.iter().take(5) {
                warn!("{}: {w}", model.name());
            }
        }

        let status = StabilityStatus {
            time: report.time,
            max_abs,
            is_stable,
            warnings,
        };
        self.last_status = Some(status.clone());
        status
    }

    /// Whether the run should stop given the warning history.
    pub fn should_stop(&self) -> bool {
        if self.consecutive_warnings >= self.thresholds.max_consecutive_warnings {
            return true;
        }
        self.last_status
            .as_ref()
            .is_some_and(StabilityStatus::has_critical_warnings)
    }

    pub fn reset(&mut self) {
        self.consecutive_warnings = 0;
        self.last_status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeatConfig;
    use crate::mesh::TriMesh;
    use crate::physics::{HeatPhysics, HydroField};
    use std::sync::Arc;

    fn heat_model() -> FemModel<HeatPhysics, 1> {
        let mesh = Arc::new(
            TriMesh::uniform_rectangle(0.0, 10.0, 0.0, 10.0, 2, 2).with_bathymetry(|_, _| -1.0),
        );
        let physics = HeatPhysics::new(&HeatConfig::default());
        let mut m = FemModel::without_boundaries(physics, mesh.clone());
        m.set_hydro(&HydroField::still_water(&mesh, 0.0)).unwrap();
        m.initial_solution(0.0);
        m
    }

    fn report(dt: f64, stable: f64) -> StepReport {
        StepReport {
            time: dt,
            dt,
            min_stable_dt: stable,
            dry_elements: 0,
        }
    }

    #[test]
    fn test_quiet_model_is_stable() {
        let m = heat_model();
        let mut monitor = StabilityMonitor::new(StabilityThresholds::default());
        let status = monitor.check(&m, &report(1.0, 10.0));
        assert!(status.is_stable);
        assert_eq!(status.max_abs, vec![15.0]);
        assert!(!monitor.should_stop());
    }

    #[test]
    fn test_large_value_and_step_warn() {
        let mut m = heat_model();
        m.node_mut(2).dof.q[0] = 1.0e7;
        let mut monitor = StabilityMonitor::new(StabilityThresholds::default());
        let status = monitor.check(&m, &report(20.0, 10.0));
        assert_eq!(status.warnings.len(), 2);
        assert!(!status.has_critical_warnings());
        assert_eq!(monitor.consecutive_warnings(), 1);
    }

    #[test]
    fn test_non_finite_stops() {
        let mut m = heat_model();
        m.node_mut(0).dof.q[0] = f64::NAN;
        let mut monitor = StabilityMonitor::new(StabilityThresholds::strict());
        let status = monitor.check(&m, &report(1.0, 10.0));
        assert_eq!(
            status.warnings[0],
            StabilityWarning::NonFiniteValue {
                node: 0,
                variable: "temperature"
            }
        );
        assert!(monitor.should_stop());
    }
}
