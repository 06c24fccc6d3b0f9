//! Coupled driver implementation.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};

use crate::analysis::{StabilityMonitor, StabilityThresholds, divergence_report};
use crate::boundary::BoundaryConditionTable;
use crate::config::ModelConfig;
use crate::error::FemError;
use crate::io::ResultSink;
use crate::mesh::TriMesh;
use crate::physics::{
    CurrentModel, FluidMudModel, FluidMudPhysics, GroundwaterModel, GroundwaterPhysics,
    HeatModel, HeatPhysics, SedimentModel, SedimentPhysics, WaveModel, WavePhysics,
};
use crate::solver::{FemModel, StepReport};

// =============================================================================
// Simulation Result
// =============================================================================

/// Result of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    /// Final simulation time reached.
    pub final_time: f64,
    /// Total number of time steps taken.
    pub n_steps: usize,
    /// Number of output times written to the sink.
    pub n_outputs: usize,
    /// Smallest stable step candidate seen over the run.
    pub min_stable_dt: f64,
    /// Total wall-clock time in seconds.
    pub wall_time: f64,
}

// =============================================================================
// Coupled Simulation
// =============================================================================

/// The current model plus the sub-models enabled in the configuration.
///
/// All models share one mesh and one step size. Per step the order is
///
/// ```text
/// waves ← hydro(t)      → step waves
/// current ← waves, temperature, concentration, bed change → step current
/// sediment, heat, fluid mud, groundwater ← hydro(t + dt) → step each
/// ```
pub struct CoupledSimulation {
    mesh: Arc<TriMesh>,
    current: CurrentModel,
    sediment: Option<SedimentModel>,
    fluid_mud: Option<FluidMudModel>,
    groundwater: Option<GroundwaterModel>,
    heat: Option<HeatModel>,
    waves: Option<WaveModel>,
    output_interval: f64,
    monitor: StabilityMonitor,
}

impl CoupledSimulation {
    /// Build every enabled model and bind its boundary entries.
    ///
    /// Entries no model consumed are reported with a warning.
    pub fn new(
        mesh: Arc<TriMesh>,
        config: &ModelConfig,
        table: &mut BoundaryConditionTable,
    ) -> Result<Self, FemError> {
        let g = config.current.gravity;
        let flags = &config.simulation;

        let current = FemModel::current(&config.current, mesh.clone(), table)?;
        let sediment = if flags.sediment {
            Some(FemModel::new(
                SedimentPhysics::new(&config.sediment, g),
                mesh.clone(),
                table,
            )?)
        } else {
            None
        };
        let fluid_mud = if flags.fluid_mud {
            Some(FemModel::new(
                FluidMudPhysics::new(&config.fluid_mud, g),
                mesh.clone(),
                table,
            )?)
        } else {
            None
        };
        let groundwater = if flags.groundwater {
            Some(FemModel::new(
                GroundwaterPhysics::new(&config.groundwater),
                mesh.clone(),
                table,
            )?)
        } else {
            None
        };
        let heat = if flags.heat {
            Some(FemModel::new(HeatPhysics::new(&config.heat), mesh.clone(), table)?)
        } else {
            None
        };
        let waves = if flags.waves {
            Some(FemModel::new(WavePhysics::new(&config.waves), mesh.clone(), table)?)
        } else {
            None
        };
        table.warn_unused();

        let sim = Self {
            mesh,
            current,
            sediment,
            fluid_mud,
            groundwater,
            heat,
            waves,
            output_interval: flags.output_interval,
            monitor: StabilityMonitor::new(StabilityThresholds::default()),
        };
        info!("coupled simulation: models {:?}", sim.model_names());
        Ok(sim)
    }

    pub fn mesh(&self) -> &Arc<TriMesh> {
        &self.mesh
    }

    pub fn current(&self) -> &CurrentModel {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut CurrentModel {
        &mut self.current
    }

    pub fn sediment(&self) -> Option<&SedimentModel> {
        self.sediment.as_ref()
    }

    pub fn fluid_mud(&self) -> Option<&FluidMudModel> {
        self.fluid_mud.as_ref()
    }

    pub fn groundwater(&self) -> Option<&GroundwaterModel> {
        self.groundwater.as_ref()
    }

    pub fn heat(&self) -> Option<&HeatModel> {
        self.heat.as_ref()
    }

    pub fn waves(&self) -> Option<&WaveModel> {
        self.waves.as_ref()
    }

    pub fn monitor(&self) -> &StabilityMonitor {
        &self.monitor
    }

    /// Replace the stability thresholds used after each current step.
    pub fn with_thresholds(mut self, thresholds: StabilityThresholds) -> Self {
        self.monitor = StabilityMonitor::new(thresholds);
        self
    }

    pub fn with_output_interval(mut self, interval: f64) -> Self {
        self.output_interval = interval;
        self
    }

    pub fn time(&self) -> f64 {
        self.current.time()
    }

    /// Names of the running models in step order.
    pub fn model_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(m) = &self.waves {
            names.push(m.name());
        }
        names.push(self.current.name());
        if let Some(m) = &self.sediment {
            names.push(m.name());
        }
        if let Some(m) = &self.heat {
            names.push(m.name());
        }
        if let Some(m) = &self.fluid_mud {
            names.push(m.name());
        }
        if let Some(m) = &self.groundwater {
            names.push(m.name());
        }
        names
    }

    /// Set the initial state of every model at `t0`.
    pub fn initial_solution(&mut self, t0: f64) -> Result<(), FemError> {
        self.current.initial_solution(t0);
        let hydro = self.current.hydro_field();

        if let Some(m) = &mut self.waves {
            m.set_hydro(&hydro)?;
            m.initial_solution(t0);
            self.current.set_waves(&m.wave_field())?;
        }
        if let Some(m) = &mut self.sediment {
            m.set_hydro(&hydro)?;
            if let Some(w) = &self.waves {
                m.set_waves(&w.wave_field())?;
            }
            m.initial_solution(t0);
        }
        if let Some(m) = &mut self.heat {
            m.set_hydro(&hydro)?;
            m.initial_solution(t0);
            self.current.set_temperature(&m.temperatures())?;
        }
        if let Some(m) = &mut self.fluid_mud {
            m.set_hydro(&hydro)?;
            m.initial_solution(t0);
        }
        if let Some(m) = &mut self.groundwater {
            m.set_hydro(&hydro)?;
            m.initial_solution(t0);
        }
        Ok(())
    }

    /// Advance every model by `dt`.
    ///
    /// The report carries the current model's time and dry count and the
    /// smallest stable candidate over all models.
    pub fn step(&mut self, dt: f64) -> Result<StepReport, FemError> {
        let mut min_stable_dt = f64::INFINITY;

        if let Some(m) = &mut self.waves {
            m.set_hydro(&self.current.hydro_field())?;
            min_stable_dt = min_stable_dt.min(m.time_step(dt)?.min_stable_dt);
            self.current.set_waves(&m.wave_field())?;
        }
        if let Some(m) = &self.heat {
            self.current.set_temperature(&m.temperatures())?;
        }
        if let Some(m) = &self.sediment {
            self.current.set_concentration(&m.concentrations())?;
            self.current.set_bed_change(&m.bed_changes())?;
        }

        let report = self.current.time_step(dt)?;
        self.monitor.check(&self.current, &report);
        min_stable_dt = min_stable_dt.min(report.min_stable_dt);

        let hydro = self.current.hydro_field();
        if let Some(m) = &mut self.sediment {
            m.set_hydro(&hydro)?;
            if let Some(w) = &self.waves {
                m.set_waves(&w.wave_field())?;
            }
            min_stable_dt = min_stable_dt.min(m.time_step(dt)?.min_stable_dt);
        }
        if let Some(m) = &mut self.heat {
            m.set_hydro(&hydro)?;
            min_stable_dt = min_stable_dt.min(m.time_step(dt)?.min_stable_dt);
        }
        if let Some(m) = &mut self.fluid_mud {
            m.set_hydro(&hydro)?;
            min_stable_dt = min_stable_dt.min(m.time_step(dt)?.min_stable_dt);
        }
        if let Some(m) = &mut self.groundwater {
            m.set_hydro(&hydro)?;
            min_stable_dt = min_stable_dt.min(m.time_step(dt)?.min_stable_dt);
        }

        Ok(StepReport {
            min_stable_dt,
            ..report
        })
    }

    /// Hand a snapshot of every model to `sink`.
    pub fn write_output(&self, sink: &mut dyn ResultSink) -> Result<(), FemError> {
        if let Some(m) = &self.waves {
            sink.write_snapshot(&m.snapshot())?;
        }
        sink.write_snapshot(&self.current.snapshot())?;
        if let Some(m) = &self.sediment {
            sink.write_snapshot(&m.snapshot())?;
        }
        if let Some(m) = &self.heat {
            sink.write_snapshot(&m.snapshot())?;
        }
        if let Some(m) = &self.fluid_mud {
            sink.write_snapshot(&m.snapshot())?;
        }
        if let Some(m) = &self.groundwater {
            sink.write_snapshot(&m.snapshot())?;
        }
        info!("output at t = {} s", self.time());
        Ok(())
    }

    /// Log the first non-finite node of every diverged model.
    fn report_divergence(&self) {
        let reports = [
            self.waves.as_ref().and_then(divergence_report),
            divergence_report(&self.current),
            self.sediment.as_ref().and_then(divergence_report),
            self.heat.as_ref().and_then(divergence_report),
            self.fluid_mud.as_ref().and_then(divergence_report),
            self.groundwater.as_ref().and_then(divergence_report),
        ];
        for report in reports.into_iter().flatten() {
            error!("{report}");
        }
    }

    /// Step with constant `dt` until `t_end`, writing every output interval.
    ///
    /// The initial state is written first. On divergence, or when the
    /// stability monitor recommends stopping, the final state of every model
    /// is written before the error is returned.
    pub fn run_until(
        &mut self,
        t_end: f64,
        dt: f64,
        sink: &mut dyn ResultSink,
    ) -> Result<SimulationResult, FemError> {
        if !(dt > 0.0) {
            return Err(FemError::invalid("dt", dt, "step size must be positive"));
        }
        let start_wall = Instant::now();
        let mut n_steps = 0;
        let mut n_outputs = 1;
        let mut min_stable_dt = f64::INFINITY;
        let mut next_output = self.time() + self.output_interval;

        self.write_output(sink)?;

        // Half a step of tolerance so rounding does not add a sliver step
        while self.time() < t_end - 0.5 * dt {
            let report = match self.step(dt) {
                Ok(report) => report,
                Err(e) if e.is_divergence() => {
                    error!("simulation stopped: {e}");
                    self.report_divergence();
                    self.write_output(sink)?;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            n_steps += 1;
            min_stable_dt = min_stable_dt.min(report.min_stable_dt);

            if self.monitor.should_stop() {
                let err = FemError::Unstable {
                    model: self.current.name().to_string(),
                    time: self.time(),
                    warnings: self.monitor.consecutive_warnings(),
                };
                error!("simulation stopped: {err}");
                self.write_output(sink)?;
                return Err(err);
            }

            if self.time() >= next_output - 0.5 * dt {
                self.write_output(sink)?;
                n_outputs += 1;
                next_output += self.output_interval;
            }
            if n_steps % 100 == 0 {
                debug!("step {n_steps}: t = {:.1} s", self.time());
            }
        }

        let wall_time = start_wall.elapsed().as_secs_f64();
        info!(
            "simulation complete: {n_steps} steps to t = {} s in {wall_time:.2} s",
            self.time()
        );
        Ok(SimulationResult {
            final_time: self.time(),
            n_steps,
            n_outputs,
            min_stable_dt,
            wall_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Constant, PhysicsKey, shared};
    use crate::io::MemorySink;

    fn basin() -> Arc<TriMesh> {
        Arc::new(
            TriMesh::uniform_rectangle(0.0, 200.0, 0.0, 200.0, 4, 4).with_bathymetry(|_, _| -3.0),
        )
    }

    fn all_models() -> ModelConfig {
        let mut config = ModelConfig::default();
        config.simulation.sediment = true;
        config.simulation.fluid_mud = true;
        config.simulation.groundwater = true;
        config.simulation.heat = true;
        config.simulation.waves = true;
        config.simulation.output_interval = 20.0;
        config
    }

    #[test]
    fn test_only_current_by_default() {
        let mut table = BoundaryConditionTable::new();
        let sim = CoupledSimulation::new(basin(), &ModelConfig::default(), &mut table).unwrap();
        assert_eq!(sim.model_names(), vec!["current"]);
        assert!(sim.sediment().is_none());
    }

    #[test]
    fn test_step_order_of_all_models() {
        let mut table = BoundaryConditionTable::new();
        let sim = CoupledSimulation::new(basin(), &all_models(), &mut table).unwrap();
        assert_eq!(
            sim.model_names(),
            vec!["waves", "current", "sediment", "heat", "fluid_mud", "groundwater"]
        );
    }

    #[test]
    fn test_run_until_writes_each_interval() {
        let mut table = BoundaryConditionTable::new();
        let mut sim = CoupledSimulation::new(basin(), &all_models(), &mut table).unwrap();
        sim.initial_solution(0.0).unwrap();
        let mut sink = MemorySink::new();
        let result = sim.run_until(60.0, 2.0, &mut sink).unwrap();

        assert_eq!(result.n_steps, 30);
        assert_eq!(result.n_outputs, 4);
        assert_eq!(sink.for_model("current").count(), 4);
        assert_eq!(sink.for_model("groundwater").count(), 4);
        assert!((sim.time() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_divergence_writes_final_state() {
        let mut table = BoundaryConditionTable::new();
        table.push(0, PhysicsKey::WaterLevel, shared(Constant(f64::NAN)));
        let mut config = ModelConfig::default();
        config.simulation.output_interval = 1.0e9;
        let mut sim = CoupledSimulation::new(basin(), &config, &mut table).unwrap();
        sim.initial_solution(0.0).unwrap();
        let mut sink = MemorySink::new();
        let err = sim.run_until(100.0, 1.0, &mut sink).unwrap_err();
        assert!(err.is_divergence());
        // initial state plus the final state
        assert_eq!(sink.snapshots.len(), 2);
        assert!(sim.step(1.0).unwrap_err().is_divergence());
    }

    #[test]
    fn test_repeated_stability_warnings_stop_run() {
        let mut table = BoundaryConditionTable::new();
        let mut config = ModelConfig::default();
        config.simulation.output_interval = 1.0e9;
        let mut sim = CoupledSimulation::new(basin(), &config, &mut table)
            .unwrap()
            .with_thresholds(StabilityThresholds::default().with_max_dt_ratio(1e-12));
        sim.initial_solution(0.0).unwrap();
        let mut sink = MemorySink::new();
        // 1 s is well inside the stable step of this basin
        let err = sim.run_until(100.0, 1.0, &mut sink).unwrap_err();

        let limit = StabilityThresholds::default().max_consecutive_warnings;
        match err {
            FemError::Unstable { warnings, time, .. } => {
                assert_eq!(warnings, limit);
                assert!((time - limit as f64).abs() < 1e-9);
            }
            other => panic!("expected an unstable run, got {other}"),
        }
        // initial state plus the final state
        assert_eq!(sink.snapshots.len(), 2);
        assert!(sim.monitor().should_stop());
    }

    #[test]
    fn test_non_positive_step_rejected() {
        let mut table = BoundaryConditionTable::new();
        let mut sim = CoupledSimulation::new(basin(), &ModelConfig::default(), &mut table).unwrap();
        let mut sink = MemorySink::new();
        assert!(matches!(
            sim.run_until(10.0, 0.0, &mut sink),
            Err(FemError::InvalidParameter { .. })
        ));
    }
}
