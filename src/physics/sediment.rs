//! Suspended sediment and bed evolution.
//!
//! Unknowns per node: depth-averaged concentration `c` (kg/m³) and the
//! accumulated bed-level change `Δz_b` (m).
//!
//! ```text
//! ∂c/∂t + λ(ū·∇c) − ∇·(K∇c) − (E − D)/H = 0
//! ∂z_b/∂t + m/(1 − p) · ((E − D)/ρ_s + ∇·q_b) = 0
//! ```
//!
//! E is the Partheniades erosion flux, D the Krone deposition flux, q_b the
//! Meyer-Peter & Müller bed load along the flow and m the morphological
//! factor. Bed shear combines the current shear with wave orbital motion.

use log::warn;

use super::coupling::{HydroCoupled, HydroState, WaveCoupled, WaveState};
use super::traits::{Dof, ElementContext, ElementTerms, FemPhysics, NodeState};
use crate::boundary::{PhysicsKey, SharedFunction};
use crate::config::SedimentConfig;
use crate::mesh::MeshNode;
use crate::solver::{FemModel, Watt};
use crate::source::sediment_transport::{dimensionless_grain_size, wave_friction_factor};
use crate::source::{
    NU_WATER, RHO_0, critical_shields, deposition_rate, erosion_rate, meyer_peter_mueller,
    settling_velocity, wave_current_shear,
};

const KEYS: &[PhysicsKey] = &[PhysicsKey::Concentration, PhysicsKey::BedLevel];

/// Sediment record of one node.
#[derive(Clone, Debug, Default)]
pub struct SedimentNode {
    pub dof: Dof<2>,
    pub concentration_bc: Option<SharedFunction>,
    pub bed_bc: Option<SharedFunction>,
    pub hydro: HydroState,
    pub waves: WaveState,
    /// Combined wave–current bed shear (N/m²)
    pub bed_shear: f64,
    /// Erosion flux (kg/m²/s)
    pub erosion: f64,
    /// Deposition flux (kg/m²/s)
    pub deposition: f64,
    /// Bed-load transport (m²/s)
    pub bed_load: (f64, f64),
}

impl SedimentNode {
    #[inline]
    pub fn concentration(&self) -> f64 {
        self.dof.q[0]
    }

    #[inline]
    pub fn bed_change(&self) -> f64 {
        self.dof.q[1]
    }
}

impl NodeState<2> for SedimentNode {
    fn dof(&self) -> &Dof<2> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<2> {
        &mut self.dof
    }
}

impl HydroCoupled for SedimentNode {
    fn hydro(&self) -> &HydroState {
        &self.hydro
    }

    fn hydro_mut(&mut self) -> &mut HydroState {
        &mut self.hydro
    }
}

impl WaveCoupled for SedimentNode {
    fn waves_mut(&mut self) -> &mut WaveState {
        &mut self.waves
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SedimentElement {
    pub u: f64,
    pub v: f64,
    pub depth: f64,
    pub bed_shear: f64,
    pub iwatt: usize,
    pub elementsize: f64,
    pub tau: f64,
}

/// Sediment transport strategy.
#[derive(Clone, Debug)]
pub struct SedimentPhysics {
    g: f64,
    watt: Watt,
    d50: f64,
    rho_sediment: f64,
    porosity: f64,
    erosion_constant: f64,
    tau_ce: f64,
    tau_cd: f64,
    diffusivity: f64,
    morphological_factor: f64,
    bed_roughness: f64,
    bed_load: bool,
    settling_velocity: f64,
    theta_cr: f64,
}

impl SedimentPhysics {
    pub fn new(config: &SedimentConfig, g: f64) -> Self {
        let s = config.rho_sediment / RHO_0;
        let d_star = dimensionless_grain_size(config.d50, s, g, NU_WATER);
        Self {
            g,
            watt: Watt::new(config.watt),
            d50: config.d50,
            rho_sediment: config.rho_sediment,
            porosity: config.porosity,
            erosion_constant: config.erosion_constant,
            tau_ce: config.critical_erosion_shear,
            tau_cd: config.critical_deposition_shear,
            diffusivity: config.diffusivity,
            morphological_factor: config.morphological_factor,
            bed_roughness: config.bed_roughness,
            bed_load: config.bed_load,
            settling_velocity: settling_velocity(config.d50, s, g, NU_WATER),
            theta_cr: critical_shields(d_star),
        }
    }

    /// Settling velocity of the configured grain (m/s).
    pub fn settling_velocity(&self) -> f64 {
        self.settling_velocity
    }

    /// Critical Shields parameter of the configured grain.
    pub fn critical_shields(&self) -> f64 {
        self.theta_cr
    }

    /// Bed shear of current and waves at a node (N/m²).
    pub fn bed_shear(&self, hydro: &HydroState, waves: &WaveState) -> f64 {
        let tau_c = hydro.bottom_shear;
        if waves.orbital_velocity <= 0.0 || waves.period <= 0.0 {
            return tau_c;
        }
        let fw = wave_friction_factor(waves.orbital_velocity, waves.period, self.bed_roughness);
        let tau_w = 0.5 * hydro.density * fw * waves.orbital_velocity.powi(2);
        let angle = waves.direction - hydro.v.atan2(hydro.u);
        wave_current_shear(tau_c, tau_w, angle)
    }

    /// Bed-load vector along the flow (m²/s).
    fn bed_load_vector(&self, hydro: &HydroState, tau: f64) -> (f64, f64) {
        let speed = hydro.speed();
        if !self.bed_load || speed <= 0.0 {
            return (0.0, 0.0);
        }
        let s = self.rho_sediment / hydro.density;
        let theta = tau / ((self.rho_sediment - hydro.density) * self.g * self.d50);
        let q = hydro.wlambda * meyer_peter_mueller(theta, self.theta_cr, s, self.g, self.d50);
        (q * hydro.u / speed, q * hydro.v / speed)
    }
}

impl FemPhysics<2> for SedimentPhysics {
    type Node = SedimentNode;
    type Element = SedimentElement;
    type Correction = ();

    fn name(&self) -> &'static str {
        "sediment"
    }

    fn variable_names(&self) -> [&'static str; 2] {
        ["concentration", "bed_change"]
    }

    fn wetting(&self) -> Option<Watt> {
        Some(self.watt)
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, _mesh_node: &MeshNode) -> SedimentNode {
        SedimentNode::default()
    }

    fn bind(&self, node: &mut SedimentNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::Concentration => node.concentration_bc = Some(function),
            PhysicsKey::BedLevel => node.bed_bc = Some(function),
            other => warn!("sediment: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &SedimentNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.depth
    }

    fn level(&self, node: &SedimentNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.eta
    }

    fn initial_condition(&self, node: &mut SedimentNode, _mesh_node: &MeshNode, _t0: f64) {
        node.dof.q[0] = node.dof.q[0].max(0.0);
    }

    fn set_boundary_condition(&self, node: &mut SedimentNode, _mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        if let Some(f) = &node.concentration_bc {
            node.dof.prescribe(0, f, t);
        }
        if let Some(f) = &node.bed_bc {
            node.dof.prescribe(1, f, t);
        }
        node.dof.set_wlambda(self.watt.wlambda(node.hydro.depth));

        let tau = self.bed_shear(&node.hydro, &node.waves);
        node.bed_shear = tau;
        node.erosion = node.dof.wlambda * erosion_rate(self.erosion_constant, tau, self.tau_ce);
        node.deposition = deposition_rate(
            self.settling_velocity,
            node.concentration(),
            tau,
            self.tau_cd,
        );
        node.bed_load = self.bed_load_vector(&node.hydro, tau);
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, SedimentNode>,
        element: &mut SedimentElement,
    ) -> ElementTerms<2> {
        let tri = ctx.triangle;
        let u_m = ctx.mean(|n| n.hydro.u);
        let v_m = ctx.mean(|n| n.hydro.v);
        let (dc_dx, dc_dy) = ctx.gradient(SedimentNode::concentration);
        let (dqx_dx, _) = ctx.gradient(|n| n.bed_load.0);
        let (_, dqy_dy) = ctx.gradient(|n| n.bed_load.1);
        let div_qb = dqx_dx + dqy_dy;
        let exner = self.morphological_factor / (1.0 - self.porosity);

        let mut t = ElementTerms::advective(u_m, v_m);
        t.jacobian_x[1][1] = 0.0;
        t.jacobian_y[1][1] = 0.0;
        t.diffusivity = [self.diffusivity, 0.0];
        for j in 0..3 {
            let n = ctx.nodes[j];
            let h_eff = ctx.depths[j].max(self.watt.threshold);
            let exchange = n.erosion - n.deposition;
            t.terms[j][0] = ctx.lambda[j] * (u_m * dc_dx + v_m * dc_dy) - exchange / h_eff;
            t.terms[j][1] = exner * (exchange / self.rho_sediment + div_qb);
        }
        if self.diffusivity > 0.0 {
            t.dt_limit = 0.25 * tri.min_height().powi(2) / self.diffusivity;
        }

        *element = SedimentElement {
            u: u_m,
            v: v_m,
            depth: ctx.mean_depth(),
            bed_shear: ctx.mean(|n| n.bed_shear),
            iwatt: ctx.wetness.iwatt,
            elementsize: 0.0,
            tau: 0.0,
        };
        t
    }

    fn record_stabilization(&self, element: &mut SedimentElement, elementsize: f64, tau: f64) {
        element.elementsize = elementsize;
        element.tau = tau;
    }

    fn post_update(&self, node: &mut SedimentNode, _mesh_node: &MeshNode) {
        if node.dof.q[0] < 0.0 {
            node.dof.q[0] = 0.0;
        }
    }
}

impl FemModel<SedimentPhysics, 2> {
    /// Suspended concentration per node (kg/m³).
    pub fn concentrations(&self) -> Vec<f64> {
        self.nodes().iter().map(SedimentNode::concentration).collect()
    }

    /// Accumulated bed-level change per node (m).
    pub fn bed_changes(&self) -> Vec<f64> {
        self.nodes().iter().map(SedimentNode::bed_change).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriMesh;
    use crate::physics::HydroField;
    use std::sync::Arc;

    fn model() -> FemModel<SedimentPhysics, 2> {
        let mesh = Arc::new(
            TriMesh::uniform_rectangle(0.0, 40.0, 0.0, 40.0, 4, 4).with_bathymetry(|_, _| -3.0),
        );
        let physics = SedimentPhysics::new(&SedimentConfig::default(), 9.81);
        let mut m = FemModel::without_boundaries(physics, mesh.clone());
        m.set_hydro(&HydroField::still_water(&mesh, 0.0)).unwrap();
        m
    }

    #[test]
    fn test_grain_properties() {
        let p = SedimentPhysics::new(&SedimentConfig::default(), 9.81);
        assert!(p.settling_velocity() > 0.01 && p.settling_velocity() < 0.05);
        assert!(p.critical_shields() > 0.03 && p.critical_shields() < 0.1);
    }

    #[test]
    fn test_strong_shear_erodes_bed() {
        let mut m = model();
        m.initialize_with(|_, _, n| n.hydro.bottom_shear = 1.0);
        m.apply_boundary_conditions();
        assert!(m.node(0).erosion > 0.0);
        assert_eq!(m.node(0).deposition, 0.0);
        m.assemble();
        let i = m.mesh().nearest_node(20.0, 20.0);
        let r = m.residual(i);
        assert!(r[0] > 0.0, "concentration grows");
        assert!(r[1] < 0.0, "bed lowers");
    }

    #[test]
    fn test_still_water_deposits() {
        let mut m = model();
        m.initialize_with(|_, _, n| n.dof.q[0] = 0.1);
        m.apply_boundary_conditions();
        m.assemble();
        let i = m.mesh().nearest_node(20.0, 20.0);
        let r = m.residual(i);
        assert!(r[0] < 0.0, "concentration settles");
        assert!(r[1] > 0.0, "bed rises");
    }

    #[test]
    fn test_bed_load_follows_flow() {
        let p = SedimentPhysics::new(&SedimentConfig::default(), 9.81);
        let hydro = HydroState {
            u: 0.0,
            v: -1.5,
            depth: 2.0,
            wlambda: 1.0,
            ..HydroState::default()
        };
        let (qx, qy) = p.bed_load_vector(&hydro, 5.0);
        assert_eq!(qx, 0.0);
        assert!(qy < 0.0);
        assert_eq!(p.bed_load_vector(&hydro, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_waves_raise_bed_shear() {
        let p = SedimentPhysics::new(&SedimentConfig::default(), 9.81);
        let hydro = HydroState {
            u: 0.5,
            bottom_shear: 0.3,
            ..HydroState::default()
        };
        let calm = p.bed_shear(&hydro, &WaveState::default());
        let waves = WaveState {
            orbital_velocity: 0.4,
            period: 6.0,
            ..WaveState::default()
        };
        assert_eq!(calm, 0.3);
        assert!(p.bed_shear(&hydro, &waves) > calm);
    }

    #[test]
    fn test_concentration_never_negative() {
        let mut m = model();
        m.initialize_with(|_, _, n| n.dof.q[0] = 1.0e-9);
        m.apply_boundary_conditions();
        for _ in 0..5 {
            m.time_step(1000.0).unwrap();
        }
        assert!(m.concentrations().iter().all(|&c| c >= 0.0));
    }
}
