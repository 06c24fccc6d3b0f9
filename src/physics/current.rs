//! Depth-averaged shallow-water currents.
//!
//! Unknowns per node: water level η and depth-averaged velocity (u, v).
//!
//! ```text
//! ∂η/∂t + ∂(Hu)/∂x + ∂(Hv)/∂y = 0
//! ∂u/∂t + λ(ū·∇u) + g ∂η/∂x − f v + c_f|U|u/H − τ_x/(ρH) + gH/(2ρ) ∂ρ/∂x = 0
//! ∂v/∂t + λ(ū·∇v) + g ∂η/∂y + f u + c_f|U|v/H − τ_y/(ρH) + gH/(2ρ) ∂ρ/∂y = 0
//! ```
//!
//! τ collects wind stress and the wave radiation force. The level gradient
//! is limited near the shoreline, and velocities in drying nodes are damped
//! with `(1 − λ)·u / T_dry`. Nodes on a weir crest take their velocity
//! from the weir discharge.

use std::sync::Arc;

use log::{info, warn};

use super::coupling::{HydroField, HydroState, WaveCoupled, WaveState, couple_nodes};
use super::traits::{
    Dof, ElementContext, ElementTerms, FemPhysics, NodeState, extrapolation_increment,
};
use crate::boundary::{BoundaryConditionTable, PhysicsKey, SharedFunction};
use crate::config::CurrentConfig;
use crate::error::FemError;
use crate::mesh::{MeshNode, TriMesh};
use crate::solver::{FemModel, Watt};
use crate::source::{
    BottomFriction, DragCoefficient, EddyViscosity, EquationOfState, FlowGradients,
    WEIR_FRICTION, Weir,
};
use crate::types::NodeIndex;

const KEYS: &[PhysicsKey] = &[
    PhysicsKey::WaterLevel,
    PhysicsKey::VelocityU,
    PhysicsKey::VelocityV,
    PhysicsKey::WindU,
    PhysicsKey::WindV,
];

/// Current model record of one node.
#[derive(Clone, Debug)]
pub struct CurrentNode {
    pub dof: Dof<3>,
    pub eta_bc: Option<SharedFunction>,
    pub u_bc: Option<SharedFunction>,
    pub v_bc: Option<SharedFunction>,
    pub wind_u: Option<SharedFunction>,
    pub wind_v: Option<SharedFunction>,
    /// Bottom elevation including morphological change (m)
    pub z: f64,
    /// Accumulated bed-level change from the sediment model (m)
    pub bed_change: f64,
    /// Water depth η − z (m)
    pub depth: f64,
    /// Roughness for the selected friction law
    pub roughness: f64,
    /// Friction coefficient
    pub cf: f64,
    /// Density (kg/m³)
    pub rho: f64,
    /// 10 m wind (m/s)
    pub wind: (f64, f64),
    /// Surface stress (N/m²)
    pub wind_stress: (f64, f64),
    /// Bed shear stress (N/m²)
    pub bottom_shear: f64,
    pub temperature: f64,
    pub salinity: f64,
    /// Suspended sediment (kg/m³)
    pub concentration: f64,
    pub waves: WaveState,
    /// Index of the weir this node lies on
    pub weir: Option<usize>,
}

impl CurrentNode {
    #[inline]
    pub fn eta(&self) -> f64 {
        self.dof.q[0]
    }

    #[inline]
    pub fn u(&self) -> f64 {
        self.dof.q[1]
    }

    #[inline]
    pub fn v(&self) -> f64 {
        self.dof.q[2]
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        (self.u() * self.u() + self.v() * self.v()).sqrt()
    }
}

impl NodeState<3> for CurrentNode {
    fn dof(&self) -> &Dof<3> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<3> {
        &mut self.dof
    }
}

impl WaveCoupled for CurrentNode {
    fn waves_mut(&mut self) -> &mut WaveState {
        &mut self.waves
    }
}

/// Element means of the last assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurrentElement {
    pub u: f64,
    pub v: f64,
    pub depth: f64,
    pub gradients: FlowGradients,
    pub eddy_viscosity: f64,
    /// Number of nodes below the wetting threshold
    pub iwatt: usize,
    pub elementsize: f64,
    pub tau: f64,
}

/// Result of the neighbour pass at one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentCorrection {
    pub relax: [f64; 3],
    pub weir_velocity: Option<(f64, f64)>,
}

/// Shallow-water current strategy.
#[derive(Clone, Debug)]
pub struct CurrentPhysics {
    g: f64,
    watt: Watt,
    coriolis: f64,
    friction: BottomFriction,
    roughness: f64,
    drag: DragCoefficient,
    eddy: EddyViscosity,
    drying_time_scale: f64,
    eos: EquationOfState,
    baroclinic: bool,
    initial_level: f64,
    salinity: f64,
    temperature: f64,
    weirs: Vec<Weir>,
}

impl CurrentPhysics {
    pub fn new(config: &CurrentConfig) -> Self {
        let weirs = config
            .weirs
            .iter()
            .map(|w| {
                Weir::new(w.name.clone(), w.nodes.clone(), w.crest_level, w.normal)
                    .with_discharge_coefficient(w.discharge_coefficient)
            })
            .collect();
        Self {
            g: config.gravity,
            watt: Watt::new(config.watt),
            coriolis: config.coriolis_parameter(),
            friction: BottomFriction::new(config.friction_law, config.gravity, config.watt),
            roughness: config.roughness(),
            drag: config.drag,
            eddy: EddyViscosity {
                smagorinsky: config.smagorinsky,
                elder: config.elder,
                battjes: config.battjes,
                ..EddyViscosity::default()
            },
            drying_time_scale: config.drying_time_scale,
            eos: EquationOfState::new(),
            baroclinic: config.baroclinic,
            initial_level: config.initial_level,
            salinity: config.salinity,
            temperature: config.temperature,
            weirs,
        }
    }

    pub fn gravity(&self) -> f64 {
        self.g
    }

    pub fn watt(&self) -> Watt {
        self.watt
    }

    pub fn coriolis(&self) -> f64 {
        self.coriolis
    }

    pub fn weirs(&self) -> &[Weir] {
        &self.weirs
    }

    /// Velocity on a weir crest node from the levels on either side.
    ///
    /// Neighbours behind the crest (against the normal) give the nominal
    /// upstream level, those in front the downstream level; a side without
    /// neighbours takes the node's own level.
    fn weir_velocity(
        &self,
        i: usize,
        weir: &Weir,
        nodes: &[CurrentNode],
        mesh: &TriMesh,
    ) -> (f64, f64) {
        let me = mesh.node(i);
        let (nx, ny) = weir.normal;
        let (mut up, mut n_up, mut down, mut n_down) = (0.0, 0usize, 0.0, 0usize);
        for &j in &me.neighbours {
            if nodes[j].weir.is_some() {
                continue;
            }
            let mj = mesh.node(j);
            let side = (mj.x - me.x) * nx + (mj.y - me.y) * ny;
            if side < 0.0 {
                up += nodes[j].eta();
                n_up += 1;
            } else if side > 0.0 {
                down += nodes[j].eta();
                n_down += 1;
            }
        }
        let own = nodes[i].eta();
        let level_a = if n_up > 0 { up / n_up as f64 } else { own };
        let level_b = if n_down > 0 { down / n_down as f64 } else { own };

        let q = weir.discharge(level_a, level_b, self.g);
        if q == 0.0 {
            return (0.0, 0.0);
        }
        let depth = weir.crest_depth(level_a, level_b).max(self.watt.threshold);
        (q / depth * nx, q / depth * ny)
    }
}

impl FemPhysics<3> for CurrentPhysics {
    type Node = CurrentNode;
    type Element = CurrentElement;
    type Correction = CurrentCorrection;

    fn name(&self) -> &'static str {
        "current"
    }

    fn variable_names(&self) -> [&'static str; 3] {
        ["eta", "u", "v"]
    }

    fn wetting(&self) -> Option<Watt> {
        Some(self.watt)
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, mesh_node: &MeshNode) -> CurrentNode {
        let eta = self.initial_level.max(mesh_node.z);
        let depth = eta - mesh_node.z;
        let mut dof = Dof::default();
        dof.q[0] = eta;
        dof.set_wlambda(self.watt.wlambda(depth));
        CurrentNode {
            dof,
            eta_bc: None,
            u_bc: None,
            v_bc: None,
            wind_u: None,
            wind_v: None,
            z: mesh_node.z,
            bed_change: 0.0,
            depth,
            roughness: self.roughness,
            cf: 0.0,
            rho: self.eos.density(self.temperature, self.salinity, 0.0),
            wind: (0.0, 0.0),
            wind_stress: (0.0, 0.0),
            bottom_shear: 0.0,
            temperature: self.temperature,
            salinity: self.salinity,
            concentration: 0.0,
            waves: WaveState::default(),
            weir: None,
        }
    }

    fn bind(&self, node: &mut CurrentNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::WaterLevel => node.eta_bc = Some(function),
            PhysicsKey::VelocityU => node.u_bc = Some(function),
            PhysicsKey::VelocityV => node.v_bc = Some(function),
            PhysicsKey::WindU => node.wind_u = Some(function),
            PhysicsKey::WindV => node.wind_v = Some(function),
            other => warn!("current: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &CurrentNode, mesh_node: &MeshNode) -> f64 {
        node.eta() - (mesh_node.z + node.bed_change)
    }

    fn level(&self, node: &CurrentNode, _mesh_node: &MeshNode) -> f64 {
        node.eta()
    }

    fn initial_condition(&self, node: &mut CurrentNode, mesh_node: &MeshNode, _t0: f64) {
        // Levels below the bottom start dry at the bottom
        let z = mesh_node.z + node.bed_change;
        if node.dof.q[0] < z {
            node.dof.q[0] = z;
        }
    }

    fn set_boundary_condition(&self, node: &mut CurrentNode, mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        let bound = [&node.eta_bc, &node.u_bc, &node.v_bc];
        for (k, f) in bound.iter().enumerate() {
            if let Some(f) = f {
                node.dof.prescribe(k, f, t);
            }
        }
        let n_bound = bound.iter().filter(|f| f.is_some()).count();
        node.dof.extrapolating = n_bound > 0 && n_bound < 3;

        if let Some(f) = &node.wind_u {
            node.wind.0 = f.value_at(t);
        }
        if let Some(f) = &node.wind_v {
            node.wind.1 = f.value_at(t);
        }

        node.z = mesh_node.z + node.bed_change;
        node.depth = node.eta() - node.z;
        node.dof.set_wlambda(self.watt.wlambda(node.depth));

        node.wind_stress = self.drag.stress(node.wind.0, node.wind.1);
        node.rho = self
            .eos
            .density(node.temperature, node.salinity, node.concentration);

        let speed = node.speed();
        node.cf = if node.weir.is_some() {
            WEIR_FRICTION
        } else {
            self.friction.coefficient(node.depth, speed, node.roughness)
        };
        node.bottom_shear = node.rho * node.cf * speed * speed;
    }

    fn neighbour_correction(
        &self,
        i: usize,
        nodes: &[CurrentNode],
        mesh: &TriMesh,
        _t: f64,
    ) -> Option<CurrentCorrection> {
        let node = &nodes[i];
        if let Some(w) = node.weir {
            return Some(CurrentCorrection {
                relax: [0.0; 3],
                weir_velocity: Some(self.weir_velocity(i, &self.weirs[w], nodes, mesh)),
            });
        }
        if !node.dof.extrapolating {
            return None;
        }
        // Weir nodes are excluded so that their override does not feed back
        let wet = |n: &CurrentNode| n.dof.wlambda >= 1.0 && n.weir.is_none();
        let mut relax = [0.0; 3];
        for (k, bound) in [&node.eta_bc, &node.u_bc, &node.v_bc].iter().enumerate() {
            if bound.is_none() {
                relax[k] = extrapolation_increment(i, k, nodes, mesh, wet).unwrap_or(0.0);
            }
        }
        Some(CurrentCorrection {
            relax,
            weir_velocity: None,
        })
    }

    fn apply_correction(&self, node: &mut CurrentNode, correction: CurrentCorrection) {
        node.dof.relax = correction.relax;
        if let Some((u, v)) = correction.weir_velocity {
            for (k, value) in [(1, u), (2, v)] {
                node.dof.q[k] = value;
                node.dof.dqdt[k] = 0.0;
                node.dof.fixed[k] = true;
            }
            node.cf = WEIR_FRICTION;
            node.bottom_shear = node.rho * node.cf * (u * u + v * v);
        }
    }

    fn dry_leak(&self, node: &CurrentNode, _mesh_node: &MeshNode) -> [f64; 3] {
        [
            0.0,
            node.u() / self.drying_time_scale,
            node.v() / self.drying_time_scale,
        ]
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, CurrentNode>,
        element: &mut CurrentElement,
    ) -> ElementTerms<3> {
        let g = self.g;
        let tri = ctx.triangle;
        let u = ctx.gather(CurrentNode::u);
        let v = ctx.gather(CurrentNode::v);
        let h = ctx.depths.map(|d| d.max(0.0));

        let u_m = u.iter().sum::<f64>() / 3.0;
        let v_m = v.iter().sum::<f64>() / 3.0;
        let h_m = ctx.mean_depth();

        let (deta_dx, deta_dy) = ctx.level_gradient();
        let (du_dx, du_dy) = tri.gradient(u);
        let (dv_dx, dv_dy) = tri.gradient(v);
        let (dhu_dx, _) = tri.gradient([0, 1, 2].map(|j| h[j] * u[j]));
        let (_, dhv_dy) = tri.gradient([0, 1, 2].map(|j| h[j] * v[j]));
        let divergence = dhu_dx + dhv_dy;

        let rho_m = ctx.mean(|n| n.rho);
        let (bx, by) = if self.baroclinic {
            let (drho_dx, drho_dy) = ctx.gradient(|n| n.rho);
            let c = g * h_m / (2.0 * rho_m);
            (c * drho_dx, c * drho_dy)
        } else {
            (0.0, 0.0)
        };

        let gradients = FlowGradients {
            du_dx,
            du_dy,
            dv_dx,
            dv_dy,
        };
        let nu = self.eddy.evaluate(
            ctx.area(),
            &gradients,
            h_m,
            ctx.mean(|n| n.cf),
            (u_m * u_m + v_m * v_m).sqrt(),
            ctx.mean(|n| n.waves.dissipation),
            rho_m,
        );

        let f = self.coriolis;
        let mut t = ElementTerms::zeros();
        for j in 0..3 {
            let n = ctx.nodes[j];
            let h_eff = h[j].max(self.watt.threshold);
            let speed = (u[j] * u[j] + v[j] * v[j]).sqrt();
            let friction = n.cf * speed / h_eff;
            let rho_h = n.rho * h_eff;
            let damping = n.dof.w1_lambda / self.drying_time_scale;
            let lambda = ctx.lambda[j];

            t.terms[j][0] = divergence;
            t.terms[j][1] = lambda * (u_m * du_dx + v_m * du_dy) + g * deta_dx - f * v[j]
                + friction * u[j]
                - (n.wind_stress.0 + n.waves.force.0) / rho_h
                + bx
                + damping * u[j];
            t.terms[j][2] = lambda * (u_m * dv_dx + v_m * dv_dy) + g * deta_dy + f * u[j]
                + friction * v[j]
                - (n.wind_stress.1 + n.waves.force.1) / rho_h
                + by
                + damping * v[j];
        }

        t.velocity = (u_m, v_m);
        t.wave_speed = (g * h_m).sqrt();
        t.jacobian_x = [[u_m, h_m, 0.0], [g, u_m, 0.0], [0.0, 0.0, u_m]];
        t.jacobian_y = [[v_m, 0.0, h_m], [0.0, v_m, 0.0], [g, 0.0, v_m]];
        t.diffusivity = [0.0, nu, nu];

        *element = CurrentElement {
            u: u_m,
            v: v_m,
            depth: h_m,
            gradients,
            eddy_viscosity: nu,
            iwatt: ctx.wetness.iwatt,
            elementsize: 0.0,
            tau: 0.0,
        };
        t
    }

    fn record_stabilization(&self, element: &mut CurrentElement, elementsize: f64, tau: f64) {
        element.elementsize = elementsize;
        element.tau = tau;
    }
}

impl FemModel<CurrentPhysics, 3> {
    /// Build the current model, binding its boundary entries and weirs.
    pub fn current(
        config: &CurrentConfig,
        mesh: Arc<TriMesh>,
        table: &mut BoundaryConditionTable,
    ) -> Result<Self, FemError> {
        let physics = CurrentPhysics::new(config);
        let n_nodes = mesh.n_nodes();
        let mut weir_of = vec![None; n_nodes];
        for (w, weir) in physics.weirs().iter().enumerate() {
            for &n in &weir.nodes {
                if n >= n_nodes {
                    return Err(FemError::BoundaryNodeOutOfRange {
                        node: NodeIndex::new(n),
                        key: format!("weir {}", weir.name),
                        n_nodes,
                    });
                }
                weir_of[n] = Some(w);
            }
            info!(
                "current: weir {} on {} nodes, crest at {} m",
                weir.name,
                weir.nodes.len(),
                weir.crest_level
            );
        }
        let mut model = FemModel::new(physics, mesh, table)?;
        model.initialize_with(|i, _, node| node.weir = weir_of[i]);
        Ok(model)
    }

    /// Hydrodynamic state for the other models.
    pub fn hydro_field(&self) -> HydroField {
        let nodes = self
            .nodes()
            .iter()
            .map(|n| HydroState {
                eta: n.eta(),
                u: n.u(),
                v: n.v(),
                depth: (n.eta() - n.z).max(0.0),
                wlambda: n.dof.wlambda,
                bottom_shear: n.bottom_shear,
                density: n.rho,
                cf: n.cf,
            })
            .collect();
        HydroField { nodes }
    }

    /// Water temperature per node (°C).
    pub fn set_temperature(&mut self, values: &[f64]) -> Result<(), FemError> {
        couple_nodes(self, "temperature", values, |n, &t| n.temperature = t)
    }

    /// Suspended sediment concentration per node (kg/m³).
    pub fn set_concentration(&mut self, values: &[f64]) -> Result<(), FemError> {
        couple_nodes(self, "concentration", values, |n, &c| n.concentration = c)
    }

    /// Accumulated bed-level change per node (m).
    pub fn set_bed_change(&mut self, values: &[f64]) -> Result<(), FemError> {
        couple_nodes(self, "bed change", values, |n, &dz| n.bed_change = dz)
    }

    /// Total water volume over the wet area (m³).
    pub fn water_volume(&self) -> f64 {
        self.nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.eta() - n.z).max(0.0) * self.open_mass(i))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Constant, shared};
    use crate::source::FrictionLaw;
    use approx::assert_relative_eq;

    fn flat_mesh(n: usize) -> Arc<TriMesh> {
        Arc::new(
            TriMesh::uniform_rectangle(0.0, 100.0, 0.0, 100.0, n, n).with_bathymetry(|_, _| -5.0),
        )
    }

    fn model(config: &CurrentConfig, mesh: Arc<TriMesh>) -> FemModel<CurrentPhysics, 3> {
        FemModel::current(config, mesh, &mut BoundaryConditionTable::new()).unwrap()
    }

    #[test]
    fn test_still_water_has_no_residual() {
        let mut m = model(&CurrentConfig::default(), flat_mesh(4));
        m.apply_boundary_conditions();
        let (dt, dry) = m.assemble();
        assert_eq!(dry, 0);
        assert!(dt.is_finite() && dt > 0.0);
        for i in 0..m.mesh().n_nodes() {
            for r in m.residual(i) {
                assert!(r.abs() < 1e-12, "node {i}: {r}");
            }
        }
    }

    #[test]
    fn test_coriolis_turns_uniform_flow() {
        let config = CurrentConfig {
            coriolis: 1.0e-4,
            friction_law: FrictionLaw::Strickler,
            strickler_kst: 1.0e6,
            ..CurrentConfig::default()
        };
        let mesh = flat_mesh(4);
        let mut m = model(&config, mesh.clone());
        m.initialize_with(|_, _, n| n.dof.q[1] = 1.0);
        m.apply_boundary_conditions();
        m.assemble();
        // interior node
        let i = mesh.nearest_node(50.0, 50.0);
        assert!(!mesh.node(i).on_boundary);
        assert_relative_eq!(m.residual(i)[2], -1.0e-4, epsilon = 1e-9);
    }

    #[test]
    fn test_wind_stress_accelerates_flow() {
        let mesh = flat_mesh(2);
        let mut table = BoundaryConditionTable::new();
        for i in 0..mesh.n_nodes() {
            table.push(i, PhysicsKey::WindU, shared(Constant(10.0)));
        }
        let mut m = FemModel::current(&CurrentConfig::default(), mesh, &mut table).unwrap();
        assert!(table.is_empty());
        m.apply_boundary_conditions();
        assert!(m.node(0).wind_stress.0 > 0.0);
        m.assemble();
        let i = m.mesh().nearest_node(50.0, 50.0);
        assert!(m.residual(i)[1] > 0.0);
    }

    #[test]
    fn test_dirichlet_level_extrapolates_velocity() {
        let mesh = flat_mesh(2);
        let mut table = BoundaryConditionTable::new();
        table.push(0, PhysicsKey::WaterLevel, shared(Constant(0.5)));
        let mut m = FemModel::current(&CurrentConfig::default(), mesh, &mut table).unwrap();
        m.initialize_with(|i, _, n| {
            if i != 0 {
                n.dof.q[1] = 1.0;
            }
        });
        m.apply_boundary_conditions();
        let node = m.node(0);
        assert_eq!(node.eta(), 0.5);
        assert!(node.dof.fixed[0] && !node.dof.fixed[1]);
        assert!(node.dof.extrapolating);
        assert_relative_eq!(node.dof.relax[1], 0.1, epsilon = 1e-14);
        assert_eq!(node.dof.relax[0], 0.0);
    }

    #[test]
    fn test_weir_overrides_velocity_and_friction() {
        // Crest along x = 50
        let mesh = Arc::new(
            TriMesh::uniform_rectangle(0.0, 100.0, 0.0, 20.0, 2, 1).with_bathymetry(|_, _| -2.0),
        );
        let crest: Vec<usize> = (0..mesh.n_nodes())
            .filter(|&i| (mesh.node(i).x - 50.0).abs() < 1e-9)
            .collect();
        let config = CurrentConfig {
            weirs: vec![Weir::new("sill", crest.clone(), -1.0, (1.0, 0.0))],
            ..CurrentConfig::default()
        };
        let mut m = model(&config, mesh.clone());
        m.initialize_with(|_, mn, n| n.dof.q[0] = if mn.x < 50.0 { 0.0 } else { -0.8 });
        m.apply_boundary_conditions();
        let first: Vec<CurrentNode> = m.nodes().to_vec();
        for &i in &crest {
            let n = m.node(i);
            assert!(n.u() > 0.0, "flow goes downstream");
            assert_eq!(n.v(), 0.0);
            assert_eq!(n.cf, WEIR_FRICTION);
            assert!(n.dof.fixed[1]);
        }
        m.apply_boundary_conditions();
        for (a, b) in first.iter().zip(m.nodes()) {
            assert_eq!(a.dof, b.dof);
            assert_eq!(a.bottom_shear, b.bottom_shear);
        }
    }

    #[test]
    fn test_weir_node_out_of_range() {
        let config = CurrentConfig {
            weirs: vec![Weir::new("bad", vec![999], 0.0, (1.0, 0.0))],
            ..CurrentConfig::default()
        };
        let err = FemModel::current(&config, flat_mesh(2), &mut BoundaryConditionTable::new());
        assert!(matches!(err, Err(FemError::BoundaryNodeOutOfRange { .. })));
    }

    #[test]
    fn test_hydro_field_export() {
        let mut m = model(&CurrentConfig::default(), flat_mesh(2));
        m.apply_boundary_conditions();
        let field = m.hydro_field();
        assert_eq!(field.len(), m.mesh().n_nodes());
        assert_relative_eq!(field.nodes[0].depth, 5.0);
        assert_eq!(field.nodes[0].wlambda, 1.0);
        assert!(m.set_temperature(&[1.0]).is_err());
        assert_relative_eq!(m.water_volume(), 5.0 * 100.0 * 100.0, epsilon = 1e-6);
    }
}
