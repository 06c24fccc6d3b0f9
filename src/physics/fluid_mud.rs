//! Fluid-mud layer below the water column.
//!
//! Unknowns per node: mud thickness `m` and mud velocity (u, v).
//!
//! ```text
//! ∂m/∂t + ∇·(m u) = 0
//! ∂u/∂t + λ(ū·∇u) + g' ∇(z + m) + (ρ_w/ρ_m) g ∇η + (τ_b − τ_i)/(ρ_m m) = 0
//! ```
//!
//! with reduced gravity `g' = g (ρ_m − ρ_w)/ρ_m`. The bed stress τ_b is a
//! Bingham law (yield stress plus viscous drag across the layer), the
//! interfacial stress τ_i a quadratic drag towards the water velocity.

use log::warn;

use super::coupling::{HydroCoupled, HydroState};
use super::traits::{
    Dof, ElementContext, ElementTerms, FemPhysics, NodeState, extrapolation_increment,
};
use crate::boundary::{PhysicsKey, SharedFunction};
use crate::config::FluidMudConfig;
use crate::mesh::{MeshNode, TriMesh};
use crate::solver::{FemModel, Watt};

const KEYS: &[PhysicsKey] = &[
    PhysicsKey::MudThickness,
    PhysicsKey::MudVelocityU,
    PhysicsKey::MudVelocityV,
];

/// Velocity regularizing the direction of the yield stress (m/s).
const YIELD_REGULARIZATION: f64 = 1.0e-3;

/// Damping time of mud velocity where the layer vanishes (s).
const MUD_DRYING_TIME: f64 = 60.0;

#[derive(Clone, Debug, Default)]
pub struct FluidMudNode {
    pub dof: Dof<3>,
    pub thickness_bc: Option<SharedFunction>,
    pub u_bc: Option<SharedFunction>,
    pub v_bc: Option<SharedFunction>,
    /// Bed elevation below the mud (m)
    pub z: f64,
    pub hydro: HydroState,
    /// Bed stress (N/m²)
    pub bed_stress: (f64, f64),
    /// Interfacial stress exerted by the water (N/m²)
    pub interfacial_stress: (f64, f64),
}

impl FluidMudNode {
    #[inline]
    pub fn thickness(&self) -> f64 {
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
}

impl NodeState<3> for FluidMudNode {
    fn dof(&self) -> &Dof<3> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<3> {
        &mut self.dof
    }
}

impl HydroCoupled for FluidMudNode {
    fn hydro(&self) -> &HydroState {
        &self.hydro
    }

    fn hydro_mut(&mut self) -> &mut HydroState {
        &mut self.hydro
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluidMudElement {
    pub u: f64,
    pub v: f64,
    pub thickness: f64,
    pub iwatt: usize,
    pub elementsize: f64,
    pub tau: f64,
}

/// Fluid-mud strategy.
#[derive(Clone, Debug)]
pub struct FluidMudPhysics {
    g: f64,
    watt: Watt,
    rho_mud: f64,
    yield_stress: f64,
    bingham_viscosity: f64,
    interfacial_friction: f64,
}

impl FluidMudPhysics {
    pub fn new(config: &FluidMudConfig, g: f64) -> Self {
        Self {
            g,
            watt: Watt::new(config.watt),
            rho_mud: config.rho_mud,
            yield_stress: config.yield_stress,
            bingham_viscosity: config.bingham_viscosity,
            interfacial_friction: config.interfacial_friction,
        }
    }

    /// Reduced gravity for water of density `rho_water`.
    #[inline]
    pub fn reduced_gravity(&self, rho_water: f64) -> f64 {
        self.g * (self.rho_mud - rho_water) / self.rho_mud
    }

    /// Bingham bed stress of a layer of thickness `m` moving with (u, v).
    pub fn bingham_stress(&self, m: f64, u: f64, v: f64) -> (f64, f64) {
        let speed = (u * u + v * v).sqrt();
        if speed == 0.0 {
            return (0.0, 0.0);
        }
        let m_eff = m.max(self.watt.threshold);
        let viscous = 3.0 * self.bingham_viscosity * speed / m_eff;
        let magnitude = self.yield_stress * speed / (speed + YIELD_REGULARIZATION) + viscous;
        (magnitude * u / speed, magnitude * v / speed)
    }
}

impl FemPhysics<3> for FluidMudPhysics {
    type Node = FluidMudNode;
    type Element = FluidMudElement;
    type Correction = [f64; 3];

    fn name(&self) -> &'static str {
        "fluid_mud"
    }

    fn variable_names(&self) -> [&'static str; 3] {
        ["thickness", "u", "v"]
    }

    fn wetting(&self) -> Option<Watt> {
        Some(self.watt)
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, mesh_node: &MeshNode) -> FluidMudNode {
        let mut dof = Dof::default();
        dof.set_wlambda(0.0);
        FluidMudNode {
            dof,
            z: mesh_node.z,
            ..FluidMudNode::default()
        }
    }

    fn bind(&self, node: &mut FluidMudNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::MudThickness => node.thickness_bc = Some(function),
            PhysicsKey::MudVelocityU => node.u_bc = Some(function),
            PhysicsKey::MudVelocityV => node.v_bc = Some(function),
            other => warn!("fluid_mud: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &FluidMudNode, _mesh_node: &MeshNode) -> f64 {
        node.thickness()
    }

    fn level(&self, node: &FluidMudNode, _mesh_node: &MeshNode) -> f64 {
        node.z + node.thickness()
    }

    fn initial_condition(&self, node: &mut FluidMudNode, _mesh_node: &MeshNode, _t0: f64) {
        node.dof.q[0] = node.dof.q[0].max(0.0);
    }

    fn set_boundary_condition(&self, node: &mut FluidMudNode, mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        let bound = [&node.thickness_bc, &node.u_bc, &node.v_bc];
        for (k, f) in bound.iter().enumerate() {
            if let Some(f) = f {
                node.dof.prescribe(k, f, t);
            }
        }
        let n_bound = bound.iter().filter(|f| f.is_some()).count();
        node.dof.extrapolating = n_bound > 0 && n_bound < 3;

        node.z = mesh_node.z;
        node.dof.set_wlambda(self.watt.wlambda(node.thickness()));

        let (u, v) = (node.u(), node.v());
        node.bed_stress = self.bingham_stress(node.thickness(), u, v);
        let (du, dv) = (node.hydro.u - u, node.hydro.v - v);
        let slip = (du * du + dv * dv).sqrt();
        let c = node.hydro.density * self.interfacial_friction * slip * node.hydro.wlambda;
        node.interfacial_stress = (c * du, c * dv);
    }

    fn neighbour_correction(
        &self,
        i: usize,
        nodes: &[FluidMudNode],
        mesh: &TriMesh,
        _t: f64,
    ) -> Option<[f64; 3]> {
        let node = &nodes[i];
        if !node.dof.extrapolating {
            return None;
        }
        let mut relax = [0.0; 3];
        for (k, bound) in [&node.thickness_bc, &node.u_bc, &node.v_bc].iter().enumerate() {
            if bound.is_none() {
                relax[k] = extrapolation_increment(i, k, nodes, mesh, |n: &FluidMudNode| {
                    n.dof.wlambda >= 1.0
                })
                .unwrap_or(0.0);
            }
        }
        Some(relax)
    }

    fn apply_correction(&self, node: &mut FluidMudNode, relax: [f64; 3]) {
        node.dof.relax = relax;
    }

    fn dry_leak(&self, node: &FluidMudNode, _mesh_node: &MeshNode) -> [f64; 3] {
        [0.0, node.u() / MUD_DRYING_TIME, node.v() / MUD_DRYING_TIME]
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, FluidMudNode>,
        element: &mut FluidMudElement,
    ) -> ElementTerms<3> {
        let tri = ctx.triangle;
        let m = ctx.depths.map(|d| d.max(0.0));
        let u = ctx.gather(FluidMudNode::u);
        let v = ctx.gather(FluidMudNode::v);
        let u_m = u.iter().sum::<f64>() / 3.0;
        let v_m = v.iter().sum::<f64>() / 3.0;
        let m_m = ctx.mean_depth();

        let rho_w = ctx.mean(|n| n.hydro.density);
        let g_red = self.reduced_gravity(rho_w);
        let (ds_dx, ds_dy) = ctx.level_gradient();
        let (deta_dx, deta_dy) = ctx.gradient(|n| n.hydro.eta);
        let water = rho_w / self.rho_mud * self.g;
        let (du_dx, du_dy) = tri.gradient(u);
        let (dv_dx, dv_dy) = tri.gradient(v);
        let (dmu_dx, _) = tri.gradient([0, 1, 2].map(|j| m[j] * u[j]));
        let (_, dmv_dy) = tri.gradient([0, 1, 2].map(|j| m[j] * v[j]));

        let mut t = ElementTerms::zeros();
        for j in 0..3 {
            let n = ctx.nodes[j];
            let rho_m = self.rho_mud * m[j].max(self.watt.threshold);
            let damping = n.dof.w1_lambda / MUD_DRYING_TIME;
            let lambda = ctx.lambda[j];
            t.terms[j][0] = dmu_dx + dmv_dy;
            t.terms[j][1] = lambda * (u_m * du_dx + v_m * du_dy)
                + g_red * ds_dx
                + water * deta_dx
                + (n.bed_stress.0 - n.interfacial_stress.0) / rho_m
                + damping * u[j];
            t.terms[j][2] = lambda * (u_m * dv_dx + v_m * dv_dy)
                + g_red * ds_dy
                + water * deta_dy
                + (n.bed_stress.1 - n.interfacial_stress.1) / rho_m
                + damping * v[j];
        }
        t.velocity = (u_m, v_m);
        t.wave_speed = (g_red.max(0.0) * m_m).sqrt();
        t.jacobian_x = [[u_m, m_m, 0.0], [g_red, u_m, 0.0], [0.0, 0.0, u_m]];
        t.jacobian_y = [[v_m, 0.0, m_m], [0.0, v_m, 0.0], [g_red, 0.0, v_m]];

        *element = FluidMudElement {
            u: u_m,
            v: v_m,
            thickness: m_m,
            iwatt: ctx.wetness.iwatt,
            elementsize: 0.0,
            tau: 0.0,
        };
        t
    }

    fn record_stabilization(&self, element: &mut FluidMudElement, elementsize: f64, tau: f64) {
        element.elementsize = elementsize;
        element.tau = tau;
    }

    fn post_update(&self, node: &mut FluidMudNode, _mesh_node: &MeshNode) {
        if node.dof.q[0] < 0.0 {
            node.dof.q[0] = 0.0;
        }
    }
}

impl FemModel<FluidMudPhysics, 3> {
    /// Mud thickness per node (m).
    pub fn thicknesses(&self) -> Vec<f64> {
        self.nodes().iter().map(FluidMudNode::thickness).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::HydroField;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn model(slope: f64) -> FemModel<FluidMudPhysics, 3> {
        let mesh = Arc::new(
            TriMesh::uniform_rectangle(0.0, 40.0, 0.0, 40.0, 4, 4)
                .with_bathymetry(move |x, _| -5.0 + slope * x),
        );
        let mut m = FemModel::without_boundaries(
            FluidMudPhysics::new(&FluidMudConfig::default(), 9.81),
            mesh.clone(),
        );
        m.initialize_with(|_, _, n| n.dof.q[0] = 0.5);
        m.set_hydro(&HydroField::still_water(&mesh, 0.0)).unwrap();
        m.initial_solution(0.0);
        m
    }

    #[test]
    fn test_reduced_gravity() {
        let p = FluidMudPhysics::new(&FluidMudConfig::default(), 9.81);
        assert_relative_eq!(p.reduced_gravity(1025.0), 9.81 * 175.0 / 1200.0);
    }

    #[test]
    fn test_level_layer_at_rest() {
        let mut m = model(0.0);
        m.assemble();
        for i in 0..m.mesh().n_nodes() {
            for r in m.residual(i) {
                assert!(r.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_mud_flows_downslope() {
        let mut m = model(0.01);
        m.assemble();
        let i = m.mesh().nearest_node(20.0, 20.0);
        assert!(m.residual(i)[1] < 0.0);
    }

    #[test]
    fn test_water_drags_mud() {
        let mut m = model(0.0);
        m.initialize_with(|_, _, n| n.hydro.u = 1.0);
        m.apply_boundary_conditions();
        assert!(m.node(0).interfacial_stress.0 > 0.0);
        m.assemble();
        let i = m.mesh().nearest_node(20.0, 20.0);
        assert!(m.residual(i)[1] > 0.0);
    }

    #[test]
    fn test_bingham_opposes_motion() {
        let p = FluidMudPhysics::new(&FluidMudConfig::default(), 9.81);
        let (tx, ty) = p.bingham_stress(0.5, -0.2, 0.0);
        assert!(tx < 0.0);
        assert_eq!(ty, 0.0);
        assert_eq!(p.bingham_stress(0.5, 0.0, 0.0), (0.0, 0.0));
    }
}
