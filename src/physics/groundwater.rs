//! Unconfined groundwater (Boussinesq aquifer).
//!
//! Unknown per node: hydraulic head `h` (m).
//!
//! ```text
//! S_y ∂h/∂t = ∇·(K (h − b) ∇h) + R − S_y L λ (h − η)
//! ```
//!
//! `b` is the aquifer bottom, `R` the recharge rate and `L` the exchange
//! rate with surface water where the surface is wet. The scheme is purely
//! diffusive, so the admissible step comes from the diffusion limit.

use log::warn;

use super::coupling::{HydroCoupled, HydroState};
use super::traits::{Dof, ElementContext, ElementTerms, FemPhysics, NodeState};
use crate::boundary::{PhysicsKey, SharedFunction};
use crate::config::GroundwaterConfig;
use crate::mesh::MeshNode;
use crate::solver::FemModel;

const KEYS: &[PhysicsKey] = &[PhysicsKey::Head, PhysicsKey::Recharge];

#[derive(Clone, Debug, Default)]
pub struct GroundwaterNode {
    pub dof: Dof<1>,
    pub head_bc: Option<SharedFunction>,
    pub recharge_bc: Option<SharedFunction>,
    /// Recharge rate (m/s)
    pub recharge: f64,
    /// Aquifer bottom (m)
    pub bottom: f64,
    pub hydro: HydroState,
}

impl GroundwaterNode {
    #[inline]
    pub fn head(&self) -> f64 {
        self.dof.q[0]
    }

    /// Saturated thickness (m).
    #[inline]
    pub fn saturated_thickness(&self) -> f64 {
        (self.head() - self.bottom).max(0.0)
    }
}

impl NodeState<1> for GroundwaterNode {
    fn dof(&self) -> &Dof<1> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<1> {
        &mut self.dof
    }
}

impl HydroCoupled for GroundwaterNode {
    fn hydro(&self) -> &HydroState {
        &self.hydro
    }

    fn hydro_mut(&mut self) -> &mut HydroState {
        &mut self.hydro
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroundwaterElement {
    /// Mean saturated thickness (m)
    pub thickness: f64,
    /// Aquifer diffusivity K·(h − b)/S_y (m²/s)
    pub diffusivity: f64,
    /// Darcy flux (m/s)
    pub darcy: (f64, f64),
}

/// Groundwater strategy.
#[derive(Clone, Debug)]
pub struct GroundwaterPhysics {
    conductivity: f64,
    specific_yield: f64,
    aquifer_thickness: f64,
    leakage: f64,
}

impl GroundwaterPhysics {
    pub fn new(config: &GroundwaterConfig) -> Self {
        Self {
            conductivity: config.conductivity,
            specific_yield: config.specific_yield,
            aquifer_thickness: config.aquifer_thickness,
            leakage: config.leakage,
        }
    }
}

impl FemPhysics<1> for GroundwaterPhysics {
    type Node = GroundwaterNode;
    type Element = GroundwaterElement;
    type Correction = ();

    fn name(&self) -> &'static str {
        "groundwater"
    }

    fn variable_names(&self) -> [&'static str; 1] {
        ["head"]
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, mesh_node: &MeshNode) -> GroundwaterNode {
        let mut dof = Dof::default();
        dof.q[0] = mesh_node.z;
        GroundwaterNode {
            dof,
            bottom: mesh_node.z - self.aquifer_thickness,
            ..GroundwaterNode::default()
        }
    }

    fn bind(&self, node: &mut GroundwaterNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::Head => node.head_bc = Some(function),
            PhysicsKey::Recharge => node.recharge_bc = Some(function),
            other => warn!("groundwater: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &GroundwaterNode, _mesh_node: &MeshNode) -> f64 {
        node.saturated_thickness()
    }

    fn level(&self, node: &GroundwaterNode, _mesh_node: &MeshNode) -> f64 {
        node.head()
    }

    fn initial_condition(&self, node: &mut GroundwaterNode, _mesh_node: &MeshNode, _t0: f64) {
        node.dof.q[0] = node.dof.q[0].max(node.bottom);
    }

    fn set_boundary_condition(&self, node: &mut GroundwaterNode, _mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        if let Some(f) = &node.head_bc {
            node.dof.prescribe(0, f, t);
        }
        if let Some(f) = &node.recharge_bc {
            node.recharge = f.value_at(t);
        }
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, GroundwaterNode>,
        element: &mut GroundwaterElement,
    ) -> ElementTerms<1> {
        let thickness = ctx.mean(GroundwaterNode::saturated_thickness);
        let diffusivity = self.conductivity * thickness / self.specific_yield;
        let (dh_dx, dh_dy) = ctx.gradient(GroundwaterNode::head);

        let mut t = ElementTerms::zeros();
        for j in 0..3 {
            let n = ctx.nodes[j];
            let exchange = self.leakage * n.hydro.wlambda * (n.head() - n.hydro.eta);
            t.terms[j][0] = exchange - n.recharge / self.specific_yield;
        }
        t.diffusivity = [diffusivity];
        if diffusivity > 0.0 {
            t.dt_limit = 0.25 * ctx.triangle.min_height().powi(2) / diffusivity;
        }

        *element = GroundwaterElement {
            thickness,
            diffusivity,
            darcy: (-self.conductivity * dh_dx, -self.conductivity * dh_dy),
        };
        t
    }

    fn post_update(&self, node: &mut GroundwaterNode, _mesh_node: &MeshNode) {
        if node.dof.q[0] < node.bottom {
            node.dof.q[0] = node.bottom;
        }
    }
}

impl FemModel<GroundwaterPhysics, 1> {
    /// Hydraulic head per node (m).
    pub fn heads(&self) -> Vec<f64> {
        self.nodes().iter().map(GroundwaterNode::head).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryConditionTable, Constant, shared};
    use crate::mesh::TriMesh;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn mesh() -> Arc<TriMesh> {
        Arc::new(
            TriMesh::uniform_rectangle(0.0, 100.0, 0.0, 100.0, 4, 4).with_bathymetry(|_, _| 2.0),
        )
    }

    #[test]
    fn test_flat_water_table_is_steady() {
        let physics = GroundwaterPhysics::new(&GroundwaterConfig::default());
        let mut m = FemModel::without_boundaries(physics, mesh());
        m.initial_solution(0.0);
        let (dt, _) = m.assemble();
        assert!(dt.is_finite());
        for i in 0..m.mesh().n_nodes() {
            assert!(m.residual(i)[0].abs() < 1e-15);
        }
    }

    #[test]
    fn test_diffusion_limit() {
        let config = GroundwaterConfig::default();
        let mut m = FemModel::without_boundaries(GroundwaterPhysics::new(&config), mesh());
        m.initial_solution(0.0);
        let (dt, _) = m.assemble();
        let d = config.conductivity * config.aquifer_thickness / config.specific_yield;
        let h_min = m.mesh().element(0).min_height();
        assert_relative_eq!(dt, 0.25 * h_min * h_min / d, epsilon = 1e-6);
        assert_relative_eq!(m.elements()[0].diffusivity, d);
    }

    #[test]
    fn test_mound_spreads() {
        let physics = GroundwaterPhysics::new(&GroundwaterConfig::default());
        let mut m = FemModel::without_boundaries(physics, mesh());
        let centre = m.mesh().nearest_node(50.0, 50.0);
        m.initialize_with(|i, _, n| {
            if i == centre {
                n.dof.q[0] += 1.0;
            }
        });
        m.initial_solution(0.0);
        m.assemble();
        assert!(m.residual(centre)[0] < 0.0);
        // Diagonal neighbours of right triangles do not couple
        let spread: Vec<f64> = m
            .mesh()
            .node(centre)
            .neighbours
            .iter()
            .map(|&j| m.residual(j)[0])
            .collect();
        assert!(spread.iter().all(|&r| r > -1e-15));
        assert!(spread.iter().any(|&r| r > 0.0));
    }

    #[test]
    fn test_recharge_raises_head() {
        let mesh = mesh();
        let mut table = BoundaryConditionTable::new();
        for i in 0..mesh.n_nodes() {
            table.push(i, PhysicsKey::Recharge, shared(Constant(1.0e-6)));
        }
        let config = GroundwaterConfig::default();
        let mut m = FemModel::new(GroundwaterPhysics::new(&config), mesh, &mut table).unwrap();
        m.initial_solution(0.0);
        m.assemble();
        let i = m.mesh().nearest_node(50.0, 50.0);
        assert_relative_eq!(m.residual(i)[0], 1.0e-6 / config.specific_yield, epsilon = 1e-15);
    }

    #[test]
    fn test_head_stays_above_bottom() {
        let config = GroundwaterConfig {
            leakage: 0.0,
            ..GroundwaterConfig::default()
        };
        let mesh = mesh();
        let mut table = BoundaryConditionTable::new();
        for i in 0..mesh.n_nodes() {
            table.push(i, PhysicsKey::Recharge, shared(Constant(-1.0)));
        }
        let mut m = FemModel::new(GroundwaterPhysics::new(&config), mesh, &mut table).unwrap();
        m.initial_solution(0.0);
        m.time_step(100.0).unwrap();
        assert!(m.heads().iter().all(|&h| h >= 2.0 - config.aquifer_thickness));
    }
}
