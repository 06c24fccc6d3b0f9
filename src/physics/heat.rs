//! Depth-averaged heat transport.
//!
//! ```text
//! ∂T/∂t + λ(ū·∇T) − ∇·(K∇T) + λ k (T − T_eq)/(ρc_p H) = 0
//! ```
//!
//! Surface exchange relaxes the water temperature towards the equilibrium
//! temperature with the exchange coefficient `k`.

use log::warn;

use super::coupling::{HydroCoupled, HydroState};
use super::traits::{Dof, ElementContext, ElementTerms, FemPhysics, NodeState};
use crate::boundary::{PhysicsKey, SharedFunction};
use crate::config::HeatConfig;
use crate::mesh::MeshNode;
use crate::solver::{FemModel, Watt};

const KEYS: &[PhysicsKey] = &[PhysicsKey::Temperature];

#[derive(Clone, Debug, Default)]
pub struct HeatNode {
    pub dof: Dof<1>,
    pub temperature_bc: Option<SharedFunction>,
    pub hydro: HydroState,
}

impl HeatNode {
    #[inline]
    pub fn temperature(&self) -> f64 {
        self.dof.q[0]
    }
}

impl NodeState<1> for HeatNode {
    fn dof(&self) -> &Dof<1> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<1> {
        &mut self.dof
    }
}

impl HydroCoupled for HeatNode {
    fn hydro(&self) -> &HydroState {
        &self.hydro
    }

    fn hydro_mut(&mut self) -> &mut HydroState {
        &mut self.hydro
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatElement {
    pub u: f64,
    pub v: f64,
    pub depth: f64,
    pub elementsize: f64,
    pub tau: f64,
}

/// Heat transport strategy.
#[derive(Clone, Debug)]
pub struct HeatPhysics {
    watt: Watt,
    exchange_coefficient: f64,
    equilibrium_temperature: f64,
    diffusivity: f64,
    rho_cp: f64,
}

impl HeatPhysics {
    pub fn new(config: &HeatConfig) -> Self {
        Self {
            watt: Watt::new(config.watt),
            exchange_coefficient: config.exchange_coefficient,
            equilibrium_temperature: config.equilibrium_temperature,
            diffusivity: config.diffusivity,
            rho_cp: config.rho_cp,
        }
    }
}

impl FemPhysics<1> for HeatPhysics {
    type Node = HeatNode;
    type Element = HeatElement;
    type Correction = ();

    fn name(&self) -> &'static str {
        "heat"
    }

    fn variable_names(&self) -> [&'static str; 1] {
        ["temperature"]
    }

    fn wetting(&self) -> Option<Watt> {
        Some(self.watt)
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, _mesh_node: &MeshNode) -> HeatNode {
        let mut dof = Dof::default();
        dof.q[0] = self.equilibrium_temperature;
        HeatNode {
            dof,
            ..HeatNode::default()
        }
    }

    fn bind(&self, node: &mut HeatNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::Temperature => node.temperature_bc = Some(function),
            other => warn!("heat: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &HeatNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.depth
    }

    fn level(&self, node: &HeatNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.eta
    }

    fn set_boundary_condition(&self, node: &mut HeatNode, _mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        if let Some(f) = &node.temperature_bc {
            node.dof.prescribe(0, f, t);
        }
        node.dof.set_wlambda(self.watt.wlambda(node.hydro.depth));
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, HeatNode>,
        element: &mut HeatElement,
    ) -> ElementTerms<1> {
        let u_m = ctx.mean(|n| n.hydro.u);
        let v_m = ctx.mean(|n| n.hydro.v);
        let (dt_dx, dt_dy) = ctx.gradient(HeatNode::temperature);

        let mut t = ElementTerms::advective(u_m, v_m);
        for j in 0..3 {
            let n = ctx.nodes[j];
            let lambda = ctx.lambda[j];
            let h_eff = ctx.depths[j].max(self.watt.threshold);
            let exchange = lambda * self.exchange_coefficient
                * (n.temperature() - self.equilibrium_temperature)
                / (self.rho_cp * h_eff);
            t.terms[j][0] = lambda * (u_m * dt_dx + v_m * dt_dy) + exchange;
        }
        t.diffusivity = [self.diffusivity];
        if self.diffusivity > 0.0 {
            t.dt_limit = 0.25 * ctx.triangle.min_height().powi(2) / self.diffusivity;
        }

        *element = HeatElement {
            u: u_m,
            v: v_m,
            depth: ctx.mean_depth(),
            elementsize: 0.0,
            tau: 0.0,
        };
        t
    }

    fn record_stabilization(&self, element: &mut HeatElement, elementsize: f64, tau: f64) {
        element.elementsize = elementsize;
        element.tau = tau;
    }
}

impl FemModel<HeatPhysics, 1> {
    /// Water temperature per node (°C).
    pub fn temperatures(&self) -> Vec<f64> {
        self.nodes().iter().map(HeatNode::temperature).collect()
    }
}
