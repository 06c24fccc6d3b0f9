//! Physics strategy traits.
//!
//! Every sub-model (current, sediment, fluid mud, groundwater, heat, waves)
//! shares one explicit stabilized finite-element engine
//! ([`FemModel`](crate::solver::FemModel)). A sub-model only supplies:
//! - its node and element record types
//! - boundary binding and node-local coefficient updates
//! - the nodal flux/source terms of one triangle with the SUPG Jacobians
//! - clamping after the update

use crate::boundary::{PhysicsKey, SharedFunction};
use crate::mesh::{MeshNode, TriMesh, Triangle};
use crate::solver::{Watt, Wetness, limited_gradient};

// =============================================================================
// Degrees of freedom
// =============================================================================

/// Unknowns and integration history of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dof<const N: usize> {
    /// Primary unknowns
    pub q: [f64; N],
    /// Time derivative of the previous step (also `∂q/∂t` in the mean residual)
    pub dqdt: [f64; N],
    /// Components bound to a boundary function this step
    pub fixed: [bool; N],
    /// Extrapolation increment added after integration
    pub relax: [f64; N],
    /// Wet fraction λ
    pub wlambda: f64,
    /// 1 − λ
    pub w1_lambda: f64,
    /// Some but not all primary boundary values are prescribed
    pub extrapolating: bool,
}

impl<const N: usize> Default for Dof<N> {
    fn default() -> Self {
        Self {
            q: [0.0; N],
            dqdt: [0.0; N],
            fixed: [false; N],
            relax: [0.0; N],
            wlambda: 1.0,
            w1_lambda: 0.0,
            extrapolating: false,
        }
    }
}

impl<const N: usize> Dof<N> {
    /// Bind component `k` to `f` at time `t`.
    ///
    /// Writes `f(t)` into the unknown and `f'(t)` into its derivative.
    #[inline]
    pub fn prescribe(&mut self, k: usize, f: &SharedFunction, t: f64) {
        self.fix(k, f.value_at(t), f.derivative_at(t));
    }

    /// Bind component `k` to a value derived from boundary functions.
    #[inline]
    pub fn fix(&mut self, k: usize, value: f64, derivative: f64) {
        self.q[k] = value;
        self.dqdt[k] = derivative;
        self.fixed[k] = true;
    }

    /// Set the wet fraction and its complement.
    #[inline]
    pub fn set_wlambda(&mut self, wlambda: f64) {
        self.wlambda = wlambda;
        self.w1_lambda = 1.0 - wlambda;
    }

    /// Clear per-step boundary flags.
    #[inline]
    pub fn clear_boundary(&mut self) {
        self.fixed = [false; N];
        self.relax = [0.0; N];
        self.extrapolating = false;
    }

    /// First non-finite component of `q` or `dqdt`.
    pub fn first_non_finite(&self) -> Option<usize> {
        (0..N).find(|&k| !self.q[k].is_finite() || !self.dqdt[k].is_finite())
    }
}

/// Node record of a sub-model.
pub trait NodeState<const N: usize>: Clone + Send + Sync {
    fn dof(&self) -> &Dof<N>;
    fn dof_mut(&mut self) -> &mut Dof<N>;
}

/// How the gathered residual of an unknown is normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// Divide by the lumped mass (Galerkin unknowns)
    LumpedMass,
    /// Divide by the number of incident open elements; the element term is
    /// taken as is, without weighting or stabilization
    Incidence,
}

// =============================================================================
// Element terms
// =============================================================================

/// Everything a sub-model contributes for one wet triangle.
#[derive(Clone, Copy, Debug)]
pub struct ElementTerms<const N: usize> {
    /// Flux/source terms at the three nodes (`∂q/∂t + term = 0`)
    pub terms: [[f64; N]; 3],
    /// Mean advective velocity (m/s)
    pub velocity: (f64, f64),
    /// Characteristic wave speed (m/s)
    pub wave_speed: f64,
    /// `A_x[m][k] = ∂F_x,m / ∂q_k`
    pub jacobian_x: [[f64; N]; N],
    /// `A_y[m][k] = ∂F_y,m / ∂q_k`
    pub jacobian_y: [[f64; N]; N],
    /// Diffusivity per unknown (m²/s)
    pub diffusivity: [f64; N],
    /// Additional time-step restriction (s)
    pub dt_limit: f64,
}

impl<const N: usize> ElementTerms<N> {
    /// No terms, no transport, no limit.
    pub fn zeros() -> Self {
        Self {
            terms: [[0.0; N]; 3],
            velocity: (0.0, 0.0),
            wave_speed: 0.0,
            jacobian_x: [[0.0; N]; N],
            jacobian_y: [[0.0; N]; N],
            diffusivity: [0.0; N],
            dt_limit: f64::INFINITY,
        }
    }

    /// Pure advection of every unknown with `(u, v)`.
    pub fn advective(u: f64, v: f64) -> Self {
        let mut t = Self::zeros();
        t.velocity = (u, v);
        for k in 0..N {
            t.jacobian_x[k][k] = u;
            t.jacobian_y[k][k] = v;
        }
        t
    }
}

/// Read-only view of one triangle during assembly.
pub struct ElementContext<'a, Nd> {
    pub index: usize,
    pub triangle: &'a Triangle,
    pub nodes: [&'a Nd; 3],
    pub mesh_nodes: [&'a MeshNode; 3],
    pub wetness: Wetness,
    pub watt: Option<Watt>,
    pub depths: [f64; 3],
    pub levels: [f64; 3],
    pub lambda: [f64; 3],
    pub time: f64,
}

impl<Nd> ElementContext<'_, Nd> {
    #[inline]
    pub fn area(&self) -> f64 {
        self.triangle.area
    }

    /// Nodal values of a node quantity.
    #[inline]
    pub fn gather(&self, f: impl Fn(&Nd) -> f64) -> [f64; 3] {
        [f(self.nodes[0]), f(self.nodes[1]), f(self.nodes[2])]
    }

    /// Element mean of a node quantity.
    #[inline]
    pub fn mean(&self, f: impl Fn(&Nd) -> f64) -> f64 {
        self.gather(f).iter().sum::<f64>() / 3.0
    }

    /// P1 gradient of a node quantity.
    #[inline]
    pub fn gradient(&self, f: impl Fn(&Nd) -> f64) -> (f64, f64) {
        self.triangle.gradient(self.gather(f))
    }

    /// Free-surface gradient after wetting/drying limiting.
    pub fn level_gradient(&self) -> (f64, f64) {
        match &self.watt {
            Some(watt) => limited_gradient(self.triangle, self.levels, self.depths, watt),
            None => self.triangle.gradient(self.levels),
        }
    }

    /// Mean depth, never negative.
    pub fn mean_depth(&self) -> f64 {
        self.depths.iter().map(|d| d.max(0.0)).sum::<f64>() / 3.0
    }
}

// =============================================================================
// FemPhysics Trait
// =============================================================================

/// Physics strategy of one sub-model with `N` unknowns per node.
pub trait FemPhysics<const N: usize>: Send + Sync {
    /// Per-node record
    type Node: NodeState<N>;
    /// Per-element auxiliary record, rebuilt every assembly
    type Element: Clone + Default + Send + Sync;
    /// Result of the read-only neighbour pass
    type Correction: Send + Sync;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Names of the unknowns, in `Dof::q` order.
    fn variable_names(&self) -> [&'static str; N];

    /// Wetting threshold, if the model dries.
    fn wetting(&self) -> Option<Watt> {
        None
    }

    /// Normalization of each unknown.
    fn normalization(&self) -> [Normalization; N] {
        [Normalization::LumpedMass; N]
    }

    /// Boundary keys this model binds.
    fn supported_keys(&self) -> &'static [PhysicsKey];

    /// Fresh record for a mesh node.
    fn new_node(&self, mesh_node: &MeshNode) -> Self::Node;

    /// Bind a boundary function into a node record.
    fn bind(&self, node: &mut Self::Node, key: PhysicsKey, function: SharedFunction);

    /// Depth used for wetness classification (m).
    fn depth(&self, node: &Self::Node, mesh_node: &MeshNode) -> f64;

    /// Level used by the wetting/drying limiter (m).
    fn level(&self, node: &Self::Node, mesh_node: &MeshNode) -> f64;

    /// Initial state at `t0`; bound functions are applied afterwards.
    fn initial_condition(&self, _node: &mut Self::Node, _mesh_node: &MeshNode, _t0: f64) {}

    /// Node-local boundary pass: Dirichlet values, wet fraction, derived
    /// coefficients. Must not depend on other nodes.
    fn set_boundary_condition(&self, node: &mut Self::Node, mesh_node: &MeshNode, t: f64);

    /// Neighbour pass, computed read-only for node `i`.
    fn neighbour_correction(
        &self,
        _i: usize,
        _nodes: &[Self::Node],
        _mesh: &TriMesh,
        _t: f64,
    ) -> Option<Self::Correction> {
        None
    }

    /// Apply the result of [`neighbour_correction`](Self::neighbour_correction).
    fn apply_correction(&self, _node: &mut Self::Node, _correction: Self::Correction) {}

    /// Decay rates applied to nodes of totally dry elements.
    fn dry_leak(&self, _node: &Self::Node, _mesh_node: &MeshNode) -> [f64; N] {
        [0.0; N]
    }

    /// Terms of one wet or partially wet triangle.
    fn element_terms(
        &self,
        ctx: &ElementContext<'_, Self::Node>,
        element: &mut Self::Element,
    ) -> ElementTerms<N>;

    /// Stabilization length and time scale of the last evaluation.
    fn record_stabilization(&self, _element: &mut Self::Element, _elementsize: f64, _tau: f64) {}

    /// Reset the record of a totally dry element.
    fn dry_element(&self, element: &mut Self::Element) {
        *element = Self::Element::default();
    }

    /// Clamping and derived updates after integration.
    fn post_update(&self, _node: &mut Self::Node, _mesh_node: &MeshNode) {}
}

/// Extrapolation increment of component `k` at node `i`.
///
/// Every wet neighbour `j` contributes `0.1 · (q_j − q_i)`, or half of that
/// when `j` extrapolates itself; the contributions are averaged. Returns
/// `None` without wet neighbours.
pub fn extrapolation_increment<Nd: NodeState<N>, const N: usize>(
    i: usize,
    k: usize,
    nodes: &[Nd],
    mesh: &TriMesh,
    is_wet: impl Fn(&Nd) -> bool,
) -> Option<f64> {
    let qi = nodes[i].dof().q[k];
    let mut sum = 0.0;
    let mut count = 0usize;
    for &j in &mesh.node(i).neighbours {
        let nj = &nodes[j];
        if !is_wet(nj) {
            continue;
        }
        let c = if nj.dof().extrapolating {
            EXTRAPOLATION_RELAX / 2.0
        } else {
            EXTRAPOLATION_RELAX
        };
        sum += c * (nj.dof().q[k] - qi);
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Relaxation factor of boundary extrapolation per step.
pub const EXTRAPOLATION_RELAX: f64 = 0.1;
