//! Wave kinematics and energy on a current.
//!
//! Unknowns per node: wavenumber vector (k_x, k_y) and wave energy E (J/m²).
//!
//! ```text
//! ∂k/∂t + ∇ω = 0,               ω = σ(k, h) + k·U,  σ² = g k tanh(kh)
//! ∂E/∂t + ∇·((c_g + U) E) + D_b = 0
//! ```
//!
//! The wavenumber equations are averaged over the incident elements rather
//! than mass-weighted; `∇ω` is constant on a linear element. D_b is the
//! Battjes–Janssen breaking dissipation. The radiation force handed to the
//! current model is the dissipation-based form `D_b k / σ`.

use std::f64::consts::PI;

use log::warn;

use super::coupling::{HydroCoupled, HydroState, WaveField, WaveState};
use super::traits::{Dof, ElementContext, ElementTerms, FemPhysics, Normalization, NodeState};
use crate::boundary::{PhysicsKey, SharedFunction};
use crate::config::WaveConfig;
use crate::mesh::MeshNode;
use crate::solver::{FemModel, Watt};
use crate::source::RHO_0;

const KEYS: &[PhysicsKey] = &[
    PhysicsKey::WaveHeight,
    PhysicsKey::WavePeriod,
    PhysicsKey::WaveDirection,
];

/// Decay time of wave energy on dry land (s).
const WAVE_DRY_TIME: f64 = 60.0;

/// Wavenumber from the linear dispersion relation `σ² = g k tanh(kh)`.
///
/// Newton iteration from the Eckart approximation.
pub fn wavenumber(sigma: f64, depth: f64, g: f64) -> f64 {
    if sigma <= 0.0 || depth <= 0.0 {
        return 0.0;
    }
    let k0 = sigma * sigma / g;
    let mut k = k0 / (k0 * depth).tanh().sqrt();
    for _ in 0..50 {
        let th = (k * depth).tanh();
        let f = g * k * th - sigma * sigma;
        let df = g * th + g * k * depth * (1.0 - th * th);
        let dk = f / df;
        k -= dk;
        if dk.abs() < 1e-12 * k {
            break;
        }
    }
    k
}

/// Intrinsic frequency `√(g k tanh(kh))`.
#[inline]
pub fn intrinsic_frequency(k: f64, depth: f64, g: f64) -> f64 {
    if k <= 0.0 || depth <= 0.0 {
        return 0.0;
    }
    (g * k * (k * depth).tanh()).sqrt()
}

/// Group velocity magnitude.
pub fn group_velocity(k: f64, depth: f64, g: f64) -> f64 {
    let sigma = intrinsic_frequency(k, depth, g);
    if sigma == 0.0 {
        return 0.0;
    }
    let kh = k * depth;
    let n = if kh > 20.0 {
        0.5
    } else {
        0.5 * (1.0 + 2.0 * kh / (2.0 * kh).sinh())
    };
    n * sigma / k
}

/// Fraction of breaking waves `Q_b` for `b = H_rms / H_max`.
///
/// Solves `(1 − Q_b) / ln Q_b = −b²` by Newton iteration.
pub fn breaking_fraction(b: f64) -> f64 {
    if b >= 1.0 {
        return 1.0;
    }
    if b <= 0.2 {
        return 0.0;
    }
    let b2 = b * b;
    let mut q = if b <= 0.5 { 0.0 } else { (2.0 * b - 1.0).powi(2) };
    for _ in 0..20 {
        let e = ((q - 1.0) / b2).exp();
        let next = (q - b2 * (q - e) / (b2 - e)).clamp(0.0, 1.0);
        if (next - q).abs() < 1e-12 {
            q = next;
            break;
        }
        q = next;
    }
    q
}

#[derive(Clone, Debug, Default)]
pub struct WaveNode {
    pub dof: Dof<3>,
    pub height_bc: Option<SharedFunction>,
    pub period_bc: Option<SharedFunction>,
    pub direction_bc: Option<SharedFunction>,
    pub hydro: HydroState,
    /// Intrinsic frequency σ (rad/s)
    pub sigma: f64,
    /// Absolute frequency ω = σ + k·U (rad/s)
    pub omega: f64,
    /// Group velocity vector (m/s)
    pub group_velocity: (f64, f64),
    /// Breaking dissipation (W/m²)
    pub dissipation: f64,
}

impl WaveNode {
    #[inline]
    pub fn wavenumber(&self) -> f64 {
        (self.dof.q[0] * self.dof.q[0] + self.dof.q[1] * self.dof.q[1]).sqrt()
    }

    #[inline]
    pub fn energy(&self) -> f64 {
        self.dof.q[2]
    }
}

impl NodeState<3> for WaveNode {
    fn dof(&self) -> &Dof<3> {
        &self.dof
    }

    fn dof_mut(&mut self) -> &mut Dof<3> {
        &mut self.dof
    }
}

impl HydroCoupled for WaveNode {
    fn hydro(&self) -> &HydroState {
        &self.hydro
    }

    fn hydro_mut(&mut self) -> &mut HydroState {
        &mut self.hydro
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveElement {
    /// Mean energy propagation velocity c_g + U (m/s)
    pub propagation: (f64, f64),
    pub depth: f64,
    pub iwatt: usize,
    pub elementsize: f64,
    pub tau: f64,
}

/// Wave strategy.
#[derive(Clone, Debug)]
pub struct WavePhysics {
    g: f64,
    watt: Watt,
    breaker_index: f64,
    alpha: f64,
    rho: f64,
}

impl WavePhysics {
    pub fn new(config: &WaveConfig) -> Self {
        Self {
            g: config.gravity,
            watt: Watt::new(config.watt),
            breaker_index: config.breaker_index,
            alpha: config.alpha,
            rho: RHO_0,
        }
    }

    /// Wave energy of a wave with root-mean-square height `h_rms`.
    #[inline]
    pub fn energy_of(&self, h_rms: f64) -> f64 {
        self.rho * self.g * h_rms * h_rms / 8.0
    }

    /// Root-mean-square height of energy `e`.
    #[inline]
    pub fn rms_height(&self, e: f64) -> f64 {
        (8.0 * e.max(0.0) / (self.rho * self.g)).sqrt()
    }

    /// Battjes–Janssen dissipation (W/m²).
    pub fn dissipation(&self, energy: f64, sigma: f64, depth: f64) -> f64 {
        if energy <= 0.0 || sigma <= 0.0 {
            return 0.0;
        }
        let h_max = self.breaker_index * depth.max(self.watt.threshold);
        let q_b = breaking_fraction(self.rms_height(energy) / h_max);
        let f_p = sigma / (2.0 * PI);
        0.25 * self.alpha * self.rho * self.g * f_p * q_b * h_max * h_max
    }

    /// Wave state for the other models.
    pub fn state(&self, node: &WaveNode) -> WaveState {
        let k = node.wavenumber();
        if k <= 0.0 || node.sigma <= 0.0 {
            return WaveState::default();
        }
        let h_rms = self.rms_height(node.energy());
        let depth = node.hydro.depth.max(self.watt.threshold);
        let period = 2.0 * PI / node.sigma;
        let kh = (k * depth).min(700.0);
        let scale = node.dissipation / node.sigma;
        WaveState {
            height: std::f64::consts::SQRT_2 * h_rms,
            period,
            direction: node.dof.q[1].atan2(node.dof.q[0]),
            dissipation: node.dissipation,
            force: (scale * node.dof.q[0], scale * node.dof.q[1]),
            orbital_velocity: PI * h_rms / (period * kh.sinh()),
            wavenumber: k,
        }
    }
}

impl FemPhysics<3> for WavePhysics {
    type Node = WaveNode;
    type Element = WaveElement;
    type Correction = ();

    fn name(&self) -> &'static str {
        "waves"
    }

    fn variable_names(&self) -> [&'static str; 3] {
        ["kx", "ky", "energy"]
    }

    fn wetting(&self) -> Option<Watt> {
        Some(self.watt)
    }

    fn normalization(&self) -> [Normalization; 3] {
        [
            Normalization::Incidence,
            Normalization::Incidence,
            Normalization::LumpedMass,
        ]
    }

    fn supported_keys(&self) -> &'static [PhysicsKey] {
        KEYS
    }

    fn new_node(&self, _mesh_node: &MeshNode) -> WaveNode {
        WaveNode::default()
    }

    fn bind(&self, node: &mut WaveNode, key: PhysicsKey, function: SharedFunction) {
        match key {
            PhysicsKey::WaveHeight => node.height_bc = Some(function),
            PhysicsKey::WavePeriod => node.period_bc = Some(function),
            PhysicsKey::WaveDirection => node.direction_bc = Some(function),
            other => warn!("waves: ignoring boundary key {other}"),
        }
    }

    fn depth(&self, node: &WaveNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.depth
    }

    fn level(&self, node: &WaveNode, _mesh_node: &MeshNode) -> f64 {
        node.hydro.eta
    }

    fn initial_condition(&self, node: &mut WaveNode, _mesh_node: &MeshNode, _t0: f64) {
        node.dof.q[2] = node.dof.q[2].max(0.0);
    }

    fn set_boundary_condition(&self, node: &mut WaveNode, _mesh_node: &MeshNode, t: f64) {
        node.dof.clear_boundary();
        let depth = node.hydro.depth;
        node.dof.set_wlambda(self.watt.wlambda(depth));

        if let Some(f) = &node.height_bc {
            // Significant height to energy
            let h_rms = f.value_at(t) / std::f64::consts::SQRT_2;
            let dh_rms = f.derivative_at(t) / std::f64::consts::SQRT_2;
            let e = self.energy_of(h_rms);
            node.dof.fix(2, e, self.rho * self.g * h_rms * dh_rms / 4.0);
        }
        if let Some(f) = &node.period_bc {
            let period = f.value_at(t);
            let theta = match &node.direction_bc {
                Some(d) => d.value_at(t),
                None => node.dof.q[1].atan2(node.dof.q[0]),
            };
            let k = if period > 0.0 {
                wavenumber(2.0 * PI / period, depth, self.g)
            } else {
                0.0
            };
            node.dof.fix(0, k * theta.cos(), 0.0);
            node.dof.fix(1, k * theta.sin(), 0.0);
        }

        let k = node.wavenumber();
        node.sigma = intrinsic_frequency(k, depth, self.g);
        node.omega = node.sigma + node.dof.q[0] * node.hydro.u + node.dof.q[1] * node.hydro.v;
        let cg = group_velocity(k, depth, self.g);
        node.group_velocity = if k > 0.0 {
            (cg * node.dof.q[0] / k, cg * node.dof.q[1] / k)
        } else {
            (0.0, 0.0)
        };
        node.dissipation = node.dof.wlambda * self.dissipation(node.energy(), node.sigma, depth);
    }

    fn dry_leak(&self, node: &WaveNode, _mesh_node: &MeshNode) -> [f64; 3] {
        [0.0, 0.0, node.energy() / WAVE_DRY_TIME]
    }

    fn element_terms(
        &self,
        ctx: &ElementContext<'_, WaveNode>,
        element: &mut WaveElement,
    ) -> ElementTerms<3> {
        let (domega_dx, domega_dy) = ctx.gradient(|n| n.omega);
        let (dfx_dx, _) = ctx.gradient(|n| (n.group_velocity.0 + n.hydro.u) * n.energy());
        let (_, dfy_dy) = ctx.gradient(|n| (n.group_velocity.1 + n.hydro.v) * n.energy());
        let cx = ctx.mean(|n| n.group_velocity.0 + n.hydro.u);
        let cy = ctx.mean(|n| n.group_velocity.1 + n.hydro.v);

        let mut t = ElementTerms::zeros();
        for j in 0..3 {
            t.terms[j][0] = domega_dx;
            t.terms[j][1] = domega_dy;
            t.terms[j][2] = dfx_dx + dfy_dy + ctx.nodes[j].dissipation;
        }
        t.velocity = (cx, cy);
        t.jacobian_x[2][2] = cx;
        t.jacobian_y[2][2] = cy;

        *element = WaveElement {
            propagation: (cx, cy),
            depth: ctx.mean_depth(),
            iwatt: ctx.wetness.iwatt,
            elementsize: 0.0,
            tau: 0.0,
        };
        t
    }

    fn record_stabilization(&self, element: &mut WaveElement, elementsize: f64, tau: f64) {
        element.elementsize = elementsize;
        element.tau = tau;
    }

    fn post_update(&self, node: &mut WaveNode, _mesh_node: &MeshNode) {
        if node.dof.q[2] < 0.0 {
            node.dof.q[2] = 0.0;
        }
    }
}

impl FemModel<WavePhysics, 3> {
    /// Wave state for the other models.
    pub fn wave_field(&self) -> WaveField {
        let physics = self.physics();
        WaveField {
            nodes: self.nodes().iter().map(|n| physics.state(n)).collect(),
        }
    }
}
