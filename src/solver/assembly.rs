//! Element assembly ("element approximation") for linear triangles.
//!
//! For one triangle the kernel:
//! 1. classifies wetness; totally dry elements only leak
//! 2. lets the physics strategy compute nodal terms, Jacobians and
//!    diffusivities
//! 3. forms the element-mean residual `R̄ = mean_j(∂q/∂t + term)_j`
//! 4. computes the stabilization length and `tau = 0.5·h / ‖c + |ū|‖`
//! 5. assembles, per local node `i` and unknown `k`:
//!
//! ```text
//! r_ik = −tau·A · Σ_m (A_x[m][k]·b_i + A_y[m][k]·c_i) · R̄_m     (SUPG)
//!        − A · ν_k · (∂q_k/∂x·b_i + ∂q_k/∂y·c_i)                (diffusion)
//!        − A · Σ_j w_ij · gl_ij · term_jk                        (Galerkin)
//! ```
//!
//! with `w_ii = 1/6`, `w_ij = 1/12`.
//!
//! Contributions are written to a private per-element slot; nodes gather
//! them over their incident elements afterwards, so assembly needs no
//! synchronization and sums in a fixed order.

use crate::mesh::{TriMesh, Triangle};
use crate::physics::{ElementContext, FemPhysics, Normalization, NodeState};
use crate::solver::wetting_drying::{Wetness, gl_matrix};

/// Consistent-mass weight of a node with itself.
const W_SELF: f64 = 1.0 / 6.0;
/// Consistent-mass weight between two distinct nodes.
const W_OTHER: f64 = 1.0 / 12.0;

/// Residual contributions and candidate time step of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution<const N: usize> {
    /// Contribution to each local node's residual
    pub residual: [[f64; N]; 3],
    /// Candidate stable time step (s)
    pub dt: f64,
    /// Element was totally dry
    pub dry: bool,
}

impl<const N: usize> Default for Contribution<N> {
    fn default() -> Self {
        Self {
            residual: [[0.0; N]; 3],
            dt: f64::INFINITY,
            dry: false,
        }
    }
}

/// Stabilization length of a triangle.
///
/// The projected size along the mean velocity, bounded by the height over
/// the shortest edge. Without velocity, the height over the longest edge.
pub fn element_size(tri: &Triangle, u: f64, v: f64) -> f64 {
    let speed = (u * u + v * v).sqrt();
    if speed > 0.0 {
        tri.projected_size(u / speed, v / speed).min(tri.max_height())
    } else {
        tri.min_height()
    }
}

/// Norm of the characteristic speeds, per direction.
#[inline]
pub fn operator_norm(wave_speed: f64, u: f64, v: f64) -> f64 {
    ((wave_speed + u.abs()).powi(2) + (wave_speed + v.abs()).powi(2)).sqrt()
}

/// Assemble element `e`.
pub fn assemble_element<P, const N: usize>(
    physics: &P,
    mesh: &TriMesh,
    nodes: &[P::Node],
    e: usize,
    record: &mut P::Element,
    time: f64,
) -> Contribution<N>
where
    P: FemPhysics<N>,
{
    let tri = mesh.element(e);
    if tri.closed {
        return Contribution::default();
    }

    let nd = tri.nodes.map(|n| &nodes[n]);
    let mn = tri.nodes.map(|n| mesh.node(n));
    let depths = [0, 1, 2].map(|j| physics.depth(nd[j], mn[j]));
    let levels = [0, 1, 2].map(|j| physics.level(nd[j], mn[j]));
    let watt = physics.wetting();
    let (wetness, lambda) = match &watt {
        Some(w) => (w.classify(depths), depths.map(|d| w.wlambda(d))),
        None => (Wetness::WET, [1.0; 3]),
    };
    let norm = physics.normalization();

    if wetness.totally_dry {
        physics.dry_element(record);
        let mut c = Contribution {
            dry: true,
            ..Contribution::default()
        };
        for j in 0..3 {
            let leak = physics.dry_leak(nd[j], mn[j]);
            for k in 0..N {
                c.residual[j][k] = match norm[k] {
                    Normalization::LumpedMass => -tri.area / 3.0 * leak[k],
                    Normalization::Incidence => -leak[k],
                };
            }
        }
        return c;
    }

    let ctx = ElementContext {
        index: e,
        triangle: tri,
        nodes: nd,
        mesh_nodes: mn,
        wetness,
        watt,
        depths,
        levels,
        lambda,
        time,
    };
    let et = physics.element_terms(&ctx, record);

    // Element-mean residual
    let mut rbar = [0.0; N];
    for j in 0..3 {
        let dqdt = &nd[j].dof().dqdt;
        for k in 0..N {
            rbar[k] += (dqdt[k] + et.terms[j][k]) / 3.0;
        }
    }

    let (u, v) = et.velocity;
    let elementsize = element_size(tri, u, v);
    let opnorm = operator_norm(et.wave_speed, u, v);
    let (tau, dt_adv) = if opnorm > 0.0 {
        let tau = 0.5 * elementsize / opnorm;
        (tau, tau)
    } else {
        (0.0, f64::INFINITY)
    };
    physics.record_stabilization(record, elementsize, tau);

    let grad_q: [(f64, f64); N] =
        std::array::from_fn(|k| tri.gradient([0, 1, 2].map(|j| nd[j].dof().q[k])));
    let gl = if ctx.watt.is_some() {
        gl_matrix(&levels, &lambda)
    } else {
        [[1.0; 3]; 3]
    };

    let area = tri.area;
    let mut c = Contribution {
        residual: [[0.0; N]; 3],
        dt: dt_adv.min(et.dt_limit),
        dry: false,
    };
    for i in 0..3 {
        let (bi, ci) = (tri.b(i), tri.c(i));
        for k in 0..N {
            c.residual[i][k] = match norm[k] {
                Normalization::Incidence => -et.terms[i][k],
                Normalization::LumpedMass => {
                    let mut supg = 0.0;
                    for m in 0..N {
                        supg += (et.jacobian_x[m][k] * bi + et.jacobian_y[m][k] * ci) * rbar[m];
                    }
                    let diffusion = et.diffusivity[k] * (grad_q[k].0 * bi + grad_q[k].1 * ci);
                    let mut galerkin = 0.0;
                    for j in 0..3 {
                        let w = if i == j { W_SELF } else { W_OTHER };
                        galerkin += w * gl[i][j] * et.terms[j][k];
                    }
                    -tau * area * supg - area * diffusion - area * galerkin
                }
            };
        }
    }
    c
}
