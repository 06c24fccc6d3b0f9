//! Time-step driver shared by all sub-models.
//!
//! One call to [`FemModel::time_step`] runs the phases
//!
//! ```text
//! boundary (node-local, serial) → boundary (neighbours, parallel)
//!   → assembly (elements, parallel) → gather + integrate (nodes, parallel)
//! ```
//!
//! with a fork-join barrier between phases. A non-finite unknown or
//! derivative after integration marks the model as diverged; it then
//! refuses to step.

use std::sync::Arc;

use log::{debug, error, info};

use super::assembly::{Contribution, assemble_element};
use crate::boundary::BoundaryConditionTable;
use crate::error::FemError;
use crate::io::Snapshot;
use crate::mesh::{MeshNode, TriMesh};
use crate::physics::{FemPhysics, NodeState, Normalization};
use crate::time::{AdamsBashforth2, IntegratorInfo, ab2_update};
use crate::types::NodeIndex;

/// Summary of one time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Model time after the step (s)
    pub time: f64,
    /// Step size used (s)
    pub dt: f64,
    /// Smallest candidate stable step over all elements (s)
    pub min_stable_dt: f64,
    /// Number of totally dry elements
    pub dry_elements: usize,
}

/// A sub-model on a shared mesh.
pub struct FemModel<P, const N: usize>
where
    P: FemPhysics<N>,
{
    physics: P,
    mesh: Arc<TriMesh>,
    nodes: Vec<P::Node>,
    elements: Vec<P::Element>,
    contributions: Vec<Contribution<N>>,
    corrections: Vec<Option<P::Correction>>,
    open_incidence: Vec<usize>,
    open_mass: Vec<f64>,
    integrator: AdamsBashforth2,
    time: f64,
    diverged: bool,
}

impl<P, const N: usize> FemModel<P, N>
where
    P: FemPhysics<N>,
{
    /// Create the model and bind its boundary entries from `table`.
    pub fn new(
        physics: P,
        mesh: Arc<TriMesh>,
        table: &mut BoundaryConditionTable,
    ) -> Result<Self, FemError> {
        let entries = table.take_for(physics.supported_keys(), mesh.n_nodes())?;
        let mut model = Self::without_boundaries(physics, mesh);
        for entry in entries {
            model
                .physics
                .bind(&mut model.nodes[entry.node], entry.key, entry.function);
        }
        info!(
            "{}: {} nodes, {} elements, {} variables, {} (order {}, {} stage)",
            model.physics.name(),
            model.mesh.n_nodes(),
            model.mesh.n_elements(),
            N,
            model.integrator.name(),
            model.integrator.order(),
            model.integrator.n_stages()
        );
        Ok(model)
    }

    /// Create the model without boundary bindings.
    pub fn without_boundaries(physics: P, mesh: Arc<TriMesh>) -> Self {
        let nodes = mesh.nodes.iter().map(|n| physics.new_node(n)).collect();
        let open_incidence = mesh
            .nodes
            .iter()
            .map(|n| {
                n.incident
                    .iter()
                    .filter(|inc| !mesh.element(inc.element).closed)
                    .count()
            })
            .collect();
        // Closed triangles carry no residual, so they carry no mass either
        let open_mass = mesh
            .nodes
            .iter()
            .map(|n| {
                n.incident
                    .iter()
                    .map(|inc| mesh.element(inc.element))
                    .filter(|tri| !tri.closed)
                    .map(|tri| tri.area / 3.0)
                    .sum()
            })
            .collect();
        let n_elements = mesh.n_elements();
        let n_nodes = mesh.n_nodes();
        Self {
            physics,
            mesh,
            nodes,
            elements: vec![P::Element::default(); n_elements],
            contributions: vec![Contribution::default(); n_elements],
            corrections: (0..n_nodes).map(|_| None).collect(),
            open_incidence,
            open_mass,
            integrator: AdamsBashforth2::new(),
            time: 0.0,
            diverged: false,
        }
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn mesh(&self) -> &Arc<TriMesh> {
        &self.mesh
    }

    pub fn nodes(&self) -> &[P::Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [P::Node] {
        &mut self.nodes
    }

    pub fn node(&self, i: usize) -> &P::Node {
        &self.nodes[i]
    }

    pub fn node_mut(&mut self, i: usize) -> &mut P::Node {
        &mut self.nodes[i]
    }

    /// Element records of the last assembly.
    pub fn elements(&self) -> &[P::Element] {
        &self.elements
    }

    /// Element contributions of the last assembly.
    pub fn contributions(&self) -> &[Contribution<N>] {
        &self.contributions
    }

    /// Lumped mass of node `i` over its open elements (m²).
    pub fn open_mass(&self, i: usize) -> f64 {
        self.open_mass[i]
    }

    /// Current model time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn integrator(&self) -> &AdamsBashforth2 {
        &self.integrator
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    pub fn name(&self) -> &'static str {
        self.physics.name()
    }

    /// Set the initial state at `t0` and reset the integration history.
    pub fn initial_solution(&mut self, t0: f64) {
        self.time = t0;
        self.integrator.reset();
        self.diverged = false;
        let physics = &self.physics;
        for (node, mesh_node) in self.nodes.iter_mut().zip(&self.mesh.nodes) {
            physics.initial_condition(node, mesh_node, t0);
            node.dof_mut().dqdt = [0.0; N];
        }
        self.apply_boundary_conditions();
        info!("{}: initial solution at t = {t0} s", self.physics.name());
    }

    /// Initialize every node with `f(index, mesh node, record)`.
    pub fn initialize_with<F>(&mut self, f: F)
    where
        F: Fn(usize, &MeshNode, &mut P::Node) + Send + Sync,
    {
        let mesh = &self.mesh;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.nodes
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, node)| f(i, mesh.node(i), node));
        }

        #[cfg(not(feature = "parallel"))]
        for (i, node) in self.nodes.iter_mut().enumerate() {
            f(i, mesh.node(i), node);
        }
    }

    /// Boundary-condition operator at the current time.
    ///
    /// Applying it twice without assembly in between leaves the state
    /// unchanged.
    pub fn apply_boundary_conditions(&mut self) {
        let t = self.time;
        let physics = &self.physics;
        let mesh = &*self.mesh;

        for (node, mesh_node) in self.nodes.iter_mut().zip(&mesh.nodes) {
            physics.set_boundary_condition(node, mesh_node, t);
        }

        let nodes = &self.nodes;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.corrections
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, c)| *c = physics.neighbour_correction(i, nodes, mesh, t));
        }

        #[cfg(not(feature = "parallel"))]
        for (i, c) in self.corrections.iter_mut().enumerate() {
            *c = physics.neighbour_correction(i, nodes, mesh, t);
        }

        for (node, c) in self.nodes.iter_mut().zip(self.corrections.iter_mut()) {
            if let Some(c) = c.take() {
                physics.apply_correction(node, c);
            }
        }
    }

    /// Element assembly over all elements.
    ///
    /// Returns the smallest candidate time step and the number of totally
    /// dry elements.
    pub fn assemble(&mut self) -> (f64, usize) {
        let t = self.time;
        let physics = &self.physics;
        let mesh = &*self.mesh;
        let nodes = &self.nodes;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.elements
                .par_iter_mut()
                .zip(self.contributions.par_iter_mut())
                .enumerate()
                .for_each(|(e, (record, slot))| {
                    *slot = assemble_element(physics, mesh, nodes, e, record, t);
                });
        }

        #[cfg(not(feature = "parallel"))]
        for (e, (record, slot)) in self
            .elements
            .iter_mut()
            .zip(self.contributions.iter_mut())
            .enumerate()
        {
            *slot = assemble_element(physics, mesh, nodes, e, record, t);
        }

        self.contributions
            .iter()
            .fold((f64::INFINITY, 0), |(dt, dry), c| {
                (dt.min(c.dt), dry + usize::from(c.dry))
            })
    }

    /// Normalized residual of node `i` from the last assembly.
    pub fn residual(&self, i: usize) -> [f64; N] {
        gather(
            self.mesh.node(i),
            &self.contributions,
            self.open_incidence[i],
            self.open_mass[i],
            &self.physics.normalization(),
        )
    }

    /// Advance the model by `dt`.
    pub fn time_step(&mut self, dt: f64) -> Result<StepReport, FemError> {
        if self.diverged {
            return Err(FemError::Diverged {
                model: self.physics.name().to_string(),
            });
        }

        self.apply_boundary_conditions();
        let (min_stable_dt, dry_elements) = self.assemble();

        let beta = self.integrator.coefficients(dt);
        let norm = self.physics.normalization();
        let physics = &self.physics;
        let mesh = &*self.mesh;
        let contributions = &self.contributions;
        let open_incidence = &self.open_incidence;
        let open_mass = &self.open_mass;

        let integrate = |i: usize, node: &mut P::Node| -> Option<usize> {
            let mesh_node = mesh.node(i);
            let r = gather(mesh_node, contributions, open_incidence[i], open_mass[i], &norm);
            let dof = node.dof_mut();
            for k in 0..N {
                let r_new = if dof.fixed[k] { dof.dqdt[k] } else { r[k] };
                dof.q[k] = ab2_update(dof.q[k], dt, beta, r_new, dof.dqdt[k]) + dof.relax[k];
                dof.dqdt[k] = r_new;
            }
            // Checked before clamping so that a NaN cannot be clamped away
            let bad = dof.first_non_finite();
            physics.post_update(node, mesh_node);
            bad.or_else(|| node.dof().first_non_finite())
        };

        #[cfg(feature = "parallel")]
        let first_bad = {
            use rayon::prelude::*;
            self.nodes
                .par_iter_mut()
                .enumerate()
                .filter_map(|(i, node)| integrate(i, node).map(|k| (i, k)))
                .min_by_key(|&(i, _)| i)
        };

        #[cfg(not(feature = "parallel"))]
        let first_bad = self
            .nodes
            .iter_mut()
            .enumerate()
            .filter_map(|(i, node)| integrate(i, node).map(|k| (i, k)))
            .min_by_key(|&(i, _)| i);

        if let Some((i, k)) = first_bad {
            self.diverged = true;
            let variable = self.physics.variable_names()[k];
            error!(
                "{}: non-finite {} at node {} (x = {}, y = {}) at t = {} s",
                self.physics.name(),
                variable,
                i,
                self.mesh.node(i).x,
                self.mesh.node(i).y,
                self.time + dt
            );
            return Err(FemError::Divergence {
                model: self.physics.name().to_string(),
                node: NodeIndex::new(i),
                variable: variable.to_string(),
                time: self.time + dt,
            });
        }

        self.time += dt;
        self.integrator.advance(dt);

        debug!(
            "{}: t = {:.3} s, dt = {dt} s, min stable dt = {min_stable_dt:.4e} s, \
             {dry_elements} dry elements",
            self.physics.name(),
            self.time
        );

        Ok(StepReport {
            time: self.time,
            dt,
            min_stable_dt,
            dry_elements,
        })
    }

    /// Primary unknowns of every node.
    pub fn values(&self) -> Vec<[f64; N]> {
        self.nodes.iter().map(|n| n.dof().q).collect()
    }

    /// Snapshot of the primary unknowns at the current time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            model: self.physics.name().to_string(),
            time: self.time,
            variables: self
                .physics
                .variable_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            n_nodes: self.nodes.len(),
            values: self.nodes.iter().flat_map(|n| n.dof().q).collect(),
        }
    }
}

/// Sum a node's contributions over its incident elements and normalize.
fn gather<const N: usize>(
    mesh_node: &MeshNode,
    contributions: &[Contribution<N>],
    open_incidence: usize,
    open_mass: f64,
    norm: &[Normalization; N],
) -> [f64; N] {
    let mut r = [0.0; N];
    if open_incidence == 0 {
        return r;
    }
    for inc in &mesh_node.incident {
        let c = &contributions[inc.element].residual[inc.local];
        for k in 0..N {
            r[k] += c[k];
        }
    }
    for k in 0..N {
        r[k] /= match norm[k] {
            Normalization::LumpedMass => open_mass,
            Normalization::Incidence => open_incidence as f64,
        };
    }
    r
}
