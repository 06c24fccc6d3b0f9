//! Diagnostics of running models.
//!
//! - [`StabilityMonitor`] scans a model after each step for non-finite or
//!   implausibly large values and steps beyond the stable candidate
//! - [`divergence_report`] names the first offending node of a model

mod stability;

pub use stability::{StabilityMonitor, StabilityStatus, StabilityThresholds, StabilityWarning};

use crate::physics::{FemPhysics, NodeState};
use crate::solver::FemModel;

/// First non-finite value of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct DivergenceReport {
    pub model: &'static str,
    pub node: usize,
    pub variable: &'static str,
    pub x: f64,
    pub y: f64,
    pub time: f64,
}

impl std::fmt::Display for DivergenceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} is not finite at node {} (x = {}, y = {}), t = {} s",
            self.model, self.variable, self.node, self.x, self.y, self.time
        )
    }
}

/// Scan a model for the first node with a non-finite unknown or derivative.
pub fn divergence_report<P, const N: usize>(model: &FemModel<P, N>) -> Option<DivergenceReport>
where
    P: FemPhysics<N>,
{
    let names = model.physics().variable_names();
    model.nodes().iter().enumerate().find_map(|(i, node)| {
        node.dof().first_non_finite().map(|k| {
            let mesh_node = model.mesh().node(i);
            DivergenceReport {
                model: model.name(),
                node: i,
                variable: names[k],
                x: mesh_node.x,
                y: mesh_node.y,
                time: model.time(),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroundwaterConfig;
    use crate::mesh::TriMesh;
    use crate::physics::GroundwaterPhysics;
    use std::sync::Arc;

    #[test]
    fn test_divergence_report_names_first_node() {
        let mesh = Arc::new(TriMesh::uniform_rectangle(0.0, 2.0, 0.0, 2.0, 2, 2));
        let physics = GroundwaterPhysics::new(&GroundwaterConfig::default());
        let mut m = FemModel::without_boundaries(physics, mesh);
        assert!(divergence_report(&m).is_none());
        m.node_mut(5).dof.dqdt[0] = f64::INFINITY;
        m.node_mut(7).dof.q[0] = f64::NAN;
        let report = divergence_report(&m).unwrap();
        assert_eq!(report.node, 5);
        assert_eq!(report.variable, "head");
        assert!(report.to_string().contains("node 5"));
    }
}
