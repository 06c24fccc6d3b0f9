//! Cross-model coupling fields.
//!
//! Sub-models never look each other up at runtime. The driver exports a
//! field from one model (one value per mesh node) and copies it into the
//! node records of the models that consume it before they step.

use crate::error::FemError;
use crate::mesh::TriMesh;
use crate::physics::FemPhysics;
use crate::solver::FemModel;
use crate::source::RHO_0;

/// Hydrodynamic state of one node, as seen by the other models.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HydroState {
    /// Water level (m)
    pub eta: f64,
    pub u: f64,
    pub v: f64,
    /// Water depth, never negative (m)
    pub depth: f64,
    /// Wet fraction
    pub wlambda: f64,
    /// Bed shear stress (N/m²)
    pub bottom_shear: f64,
    /// Water density (kg/m³)
    pub density: f64,
    /// Bottom friction coefficient
    pub cf: f64,
}

impl Default for HydroState {
    fn default() -> Self {
        Self {
            eta: 0.0,
            u: 0.0,
            v: 0.0,
            depth: 0.0,
            wlambda: 0.0,
            bottom_shear: 0.0,
            density: RHO_0,
            cf: 0.0,
        }
    }
}

impl HydroState {
    #[inline]
    pub fn speed(&self) -> f64 {
        (self.u * self.u + self.v * self.v).sqrt()
    }
}

/// Hydrodynamic state of every node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HydroField {
    pub nodes: Vec<HydroState>,
}

impl HydroField {
    /// Water at rest at `level` over the mesh bathymetry.
    pub fn still_water(mesh: &TriMesh, level: f64) -> Self {
        let nodes = mesh
            .nodes
            .iter()
            .map(|n| {
                let depth = (level - n.z).max(0.0);
                HydroState {
                    eta: level.max(n.z),
                    depth,
                    wlambda: if depth > 0.0 { 1.0 } else { 0.0 },
                    ..HydroState::default()
                }
            })
            .collect();
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Wave state of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveState {
    /// Significant wave height (m)
    pub height: f64,
    /// Period (s)
    pub period: f64,
    /// Propagation direction (rad, mathematical convention)
    pub direction: f64,
    /// Breaking dissipation (W/m²)
    pub dissipation: f64,
    /// Depth-integrated wave force (N/m²)
    pub force: (f64, f64),
    /// Near-bed orbital velocity amplitude (m/s)
    pub orbital_velocity: f64,
    /// Wavenumber magnitude (1/m)
    pub wavenumber: f64,
}

/// Wave state of every node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveField {
    pub nodes: Vec<WaveState>,
}

impl WaveField {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Node records that consume the hydrodynamic field.
pub trait HydroCoupled {
    fn hydro(&self) -> &HydroState;
    fn hydro_mut(&mut self) -> &mut HydroState;
}

/// Node records that consume the wave field.
pub trait WaveCoupled {
    fn waves_mut(&mut self) -> &mut WaveState;
}

/// Copy one value per mesh node into the node records of `model`.
///
/// Fails with [`FemError::NodeCountMismatch`] when `values` does not cover
/// the mesh exactly.
pub fn couple_nodes<P, T, F, const N: usize>(
    model: &mut FemModel<P, N>,
    what: &str,
    values: &[T],
    apply: F,
) -> Result<(), FemError>
where
    P: FemPhysics<N>,
    T: Sync,
    F: Fn(&mut P::Node, &T) + Send + Sync,
{
    let expected = model.mesh().n_nodes();
    if values.len() != expected {
        return Err(FemError::NodeCountMismatch {
            what: what.to_string(),
            expected,
            actual: values.len(),
        });
    }
    model.initialize_with(|i, _, node| apply(node, &values[i]));
    Ok(())
}

impl<P, const N: usize> FemModel<P, N>
where
    P: FemPhysics<N>,
    P::Node: HydroCoupled,
{
    /// Take over the hydrodynamic state of the current model.
    pub fn set_hydro(&mut self, field: &HydroField) -> Result<(), FemError> {
        couple_nodes(self, "hydrodynamic field", &field.nodes, |node, s| {
            *node.hydro_mut() = *s;
        })
    }
}

impl<P, const N: usize> FemModel<P, N>
where
    P: FemPhysics<N>,
    P::Node: WaveCoupled,
{
    /// Take over the wave state of the wave model.
    pub fn set_waves(&mut self, field: &WaveField) -> Result<(), FemError> {
        couple_nodes(self, "wave field", &field.nodes, |node, s| {
            *node.waves_mut() = *s;
        })
    }
}
