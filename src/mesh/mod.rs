//! Mesh representation.
//!
//! Provides the triangular mesh shared by all sub-models:
//! - Node coordinates, bottom elevation, lumped mass and adjacency
//! - Linear triangles with shape-function coefficients
//! - Boundary-edge classification

mod boundary_tags;
mod tri_mesh;

pub use boundary_tags::Kennung;
pub use tri_mesh::{Incidence, MeshError, MeshNode, TriMesh, Triangle};
