//! Crate-wide error type.

use thiserror::Error;

use crate::mesh::MeshError;
use crate::types::NodeIndex;

/// Errors raised while setting up or stepping a finite-element model.
#[derive(Debug, Error)]
pub enum FemError {
    /// Mesh construction failed.
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// A boundary entry names a node that does not exist.
    #[error("Boundary entry for {key} references {node}, but the mesh has {n_nodes} nodes")]
    BoundaryNodeOutOfRange {
        node: NodeIndex,
        key: String,
        n_nodes: usize,
    },

    /// Auxiliary per-node data does not match the mesh.
    #[error("{what}: expected {expected} nodes, got {actual}")]
    NodeCountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A physical parameter is outside its admissible range.
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A non-finite value appeared during integration.
    #[error("{model} diverged at {node}: {variable} is not finite at t = {time} s")]
    Divergence {
        model: String,
        node: NodeIndex,
        variable: String,
        time: f64,
    },

    /// The stability monitor saw too many consecutive warnings.
    #[error("{model} is unstable at t = {time} s after {warnings} consecutive warnings")]
    Unstable {
        model: String,
        time: f64,
        warnings: usize,
    },

    /// Stepping was requested after a previous divergence.
    #[error("{model} has diverged and cannot be stepped further")]
    Diverged { model: String },

    /// I/O failure while writing results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FemError {
    /// Shorthand for [`FemError::InvalidParameter`].
    pub fn invalid(name: &str, value: f64, reason: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        }
    }

    /// Whether this error stems from numerical divergence.
    pub fn is_divergence(&self) -> bool {
        matches!(self, Self::Divergence { .. } | Self::Diverged { .. })
    }
}
