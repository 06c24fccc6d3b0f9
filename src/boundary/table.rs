//! Boundary-condition supply.
//!
//! Raw `(node, key, function)` entries are collected by the caller (file
//! readers live outside this crate) and consumed once per model at setup:
//! each model takes exactly the entries whose key it understands and binds
//! them into its node records. Entries no model claims stay pending and can
//! be reported with [`BoundaryConditionTable::warn_unused`].

use std::fmt;

use log::{debug, warn};

use super::time_function::SharedFunction;
use crate::error::FemError;
use crate::types::NodeIndex;

/// Quantity a boundary function prescribes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicsKey {
    /// Free-surface elevation η (m)
    WaterLevel,
    /// Depth-averaged velocity, x component (m/s)
    VelocityU,
    /// Depth-averaged velocity, y component (m/s)
    VelocityV,
    /// Wind velocity at 10 m, x component (m/s)
    WindU,
    /// Wind velocity at 10 m, y component (m/s)
    WindV,
    /// Suspended sediment concentration (kg/m³)
    Concentration,
    /// Bed-level change (m)
    BedLevel,
    /// Fluid-mud layer thickness (m)
    MudThickness,
    /// Fluid-mud velocity, x component (m/s)
    MudVelocityU,
    /// Fluid-mud velocity, y component (m/s)
    MudVelocityV,
    /// Groundwater head (m)
    Head,
    /// Groundwater recharge (m/s)
    Recharge,
    /// Water temperature (°C)
    Temperature,
    /// Significant wave height (m)
    WaveHeight,
    /// Peak wave period (s)
    WavePeriod,
    /// Mean wave direction, mathematical convention (rad)
    WaveDirection,
}

impl PhysicsKey {
    /// Short identifier used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaterLevel => "water_level",
            Self::VelocityU => "u",
            Self::VelocityV => "v",
            Self::WindU => "wind_u",
            Self::WindV => "wind_v",
            Self::Concentration => "concentration",
            Self::BedLevel => "bed_level",
            Self::MudThickness => "mud_thickness",
            Self::MudVelocityU => "mud_u",
            Self::MudVelocityV => "mud_v",
            Self::Head => "head",
            Self::Recharge => "recharge",
            Self::Temperature => "temperature",
            Self::WaveHeight => "wave_height",
            Self::WavePeriod => "wave_period",
            Self::WaveDirection => "wave_direction",
        }
    }
}

impl fmt::Display for PhysicsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One boundary binding.
#[derive(Clone, Debug)]
pub struct BoundaryEntry {
    pub node: NodeIndex,
    pub key: PhysicsKey,
    pub function: SharedFunction,
}

/// Pending boundary bindings.
#[derive(Clone, Debug, Default)]
pub struct BoundaryConditionTable {
    entries: Vec<BoundaryEntry>,
}

impl BoundaryConditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    pub fn push(&mut self, node: impl Into<NodeIndex>, key: PhysicsKey, function: SharedFunction) {
        self.entries.push(BoundaryEntry {
            node: node.into(),
            key,
            function,
        });
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(
        mut self,
        node: impl Into<NodeIndex>,
        key: PhysicsKey,
        function: SharedFunction,
    ) -> Self {
        self.push(node, key, function);
        self
    }

    /// Number of entries not yet claimed by a model.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Whether all entries have been claimed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the entries whose key is in `keys`.
    ///
    /// Fails without removing anything if one of them references a node
    /// outside `0..n_nodes`.
    pub fn take_for(
        &mut self,
        keys: &[PhysicsKey],
        n_nodes: usize,
    ) -> Result<Vec<BoundaryEntry>, FemError> {
        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| keys.contains(&e.key) && e.node.get() >= n_nodes)
        {
            return Err(FemError::BoundaryNodeOutOfRange {
                node: bad.node,
                key: bad.key.to_string(),
                n_nodes,
            });
        }
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| keys.contains(&e.key));
        self.entries = rest;
        debug!(
            "Took {} boundary entries, {} still pending",
            taken.len(),
            self.entries.len()
        );
        Ok(taken)
    }

    /// Log a warning for every unclaimed entry.
    pub fn warn_unused(&self) {
        for e in &self.entries {
            warn!(
                "Boundary entry {} at {} was not used by any model",
                e.key, e.node
            );
        }
    }
}
