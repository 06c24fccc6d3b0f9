//! Model parameters.
//!
//! Every sub-model is built from its own section; nothing is shared through
//! statics. All sections have defaults so a configuration file only names
//! what it changes:
//!
//! ```toml
//! [current]
//! watt = 0.05
//! friction_law = "strickler"
//! latitude = 54.0
//!
//! [simulation]
//! sediment = true
//! output_interval = 600.0
//! ```

use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::FemError;
use crate::source::{DragCoefficient, FrictionLaw, RHO_SEDIMENT, Weir};

/// Angular velocity of the earth (rad/s).
pub const EARTH_ROTATION: f64 = 7.292_115e-5;

/// Grain size substituted for implausible input (m).
pub const DEFAULT_D50: f64 = 2.0e-4;

/// All model sections.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub current: CurrentConfig,
    pub sediment: SedimentConfig,
    pub fluid_mud: FluidMudConfig,
    pub groundwater: GroundwaterConfig,
    pub heat: HeatConfig,
    pub waves: WaveConfig,
    pub simulation: SimulationConfig,
}

/// Depth-averaged current model.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentConfig {
    /// Wetting threshold (m)
    pub watt: f64,
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Coriolis parameter f (1/s); ignored when `latitude` is set
    pub coriolis: f64,
    /// Latitude (degrees) for f = 2Ω sin φ
    pub latitude: Option<f64>,
    pub friction_law: FrictionLaw,
    /// Equivalent sand roughness (m)
    pub nikuradse_ks: f64,
    /// Strickler coefficient (m^{1/3}/s)
    pub strickler_kst: f64,
    pub drag: DragCoefficient,
    pub smagorinsky: f64,
    pub elder: f64,
    pub battjes: f64,
    /// Time scale of velocity damping in drying nodes (s)
    pub drying_time_scale: f64,
    /// Background salinity (PSU)
    pub salinity: f64,
    /// Background temperature (°C)
    pub temperature: f64,
    /// Include horizontal density gradients
    pub baroclinic: bool,
    /// Initial water level (m)
    pub initial_level: f64,
    pub weirs: Vec<Weir>,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            watt: 0.1,
            gravity: 9.81,
            coriolis: 0.0,
            latitude: None,
            friction_law: FrictionLaw::Nikuradse,
            nikuradse_ks: 0.02,
            strickler_kst: 40.0,
            drag: DragCoefficient::Wu,
            smagorinsky: 0.1,
            elder: 1.0,
            battjes: 1.0,
            drying_time_scale: 60.0,
            salinity: 30.0,
            temperature: 10.0,
            baroclinic: true,
            initial_level: 0.0,
            weirs: Vec::new(),
        }
    }
}

impl CurrentConfig {
    /// Coriolis parameter in effect (1/s).
    pub fn coriolis_parameter(&self) -> f64 {
        match self.latitude {
            Some(lat) => 2.0 * EARTH_ROTATION * lat.to_radians().sin(),
            None => self.coriolis,
        }
    }

    /// Roughness value matching the selected friction law.
    pub fn roughness(&self) -> f64 {
        match self.friction_law {
            FrictionLaw::Strickler => self.strickler_kst,
            FrictionLaw::Nikuradse => self.nikuradse_ks,
        }
    }
}

/// Suspended sediment and morphodynamics.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SedimentConfig {
    /// Median grain size (m)
    pub d50: f64,
    /// Grain density (kg/m³)
    pub rho_sediment: f64,
    pub porosity: f64,
    /// Partheniades erosion constant (kg/m²/s)
    pub erosion_constant: f64,
    /// Critical shear for erosion (N/m²)
    pub critical_erosion_shear: f64,
    /// Critical shear for deposition (N/m²)
    pub critical_deposition_shear: f64,
    /// Horizontal diffusivity (m²/s)
    pub diffusivity: f64,
    /// Morphological acceleration factor
    pub morphological_factor: f64,
    /// Bed roughness for wave friction (m)
    pub bed_roughness: f64,
    pub watt: f64,
    pub bed_load: bool,
}

impl Default for SedimentConfig {
    fn default() -> Self {
        Self {
            d50: DEFAULT_D50,
            rho_sediment: RHO_SEDIMENT,
            porosity: 0.4,
            erosion_constant: 1.0e-4,
            critical_erosion_shear: 0.2,
            critical_deposition_shear: 0.1,
            diffusivity: 1.0,
            morphological_factor: 1.0,
            bed_roughness: 0.01,
            watt: 0.1,
            bed_load: true,
        }
    }
}

/// Fluid-mud layer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FluidMudConfig {
    /// Mud density (kg/m³)
    pub rho_mud: f64,
    /// Bingham yield stress (N/m²)
    pub yield_stress: f64,
    /// Bingham viscosity (Pa·s)
    pub bingham_viscosity: f64,
    /// Quadratic friction at the water–mud interface
    pub interfacial_friction: f64,
    pub watt: f64,
}

impl Default for FluidMudConfig {
    fn default() -> Self {
        Self {
            rho_mud: 1200.0,
            yield_stress: 0.5,
            bingham_viscosity: 0.05,
            interfacial_friction: 1.0e-3,
            watt: 0.01,
        }
    }
}

/// Unconfined aquifer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroundwaterConfig {
    /// Hydraulic conductivity (m/s)
    pub conductivity: f64,
    pub specific_yield: f64,
    /// Aquifer thickness below the surface (m)
    pub aquifer_thickness: f64,
    /// Exchange rate with surface water (1/s)
    pub leakage: f64,
}

impl Default for GroundwaterConfig {
    fn default() -> Self {
        Self {
            conductivity: 1.0e-4,
            specific_yield: 0.25,
            aquifer_thickness: 10.0,
            leakage: 1.0e-6,
        }
    }
}

/// Depth-averaged heat transport.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Surface heat-exchange coefficient (W/m²/K)
    pub exchange_coefficient: f64,
    /// Equilibrium temperature (°C)
    pub equilibrium_temperature: f64,
    /// Horizontal diffusivity (m²/s)
    pub diffusivity: f64,
    /// Volumetric heat capacity (J/m³/K)
    pub rho_cp: f64,
    pub watt: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            exchange_coefficient: 30.0,
            equilibrium_temperature: 15.0,
            diffusivity: 1.0,
            rho_cp: 4.18e6,
            watt: 0.1,
        }
    }
}

/// Wave kinematics and energy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Breaker index H_max / h
    pub breaker_index: f64,
    /// Battjes–Janssen dissipation coefficient
    pub alpha: f64,
    pub watt: f64,
    pub gravity: f64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            breaker_index: 0.73,
            alpha: 1.0,
            watt: 0.1,
            gravity: 9.81,
        }
    }
}

/// Which sub-models run besides the current, and how often to write.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Snapshot interval (s)
    pub output_interval: f64,
    pub sediment: bool,
    pub fluid_mud: bool,
    pub groundwater: bool,
    pub heat: bool,
    pub waves: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            output_interval: 3600.0,
            sediment: false,
            fluid_mud: false,
            groundwater: false,
            heat: false,
            waves: false,
        }
    }
}

impl ModelConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, FemError> {
        let config: ModelConfig = toml::from_str(s)?;
        config.validate()
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FemError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Reject impossible values; replace implausible ones with a warning.
    pub fn validate(mut self) -> Result<Self, FemError> {
        for (name, watt) in [
            ("current.watt", self.current.watt),
            ("sediment.watt", self.sediment.watt),
            ("fluid_mud.watt", self.fluid_mud.watt),
            ("heat.watt", self.heat.watt),
            ("waves.watt", self.waves.watt),
        ] {
            if !(watt > 0.0) {
                return Err(FemError::invalid(name, watt, "wetting threshold must be positive"));
            }
        }
        positive("current.gravity", self.current.gravity)?;
        positive("waves.gravity", self.waves.gravity)?;
        positive("current.drying_time_scale", self.current.drying_time_scale)?;
        if self.current.nikuradse_ks < 0.0 {
            return Err(FemError::invalid(
                "current.nikuradse_ks",
                self.current.nikuradse_ks,
                "roughness must not be negative",
            ));
        }
        positive("current.strickler_kst", self.current.strickler_kst)?;
        if self.sediment.bed_roughness < 0.0 {
            return Err(FemError::invalid(
                "sediment.bed_roughness",
                self.sediment.bed_roughness,
                "roughness must not be negative",
            ));
        }
        if !(1.0e-6..=0.1).contains(&self.sediment.d50) {
            warn!(
                "sediment.d50 = {} m is implausible, using {} m",
                self.sediment.d50, DEFAULT_D50
            );
            self.sediment.d50 = DEFAULT_D50;
        }
        if !(0.0..1.0).contains(&self.sediment.porosity) {
            return Err(FemError::invalid(
                "sediment.porosity",
                self.sediment.porosity,
                "must lie in [0, 1)",
            ));
        }
        positive("sediment.rho_sediment", self.sediment.rho_sediment)?;
        positive("fluid_mud.rho_mud", self.fluid_mud.rho_mud)?;
        positive("groundwater.specific_yield", self.groundwater.specific_yield)?;
        positive("groundwater.aquifer_thickness", self.groundwater.aquifer_thickness)?;
        if self.groundwater.conductivity < 0.0 {
            return Err(FemError::invalid(
                "groundwater.conductivity",
                self.groundwater.conductivity,
                "must not be negative",
            ));
        }
        positive("heat.rho_cp", self.heat.rho_cp)?;
        positive("waves.breaker_index", self.waves.breaker_index)?;
        positive("simulation.output_interval", self.simulation.output_interval)?;
        Ok(self)
    }
}

fn positive(name: &str, value: f64) -> Result<(), FemError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(FemError::invalid(name, value, "must be positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ModelConfig::from_toml_str("").unwrap();
        assert_eq!(config, ModelConfig::default());
        assert_eq!(config.current.watt, 0.1);
        assert!(!config.simulation.sediment);
    }

    #[test]
    fn test_partial_sections() {
        let config = ModelConfig::from_toml_str(
            r#"
            [current]
            watt = 0.05
            friction_law = "strickler"
            strickler_kst = 35.0
            drag = "large_pond"
            latitude = 30.0

            [simulation]
            sediment = true
            "#,
        )
        .unwrap();
        assert_eq!(config.current.watt, 0.05);
        assert_eq!(config.current.friction_law, FrictionLaw::Strickler);
        assert_eq!(config.current.roughness(), 35.0);
        assert_eq!(config.current.drag, DragCoefficient::LargePond);
        assert_relative_eq!(config.current.coriolis_parameter(), EARTH_ROTATION, epsilon = 1e-12);
        assert!(config.simulation.sediment);
        assert_eq!(config.sediment, SedimentConfig::default());
    }

    #[test]
    fn test_weirs_from_toml() {
        let config = ModelConfig::from_toml_str(
            r#"
            [[current.weirs]]
            name = "sill"
            nodes = [3, 4, 5]
            crest_level = -1.0
            normal = [1.0, 0.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.current.weirs.len(), 1);
        assert_eq!(config.current.weirs[0].nodes, vec![3, 4, 5]);
        assert_eq!(config.current.weirs[0].discharge_coefficient, 0.63);
    }

    #[test]
    fn test_invalid_watt_rejected() {
        let err = ModelConfig::from_toml_str("[heat]\nwatt = 0.0").unwrap_err();
        assert!(matches!(err, FemError::InvalidParameter { .. }));
        let err = ModelConfig::from_toml_str("[current]\nnikuradse_ks = -0.1").unwrap_err();
        assert!(matches!(err, FemError::InvalidParameter { .. }));
    }

    #[test]
    fn test_implausible_grain_size_substituted() {
        let config = ModelConfig::from_toml_str("[sediment]\nd50 = 0.5").unwrap();
        assert_eq!(config.sediment.d50, DEFAULT_D50);
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        let err = ModelConfig::from_toml_str("[current\nwatt = ").unwrap_err();
        assert!(matches!(err, FemError::Config(_)));
    }
}
