//! Run configuration.
//!
//! A run is described by a TOML file with the lattice, the physical couplings,
//! the initial guesses, the iteration policy, the temperature list and the
//! output settings:
//!
//! ```toml
//! temperatures = [0.01, 0.05, 0.1]
//!
//! [lattice]
//! size = 10
//!
//! [physics]
//! hopping = 1.0
//! chemical_potential = 0.3
//! magnetic_field = 0.1
//! trap_coefficient = 0.06
//! interaction = -6.0
//! boltzmann = 1.0
//!
//! [initial]
//! pairing = 1.0
//! up_density = 1.0
//! down_density = 1.0
//!
//! [iteration]
//! max_iterations = 100
//! tolerance = 1e-6
//! mixing = 0.5
//!
//! [output]
//! directory = "output"
//! sparse_export = false
//! sparse_file = "hamiltonian.mtx"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BdgError;
use crate::lattice::LatticeGeometry;

/// Physical couplings and iteration policy shared by the Hamiltonian builder,
/// the order-parameter updater and the convergence controller.
///
/// Built once per run and passed by value; nothing here changes between
/// temperatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
  pub hopping: f64,
  pub chemical_potential: f64,
  /// Zeeman splitting between the two spin species.
  pub magnetic_field: f64,
  /// Coefficient of the harmonic trap `c*(x^2 + y^2)`.
  pub trap_coefficient: f64,
  /// On-site interaction U; negative values are attractive.
  pub interaction: f64,
  pub boltzmann: f64,
  pub tolerance: f64,
  /// Weight of the previous pairing field when mixing iterates.
  pub mixing: f64,
  pub max_iterations: usize,
}

impl PhysicalParameters {
  pub fn up_chemical_potential(&self) -> f64 {
    self.chemical_potential + self.magnetic_field
  }

  pub fn down_chemical_potential(&self) -> f64 {
    self.chemical_potential - self.magnetic_field
  }
}

/// Uniform starting values assigned to every lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct InitialValues {
  pub pairing: f64,
  pub up_density: f64,
  pub down_density: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatticeSection {
  pub size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsSection {
  pub hopping: f64,
  pub chemical_potential: f64,
  #[serde(default)]
  pub magnetic_field: f64,
  #[serde(default)]
  pub trap_coefficient: f64,
  pub interaction: f64,
  pub boltzmann: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IterationSection {
  pub max_iterations: usize,
  pub tolerance: f64,
  #[serde(default = "default_mixing")]
  pub mixing: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
  #[serde(default = "default_output_directory")]
  pub directory: PathBuf,
  #[serde(default)]
  pub sparse_export: bool,
  #[serde(default = "default_sparse_file")]
  pub sparse_file: PathBuf,
}

impl Default for OutputSection {
  fn default() -> Self {
    OutputSection {
      directory: default_output_directory(),
      sparse_export: false,
      sparse_file: default_sparse_file(),
    }
  }
}

fn default_mixing() -> f64 {
  0.5
}

fn default_output_directory() -> PathBuf {
  PathBuf::from("output")
}

fn default_sparse_file() -> PathBuf {
  PathBuf::from("hamiltonian.mtx")
}

/// Complete description of a temperature sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  pub temperatures: Vec<f64>,
  pub lattice: LatticeSection,
  pub physics: PhysicsSection,
  pub initial: InitialValues,
  pub iteration: IterationSection,
  #[serde(default)]
  pub output: OutputSection,
}

impl SimulationConfig {
  /// Load and validate a configuration from a TOML file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_str(&content)
  }

  /// Parse and validate a configuration from a TOML string.
  #[allow(clippy::should_implement_trait)]
  pub fn from_str(s: &str) -> Result<Self, ConfigError> {
    let config: SimulationConfig = toml::from_str(s)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.lattice.size == 0 {
      return Err(ConfigError::Invalid("lattice size must be positive".into()));
    }
    if self.temperatures.is_empty() {
      return Err(ConfigError::Invalid("temperature list is empty".into()));
    }
    if let Some(t) = self
      .temperatures
      .iter()
      .find(|t| !t.is_finite() || **t <= 0.0)
    {
      return Err(ConfigError::Invalid(format!(
        "temperatures must be positive and finite, got {t}"
      )));
    }
    if !(self.physics.boltzmann > 0.0) {
      return Err(ConfigError::Invalid("boltzmann factor must be positive".into()));
    }
    if !(0.0..=1.0).contains(&self.iteration.mixing) {
      return Err(ConfigError::Invalid(format!(
        "mixing weight must lie in [0, 1], got {}",
        self.iteration.mixing
      )));
    }
    if !(self.iteration.tolerance > 0.0) {
      return Err(ConfigError::Invalid("tolerance must be positive".into()));
    }
    if self.iteration.max_iterations == 0 {
      return Err(ConfigError::Invalid("max_iterations must be at least 1".into()));
    }
    Ok(())
  }

  pub fn geometry(&self) -> Result<LatticeGeometry, BdgError> {
    LatticeGeometry::new(self.lattice.size)
  }

  pub fn physical_parameters(&self) -> PhysicalParameters {
    PhysicalParameters {
      hopping: self.physics.hopping,
      chemical_potential: self.physics.chemical_potential,
      magnetic_field: self.physics.magnetic_field,
      trap_coefficient: self.physics.trap_coefficient,
      interaction: self.physics.interaction,
      boltzmann: self.physics.boltzmann,
      tolerance: self.iteration.tolerance,
      mixing: self.iteration.mixing,
      max_iterations: self.iteration.max_iterations,
    }
  }

  /// Path of the Matrix Market export, when enabled.
  pub fn sparse_export_path(&self) -> Option<PathBuf> {
    self
      .output
      .sparse_export
      .then(|| self.output.directory.join(&self.output.sparse_file))
  }
}

/// Configuration parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("TOML parsing error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("Invalid parameter: {0}")]
  Invalid(String),
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  const CONFIG: &str = r#"
temperatures = [0.01, 0.1]

[lattice]
size = 3

[physics]
hopping = 1.0
chemical_potential = 0.3
magnetic_field = 0.1
trap_coefficient = 0.06
interaction = -6.0
boltzmann = 1000.0

[initial]
pairing = 1.0
up_density = 1.0
down_density = 1.0

[iteration]
max_iterations = 50
tolerance = 1e-6
"#;

  #[test]
  fn parses_full_config() {
    let config = SimulationConfig::from_str(CONFIG).unwrap();
    assert_eq!(config.lattice.size, 3);
    assert_eq!(config.temperatures, vec![0.01, 0.1]);
    assert_relative_eq!(config.iteration.mixing, 0.5);
    assert_eq!(config.output.directory, PathBuf::from("output"));
    assert!(config.sparse_export_path().is_none());

    let params = config.physical_parameters();
    assert_relative_eq!(params.up_chemical_potential(), 0.4);
    assert_relative_eq!(params.down_chemical_potential(), 0.2);
    assert_eq!(params.max_iterations, 50);
  }

  #[test]
  fn sparse_path_joins_output_directory() {
    let text = format!("{CONFIG}\n[output]\ndirectory = \"out\"\nsparse_export = true\n");
    let config = SimulationConfig::from_str(&text).unwrap();
    assert_eq!(
      config.sparse_export_path(),
      Some(PathBuf::from("out").join("hamiltonian.mtx"))
    );
  }

  #[test]
  fn rejects_zero_lattice() {
    let text = CONFIG.replace("size = 3", "size = 0");
    assert!(matches!(
      SimulationConfig::from_str(&text),
      Err(ConfigError::Invalid(_))
    ));
  }

  #[test]
  fn rejects_non_positive_temperature() {
    let text = CONFIG.replace("[0.01, 0.1]", "[0.01, 0.0]");
    assert!(matches!(
      SimulationConfig::from_str(&text),
      Err(ConfigError::Invalid(_))
    ));
    let text = CONFIG.replace("[0.01, 0.1]", "[]");
    assert!(SimulationConfig::from_str(&text).is_err());
  }

  #[test]
  fn rejects_mixing_out_of_range() {
    let text = CONFIG.replace("tolerance = 1e-6", "tolerance = 1e-6\nmixing = 1.5");
    assert!(matches!(
      SimulationConfig::from_str(&text),
      Err(ConfigError::Invalid(_))
    ));
  }

  #[test]
  fn reports_missing_fields() {
    let text = CONFIG.replace("hopping = 1.0\n", "");
    assert!(matches!(
      SimulationConfig::from_str(&text),
      Err(ConfigError::Toml(_))
    ));
  }
}
