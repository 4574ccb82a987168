use crate::params::ConfigError;

/// Errors raised by the solver before or around a self-consistency run.
///
/// Eigensolver non-convergence and iteration exhaustion are not errors; they
/// are reported through [`crate::EigenSpectrum::info`] and
/// [`crate::ScfOutcome::Exhausted`].
#[derive(Debug, thiserror::Error)]
pub enum BdgError {
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("lattice size must be positive")]
  EmptyLattice,

  #[error("temperature must be positive and finite, got {0}")]
  InvalidTemperature(f64),

  #[error("{name} has length {actual}, expected {expected}")]
  LengthMismatch {
    name: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("output error: {0}")]
  Io(#[from] std::io::Error),
}
