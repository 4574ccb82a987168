use crate::error::BdgError;
use crate::lattice::LatticeGeometry;
use crate::params::PhysicalParameters;
use crate::state::check_len;

/// Outcome of comparing two successive pairing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceCheck {
  pub converged: bool,
  /// Largest per-site change `max_j |new(j) - old(j)|` of this call.
  pub max_difference: f64,
  /// Pairing field for the next Hamiltonian: the old field when converged,
  /// otherwise `w*old + (1-w)*new` on the lattice sites and zero on the
  /// hole half.
  pub next: Vec<f64>,
}

/// Decides when the pairing field has settled and damps the iteration.
///
/// Convergence is declared when the largest per-site change stops changing:
/// `|d_new - d_prev| < tolerance`, with `d_prev` the largest change of the
/// previous call (zero for a fresh controller). Only the first `num_sites`
/// entries are compared; the hole half of a pairing vector carries no
/// physics. A new controller is built for every temperature.
#[derive(Debug, Clone)]
pub struct ConvergenceController {
  num_sites: usize,
  tolerance: f64,
  mixing: f64,
  previous_max_difference: f64,
}

impl ConvergenceController {
  pub fn new(geometry: &LatticeGeometry, params: &PhysicalParameters) -> ConvergenceController {
    ConvergenceController::with_policy(geometry.num_sites(), params.tolerance, params.mixing)
  }

  pub fn with_policy(num_sites: usize, tolerance: f64, mixing: f64) -> ConvergenceController {
    ConvergenceController {
      num_sites,
      tolerance,
      mixing,
      previous_max_difference: 0.0,
    }
  }

  pub fn previous_max_difference(&self) -> f64 {
    self.previous_max_difference
  }

  pub fn check_and_mix(&mut self, old: &[f64], new: &[f64]) -> Result<ConvergenceCheck, BdgError> {
    check_len("new pairing", new, old.len())?;
    if old.len() < self.num_sites {
      return Err(BdgError::LengthMismatch {
        name: "old pairing",
        expected: self.num_sites,
        actual: old.len(),
      });
    }
    let ns = self.num_sites;

    let max_difference = old[..ns]
      .iter()
      .zip(&new[..ns])
      .map(|(a, b)| (b - a).abs())
      .fold(0.0, f64::max);

    if (max_difference - self.previous_max_difference).abs() < self.tolerance {
      return Ok(ConvergenceCheck {
        converged: true,
        max_difference,
        next: old.to_vec(),
      });
    }
    self.previous_max_difference = max_difference;

    let w = self.mixing;
    let mut next = vec![0.0; old.len()];
    for (slot, (a, b)) in next.iter_mut().zip(old[..ns].iter().zip(&new[..ns])) {
      *slot = w * a + (1.0 - w) * b;
    }
    Ok(ConvergenceCheck {
      converged: false,
      max_difference,
      next,
    })
  }
}
