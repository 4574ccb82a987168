use blas::dgemv;

use crate::eigen::EigenSpectrum;
use crate::lattice::{s2i, LatticeGeometry};
use crate::params::PhysicalParameters;

/// Fermi occupation `1 / (exp(E / (k_B T)) + 1)`.
pub fn fermi(energy: f64, temperature: f64, boltzmann: f64) -> f64 {
  1.0 / ((energy / (boltzmann * temperature)).exp() + 1.0)
}

/// Recomputes the pairing field and spin densities from a BdG spectrum.
///
/// With `u_k(j)` the particle component and `v_k(j)` the hole component of
/// eigenvector `k` at site `j`:
///
/// - `delta(j) = U * sum_k u_k(j) v_k(j) f(E_k)`
/// - `n_up(j)  = sum_k u_k(j)^2 f(E_k)`
/// - `n_dn(j)  = sum_k v_k(j)^2 f(-E_k)`
///
/// Every sum runs over the whole spectrum. Results have the Hamiltonian
/// dimension with the hole half left at zero.
#[derive(Debug, Clone)]
pub struct OrderParameterUpdater {
  geometry: LatticeGeometry,
  interaction: f64,
  boltzmann: f64,
}

impl OrderParameterUpdater {
  pub fn new(geometry: LatticeGeometry, params: &PhysicalParameters) -> OrderParameterUpdater {
    OrderParameterUpdater {
      geometry,
      interaction: params.interaction,
      boltzmann: params.boltzmann,
    }
  }

  pub fn update_order_parameter(&self, spectrum: &EigenSpectrum, temperature: f64) -> Vec<f64> {
    let weights = self.occupations(spectrum, temperature, 1.0);
    self.mode_sum(spectrum, &weights, self.interaction, |u, v| u * v)
  }

  /// Returns `(n_up, n_down)`.
  pub fn update_particle_numbers(&self, spectrum: &EigenSpectrum, temperature: f64) -> (Vec<f64>, Vec<f64>) {
    let particles = self.occupations(spectrum, temperature, 1.0);
    let holes = self.occupations(spectrum, temperature, -1.0);
    let up = self.mode_sum(spectrum, &particles, 1.0, |u, _| u * u);
    let down = self.mode_sum(spectrum, &holes, 1.0, |_, v| v * v);
    (up, down)
  }

  fn occupations(&self, spectrum: &EigenSpectrum, temperature: f64, sign: f64) -> Vec<f64> {
    spectrum
      .values()
      .iter()
      .map(|&energy| fermi(sign * energy, temperature, self.boltzmann))
      .collect()
  }

  // alpha * P w, where P[j, k] = product(u_k(j), v_k(j)) over the lattice
  // sites j and all modes k. P is column-major, ns rows by m columns.
  fn mode_sum<F>(&self, spectrum: &EigenSpectrum, weights: &[f64], alpha: f64, product: F) -> Vec<f64>
  where
    F: Fn(f64, f64) -> f64,
  {
    let ns = self.geometry.num_sites();
    let m = spectrum.len();
    let mut out = vec![0.0; m];
    if ns == 0 || m == 0 {
      return out;
    }

    let mut p = vec![0.0; ns * m];
    for k in 0..m {
      let vector = spectrum.vector(k);
      for j in 0..ns {
        p[s2i(j, k, ns)] = product(vector[j], vector[j + ns]);
      }
    }

    unsafe {
      dgemv(
        b'N',
        ns as i32,
        m as i32,
        alpha,
        &p,
        ns as i32,
        weights,
        1,
        0.0,
        &mut out[..ns],
        1,
      );
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::eigen::EigenSolver;
  use crate::hamiltonian::tests::{reference_params, REFERENCE};
  use crate::hamiltonian::BdgMatrix;
  use approx::assert_abs_diff_eq;

  fn single_site() -> (LatticeGeometry, PhysicalParameters) {
    let mut params = reference_params();
    params.boltzmann = 1.0;
    (LatticeGeometry::new(1).unwrap(), params)
  }

  #[test]
  fn fermi_function() {
    assert_abs_diff_eq!(fermi(0.0, 0.3, 1.0), 0.5);
    assert_abs_diff_eq!(fermi(0.7, 0.3, 2.0) + fermi(-0.7, 0.3, 2.0), 1.0, epsilon = 1e-15);
    assert_abs_diff_eq!(fermi(1.0, 1.0, 1.0), 1.0 / (1.0_f64.exp() + 1.0));
    // deep below and far above the Fermi level
    assert_abs_diff_eq!(fermi(-1e3, 1e-3, 1.0), 1.0);
    assert_abs_diff_eq!(fermi(1e3, 1e-3, 1.0), 0.0);
  }

  #[test]
  fn unmixed_modes_carry_no_pairing() {
    let (geometry, params) = single_site();
    let spectrum = EigenSpectrum::from_parts(vec![-1.0, 1.0], vec![1.0, 0.0, 0.0, 1.0], 0).unwrap();
    let updater = OrderParameterUpdater::new(geometry, &params);

    let delta = updater.update_order_parameter(&spectrum, 0.5);
    assert_eq!(delta.len(), 2);
    assert_abs_diff_eq!(delta[0], 0.0);

    let (up, down) = updater.update_particle_numbers(&spectrum, 0.5);
    assert_abs_diff_eq!(up[0], fermi(-1.0, 0.5, 1.0), epsilon = 1e-15);
    // the hole-like mode at +1 is occupied through f(-E)
    assert_abs_diff_eq!(down[0], fermi(-1.0, 0.5, 1.0), epsilon = 1e-15);
    assert_abs_diff_eq!(up[1], 0.0);
    assert_abs_diff_eq!(down[1], 0.0);
  }

  #[test]
  fn mixed_modes_pair() {
    let (geometry, params) = single_site();
    let s = std::f64::consts::FRAC_1_SQRT_2;
    let spectrum = EigenSpectrum::from_parts(vec![-1.0, 1.0], vec![s, s, s, -s], 0).unwrap();
    let updater = OrderParameterUpdater::new(geometry, &params);
    let t = 0.25;

    let delta = updater.update_order_parameter(&spectrum, t);
    let expected = params.interaction * 0.5 * (fermi(-1.0, t, 1.0) - fermi(1.0, t, 1.0));
    assert_abs_diff_eq!(delta[0], expected, epsilon = 1e-12);

    let (up, down) = updater.update_particle_numbers(&spectrum, t);
    assert_abs_diff_eq!(up[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(down[0], 0.5, epsilon = 1e-12);
  }

  #[test]
  fn occupations_are_bounded() {
    let spectrum = EigenSolver::new(18)
      .diagonalize(BdgMatrix::from_row_major(18, &REFERENCE).unwrap())
      .unwrap();
    let geometry = LatticeGeometry::new(3).unwrap();
    let updater = OrderParameterUpdater::new(geometry, &reference_params());
    for &t in &[1e-4, 1e-2, 1.0] {
      let (up, down) = updater.update_particle_numbers(&spectrum, t);
      for j in 0..9 {
        assert!((-1e-12..=1.0 + 1e-12).contains(&up[j]));
        assert!((-1e-12..=1.0 + 1e-12).contains(&down[j]));
      }
      assert!(up[9..].iter().all(|&v| v == 0.0));
      let total_up: f64 = up.iter().sum();
      let total_down: f64 = down.iter().sum();
      assert!(total_up >= 0.0 && total_up <= 9.0 + 1e-9);
      assert!(total_down >= 0.0 && total_down <= 9.0 + 1e-9);
    }
  }

  #[test]
  fn high_temperature_half_fills() {
    let spectrum = EigenSolver::new(18)
      .diagonalize(BdgMatrix::from_row_major(18, &REFERENCE).unwrap())
      .unwrap();
    let geometry = LatticeGeometry::new(3).unwrap();
    let updater = OrderParameterUpdater::new(geometry, &reference_params());
    let (up, down) = updater.update_particle_numbers(&spectrum, 1e6);
    let delta = updater.update_order_parameter(&spectrum, 1e6);
    for j in 0..9 {
      assert_abs_diff_eq!(up[j], 0.5, epsilon = 1e-6);
      assert_abs_diff_eq!(down[j], 0.5, epsilon = 1e-6);
      assert_abs_diff_eq!(delta[j], 0.0, epsilon = 1e-6);
    }
  }
}
