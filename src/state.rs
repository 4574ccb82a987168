use crate::error::BdgError;
use crate::lattice::LatticeGeometry;
use crate::params::InitialValues;

/// Pairing field and spin-resolved densities of one self-consistency iterate.
///
/// All three vectors have the Hamiltonian dimension `2*N^2`. Only the first
/// `N^2` entries (one per lattice site) carry physics; the update rules leave
/// the upper half at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderParameterState {
  num_sites: usize,
  pub pairing: Vec<f64>,
  pub up_density: Vec<f64>,
  pub down_density: Vec<f64>,
}

impl OrderParameterState {
  /// Every entry of each vector gets the matching initial value.
  pub fn uniform(geometry: &LatticeGeometry, initial: &InitialValues) -> OrderParameterState {
    let m = geometry.matrix_size();
    OrderParameterState {
      num_sites: geometry.num_sites(),
      pairing: vec![initial.pairing; m],
      up_density: vec![initial.up_density; m],
      down_density: vec![initial.down_density; m],
    }
  }

  pub fn from_parts(
    geometry: &LatticeGeometry,
    pairing: Vec<f64>,
    up_density: Vec<f64>,
    down_density: Vec<f64>,
  ) -> Result<OrderParameterState, BdgError> {
    let expected = geometry.matrix_size();
    check_len("pairing", &pairing, expected)?;
    check_len("up_density", &up_density, expected)?;
    check_len("down_density", &down_density, expected)?;
    Ok(OrderParameterState {
      num_sites: geometry.num_sites(),
      pairing,
      up_density,
      down_density,
    })
  }

  pub fn len(&self) -> usize {
    self.pairing.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pairing.is_empty()
  }

  pub fn num_sites(&self) -> usize {
    self.num_sites
  }

  // Sum of both spin densities over the lattice sites.
  pub fn total_particle_number(&self) -> f64 {
    self.sites(&self.up_density).sum::<f64>() + self.sites(&self.down_density).sum::<f64>()
  }

  // Spin imbalance n_up - n_down summed over the lattice sites.
  pub fn magnetization(&self) -> f64 {
    self
      .sites(&self.up_density)
      .zip(self.sites(&self.down_density))
      .map(|(up, down)| up - down)
      .sum()
  }

  fn sites<'a>(&self, values: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
    values[..self.num_sites].iter().copied()
  }
}

pub(crate) fn check_len(name: &'static str, values: &[f64], expected: usize) -> Result<(), BdgError> {
  if values.len() != expected {
    return Err(BdgError::LengthMismatch {
      name,
      expected,
      actual: values.len(),
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn initial(pairing: f64, up: f64, down: f64) -> InitialValues {
    InitialValues {
      pairing,
      up_density: up,
      down_density: down,
    }
  }

  #[test]
  fn uniform_fills_every_entry() {
    let geometry = LatticeGeometry::new(3).unwrap();
    let state = OrderParameterState::uniform(&geometry, &initial(0.7, 0.4, 0.2));
    assert_eq!(state.len(), 18);
    assert!(state.pairing.iter().all(|&v| v == 0.7));
    assert!(state.up_density.iter().all(|&v| v == 0.4));
    assert!(state.down_density.iter().all(|&v| v == 0.2));
  }

  #[test]
  fn observables_only_count_lattice_sites() {
    let geometry = LatticeGeometry::new(2).unwrap();
    let state = OrderParameterState::uniform(&geometry, &initial(1.0, 0.75, 0.25));
    assert_relative_eq!(state.total_particle_number(), 4.0);
    assert_relative_eq!(state.magnetization(), 2.0);
  }

  #[test]
  fn from_parts_checks_lengths() {
    let geometry = LatticeGeometry::new(2).unwrap();
    let result = OrderParameterState::from_parts(&geometry, vec![0.0; 8], vec![0.0; 7], vec![0.0; 8]);
    match result {
      Err(BdgError::LengthMismatch { name, expected, actual }) => {
        assert_eq!(name, "up_density");
        assert_eq!(expected, 8);
        assert_eq!(actual, 7);
      }
      other => panic!("unexpected result {other:?}"),
    }
  }
}
