use std::path::PathBuf;

use log::warn;

use crate::error::BdgError;
use crate::lattice::{s2i, LatticeGeometry, NeighborTable};
use crate::output;
use crate::params::PhysicalParameters;
use crate::state::check_len;

/// Dense real-symmetric BdG matrix, stored column-major for LAPACK.
///
/// Rows and columns `0..N^2` form the particle block, `N^2..2N^2` the hole
/// block.
#[derive(Debug, Clone, PartialEq)]
pub struct BdgMatrix {
  dim: usize,
  data: Vec<f64>,
}

impl BdgMatrix {
  pub fn zeros(dim: usize) -> BdgMatrix {
    BdgMatrix {
      dim,
      data: vec![0.0; dim * dim],
    }
  }

  /// Wraps a row-major buffer. Symmetric inputs read the same either way.
  pub fn from_row_major(dim: usize, values: &[f64]) -> Result<BdgMatrix, BdgError> {
    check_len("matrix", values, dim * dim)?;
    let mut matrix = BdgMatrix::zeros(dim);
    for row in 0..dim {
      for col in 0..dim {
        matrix.data[s2i(row, col, dim)] = values[row * dim + col];
      }
    }
    Ok(matrix)
  }

  pub fn dim(&self) -> usize {
    self.dim
  }

  pub fn get(&self, row: usize, col: usize) -> f64 {
    self.data[s2i(row, col, self.dim)]
  }

  pub fn add(&mut self, row: usize, col: usize, value: f64) {
    self.data[s2i(row, col, self.dim)] += value;
  }

  pub fn into_vec(self) -> Vec<f64> {
    self.data
  }

  pub fn is_symmetric(&self) -> bool {
    (0..self.dim).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
  }

  /// Nonzero entries as `(row, col, value)` in row-major scan order.
  pub fn nonzeros(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
    (0..self.dim)
      .flat_map(move |row| (0..self.dim).map(move |col| (row, col, self.get(row, col))))
      .filter(|&(_, _, value)| value != 0.0)
  }
}

/// Assembles the BdG Hamiltonian for one lattice and one set of couplings.
///
/// The neighbor table is computed once at construction and reused for every
/// build.
#[derive(Debug, Clone)]
pub struct HamiltonianBuilder {
  geometry: LatticeGeometry,
  params: PhysicalParameters,
  neighbors: NeighborTable,
  sparse_export: Option<PathBuf>,
}

impl HamiltonianBuilder {
  pub fn new(geometry: LatticeGeometry, params: PhysicalParameters) -> HamiltonianBuilder {
    HamiltonianBuilder {
      neighbors: geometry.neighbor_table(),
      geometry,
      params,
      sparse_export: None,
    }
  }

  /// Write every built matrix to `path` in Matrix Market format,
  /// overwriting the previous build.
  pub fn with_sparse_export(mut self, path: PathBuf) -> HamiltonianBuilder {
    self.sparse_export = Some(path);
    self
  }

  pub fn geometry(&self) -> &LatticeGeometry {
    &self.geometry
  }

  /// Builds H from the pairing field and the spin densities.
  ///
  /// `_temperature` does not enter the matrix; it is accepted so that every
  /// stage of an iteration takes the same inputs.
  pub fn build(
    &self,
    pairing: &[f64],
    up_density: &[f64],
    down_density: &[f64],
    _temperature: f64,
  ) -> Result<BdgMatrix, BdgError> {
    let m = self.geometry.matrix_size();
    check_len("pairing", pairing, m)?;
    check_len("up_density", up_density, m)?;
    check_len("down_density", down_density, m)?;

    let mut h = BdgMatrix::zeros(m);
    self.add_hopping(&mut h);
    self.add_chemical_potential(&mut h);
    self.add_pairing(&mut h, pairing);
    self.add_trap_and_interaction(&mut h, up_density, down_density);

    if let Some(path) = &self.sparse_export {
      if let Err(err) = output::export_matrix_market(path, &h) {
        warn!("failed to export Hamiltonian to {}: {}", path.display(), err);
      }
    }
    Ok(h)
  }

  // -t between neighbors in the particle block, +t in the hole block.
  fn add_hopping(&self, h: &mut BdgMatrix) {
    let ns = self.geometry.num_sites();
    let t = self.params.hopping;
    for (site, other) in self.neighbors.bonds() {
      h.add(site, other, -t);
      h.add(site + ns, other + ns, t);
    }
  }

  fn add_chemical_potential(&self, h: &mut BdgMatrix) {
    let ns = self.geometry.num_sites();
    let mu_up = self.params.up_chemical_potential();
    let mu_down = self.params.down_chemical_potential();
    for site in 0..ns {
      h.add(site, site, -mu_up);
      h.add(site + ns, site + ns, mu_down);
    }
  }

  fn add_pairing(&self, h: &mut BdgMatrix, pairing: &[f64]) {
    let ns = self.geometry.num_sites();
    for (site, &delta) in pairing[..ns].iter().enumerate() {
      h.add(site, site + ns, delta);
      h.add(site + ns, site, delta);
    }
  }

  // The particle block sees the down density, the hole block the up density.
  fn add_trap_and_interaction(&self, h: &mut BdgMatrix, up_density: &[f64], down_density: &[f64]) {
    let ns = self.geometry.num_sites();
    let u = self.params.interaction;
    for site in 0..ns {
      let trap = self.trap_potential(site);
      h.add(site + ns, site + ns, -trap - u * up_density[site]);
      h.add(site, site, trap + u * down_density[site]);
    }
  }

  fn trap_potential(&self, site: usize) -> f64 {
    let (x, y) = self.geometry.position(site);
    self.params.trap_coefficient * (x * x + y * y)
  }
}
