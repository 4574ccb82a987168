use crate::error::BdgError;

// Directions in the neighbor table, in the order they are stored.
pub const RIGHT: usize = 0;
pub const LEFT: usize = 1;
pub const DOWN: usize = 2;
pub const UP: usize = 3;

/// Square lattice of side `size` with periodic boundaries in both directions.
///
/// Sites are numbered row-major: row `r`, column `c` is site `r*size + c`.
/// The Nambu-doubled Hamiltonian has one particle and one hole index per
/// site, so its dimension is `2*size^2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeGeometry {
  size: usize,
}

impl LatticeGeometry {
  pub fn new(size: usize) -> Result<LatticeGeometry, BdgError> {
    if size == 0 {
      return Err(BdgError::EmptyLattice);
    }
    Ok(LatticeGeometry { size })
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn num_sites(&self) -> usize {
    self.size * self.size
  }

  pub fn matrix_size(&self) -> usize {
    2 * self.num_sites()
  }

  pub fn site(&self, row: usize, col: usize) -> usize {
    row * self.size + col
  }

  pub fn row_col(&self, site: usize) -> (usize, usize) {
    (site / self.size, site % self.size)
  }

  // Cartesian position of a site with the origin at the lattice center.
  // x grows along a row, y shrinks going down the rows.
  pub fn position(&self, site: usize) -> (f64, f64) {
    let (row, col) = self.row_col(site);
    let half = (self.size as f64 - 1.0) / 2.0;
    (col as f64 - half, half - row as f64)
  }

  /// Builds the periodic nearest-neighbor table for this lattice.
  pub fn neighbor_table(&self) -> NeighborTable {
    NeighborTable::new(self)
  }
}

/// The four periodic nearest neighbors of every site.
///
/// Entry `[RIGHT, LEFT, DOWN, UP]` of site `i` holds the neighboring site
/// index. On lattices of side 1 or 2 several directions land on the same
/// site; those hops are kept separately so that each direction contributes
/// its own hopping term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborTable {
  neighbors: Vec<[usize; 4]>,
}

impl NeighborTable {
  fn new(geometry: &LatticeGeometry) -> NeighborTable {
    let n = geometry.size();
    let neighbors = (0..geometry.num_sites())
      .map(|site| {
        let (row, col) = geometry.row_col(site);
        let mut hops = [0; 4];
        hops[RIGHT] = geometry.site(row, (col + 1) % n);
        hops[LEFT] = geometry.site(row, (col + n - 1) % n);
        hops[DOWN] = geometry.site((row + 1) % n, col);
        hops[UP] = geometry.site((row + n - 1) % n, col);
        hops
      })
      .collect();
    NeighborTable { neighbors }
  }

  pub fn num_sites(&self) -> usize {
    self.neighbors.len()
  }

  pub fn neighbors(&self, site: usize) -> &[usize; 4] {
    &self.neighbors[site]
  }

  // Every directed bond (site, neighbor) exactly once per direction.
  pub fn bonds(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .neighbors
      .iter()
      .enumerate()
      .flat_map(|(site, hops)| hops.iter().map(move |&other| (site, other)))
  }
}

// Converts a (row, column) pair into an index of a column-major n by n buffer,
// the layout LAPACK and BLAS work on.
pub(crate) fn s2i(a: usize, b: usize, n: usize) -> usize {
  a + b * n
}
