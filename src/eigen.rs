use lapack::dsyevd;

use crate::error::BdgError;
use crate::hamiltonian::BdgMatrix;
use crate::lattice::s2i;
use crate::state::check_len;

/// Eigenpairs of one BdG matrix.
///
/// Eigenvalues are ascending and eigenvector `k` is column `k` of the
/// column-major `vectors` buffer. `info` is the LAPACK status: zero on
/// success, nonzero when the decomposition did not converge, in which case
/// the pairs hold whatever the routine left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenSpectrum {
  dim: usize,
  values: Vec<f64>,
  vectors: Vec<f64>,
  info: i32,
}

impl EigenSpectrum {
  /// Assembles a spectrum from eigenvalues and column-major eigenvectors.
  pub fn from_parts(values: Vec<f64>, vectors: Vec<f64>, info: i32) -> Result<EigenSpectrum, BdgError> {
    let dim = values.len();
    check_len("eigenvectors", &vectors, dim * dim)?;
    Ok(EigenSpectrum {
      dim,
      values,
      vectors,
      info,
    })
  }

  pub fn len(&self) -> usize {
    self.dim
  }

  pub fn is_empty(&self) -> bool {
    self.dim == 0
  }

  pub fn info(&self) -> i32 {
    self.info
  }

  pub fn is_converged(&self) -> bool {
    self.info == 0
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub fn value(&self, k: usize) -> f64 {
    self.values[k]
  }

  pub fn vector(&self, k: usize) -> &[f64] {
    &self.vectors[k * self.dim..(k + 1) * self.dim]
  }

  // Component `j` of eigenvector `k`.
  pub fn component(&self, k: usize, j: usize) -> f64 {
    self.vectors[s2i(j, k, self.dim)]
  }

  pub fn pairs(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
    (0..self.dim).map(move |k| (self.values[k], self.vector(k)))
  }
}

/// Dense symmetric eigensolver backed by LAPACK's divide-and-conquer `dsyevd`.
///
/// Work arrays are sized once for a fixed dimension and reused across calls.
pub struct EigenSolver {
  dim: usize,
  work: Vec<f64>,
  iwork: Vec<i32>,
}

impl EigenSolver {
  pub fn new(dim: usize) -> EigenSolver {
    // minimal workspace for jobz = 'V' from the dsyevd documentation
    let (lwork, liwork) = if dim <= 1 {
      (1, 1)
    } else {
      (1 + 6 * dim + 2 * dim * dim, 3 + 5 * dim)
    };
    EigenSolver {
      dim,
      work: vec![0.0; lwork],
      iwork: vec![0; liwork],
    }
  }

  pub fn dim(&self) -> usize {
    self.dim
  }

  /// Diagonalizes `matrix`, consuming its storage for the eigenvectors.
  pub fn diagonalize(&mut self, matrix: BdgMatrix) -> Result<EigenSpectrum, BdgError> {
    if matrix.dim() != self.dim {
      return Err(BdgError::LengthMismatch {
        name: "matrix dimension",
        expected: self.dim,
        actual: matrix.dim(),
      });
    }
    let n = self.dim as i32;
    let lwork = self.work.len() as i32;
    let liwork = self.iwork.len() as i32;
    let mut vectors = matrix.into_vec();
    let mut values = vec![0.0; self.dim];
    let mut info: i32 = 0;

    unsafe {
      dsyevd(
        b'V',
        b'U',
        n,
        &mut vectors,
        n.max(1),
        &mut values,
        &mut self.work,
        lwork,
        &mut self.iwork,
        liwork,
        &mut info,
      );
    }

    EigenSpectrum::from_parts(values, vectors, info)
  }
}
