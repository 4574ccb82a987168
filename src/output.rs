//! Result files and Hamiltonian export.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::BdgError;
use crate::hamiltonian::BdgMatrix;
use crate::lattice::LatticeGeometry;
use crate::scf::TemperatureResult;

/// File name of the result for one temperature, e.g. `T=0.1.txt`.
pub fn result_file_name(temperature: f64) -> String {
  format!("T={:?}.txt", temperature)
}

/// Writes one record per site: row, column, n_up, n_down, pairing and the
/// magnetization n_up - n_down. Each lattice row is followed by a blank line
/// so gnuplot reads the file as a grid.
pub fn write_result<W: Write>(writer: &mut W, geometry: &LatticeGeometry, result: &TemperatureResult) -> io::Result<()> {
  let state = &result.state;
  writeln!(writer, "# T = {:?} ({:?})", result.temperature, result.outcome)?;
  writeln!(writer, "# x\ty\tn_up\tn_down\tdelta\tmagnetization")?;
  let n = geometry.size();
  for i in 0..n {
    for j in 0..n {
      let site = geometry.site(i, j);
      let up = state.up_density[site];
      let down = state.down_density[site];
      writeln!(
        writer,
        "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
        i,
        j,
        up,
        down,
        state.pairing[site],
        up - down
      )?;
    }
    writeln!(writer)?;
  }
  Ok(())
}

/// Writes every result of a sweep into `directory`, creating it if needed.
pub fn write_results(
  directory: &Path,
  geometry: &LatticeGeometry,
  results: &[TemperatureResult],
) -> Result<Vec<PathBuf>, BdgError> {
  fs::create_dir_all(directory)?;
  let mut written = Vec::with_capacity(results.len());
  for result in results {
    let path = directory.join(result_file_name(result.temperature));
    let mut writer = BufWriter::new(File::create(&path)?);
    write_result(&mut writer, geometry, result)?;
    writer.flush()?;
    info!("wrote {}", path.display());
    written.push(path);
  }
  Ok(written)
}

/// Matrix Market coordinate listing of every nonzero entry, 1-indexed, in
/// row-major scan order. Both triangles are listed.
pub fn write_matrix_market<W: Write>(writer: &mut W, matrix: &BdgMatrix) -> io::Result<()> {
  let entries: Vec<_> = matrix.nonzeros().collect();
  writeln!(writer, "%%MatrixMarket matrix coordinate real symmetric")?;
  writeln!(writer, "{} {} {}", matrix.dim(), matrix.dim(), entries.len())?;
  for (row, col, value) in entries {
    writeln!(writer, "{} {} {:e}", row + 1, col + 1, value)?;
  }
  Ok(())
}

/// Overwrites `path` with the Matrix Market form of `matrix`.
pub fn export_matrix_market(path: &Path, matrix: &BdgMatrix) -> io::Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }
  let mut writer = BufWriter::new(File::create(path)?);
  write_matrix_market(&mut writer, matrix)?;
  writer.flush()
}
