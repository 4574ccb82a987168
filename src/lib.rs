//! Self-consistent Bogoliubov-de Gennes solver for a spin-imbalanced
//! two-dimensional lattice superconductor.
//!
//! For each temperature the solver builds the Nambu-doubled Hamiltonian from
//! the current pairing field and spin densities, diagonalizes it with LAPACK,
//! recomputes the pairing field and densities from Fermi-weighted spectral
//! sums and mixes old and new values until the largest change stabilizes.

extern crate blas;
extern crate lapack;
extern crate openblas_src;

pub mod convergence;
pub mod eigen;
pub mod error;
pub mod hamiltonian;
pub mod lattice;
pub mod output;
pub mod params;
pub mod scf;
pub mod state;
pub mod updater;

pub use convergence::{ConvergenceCheck, ConvergenceController};
pub use eigen::{EigenSolver, EigenSpectrum};
pub use error::BdgError;
pub use hamiltonian::{BdgMatrix, HamiltonianBuilder};
pub use lattice::{LatticeGeometry, NeighborTable};
pub use params::{ConfigError, InitialValues, PhysicalParameters, SimulationConfig};
pub use scf::{LoopPhase, ScfOutcome, SelfConsistencyLoop, TemperatureResult, TemperatureSweep};
pub use state::OrderParameterState;
pub use updater::{fermi, OrderParameterUpdater};
