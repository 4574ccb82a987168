use std::path::PathBuf;

use log::{debug, info, warn};

use crate::convergence::ConvergenceController;
use crate::eigen::{EigenSolver, EigenSpectrum};
use crate::error::BdgError;
use crate::hamiltonian::HamiltonianBuilder;
use crate::lattice::LatticeGeometry;
use crate::params::{InitialValues, PhysicalParameters};
use crate::state::OrderParameterState;
use crate::updater::OrderParameterUpdater;

/// Where a self-consistency loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
  Init,
  Iterating { iteration: usize },
  Converged { iterations: usize },
  Exhausted { iterations: usize },
}

impl LoopPhase {
  pub fn is_terminal(&self) -> bool {
    matches!(self, LoopPhase::Converged { .. } | LoopPhase::Exhausted { .. })
  }
}

/// Terminal state of one temperature's run. Exhaustion is not an error: the
/// last iterate is still the answer, and callers wanting a stricter policy
/// can reject it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScfOutcome {
  Converged { iterations: usize },
  Exhausted { iterations: usize },
}

impl ScfOutcome {
  pub fn iterations(&self) -> usize {
    match *self {
      ScfOutcome::Converged { iterations } | ScfOutcome::Exhausted { iterations } => iterations,
    }
  }

  pub fn is_converged(&self) -> bool {
    matches!(self, ScfOutcome::Converged { .. })
  }
}

/// Fixed-point iteration of the BdG equations at one temperature.
///
/// Each step builds H from the current pairing field and densities,
/// diagonalizes it, recomputes the fields from the spectrum and asks the
/// convergence controller whether to stop or what mixed pairing field to feed
/// into the next build.
pub struct SelfConsistencyLoop {
  temperature: f64,
  max_iterations: usize,
  builder: HamiltonianBuilder,
  solver: EigenSolver,
  updater: OrderParameterUpdater,
  controller: ConvergenceController,
  initial: InitialValues,
  // pairing field that enters the next build
  pairing_input: Vec<f64>,
  state: OrderParameterState,
  phase: LoopPhase,
}

impl SelfConsistencyLoop {
  pub fn new(
    geometry: LatticeGeometry,
    params: PhysicalParameters,
    initial: InitialValues,
    temperature: f64,
  ) -> Result<SelfConsistencyLoop, BdgError> {
    if !temperature.is_finite() || temperature <= 0.0 {
      return Err(BdgError::InvalidTemperature(temperature));
    }
    let state = OrderParameterState::uniform(&geometry, &initial);
    Ok(SelfConsistencyLoop {
      temperature,
      max_iterations: params.max_iterations,
      builder: HamiltonianBuilder::new(geometry, params),
      solver: EigenSolver::new(geometry.matrix_size()),
      updater: OrderParameterUpdater::new(geometry, &params),
      controller: ConvergenceController::new(&geometry, &params),
      initial,
      pairing_input: state.pairing.clone(),
      state,
      phase: LoopPhase::Init,
    })
  }

  pub fn with_sparse_export(mut self, path: PathBuf) -> SelfConsistencyLoop {
    self.builder = self.builder.with_sparse_export(path);
    self
  }

  pub fn temperature(&self) -> f64 {
    self.temperature
  }

  pub fn phase(&self) -> LoopPhase {
    self.phase
  }

  /// The most recently computed pairing field and densities.
  pub fn state(&self) -> &OrderParameterState {
    &self.state
  }

  /// Advances the loop by one transition and returns the new phase.
  pub fn step(&mut self) -> Result<LoopPhase, BdgError> {
    self.phase = match self.phase {
      LoopPhase::Init => {
        self.state = OrderParameterState::uniform(self.builder.geometry(), &self.initial);
        self.pairing_input = self.state.pairing.clone();
        if self.max_iterations == 0 {
          LoopPhase::Exhausted { iterations: 0 }
        } else {
          LoopPhase::Iterating { iteration: 0 }
        }
      }
      LoopPhase::Iterating { iteration } => self.iterate(iteration)?,
      terminal => terminal,
    };
    Ok(self.phase)
  }

  /// Runs until the loop converges or exhausts its iteration budget.
  pub fn run(&mut self) -> Result<ScfOutcome, BdgError> {
    loop {
      match self.step()? {
        LoopPhase::Converged { iterations } => return Ok(ScfOutcome::Converged { iterations }),
        LoopPhase::Exhausted { iterations } => return Ok(ScfOutcome::Exhausted { iterations }),
        _ => {}
      }
    }
  }

  pub fn into_state(self) -> OrderParameterState {
    self.state
  }

  fn iterate(&mut self, iteration: usize) -> Result<LoopPhase, BdgError> {
    let t = self.temperature;
    let h = self.builder.build(
      &self.pairing_input,
      &self.state.up_density,
      &self.state.down_density,
      t,
    )?;

    let spectrum = self.solver.diagonalize(h)?;
    self.absorb_spectrum(iteration, spectrum)
  }

  // Second half of an iteration: fields from the spectrum, then the
  // convergence decision.
  fn absorb_spectrum(&mut self, iteration: usize, spectrum: EigenSpectrum) -> Result<LoopPhase, BdgError> {
    let t = self.temperature;
    if !spectrum.is_converged() {
      // keep going with whatever the solver produced
      warn!(
        "eigensolver failed at T={} iteration {} (info = {})",
        t,
        iteration + 1,
        spectrum.info()
      );
    }

    let pairing = self.updater.update_order_parameter(&spectrum, t);
    let (up_density, down_density) = self.updater.update_particle_numbers(&spectrum, t);
    let check = self.controller.check_and_mix(&self.pairing_input, &pairing)?;

    self.state.pairing = pairing;
    self.state.up_density = up_density;
    self.state.down_density = down_density;

    let done = iteration + 1;
    debug!(
      "T={} iteration {}: max |d delta| = {:e}, N = {}",
      t,
      done,
      check.max_difference,
      self.state.total_particle_number()
    );

    if check.converged {
      info!("T={} converged after {} iterations", t, done);
      return Ok(LoopPhase::Converged { iterations: done });
    }
    self.pairing_input = check.next;
    if done >= self.max_iterations {
      info!("T={} did not converge within {} iterations", t, done);
      return Ok(LoopPhase::Exhausted { iterations: done });
    }
    Ok(LoopPhase::Iterating { iteration: done })
  }
}

/// Converged (or exhausted) fields for one temperature of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureResult {
  pub temperature: f64,
  pub outcome: ScfOutcome,
  pub state: OrderParameterState,
}

/// Runs the self-consistency loop once per temperature, in list order.
///
/// Every temperature starts from the same uniform initial guess with a fresh
/// builder and convergence controller.
#[derive(Debug, Clone)]
pub struct TemperatureSweep {
  geometry: LatticeGeometry,
  params: PhysicalParameters,
  initial: InitialValues,
  sparse_export: Option<PathBuf>,
}

impl TemperatureSweep {
  pub fn new(geometry: LatticeGeometry, params: PhysicalParameters, initial: InitialValues) -> TemperatureSweep {
    TemperatureSweep {
      geometry,
      params,
      initial,
      sparse_export: None,
    }
  }

  pub fn with_sparse_export(mut self, path: Option<PathBuf>) -> TemperatureSweep {
    self.sparse_export = path;
    self
  }

  pub fn run_temperature(&self, temperature: f64) -> Result<TemperatureResult, BdgError> {
    info!(
      "starting T={} on a {}x{} lattice",
      temperature,
      self.geometry.size(),
      self.geometry.size()
    );
    let mut scf = SelfConsistencyLoop::new(self.geometry, self.params, self.initial, temperature)?;
    if let Some(path) = &self.sparse_export {
      scf = scf.with_sparse_export(path.clone());
    }
    let outcome = scf.run()?;
    Ok(TemperatureResult {
      temperature,
      outcome,
      state: scf.into_state(),
    })
  }

  pub fn run(&self, temperatures: &[f64]) -> Result<Vec<TemperatureResult>, BdgError> {
    if let Some(&bad) = temperatures.iter().find(|t| !t.is_finite() || **t <= 0.0) {
      return Err(BdgError::InvalidTemperature(bad));
    }
    let mut results = Vec::with_capacity(temperatures.len());
    for &temperature in temperatures {
      results.push(self.run_temperature(temperature)?);
    }
    Ok(results)
  }
}
