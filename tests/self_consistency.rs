use approx::assert_abs_diff_eq;
use bdg_lattice::{
  output, InitialValues, LatticeGeometry, LoopPhase, PhysicalParameters, ScfOutcome, SelfConsistencyLoop,
  SimulationConfig, TemperatureSweep,
};

fn params() -> PhysicalParameters {
  PhysicalParameters {
    hopping: 1.0,
    chemical_potential: 0.3,
    magnetic_field: 0.0,
    trap_coefficient: 0.06,
    interaction: -6.0,
    boltzmann: 1000.0,
    tolerance: 1e-6,
    mixing: 0.5,
    max_iterations: 100,
  }
}

fn uniform(value: f64) -> InitialValues {
  InitialValues {
    pairing: value,
    up_density: value,
    down_density: value,
  }
}

#[test]
fn exhausted_loop_still_returns_the_last_iterate() {
  let geometry = LatticeGeometry::new(3).unwrap();
  let mut p = params();
  p.max_iterations = 1;
  p.tolerance = 1e-12;
  let mut scf = SelfConsistencyLoop::new(geometry, p, uniform(1.0), 1e-3).unwrap();

  let outcome = scf.run().unwrap();
  assert_eq!(outcome, ScfOutcome::Exhausted { iterations: 1 });
  assert_eq!(scf.phase(), LoopPhase::Exhausted { iterations: 1 });

  let state = scf.into_state();
  assert_eq!(state.pairing.len(), 18);
  assert_eq!(state.up_density.len(), 18);
  assert_eq!(state.down_density.len(), 18);
  assert!(state.pairing.iter().all(|d| d.is_finite()));
  let total = state.total_particle_number();
  assert!(total >= 0.0 && total <= 18.0 + 1e-9);
}

#[test]
fn decaying_pairing_converges() {
  // without interaction the recomputed pairing is identically zero, so the
  // mixed field halves every step until the largest change stops moving
  let geometry = LatticeGeometry::new(3).unwrap();
  let mut p = params();
  p.interaction = 0.0;
  let mut scf = SelfConsistencyLoop::new(geometry, p, uniform(1.0), 0.01).unwrap();

  let outcome = scf.run().unwrap();
  assert!(outcome.is_converged());
  assert!(outcome.iterations() > 10 && outcome.iterations() < 40);
  for &delta in &scf.state().pairing {
    assert_abs_diff_eq!(delta, 0.0);
  }
}

#[test]
fn spin_imbalance_follows_the_field() {
  let geometry = LatticeGeometry::new(3).unwrap();
  let mut p = params();
  p.interaction = 0.0;
  p.magnetic_field = 0.5;
  p.max_iterations = 5;
  let mut scf = SelfConsistencyLoop::new(geometry, p, uniform(0.0), 0.01).unwrap();
  scf.run().unwrap();
  // up particles see mu + h, so they outnumber the down particles
  assert!(scf.state().magnetization() > 0.0);
}

#[test]
fn sweep_from_config() {
  let config = SimulationConfig::from_str(
    r#"
temperatures = [0.05, 0.01]

[lattice]
size = 3

[physics]
hopping = 1.0
chemical_potential = 0.3
magnetic_field = 0.1
trap_coefficient = 0.06
interaction = -2.0
boltzmann = 1.0

[initial]
pairing = 0.5
up_density = 0.5
down_density = 0.5

[iteration]
max_iterations = 40
tolerance = 1e-6
mixing = 0.3
"#,
  )
  .unwrap();

  let dir = tempfile::tempdir().unwrap();
  let geometry = config.geometry().unwrap();
  let sparse = dir.path().join("h.mtx");
  let sweep = TemperatureSweep::new(geometry, config.physical_parameters(), config.initial)
    .with_sparse_export(Some(sparse.clone()));
  let results = sweep.run(&config.temperatures).unwrap();

  assert_eq!(results.len(), 2);
  assert_eq!(results[0].temperature, 0.05);
  assert_eq!(results[1].temperature, 0.01);
  for result in &results {
    assert_eq!(result.state.len(), 18);
    assert!(result.outcome.iterations() >= 1);
    assert!(result.outcome.iterations() <= 40);
  }

  let text = std::fs::read_to_string(&sparse).unwrap();
  assert!(text.starts_with("%%MatrixMarket"));

  let written = output::write_results(dir.path(), &geometry, &results).unwrap();
  assert_eq!(written.len(), 2);
  assert!(dir.path().join("T=0.05.txt").exists());
}

#[test]
fn shipped_config_is_valid() {
  let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("conf/parameters.toml");
  let config = SimulationConfig::from_file(&path).unwrap();
  assert_eq!(config.lattice.size, 10);
  assert_eq!(config.temperatures.len(), 3);
  assert!(config.sparse_export_path().is_none());
}
