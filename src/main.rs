use std::path::PathBuf;

use bdg_lattice::{output, SimulationConfig, TemperatureSweep};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "bdg-lattice", about = "Self-consistent BdG solver for a spin-imbalanced 2D lattice")]
struct Cli {
  /// Path to a TOML configuration file
  #[arg(short, long)]
  config: PathBuf,
  /// Directory for result files (overrides [output] directory)
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// Export every Hamiltonian build in Matrix Market format
  #[arg(long)]
  sparse_export: bool,
  /// Only log warnings and errors
  #[arg(long)]
  quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();
  let default_level = if cli.quiet { "warn" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

  info!("loading config {}", cli.config.display());
  let mut config = SimulationConfig::from_file(&cli.config)?;
  if let Some(dir) = cli.output {
    config.output.directory = dir;
  }
  if cli.sparse_export {
    config.output.sparse_export = true;
  }

  let geometry = config.geometry()?;
  let sweep = TemperatureSweep::new(geometry, config.physical_parameters(), config.initial)
    .with_sparse_export(config.sparse_export_path());
  let results = sweep.run(&config.temperatures)?;

  for result in &results {
    info!(
      "T={}: {:?}, N = {:.6}, M = {:.6}",
      result.temperature,
      result.outcome,
      result.state.total_particle_number(),
      result.state.magnetization()
    );
  }
  output::write_results(&config.output.directory, &geometry, &results)?;
  info!("calculation finished");
  Ok(())
}
