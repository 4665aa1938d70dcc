use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use nbody_common::{SimulationConfig, TrajectoryFormat};
use nbody_engine::io::read_bodies;
use nbody_engine::trajectory::resolve_format;
use nbody_engine::Simulation;

/// Program that simulates the motion of planets.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of steps.
    #[arg(long)]
    num_steps: u32,

    /// We read the data from this file.
    #[arg(long)]
    input_file: PathBuf,

    /// Data is written to this file.
    #[arg(long)]
    output_file: PathBuf,

    /// File to store trajectories into (optional).
    #[arg(long)]
    trajectories_file: Option<PathBuf>,

    /// Number of cores (1 runs the serial force loop).
    #[arg(long)]
    num_cores: Option<usize>,

    /// Optional TOML file with timing, parallel and output settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trajectory encoding: npz, bincode, messagepack or json
    #[arg(long)]
    trajectory_format: Option<TrajectoryFormat>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting N-body engine...");

    // --- Load Configuration ---
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    config.timing.num_steps = args.num_steps;
    if let Some(cores) = args.num_cores {
        config.parallel.num_workers = cores;
    }
    if args.trajectory_format.is_some() {
        config.output.trajectory_format = args.trajectory_format;
    }
    config.validate()?;
    let params = config.sim_params();
    debug!("Resolved configuration: {:#?}", config);

    // --- Initialize Simulation ---
    let bodies = read_bodies(&args.input_file)?;
    let sim = Simulation::new(bodies, params, args.trajectories_file.is_some())?;
    info!("Initialized simulation with {} bodies.", sim.bodies().len());

    // --- Run; nothing is written unless every step succeeded ---
    let output = sim.run()?;

    // --- Save Results (trajectory first, positions last) ---
    let trajectory_target = args
        .trajectories_file
        .as_deref()
        .map(|path| (path, resolve_format(config.output.trajectory_format, path)));
    output.save(&args.output_file, trajectory_target)?;

    println!(
        "Simulated {} steps on {} core(s). Results written to {}.",
        params.num_steps,
        params.num_workers,
        args.output_file.display()
    );
    Ok(())
}
