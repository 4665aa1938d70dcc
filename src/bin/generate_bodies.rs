use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use nbody_engine::io::write_bodies;
use nbody_engine::scenario::{random_cluster, ClusterParams};

/// Writes a random body set in the engine's 7-column input format.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of bodies to generate
    #[arg(short, long)]
    num_bodies: usize,

    /// Output CSV path
    #[arg(short, long)]
    output: PathBuf,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Positions are drawn from [-half_width, half_width) on each axis
    #[arg(long, default_value_t = 10.0)]
    half_width: f64,

    /// Standard deviation of each velocity component
    #[arg(long, default_value_t = 0.1)]
    velocity_sigma: f64,

    #[arg(long, default_value_t = 0.5)]
    min_mass: f64,

    #[arg(long, default_value_t = 2.0)]
    max_mass: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = ClusterParams {
        half_width: args.half_width,
        velocity_sigma: args.velocity_sigma,
        min_mass: args.min_mass,
        max_mass: args.max_mass,
    };
    let bodies = random_cluster(args.num_bodies, args.seed, &params)?;
    write_bodies(&args.output, &bodies)?;
    info!("Wrote {} bodies (seed {}) to {}", bodies.len(), args.seed, args.output.display());
    Ok(())
}
