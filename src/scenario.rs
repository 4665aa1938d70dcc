//! Reproducible random initial conditions.

use crate::state::{Body, BodySet};
use anyhow::Result;
use nbody_common::Vec3;
use rand::prelude::*;
use rand::distr::Uniform;
use rand_distr::Normal;

/// Shape of a random cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Positions are uniform in the cube `[-half_width, half_width)^3`.
    pub half_width: f64,
    /// Standard deviation of each velocity component.
    pub velocity_sigma: f64,
    pub min_mass: f64,
    pub max_mass: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self { half_width: 10.0, velocity_sigma: 0.1, min_mass: 0.5, max_mass: 2.0 }
    }
}

/// Places `n` bodies at random. The same seed always yields the same set.
pub fn random_cluster(n: usize, seed: u64, params: &ClusterParams) -> Result<BodySet> {
    if !(params.min_mass > 0.0 && params.max_mass > params.min_mass) {
        anyhow::bail!(
            "Mass range must satisfy 0 < min_mass < max_mass, got [{}, {}).",
            params.min_mass,
            params.max_mass
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let position_dist = Uniform::new(-params.half_width, params.half_width)?;
    let velocity_dist = Normal::new(0.0, params.velocity_sigma)?;
    let mass_dist = Uniform::new(params.min_mass, params.max_mass)?;

    let bodies = (0..n)
        .map(|_| Body {
            position: Vec3::new(
                rng.sample(position_dist),
                rng.sample(position_dist),
                rng.sample(position_dist),
            ),
            velocity: Vec3::new(
                rng.sample(velocity_dist),
                rng.sample(velocity_dist),
                rng.sample(velocity_dist),
            ),
            mass: rng.sample(mass_dist),
        })
        .collect();

    BodySet::new(bodies)
}

/// Two equal masses on a circular orbit about their common centre of mass,
/// separated along x and moving along ±y.
pub fn circular_binary(mass: f64, separation: f64, g: f64) -> Result<BodySet> {
    let half = separation / 2.0;
    // m v^2 / (d/2) = G m^2 / d^2
    let speed = (g * mass / (2.0 * separation)).sqrt();
    BodySet::new(vec![
        Body { position: Vec3::new(-half, 0.0, 0.0), velocity: Vec3::new(0.0, -speed, 0.0), mass },
        Body { position: Vec3::new(half, 0.0, 0.0), velocity: Vec3::new(0.0, speed, 0.0), mass },
    ])
}
