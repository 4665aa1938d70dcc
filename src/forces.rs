//! Direct pairwise Newtonian gravity.
//!
//! [`ForceComputer`] walks every unordered pair `(i, j)`, `i < j`, once, adding the
//! pair force to `i` and subtracting it from `j`. [`ParallelForceComputer`] splits the
//! outer index `i` into contiguous ranges, evaluates each range on its own worker
//! and sums the per-worker arrays.

use crate::error::{Degeneracy, SimError};
use crate::executor::{BatchExecutor, ThreadPoolExecutor};
use crate::state::BodySet;
use anyhow::Result;
use nbody_common::Vec3;
use std::ops::Range;

/// Anything that turns a body set into one force vector per body.
pub trait ForceEvaluator {
    fn compute(&self, bodies: &BodySet) -> Result<Vec<Vec3>>;
}

/// Force exerted on body `i` by body `j` (the negation acts on `j`).
pub fn pair_force(
    (i, pos_i, mass_i): (usize, Vec3, f64),
    (j, pos_j, mass_j): (usize, Vec3, f64),
    g: f64,
) -> Result<Vec3> {
    if mass_i.is_nan() || mass_i <= 0.0 {
        return Err(SimError::from(Degeneracy::NonPositiveMass { body: i, mass: mass_i }).into());
    }
    if mass_j.is_nan() || mass_j <= 0.0 {
        return Err(SimError::from(Degeneracy::NonPositiveMass { body: j, mass: mass_j }).into());
    }

    let r = pos_j - pos_i;
    let distance = r.length();
    if distance == 0.0 {
        return Err(SimError::from(Degeneracy::CoincidentBodies { first: i, second: j }).into());
    }

    let magnitude = g * mass_i * mass_j / (distance * distance);
    let force = (r / distance) * magnitude;
    if !force.is_finite() {
        return Err(SimError::from(Degeneracy::NonFiniteState { body: i }).into());
    }
    Ok(force)
}

/// Accumulates the forces of every pair whose first index lies in `outer`.
///
/// The output always has one entry per body, so arrays from disjoint ranges can be
/// summed element-wise.
pub fn accumulate_range(
    outer: Range<usize>,
    positions: &[Vec3],
    masses: &[f64],
    g: f64,
) -> Result<Vec<Vec3>> {
    let n = positions.len();
    let mut forces = vec![Vec3::zero(); n];
    for i in outer {
        for j in (i + 1)..n {
            let force = pair_force((i, positions[i], masses[i]), (j, positions[j], masses[j]), g)?;
            forces[i] += force;
            forces[j] -= force;
        }
    }
    Ok(forces)
}

/// Serial force evaluation. Fixes the summation order (i ascending, then j
/// ascending) used as the reproducibility baseline.
#[derive(Debug, Clone, Copy)]
pub struct ForceComputer {
    g: f64,
}

impl ForceComputer {
    pub fn new(g: f64) -> Self {
        Self { g }
    }
}

impl ForceEvaluator for ForceComputer {
    fn compute(&self, bodies: &BodySet) -> Result<Vec<Vec3>> {
        accumulate_range(0..bodies.len(), bodies.positions(), bodies.masses(), self.g)
    }
}

/// Splits `[0, n)` into `workers` contiguous ranges. All ranges but the last have
/// `n / workers` elements; the last takes the remainder.
pub fn partition_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let chunk = n / workers;
    (0..workers)
        .map(|w| {
            let start = w * chunk;
            let end = if w == workers - 1 { n } else { (w + 1) * chunk };
            start..end
        })
        .collect()
}

/// Range-partitioned force evaluation over a fixed worker pool.
///
/// Later ranges touch fewer pairs (j > i), so the split is not load balanced.
pub struct ParallelForceComputer<E = ThreadPoolExecutor> {
    g: f64,
    executor: E,
}

impl ParallelForceComputer<ThreadPoolExecutor> {
    /// Builds a computer backed by a dedicated pool of `num_workers` threads.
    pub fn new(g: f64, num_workers: usize) -> Result<Self> {
        Ok(Self::with_executor(g, ThreadPoolExecutor::new(num_workers)?))
    }
}

impl<E: BatchExecutor> ParallelForceComputer<E> {
    pub fn with_executor(g: f64, executor: E) -> Self {
        Self { g, executor }
    }

    pub fn num_workers(&self) -> usize {
        self.executor.num_workers()
    }
}

impl<E: BatchExecutor> ForceEvaluator for ParallelForceComputer<E> {
    fn compute(&self, bodies: &BodySet) -> Result<Vec<Vec3>> {
        let n = bodies.len();
        let ranges = partition_ranges(n, self.executor.num_workers());
        let positions = bodies.positions();
        let masses = bodies.masses();
        let g = self.g;

        // Workers borrow the slices for the duration of this call only.
        let partials = self
            .executor
            .execute(ranges, |range| accumulate_range(range, positions, masses, g))?;

        let mut forces = vec![Vec3::zero(); n];
        for partial in partials {
            for (total, f) in forces.iter_mut().zip(partial) {
                *total += f;
            }
        }
        Ok(forces)
    }
}
