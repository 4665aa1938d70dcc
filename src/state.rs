use crate::error::{Degeneracy, SimError};
use anyhow::Result;
use nbody_common::Vec3;

/// A single point mass. Its identity is its index in the owning [`BodySet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f64,
}

/// Holds the body state vectors (structure-of-arrays layout).
///
/// The length is fixed for the whole run. Force computers only ever see `&BodySet`
/// or the slices returned by [`positions`](Self::positions) and
/// [`masses`](Self::masses); the integrator is the only writer.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySet {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    masses: Vec<f64>,
}

impl BodySet {
    /// Builds a body set, rejecting non-positive masses and non-finite state.
    pub fn new(bodies: Vec<Body>) -> Result<Self> {
        let mut positions = Vec::with_capacity(bodies.len());
        let mut velocities = Vec::with_capacity(bodies.len());
        let mut masses = Vec::with_capacity(bodies.len());
        for body in bodies {
            positions.push(body.position);
            velocities.push(body.velocity);
            masses.push(body.mass);
        }
        let set = Self { positions, velocities, masses };
        set.validate()?;
        Ok(set)
    }

    /// Checks the masses-positive, everything-finite invariant.
    pub fn validate(&self) -> Result<()> {
        for (idx, &mass) in self.masses.iter().enumerate() {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(SimError::from(Degeneracy::NonPositiveMass { body: idx, mass }).into());
            }
            if !self.positions[idx].is_finite() || !self.velocities[idx].is_finite() {
                return Err(SimError::from(Degeneracy::NonFiniteState { body: idx }).into());
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn body(&self, idx: usize) -> Body {
        Body {
            position: self.positions[idx],
            velocity: self.velocities[idx],
            mass: self.masses[idx],
        }
    }

    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        (0..self.len()).map(move |idx| self.body(idx))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Mutable access for the integrator: positions and velocities, masses read-only.
    pub(crate) fn kinematics_mut(&mut self) -> (&mut [Vec3], &mut [Vec3], &[f64]) {
        (&mut self.positions, &mut self.velocities, &self.masses)
    }

    // --- Diagnostics ---

    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * v.length_squared())
            .sum()
    }

    /// Pairwise gravitational potential energy. Infinite for coincident bodies.
    pub fn potential_energy(&self, g: f64) -> f64 {
        let n = self.len();
        let mut energy = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let r = self.positions[i].distance(self.positions[j]);
                energy -= g * self.masses[i] * self.masses[j] / r;
            }
        }
        energy
    }

    pub fn total_energy(&self, g: f64) -> f64 {
        self.kinetic_energy() + self.potential_energy(g)
    }

    pub fn total_momentum(&self) -> Vec3 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .fold(Vec3::zero(), |acc, (v, &m)| acc + *v * m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(p: [f64; 3], v: [f64; 3], mass: f64) -> Body {
        Body { position: p.into(), velocity: v.into(), mass }
    }

    #[test]
    fn preserves_index_order() {
        let set = BodySet::new(vec![
            body([1.0, 0.0, 0.0], [0.0; 3], 1.0),
            body([2.0, 0.0, 0.0], [0.0; 3], 2.0),
            body([3.0, 0.0, 0.0], [0.0; 3], 3.0),
        ])
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.masses(), &[1.0, 2.0, 3.0]);
        assert_eq!(set.body(2).position, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_zero_mass() {
        let err = BodySet::new(vec![
            body([0.0; 3], [0.0; 3], 1.0),
            body([1.0, 0.0, 0.0], [0.0; 3], 0.0),
        ])
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SimError>(),
            Some(&SimError::DegenerateConfiguration(Degeneracy::NonPositiveMass { body: 1, mass: 0.0 }))
        );
    }

    #[test]
    fn rejects_non_finite_velocity() {
        let err = BodySet::new(vec![body([0.0; 3], [f64::NAN, 0.0, 0.0], 1.0)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SimError>(),
            Some(&SimError::DegenerateConfiguration(Degeneracy::NonFiniteState { body: 0 }))
        );
    }

    #[test]
    fn energy_and_momentum_of_two_bodies() {
        let set = BodySet::new(vec![
            body([0.0; 3], [1.0, 0.0, 0.0], 2.0),
            body([2.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 2.0),
        ])
        .unwrap();
        assert_eq!(set.kinetic_energy(), 2.0);
        assert_eq!(set.potential_energy(1.0), -2.0);
        assert_eq!(set.total_energy(1.0), 0.0);
        assert_eq!(set.total_momentum(), Vec3::zero());
    }
}
