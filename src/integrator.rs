use crate::error::{Degeneracy, SimError};
use crate::state::BodySet;
use anyhow::Result;
use nbody_common::Vec3;

/// Semi-implicit (symplectic) Euler with a fixed time step.
///
/// Velocity is advanced first and the *updated* velocity moves the position in the
/// same step.
#[derive(Debug, Clone, Copy)]
pub struct SymplecticEuler {
    dt: f64,
}

impl SymplecticEuler {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Advances every body by one step. `forces[i]` must belong to body `i`.
    ///
    /// Fails without touching `bodies` if a mass is not positive or a force is not
    /// finite. A non-finite result after the update is also an error; in that case
    /// the body set is left partially advanced and must not be used further.
    pub fn step(&self, bodies: &mut BodySet, forces: &[Vec3]) -> Result<()> {
        if forces.len() != bodies.len() {
            anyhow::bail!(
                "Force array length {} does not match body count {}.",
                forces.len(),
                bodies.len()
            );
        }

        let dt = self.dt;
        let (positions, velocities, masses) = bodies.kinematics_mut();

        for (idx, (&mass, force)) in masses.iter().zip(forces).enumerate() {
            if mass.is_nan() || mass <= 0.0 {
                return Err(SimError::from(Degeneracy::NonPositiveMass { body: idx, mass }).into());
            }
            if !force.is_finite() {
                return Err(SimError::from(Degeneracy::NonFiniteState { body: idx }).into());
            }
        }

        for idx in 0..masses.len() {
            let acceleration = forces[idx] / masses[idx];
            velocities[idx] += acceleration * dt;
            positions[idx] += velocities[idx] * dt;

            if !velocities[idx].is_finite() || !positions[idx].is_finite() {
                return Err(SimError::from(Degeneracy::NonFiniteState { body: idx }).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Body;

    fn single(position: [f64; 3], velocity: [f64; 3], mass: f64) -> BodySet {
        BodySet::new(vec![Body { position: position.into(), velocity: velocity.into(), mass }]).unwrap()
    }

    #[test]
    fn position_uses_updated_velocity() {
        let mut bodies = single([0.0; 3], [1.0, 0.0, 0.0], 2.0);
        SymplecticEuler::new(0.5)
            .step(&mut bodies, &[Vec3::new(4.0, 0.0, 0.0)])
            .unwrap();
        // a = 2, v = 1 + 2 * 0.5 = 2, x = 0 + 2 * 0.5 = 1 (explicit Euler would give 0.5)
        assert_eq!(bodies.velocities()[0], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(bodies.positions()[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn zero_force_is_uniform_motion() {
        let mut bodies = single([1.0, 2.0, 3.0], [0.5, -0.5, 0.25], 1.0);
        let integrator = SymplecticEuler::new(0.2);
        for _ in 0..5 {
            integrator.step(&mut bodies, &[Vec3::zero()]).unwrap();
        }
        let p = bodies.positions()[0];
        approx::assert_relative_eq!(p.x, 1.5, epsilon = 1e-12);
        approx::assert_relative_eq!(p.y, 1.5, epsilon = 1e-12);
        approx::assert_relative_eq!(p.z, 3.25, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_force_is_rejected_before_mutation() {
        let mut bodies = single([0.0; 3], [1.0, 0.0, 0.0], 1.0);
        let before = bodies.clone();
        let err = SymplecticEuler::new(0.2)
            .step(&mut bodies, &[Vec3::new(f64::INFINITY, 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimError>(),
            Some(SimError::DegenerateConfiguration(Degeneracy::NonFiniteState { body: 0 }))
        ));
        assert_eq!(bodies, before);
    }

    #[test]
    fn force_length_mismatch_is_an_error() {
        let mut bodies = single([0.0; 3], [0.0; 3], 1.0);
        assert!(SymplecticEuler::new(0.2).step(&mut bodies, &[]).is_err());
    }
}
