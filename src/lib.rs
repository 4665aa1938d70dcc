//! Direct-summation N-body gravity engine.
//!
//! The core is the step loop in [`simulation`]: record pre-step positions, compute
//! pairwise forces (serially or over a fixed worker pool), then advance the bodies
//! with symplectic Euler.

pub mod error;
pub mod executor;
pub mod forces;
pub mod integrator;
pub mod io;
pub mod scenario;
pub mod simulation;
pub mod state;
pub mod trajectory;

pub use error::{Degeneracy, SimError};
pub use forces::{ForceComputer, ForceEvaluator, ParallelForceComputer};
pub use integrator::SymplecticEuler;
pub use simulation::{Simulation, SimulationOutput, SimulationStatus};
pub use state::{Body, BodySet};
pub use trajectory::TrajectoryRecorder;
