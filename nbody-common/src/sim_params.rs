use serde::{Deserialize, Serialize};

/// Gravitational constant used by every force evaluation.
pub const GRAVITATIONAL_CONSTANT: f64 = 1.0;

/// Default integration time step.
pub const DEFAULT_DT: f64 = 0.2;

/// Simulation parameters derived from the configuration, passed by value into the
/// force computers and the integrator. Immutable for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Gravitational constant (G).
    pub g: f64,
    /// Fixed time step.
    pub dt: f64,
    /// Number of integration steps to run.
    pub num_steps: u32,
    /// Worker count for force evaluation. 1 selects the serial path.
    pub num_workers: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            g: GRAVITATIONAL_CONSTANT,
            dt: DEFAULT_DT,
            num_steps: 0,
            num_workers: 1,
        }
    }
}
