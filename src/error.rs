use std::fmt;

/// What made a body configuration unusable for force evaluation or integration.
#[derive(Debug, Clone, PartialEq)]
pub enum Degeneracy {
    /// A body with zero, negative or non-finite mass.
    NonPositiveMass { body: usize, mass: f64 },
    /// Two bodies at exactly the same position.
    CoincidentBodies { first: usize, second: usize },
    /// A position, velocity or force component that is NaN or infinite.
    NonFiniteState { body: usize },
}

/// Failures the core reports. All of them abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A row with the wrong field count or a non-numeric value.
    /// `row` is 1-based and counts data rows only (the header is not row 1).
    MalformedInput { row: usize, reason: String },
    DegenerateConfiguration(Degeneracy),
    /// A parallel task returned an error or panicked.
    WorkerFailure { worker: usize, reason: String },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::NonPositiveMass { body, mass } => {
                write!(f, "body {} has non-positive mass {}", body, mass)
            }
            Degeneracy::CoincidentBodies { first, second } => {
                write!(f, "bodies {} and {} are at zero separation", first, second)
            }
            Degeneracy::NonFiniteState { body } => {
                write!(f, "body {} has a non-finite position, velocity or force", body)
            }
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::MalformedInput { row, reason } => {
                write!(f, "malformed input at data row {}: {}", row, reason)
            }
            SimError::DegenerateConfiguration(d) => write!(f, "degenerate configuration: {}", d),
            SimError::WorkerFailure { worker, reason } => {
                write!(f, "force worker {} failed: {}", worker, reason)
            }
        }
    }
}

impl std::error::Error for SimError {}

impl From<Degeneracy> for SimError {
    fn from(d: Degeneracy) -> Self {
        SimError::DegenerateConfiguration(d)
    }
}
