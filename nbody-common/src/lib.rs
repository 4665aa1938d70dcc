pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, TimingConfig, ParallelConfig, OutputConfig, TrajectoryFormat};
pub use sim_params::{SimParams, DEFAULT_DT, GRAVITATIONAL_CONSTANT};
pub use snapshot::{TrajectoryFrame, TrajectoryRecord};
pub use vecmath::Vec3;
