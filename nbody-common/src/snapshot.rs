use serde::{Serialize, Deserialize};

/// Positions of every body at the start of one integration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFrame {
    /// The step index this frame was taken before.
    pub step: u32,
    /// The simulation time (`step * dt`) at which the frame was taken.
    pub time: f64,
    /// `[x, y, z]` of each body, in body index order.
    pub positions: Vec<[f64; 3]>,
}

/// A full trajectory as written by the serde-based encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub dt: f64,
    pub num_bodies: usize,
    pub frames: Vec<TrajectoryFrame>,
}
