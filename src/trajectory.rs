use crate::state::BodySet;
use anyhow::{Context, Result};
use log::info;
use nbody_common::{TrajectoryFormat, TrajectoryFrame, TrajectoryRecord};
use ndarray::Array3;
use ndarray_npy::NpzWriter;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Name of the single array inside a trajectory `.npz`, matching what
/// `numpy.savez_compressed(path, array)` produces.
pub const NPZ_ARRAY_NAME: &str = "arr_0.npy";

/// Borrowed view of a recorder with the same serialized layout as
/// [`TrajectoryRecord`], so frames are encoded without being copied.
#[derive(Debug, Serialize)]
pub struct TrajectoryRecordRef<'a> {
    pub dt: f64,
    pub num_bodies: usize,
    pub frames: &'a [TrajectoryFrame],
}

/// Append-only log of the positions at the start of each step.
#[derive(Debug, Clone)]
pub struct TrajectoryRecorder {
    dt: f64,
    num_bodies: usize,
    frames: Vec<TrajectoryFrame>,
}

impl TrajectoryRecorder {
    pub fn new(num_bodies: usize, dt: f64, expected_steps: usize) -> Self {
        Self { dt, num_bodies, frames: Vec::with_capacity(expected_steps) }
    }

    /// Copies the current positions as the frame for `step`.
    pub fn record(&mut self, step: u32, bodies: &BodySet) -> Result<()> {
        if bodies.len() != self.num_bodies {
            anyhow::bail!(
                "Trajectory expects {} bodies but the body set has {}.",
                self.num_bodies,
                bodies.len()
            );
        }
        self.frames.push(TrajectoryFrame {
            step,
            time: step as f64 * self.dt,
            positions: bodies.positions().iter().map(|p| p.to_array()).collect(),
        });
        Ok(())
    }

    pub fn frames(&self) -> &[TrajectoryFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The trajectory as a `[step][body][axis]` array.
    pub fn to_array(&self) -> Array3<f64> {
        let mut array = Array3::<f64>::zeros((self.frames.len(), self.num_bodies, 3));
        for (step, frame) in self.frames.iter().enumerate() {
            for (body, pos) in frame.positions.iter().enumerate() {
                for (axis, &value) in pos.iter().enumerate() {
                    array[[step, body, axis]] = value;
                }
            }
        }
        array
    }

    pub fn as_record(&self) -> TrajectoryRecordRef<'_> {
        TrajectoryRecordRef { dt: self.dt, num_bodies: self.num_bodies, frames: &self.frames }
    }

    pub fn into_record(self) -> TrajectoryRecord {
        TrajectoryRecord { dt: self.dt, num_bodies: self.num_bodies, frames: self.frames }
    }
}

/// Picks the encoding: explicit choice first, then the file extension, then npz.
pub fn resolve_format(requested: Option<TrajectoryFormat>, path: &Path) -> TrajectoryFormat {
    requested
        .or_else(|| TrajectoryFormat::from_extension(path))
        .unwrap_or(TrajectoryFormat::Npz)
}

/// Writes the whole trajectory to `path` in a single pass.
pub fn write_trajectory(recorder: &TrajectoryRecorder, path: &Path, format: TrajectoryFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating trajectory file '{}'", path.display()))?;

    match format {
        TrajectoryFormat::Npz => {
            let mut npz = NpzWriter::new_compressed(file);
            npz.add_array(NPZ_ARRAY_NAME, &recorder.to_array())
                .with_context(|| format!("Error writing trajectory array to '{}'", path.display()))?;
            npz.finish()
                .with_context(|| format!("Error finishing trajectory archive '{}'", path.display()))?;
        }
        TrajectoryFormat::Bincode => {
            let record = recorder.as_record();
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &record)
                .context("Error serializing trajectory to bincode")?;
            writer.flush()?;
        }
        TrajectoryFormat::MessagePack => {
            let record = recorder.as_record();
            let mut writer = BufWriter::new(file);
            rmp_serde::encode::write(&mut writer, &record)
                .context("Error serializing trajectory to MessagePack")?;
            writer.flush()?;
        }
        TrajectoryFormat::Json => {
            let record = recorder.as_record();
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &record)
                .context("Error serializing trajectory to JSON")?;
            writer.flush()?;
        }
    }

    info!(
        "Trajectory with {} frames saved to {} ({:?} format)",
        recorder.len(),
        path.display(),
        format
    );
    Ok(())
}
