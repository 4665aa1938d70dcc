use crate::forces::{ForceComputer, ForceEvaluator, ParallelForceComputer};
use crate::integrator::SymplecticEuler;
use crate::io::write_positions;
use crate::state::BodySet;
use crate::trajectory::{write_trajectory, TrajectoryRecorder};
use anyhow::Result;
use log::{debug, error, info, trace};
use nbody_common::{SimParams, TrajectoryFormat};
use std::path::Path;
use std::time::{Duration, Instant};

/// Minimum wall-clock gap between periodic status lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Where a simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    Idle,
    /// `step` integration steps have completed.
    Running { step: u32 },
    Completed,
    Failed { step: u32 },
}

/// What a successful run hands to the output side.
#[derive(Debug)]
pub struct SimulationOutput {
    pub bodies: BodySet,
    pub trajectory: Option<TrajectoryRecorder>,
}

impl SimulationOutput {
    /// Writes the trajectory (when both a recording and a target are present), then
    /// the final positions. The positions file only appears once the trajectory is
    /// safely on disk.
    pub fn save(&self, positions_path: &Path, trajectory_target: Option<(&Path, TrajectoryFormat)>) -> Result<()> {
        if let (Some((path, format)), Some(trajectory)) = (trajectory_target, &self.trajectory) {
            write_trajectory(trajectory, path, format)?;
        }
        write_positions(positions_path, &self.bodies)
    }
}

/// Drives the step loop: record, compute forces, integrate.
pub struct Simulation {
    params: SimParams,
    bodies: BodySet,
    forces: Box<dyn ForceEvaluator>,
    integrator: SymplecticEuler,
    trajectory: Option<TrajectoryRecorder>,
    status: SimulationStatus,
    current_step: u32,
}

impl Simulation {
    /// Creates a simulation, choosing serial force evaluation for one worker and a
    /// dedicated pool otherwise.
    pub fn new(bodies: BodySet, params: SimParams, record_trajectory: bool) -> Result<Self> {
        bodies.validate()?;
        if !params.dt.is_finite() || params.dt <= 0.0 {
            anyhow::bail!("dt must be a positive finite number, got {}.", params.dt);
        }

        let forces: Box<dyn ForceEvaluator> = match params.num_workers {
            0 => anyhow::bail!("num_workers must be at least 1."),
            1 => {
                info!("Using serial force evaluation.");
                Box::new(ForceComputer::new(params.g))
            }
            workers => {
                info!("Using parallel force evaluation on {} workers.", workers);
                Box::new(ParallelForceComputer::new(params.g, workers)?)
            }
        };

        Ok(Self::with_evaluator(bodies, params, forces, record_trajectory))
    }

    /// Creates a simulation around an existing force evaluator.
    pub fn with_evaluator(
        bodies: BodySet,
        params: SimParams,
        forces: Box<dyn ForceEvaluator>,
        record_trajectory: bool,
    ) -> Self {
        let trajectory = record_trajectory
            .then(|| TrajectoryRecorder::new(bodies.len(), params.dt, params.num_steps as usize));
        Self {
            params,
            bodies,
            forces,
            integrator: SymplecticEuler::new(params.dt),
            trajectory,
            status: SimulationStatus::Idle,
            current_step: 0,
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Advances the simulation by one time step.
    pub fn step(&mut self) -> Result<()> {
        match self.status {
            SimulationStatus::Idle | SimulationStatus::Running { .. } => {}
            other => anyhow::bail!("Cannot step a simulation in state {:?}.", other),
        }

        match self.advance() {
            Ok(()) => {
                self.current_step += 1;
                self.status = SimulationStatus::Running { step: self.current_step };
                Ok(())
            }
            Err(e) => {
                self.status = SimulationStatus::Failed { step: self.current_step };
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<()> {
        // --- 1. Record pre-step positions ---
        if let Some(trajectory) = self.trajectory.as_mut() {
            trajectory.record(self.current_step, &self.bodies)?;
        }

        // --- 2. Compute forces (read-only view of the bodies) ---
        let forces = self.forces.compute(&self.bodies)?;

        // --- 3. Integrate (exclusive access for this step only) ---
        self.integrator.step(&mut self.bodies, &forces)
    }

    /// Runs all configured steps and returns the final state.
    ///
    /// Nothing is returned from a failed run; the error names the step it failed in.
    pub fn run(mut self) -> Result<SimulationOutput> {
        let total_steps = self.params.num_steps;
        let initial_energy = self.bodies.total_energy(self.params.g);
        debug!("Simulation Parameters: {:#?}", self.params);
        debug!(
            "Initial energy {:.6e}, momentum {:?}",
            initial_energy,
            self.bodies.total_momentum()
        );

        info!("Starting simulation loop for {} steps...", total_steps);
        let start_time = Instant::now();
        let mut previous_print_time = start_time;

        for step in 0..total_steps {
            let step_start_time = Instant::now();
            if let Err(e) = self.step() {
                error!("Error during simulation step {}: {:#}", step + 1, e);
                return Err(e.context(format!("Simulation step {} failed", step + 1)));
            }
            let step_duration = step_start_time.elapsed();

            let current_time = Instant::now();
            let is_last_step = step + 1 == total_steps;
            if current_time.duration_since(previous_print_time) >= STATUS_INTERVAL || is_last_step {
                info!(
                    "Step [{}/{}] (t = {:.2}) | Bodies: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                    step + 1,
                    total_steps,
                    (step + 1) as f64 * self.params.dt,
                    self.bodies.len(),
                    step_duration.as_secs_f64() * 1000.0,
                    start_time.elapsed().as_secs_f64()
                );
                previous_print_time = current_time;
            } else {
                trace!(
                    "Step [{}/{}] completed in {:.2} ms",
                    step + 1,
                    total_steps,
                    step_duration.as_secs_f64() * 1000.0
                );
            }
        }

        self.status = SimulationStatus::Completed;
        let final_energy = self.bodies.total_energy(self.params.g);
        info!("Simulation finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());
        debug!(
            "Final energy {:.6e} (relative drift {:.3e}), momentum {:?}",
            final_energy,
            relative_drift(initial_energy, final_energy),
            self.bodies.total_momentum()
        );

        Ok(SimulationOutput { bodies: self.bodies, trajectory: self.trajectory })
    }
}

/// `|final - initial| / |initial|`, or the absolute change when the initial value is 0.
pub fn relative_drift(initial: f64, final_value: f64) -> f64 {
    let change = (final_value - initial).abs();
    if initial != 0.0 {
        change / initial.abs()
    } else {
        change
    }
}
