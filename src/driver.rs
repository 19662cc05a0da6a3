//! Fixed-timestep driver for real-time hosts
//!
//! Converts variable frame times into whole simulation ticks. The simulation
//! itself never sees wall-clock time.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};
use crate::sim::{Controls, Phase, Simulation, step};

#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f64,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leftover time not yet consumed by a tick (seconds)
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Drop any pending time, e.g. after a reset
    pub fn clear(&mut self) {
        self.accumulator = 0.0;
    }

    /// Run as many ticks as `frame_dt` covers, up to [`MAX_SUBSTEPS`].
    /// Returns the number of ticks run.
    pub fn advance(&mut self, sim: &mut Simulation, controls: &Controls, frame_dt: f64) -> u32 {
        let dt = sim.config().dt;
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < MAX_SUBSTEPS {
            let phase = step(sim, controls);
            self.accumulator -= dt;
            substeps += 1;

            if phase == Phase::Failed {
                self.accumulator = 0.0;
                break;
            }
        }

        if substeps == MAX_SUBSTEPS && self.accumulator >= dt {
            log::debug!(
                "Substep cap hit, dropping {:.3}s of simulation time",
                self.accumulator
            );
            self.accumulator = 0.0;
        }

        substeps
    }
}
