//! Per-tick records and run summaries for headless batch runs

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Controls, Phase, Simulation, step};

/// Snapshot of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time: f64,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Held sensor sample, when a sensor is fitted
    pub sensed_pos: Option<DVec2>,
    /// Coil currents, when an actuator is fitted
    pub current: Option<DVec2>,
    pub phase: Phase,
}

impl TickRecord {
    pub fn capture(sim: &Simulation) -> Self {
        let config = sim.config();
        Self {
            tick: sim.time_ticks(),
            time: sim.time_secs(),
            pos: sim.state().pos,
            vel: sim.state().vel,
            sensed_pos: config.sensor.map(|_| sim.sensed().pos),
            current: config.actuator.map(|_| sim.actuator().current),
            phase: sim.phase(),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub revision: String,
    pub seed: u64,
    pub ticks_run: u64,
    /// Tick at which the object left the chamber
    pub failed_at: Option<u64>,
    /// Largest |pos| seen
    pub peak_displacement: f64,
    pub final_state: TickRecord,
}

/// Step `sim` up to `ticks` times with fixed controls, stopping early on failure.
/// `on_tick` sees every record after its tick.
pub fn run_batch(
    sim: &mut Simulation,
    controls: &Controls,
    ticks: u64,
    mut on_tick: impl FnMut(&TickRecord),
) -> RunSummary {
    let mut peak = sim.state().pos.length();
    let mut ticks_run = 0;
    let mut failed_at = None;

    for _ in 0..ticks {
        let phase = step(sim, controls);
        ticks_run += 1;

        let record = TickRecord::capture(sim);
        peak = peak.max(record.pos.length());
        on_tick(&record);

        if phase == Phase::Failed {
            failed_at = Some(record.tick);
            break;
        }
    }

    RunSummary {
        revision: sim.config().revision.as_str().to_string(),
        seed: sim.seed(),
        ticks_run,
        failed_at,
        peak_displacement: peak,
        final_state: TickRecord::capture(sim),
    }
}
