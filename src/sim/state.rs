//! Simulation state types
//!
//! [`Simulation`] is the single owner of everything the step function
//! mutates. Hosts hold it by value and pass `&mut` into [`step`](super::step).

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bounds::ChamberView;
use crate::config::SimConfig;
use crate::consts::*;

/// Position and velocity in normalized chamber units (+y is down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicState {
    pub pos: DVec2,
    pub vel: DVec2,
}

impl KinematicState {
    pub fn new(x: f64, y: f64, vx: f64, vy: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            vel: DVec2::new(vx, vy),
        }
    }

    /// State applied on construction and reset
    pub fn reset_state() -> Self {
        Self::new(RESET_X, RESET_Y, RESET_VX, RESET_VY)
    }
}

/// Last sensor sample: position with measurement noise, exact velocity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensedState {
    pub pos: DVec2,
    pub vel: DVec2,
}

impl From<KinematicState> for SensedState {
    fn from(state: KinematicState) -> Self {
        Self {
            pos: state.pos,
            vel: state.vel,
        }
    }
}

/// Coil currents on each axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorState {
    pub current: DVec2,
}

/// Latched run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Running,
    /// Object left the chamber; stepping is a no-op until reset
    Failed,
}

/// Operator inputs sampled once per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub control_enabled: bool,
    /// Multiplier on the PD command
    pub gain: f64,
    /// Disturbance amplitude
    pub noise: f64,
    pub gravity_enabled: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            control_enabled: true,
            gain: 1.0,
            noise: 0.0,
            gravity_enabled: false,
        }
    }
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) view: ChamberView,
    pub(crate) state: KinematicState,
    pub(crate) sensed: SensedState,
    pub(crate) actuator: ActuatorState,
    pub(crate) sensor_timer: f64,
    pub(crate) phase: Phase,
    pub(crate) time_ticks: u64,
    /// Disturbance and measurement noise source
    rng: Pcg32,
    seed: u64,
}

impl Simulation {
    /// Create a simulation at the reset state
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let state = KinematicState::reset_state();
        log::info!(
            "Simulation created ({} revision, seed {})",
            config.revision.as_str(),
            seed
        );
        Self {
            config,
            view: ChamberView::default(),
            state,
            sensed: state.into(),
            actuator: ActuatorState::default(),
            sensor_timer: 0.0,
            phase: Phase::Running,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            seed,
        }
    }

    /// Start from an arbitrary kinematic state (sensor primed with it)
    pub fn with_state(mut self, state: KinematicState) -> Self {
        self.state = state;
        self.sensed = state.into();
        self
    }

    /// Reinitialize everything except the noise source
    pub fn reset(&mut self) {
        self.state = KinematicState::reset_state();
        self.sensed = self.state.into();
        self.actuator = ActuatorState::default();
        self.sensor_timer = 0.0;
        self.phase = Phase::Running;
        self.time_ticks = 0;
        log::info!("Simulation reset");
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn view(&self) -> &ChamberView {
        &self.view
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn sensed(&self) -> &SensedState {
        &self.sensed
    }

    pub fn actuator(&self) -> &ActuatorState {
        &self.actuator
    }

    pub fn sensor_timer(&self) -> f64 {
        self.sensor_timer
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    /// Ticks advanced since construction or the last reset
    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Elapsed simulated time in seconds
    pub fn time_secs(&self) -> f64 {
        self.time_ticks as f64 * self.config.dt
    }

    /// Object position in canvas pixels
    pub fn pixel_pos(&self) -> DVec2 {
        self.view.to_pixels(self.state.pos)
    }

    /// Independent zero-mean uniform draw per axis, `(u - 0.5) * amplitude`
    pub(crate) fn noise_vec(&mut self, amplitude: f64) -> DVec2 {
        let x = (self.rng.random::<f64>() - 0.5) * amplitude;
        let y = (self.rng.random::<f64>() - 0.5) * amplitude;
        DVec2::new(x, y)
    }
}
