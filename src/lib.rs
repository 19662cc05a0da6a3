//! Levitas - a magnetic levitation chamber simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (plant, PD controller, coil lag, sensing)
//! - `config`: Revision presets and JSON overrides
//! - `scene`: Pixel-space draw list consumed by a renderer
//! - `driver`: Fixed-timestep accumulator for real-time hosts
//! - `trace`: Per-tick records for headless runs

pub mod config;
pub mod driver;
pub mod error;
pub mod scene;
pub mod sim;
pub mod trace;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{Revision, SimConfig};
pub use error::{LevitasError, Result};
pub use sim::{Controls, KinematicState, Phase, Simulation, step};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (seconds)
    pub const DT: f64 = 0.016;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the driver will try to catch up on (seconds)
    pub const MAX_FRAME_DT: f64 = 0.1;

    /// PD gains
    pub const KP: f64 = 6.0;
    pub const KD: f64 = 2.5;

    /// Destabilizing stiffness applied when control is off
    pub const OPEN_LOOP_GAIN: f64 = 0.6;
    /// Downward acceleration when gravity is on (normalized units/s²)
    pub const GRAVITY: f64 = 0.4;

    /// Coil current limit (A)
    pub const I_MAX: f64 = 2.0;
    /// First-order lag of the coil current (seconds)
    pub const COIL_TIME_CONSTANT: f64 = 0.05;
    /// Force per unit coil current
    pub const MAG_K: f64 = 1.0;

    /// Sensor sampling period (50 Hz)
    pub const SENSOR_DT: f64 = 0.02;
    /// Sensor noise relative to the disturbance amplitude
    pub const SENSOR_NOISE_SCALE: f64 = 1.0;

    /// State applied on reset
    pub const RESET_X: f64 = 0.0;
    pub const RESET_Y: f64 = 0.0;
    pub const RESET_VX: f64 = 0.02;
    pub const RESET_VY: f64 = -0.015;

    /// Canvas and chamber layout (pixels)
    pub const CANVAS_WIDTH: f64 = 800.0;
    pub const CANVAS_HEIGHT: f64 = 500.0;
    pub const PIXELS_PER_UNIT: f64 = 300.0;
    pub const CHAMBER_LEFT: f64 = 150.0;
    pub const CHAMBER_TOP: f64 = 100.0;
    pub const CHAMBER_WIDTH: f64 = 500.0;
    pub const CHAMBER_HEIGHT: f64 = 300.0;
    pub const OBJECT_RADIUS_PX: f64 = 12.0;
    /// Indicator line length per unit of displacement
    pub const INDICATOR_SCALE: f64 = 200.0;
}

/// Clamp each component of `v` to `[-limit, limit]`
#[inline]
pub fn clamp_symmetric(v: DVec2, limit: f64) -> DVec2 {
    v.clamp(DVec2::splat(-limit), DVec2::splat(limit))
}
