//! Deterministic simulation module
//!
//! All plant and controller logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod bounds;
pub mod maglev;
pub mod state;
pub mod tick;

pub use bounds::{ChamberView, MAGNETS, Rect};
pub use maglev::{MaglevModel, MaglevParams, MaglevSample, magnetic_force};
pub use state::{ActuatorState, Controls, KinematicState, Phase, SensedState, Simulation};
pub use tick::step;
