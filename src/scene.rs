//! Pixel-space draw list for the chamber view
//!
//! The renderer only paints what is listed here; it never reads simulation
//! internals.

use glam::DVec2;
use serde::Serialize;

use crate::consts::{INDICATOR_SCALE, OBJECT_RADIUS_PX};
use crate::sim::{Controls, MAGNETS, Phase, Rect, Simulation};

pub const CHAMBER_COLOR: &str = "#00bcd4";
pub const MAGNET_COLOR: &str = "#ffaa00";
pub const OBJECT_COLOR: &str = "red";
pub const FAILED_OBJECT_COLOR: &str = "#555555";
pub const INDICATOR_COLOR: &str = "#ff4444";

/// Filled circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
    pub color: &'static str,
}

/// Stroked line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub from: DVec2,
    pub to: DVec2,
    pub color: &'static str,
}

/// Everything drawn in one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Stroked outline
    pub chamber: Rect,
    pub chamber_color: &'static str,
    pub magnets: [Rect; 4],
    pub magnet_color: &'static str,
    pub object: Circle,
    /// Restoring-force hint, only while control is on and the object is held
    pub indicator: Option<Line>,
    pub phase: Phase,
}

impl Scene {
    pub fn build(sim: &Simulation, controls: &Controls) -> Self {
        let view = sim.view();
        let center = sim.pixel_pos();
        let failed = sim.phase() == Phase::Failed;

        let indicator = (controls.control_enabled && !failed).then(|| Line {
            from: center,
            to: center - sim.state().pos * INDICATOR_SCALE,
            color: INDICATOR_COLOR,
        });

        Self {
            chamber: view.chamber,
            chamber_color: CHAMBER_COLOR,
            magnets: MAGNETS,
            magnet_color: MAGNET_COLOR,
            object: Circle {
                center,
                radius: OBJECT_RADIUS_PX,
                color: if failed { FAILED_OBJECT_COLOR } else { OBJECT_COLOR },
            },
            indicator,
            phase: sim.phase(),
        }
    }
}
