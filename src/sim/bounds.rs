//! Chamber geometry and the pixel-space bounds check
//!
//! Normalized positions map to canvas pixels with a fixed scale around the
//! canvas center. The chamber is an axis-aligned rectangle in pixel space.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Magnet glyphs around the chamber: top, bottom, left, right
pub const MAGNETS: [Rect; 4] = [
    Rect::new(360.0, 80.0, 80.0, 15.0),
    Rect::new(360.0, 415.0, 80.0, 15.0),
    Rect::new(130.0, 235.0, 15.0, 80.0),
    Rect::new(655.0, 235.0, 15.0, 80.0),
];

/// Mapping between normalized chamber coordinates and canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamberView {
    /// Pixel position of normalized (0, 0)
    pub origin: DVec2,
    pub scale: f64,
    /// Chamber interior in pixels
    pub chamber: Rect,
}

impl Default for ChamberView {
    fn default() -> Self {
        Self {
            origin: DVec2::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0),
            scale: PIXELS_PER_UNIT,
            chamber: Rect::new(CHAMBER_LEFT, CHAMBER_TOP, CHAMBER_WIDTH, CHAMBER_HEIGHT),
        }
    }
}

impl ChamberView {
    /// Normalized position to pixels
    #[inline]
    pub fn to_pixels(&self, pos: DVec2) -> DVec2 {
        self.origin + pos * self.scale
    }

    /// True when a circle of `radius` pixels at `px` crosses a chamber wall.
    /// Touching a wall exactly is still inside. A non-finite position is outside.
    pub fn is_outside(&self, px: DVec2, radius: f64) -> bool {
        let c = &self.chamber;
        !px.is_finite()
            || px.x - radius < c.left()
            || px.x + radius > c.right()
            || px.y - radius < c.top()
            || px.y + radius > c.bottom()
    }

    /// Bounds check on a normalized position
    pub fn contains(&self, pos: DVec2, radius: f64) -> bool {
        !self.is_outside(self.to_pixels(pos), radius)
    }
}
