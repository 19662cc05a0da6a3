//! Single-axis electromagnetic levitation model
//!
//! A ball held at a gap `x` from an electromagnet. The magnetic force follows
//! the inverse-square law in the gap and is quadratic in coil current. A PD
//! law on the gap error adjusts the current around a nominal bias.

use serde::{Deserialize, Serialize};

/// Smallest gap used in the force law (m), keeps the force finite
pub const MIN_GAP: f64 = 1e-4;

/// Physical and control constants of the vertical model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaglevParams {
    /// Gravitational acceleration (m/s²)
    pub g: f64,
    /// Levitated mass (kg)
    pub mass: f64,
    /// Magnetic force constant (N·m²/A²)
    pub k: f64,
    /// Desired gap (m)
    pub x_ref: f64,
    /// Nominal coil current (A)
    pub i0: f64,
    pub kp: f64,
    pub kd: f64,
    /// Integration step (s)
    pub dt: f64,
}

impl Default for MaglevParams {
    fn default() -> Self {
        Self {
            g: 9.81,
            mass: 0.05,
            k: 1e-5,
            x_ref: 0.02,
            i0: 1.5,
            kp: 120.0,
            kd: 8.0,
            dt: 1e-3,
        }
    }
}

/// Force on the ball for a given gap and current
#[inline]
pub fn magnetic_force(k: f64, gap: f64, current: f64) -> f64 {
    let gap = gap.max(MIN_GAP);
    k * current * current / (gap * gap)
}

/// Outputs of one integration step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaglevSample {
    pub gap: f64,
    pub gap_rate: f64,
    pub current: f64,
    pub force: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaglevModel {
    pub params: MaglevParams,
    /// Gap to the electromagnet (m)
    pub gap: f64,
    /// Gap rate (m/s)
    pub gap_rate: f64,
}

impl MaglevModel {
    /// Start at rest at the reference gap
    pub fn new(params: MaglevParams) -> Self {
        Self {
            params,
            gap: params.x_ref,
            gap_rate: 0.0,
        }
    }

    /// PD law: coil current for the current state, never negative
    pub fn control_current(&self) -> f64 {
        let p = &self.params;
        let error = p.x_ref - self.gap;
        let u = p.kp * error - p.kd * self.gap_rate;
        (p.i0 + u).max(0.0)
    }

    /// Advance one step with semi-implicit Euler
    pub fn step(&mut self) -> MaglevSample {
        let p = self.params;
        let current = self.control_current();
        let force = magnetic_force(p.k, self.gap, current);
        let accel = force / p.mass - p.g;

        self.gap_rate += accel * p.dt;
        self.gap += self.gap_rate * p.dt;

        MaglevSample {
            gap: self.gap,
            gap_rate: self.gap_rate,
            current,
            force,
        }
    }

    /// Weight of the levitated mass (N)
    pub fn weight(&self) -> f64 {
        self.params.mass * self.params.g
    }
}
