//! Simulation configuration
//!
//! Each historical revision of the chamber is a preset. A JSON file can
//! override any subset of parameters on top of the preset it names.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{LevitasError, Result};

/// Chamber revision presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    /// PD centering only; the object drifts freely when control is off
    Basic,
    /// Adds gravity and open-loop instability
    Gravity,
    /// Adds coil current lag and a sampled, noisy position sensor
    #[default]
    Actuated,
}

impl Revision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Revision::Basic => "basic",
            Revision::Gravity => "gravity",
            Revision::Actuated => "actuated",
        }
    }

    pub const ALL: [Revision; 3] = [Revision::Basic, Revision::Gravity, Revision::Actuated];
}

impl FromStr for Revision {
    type Err = LevitasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "basic" | "v1" => Ok(Revision::Basic),
            "gravity" | "v2" => Ok(Revision::Gravity),
            "actuated" | "v3" => Ok(Revision::Actuated),
            _ => Err(LevitasError::UnknownRevision(s.to_string())),
        }
    }
}

/// Coil driver parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorParams {
    /// Current limit, applied to both command and actual current
    pub i_max: f64,
    /// First-order lag time constant (seconds)
    pub time_constant: f64,
    /// Force per unit current
    pub mag_k: f64,
}

impl Default for ActuatorParams {
    fn default() -> Self {
        Self {
            i_max: I_MAX,
            time_constant: COIL_TIME_CONSTANT,
            mag_k: MAG_K,
        }
    }
}

/// Position sensor parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorParams {
    /// Sampling period (seconds)
    pub period: f64,
    /// Measurement noise as a fraction of the disturbance amplitude
    pub noise_scale: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            period: SENSOR_DT,
            noise_scale: SENSOR_NOISE_SCALE,
        }
    }
}

/// Complete, validated simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Preset these parameters started from
    pub revision: Revision,
    /// Fixed timestep (seconds)
    pub dt: f64,
    pub kp: f64,
    pub kd: f64,
    /// Stiffness of the unstable open-loop force (0 disables it)
    pub open_loop_gain: f64,
    /// Gravity magnitude used when the gravity toggle is on (0 disables it)
    pub gravity: f64,
    /// Coil dynamics; `None` means the command is applied directly as force
    pub actuator: Option<ActuatorParams>,
    /// Sampled sensor; `None` means the controller reads the true state
    pub sensor: Option<SensorParams>,
    /// Object radius used by the bounds check (pixels)
    pub object_radius_px: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::preset(Revision::default())
    }
}

impl SimConfig {
    /// Parameters of a revision preset
    pub fn preset(revision: Revision) -> Self {
        let base = Self {
            revision,
            dt: DT,
            kp: KP,
            kd: KD,
            open_loop_gain: 0.0,
            gravity: 0.0,
            actuator: None,
            sensor: None,
            object_radius_px: 0.0,
        };

        match revision {
            Revision::Basic => base,
            Revision::Gravity => Self {
                open_loop_gain: OPEN_LOOP_GAIN,
                gravity: GRAVITY,
                ..base
            },
            Revision::Actuated => Self {
                open_loop_gain: OPEN_LOOP_GAIN,
                gravity: GRAVITY,
                actuator: Some(ActuatorParams::default()),
                sensor: Some(SensorParams::default()),
                object_radius_px: OBJECT_RADIUS_PX,
                ..base
            },
        }
    }

    /// Parse a JSON override document and apply it to its preset
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: ConfigOverrides = serde_json::from_str(json)?;
        let config = overrides.apply();
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LevitasError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} config from {}",
            config.revision.as_str(),
            path.display()
        );
        Ok(config)
    }

    /// Reject parameters the integrator cannot run with
    pub fn validate(&self) -> Result<()> {
        positive("dt", self.dt)?;
        non_negative("kp", self.kp)?;
        non_negative("kd", self.kd)?;
        finite("open_loop_gain", self.open_loop_gain)?;
        non_negative("gravity", self.gravity)?;
        non_negative("object_radius_px", self.object_radius_px)?;

        if let Some(actuator) = &self.actuator {
            positive("actuator.i_max", actuator.i_max)?;
            positive("actuator.mag_k", actuator.mag_k)?;
            positive("actuator.time_constant", actuator.time_constant)?;
            if actuator.time_constant < self.dt {
                return Err(LevitasError::InvalidParameter {
                    name: "actuator.time_constant",
                    value: actuator.time_constant,
                    reason: "must not be shorter than dt",
                });
            }
        }

        if let Some(sensor) = &self.sensor {
            positive("sensor.period", sensor.period)?;
            non_negative("sensor.noise_scale", sensor.noise_scale)?;
        }

        Ok(())
    }

    /// Whether the gravity toggle has any effect
    pub fn has_gravity(&self) -> bool {
        self.gravity > 0.0
    }
}

/// On-disk form: every field optional, applied over the named preset
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigOverrides {
    revision: Option<Revision>,
    dt: Option<f64>,
    kp: Option<f64>,
    kd: Option<f64>,
    open_loop_gain: Option<f64>,
    gravity: Option<f64>,
    actuator: Option<ActuatorParams>,
    sensor: Option<SensorParams>,
    object_radius_px: Option<f64>,
}

impl ConfigOverrides {
    fn apply(self) -> SimConfig {
        let preset = SimConfig::preset(self.revision.unwrap_or_default());
        SimConfig {
            revision: preset.revision,
            dt: self.dt.unwrap_or(preset.dt),
            kp: self.kp.unwrap_or(preset.kp),
            kd: self.kd.unwrap_or(preset.kd),
            open_loop_gain: self.open_loop_gain.unwrap_or(preset.open_loop_gain),
            gravity: self.gravity.unwrap_or(preset.gravity),
            actuator: self.actuator.or(preset.actuator),
            sensor: self.sensor.or(preset.sensor),
            object_radius_px: self.object_radius_px.unwrap_or(preset.object_radius_px),
        }
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LevitasError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(LevitasError::InvalidParameter {
            name,
            value,
            reason: "must be positive",
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(LevitasError::InvalidParameter {
            name,
            value,
            reason: "must not be negative",
        })
    }
}
