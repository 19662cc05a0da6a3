//! Crate error type
//!
//! The simulation itself never fails; a lost object is reported through
//! [`Phase::Failed`](crate::sim::Phase). These errors cover loading and
//! validating configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevitasError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config JSON was malformed
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A parameter is outside its usable range
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Unknown revision name
    #[error("unknown revision `{0}` (expected basic, gravity or actuated)")]
    UnknownRevision(String),
}

pub type Result<T> = std::result::Result<T, LevitasError>;
