//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while integrating or validating a run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: &'static str },

    /// Cumulative energy drift exceeded the configured tolerance.
    #[error("Maximum energy drift of {tolerance} exceeded (observed {drift})")]
    EnergyDrift { tolerance: f64, drift: f64 },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<dp_core::CoreError> for SimError {
    fn from(e: dp_core::CoreError) -> Self {
        match e {
            dp_core::CoreError::NonFinite { what, .. } => SimError::NonPhysical { what },
            dp_core::CoreError::InvalidArg { what } => SimError::InvalidArg { what },
        }
    }
}
