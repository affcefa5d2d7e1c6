//! Error types for the dp-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// and provides a unified error interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Maximum energy drift of {tolerance} exceeded (observed {drift})")]
    EnergyDrift { tolerance: f64, drift: f64 },

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<dp_sim::SimError> for AppError {
    fn from(err: dp_sim::SimError) -> Self {
        match err {
            dp_sim::SimError::EnergyDrift { tolerance, drift } => {
                AppError::EnergyDrift { tolerance, drift }
            }
            dp_sim::SimError::InvalidArg { what } => AppError::InvalidInput(what.to_string()),
            other => AppError::Simulation(other.to_string()),
        }
    }
}

impl From<dp_results::ResultsError> for AppError {
    fn from(err: dp_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
