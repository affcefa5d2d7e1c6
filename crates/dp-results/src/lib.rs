//! dp-results: flat array export of pendulum angle series.

pub mod npy;
pub mod store;
pub mod types;

pub use npy::{read_npy_f64, write_npy_f64};
pub use store::{ArrayStore, DEFAULT_PREFIX, OutputPaths};
pub use types::AngleSeries;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid array file content: {message}")]
    InvalidContent { message: String },

    #[error("Series length mismatch: t={t}, theta1={theta1}, theta2={theta2}")]
    LengthMismatch {
        t: usize,
        theta1: usize,
        theta2: usize,
    },

    #[error("Array file not found: {path}")]
    NotFound { path: std::path::PathBuf },
}
