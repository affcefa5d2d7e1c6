//! Application service layer for the double pendulum integrator.
//!
//! Owns run configuration, orchestrates the configure → integrate →
//! validate → export pipeline, and summarizes exported runs for the CLI.

pub mod config;
pub mod error;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use config::{
    InitialDef, OutputDef, PendulumDef, RunConfig, SolverDef, SolverMethod, ValidationDef,
    WindowDef,
};
pub use error::{AppError, AppResult};
pub use query::{SeriesSummary, summarize};
pub use run_service::{RunRequest, RunResponse, RunTimingSummary, load_outputs, run};
