//! Double pendulum simulation.
//!
//! Provides:
//! - The physical model (equations of motion, total energy)
//! - Fixed-step RK4 / forward Euler integrators
//! - Adaptive Dormand-Prince 5(4) integrator sampled on a uniform grid
//! - Energy-drift validation of a computed trajectory

pub mod adaptive;
pub mod energy;
pub mod error;
pub mod integrator;
pub mod model;
pub mod pendulum;
pub mod sim;

// Re-exports for public API
pub use adaptive::{AdaptiveOptions, AdaptiveStats, DormandPrince45};
pub use energy::{DEFAULT_ENERGY_DRIFT_TOLERANCE, EnergyReport, check_energy, energy_profile};
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::TransientModel;
pub use pendulum::{DoublePendulum, PendulumState, PhysicalParameters, derivative, total_energy};
pub use sim::{
    IntegratorType, SimOptions, SimRecord, Trajectory, integrate, integrate_with, run_sim,
    sample_times,
};
