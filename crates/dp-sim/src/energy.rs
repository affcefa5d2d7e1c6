//! Energy-conservation check over a computed trajectory.

use crate::error::{SimError, SimResult};
use crate::pendulum::{PendulumState, PhysicalParameters, total_energy};
use crate::sim::Trajectory;

/// Cumulative drift allowed by the reference run.
pub const DEFAULT_ENERGY_DRIFT_TOLERANCE: f64 = 0.05;

/// Outcome of a passing energy check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyReport {
    pub initial_energy: f64,
    /// Σ |E(state) - E0| over all samples
    pub cumulative_drift: f64,
    /// Largest single-sample |E(state) - E0|
    pub max_drift: f64,
    pub tolerance: f64,
    pub samples: usize,
}

/// Total energy of every state, in order.
pub fn energy_profile(params: &PhysicalParameters, states: &[PendulumState]) -> Vec<f64> {
    states.iter().map(|s| total_energy(params, s)).collect()
}

/// Fail with [`SimError::EnergyDrift`] when the summed absolute deviation from
/// `E(y0)` exceeds `tolerance` or is not finite.
pub fn check_energy(
    params: &PhysicalParameters,
    y0: &PendulumState,
    trajectory: &Trajectory,
    tolerance: f64,
) -> SimResult<EnergyReport> {
    if !(tolerance > 0.0 && tolerance.is_finite()) {
        return Err(SimError::InvalidArg {
            what: "energy drift tolerance must be positive",
        });
    }

    let e0 = total_energy(params, y0);
    let (cumulative_drift, max_drift) = energy_profile(params, &trajectory.states)
        .into_iter()
        .map(|e| (e - e0).abs())
        .fold((0.0_f64, 0.0_f64), |(sum, max), d| (sum + d, max.max(d)));

    // NaN fails the comparison, so test for "within" rather than "exceeds".
    if !(cumulative_drift <= tolerance) {
        tracing::error!(tolerance, drift = cumulative_drift, "maximum energy drift exceeded");
        return Err(SimError::EnergyDrift {
            tolerance,
            drift: cumulative_drift,
        });
    }

    let report = EnergyReport {
        initial_energy: e0,
        cumulative_drift,
        max_drift,
        tolerance,
        samples: trajectory.len(),
    };
    tracing::info!(
        initial_energy = e0,
        drift = cumulative_drift,
        max_drift,
        tolerance,
        "energy check passed"
    );
    Ok(report)
}
