//! Summaries of exported angle series.

use dp_results::AngleSeries;
use dp_sim::{PendulumState, PhysicalParameters};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub samples: usize,
    pub time_range: (f64, f64),
    pub theta1_range: (f64, f64),
    pub theta2_range: (f64, f64),
    /// Largest distance of the outer bob from the pivot (m)
    pub max_reach: f64,
}

fn range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Summarize a series; rod lengths come from `params` since only angles are exported.
pub fn summarize(series: &AngleSeries, params: &PhysicalParameters) -> AppResult<SeriesSummary> {
    let time_range = series
        .time_range()
        .ok_or_else(|| AppError::InvalidInput("series is empty".to_string()))?;

    let max_reach = series
        .theta1
        .iter()
        .zip(&series.theta2)
        .map(|(&theta1, &theta2)| {
            let [_, (x2, y2)] = PendulumState::at_rest(theta1, theta2).bob_positions(params);
            x2.hypot(y2)
        })
        .fold(0.0_f64, f64::max);

    Ok(SeriesSummary {
        samples: series.len(),
        time_range,
        theta1_range: range(&series.theta1),
        theta2_range: range(&series.theta2),
        max_reach,
    })
}
