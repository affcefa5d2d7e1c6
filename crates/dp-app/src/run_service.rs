//! Run execution service: configure → integrate → validate → export.

use std::path::Path;
use std::time::Instant;

use dp_results::{AngleSeries, ArrayStore, OutputPaths};
use dp_sim::{AdaptiveStats, EnergyReport, check_energy, integrate_with};

use crate::config::RunConfig;
use crate::error::AppResult;

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub config: &'a RunConfig,
    pub out_dir: &'a Path,
}

/// Wall-clock time spent in each pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub integrate_time_s: f64,
    pub validate_time_s: f64,
    pub save_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a successful run.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub paths: OutputPaths,
    pub samples: usize,
    pub energy: EnergyReport,
    pub stats: AdaptiveStats,
    pub timing: RunTimingSummary,
}

/// Execute a run. Nothing is written unless the energy check passes.
pub fn run(request: &RunRequest) -> AppResult<RunResponse> {
    let started = Instant::now();
    let config = request.config;
    config.validate()?;

    let params = config.physical_parameters()?;
    let y0 = config.initial_state();
    let opts = config.sim_options();

    tracing::info!(
        t_max = opts.t_max,
        dt = opts.dt,
        integrator = ?opts.integrator,
        "integrating double pendulum"
    );
    let integrate_started = Instant::now();
    let trajectory = integrate_with(&params, &y0, &opts)?;
    let integrate_time_s = integrate_started.elapsed().as_secs_f64();

    let validate_started = Instant::now();
    let energy = check_energy(
        &params,
        &y0,
        &trajectory,
        config.validation.energy_drift_tolerance,
    )?;
    let validate_time_s = validate_started.elapsed().as_secs_f64();

    let save_started = Instant::now();
    let series = AngleSeries::new(
        trajectory.times.clone(),
        trajectory.theta1(),
        trajectory.theta2(),
    )?;
    let store = ArrayStore::new(request.out_dir.to_path_buf(), config.output.prefix.clone())?;
    let paths = store.save(&series)?;
    let save_time_s = save_started.elapsed().as_secs_f64();

    Ok(RunResponse {
        paths,
        samples: series.len(),
        energy,
        stats: trajectory.stats,
        timing: RunTimingSummary {
            integrate_time_s,
            validate_time_s,
            save_time_s,
            total_time_s: started.elapsed().as_secs_f64(),
        },
    })
}

/// Load the arrays exported by a previous run.
pub fn load_outputs(dir: &Path, prefix: &str) -> AppResult<AngleSeries> {
    Ok(ArrayStore::open(dir.to_path_buf(), prefix).load()?)
}
