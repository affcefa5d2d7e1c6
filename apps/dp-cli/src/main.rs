use clap::{Parser, Subcommand};
use dp_app::{AppResult, RunConfig, RunRequest, RunResponse, load_outputs, run, summarize};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dp-cli")]
#[command(about = "Double pendulum integrator and angle exporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate, check energy conservation and write the theta1/theta2/t arrays
    Run {
        /// YAML file overriding the reference configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory receiving the .npy files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print the reference configuration as YAML
    Config,
    /// Summarize arrays written by a previous run
    Inspect {
        /// Directory holding the .npy files
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// File name prefix of the arrays
        #[arg(long, default_value = dp_results::DEFAULT_PREFIX)]
        prefix: String,
        /// YAML file providing the rod lengths (reference lengths otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, out_dir } => cmd_run(config.as_deref(), &out_dir),
        Commands::Config => cmd_config(),
        Commands::Inspect {
            dir,
            prefix,
            config,
        } => cmd_inspect(&dir, &prefix, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<RunConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading run configuration");
            RunConfig::load_yaml(path)
        }
        None => Ok(RunConfig::default()),
    }
}

fn cmd_run(config_path: Option<&Path>, out_dir: &Path) -> AppResult<()> {
    let config = load_config(config_path)?;
    println!("Running double pendulum simulation");
    println!(
        "  L1 = {} m, L2 = {} m, m1 = {} kg, m2 = {} kg, g = {} m/s^2",
        config.pendulum.l1,
        config.pendulum.l2,
        config.pendulum.m1,
        config.pendulum.m2,
        config.pendulum.g
    );
    println!(
        "  t_max = {:.3} s, dt = {:.4} s, solver = {:?}",
        config.window.t_max, config.window.dt, config.solver.method
    );

    let response = run(&RunRequest {
        config: &config,
        out_dir,
    })?;

    println!("✓ Simulation completed: {} samples", response.samples);
    print_energy_summary(&response);
    print_timing_summary(&response);

    println!("\nWrote:");
    for path in response.paths.iter() {
        println!("  {}", path.display());
    }
    Ok(())
}

fn print_energy_summary(response: &RunResponse) {
    let e = &response.energy;
    println!("\nEnergy check:");
    println!("  Initial energy:   {:.6} J", e.initial_energy);
    println!(
        "  Cumulative drift: {:.3e} (tolerance {})",
        e.cumulative_drift, e.tolerance
    );
    println!("  Max sample drift: {:.3e}", e.max_drift);
}

fn print_timing_summary(response: &RunResponse) {
    let timing = &response.timing;
    let total = timing.total_time_s.max(1.0e-12);
    let integrate_pct = 100.0 * timing.integrate_time_s / total;
    let validate_pct = 100.0 * timing.validate_time_s / total;
    let save_pct = 100.0 * timing.save_time_s / total;

    println!("\nTiming summary:");
    println!(
        "  Integrate: {:.3}s ({:.1}%)",
        timing.integrate_time_s, integrate_pct
    );
    println!(
        "  Validate:  {:.3}s ({:.1}%)",
        timing.validate_time_s, validate_pct
    );
    println!("  Save:      {:.3}s ({:.1}%)", timing.save_time_s, save_pct);
    println!("  Total:     {:.3}s", timing.total_time_s);

    let stats = &response.stats;
    if stats.accepted_steps > 0 {
        println!("  Accepted steps: {}", stats.accepted_steps);
        println!("  Rejected steps: {}", stats.rejected_steps);
        println!("  RHS evaluations: {}", stats.rhs_evals);
    }
}

fn cmd_config() -> AppResult<()> {
    print!("{}", RunConfig::default().to_yaml_string()?);
    Ok(())
}

fn cmd_inspect(dir: &Path, prefix: &str, config_path: Option<&Path>) -> AppResult<()> {
    let config = load_config(config_path)?;
    let params = config.physical_parameters()?;

    println!("Loading arrays from: {}", dir.display());
    let series = load_outputs(dir, prefix)?;
    let summary = summarize(&series, &params)?;

    println!("\nRun Summary:");
    println!("  Samples: {}", summary.samples);
    println!(
        "  Time range: {:.3} - {:.3} s",
        summary.time_range.0, summary.time_range.1
    );
    println!(
        "  theta1 range: {:.4} .. {:.4} rad",
        summary.theta1_range.0, summary.theta1_range.1
    );
    println!(
        "  theta2 range: {:.4} .. {:.4} rad",
        summary.theta2_range.0, summary.theta2_range.1
    );
    println!(
        "  Max bob reach: {:.4} m (rods {} + {} m)",
        summary.max_reach, params.l1, params.l2
    );
    Ok(())
}
