//! Simulation runner: sample grid, integrator dispatch, trajectory recording.

use dp_core::{Tolerances, nearly_equal};
use nalgebra::SVector;

use crate::adaptive::{AdaptiveOptions, AdaptiveStats, DormandPrince45};
use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::TransientModel;
use crate::pendulum::{DoublePendulum, PendulumState, PhysicalParameters};

/// Guard against `t_max / dt` landing a hair below an integer.
const GRID_EPS: f64 = 1e-9;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Dormand-Prince 5(4) with error control (default).
    #[default]
    Adaptive,
    /// 4th-order Runge-Kutta, one step per sample interval.
    RK4,
    /// Forward Euler, one step per sample interval.
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Sample spacing (seconds); also the step of the fixed-step integrators
    pub dt: f64,
    /// Final sample time (seconds)
    pub t_max: f64,
    /// Integrator type (default: adaptive)
    pub integrator: IntegratorType,
    /// Step-size control for the adaptive integrator
    pub adaptive: AdaptiveOptions,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.01,
            t_max: 20.0,
            integrator: IntegratorType::default(),
            adaptive: AdaptiveOptions::default(),
        }
    }
}

impl SimOptions {
    pub fn new(t_max: f64, dt: f64) -> Self {
        Self {
            t_max,
            dt,
            ..Self::default()
        }
    }

    pub fn with_integrator(mut self, integrator: IntegratorType) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive and finite",
            });
        }
        if !(self.t_max > 0.0 && self.t_max.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "t_max must be positive and finite",
            });
        }
        // dt == t_max up to rounding still yields a two-sample grid
        if self.dt > self.t_max && !nearly_equal(self.dt, self.t_max, Tolerances::default()) {
            return Err(SimError::InvalidArg {
                what: "dt must not exceed t_max",
            });
        }
        Ok(())
    }
}

/// Uniform sample times `0, dt, 2*dt, ...` with `floor(t_max/dt) + 1` entries.
pub fn sample_times(t_max: f64, dt: f64) -> SimResult<Vec<f64>> {
    SimOptions::new(t_max, dt).validate()?;
    let intervals = (t_max / dt + GRID_EPS).floor() as usize;
    Ok((0..=intervals).map(|i| i as f64 * dt).collect())
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<S>,
    /// Adaptive stepper counters (zero for fixed-step runs)
    pub stats: AdaptiveStats,
}

/// Run a transient simulation, recording the state at every sample time.
pub fn run_sim<M, const N: usize>(
    model: &mut M,
    opts: &SimOptions,
) -> SimResult<SimRecord<SVector<f64, N>>>
where
    M: TransientModel<State = SVector<f64, N>>,
{
    let t = sample_times(opts.t_max, opts.dt)?;

    let x0 = model.initial_state();
    if x0.iter().any(|v| !v.is_finite()) {
        return Err(SimError::InvalidArg {
            what: "initial state must be finite",
        });
    }

    let mut x = Vec::with_capacity(t.len());
    x.push(x0);

    let stats = match opts.integrator {
        IntegratorType::Adaptive => {
            let mut stepper = DormandPrince45::new(opts.adaptive.clone())?;
            for w in t.windows(2) {
                let prev = x[x.len() - 1];
                x.push(stepper.advance(model, w[0], &prev, w[1])?);
            }
            stepper.stats()
        }
        IntegratorType::RK4 => {
            step_fixed(&RK4, model, &t, &mut x)?;
            AdaptiveStats::default()
        }
        IntegratorType::ForwardEuler => {
            step_fixed(&ForwardEuler, model, &t, &mut x)?;
            AdaptiveStats::default()
        }
    };

    tracing::debug!(
        integrator = ?opts.integrator,
        samples = t.len(),
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        rhs_evals = stats.rhs_evals,
        "integration finished"
    );

    Ok(SimRecord { t, x, stats })
}

fn step_fixed<I: Integrator, M: TransientModel>(
    integrator: &I,
    model: &mut M,
    t: &[f64],
    x: &mut Vec<M::State>,
) -> SimResult<()> {
    for w in t.windows(2) {
        let next = integrator.step(model, w[0], &x[x.len() - 1], w[1] - w[0])?;
        x.push(next);
    }
    Ok(())
}

/// Sample times paired with the pendulum state at each of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<PendulumState>,
    pub stats: AdaptiveStats,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn theta1(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.theta1).collect()
    }

    pub fn theta2(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.theta2).collect()
    }
}

/// Integrate the double pendulum over `[0, t_max]` with the default adaptive solver.
pub fn integrate(
    params: &PhysicalParameters,
    y0: &PendulumState,
    t_max: f64,
    dt: f64,
) -> SimResult<Trajectory> {
    integrate_with(params, y0, &SimOptions::new(t_max, dt))
}

/// Integrate the double pendulum with explicit options.
pub fn integrate_with(
    params: &PhysicalParameters,
    y0: &PendulumState,
    opts: &SimOptions,
) -> SimResult<Trajectory> {
    let mut model = DoublePendulum::new(*params, *y0);
    let record = run_sim(&mut model, opts)?;
    Ok(Trajectory {
        times: record.t,
        states: record.x.iter().map(PendulumState::from_vector).collect(),
        stats: record.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.dt, 0.01);
        assert_eq!(opts.t_max, 20.0);
        assert_eq!(opts.integrator, IntegratorType::Adaptive);
    }

    #[test]
    fn sim_options_invalid() {
        assert!(SimOptions::new(1.0, 0.0).validate().is_err());
        assert!(SimOptions::new(1.0, -0.1).validate().is_err());
        assert!(SimOptions::new(0.0, 0.1).validate().is_err());
        assert!(SimOptions::new(1.0, 2.0).validate().is_err());
        assert!(SimOptions::new(f64::NAN, 0.1).validate().is_err());
    }

    #[test]
    fn reference_grid_has_2001_samples() {
        let t = sample_times(20.0, 0.01).unwrap();
        assert_eq!(t.len(), 2001);
        assert_eq!(t[0], 0.0);
        assert!((t[2000] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn dt_equal_to_t_max_gives_endpoints() {
        let t = sample_times(2.5, 2.5).unwrap();
        assert_eq!(t, vec![0.0, 2.5]);
    }

    #[test]
    fn dt_rounded_just_past_t_max_is_accepted() {
        let dt = 0.1 + 0.2;
        assert!(dt > 0.3);
        let t = sample_times(0.3, dt).unwrap();
        assert_eq!(t, vec![0.0, dt]);
    }

    #[test]
    fn non_finite_initial_state_rejected() {
        let y0 = PendulumState::new(f64::NAN, 0.0, 0.0, 0.0);
        let err = integrate(&PhysicalParameters::reference(), &y0, 1.0, 0.1).unwrap_err();
        assert!(matches!(err, SimError::InvalidArg { .. }));
    }

    #[test]
    fn fixed_step_records_one_state_per_sample() {
        let opts = SimOptions::new(1.0, 0.1).with_integrator(IntegratorType::RK4);
        let traj = integrate_with(
            &PhysicalParameters::reference(),
            &PendulumState::reference(),
            &opts,
        )
        .unwrap();
        assert_eq!(traj.len(), 11);
        assert_eq!(traj.states.len(), 11);
        assert_eq!(traj.stats, AdaptiveStats::default());
    }

    proptest! {
        #[test]
        fn grid_length_matches_floor_formula(t_max in 0.1_f64..50.0, steps in 1usize..500) {
            let dt = t_max / steps as f64;
            let t = sample_times(t_max, dt).unwrap();
            prop_assert_eq!(t.len(), steps + 1);
            prop_assert!((t[t.len() - 1] - t_max).abs() < dt);
        }
    }
}
