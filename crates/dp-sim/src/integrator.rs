//! Fixed-step time integrators.
//!
//! `run_sim` takes exactly one step per sample interval with these, so the
//! sample spacing is also the truncation step. Coarse spacings show up as
//! energy drift rather than being refined away as in the adaptive path.

use crate::error::SimResult;
use crate::model::TransientModel;

pub trait Integrator {
    /// Advance `x` from `t` to `t + dt`.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical 4th-order Runge-Kutta.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // Combine: x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler. First-order; energy drifts visibly at practical steps.
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x' = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&mut self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    #[test]
    fn euler_single_step() {
        let x = ForwardEuler.step(&mut Decay, 0.0, &1.0, 0.1).unwrap();
        assert!((x - 0.9).abs() < 1e-15);
    }

    #[test]
    fn rk4_matches_taylor_series() {
        // One RK4 step of x' = -x is the 4th-order Taylor polynomial of e^-h.
        let h: f64 = 0.1;
        let x = RK4.step(&mut Decay, 0.0, &1.0, h).unwrap();
        let taylor = 1.0 - h + h * h / 2.0 - h.powi(3) / 6.0 + h.powi(4) / 24.0;
        assert!((x - taylor).abs() < 1e-15);
    }

    fn pendulum_drift_after_one_second<I: Integrator>(integrator: I) -> f64 {
        use crate::pendulum::{DoublePendulum, PendulumState, PhysicalParameters, total_energy};

        let params = PhysicalParameters::reference();
        let mut model = DoublePendulum::new(params, PendulumState::reference());
        let mut x = model.initial_state();
        for i in 0..100 {
            x = integrator.step(&mut model, i as f64 * 0.01, &x, 0.01).unwrap();
        }
        let e0 = total_energy(&params, &PendulumState::reference());
        (total_energy(&params, &PendulumState::from_vector(&x)) - e0).abs()
    }

    #[test]
    fn euler_drifts_far_more_than_rk4_on_pendulum() {
        assert!(pendulum_drift_after_one_second(ForwardEuler) > 1e-3);
        assert!(pendulum_drift_after_one_second(RK4) < 1e-4);
    }
}
