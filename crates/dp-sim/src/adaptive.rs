//! Adaptive Dormand-Prince 5(4) integrator with embedded error control.
//!
//! The stepper advances between caller-chosen output times, clipping the
//! last step of each interval so the solution lands exactly on the output
//! time. The step-size proposal and the first-same-as-last stage are
//! carried across intervals.

use dp_core::Tolerances;
use nalgebra::SVector;

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;

// Butcher tableau (Dormand & Prince 1980).
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (also row 7 of the tableau, hence FSAL).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between 5th- and 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Clipped steps within this fraction of the remaining interval are stretched to land on it.
const LANDING_SLACK: f64 = 0.01;

/// Step-size control settings.
#[derive(Clone, Debug)]
pub struct AdaptiveOptions {
    /// Per-component error target: `abs + rel * max(|x_old|, |x_new|)`
    pub tol: Tolerances,
    /// First trial step (seconds)
    pub initial_step: f64,
    /// Smallest step the controller may propose before giving up (seconds)
    pub min_step: f64,
    /// Upper bound on any step (seconds)
    pub max_step: Option<f64>,
    /// Maximum number of attempted steps (accepted + rejected)
    pub max_steps: usize,
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            tol: Tolerances {
                abs: 1e-10,
                rel: 1e-10,
            },
            initial_step: 1e-3,
            min_step: 1e-12,
            max_step: None,
            max_steps: 5_000_000,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
        }
    }
}

/// Counters accumulated over the lifetime of a stepper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdaptiveStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evals: usize,
}

/// Dormand-Prince 5(4) stepper over fixed-size vector states.
#[derive(Clone, Debug)]
pub struct DormandPrince45<const N: usize> {
    opts: AdaptiveOptions,
    h: f64,
    fsal: Option<(f64, SVector<f64, N>, SVector<f64, N>)>,
    stats: AdaptiveStats,
}

impl<const N: usize> DormandPrince45<N> {
    pub fn new(opts: AdaptiveOptions) -> SimResult<Self> {
        if !(opts.tol.abs >= 0.0 && opts.tol.rel >= 0.0) || opts.tol.abs + opts.tol.rel <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "adaptive tolerances must be non-negative and not both zero",
            });
        }
        if !(opts.initial_step > 0.0 && opts.initial_step.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "initial_step must be positive",
            });
        }
        if !(opts.min_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "min_step must be positive",
            });
        }
        if opts.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(Self {
            h: opts.initial_step,
            opts,
            fsal: None,
            stats: AdaptiveStats::default(),
        })
    }

    pub fn stats(&self) -> AdaptiveStats {
        self.stats
    }

    /// Integrate from `(t0, x0)` to exactly `t_end`.
    pub fn advance<M>(
        &mut self,
        model: &mut M,
        t0: f64,
        x0: &SVector<f64, N>,
        t_end: f64,
    ) -> SimResult<SVector<f64, N>>
    where
        M: TransientModel<State = SVector<f64, N>>,
    {
        let mut t = t0;
        let mut x = *x0;
        let mut k1 = match self.fsal.take() {
            Some((tc, xc, k)) if tc == t0 && xc == *x0 => k,
            _ => {
                self.stats.rhs_evals += 1;
                model.rhs(t, &x)?
            }
        };

        while t < t_end {
            if self.stats.accepted_steps + self.stats.rejected_steps >= self.opts.max_steps {
                return Err(SimError::ConvergenceFailed {
                    what: "adaptive integrator exceeded max_steps",
                });
            }

            if let Some(max_step) = self.opts.max_step {
                self.h = self.h.min(max_step);
            }
            let remaining = t_end - t;
            let landing = self.h * (1.0 + LANDING_SLACK) >= remaining;
            let h = if landing { remaining } else { self.h };

            let k2 = model.rhs(t + C2 * h, &(x + k1 * (h * A21)))?;
            let k3 = model.rhs(t + C3 * h, &(x + (k1 * A31 + k2 * A32) * h))?;
            let k4 = model.rhs(t + C4 * h, &(x + (k1 * A41 + k2 * A42 + k3 * A43) * h))?;
            let k5 = model.rhs(
                t + C5 * h,
                &(x + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h),
            )?;
            let k6 = model.rhs(
                t + h,
                &(x + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h),
            )?;
            let x_new = x + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
            let k7 = model.rhs(t + h, &x_new)?;
            self.stats.rhs_evals += 6;

            let err_vec = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
            let err = self.error_norm(&err_vec, &x, &x_new);

            if err.is_finite() && err <= 1.0 {
                self.stats.accepted_steps += 1;
                t = if landing { t_end } else { t + h };
                x = x_new;
                k1 = k7;

                let factor = if err == 0.0 {
                    self.opts.max_factor
                } else {
                    (self.opts.safety * err.powf(-0.2))
                        .clamp(self.opts.min_factor, self.opts.max_factor)
                };
                // A clipped landing step says little about the natural step size.
                self.h = if landing {
                    self.h.max(h * factor)
                } else {
                    h * factor
                };
            } else {
                self.stats.rejected_steps += 1;
                let factor = if err.is_finite() {
                    (self.opts.safety * err.powf(-0.2)).clamp(self.opts.min_factor, 1.0)
                } else {
                    self.opts.min_factor
                };
                self.h = h * factor;
                if self.h < self.opts.min_step {
                    tracing::warn!(t, h = self.h, "adaptive step size underflow");
                    return Err(SimError::ConvergenceFailed {
                        what: "adaptive step size fell below min_step",
                    });
                }
            }
        }

        self.fsal = Some((t, x, k1));
        Ok(x)
    }

    /// RMS of the error scaled by the per-component tolerance.
    fn error_norm(
        &self,
        err: &SVector<f64, N>,
        x_old: &SVector<f64, N>,
        x_new: &SVector<f64, N>,
    ) -> f64 {
        let tol = self.opts.tol;
        let sum: f64 = (0..N)
            .map(|i| {
                let scale = tol.abs + tol.rel * x_old[i].abs().max(x_new[i].abs());
                let r = err[i] / scale;
                r * r
            })
            .sum();
        (sum / N as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;
    use std::f64::consts::PI;

    /// y'' + ω²y = 0
    struct Oscillator {
        omega: f64,
    }

    impl TransientModel for Oscillator {
        type State = Vector2<f64>;

        fn initial_state(&self) -> Self::State {
            Vector2::new(1.0, 0.0)
        }

        fn rhs(&mut self, _t: f64, x: &Self::State) -> SimResult<Self::State> {
            Ok(Vector2::new(x[1], -self.omega * self.omega * x[0]))
        }

        fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
            a + b
        }

        fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
            a * scale
        }
    }

    #[test]
    fn oscillator_full_period_matches_exact() {
        let omega = 2.0;
        let mut model = Oscillator { omega };
        let mut stepper = DormandPrince45::new(AdaptiveOptions::default()).unwrap();
        let period = 2.0 * PI / omega;
        let x0 = model.initial_state();
        let x = stepper.advance(&mut model, 0.0, &x0, period).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-8, "y(T) = {}", x[0]);
        assert!(x[1].abs() < 1e-8, "y'(T) = {}", x[1]);
        assert!(stepper.stats().accepted_steps > 0);
    }

    #[test]
    fn lands_exactly_on_output_times() {
        let mut model = Oscillator { omega: 1.0 };
        let mut stepper = DormandPrince45::new(AdaptiveOptions::default()).unwrap();
        let mut x = model.initial_state();
        for i in 1..=100 {
            let t0 = (i - 1) as f64 * 0.05;
            let t1 = i as f64 * 0.05;
            x = stepper.advance(&mut model, t0, &x, t1).unwrap();
        }
        let t_end: f64 = 100.0 * 0.05;
        assert!((x[0] - t_end.cos()).abs() < 1e-8);
    }

    #[test]
    fn fsal_stage_is_reused_between_intervals() {
        let mut model = Oscillator { omega: 1.0 };
        let mut stepper = DormandPrince45::new(AdaptiveOptions::default()).unwrap();
        let x0 = model.initial_state();
        let x1 = stepper.advance(&mut model, 0.0, &x0, 0.1).unwrap();
        let evals_after_first = stepper.stats().rhs_evals;
        stepper.advance(&mut model, 0.1, &x1, 0.2).unwrap();
        let stats = stepper.stats();
        let attempts = stats.accepted_steps + stats.rejected_steps;
        // One initial k1, then 6 stages per attempt.
        assert_eq!(stats.rhs_evals, 1 + 6 * attempts);
        assert!(stats.rhs_evals > evals_after_first);
    }

    #[test]
    fn zero_length_interval_is_identity() {
        let mut model = Oscillator { omega: 1.0 };
        let mut stepper = DormandPrince45::new(AdaptiveOptions::default()).unwrap();
        let x0 = model.initial_state();
        let x = stepper.advance(&mut model, 1.0, &x0, 1.0).unwrap();
        assert_eq!(x, x0);
        assert_eq!(stepper.stats().accepted_steps, 0);
    }

    #[test]
    fn max_steps_limit_is_enforced() {
        let mut model = Oscillator { omega: 1.0 };
        let opts = AdaptiveOptions {
            max_steps: 3,
            max_step: Some(1e-3),
            ..AdaptiveOptions::default()
        };
        let mut stepper = DormandPrince45::new(opts).unwrap();
        let x0 = model.initial_state();
        let err = stepper.advance(&mut model, 0.0, &x0, 1.0).unwrap_err();
        assert!(matches!(err, SimError::ConvergenceFailed { .. }));
    }

    #[test]
    fn invalid_options_rejected() {
        let opts = AdaptiveOptions {
            tol: Tolerances { abs: 0.0, rel: 0.0 },
            ..AdaptiveOptions::default()
        };
        assert!(DormandPrince45::<2>::new(opts).is_err());
    }
}
