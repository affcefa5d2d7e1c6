//! Model seam shared by the fixed-step and adaptive steppers.

use crate::error::SimResult;

/// An ODE system `x' = f(t, x)` with vector-space state arithmetic.
///
/// The fixed-step [`Integrator`](crate::Integrator)s only need `add` and
/// `scale`. [`run_sim`](crate::run_sim) and the Dormand-Prince stepper
/// further require `State = SVector<f64, N>` so they can take error norms
/// componentwise; [`DoublePendulum`](crate::DoublePendulum) uses `N = 4`
/// in the order (θ1, ω1, θ2, ω2).
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state at t=0.
    fn initial_state(&self) -> Self::State;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes &mut self so models may cache between evaluations.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
