//! Planar double pendulum: parameters, state, equations of motion, energy.

use std::f64::consts::PI;

use dp_core::ensure_positive;
use dp_core::units::{Accel, Length, Mass, constants};
use nalgebra::Vector4;
use uom::si::acceleration::meter_per_second_squared;
use uom::si::length::meter;
use uom::si::mass::kilogram;

use crate::error::SimResult;
use crate::model::TransientModel;

/// Rod lengths (m), bob masses (kg) and gravitational acceleration (m/s²).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalParameters {
    pub l1: f64,
    pub l2: f64,
    pub m1: f64,
    pub m2: f64,
    pub g: f64,
}

impl PhysicalParameters {
    /// Create parameters, rejecting non-positive or non-finite values.
    pub fn new(l1: f64, l2: f64, m1: f64, m2: f64, g: f64) -> SimResult<Self> {
        Ok(Self {
            l1: ensure_positive(l1, "l1 must be positive")?,
            l2: ensure_positive(l2, "l2 must be positive")?,
            m1: ensure_positive(m1, "m1 must be positive")?,
            m2: ensure_positive(m2, "m2 must be positive")?,
            g: ensure_positive(g, "g must be positive")?,
        })
    }

    pub fn from_quantities(
        l1: Length,
        l2: Length,
        m1: Mass,
        m2: Mass,
        g: Accel,
    ) -> SimResult<Self> {
        Self::new(
            l1.get::<meter>(),
            l2.get::<meter>(),
            m1.get::<kilogram>(),
            m2.get::<kilogram>(),
            g.get::<meter_per_second_squared>(),
        )
    }

    /// The reference configuration: L1=3.46, L2=4.35, m1=m2=1, g=9.81.
    pub fn reference() -> Self {
        Self {
            l1: 3.46,
            l2: 4.35,
            m1: 1.0,
            m2: 1.0,
            g: constants::G_MPS2,
        }
    }

    fn total_mass(&self) -> f64 {
        self.m1 + self.m2
    }
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self::reference()
    }
}

/// Rod angles from the downward vertical (rad) and their angular velocities (rad/s).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendulumState {
    pub theta1: f64,
    pub omega1: f64,
    pub theta2: f64,
    pub omega2: f64,
}

impl PendulumState {
    pub fn new(theta1: f64, omega1: f64, theta2: f64, omega2: f64) -> Self {
        Self {
            theta1,
            omega1,
            theta2,
            omega2,
        }
    }

    /// Released from rest at the given angles.
    pub fn at_rest(theta1: f64, theta2: f64) -> Self {
        Self::new(theta1, 0.0, theta2, 0.0)
    }

    /// (3π/7, 0, 3π/4, 0)
    pub fn reference() -> Self {
        Self::at_rest(3.0 * PI / 7.0, 3.0 * PI / 4.0)
    }

    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.theta1, self.omega1, self.theta2, self.omega2)
    }

    pub fn from_vector(v: &Vector4<f64>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite()
            && self.omega1.is_finite()
            && self.theta2.is_finite()
            && self.omega2.is_finite()
    }

    /// Cartesian (x, y) positions of both bobs, pivot at the origin, y up.
    pub fn bob_positions(&self, params: &PhysicalParameters) -> [(f64, f64); 2] {
        let x1 = params.l1 * self.theta1.sin();
        let y1 = -params.l1 * self.theta1.cos();
        let x2 = x1 + params.l2 * self.theta2.sin();
        let y2 = y1 - params.l2 * self.theta2.cos();
        [(x1, y1), (x2, y2)]
    }
}

impl From<Vector4<f64>> for PendulumState {
    fn from(v: Vector4<f64>) -> Self {
        Self::from_vector(&v)
    }
}

impl From<PendulumState> for Vector4<f64> {
    fn from(s: PendulumState) -> Self {
        s.to_vector()
    }
}

/// Time derivative of (θ1, ω1, θ2, ω2).
///
/// The shared denominator `m1 + m2*sin²(θ1-θ2)` is bounded below by `m1`.
pub fn derivative(params: &PhysicalParameters, y: &Vector4<f64>) -> Vector4<f64> {
    let PhysicalParameters { l1, l2, m1, m2, g } = *params;
    let (theta1, z1, theta2, z2) = (y[0], y[1], y[2], y[3]);

    let (s, c) = (theta1 - theta2).sin_cos();
    let denom = m1 + m2 * s * s;

    let z1dot = (m2 * g * theta2.sin() * c
        - m2 * s * (l1 * z1 * z1 * c + l2 * z2 * z2)
        - (m1 + m2) * g * theta1.sin())
        / (l1 * denom);
    let z2dot = ((m1 + m2) * (l1 * z1 * z1 * s - g * theta2.sin() + g * theta1.sin() * c)
        + m2 * l2 * z2 * z2 * s * c)
        / (l2 * denom);

    Vector4::new(z1, z1dot, z2, z2dot)
}

pub fn potential_energy(params: &PhysicalParameters, state: &PendulumState) -> f64 {
    -params.total_mass() * params.l1 * params.g * state.theta1.cos()
        - params.m2 * params.l2 * params.g * state.theta2.cos()
}

pub fn kinetic_energy(params: &PhysicalParameters, state: &PendulumState) -> f64 {
    let v1 = params.l1 * state.omega1;
    let v2 = params.l2 * state.omega2;
    0.5 * params.m1 * v1 * v1
        + 0.5
            * params.m2
            * (v1 * v1 + v2 * v2 + 2.0 * v1 * v2 * (state.theta1 - state.theta2).cos())
}

/// Total mechanical energy T + V.
pub fn total_energy(params: &PhysicalParameters, state: &PendulumState) -> f64 {
    kinetic_energy(params, state) + potential_energy(params, state)
}

/// Double pendulum as a [`TransientModel`] over `Vector4<f64>` states.
#[derive(Clone, Debug)]
pub struct DoublePendulum {
    params: PhysicalParameters,
    y0: PendulumState,
}

impl DoublePendulum {
    pub fn new(params: PhysicalParameters, y0: PendulumState) -> Self {
        Self { params, y0 }
    }
}

impl TransientModel for DoublePendulum {
    type State = Vector4<f64>;

    fn initial_state(&self) -> Self::State {
        self.y0.to_vector()
    }

    fn rhs(&mut self, _t: f64, x: &Self::State) -> SimResult<Self::State> {
        Ok(derivative(&self.params, x))
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_core::units::{kg, m, mps2};
    use proptest::prelude::*;

    #[test]
    fn parameters_reject_non_positive() {
        assert!(PhysicalParameters::new(0.0, 1.0, 1.0, 1.0, 9.81).is_err());
        assert!(PhysicalParameters::new(1.0, 1.0, -1.0, 1.0, 9.81).is_err());
        assert!(PhysicalParameters::new(1.0, 1.0, 1.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn parameters_from_quantities_match_reference() {
        let p =
            PhysicalParameters::from_quantities(m(3.46), m(4.35), kg(1.0), kg(1.0), mps2(9.81))
                .unwrap();
        assert_eq!(p, PhysicalParameters::reference());
    }

    #[test]
    fn hanging_at_rest_is_equilibrium() {
        let params = PhysicalParameters::reference();
        let d = derivative(&params, &PendulumState::at_rest(0.0, 0.0).to_vector());
        assert_eq!(d, Vector4::zeros());
    }

    #[test]
    fn aligned_state_uses_m1_denominator() {
        // s = 0: the shared denominator reduces to m1.
        let params = PhysicalParameters::reference();
        let theta = 0.4_f64;
        let d = derivative(&params, &PendulumState::at_rest(theta, theta).to_vector());
        let expected_z1 =
            (params.m2 * params.g * theta.sin() - 2.0 * params.g * theta.sin()) / params.l1;
        assert!((d[1] - expected_z1).abs() < 1e-12);
        assert!(d[3].abs() < 1e-12);
    }

    #[test]
    fn energy_at_rest_is_potential_only() {
        let params = PhysicalParameters::reference();
        let state = PendulumState::reference();
        assert_eq!(kinetic_energy(&params, &state), 0.0);
        let expected = -2.0 * 3.46 * 9.81 * (3.0 * PI / 7.0).cos()
            - 4.35 * 9.81 * (3.0 * PI / 4.0).cos();
        assert!((total_energy(&params, &state) - expected).abs() < 1e-12);
    }

    #[test]
    fn bob_positions_hanging_straight_down() {
        let params = PhysicalParameters::reference();
        let [(x1, y1), (x2, y2)] = PendulumState::at_rest(0.0, 0.0).bob_positions(&params);
        assert_eq!((x1, y1), (0.0, -3.46));
        assert_eq!(x2, 0.0);
        assert!((y2 + 3.46 + 4.35).abs() < 1e-12);
    }

    #[test]
    fn model_rhs_matches_derivative() {
        let params = PhysicalParameters::reference();
        let mut model = DoublePendulum::new(params, PendulumState::reference());
        let x = model.initial_state();
        assert_eq!(x, PendulumState::reference().to_vector());
        assert_eq!(model.rhs(0.0, &x).unwrap(), derivative(&params, &x));
    }

    fn any_state() -> impl Strategy<Value = PendulumState> {
        (-10.0_f64..10.0, -5.0_f64..5.0, -10.0_f64..10.0, -5.0_f64..5.0)
            .prop_map(|(a, b, c, d)| PendulumState::new(a, b, c, d))
    }

    proptest! {
        #[test]
        fn derivative_is_finite(state in any_state()) {
            let d = derivative(&PhysicalParameters::reference(), &state.to_vector());
            prop_assert!(d.iter().all(|v| v.is_finite()));
        }

        #[test]
        fn derivative_is_odd(state in any_state()) {
            let params = PhysicalParameters::reference();
            let y = state.to_vector();
            let d_pos = derivative(&params, &y);
            let d_neg = derivative(&params, &(-y));
            for i in 0..4 {
                prop_assert!((d_pos[i] + d_neg[i]).abs() < 1e-9);
            }
        }

        #[test]
        fn energy_is_periodic_in_angles(state in any_state()) {
            let params = PhysicalParameters::reference();
            let shifted = PendulumState::new(
                state.theta1 + 2.0 * PI,
                state.omega1,
                state.theta2 - 2.0 * PI,
                state.omega2,
            );
            let e = total_energy(&params, &state);
            let e_shifted = total_energy(&params, &shifted);
            prop_assert!((e - e_shifted).abs() < 1e-9 * e.abs().max(1.0));
        }
    }
}
