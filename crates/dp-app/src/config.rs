//! Run configuration.
//!
//! Every field defaults to the reference run, so an empty YAML document (or
//! no file at all) reproduces it. Partial documents override only the keys
//! they name.

use std::path::Path;

use dp_core::Tolerances;
use dp_sim::{
    AdaptiveOptions, DEFAULT_ENERGY_DRIFT_TOLERANCE, IntegratorType, PendulumState,
    PhysicalParameters, SimOptions,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub pendulum: PendulumDef,
    pub initial: InitialDef,
    pub window: WindowDef,
    pub solver: SolverDef,
    pub validation: ValidationDef,
    pub output: OutputDef,
}

/// Rod lengths (m), masses (kg), gravity (m/s²).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PendulumDef {
    pub l1: f64,
    pub l2: f64,
    pub m1: f64,
    pub m2: f64,
    pub g: f64,
}

impl Default for PendulumDef {
    fn default() -> Self {
        let p = PhysicalParameters::reference();
        Self {
            l1: p.l1,
            l2: p.l2,
            m1: p.m1,
            m2: p.m2,
            g: p.g,
        }
    }
}

/// Initial angles (rad) and angular velocities (rad/s).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialDef {
    pub theta1: f64,
    pub omega1: f64,
    pub theta2: f64,
    pub omega2: f64,
}

impl Default for InitialDef {
    fn default() -> Self {
        let y0 = PendulumState::reference();
        Self {
            theta1: y0.theta1,
            omega1: y0.omega1,
            theta2: y0.theta2,
            omega2: y0.omega2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowDef {
    pub t_max: f64,
    pub dt: f64,
}

impl Default for WindowDef {
    fn default() -> Self {
        Self {
            t_max: 20.0,
            dt: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    #[default]
    Adaptive,
    Rk4,
    ForwardEuler,
}

impl From<SolverMethod> for IntegratorType {
    fn from(method: SolverMethod) -> Self {
        match method {
            SolverMethod::Adaptive => IntegratorType::Adaptive,
            SolverMethod::Rk4 => IntegratorType::RK4,
            SolverMethod::ForwardEuler => IntegratorType::ForwardEuler,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    pub method: SolverMethod,
    /// Adaptive error target; ignored by the fixed-step methods
    pub tol: Tolerances,
    pub max_steps: usize,
}

impl Default for SolverDef {
    fn default() -> Self {
        let adaptive = AdaptiveOptions::default();
        Self {
            method: SolverMethod::default(),
            tol: adaptive.tol,
            max_steps: adaptive.max_steps,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationDef {
    pub energy_drift_tolerance: f64,
}

impl Default for ValidationDef {
    fn default() -> Self {
        Self {
            energy_drift_tolerance: DEFAULT_ENERGY_DRIFT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputDef {
    /// File name prefix for the exported arrays
    pub prefix: String,
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            prefix: dp_results::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: RunConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.physical_parameters()?;
        let y0 = self.initial_state();
        if !y0.is_finite() {
            return Err(AppError::InvalidInput(
                "initial state must be finite".to_string(),
            ));
        }
        self.sim_options().validate()?;

        let tol = self.solver.tol;
        if !(tol.abs >= 0.0 && tol.rel >= 0.0 && tol.abs + tol.rel > 0.0) {
            return Err(AppError::InvalidInput(
                "solver tolerances must be non-negative and not both zero".to_string(),
            ));
        }
        if self.solver.max_steps == 0 {
            return Err(AppError::InvalidInput(
                "solver.max_steps must be positive".to_string(),
            ));
        }
        let drift = self.validation.energy_drift_tolerance;
        if !(drift > 0.0 && drift.is_finite()) {
            return Err(AppError::InvalidInput(
                "validation.energy_drift_tolerance must be positive".to_string(),
            ));
        }
        if self.output.prefix.is_empty() || self.output.prefix.contains(['/', '\\']) {
            return Err(AppError::InvalidInput(
                "output.prefix must be a non-empty file name".to_string(),
            ));
        }
        Ok(())
    }

    pub fn physical_parameters(&self) -> AppResult<PhysicalParameters> {
        let p = &self.pendulum;
        Ok(PhysicalParameters::new(p.l1, p.l2, p.m1, p.m2, p.g)?)
    }

    pub fn initial_state(&self) -> PendulumState {
        let i = &self.initial;
        PendulumState::new(i.theta1, i.omega1, i.theta2, i.omega2)
    }

    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            t_max: self.window.t_max,
            dt: self.window.dt,
            integrator: self.solver.method.into(),
            adaptive: AdaptiveOptions {
                tol: self.solver.tol,
                max_steps: self.solver.max_steps,
                ..AdaptiveOptions::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference_run() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.physical_parameters().unwrap(),
            PhysicalParameters::reference()
        );
        assert_eq!(config.initial_state(), PendulumState::reference());
        assert_eq!(config.window.t_max, 20.0);
        assert_eq!(config.window.dt, 0.01);
        assert_eq!(config.validation.energy_drift_tolerance, 0.05);
        assert_eq!(config.output.prefix, "pendulum_dynamics");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = RunConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn partial_document_overrides_named_keys() {
        let yaml = "window:\n  dt: 0.02\nsolver:\n  method: rk4\n";
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.window.dt, 0.02);
        assert_eq!(config.window.t_max, 20.0);
        assert_eq!(config.solver.method, SolverMethod::Rk4);
        assert_eq!(config.sim_options().integrator, IntegratorType::RK4);
        assert_eq!(config.pendulum, PendulumDef::default());
    }

    #[test]
    fn yaml_text_reloads_to_same_config() {
        let config = RunConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert_eq!(RunConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_non_positive_length() {
        let yaml = "pendulum:\n  l1: 0.0\n";
        assert!(matches!(
            RunConfig::from_yaml_str(yaml),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_dt_larger_than_window() {
        let yaml = "window:\n  t_max: 1.0\n  dt: 2.0\n";
        assert!(RunConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn rejects_unknown_method() {
        let yaml = "solver:\n  method: leapfrog\n";
        assert!(matches!(
            RunConfig::from_yaml_str(yaml),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn rejects_prefix_with_separator() {
        let mut config = RunConfig::default();
        config.output.prefix = "../escape".to_string();
        assert!(config.validate().is_err());
    }
}
