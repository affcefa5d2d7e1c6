//! Exported data types.

use crate::{ResultsError, ResultsResult};

/// The three exported sequences, all the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSeries {
    pub t: Vec<f64>,
    pub theta1: Vec<f64>,
    pub theta2: Vec<f64>,
}

impl AngleSeries {
    pub fn new(t: Vec<f64>, theta1: Vec<f64>, theta2: Vec<f64>) -> ResultsResult<Self> {
        if t.len() != theta1.len() || t.len() != theta2.len() {
            return Err(ResultsError::LengthMismatch {
                t: t.len(),
                theta1: theta1.len(),
                theta2: theta2.len(),
            });
        }
        Ok(Self { t, theta1, theta2 })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// (first, last) sample time, if any.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.t.first()?, *self.t.last()?))
    }
}
