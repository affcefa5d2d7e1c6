//! Output storage API.

use std::fs;
use std::path::{Path, PathBuf};

use crate::npy::{read_npy_f64, write_npy_f64};
use crate::types::AngleSeries;
use crate::ResultsResult;

pub const DEFAULT_PREFIX: &str = "pendulum_dynamics";

/// Locations of the three exported arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub theta1: PathBuf,
    pub theta2: PathBuf,
    pub t: PathBuf,
}

impl OutputPaths {
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [self.theta1.as_path(), self.theta2.as_path(), self.t.as_path()].into_iter()
    }
}

/// Directory holding `{prefix}_theta1.npy`, `{prefix}_theta2.npy` and `{prefix}_t.npy`.
#[derive(Clone, Debug)]
pub struct ArrayStore {
    root_dir: PathBuf,
    prefix: String,
}

impl ArrayStore {
    /// Store for writing; creates `root_dir` if needed.
    pub fn new(root_dir: PathBuf, prefix: impl Into<String>) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self::open(root_dir, prefix))
    }

    /// Store for reading an existing run. Touches nothing on disk.
    pub fn open(root_dir: PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            root_dir,
            prefix: prefix.into(),
        }
    }

    pub fn paths(&self) -> OutputPaths {
        let file = |name: &str| self.root_dir.join(format!("{}_{name}.npy", self.prefix));
        OutputPaths {
            theta1: file("theta1"),
            theta2: file("theta2"),
            t: file("t"),
        }
    }

    /// True when all three arrays are present.
    pub fn has_outputs(&self) -> bool {
        self.paths().iter().all(Path::exists)
    }

    /// Write the three arrays, replacing any previous run's files.
    pub fn save(&self, series: &AngleSeries) -> ResultsResult<OutputPaths> {
        let paths = self.paths();
        write_npy_f64(&paths.theta1, &series.theta1)?;
        write_npy_f64(&paths.theta2, &series.theta2)?;
        write_npy_f64(&paths.t, &series.t)?;
        tracing::info!(
            dir = %self.root_dir.display(),
            samples = series.len(),
            "wrote angle series"
        );
        Ok(paths)
    }

    pub fn load(&self) -> ResultsResult<AngleSeries> {
        let paths = self.paths();
        AngleSeries::new(
            read_npy_f64(&paths.t)?,
            read_npy_f64(&paths.theta1)?,
            read_npy_f64(&paths.theta2)?,
        )
    }
}
