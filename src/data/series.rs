//! Multi-path time-series container, persistence, and AR simulation.
//!
//! Purpose
//! -------
//! Hold the raw, immutable observations the rest of the crate works on: a
//! `(sample_paths × timestamps)` matrix where every row is one independent
//! realisation of the process. This module centralizes validation so
//! windowing, contamination, and influence code can assume clean input.
//!
//! Key behaviors
//! -------------
//! - [`TimeSeries::new`] enforces non-emptiness and finiteness.
//! - [`TimeSeries::save_json`] / [`TimeSeries::load_json`] persist the
//!   matrix losslessly (shortest round-trip `f64` formatting).
//! - [`TimeSeries::simulate_ar`] draws reproducible AR(p) paths from an
//!   explicitly passed RNG handle.
//!
//! Invariants & assumptions
//! ------------------------
//! - `values.nrows() ≥ 1`, `values.ncols() ≥ 1`, all entries finite.
//! - When present, `path_ids.len() == values.nrows()`.
//! - A `TimeSeries` is never mutated after construction; derived series
//!   (e.g. contaminated copies) are new values.
//!
//! Conventions
//! -----------
//! - Row `p` is sample path `p`; column `t` is timestamp `t` (0-based).
use crate::data::errors::{DataError, DataResult};
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::{fs, path::Path};

/// Number of initial simulated steps discarded so paths start near stationarity.
const SIMULATION_BURN_IN: usize = 50;

/// `TimeSeries` — validated `(sample_paths × timestamps)` observations.
///
/// Fields
/// ------
/// - `values`: `Array2<f64>`
///   Observations; row = sample path, column = timestamp.
/// - `path_ids`: `Option<Vec<String>>`
///   Optional human-readable identifiers, one per sample path.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Array2<f64>,
    path_ids: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct SeriesFile {
    values: Array2<f64>,
    #[serde(default)]
    path_ids: Option<Vec<String>>,
}

impl TimeSeries {
    /// Construct a validated series.
    ///
    /// # Errors
    /// - [`DataError::EmptySeries`] if there are no paths or no timestamps.
    /// - [`DataError::NonFiniteValue`] for the first NaN/±inf entry.
    pub fn new(values: Array2<f64>) -> DataResult<Self> {
        Self::with_path_ids(values, None)
    }

    /// Construct a validated series with per-path identifiers.
    ///
    /// # Errors
    /// As [`TimeSeries::new`], plus [`DataError::PathIdsLengthMismatch`].
    pub fn with_path_ids(values: Array2<f64>, path_ids: Option<Vec<String>>) -> DataResult<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(DataError::EmptySeries);
        }
        for ((path, t), &value) in values.indexed_iter() {
            if !value.is_finite() {
                return Err(DataError::NonFiniteValue { path, t, value });
            }
        }
        if let Some(ids) = &path_ids {
            if ids.len() != values.nrows() {
                return Err(DataError::PathIdsLengthMismatch {
                    expected: values.nrows(),
                    actual: ids.len(),
                });
            }
        }
        Ok(TimeSeries { values, path_ids })
    }

    /// Number of independent sample paths (rows).
    pub fn n_paths(&self) -> usize {
        self.values.nrows()
    }

    /// Number of timestamps per path (columns).
    pub fn len(&self) -> usize {
        self.values.ncols()
    }

    /// Always `false`; construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(sample_paths, timestamps)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Read-only view of the full matrix.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Read-only view of a single sample path.
    pub fn path(&self, p: usize) -> ArrayView1<'_, f64> {
        self.values.row(p)
    }

    pub fn path_ids(&self) -> Option<&[String]> {
        self.path_ids.as_deref()
    }

    /// Persist the series as JSON.
    ///
    /// # Errors
    /// [`DataError::Io`] / [`DataError::Parse`] on filesystem or encoding failures.
    pub fn save_json(&self, path: impl AsRef<Path>) -> DataResult<()> {
        let path = path.as_ref();
        let file = SeriesFile { values: self.values.clone(), path_ids: self.path_ids.clone() };
        let encoded = serde_json::to_string(&file).map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        fs::write(path, encoded)
            .map_err(|e| DataError::Io { path: path.display().to_string(), text: e.to_string() })
    }

    /// Load a series previously written by [`TimeSeries::save_json`].
    ///
    /// The decoded matrix goes through the same validation as
    /// [`TimeSeries::with_path_ids`].
    pub fn load_json(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| DataError::Io { path: path.display().to_string(), text: e.to_string() })?;
        let file: SeriesFile = serde_json::from_str(&raw).map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        Self::with_path_ids(file.values, file.path_ids)
    }

    /// Simulate `n_paths` independent AR(p) paths of length `len`.
    ///
    /// Each path follows `x_t = c + Σ_i φ_i x_{t-i} + σ ε_t` with
    /// `ε_t ~ N(0, 1)`, started from zeros and run for a fixed burn-in before
    /// the first recorded value.
    ///
    /// # Errors
    /// - [`DataError::InvalidProcess`] for an empty coefficient vector,
    ///   non-finite coefficients, or a non-positive noise scale.
    /// - [`DataError::EmptySeries`] when `n_paths == 0` or `len == 0`.
    pub fn simulate_ar<R: Rng + ?Sized>(
        process: &ArProcess, n_paths: usize, len: usize, rng: &mut R,
    ) -> DataResult<Self> {
        process.validate()?;
        if n_paths == 0 || len == 0 {
            return Err(DataError::EmptySeries);
        }
        let noise = Normal::new(0.0, process.noise_std)
            .map_err(|_| DataError::InvalidProcess { reason: "noise_std must be finite and > 0" })?;
        let order = process.coefficients.len();
        let total = SIMULATION_BURN_IN + len;
        let mut values = Array2::<f64>::zeros((n_paths, len));
        let mut buffer = vec![0.0_f64; order + total];
        for p in 0..n_paths {
            buffer.iter_mut().for_each(|v| *v = 0.0);
            for t in order..order + total {
                let ar: f64 = process
                    .coefficients
                    .iter()
                    .enumerate()
                    .map(|(i, phi)| phi * buffer[t - 1 - i])
                    .sum();
                buffer[t] = process.intercept + ar + noise.sample(rng);
            }
            for (t, v) in values.row_mut(p).iter_mut().enumerate() {
                *v = buffer[order + SIMULATION_BURN_IN + t];
            }
        }
        Self::new(values)
    }
}

/// `ArProcess` — AR(p) data-generating process used by [`TimeSeries::simulate_ar`].
///
/// `coefficients[i]` multiplies `x_{t-1-i}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArProcess {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub noise_std: f64,
}

impl ArProcess {
    pub fn new(coefficients: Vec<f64>, intercept: f64, noise_std: f64) -> DataResult<Self> {
        let process = ArProcess { coefficients, intercept, noise_std };
        process.validate()?;
        Ok(process)
    }

    fn validate(&self) -> DataResult<()> {
        if self.coefficients.is_empty() {
            return Err(DataError::InvalidProcess { reason: "at least one AR coefficient is required" });
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(DataError::InvalidProcess { reason: "coefficients and intercept must be finite" });
        }
        if !(self.noise_std.is_finite() && self.noise_std > 0.0) {
            return Err(DataError::InvalidProcess { reason: "noise_std must be finite and > 0" });
        }
        Ok(())
    }
}
