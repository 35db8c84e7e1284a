//! sif_timeseries — outlier-impact analysis for time-series forecasters, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the forecasting model and its SIF explainer to Python via the
//! `_sif_timeseries` extension module. The SIF ("single-value influence")
//! summarizes, in one signed number, how much a contaminating process present
//! at a small per-step rate would bias a trained model's forecasts.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`data`] (series and lag windows),
//!   [`contamination`] (outlier injection), [`optimization`] (training
//!   schedule and L-BFGS), [`models`] (forecasters and the model facade), and
//!   [`influence`] (conjugate-gradient influence solves and the SIF).
//! - Provide [`seeded_rng`], the single way randomness enters the crate.
//! - Define the `#[pyclass]` wrappers and the `#[pymodule]` initializer for
//!   the `_sif_timeseries` Python extension when `python-bindings` is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - There is no global random state. Every stochastic routine takes an RNG
//!   handle or a seed, so runs are reproducible.
//!
//! Conventions
//! -----------
//! - Series are `(sample_paths, timestamps)` matrices; lag windows are ordered
//!   oldest first.
//! - Errors are rich enums per module, converted to `PyErr` at the PyO3
//!   boundary according to [`models::ErrorKind`].
//! - The library logs through the `log` facade only; binaries and tests pick
//!   the backend (`env_logger`).
//!
//! Downstream usage
//! ----------------
//! - Rust callers build a [`models::TimeSeriesModel`], `train` or `restore`
//!   it, set the contaminating process with `update_configure`, and call
//!   `explain_instance`.
//! - The `sif_tutorial` binary runs the reference scenario end to end.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each module; `tests/integration_sif_pipeline.rs`
//!   exercises the full simulate → train → save/restore → explain flow.

pub mod contamination;
pub mod data;
pub mod influence;
pub mod models;
pub mod optimization;
pub mod utils;

use rand::SeedableRng;

/// RNG used throughout the crate.
pub type SifRng = rand_chacha::ChaCha8Rng;

/// Deterministic RNG handle for `seed`.
pub fn seeded_rng(seed: u64) -> SifRng {
    SifRng::seed_from_u64(seed)
}

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    influence::SIFExplanation,
    models::{Architecture, TimeSeriesModel},
    utils::{
        build_architecture, build_solver_options, build_train_options, build_window, extract_mle_opts,
        extract_series, extract_vector,
    },
};

/// SIFModel — Python-facing wrapper for a forecasting model and its SIF explainer.
///
/// Purpose
/// -------
/// Expose [`TimeSeriesModel`] over a run-time selected [`Architecture`] to
/// Python callers while preserving the Rust lifecycle rules and error kinds.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `SIFModel(series, lag, architecture='rnn', hidden=8, damping=0.01, ...)`:
/// - `series`: 2-D array-like `(paths, timestamps)` or a 1-D single path.
/// - `lag`: window length `L ≥ 1`.
/// - `architecture`: `'ar'` or `'rnn'`; `hidden` is the RNN width.
/// - `damping`: ridge coefficient shared by training and the influence solve.
/// - `train_ratio`, `validation_ratio`: chronological split.
/// - `seed`, `batch_size`, `learning_rate`, `sgd_learning_rate`, `lr_decay`,
///   `decay_every_epochs`: training options.
/// - `cg_tol`, `cg_max_iter`: conjugate-gradient budget.
///
/// Notes
/// -----
/// - Errors map to `ValueError` (configuration), `FileNotFoundError`
///   (missing checkpoint), `RuntimeError` (not ready, not converged), and
///   `OSError` (I/O).
#[cfg(feature = "python-bindings")]
#[pyclass(module = "sif_timeseries.models")]
pub struct SIFModel {
    inner: TimeSeriesModel<Architecture>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SIFModel {
    #[new]
    #[pyo3(
        signature = (
            series,
            lag,
            architecture = "rnn",
            hidden = 8,
            damping = 0.01,
            train_ratio = 0.7,
            validation_ratio = 0.15,
            seed = 0,
            batch_size = 32,
            learning_rate = 0.01,
            sgd_learning_rate = 0.01,
            lr_decay = 1.0,
            decay_every_epochs = 1,
            cg_tol = 1e-8,
            cg_max_iter = 1000,
        ),
        text_signature = "(series, lag, /, architecture='rnn', hidden=8, damping=0.01, \
                          train_ratio=0.7, validation_ratio=0.15, seed=0, batch_size=32, \
                          learning_rate=0.01, sgd_learning_rate=0.01, lr_decay=1.0, \
                          decay_every_epochs=1, cg_tol=1e-8, cg_max_iter=1000)"
    )]
    pub fn new<'py>(
        py: Python<'py>, series: &Bound<'py, PyAny>, lag: usize, architecture: &str, hidden: usize,
        damping: f64, train_ratio: f64, validation_ratio: f64, seed: u64, batch_size: usize,
        learning_rate: f64, sgd_learning_rate: f64, lr_decay: f64, decay_every_epochs: usize,
        cg_tol: f64, cg_max_iter: usize,
    ) -> PyResult<Self> {
        let series = extract_series(py, series)?;
        let forecaster = build_architecture(architecture, lag, hidden)?;
        let window = build_window(lag, train_ratio, validation_ratio)?;
        let train_opts =
            build_train_options(seed, batch_size, learning_rate, sgd_learning_rate, lr_decay, decay_every_epochs)?;
        let solver = build_solver_options(cg_tol, cg_max_iter)?;
        let inner = TimeSeriesModel::new(forecaster, series, window, damping)?
            .with_train_options(train_opts)?
            .with_solver_options(solver);
        Ok(SIFModel { inner })
    }

    /// Run the three-phase schedule; returns the per-step objective values.
    #[pyo3(text_signature = "(self, steps, switch_to_batch_at, switch_to_sgd_at)")]
    pub fn train(&mut self, steps: usize, switch_to_batch_at: usize, switch_to_sgd_at: usize) -> PyResult<Vec<f64>> {
        let report = self.inner.train(steps, switch_to_batch_at, switch_to_sgd_at)?;
        Ok(report.losses)
    }

    /// L-BFGS polish; returns the final objective value.
    #[pyo3(
        signature = (tol_grad = None, tol_cost = None, max_iter = None, line_searcher = None, lbfgs_mem = None, verbose = false),
        text_signature = "(self, /, tol_grad=None, tol_cost=None, max_iter=None, line_searcher=None, \
                          lbfgs_mem=None, verbose=False)"
    )]
    pub fn refine(
        &mut self, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
    ) -> PyResult<f64> {
        let opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, verbose)?;
        Ok(self.inner.refine(&opts)?.value)
    }

    pub fn save(&self, path: &str) -> PyResult<()> {
        Ok(self.inner.save(path)?)
    }

    pub fn restore(&mut self, path: &str) -> PyResult<()> {
        Ok(self.inner.restore(path)?)
    }

    #[pyo3(text_signature = "(self, contaminating_values, gammas)")]
    pub fn update_configure<'py>(
        &mut self, py: Python<'py>, contaminating_values: &Bound<'py, PyAny>, gammas: Vec<f64>,
    ) -> PyResult<()> {
        let values = extract_vector(py, contaminating_values, "contaminating_values")?;
        Ok(self.inner.update_configure(values, gammas)?)
    }

    #[pyo3(
        signature = (lag, target_index, contaminating_values = None, baseline = None, horizon = 1, verbose = false),
        text_signature = "(self, lag, target_index, /, contaminating_values=None, baseline=None, \
                          horizon=1, verbose=False)"
    )]
    pub fn explain_instance<'py>(
        &self, py: Python<'py>, lag: usize, target_index: usize, contaminating_values: Option<&Bound<'py, PyAny>>,
        baseline: Option<&Bound<'py, PyAny>>, horizon: usize, verbose: bool,
    ) -> PyResult<SIFResult> {
        let values = contaminating_values.map(|v| extract_vector(py, v, "contaminating_values")).transpose()?;
        let baseline = baseline.map(|b| extract_series(py, b)).transpose()?;
        let explanation =
            self.inner.explain_instance(values.as_ref(), lag, target_index, baseline.as_ref(), horizon, verbose)?;
        Ok(SIFResult { inner: explanation })
    }

    /// One-step forecast for a window of length `lag`.
    pub fn predict<'py>(&self, py: Python<'py>, window: &Bound<'py, PyAny>) -> PyResult<f64> {
        let x = extract_vector(py, window, "window")?;
        Ok(self.inner.predict(x.view())?)
    }

    #[getter]
    pub fn params<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f64>>> {
        self.inner.params().map(|theta| theta.clone().into_pyarray(py))
    }

    #[getter]
    pub fn damping(&self) -> f64 {
        self.inner.damping()
    }

    #[getter]
    pub fn ready(&self) -> bool {
        self.inner.is_ready()
    }
}

/// SIFResult — read-only view of an explanation.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "sif_timeseries.models")]
pub struct SIFResult {
    inner: SIFExplanation,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SIFResult {
    #[getter]
    pub fn sif(&self) -> f64 {
        self.inner.sif
    }

    #[getter]
    pub fn gammas(&self) -> Vec<f64> {
        self.inner.gammas.clone()
    }

    #[getter]
    pub fn if_v<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.if_v.clone().into_pyarray(py)
    }

    #[getter]
    pub fn patchy_pred_gamma(&self) -> Vec<f64> {
        self.inner.patchy_pred_gamma.clone()
    }

    #[getter]
    pub fn psi_y(&self) -> Vec<f64> {
        self.inner.psi_y.clone()
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged()
    }

    #[getter]
    pub fn cg_iterations(&self) -> usize {
        self.inner.solve.iterations
    }

    /// `(if_v, patchy_pred_gamma, psi_y)` stage times in seconds, if recorded.
    #[getter]
    pub fn timings(&self) -> Option<(f64, f64, f64)> {
        self.inner
            .timings
            .map(|t| (t.if_v.as_secs_f64(), t.patchy_pred_gamma.as_secs_f64(), t.psi_y.as_secs_f64()))
    }

    fn __repr__(&self) -> String {
        format!("SIFResult(sif={}, converged={})", self.inner.sif, self.inner.converged())
    }
}

/// Contaminating values drawn from a fixed-seed standard normal, one per path.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (n, seed = 0))]
fn standard_normal_values<'py>(py: Python<'py>, n: usize, seed: u64) -> PyResult<Bound<'py, PyArray1<f64>>> {
    if n == 0 {
        return Err(PyValueError::new_err("n must be positive"));
    }
    let values = crate::contamination::standard_normal_values(n, &mut seeded_rng(seed));
    Ok(values.into_pyarray(py))
}

/// _sif_timeseries — PyO3 module initializer for the Python extension.
///
/// Creates the `models` submodule, attaches it to the parent module, and
/// registers it in `sys.modules` so `sif_timeseries.models` is importable.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _sif_timeseries<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(_py, "models")?;
    models(_py, m, &models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("sif_timeseries.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models<'py>(_py: Python, sif_timeseries: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<SIFModel>()?;
    m.add_class::<SIFResult>()?;
    m.add_function(wrap_pyfunction!(standard_normal_values, m)?)?;
    sif_timeseries.add_submodule(m)?;
    Ok(())
}
