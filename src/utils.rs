//! Conversion helpers for the Python bindings.
//!
//! Everything here turns loosely typed Python inputs (NumPy arrays, pandas
//! objects, sequences, strings) into the validated Rust configuration types,
//! raising `TypeError`/`ValueError` on the way. No numerical work happens
//! in this module.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    data::{SplitRatios, TimeSeries, WindowConfig},
    influence::SolverOptions,
    models::{Architecture, ArchitectureSpec, ModelError, TrainOptions},
    optimization::{
        lbfgs::{LineSearcher, MLEOptions, Tolerances},
        stochastic::{AdamParams, LearningRate},
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Owned 1-D copy of a Python array-like.
#[cfg(feature = "python-bindings")]
pub fn extract_vector<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence")))?;
    Ok(Array1::from(slice.to_vec()))
}

/// `(paths, timestamps)` series from a 2-D array (or DataFrame), or a single
/// path from a 1-D array-like.
#[cfg(feature = "python-bindings")]
pub fn extract_series<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<TimeSeries> {
    let values: Array2<f64> = if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        arr.as_array().to_owned()
    } else if let Ok(arr) = raw
        .call_method("to_numpy", (false,), None)
        .and_then(|obj| obj.extract::<PyReadonlyArray2<f64>>())
    {
        arr.as_array().to_owned()
    } else {
        let path = extract_vector(py, raw, "series")?;
        let n = path.len();
        path.into_shape((1, n)).map_err(|e| PyValueError::new_err(e.to_string()))?
    };
    Ok(TimeSeries::new(values).map_err(ModelError::from)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_architecture(kind: &str, lag: usize, hidden: usize) -> PyResult<Architecture> {
    let spec = match kind.to_lowercase().as_str() {
        "ar" | "linear" => ArchitectureSpec::Ar { lag },
        "rnn" | "elman" => ArchitectureSpec::Rnn { lag, hidden },
        other => {
            return Err(PyValueError::new_err(format!(
                "invalid architecture {:?} (expected 'ar' or 'rnn')",
                other
            )));
        }
    };
    Ok(Architecture::from_spec(spec)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_window(lag: usize, train_ratio: f64, validation_ratio: f64) -> PyResult<WindowConfig> {
    let split = SplitRatios::new(train_ratio, validation_ratio).map_err(ModelError::from)?;
    Ok(WindowConfig::new(lag, split, None).map_err(ModelError::from)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_train_options(
    seed: u64, batch_size: usize, learning_rate: f64, sgd_learning_rate: f64, lr_decay: f64,
    decay_every_epochs: usize,
) -> PyResult<TrainOptions> {
    let rate = LearningRate::new(learning_rate, sgd_learning_rate, lr_decay, decay_every_epochs)
        .map_err(ModelError::from)?;
    let defaults = TrainOptions::default();
    Ok(TrainOptions::new(seed, batch_size, rate, AdamParams::default(), defaults.log_every, None)
        .map_err(ModelError::from)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_solver_options(tol: f64, max_iter: usize) -> PyResult<SolverOptions> {
    Ok(SolverOptions::new(tol, max_iter, None).map_err(ModelError::from)?)
}

#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults.tols
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter).map_err(ModelError::from)?
    };

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(ModelError::from)?,
        None => defaults.line_searcher,
    };

    Ok(MLEOptions::new(tols, ls, verbose, lbfgs_mem).map_err(ModelError::from)?)
}
