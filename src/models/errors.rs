//! Unified error handling for forecasting models.
//!
//! `ModelError` is the error surfaced to users of
//! [`TimeSeriesModel`](crate::models::TimeSeriesModel): it adds lifecycle
//! (`NotReady`), checkpoint (`NotFound`, I/O, format), and convergence
//! failures to the wrapped data, optimizer, and influence errors.
//! [`ModelError::kind`] folds every variant into the coarse [`ErrorKind`]
//! callers branch on.
use crate::{
    data::errors::DataError, influence::errors::InfluenceError, influence::sif::SIFExplanation,
    optimization::errors::OptError,
};
use std::fmt;

pub type ModelResult<T> = Result<T, ModelError>;

/// Coarse classification of [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration or mismatched shapes, detected before mutation.
    Config,
    /// A checkpoint file does not exist.
    NotFound,
    /// The model has not been trained or restored.
    NotReady,
    /// Non-finite values or a non-converged solve.
    Numerical,
    /// Filesystem or file-format failure.
    Io,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Lifecycle ----
    /// Operation requires a trained or restored model.
    NotReady { operation: &'static str },

    /// `explain_instance` needs a contamination configuration.
    NotConfigured,

    // ---- Configuration ----
    /// Damping must be finite and >= 0.
    InvalidDamping { value: f64 },

    /// Architecture description is unusable (e.g. zero hidden units).
    InvalidArchitecture { reason: &'static str },

    /// Forecaster lag differs from the window or checkpoint lag.
    LagMismatch { expected: usize, found: usize },

    /// Checkpoint was written for a different architecture.
    ArchitectureMismatch { expected: String, found: String },

    // ---- Checkpoints ----
    NotFound { path: String },
    Io { path: String, text: String },
    CheckpointFormat { path: String, text: String },
    UnsupportedVersion { found: u32, supported: u32 },

    // ---- Numerical ----
    /// The influence solve stopped before reaching its tolerance. The
    /// explanation computed from the best iterate is attached.
    NotConverged { partial: Box<SIFExplanation> },

    // ---- Wrapped ----
    Data(DataError),
    Opt(OptError),
    Influence(InfluenceError),
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::NotReady { .. } => ErrorKind::NotReady,
            ModelError::NotFound { .. } => ErrorKind::NotFound,
            ModelError::Io { .. } | ModelError::CheckpointFormat { .. } => ErrorKind::Io,
            ModelError::NotConverged { .. } => ErrorKind::Numerical,
            ModelError::NotConfigured
            | ModelError::InvalidDamping { .. }
            | ModelError::InvalidArchitecture { .. }
            | ModelError::LagMismatch { .. }
            | ModelError::ArchitectureMismatch { .. }
            | ModelError::UnsupportedVersion { .. } => ErrorKind::Config,
            ModelError::Data(err) => data_kind(err),
            ModelError::Opt(err) => opt_kind(err),
            ModelError::Influence(err) => match err {
                InfluenceError::NonFiniteResidual { .. } => ErrorKind::Numerical,
                InfluenceError::Data(inner) => data_kind(inner),
                InfluenceError::Opt(inner) => opt_kind(inner),
                _ => ErrorKind::Config,
            },
        }
    }
}

fn data_kind(err: &DataError) -> ErrorKind {
    match err {
        DataError::Io { .. } | DataError::Parse { .. } => ErrorKind::Io,
        _ => ErrorKind::Config,
    }
}

fn opt_kind(err: &OptError) -> ErrorKind {
    match err {
        OptError::NonFiniteLoss { .. }
        | OptError::NonFiniteCost { .. }
        | OptError::InvalidGradient { .. }
        | OptError::InvalidThetaHat { .. }
        | OptError::MissingThetaHat
        | OptError::ConditionViolated { .. }
        | OptError::PotentialBug { .. }
        | OptError::ImpossibleError { .. }
        | OptError::BackendError { .. }
        | OptError::UnknownError => ErrorKind::Numerical,
        _ => ErrorKind::Config,
    }
}

impl std::error::Error for ModelError {}

impl From<DataError> for ModelError {
    fn from(err: DataError) -> Self {
        ModelError::Data(err)
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> Self {
        ModelError::Opt(err)
    }
}

impl From<InfluenceError> for ModelError {
    fn from(err: InfluenceError) -> Self {
        ModelError::Influence(err)
    }
}

/// Map a [`ModelError`] onto the Python exception matching its kind.
#[cfg(feature = "python-bindings")]
impl From<ModelError> for pyo3::PyErr {
    fn from(err: ModelError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyFileNotFoundError, PyIOError, PyRuntimeError, PyValueError};
        let text = err.to_string();
        match err.kind() {
            ErrorKind::Config => PyValueError::new_err(text),
            ErrorKind::NotFound => PyFileNotFoundError::new_err(text),
            ErrorKind::NotReady | ErrorKind::Numerical => PyRuntimeError::new_err(text),
            ErrorKind::Io => PyIOError::new_err(text),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // ---- Lifecycle ----
            ModelError::NotReady { operation } => {
                write!(f, "Model Error: `{operation}` requires a trained or restored model")
            }
            ModelError::NotConfigured => write!(
                f,
                "Model Error: no contamination configuration; call update_configure first"
            ),

            // ---- Configuration ----
            ModelError::InvalidDamping { value } => {
                write!(f, "Model Error: damping must be finite and >= 0; got {value}")
            }
            ModelError::InvalidArchitecture { reason } => {
                write!(f, "Model Error: invalid architecture: {reason}")
            }
            ModelError::LagMismatch { expected, found } => {
                write!(f, "Model Error: lag mismatch: expected {expected}, found {found}")
            }
            ModelError::ArchitectureMismatch { expected, found } => write!(
                f,
                "Model Error: checkpoint architecture {found} does not match model architecture {expected}"
            ),

            // ---- Checkpoints ----
            ModelError::NotFound { path } => write!(f, "Model Error: checkpoint not found: {path}"),
            ModelError::Io { path, text } => write!(f, "Model Error: I/O failure on {path}: {text}"),
            ModelError::CheckpointFormat { path, text } => {
                write!(f, "Model Error: malformed checkpoint {path}: {text}")
            }
            ModelError::UnsupportedVersion { found, supported } => write!(
                f,
                "Model Error: checkpoint version {found} is not supported (expected {supported})"
            ),

            // ---- Numerical ----
            ModelError::NotConverged { partial } => write!(
                f,
                "Model Error: influence solve did not converge after {} iterations \
                 (relative residual {:.3e}); partial SIF = {}",
                partial.solve.iterations,
                partial.solve.relative_residual(),
                partial.sif
            ),

            // ---- Wrapped ----
            ModelError::Data(err) => write!(f, "Model Error: {err}"),
            ModelError::Opt(err) => write!(f, "Model Error: {err}"),
            ModelError::Influence(err) => write!(f, "Model Error: {err}"),
        }
    }
}
