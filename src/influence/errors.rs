//! Unified error handling for influence routines.
//!
//! `InfluenceError` covers solver configuration, operator dimension
//! problems, numerical breakdown inside the conjugate-gradient iteration,
//! and validation of explain requests. Data- and optimizer-layer failures
//! raised while building contaminated inputs or curvature products are
//! wrapped unchanged. `InfluenceResult<T>` standardizes the return type.
use crate::{data::errors::DataError, optimization::errors::OptError};

#[derive(Debug, Clone, PartialEq)]
pub enum InfluenceError {
    // ---- Solver configuration ----
    /// Relative residual tolerance must be finite and > 0.
    InvalidTolerance {
        tol: f64,
        reason: &'static str,
    },

    /// Iteration budget must be at least 1.
    InvalidMaxIter {
        max_iter: usize,
    },

    /// Damping must be finite and >= 0.
    InvalidDamping {
        value: f64,
    },

    // ---- Operator / numerics ----
    /// Operator output or right-hand side has the wrong length.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },

    /// Residual or curvature became NaN/±inf during the solve.
    NonFiniteResidual {
        iteration: usize,
        value: f64,
    },

    // ---- Explain requests ----
    /// Horizon must be at least 1.
    InvalidHorizon {
        horizon: usize,
    },

    /// Evaluation window must satisfy lag <= target_index and
    /// target_index + horizon <= series length.
    InvalidTargetIndex {
        target_index: usize,
        horizon: usize,
        lag: usize,
        len: usize,
    },

    /// Requested lag differs from the forecaster's lag.
    LagMismatch {
        expected: usize,
        found: usize,
    },

    /// The training partition has no pairs, so there is no Hessian.
    EmptyTrainingSet,

    // ---- Wrapped ----
    Data(DataError),
    Opt(OptError),
}

pub type InfluenceResult<T> = Result<T, InfluenceError>;

impl std::error::Error for InfluenceError {}

impl From<DataError> for InfluenceError {
    fn from(err: DataError) -> Self {
        InfluenceError::Data(err)
    }
}

impl From<OptError> for InfluenceError {
    fn from(err: OptError) -> Self {
        InfluenceError::Opt(err)
    }
}

impl std::fmt::Display for InfluenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Solver configuration ----
            InfluenceError::InvalidTolerance { tol, reason } => {
                write!(f, "Influence Error: invalid solver tolerance {tol}: {reason}")
            }
            InfluenceError::InvalidMaxIter { max_iter } => {
                write!(f, "Influence Error: max_iter must be at least 1; got {max_iter}")
            }
            InfluenceError::InvalidDamping { value } => {
                write!(f, "Influence Error: damping must be finite and >= 0; got {value}")
            }

            // ---- Operator / numerics ----
            InfluenceError::DimensionMismatch { expected, found } => {
                write!(f, "Influence Error: dimension mismatch: expected {expected}, found {found}")
            }
            InfluenceError::NonFiniteResidual { iteration, value } => write!(
                f,
                "Influence Error: non-finite residual at iteration {iteration}: {value}"
            ),

            // ---- Explain requests ----
            InfluenceError::InvalidHorizon { horizon } => {
                write!(f, "Influence Error: horizon must be at least 1; got {horizon}")
            }
            InfluenceError::InvalidTargetIndex { target_index, horizon, lag, len } => write!(
                f,
                "Influence Error: evaluation window [{target_index}, {target_index} + {horizon}) \
                 must start at or after lag {lag} and end within series length {len}"
            ),
            InfluenceError::LagMismatch { expected, found } => {
                write!(f, "Influence Error: lag mismatch: model uses {expected}, request has {found}")
            }
            InfluenceError::EmptyTrainingSet => {
                write!(f, "Influence Error: training partition is empty")
            }

            // ---- Wrapped ----
            InfluenceError::Data(err) => write!(f, "Influence Error: {err}"),
            InfluenceError::Opt(err) => write!(f, "Influence Error: {err}"),
        }
    }
}
