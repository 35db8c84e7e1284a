//! Errors for the data layer (series containers, lag windows, contamination
//! inputs, and series files).
//!
//! ## Conventions
//! - **Indices are 0-based**; `path` indexes sample paths (rows) and `t`
//!   indexes timestamps (columns).
//! - Every variant except [`DataError::Io`] and [`DataError::Parse`] is a
//!   configuration/shape problem detected before any state is mutated.
use std::fmt;

/// Result alias for data-layer operations that may produce [`DataError`].
pub type DataResult<T> = Result<T, DataError>;

/// Unified error type for series, window, and contamination inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Series validation ----
    /// Series has no sample paths or no timestamps.
    EmptySeries,

    /// A series entry is NaN/±inf.
    NonFiniteValue { path: usize, t: usize, value: f64 },

    /// Number of path identifiers does not match the number of sample paths.
    PathIdsLengthMismatch { expected: usize, actual: usize },

    // ---- Windowing ----
    /// Lag must satisfy 1 ≤ lag < series length.
    InvalidLag { lag: usize, len: usize },

    /// Split ratios must be finite, train > 0 and train + validation ≤ 1.
    InvalidSplit { train: f64, validation: f64, reason: &'static str },

    /// A selected sample path does not exist.
    PathOutOfRange { index: usize, n_paths: usize },

    /// Path selection was provided but empty.
    EmptyPathSelection,

    // ---- Shapes ----
    /// Two arrays that must share a (paths, timestamps) shape do not.
    ShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    // ---- Contamination inputs ----
    /// One contaminating value is required per sample path.
    ContaminationLengthMismatch { expected: usize, actual: usize },

    /// A contaminating value is NaN/±inf.
    NonFiniteContamination { index: usize, value: f64 },

    /// At least one candidate contamination rate is required.
    EmptyGammas,

    /// Contamination rates must lie in [0, 1).
    InvalidGamma { index: usize, value: f64 },

    /// Patch length must be at least 1.
    InvalidPatchLength { value: usize },

    // ---- Simulation ----
    /// Simulated process needs at least one coefficient and finite settings.
    InvalidProcess { reason: &'static str },

    // ---- Files ----
    /// Filesystem failure while reading or writing a series file.
    Io { path: String, text: String },

    /// Series file exists but could not be decoded.
    Parse { path: String, text: String },
}

impl std::error::Error for DataError {}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // ---- Series validation ----
            DataError::EmptySeries => write!(f, "Series must have at least one path and one timestamp."),
            DataError::NonFiniteValue { path, t, value } => {
                write!(f, "Series value at path {path}, t = {t} is non-finite: {value}")
            }
            DataError::PathIdsLengthMismatch { expected, actual } => {
                write!(f, "Path id count mismatch: expected {expected}, got {actual}")
            }
            // ---- Windowing ----
            DataError::InvalidLag { lag, len } => {
                write!(f, "Lag must satisfy 1 <= lag < series length ({len}); got {lag}")
            }
            DataError::InvalidSplit { train, validation, reason } => {
                write!(f, "Invalid split (train = {train}, validation = {validation}): {reason}")
            }
            DataError::PathOutOfRange { index, n_paths } => {
                write!(f, "Selected path {index} is out of range for {n_paths} paths")
            }
            DataError::EmptyPathSelection => write!(f, "Path selection must not be empty."),
            // ---- Shapes ----
            DataError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: expected {expected:?}, found {found:?}")
            }
            // ---- Contamination inputs ----
            DataError::ContaminationLengthMismatch { expected, actual } => write!(
                f,
                "Contaminating values must have one entry per path: expected {expected}, got {actual}"
            ),
            DataError::NonFiniteContamination { index, value } => {
                write!(f, "Contaminating value at index {index} is non-finite: {value}")
            }
            DataError::EmptyGammas => write!(f, "At least one contamination rate (gamma) is required."),
            DataError::InvalidGamma { index, value } => {
                write!(f, "Gamma at index {index} must lie in [0, 1); got {value}")
            }
            DataError::InvalidPatchLength { value } => {
                write!(f, "Patch length must be at least 1; got {value}")
            }
            // ---- Simulation ----
            DataError::InvalidProcess { reason } => write!(f, "Invalid simulated process: {reason}"),
            // ---- Files ----
            DataError::Io { path, text } => write!(f, "I/O error on '{path}': {text}"),
            DataError::Parse { path, text } => write!(f, "Could not decode series file '{path}': {text}"),
        }
    }
}
