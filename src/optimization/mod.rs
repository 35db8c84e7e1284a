//! optimization — training schedules, L-BFGS refinement, and a unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer forecasters are fitted with: first-order
//! stochastic updates organized in a three-phase schedule, an Argmin-backed
//! L-BFGS polish for smooth objectives, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - [`stochastic`]: Adam and gradient-descent updates, mini-batch
//!   sampling, phase switching, and epoch-based learning-rate decay.
//! - [`lbfgs`]: minimize any [`lbfgs::Objective`] with L-BFGS and a
//!   configurable line search; finite-difference helpers shared with the
//!   influence code.
//! - [`errors::OptError`] normalizes configuration issues, numerical
//!   failures, and backend solver errors behind `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are flat `ndarray` vectors whose layout belongs to the
//!   forecaster; this layer never interprets individual coordinates.
//! - Invalid states are reported as `OptError`, never as panics.
//!
//! Conventions
//! -----------
//! - Everything here minimizes. The objective fitted by the model layer is
//!   `J(θ) = MSE(θ) + (λ/2)‖θ‖²`.
//! - No I/O. The L-BFGS runner emits `log` records when asked to be verbose.

pub mod errors;
pub mod lbfgs;
pub mod stochastic;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::lbfgs::{
        Grad, LineSearcher, MLEOptions, Objective, OptimOutcome, Theta, Tolerances, minimize,
    };
    pub use super::stochastic::{Adam, AdamParams, LearningRate, MiniBatcher, Phase, Schedule};
}
