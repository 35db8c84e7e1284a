//! models — forecasters, their training, persistence, and the model facade.
//!
//! Purpose
//! -------
//! Provide one-step-ahead forecasters over lag windows behind a single
//! [`Forecaster`] interface, fit them with the three-phase schedule, and
//! bind them to data and contamination settings in [`TimeSeriesModel`],
//! the entry point for training, checkpoints, and SIF explanations.
//!
//! Key behaviors
//! -------------
//! - [`ArForecaster`] (linear, exact curvature) and [`RnnForecaster`]
//!   (Elman tanh cell, back-propagated gradients) are interchangeable;
//!   [`Architecture`] dispatches over both when the choice is made at run
//!   time (checkpoints, Python).
//! - [`training::fit`] minimizes `MSE + (λ/2)‖θ‖²`; [`TimeSeriesModel::refine`]
//!   polishes the result with L-BFGS.
//! - [`checkpoint::Checkpoint`] persists architecture, damping, and
//!   parameters as JSON.
//!
//! Invariants & assumptions
//! ------------------------
//! - The damping `λ` used for training is the one used by the influence
//!   solve, and travels with the checkpoint.
//! - Read-only operations require a trained or restored model
//!   ([`ModelError::NotReady`] otherwise).
//!
//! Conventions
//! -----------
//! - Errors surface as [`ModelError`]; [`ModelError::kind`] gives the coarse
//!   [`ErrorKind`].
//! - `info!` on training summaries, phase switches, and checkpoint I/O;
//!   per-step losses at `debug!`.

pub mod ar;
pub mod architecture;
pub mod checkpoint;
pub mod errors;
pub mod model;
pub mod rnn;
pub mod training;
pub mod traits;

pub use self::ar::ArForecaster;
pub use self::architecture::{Architecture, ArchitectureSpec};
pub use self::checkpoint::{CHECKPOINT_VERSION, Checkpoint};
pub use self::errors::{ErrorKind, ModelError, ModelResult};
pub use self::model::{ModelState, TimeSeriesModel};
pub use self::rnn::RnnForecaster;
pub use self::training::{RegularizedMse, TrainOptions, TrainReport};
pub use self::traits::Forecaster;
