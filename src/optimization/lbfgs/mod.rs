//! lbfgs — argmin-powered L-BFGS minimization of smooth objectives.
//!
//! Purpose
//! -------
//! Provide a small, Argmin-backed layer for minimizing smooth objectives
//! `J(θ)` over flat parameter vectors. Forecasters use it to polish
//! parameters after the stochastic training schedule; the same numeric
//! aliases and finite-difference helpers are shared with the influence code.
//!
//! Key behaviors
//! -------------
//! - Convert an [`Objective`] into an Argmin problem via
//!   [`adapter::ArgMinAdapter`], with finite-difference gradient fallback.
//! - Expose a single entry point [`minimize`] that validates the start
//!   point, builds an L-BFGS solver for the chosen [`traits::LineSearcher`],
//!   runs it, and normalizes the result into an [`OptimOutcome`].
//! - Provide finite-difference helpers in [`finite_diff`], including the
//!   Hessian-vector product used as the default curvature oracle.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives are minimized as written; there are no sign conventions to
//!   track between user code and the solver.
//! - [`Objective::value`] and [`Objective::grad`] report invalid inputs as
//!   [`OptError`](crate::optimization::errors::OptError) values, not panics.
//! - Configuration types ([`Tolerances`], [`MLEOptions`]) are validated on
//!   construction.
//!
//! Testing notes
//! -------------
//! - Unit tests cover adapter pass-through and FD fallback, builder wiring,
//!   FD helpers, option validation, and an end-to-end ridge problem with a
//!   closed-form solution.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{LineSearcher, MLEOptions, Objective, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};
