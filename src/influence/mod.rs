//! influence — damped-Hessian influence solves and the SIF explainer.
//!
//! Purpose
//! -------
//! Measure how a contaminating process distorts a trained forecaster's
//! predictions, using influence functions instead of refitting: curvature
//! enters only through Hessian-vector products and a conjugate-gradient
//! solve, so the Hessian is never formed for real models.
//!
//! Key behaviors
//! -------------
//! - [`cg`]: matrix-free conjugate gradient with tolerance, iteration and
//!   wall-clock budgets, reporting non-convergence instead of hiding it.
//! - [`hessian`]: the damped training Hessian `∇²MSE_train + λI` as a
//!   [`cg::LinearOperator`], plus a dense view for small models.
//! - [`sif`]: the SIF explainer combining the influence vector, the
//!   parameter-side prediction shift, and the input-side discrepancy over a
//!   grid of contamination rates; per-training-pair influence scores.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are the trained `θ̂`; nothing here mutates a model.
//! - Damping `λ` is the same ridge coefficient used by the training
//!   objective, so `H_λ` is the Hessian of the objective actually minimized.
//!
//! Testing notes
//! -------------
//! - CG is checked against a dense `nalgebra` solve; the linear forecaster
//!   gives closed forms for the Hessian and both SIF components.

pub mod cg;
pub mod errors;
pub mod hessian;
pub mod sif;

pub use self::cg::{LinearOperator, SolveOutcome, SolverOptions, StopReason, conjugate_gradient};
pub use self::errors::{InfluenceError, InfluenceResult};
pub use self::hessian::DampedHessian;
pub use self::sif::{EvaluationWindow, InfluenceContext, SIFExplanation, SIFTimings, combine_sif};
