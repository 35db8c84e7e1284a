//! influence::cg — conjugate gradient over matrix-free linear operators.
//!
//! Purpose
//! -------
//! Solve `A x = b` for symmetric positive-definite `A` that is only
//! available through products `v ↦ A v` (in practice damped Hessian-vector
//! products), with injectable tolerance, iteration, and wall-clock budgets.
//!
//! Key behaviors
//! -------------
//! - Starts from `x₀ = 0`; stops when `‖r‖ ≤ tol · ‖b‖`.
//! - A zero right-hand side returns the zero vector, converged, without
//!   touching the operator.
//! - Exhausted iteration or time budgets and non-positive curvature
//!   (`pᵀAp ≤ 0`) end the solve with `converged = false` and the iterate
//!   with the smallest residual seen so far.
//! - Non-finite residuals or curvature are hard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - The operator is symmetric; positive definiteness is checked along the
//!   search directions only.
//! - `SolveOutcome::residual_norm` is the recursively updated residual of
//!   the returned iterate, not a fresh `‖b - A x‖`.
use crate::influence::errors::{InfluenceError, InfluenceResult};
use ndarray::{Array1, Array2};
use std::time::{Duration, Instant};

/// A symmetric linear map available only through matrix-vector products.
pub trait LinearOperator {
    /// Dimension `n` of the (square) operator.
    fn dim(&self) -> usize;

    /// Compute `A v`.
    fn apply(&self, v: &Array1<f64>) -> InfluenceResult<Array1<f64>>;
}

impl LinearOperator for Array2<f64> {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, v: &Array1<f64>) -> InfluenceResult<Array1<f64>> {
        if v.len() != self.ncols() {
            return Err(InfluenceError::DimensionMismatch { expected: self.ncols(), found: v.len() });
        }
        Ok(self.dot(v))
    }
}

/// Budgets for a conjugate-gradient solve.
///
/// - `tol`: relative residual tolerance `‖r‖ / ‖b‖`.
/// - `max_iter`: iteration cap.
/// - `time_budget`: optional wall-clock cap, checked before each iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub tol: f64,
    pub max_iter: usize,
    pub time_budget: Option<Duration>,
}

impl SolverOptions {
    /// # Errors
    /// - [`InfluenceError::InvalidTolerance`] unless `tol` is finite and > 0.
    /// - [`InfluenceError::InvalidMaxIter`] when `max_iter == 0`.
    pub fn new(tol: f64, max_iter: usize, time_budget: Option<Duration>) -> InfluenceResult<Self> {
        if !tol.is_finite() {
            return Err(InfluenceError::InvalidTolerance { tol, reason: "tolerance must be finite" });
        }
        if tol <= 0.0 {
            return Err(InfluenceError::InvalidTolerance { tol, reason: "tolerance must be > 0" });
        }
        if max_iter == 0 {
            return Err(InfluenceError::InvalidMaxIter { max_iter });
        }
        Ok(SolverOptions { tol, max_iter, time_budget })
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions { tol: 1e-8, max_iter: 1000, time_budget: None }
    }
}

/// Why a solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    ZeroRightHandSide,
    MaxIterations,
    TimeBudget,
    NonPositiveCurvature,
}

/// Result of [`conjugate_gradient`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub solution: Array1<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
    pub rhs_norm: f64,
    pub converged: bool,
    pub stop: StopReason,
    pub elapsed: Duration,
}

impl SolveOutcome {
    /// `‖r‖ / ‖b‖`, or `0.0` for a zero right-hand side.
    pub fn relative_residual(&self) -> f64 {
        if self.rhs_norm == 0.0 { 0.0 } else { self.residual_norm / self.rhs_norm }
    }
}

/// Solve `op · x = b` by conjugate gradient.
///
/// # Errors
/// - [`InfluenceError::DimensionMismatch`] if `b` or an operator product has
///   the wrong length.
/// - [`InfluenceError::NonFiniteResidual`] if the residual or curvature
///   becomes NaN/±inf.
/// - Any error raised by the operator itself.
pub fn conjugate_gradient<A: LinearOperator + ?Sized>(
    op: &A, b: &Array1<f64>, opts: &SolverOptions,
) -> InfluenceResult<SolveOutcome> {
    let start = Instant::now();
    let n = op.dim();
    if b.len() != n {
        return Err(InfluenceError::DimensionMismatch { expected: n, found: b.len() });
    }
    let rhs_norm = b.dot(b).sqrt();
    if !rhs_norm.is_finite() {
        return Err(InfluenceError::NonFiniteResidual { iteration: 0, value: rhs_norm });
    }
    if rhs_norm == 0.0 {
        return Ok(SolveOutcome {
            solution: Array1::zeros(n),
            iterations: 0,
            residual_norm: 0.0,
            rhs_norm,
            converged: true,
            stop: StopReason::ZeroRightHandSide,
            elapsed: start.elapsed(),
        });
    }

    let target = opts.tol * rhs_norm;
    let mut x = Array1::<f64>::zeros(n);
    let mut r = b.clone();
    let mut p = r.clone();
    let mut rs = rhs_norm * rhs_norm;
    let mut best = (x.clone(), rhs_norm);
    let mut iterations = 0;
    let mut stop = StopReason::MaxIterations;

    while iterations < opts.max_iter {
        if opts.time_budget.is_some_and(|budget| start.elapsed() >= budget) {
            stop = StopReason::TimeBudget;
            break;
        }
        let ap = op.apply(&p)?;
        if ap.len() != n {
            return Err(InfluenceError::DimensionMismatch { expected: n, found: ap.len() });
        }
        let curvature = p.dot(&ap);
        if !curvature.is_finite() {
            return Err(InfluenceError::NonFiniteResidual { iteration: iterations, value: curvature });
        }
        if curvature <= 0.0 {
            stop = StopReason::NonPositiveCurvature;
            break;
        }
        let alpha = rs / curvature;
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &ap);
        iterations += 1;

        let rs_new = r.dot(&r);
        let res_norm = rs_new.sqrt();
        if !res_norm.is_finite() {
            return Err(InfluenceError::NonFiniteResidual { iteration: iterations, value: res_norm });
        }
        if res_norm < best.1 {
            best = (x.clone(), res_norm);
        }
        if res_norm <= target {
            stop = StopReason::Converged;
            break;
        }
        let beta = rs_new / rs;
        p *= beta;
        p += &r;
        rs = rs_new;
    }

    let (solution, residual_norm) = best;
    Ok(SolveOutcome {
        solution,
        iterations,
        residual_norm,
        rhs_norm,
        converged: stop == StopReason::Converged,
        stop,
        elapsed: start.elapsed(),
    })
}
