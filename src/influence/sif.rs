//! influence::sif — single-value influence of a contaminating process.
//!
//! Purpose
//! -------
//! Quantify how much a contaminating process, present at rate `γ`, shifts
//! the model's forecasts over an evaluation window, and summarize the shift
//! as one signed scalar.
//!
//! Key behaviors
//! -------------
//! With `θ̂` the trained parameters, `X` the clean series, `Y_γ` its
//! contaminated counterpart, and `F(θ; S)` the mean one-step forecast over
//! the evaluation positions `E = {(p, t) : target_index ≤ t < target_index + horizon}`:
//!
//! 1. `if_v = H_λ⁻¹ ∇_θ F(θ̂; X)` with `H_λ = ∇²MSE_train(θ̂) + λI`,
//!    solved by conjugate gradient over Hessian-vector products.
//! 2. `patchy_pred_gamma_k = -if_vᵀ (∇MSE_train(θ̂; Y_γk) - ∇MSE_train(θ̂; X))`,
//!    the first-order change of `F` if the model were refitted on `Y_γk`.
//! 3. `psi_y_k = F(θ̂; Y_γk) - F(θ̂; B)`, the direct change of the forecasts
//!    when the window inputs themselves are contaminated (`B` is the
//!    baseline series, `X` by default).
//! 4. `SIF = Σₖ γₖ (patchy_pred_gamma_k + psi_y_k) / Σₖ γₖ²`, the slope
//!    through the origin of the total effect as a function of `γ`; `0.0`
//!    when every `γₖ` is zero.
//!
//! Invariants & assumptions
//! ------------------------
//! - All gammas share one uniform draw seeded from the contamination
//!   config, so contaminated positions are nested as `γ` grows.
//! - Training gradients on `Y_γ` are taken at the same `(path, time)`
//!   positions as the clean training partition.
//! - Timings never influence the returned values.
//!
//! Downstream usage
//! ----------------
//! - [`TimeSeriesModel::explain_instance`](crate::models::TimeSeriesModel::explain_instance)
//!   validates lifecycle state and turns a non-converged solve into
//!   `ModelError::NotConverged`.
use crate::{
    contamination::{config::ContaminationConfig, generator::ContaminationDraw},
    data::{
        errors::DataError,
        series::TimeSeries,
        windows::{Partition, pairs_at},
    },
    influence::{
        cg::{SolveOutcome, SolverOptions, conjugate_gradient},
        errors::{InfluenceError, InfluenceResult},
        hessian::DampedHessian,
    },
    models::traits::Forecaster,
    optimization::lbfgs::{Grad, Theta},
    seeded_rng,
};
use log::{info, warn};
use ndarray::Array1;
use std::time::{Duration, Instant};

/// Evaluation positions `target_index ≤ t < target_index + horizon` on every path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationWindow {
    pub lag: usize,
    pub target_index: usize,
    pub horizon: usize,
}

impl EvaluationWindow {
    pub fn new(lag: usize, target_index: usize, horizon: usize) -> Self {
        EvaluationWindow { lag, target_index, horizon }
    }

    /// # Errors
    /// - [`InfluenceError::LagMismatch`] when `lag != model_lag`.
    /// - [`InfluenceError::InvalidHorizon`] when `horizon == 0`.
    /// - [`InfluenceError::InvalidTargetIndex`] unless
    ///   `lag ≤ target_index` and `target_index + horizon ≤ len`.
    pub fn validate(&self, model_lag: usize, len: usize) -> InfluenceResult<()> {
        if self.lag != model_lag {
            return Err(InfluenceError::LagMismatch { expected: model_lag, found: self.lag });
        }
        if self.horizon == 0 {
            return Err(InfluenceError::InvalidHorizon { horizon: self.horizon });
        }
        let end = self.target_index.checked_add(self.horizon);
        if self.target_index < self.lag || end.map_or(true, |e| e > len) {
            return Err(InfluenceError::InvalidTargetIndex {
                target_index: self.target_index,
                horizon: self.horizon,
                lag: self.lag,
                len,
            });
        }
        Ok(())
    }

    fn rows(&self, n_paths: usize) -> Vec<(usize, usize)> {
        let times = self.target_index..self.target_index + self.horizon;
        (0..n_paths).flat_map(|p| times.clone().map(move |t| (p, t))).collect()
    }
}

/// Wall-clock time per explain stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SIFTimings {
    pub if_v: Duration,
    pub patchy_pred_gamma: Duration,
    pub psi_y: Duration,
}

/// Result of an explain call: the SIF scalar and the quantities it is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SIFExplanation {
    pub sif: f64,
    pub gammas: Vec<f64>,
    pub if_v: Array1<f64>,
    pub patchy_pred_gamma: Vec<f64>,
    pub psi_y: Vec<f64>,
    pub solve: SolveOutcome,
    /// Present only when the call was verbose.
    pub timings: Option<SIFTimings>,
}

impl SIFExplanation {
    pub fn converged(&self) -> bool {
        self.solve.converged
    }
}

/// Least-squares slope through the origin of `effect` against `gammas`.
///
/// `effect_k = patchy_pred_gamma_k + psi_y_k`. Returns `0.0` when
/// `Σ γₖ² = 0`.
pub fn combine_sif(gammas: &[f64], patchy_pred_gamma: &[f64], psi_y: &[f64]) -> f64 {
    let denom: f64 = gammas.iter().map(|g| g * g).sum();
    if denom == 0.0 {
        return 0.0;
    }
    let num: f64 = gammas
        .iter()
        .zip(patchy_pred_gamma.iter().zip(psi_y.iter()))
        .map(|(g, (pp, psi))| g * (pp + psi))
        .sum();
    num / denom
}

/// Trained forecaster plus the data the influence quantities refer to.
pub struct InfluenceContext<'a, F: Forecaster> {
    forecaster: &'a F,
    theta: &'a Theta,
    damping: f64,
    train: &'a Partition,
    series: &'a TimeSeries,
}

impl<'a, F: Forecaster> InfluenceContext<'a, F> {
    pub fn new(
        forecaster: &'a F, theta: &'a Theta, damping: f64, train: &'a Partition, series: &'a TimeSeries,
    ) -> Self {
        InfluenceContext { forecaster, theta, damping, train, series }
    }

    /// Mean forecast over `part` and its gradient `∇_θ F`.
    fn mean_forecast_grad(&self, part: &Partition) -> (f64, Grad) {
        let n = part.len();
        let mut grad = Grad::zeros(self.forecaster.n_params());
        let mut total = 0.0;
        for x in part.inputs.rows() {
            let (f, df) = self.forecaster.forecast_grad(self.theta, x);
            total += f;
            grad += &df;
        }
        let scale = 1.0 / n as f64;
        grad *= scale;
        (total * scale, grad)
    }

    fn mean_forecast(&self, part: &Partition) -> f64 {
        self.forecaster.forecast_batch(self.theta, part.inputs.view()).mean().unwrap_or(0.0)
    }

    fn evaluation_pairs(&self, window: &EvaluationWindow, series: &TimeSeries) -> Partition {
        pairs_at(series, window.lag, &window.rows(series.n_paths()))
    }

    /// `if_v = H_λ⁻¹ ∇_θ F(θ̂; X)` for `window`.
    ///
    /// # Errors
    /// Window validation, Hessian construction, and solver errors.
    pub fn influence_vector(
        &self, window: &EvaluationWindow, solver: &SolverOptions,
    ) -> InfluenceResult<SolveOutcome> {
        window.validate(self.forecaster.lag(), self.series.len())?;
        let eval = self.evaluation_pairs(window, self.series);
        let (_, grad_f) = self.mean_forecast_grad(&eval);
        let hessian = DampedHessian::new(self.forecaster, self.theta, self.train, self.damping)?;
        let outcome = conjugate_gradient(&hessian, &grad_f, solver)?;
        if !outcome.converged {
            warn!(
                "influence solve stopped ({:?}) after {} iterations, relative residual {:.3e}",
                outcome.stop,
                outcome.iterations,
                outcome.relative_residual()
            );
        }
        Ok(outcome)
    }

    /// Compute the SIF for `contamination` over `window`.
    ///
    /// The explanation is returned even when the solve did not converge;
    /// check [`SIFExplanation::converged`].
    ///
    /// # Errors
    /// - [`InfluenceError::Data`] for invalid gammas/values or a baseline
    ///   whose shape differs from the clean series.
    /// - Window, Hessian, and solver errors as in [`Self::influence_vector`].
    pub fn explain(
        &self, contamination: &ContaminationConfig, window: &EvaluationWindow, baseline: Option<&TimeSeries>,
        solver: &SolverOptions, verbose: bool,
    ) -> InfluenceResult<SIFExplanation> {
        let series = self.series;
        contamination.validate_for(series.n_paths())?;
        window.validate(self.forecaster.lag(), series.len())?;
        if let Some(b) = baseline {
            if b.shape() != series.shape() {
                return Err(DataError::ShapeMismatch { expected: series.shape(), found: b.shape() }.into());
            }
        }

        // ---- Stage 1: influence vector ----
        let started = Instant::now();
        let solve = self.influence_vector(window, solver)?;
        let if_v = solve.solution.clone();
        let t_if_v = started.elapsed();

        // ---- Stage 2: parameter-side shift ----
        let started = Instant::now();
        let mut rng = seeded_rng(contamination.seed);
        let draw = ContaminationDraw::new(series.n_paths(), series.len(), &mut rng);
        let contaminated = contamination
            .gammas
            .iter()
            .map(|&gamma| draw.apply(series, &contamination.values, gamma, contamination.patch_length))
            .collect::<Result<Vec<_>, _>>()?;
        let train_rows: Vec<(usize, usize)> =
            self.train.path_index.iter().copied().zip(self.train.time_index.iter().copied()).collect();
        let lag = window.lag;
        let g_clean = self.forecaster.gradient(self.theta, self.train.inputs.view(), self.train.labels.view());
        let patchy_pred_gamma: Vec<f64> = contaminated
            .iter()
            .map(|y| {
                let train_y = pairs_at(y, lag, &train_rows);
                let g_y = self.forecaster.gradient(self.theta, train_y.inputs.view(), train_y.labels.view());
                -if_v.dot(&(g_y - &g_clean))
            })
            .collect();
        let t_patchy = started.elapsed();

        // ---- Stage 3: input-side discrepancy ----
        let started = Instant::now();
        let f_base = self.mean_forecast(&self.evaluation_pairs(window, baseline.unwrap_or(series)));
        let psi_y: Vec<f64> = contaminated
            .iter()
            .map(|y| self.mean_forecast(&self.evaluation_pairs(window, y)) - f_base)
            .collect();
        let t_psi = started.elapsed();

        let sif = combine_sif(&contamination.gammas, &patchy_pred_gamma, &psi_y);
        let timings = verbose.then(|| {
            info!(
                "SIF timings: if_v {:.3?}, patchy_pred_gamma {:.3?}, psi_y {:.3?} ({} CG iterations)",
                t_if_v, t_patchy, t_psi, solve.iterations
            );
            SIFTimings { if_v: t_if_v, patchy_pred_gamma: t_patchy, psi_y: t_psi }
        });

        Ok(SIFExplanation {
            sif,
            gammas: contamination.gammas.clone(),
            if_v,
            patchy_pred_gamma,
            psi_y,
            solve,
            timings,
        })
    }

    /// Influence of up-weighting each training pair on `F(θ̂; X)`:
    /// `I_i = -∇ℓᵢ(θ̂)ᵀ if_v` with `ℓᵢ = (f(θ̂, xᵢ) - yᵢ)²`, in training order.
    ///
    /// # Errors
    /// As [`Self::influence_vector`].
    pub fn training_point_influence(
        &self, window: &EvaluationWindow, solver: &SolverOptions,
    ) -> InfluenceResult<(Array1<f64>, SolveOutcome)> {
        let solve = self.influence_vector(window, solver)?;
        let if_v = &solve.solution;
        let scores: Array1<f64> = self
            .train
            .inputs
            .rows()
            .into_iter()
            .zip(self.train.labels.iter())
            .map(|(x, &y)| {
                let (f, df) = self.forecaster.forecast_grad(self.theta, x);
                -2.0 * (f - y) * df.dot(if_v)
            })
            .collect();
        Ok((scores, solve))
    }
}
