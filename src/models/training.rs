//! models::training — the three-phase training loop and the ridge objective.
//!
//! Purpose
//! -------
//! Fit a [`Forecaster`] to a training partition by minimizing
//! `J(θ) = MSE_train(θ) + (λ/2)‖θ‖²`, first with the stochastic schedule
//! ([`fit`]) and optionally polished by L-BFGS through [`RegularizedMse`].
//!
//! Key behaviors
//! -------------
//! - Steps `< switch_to_batch_at` use Adam on shuffled mini-batches, then
//!   Adam on the full partition until `switch_to_sgd_at`, then plain
//!   gradient descent. Adam moments carry over from the mini-batch phase.
//! - Learning rates decay by `learning_rate.decay` every
//!   `learning_rate.every` completed epochs.
//! - A wall-clock budget stops the loop between steps; the report records
//!   that the run ended early.
//!
//! Invariants & assumptions
//! ------------------------
//! - The same RNG handle drives mini-batch shuffling for the whole run, so
//!   a fixed seed and fixed data give identical parameters.
//! - A non-finite objective aborts the run with
//!   [`OptError::NonFiniteLoss`]; the caller's parameters are untouched.
use crate::{
    data::windows::Partition,
    models::traits::Forecaster,
    optimization::{
        errors::{OptError, OptResult},
        lbfgs::{Cost, Grad, Objective, Theta, validation::validate_grad},
        stochastic::{Adam, AdamParams, LearningRate, MiniBatcher, Phase, Schedule, sgd_step},
    },
};
use log::{debug, info};
use ndarray::Axis;
use rand::Rng;
use std::time::{Duration, Instant};

/// Options for [`fit`].
///
/// - `seed`: seeds parameter initialisation and mini-batch shuffling.
/// - `batch_size`: mini-batch size of the first phase.
/// - `learning_rate`: Adam/GD step sizes and their epoch decay.
/// - `adam`: moment coefficients.
/// - `log_every`: emit a `debug!` line every this many steps (`0` = never).
/// - `time_budget`: optional wall-clock cap for one `train` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub seed: u64,
    pub batch_size: usize,
    pub learning_rate: LearningRate,
    pub adam: AdamParams,
    pub log_every: usize,
    pub time_budget: Option<Duration>,
}

impl TrainOptions {
    /// # Errors
    /// Invalid batch size, learning rates, decay, or Adam coefficients.
    pub fn new(
        seed: u64, batch_size: usize, learning_rate: LearningRate, adam: AdamParams, log_every: usize,
        time_budget: Option<Duration>,
    ) -> OptResult<Self> {
        let opts = TrainOptions { seed, batch_size, learning_rate, adam, log_every, time_budget };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.batch_size == 0 {
            return Err(OptError::InvalidBatchSize { value: self.batch_size });
        }
        self.learning_rate.validate()?;
        self.adam.validate()
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            seed: 0,
            batch_size: 32,
            learning_rate: LearningRate { adam: 1e-2, sgd: 1e-2, decay: 1.0, every: 1 },
            adam: AdamParams::default(),
            log_every: 100,
            time_budget: None,
        }
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Steps actually taken.
    pub steps_run: usize,
    /// Completed passes over the training partition.
    pub epochs: usize,
    /// Objective on the batch used at each step, before the update.
    pub losses: Vec<f64>,
    /// Training MSE at the final parameters.
    pub train_loss: f64,
    /// Validation MSE at the final parameters, if the partition is non-empty.
    pub validation_loss: Option<f64>,
    /// `true` when the time budget ended the run.
    pub stopped_early: bool,
    pub elapsed: Duration,
}

/// Run the three-phase schedule from `theta0`.
///
/// Parameters
/// ----------
/// - `forecaster`: model whose loss and gradient are minimized.
/// - `theta0`: starting parameters (consumed).
/// - `train`: training partition.
/// - `damping`: ridge coefficient `λ`.
/// - `schedule`: step count and phase thresholds.
/// - `opts`: learning rates, batch size, logging, time budget.
/// - `rng`: shuffling source.
///
/// Returns
/// -------
/// Final parameters and a [`TrainReport`] with `validation_loss = None`.
///
/// Errors
/// ------
/// - Option validation errors, [`OptError::EmptyTrainingSet`],
///   [`OptError::ThetaLengthMismatch`] / [`OptError::InvalidThetaInput`].
/// - [`OptError::NonFiniteLoss`] or [`OptError::InvalidGradient`] when the
///   iteration diverges.
pub fn fit<F: Forecaster, R: Rng + ?Sized>(
    forecaster: &F, theta0: Theta, train: &Partition, damping: f64, schedule: &Schedule, opts: &TrainOptions,
    rng: &mut R,
) -> OptResult<(Theta, TrainReport)> {
    opts.validate()?;
    if train.is_empty() {
        return Err(OptError::EmptyTrainingSet);
    }
    forecaster.check_params(&theta0)?;

    let n_params = forecaster.n_params();
    let mut theta = theta0;
    let mut adam = Adam::new(n_params, opts.adam);
    let mut batcher = MiniBatcher::new(train.len(), opts.batch_size, rng)?;
    let mut losses = Vec::with_capacity(schedule.steps);
    let mut epochs = 0usize;
    let mut current: Option<Phase> = None;
    let mut stopped_early = false;
    let start = Instant::now();

    for step in 0..schedule.steps {
        if opts.time_budget.is_some_and(|budget| start.elapsed() >= budget) {
            info!("{}: time budget reached after {step} steps", forecaster.name());
            stopped_early = true;
            break;
        }
        let phase = Phase::for_step(step, schedule);
        if current != Some(phase) {
            info!("{}: step {step}: entering {phase:?}", forecaster.name());
            current = Some(phase);
        }
        let lr = opts.learning_rate.at(phase, epochs);

        let (loss, mut grad) = if phase.is_full_batch() {
            epochs += 1;
            forecaster.loss_and_gradient(&theta, train.inputs.view(), train.labels.view())
        } else {
            let (batch, epoch_done) = batcher.next_batch(rng);
            if epoch_done {
                epochs += 1;
            }
            let inputs = train.inputs.select(Axis(0), &batch);
            let labels = train.labels.select(Axis(0), &batch);
            forecaster.loss_and_gradient(&theta, inputs.view(), labels.view())
        };
        let objective = loss + 0.5 * damping * theta.dot(&theta);
        if !objective.is_finite() {
            return Err(OptError::NonFiniteLoss { step, value: objective });
        }
        grad.scaled_add(damping, &theta);
        validate_grad(&grad, n_params)?;
        losses.push(objective);
        if opts.log_every > 0 && step % opts.log_every == 0 {
            debug!("{}: step {step} ({phase:?}, lr {lr:.3e}): objective {objective:.6e}", forecaster.name());
        }

        match phase {
            Phase::MiniBatchAdam | Phase::FullBatchAdam => adam.step(&mut theta, &grad, lr),
            Phase::FullBatchSgd => sgd_step(&mut theta, &grad, lr),
        }
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaInput { index, value });
    }

    let train_loss = forecaster.loss(&theta, train.inputs.view(), train.labels.view());
    let report = TrainReport {
        steps_run: losses.len(),
        epochs,
        losses,
        train_loss,
        validation_loss: None,
        stopped_early,
        elapsed: start.elapsed(),
    };
    Ok((theta, report))
}

/// `J(θ) = MSE(θ) + (λ/2)‖θ‖²` over a partition, for the L-BFGS polish.
pub struct RegularizedMse<'a, F: Forecaster> {
    forecaster: &'a F,
    damping: f64,
}

impl<'a, F: Forecaster> RegularizedMse<'a, F> {
    pub fn new(forecaster: &'a F, damping: f64) -> Self {
        RegularizedMse { forecaster, damping }
    }
}

impl<F: Forecaster> Objective for RegularizedMse<'_, F> {
    type Data = Partition;

    fn value(&self, theta: &Theta, data: &Partition) -> OptResult<Cost> {
        let mse = self.forecaster.loss(theta, data.inputs.view(), data.labels.view());
        Ok(mse + 0.5 * self.damping * theta.dot(theta))
    }

    fn check(&self, theta: &Theta, data: &Partition) -> OptResult<()> {
        if data.is_empty() {
            return Err(OptError::EmptyTrainingSet);
        }
        self.forecaster.check_params(theta)
    }

    fn grad(&self, theta: &Theta, data: &Partition) -> OptResult<Grad> {
        let mut grad = self.forecaster.gradient(theta, data.inputs.view(), data.labels.view());
        grad.scaled_add(self.damping, theta);
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ArProcess, TimeSeries, lagged_pairs};
    use crate::models::{ArForecaster, RnnForecaster};
    use crate::optimization::lbfgs::{MLEOptions, minimize};
    use crate::seeded_rng;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};

    fn ar2_partition(seed: u64) -> Partition {
        let process = ArProcess::new(vec![0.5, 0.2], 0.0, 1.0).unwrap();
        let series = TimeSeries::simulate_ar(&process, 20, 60, &mut seeded_rng(seed)).unwrap();
        lagged_pairs(&series, 2).unwrap()
    }

    /// Closed-form ridge solution `((2/n) X̃ᵀX̃ + λI)⁻¹ (2/n) X̃ᵀy` for the AR model.
    fn ridge_solution(part: &Partition, lambda: f64) -> Array1<f64> {
        let n = part.len();
        let mut xt = Array2::<f64>::ones((n, 3));
        xt.slice_mut(ndarray::s![.., ..2]).assign(&part.inputs);
        let a = xt.t().dot(&xt) * (2.0 / n as f64) + Array2::<f64>::eye(3) * lambda;
        let b = xt.t().dot(&part.labels) * (2.0 / n as f64);
        let am = nalgebra::DMatrix::from_fn(3, 3, |i, j| a[[i, j]]);
        let bv = nalgebra::DVector::from_iterator(3, b.iter().copied());
        let x = am.lu().solve(&bv).expect("ridge system is non-singular");
        Array1::from_iter(x.iter().copied())
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Schedule execution (phases, epochs, losses), determinism, early stop on
    // a zero budget, divergence detection, and the L-BFGS polish reaching
    // the ridge optimum.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The full schedule drives the AR model close to the ridge optimum and
    // the recorded objective decreases.
    //
    // Given
    // -----
    // - Simulated AR(2) data, λ = 1e-3, 600 steps split 200/200/200.
    //
    // Expect
    // ------
    // - 600 recorded losses, last < first; parameters within 0.05 of the
    //   closed-form solution.
    fn schedule_converges_towards_ridge_optimum() {
        // Arrange
        let part = ar2_partition(1);
        let ar = ArForecaster::new(2);
        let schedule = Schedule::new(600, 200, 400).unwrap();
        let opts = TrainOptions { batch_size: 64, ..TrainOptions::default() };
        let mut rng = seeded_rng(opts.seed);
        let theta0 = ar.init_params(&mut rng);

        // Act
        let (theta, report) = fit(&ar, theta0, &part, 1e-3, &schedule, &opts, &mut rng).unwrap();

        // Assert
        assert_eq!(report.steps_run, 600);
        assert!(!report.stopped_early);
        assert!(report.losses[599] < report.losses[0]);
        assert!(report.epochs >= 400);
        let expected = ridge_solution(&part, 1e-3);
        for (a, b) in theta.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 0.05, "θ = {theta:?}, expected {expected:?}");
        }
    }

    #[test]
    fn training_is_deterministic_for_a_fixed_seed() {
        let part = ar2_partition(2);
        let rnn = RnnForecaster::new(2, 3);
        let schedule = Schedule::new(50, 30, 40).unwrap();
        let opts = TrainOptions { batch_size: 16, ..TrainOptions::default() };
        let run = || {
            let mut rng = seeded_rng(7);
            let theta0 = rnn.init_params(&mut rng);
            fit(&rnn, theta0, &part, 1e-3, &schedule, &opts, &mut rng).unwrap().0
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn zero_time_budget_stops_before_first_step() {
        let part = ar2_partition(3);
        let ar = ArForecaster::new(2);
        let schedule = Schedule::new(100, 50, 80).unwrap();
        let opts = TrainOptions { time_budget: Some(Duration::ZERO), ..TrainOptions::default() };
        let theta0 = array![0.1, 0.1, 0.0];

        let (theta, report) = fit(&ar, theta0.clone(), &part, 0.0, &schedule, &opts, &mut seeded_rng(0)).unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.steps_run, 0);
        assert_eq!(theta, theta0);
    }

    #[test]
    // Purpose
    // -------
    // A step size far beyond stability makes gradient descent diverge; the
    // loop reports it instead of returning NaN parameters.
    fn divergence_is_reported() {
        let part = ar2_partition(4);
        let ar = ArForecaster::new(2);
        let schedule = Schedule::new(5000, 0, 0).unwrap();
        let lr = LearningRate::new(1e-2, 50.0, 1.0, 1).unwrap();
        let opts = TrainOptions { learning_rate: lr, ..TrainOptions::default() };

        let err = fit(&ar, array![0.1, 0.1, 0.0], &part, 0.0, &schedule, &opts, &mut seeded_rng(0)).unwrap_err();

        assert!(matches!(
            err,
            OptError::NonFiniteLoss { .. } | OptError::InvalidGradient { .. } | OptError::InvalidThetaInput { .. }
        ));
    }

    #[test]
    fn empty_partition_and_bad_theta_are_rejected() {
        let ar = ArForecaster::new(2);
        let schedule = Schedule::new(1, 0, 1).unwrap();
        let opts = TrainOptions::default();
        let empty = Partition {
            inputs: Array2::zeros((0, 2)),
            labels: Array1::zeros(0),
            path_index: vec![],
            time_index: vec![],
        };
        assert_eq!(
            fit(&ar, array![0.0, 0.0, 0.0], &empty, 0.0, &schedule, &opts, &mut seeded_rng(0)).unwrap_err(),
            OptError::EmptyTrainingSet
        );
        let part = ar2_partition(5);
        assert_eq!(
            fit(&ar, array![0.0, 0.0], &part, 0.0, &schedule, &opts, &mut seeded_rng(0)).unwrap_err(),
            OptError::ThetaLengthMismatch { expected: 3, actual: 2 }
        );
    }

    #[test]
    // Purpose
    // -------
    // L-BFGS on the regularized objective lands on the ridge solution.
    fn lbfgs_polish_matches_closed_form() {
        let part = ar2_partition(6);
        let ar = ArForecaster::new(2);
        let objective = RegularizedMse::new(&ar, 1e-2);

        let out = minimize(&objective, array![0.0, 0.0, 0.0], &part, &MLEOptions::default()).unwrap();

        let expected = ridge_solution(&part, 1e-2);
        for (a, b) in out.theta_hat.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }
}
