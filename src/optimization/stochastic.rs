//! stochastic — first-order update rules and the three-phase training schedule.
//!
//! Purpose
//! -------
//! Provide the building blocks of forecaster training: Adam and plain
//! gradient-descent updates on flat parameter vectors, a deterministic
//! mini-batch sampler, and the step schedule that decides which phase a
//! step belongs to and which learning rate it uses.
//!
//! Key behaviors
//! -------------
//! - [`Phase::for_step`] maps a step to mini-batch Adam, full-batch Adam,
//!   or full-batch gradient descent from two thresholds.
//! - [`LearningRate::at`] applies a multiplicative decay every
//!   `decay_every_epochs` completed epochs.
//! - [`MiniBatcher`] reshuffles the training indices at each epoch boundary
//!   using the caller's RNG, so batches are reproducible for a fixed seed.
//!
//! Invariants & assumptions
//! ------------------------
//! - All updates are in-place on `Theta` and never allocate a new vector.
//! - An epoch is one pass over the training partition: each full-batch step
//!   completes one epoch, mini-batch steps complete one when the sampler
//!   wraps around.
use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgs::{Grad, Theta},
};
use ndarray::{Array1, Zip};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Adam moment coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamParams {
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl AdamParams {
    /// # Errors
    /// [`OptError::InvalidAdam`] unless `0 ≤ β₁, β₂ < 1` and `ε > 0`.
    pub fn new(beta1: f64, beta2: f64, epsilon: f64) -> OptResult<Self> {
        let params = AdamParams { beta1, beta2, epsilon };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> OptResult<()> {
        let in_unit = |b: f64| b.is_finite() && (0.0..1.0).contains(&b);
        if !in_unit(self.beta1) || !in_unit(self.beta2) {
            return Err(OptError::InvalidAdam { reason: "beta1 and beta2 must lie in [0, 1)" });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(OptError::InvalidAdam { reason: "epsilon must be finite and > 0" });
        }
        Ok(())
    }
}

impl Default for AdamParams {
    fn default() -> Self {
        AdamParams { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

/// Adam state for one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    params: AdamParams,
    m: Array1<f64>,
    v: Array1<f64>,
    t: i32,
}

impl Adam {
    pub fn new(dim: usize, params: AdamParams) -> Self {
        Adam { params, m: Array1::zeros(dim), v: Array1::zeros(dim), t: 0 }
    }

    /// One bias-corrected Adam update of `theta` with step size `lr`.
    pub fn step(&mut self, theta: &mut Theta, grad: &Grad, lr: f64) {
        let AdamParams { beta1, beta2, epsilon } = self.params;
        self.t = self.t.saturating_add(1);
        let c1 = 1.0 - beta1.powi(self.t);
        let c2 = 1.0 - beta2.powi(self.t);
        Zip::from(theta).and(&mut self.m).and(&mut self.v).and(grad).for_each(|th, m, v, &g| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / c1;
            let v_hat = *v / c2;
            *th -= lr * m_hat / (v_hat.sqrt() + epsilon);
        });
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.t
    }
}

/// Plain gradient-descent update `θ ← θ - lr·g`.
pub fn sgd_step(theta: &mut Theta, grad: &Grad, lr: f64) {
    theta.scaled_add(-lr, grad);
}

/// Training phase of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    MiniBatchAdam,
    FullBatchAdam,
    FullBatchSgd,
}

impl Phase {
    /// Phase of `step` given the two switch thresholds.
    ///
    /// `step < switch_to_batch_at` is mini-batch Adam; then full-batch Adam
    /// until `switch_to_sgd_at`; full-batch gradient descent afterwards.
    pub fn for_step(step: usize, schedule: &Schedule) -> Phase {
        if step < schedule.switch_to_batch_at {
            Phase::MiniBatchAdam
        } else if step < schedule.switch_to_sgd_at {
            Phase::FullBatchAdam
        } else {
            Phase::FullBatchSgd
        }
    }

    pub fn is_full_batch(self) -> bool {
        !matches!(self, Phase::MiniBatchAdam)
    }
}

/// Phase switch thresholds for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub steps: usize,
    pub switch_to_batch_at: usize,
    pub switch_to_sgd_at: usize,
}

impl Schedule {
    /// # Errors
    /// [`OptError::InvalidSchedule`] when `switch_to_batch_at > switch_to_sgd_at`.
    pub fn new(steps: usize, switch_to_batch_at: usize, switch_to_sgd_at: usize) -> OptResult<Self> {
        if switch_to_batch_at > switch_to_sgd_at {
            return Err(OptError::InvalidSchedule { switch_to_batch_at, switch_to_sgd_at });
        }
        Ok(Schedule { steps, switch_to_batch_at, switch_to_sgd_at })
    }
}

/// Learning rates per optimizer and their epoch-based decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningRate {
    /// Adam step size.
    pub adam: f64,
    /// Gradient-descent step size.
    pub sgd: f64,
    /// Multiplicative decay factor in `(0, 1]`.
    pub decay: f64,
    /// Apply `decay` after every this many completed epochs.
    pub every: usize,
}

impl LearningRate {
    /// # Errors
    /// - [`OptError::InvalidLearningRate`] for non-finite or non-positive rates.
    /// - [`OptError::InvalidDecay`] for a factor outside `(0, 1]` or `every == 0`.
    pub fn new(adam: f64, sgd: f64, decay: f64, every: usize) -> OptResult<Self> {
        let rate = LearningRate { adam, sgd, decay, every };
        rate.validate()?;
        Ok(rate)
    }

    pub fn validate(&self) -> OptResult<()> {
        for value in [self.adam, self.sgd] {
            if !(value.is_finite() && value > 0.0) {
                return Err(OptError::InvalidLearningRate {
                    value,
                    reason: "learning rates must be finite and > 0",
                });
            }
        }
        if !(self.decay.is_finite() && self.decay > 0.0 && self.decay <= 1.0) || self.every == 0 {
            return Err(OptError::InvalidDecay { factor: self.decay, every: self.every });
        }
        Ok(())
    }

    /// Step size for `phase` after `epochs` completed epochs.
    pub fn at(&self, phase: Phase, epochs: usize) -> f64 {
        let base = match phase {
            Phase::MiniBatchAdam | Phase::FullBatchAdam => self.adam,
            Phase::FullBatchSgd => self.sgd,
        };
        let exponent = i32::try_from(epochs / self.every).unwrap_or(i32::MAX);
        base * self.decay.powi(exponent)
    }
}

/// Reproducible epoch-wise shuffled mini-batches over `0..n`.
#[derive(Debug, Clone)]
pub struct MiniBatcher {
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
}

impl MiniBatcher {
    /// # Errors
    /// - [`OptError::InvalidBatchSize`] when `batch_size == 0`.
    /// - [`OptError::EmptyTrainingSet`] when `n == 0`.
    pub fn new<R: Rng + ?Sized>(n: usize, batch_size: usize, rng: &mut R) -> OptResult<Self> {
        if batch_size == 0 {
            return Err(OptError::InvalidBatchSize { value: batch_size });
        }
        if n == 0 {
            return Err(OptError::EmptyTrainingSet);
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        Ok(MiniBatcher { order, cursor: 0, batch_size: batch_size.min(n) })
    }

    /// Next batch of indices and whether it completed an epoch.
    ///
    /// The last batch of an epoch may be shorter than `batch_size`; the
    /// order is reshuffled before the next epoch starts.
    pub fn next_batch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (Vec<usize>, bool) {
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        let epoch_done = self.cursor == self.order.len();
        if epoch_done {
            self.order.shuffle(rng);
            self.cursor = 0;
        }
        (batch, epoch_done)
    }
}
