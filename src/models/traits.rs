//! models::traits — the forecaster interface shared by every architecture.
//!
//! Purpose
//! -------
//! Define [`Forecaster`], the one-step-ahead map `f(θ, x)` from a flat
//! parameter vector and a lag window to a prediction, together with the
//! mean-squared-error loss, its gradient, and Hessian-vector products that
//! training and the influence solve are built on.
//!
//! Key behaviors
//! -------------
//! - Implementors supply the forward map and its parameter gradient
//!   ([`Forecaster::forecast_grad`]); batch loss and gradient are derived.
//! - [`Forecaster::hessian_vector_product`] defaults to central finite
//!   differences of the analytic gradient; architectures with a cheap exact
//!   product override it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `theta.len() == n_params()` and every window has length `lag()`;
//!   callers validate at the model boundary, implementors may index freely.
//! - Loss is the plain MSE `(1/n) Σ (f(θ, xᵢ) - yᵢ)²`. Ridge terms belong to
//!   the training objective, not to the forecaster.
//! - An empty batch has loss `0.0` and a zero gradient.
//!
//! Conventions
//! -----------
//! - Windows are ordered oldest first: `x[0] = y[t-L]`, `x[L-1] = y[t-1]`.
use crate::{
    models::architecture::ArchitectureSpec,
    optimization::{
        errors::OptResult,
        lbfgs::{Grad, Theta, finite_diff::hessian_vec_prod, validation::validate_theta},
    },
};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

pub trait Forecaster: Send + Sync {
    /// Short architecture name used in logs and checkpoints.
    fn name(&self) -> &'static str;

    /// Window length `L`.
    fn lag(&self) -> usize;

    /// Length of the flat parameter vector.
    fn n_params(&self) -> usize;

    /// Serializable description sufficient to rebuild this forecaster.
    fn architecture(&self) -> ArchitectureSpec;

    /// Random starting point for training.
    fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Theta;

    /// One-step forecast for a single window.
    fn forecast(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> f64;

    /// Forecast together with `∂f/∂θ`.
    fn forecast_grad(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> (f64, Grad);

    /// Forecasts for every row of `inputs`.
    fn forecast_batch(&self, theta: &Theta, inputs: ArrayView2<'_, f64>) -> Array1<f64> {
        inputs.rows().into_iter().map(|x| self.forecast(theta, x)).collect()
    }

    /// Mean squared error over the batch.
    fn loss(&self, theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> f64 {
        let n = labels.len();
        if n == 0 {
            return 0.0;
        }
        let sse: f64 = inputs
            .rows()
            .into_iter()
            .zip(labels.iter())
            .map(|(x, &y)| {
                let r = self.forecast(theta, x) - y;
                r * r
            })
            .sum();
        sse / n as f64
    }

    /// `∇_θ MSE = (2/n) Σ (f(θ, xᵢ) - yᵢ) ∂f/∂θ`.
    fn gradient(&self, theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> Grad {
        self.loss_and_gradient(theta, inputs, labels).1
    }

    /// Loss and gradient in one pass.
    fn loss_and_gradient(
        &self, theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>,
    ) -> (f64, Grad) {
        let n = labels.len();
        let mut grad = Grad::zeros(self.n_params());
        if n == 0 {
            return (0.0, grad);
        }
        let mut sse = 0.0;
        for (x, &y) in inputs.rows().into_iter().zip(labels.iter()) {
            let (f, df) = self.forecast_grad(theta, x);
            let r = f - y;
            sse += r * r;
            grad.scaled_add(2.0 * r, &df);
        }
        let scale = 1.0 / n as f64;
        grad *= scale;
        (sse * scale, grad)
    }

    /// `∇²_θ MSE · v`.
    ///
    /// # Errors
    /// [`OptError`](crate::optimization::errors::OptError) if `v` has the wrong
    /// length or the finite-difference product is non-finite.
    fn hessian_vector_product(
        &self, theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>, v: &Grad,
    ) -> OptResult<Grad> {
        let grad = |t: &Theta| self.gradient(t, inputs, labels);
        hessian_vec_prod(&grad, theta, v)
    }

    /// Check that `theta` is finite and has `n_params()` entries.
    fn check_params(&self, theta: &Theta) -> OptResult<()> {
        validate_theta(theta, self.n_params())
    }
}
