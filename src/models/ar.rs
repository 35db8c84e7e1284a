//! Linear autoregressive forecaster `f(θ, x) = Σᵢ wᵢ xᵢ + b`.
//!
//! Parameter layout is `[w₁, …, w_L, b]`, with `w₁` multiplying the oldest
//! value in the window. The loss is quadratic in `θ`, so the Hessian-vector
//! product is computed exactly as `(2/n) Σ x̃ᵢ (x̃ᵢᵀ v)` with `x̃ = [x, 1]`.
use crate::{
    models::{architecture::ArchitectureSpec, traits::Forecaster},
    optimization::{
        errors::{OptError, OptResult},
        lbfgs::{Grad, Theta},
    },
};
use ndarray::{ArrayView1, ArrayView2, s};
use rand::Rng;

/// Scale of the uniform initialisation `U(-s, s)` with `s = INIT_SCALE / √L`.
const INIT_SCALE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArForecaster {
    lag: usize,
}

impl ArForecaster {
    pub fn new(lag: usize) -> Self {
        ArForecaster { lag }
    }

    fn linear(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> f64 {
        theta.slice(s![..self.lag]).dot(&x) + theta[self.lag]
    }
}

impl Forecaster for ArForecaster {
    fn name(&self) -> &'static str {
        "ar"
    }

    fn lag(&self) -> usize {
        self.lag
    }

    fn n_params(&self) -> usize {
        self.lag + 1
    }

    fn architecture(&self) -> ArchitectureSpec {
        ArchitectureSpec::Ar { lag: self.lag }
    }

    fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Theta {
        let bound = INIT_SCALE / (self.lag as f64).sqrt();
        let mut theta: Theta = (0..self.n_params()).map(|_| rng.gen_range(-bound..bound)).collect();
        theta[self.lag] = 0.0;
        theta
    }

    fn forecast(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> f64 {
        self.linear(theta, x)
    }

    fn forecast_grad(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> (f64, Grad) {
        let mut grad = Grad::ones(self.n_params());
        grad.slice_mut(s![..self.lag]).assign(&x);
        (self.linear(theta, x), grad)
    }

    fn hessian_vector_product(
        &self, _theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>, v: &Grad,
    ) -> OptResult<Grad> {
        let dim = self.n_params();
        if v.len() != dim {
            return Err(OptError::GradientDimMismatch { expected: dim, found: v.len() });
        }
        let n = labels.len();
        let mut hv = Grad::zeros(dim);
        if n == 0 {
            return Ok(hv);
        }
        let w = v.slice(s![..self.lag]);
        let vb = v[self.lag];
        for x in inputs.rows() {
            let proj = x.dot(&w) + vb;
            hv.slice_mut(s![..self.lag]).scaled_add(proj, &x);
            hv[self.lag] += proj;
        }
        hv *= 2.0 / n as f64;
        Ok(hv)
    }
}
