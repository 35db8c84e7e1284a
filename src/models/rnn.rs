//! Elman RNN forecaster over the lag window.
//!
//! The window is fed oldest first through a single tanh layer of `H` hidden
//! units,
//!
//! ```text
//! h₀ = 0,   hₛ₊₁ = tanh(W_in·xₛ + W_h·hₛ + b_h),   f = w_outᵀ h_L + b_out,
//! ```
//!
//! and the gradient `∂f/∂θ` is obtained by back-propagation through the `L`
//! steps. Parameters are stored flat as
//! `[W_in (H), W_h (H×H, row-major), b_h (H), w_out (H), b_out]`,
//! so `n_params = H² + 3H + 1`. The Hessian-vector product uses the trait's
//! finite-difference default.
use crate::{
    models::{architecture::ArchitectureSpec, traits::Forecaster},
    optimization::lbfgs::{Grad, Theta},
};
use ndarray::{Array1, ArrayView1};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RnnForecaster {
    lag: usize,
    hidden: usize,
}

/// Offsets of each parameter block in the flat vector.
#[derive(Debug, Clone, Copy)]
struct Layout {
    h: usize,
}

impl Layout {
    fn w_in(self) -> usize {
        0
    }
    fn w_h(self) -> usize {
        self.h
    }
    fn b_h(self) -> usize {
        self.h + self.h * self.h
    }
    fn w_out(self) -> usize {
        self.b_h() + self.h
    }
    fn b_out(self) -> usize {
        self.w_out() + self.h
    }
    fn len(self) -> usize {
        self.b_out() + 1
    }
}

impl RnnForecaster {
    pub fn new(lag: usize, hidden: usize) -> Self {
        RnnForecaster { lag, hidden }
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    fn layout(&self) -> Layout {
        Layout { h: self.hidden }
    }

    /// Hidden states `h₀ … h_L` for one window.
    fn hidden_states(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> Vec<Array1<f64>> {
        let h = self.hidden;
        let lay = self.layout();
        let mut states = Vec::with_capacity(x.len() + 1);
        states.push(Array1::<f64>::zeros(h));
        for &xs in x.iter() {
            let prev = &states[states.len() - 1];
            let next: Array1<f64> = (0..h)
                .map(|i| {
                    let row = lay.w_h() + i * h;
                    let rec: f64 = (0..h).map(|j| theta[row + j] * prev[j]).sum();
                    (theta[lay.w_in() + i] * xs + rec + theta[lay.b_h() + i]).tanh()
                })
                .collect();
            states.push(next);
        }
        states
    }

    fn read_out(&self, theta: &Theta, last: &Array1<f64>) -> f64 {
        let lay = self.layout();
        let w_out: f64 = (0..self.hidden).map(|i| theta[lay.w_out() + i] * last[i]).sum();
        w_out + theta[lay.b_out()]
    }
}

impl Forecaster for RnnForecaster {
    fn name(&self) -> &'static str {
        "rnn"
    }

    fn lag(&self) -> usize {
        self.lag
    }

    fn n_params(&self) -> usize {
        self.layout().len()
    }

    fn architecture(&self) -> ArchitectureSpec {
        ArchitectureSpec::Rnn { lag: self.lag, hidden: self.hidden }
    }

    /// Uniform `U(-1/√H, 1/√H)` weights, zero biases.
    fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Theta {
        let lay = self.layout();
        let bound = 1.0 / (self.hidden as f64).sqrt();
        let mut theta: Theta = (0..lay.len()).map(|_| rng.gen_range(-bound..bound)).collect();
        for i in 0..self.hidden {
            theta[lay.b_h() + i] = 0.0;
        }
        theta[lay.b_out()] = 0.0;
        theta
    }

    fn forecast(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> f64 {
        let states = self.hidden_states(theta, x);
        self.read_out(theta, &states[states.len() - 1])
    }

    fn forecast_grad(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> (f64, Grad) {
        let h = self.hidden;
        let lay = self.layout();
        let states = self.hidden_states(theta, x);
        let last = &states[states.len() - 1];
        let f = self.read_out(theta, last);

        let mut grad = Grad::zeros(lay.len());
        for i in 0..h {
            grad[lay.w_out() + i] = last[i];
        }
        grad[lay.b_out()] = 1.0;

        // dF/dh_L, then walk back through the window.
        let mut delta_h: Array1<f64> = (0..h).map(|i| theta[lay.w_out() + i]).collect();
        for s in (0..x.len()).rev() {
            let h_next = &states[s + 1];
            let h_prev = &states[s];
            let delta_a: Array1<f64> = (0..h).map(|i| delta_h[i] * (1.0 - h_next[i] * h_next[i])).collect();
            for i in 0..h {
                grad[lay.w_in() + i] += delta_a[i] * x[s];
                grad[lay.b_h() + i] += delta_a[i];
                let row = lay.w_h() + i * h;
                for j in 0..h {
                    grad[row + j] += delta_a[i] * h_prev[j];
                }
            }
            delta_h = (0..h).map(|j| (0..h).map(|i| theta[lay.w_h() + i * h + j] * delta_a[i]).sum()).collect();
        }
        (f, grad)
    }
}
