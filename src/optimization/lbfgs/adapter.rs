//! Adapter that exposes an [`Objective`] as an `argmin` problem.
//!
//! The objective is minimized directly. Analytic gradients are passed
//! through after validation; when an objective does not provide one, the
//! cost closure is finite-differenced.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    lbfgs::{
        finite_diff::run_fd_diff,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `J(θ)`.
    ///
    /// # Errors
    /// Propagates any `OptError` from the objective; a non-finite value is
    /// reported as [`OptError::NonFiniteCost`].
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇J(θ)`.
    ///
    /// Behavior:
    /// - Analytic gradients are validated and returned unchanged.
    /// - On [`OptError::GradientNotImplemented`], a central-difference
    ///   gradient of the cost is tried first; if any cost evaluation failed
    ///   or the result is not finite, a forward difference is used instead.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and the closure returns `NaN`.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// `J(θ) = Σ (θ_i - c_i)²` with an optional analytic gradient.
    struct Shifted {
        analytic: bool,
    }

    impl Objective for Shifted {
        type Data = Theta;

        fn value(&self, theta: &Theta, c: &Theta) -> OptResult<Cost> {
            Ok((theta - c).mapv(|d| d * d).sum())
        }

        fn check(&self, _theta: &Theta, _c: &Theta) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, c: &Theta) -> OptResult<Grad> {
            if self.analytic { Ok(2.0 * (theta - c)) } else { Err(OptError::GradientNotImplemented) }
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter does not flip signs: cost and gradient match the objective.
    fn cost_and_gradient_are_passed_through() {
        let f = Shifted { analytic: true };
        let c = array![1.0, -2.0];
        let adapter = ArgMinAdapter::new(&f, &c);
        let theta = array![0.0, 0.0];

        assert_relative_eq!(adapter.cost(&theta).unwrap(), 5.0);
        let g = adapter.gradient(&theta).unwrap();
        assert_relative_eq!(g[0], -2.0);
        assert_relative_eq!(g[1], 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Missing analytic gradients fall back to finite differences.
    fn finite_difference_fallback_matches_analytic() {
        let f = Shifted { analytic: false };
        let c = array![0.5, 3.0];
        let adapter = ArgMinAdapter::new(&f, &c);

        let g = adapter.gradient(&array![1.0, 1.0]).unwrap();

        assert_relative_eq!(g[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(g[1], -4.0, epsilon = 1e-5);
    }
}
