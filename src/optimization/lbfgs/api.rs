//! High-level entry point for minimizing an [`Objective`].
//!
//! Selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the objective in an [`ArgMinAdapter`], and delegates the run
//! to [`run_lbfgs`].
use crate::optimization::{
    errors::OptResult,
    lbfgs::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, MLEOptions, Objective},
    },
};

/// Minimize `J(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Builds the solver for `opts.line_searcher` and runs it from `theta0`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder and runtime errors (e.g. line-search failures).
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use sif_timeseries::optimization::errors::OptResult;
/// use sif_timeseries::optimization::lbfgs::{minimize, MLEOptions, Objective, Theta};
///
/// struct Bowl;
/// impl Objective for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), sif_timeseries::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::{OptError, OptResult},
        lbfgs::{Cost, Grad, Tolerances},
    };
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    /// Ridge least squares `‖Aθ - b‖² / n + (λ/2)‖θ‖²` with analytic gradient.
    struct Ridge {
        lambda: f64,
    }

    struct RidgeData {
        a: ndarray::Array2<f64>,
        b: Array1<f64>,
    }

    impl Objective for Ridge {
        type Data = RidgeData;

        fn value(&self, theta: &Theta, d: &RidgeData) -> OptResult<Cost> {
            let r = d.a.dot(theta) - &d.b;
            Ok(r.dot(&r) / d.b.len() as f64 + 0.5 * self.lambda * theta.dot(theta))
        }

        fn check(&self, theta: &Theta, d: &RidgeData) -> OptResult<()> {
            if theta.len() != d.a.ncols() {
                return Err(OptError::ThetaLengthMismatch { expected: d.a.ncols(), actual: theta.len() });
            }
            Ok(())
        }

        fn grad(&self, theta: &Theta, d: &RidgeData) -> OptResult<Grad> {
            let r = d.a.dot(theta) - &d.b;
            Ok(d.a.t().dot(&r) * (2.0 / d.b.len() as f64) + self.lambda * theta)
        }
    }

    fn data() -> RidgeData {
        RidgeData {
            a: array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0], [2.0, -1.0]],
            b: array![1.0, 2.0, 0.5, -1.0],
        }
    }

    #[test]
    // Purpose
    // -------
    // `minimize` reaches the closed-form ridge solution with both line searches.
    //
    // Given
    // -----
    // - A 4×2 design, λ = 0.1, start at the origin.
    //
    // Expect
    // ------
    // - θ̂ solves (2/n · AᵀA + λI) θ = 2/n · Aᵀb to 1e-5.
    fn minimize_recovers_ridge_solution() {
        let d = data();
        let n = d.b.len() as f64;
        let m = d.a.t().dot(&d.a) * (2.0 / n) + ndarray::Array2::<f64>::eye(2) * 0.1;
        let rhs = d.a.t().dot(&d.b) * (2.0 / n);
        // 2x2 inverse by hand.
        let det = m[[0, 0]] * m[[1, 1]] - m[[0, 1]] * m[[1, 0]];
        let expected = array![
            (m[[1, 1]] * rhs[0] - m[[0, 1]] * rhs[1]) / det,
            (m[[0, 0]] * rhs[1] - m[[1, 0]] * rhs[0]) / det
        ];

        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts =
                MLEOptions::new(Tolerances::new(Some(1e-10), None, Some(200)).unwrap(), ls, false, None)
                    .unwrap();
            let out = minimize(&Ridge { lambda: 0.1 }, array![0.0, 0.0], &d, &opts).unwrap();

            assert!(out.converged);
            assert_relative_eq!(out.theta_hat[0], expected[0], epsilon = 1e-5);
            assert_relative_eq!(out.theta_hat[1], expected[1], epsilon = 1e-5);
        }
    }

    #[test]
    fn minimize_runs_check_first() {
        let err = minimize(&Ridge { lambda: 0.1 }, array![0.0], &data(), &MLEOptions::default())
            .unwrap_err();
        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 1 });
    }
}
