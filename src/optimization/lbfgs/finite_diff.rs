//! lbfgs::finite_diff — finite-difference gradient and Hessian-vector helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference derivatives around a parameter vector, with
//! validation, so the rest of the crate never calls the `finitediff` API
//! directly.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward-difference gradient with error capture.
//! - [`hessian_vec_prod`]: `H(θ)·v` from an analytic gradient, central
//!   differences first and forward differences as fallback. The direction
//!   is normalized before differencing and the result rescaled, so the
//!   step size stays meaningful for long or short `v`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned vectors always satisfy [`validate_grad`] for `theta.len()`.
//! - A zero direction yields a zero product without evaluating the gradient.
use crate::optimization::{
    errors::OptResult,
    lbfgs::{Grad, Theta, validation::validate_grad},
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Parameters
/// ----------
/// - `theta`: point at which the gradient is approximated.
/// - `func`: objective; expected to park evaluation errors in `closure_err`
///   and return `NaN`.
/// - `closure_err`: cleared on entry, inspected after differencing.
///
/// Errors
/// ------
/// - The error captured in `closure_err`, mapped into `OptError`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// hessian_vec_prod — finite-difference Hessian-vector product.
///
/// Differentiates the gradient map `grad` along `v` at `theta`, i.e.
/// approximates `∇²J(θ)·v` without forming the Hessian.
///
/// Errors
/// ------
/// - `OptError::GradientDimMismatch` when `v.len() != theta.len()` or the
///   product has the wrong length.
/// - `OptError::InvalidGradient` when both central and forward products
///   contain non-finite entries.
pub fn hessian_vec_prod<F: Fn(&Theta) -> Grad>(grad: &F, theta: &Theta, v: &Grad) -> OptResult<Grad> {
    let dim = theta.len();
    validate_grad(v, dim)?;
    let scale = v.dot(v).sqrt();
    if scale == 0.0 {
        return Ok(Grad::zeros(dim));
    }
    let direction = v / scale;
    let central = theta.central_hessian_vec_prod(grad, &direction);
    if validate_grad(&central, dim).is_ok() {
        return Ok(central * scale);
    }
    let forward = theta.forward_hessian_vec_prod(grad, &direction);
    validate_grad(&forward, dim)?;
    Ok(forward * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_relative_eq;
    use argmin::core::ArgminError;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Forward-difference gradients with and without captured errors, and
    // Hessian-vector products on quadratics with known curvature.
    // -------------------------------------------------------------------------

    #[test]
    fn run_fd_diff_quadratic_returns_valid_gradient() {
        // Arrange
        let theta: Theta = Array1::from(vec![0.0_f64, 1.0]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| x.dot(x);

        // Act
        let grad = run_fd_diff(&theta, &f, &closure_err).unwrap();

        // Assert
        assert_relative_eq!(grad[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // An error parked by the closure wins over the (NaN) gradient.
    fn run_fd_diff_closure_error_is_propagated() {
        let theta: Theta = Array1::from(vec![1.0_f64]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            let argmin_err = ArgminError::NotImplemented { text: "fd test".to_string() };
            closure_err.replace(Some(argmin_err.into()));
            f64::NAN
        };

        let err = run_fd_diff(&theta, &f, &closure_err).unwrap_err();

        assert_eq!(err, OptError::NotImplemented { text: "fd test".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // `hessian_vec_prod` reproduces `A v` for `J(θ) = ½ θᵀAθ`, independent of
    // the length of `v`.
    //
    // Given
    // -----
    // - Symmetric A = [[3, 1], [1, 2]]; gradient map θ ↦ Aθ.
    // - Directions v and 1e4·v.
    //
    // Expect
    // ------
    // - Products equal A v and 1e4·A v to finite-difference accuracy.
    fn hessian_vec_prod_matches_quadratic_curvature() {
        let a = array![[3.0, 1.0], [1.0, 2.0]];
        let grad = |t: &Theta| a.dot(t);
        let theta = array![0.3, -0.7];
        let v = array![1.0, 2.0];

        let hv = hessian_vec_prod(&grad, &theta, &v).unwrap();
        let hv_big = hessian_vec_prod(&grad, &theta, &(1e4 * &v)).unwrap();

        assert_relative_eq!(hv[0], 5.0, epsilon = 1e-5);
        assert_relative_eq!(hv[1], 5.0, epsilon = 1e-5);
        assert_relative_eq!(hv_big[0], 5.0e4, max_relative = 1e-5);
    }

    #[test]
    fn hessian_vec_prod_zero_direction_is_zero() {
        let grad = |_: &Theta| -> Grad { panic!("gradient must not be evaluated") };
        let hv = hessian_vec_prod(&grad, &array![1.0, 2.0], &array![0.0, 0.0]).unwrap();
        assert_eq!(hv, array![0.0, 0.0]);
    }

    #[test]
    fn hessian_vec_prod_rejects_wrong_direction_length() {
        let grad = |t: &Theta| t.clone();
        let err = hessian_vec_prod(&grad, &array![1.0, 2.0], &array![1.0]).unwrap_err();
        assert_eq!(err, OptError::GradientDimMismatch { expected: 2, found: 1 });
    }
}
