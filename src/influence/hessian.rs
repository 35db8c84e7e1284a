//! influence::hessian — the damped training Hessian as a linear operator.
//!
//! Purpose
//! -------
//! Expose `H_λ = ∇²MSE_train(θ̂) + λI` to the conjugate-gradient solver
//! through the forecaster's Hessian-vector product, and materialize it
//! densely for small models when a diagnostic view is needed.
//!
//! Invariants & assumptions
//! ------------------------
//! - `λ ≥ 0` and finite; with `λ > 0` the ridge term of the training
//!   objective makes `H_λ` positive definite at a minimizer.
//! - The operator borrows the forecaster, parameters, and training pairs;
//!   nothing is copied per product.
use crate::{
    data::windows::Partition,
    influence::{
        cg::LinearOperator,
        errors::{InfluenceError, InfluenceResult},
    },
    models::traits::Forecaster,
    optimization::lbfgs::{Grad, Hessian, Theta},
};
use ndarray::Array1;

/// `v ↦ (∇²MSE_train(θ̂) + λI) v`.
pub struct DampedHessian<'a, F: Forecaster> {
    forecaster: &'a F,
    theta: &'a Theta,
    train: &'a Partition,
    damping: f64,
}

impl<'a, F: Forecaster> DampedHessian<'a, F> {
    /// # Errors
    /// - [`InfluenceError::InvalidDamping`] for negative or non-finite `damping`.
    /// - [`InfluenceError::EmptyTrainingSet`] for an empty partition.
    /// - [`InfluenceError::DimensionMismatch`] when `theta` or the partition's
    ///   lag do not fit the forecaster.
    pub fn new(forecaster: &'a F, theta: &'a Theta, train: &'a Partition, damping: f64) -> InfluenceResult<Self> {
        if !(damping.is_finite() && damping >= 0.0) {
            return Err(InfluenceError::InvalidDamping { value: damping });
        }
        if train.is_empty() {
            return Err(InfluenceError::EmptyTrainingSet);
        }
        if theta.len() != forecaster.n_params() {
            return Err(InfluenceError::DimensionMismatch { expected: forecaster.n_params(), found: theta.len() });
        }
        if train.lag() != forecaster.lag() {
            return Err(InfluenceError::LagMismatch { expected: forecaster.lag(), found: train.lag() });
        }
        Ok(DampedHessian { forecaster, theta, train, damping })
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Dense `n × n` matrix built column by column from products with the
    /// standard basis. Costs `n` Hessian-vector products.
    pub fn to_dense(&self) -> InfluenceResult<Hessian> {
        let n = self.dim();
        let mut dense = Hessian::zeros((n, n));
        let mut e = Array1::<f64>::zeros(n);
        for j in 0..n {
            e[j] = 1.0;
            let col = self.apply(&e)?;
            dense.column_mut(j).assign(&col);
            e[j] = 0.0;
        }
        // Symmetrize away finite-difference noise.
        let sym = (&dense + &dense.t()) * 0.5;
        Ok(sym)
    }
}

impl<F: Forecaster> LinearOperator for DampedHessian<'_, F> {
    fn dim(&self) -> usize {
        self.forecaster.n_params()
    }

    fn apply(&self, v: &Grad) -> InfluenceResult<Grad> {
        let mut hv = self.forecaster.hessian_vector_product(
            self.theta,
            self.train.inputs.view(),
            self.train.labels.view(),
            v,
        )?;
        hv.scaled_add(self.damping, v);
        Ok(hv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{TimeSeries, lagged_pairs};
    use crate::models::ArForecaster;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn ramp_partition(lag: usize) -> Partition {
        let values = Array2::from_shape_fn((2, 12), |(p, t)| ((t * 3 + p * 5) % 7) as f64 - 3.0);
        lagged_pairs(&TimeSeries::new(values).unwrap(), lag).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Damping on the diagonal, the dense view for the linear forecaster
    // (closed form (2/n) X̃ᵀX̃ + λI), and constructor validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // For the AR forecaster the dense damped Hessian equals (2/n) X̃ᵀX̃ + λI.
    fn dense_ar_hessian_matches_closed_form() {
        // Arrange
        let part = ramp_partition(2);
        let ar = ArForecaster::new(2);
        let theta = array![0.1, 0.2, 0.0];
        let lambda = 0.3;
        let op = DampedHessian::new(&ar, &theta, &part, lambda).unwrap();

        // Act
        let dense = op.to_dense().unwrap();

        // Assert
        let n = part.len();
        let mut xt = Array2::<f64>::ones((n, 3));
        xt.slice_mut(ndarray::s![.., ..2]).assign(&part.inputs);
        let expected = xt.t().dot(&xt) * (2.0 / n as f64) + Array2::<f64>::eye(3) * lambda;
        for (a, b) in dense.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn constructor_validates_inputs() {
        let part = ramp_partition(2);
        let ar = ArForecaster::new(2);
        let theta = array![0.1, 0.2, 0.0];
        assert!(matches!(
            DampedHessian::new(&ar, &theta, &part, -1.0),
            Err(InfluenceError::InvalidDamping { .. })
        ));
        let short = array![0.1, 0.2];
        assert!(matches!(
            DampedHessian::new(&ar, &short, &part, 0.1),
            Err(InfluenceError::DimensionMismatch { expected: 3, found: 2 })
        ));
        let wrong_lag = ArForecaster::new(3);
        let theta3 = array![0.0, 0.0, 0.0, 0.0];
        assert!(matches!(
            DampedHessian::new(&wrong_lag, &theta3, &part, 0.1),
            Err(InfluenceError::LagMismatch { expected: 3, found: 2 })
        ));
    }
}
