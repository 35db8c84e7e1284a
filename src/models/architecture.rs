//! Architecture descriptions and enum dispatch over the built-in forecasters.
//!
//! [`ArchitectureSpec`] is the serializable form stored in checkpoints and
//! accepted by the Python layer; [`Architecture`] is the runtime forecaster
//! it builds, implementing [`Forecaster`] by delegation.
use crate::{
    models::{
        ar::ArForecaster,
        errors::{ModelError, ModelResult},
        rnn::RnnForecaster,
        traits::Forecaster,
    },
    optimization::{
        errors::OptResult,
        lbfgs::{Grad, Theta},
    },
};
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArchitectureSpec {
    Ar { lag: usize },
    Rnn { lag: usize, hidden: usize },
}

impl ArchitectureSpec {
    pub fn lag(&self) -> usize {
        match *self {
            ArchitectureSpec::Ar { lag } | ArchitectureSpec::Rnn { lag, .. } => lag,
        }
    }

    /// # Errors
    /// - [`ModelError::InvalidArchitecture`] for `lag == 0` or `hidden == 0`.
    pub fn validate(&self) -> ModelResult<()> {
        if self.lag() == 0 {
            return Err(ModelError::InvalidArchitecture { reason: "lag must be at least 1" });
        }
        if let ArchitectureSpec::Rnn { hidden: 0, .. } = self {
            return Err(ModelError::InvalidArchitecture { reason: "hidden size must be at least 1" });
        }
        Ok(())
    }
}

impl fmt::Display for ArchitectureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchitectureSpec::Ar { lag } => write!(f, "ar(lag={lag})"),
            ArchitectureSpec::Rnn { lag, hidden } => write!(f, "rnn(lag={lag}, hidden={hidden})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Ar(ArForecaster),
    Rnn(RnnForecaster),
}

impl Architecture {
    /// # Errors
    /// See [`ArchitectureSpec::validate`].
    pub fn from_spec(spec: ArchitectureSpec) -> ModelResult<Self> {
        spec.validate()?;
        Ok(match spec {
            ArchitectureSpec::Ar { lag } => Architecture::Ar(ArForecaster::new(lag)),
            ArchitectureSpec::Rnn { lag, hidden } => Architecture::Rnn(RnnForecaster::new(lag, hidden)),
        })
    }
}

macro_rules! dispatch {
    ($self:ident, $f:ident => $body:expr) => {
        match $self {
            Architecture::Ar($f) => $body,
            Architecture::Rnn($f) => $body,
        }
    };
}

impl Forecaster for Architecture {
    fn name(&self) -> &'static str {
        dispatch!(self, f => f.name())
    }

    fn lag(&self) -> usize {
        dispatch!(self, f => f.lag())
    }

    fn n_params(&self) -> usize {
        dispatch!(self, f => f.n_params())
    }

    fn architecture(&self) -> ArchitectureSpec {
        dispatch!(self, f => f.architecture())
    }

    fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Theta {
        dispatch!(self, f => f.init_params(rng))
    }

    fn forecast(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> f64 {
        dispatch!(self, f => f.forecast(theta, x))
    }

    fn forecast_grad(&self, theta: &Theta, x: ArrayView1<'_, f64>) -> (f64, Grad) {
        dispatch!(self, f => f.forecast_grad(theta, x))
    }

    fn hessian_vector_product(
        &self, theta: &Theta, inputs: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>, v: &Grad,
    ) -> OptResult<Grad> {
        dispatch!(self, f => f.hessian_vector_product(theta, inputs, labels, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_round_trips_through_json() {
        let spec = ArchitectureSpec::Rnn { lag: 3, hidden: 8 };
        let text = serde_json::to_string(&spec).unwrap();
        assert_eq!(text, r#"{"kind":"rnn","lag":3,"hidden":8}"#);
        assert_eq!(serde_json::from_str::<ArchitectureSpec>(&text).unwrap(), spec);
    }

    #[test]
    fn from_spec_builds_matching_forecaster() {
        let arch = Architecture::from_spec(ArchitectureSpec::Ar { lag: 2 }).unwrap();
        assert_eq!(arch.name(), "ar");
        assert_eq!(arch.n_params(), 3);
        assert_eq!(arch.architecture(), ArchitectureSpec::Ar { lag: 2 });
    }

    #[test]
    fn invalid_specs_are_rejected() {
        assert_eq!(
            Architecture::from_spec(ArchitectureSpec::Ar { lag: 0 }).unwrap_err().kind(),
            crate::models::ErrorKind::Config
        );
        assert!(matches!(
            Architecture::from_spec(ArchitectureSpec::Rnn { lag: 2, hidden: 0 }),
            Err(ModelError::InvalidArchitecture { .. })
        ));
    }
}
