//! Contamination configuration used by `explain_instance`.
use crate::{
    contamination::generator::{validate_gamma, validate_values},
    data::errors::{DataError, DataResult},
};
use ndarray::Array1;
use rand::Rng;
use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// Default number of consecutive steps in one outlier patch.
pub const DEFAULT_PATCH_LENGTH: usize = 1;

/// Default seed for indicator sampling.
pub const DEFAULT_CONTAMINATION_SEED: u64 = 0;

/// `ContaminationConfig` — contaminating process and candidate rates.
///
/// Fields
/// ------
/// - `values`: one contaminating value per sample path.
/// - `gammas`: candidate per-step contamination probabilities, each in `[0, 1)`.
/// - `patch_length`: consecutive steps covered by one outlier event (`≥ 1`).
/// - `seed`: seed of the indicator draw shared by all gammas.
///
/// Invariants
/// ----------
/// - `gammas` is non-empty and `values` is finite. The match between
///   `values.len()` and the number of sample paths is checked against a
///   concrete series by [`ContaminationConfig::validate_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminationConfig {
    pub values: Array1<f64>,
    pub gammas: Vec<f64>,
    pub patch_length: usize,
    pub seed: u64,
}

impl ContaminationConfig {
    /// Build a config with isolated (length-1) outliers and the default seed.
    ///
    /// # Errors
    /// - [`DataError::EmptyGammas`] when `gammas` is empty.
    /// - [`DataError::InvalidGamma`] for a rate outside `[0, 1)`.
    /// - [`DataError::NonFiniteContamination`] for a NaN/±inf value.
    pub fn new(values: Array1<f64>, gammas: Vec<f64>) -> DataResult<Self> {
        Self::with_patches(values, gammas, DEFAULT_PATCH_LENGTH, DEFAULT_CONTAMINATION_SEED)
    }

    pub fn with_patches(
        values: Array1<f64>, gammas: Vec<f64>, patch_length: usize, seed: u64,
    ) -> DataResult<Self> {
        let config = ContaminationConfig { values, gammas, patch_length, seed };
        config.validate()?;
        Ok(config)
    }

    /// Same patch length and seed, new values and gammas.
    pub fn replaced(&self, values: Array1<f64>, gammas: Vec<f64>) -> DataResult<Self> {
        Self::with_patches(values, gammas, self.patch_length, self.seed)
    }

    pub fn validate(&self) -> DataResult<()> {
        validate_gammas(&self.gammas)?;
        validate_values(&self.values, self.values.len())?;
        if self.patch_length == 0 {
            return Err(DataError::InvalidPatchLength { value: self.patch_length });
        }
        Ok(())
    }

    /// Validate against a series with `n_paths` sample paths.
    pub fn validate_for(&self, n_paths: usize) -> DataResult<()> {
        self.validate()?;
        validate_values(&self.values, n_paths)
    }
}

/// Check a gamma vector: non-empty, each entry in `[0, 1)`.
pub fn validate_gammas(gammas: &[f64]) -> DataResult<()> {
    if gammas.is_empty() {
        return Err(DataError::EmptyGammas);
    }
    gammas.iter().enumerate().try_for_each(|(i, &g)| validate_gamma(i, g))
}

/// `n` i.i.d. standard-normal contaminating values.
pub fn standard_normal_values<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array1<f64> {
    // N(0, 1) parameters are always valid.
    let normal = Normal::standard();
    Array1::from_shape_simple_fn(n, || normal.sample(rng))
}

/// `[0.00, step, 2·step, …]` with `count` entries, the tutorial's gamma grid.
pub fn gamma_grid(count: usize, step: f64) -> Vec<f64> {
    (0..count).map(|k| k as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;
    use ndarray::array;

    #[test]
    fn empty_gammas_are_rejected() {
        let err = ContaminationConfig::new(array![1.0], vec![]).unwrap_err();
        assert_eq!(err, DataError::EmptyGammas);
    }

    #[test]
    fn single_gamma_is_accepted() {
        let cfg = ContaminationConfig::new(array![1.0, -1.0], vec![0.05]).unwrap();
        assert_eq!(cfg.gammas.len(), 1);
        assert!(cfg.validate_for(2).is_ok());
        assert!(matches!(
            cfg.validate_for(3),
            Err(DataError::ContaminationLengthMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // `replaced` keeps patch length and seed.
    fn replaced_preserves_patch_settings() {
        let cfg = ContaminationConfig::with_patches(array![0.0], vec![0.1], 4, 99).unwrap();

        let next = cfg.replaced(array![2.0], vec![0.2, 0.3]).unwrap();

        assert_eq!((next.patch_length, next.seed), (4, 99));
        assert_eq!(next.gammas, vec![0.2, 0.3]);
    }

    #[test]
    fn standard_normal_values_are_reproducible() {
        let a = standard_normal_values(16, &mut seeded_rng(42));
        let b = standard_normal_values(16, &mut seeded_rng(42));
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn gamma_grid_matches_tutorial() {
        let grid = gamma_grid(9, 0.01);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], 0.0);
        assert!((grid[8] - 0.08).abs() < 1e-15);
        assert!(validate_gammas(&grid).is_ok());
    }
}
