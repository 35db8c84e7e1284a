//! Contamination generator — mix a clean series with a contaminating process.
//!
//! Purpose
//! -------
//! Produce the "observed" series `Y` from a clean series `X`, one
//! contaminating value per sample path, and a per-step indicator matrix:
//! `Y[p, t] = values[p]` where the indicator is set, `X[p, t]` otherwise.
//!
//! Key behaviors
//! -------------
//! - [`contaminate`] applies an indicator matrix; it never touches the input.
//! - [`ContaminationDraw`] holds one uniform draw per `(path, t)` so that the
//!   indicators for several rates γ are nested: a position contaminated at
//!   `γ₁` is contaminated at every `γ₂ ≥ γ₁`.
//! - Patchy outliers: a patch starts at `(p, t)` when `u[p, t] < γ / k`
//!   and covers `k = patch_length` consecutive steps (clipped at the end of
//!   the path), so the expected contaminated fraction stays close to `γ`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output shape equals input shape; positions with a false indicator are
//!   copied bit-for-bit.
//! - All randomness comes from the caller's RNG handle.
use crate::data::{
    errors::{DataError, DataResult},
    series::TimeSeries,
};
use ndarray::{Array1, Array2, Zip};
use rand::Rng;

/// Replace `series[p, t]` with `values[p]` wherever `indicators[p, t]` is set.
///
/// # Errors
/// - [`DataError::ContaminationLengthMismatch`] if `values.len() != n_paths`.
/// - [`DataError::ShapeMismatch`] if `indicators` is not `(n_paths, len)`.
/// - [`DataError::NonFiniteContamination`] for a NaN/±inf value.
pub fn contaminate(
    series: &TimeSeries, values: &Array1<f64>, indicators: &Array2<bool>,
) -> DataResult<TimeSeries> {
    validate_values(values, series.n_paths())?;
    if indicators.dim() != series.shape() {
        return Err(DataError::ShapeMismatch { expected: series.shape(), found: indicators.dim() });
    }
    let mut out = series.values().clone();
    Zip::indexed(&mut out).and(indicators).for_each(|(p, _), y, &hit| {
        if hit {
            *y = values[p];
        }
    });
    TimeSeries::with_path_ids(out, series.path_ids().map(<[String]>::to_vec))
}

/// Check a contaminating-value vector against the number of sample paths.
pub(crate) fn validate_values(values: &Array1<f64>, n_paths: usize) -> DataResult<()> {
    if values.len() != n_paths {
        return Err(DataError::ContaminationLengthMismatch { expected: n_paths, actual: values.len() });
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DataError::NonFiniteContamination { index, value });
    }
    Ok(())
}

/// One uniform draw per `(path, t)` shared by every contamination rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ContaminationDraw {
    uniforms: Array2<f64>,
}

impl ContaminationDraw {
    /// Draw `U(0, 1)` variates for an `(n_paths × len)` series.
    pub fn new<R: Rng + ?Sized>(n_paths: usize, len: usize, rng: &mut R) -> Self {
        let uniforms = Array2::from_shape_simple_fn((n_paths, len), || rng.gen::<f64>());
        ContaminationDraw { uniforms }
    }

    /// Wrap externally supplied uniforms (e.g. labels converted upstream).
    pub fn from_uniforms(uniforms: Array2<f64>) -> Self {
        ContaminationDraw { uniforms }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.uniforms.dim()
    }

    /// Indicator matrix for rate `gamma` and patches of `patch_length` steps.
    ///
    /// # Errors
    /// - [`DataError::InvalidGamma`] unless `0 ≤ gamma < 1`.
    /// - [`DataError::InvalidPatchLength`] when `patch_length == 0`.
    pub fn indicators(&self, gamma: f64, patch_length: usize) -> DataResult<Array2<bool>> {
        validate_gamma(0, gamma)?;
        if patch_length == 0 {
            return Err(DataError::InvalidPatchLength { value: patch_length });
        }
        let threshold = gamma / patch_length as f64;
        let starts = self.uniforms.mapv(|u| u < threshold);
        if patch_length == 1 {
            return Ok(starts);
        }
        let (n_paths, len) = self.shape();
        let mut out = Array2::from_elem((n_paths, len), false);
        for p in 0..n_paths {
            // Steps left in the currently open patch.
            let mut remaining = 0usize;
            for t in 0..len {
                if starts[[p, t]] {
                    remaining = patch_length;
                }
                if remaining > 0 {
                    out[[p, t]] = true;
                    remaining -= 1;
                }
            }
        }
        Ok(out)
    }

    /// Contaminate `series` at rate `gamma` using this draw.
    ///
    /// # Errors
    /// As [`ContaminationDraw::indicators`] and [`contaminate`], plus
    /// [`DataError::ShapeMismatch`] when the draw does not match the series.
    pub fn apply(
        &self, series: &TimeSeries, values: &Array1<f64>, gamma: f64, patch_length: usize,
    ) -> DataResult<TimeSeries> {
        if self.shape() != series.shape() {
            return Err(DataError::ShapeMismatch { expected: series.shape(), found: self.shape() });
        }
        let indicators = self.indicators(gamma, patch_length)?;
        contaminate(series, values, &indicators)
    }
}

/// Draw a fresh indicator matrix for one rate.
pub fn sample_indicators<R: Rng + ?Sized>(
    n_paths: usize, len: usize, gamma: f64, patch_length: usize, rng: &mut R,
) -> DataResult<Array2<bool>> {
    ContaminationDraw::new(n_paths, len, rng).indicators(gamma, patch_length)
}

/// Fraction of set indicators; handy for diagnostics and tests.
pub fn contaminated_fraction(indicators: &Array2<bool>) -> f64 {
    if indicators.is_empty() {
        return 0.0;
    }
    let mut hits = 0usize;
    Zip::from(indicators).for_each(|&b| hits += usize::from(b));
    hits as f64 / indicators.len() as f64
}

pub(crate) fn validate_gamma(index: usize, value: f64) -> DataResult<()> {
    if !(value.is_finite() && (0.0..1.0).contains(&value)) {
        return Err(DataError::InvalidGamma { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;
    use ndarray::array;

    fn clean_series() -> TimeSeries {
        TimeSeries::new(Array2::from_shape_fn((3, 40), |(p, t)| p as f64 + 0.01 * t as f64)).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Identity on untouched positions, nesting across rates, patch semantics,
    // and validation of contaminating values and rates.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Positions with a false indicator are copied exactly; set positions take
    // the path's contaminating value.
    //
    // Given
    // -----
    // - A 3-path series, random indicators at γ = 0.3, values [10, 20, 30].
    //
    // Expect
    // ------
    // - Same shape; Y == X off the indicators; Y == values[p] on them.
    // - The input series is unchanged.
    fn contaminate_is_identity_off_indicators() {
        let series = clean_series();
        let before = series.clone();
        let values = array![10.0, 20.0, 30.0];
        let mut rng = seeded_rng(3);
        let ind = sample_indicators(3, 40, 0.3, 1, &mut rng).unwrap();

        let y = contaminate(&series, &values, &ind).unwrap();

        assert_eq!(y.shape(), series.shape());
        assert_eq!(series, before);
        for ((p, t), &hit) in ind.indexed_iter() {
            let expected = if hit { values[p] } else { series.values()[[p, t]] };
            assert_eq!(y.values()[[p, t]].to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn zero_gamma_leaves_series_unchanged() {
        let series = clean_series();
        let draw = ContaminationDraw::new(3, 40, &mut seeded_rng(1));

        let y = draw.apply(&series, &array![5.0, 5.0, 5.0], 0.0, 3).unwrap();

        assert_eq!(y, series);
    }

    #[test]
    // Purpose
    // -------
    // Indicators from one draw are nested in γ.
    fn indicators_are_monotone_in_gamma() {
        let draw = ContaminationDraw::new(4, 200, &mut seeded_rng(11));
        let low = draw.indicators(0.02, 2).unwrap();
        let high = draw.indicators(0.08, 2).unwrap();

        for (a, b) in low.iter().zip(high.iter()) {
            assert!(!*a || *b);
        }
        assert!(contaminated_fraction(&high) >= contaminated_fraction(&low));
    }

    #[test]
    // Purpose
    // -------
    // A patch start covers `patch_length` consecutive steps, clipped at the end.
    fn patch_covers_consecutive_steps() {
        // Starts at t = 1 and t = 4 (u = 0.0 < γ/k) on a length-5 path.
        let draw = ContaminationDraw::from_uniforms(array![[0.9, 0.0, 0.9, 0.9, 0.0]]);

        let ind = draw.indicators(0.5, 2).unwrap();

        assert_eq!(ind.row(0).to_vec(), vec![false, true, true, false, true]);
    }

    #[test]
    fn mismatched_values_are_rejected() {
        let series = clean_series();
        let ind = Array2::from_elem((3, 40), false);
        let err = contaminate(&series, &array![1.0, 2.0], &ind).unwrap_err();
        assert_eq!(err, DataError::ContaminationLengthMismatch { expected: 3, actual: 2 });

        let bad = contaminate(&series, &array![1.0, f64::INFINITY, 2.0], &ind).unwrap_err();
        assert!(matches!(bad, DataError::NonFiniteContamination { index: 1, .. }));
    }

    #[test]
    fn indicator_shape_mismatch_is_rejected() {
        let series = clean_series();
        let ind = Array2::from_elem((3, 39), false);
        let err = contaminate(&series, &array![1.0, 2.0, 3.0], &ind).unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { .. }));
    }

    #[test]
    fn gamma_outside_unit_interval_is_rejected() {
        let draw = ContaminationDraw::new(1, 5, &mut seeded_rng(0));
        assert!(matches!(draw.indicators(1.0, 1), Err(DataError::InvalidGamma { .. })));
        assert!(matches!(draw.indicators(-0.1, 1), Err(DataError::InvalidGamma { .. })));
        assert!(matches!(draw.indicators(0.1, 0), Err(DataError::InvalidPatchLength { .. })));
    }
}
