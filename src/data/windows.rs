//! Lag windowing — turn a multi-path series into `(x, y)` training pairs.
//!
//! Purpose
//! -------
//! Build the supervised view of a [`TimeSeries`] used by every forecaster:
//! for lag `L`, each pair has `x = series[p, t-L..t]` and `y = series[p, t]`.
//! Pairs are split per path in chronological order into train, validation,
//! and test partitions.
//!
//! Key behaviors
//! -------------
//! - [`build_dataset`] validates the lag, split ratios, and path selection,
//!   then produces owned partitions (no views into the series).
//! - [`lagged_pairs`] produces every pair of a series as one partition.
//! - `pairs_at` rebuilds pairs at given `(path, label time)` positions; the
//!   influence code uses it to read evaluation windows and the training
//!   positions out of contaminated series.
//!
//! Invariants & assumptions
//! ------------------------
//! - `1 ≤ L < N`; every selected path yields exactly `N - L` pairs spread
//!   over the three partitions.
//! - Partition rows are ordered by path, then by label time.
//! - Contaminating the source series later never alters an existing
//!   partition.
use crate::data::{
    errors::{DataError, DataResult},
    series::TimeSeries,
};
use ndarray::{Array1, Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};

/// Chronological split fractions; the test partition receives the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
}

impl SplitRatios {
    /// # Errors
    /// [`DataError::InvalidSplit`] unless both ratios are finite, `train > 0`,
    /// `validation ≥ 0`, and `train + validation ≤ 1`.
    pub fn new(train: f64, validation: f64) -> DataResult<Self> {
        if !train.is_finite() || !validation.is_finite() {
            return Err(DataError::InvalidSplit { train, validation, reason: "ratios must be finite" });
        }
        if train <= 0.0 {
            return Err(DataError::InvalidSplit { train, validation, reason: "train must be > 0" });
        }
        if validation < 0.0 {
            return Err(DataError::InvalidSplit {
                train,
                validation,
                reason: "validation must be >= 0",
            });
        }
        if train + validation > 1.0 + f64::EPSILON {
            return Err(DataError::InvalidSplit {
                train,
                validation,
                reason: "train + validation must not exceed 1",
            });
        }
        Ok(SplitRatios { train, validation })
    }

    /// Per-path partition sizes `(train, validation, test)` for `n` pairs.
    ///
    /// Train always keeps at least one pair.
    fn counts(&self, n: usize) -> (usize, usize, usize) {
        let n_train = ((self.train * n as f64).round() as usize).clamp(1, n);
        let n_val = ((self.validation * n as f64).round() as usize).min(n - n_train);
        (n_train, n_val, n - n_train - n_val)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        SplitRatios { train: 0.7, validation: 0.15 }
    }
}

/// Windowing configuration: lag, split, and optional sample-path selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub lag: usize,
    pub split: SplitRatios,
    /// `None` selects every path.
    pub paths: Option<Vec<usize>>,
}

impl WindowConfig {
    pub fn new(lag: usize, split: SplitRatios, paths: Option<Vec<usize>>) -> DataResult<Self> {
        if lag == 0 {
            return Err(DataError::InvalidLag { lag, len: 0 });
        }
        if let Some(p) = &paths {
            if p.is_empty() {
                return Err(DataError::EmptyPathSelection);
            }
        }
        Ok(WindowConfig { lag, split, paths })
    }

    /// All paths, default split.
    pub fn with_lag(lag: usize) -> DataResult<Self> {
        Self::new(lag, SplitRatios::default(), None)
    }

    fn selected_paths(&self, n_paths: usize) -> DataResult<Vec<usize>> {
        match &self.paths {
            None => Ok((0..n_paths).collect()),
            Some(paths) => {
                for &index in paths {
                    if index >= n_paths {
                        return Err(DataError::PathOutOfRange { index, n_paths });
                    }
                }
                Ok(paths.clone())
            }
        }
    }
}

/// Owned `(x, y)` pairs plus their provenance.
///
/// Fields
/// ------
/// - `inputs`: `n × L`; row `i` is `series[path_index[i], t-L..t]`.
/// - `labels`: length `n`; `labels[i] = series[path_index[i], time_index[i]]`.
/// - `path_index`, `time_index`: provenance of each pair (label position).
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub inputs: Array2<f64>,
    pub labels: Array1<f64>,
    pub path_index: Vec<usize>,
    pub time_index: Vec<usize>,
}

impl Partition {
    fn empty(lag: usize) -> Self {
        Partition {
            inputs: Array2::zeros((0, lag)),
            labels: Array1::zeros(0),
            path_index: Vec::new(),
            time_index: Vec::new(),
        }
    }

    fn from_rows(lag: usize, rows: Vec<(usize, usize)>, series: &TimeSeries) -> Self {
        if rows.is_empty() {
            return Self::empty(lag);
        }
        let n = rows.len();
        let values = series.values();
        let mut inputs = Array2::<f64>::zeros((n, lag));
        let mut labels = Array1::<f64>::zeros(n);
        let mut path_index = Vec::with_capacity(n);
        let mut time_index = Vec::with_capacity(n);
        for (i, &(p, t)) in rows.iter().enumerate() {
            inputs.row_mut(i).assign(&values.slice(s![p, t - lag..t]));
            labels[i] = values[[p, t]];
            path_index.push(p);
            time_index.push(t);
        }
        Partition { inputs, labels, path_index, time_index }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn lag(&self) -> usize {
        self.inputs.ncols()
    }

    /// Input window of pair `i`.
    pub fn input(&self, i: usize) -> ArrayView1<'_, f64> {
        self.inputs.row(i)
    }
}

/// Train / validation / test partitions for one lag.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub lag: usize,
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
}

impl Dataset {
    /// Total number of pairs across the three partitions.
    pub fn total_pairs(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Build chronological train/validation/test partitions from `series`.
///
/// For each selected path the `N - L` label times `L..N` are split in
/// order: the first `round(train · (N - L))` go to train, the next
/// `round(validation · (N - L))` to validation, the rest to test.
///
/// # Errors
/// - [`DataError::InvalidLag`] when `lag == 0` or `lag ≥ N`.
/// - [`DataError::PathOutOfRange`] for a bad path selection.
pub fn build_dataset(series: &TimeSeries, config: &WindowConfig) -> DataResult<Dataset> {
    let lag = config.lag;
    let len = series.len();
    validate_lag(lag, len)?;
    let paths = config.selected_paths(series.n_paths())?;
    let (n_train, n_val, _) = config.split.counts(len - lag);

    let mut train_rows = Vec::with_capacity(paths.len() * n_train);
    let mut val_rows = Vec::with_capacity(paths.len() * n_val);
    let mut test_rows = Vec::new();
    for &p in &paths {
        for (k, t) in (lag..len).enumerate() {
            if k < n_train {
                train_rows.push((p, t));
            } else if k < n_train + n_val {
                val_rows.push((p, t));
            } else {
                test_rows.push((p, t));
            }
        }
    }
    Ok(Dataset {
        lag,
        train: Partition::from_rows(lag, train_rows, series),
        validation: Partition::from_rows(lag, val_rows, series),
        test: Partition::from_rows(lag, test_rows, series),
    })
}

/// Every `(x, y)` pair of `series` (all paths, all label times) in one partition.
///
/// # Errors
/// [`DataError::InvalidLag`] when `lag == 0` or `lag ≥ N`.
pub fn lagged_pairs(series: &TimeSeries, lag: usize) -> DataResult<Partition> {
    validate_lag(lag, series.len())?;
    let rows = (0..series.n_paths()).flat_map(|p| (lag..series.len()).map(move |t| (p, t))).collect();
    Ok(Partition::from_rows(lag, rows, series))
}

/// Pairs for the given `(path, label_time)` positions, in the given order.
///
/// Callers are responsible for `lag ≤ t < N` on every position.
pub(crate) fn pairs_at(series: &TimeSeries, lag: usize, rows: &[(usize, usize)]) -> Partition {
    Partition::from_rows(lag, rows.to_vec(), series)
}

fn validate_lag(lag: usize, len: usize) -> DataResult<()> {
    if lag == 0 || lag >= len {
        return Err(DataError::InvalidLag { lag, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn ramp_series(n_paths: usize, len: usize) -> TimeSeries {
        let values =
            Array2::from_shape_fn((n_paths, len), |(p, t)| (100 * p + t) as f64);
        TimeSeries::new(values).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover pair counts, chronological splitting, error paths,
    // position lookups, and the no-aliasing guarantee of partitions.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Every path contributes exactly N - L pairs across the partitions.
    //
    // Given
    // -----
    // - 3 paths × 20 timestamps and lags 1, 2, 5, 19.
    //
    // Expect
    // ------
    // - `total_pairs == 3 · (20 - L)` and each path appears `20 - L` times.
    fn pairs_per_path_equals_len_minus_lag() {
        let series = ramp_series(3, 20);
        for lag in [1, 2, 5, 19] {
            let config = WindowConfig::with_lag(lag).unwrap();

            let ds = build_dataset(&series, &config).unwrap();

            assert_eq!(ds.total_pairs(), 3 * (20 - lag));
            for p in 0..3 {
                let count = [&ds.train, &ds.validation, &ds.test]
                    .iter()
                    .map(|part| part.path_index.iter().filter(|&&q| q == p).count())
                    .sum::<usize>();
                assert_eq!(count, 20 - lag);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Inputs are the L preceding values and labels the next value.
    fn windows_hold_preceding_values_and_next_label() {
        let series = ramp_series(2, 6);
        let part = lagged_pairs(&series, 2).unwrap();

        // Path 1 starts at row 4 (4 pairs per path).
        assert_eq!(part.input(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(part.labels[0], 2.0);
        assert_eq!(part.input(4).to_vec(), vec![100.0, 101.0]);
        assert_eq!(part.labels[4], 102.0);
        assert_eq!((part.path_index[4], part.time_index[4]), (1, 2));
    }

    #[test]
    // Purpose
    // -------
    // Splits are chronological per path.
    //
    // Expect
    // ------
    // - Every train label time precedes every validation label time, which
    //   precedes every test label time, for the same path.
    fn split_is_chronological() {
        let series = ramp_series(1, 42);
        let config = WindowConfig::new(2, SplitRatios::new(0.5, 0.25).unwrap(), None).unwrap();

        let ds = build_dataset(&series, &config).unwrap();

        assert_eq!((ds.train.len(), ds.validation.len(), ds.test.len()), (20, 10, 10));
        let max_train = ds.train.time_index.iter().max().unwrap();
        let min_val = ds.validation.time_index.iter().min().unwrap();
        let max_val = ds.validation.time_index.iter().max().unwrap();
        let min_test = ds.test.time_index.iter().min().unwrap();
        assert!(max_train < min_val && max_val < min_test);
    }

    #[test]
    fn lag_not_below_length_is_config_error() {
        let series = ramp_series(1, 5);
        let config = WindowConfig::with_lag(5).unwrap();
        assert_eq!(
            build_dataset(&series, &config).unwrap_err(),
            DataError::InvalidLag { lag: 5, len: 5 }
        );
        assert!(matches!(WindowConfig::with_lag(0), Err(DataError::InvalidLag { .. })));
    }

    #[test]
    fn path_selection_out_of_range_is_rejected() {
        let series = ramp_series(2, 10);
        let config = WindowConfig::new(2, SplitRatios::default(), Some(vec![0, 2])).unwrap();
        assert_eq!(
            build_dataset(&series, &config).unwrap_err(),
            DataError::PathOutOfRange { index: 2, n_paths: 2 }
        );
    }

    #[test]
    fn invalid_split_ratios_are_rejected() {
        assert!(SplitRatios::new(0.0, 0.1).is_err());
        assert!(SplitRatios::new(0.8, 0.3).is_err());
        assert!(SplitRatios::new(f64::NAN, 0.1).is_err());
        assert!(SplitRatios::new(1.0, 0.0).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Partitions are owned copies: building a new series afterwards leaves
    // an existing partition untouched.
    fn partitions_do_not_alias_the_series() {
        let values = array![[1.0, 2.0, 3.0, 4.0]];
        let series = TimeSeries::new(values.clone()).unwrap();
        let part = lagged_pairs(&series, 1).unwrap();

        let mut changed = values;
        changed[[0, 0]] = 99.0;
        let _other = TimeSeries::new(changed).unwrap();

        assert_eq!(part.input(0).to_vec(), vec![1.0]);
    }

    #[test]
    // Purpose
    // -------
    // `pairs_at` reads exactly the requested `(path, label time)` positions,
    // in the given order, as the influence code expects for evaluation
    // windows.
    fn pairs_at_reads_requested_positions() {
        let series = ramp_series(2, 10);

        let part = pairs_at(&series, 3, &[(1, 5), (0, 9), (1, 3)]);

        assert_eq!(part.len(), 3);
        assert_eq!(part.path_index, vec![1, 0, 1]);
        assert_eq!(part.time_index, vec![5, 9, 3]);
        for i in 0..part.len() {
            let (p, t) = (part.path_index[i], part.time_index[i]);
            assert_eq!(part.labels[i], series.values()[[p, t]]);
            assert_eq!(part.input(i).to_vec(), series.values().slice(s![p, t - 3..t]).to_vec());
        }
    }
}
