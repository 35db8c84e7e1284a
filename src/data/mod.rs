//! data — validated time series and lag-window datasets.
//!
//! Purpose
//! -------
//! Own the raw observations ([`TimeSeries`]) and their supervised view
//! ([`Dataset`] of [`Partition`]s) that forecasters train on and the
//! influence code differentiates through.
//!
//! Key behaviors
//! -------------
//! - Validate series on construction (non-empty, finite, consistent path
//!   identifiers) and persist them as lossless JSON.
//! - Simulate reproducible AR(p) sample paths ([`ArProcess`]).
//! - Build chronological train/validation/test partitions for a lag `L`
//!   ([`build_dataset`]) or a single partition with every pair
//!   ([`lagged_pairs`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Series are `(sample_paths × timestamps)`; every selected path yields
//!   exactly `N - L` pairs.
//! - Partitions own their arrays; nothing here holds a view into a series.
//!
//! Conventions
//! -----------
//! - 0-based indices; `time_index` of a pair is the position of its label.
//! - No logging; failures are reported through [`DataResult`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; the pipeline integration test
//!   exercises windowing on simulated data.

pub mod errors;
pub mod series;
pub mod windows;

pub use self::errors::{DataError, DataResult};
pub use self::series::{ArProcess, TimeSeries};
pub use self::windows::{Dataset, Partition, SplitRatios, WindowConfig, build_dataset, lagged_pairs};
