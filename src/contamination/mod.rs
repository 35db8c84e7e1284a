//! contamination — outlier processes mixed into clean series.
//!
//! Purpose
//! -------
//! Build contaminated versions of a [`TimeSeries`](crate::data::TimeSeries)
//! in which some observations are replaced by a per-path contaminating
//! value, either at random with probability γ per step (optionally in
//! patches) or from a caller-supplied indicator matrix.
//!
//! Key behaviors
//! -------------
//! - [`contaminate`] is the pure replacement primitive.
//! - [`ContaminationDraw`] shares one uniform draw across rates so that the
//!   contaminated sets are nested in γ.
//! - [`ContaminationConfig`] carries the values, gammas, patch length, and
//!   seed that `explain_instance` uses.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are never mutated; outputs keep the input shape exactly.
//! - Randomness only through explicit RNG handles.

pub mod config;
pub mod generator;

pub use self::config::{
    ContaminationConfig, DEFAULT_CONTAMINATION_SEED, DEFAULT_PATCH_LENGTH, gamma_grid,
    standard_normal_values, validate_gammas,
};
pub use self::generator::{ContaminationDraw, contaminate, contaminated_fraction, sample_indicators};
