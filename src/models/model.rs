//! `TimeSeriesModel` — a forecaster bound to its data, parameters, and
//! contamination settings.
//!
//! Lifecycle
//! ---------
//! `new` (untrained) → `train` or `restore` (ready) → read-only use through
//! `predict`, `evaluate`, and `explain_instance` → optional `save`.
//! Contamination settings change only through `update_configure` /
//! `update_contamination`; neither touches trained parameters.
//!
//! Every mutating method validates its inputs first and leaves the model
//! unchanged on error.
use crate::{
    contamination::config::ContaminationConfig,
    data::{
        series::TimeSeries,
        windows::{Dataset, Partition, WindowConfig, build_dataset},
    },
    influence::{
        cg::{SolveOutcome, SolverOptions},
        sif::{EvaluationWindow, InfluenceContext, SIFExplanation},
    },
    models::{
        architecture::Architecture,
        checkpoint::Checkpoint,
        errors::{ModelError, ModelResult},
        traits::Forecaster,
        training::{RegularizedMse, TrainOptions, TrainReport, fit},
    },
    optimization::{
        lbfgs::{MLEOptions, OptimOutcome, Theta, minimize},
        stochastic::Schedule,
    },
    seeded_rng,
};
use log::info;
use ndarray::{Array1, ArrayView1};
use std::path::Path;

/// Where the current parameters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Untrained,
    Trained,
    Restored,
}

#[derive(Debug, Clone)]
pub struct TimeSeriesModel<F: Forecaster> {
    forecaster: F,
    params: Theta,
    damping: f64,
    series: TimeSeries,
    window: WindowConfig,
    dataset: Dataset,
    contamination: Option<ContaminationConfig>,
    train_options: TrainOptions,
    solver_options: SolverOptions,
    state: ModelState,
}

fn validate_damping(value: f64) -> ModelResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ModelError::InvalidDamping { value });
    }
    Ok(())
}

impl<F: Forecaster> TimeSeriesModel<F> {
    /// Bind `forecaster` to `series` windowed by `window`.
    ///
    /// # Errors
    /// - [`ModelError::InvalidDamping`] unless `damping` is finite and ≥ 0.
    /// - [`ModelError::LagMismatch`] when the forecaster and window lags differ.
    /// - [`ModelError::InvalidArchitecture`] for an unusable forecaster.
    /// - [`ModelError::Data`] from [`build_dataset`].
    pub fn new(forecaster: F, series: TimeSeries, window: WindowConfig, damping: f64) -> ModelResult<Self> {
        validate_damping(damping)?;
        forecaster.architecture().validate()?;
        if forecaster.lag() != window.lag {
            return Err(ModelError::LagMismatch { expected: forecaster.lag(), found: window.lag });
        }
        let dataset = build_dataset(&series, &window)?;
        let params = Theta::zeros(forecaster.n_params());
        Ok(TimeSeriesModel {
            forecaster,
            params,
            damping,
            series,
            window,
            dataset,
            contamination: None,
            train_options: TrainOptions::default(),
            solver_options: SolverOptions::default(),
            state: ModelState::Untrained,
        })
    }

    /// # Errors
    /// Option validation errors.
    pub fn with_train_options(mut self, options: TrainOptions) -> ModelResult<Self> {
        options.validate()?;
        self.train_options = options;
        Ok(self)
    }

    pub fn with_solver_options(mut self, options: SolverOptions) -> Self {
        self.solver_options = options;
        self
    }

    pub fn forecaster(&self) -> &F {
        &self.forecaster
    }

    /// Current parameters; `None` before `train`/`restore`.
    pub fn params(&self) -> Option<&Theta> {
        self.is_ready().then_some(&self.params)
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state != ModelState::Untrained
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn contamination(&self) -> Option<&ContaminationConfig> {
        self.contamination.as_ref()
    }

    pub fn train_options(&self) -> &TrainOptions {
        &self.train_options
    }

    pub fn solver_options(&self) -> &SolverOptions {
        &self.solver_options
    }

    fn require_ready(&self, operation: &'static str) -> ModelResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ModelError::NotReady { operation })
        }
    }

    /// Train with the three-phase schedule.
    ///
    /// An untrained model starts from `init_params` drawn with
    /// `train_options.seed`; a trained or restored model continues from its
    /// current parameters. Parameters are replaced only if the run succeeds.
    ///
    /// # Errors
    /// [`ModelError::Opt`] for schedule/option errors and divergence.
    pub fn train(
        &mut self, steps: usize, switch_to_batch_at: usize, switch_to_sgd_at: usize,
    ) -> ModelResult<TrainReport> {
        let schedule = Schedule::new(steps, switch_to_batch_at, switch_to_sgd_at)?;
        let mut rng = seeded_rng(self.train_options.seed);
        let theta0 = match self.state {
            ModelState::Untrained => self.forecaster.init_params(&mut rng),
            ModelState::Trained | ModelState::Restored => self.params.clone(),
        };
        let (theta, mut report) = fit(
            &self.forecaster,
            theta0,
            &self.dataset.train,
            self.damping,
            &schedule,
            &self.train_options,
            &mut rng,
        )?;
        let validation = &self.dataset.validation;
        report.validation_loss = (!validation.is_empty())
            .then(|| self.forecaster.loss(&theta, validation.inputs.view(), validation.labels.view()));
        info!(
            "{}: trained {} steps ({} epochs) in {:.3?}; train MSE {:.6e}",
            self.forecaster.name(),
            report.steps_run,
            report.epochs,
            report.elapsed,
            report.train_loss
        );
        self.params = theta;
        self.state = ModelState::Trained;
        Ok(report)
    }

    /// Polish the current parameters with full-batch L-BFGS on the
    /// regularized training objective.
    ///
    /// # Errors
    /// - [`ModelError::NotReady`] before `train`/`restore`.
    /// - [`ModelError::Opt`] for solver failures.
    pub fn refine(&mut self, options: &MLEOptions) -> ModelResult<OptimOutcome> {
        self.require_ready("refine")?;
        let objective = RegularizedMse::new(&self.forecaster, self.damping);
        let outcome = minimize(&objective, self.params.clone(), &self.dataset.train, options)?;
        info!(
            "{}: L-BFGS refinement {} after {} iterations; objective {:.6e}",
            self.forecaster.name(),
            outcome.status,
            outcome.iterations,
            outcome.value
        );
        self.params = outcome.theta_hat.clone();
        self.state = ModelState::Trained;
        Ok(outcome)
    }

    /// # Errors
    /// - [`ModelError::NotReady`] before `train`/`restore`.
    /// - [`ModelError::Io`] on write failure.
    pub fn save(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        self.require_ready("save")?;
        Checkpoint::new(self.forecaster.architecture(), self.damping, &self.params).save(path)
    }

    /// Overwrite parameters and damping from a checkpoint.
    ///
    /// # Errors
    /// - [`ModelError::NotFound`], [`ModelError::Io`],
    ///   [`ModelError::CheckpointFormat`], [`ModelError::UnsupportedVersion`].
    /// - [`ModelError::ArchitectureMismatch`] when the checkpoint was written
    ///   for a different forecaster.
    /// - [`ModelError::Opt`] for a wrong-length or non-finite parameter vector.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> ModelResult<()> {
        let checkpoint = Checkpoint::load(path.as_ref())?;
        let expected = self.forecaster.architecture();
        if checkpoint.architecture != expected {
            return Err(ModelError::ArchitectureMismatch {
                expected: expected.to_string(),
                found: checkpoint.architecture.to_string(),
            });
        }
        validate_damping(checkpoint.damping)?;
        let theta = checkpoint.theta();
        self.forecaster.check_params(&theta)?;
        info!("{}: restored parameters from {}", self.forecaster.name(), path.as_ref().display());
        self.params = theta;
        self.damping = checkpoint.damping;
        self.state = ModelState::Restored;
        Ok(())
    }

    /// Replace contaminating values and gammas; patch length and sampling
    /// seed of an existing configuration are kept.
    ///
    /// The first call creates a configuration with
    /// [`DEFAULT_PATCH_LENGTH`](crate::contamination::DEFAULT_PATCH_LENGTH)
    /// (isolated single-step outliers). Use [`Self::update_contamination`]
    /// with [`ContaminationConfig::with_patches`] for multi-step patches.
    ///
    /// # Errors
    /// [`ModelError::Data`] for empty/invalid gammas, non-finite values, or a
    /// value count different from the number of sample paths.
    pub fn update_configure(&mut self, values: Array1<f64>, gammas: Vec<f64>) -> ModelResult<()> {
        let config = match &self.contamination {
            Some(current) => current.replaced(values, gammas)?,
            None => ContaminationConfig::new(values, gammas)?,
        };
        self.update_contamination(config)
    }

    /// Replace the whole contamination configuration.
    ///
    /// # Errors
    /// As [`Self::update_configure`], plus an invalid patch length.
    pub fn update_contamination(&mut self, config: ContaminationConfig) -> ModelResult<()> {
        config.validate_for(self.series.n_paths())?;
        self.contamination = Some(config);
        Ok(())
    }

    /// Compute the SIF of the configured contaminating process over
    /// `[target_index, target_index + horizon)`.
    ///
    /// `contaminating_values` overrides the configured values for this call
    /// only. `baseline` defaults to the clean series.
    ///
    /// Outliers follow the configured patch length. A configuration made
    /// only through [`Self::update_configure`] has patch length 1, so every
    /// contaminated position is an isolated point and `patchy_pred_gamma`
    /// is the point-outlier response.
    ///
    /// # Errors
    /// - [`ModelError::NotReady`] before `train`/`restore`.
    /// - [`ModelError::NotConfigured`] without a contamination configuration.
    /// - [`ModelError::Influence`] / [`ModelError::Data`] for invalid lag,
    ///   window, values, or baseline.
    /// - [`ModelError::NotConverged`] when the influence solve stops early;
    ///   the explanation from the best iterate is attached.
    pub fn explain_instance(
        &self, contaminating_values: Option<&Array1<f64>>, lag: usize, target_index: usize,
        baseline: Option<&TimeSeries>, horizon: usize, verbose: bool,
    ) -> ModelResult<SIFExplanation> {
        self.require_ready("explain_instance")?;
        let configured = self.contamination.as_ref().ok_or(ModelError::NotConfigured)?;
        let overridden;
        let config = match contaminating_values {
            Some(values) => {
                overridden = configured.replaced(values.clone(), configured.gammas.clone())?;
                &overridden
            }
            None => configured,
        };
        let window = EvaluationWindow::new(lag, target_index, horizon);
        let explanation = self.influence_context().explain(
            config,
            &window,
            baseline,
            &self.solver_options,
            verbose,
        )?;
        if !explanation.converged() {
            return Err(ModelError::NotConverged { partial: Box::new(explanation) });
        }
        if verbose {
            info!("{}: SIF = {:.6e} over {} gammas", self.forecaster.name(), explanation.sif, explanation.gammas.len());
        }
        Ok(explanation)
    }

    /// Influence of each training pair on the mean forecast over
    /// `[target_index, target_index + horizon)`, in training order.
    ///
    /// # Errors
    /// As [`Self::explain_instance`] for readiness and window validation. A
    /// non-converged solve is returned in the outcome, not as an error.
    pub fn training_point_influence(
        &self, target_index: usize, horizon: usize,
    ) -> ModelResult<(Array1<f64>, SolveOutcome)> {
        self.require_ready("training_point_influence")?;
        let window = EvaluationWindow::new(self.forecaster.lag(), target_index, horizon);
        Ok(self.influence_context().training_point_influence(&window, &self.solver_options)?)
    }

    fn influence_context(&self) -> InfluenceContext<'_, F> {
        InfluenceContext::new(&self.forecaster, &self.params, self.damping, &self.dataset.train, &self.series)
    }

    /// One-step forecast for a single lag window.
    ///
    /// # Errors
    /// [`ModelError::NotReady`], or [`ModelError::LagMismatch`] for a window
    /// of the wrong length.
    pub fn predict(&self, x: ArrayView1<'_, f64>) -> ModelResult<f64> {
        self.require_ready("predict")?;
        if x.len() != self.forecaster.lag() {
            return Err(ModelError::LagMismatch { expected: self.forecaster.lag(), found: x.len() });
        }
        Ok(self.forecaster.forecast(&self.params, x))
    }

    /// Forecasts for every pair of `partition`.
    ///
    /// # Errors
    /// As [`Self::predict`].
    pub fn predict_partition(&self, partition: &Partition) -> ModelResult<Array1<f64>> {
        self.require_ready("predict_partition")?;
        if partition.lag() != self.forecaster.lag() {
            return Err(ModelError::LagMismatch { expected: self.forecaster.lag(), found: partition.lag() });
        }
        Ok(self.forecaster.forecast_batch(&self.params, partition.inputs.view()))
    }

    /// Mean squared error on `partition` (`0.0` when empty).
    ///
    /// # Errors
    /// As [`Self::predict`].
    pub fn evaluate(&self, partition: &Partition) -> ModelResult<f64> {
        self.require_ready("evaluate")?;
        if partition.lag() != self.forecaster.lag() {
            return Err(ModelError::LagMismatch { expected: self.forecaster.lag(), found: partition.lag() });
        }
        Ok(self.forecaster.loss(&self.params, partition.inputs.view(), partition.labels.view()))
    }
}

impl TimeSeriesModel<Architecture> {
    /// Rebuild a model from a checkpoint without knowing its architecture
    /// in advance.
    ///
    /// # Errors
    /// As [`Checkpoint::load`], [`TimeSeriesModel::new`], and
    /// [`TimeSeriesModel::restore`].
    pub fn from_checkpoint(path: impl AsRef<Path>, series: TimeSeries, split: WindowConfig) -> ModelResult<Self> {
        let checkpoint = Checkpoint::load(path.as_ref())?;
        let forecaster = Architecture::from_spec(checkpoint.architecture)?;
        let window = WindowConfig { lag: checkpoint.lag, ..split };
        let mut model = TimeSeriesModel::new(forecaster, series, window, checkpoint.damping)?;
        model.restore(path)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ArProcess, SplitRatios};
    use crate::models::{ArForecaster, ArchitectureSpec, ErrorKind, RnnForecaster};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn simulated(paths: usize, len: usize) -> TimeSeries {
        let process = ArProcess::new(vec![0.5, 0.2], 0.0, 1.0).unwrap();
        TimeSeries::simulate_ar(&process, paths, len, &mut seeded_rng(21)).unwrap()
    }

    fn ar_model() -> TimeSeriesModel<ArForecaster> {
        let window = WindowConfig::new(2, SplitRatios::default(), None).unwrap();
        TimeSeriesModel::new(ArForecaster::new(2), simulated(8, 40), window, 1e-2).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Construction checks, lifecycle gating, contamination updates (atomic
    // on error), checkpoint round-trips, and explain/predict wiring.
    // -------------------------------------------------------------------------

    #[test]
    fn construction_rejects_bad_damping_and_lag() {
        let window = WindowConfig::with_lag(2).unwrap();
        let err = TimeSeriesModel::new(ArForecaster::new(2), simulated(2, 20), window.clone(), -1.0).unwrap_err();
        assert_eq!(err, ModelError::InvalidDamping { value: -1.0 });
        let err = TimeSeriesModel::new(ArForecaster::new(3), simulated(2, 20), window, 0.1).unwrap_err();
        assert_eq!(err, ModelError::LagMismatch { expected: 3, found: 2 });
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    // Purpose
    // -------
    // Every read-only operation is gated on a trained or restored model.
    fn untrained_model_is_not_ready() {
        let mut model = ar_model();
        model.update_configure(Array1::zeros(8), vec![0.0, 0.1]).unwrap();

        let err = model.explain_instance(None, 2, 30, None, 2, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert_eq!(model.predict(array![0.0, 1.0].view()).unwrap_err().kind(), ErrorKind::NotReady);
        assert!(model.save("unused.json").is_err());
        assert!(model.params().is_none());
    }

    #[test]
    // Purpose
    // -------
    // A rejected update leaves the previous configuration in place.
    fn update_configure_is_atomic() {
        let mut model = ar_model();
        model.update_configure(Array1::from_elem(8, 2.0), vec![0.0, 0.05]).unwrap();
        let before = model.contamination().cloned();

        let err = model.update_configure(Array1::from_elem(8, 2.0), vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = model.update_configure(Array1::from_elem(3, 2.0), vec![0.1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        assert_eq!(model.contamination().cloned(), before);
    }

    #[test]
    fn update_configure_keeps_patch_length_and_seed() {
        let mut model = ar_model();
        let config = ContaminationConfig::with_patches(Array1::zeros(8), vec![0.1], 3, 42).unwrap();
        model.update_contamination(config).unwrap();
        model.update_configure(Array1::ones(8), vec![0.2]).unwrap();
        let now = model.contamination().unwrap();
        assert_eq!((now.patch_length, now.seed), (3, 42));
        assert_eq!(now.gammas, vec![0.2]);
    }

    #[test]
    // Purpose
    // -------
    // `update_configure` alone yields isolated outliers; a patch length set
    // through `update_contamination` changes what `explain_instance` sees.
    //
    // Given
    // -----
    // - A trained AR(2) model, values of 6, gammas [0, 0.3].
    // - The same values, gammas, and seed with patches of 4 steps.
    //
    // Expect
    // ------
    // - The first configuration has patch length 1.
    // - The γ = 0.3 terms differ between the two configurations.
    fn explain_uses_point_outliers_until_a_patch_length_is_set() {
        // Arrange
        let mut model = ar_model();
        model.train(200, 50, 150).unwrap();
        let values = Array1::from_elem(8, 6.0);
        let gammas = vec![0.0, 0.3];
        model.update_configure(values.clone(), gammas.clone()).unwrap();
        let point = model.contamination().cloned().unwrap();

        // Act
        let isolated = model.explain_instance(None, 2, 30, None, 4, false).unwrap();
        let patches = ContaminationConfig::with_patches(values, gammas, 4, point.seed).unwrap();
        model.update_contamination(patches).unwrap();
        let patchy = model.explain_instance(None, 2, 30, None, 4, false).unwrap();

        // Assert
        assert_eq!(point.patch_length, crate::contamination::DEFAULT_PATCH_LENGTH);
        assert_eq!(point.patch_length, 1);
        assert_ne!(isolated.patchy_pred_gamma[1], patchy.patchy_pred_gamma[1]);
    }

    #[test]
    // Purpose
    // -------
    // save → restore reproduces parameters, damping, and explanations.
    fn save_restore_round_trip() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = ar_model();
        model.train(300, 100, 200).unwrap();
        model.update_configure(Array1::from_elem(8, 3.0), vec![0.0, 0.02, 0.04]).unwrap();
        model.save(&path).unwrap();

        // Act
        let mut restored = ar_model();
        restored.update_configure(Array1::from_elem(8, 3.0), vec![0.0, 0.02, 0.04]).unwrap();
        restored.restore(&path).unwrap();

        // Assert
        assert_eq!(restored.state(), ModelState::Restored);
        assert_eq!(restored.params(), model.params());
        let a = model.explain_instance(None, 2, 35, None, 3, false).unwrap();
        let b = restored.explain_instance(None, 2, 35, None, 3, false).unwrap();
        assert_eq!(a.sif, b.sif);
    }

    #[test]
    fn restore_rejects_missing_file_and_other_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = ar_model();
        let err = model.restore(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let path = dir.path().join("rnn.json");
        Checkpoint::new(ArchitectureSpec::Rnn { lag: 2, hidden: 2 }, 0.0, &Theta::zeros(11)).save(&path).unwrap();
        let err = model.restore(&path).unwrap_err();
        assert!(matches!(err, ModelError::ArchitectureMismatch { .. }));
        assert_eq!(model.state(), ModelState::Untrained);
    }

    #[test]
    fn from_checkpoint_rebuilds_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rnn.json");
        let rnn = RnnForecaster::new(2, 2);
        let theta = Theta::from_shape_fn(rnn.n_params(), |i| 0.01 * i as f64);
        Checkpoint::new(rnn.architecture(), 0.05, &theta).save(&path).unwrap();

        let model =
            TimeSeriesModel::from_checkpoint(&path, simulated(4, 30), WindowConfig::with_lag(1).unwrap()).unwrap();

        assert_eq!(model.forecaster().architecture(), rnn.architecture());
        assert_eq!(model.params(), Some(&theta));
        assert_relative_eq!(model.damping(), 0.05);
    }

    #[test]
    // Purpose
    // -------
    // explain_instance validates the request against the model.
    fn explain_validates_request() {
        let mut model = ar_model();
        model.train(50, 10, 40).unwrap();

        assert_eq!(
            model.explain_instance(None, 2, 30, None, 2, false).unwrap_err(),
            ModelError::NotConfigured
        );
        model.update_configure(Array1::zeros(8), vec![0.1]).unwrap();
        let err = model.explain_instance(None, 3, 30, None, 2, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = model.explain_instance(None, 2, 39, None, 5, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = model.explain_instance(Some(&array![1.0]), 2, 30, None, 2, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    // Purpose
    // -------
    // A one-iteration budget on a 3-parameter problem is reported as a
    // numerical error that still carries the partial explanation.
    fn non_converged_solve_returns_partial_result() {
        let mut model = ar_model()
            .with_solver_options(SolverOptions::new(1e-14, 1, None).unwrap());
        model.train(200, 50, 150).unwrap();
        model.update_configure(Array1::from_elem(8, 4.0), vec![0.0, 0.05]).unwrap();

        let err = model.explain_instance(None, 2, 30, None, 4, false).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Numerical);
        match err {
            ModelError::NotConverged { partial } => {
                assert!(!partial.converged());
                assert!(partial.sif.is_finite());
                assert_eq!(partial.solve.iterations, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn predict_and_evaluate_follow_parameters() {
        let mut model = ar_model();
        model.train(200, 50, 150).unwrap();
        let theta = model.params().unwrap().clone();

        let y = model.predict(array![1.0, 2.0].view()).unwrap();
        assert_relative_eq!(y, theta[0] + 2.0 * theta[1] + theta[2]);
        assert!(model.predict(array![1.0].view()).is_err());

        let test = model.dataset().test.clone();
        let preds = model.predict_partition(&test).unwrap();
        let mse = (&preds - &test.labels).mapv(|r| r * r).mean().unwrap();
        assert_relative_eq!(model.evaluate(&test).unwrap(), mse, epsilon = 1e-12);
    }

    #[test]
    fn refine_lowers_or_keeps_the_objective() {
        let mut model = ar_model();
        model.train(100, 50, 100).unwrap();
        let objective = |m: &TimeSeriesModel<ArForecaster>| {
            let train = &m.dataset().train;
            let theta = m.params().unwrap();
            m.forecaster().loss(theta, train.inputs.view(), train.labels.view()) + 0.5 * m.damping() * theta.dot(theta)
        };
        let before = objective(&model);

        let out = model.refine(&MLEOptions::default()).unwrap();

        assert!(out.value <= before + 1e-12);
        assert_relative_eq!(objective(&model), out.value, epsilon = 1e-10);
    }
}
