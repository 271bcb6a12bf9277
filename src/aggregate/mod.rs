//! Batch-level orchestration of the fitting pipeline
//!
//! [`analyze`] drives every (batch, timepoint) unit through a single
//! terminal pass: series construction, curve fitting, metric derivation
//! (on success), and plot rendering. Units are independent — no state is
//! shared between them — so fitting and rendering fan out across a rayon
//! pool; the indexed collect restores the builder's first-seen order
//! regardless of completion order.
//!
//! A unit that fails to fit still yields a [`UnitResult`] (with the typed
//! failure and no metrics), so the summary covers every batch in the
//! input. Only an empty dataset aborts the run.

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{BatchSeries, Dataset, GuessTable};
use crate::error::DosefitError;
use crate::fit::{fit_series, FitError, FitOptions, LogisticFit};
use crate::metrics::{AucOptions, Metrics};
use crate::plot::{self, PlotError, PlotOptions};
use crate::summary::SummaryTable;

/// Configuration for one analysis run
///
/// Plot artifacts are written into `plot_dir` when set; a run without a
/// plot directory skips rendering (for pipelines that only consume the
/// summary table).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateOptions {
    /// Directory receiving one PNG per (batch, timepoint) unit
    pub plot_dir: Option<PathBuf>,
    pub fit: FitOptions,
    pub auc: AucOptions,
    pub plot: PlotOptions,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plot_dir = Some(dir.into());
        self
    }

    pub fn with_fit(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_auc(mut self, auc: AucOptions) -> Self {
        self.auc = auc;
        self
    }

    pub fn with_plot(mut self, plot: PlotOptions) -> Self {
        self.plot = plot;
        self
    }
}

/// Outcome of one (batch, timepoint) unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitResult {
    pub batch: String,
    pub timepoint: Option<String>,
    /// Usable points in the series
    pub n_points: usize,
    /// Raw points rejected as invalid while building the series
    pub n_rejected: usize,
    /// The fit, or the typed reason it failed
    pub fit: Result<LogisticFit, FitError>,
    /// Derived metrics; `None` whenever the fit failed
    pub metrics: Option<Metrics>,
    /// Path of the rendered plot artifact, when rendering was enabled and
    /// succeeded
    pub plot: Option<PathBuf>,
}

/// Results of a full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Per-unit outcomes in first-seen order
    pub units: Vec<UnitResult>,
    /// One row per batch, pivoted over timepoints
    pub summary: SummaryTable,
}

/// Run the full pipeline over a dataset
pub fn analyze(
    dataset: &Dataset,
    guesses: &GuessTable,
    options: &AggregateOptions,
) -> Result<Analysis, DosefitError> {
    let series = dataset.build_series(guesses)?;

    if let Some(dir) = &options.plot_dir {
        fs::create_dir_all(dir).map_err(|e| PlotError::Io(e.to_string()))?;
    }

    tracing::debug!(units = series.len(), "fitting dose-response units");
    let units: Vec<UnitResult> = series
        .into_par_iter()
        .map(|series| process_unit(series, options))
        .collect();

    let failed = units.iter().filter(|u| u.fit.is_err()).count();
    tracing::info!(
        units = units.len(),
        failed,
        "dose-response analysis complete"
    );

    let summary = SummaryTable::assemble(&units);
    Ok(Analysis { units, summary })
}

fn process_unit(series: BatchSeries, options: &AggregateOptions) -> UnitResult {
    let fit = fit_series(&series, &options.fit);
    let metrics = match &fit {
        Ok(fit) => Some(crate::metrics::compute(fit, &series, &options.auc)),
        Err(error) => {
            tracing::warn!(
                batch = %series.batch(),
                timepoint = ?series.timepoint(),
                %error,
                "curve fit failed"
            );
            None
        }
    };

    let plot = options.plot_dir.as_ref().and_then(|dir| {
        let path = dir.join(plot::artifact_name(series.batch(), series.timepoint()));
        match plot::render_unit(
            &series,
            fit.as_ref().ok().map(|f| &f.params),
            &path,
            &options.plot,
        ) {
            Ok(()) => Some(path),
            Err(error) => {
                tracing::warn!(
                    batch = %series.batch(),
                    timepoint = ?series.timepoint(),
                    %error,
                    "plot rendering failed"
                );
                None
            }
        }
    });

    UnitResult {
        batch: series.batch().to_string(),
        timepoint: series.timepoint().map(String::from),
        n_points: series.len(),
        n_rejected: series.rejected_points(),
        fit,
        metrics,
        plot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{logistic4, LogisticParams};

    fn well_behaved_dataset() -> Dataset {
        let params = LogisticParams::new(95.0, 5.0, 10.0, 1.0);
        let mut data = Dataset::default();
        for &x in &[0.1, 1.0, 10.0, 100.0, 1000.0] {
            data.add("B1", None, x, logistic4(x, &params));
        }
        // too sparse to fit
        data.add("B2", None, 1.0, 90.0);
        data.add("B2", None, 10.0, 10.0);
        data
    }

    #[test]
    fn failed_units_still_produce_rows() {
        let analysis = analyze(
            &well_behaved_dataset(),
            &GuessTable::default(),
            &AggregateOptions::new(),
        )
        .unwrap();

        assert_eq!(analysis.units.len(), 2);
        assert!(analysis.units[0].fit.is_ok());
        assert!(analysis.units[0].metrics.is_some());
        assert!(matches!(
            analysis.units[1].fit,
            Err(FitError::InsufficientData { found: 2, .. })
        ));
        assert!(analysis.units[1].metrics.is_none());
        assert_eq!(analysis.summary.rows().len(), 2);
    }

    #[test]
    fn unit_order_follows_first_seen_input_order() {
        let mut data = Dataset::default();
        for batch in ["B3", "B1", "B2"] {
            for &x in &[0.1, 1.0, 10.0, 100.0] {
                data.add(batch, None, x, 50.0 / x);
            }
        }

        let analysis = analyze(&data, &GuessTable::default(), &AggregateOptions::new()).unwrap();
        let batches: Vec<&str> = analysis.units.iter().map(|u| u.batch.as_str()).collect();
        assert_eq!(batches, vec!["B3", "B1", "B2"]);
    }

    #[test]
    fn empty_dataset_aborts_the_run() {
        let result = analyze(
            &Dataset::default(),
            &GuessTable::default(),
            &AggregateOptions::new(),
        );
        assert!(matches!(
            result,
            Err(DosefitError::Data(crate::data::DataError::EmptyDataset))
        ));
    }

    #[test]
    fn plots_are_rendered_per_unit_when_enabled() {
        let dir = std::env::temp_dir().join(format!("dosefit_agg_{}", std::process::id()));
        let options = AggregateOptions::new().with_plot_dir(&dir);

        let analysis = analyze(&well_behaved_dataset(), &GuessTable::default(), &options).unwrap();

        for unit in &analysis.units {
            let path = unit.plot.as_ref().unwrap();
            assert!(path.exists());
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
