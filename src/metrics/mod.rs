//! Pharmacological summaries derived from a converged fit
//!
//! Given a [`LogisticFit`](crate::fit::LogisticFit) and the series it was
//! fit to, this module reports:
//!
//! | Metric | Description |
//! |--------|-------------|
//! | IC50   | The fitted `C` parameter, verbatim — values outside the tested range are flagged, not rejected |
//! | AUC    | Trapezoidal integral of the fitted curve over the tested range, on a dense log grid |
//! | RSS    | Residual sum of squares of the fit |
//! | R²     | Coefficient of determination, for downstream filtering only |
//!
//! Failed fits carry no metrics by contract; callers hold `Option<Metrics>`
//! and fold `None` into null output cells.

mod auc;

pub use auc::{log_grid, trapezoid};

use serde::{Deserialize, Serialize};

use crate::data::BatchSeries;
use crate::fit::{logistic4, LogisticFit};

/// Floor on the AUC evaluation grid density
const MIN_GRID_POINTS: usize = 100;

/// AUC integration configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AucOptions {
    /// Number of grid points for curve evaluation (default: 200; values
    /// below 100 are raised to 100)
    pub grid_points: usize,
}

impl Default for AucOptions {
    fn default() -> Self {
        Self { grid_points: 200 }
    }
}

impl AucOptions {
    pub fn with_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }
}

/// Summaries of one converged fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Half-maximal concentration, in the input concentration unit
    pub ic50: f64,
    /// True when the IC50 falls outside the tested concentration range
    pub ic50_extrapolated: bool,
    /// Area under the fitted curve over the tested range
    /// (response × concentration)
    pub auc: f64,
    /// Residual sum of squares of the fit
    pub rss: f64,
    /// Coefficient of determination; NaN when the responses carry no
    /// variance
    pub r_squared: f64,
}

/// Derive metrics from a converged fit and the series it was fit to
pub fn compute(fit: &LogisticFit, series: &BatchSeries, options: &AucOptions) -> Metrics {
    let (min_conc, max_conc) = series
        .concentration_range()
        .unwrap_or((fit.params.c, fit.params.c));

    let auc = if max_conc > min_conc {
        let grid = log_grid(min_conc, max_conc, options.grid_points.max(MIN_GRID_POINTS));
        let values = grid.mapv(|x| logistic4(x, &fit.params));
        trapezoid(&grid, &values)
    } else {
        // zero-width tested range encloses no area
        0.0
    };

    let ic50 = fit.params.c;
    Metrics {
        ic50,
        ic50_extrapolated: ic50 < min_conc || ic50 > max_conc,
        auc,
        rss: fit.rss,
        r_squared: r_squared(&series.responses(), fit.rss),
    }
}

fn r_squared(responses: &[f64], rss: f64) -> f64 {
    if responses.is_empty() {
        return f64::NAN;
    }
    let mean = responses.iter().sum::<f64>() / responses.len() as f64;
    let tss: f64 = responses.iter().map(|y| (y - mean) * (y - mean)).sum();
    if tss > f64::EPSILON {
        1.0 - rss / tss
    } else {
        f64::NAN
    }
}
