//! Nonlinear least-squares fitting of the logistic model
//!
//! One [`BatchSeries`] is fit per call by minimizing the residual sum of
//! squares with a Nelder-Mead simplex search seeded from the series'
//! declared guesses (or data-derived fallbacks). The search is
//! deterministic: identical series and guesses produce identical fits.
//! Failures are typed values, never panics, and are terminal for the
//! series — there are no retries beyond the solver's iteration budget.

use argmin::core::{CostFunction, Error, Executor, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{logistic4, LogisticParams};
use crate::data::BatchSeries;

/// Minimum number of distinct points required to fit four parameters
pub const MIN_POINTS: usize = 4;

/// Typed fitting failures, fatal to their unit only
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitError {
    /// Fewer distinct usable points than free model parameters
    #[error("insufficient data: {found} distinct points, {required} required")]
    InsufficientData { found: usize, required: usize },

    /// The solver exhausted its iteration budget or hit a numerical fault
    #[error("no optimal parameters found: {reason}")]
    ConvergenceFailure { reason: String },

    /// The solver terminated but produced non-finite parameters
    #[error("fit produced non-finite parameters")]
    InvalidFitResult,
}

/// A converged fit of the logistic model to one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    pub params: LogisticParams,
    /// Residual sum of squares at the optimum
    pub rss: f64,
    /// Solver iterations consumed
    pub iterations: u64,
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitOptions {
    /// Iteration budget for the simplex search (default: 2000)
    pub max_iters: u64,
    /// Standard-deviation tolerance on the simplex costs (default: 1e-6)
    pub sd_tolerance: f64,
    /// Relative perturbation used to build the initial simplex
    pub simplex_perturbation: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            sd_tolerance: 1e-6,
            simplex_perturbation: 0.008,
        }
    }
}

impl FitOptions {
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_sd_tolerance(mut self, sd_tolerance: f64) -> Self {
        self.sd_tolerance = sd_tolerance;
        self
    }
}

/// Residual sum of squares between observed responses and the model
///
/// Parameters outside the non-negative domain (or producing non-finite
/// residuals) are assigned infinite cost, which keeps the simplex inside
/// the feasible region.
struct Residuals {
    concentrations: Vec<f64>,
    responses: Vec<f64>,
}

impl CostFunction for Residuals {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        if p[0] < 0.0 || p[1] < 0.0 || p[2] <= 0.0 || p[3] < 0.0 {
            return Ok(f64::INFINITY);
        }
        let params = LogisticParams::new(p[0], p[1], p[2], p[3]);
        let mut rss = 0.0;
        for (&x, &y) in self.concentrations.iter().zip(self.responses.iter()) {
            let residual = y - logistic4(x, &params);
            rss += residual * residual;
        }
        Ok(if rss.is_finite() { rss } else { f64::INFINITY })
    }
}

/// Fit the logistic model to one series
///
/// Seeds come from the series' declared guesses where present, otherwise
/// from the data: the response extremes for the asymptotes, the geometric
/// midpoint of the tested range for IC50, and a slope of one.
pub fn fit_series(series: &BatchSeries, options: &FitOptions) -> Result<LogisticFit, FitError> {
    let found = series.distinct_points();
    if found < MIN_POINTS {
        return Err(FitError::InsufficientData {
            found,
            required: MIN_POINTS,
        });
    }

    let seed = initial_guess(series);
    let simplex = initial_simplex(&seed, options.simplex_perturbation);
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(options.sd_tolerance)
        .map_err(|e| FitError::ConvergenceFailure {
            reason: e.to_string(),
        })?;

    let problem = Residuals {
        concentrations: series.concentrations(),
        responses: series.responses(),
    };

    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(options.max_iters))
        .run()
        .map_err(|e| FitError::ConvergenceFailure {
            reason: e.to_string(),
        })?;

    let state = result.state;
    match state.termination_status {
        TerminationStatus::Terminated(TerminationReason::SolverConverged) => {}
        TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
            return Err(FitError::ConvergenceFailure {
                reason: format!("iteration budget of {} exhausted", options.max_iters),
            });
        }
        ref other => {
            return Err(FitError::ConvergenceFailure {
                reason: format!("{other:?}"),
            });
        }
    }

    let best = match state.best_param {
        Some(p) => p,
        None => {
            return Err(FitError::ConvergenceFailure {
                reason: "solver produced no parameters".to_string(),
            });
        }
    };
    let params = LogisticParams::new(best[0], best[1], best[2], best[3]);
    if !params.is_finite() || !state.best_cost.is_finite() {
        return Err(FitError::InvalidFitResult);
    }

    Ok(LogisticFit {
        params,
        rss: state.best_cost,
        iterations: state.iter,
    })
}

/// Seed parameters from declared guesses or the observed data
fn initial_guess(series: &BatchSeries) -> LogisticParams {
    let responses = series.responses();
    let a = responses.iter().copied().fold(f64::INFINITY, f64::min);
    let b = responses.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let c = match series.guess_ic50() {
        Some(ic50) if ic50.is_finite() && ic50 > 0.0 => ic50,
        _ => {
            // geometric midpoint of the tested range
            let (min_conc, max_conc) = series.concentration_range().unwrap_or((1.0, 1.0));
            (min_conc * max_conc).sqrt()
        }
    };
    let d = match series.guess_slope() {
        Some(slope) if slope.is_finite() && slope > 0.0 => slope,
        _ => 1.0,
    };

    // clamp into the solver's non-negative domain
    LogisticParams::new(a.max(0.0), b.max(0.0), c, d)
}

/// Simplex vertices: the seed plus one per-coordinate perturbation each
fn initial_simplex(seed: &LogisticParams, perturbation: f64) -> Vec<Vec<f64>> {
    let point = vec![seed.a, seed.b, seed.c, seed.d];
    let mut vertices = Vec::with_capacity(point.len() + 1);
    vertices.push(point.clone());

    for i in 0..point.len() {
        let step = if point[i] == 0.0 {
            0.00025
        } else {
            perturbation * point[i]
        };
        let mut vertex = point.clone();
        vertex[i] += step;
        vertices.push(vertex);
    }

    vertices
}
