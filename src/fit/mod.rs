//! Curve fitting for dose-response series
//!
//! The model is fixed: a monotonic four-parameter logistic in
//! log-concentration (see [`model`]). Fitting is deterministic nonlinear
//! least squares with typed failure outcomes (see [`fitter`]).

mod fitter;
mod model;

pub use fitter::{fit_series, FitError, FitOptions, LogisticFit, MIN_POINTS};
pub use model::{logistic4, LogisticParams};
