//! Per-unit dose-response plot artifacts
//!
//! Each (batch, timepoint) unit is rendered to its own PNG: the raw
//! points as filled markers and, when the fit converged, the fitted curve
//! evaluated on a dense log grid, on a log-scaled concentration axis.
//! Every call owns its drawing context for its full duration — the
//! backend is created inside the call and dropped on return, success or
//! failure, so concurrent renders never share a canvas.

use std::path::Path;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::BatchSeries;
use crate::fit::{logistic4, LogisticParams};
use crate::metrics::log_grid;

/// Errors raised while producing a plot artifact
#[derive(Error, Debug, Clone)]
pub enum PlotError {
    /// Error reported by the drawing backend
    #[error("failed to render plot: {0}")]
    Render(String),

    /// Filesystem error around the artifact location
    #[error("plot I/O error: {0}")]
    Io(String),
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotOptions {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of grid points for the smooth fitted curve
    pub curve_points: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            curve_points: 100,
        }
    }
}

impl PlotOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// File name for a unit's plot artifact
pub fn artifact_name(batch: &str, timepoint: Option<&str>) -> String {
    match timepoint {
        Some(tp) => format!("{}_{}_ic50_curve.png", sanitize(batch), sanitize(tp)),
        None => format!("{}_ic50_curve.png", sanitize(batch)),
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Render one unit's raw points and fitted curve to `path`
///
/// A unit that failed to fit is still rendered (points only), so every
/// unit has an artifact. A series with no usable points produces a blank
/// canvas.
pub fn render_unit(
    series: &BatchSeries,
    fit: Option<&LogisticParams>,
    path: &Path,
    options: &PlotOptions,
) -> Result<(), PlotError> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let Some((min_conc, max_conc)) = series.concentration_range() else {
        return root.present().map_err(render_err);
    };
    let (x_min, x_max) = if max_conc > min_conc {
        (min_conc, max_conc)
    } else {
        // a single tested concentration still gets a visible axis
        (min_conc * 0.5, max_conc * 2.0)
    };

    let curve: Vec<(f64, f64)> = match fit {
        Some(params) => log_grid(x_min, x_max, options.curve_points.max(2))
            .iter()
            .map(|&x| (x, logistic4(x, params)))
            .collect(),
        None => Vec::new(),
    };

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for value in series
        .responses()
        .iter()
        .chain(curve.iter().map(|(_, y)| y))
    {
        y_min = y_min.min(*value);
        y_max = y_max.max(*value);
    }
    let pad = if y_max > y_min {
        (y_max - y_min) * 0.05
    } else {
        1.0
    };

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min - pad)..(y_max + pad))
        .map_err(render_err)?;

    chart.configure_mesh().draw().map_err(render_err)?;

    if !curve.is_empty() {
        chart
            .draw_series(LineSeries::new(curve, &BLUE))
            .map_err(render_err)?;
    }
    chart
        .draw_series(
            series
                .points()
                .iter()
                .map(|p| Circle::new((p.concentration(), p.response()), 3, BLUE.filled())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)
}

fn render_err<E: std::fmt::Display>(error: E) -> PlotError {
    PlotError::Render(error.to_string())
}
