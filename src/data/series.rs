//! Grouping of raw points into fittable per-unit series
//!
//! [`Dataset::build_series`] turns the flat point table into one
//! [`BatchSeries`] per distinct (batch, timepoint) pair, ordered by
//! first-seen batch and then first-seen timepoint within the batch.
//! Points with a non-positive or non-finite
//! concentration, or a non-finite response, are rejected individually and
//! counted on the series; they never abort the run. Only a dataset with no
//! points at all is a top-level error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::point::{Dataset, DoseResponsePoint, GuessTable};

/// Errors raised while constructing series from a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// The dataset contains no points, so no unit can be constructed
    #[error("dataset contains no points")]
    EmptyDataset,
}

/// An ordered concentration/response series for one (batch, timepoint) unit
///
/// Invariant: every stored point has a finite, strictly positive
/// concentration and a finite response; offending points are dropped at
/// insertion and tallied in `rejected`. The optional `guess_*` fields seed
/// the curve fit and come from the externally supplied [`GuessTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSeries {
    batch: String,
    timepoint: Option<String>,
    points: Vec<DoseResponsePoint>,
    guess_ic50: Option<f64>,
    guess_slope: Option<f64>,
    rejected: usize,
}

impl BatchSeries {
    /// Create an empty series for a unit
    pub fn new(
        batch: impl Into<String>,
        timepoint: Option<String>,
        guess_ic50: Option<f64>,
        guess_slope: Option<f64>,
    ) -> Self {
        Self {
            batch: batch.into(),
            timepoint,
            points: Vec::new(),
            guess_ic50,
            guess_slope,
            rejected: 0,
        }
    }

    /// Append a measurement, validating it first
    ///
    /// Returns `true` if the point was accepted. Invalid values are
    /// rejected, counted, and logged; the rest of the series is unaffected.
    pub fn add_point(&mut self, concentration: f64, response: f64) -> bool {
        if !concentration.is_finite() || concentration <= 0.0 || !response.is_finite() {
            tracing::warn!(
                batch = %self.batch,
                timepoint = ?self.timepoint,
                concentration,
                response,
                "rejecting invalid data point"
            );
            self.rejected += 1;
            return false;
        }
        self.points.push(DoseResponsePoint::new(
            self.batch.clone(),
            self.timepoint.clone(),
            concentration,
            response,
        ));
        true
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn timepoint(&self) -> Option<&str> {
        self.timepoint.as_deref()
    }

    pub fn points(&self) -> &[DoseResponsePoint] {
        &self.points
    }

    pub fn guess_ic50(&self) -> Option<f64> {
        self.guess_ic50
    }

    pub fn guess_slope(&self) -> Option<f64> {
        self.guess_slope
    }

    /// Number of raw points rejected as invalid for this unit
    pub fn rejected_points(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.concentration()).collect()
    }

    pub fn responses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.response()).collect()
    }

    /// The tested concentration range, or `None` for an empty series
    pub fn concentration_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.concentration());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        Some((min, max))
    }

    /// Number of distinct (concentration, response) pairs
    ///
    /// Replicate wells with identical coordinates count once; the logistic
    /// model has four free parameters and is underdetermined below four
    /// distinct points.
    pub fn distinct_points(&self) -> usize {
        let mut seen = std::collections::BTreeSet::new();
        for p in &self.points {
            seen.insert((p.concentration().to_bits(), p.response().to_bits()));
        }
        seen.len()
    }
}

impl Dataset {
    /// Group the dataset into one series per distinct (batch, timepoint)
    ///
    /// Series are emitted in first-seen order of batch, then first-seen
    /// timepoint within each batch. Initial guesses are attached from
    /// `guesses` at creation; units with no matching entry fall back to
    /// data-derived seeds at fit time.
    ///
    /// A unit whose points were all rejected as invalid is still emitted
    /// (with zero usable points), so downstream output covers every batch
    /// present in the input.
    pub fn build_series(&self, guesses: &GuessTable) -> Result<Vec<BatchSeries>, DataError> {
        if self.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let mut series: Vec<BatchSeries> = Vec::new();
        for point in self.points() {
            let idx = series
                .iter()
                .position(|s| s.batch() == point.batch() && s.timepoint() == point.timepoint());
            let idx = match idx {
                Some(i) => i,
                None => {
                    let guess = guesses.lookup(point.batch(), point.timepoint());
                    series.push(BatchSeries::new(
                        point.batch(),
                        point.timepoint().map(String::from),
                        guess.map(|g| g.ic50()),
                        guess.map(|g| g.slope()),
                    ));
                    series.len() - 1
                }
            };
            series[idx].add_point(point.concentration(), point.response());
        }

        // regroup by batch: first-seen batch order outranks the order the
        // individual (batch, timepoint) pairs appeared in
        let mut batch_rank: Vec<String> = Vec::new();
        for s in &series {
            if !batch_rank.iter().any(|b| b == s.batch()) {
                batch_rank.push(s.batch().to_string());
            }
        }
        series.sort_by_key(|s| batch_rank.iter().position(|b| b == s.batch()));

        Ok(series)
    }
}
