//! Raw measurement records and initial-guess tables
//!
//! A [`Dataset`] is the tabular input to the analysis: one
//! [`DoseResponsePoint`] per measured well, carrying the batch it belongs
//! to, an optional timepoint, and the concentration/response pair. A
//! [`GuessTable`] optionally supplies externally determined IC50 and slope
//! starting values per batch (and timepoint, if applicable) to seed the
//! curve fit.

use serde::{Deserialize, Serialize};

/// A single concentration/response measurement
///
/// Points are immutable once created. Validation of the numeric values
/// (finite, strictly positive concentration) happens when points are
/// grouped into series, not here, so that the raw record survives for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseResponsePoint {
    batch: String,
    timepoint: Option<String>,
    concentration: f64,
    response: f64,
}

impl DoseResponsePoint {
    /// Create a new point
    ///
    /// `timepoint` is `None` for single-timepoint experiments; all such
    /// points share one implicit timepoint.
    pub fn new(
        batch: impl Into<String>,
        timepoint: Option<String>,
        concentration: f64,
        response: f64,
    ) -> Self {
        Self {
            batch: batch.into(),
            timepoint,
            concentration,
            response,
        }
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn timepoint(&self) -> Option<&str> {
        self.timepoint.as_deref()
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn response(&self) -> f64 {
        self.response
    }
}

/// The full point dataset consumed by the analysis
///
/// Insertion order is significant: batches and timepoints appear in the
/// output in the order they are first seen here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    points: Vec<DoseResponsePoint>,
}

impl Dataset {
    pub fn new(points: Vec<DoseResponsePoint>) -> Self {
        Self { points }
    }

    pub fn add_point(&mut self, point: DoseResponsePoint) {
        self.points.push(point);
    }

    /// Convenience for appending a point from its raw fields
    pub fn add(
        &mut self,
        batch: &str,
        timepoint: Option<&str>,
        concentration: f64,
        response: f64,
    ) {
        self.points.push(DoseResponsePoint::new(
            batch,
            timepoint.map(String::from),
            concentration,
            response,
        ));
    }

    pub fn points(&self) -> &[DoseResponsePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// An externally supplied fitting seed for one batch
///
/// A `timepoint` of `None` makes the entry apply to the whole batch when
/// no timepoint-specific entry exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialGuess {
    batch: String,
    timepoint: Option<String>,
    ic50: f64,
    slope: f64,
}

impl InitialGuess {
    pub fn new(batch: impl Into<String>, timepoint: Option<String>, ic50: f64, slope: f64) -> Self {
        Self {
            batch: batch.into(),
            timepoint,
            ic50,
            slope,
        }
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn timepoint(&self) -> Option<&str> {
        self.timepoint.as_deref()
    }

    pub fn ic50(&self) -> f64 {
        self.ic50
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }
}

/// Lookup table of initial guesses keyed by batch and timepoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuessTable {
    entries: Vec<InitialGuess>,
}

impl GuessTable {
    pub fn new(entries: Vec<InitialGuess>) -> Self {
        Self { entries }
    }

    pub fn add_entry(&mut self, entry: InitialGuess) {
        self.entries.push(entry);
    }

    /// Convenience for appending an entry from its raw fields
    pub fn add(&mut self, batch: &str, timepoint: Option<&str>, ic50: f64, slope: f64) {
        self.entries.push(InitialGuess::new(
            batch,
            timepoint.map(String::from),
            ic50,
            slope,
        ));
    }

    pub fn entries(&self) -> &[InitialGuess] {
        &self.entries
    }

    /// Find the guess for a (batch, timepoint) pair
    ///
    /// An exact (batch, timepoint) match wins; otherwise a timepoint-less
    /// entry for the batch serves as fallback.
    pub fn lookup(&self, batch: &str, timepoint: Option<&str>) -> Option<&InitialGuess> {
        self.entries
            .iter()
            .find(|g| g.batch() == batch && g.timepoint() == timepoint)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|g| g.batch() == batch && g.timepoint().is_none())
            })
    }
}
