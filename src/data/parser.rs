//! CSV readers for the tabular input interface
//!
//! Two tables are consumed: the point dataset with columns
//! `{BatchID, TimepointID, Concentration, Response}` and the optional
//! initial-guess table with columns
//! `{BatchID, TimepointID, InitialIC50, InitialSlope}`. The `TimepointID`
//! column may be absent or empty for single-timepoint experiments.
//! Headers are matched case-insensitively.
//!
//! Unit conversion (e.g. M to nM) and any spreadsheet/instrument-format
//! handling happen upstream; these readers expect plain CSV in a
//! consistent concentration unit per series.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::point::{Dataset, DoseResponsePoint, GuessTable, InitialGuess};

/// Errors raised while reading the CSV input tables
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// Error encountered while reading or deserializing CSV data
    #[error("CSV error: {0}")]
    CSVError(String),
}

#[derive(Debug, Deserialize)]
struct PointRow {
    batchid: String,
    #[serde(default)]
    timepointid: Option<String>,
    concentration: f64,
    response: f64,
}

#[derive(Debug, Deserialize)]
struct GuessRow {
    batchid: String,
    #[serde(default)]
    timepointid: Option<String>,
    initialic50: f64,
    initialslope: f64,
}

/// Read the point dataset from a CSV file
pub fn read_points(path: impl AsRef<Path>) -> Result<Dataset, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_path(path.as_ref())
        .map_err(|e| ParseError::CSVError(e.to_string()))?;
    points_from_csv(reader)
}

/// Read the point dataset from any reader producing CSV
pub fn points_from_reader<R: Read>(source: R) -> Result<Dataset, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_reader(source);
    points_from_csv(reader)
}

/// Read the initial-guess table from a CSV file
pub fn read_guesses(path: impl AsRef<Path>) -> Result<GuessTable, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_path(path.as_ref())
        .map_err(|e| ParseError::CSVError(e.to_string()))?;
    guesses_from_csv(reader)
}

/// Read the initial-guess table from any reader producing CSV
pub fn guesses_from_reader<R: Read>(source: R) -> Result<GuessTable, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_reader(source);
    guesses_from_csv(reader)
}

fn points_from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset, ParseError> {
    lowercase_headers(&mut reader)?;

    let mut dataset = Dataset::default();
    for row in reader.deserialize() {
        let row: PointRow = row.map_err(|e| ParseError::CSVError(e.to_string()))?;
        dataset.add_point(DoseResponsePoint::new(
            row.batchid,
            normalize_timepoint(row.timepointid),
            row.concentration,
            row.response,
        ));
    }
    Ok(dataset)
}

fn guesses_from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<GuessTable, ParseError> {
    lowercase_headers(&mut reader)?;

    let mut table = GuessTable::default();
    for row in reader.deserialize() {
        let row: GuessRow = row.map_err(|e| ParseError::CSVError(e.to_string()))?;
        table.add_entry(InitialGuess::new(
            row.batchid,
            normalize_timepoint(row.timepointid),
            row.initialic50,
            row.initialslope,
        ));
    }
    Ok(table)
}

fn lowercase_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<(), ParseError> {
    let headers = reader
        .headers()
        .map_err(|e| ParseError::CSVError(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<Vec<_>>();
    reader.set_headers(csv::StringRecord::from(headers));
    Ok(())
}

/// An absent or blank timepoint cell means the implicit single timepoint
fn normalize_timepoint(timepoint: Option<String>) -> Option<String> {
    timepoint.filter(|t| !t.trim().is_empty())
}
