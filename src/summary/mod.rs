//! Pivoted per-batch summary of an analysis run
//!
//! Unit results arrive as one record per (batch, timepoint);
//! [`SummaryTable::assemble`] reshapes them into one row per batch with a
//! cell per timepoint observed in the input. The column set is driven by
//! the data, not hardcoded; batches measured at only a subset of
//! timepoints carry empty cells for the rest, and failed fits carry empty
//! metric values inside their cell. Row order follows first-seen batch
//! order, column order first-seen timepoint order.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregate::UnitResult;

/// Metrics for one batch at one timepoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimepointCell {
    /// IC50, `None` when fitting failed
    pub ic50: Option<f64>,
    /// AUC, `None` when fitting failed
    pub auc: Option<f64>,
    /// Plot artifact for this unit, when rendered
    pub plot: Option<PathBuf>,
}

/// One output row: a batch across all observed timepoints
///
/// `cells` is parallel to the owning table's timepoint list; a `None`
/// cell means the batch was never measured at that timepoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummaryRow {
    pub batch: String,
    pub cells: Vec<Option<TimepointCell>>,
}

/// The pivoted summary table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    timepoints: Vec<Option<String>>,
    rows: Vec<BatchSummaryRow>,
}

impl SummaryTable {
    /// Pivot unit results into one row per batch
    pub fn assemble(units: &[UnitResult]) -> Self {
        let mut timepoints: Vec<Option<String>> = Vec::new();
        for unit in units {
            if !timepoints.contains(&unit.timepoint) {
                timepoints.push(unit.timepoint.clone());
            }
        }

        let mut rows: Vec<BatchSummaryRow> = Vec::new();
        for unit in units {
            let row = match rows.iter().position(|r| r.batch == unit.batch) {
                Some(i) => i,
                None => {
                    rows.push(BatchSummaryRow {
                        batch: unit.batch.clone(),
                        cells: vec![None; timepoints.len()],
                    });
                    rows.len() - 1
                }
            };
            if let Some(col) = timepoints.iter().position(|t| *t == unit.timepoint) {
                rows[row].cells[col] = Some(TimepointCell {
                    ic50: unit.metrics.as_ref().map(|m| m.ic50),
                    auc: unit.metrics.as_ref().map(|m| m.auc),
                    plot: unit.plot.clone(),
                });
            }
        }

        Self { timepoints, rows }
    }

    /// Distinct timepoints, in first-seen order
    pub fn timepoints(&self) -> &[Option<String>] {
        &self.timepoints
    }

    /// Rows in first-seen batch order
    pub fn rows(&self) -> &[BatchSummaryRow] {
        &self.rows
    }

    /// Render the table as CSV
    ///
    /// The header is `BatchID`, then `IC50` and `AUC` columns qualified by
    /// timepoint (unqualified for the implicit single timepoint). Empty
    /// fields stand for missing or failed units.
    pub fn to_csv(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let mut csv = String::from("BatchID");
        for prefix in ["IC50", "AUC"] {
            for timepoint in &self.timepoints {
                csv.push(',');
                csv.push_str(&column_label(prefix, timepoint));
            }
        }
        csv.push('\n');

        for row in &self.rows {
            csv.push_str(&row.batch);
            for value in row
                .cells
                .iter()
                .map(|c| c.as_ref().and_then(|c| c.ic50))
                .chain(row.cells.iter().map(|c| c.as_ref().and_then(|c| c.auc)))
            {
                csv.push(',');
                if let Some(value) = value {
                    csv.push_str(&value.to_string());
                }
            }
            csv.push('\n');
        }

        csv
    }
}

fn column_label(prefix: &str, timepoint: &Option<String>) -> String {
    match timepoint {
        Some(tp) => format!("{prefix}_{tp}"),
        None => prefix.to_string(),
    }
}
