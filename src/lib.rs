pub mod aggregate;
pub mod data;
pub mod error;
pub mod fit;
pub mod metrics;
pub mod plot;
pub mod summary;

pub use aggregate::{analyze, AggregateOptions, Analysis, UnitResult};
pub use data::{BatchSeries, Dataset, DoseResponsePoint, GuessTable, InitialGuess};
pub use error::DosefitError;
pub use fit::{fit_series, FitError, FitOptions, LogisticFit, LogisticParams};
pub use metrics::{AucOptions, Metrics};
pub use plot::PlotOptions;
pub use summary::{BatchSummaryRow, SummaryTable, TimepointCell};

pub mod prelude {
    pub use crate::aggregate::{analyze, AggregateOptions, Analysis, UnitResult};
    pub use crate::data::{
        read_guesses, read_points, BatchSeries, Dataset, DoseResponsePoint, GuessTable,
        InitialGuess,
    };
    pub use crate::error::DosefitError;
    pub use crate::fit::{fit_series, FitError, FitOptions, LogisticFit, LogisticParams};
    pub use crate::metrics::{AucOptions, Metrics};
    pub use crate::plot::PlotOptions;
    pub use crate::summary::{BatchSummaryRow, SummaryTable, TimepointCell};
}
