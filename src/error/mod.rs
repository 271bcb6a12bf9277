use thiserror::Error;

use crate::data::{DataError, ParseError};
use crate::fit::FitError;
use crate::plot::PlotError;

#[derive(Error, Debug)]
pub enum DosefitError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Plot(#[from] PlotError),
}
