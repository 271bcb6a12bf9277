//! The four-parameter logistic (Hill) dose-response model
//!
//! ```text
//! response(x) = A + (B − A) / (1 + (C / x)^D)
//! ```
//!
//! `C` is the half-maximal concentration (IC50) and `D` the Hill slope
//! controlling transition sharpness. `A` is the response approached at
//! low concentration and `B` the response approached at high
//! concentration; for inhibition-style (decreasing) data a converged fit
//! has `A > B`. The slope sign convention is fixed positive — curve
//! direction is carried by the `A`/`B` ordering alone.

use serde::{Deserialize, Serialize};

/// Parameters of the four-parameter logistic model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Low-concentration asymptote
    pub a: f64,
    /// High-concentration asymptote
    pub b: f64,
    /// Half-maximal concentration (IC50)
    pub c: f64,
    /// Hill slope
    pub d: f64,
}

impl LogisticParams {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// True if every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}

/// Evaluate the model at concentration `x`
///
/// `x` must be strictly positive; series construction guarantees this for
/// all fitted data.
#[inline]
pub fn logistic4(x: f64, p: &LogisticParams) -> f64 {
    p.a + (p.b - p.a) / (1.0 + (p.c / x).powf(p.d))
}
