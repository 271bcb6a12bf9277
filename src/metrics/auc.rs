//! Area-under-curve integration over a logarithmic concentration grid
//!
//! The fitted curve is evaluated on a dense, log-spaced grid spanning the
//! tested concentration range and integrated with the trapezoidal rule.
//! Grid spacing is logarithmic because assay dilutions are; the integral
//! itself is taken over the linear concentration axis, so AUC units are
//! response × concentration.

use ndarray::Array1;

/// Log-spaced grid of `n` concentrations spanning `[min, max]`
///
/// Both bounds must be strictly positive. A degenerate range (`min ==
/// max`) collapses to a constant grid.
pub fn log_grid(min: f64, max: f64, n: usize) -> Array1<f64> {
    debug_assert!(min > 0.0 && max >= min);
    if max <= min {
        return Array1::from_elem(n.max(1), min);
    }
    Array1::logspace(10.0, min.log10(), max.log10(), n)
}

/// Trapezoidal rule over sampled values
///
/// # Panics
///
/// Panics if `x` and `y` have different lengths.
pub fn trapezoid(x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    assert_eq!(x.len(), y.len(), "x and y must have the same length");

    let mut area = 0.0;
    for i in 1..x.len() {
        area += (y[i - 1] + y[i]) / 2.0 * (x[i] - x[i - 1]);
    }
    area
}
