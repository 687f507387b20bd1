//! Quadrature helpers.

use crate::error::{SolverError, SolverResult};

/// Trapezoid rule over matched abscissa/ordinate slices.
pub fn trapz(x: &[f64], y: &[f64]) -> SolverResult<f64> {
    if x.len() != y.len() {
        return Err(SolverError::InvalidArg {
            what: "trapz slices must have equal length",
        });
    }
    if x.len() < 2 {
        return Ok(0.0);
    }
    let mut acc = 0.0;
    for i in 1..x.len() {
        acc += 0.5 * (x[i] - x[i - 1]) * (y[i] + y[i - 1]);
    }
    Ok(acc)
}

/// Trapezoid rule over uniformly spaced samples with spacing `dx`.
pub fn trapz_uniform(y: &[f64], dx: f64) -> f64 {
    if y.len() < 2 {
        return 0.0;
    }
    let interior: f64 = y[1..y.len() - 1].iter().sum();
    dx * (0.5 * (y[0] + y[y.len() - 1]) + interior)
}
