//! Interpolation over tabulated data.

use crate::error::{SolverError, SolverResult};

/// Piecewise-linear interpolant over a strictly increasing abscissa.
///
/// Evaluation clamps to the end values outside the table, which is the
/// behavior wanted for querying stored time/position series.
#[derive(Clone, Debug)]
pub struct Interp1 {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Interp1 {
    pub fn try_new(x: Vec<f64>, y: Vec<f64>) -> SolverResult<Self> {
        if x.len() != y.len() {
            return Err(SolverError::InvalidArg {
                what: "interpolant slices must have equal length",
            });
        }
        if x.len() < 2 {
            return Err(SolverError::InvalidArg {
                what: "interpolant needs at least two points",
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SolverError::InvalidArg {
                what: "interpolant abscissa must be strictly increasing",
            });
        }
        Ok(Self { x, y })
    }

    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        if xq <= self.x[0] {
            return self.y[0];
        }
        if xq >= self.x[n - 1] {
            return self.y[n - 1];
        }
        let idx = match self.x.binary_search_by(|v| v.total_cmp(&xq)) {
            Ok(i) => return self.y[i],
            Err(i) => i,
        };
        let (x0, x1) = (self.x[idx - 1], self.x[idx]);
        let (y0, y1) = (self.y[idx - 1], self.y[idx]);
        y0 + (y1 - y0) * (xq - x0) / (x1 - x0)
    }

    /// Abscissa of the maximum ordinate, with the ordinate itself.
    pub fn argmax(&self) -> (f64, f64) {
        let mut best = (self.x[0], self.y[0]);
        for (&xi, &yi) in self.x.iter().zip(&self.y) {
            if yi > best.1 {
                best = (xi, yi);
            }
        }
        best
    }
}

/// Bilinear interpolation on a rectilinear grid.
///
/// `z[i][j]` holds the value at `(xs[i], ys[j])`. Returns `None` when the
/// query point lies outside the grid; callers decide whether that is an
/// error (property tables) or a clamp (plots).
pub fn bilinear(xs: &[f64], ys: &[f64], z: &[Vec<f64>], x: f64, y: f64) -> Option<f64> {
    if xs.len() < 2 || ys.len() < 2 || z.len() != xs.len() {
        return None;
    }
    if x < xs[0] || x > xs[xs.len() - 1] || y < ys[0] || y > ys[ys.len() - 1] {
        return None;
    }
    let i = match xs.binary_search_by(|v| v.total_cmp(&x)) {
        Ok(i) => i.min(xs.len() - 2),
        Err(i) => i - 1,
    };
    let j = match ys.binary_search_by(|v| v.total_cmp(&y)) {
        Ok(j) => j.min(ys.len() - 2),
        Err(j) => j - 1,
    };
    let tx = (x - xs[i]) / (xs[i + 1] - xs[i]);
    let ty = (y - ys[j]) / (ys[j + 1] - ys[j]);
    let z00 = z[i][j];
    let z10 = z[i + 1][j];
    let z01 = z[i][j + 1];
    let z11 = z[i + 1][j + 1];
    Some(z00 * (1.0 - tx) * (1.0 - ty) + z10 * tx * (1.0 - ty) + z01 * (1.0 - tx) * ty + z11 * tx * ty)
}
