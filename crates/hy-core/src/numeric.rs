use crate::HyError;

/// Floating point type used throughout the workspace.
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    /// Tight tolerances for root-finding and EOS round trips.
    pub fn tight() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-6,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HyError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HyError::NonFinite { what, value: v })
    }
}

/// `n` uniformly spaced points from `a` to `b` inclusive.
pub fn linspace(a: Real, b: Real, n: usize) -> Vec<Real> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![a];
    }
    let step = (b - a) / (n - 1) as Real;
    (0..n).map(|i| a + step * i as Real).collect()
}

/// `n` logarithmically spaced points from `a` to `b` inclusive (both > 0).
pub fn logspace(a: Real, b: Real, n: usize) -> Vec<Real> {
    linspace(a.ln(), b.ln(), n).into_iter().map(Real::exp).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances::tight();
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn linspace_endpoints() {
        let pts = linspace(0.0, 1.0, 5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[4], 1.0);
        assert!((pts[2] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn logspace_is_geometric() {
        let pts = logspace(1.0, 100.0, 3);
        assert!((pts[0] - 1.0).abs() < 1e-12);
        assert!((pts[1] - 10.0).abs() < 1e-9);
        assert!((pts[2] - 100.0).abs() < 1e-9);
    }
}
