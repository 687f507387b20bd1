//! Scalar and multivariate root-finding.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Configuration for scalar root-finders.
#[derive(Clone, Copy, Debug)]
pub struct RootConfig {
    /// Absolute tolerance on the root abscissa.
    pub tol: f64,
    /// Maximum iterations.
    pub max_iter: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_iter: 100,
        }
    }
}

/// Bisection on a sign-changing bracket `[lo, hi]`.
pub fn bisect<F>(mut f: F, lo: f64, hi: f64, cfg: &RootConfig) -> SolverResult<f64>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    let mut a = lo;
    let mut b = hi;
    let fa = f(a)?;
    let fb = f(b)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa * fb > 0.0 {
        return Err(SolverError::InvalidBracket {
            what: "bisection bracket does not change sign",
        });
    }

    let mut f_lo = fa;
    for _ in 0..cfg.max_iter {
        let mid = 0.5 * (a + b);
        let f_mid = f(mid)?;
        if f_mid == 0.0 || (b - a).abs() < cfg.tol {
            return Ok(mid);
        }
        if f_lo * f_mid < 0.0 {
            b = mid;
        } else {
            a = mid;
            f_lo = f_mid;
        }
    }
    Err(SolverError::ConvergenceFailed {
        what: format!("bisection exhausted {} iterations", cfg.max_iter),
    })
}

/// Brent's method on a sign-changing bracket `[a, b]`.
///
/// Inverse-quadratic interpolation with bisection fallback; the workhorse for
/// shock-jump and flame-temperature solves.
pub fn brent<F>(mut f: F, a0: f64, b0: f64, cfg: &RootConfig) -> SolverResult<f64>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    let mut a = a0;
    let mut b = b0;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa * fb > 0.0 {
        return Err(SolverError::InvalidBracket {
            what: "brent bracket does not change sign",
        });
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..cfg.max_iter {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * cfg.tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // Attempt inverse quadratic (or secant) interpolation
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                q = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                q = (q - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b)?;
    }

    Err(SolverError::ConvergenceFailed {
        what: format!("brent exhausted {} iterations", cfg.max_iter),
    })
}

/// Scalar Newton iteration; `f` returns (residual, derivative).
pub fn newton_scalar<F>(mut f: F, x0: f64, cfg: &RootConfig) -> SolverResult<f64>
where
    F: FnMut(f64) -> SolverResult<(f64, f64)>,
{
    let mut x = x0;
    for _ in 0..cfg.max_iter {
        let (r, dr) = f(x)?;
        if r.abs() < cfg.tol {
            return Ok(x);
        }
        if dr == 0.0 || !dr.is_finite() {
            return Err(SolverError::Numeric {
                what: "newton derivative vanished".to_string(),
            });
        }
        x -= r / dr;
    }
    Err(SolverError::ConvergenceFailed {
        what: format!("scalar newton exhausted {} iterations", cfg.max_iter),
    })
}

/// Multivariate Newton configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Forward-difference step scale for the numerical Jacobian
    pub fd_eps: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Optional per-component lower bounds the iterate must stay above
    pub lower_bounds: Option<Vec<f64>>,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-9,
            rel_tol: 1e-9,
            fd_eps: 1e-7,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            lower_bounds: None,
        }
    }
}

/// Damped Newton with forward-difference Jacobian and bound-respecting
/// backtracking line search.
pub fn newton_system<F>(
    x0: DVector<f64>,
    mut residual_fn: F,
    config: &NewtonConfig,
) -> SolverResult<DVector<f64>>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x0.len();
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm.max(f64::MIN_POSITIVE);

    let within_bounds = |x: &DVector<f64>, bounds: &Option<Vec<f64>>| -> bool {
        match bounds {
            Some(lo) => x.iter().zip(lo.iter()).all(|(xi, li)| xi > li),
            None => true,
        }
    };

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            debug!(iter, r_norm, "newton_system converged");
            return Ok(x);
        }

        // Forward-difference Jacobian, column by column
        let mut jac = DMatrix::zeros(n, n);
        for j in 0..n {
            let h = config.fd_eps * x[j].abs().max(1.0);
            let mut x_pert = x.clone();
            x_pert[j] += h;
            let r_pert = residual_fn(&x_pert)?;
            for i in 0..n {
                jac[(i, j)] = (r_pert[i] - r[i]) / h;
            }
        }

        // Solve J * dx = -r
        let dx = jac
            .lu()
            .solve(&(-r.clone()))
            .ok_or_else(|| SolverError::Numeric {
                what: "newton Jacobian solve failed".to_string(),
            })?;

        // Backtracking line search
        let mut alpha = 1.0;
        let mut x_new = &x + alpha * &dx;
        let mut accepted = false;
        for _ in 0..config.max_line_search_iters {
            if within_bounds(&x_new, &config.lower_bounds) {
                let r_new = residual_fn(&x_new)?;
                let r_new_norm = r_new.norm();
                if r_new_norm < r_norm {
                    x = x_new.clone();
                    r = r_new;
                    r_norm = r_new_norm;
                    accepted = true;
                    break;
                }
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
        }

        if !accepted {
            return Err(SolverError::ConvergenceFailed {
                what: format!("newton line search stagnated at iteration {iter}"),
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "newton exhausted {} iterations, residual = {r_norm:.3e}",
            config.max_iterations
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisect_sqrt_two() {
        let cfg = RootConfig::default();
        let root = bisect(|x| Ok(x * x - 2.0), 0.0, 2.0, &cfg).unwrap();
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-8);
    }

    #[test]
    fn brent_cubic() {
        let cfg = RootConfig::default();
        let root = brent(|x| Ok(x * x * x - x - 2.0), 1.0, 2.0, &cfg).unwrap();
        assert!((root - 1.521379706804568).abs() < 1e-9);
    }

    #[test]
    fn brent_rejects_bad_bracket() {
        let cfg = RootConfig::default();
        let err = brent(|x| Ok(x * x + 1.0), -1.0, 1.0, &cfg).unwrap_err();
        assert!(matches!(err, SolverError::InvalidBracket { .. }));
    }

    #[test]
    fn newton_scalar_exp() {
        // x = exp(-x) has root near 0.567143
        let cfg = RootConfig::default();
        let root = newton_scalar(
            |x: f64| Ok((x - (-x).exp(), 1.0 + (-x).exp())),
            0.5,
            &cfg,
        )
        .unwrap();
        assert!((root - 0.5671432904097838).abs() < 1e-9);
    }

    #[test]
    fn newton_system_quadratic_pair() {
        // x^2 + y^2 = 5, x*y = 2 -> (2, 1)
        let residual = |v: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![
                v[0] * v[0] + v[1] * v[1] - 5.0,
                v[0] * v[1] - 2.0,
            ]))
        };
        let x0 = DVector::from_vec(vec![1.8, 0.8]);
        let sol = newton_system(x0, residual, &NewtonConfig::default()).unwrap();
        assert!((sol[0] - 2.0).abs() < 1e-6);
        assert!((sol[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn newton_system_respects_lower_bounds() {
        // Root of x^2 - 4 with x forced positive: converges to +2
        let residual = |v: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![v[0] * v[0] - 4.0]))
        };
        let cfg = NewtonConfig {
            lower_bounds: Some(vec![0.0]),
            ..NewtonConfig::default()
        };
        let sol = newton_system(DVector::from_vec(vec![0.5]), residual, &cfg).unwrap();
        assert!((sol[0] - 2.0).abs() < 1e-6);
    }
}
