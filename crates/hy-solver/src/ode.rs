//! ODE integrators: fixed RK4 step and adaptive Dormand-Prince (RK45).

use crate::error::{SolverError, SolverResult};
use tracing::debug;

/// Observer verdict after each accepted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Stop,
}

/// How an integration run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdeStatus {
    /// Reached `t_end`.
    Completed,
    /// Observer requested an early stop (event detected).
    StoppedByObserver,
    /// Step budget exhausted before `t_end`.
    MaxSteps,
}

/// Options for the adaptive integrator.
#[derive(Clone, Debug)]
pub struct OdeOptions {
    /// Relative error tolerance per component.
    pub rtol: f64,
    /// Absolute error tolerance per component.
    pub atol: f64,
    /// Initial step size; `None` picks (t_end - t0)/100.
    pub h_init: Option<f64>,
    /// Smallest allowed step before declaring failure.
    pub h_min: f64,
    /// Largest allowed step; `None` means unconstrained.
    pub h_max: Option<f64>,
    /// Accepted-step budget.
    pub max_steps: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            h_init: None,
            h_min: 1e-12,
            h_max: None,
            max_steps: 20_000,
        }
    }
}

/// Dense record of accepted steps.
#[derive(Clone, Debug)]
pub struct OdeSolution {
    pub t: Vec<f64>,
    pub x: Vec<Vec<f64>>,
    pub status: OdeStatus,
}

/// One classical RK4 step; returns the state at `t + dt`.
pub fn rk4_step<R>(mut rhs: R, t: f64, x: &[f64], dt: f64) -> SolverResult<Vec<f64>>
where
    R: FnMut(f64, &[f64], &mut [f64]) -> SolverResult<()>,
{
    let n = x.len();
    let mut k1 = vec![0.0; n];
    let mut k2 = vec![0.0; n];
    let mut k3 = vec![0.0; n];
    let mut k4 = vec![0.0; n];
    let mut tmp = vec![0.0; n];

    rhs(t, x, &mut k1)?;
    for i in 0..n {
        tmp[i] = x[i] + 0.5 * dt * k1[i];
    }
    rhs(t + 0.5 * dt, &tmp, &mut k2)?;
    for i in 0..n {
        tmp[i] = x[i] + 0.5 * dt * k2[i];
    }
    rhs(t + 0.5 * dt, &tmp, &mut k3)?;
    for i in 0..n {
        tmp[i] = x[i] + dt * k3[i];
    }
    rhs(t + dt, &tmp, &mut k4)?;

    Ok((0..n)
        .map(|i| x[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
        .collect())
}

// Dormand-Prince 5(4) tableau.
const A: [[f64; 6]; 6] = [
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];
const C: [f64; 6] = [1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const B5: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
const B4: [f64; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

/// Adaptive Dormand-Prince integration from `t0` to `t_end`.
///
/// The observer runs after every accepted step and can stop the march early
/// (event handling, e.g. tank pressure reaching ambient). All accepted steps
/// are recorded in the returned solution.
pub fn rk45_adaptive<R, O>(
    mut rhs: R,
    t0: f64,
    t_end: f64,
    x0: &[f64],
    opts: &OdeOptions,
    mut observer: O,
) -> SolverResult<OdeSolution>
where
    R: FnMut(f64, &[f64], &mut [f64]) -> SolverResult<()>,
    O: FnMut(f64, &[f64]) -> StepOutcome,
{
    if t_end <= t0 {
        return Err(SolverError::InvalidArg {
            what: "t_end must exceed t0",
        });
    }
    let n = x0.len();
    let mut t = t0;
    let mut x = x0.to_vec();
    let mut h = opts.h_init.unwrap_or((t_end - t0) / 100.0);
    if let Some(h_max) = opts.h_max {
        h = h.min(h_max);
    }

    let mut ts = vec![t0];
    let mut xs = vec![x.clone()];

    let mut k = vec![vec![0.0; n]; 7];
    let mut stage = vec![0.0; n];

    let mut accepted = 0usize;
    while t < t_end {
        if accepted >= opts.max_steps {
            debug!(t, accepted, "rk45 step budget exhausted");
            return Ok(OdeSolution {
                t: ts,
                x: xs,
                status: OdeStatus::MaxSteps,
            });
        }
        h = h.min(t_end - t);

        rhs(t, &x, &mut k[0])?;
        for s in 0..6 {
            for i in 0..n {
                let mut acc = 0.0;
                for (j, kj) in k.iter().enumerate().take(s + 1) {
                    acc += A[s][j] * kj[i];
                }
                stage[i] = x[i] + h * acc;
            }
            rhs(t + C[s] * h, &stage, &mut k[s + 1])?;
        }

        // 5th-order solution and embedded 4th-order error estimate
        let mut x_new = vec![0.0; n];
        let mut err_sq = 0.0;
        for i in 0..n {
            let mut acc5 = 0.0;
            let mut acc4 = 0.0;
            for (j, kj) in k.iter().enumerate() {
                acc5 += B5[j] * kj[i];
                acc4 += B4[j] * kj[i];
            }
            x_new[i] = x[i] + h * acc5;
            let e = h * (acc5 - acc4);
            let scale = opts.atol + opts.rtol * x[i].abs().max(x_new[i].abs());
            err_sq += (e / scale) * (e / scale);
        }
        let err = (err_sq / n as f64).sqrt();

        if err <= 1.0 {
            // Accept
            t += h;
            x = x_new;
            ts.push(t);
            xs.push(x.clone());
            accepted += 1;
            if observer(t, &x) == StepOutcome::Stop {
                return Ok(OdeSolution {
                    t: ts,
                    x: xs,
                    status: OdeStatus::StoppedByObserver,
                });
            }
        }

        // Step-size update (both accept and reject paths)
        let factor = if err > 0.0 {
            (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
        } else {
            5.0
        };
        h *= factor;
        if let Some(h_max) = opts.h_max {
            h = h.min(h_max);
        }
        if h < opts.h_min {
            return Err(SolverError::ConvergenceFailed {
                what: format!("rk45 step size underflow at t = {t:.6e}"),
            });
        }
    }

    Ok(OdeSolution {
        t: ts,
        x: xs,
        status: OdeStatus::Completed,
    })
}
