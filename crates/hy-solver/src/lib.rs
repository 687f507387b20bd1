//! hy-solver: shared numerics for the hyrisk workspace.
//!
//! Contains:
//! - rootfind (bisection, Brent, scalar Newton, damped multivariate Newton)
//! - ode (fixed RK4 step + adaptive Dormand-Prince integrator with events)
//! - quad (trapezoid rule)
//! - interp (1-D linear interpolation, bilinear table lookup)
//! - special (erf and standard-normal CDF)

pub mod error;
pub mod interp;
pub mod ode;
pub mod quad;
pub mod rootfind;
pub mod special;

pub use error::{SolverError, SolverResult};
pub use interp::{bilinear, Interp1};
pub use ode::{rk4_step, rk45_adaptive, OdeOptions, OdeSolution, OdeStatus, StepOutcome};
pub use quad::{trapz, trapz_uniform};
pub use rootfind::{bisect, brent, newton_scalar, newton_system, NewtonConfig, RootConfig};
pub use special::{erf, erfc, std_normal_cdf, std_normal_pdf};
