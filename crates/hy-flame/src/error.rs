//! Flame and overpressure errors.

use hy_fluids::FluidError;
use hy_jet::JetError;
use hy_release::ReleaseError;
use hy_solver::SolverError;
use thiserror::Error;

/// Result type for flame operations.
pub type FlameResult<T> = Result<T, FlameError>;

/// Errors from chemistry, the flame solve, or blast correlations.
#[derive(Error, Debug, Clone)]
pub enum FlameError {
    /// Model-selector string did not match any known alias.
    #[error("Unknown model: {name:?}")]
    UnknownModel { name: String },

    /// Non-physical input, geometry, or correlation parameter.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Fluid property evaluation failed.
    #[error(transparent)]
    Fluid(#[from] FluidError),

    /// Release-point preprocessing failed; carries the
    /// under-specified-flow case for unchoked releases.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Flame trajectory construction failed.
    #[error(transparent)]
    Jet(#[from] JetError),

    /// The flame-temperature solve or an interpolation failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
}
