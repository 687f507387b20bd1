//! Jet-model errors.

use hy_fluids::FluidError;
use hy_release::ReleaseError;
use hy_solver::SolverError;
use thiserror::Error;

/// Result type for jet operations.
pub type JetResult<T> = Result<T, JetError>;

/// Errors from jet construction, the integral march, or queries.
#[derive(Error, Debug, Clone)]
pub enum JetError {
    /// Non-physical geometry, state, or configuration.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// A read-only query was asked something the stored solution cannot
    /// answer.
    #[error("Query failed: {what}")]
    Query { what: String },

    /// Fluid property evaluation failed.
    #[error(transparent)]
    Fluid(#[from] FluidError),

    /// Release-point preprocessing failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// The march or an embedded root-find failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
}
