//! Risk-analysis errors.

use hy_flame::FlameError;
use hy_fluids::FluidError;
use hy_jet::JetError;
use hy_release::ReleaseError;
use hy_solver::SolverError;
use hy_uncertainty::UncertaintyError;
use thiserror::Error;

/// Result type for risk-analysis operations.
pub type QraResult<T> = Result<T, QraError>;

/// Errors from request validation, frequency/ignition tables, or the
/// physics an analysis drives.
#[derive(Error, Debug, Clone)]
pub enum QraError {
    /// A precondition on the analysis request failed. Raised during the
    /// pre-flight pass and aborts the whole analysis; physics never runs.
    #[error("Invalid analysis input: {what}")]
    Validation { what: String },

    /// Model-selector string did not match any known alias.
    #[error("Unknown model: {name:?}")]
    UnknownModel { name: String },

    /// Fluid property evaluation failed.
    #[error(transparent)]
    Fluid(#[from] FluidError),

    /// Source resolution (choking, notional nozzle) failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Dispersion march or a plume query failed.
    #[error(transparent)]
    Jet(#[from] JetError),

    /// Flame, chemistry, or blast-correlation evaluation failed.
    #[error(transparent)]
    Flame(#[from] FlameError),

    /// Distribution parameters or sampling failed.
    #[error(transparent)]
    Uncertainty(#[from] UncertaintyError),

    /// A numerical sub-solve failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl QraError {
    /// Short machine-readable kind tag for result records.
    pub fn kind(&self) -> &'static str {
        match self {
            QraError::Validation { .. } => "validation",
            QraError::UnknownModel { .. } => "unknown_model",
            QraError::Fluid(_) => "fluid",
            QraError::Release(_) => "release",
            QraError::Jet(_) => "jet",
            QraError::Flame(_) => "flame",
            QraError::Uncertainty(_) => "uncertainty",
            QraError::Solver(_) => "solver",
        }
    }
}
