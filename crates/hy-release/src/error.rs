//! Release-model errors.

use hy_fluids::FluidError;
use hy_solver::SolverError;
use thiserror::Error;

/// Result type for release operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Errors that can occur while modeling a release point.
#[derive(Error, Debug, Clone)]
pub enum ReleaseError {
    /// Model-selector string did not match any known alias.
    #[error("Unknown model: {name:?}")]
    UnknownModel { name: String },

    /// The choked-flow assumption does not hold and no explicit flow was
    /// supplied. Recoverable: the caller can retry with an override.
    #[error("Underspecified flow: {what}")]
    UnderspecifiedFlow { what: String },

    /// Non-physical geometry or state.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Fluid property evaluation failed.
    #[error(transparent)]
    Fluid(#[from] FluidError),

    /// Iterative solve failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ReleaseError::UnknownModel {
            name: "bogus".into(),
        };
        assert!(err.to_string().contains("bogus"));
    }
}
