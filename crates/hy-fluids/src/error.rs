//! Fluid property errors.

use hy_solver::SolverError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Wrong count of thermodynamic state inputs, or a malformed blend.
    #[error("Fluid specification error: {what}")]
    Specification { what: String },

    /// Unrecognized species key.
    #[error("Unknown species: {name}")]
    UnknownSpecies { name: String },

    /// Tabulated property queried outside its valid domain.
    #[error("Property lookup failed: {what}")]
    PropertyLookup { what: String },

    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Iterative property solve failed to converge.
    #[error("Fluid solve failed: {0}")]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::NonPhysical { what: "pressure" };
        assert!(err.to_string().contains("pressure"));

        let err = FluidError::UnknownSpecies {
            name: "unobtainium".into(),
        };
        assert!(err.to_string().contains("unobtainium"));
    }

    #[test]
    fn solver_error_converts() {
        let solver_err = SolverError::InvalidBracket { what: "test" };
        let err: FluidError = solver_err.into();
        assert!(matches!(err, FluidError::Solver(_)));
    }
}
