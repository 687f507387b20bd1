//! Indoor-accumulation errors.

use hy_fluids::FluidError;
use hy_jet::JetError;
use hy_release::ReleaseError;
use hy_solver::SolverError;
use thiserror::Error;

/// Result type for indoor-accumulation operations.
pub type IndoorResult<T> = Result<T, IndoorError>;

/// Errors from enclosure setup, the layer integration, or queries.
#[derive(Error, Debug, Clone)]
pub enum IndoorError {
    /// The layer state left its physical range during integration. An
    /// out-of-range volume or concentration means the scenario itself is
    /// inconsistent (vent geometry, flow history), so the run aborts
    /// instead of clamping.
    #[error("Physical bounds violated: {what}")]
    BoundsViolation { what: String },

    /// Model-selector string did not match any known alias.
    #[error("Unknown model: {name:?}")]
    UnknownModel { name: String },

    /// Non-physical geometry, state, or schedule.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Fluid property evaluation failed.
    #[error(transparent)]
    Fluid(#[from] FluidError),

    /// Release-point preprocessing failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Plume construction or a plume query failed.
    #[error(transparent)]
    Jet(#[from] JetError),

    /// The layer ODE or a series interpolation failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = IndoorError::BoundsViolation {
            what: "layer volume 12.0 m3 exceeds enclosure volume 10.0 m3".into(),
        };
        assert!(err.to_string().contains("12.0 m3"));
    }

    #[test]
    fn jet_error_converts() {
        let err: IndoorError = JetError::NonPhysical {
            what: "exit diameter",
        }
        .into();
        assert!(matches!(err, IndoorError::Jet(_)));
    }
}
