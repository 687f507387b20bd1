//! Distribution parameter and sampling errors.

use thiserror::Error;

/// Result type for distribution operations.
pub type UncertaintyResult<T> = Result<T, UncertaintyError>;

/// Errors raised by distribution construction or sampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UncertaintyError {
    /// Parameters outside the distribution's valid domain.
    #[error("Invalid distribution parameter: {what}")]
    InvalidParameter { what: String },

    /// A truncated draw exhausted its rejection budget, typically because
    /// the bounds exclude nearly all probability mass.
    #[error("Sampling failed: {what}")]
    SamplingFailed { what: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UncertaintyError::InvalidParameter {
            what: "std_dev must be positive".into(),
        };
        assert!(err.to_string().contains("std_dev"));
    }
}
