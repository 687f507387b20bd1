use thiserror::Error;

pub type HyResult<T> = Result<T, HyError>;

#[derive(Error, Debug)]
pub enum HyError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
