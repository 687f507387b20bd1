//! hy-core: stable foundation for the hyrisk workspace.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers + grid generation)
//! - keys (model-selector normalization shared by all boundaries)
//! - error (shared error types)

pub mod error;
pub mod keys;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HyError, HyResult};
pub use keys::normalize_key;
pub use numeric::*;
pub use units::*;
