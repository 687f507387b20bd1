//! Uncertainty primitives for risk-model inputs.
//!
//! One small sum type, [`DistributionSpec`], stands in wherever an input may
//! be a point value or a sampled quantity: leak-frequency overrides, failure
//! probabilities, occupant positions. Nominal runs collapse every spec to its
//! mean; Monte-Carlo studies draw from seeded [`rand::rngs::StdRng`] streams
//! so sample k of a study is reproducible in isolation.

pub mod distribution;
pub mod error;

pub use distribution::DistributionSpec;
pub use error::{UncertaintyError, UncertaintyResult};
