//! Quantitative risk assessment for compressed-gas facilities.
//!
//! The crate ties the physics stack together into annual risk metrics:
//! component leak-frequency tables and fueling-failure fault trees set
//! how often each of the five standard leak sizes releases, ignition
//! probabilities split those releases into a flame branch and a delayed
//! blast branch, and probit models turn the per-occupant heat flux and
//! overpressure into fatality probabilities. [`analysis::analyze`] runs
//! one facility end to end and rolls the branches up into PLL, FAR, and
//! AIR; [`study::RandomStudy`] repeats it over sampled frequencies.

pub mod analysis;
pub mod components;
pub mod error;
pub mod failures;
pub mod ignition;
pub mod leak;
pub mod occupants;
pub mod probit;
pub mod results;
pub mod study;

pub use analysis::{analyze, AnalysisRequest};
pub use components::{Component, ComponentCategory, ComponentSet, Fuel, Phase};
pub use error::{QraError, QraResult};
pub use failures::FailureSet;
pub use ignition::IgnitionProbTable;
pub use leak::LeakSize;
pub use occupants::OccupantGroup;
pub use probit::{OverpressureProbit, ThermalProbit};
pub use results::{AnalysisResults, AnalysisStatus, LeakResult};
pub use study::RandomStudy;
