//! Release-point modeling: orifice discharge, tank blowdown, and the
//! notional-nozzle correction for under-expanded jets.

pub mod error;
pub mod nozzle;
pub mod orifice;
pub mod source;

pub use error::{ReleaseError, ReleaseResult};
pub use nozzle::{EffectiveSource, NozzleModel};
pub use orifice::Orifice;
pub use source::{BlowdownHistory, Source};
