//! Turbulent jet/plume dispersion via a Gaussian-profile integral model.
//!
//! A release enters through an [`ExitPlane`] (usually the notional-nozzle
//! pseudo-source from `hy-release`), relaxes through the flow-establishment
//! zone, and marches along arc length under mass, momentum, species, and
//! optionally energy conservation with a blended momentum/buoyancy
//! entrainment closure. The solved [`Jet`] answers flammable-mass, dilution
//! distance, and concentration-field queries without re-integrating.

pub mod error;
pub mod jet;
pub mod query;
pub mod source;

pub use error::{JetError, JetResult};
pub use jet::{Jet, JetConfig};
pub use source::ExitPlane;
