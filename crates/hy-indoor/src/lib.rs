//! Indoor release accumulation: a buoyant fuel layer under the ceiling.
//!
//! A release discharging into an [`Enclosure`] feeds a quasi-steady plume
//! (from `hy-jet`, reshaped against the walls and ceiling) whose flux past
//! the layer-bottom plane fills a well-mixed layer; vents drain it. The
//! layer state is a 2-state ODE in (volume, fuel mole fraction) with
//! interchangeable vent closures, and every step derives flammable
//! inventories and the expansion overpressure they could produce.

pub mod enclosure;
pub mod error;
pub mod layer;
pub mod overpressure;
pub mod release;

pub use enclosure::{Enclosure, Vent};
pub use error::{IndoorError, IndoorResult};
pub use layer::LayerModel;
pub use overpressure::dp_expansion;
pub use release::{AccumulationConfig, FlowSchedule, IndoorRelease, Scenario};
