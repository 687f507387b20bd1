//! Jet-flame radiation and unconfined-overpressure consequence models.
//!
//! A [`Flame`] wraps a solved buoyant jet at flame spreading rate, sizes
//! the visible flame from the flame Froude number, and distributes the
//! radiated power over weighted point sources along the trajectory so
//! that [`Flame::heat_flux_at`] answers observer queries with humidity-
//! dependent atmospheric attenuation. [`CombustionProducts`] caches the
//! adiabatic-flame states the sizing needs, and [`OverpressureMethod`]
//! covers the delayed-ignition blast side.

pub mod chemistry;
pub mod error;
pub mod flame;
pub mod overpressure;
pub mod radiation;

pub use chemistry::CombustionProducts;
pub use error::{FlameError, FlameResult};
pub use flame::{Flame, FlameConfig};
pub use overpressure::OverpressureMethod;
pub use radiation::{transmissivity, RadSourceModel};
