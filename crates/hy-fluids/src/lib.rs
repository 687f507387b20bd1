//! Fluid properties and equations of state for release modeling.
//!
//! The crate centers on [`Fluid`]: a gas blend plus a coherent (T, P, rho)
//! state tied together by a [`GasModel`]. Closed-form ideal and Abel-Noble
//! relations cover the fuels of interest at release pressures; a tabulated
//! compressibility-factor model covers regions where the co-volume
//! correction is not enough.

pub mod blend;
pub mod eos;
pub mod error;
pub mod fluid;
pub mod species;
pub mod ztable;

pub use blend::Blend;
pub use eos::{GasModel, ThroatState};
pub use error::{FluidError, FluidResult};
pub use fluid::{Fluid, StateSpec};
pub use species::Species;
pub use ztable::ZTable;
