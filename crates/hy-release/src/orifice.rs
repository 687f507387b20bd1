//! Orifice geometry and discharge.

use crate::error::{ReleaseError, ReleaseResult};
use hy_core::units::Length;
use hy_fluids::Fluid;
use std::f64::consts::PI;

/// A circular release orifice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orifice {
    d_m: f64,
    cd: f64,
}

impl Orifice {
    /// Create an orifice from diameter and discharge coefficient.
    pub fn new(diameter: Length, cd: f64) -> ReleaseResult<Self> {
        let d_m = diameter.value;
        if !d_m.is_finite() || d_m <= 0.0 {
            return Err(ReleaseError::NonPhysical {
                what: "orifice diameter",
            });
        }
        if !cd.is_finite() || cd <= 0.0 || cd > 1.0 {
            return Err(ReleaseError::NonPhysical {
                what: "discharge coefficient (must be in (0, 1])",
            });
        }
        Ok(Self { d_m, cd })
    }

    /// Diameter [m].
    pub fn diameter(&self) -> f64 {
        self.d_m
    }

    /// Discharge coefficient.
    pub fn cd(&self) -> f64 {
        self.cd
    }

    /// Geometric area [m²].
    pub fn area(&self) -> f64 {
        PI * self.d_m * self.d_m / 4.0
    }

    /// Plug-flow mass flow [kg/s] through the Cd-scaled area.
    pub fn mdot(&self, rho_kg_m3: f64, v_mps: f64) -> f64 {
        rho_kg_m3 * v_mps * self.area() * self.cd
    }

    /// Choked mass flow [kg/s] for a stagnation gas.
    pub fn mdot_choked(&self, gas: &Fluid) -> ReleaseResult<f64> {
        let throat = gas.throat(1.0)?;
        Ok(self.mdot(throat.rho_kg_m3, throat.v_mps))
    }
}
