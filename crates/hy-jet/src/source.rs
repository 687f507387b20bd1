//! Exit-plane conditions and the flow-establishment transition.
//!
//! The integral model does not march from the orifice itself: a plug-flow
//! exit first relaxes into the self-similar Gaussian shape over the zone of
//! flow establishment. The transition is closed-form: establishment length
//! proportional to the exit diameter, with the initial half-width set so the
//! Gaussian node carries exactly the plug-flow species flux.

use crate::error::{JetError, JetResult};
use hy_core::units::constants::G0_MPS2;
use hy_fluids::Fluid;
use hy_release::EffectiveSource;
use std::f64::consts::PI;

/// Establishment length in exit diameters.
const ESTABLISHMENT_DIAMETERS: f64 = 6.2;

/// Plug-flow conditions at the plane where the gas enters the ambient.
///
/// For a choked release this is the notional-nozzle pseudo-source; for a
/// subsonic release it is the orifice itself.
#[derive(Debug, Clone)]
pub struct ExitPlane {
    /// Flow diameter [m].
    pub d_m: f64,
    /// Plug-flow velocity [m/s].
    pub v_mps: f64,
    /// Released gas at exit conditions.
    pub gas: Fluid,
    /// Ambient the jet entrains.
    pub ambient: Fluid,
    /// Release angle from horizontal [rad].
    pub theta_rad: f64,
    /// Release point, x horizontal [m].
    pub x0_m: f64,
    /// Release point, y vertical [m].
    pub y0_m: f64,
}

impl ExitPlane {
    pub fn new(
        d_m: f64,
        v_mps: f64,
        gas: Fluid,
        ambient: Fluid,
        theta_rad: f64,
        x0_m: f64,
        y0_m: f64,
    ) -> JetResult<Self> {
        if !d_m.is_finite() || d_m <= 0.0 {
            return Err(JetError::NonPhysical {
                what: "exit diameter",
            });
        }
        if !v_mps.is_finite() || v_mps <= 0.0 {
            return Err(JetError::NonPhysical {
                what: "exit velocity",
            });
        }
        if !theta_rad.is_finite() || !x0_m.is_finite() || !y0_m.is_finite() {
            return Err(JetError::NonPhysical {
                what: "release geometry",
            });
        }
        Ok(Self {
            d_m,
            v_mps,
            gas,
            ambient,
            theta_rad,
            x0_m,
            y0_m,
        })
    }

    /// Build from a notional-nozzle pseudo-source.
    ///
    /// The discharge coefficient folds into the flow diameter, so the plane
    /// carries the pseudo-source's full mass flow.
    pub fn from_effective(
        eff: &EffectiveSource,
        ambient: Fluid,
        theta_rad: f64,
        x0_m: f64,
        y0_m: f64,
    ) -> JetResult<Self> {
        let d_flow = eff.orifice.diameter() * eff.orifice.cd().sqrt();
        Self::new(
            d_flow,
            eff.v_mps,
            eff.gas.clone(),
            ambient,
            theta_rad,
            x0_m,
            y0_m,
        )
    }

    /// Plug-flow mass flow [kg/s].
    pub fn mdot_kgps(&self) -> f64 {
        self.gas.rho() * self.v_mps * PI / 4.0 * self.d_m * self.d_m
    }

    /// Plug-flow momentum flux [kg·m/s²].
    pub fn momentum_flux(&self) -> f64 {
        self.gas.rho() * self.v_mps * self.v_mps * PI / 4.0 * self.d_m * self.d_m
    }

    /// Densimetric Froude number; infinite for a neutrally-buoyant release.
    pub fn froude(&self) -> f64 {
        let rho0 = self.gas.rho();
        let drho = (self.ambient.rho() - rho0).abs();
        if drho < 1.0e-12 {
            return f64::INFINITY;
        }
        self.v_mps / (G0_MPS2 * self.d_m * drho / rho0).sqrt()
    }
}

/// Gaussian state at the end of the establishment zone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EstablishedNode {
    pub s_m: f64,
    pub v_mps: f64,
    pub b_m: f64,
    pub rho_kg_m3: f64,
    pub y_mass: f64,
    pub theta_rad: f64,
    pub x_m: f64,
    pub y_m: f64,
}

/// Closed-form plug-flow-to-Gaussian transition.
///
/// The initial half-width makes the Gaussian species flux
/// `π B₀² V₀ ρ₀ λ²/(1+λ²)` equal to the plug-flow flux `(π/4) d₀² ρ₀ V₀`,
/// with centerline velocity, density, and mass fraction carried unchanged.
pub(crate) fn establish(exit: &ExitPlane, lambda: f64) -> EstablishedNode {
    let s0 = ESTABLISHMENT_DIAMETERS * exit.d_m;
    let b0 = exit.d_m / 2.0 * (1.0 + lambda * lambda).sqrt() / lambda;
    EstablishedNode {
        s_m: s0,
        v_mps: exit.v_mps,
        b_m: b0,
        rho_kg_m3: exit.gas.rho(),
        y_mass: 1.0,
        theta_rad: exit.theta_rad,
        x_m: exit.x0_m + s0 * exit.theta_rad.cos(),
        y_m: exit.y0_m + s0 * exit.theta_rad.sin(),
    }
}
