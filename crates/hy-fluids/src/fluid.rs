//! The `Fluid` type: a blend plus a coherent thermodynamic state.

use crate::blend::Blend;
use crate::eos::{GasModel, ThroatState};
use crate::error::{FluidError, FluidResult};
use hy_core::units::{Density, Pressure, Temperature};

/// Which two state variables define the state.
///
/// Exactly two of (T, P, rho) are independent; the enum makes an
/// over- or under-specified state unrepresentable in typed code. The
/// optional-scalar boundary goes through [`Fluid::from_optional`], which
/// enforces the same rule on loosely typed input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateSpec {
    TP { t: Temperature, p: Pressure },
    TRho { t: Temperature, rho: Density },
    PRho { p: Pressure, rho: Density },
}

/// A gas blend at a fully determined (T, P, rho) point.
///
/// Immutable at a point: state changes produce a new `Fluid` via
/// [`Fluid::with_state`], so history snapshots taken during blowdown stay
/// valid as the tank evolves.
#[derive(Debug, Clone, PartialEq)]
pub struct Fluid {
    blend: Blend,
    model: GasModel,
    t_k: f64,
    p_pa: f64,
    rho_kg_m3: f64,
}

impl Fluid {
    /// Create a fluid from two state variables; the third is computed.
    pub fn new(blend: Blend, model: GasModel, spec: StateSpec) -> FluidResult<Self> {
        let (t_k, p_pa, rho_kg_m3) = match spec {
            StateSpec::TP { t, p } => {
                let (t_k, p_pa) = (t.value, p.value);
                let rho = model.density(t_k, p_pa, &blend)?;
                (t_k, p_pa, rho)
            }
            StateSpec::TRho { t, rho } => {
                let (t_k, rho_v) = (t.value, rho.value);
                let p = model.pressure(t_k, rho_v, &blend)?;
                (t_k, p, rho_v)
            }
            StateSpec::PRho { p, rho } => {
                let (p_pa, rho_v) = (p.value, rho.value);
                let t = model.temperature(p_pa, rho_v, &blend)?;
                (t, p_pa, rho_v)
            }
        };

        for (value, what) in [
            (t_k, "temperature"),
            (p_pa, "pressure"),
            (rho_kg_m3, "density"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FluidError::NonPhysical { what });
            }
        }

        Ok(Self {
            blend,
            model,
            t_k,
            p_pa,
            rho_kg_m3,
        })
    }

    /// Boundary constructor for loosely specified input.
    ///
    /// Exactly two of the three must be supplied; zero, one, or all three
    /// is a specification error. (Three could be silently reconciled, but
    /// an over-determined state almost always means the caller passed
    /// stale data.)
    pub fn from_optional(
        blend: Blend,
        model: GasModel,
        t: Option<Temperature>,
        p: Option<Pressure>,
        rho: Option<Density>,
    ) -> FluidResult<Self> {
        let given = [t.is_some(), p.is_some(), rho.is_some()]
            .iter()
            .filter(|&&x| x)
            .count();
        if given != 2 {
            return Err(FluidError::Specification {
                what: format!("exactly 2 of (T, P, rho) must be given, got {given}"),
            });
        }
        let spec = match (t, p, rho) {
            (Some(t), Some(p), None) => StateSpec::TP { t, p },
            (Some(t), None, Some(rho)) => StateSpec::TRho { t, rho },
            (None, Some(p), Some(rho)) => StateSpec::PRho { p, rho },
            _ => unreachable!("two-of-three checked above"),
        };
        Self::new(blend, model, spec)
    }

    /// Same blend and model at a new state point.
    pub fn with_state(&self, spec: StateSpec) -> FluidResult<Self> {
        Self::new(self.blend.clone(), self.model.clone(), spec)
    }

    pub fn blend(&self) -> &Blend {
        &self.blend
    }

    pub fn model(&self) -> &GasModel {
        &self.model
    }

    pub fn temperature(&self) -> Temperature {
        hy_core::units::k(self.t_k)
    }

    pub fn pressure(&self) -> Pressure {
        hy_core::units::pa(self.p_pa)
    }

    pub fn density(&self) -> Density {
        hy_core::units::kg_m3(self.rho_kg_m3)
    }

    /// Temperature [K].
    pub fn t_k(&self) -> f64 {
        self.t_k
    }

    /// Pressure [Pa].
    pub fn p_pa(&self) -> f64 {
        self.p_pa
    }

    /// Density [kg/m³].
    pub fn rho(&self) -> f64 {
        self.rho_kg_m3
    }

    /// Local speed of sound [m/s].
    pub fn speed_of_sound(&self) -> f64 {
        self.model
            .speed_of_sound(self.t_k, self.rho_kg_m3, &self.blend)
    }

    /// Specific enthalpy [J/kg].
    pub fn enthalpy(&self) -> f64 {
        self.model.enthalpy(self.t_k, self.p_pa, &self.blend)
    }

    /// Specific internal energy [J/kg].
    pub fn internal_energy(&self) -> f64 {
        self.model.internal_energy(self.t_k, &self.blend)
    }

    /// Choked-flow pressure ratio for this blend.
    pub fn critical_ratio(&self) -> f64 {
        self.model.critical_ratio(&self.blend)
    }

    /// Whether a release into the given ambient pressure is choked.
    pub fn is_choked_against(&self, ambient_p_pa: f64) -> bool {
        self.p_pa >= self.critical_ratio() * ambient_p_pa
    }

    /// Throat conditions at the given Mach number (1 = choked).
    pub fn throat(&self, mach: f64) -> FluidResult<ThroatState> {
        self.model
            .throat(self.t_k, self.p_pa, self.rho_kg_m3, &self.blend, mach)
    }

    /// New fluid after isentropic expansion/compression to `rho2`.
    ///
    /// This is the per-step state update in tank blowdown: density falls
    /// as mass leaves, temperature follows the isentrope, pressure from
    /// the equation of state.
    pub fn isentropic_to_density(&self, rho2: f64) -> FluidResult<Self> {
        let t2 = self.model.temperature_isentropic_density(
            self.t_k,
            self.rho_kg_m3,
            rho2,
            &self.blend,
        )?;
        self.with_state(StateSpec::TRho {
            t: hy_core::units::k(t2),
            rho: hy_core::units::kg_m3(rho2),
        })
    }
}
