//! Equations of state and isentropic flow relations.
//!
//! Three closed, tagged models share one capability surface: any two of
//! (T, P, rho) determine the third, and the isentropic transition relations
//! are parameterized by (gamma, co-volume b) so that the ideal gas is just
//! b = 0. The Abel-Noble form captures hydrogen's repulsive real-gas
//! behavior at storage pressures; the tabulated model covers state-point
//! properties where a constant co-volume is not enough.

use crate::blend::Blend;
use crate::error::{FluidError, FluidResult};
use crate::ztable::ZTable;
use hy_solver::{brent, newton_system, NewtonConfig, RootConfig, SolverError};
use nalgebra::{dvector, DVector};
use tracing::debug;

/// Equation-of-state model selection.
#[derive(Debug, Clone, PartialEq)]
pub enum GasModel {
    /// Thermally and calorically perfect gas.
    IdealGas,
    /// Abel-Noble: P·(1/rho - b) = R·T with constant co-volume b.
    AbelNoble,
    /// Compressibility-factor table for state points; transition relations
    /// fall back to the co-volume form.
    RealGasTable(ZTable),
}

/// Conditions at a nozzle throat (or at a requested Mach number).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroatState {
    pub t_k: f64,
    pub p_pa: f64,
    pub rho_kg_m3: f64,
    /// Local speed of sound [m/s].
    pub sound_mps: f64,
    /// Flow velocity [m/s] (Mach · sound speed).
    pub v_mps: f64,
}

/// Effective density rho/(1 - b·rho); the variable in which Abel-Noble
/// isentropes look ideal.
fn effective_density(rho: f64, b: f64) -> f64 {
    rho / (1.0 - b * rho)
}

/// Invert effective density: rho = rho*/(1 + b·rho*).
fn from_effective_density(rho_star: f64, b: f64) -> f64 {
    rho_star / (1.0 + b * rho_star)
}

impl GasModel {
    /// Co-volume used by the transition relations [m³/kg].
    pub fn co_volume(&self, blend: &Blend) -> f64 {
        match self {
            GasModel::IdealGas => 0.0,
            GasModel::AbelNoble | GasModel::RealGasTable(_) => blend.co_volume(),
        }
    }

    /// Density from temperature and pressure.
    pub fn density(&self, t_k: f64, p_pa: f64, blend: &Blend) -> FluidResult<f64> {
        let r = blend.specific_gas_constant();
        match self {
            GasModel::IdealGas => Ok(p_pa / (r * t_k)),
            GasModel::AbelNoble => {
                let b = blend.co_volume();
                Ok(p_pa / (r * t_k + b * p_pa))
            }
            GasModel::RealGasTable(table) => {
                let z = table.z(t_k, p_pa)?;
                Ok(p_pa / (z * r * t_k))
            }
        }
    }

    /// Pressure from temperature and density.
    pub fn pressure(&self, t_k: f64, rho: f64, blend: &Blend) -> FluidResult<f64> {
        let r = blend.specific_gas_constant();
        match self {
            GasModel::IdealGas => Ok(rho * r * t_k),
            GasModel::AbelNoble => {
                let b = blend.co_volume();
                if b * rho >= 1.0 {
                    return Err(FluidError::NonPhysical {
                        what: "density at or above co-volume packing limit",
                    });
                }
                Ok(rho * r * t_k / (1.0 - b * rho))
            }
            GasModel::RealGasTable(table) => {
                let (p_lo, p_hi) = table.p_range();
                let p = brent(
                    |p| {
                        let d = self.density(t_k, p, blend).map_err(|e| {
                            SolverError::Numeric {
                                what: e.to_string(),
                            }
                        })?;
                        Ok(d - rho)
                    },
                    p_lo,
                    p_hi,
                    &RootConfig::default(),
                )
                .map_err(|_| FluidError::PropertyLookup {
                    what: format!("no tabulated pressure matches rho={rho:.4} kg/m3 at T={t_k:.2} K"),
                })?;
                Ok(p)
            }
        }
    }

    /// Temperature from pressure and density.
    pub fn temperature(&self, p_pa: f64, rho: f64, blend: &Blend) -> FluidResult<f64> {
        let r = blend.specific_gas_constant();
        match self {
            GasModel::IdealGas => Ok(p_pa / (rho * r)),
            GasModel::AbelNoble => {
                let b = blend.co_volume();
                Ok(p_pa * (1.0 - b * rho) / (rho * r))
            }
            GasModel::RealGasTable(table) => {
                let (t_lo, t_hi) = table.t_range();
                let t = brent(
                    |t| {
                        let d = self.density(t, p_pa, blend).map_err(|e| {
                            SolverError::Numeric {
                                what: e.to_string(),
                            }
                        })?;
                        Ok(d - rho)
                    },
                    t_lo,
                    t_hi,
                    &RootConfig::default(),
                )
                .map_err(|_| FluidError::PropertyLookup {
                    what: format!(
                        "no tabulated temperature matches rho={rho:.4} kg/m3 at P={p_pa:.3e} Pa"
                    ),
                })?;
                Ok(t)
            }
        }
    }

    /// Local speed of sound [m/s].
    pub fn speed_of_sound(&self, t_k: f64, rho: f64, blend: &Blend) -> f64 {
        let b = self.co_volume(blend);
        (blend.gamma() * blend.specific_gas_constant() * t_k).sqrt() / (1.0 - b * rho)
    }

    /// Specific enthalpy [J/kg]: h = cp·T + b·P.
    pub fn enthalpy(&self, t_k: f64, p_pa: f64, blend: &Blend) -> f64 {
        blend.cp() * t_k + self.co_volume(blend) * p_pa
    }

    /// Specific internal energy [J/kg]: u = cv·T.
    pub fn internal_energy(&self, t_k: f64, blend: &Blend) -> f64 {
        blend.cv() * t_k
    }

    /// Upstream/downstream pressure ratio above which the flow chokes:
    /// ((gamma+1)/2)^(gamma/(gamma-1)).
    pub fn critical_ratio(&self, blend: &Blend) -> f64 {
        let g = blend.gamma();
        ((g + 1.0) / 2.0).powf(g / (g - 1.0))
    }

    /// Temperature after isentropic expansion to a new density.
    ///
    /// T2 = T1 · (rho*2 / rho*1)^(gamma-1), in effective-density form.
    pub fn temperature_isentropic_density(
        &self,
        t1_k: f64,
        rho1: f64,
        rho2: f64,
        blend: &Blend,
    ) -> FluidResult<f64> {
        if rho1 <= 0.0 || rho2 <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive for isentropic relation",
            });
        }
        let b = self.co_volume(blend);
        let ratio = effective_density(rho2, b) / effective_density(rho1, b);
        Ok(t1_k * ratio.powf(blend.gamma() - 1.0))
    }

    /// Static temperature at a Mach number from stagnation temperature.
    pub fn temperature_isentropic_mach(&self, t0_k: f64, mach: f64, blend: &Blend) -> f64 {
        let g = blend.gamma();
        t0_k / (1.0 + 0.5 * (g - 1.0) * mach * mach)
    }

    /// Static density at a Mach number from stagnation conditions.
    pub fn density_isentropic_mach(
        &self,
        t0_k: f64,
        rho0: f64,
        mach: f64,
        blend: &Blend,
    ) -> FluidResult<f64> {
        let g = blend.gamma();
        let b = self.co_volume(blend);
        let t_ratio = 1.0 / (1.0 + 0.5 * (g - 1.0) * mach * mach);
        let rho_star = effective_density(rho0, b) * t_ratio.powf(1.0 / (g - 1.0));
        Ok(from_effective_density(rho_star, b))
    }

    /// Static pressure at a Mach number from stagnation conditions.
    pub fn pressure_isentropic_mach(
        &self,
        t0_k: f64,
        rho0: f64,
        mach: f64,
        blend: &Blend,
    ) -> FluidResult<f64> {
        let t = self.temperature_isentropic_mach(t0_k, mach, blend);
        let rho = self.density_isentropic_mach(t0_k, rho0, mach, blend)?;
        self.pressure(t, rho, blend)
    }

    /// Conditions at the given Mach number for a stagnation state,
    /// simultaneously satisfying the isentrope and the energy balance.
    ///
    /// Mach 1 gives the choked throat. Closed form for the ideal gas; a
    /// 2x2 Newton solve on (rho_t, T_t) otherwise, started from the
    /// ideal-gas solution.
    pub fn throat(
        &self,
        t0_k: f64,
        p0_pa: f64,
        rho0: f64,
        blend: &Blend,
        mach: f64,
    ) -> FluidResult<ThroatState> {
        if mach <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "Mach number must be positive",
            });
        }
        let g = blend.gamma();
        let r = blend.specific_gas_constant();

        // Ideal-gas closed form, also the Newton starting point
        let t_ideal = self.temperature_isentropic_mach(t0_k, mach, blend);
        let rho_ideal =
            rho0 * (t_ideal / t0_k).powf(1.0 / (g - 1.0));

        if matches!(self, GasModel::IdealGas) {
            let sound = (g * r * t_ideal).sqrt();
            return Ok(ThroatState {
                t_k: t_ideal,
                p_pa: rho_ideal * r * t_ideal,
                rho_kg_m3: rho_ideal,
                sound_mps: sound,
                v_mps: mach * sound,
            });
        }

        let b = self.co_volume(blend);
        let cp = blend.cp();
        let h0 = cp * t0_k + b * p0_pa;
        let rho_star0 = effective_density(rho0, b);

        let residual = |x: &DVector<f64>| {
            let rho_t = x[0];
            let t_t = x[1];
            if b * rho_t >= 1.0 {
                // Signal the line search away from the packing limit
                return Ok(dvector![1.0e3, 1.0e3]);
            }
            let p_t = rho_t * r * t_t / (1.0 - b * rho_t);
            let a_t = (g * r * t_t).sqrt() / (1.0 - b * rho_t);
            let v_t = mach * a_t;
            let isentrope =
                t_t / t0_k - (effective_density(rho_t, b) / rho_star0).powf(g - 1.0);
            let energy = (h0 - (cp * t_t + b * p_t) - 0.5 * v_t * v_t) / h0;
            Ok(dvector![isentrope, energy])
        };

        let cfg = NewtonConfig {
            lower_bounds: Some(vec![1e-9, 1.0]),
            ..NewtonConfig::default()
        };
        let x = newton_system(dvector![rho_ideal, t_ideal], residual, &cfg)?;
        let (rho_t, t_t) = (x[0], x[1]);
        debug!(rho_t, t_t, mach, "throat solve converged");

        let p_t = self.pressure(t_t, rho_t, blend)?;
        let sound = (g * r * t_t).sqrt() / (1.0 - b * rho_t);
        Ok(ThroatState {
            t_k: t_t,
            p_pa: p_t,
            rho_kg_m3: rho_t,
            sound_mps: sound,
            v_mps: mach * sound,
        })
    }
}
