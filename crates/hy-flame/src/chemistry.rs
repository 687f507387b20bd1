//! Complete-combustion product chemistry over mixture fraction.
//!
//! The flame model needs adiabatic-flame temperature, product molar mass,
//! and product density as functions of mixture fraction. All three come
//! from the same construction: at each point of a dense mixture-fraction
//! grid, form the complete-combustion product slate ("mixed is burnt",
//! excess reactant passes through) and solve the enthalpy balance for the
//! product temperature with Brent's method. The solved curves are cached
//! as interpolants keyed to the reactant state; a rebuild happens only
//! when reactant temperature or pressure actually drifts.

use crate::error::{FlameError, FlameResult};
use hy_core::units::constants::R_UNIVERSAL;
use hy_fluids::{Blend, Species};
use hy_solver::{brent, Interp1, RootConfig};
use tracing::debug;

/// Enthalpy datum temperature [K].
const T_REF_K: f64 = 298.15;

/// Mole fraction of oxygen in dry air.
const X_O2_AIR: f64 = 0.209_46;

/// Mixture-fraction grid resolution.
const GRID_POINTS: usize = 301;

/// Relative reactant-state drift that invalidates the cache.
const STATE_DRIFT_REL: f64 = 1.0e-6;

/// Bracket for the product-temperature solve [K].
const T_LO_K: f64 = 150.0;
const T_HI_K: f64 = 6000.0;

/// Standard formation enthalpy [J/mol], gas phase.
fn formation_enthalpy(sp: Species) -> f64 {
    match sp {
        Species::CH4 => -74_870.0,
        Species::C3H8 => -104_680.0,
        Species::CO2 => -393_510.0,
        Species::CO => -110_530.0,
        Species::H2O => -241_826.0,
        _ => 0.0,
    }
}

/// Linear molar heat-capacity fit cp(T) = a + b·T [J/(mol·K)], valid over
/// the flame-temperature range.
fn cp_coeffs(sp: Species) -> (f64, f64) {
    match sp {
        Species::H2 => (27.9, 3.2e-3),
        Species::CH4 => (25.3, 3.45e-2),
        Species::C3H8 => (40.8, 1.095e-1),
        Species::N2 => (27.9, 4.0e-3),
        Species::O2 => (27.9, 4.9e-3),
        Species::CO2 => (33.1, 1.36e-2),
        Species::CO => (27.9, 4.2e-3),
        Species::H2O => (30.5, 1.03e-2),
        Species::He => (20.786, 0.0),
        Species::Air => (27.9, 4.2e-3),
    }
}

/// Molar enthalpy [J/mol] at `t_k` relative to elements at the datum.
fn molar_enthalpy(sp: Species, t_k: f64) -> f64 {
    let (a, b) = cp_coeffs(sp);
    formation_enthalpy(sp) + a * (t_k - T_REF_K) + 0.5 * b * (t_k * t_k - T_REF_K * T_REF_K)
}

/// Carbon and hydrogen atoms per molecule; `None` for non-fuels.
fn atom_counts(sp: Species) -> Option<(f64, f64)> {
    match sp {
        Species::H2 => Some((0.0, 2.0)),
        Species::CH4 => Some((1.0, 4.0)),
        Species::C3H8 => Some((3.0, 8.0)),
        _ => None,
    }
}

/// Moles of O2 consumed per mole of blend at complete combustion.
fn o2_demand_per_mole(blend: &Blend) -> f64 {
    blend
        .iter()
        .filter_map(|(sp, x)| atom_counts(sp).map(|(c, h)| x * (c + h / 4.0)))
        .sum()
}

/// Species inventory in mol per kg of fuel/air mixture.
#[derive(Debug, Clone)]
struct Slate {
    moles: Vec<(Species, f64)>,
}

impl Slate {
    fn add(&mut self, sp: Species, n: f64) {
        if n <= 0.0 {
            return;
        }
        match self.moles.iter_mut().find(|(s, _)| *s == sp) {
            Some((_, existing)) => *existing += n,
            None => self.moles.push((sp, n)),
        }
    }

    fn total_moles(&self) -> f64 {
        self.moles.iter().map(|(_, n)| n).sum()
    }

    /// Mixture enthalpy [J per kg of mixture] at `t_k`.
    fn enthalpy(&self, t_k: f64) -> f64 {
        self.moles
            .iter()
            .map(|(sp, n)| n * molar_enthalpy(*sp, t_k))
            .sum()
    }

    /// Mean molar mass [kg/kmol]; the slate holds exactly one kg.
    fn molar_mass(&self) -> f64 {
        1.0e3 / self.total_moles()
    }
}

/// Reactant slate at mixture fraction `f`: blend species plus air split
/// into O2 and N2.
fn reactant_slate(blend: &Blend, f: f64) -> Slate {
    let n_fuel_stream = 1.0e3 * f / blend.molar_mass();
    let n_air = 1.0e3 * (1.0 - f) / Species::Air.molar_mass();
    let mut slate = Slate { moles: Vec::new() };
    for (sp, x) in blend.iter() {
        slate.add(sp, x * n_fuel_stream);
    }
    slate.add(Species::O2, X_O2_AIR * n_air);
    slate.add(Species::N2, (1.0 - X_O2_AIR) * n_air);
    slate
}

/// Complete-combustion product slate at mixture fraction `f`.
///
/// Lean side burns all fuel; rich side burns the fraction the available
/// oxygen supports and passes the rest through unreacted.
fn product_slate(blend: &Blend, f: f64) -> Slate {
    let n_fuel_stream = 1.0e3 * f / blend.molar_mass();
    let n_air = 1.0e3 * (1.0 - f) / Species::Air.molar_mass();
    let n_o2 = X_O2_AIR * n_air;

    let demand = o2_demand_per_mole(blend) * n_fuel_stream;
    let burn = if demand > 0.0 {
        (n_o2 / demand).min(1.0)
    } else {
        0.0
    };

    let mut slate = Slate { moles: Vec::new() };
    for (sp, x) in blend.iter() {
        let n_sp = x * n_fuel_stream;
        match atom_counts(sp) {
            Some((c, h)) => {
                slate.add(sp, (1.0 - burn) * n_sp);
                slate.add(Species::CO2, burn * n_sp * c);
                slate.add(Species::H2O, burn * n_sp * h / 2.0);
            }
            None => slate.add(sp, n_sp),
        }
    }
    slate.add(Species::O2, n_o2 - burn * demand);
    slate.add(Species::N2, (1.0 - X_O2_AIR) * n_air);
    slate
}

/// Cached combustion-product curves for one reactant state.
///
/// Owned by the caller; nothing here is global. [`ensure_state`] makes
/// reuse across repeated flame solves explicit and cheap.
///
/// [`ensure_state`]: CombustionProducts::ensure_state
#[derive(Debug, Clone)]
pub struct CombustionProducts {
    blend: Blend,
    t_reac_k: f64,
    p_pa: f64,
    f_stoich: f64,
    t_ad: Interp1,
    mw: Interp1,
    rho: Interp1,
    drho: Interp1,
}

impl CombustionProducts {
    /// Build the cache for a fuel blend at the given reactant state.
    pub fn build(blend: &Blend, t_reac_k: f64, p_pa: f64) -> FlameResult<Self> {
        if !t_reac_k.is_finite() || t_reac_k <= T_LO_K || t_reac_k >= T_HI_K {
            return Err(FlameError::NonPhysical {
                what: "reactant temperature",
            });
        }
        if !p_pa.is_finite() || p_pa <= 0.0 {
            return Err(FlameError::NonPhysical {
                what: "reactant pressure",
            });
        }
        let nu_o2 = o2_demand_per_mole(blend);
        if nu_o2 <= 0.0 {
            return Err(FlameError::NonPhysical {
                what: "blend without fuel",
            });
        }

        // Stoichiometric mixture fraction, by mass
        let x_stoich = 1.0 / (1.0 + nu_o2 / X_O2_AIR);
        let mw_b = blend.molar_mass();
        let mw_air = Species::Air.molar_mass();
        let f_stoich = x_stoich * mw_b / (x_stoich * mw_b + (1.0 - x_stoich) * mw_air);

        // Uniform grid with the stoichiometric point forced onto it
        let mut grid: Vec<f64> = (0..GRID_POINTS)
            .map(|i| i as f64 / (GRID_POINTS - 1) as f64)
            .collect();
        if grid.iter().all(|&g| (g - f_stoich).abs() > 1e-12) {
            grid.push(f_stoich);
            grid.sort_by(|a, b| a.total_cmp(b));
        }

        let cfg = RootConfig {
            tol: 1e-8,
            max_iter: 200,
        };
        let mut t_ad = Vec::with_capacity(grid.len());
        let mut mw = Vec::with_capacity(grid.len());
        let mut rho = Vec::with_capacity(grid.len());
        for &f in &grid {
            let h_reac = reactant_slate(blend, f).enthalpy(t_reac_k);
            let products = product_slate(blend, f);
            // Product enthalpy rises monotonically in T, so the balance
            // has exactly one root in the bracket
            let t = brent(
                |t| Ok(products.enthalpy(t) - h_reac),
                T_LO_K,
                T_HI_K,
                &cfg,
            )?;
            let m = products.molar_mass();
            t_ad.push(t);
            mw.push(m);
            rho.push(p_pa * m * 1.0e-3 / (R_UNIVERSAL * t));
        }

        // Central-difference density slope over the same grid
        let n = grid.len();
        let mut slope = vec![0.0; n];
        for i in 0..n {
            let (lo, hi) = (i.saturating_sub(1), (i + 1).min(n - 1));
            slope[i] = (rho[hi] - rho[lo]) / (grid[hi] - grid[lo]);
        }

        debug!(
            fuel = ?blend.is_pure(),
            t_reac_k,
            p_pa,
            f_stoich,
            t_peak = t_ad.iter().cloned().fold(f64::MIN, f64::max),
            "combustion cache built"
        );

        Ok(Self {
            blend: blend.clone(),
            t_reac_k,
            p_pa,
            f_stoich,
            t_ad: Interp1::try_new(grid.clone(), t_ad)?,
            mw: Interp1::try_new(grid.clone(), mw)?,
            rho: Interp1::try_new(grid.clone(), rho)?,
            drho: Interp1::try_new(grid, slope)?,
        })
    }

    /// Rebuild if the reactant state drifted beyond tolerance.
    ///
    /// Returns whether a rebuild happened. Repeated solves at the same
    /// state hit the cache and pay nothing.
    pub fn ensure_state(&mut self, t_reac_k: f64, p_pa: f64) -> FlameResult<bool> {
        let t_drift = (t_reac_k - self.t_reac_k).abs() / self.t_reac_k;
        let p_drift = (p_pa - self.p_pa).abs() / self.p_pa;
        if t_drift <= STATE_DRIFT_REL && p_drift <= STATE_DRIFT_REL {
            return Ok(false);
        }
        debug!(t_drift, p_drift, "reactant state drifted, rebuilding chemistry");
        *self = Self::build(&self.blend, t_reac_k, p_pa)?;
        Ok(true)
    }

    /// Fuel blend the cache was built for.
    pub fn blend(&self) -> &Blend {
        &self.blend
    }

    /// Cached reactant temperature [K].
    pub fn t_reac_k(&self) -> f64 {
        self.t_reac_k
    }

    /// Cached reactant pressure [Pa].
    pub fn p_pa(&self) -> f64 {
        self.p_pa
    }

    /// Stoichiometric mixture fraction (fuel-stream mass fraction).
    pub fn stoich_mixture_fraction(&self) -> f64 {
        self.f_stoich
    }

    /// Adiabatic product temperature [K] at mixture fraction `f`.
    pub fn adiabatic_flame_temp(&self, f: f64) -> f64 {
        self.t_ad.eval(f)
    }

    /// Hottest product temperature on the grid [K]; sits at stoichiometry.
    pub fn peak_flame_temp(&self) -> f64 {
        self.t_ad.argmax().1
    }

    /// Product molar mass [kg/kmol] at mixture fraction `f`.
    pub fn molar_mass(&self, f: f64) -> f64 {
        self.mw.eval(f)
    }

    /// Product density [kg/m³] at mixture fraction `f` and cache pressure.
    pub fn density(&self, f: f64) -> f64 {
        self.rho.eval(f)
    }

    /// Product-density slope dρ/df at mixture fraction `f`.
    pub fn drho_df(&self, f: f64) -> f64 {
        self.drho.eval(f)
    }
}
