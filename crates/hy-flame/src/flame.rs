//! Turbulent jet flame: trajectory, visible length, radiant emission.
//!
//! The flame rides the jet integral model with flame spreading constants,
//! then closes the radiative picture with two correlations: visible flame
//! length from the flame Froude number (Delichatsios) and radiant fraction
//! from the global residence time (Molina et al.). The product-side inputs
//! both correlations need come from the caller-owned
//! [`CombustionProducts`] cache.

use crate::chemistry::CombustionProducts;
use crate::error::{FlameError, FlameResult};
use crate::radiation::{point_sources, PointSource};
use hy_core::units::constants::G0_MPS2;
use hy_fluids::{Blend, Fluid, Species};
use hy_jet::{ExitPlane, Jet, JetConfig};
use hy_release::{EffectiveSource, NozzleModel, Orifice};
use tracing::debug;

/// Gaussian spreading ratio for a reacting jet.
const FLAME_LAMBDA: f64 = 1.24;

/// Flame width as a fraction of visible length.
const FLAME_WIDTH_RATIO: f64 = 0.17;

/// Solver and radiation controls for a flame solve.
#[derive(Debug, Clone)]
pub struct FlameConfig {
    /// Trajectory march controls; the spreading ratio defaults to the
    /// reacting-jet value instead of the cold-jet one.
    pub jet: JetConfig,
    /// Release angle from horizontal [rad].
    pub release_angle_rad: f64,
    /// Ambient relative humidity (0..=1) for atmospheric attenuation.
    pub humidity: f64,
    /// Number of emitters along the visible flame for the multi-point
    /// source model.
    pub n_sources: usize,
}

impl Default for FlameConfig {
    fn default() -> Self {
        Self {
            jet: JetConfig {
                lambda: FLAME_LAMBDA,
                ..JetConfig::default()
            },
            release_angle_rad: 0.0,
            humidity: 0.89,
            n_sources: 50,
        }
    }
}

/// Planck-mean absorption coefficient [1/m] of the blend's combustion
/// products, mole-weighted over the fuel components.
fn planck_absorption(blend: &Blend) -> f64 {
    let fuel: f64 = blend
        .iter()
        .filter_map(|(sp, x)| {
            let a = match sp {
                Species::H2 => 0.23,
                Species::CH4 => 0.33,
                Species::C3H8 => 0.34,
                _ => return None,
            };
            Some(x * a)
        })
        .sum();
    fuel / blend.fuel_fraction()
}

/// A solved jet flame.
#[derive(Debug, Clone)]
pub struct Flame {
    jet: Jet,
    mdot_kgps: f64,
    visible_length_m: f64,
    flame_width_m: f64,
    radiant_fraction: f64,
    pub(crate) srad_w: f64,
    t_ad_peak_k: f64,
    pub(crate) t_amb_k: f64,
    pub(crate) humidity: f64,
    pub(crate) sources: Vec<PointSource>,
    pub(crate) midpoint: (f64, f64),
}

impl Flame {
    /// Solve the flame for an exit plane, reusing (or rebuilding) the
    /// chemistry cache for the ambient reactant state.
    pub fn solve(
        exit: &ExitPlane,
        chem: &mut CombustionProducts,
        cfg: &FlameConfig,
    ) -> FlameResult<Self> {
        if exit.gas.blend() != chem.blend() {
            return Err(FlameError::NonPhysical {
                what: "chemistry cache built for a different blend",
            });
        }
        if !(0.0..=1.0).contains(&cfg.humidity) || !cfg.humidity.is_finite() {
            return Err(FlameError::NonPhysical {
                what: "relative humidity",
            });
        }
        if cfg.n_sources == 0 {
            return Err(FlameError::NonPhysical {
                what: "emitter count",
            });
        }
        chem.ensure_state(exit.ambient.t_k(), exit.ambient.p_pa())?;

        let jet = Jet::solve(exit, &cfg.jet)?;
        let mdot = exit.mdot_kgps();
        let dh_c = exit
            .gas
            .blend()
            .heat_of_combustion()
            .ok_or(FlameError::NonPhysical {
                what: "blend without heat of combustion",
            })?;

        let f_s = chem.stoich_mixture_fraction();
        let t_ad = chem.adiabatic_flame_temp(f_s);
        let rho_prod = chem.density(f_s);
        let (t_amb, rho_amb) = (exit.ambient.t_k(), exit.ambient.rho());
        let (rho_e, d_e, v_e) = (exit.gas.rho(), exit.d_m, exit.v_mps);
        if t_ad <= t_amb {
            return Err(FlameError::NonPhysical {
                what: "flame temperature rise",
            });
        }

        // Flame Froude number and the Delichatsios visible length
        let fr_f = v_e * f_s.powf(1.5)
            / ((rho_e / rho_amb).powf(0.25)
                * ((t_ad - t_amb) / t_amb * G0_MPS2 * d_e).sqrt());
        let l_star = if fr_f < 5.0 {
            13.5 * fr_f.powf(0.4) / (1.0 + 0.07 * fr_f * fr_f).powf(0.2)
        } else {
            23.0
        };
        let d_star = d_e * (rho_e / rho_amb).sqrt();
        let visible_length = l_star * d_star / f_s;
        let flame_width = FLAME_WIDTH_RATIO * visible_length;

        // Molina radiant fraction from the global residence time; the
        // published fit takes the residence time in milliseconds.
        // Optically thin lab-scale flames can extrapolate below zero, so
        // the fraction floors at zero.
        let tau_f = rho_prod * flame_width * flame_width * visible_length * f_s
            / (3.0 * rho_e * d_e * d_e * v_e);
        let a_p = planck_absorption(exit.gas.blend());
        let x_rad =
            (0.08916 * (1.0e3 * tau_f * a_p * t_ad.powi(4)).log10() - 1.2172).max(0.0);
        let srad = x_rad * mdot * dh_c;

        let (sources, midpoint) = point_sources(&jet, visible_length, cfg.n_sources)?;
        debug!(visible_length, x_rad, srad, fr_f, "flame solved");

        Ok(Self {
            jet,
            mdot_kgps: mdot,
            visible_length_m: visible_length,
            flame_width_m: flame_width,
            radiant_fraction: x_rad,
            srad_w: srad,
            t_ad_peak_k: chem.peak_flame_temp(),
            t_amb_k: t_amb,
            humidity: cfg.humidity,
            sources,
            midpoint,
        })
    }

    /// Solve a flame directly from tank conditions, resolving the
    /// notional-nozzle correction (choked) or the supplied flow
    /// (unchoked) with the release at the origin.
    pub fn from_release(
        tank: &Fluid,
        orifice: &Orifice,
        ambient: &Fluid,
        nozzle: NozzleModel,
        mdot_override_kgps: Option<f64>,
        chem: &mut CombustionProducts,
        cfg: &FlameConfig,
    ) -> FlameResult<Self> {
        let eff = EffectiveSource::resolve(tank, orifice, ambient, nozzle, mdot_override_kgps)?;
        let exit =
            ExitPlane::from_effective(&eff, ambient.clone(), cfg.release_angle_rad, 0.0, 0.0)?;
        Self::solve(&exit, chem, cfg)
    }

    /// Underlying reacting-jet trajectory.
    pub fn jet(&self) -> &Jet {
        &self.jet
    }

    /// Release mass flow [kg/s].
    pub fn mdot_kgps(&self) -> f64 {
        self.mdot_kgps
    }

    /// Visible flame length [m].
    pub fn visible_length_m(&self) -> f64 {
        self.visible_length_m
    }

    /// Flame width at the waist [m].
    pub fn flame_width_m(&self) -> f64 {
        self.flame_width_m
    }

    /// Fraction of the heat release leaving as radiation.
    pub fn radiant_fraction(&self) -> f64 {
        self.radiant_fraction
    }

    /// Total radiated power [W].
    pub fn radiated_power_w(&self) -> f64 {
        self.srad_w
    }

    /// Peak adiabatic product temperature [K].
    pub fn peak_flame_temp_k(&self) -> f64 {
        self.t_ad_peak_k
    }
}
