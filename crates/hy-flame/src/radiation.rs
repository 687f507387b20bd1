//! Radiative source models and atmospheric attenuation.
//!
//! Flux at a target sums point-source contributions: either one emitter
//! at the visible-length midpoint, or emitters spread along the full
//! flame with weights rising to a waist at three quarters of the visible
//! length. Every path is attenuated by the Wayne (1991) humid-air
//! transmissivity fit.

use crate::error::{FlameError, FlameResult};
use crate::flame::Flame;
use hy_core::keys::normalize_key;
use hy_jet::Jet;
use hy_solver::Interp1;
use std::f64::consts::PI;

/// Emissive weighting peaks at this fraction of the visible length.
const WAIST_FRACTION: f64 = 0.75;

/// How the flame is collapsed into radiating points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadSourceModel {
    /// Weighted emitters along the whole visible flame.
    Multi,
    /// One emitter at the visible-length midpoint.
    Single,
}

impl RadSourceModel {
    /// Resolve a user-facing selector string.
    pub fn from_key(key: &str) -> FlameResult<Self> {
        match normalize_key(key).as_str() {
            "multi" | "multipoint" | "multisource" => Ok(RadSourceModel::Multi),
            "single" | "singlepoint" | "point" => Ok(RadSourceModel::Single),
            _ => Err(FlameError::UnknownModel { name: key.into() }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RadSourceModel::Multi => "multi",
            RadSourceModel::Single => "single",
        }
    }
}

/// One emitter on the flame axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointSource {
    pub x_m: f64,
    pub y_m: f64,
    pub weight: f64,
}

/// Emitter positions along the trajectory with normalized waist-peaked
/// weights, plus the midpoint for the single-source model.
pub(crate) fn point_sources(
    jet: &Jet,
    visible_length_m: f64,
    n: usize,
) -> FlameResult<(Vec<PointSource>, (f64, f64))> {
    let sx = Interp1::try_new(jet.s().to_vec(), jet.x().to_vec())?;
    let sy = Interp1::try_new(jet.s().to_vec(), jet.y().to_vec())?;

    let mut sources = Vec::with_capacity(n);
    let mut norm = 0.0;
    for j in 0..n {
        let zeta = (j as f64 + 0.5) / n as f64;
        let s_j = zeta * visible_length_m;
        let weight = if zeta <= WAIST_FRACTION {
            zeta / WAIST_FRACTION
        } else {
            (1.0 - zeta) / (1.0 - WAIST_FRACTION)
        };
        norm += weight;
        sources.push(PointSource {
            x_m: sx.eval(s_j),
            y_m: sy.eval(s_j),
            weight,
        });
    }
    for src in &mut sources {
        src.weight /= norm;
    }
    let midpoint = (
        sx.eval(0.5 * visible_length_m),
        sy.eval(0.5 * visible_length_m),
    );
    Ok((sources, midpoint))
}

/// Wayne (1991) atmospheric transmissivity over a path.
///
/// Closed form in the water and carbon-dioxide optical depths; both floor
/// at 1 so short paths attenuate nothing, and the result clamps to
/// `[0, 1]`. Anchored at 0.8508 for a 10 m path through 288 K air at 89%
/// relative humidity.
pub fn transmissivity(path_length_m: f64, t_amb_k: f64, relative_humidity: f64) -> f64 {
    // Saturated water vapor pressure [mmHg]
    let smm = (20.386 - 5132.0 / t_amb_k).exp();
    let x_h2o = (relative_humidity * path_length_m * smm * 288.651 / t_amb_k).max(1.0);
    let x_co2 = (path_length_m * 273.0 / t_amb_k).max(1.0);
    let lh = x_h2o.log10();
    let lc = x_co2.log10();
    let tau = 1.006 - 0.01171 * lh - 0.02368 * lh * lh - 0.03188 * lc + 0.001164 * lc * lc;
    tau.clamp(0.0, 1.0)
}

impl Flame {
    /// Radiative heat flux [W/m²] at a 3-D point. The flame lies in the
    /// x-y plane; z is the out-of-plane offset. Diverges for a target on
    /// an emitter itself.
    pub fn heat_flux_at(&self, x_m: f64, y_m: f64, z_m: f64, model: RadSourceModel) -> f64 {
        match model {
            RadSourceModel::Multi => self
                .sources
                .iter()
                .map(|src| self.flux_term(src.weight, src.x_m, src.y_m, x_m, y_m, z_m))
                .sum(),
            RadSourceModel::Single => {
                self.flux_term(1.0, self.midpoint.0, self.midpoint.1, x_m, y_m, z_m)
            }
        }
    }

    /// Heat flux at each target position, in input order.
    pub fn heat_flux_grid(&self, targets: &[[f64; 3]], model: RadSourceModel) -> Vec<f64> {
        targets
            .iter()
            .map(|t| self.heat_flux_at(t[0], t[1], t[2], model))
            .collect()
    }

    fn flux_term(&self, weight: f64, src_x: f64, src_y: f64, x: f64, y: f64, z: f64) -> f64 {
        let dx = x - src_x;
        let dy = y - src_y;
        let dist = (dx * dx + dy * dy + z * z).sqrt();
        let tau = transmissivity(dist, self.t_amb_k, self.humidity);
        weight * self.srad_w * tau / (4.0 * PI * dist * dist)
    }
}
