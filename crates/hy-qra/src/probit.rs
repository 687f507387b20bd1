//! Probit harm models: physical effect in, fatality probability out.
//!
//! Each model maps its dose to a probit value Y by a published closed
//! form; the standard transform Φ(Y − 5) turns that into a fatality
//! probability. Two families here: thermal models on the radiant dose
//! t·I^(4/3), and overpressure models on peak pressure (two of which
//! additionally consume positive-phase impulse).

use serde::{Deserialize, Serialize};

use hy_core::keys::normalize_key;
use hy_solver::special::std_normal_cdf;

use crate::error::{QraError, QraResult};

/// The canonical probit-to-probability transform. A probit of exactly 5
/// maps to exactly 0.5.
pub fn probit_to_probability(probit: f64) -> f64 {
    std_normal_cdf(probit - 5.0)
}

/// Thermal-radiation harm models over the dose V = t·I^(4/3)
/// [s·(W/m²)^(4/3)].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalProbit {
    Eisenberg,
    TsaoPerry,
    Tno,
    Lees,
}

impl ThermalProbit {
    pub fn from_key(key: &str) -> QraResult<Self> {
        match normalize_key(key).as_str() {
            "eisenberg" | "eise" => Ok(ThermalProbit::Eisenberg),
            "tsaoperry" | "tsao" => Ok(ThermalProbit::TsaoPerry),
            "tno" => Ok(ThermalProbit::Tno),
            "lees" | "lee" => Ok(ThermalProbit::Lees),
            _ => Err(QraError::UnknownModel { name: key.into() }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ThermalProbit::Eisenberg => "eisenberg",
            ThermalProbit::TsaoPerry => "tsao_perry",
            ThermalProbit::Tno => "tno",
            ThermalProbit::Lees => "lees",
        }
    }

    /// Probit value for a positive heat flux [W/m²] held for a positive
    /// exposure time [s].
    pub fn probit(&self, heat_flux_wpm2: f64, exposure_s: f64) -> f64 {
        let dose = exposure_s * heat_flux_wpm2.powf(4.0 / 3.0);
        match self {
            ThermalProbit::Eisenberg => -38.48 + 2.56 * dose.ln(),
            ThermalProbit::TsaoPerry => -36.38 + 2.56 * dose.ln(),
            ThermalProbit::Tno => -37.23 + 2.56 * dose.ln(),
            ThermalProbit::Lees => -29.02 + 1.99 * (0.5 * dose).ln(),
        }
    }

    /// Fatality probability; exactly zero for a zero physical effect.
    pub fn fatality_probability(&self, heat_flux_wpm2: f64, exposure_s: f64) -> f64 {
        if heat_flux_wpm2 <= 0.0 || exposure_s <= 0.0 {
            return 0.0;
        }
        probit_to_probability(self.probit(heat_flux_wpm2, exposure_s))
    }
}

/// Blast harm models over peak overpressure [Pa] and, for the impact and
/// collapse models, positive-phase impulse [Pa·s].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpressureProbit {
    LungEisenberg,
    LungHse,
    HeadImpact,
    Collapse,
}

impl OverpressureProbit {
    pub fn from_key(key: &str) -> QraResult<Self> {
        match normalize_key(key).as_str() {
            "lungeisenberg" | "eisenberg" | "lung" => Ok(OverpressureProbit::LungEisenberg),
            "lunghse" | "hse" => Ok(OverpressureProbit::LungHse),
            "headimpact" | "head" | "tnohead" => Ok(OverpressureProbit::HeadImpact),
            "collapse" | "structuralcollapse" | "structural" => Ok(OverpressureProbit::Collapse),
            _ => Err(QraError::UnknownModel { name: key.into() }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            OverpressureProbit::LungEisenberg => "lung_eisenberg",
            OverpressureProbit::LungHse => "lung_hse",
            OverpressureProbit::HeadImpact => "head_impact",
            OverpressureProbit::Collapse => "collapse",
        }
    }

    /// Whether the model's formula consumes impulse. Pairing such a model
    /// with an overpressure method that defines none is a request-level
    /// validation error.
    pub fn needs_impulse(&self) -> bool {
        matches!(
            self,
            OverpressureProbit::HeadImpact | OverpressureProbit::Collapse
        )
    }

    /// Probit value for positive peak overpressure and (where consumed)
    /// positive impulse.
    fn probit(&self, overpressure_pa: f64, impulse_pas: f64) -> f64 {
        let p = overpressure_pa;
        let i = impulse_pas;
        match self {
            OverpressureProbit::LungEisenberg => -77.1 + 6.91 * p.ln(),
            OverpressureProbit::LungHse => 5.13 + 1.37 * (p / 1.0e5).ln(),
            OverpressureProbit::HeadImpact => {
                5.0 - 8.49 * (2430.0 / p + 4.0e8 / (p * i)).ln()
            }
            OverpressureProbit::Collapse => {
                5.0 - 0.22 * ((40_000.0 / p).powf(7.4) + (460.0 / i).powf(11.3)).ln()
            }
        }
    }

    /// Fatality probability; exactly zero for a zero physical effect.
    pub fn fatality_probability(
        &self,
        overpressure_pa: f64,
        impulse_pas: Option<f64>,
    ) -> QraResult<f64> {
        if overpressure_pa <= 0.0 {
            return Ok(0.0);
        }
        let impulse = if self.needs_impulse() {
            let i = impulse_pas.ok_or_else(|| QraError::Validation {
                what: format!(
                    "probit model {:?} needs an impulse but the overpressure \
                     method produced none",
                    self.key()
                ),
            })?;
            if i <= 0.0 {
                return Ok(0.0);
            }
            i
        } else {
            impulse_pas.unwrap_or(0.0)
        };
        Ok(probit_to_probability(self.probit(overpressure_pa, impulse)))
    }
}
