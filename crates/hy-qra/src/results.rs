//! Structured analysis results.
//!
//! One record per requested leak size plus facility-level rollups. These
//! are plain data for the caller (UI, report generator, study driver):
//! everything serializes, nothing here recomputes physics.

use serde::{Deserialize, Serialize};

use crate::error::QraError;
use crate::leak::LeakSize;

/// Outcome discriminator for a leak-size record or a whole analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Physics and aggregation completed.
    Success,
    /// Completed, but with recoverable notices the caller must surface.
    Warning { messages: Vec<String> },
    /// This slice failed; numbers in the record are zeroed.
    Fatal { message: String, kind: String },
}

impl AnalysisStatus {
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisStatus::Fatal { .. })
    }
}

/// Everything the analysis resolved for one leak size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakResult {
    pub size: LeakSize,
    pub leak_diameter_m: f64,
    /// Resolved release rate [kg/s].
    pub discharge_kgps: f64,
    /// True when the rate came from a caller override instead of the
    /// choked-flow physics.
    pub mass_flow_overridden: bool,
    /// Resolved release frequency [1/yr].
    pub frequency_per_year: f64,
    pub frequency_overridden: bool,
    pub p_immediate: f64,
    pub p_delayed: f64,
    pub p_total_ignition: f64,
    /// Radiant flux at each occupant position [W/m²]. Populated even
    /// when ignition probabilities are zero.
    pub position_heat_flux_wpm2: Vec<f64>,
    /// Peak overpressure at each occupant position [Pa].
    pub position_overpressure_pa: Vec<f64>,
    /// Impulse at each position [Pa·s]; `None` when the overpressure
    /// method defines no impulse.
    pub position_impulse_pas: Option<Vec<f64>>,
    /// Expected fatalities per ignited-jet-fire event.
    pub thermal_fatalities: f64,
    /// Expected fatalities per delayed-ignition blast event.
    pub overpressure_fatalities: f64,
    /// This size's term of the yearly PLL sum.
    pub pll_contribution: f64,
    pub status: AnalysisStatus,
}

impl LeakResult {
    /// A zeroed record for a leak size whose physics failed.
    pub(crate) fn failed(size: LeakSize, leak_diameter_m: f64, err: &QraError) -> Self {
        Self {
            size,
            leak_diameter_m,
            discharge_kgps: 0.0,
            mass_flow_overridden: false,
            frequency_per_year: 0.0,
            frequency_overridden: false,
            p_immediate: 0.0,
            p_delayed: 0.0,
            p_total_ignition: 0.0,
            position_heat_flux_wpm2: Vec::new(),
            position_overpressure_pa: Vec::new(),
            position_impulse_pas: None,
            thermal_fatalities: 0.0,
            overpressure_fatalities: 0.0,
            pll_contribution: 0.0,
            status: AnalysisStatus::Fatal {
                message: err.to_string(),
                kind: err.kind().into(),
            },
        }
    }
}

/// Facility-level risk rollup with the per-size breakdown retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub leak_results: Vec<LeakResult>,
    /// Sampled occupant positions, shared by every leak size.
    pub positions: Vec<[f64; 3]>,
    pub total_occupants: u32,
    pub mean_exposure_hours: f64,
    /// Potential loss of life [fatalities/yr].
    pub total_pll: f64,
    /// Fatal accident rate [fatalities per 10⁸ exposure-hours].
    pub far: f64,
    /// Average individual risk [fatality probability per year].
    pub air: f64,
}

impl AnalysisResults {
    /// The record for one size, if it was requested.
    pub fn result_for(&self, size: LeakSize) -> Option<&LeakResult> {
        self.leak_results.iter().find(|r| r.size == size)
    }

    /// True when any requested size failed.
    pub fn has_fatal(&self) -> bool {
        self.leak_results.iter().any(|r| r.status.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trips_with_status_tags() {
        let record = LeakResult {
            size: LeakSize::Pct10,
            leak_diameter_m: 1.97e-3,
            discharge_kgps: 0.064,
            mass_flow_overridden: false,
            frequency_per_year: 2.1e-3,
            frequency_overridden: false,
            p_immediate: 0.008,
            p_delayed: 0.004,
            p_total_ignition: 0.011_968,
            position_heat_flux_wpm2: vec![1250.0, 300.0],
            position_overpressure_pa: vec![900.0, 410.0],
            position_impulse_pas: Some(vec![12.0, 6.0]),
            thermal_fatalities: 1.1e-3,
            overpressure_fatalities: 0.0,
            pll_contribution: 3.0e-9,
            status: AnalysisStatus::Success,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"pct10\""));
        assert!(json.contains("\"success\""));
        let back: LeakResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn failed_record_keeps_message_and_kind() {
        let err = QraError::Validation {
            what: "broken".into(),
        };
        let record = LeakResult::failed(LeakSize::Pct100, 6.2e-3, &err);
        assert!(record.status.is_fatal());
        assert_eq!(record.pll_contribution, 0.0);
        match &record.status {
            AnalysisStatus::Fatal { message, kind } => {
                assert!(message.contains("broken"));
                assert_eq!(kind, "validation");
            }
            other => panic!("unexpected status {other:?}"),
        }
    }
}
