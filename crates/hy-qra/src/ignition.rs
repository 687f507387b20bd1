//! Mass-flow-binned ignition probabilities.
//!
//! Ignition likelihood steps with release magnitude: N ascending flow-rate
//! thresholds split the axis into N+1 bins, each carrying an immediate and
//! a delayed ignition probability. Bins are half-open `[t_i, t_{i+1})`, so
//! a flow exactly at a threshold takes the higher bin's probabilities.

use serde::{Deserialize, Serialize};

use crate::error::{QraError, QraResult};

/// Piecewise-constant (immediate, delayed) ignition probabilities over
/// mass flow rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnitionProbTable {
    thresholds_kgps: Vec<f64>,
    immediate: Vec<f64>,
    delayed: Vec<f64>,
}

impl IgnitionProbTable {
    /// N thresholds bound N+1 bins; thresholds must ascend strictly and
    /// every probability must lie in [0, 1].
    pub fn new(
        thresholds_kgps: Vec<f64>,
        immediate: Vec<f64>,
        delayed: Vec<f64>,
    ) -> QraResult<Self> {
        let n = thresholds_kgps.len();
        if immediate.len() != n + 1 || delayed.len() != n + 1 {
            return Err(QraError::Validation {
                what: format!(
                    "{n} thresholds need {} probability bins, got {} immediate and {} delayed",
                    n + 1,
                    immediate.len(),
                    delayed.len()
                ),
            });
        }
        if thresholds_kgps.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(QraError::Validation {
                what: "ignition thresholds must be positive and finite".into(),
            });
        }
        if thresholds_kgps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(QraError::Validation {
                what: format!("ignition thresholds must ascend strictly: {thresholds_kgps:?}"),
            });
        }
        for p in immediate.iter().chain(delayed.iter()) {
            if !(0.0..=1.0).contains(p) {
                return Err(QraError::Validation {
                    what: format!("ignition probability {p} outside [0, 1]"),
                });
            }
        }
        Ok(Self {
            thresholds_kgps,
            immediate,
            delayed,
        })
    }

    /// The standard hydrogen table (thresholds 0.125 and 6.25 kg/s).
    pub fn hydrogen_default() -> Self {
        Self {
            thresholds_kgps: vec![0.125, 6.25],
            immediate: vec![0.008, 0.053, 0.230],
            delayed: vec![0.004, 0.027, 0.120],
        }
    }

    /// (immediate, delayed) probabilities for the bin holding this flow.
    pub fn probabilities(&self, mdot_kgps: f64) -> (f64, f64) {
        let bin = self
            .thresholds_kgps
            .partition_point(|&t| t <= mdot_kgps);
        (self.immediate[bin], self.delayed[bin])
    }

    /// True when every bin is zero in both channels.
    pub fn is_zero(&self) -> bool {
        self.immediate.iter().chain(self.delayed.iter()).all(|&p| p == 0.0)
    }
}

/// Probability that the release ignites at all: immediate ignition, or
/// else delayed ignition of the accumulated cloud. The branches are not
/// exclusive alternatives of one draw, so the probabilities compose
/// conditionally rather than add.
pub fn total_ignition_prob(immediate: f64, delayed: f64) -> f64 {
    immediate + (1.0 - immediate) * delayed
}

/// Conditional probability that an ignition was the immediate kind.
/// Both-zero inputs mean "never ignites", which conditions to zero.
pub fn cond_immediate_prob(immediate: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        immediate / total
    }
}
