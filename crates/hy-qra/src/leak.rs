//! The five standard leak sizes.
//!
//! Leak-frequency data is published per discrete leak size, expressed as a
//! percentage of the full-bore flow area. The closed enum makes an
//! off-catalog size unrepresentable; the only way in from a raw number is
//! [`LeakSize::from_percent`], which rejects anything but the five values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QraError, QraResult};

/// One of the five standard leak sizes, as a percentage of the full-bore
/// flow area of the reference pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakSize {
    Pct0_01,
    Pct0_1,
    Pct1,
    Pct10,
    Pct100,
}

impl LeakSize {
    /// All five sizes, smallest first.
    pub const ALL: [LeakSize; 5] = [
        LeakSize::Pct0_01,
        LeakSize::Pct0_1,
        LeakSize::Pct1,
        LeakSize::Pct10,
        LeakSize::Pct100,
    ];

    /// Leak area as a percentage of the full-bore area.
    pub fn percent(&self) -> f64 {
        match self {
            LeakSize::Pct0_01 => 0.01,
            LeakSize::Pct0_1 => 0.1,
            LeakSize::Pct1 => 1.0,
            LeakSize::Pct10 => 10.0,
            LeakSize::Pct100 => 100.0,
        }
    }

    /// Leak area as a fraction of the full-bore area.
    pub fn area_fraction(&self) -> f64 {
        self.percent() / 100.0
    }

    /// Effective leak diameter for a given full-bore pipe inner diameter.
    /// Areas scale linearly with the size, so diameters scale with its
    /// square root.
    pub fn leak_diameter_m(&self, pipe_inner_diameter_m: f64) -> f64 {
        pipe_inner_diameter_m * self.area_fraction().sqrt()
    }

    /// Dense index into per-size tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            LeakSize::Pct0_01 => 0,
            LeakSize::Pct0_1 => 1,
            LeakSize::Pct1 => 2,
            LeakSize::Pct10 => 3,
            LeakSize::Pct100 => 4,
        }
    }

    /// Resolve a raw percentage; anything off the five-value catalog is a
    /// hard validation error, not a nearest-size guess.
    pub fn from_percent(percent: f64) -> QraResult<Self> {
        Self::ALL
            .into_iter()
            .find(|s| (s.percent() - percent).abs() < 1e-9)
            .ok_or_else(|| QraError::Validation {
                what: format!(
                    "leak size {percent}% is not one of the standard sizes \
                     (0.01, 0.1, 1, 10, 100)"
                ),
            })
    }
}

impl fmt::Display for LeakSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
