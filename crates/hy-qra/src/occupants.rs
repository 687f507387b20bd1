//! Occupant groups and position sampling.
//!
//! A group is a head count, three independent per-axis position
//! distributions in the release frame (x downstream, y vertical, z
//! lateral, all meters), and the yearly hours each member spends exposed.
//! Positions are drawn once per analysis from a dedicated RNG stream so
//! that frequency sampling elsewhere never perturbs where people stand.

use rand::Rng;
use serde::{Deserialize, Serialize};

use hy_uncertainty::DistributionSpec;

use crate::error::{QraError, QraResult};

/// A population of identically-distributed occupants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupantGroup {
    pub count: u32,
    pub x: DistributionSpec,
    pub y: DistributionSpec,
    pub z: DistributionSpec,
    /// Hours per year each occupant spends in the exposed area.
    pub exposure_hours: f64,
}

impl OccupantGroup {
    /// A group standing at fixed coordinates.
    pub fn fixed(count: u32, x: f64, y: f64, z: f64, exposure_hours: f64) -> Self {
        Self {
            count,
            x: DistributionSpec::Deterministic { value: x },
            y: DistributionSpec::Deterministic { value: y },
            z: DistributionSpec::Deterministic { value: z },
            exposure_hours,
        }
    }

    pub fn validate(&self) -> QraResult<()> {
        self.x.validate()?;
        self.y.validate()?;
        self.z.validate()?;
        if !self.exposure_hours.is_finite() || self.exposure_hours < 0.0 {
            return Err(QraError::Validation {
                what: format!("occupant exposure {} h/yr", self.exposure_hours),
            });
        }
        Ok(())
    }

    /// One (x, y, z) draw per occupant, in axis-major order per occupant.
    pub fn sample_positions<R: Rng + ?Sized>(&self, rng: &mut R) -> QraResult<Vec<[f64; 3]>> {
        (0..self.count)
            .map(|_| {
                Ok([
                    self.x.sample(rng)?,
                    self.y.sample(rng)?,
                    self.z.sample(rng)?,
                ])
            })
            .collect()
    }
}

/// Head count across groups.
pub fn total_occupants(groups: &[OccupantGroup]) -> u32 {
    groups.iter().map(|g| g.count).sum()
}

/// Count-weighted mean exposure [h/yr], zero when nobody is exposed.
pub fn mean_exposure_hours(groups: &[OccupantGroup]) -> f64 {
    let heads = f64::from(total_occupants(groups));
    if heads == 0.0 {
        return 0.0;
    }
    groups
        .iter()
        .map(|g| f64::from(g.count) * g.exposure_hours)
        .sum::<f64>()
        / heads
}
