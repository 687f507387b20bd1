//! Fueling-accident frequency from the dispenser failure-mode tree.
//!
//! Besides random component leaks, a dispenser releases inventory when a
//! fueling goes wrong: a nozzle pop-off, a driveoff with the breakaway
//! coupling failing, an overpressured fill the relief valve fails to dump,
//! or a full shutdown failure (nozzle and manual valve fail to close and
//! the solenoid triple is lost to independent failures or a common cause).
//! Each branch probability is per fueling demand; the tree total scales by
//! demands per year and lands on the full-bore (100%) leak size only.

use rand::Rng;
use serde::{Deserialize, Serialize};

use hy_uncertainty::DistributionSpec;

use crate::error::QraResult;

/// Per-demand failure probabilities and the yearly demand count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSet {
    pub vehicles: f64,
    pub fuelings_per_day: f64,
    pub operating_days: f64,
    /// Premature nozzle release (pop-off) per demand.
    pub nozzle_popoff: DistributionSpec,
    /// Nozzle fails to close on shutdown.
    pub nozzle_ftc: DistributionSpec,
    /// Manual isolation valve fails to close.
    pub mvalve_ftc: DistributionSpec,
    /// One solenoid valve fails to close.
    pub svalve_ftc: DistributionSpec,
    /// Common-cause failure of the solenoid triple.
    pub svalve_ccf: DistributionSpec,
    /// Pressure-relief valve fails to open on demand.
    pub prv_fto: DistributionSpec,
    /// Vehicle drives off still connected.
    pub driveoff: DistributionSpec,
    /// Breakaway coupling fails to separate cleanly.
    pub coupling_ftc: DistributionSpec,
    /// Fill overpressures the system.
    pub overpressure_rupture: DistributionSpec,
}

impl FailureSet {
    /// Literature defaults for a gaseous-hydrogen dispenser.
    pub fn hydrogen_dispenser(vehicles: f64, fuelings_per_day: f64, operating_days: f64) -> Self {
        Self {
            vehicles,
            fuelings_per_day,
            operating_days,
            nozzle_popoff: DistributionSpec::Beta {
                alpha: 0.5,
                beta: 610_415.5,
            },
            nozzle_ftc: DistributionSpec::Lognormal {
                mu: -6.2,
                sigma: 0.6,
            },
            mvalve_ftc: DistributionSpec::Lognormal {
                mu: -6.9,
                sigma: 0.6,
            },
            svalve_ftc: DistributionSpec::Lognormal {
                mu: -6.2,
                sigma: 0.6,
            },
            svalve_ccf: DistributionSpec::Lognormal {
                mu: -9.0,
                sigma: 0.8,
            },
            prv_fto: DistributionSpec::Lognormal {
                mu: -10.4,
                sigma: 1.0,
            },
            driveoff: DistributionSpec::Beta {
                alpha: 31.5,
                beta: 610_384.0,
            },
            coupling_ftc: DistributionSpec::Beta {
                alpha: 0.5,
                beta: 5031.0,
            },
            overpressure_rupture: DistributionSpec::Beta {
                alpha: 3.5,
                beta: 310_289.5,
            },
        }
    }

    /// A set that never fires (no fueling demands).
    pub fn none() -> Self {
        Self::hydrogen_dispenser(0.0, 0.0, 0.0)
    }

    /// Fueling demands per year.
    pub fn demands_per_year(&self) -> f64 {
        self.vehicles * self.fuelings_per_day * self.operating_days
    }

    fn tree(p: &TreeProbs) -> f64 {
        let shutdown_fail =
            p.nozzle_ftc * p.mvalve_ftc * (p.svalve_ftc.powi(3) + p.svalve_ccf);
        p.nozzle_popoff
            + p.driveoff * p.coupling_ftc
            + p.overpressure_rupture * p.prv_fto
            + shutdown_fail
    }

    /// Expected accident frequency [1/yr] at the means of every branch.
    pub fn mean_frequency(&self) -> f64 {
        self.demands_per_year()
            * Self::tree(&TreeProbs {
                nozzle_popoff: self.nozzle_popoff.mean(),
                nozzle_ftc: self.nozzle_ftc.mean(),
                mvalve_ftc: self.mvalve_ftc.mean(),
                svalve_ftc: self.svalve_ftc.mean(),
                svalve_ccf: self.svalve_ccf.mean(),
                prv_fto: self.prv_fto.mean(),
                driveoff: self.driveoff.mean(),
                coupling_ftc: self.coupling_ftc.mean(),
                overpressure_rupture: self.overpressure_rupture.mean(),
            })
    }

    /// Accident frequency [1/yr] with every branch probability drawn once.
    pub fn sample_frequency<R: Rng + ?Sized>(&self, rng: &mut R) -> QraResult<f64> {
        let probs = TreeProbs {
            nozzle_popoff: self.nozzle_popoff.sample(rng)?,
            nozzle_ftc: self.nozzle_ftc.sample(rng)?,
            mvalve_ftc: self.mvalve_ftc.sample(rng)?,
            svalve_ftc: self.svalve_ftc.sample(rng)?,
            svalve_ccf: self.svalve_ccf.sample(rng)?,
            prv_fto: self.prv_fto.sample(rng)?,
            driveoff: self.driveoff.sample(rng)?,
            coupling_ftc: self.coupling_ftc.sample(rng)?,
            overpressure_rupture: self.overpressure_rupture.sample(rng)?,
        };
        Ok(self.demands_per_year() * Self::tree(&probs))
    }
}

struct TreeProbs {
    nozzle_popoff: f64,
    nozzle_ftc: f64,
    mvalve_ftc: f64,
    svalve_ftc: f64,
    svalve_ccf: f64,
    prv_fto: f64,
    driveoff: f64,
    coupling_ftc: f64,
    overpressure_rupture: f64,
}
