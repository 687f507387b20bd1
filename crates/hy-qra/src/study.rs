//! Monte-Carlo frequency study.
//!
//! [`analyze`](crate::analysis::analyze) runs on mean release
//! frequencies; a [`RandomStudy`] reruns it with frequencies drawn from
//! the component and fueling-failure distributions, one independent draw
//! set per sample, so the caller gets a distribution of risk metrics
//! instead of a point value. Samples are independent and run in
//! parallel; the result order matches the sample index regardless of
//! scheduling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::info;

use crate::analysis::{analyze, AnalysisRequest};
use crate::error::{QraError, QraResult};
use crate::leak::LeakSize;
use crate::results::AnalysisResults;

/// Mixes the sample index into the study seed so neighboring samples get
/// unrelated streams. Distinct from the occupant-stream salt inside
/// [`analyze`], so no sample's frequency stream collides with another
/// sample's occupant stream.
const SAMPLE_SEED_MIX: u64 = 0xBF58_476D_1CE4_E5B9;

/// A repeated-analysis study over sampled release frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomStudy {
    pub samples: usize,
    pub seed: u64,
}

impl RandomStudy {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }

    /// Run `samples` analyses of `base`, each with its own frequency
    /// draws and occupant placement. Frequencies the caller pinned
    /// through `base.frequency_overrides` stay pinned in every sample.
    ///
    /// The same `(samples, seed, base)` always reproduces the same
    /// output, and results arrive in sample order.
    pub fn run(&self, base: &AnalysisRequest) -> QraResult<Vec<AnalysisResults>> {
        if self.samples == 0 {
            return Err(QraError::Validation {
                what: "a frequency study needs at least one sample".into(),
            });
        }
        base.validate()?;

        let results = (0..self.samples)
            .into_par_iter()
            .map(|i| self.run_sample(base, i))
            .collect::<QraResult<Vec<_>>>()?;
        info!(samples = results.len(), "frequency study complete");
        Ok(results)
    }

    fn run_sample(&self, base: &AnalysisRequest, index: usize) -> QraResult<AnalysisResults> {
        let sample_seed = self.seed ^ (index as u64).wrapping_mul(SAMPLE_SEED_MIX);
        let mut rng = StdRng::seed_from_u64(sample_seed);

        let mut request = base.clone();
        request.seed = sample_seed;
        for &size in &base.leak_sizes {
            if base.frequency_overrides.contains_key(&size) {
                continue;
            }
            let mut f = base.components.sample_frequency(size, &mut rng)?;
            if size == LeakSize::Pct100 {
                f += base.failures.sample_frequency(&mut rng)?;
            }
            request.frequency_overrides.insert(size, f);
        }
        analyze(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentCategory, ComponentSet, Fuel, Phase};
    use crate::occupants::OccupantGroup;
    use hy_core::units::{k, pa};
    use hy_fluids::{Blend, Fluid, GasModel, Species, StateSpec};

    fn base_request() -> AnalysisRequest {
        let tank = Fluid::new(
            Blend::pure(Species::H2),
            GasModel::AbelNoble,
            StateSpec::TP {
                t: k(288.0),
                p: pa(3.0e6),
            },
        )
        .unwrap();
        let ambient = Fluid::new(
            Blend::pure(Species::Air),
            GasModel::IdealGas,
            StateSpec::TP {
                t: k(288.0),
                p: pa(101_325.0),
            },
        )
        .unwrap();
        let mut req = AnalysisRequest::new(tank, ambient, 6.223e-3);
        req.leak_sizes = vec![LeakSize::Pct1];
        req.components = ComponentSet::new(vec![Component::new(
            ComponentCategory::Valve,
            5,
            Fuel::Hydrogen,
            Phase::Gas,
        )]);
        req.occupant_groups = vec![OccupantGroup::fixed(2, 6.0, 0.0, 3.0, 2000.0)];
        req.seed = 7;
        req
    }

    #[test]
    fn reruns_reproduce_bit_for_bit() {
        let base = base_request();
        let study = RandomStudy::new(3, 1234);
        let first = study.run(&base).unwrap();
        let second = study.run(&base).unwrap();
        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.total_pll, b.total_pll);
            assert_eq!(
                a.leak_results[0].frequency_per_year,
                b.leak_results[0].frequency_per_year
            );
            assert_eq!(a.positions, b.positions);
        }
    }

    #[test]
    fn samples_draw_distinct_frequencies() {
        let out = RandomStudy::new(3, 99).run(&base_request()).unwrap();
        let freqs: Vec<f64> = out
            .iter()
            .map(|r| r.leak_results[0].frequency_per_year)
            .collect();
        assert!(freqs.iter().all(|f| *f > 0.0));
        assert!(freqs[0] != freqs[1] || freqs[1] != freqs[2]);
        // Every record reflects the sampled (injected) frequency
        assert!(out.iter().all(|r| r.leak_results[0].frequency_overridden));
    }

    #[test]
    fn pinned_frequencies_stay_pinned() {
        let mut base = base_request();
        base.frequency_overrides.insert(LeakSize::Pct1, 4.2e-4);
        let out = RandomStudy::new(2, 5).run(&base).unwrap();
        for r in &out {
            assert!((r.leak_results[0].frequency_per_year - 4.2e-4).abs() < 1e-18);
        }
    }

    #[test]
    fn empty_study_is_rejected() {
        let err = RandomStudy::new(0, 1).run(&base_request()).unwrap_err();
        assert!(matches!(err, QraError::Validation { .. }));
    }
}
