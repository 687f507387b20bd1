//! Parametric distributions for uncertain model inputs.
//!
//! Risk inputs arrive either as point values or as named distributions
//! (component leak frequencies are lognormal in the literature, occupant
//! positions are usually uniform or normal per axis). [`DistributionSpec`]
//! covers both in one serde-friendly sum type: every variant can report its
//! analytic mean and variance, draw seeded samples, and collapse to a
//! deterministic point value for nominal runs.

use rand::Rng;
use rand_distr::{Beta, Distribution, LogNormal, Normal, Uniform};
use serde::{Deserialize, Serialize};

use hy_solver::special::{std_normal_cdf, std_normal_pdf};

use crate::error::{UncertaintyError, UncertaintyResult};

/// Rejection attempts per truncated draw before giving up. Exhausting this
/// means the bounds exclude nearly all probability mass.
const REJECTION_BUDGET: usize = 10_000;

/// A distribution over one scalar input.
///
/// Lognormal variants are parameterized by the mean and standard deviation
/// of the *underlying normal* (log-space), matching how leak-frequency
/// tables are published. Truncation bounds are inclusive and apply in the
/// sampled variable, not log space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// A point value with zero variance.
    Deterministic { value: f64 },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    Lognormal {
        mu: f64,
        sigma: f64,
    },
    TruncatedNormal {
        mean: f64,
        std_dev: f64,
        lower: f64,
        upper: f64,
    },
    TruncatedLognormal {
        mu: f64,
        sigma: f64,
        lower: f64,
        upper: f64,
    },
    Beta {
        alpha: f64,
        beta: f64,
    },
    Uniform {
        lower: f64,
        upper: f64,
    },
}

impl DistributionSpec {
    /// Checks parameters against the variant's valid domain.
    pub fn validate(&self) -> UncertaintyResult<()> {
        let invalid = |what: String| Err(UncertaintyError::InvalidParameter { what });
        match *self {
            Self::Deterministic { value } => {
                if !value.is_finite() {
                    return invalid(format!("deterministic value {value} is not finite"));
                }
            }
            Self::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return invalid(format!("normal(mean={mean}, std_dev={std_dev})"));
                }
            }
            Self::Lognormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
                    return invalid(format!("lognormal(mu={mu}, sigma={sigma})"));
                }
            }
            Self::TruncatedNormal {
                mean,
                std_dev,
                lower,
                upper,
            } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return invalid(format!("truncated normal(mean={mean}, std_dev={std_dev})"));
                }
                if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                    return invalid(format!("truncation bounds [{lower}, {upper}]"));
                }
            }
            Self::TruncatedLognormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
                    return invalid(format!("truncated lognormal(mu={mu}, sigma={sigma})"));
                }
                if !lower.is_finite() || !upper.is_finite() || lower < 0.0 || lower >= upper {
                    return invalid(format!("truncation bounds [{lower}, {upper}]"));
                }
            }
            Self::Beta { alpha, beta } => {
                if !alpha.is_finite() || !beta.is_finite() || alpha <= 0.0 || beta <= 0.0 {
                    return invalid(format!("beta(alpha={alpha}, beta={beta})"));
                }
            }
            Self::Uniform { lower, upper } => {
                if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                    return invalid(format!("uniform bounds [{lower}, {upper}]"));
                }
            }
        }
        Ok(())
    }

    /// Analytic mean. Meaningful only for parameters that pass [`validate`].
    ///
    /// [`validate`]: Self::validate
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Deterministic { value } => value,
            Self::Normal { mean, .. } => mean,
            Self::Lognormal { mu, sigma } => (mu + 0.5 * sigma * sigma).exp(),
            Self::TruncatedNormal {
                mean,
                std_dev,
                lower,
                upper,
            } => {
                let a = (lower - mean) / std_dev;
                let b = (upper - mean) / std_dev;
                let z = std_normal_cdf(b) - std_normal_cdf(a);
                mean + std_dev * (std_normal_pdf(a) - std_normal_pdf(b)) / z
            }
            Self::TruncatedLognormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                let a = (lower.ln() - mu) / sigma;
                let b = (upper.ln() - mu) / sigma;
                let z = std_normal_cdf(b) - std_normal_cdf(a);
                (mu + 0.5 * sigma * sigma).exp() * (std_normal_cdf(b - sigma) - std_normal_cdf(a - sigma)) / z
            }
            Self::Beta { alpha, beta } => alpha / (alpha + beta),
            Self::Uniform { lower, upper } => 0.5 * (lower + upper),
        }
    }

    /// Analytic variance. Exactly `0.0` for [`Deterministic`].
    ///
    /// [`Deterministic`]: Self::Deterministic
    pub fn variance(&self) -> f64 {
        match *self {
            Self::Deterministic { .. } => 0.0,
            Self::Normal { std_dev, .. } => std_dev * std_dev,
            Self::Lognormal { mu, sigma } => {
                let s2 = sigma * sigma;
                (s2.exp() - 1.0) * (2.0 * mu + s2).exp()
            }
            Self::TruncatedNormal {
                mean,
                std_dev,
                lower,
                upper,
            } => {
                let a = (lower - mean) / std_dev;
                let b = (upper - mean) / std_dev;
                let z = std_normal_cdf(b) - std_normal_cdf(a);
                let phi_a = std_normal_pdf(a);
                let phi_b = std_normal_pdf(b);
                let shift = (phi_a - phi_b) / z;
                std_dev * std_dev * (1.0 + (a * phi_a - b * phi_b) / z - shift * shift)
            }
            Self::TruncatedLognormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                let a = (lower.ln() - mu) / sigma;
                let b = (upper.ln() - mu) / sigma;
                let z = std_normal_cdf(b) - std_normal_cdf(a);
                let s2 = sigma * sigma;
                let second_moment = (2.0 * mu + 2.0 * s2).exp()
                    * (std_normal_cdf(b - 2.0 * sigma) - std_normal_cdf(a - 2.0 * sigma))
                    / z;
                let mean = self.mean();
                second_moment - mean * mean
            }
            Self::Beta { alpha, beta } => {
                let s = alpha + beta;
                alpha * beta / (s * s * (s + 1.0))
            }
            Self::Uniform { lower, upper } => {
                let w = upper - lower;
                w * w / 12.0
            }
        }
    }

    /// Draws one sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> UncertaintyResult<f64> {
        self.validate()?;
        let construction = |what: String| UncertaintyError::InvalidParameter { what };
        match *self {
            Self::Deterministic { value } => Ok(value),
            Self::Normal { mean, std_dev } => {
                let dist =
                    Normal::new(mean, std_dev).map_err(|e| construction(format!("normal: {e}")))?;
                Ok(dist.sample(rng))
            }
            Self::Lognormal { mu, sigma } => {
                let dist = LogNormal::new(mu, sigma)
                    .map_err(|e| construction(format!("lognormal: {e}")))?;
                Ok(dist.sample(rng))
            }
            Self::TruncatedNormal {
                mean,
                std_dev,
                lower,
                upper,
            } => {
                let dist =
                    Normal::new(mean, std_dev).map_err(|e| construction(format!("normal: {e}")))?;
                sample_rejecting(rng, lower, upper, &dist)
            }
            Self::TruncatedLognormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                let dist = LogNormal::new(mu, sigma)
                    .map_err(|e| construction(format!("lognormal: {e}")))?;
                sample_rejecting(rng, lower, upper, &dist)
            }
            Self::Beta { alpha, beta } => {
                let dist =
                    Beta::new(alpha, beta).map_err(|e| construction(format!("beta: {e}")))?;
                Ok(dist.sample(rng))
            }
            Self::Uniform { lower, upper } => Ok(Uniform::new(lower, upper).sample(rng)),
        }
    }

    /// Draws `n` samples in order from a single stream.
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> UncertaintyResult<Vec<f64>> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Collapses to a point value at the analytic mean.
    pub fn to_deterministic(&self) -> Self {
        Self::Deterministic { value: self.mean() }
    }

    /// True when sampling never varies.
    pub fn is_deterministic(&self) -> bool {
        matches!(self, Self::Deterministic { .. })
    }
}

fn sample_rejecting<R, D>(rng: &mut R, lower: f64, upper: f64, dist: &D) -> UncertaintyResult<f64>
where
    R: Rng + ?Sized,
    D: Distribution<f64>,
{
    for _ in 0..REJECTION_BUDGET {
        let x = dist.sample(rng);
        if x >= lower && x <= upper {
            return Ok(x);
        }
    }
    Err(UncertaintyError::SamplingFailed {
        what: format!("bounds [{lower}, {upper}] rejected {REJECTION_BUDGET} consecutive draws"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deterministic_has_zero_variance() {
        let spec = DistributionSpec::Deterministic { value: 3.2 };
        assert_eq!(spec.variance(), 0.0);
        assert_eq!(spec.mean(), 3.2);

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(spec.sample(&mut rng).unwrap(), 3.2);
    }

    #[test]
    fn lognormal_moments() {
        let spec = DistributionSpec::Lognormal { mu: 0.0, sigma: 0.5 };
        assert_relative_eq!(spec.mean(), (0.125f64).exp(), max_relative = 1e-12);
        let s2 = 0.25f64;
        assert_relative_eq!(
            spec.variance(),
            (s2.exp() - 1.0) * s2.exp(),
            max_relative = 1e-12
        );
    }

    // Reference: scipy.stats.truncnorm(-1, 2).stats(moments="mv").
    #[test]
    fn truncated_normal_moments() {
        let spec = DistributionSpec::TruncatedNormal {
            mean: 0.0,
            std_dev: 1.0,
            lower: -1.0,
            upper: 2.0,
        };
        assert_relative_eq!(spec.mean(), 0.229_64, max_relative = 1e-4);
        assert_relative_eq!(spec.variance(), 0.519_76, max_relative = 1e-4);
    }

    #[test]
    fn beta_and_uniform_moments() {
        let beta = DistributionSpec::Beta {
            alpha: 2.0,
            beta: 5.0,
        };
        assert_relative_eq!(beta.mean(), 2.0 / 7.0, max_relative = 1e-12);
        assert_relative_eq!(beta.variance(), 10.0 / (49.0 * 8.0), max_relative = 1e-12);

        let uniform = DistributionSpec::Uniform {
            lower: 3.0,
            upper: 9.0,
        };
        assert_relative_eq!(uniform.mean(), 6.0, max_relative = 1e-12);
        assert_relative_eq!(uniform.variance(), 3.0, max_relative = 1e-12);
    }

    #[test]
    fn truncated_sampling_respects_bounds() {
        let spec = DistributionSpec::TruncatedLognormal {
            mu: -1.0,
            sigma: 0.8,
            lower: 0.2,
            upper: 0.6,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let draws = spec.sample_n(&mut rng, 1000).unwrap();
        assert!(draws.iter().all(|&x| (0.2..=0.6).contains(&x)));
    }

    #[test]
    fn degenerate_truncation_exhausts_budget() {
        // Eight-sigma window holds ~1e-16 of the mass.
        let spec = DistributionSpec::TruncatedNormal {
            mean: 0.0,
            std_dev: 1.0,
            lower: 8.0,
            upper: 8.1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            spec.sample(&mut rng),
            Err(UncertaintyError::SamplingFailed { .. })
        ));
    }

    #[test]
    fn to_deterministic_collapses() {
        let spec = DistributionSpec::Normal {
            mean: 4.5,
            std_dev: 0.3,
        };
        let point = spec.to_deterministic();
        assert!(point.is_deterministic());
        assert_eq!(point.variance(), 0.0);
        assert_relative_eq!(point.mean(), 4.5, max_relative = 1e-12);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let bad = [
            DistributionSpec::Normal {
                mean: 0.0,
                std_dev: -1.0,
            },
            DistributionSpec::Beta {
                alpha: 0.0,
                beta: 2.0,
            },
            DistributionSpec::Uniform {
                lower: 2.0,
                upper: 2.0,
            },
            DistributionSpec::TruncatedLognormal {
                mu: 0.0,
                sigma: 1.0,
                lower: -0.5,
                upper: 1.0,
            },
        ];
        for spec in bad {
            assert!(spec.validate().is_err(), "{spec:?} should not validate");
        }
    }

    #[test]
    fn serde_round_trip() {
        let spec = DistributionSpec::TruncatedNormal {
            mean: 1.0,
            std_dev: 0.5,
            lower: 0.0,
            upper: 3.0,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("truncated_normal"));
        let back: DistributionSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
