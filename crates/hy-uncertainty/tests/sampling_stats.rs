//! Seeded sampling statistics against analytic moments.

use hy_uncertainty::DistributionSpec;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample_mean(spec: &DistributionSpec, seed: u64, n: usize) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let draws = spec.sample_n(&mut rng, n).unwrap();
    draws.iter().sum::<f64>() / n as f64
}

// Tolerances sit at 7+ standard errors for n = 40_000, so these are
// deterministic for any fixed seed, not flaky statistical checks.
#[test]
fn sample_means_match_analytic_means() {
    let cases = [
        (
            DistributionSpec::Normal {
                mean: 10.0,
                std_dev: 2.0,
            },
            0.08,
        ),
        (DistributionSpec::Lognormal { mu: 0.0, sigma: 0.5 }, 0.03),
        (
            DistributionSpec::Beta {
                alpha: 2.0,
                beta: 5.0,
            },
            0.01,
        ),
        (
            DistributionSpec::Uniform {
                lower: 3.0,
                upper: 9.0,
            },
            0.06,
        ),
        (
            DistributionSpec::TruncatedNormal {
                mean: 0.0,
                std_dev: 1.0,
                lower: -1.0,
                upper: 2.0,
            },
            0.03,
        ),
    ];
    for (spec, tol) in cases {
        let mean = sample_mean(&spec, 2024, 40_000);
        assert!(
            (mean - spec.mean()).abs() < tol,
            "{spec:?}: sample mean {mean} vs analytic {}",
            spec.mean()
        );
    }
}

#[test]
fn same_seed_reproduces_draws() {
    let spec = DistributionSpec::Lognormal {
        mu: -2.0,
        sigma: 1.1,
    };
    let mut a = StdRng::seed_from_u64(99);
    let mut b = StdRng::seed_from_u64(99);
    assert_eq!(
        spec.sample_n(&mut a, 64).unwrap(),
        spec.sample_n(&mut b, 64).unwrap()
    );
}

#[test]
fn different_seeds_decorrelate() {
    let spec = DistributionSpec::Normal {
        mean: 0.0,
        std_dev: 1.0,
    };
    let mut a = StdRng::seed_from_u64(1);
    let mut b = StdRng::seed_from_u64(2);
    let xa = spec.sample_n(&mut a, 16).unwrap();
    let xb = spec.sample_n(&mut b, 16).unwrap();
    assert_ne!(xa, xb);
}
