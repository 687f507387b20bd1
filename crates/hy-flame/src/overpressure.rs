//! Unconfined-overpressure correlations for a delayed-ignition cloud.
//!
//! Three interchangeable methods turn a flammable cloud mass into peak
//! overpressure (and where defined, positive-phase impulse) at a
//! distance: TNT equivalence with the Mills curve, the Baker-Strehlow-
//! Tang curves indexed by Mach flame speed, and the Bauwens/Dorofeev
//! detonation fit. BST and Bauwens use Sachs scaling on the cloud energy;
//! Bauwens defines no impulse at all, which callers pairing it with an
//! impulse-consuming harm model must treat as a hard configuration error.

use crate::error::{FlameError, FlameResult};
use hy_core::keys::normalize_key;
use hy_fluids::Fluid;
use tracing::debug;

/// Blast energy of TNT [J/kg].
const TNT_BLAST_ENERGY_JPKG: f64 = 4.68e6;

/// Ground-reflection factor on the cloud energy for Sachs scaling.
const GROUND_REFLECTION: f64 = 2.0;

/// Mach flame speeds with digitized Baker-Strehlow-Tang curves.
const BST_MACH_SPEEDS: [f64; 7] = [0.2, 0.35, 0.7, 1.0, 1.4, 2.0, 5.2];

/// Sachs-scaled distance nodes shared by the BST tables.
const BST_SCALED_R: [f64; 8] = [0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 100.0];

/// Scaled peak overpressure per flame-speed curve.
const BST_SCALED_P: [[f64; 8]; 7] = [
    [0.010, 0.010, 0.008, 0.005, 2.2e-3, 1.1e-3, 3.6e-4, 1.1e-4],
    [0.050, 0.048, 0.035, 0.020, 9.0e-3, 4.5e-3, 1.5e-3, 4.5e-4],
    [0.200, 0.170, 0.100, 0.050, 2.1e-2, 1.0e-2, 3.3e-3, 1.0e-3],
    [0.370, 0.300, 0.170, 0.080, 3.0e-2, 1.4e-2, 4.6e-3, 1.4e-3],
    [1.000, 0.700, 0.350, 0.140, 4.7e-2, 2.1e-2, 7.0e-3, 2.1e-3],
    [2.400, 1.300, 0.540, 0.200, 6.0e-2, 2.6e-2, 8.6e-3, 2.6e-3],
    [10.00, 3.500, 1.000, 0.300, 8.0e-2, 3.3e-2, 1.1e-2, 3.3e-3],
];

/// Scaled positive-phase impulse per flame-speed curve.
const BST_SCALED_I: [[f64; 8]; 7] = [
    [4.5e-3, 4.4e-3, 4.2e-3, 3.6e-3, 2.6e-3, 1.8e-3, 9.0e-4, 3.6e-4],
    [1.3e-2, 1.3e-2, 1.2e-2, 1.0e-2, 7.0e-3, 5.0e-3, 2.5e-3, 1.0e-3],
    [3.0e-2, 2.9e-2, 2.6e-2, 2.1e-2, 1.4e-2, 9.5e-3, 4.8e-3, 1.9e-3],
    [4.2e-2, 4.0e-2, 3.5e-2, 2.7e-2, 1.7e-2, 1.1e-2, 5.5e-3, 2.2e-3],
    [5.5e-2, 5.2e-2, 4.4e-2, 3.2e-2, 1.9e-2, 1.2e-2, 6.0e-3, 2.4e-3],
    [6.5e-2, 6.0e-2, 4.9e-2, 3.5e-2, 2.0e-2, 1.3e-2, 6.5e-3, 2.6e-3],
    [7.5e-2, 6.8e-2, 5.4e-2, 3.7e-2, 2.1e-2, 1.3e-2, 6.5e-3, 2.6e-3],
];

/// Unconfined-overpressure correlation selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverpressureMethod {
    /// Baker-Strehlow-Tang curves at the given Mach flame speed.
    Bst { mach_flame_speed: f64 },
    /// TNT equivalence at the given yield factor, with the Mills
    /// overpressure curve.
    Tnt { equivalence_factor: f64 },
    /// Bauwens/Dorofeev detonation fit; defines no impulse.
    Bauwens,
}

impl OverpressureMethod {
    /// Resolve a user-facing selector string with default parameters.
    pub fn from_key(key: &str) -> FlameResult<Self> {
        match normalize_key(key).as_str() {
            "bst" | "bakerstrehlowtang" => Ok(OverpressureMethod::Bst {
                mach_flame_speed: 0.35,
            }),
            "tnt" => Ok(OverpressureMethod::Tnt {
                equivalence_factor: 0.03,
            }),
            "bauwens" | "bauw" => Ok(OverpressureMethod::Bauwens),
            _ => Err(FlameError::UnknownModel { name: key.into() }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            OverpressureMethod::Bst { .. } => "bst",
            OverpressureMethod::Tnt { .. } => "tnt",
            OverpressureMethod::Bauwens => "bauwens",
        }
    }

    /// Whether the method yields a positive-phase impulse. Harm models
    /// consuming impulse must not be paired with a method that does not.
    pub fn produces_impulse(&self) -> bool {
        !matches!(self, OverpressureMethod::Bauwens)
    }

    /// Peak overpressure [Pa] at a distance from the cloud center.
    pub fn peak_overpressure(
        &self,
        flammable_mass_kg: f64,
        heat_of_combustion_jpkg: f64,
        ambient: &Fluid,
        distance_m: f64,
    ) -> FlameResult<f64> {
        check_blast_args(flammable_mass_kg, heat_of_combustion_jpkg, distance_m)?;
        if flammable_mass_kg == 0.0 {
            return Ok(0.0);
        }
        let p_amb = ambient.p_pa();
        match self {
            OverpressureMethod::Tnt { equivalence_factor } => {
                let w = equivalence_factor * flammable_mass_kg * heat_of_combustion_jpkg
                    / TNT_BLAST_ENERGY_JPKG;
                let z = distance_m / w.cbrt();
                // Mills curve, kPa in scaled distance
                let dp_kpa = 1772.0 / (z * z * z) - 114.0 / (z * z) + 108.0 / z;
                Ok(1.0e3 * dp_kpa)
            }
            OverpressureMethod::Bst { mach_flame_speed } => {
                let curve = bst_curve(*mach_flame_speed)?;
                let energy =
                    GROUND_REFLECTION * flammable_mass_kg * heat_of_combustion_jpkg;
                let r_scaled = distance_m * (p_amb / energy).cbrt();
                let p_scaled = loglog_interp(&BST_SCALED_R, &BST_SCALED_P[curve], r_scaled);
                debug!(r_scaled, p_scaled, "bst overpressure lookup");
                Ok(p_scaled * p_amb)
            }
            OverpressureMethod::Bauwens => {
                let energy =
                    GROUND_REFLECTION * flammable_mass_kg * heat_of_combustion_jpkg;
                let r = distance_m * (p_amb / energy).cbrt();
                let p_scaled =
                    0.34 / r.powf(4.0 / 3.0) + 0.062 / (r * r) + 0.0033 / (r * r * r);
                Ok(p_scaled * p_amb)
            }
        }
    }

    /// Positive-phase impulse [Pa·s] at a distance, `None` for a method
    /// that does not define one.
    pub fn impulse(
        &self,
        flammable_mass_kg: f64,
        heat_of_combustion_jpkg: f64,
        ambient: &Fluid,
        distance_m: f64,
    ) -> FlameResult<Option<f64>> {
        check_blast_args(flammable_mass_kg, heat_of_combustion_jpkg, distance_m)?;
        match self {
            OverpressureMethod::Bauwens => Ok(None),
            _ if flammable_mass_kg == 0.0 => Ok(Some(0.0)),
            OverpressureMethod::Tnt { equivalence_factor } => {
                let w = equivalence_factor * flammable_mass_kg * heat_of_combustion_jpkg
                    / TNT_BLAST_ENERGY_JPKG;
                let z = distance_m / w.cbrt();
                Ok(Some(200.0 * w.cbrt() / z))
            }
            OverpressureMethod::Bst { mach_flame_speed } => {
                let curve = bst_curve(*mach_flame_speed)?;
                let p_amb = ambient.p_pa();
                let energy =
                    GROUND_REFLECTION * flammable_mass_kg * heat_of_combustion_jpkg;
                let r_scaled = distance_m * (p_amb / energy).cbrt();
                let i_scaled = loglog_interp(&BST_SCALED_R, &BST_SCALED_I[curve], r_scaled);
                let a_amb = ambient.speed_of_sound();
                Ok(Some(
                    i_scaled * energy.cbrt() * p_amb.powf(2.0 / 3.0) / a_amb,
                ))
            }
        }
    }
}

fn check_blast_args(
    flammable_mass_kg: f64,
    heat_of_combustion_jpkg: f64,
    distance_m: f64,
) -> FlameResult<()> {
    if !flammable_mass_kg.is_finite() || flammable_mass_kg < 0.0 {
        return Err(FlameError::NonPhysical {
            what: "flammable mass",
        });
    }
    if !heat_of_combustion_jpkg.is_finite() || heat_of_combustion_jpkg <= 0.0 {
        return Err(FlameError::NonPhysical {
            what: "heat of combustion",
        });
    }
    if !distance_m.is_finite() || distance_m <= 0.0 {
        return Err(FlameError::NonPhysical {
            what: "blast distance",
        });
    }
    Ok(())
}

/// Index of the tabulated curve for a requested Mach flame speed.
fn bst_curve(mach_flame_speed: f64) -> FlameResult<usize> {
    BST_MACH_SPEEDS
        .iter()
        .position(|&mf| (mf - mach_flame_speed).abs() < 1e-9)
        .ok_or(FlameError::NonPhysical {
            what: "BST Mach flame speed (tabulated: 0.2, 0.35, 0.7, 1.0, 1.4, 2.0, 5.2)",
        })
}

/// Log-log linear interpolation, clamped at the table ends.
fn loglog_interp(xs: &[f64], ys: &[f64], xq: f64) -> f64 {
    let n = xs.len();
    if xq <= xs[0] {
        return ys[0];
    }
    if xq >= xs[n - 1] {
        return ys[n - 1];
    }
    let lq = xq.log10();
    let mut i = 1;
    while xs[i] < xq {
        i += 1;
    }
    let (lx0, lx1) = (xs[i - 1].log10(), xs[i].log10());
    let (ly0, ly1) = (ys[i - 1].log10(), ys[i].log10());
    10f64.powf(ly0 + (ly1 - ly0) * (lq - lx0) / (lx1 - lx0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hy_core::units::{k, pa};
    use hy_fluids::{Blend, GasModel, Species, StateSpec};

    fn ambient() -> Fluid {
        Fluid::new(
            Blend::pure(Species::Air),
            GasModel::IdealGas,
            StateSpec::TP {
                t: k(288.0),
                p: pa(101_325.0),
            },
        )
        .unwrap()
    }

    const DH_H2: f64 = 1.1996e8;

    #[test]
    fn keys_resolve_with_defaults() {
        assert!(matches!(
            OverpressureMethod::from_key("BST").unwrap(),
            OverpressureMethod::Bst { mach_flame_speed } if (mach_flame_speed - 0.35).abs() < 1e-12
        ));
        assert!(matches!(
            OverpressureMethod::from_key("tnt").unwrap(),
            OverpressureMethod::Tnt { .. }
        ));
        assert_eq!(
            OverpressureMethod::from_key("Bauwens").unwrap(),
            OverpressureMethod::Bauwens
        );
        assert!(OverpressureMethod::from_key("dynamite").is_err());
    }

    #[test]
    fn only_bauwens_lacks_impulse() {
        assert!(OverpressureMethod::Bst {
            mach_flame_speed: 0.35
        }
        .produces_impulse());
        assert!(OverpressureMethod::Tnt {
            equivalence_factor: 0.03
        }
        .produces_impulse());
        assert!(!OverpressureMethod::Bauwens.produces_impulse());
        let imp = OverpressureMethod::Bauwens
            .impulse(1.0, DH_H2, &ambient(), 10.0)
            .unwrap();
        assert!(imp.is_none());
    }

    #[test]
    fn tnt_hand_checked_case() {
        // 1 kg H2 at 3% yield: W = 0.769 kg TNT, Z = 10.915 at 10 m,
        // Mills gives 10.30 kPa and 16.8 Pa·s
        let tnt = OverpressureMethod::Tnt {
            equivalence_factor: 0.03,
        };
        let p = tnt.peak_overpressure(1.0, DH_H2, &ambient(), 10.0).unwrap();
        assert!((p - 10_300.0).abs() < 150.0, "p {p}");
        let i = tnt.impulse(1.0, DH_H2, &ambient(), 10.0).unwrap().unwrap();
        assert!((i - 16.79).abs() < 0.25, "i {i}");
    }

    #[test]
    fn pressure_decays_with_distance_for_all_methods() {
        let methods = [
            OverpressureMethod::Bst {
                mach_flame_speed: 0.35,
            },
            OverpressureMethod::Tnt {
                equivalence_factor: 0.03,
            },
            OverpressureMethod::Bauwens,
        ];
        for method in methods {
            let mut prev = f64::INFINITY;
            for r in [2.0, 5.0, 10.0, 25.0, 60.0] {
                let p = method.peak_overpressure(1.0, DH_H2, &ambient(), r).unwrap();
                assert!(p > 0.0 && p < prev, "{} at {r} m: {p}", method.key());
                prev = p;
            }
        }
    }

    #[test]
    fn faster_flames_hit_harder() {
        let slow = OverpressureMethod::Bst {
            mach_flame_speed: 0.2,
        };
        let fast = OverpressureMethod::Bst {
            mach_flame_speed: 5.2,
        };
        let p_slow = slow.peak_overpressure(1.0, DH_H2, &ambient(), 10.0).unwrap();
        let p_fast = fast.peak_overpressure(1.0, DH_H2, &ambient(), 10.0).unwrap();
        assert!(p_fast > 5.0 * p_slow);
    }

    #[test]
    fn untabulated_flame_speed_is_rejected() {
        let odd = OverpressureMethod::Bst {
            mach_flame_speed: 0.33,
        };
        assert!(odd.peak_overpressure(1.0, DH_H2, &ambient(), 10.0).is_err());
        assert!(odd.impulse(1.0, DH_H2, &ambient(), 10.0).is_err());
    }

    #[test]
    fn empty_cloud_produces_no_blast() {
        let bst = OverpressureMethod::Bst {
            mach_flame_speed: 0.35,
        };
        assert_eq!(
            bst.peak_overpressure(0.0, DH_H2, &ambient(), 10.0).unwrap(),
            0.0
        );
        assert_eq!(bst.impulse(0.0, DH_H2, &ambient(), 10.0).unwrap(), Some(0.0));
        assert!(bst.peak_overpressure(-1.0, DH_H2, &ambient(), 10.0).is_err());
        assert!(bst.peak_overpressure(1.0, DH_H2, &ambient(), 0.0).is_err());
    }

    #[test]
    fn bauwens_detonation_exceeds_weak_deflagration() {
        let bst = OverpressureMethod::Bst {
            mach_flame_speed: 0.35,
        };
        let p_defl = bst.peak_overpressure(1.0, DH_H2, &ambient(), 15.0).unwrap();
        let p_det = OverpressureMethod::Bauwens
            .peak_overpressure(1.0, DH_H2, &ambient(), 15.0)
            .unwrap();
        assert!(p_det > p_defl);
    }
}
