//! The per-facility risk analysis.
//!
//! [`analyze`] drives the whole chain for one facility description: a
//! pre-flight validation pass that aborts on an inconsistent request; then
//! per leak size the frequency resolution, choked-or-overridden discharge,
//! dispersion, flame radiation and blast overpressure at every occupant
//! position, and ignition-branch weighting; and finally the facility rollup
//! into PLL, FAR, and AIR. A physics failure in one leak size zeroes that
//! record and never aborts the others.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use hy_core::units::m;
use hy_flame::{CombustionProducts, Flame, FlameConfig, OverpressureMethod, RadSourceModel};
use hy_fluids::Fluid;
use hy_jet::{ExitPlane, Jet, JetConfig};
use hy_release::{EffectiveSource, NozzleModel, Orifice};

use crate::components::ComponentSet;
use crate::error::{QraError, QraResult};
use crate::failures::FailureSet;
use crate::ignition::{cond_immediate_prob, total_ignition_prob, IgnitionProbTable};
use crate::leak::LeakSize;
use crate::occupants::{mean_exposure_hours, total_occupants, OccupantGroup};
use crate::probit::{OverpressureProbit, ThermalProbit};
use crate::results::{AnalysisResults, AnalysisStatus, LeakResult};

/// Salt for the RNG stream that places occupants, so frequency sampling
/// elsewhere never shifts where people stand.
const OCCUPANT_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

const HOURS_PER_YEAR: f64 = 8760.0;

/// FAR is expressed per 10⁸ exposure-hours.
const FAR_SCALE: f64 = 1.0e8;

/// Everything one analysis needs. Build with [`AnalysisRequest::new`] and
/// overwrite fields for the case at hand.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Stagnation state of the leaking system.
    pub tank: Fluid,
    pub ambient: Fluid,
    /// Full-bore inner diameter the leak sizes scale from [m].
    pub pipe_inner_diameter_m: f64,
    pub discharge_coeff: f64,
    pub nozzle: NozzleModel,
    pub release_angle_rad: f64,
    pub release_height_m: f64,
    /// Sizes to analyze; any order, any subset, no duplicates.
    pub leak_sizes: Vec<LeakSize>,
    pub components: ComponentSet,
    pub failures: FailureSet,
    pub ignition: IgnitionProbTable,
    pub occupant_groups: Vec<OccupantGroup>,
    pub thermal_probit: ThermalProbit,
    pub thermal_exposure_s: f64,
    pub overpressure_probit: OverpressureProbit,
    pub overpressure_method: OverpressureMethod,
    pub rad_source: RadSourceModel,
    /// Flame solver knobs (spreading, humidity, emitter count).
    pub flame: FlameConfig,
    /// Cold-jet knobs for the flammable-inventory march.
    pub jet: JetConfig,
    /// Fraction of releases detected and isolated before ignition.
    pub detection_credit: f64,
    /// Caller-supplied discharge rate per size [kg/s]; required where the
    /// release is unchoked, ignored where it chokes.
    pub mass_flow_overrides: BTreeMap<LeakSize, f64>,
    /// Caller-supplied release frequency per size [1/yr], replacing the
    /// component and fueling-failure aggregation.
    pub frequency_overrides: BTreeMap<LeakSize, f64>,
    pub seed: u64,
}

impl AnalysisRequest {
    /// A request with field defaults for a gaseous-hydrogen facility:
    /// all five leak sizes, the standard hydrogen ignition table, BST
    /// blast at Mach 0.35, lung-damage blast probit, and no components,
    /// fueling demands, or occupants until the caller adds them.
    pub fn new(tank: Fluid, ambient: Fluid, pipe_inner_diameter_m: f64) -> Self {
        Self {
            tank,
            ambient,
            pipe_inner_diameter_m,
            discharge_coeff: 1.0,
            nozzle: NozzleModel::YuceilOtugen,
            release_angle_rad: 0.0,
            release_height_m: 0.0,
            leak_sizes: LeakSize::ALL.to_vec(),
            components: ComponentSet::default(),
            failures: FailureSet::none(),
            ignition: IgnitionProbTable::hydrogen_default(),
            occupant_groups: Vec::new(),
            thermal_probit: ThermalProbit::Eisenberg,
            thermal_exposure_s: 60.0,
            overpressure_probit: OverpressureProbit::LungEisenberg,
            overpressure_method: OverpressureMethod::Bst {
                mach_flame_speed: 0.35,
            },
            rad_source: RadSourceModel::Multi,
            flame: FlameConfig::default(),
            jet: JetConfig::default(),
            detection_credit: 0.9,
            mass_flow_overrides: BTreeMap::new(),
            frequency_overrides: BTreeMap::new(),
            seed: 0,
        }
    }

    /// Pre-flight validation. Everything here aborts the analysis before
    /// any physics runs.
    pub fn validate(&self) -> QraResult<()> {
        let invalid = |what: String| Err(QraError::Validation { what });

        if !self.pipe_inner_diameter_m.is_finite() || self.pipe_inner_diameter_m <= 0.0 {
            return invalid(format!("pipe inner diameter {} m", self.pipe_inner_diameter_m));
        }
        if !self.discharge_coeff.is_finite()
            || self.discharge_coeff <= 0.0
            || self.discharge_coeff > 1.0
        {
            return invalid(format!("discharge coefficient {}", self.discharge_coeff));
        }
        if !(0.0..=1.0).contains(&self.detection_credit) {
            return invalid(format!("detection credit {}", self.detection_credit));
        }
        if !self.thermal_exposure_s.is_finite() || self.thermal_exposure_s <= 0.0 {
            return invalid(format!("thermal exposure {} s", self.thermal_exposure_s));
        }
        if !self.release_height_m.is_finite() || !self.release_angle_rad.is_finite() {
            return invalid("release geometry must be finite".into());
        }

        let mut seen = BTreeSet::new();
        for &size in &self.leak_sizes {
            if !seen.insert(size) {
                return invalid(format!("leak size {size} listed twice"));
            }
        }

        if self.overpressure_probit.needs_impulse() && !self.overpressure_method.produces_impulse()
        {
            return invalid(format!(
                "probit model {:?} consumes impulse but the {:?} overpressure \
                 method does not produce one",
                self.overpressure_probit.key(),
                self.overpressure_method.key(),
            ));
        }

        for group in &self.occupant_groups {
            group.validate()?;
        }
        for spec in [
            &self.failures.nozzle_popoff,
            &self.failures.nozzle_ftc,
            &self.failures.mvalve_ftc,
            &self.failures.svalve_ftc,
            &self.failures.svalve_ccf,
            &self.failures.prv_fto,
            &self.failures.driveoff,
            &self.failures.coupling_ftc,
            &self.failures.overpressure_rupture,
        ] {
            spec.validate()?;
        }

        for (&size, &mdot) in &self.mass_flow_overrides {
            if !mdot.is_finite() || mdot <= 0.0 {
                return invalid(format!("mass flow override {mdot} kg/s at {size}"));
            }
        }
        for (&size, &f) in &self.frequency_overrides {
            if !f.is_finite() || f < 0.0 {
                return invalid(format!("frequency override {f} /yr at {size}"));
            }
        }

        if self.tank.blend().heat_of_combustion().is_none()
            || self.tank.blend().lean_flammability_limit().is_none()
        {
            return invalid("release blend carries no flammable component".into());
        }
        Ok(())
    }
}

/// Run one full analysis: validate, place occupants, walk the requested
/// leak sizes, aggregate the facility risk metrics.
pub fn analyze(request: &AnalysisRequest) -> QraResult<AnalysisResults> {
    request.validate()?;

    let mut occ_rng = StdRng::seed_from_u64(request.seed ^ OCCUPANT_STREAM_SALT);
    let mut positions = Vec::new();
    for group in &request.occupant_groups {
        positions.extend(group.sample_positions(&mut occ_rng)?);
    }
    let heads = total_occupants(&request.occupant_groups);
    let exposure = mean_exposure_hours(&request.occupant_groups);

    let blend = request.tank.blend().clone();
    let no_fuel = || QraError::Validation {
        what: "release blend carries no flammable component".into(),
    };
    let lfl = blend.lean_flammability_limit().ok_or_else(no_fuel)?;
    let dh_c = blend.heat_of_combustion().ok_or_else(no_fuel)?;

    let mut chem =
        CombustionProducts::build(&blend, request.ambient.t_k(), request.ambient.p_pa())?;

    let mut leak_results = Vec::with_capacity(request.leak_sizes.len());
    for &size in &request.leak_sizes {
        let leak_d = size.leak_diameter_m(request.pipe_inner_diameter_m);
        match leak_size_result(request, size, leak_d, &positions, lfl, dh_c, &mut chem) {
            Ok(result) => leak_results.push(result),
            Err(err) => {
                debug!(%size, error = %err, "leak size failed; continuing");
                leak_results.push(LeakResult::failed(size, leak_d, &err));
            }
        }
    }

    let total_pll: f64 = leak_results.iter().map(|r| r.pll_contribution).sum();
    let (far, air) = if heads == 0 {
        (0.0, 0.0)
    } else {
        let far = total_pll * FAR_SCALE / (f64::from(heads) * HOURS_PER_YEAR);
        (far, far / FAR_SCALE * exposure)
    };
    info!(total_pll, far, air, sizes = leak_results.len(), "analysis complete");

    Ok(AnalysisResults {
        leak_results,
        positions,
        total_occupants: heads,
        mean_exposure_hours: exposure,
        total_pll,
        far,
        air,
    })
}

/// One leak size end to end. Any error here belongs to this size alone.
#[allow(clippy::too_many_arguments)]
fn leak_size_result(
    request: &AnalysisRequest,
    size: LeakSize,
    leak_d: f64,
    positions: &[[f64; 3]],
    lfl: f64,
    dh_c: f64,
    chem: &mut CombustionProducts,
) -> QraResult<LeakResult> {
    let orifice = Orifice::new(m(leak_d), request.discharge_coeff)?;

    let freq_override = request.frequency_overrides.get(&size).copied();
    let frequency = match freq_override {
        Some(f) => f,
        None => {
            let mut f = request.components.mean_frequency(size);
            if size == LeakSize::Pct100 {
                f += request.failures.mean_frequency();
            }
            f
        }
    };

    let mdot_override = request.mass_flow_overrides.get(&size).copied();
    let choked = request.tank.is_choked_against(request.ambient.p_pa());
    let eff = EffectiveSource::resolve(
        &request.tank,
        &orifice,
        &request.ambient,
        request.nozzle,
        mdot_override,
    )?;
    let mdot = eff.mdot_kgps;
    let mut warnings = Vec::new();
    if let Some(over) = mdot_override {
        if choked {
            warnings.push(format!(
                "release chokes at {size}; ignoring the supplied {over} kg/s"
            ));
        } else {
            warnings.push(format!(
                "release is unchoked at {size}; discharge taken from the \
                 supplied {over} kg/s"
            ));
        }
    }

    let (p_immediate, p_delayed) = request.ignition.probabilities(mdot);
    let p_total = total_ignition_prob(p_immediate, p_delayed);
    let cond_immediate = cond_immediate_prob(p_immediate, p_total);

    let exit = ExitPlane::from_effective(
        &eff,
        request.ambient.clone(),
        request.release_angle_rad,
        0.0,
        request.release_height_m,
    )?;

    // Cold-jet flammable inventory feeds the delayed-ignition blast
    let jet = Jet::solve(&exit, &request.jet)?;
    let flammable_kg = jet.m_flammable(f64::INFINITY, lfl)?;

    // Ignited-jet branch: radiant field and per-position thermal harm
    let flame = Flame::solve(&exit, chem, &request.flame)?;
    let position_heat_flux: Vec<f64> = flame.heat_flux_grid(positions, request.rad_source);
    let thermal_sum: f64 = position_heat_flux
        .iter()
        .map(|&q| {
            request
                .thermal_probit
                .fatality_probability(q, request.thermal_exposure_s)
        })
        .sum();

    // Delayed branch: blast from the flammable cloud, measured from the
    // release point
    let mut position_overpressure = Vec::with_capacity(positions.len());
    let mut position_impulse = request
        .overpressure_method
        .produces_impulse()
        .then(|| Vec::with_capacity(positions.len()));
    let mut overpressure_sum = 0.0;
    for pos in positions {
        let dx = pos[0];
        let dy = pos[1] - request.release_height_m;
        let dz = pos[2];
        let dist = (dx * dx + dy * dy + dz * dz).sqrt();
        let p_pa = request.overpressure_method.peak_overpressure(
            flammable_kg,
            dh_c,
            &request.ambient,
            dist,
        )?;
        let impulse = request
            .overpressure_method
            .impulse(flammable_kg, dh_c, &request.ambient, dist)?;
        overpressure_sum += request
            .overpressure_probit
            .fatality_probability(p_pa, impulse)?;
        position_overpressure.push(p_pa);
        if let (Some(series), Some(i)) = (position_impulse.as_mut(), impulse) {
            series.push(i);
        }
    }

    let events_per_year = frequency * (1.0 - request.detection_credit);
    let pll_contribution = events_per_year
        * p_total
        * (cond_immediate * thermal_sum + (1.0 - cond_immediate) * overpressure_sum);
    debug!(
        %size,
        mdot,
        frequency,
        flammable_kg,
        thermal_sum,
        overpressure_sum,
        pll_contribution,
        "leak size resolved"
    );

    Ok(LeakResult {
        size,
        leak_diameter_m: leak_d,
        discharge_kgps: mdot,
        mass_flow_overridden: mdot_override.is_some() && !choked,
        frequency_per_year: frequency,
        frequency_overridden: freq_override.is_some(),
        p_immediate,
        p_delayed,
        p_total_ignition: p_total,
        position_heat_flux_wpm2: position_heat_flux,
        position_overpressure_pa: position_overpressure,
        position_impulse_pas: position_impulse,
        thermal_fatalities: thermal_sum,
        overpressure_fatalities: overpressure_sum,
        pll_contribution,
        status: if warnings.is_empty() {
            AnalysisStatus::Success
        } else {
            AnalysisStatus::Warning { messages: warnings }
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentCategory, Fuel, Phase};
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

    fn tank(p_pa_val: f64) -> Fluid {
        Fluid::new(
            Blend::pure(Species::H2),
            GasModel::AbelNoble,
            StateSpec::TP {
                t: k(288.0),
                p: pa(p_pa_val),
            },
        )
        .unwrap()
    }

    fn small_request() -> AnalysisRequest {
        let mut req = AnalysisRequest::new(tank(3.0e6), ambient(), 6.223e-3);
        req.leak_sizes = vec![LeakSize::Pct1];
        req.components = ComponentSet::new(vec![Component::new(
            ComponentCategory::Valve,
            5,
            Fuel::Hydrogen,
            Phase::Gas,
        )]);
        req.occupant_groups = vec![OccupantGroup::fixed(2, 6.0, 0.0, 3.0, 2000.0)];
        req.seed = 42;
        req
    }

    #[test]
    fn empty_system_carries_no_risk() {
        let mut req = small_request();
        req.components = ComponentSet::default();
        req.failures = FailureSet::none();
        let out = analyze(&req).unwrap();
        assert_eq!(out.total_pll, 0.0);
        assert_eq!(out.far, 0.0);
        // Physics still ran: the record carries a real discharge rate
        assert!(out.leak_results[0].discharge_kgps > 0.0);
    }

    #[test]
    fn empty_building_carries_no_risk() {
        let mut req = small_request();
        req.occupant_groups = Vec::new();
        let out = analyze(&req).unwrap();
        assert_eq!(out.total_pll, 0.0);
        assert_eq!(out.far, 0.0);
        assert_eq!(out.air, 0.0);
        assert!(out.positions.is_empty());
    }

    #[test]
    fn perfect_detection_carries_no_risk() {
        let mut req = small_request();
        req.detection_credit = 1.0;
        let out = analyze(&req).unwrap();
        assert_eq!(out.total_pll, 0.0);
        assert!(out.leak_results[0].frequency_per_year > 0.0);
    }

    #[test]
    fn unignitable_release_carries_no_risk_but_full_physics() {
        let mut req = small_request();
        req.ignition =
            IgnitionProbTable::new(vec![0.125], vec![0.0, 0.0], vec![0.0, 0.0]).unwrap();
        let out = analyze(&req).unwrap();
        assert_eq!(out.total_pll, 0.0);
        let record = &out.leak_results[0];
        assert_eq!(record.p_total_ignition, 0.0);
        // Consequence fields stay populated for inspection
        assert_eq!(record.position_heat_flux_wpm2.len(), 2);
        assert!(record.position_overpressure_pa.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn bauwens_with_impulse_probit_aborts_before_physics() {
        let mut req = small_request();
        req.overpressure_method = OverpressureMethod::Bauwens;
        req.overpressure_probit = OverpressureProbit::HeadImpact;
        let err = analyze(&req).unwrap_err();
        assert!(matches!(err, QraError::Validation { .. }));
    }

    #[test]
    fn duplicate_leak_sizes_are_rejected() {
        let mut req = small_request();
        req.leak_sizes = vec![LeakSize::Pct1, LeakSize::Pct1];
        assert!(matches!(
            analyze(&req).unwrap_err(),
            QraError::Validation { .. }
        ));
    }

    #[test]
    fn unchoked_sizes_fail_alone_when_only_some_are_overridden() {
        let mut req = small_request();
        req.tank = tank(101_325.0 * 1.05);
        req.leak_sizes = vec![LeakSize::Pct1, LeakSize::Pct10];
        req.mass_flow_overrides.insert(LeakSize::Pct1, 1.0e-5);
        let out = analyze(&req).unwrap();

        let fixed = out.result_for(LeakSize::Pct1).unwrap();
        assert!(matches!(fixed.status, AnalysisStatus::Warning { .. }));
        assert!(fixed.mass_flow_overridden);
        assert!((fixed.discharge_kgps - 1.0e-5).abs() < 1e-12);

        let broken = out.result_for(LeakSize::Pct10).unwrap();
        assert!(broken.status.is_fatal());
        assert_eq!(broken.pll_contribution, 0.0);
    }

    #[test]
    fn choked_release_ignores_overrides_with_a_warning() {
        let mut req = small_request();
        req.mass_flow_overrides.insert(LeakSize::Pct1, 123.0);
        let out = analyze(&req).unwrap();
        let record = &out.leak_results[0];
        assert!(!record.mass_flow_overridden);
        assert!((record.discharge_kgps - 123.0).abs() > 1.0);
        assert!(matches!(record.status, AnalysisStatus::Warning { .. }));
    }

    #[test]
    fn frequency_override_replaces_component_aggregation() {
        let mut req = small_request();
        req.frequency_overrides.insert(LeakSize::Pct1, 7.5e-4);
        let out = analyze(&req).unwrap();
        let record = &out.leak_results[0];
        assert!(record.frequency_overridden);
        assert!((record.frequency_per_year - 7.5e-4).abs() < 1e-18);
    }

    #[test]
    fn far_and_air_follow_pll() {
        // Full-bore rupture of a high-pressure line with people close
        // enough that the thermal probit is solidly nonzero
        let mut req = small_request();
        req.tank = tank(35.0e6);
        req.leak_sizes = vec![LeakSize::Pct100];
        req.occupant_groups = vec![OccupantGroup::fixed(2, 7.0, 0.0, 4.0, 2000.0)];
        let out = analyze(&req).unwrap();
        assert!(out.total_pll > 0.0);
        let far_expect = out.total_pll * 1.0e8 / (2.0 * 8760.0);
        assert!((out.far - far_expect).abs() < far_expect * 1e-12);
        let air_expect = out.far * 1.0e-8 * 2000.0;
        assert!((out.air - air_expect).abs() < air_expect * 1e-12);
    }
}
