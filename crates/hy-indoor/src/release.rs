//! Layer accumulation driven by a release schedule.
//!
//! The release enters as a quasi-steady plume; everything the plume carries
//! past the layer-bottom plane feeds a well-mixed buoyant layer under the
//! ceiling, which in turn vents through the enclosure openings. Plumes are
//! rebuilt only when the scheduled flow changes; the layer state itself is
//! a 2-state ODE (volume, fuel mole fraction) marched between the requested
//! output times.

use crate::enclosure::Enclosure;
use crate::error::{IndoorError, IndoorResult};
use crate::layer::LayerModel;
use crate::overpressure::dp_expansion;
use hy_core::units::constants::{G0_MPS2, R_UNIVERSAL};
use hy_core::units::{k, pa};
use hy_fluids::{Fluid, Species, StateSpec};
use hy_jet::{ExitPlane, Jet, JetConfig};
use hy_release::{BlowdownHistory, EffectiveSource, NozzleModel, Orifice};
use hy_solver::{rk45_adaptive, Interp1, OdeOptions, OdeStatus, SolverError, StepOutcome};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::debug;

/// Seed layer volume as a fraction of the enclosure volume. The mole
/// balance divides by the layer volume, so the layer starts at one part
/// per million of the room instead of exactly empty.
const SEED_VOLUME_FRACTION: f64 = 1.0e-6;

/// Slack on the hard state bounds, absorbing integrator truncation noise.
const BOUNDS_SLACK: f64 = 1.0e-9;

/// Mass-flow boundary condition for an accumulation run.
#[derive(Debug, Clone)]
pub enum FlowSchedule<'a> {
    /// Constant release from the unchanging tank state. A choked tank
    /// determines its own flow; an unchoked tank cannot, so
    /// `mdot_override_kgps` must be supplied for one.
    Steady {
        duration_s: f64,
        mdot_override_kgps: Option<f64>,
    },
    /// A recorded blowdown, treated as piecewise-constant flow between
    /// consecutive samples. The final sample closes the history.
    Blowdown(&'a BlowdownHistory),
}

/// A release discharging into an enclosure.
#[derive(Debug, Clone)]
pub struct Scenario<'a> {
    pub tank: &'a Fluid,
    pub orifice: &'a Orifice,
    pub ambient: &'a Fluid,
    pub enclosure: &'a Enclosure,
    pub nozzle: NozzleModel,
    pub layer: LayerModel,
    pub schedule: FlowSchedule<'a>,
}

/// March controls for the accumulation run.
#[derive(Debug, Clone)]
pub struct AccumulationConfig {
    /// Jet-model configuration for the per-segment plumes.
    pub jet: JetConfig,
    /// Release angle from horizontal [rad].
    pub release_angle_rad: f64,
    /// Relative tolerance of the layer ODE.
    pub rtol: f64,
    /// Absolute tolerance of the layer ODE.
    pub atol: f64,
    /// Accepted-step budget per output interval.
    pub max_steps: usize,
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        Self {
            // Accumulation stays near ambient temperature, so the cheap
            // ambient-temperature jet closure is the right default here.
            jet: JetConfig {
                conserve_energy: false,
                ..JetConfig::default()
            },
            release_angle_rad: FRAC_PI_2,
            rtol: 1e-6,
            atol: 1e-9,
            max_steps: 20_000,
        }
    }
}

/// One stretch of constant release flow with its plume.
struct Segment {
    t_start_s: f64,
    t_end_s: f64,
    mdot_kgps: f64,
    /// Index into the plume pool; `None` once the flow has stopped.
    jet_idx: Option<usize>,
}

/// Constants shared by every layer-ODE interval.
struct LayerDynamics<'a> {
    encl: &'a Enclosure,
    layer: LayerModel,
    rho_amb: f64,
    t_amb_k: f64,
    p_amb_pa: f64,
    mw_fuel_kgpmol: f64,
    mw_air_kgpmol: f64,
    rho_fuel_amb: f64,
    q_forced_m3ps: f64,
    v_encl_m3: f64,
}

impl LayerDynamics<'_> {
    /// Ideal-mixture layer density at ambient temperature and pressure.
    fn rho_layer(&self, x_mole: f64) -> f64 {
        let mw = x_mole * self.mw_fuel_kgpmol + (1.0 - x_mole) * self.mw_air_kgpmol;
        self.p_amb_pa * mw / (R_UNIVERSAL * self.t_amb_k)
    }

    /// March the layer state across one constant-flow interval.
    fn integrate(
        &self,
        state: &mut [f64; 2],
        t0_s: f64,
        t1_s: f64,
        seg: &Segment,
        jets: &[Jet],
        cfg: &AccumulationConfig,
    ) -> IndoorResult<()> {
        let jet = seg.jet_idx.map(|i| &jets[i]);
        let q_release = seg.mdot_kgps / self.rho_fuel_amb;
        // Trajectory height range, for clamping the layer-bottom lookup
        let (y_lo, y_hi) = match jet {
            Some(j) => j
                .y()
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| {
                    (lo.min(y), hi.max(y))
                }),
            None => (0.0, 0.0),
        };
        let a_floor = self.encl.floor_area_m2;
        let h_ceil = self.encl.height_m;
        let vent_h = self.encl.ceiling_vent.height_m;
        let seed_m3 = SEED_VOLUME_FRACTION * self.v_encl_m3;

        let rhs = |_t: f64, y: &[f64], dy: &mut [f64]| -> Result<(), SolverError> {
            let v_l = y[0];
            let x_l = y[1].clamp(0.0, 1.0);
            let y_b = h_ceil - v_l.max(0.0) / a_floor;

            // Plume volumetric flux crossing the layer bottom. A layer
            // that has engulfed the release clamps to the plume base,
            // where the flux is essentially the release flow itself.
            let q_jet = match jet {
                Some(j) => match j.velocity_halfwidth_at_height(y_b.clamp(y_lo, y_hi)) {
                    Some((v, b)) => PI * b * b * v,
                    None => 0.0,
                },
                None => 0.0,
            };

            let g_prime = G0_MPS2 * (self.rho_amb - self.rho_layer(x_l)) / self.rho_amb;
            // A vent below the layer bottom sits in fresh air and removes
            // nothing from the layer; forced flows only purge the layer
            // once the ceiling opening is submerged in it. Mechanical
            // supply at the floor displaces an equal outflow up top, so
            // both forced flows count.
            let vent_submerged = match self.layer {
                LayerModel::Lowesmith => y_b <= vent_h,
                LayerModel::MixingBox => true,
            };
            let q_out = self.layer.buoyant_outflow(y_b, g_prime, self.encl)
                + if vent_submerged {
                    self.q_forced_m3ps
                } else {
                    0.0
                };

            dy[0] = q_jet - q_out;
            // d(V·X)/dt = q_release − X·q_out, minus X·dV/dt
            dy[1] = (q_release - x_l * q_jet) / v_l.max(seed_m3);
            Ok(())
        };

        let mut violation: Option<String> = None;
        let v_encl = self.v_encl_m3;
        let tol_v = BOUNDS_SLACK * v_encl;
        let observer = |t: f64, y: &[f64]| {
            let (v_l, x_l) = (y[0], y[1]);
            if v_l < -tol_v || v_l > v_encl + tol_v {
                violation = Some(format!(
                    "layer volume {v_l:.6e} m3 outside [0, {v_encl:.6e}] m3 at t = {t:.3} s"
                ));
                return StepOutcome::Stop;
            }
            if x_l < -BOUNDS_SLACK || x_l > 1.0 + BOUNDS_SLACK {
                violation = Some(format!(
                    "layer mole fraction {x_l:.6e} outside [0, 1] at t = {t:.3} s"
                ));
                return StepOutcome::Stop;
            }
            StepOutcome::Continue
        };

        let sol = rk45_adaptive(
            rhs,
            t0_s,
            t1_s,
            state,
            &OdeOptions {
                rtol: cfg.rtol,
                atol: cfg.atol,
                max_steps: cfg.max_steps,
                ..OdeOptions::default()
            },
            observer,
        )?;
        match sol.status {
            OdeStatus::Completed => {
                let last = &sol.x[sol.x.len() - 1];
                state[0] = last[0];
                state[1] = last[1];
                Ok(())
            }
            OdeStatus::StoppedByObserver => Err(IndoorError::BoundsViolation {
                what: violation.unwrap_or_else(|| "layer state left its bounds".into()),
            }),
            OdeStatus::MaxSteps => Err(IndoorError::Solver(SolverError::ConvergenceFailed {
                what: format!(
                    "layer ODE exhausted {} steps over [{t0_s:.3}, {t1_s:.3}] s",
                    cfg.max_steps
                ),
            })),
        }
    }
}

/// Accumulation time series with interpolating queries.
///
/// Built once from a schedule; never mutated afterward. All series share
/// the output time grid passed to [`IndoorRelease::build`].
#[derive(Debug, Clone)]
pub struct IndoorRelease {
    t_s: Vec<f64>,
    layer_volume_m3: Vec<f64>,
    layer_mole_frac: Vec<f64>,
    layer_depth_m: Vec<f64>,
    jet_flammable_kg: Vec<f64>,
    layer_flammable_kg: Vec<f64>,
    dp_jet_pa: Vec<f64>,
    dp_combined_pa: Vec<f64>,
    n_plumes: usize,
    pressure_interp: Interp1,
    depth_interp: Interp1,
    conc_interp: Interp1,
}

impl IndoorRelease {
    /// Integrate the layer ODE over the schedule and tabulate the series
    /// at `times_s` (strictly increasing, at least two points).
    ///
    /// Output times past the end of the schedule are allowed: the release
    /// is over, and the layer drains through the vents.
    pub fn build(
        scenario: &Scenario<'_>,
        times_s: &[f64],
        cfg: &AccumulationConfig,
    ) -> IndoorResult<Self> {
        validate_times(times_s)?;
        let encl = scenario.enclosure;
        let ambient = scenario.ambient;
        let blend = scenario.tank.blend().clone();
        let rho_fuel_amb = scenario
            .tank
            .with_state(StateSpec::TP {
                t: k(ambient.t_k()),
                p: pa(ambient.p_pa()),
            })?
            .rho();
        let lfl_mole = blend.lean_flammability_limit();

        let dyn_ctx = LayerDynamics {
            encl,
            layer: scenario.layer,
            rho_amb: ambient.rho(),
            t_amb_k: ambient.t_k(),
            p_amb_pa: ambient.p_pa(),
            mw_fuel_kgpmol: blend.molar_mass() * 1.0e-3,
            mw_air_kgpmol: Species::Air.molar_mass() * 1.0e-3,
            rho_fuel_amb,
            q_forced_m3ps: encl.ceiling_vent.forced_flow_m3ps + encl.floor_vent.forced_flow_m3ps,
            v_encl_m3: encl.volume_m3(),
        };

        let (jets, mut segments) = build_segments(scenario, cfg)?;
        let t_last = times_s[times_s.len() - 1];
        let sched_end = segments[segments.len() - 1].t_end_s;
        if t_last > sched_end {
            segments.push(Segment {
                t_start_s: sched_end,
                t_end_s: t_last,
                mdot_kgps: 0.0,
                jet_idx: None,
            });
        }
        debug!(
            segments = segments.len(),
            plumes = jets.len(),
            "accumulation schedule prepared"
        );

        // March between output times, holding each segment's plume fixed
        let mut state = [SEED_VOLUME_FRACTION * dyn_ctx.v_encl_m3, 0.0];
        let mut seg_idx = 0usize;
        let mut t_cursor = 0.0;
        let mut recorded: Vec<(f64, f64, f64, Option<usize>)> =
            Vec::with_capacity(times_s.len());
        for &t_target in times_s {
            while t_cursor < t_target {
                while seg_idx + 1 < segments.len() && t_cursor >= segments[seg_idx].t_end_s {
                    seg_idx += 1;
                }
                let seg = &segments[seg_idx];
                let t_stop = t_target.min(seg.t_end_s);
                dyn_ctx.integrate(&mut state, t_cursor, t_stop, seg, &jets, cfg)?;
                t_cursor = t_stop;
            }
            recorded.push((t_target, state[0], state[1], segments[seg_idx].jet_idx));
        }

        // Derive the flammable-inventory and overpressure series
        let n = recorded.len();
        let mut t_s = Vec::with_capacity(n);
        let mut layer_volume_m3 = Vec::with_capacity(n);
        let mut layer_mole_frac = Vec::with_capacity(n);
        let mut layer_depth_m = Vec::with_capacity(n);
        let mut jet_flammable_kg = Vec::with_capacity(n);
        let mut layer_flammable_kg = Vec::with_capacity(n);
        let mut dp_jet_pa = Vec::with_capacity(n);
        let mut dp_combined_pa = Vec::with_capacity(n);
        for (t, v_l, x_l, jet_idx) in recorded {
            let depth = v_l / encl.floor_area_m2;
            let y_b = encl.height_m - depth;
            let jet_flam = match (jet_idx, lfl_mole) {
                (Some(i), Some(lfl)) => jets[i].m_flammable(y_b, lfl)?,
                _ => 0.0,
            };
            let layer_flam = match lfl_mole {
                Some(lfl) if x_l >= lfl => v_l * x_l * rho_fuel_amb,
                _ => 0.0,
            };
            let dp_jet =
                dp_expansion(dyn_ctx.v_encl_m3, jet_flam, &blend, dyn_ctx.t_amb_k, dyn_ctx.p_amb_pa)?;
            let dp_combined = dp_expansion(
                dyn_ctx.v_encl_m3,
                jet_flam + layer_flam,
                &blend,
                dyn_ctx.t_amb_k,
                dyn_ctx.p_amb_pa,
            )?;
            t_s.push(t);
            layer_volume_m3.push(v_l);
            layer_mole_frac.push(x_l);
            layer_depth_m.push(depth);
            jet_flammable_kg.push(jet_flam);
            layer_flammable_kg.push(layer_flam);
            dp_jet_pa.push(dp_jet);
            dp_combined_pa.push(dp_combined);
        }

        let pressure_interp = Interp1::try_new(t_s.clone(), dp_combined_pa.clone())?;
        let depth_interp = Interp1::try_new(t_s.clone(), layer_depth_m.clone())?;
        let conc_interp = Interp1::try_new(t_s.clone(), layer_mole_frac.clone())?;
        debug!(
            points = t_s.len(),
            max_conc = layer_mole_frac.iter().cloned().fold(0.0, f64::max),
            "accumulation series built"
        );

        Ok(Self {
            t_s,
            layer_volume_m3,
            layer_mole_frac,
            layer_depth_m,
            jet_flammable_kg,
            layer_flammable_kg,
            dp_jet_pa,
            dp_combined_pa,
            n_plumes: jets.len(),
            pressure_interp,
            depth_interp,
            conc_interp,
        })
    }

    /// Combined (jet + layer) expansion overpressure [Pa] at `t_s`.
    pub fn pressure(&self, t_s: f64) -> f64 {
        self.pressure_interp.eval(t_s)
    }

    /// Layer thickness below the ceiling [m] at `t_s`.
    pub fn layer_depth(&self, t_s: f64) -> f64 {
        self.depth_interp.eval(t_s)
    }

    /// Layer fuel mole fraction at `t_s`.
    pub fn concentration(&self, t_s: f64) -> f64 {
        self.conc_interp.eval(t_s)
    }

    /// Peak combined overpressure and the time it occurs, `(p_pa, t_s)`.
    pub fn max_p_t(&self) -> (f64, f64) {
        let (t, p) = self.pressure_interp.argmax();
        (p, t)
    }

    /// Output time grid [s].
    pub fn times(&self) -> &[f64] {
        &self.t_s
    }

    /// Layer volume series [m³].
    pub fn layer_volume_m3(&self) -> &[f64] {
        &self.layer_volume_m3
    }

    /// Layer fuel mole-fraction series.
    pub fn layer_mole_frac(&self) -> &[f64] {
        &self.layer_mole_frac
    }

    /// Layer depth series [m].
    pub fn layer_depth_m(&self) -> &[f64] {
        &self.layer_depth_m
    }

    /// Flammable mass carried by the jet below the layer bottom [kg].
    pub fn jet_flammable_kg(&self) -> &[f64] {
        &self.jet_flammable_kg
    }

    /// Flammable mass held in the layer [kg]; zero while the layer is
    /// leaner than the flammability limit.
    pub fn layer_flammable_kg(&self) -> &[f64] {
        &self.layer_flammable_kg
    }

    /// Jet-only expansion overpressure series [Pa].
    pub fn dp_jet_pa(&self) -> &[f64] {
        &self.dp_jet_pa
    }

    /// Combined expansion overpressure series [Pa].
    pub fn dp_combined_pa(&self) -> &[f64] {
        &self.dp_combined_pa
    }

    /// Distinct plumes built for the run (consecutive identical flows
    /// share one).
    pub fn n_plumes(&self) -> usize {
        self.n_plumes
    }
}

fn validate_times(times_s: &[f64]) -> IndoorResult<()> {
    let ok = times_s.len() >= 2
        && times_s[0] >= 0.0
        && times_s.iter().all(|t| t.is_finite())
        && times_s.windows(2).all(|w| w[1] > w[0]);
    if !ok {
        return Err(IndoorError::NonPhysical {
            what: "output time grid",
        });
    }
    Ok(())
}

/// Resolve the segment list and its plume pool from the schedule.
fn build_segments(
    scenario: &Scenario<'_>,
    cfg: &AccumulationConfig,
) -> IndoorResult<(Vec<Jet>, Vec<Segment>)> {
    let mut jets = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();
    match &scenario.schedule {
        FlowSchedule::Steady {
            duration_s,
            mdot_override_kgps,
        } => {
            if !duration_s.is_finite() || *duration_s <= 0.0 {
                return Err(IndoorError::NonPhysical {
                    what: "steady release duration",
                });
            }
            let eff = effective_source(scenario, scenario.tank, *mdot_override_kgps)?;
            let mdot_kgps = eff.mdot_kgps;
            jets.push(build_plume(&eff, scenario, cfg)?);
            segments.push(Segment {
                t_start_s: 0.0,
                t_end_s: *duration_s,
                mdot_kgps,
                jet_idx: Some(0),
            });
        }
        FlowSchedule::Blowdown(history) => {
            if history.len() < 2
                || history.t_s.windows(2).any(|w| w[1] <= w[0])
                || history.t_s[0] != 0.0
            {
                return Err(IndoorError::NonPhysical {
                    what: "blowdown history",
                });
            }
            for i in 0..history.len() - 1 {
                let mdot = history.mdot_kgps[i];
                // Consecutive identical flows reuse the previous plume
                if let Some(prev) = segments.last_mut() {
                    if prev.mdot_kgps == mdot {
                        prev.t_end_s = history.t_s[i + 1];
                        continue;
                    }
                }
                if mdot <= 0.0 {
                    segments.push(Segment {
                        t_start_s: history.t_s[i],
                        t_end_s: history.t_s[i + 1],
                        mdot_kgps: 0.0,
                        jet_idx: None,
                    });
                    continue;
                }
                let eff = effective_source(scenario, &history.states[i], Some(mdot))?;
                jets.push(build_plume(&eff, scenario, cfg)?);
                segments.push(Segment {
                    t_start_s: history.t_s[i],
                    t_end_s: history.t_s[i + 1],
                    mdot_kgps: eff.mdot_kgps,
                    jet_idx: Some(jets.len() - 1),
                });
            }
        }
    }
    Ok((jets, segments))
}

/// Exit conditions for one tank state: notional nozzle when choked,
/// ambient-pressure plug flow otherwise.
fn effective_source(
    scenario: &Scenario<'_>,
    state: &Fluid,
    mdot_known_kgps: Option<f64>,
) -> IndoorResult<EffectiveSource> {
    Ok(EffectiveSource::resolve(
        state,
        scenario.orifice,
        scenario.ambient,
        scenario.nozzle,
        mdot_known_kgps,
    )?)
}

/// Solve and reshape the plume for one flow segment.
fn build_plume(
    eff: &EffectiveSource,
    scenario: &Scenario<'_>,
    cfg: &AccumulationConfig,
) -> IndoorResult<Jet> {
    let encl = scenario.enclosure;
    let exit = ExitPlane::from_effective(
        eff,
        scenario.ambient.clone(),
        cfg.release_angle_rad,
        0.0,
        encl.release_height_m,
    )?;
    let mut jet = Jet::solve(&exit, &cfg.jet)?;
    jet.reshape(encl.wall_distance_m, encl.height_m);
    Ok(jet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosure::Vent;
    use hy_core::units::{m, m2, m3ps};
    use hy_fluids::{Blend, GasModel};
    use hy_release::ReleaseError;

    fn h2_ambient_pressure() -> Fluid {
        Fluid::new(
            Blend::pure(Species::H2),
            GasModel::AbelNoble,
            StateSpec::TP {
                t: k(288.0),
                p: pa(101_325.0 * 1.05),
            },
        )
        .unwrap()
    }

    fn air() -> Fluid {
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

    fn room() -> Enclosure {
        let ceiling = Vent::new(m2(0.05), m(2.5), 0.61, m3ps(0.0)).unwrap();
        let floor = Vent::new(m2(0.05), m(0.2), 0.61, m3ps(0.0)).unwrap();
        Enclosure::new(m(2.72), m2(16.72), m(0.2), ceiling, floor, m(2.0)).unwrap()
    }

    #[test]
    fn time_grid_is_validated() {
        assert!(validate_times(&[0.0, 1.0, 2.0]).is_ok());
        assert!(validate_times(&[0.0]).is_err());
        assert!(validate_times(&[0.0, 2.0, 1.0]).is_err());
        assert!(validate_times(&[-1.0, 1.0]).is_err());
    }

    #[test]
    fn unchoked_steady_release_needs_an_override() {
        let tank = h2_ambient_pressure();
        let orifice = Orifice::new(m(0.005), 1.0).unwrap();
        let ambient = air();
        let encl = room();
        let scenario = Scenario {
            tank: &tank,
            orifice: &orifice,
            ambient: &ambient,
            enclosure: &encl,
            nozzle: NozzleModel::YuceilOtugen,
            layer: LayerModel::Lowesmith,
            schedule: FlowSchedule::Steady {
                duration_s: 10.0,
                mdot_override_kgps: None,
            },
        };
        let err = IndoorRelease::build(&scenario, &[0.0, 10.0], &AccumulationConfig::default());
        assert!(matches!(
            err,
            Err(IndoorError::Release(ReleaseError::UnderspecifiedFlow { .. }))
        ));
    }

    #[test]
    fn steady_release_accumulates_a_layer() {
        let tank = h2_ambient_pressure();
        let orifice = Orifice::new(m(0.005), 1.0).unwrap();
        let ambient = air();
        let encl = room();
        let scenario = Scenario {
            tank: &tank,
            orifice: &orifice,
            ambient: &ambient,
            enclosure: &encl,
            nozzle: NozzleModel::YuceilOtugen,
            layer: LayerModel::Lowesmith,
            schedule: FlowSchedule::Steady {
                duration_s: 60.0,
                mdot_override_kgps: Some(1.0e-4),
            },
        };
        let times: Vec<f64> = (0..=12).map(|i| 5.0 * i as f64).collect();
        let run = IndoorRelease::build(&scenario, &times, &AccumulationConfig::default()).unwrap();

        assert_eq!(run.times().len(), 13);
        assert_eq!(run.n_plumes(), 1);
        // The layer grows monotonically while the release runs
        let depth = run.layer_depth_m();
        assert!(depth[12] > depth[6]);
        assert!(depth[6] > depth[1]);
        assert!(depth[12] < encl.height_m);
        // Concentration rises from zero and stays physical
        let conc = run.layer_mole_frac();
        assert_eq!(conc[0], 0.0);
        assert!(conc[12] > conc[3]);
        assert!(conc[12] < 1.0);
        // The plume carries a flammable core, so the jet term is live
        assert!(run.jet_flammable_kg()[6] > 0.0);
        assert!(run.dp_combined_pa()[6] >= run.dp_jet_pa()[6]);
        assert!(run.dp_jet_pa()[6] > 0.0);
    }

    #[test]
    fn sealed_room_overfills_and_fails_loudly() {
        let tank = h2_ambient_pressure();
        let orifice = Orifice::new(m(0.02), 1.0).unwrap();
        let ambient = air();
        let ceiling = Vent::new(m2(1.0e-6), m(1.8), 0.61, m3ps(0.0)).unwrap();
        let encl = Enclosure::new(
            m(2.0),
            m2(1.0),
            m(0.2),
            ceiling,
            Vent::sealed(),
            m(1.0),
        )
        .unwrap();
        let scenario = Scenario {
            tank: &tank,
            orifice: &orifice,
            ambient: &ambient,
            enclosure: &encl,
            nozzle: NozzleModel::YuceilOtugen,
            layer: LayerModel::Lowesmith,
            schedule: FlowSchedule::Steady {
                duration_s: 600.0,
                mdot_override_kgps: Some(5.0e-4),
            },
        };
        let err = IndoorRelease::build(
            &scenario,
            &[0.0, 300.0, 600.0],
            &AccumulationConfig::default(),
        );
        assert!(matches!(err, Err(IndoorError::BoundsViolation { .. })));
    }

    #[test]
    fn blowdown_schedule_reuses_plumes_and_drains_after() {
        let tank = h2_ambient_pressure();
        let orifice = Orifice::new(m(0.005), 1.0).unwrap();
        let ambient = air();
        let encl = room();
        // Flat flow for 40 s, then a weaker tail for 20 s
        let history = BlowdownHistory {
            t_s: vec![0.0, 20.0, 40.0, 60.0],
            mdot_kgps: vec![1.0e-4, 1.0e-4, 4.0e-5, 4.0e-5],
            states: vec![tank.clone(), tank.clone(), tank.clone(), tank.clone()],
        };
        let scenario = Scenario {
            tank: &tank,
            orifice: &orifice,
            ambient: &ambient,
            enclosure: &encl,
            nozzle: NozzleModel::YuceilOtugen,
            layer: LayerModel::Lowesmith,
            schedule: FlowSchedule::Blowdown(&history),
        };
        let times: Vec<f64> = (0..=16).map(|i| 5.0 * i as f64).collect();
        let run = IndoorRelease::build(&scenario, &times, &AccumulationConfig::default()).unwrap();

        // Two distinct flow values, two plumes; the repeated samples and
        // the post-release tail do not add more
        assert_eq!(run.n_plumes(), 2);
        // After the release ends at 60 s the layer drains through the vent
        let depth_60 = run.layer_depth(60.0);
        let depth_80 = run.layer_depth(80.0);
        assert!(depth_80 <= depth_60);
        // Concentration holds once the source stops
        let c60 = run.concentration(60.0);
        let c80 = run.concentration(80.0);
        assert!((c80 - c60).abs() < 1e-6 || c80 <= c60);
    }

    #[test]
    fn queries_interpolate_the_series() {
        let tank = h2_ambient_pressure();
        let orifice = Orifice::new(m(0.005), 1.0).unwrap();
        let ambient = air();
        let encl = room();
        let scenario = Scenario {
            tank: &tank,
            orifice: &orifice,
            ambient: &ambient,
            enclosure: &encl,
            nozzle: NozzleModel::YuceilOtugen,
            layer: LayerModel::MixingBox,
            schedule: FlowSchedule::Steady {
                duration_s: 30.0,
                mdot_override_kgps: Some(1.0e-4),
            },
        };
        let run = IndoorRelease::build(
            &scenario,
            &[0.0, 10.0, 20.0, 30.0],
            &AccumulationConfig::default(),
        )
        .unwrap();

        // Midpoint query sits between its bracketing samples
        let c15 = run.concentration(15.0);
        let c10 = run.concentration(10.0);
        let c20 = run.concentration(20.0);
        assert!(c15 >= c10.min(c20) && c15 <= c10.max(c20));
        // Clamped beyond the grid
        assert_eq!(run.pressure(1.0e6), run.dp_combined_pa()[3]);
        let (p_max, t_at) = run.max_p_t();
        assert!(p_max >= run.dp_combined_pa()[0]);
        assert!(t_at <= 30.0);
    }
}
