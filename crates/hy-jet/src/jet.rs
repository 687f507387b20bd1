//! Gaussian-profile integral march along the jet centerline.
//!
//! Seven channels march against arc length S: centerline velocity V,
//! half-width B, centerline density, centerline mass fraction, trajectory
//! angle, and the (x, y) position. Mass, momentum (both components), and
//! species conservation plus one closure row form a 5x5 linear system for
//! the primitive derivatives at every step; position follows from the angle.

use crate::error::{JetError, JetResult};
use crate::source::{establish, ExitPlane};
use hy_core::units::constants::{G0_MPS2, R_UNIVERSAL};
use hy_fluids::{Blend, Fluid, Species};
use hy_solver::{rk45_adaptive, trapz_uniform, OdeOptions, SolverError, StepOutcome};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use tracing::debug;

/// Ricou-Spalding momentum-entrainment constant.
const ENTRAINMENT_MOMENTUM_COEFF: f64 = 0.282;

/// Froude number above which the buoyant-entrainment coefficient plateaus.
const FROUDE_PLATEAU: f64 = 268.0;

/// Radial quadrature resolution for the enthalpy-flux integral.
const QUAD_POINTS: usize = 121;

/// Quadrature extent in concentration half-widths.
const QUAD_WIDTHS: f64 = 5.0;

/// Model constants and march controls.
#[derive(Debug, Clone)]
pub struct JetConfig {
    /// Ratio of the concentration-profile width to the velocity-profile
    /// width.
    pub lambda: f64,
    /// Total-entrainment coefficient ceiling. Once the inferred coefficient
    /// exceeds this, entrainment stays clamped here for the rest of the
    /// march.
    pub alpha_cap: f64,
    /// Centerline mass fraction at which the march stops.
    pub y_min: f64,
    /// Hard cap on arc length [m].
    pub s_max_m: f64,
    /// Accepted-step budget for the march.
    pub max_steps: usize,
    /// Relative tolerance of the adaptive integrator.
    pub rtol: f64,
    /// Absolute tolerance of the adaptive integrator.
    pub atol: f64,
    /// Conserve the radial enthalpy flux (trapezoid quadrature per step)
    /// instead of assuming an ambient-temperature mixture.
    pub conserve_energy: bool,
}

impl Default for JetConfig {
    fn default() -> Self {
        Self {
            lambda: 1.16,
            alpha_cap: 0.082,
            y_min: 7.0e-4,
            s_max_m: 500.0,
            max_steps: 5_000,
            rtol: 1e-6,
            atol: 1e-9,
            conserve_energy: true,
        }
    }
}

/// Buoyant-entrainment coefficient versus exit Froude number.
fn buoyant_entrainment_coeff(froude: f64) -> f64 {
    if !froude.is_finite() || froude >= FROUDE_PLATEAU {
        0.97
    } else {
        17.313 - 0.116_665 * froude + 2.0771e-4 * froude * froude
    }
}

/// Precomputed ambient/fuel constants for the energy-conserving closure.
struct EnergyTerms {
    lam: f64,
    rho_amb: f64,
    p_amb: f64,
    t_amb: f64,
    mw_fuel: f64,
    mw_air: f64,
    cp_fuel: f64,
    cp_air: f64,
}

impl EnergyTerms {
    /// Enthalpy flux through the cross-section by trapezoid quadrature over
    /// the radial profile. For an ideal-gas mixture `rho·h = cp·P·MW/R`, so
    /// the integrand needs no explicit temperature.
    fn flux(&self, v: f64, b: f64, rho_cl: f64, y_cl: f64) -> f64 {
        let lb2 = self.lam * self.lam * b * b;
        let r_max = QUAD_WIDTHS * b * self.lam.max(1.0);
        let dr = r_max / (QUAD_POINTS - 1) as f64;
        let mut integrand = [0.0; QUAD_POINTS];
        for (i, slot) in integrand.iter_mut().enumerate() {
            let r = i as f64 * dr;
            let e_v = (-(r * r) / (b * b)).exp();
            let e_c = (-(r * r) / lb2).exp();
            let rho = self.rho_amb + (rho_cl - self.rho_amb) * e_c;
            let y = rho_cl * y_cl * e_c / rho;
            let mw = 1.0 / (y / self.mw_fuel + (1.0 - y) / self.mw_air);
            let cp = y * self.cp_fuel + (1.0 - y) * self.cp_air;
            *slot = v * e_v * cp * (self.p_amb * mw / R_UNIVERSAL) * 2.0 * PI * r;
        }
        trapz_uniform(&integrand, dr)
    }

    /// Closure row: central-difference partials of the enthalpy flux with
    /// respect to (V, B, rho_cl, Y_cl), and the entrained-enthalpy source.
    fn closure_row(&self, e: f64, v: f64, b: f64, rho_cl: f64, y_cl: f64) -> ([f64; 4], f64) {
        let eps = |x: f64| 1.0e-6 * x.abs().max(1.0e-6);
        let (ev, eb, er, ey) = (eps(v), eps(b), eps(rho_cl), eps(y_cl));
        let dh_dv = (self.flux(v + ev, b, rho_cl, y_cl) - self.flux(v - ev, b, rho_cl, y_cl))
            / (2.0 * ev);
        let dh_db = (self.flux(v, b + eb, rho_cl, y_cl) - self.flux(v, b - eb, rho_cl, y_cl))
            / (2.0 * eb);
        let dh_drho = (self.flux(v, b, rho_cl + er, y_cl) - self.flux(v, b, rho_cl - er, y_cl))
            / (2.0 * er);
        let dh_dy = (self.flux(v, b, rho_cl, y_cl + ey) - self.flux(v, b, rho_cl, y_cl - ey))
            / (2.0 * ey);
        let source = e * self.rho_amb * self.cp_air * self.t_amb;
        ([dh_dv, dh_db, dh_drho, dh_dy], source)
    }
}

/// A solved jet/plume trajectory.
#[derive(Debug, Clone)]
pub struct Jet {
    pub(crate) s_m: Vec<f64>,
    pub(crate) v_mps: Vec<f64>,
    pub(crate) b_m: Vec<f64>,
    pub(crate) rho_cl_kg_m3: Vec<f64>,
    pub(crate) y_cl: Vec<f64>,
    pub(crate) theta_rad: Vec<f64>,
    pub(crate) x_m: Vec<f64>,
    pub(crate) y_m: Vec<f64>,
    pub(crate) lambda: f64,
    pub(crate) ambient: Fluid,
    pub(crate) blend: Blend,
    entrainment_capped: bool,
    bent_at_wall: bool,
    cropped_at_ceiling: bool,
}

impl Jet {
    /// Establish and march a jet from plug-flow exit conditions.
    pub fn solve(exit: &ExitPlane, cfg: &JetConfig) -> JetResult<Self> {
        if !(cfg.lambda > 0.0) || !(cfg.alpha_cap > 0.0) {
            return Err(JetError::NonPhysical {
                what: "jet model constants",
            });
        }
        if !(cfg.y_min > 0.0 && cfg.y_min < 1.0) {
            return Err(JetError::NonPhysical {
                what: "terminal mass fraction",
            });
        }

        let ambient = exit.ambient.clone();
        let rho_amb = ambient.rho();
        let t_amb = ambient.t_k();
        let p_amb = ambient.p_pa();
        let blend = exit.gas.blend().clone();
        // kg/mol, so P·MW/(R·T) pairs with the molar gas constant
        let mw_fuel = blend.molar_mass() * 1.0e-3;
        let mw_air = Species::Air.molar_mass() * 1.0e-3;

        if ((exit.gas.p_pa() - p_amb) / p_amb).abs() > 0.01 {
            debug!(
                p_exit = exit.gas.p_pa(),
                p_amb, "jet exit plane is not pressure-matched to the ambient"
            );
        }

        let node = establish(exit, cfg.lambda);
        if node.s_m >= cfg.s_max_m {
            return Err(JetError::NonPhysical {
                what: "arc-length cap shorter than the establishment zone",
            });
        }

        let energy = EnergyTerms {
            lam: cfg.lambda,
            rho_amb,
            p_amb,
            t_amb,
            mw_fuel,
            mw_air,
            cp_fuel: blend.cp(),
            cp_air: Species::Air.cp(),
        };

        let froude = exit.froude();
        let e_mom = ENTRAINMENT_MOMENTUM_COEFF * (exit.momentum_flux() / rho_amb).sqrt();
        let alpha_buoy = buoyant_entrainment_coeff(froude);
        debug!(froude, e_mom, alpha_buoy, "jet entrainment constants");

        let lam = cfg.lambda;
        let k1 = lam * lam / (1.0 + lam * lam);
        let k2 = lam * lam / (1.0 + 2.0 * lam * lam);
        let alpha_cap = cfg.alpha_cap;
        let conserve_energy = cfg.conserve_energy;
        let y_min = cfg.y_min;

        let mut capped = false;
        let rhs = |_s: f64, state: &[f64], out: &mut [f64]| -> Result<(), SolverError> {
            let (v, b, rho_cl, y_cl, theta) = (state[0], state[1], state[2], state[3], state[4]);
            if !(v > 0.0) || !(b > 0.0) || !(rho_cl > 0.0) {
                return Err(SolverError::Numeric {
                    what: format!(
                        "jet state left the physical domain: V={v:.3e}, B={b:.3e}, rho={rho_cl:.3e}"
                    ),
                });
            }
            let (sin_t, cos_t) = theta.sin_cos();

            let mut e = e_mom
                + if froude.is_finite() {
                    alpha_buoy / froude * (2.0 * PI * v * b) * sin_t
                } else {
                    0.0
                };
            let alpha = e / (2.0 * PI * b * v);
            if capped || alpha > alpha_cap {
                capped = true;
                e = alpha_cap * 2.0 * PI * b * v;
            }

            let rho_bar1 = rho_amb * (1.0 - k1) + rho_cl * k1;
            let rho_bar2 = rho_amb * (0.5 - k2) + rho_cl * k2;

            // Mass flux pi B^2 V rho_bar1
            let dm_dv = PI * b * b * rho_bar1;
            let dm_db = 2.0 * PI * b * v * rho_bar1;
            let dm_drho = PI * b * b * v * k1;

            // Momentum flux pi B^2 V^2 rho_bar2
            let f_mom = PI * b * b * v * v * rho_bar2;
            let df_dv = 2.0 * PI * b * b * v * rho_bar2;
            let df_db = 2.0 * PI * b * v * v * rho_bar2;
            let df_drho = PI * b * b * v * v * k2;

            // Species flux pi B^2 V rho_cl Y_cl k1
            let fy = PI * b * b * v * k1;
            let dy_dv = PI * b * b * rho_cl * y_cl * k1;
            let dy_db = 2.0 * PI * b * v * rho_cl * y_cl * k1;
            let dy_drho = fy * y_cl;
            let dy_dy = fy * rho_cl;

            let ([c_v, c_b, c_rho, c_y], closure_rhs) = if conserve_energy {
                energy.closure_row(e, v, b, rho_cl, y_cl)
            } else {
                // Ambient-temperature mixture: rho(Y) = P MW(Y)/(R T_amb)
                let mw = 1.0 / (y_cl / mw_fuel + (1.0 - y_cl) / mw_air);
                let drho_dy =
                    -(p_amb / (R_UNIVERSAL * t_amb)) * mw * mw * (1.0 / mw_fuel - 1.0 / mw_air);
                ([0.0, 0.0, 1.0, -drho_dy], 0.0)
            };

            #[rustfmt::skip]
            let a = DMatrix::from_row_slice(5, 5, &[
                dm_dv,          dm_db,          dm_drho,          0.0,   0.0,
                df_dv * cos_t,  df_db * cos_t,  df_drho * cos_t,  0.0,   -f_mom * sin_t,
                df_dv * sin_t,  df_db * sin_t,  df_drho * sin_t,  0.0,   f_mom * cos_t,
                dy_dv,          dy_db,          dy_drho,          dy_dy, 0.0,
                c_v,            c_b,            c_rho,            c_y,   0.0,
            ]);
            let rhs_vec = DVector::from_row_slice(&[
                rho_amb * e,
                0.0,
                G0_MPS2 * (rho_amb - rho_cl) * PI * lam * lam * b * b,
                0.0,
                closure_rhs,
            ]);
            let derivs = a.lu().solve(&rhs_vec).ok_or_else(|| SolverError::Numeric {
                what: "singular flux Jacobian in the jet march".into(),
            })?;

            out[..5].copy_from_slice(derivs.as_slice());
            out[5] = cos_t;
            out[6] = sin_t;
            Ok(())
        };

        let observer = |_s: f64, state: &[f64]| {
            if state[3] < y_min {
                StepOutcome::Stop
            } else {
                StepOutcome::Continue
            }
        };

        let x0 = [
            node.v_mps,
            node.b_m,
            node.rho_kg_m3,
            node.y_mass,
            node.theta_rad,
            node.x_m,
            node.y_m,
        ];
        let opts = OdeOptions {
            rtol: cfg.rtol,
            atol: cfg.atol,
            h_init: Some(node.b_m),
            max_steps: cfg.max_steps,
            ..OdeOptions::default()
        };
        let sol = rk45_adaptive(rhs, node.s_m, cfg.s_max_m, &x0, &opts, observer)?;
        debug!(nodes = sol.t.len(), status = ?sol.status, capped, "jet march finished");

        let n = sol.t.len();
        let mut jet = Jet {
            s_m: sol.t,
            v_mps: Vec::with_capacity(n),
            b_m: Vec::with_capacity(n),
            rho_cl_kg_m3: Vec::with_capacity(n),
            y_cl: Vec::with_capacity(n),
            theta_rad: Vec::with_capacity(n),
            x_m: Vec::with_capacity(n),
            y_m: Vec::with_capacity(n),
            lambda: lam,
            ambient,
            blend,
            entrainment_capped: capped,
            bent_at_wall: false,
            cropped_at_ceiling: false,
        };
        for state in &sol.x {
            jet.v_mps.push(state[0]);
            jet.b_m.push(state[1]);
            jet.rho_cl_kg_m3.push(state[2]);
            jet.y_cl.push(state[3]);
            jet.theta_rad.push(state[4]);
            jet.x_m.push(state[5]);
            jet.y_m.push(state[6]);
        }
        Ok(jet)
    }

    /// Number of stored centerline nodes.
    pub fn len(&self) -> usize {
        self.s_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s_m.is_empty()
    }

    /// Arc length along the centerline [m].
    pub fn s(&self) -> &[f64] {
        &self.s_m
    }

    /// Centerline velocity [m/s].
    pub fn centerline_velocity(&self) -> &[f64] {
        &self.v_mps
    }

    /// Velocity-profile half-width [m].
    pub fn half_width(&self) -> &[f64] {
        &self.b_m
    }

    /// Centerline density [kg/m³].
    pub fn centerline_density(&self) -> &[f64] {
        &self.rho_cl_kg_m3
    }

    /// Centerline mass fraction of released gas.
    pub fn centerline_mass_fraction(&self) -> &[f64] {
        &self.y_cl
    }

    /// Trajectory angle from horizontal [rad].
    pub fn trajectory_angle(&self) -> &[f64] {
        &self.theta_rad
    }

    /// Horizontal trajectory coordinate [m].
    pub fn x(&self) -> &[f64] {
        &self.x_m
    }

    /// Vertical trajectory coordinate [m].
    pub fn y(&self) -> &[f64] {
        &self.y_m
    }

    /// Spreading ratio the jet was solved with.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Ambient the jet entrains.
    pub fn ambient(&self) -> &Fluid {
        &self.ambient
    }

    /// Released gas blend.
    pub fn blend(&self) -> &Blend {
        &self.blend
    }

    /// Whether the entrainment hysteresis clamp engaged during the march.
    pub fn entrainment_capped(&self) -> bool {
        self.entrainment_capped
    }

    /// Bend the trajectory vertical at a wall plane, then crop it at a
    /// ceiling plane.
    ///
    /// The one mutating post-process on a solved jet. Each boundary applies
    /// at most once: repeated calls leave the trajectory unchanged.
    pub fn reshape(&mut self, x_wall_m: f64, y_ceiling_m: f64) {
        if !self.bent_at_wall {
            self.bend_at_wall(x_wall_m);
        }
        if !self.cropped_at_ceiling {
            self.crop_at_ceiling(y_ceiling_m);
        }
    }

    pub fn bent_at_wall(&self) -> bool {
        self.bent_at_wall
    }

    pub fn cropped_at_ceiling(&self) -> bool {
        self.cropped_at_ceiling
    }

    fn bend_at_wall(&mut self, x_wall_m: f64) {
        let Some(i) = self.x_m.iter().position(|&x| x > x_wall_m) else {
            return;
        };
        let cross = if i == 0 {
            // Released at or beyond the wall plane: the whole trajectory
            // runs up the wall.
            0
        } else {
            let frac = (x_wall_m - self.x_m[i - 1]) / (self.x_m[i] - self.x_m[i - 1]);
            let node = self.lerp_node(i - 1, i, frac);
            self.insert_node(i, node);
            i
        };
        let s_cross = self.s_m[cross];
        let y_cross = self.y_m[cross];
        for j in cross..self.len() {
            self.x_m[j] = x_wall_m;
            self.theta_rad[j] = PI / 2.0;
            self.y_m[j] = y_cross + (self.s_m[j] - s_cross);
        }
        self.bent_at_wall = true;
    }

    fn crop_at_ceiling(&mut self, y_ceiling_m: f64) {
        let Some(i) = self.y_m.iter().position(|&y| y > y_ceiling_m) else {
            return;
        };
        if i == 0 {
            self.truncate_nodes(1);
        } else {
            let frac = (y_ceiling_m - self.y_m[i - 1]) / (self.y_m[i] - self.y_m[i - 1]);
            let mut node = self.lerp_node(i - 1, i, frac);
            node[7] = y_ceiling_m;
            self.truncate_nodes(i);
            self.push_node(node);
        }
        self.cropped_at_ceiling = true;
    }

    /// Linear interpolation of every channel between two nodes.
    fn lerp_node(&self, i0: usize, i1: usize, frac: f64) -> [f64; 8] {
        let l = |a: &[f64]| a[i0] + (a[i1] - a[i0]) * frac;
        [
            l(&self.s_m),
            l(&self.v_mps),
            l(&self.b_m),
            l(&self.rho_cl_kg_m3),
            l(&self.y_cl),
            l(&self.theta_rad),
            l(&self.x_m),
            l(&self.y_m),
        ]
    }

    fn insert_node(&mut self, i: usize, node: [f64; 8]) {
        self.s_m.insert(i, node[0]);
        self.v_mps.insert(i, node[1]);
        self.b_m.insert(i, node[2]);
        self.rho_cl_kg_m3.insert(i, node[3]);
        self.y_cl.insert(i, node[4]);
        self.theta_rad.insert(i, node[5]);
        self.x_m.insert(i, node[6]);
        self.y_m.insert(i, node[7]);
    }

    fn push_node(&mut self, node: [f64; 8]) {
        self.s_m.push(node[0]);
        self.v_mps.push(node[1]);
        self.b_m.push(node[2]);
        self.rho_cl_kg_m3.push(node[3]);
        self.y_cl.push(node[4]);
        self.theta_rad.push(node[5]);
        self.x_m.push(node[6]);
        self.y_m.push(node[7]);
    }

    fn truncate_nodes(&mut self, len: usize) {
        self.s_m.truncate(len);
        self.v_mps.truncate(len);
        self.b_m.truncate(len);
        self.rho_cl_kg_m3.truncate(len);
        self.y_cl.truncate(len);
        self.theta_rad.truncate(len);
        self.x_m.truncate(len);
        self.y_m.truncate(len);
    }

    /// Mass flux through the cross-section at a stored node [kg/s].
    pub fn mass_flux_at(&self, idx: usize) -> f64 {
        let k1 = self.lambda * self.lambda / (1.0 + self.lambda * self.lambda);
        let rho_amb = self.ambient.rho();
        let rho_bar = rho_amb * (1.0 - k1) + self.rho_cl_kg_m3[idx] * k1;
        PI * self.b_m[idx] * self.b_m[idx] * self.v_mps[idx] * rho_bar
    }

    /// Momentum flux through the cross-section at a stored node [kg·m/s²].
    pub fn momentum_flux_at(&self, idx: usize) -> f64 {
        let lam2 = self.lambda * self.lambda;
        let k2 = lam2 / (1.0 + 2.0 * lam2);
        let rho_amb = self.ambient.rho();
        let rho_bar = rho_amb * (0.5 - k2) + self.rho_cl_kg_m3[idx] * k2;
        PI * self.b_m[idx] * self.b_m[idx] * self.v_mps[idx] * self.v_mps[idx] * rho_bar
    }
}
