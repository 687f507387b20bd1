//! Read-only queries over a solved jet.
//!
//! Everything here derives Gaussian radial profiles from the stored
//! centerline arrays at query time; nothing mutates the jet.

use crate::error::{JetError, JetResult};
use crate::jet::Jet;
use hy_solver::{brent, erf, trapz, RootConfig};
use std::f64::consts::PI;

/// Search extent for the flammable-radius root, in concentration
/// half-widths. The profile is below any practical lean limit well inside
/// this.
const RADIUS_WIDTHS: f64 = 6.0;

impl Jet {
    /// Flammable mass [kg] below a horizontal plane.
    ///
    /// Trims the trajectory at the plane by linear interpolation, drops
    /// nodes leaner than the limit, root-finds the radius where the local
    /// mole fraction equals the limit at each remaining node, and sums
    /// cylindrical shells with error-function radial means. Side-effect-free.
    pub fn m_flammable(&self, below_y_m: f64, lfl_mole_frac: f64) -> JetResult<f64> {
        if !(lfl_mole_frac > 0.0 && lfl_mole_frac < 1.0) {
            return Err(JetError::Query {
                what: format!("lean limit {lfl_mole_frac} outside (0, 1)"),
            });
        }
        let y_lfl = self.blend.mass_from_mole_in_air(lfl_mole_frac);
        let rho_amb = self.ambient.rho();

        let mut s = self.s_m.clone();
        let mut b = self.b_m.clone();
        let mut rho = self.rho_cl_kg_m3.clone();
        let mut y_cl = self.y_cl.clone();

        // Trim at the height plane
        if let Some(i) = self.y_m.iter().position(|&y| y > below_y_m) {
            if i == 0 {
                return Ok(0.0);
            }
            let frac = (below_y_m - self.y_m[i - 1]) / (self.y_m[i] - self.y_m[i - 1]);
            let lerp = |a: &mut Vec<f64>| {
                let v = a[i - 1] + (a[i] - a[i - 1]) * frac;
                a.truncate(i);
                a.push(v);
            };
            lerp(&mut s);
            lerp(&mut b);
            lerp(&mut rho);
            lerp(&mut y_cl);
        }

        // Drop the part of the trajectory leaner than the limit
        let Some(last) = y_cl.iter().rposition(|&yc| yc >= y_lfl) else {
            return Ok(0.0);
        };
        s.truncate(last + 1);
        b.truncate(last + 1);
        rho.truncate(last + 1);
        y_cl.truncate(last + 1);
        if s.len() < 2 {
            return Ok(0.0);
        }

        let mut mass_per_len = Vec::with_capacity(s.len());
        for i in 0..s.len() {
            mass_per_len.push(self.flammable_shell(b[i], rho[i], y_cl[i], y_lfl, rho_amb)?);
        }
        Ok(trapz(&s, &mass_per_len)?)
    }

    /// Flammable mass per unit centerline length at one node [kg/m].
    fn flammable_shell(
        &self,
        b: f64,
        rho_cl: f64,
        y_cl: f64,
        y_lfl: f64,
        rho_amb: f64,
    ) -> JetResult<f64> {
        if y_cl <= y_lfl * (1.0 + 1e-12) {
            return Ok(0.0);
        }
        let lb = self.lambda * b;
        let local_y = |r: f64| {
            let e_c = (-(r * r) / (lb * lb)).exp();
            rho_cl * y_cl * e_c / (rho_amb + (rho_cl - rho_amb) * e_c)
        };
        let radius = brent(
            |r| Ok(local_y(r) - y_lfl),
            0.0,
            RADIUS_WIDTHS * lb,
            &RootConfig::default(),
        )?;
        if radius <= 0.0 {
            return Ok(0.0);
        }
        // Radial mean of a Gaussian amplitude over [0, R]
        let mean_factor = PI.sqrt() / 2.0 * (lb / radius) * erf(radius / lb);
        Ok(rho_cl * y_cl * mean_factor * PI * radius * radius)
    }

    /// Centerline arc length at which the mole fraction first decays to
    /// `x_mole`, or `None` when the stored trajectory never reaches it.
    pub fn distance_to_mole_fraction(&self, x_mole: f64) -> Option<f64> {
        let mut prev: Option<(f64, f64)> = None;
        for i in 0..self.len() {
            let xm = self.blend.mole_from_mass_in_air(self.y_cl[i]);
            match prev {
                Some((s_prev, x_prev)) if x_prev >= x_mole && xm < x_mole => {
                    let frac = (x_prev - x_mole) / (x_prev - xm);
                    return Some(s_prev + frac * (self.s_m[i] - s_prev));
                }
                None if xm < x_mole => return None,
                _ => {}
            }
            prev = Some((self.s_m[i], xm));
        }
        None
    }

    /// Mole fraction of released gas at a point, from the Gaussian profile
    /// around the nearest centerline node.
    pub fn mole_fraction_at(&self, x: f64, y: f64) -> f64 {
        let mut best = (f64::INFINITY, 0usize);
        for i in 0..self.len() {
            let dx = x - self.x_m[i];
            let dy = y - self.y_m[i];
            let d2 = dx * dx + dy * dy;
            if d2 < best.0 {
                best = (d2, i);
            }
        }
        let (r2, i) = best;
        let lb2 = self.lambda * self.lambda * self.b_m[i] * self.b_m[i];
        let e_c = (-r2 / lb2).exp();
        let rho = self.ambient.rho() + (self.rho_cl_kg_m3[i] - self.ambient.rho()) * e_c;
        let y_local = self.rho_cl_kg_m3[i] * self.y_cl[i] * e_c / rho;
        self.blend.mole_from_mass_in_air(y_local)
    }

    /// Mole-fraction field sampled on a rectilinear grid; `z[i][j]`
    /// corresponds to `(xs[i], ys[j])`.
    pub fn mole_fraction_grid(&self, xs: &[f64], ys: &[f64]) -> Vec<Vec<f64>> {
        xs.iter()
            .map(|&x| ys.iter().map(|&y| self.mole_fraction_at(x, y)).collect())
            .collect()
    }

    /// Centerline velocity and half-width where the trajectory first crosses
    /// a horizontal plane, or `None` when it never does.
    pub fn velocity_halfwidth_at_height(&self, height_m: f64) -> Option<(f64, f64)> {
        for i in 1..self.len() {
            let (y0, y1) = (self.y_m[i - 1], self.y_m[i]);
            let crosses = (y0 <= height_m && height_m <= y1) || (y1 <= height_m && height_m <= y0);
            if crosses {
                if (y1 - y0).abs() < f64::EPSILON {
                    return Some((self.v_mps[i], self.b_m[i]));
                }
                let frac = (height_m - y0) / (y1 - y0);
                let v = self.v_mps[i - 1] + (self.v_mps[i] - self.v_mps[i - 1]) * frac;
                let b = self.b_m[i - 1] + (self.b_m[i] - self.b_m[i - 1]) * frac;
                return Some((v, b));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::jet::{Jet, JetConfig};
    use crate::source::ExitPlane;
    use hy_core::units::{k, pa};
    use hy_fluids::{Blend, Fluid, GasModel, Species, StateSpec};
    use std::f64::consts::PI;

    fn vertical_h2_jet() -> Jet {
        let gas = Fluid::new(
            Blend::pure(Species::H2),
            GasModel::IdealGas,
            StateSpec::TP {
                t: k(288.0),
                p: pa(101_325.0),
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
        let exit = ExitPlane::new(0.01, 150.0, gas, ambient, PI / 2.0, 0.0, 0.0).unwrap();
        let cfg = JetConfig {
            conserve_energy: false,
            y_min: 1e-3,
            s_max_m: 100.0,
            ..JetConfig::default()
        };
        Jet::solve(&exit, &cfg).unwrap()
    }

    #[test]
    fn flammable_mass_decreases_with_richer_limit() {
        let jet = vertical_h2_jet();
        let m_lean = jet.m_flammable(f64::INFINITY, 0.04).unwrap();
        let m_rich = jet.m_flammable(f64::INFINITY, 0.08).unwrap();
        assert!(m_lean > m_rich, "{m_lean} vs {m_rich}");
        assert!(m_rich > 0.0);
    }

    #[test]
    fn flammable_mass_below_release_point_is_zero() {
        let jet = vertical_h2_jet();
        assert_eq!(jet.m_flammable(0.0, 0.04).unwrap(), 0.0);
    }

    #[test]
    fn flammable_mass_query_does_not_mutate() {
        let jet = vertical_h2_jet();
        let s_before = jet.s().to_vec();
        let y_before = jet.centerline_mass_fraction().to_vec();
        let _ = jet.m_flammable(1.0, 0.04).unwrap();
        assert_eq!(s_before, jet.s());
        assert_eq!(y_before, jet.centerline_mass_fraction());
    }

    #[test]
    fn dilution_distances_are_ordered() {
        let jet = vertical_h2_jet();
        let d_rich = jet.distance_to_mole_fraction(0.04).unwrap();
        let d_lean = jet.distance_to_mole_fraction(0.02).unwrap();
        assert!(d_rich < d_lean, "{d_rich} vs {d_lean}");
        assert!(d_rich > 0.0);
        // Leaner than the whole stored plume: no crossing
        assert!(jet.distance_to_mole_fraction(1e-9).is_none());
    }

    #[test]
    fn centerline_mole_fraction_matches_point_query() {
        let jet = vertical_h2_jet();
        let mid = jet.len() / 2;
        let on_axis = jet.mole_fraction_at(jet.x()[mid], jet.y()[mid]);
        let expected = jet.blend().mole_from_mass_in_air(jet.centerline_mass_fraction()[mid]);
        assert!((on_axis - expected).abs() < 1e-9);

        // Off-axis the profile decays
        let off_axis = jet.mole_fraction_at(jet.x()[mid] + 3.0 * jet.half_width()[mid], jet.y()[mid]);
        assert!(off_axis < on_axis);
    }

    #[test]
    fn height_lookup_brackets_the_trajectory() {
        let jet = vertical_h2_jet();
        assert!(jet.velocity_halfwidth_at_height(-1.0).is_none());
        let (v, b) = jet.velocity_halfwidth_at_height(2.0).unwrap();
        assert!(v > 0.0 && b > 0.0);
        // Wider and slower than at the establishment point
        assert!(v < jet.centerline_velocity()[0]);
        assert!(b > jet.half_width()[0]);
    }
}
