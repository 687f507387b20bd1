//! Tabulated compressibility factors.

use crate::error::{FluidError, FluidResult};
use hy_solver::bilinear;

/// Compressibility factor Z(T, P) on a rectilinear grid.
///
/// Queries outside the grid fail with [`FluidError::PropertyLookup`]
/// instead of extrapolating.
#[derive(Debug, Clone, PartialEq)]
pub struct ZTable {
    t_grid_k: Vec<f64>,
    p_grid_pa: Vec<f64>,
    /// z[i][j] at (t_grid_k[i], p_grid_pa[j]).
    z: Vec<Vec<f64>>,
}

impl ZTable {
    pub fn try_new(t_grid_k: Vec<f64>, p_grid_pa: Vec<f64>, z: Vec<Vec<f64>>) -> FluidResult<Self> {
        if t_grid_k.len() < 2 || p_grid_pa.len() < 2 {
            return Err(FluidError::Specification {
                what: "compressibility grid needs at least 2x2 points".into(),
            });
        }
        if t_grid_k.windows(2).any(|w| w[1] <= w[0]) || p_grid_pa.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(FluidError::Specification {
                what: "compressibility grid axes must be strictly increasing".into(),
            });
        }
        if z.len() != t_grid_k.len() || z.iter().any(|row| row.len() != p_grid_pa.len()) {
            return Err(FluidError::Specification {
                what: "compressibility grid shape mismatch".into(),
            });
        }
        if z.iter().flatten().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(FluidError::Specification {
                what: "compressibility factors must be positive and finite".into(),
            });
        }
        Ok(Self {
            t_grid_k,
            p_grid_pa,
            z,
        })
    }

    /// Coarse normal-hydrogen grid covering storage conditions up to 100 MPa.
    pub fn hydrogen() -> Self {
        let t_grid_k = vec![100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0];
        let p_grid_pa = vec![
            1.0e5, 1.0e6, 5.0e6, 1.0e7, 2.0e7, 3.5e7, 5.0e7, 7.0e7, 1.0e8,
        ];
        let z = vec![
            vec![0.9995, 0.9980, 1.0810, 1.1780, 1.3730, 1.6650, 1.9900, 2.4030, 3.0210],
            vec![1.0010, 1.0120, 1.0620, 1.1240, 1.2510, 1.4440, 1.6440, 1.9100, 2.3100],
            vec![1.0009, 1.0093, 1.0470, 1.0930, 1.1870, 1.3300, 1.4790, 1.6800, 1.9800],
            vec![1.0007, 1.0075, 1.0370, 1.0750, 1.1500, 1.2650, 1.3850, 1.5450, 1.7850],
            vec![1.0006, 1.0062, 1.0320, 1.0650, 1.1280, 1.2360, 1.3440, 1.4890, 1.7020],
            vec![1.0005, 1.0053, 1.0270, 1.0540, 1.1100, 1.2000, 1.2900, 1.4100, 1.5900],
            vec![1.0005, 1.0047, 1.0230, 1.0480, 1.0960, 1.1750, 1.2550, 1.3600, 1.5200],
        ];
        // Grid and values are validated by construction
        Self {
            t_grid_k,
            p_grid_pa,
            z,
        }
    }

    /// Compressibility factor at (T, P); errors outside the grid.
    pub fn z(&self, t_k: f64, p_pa: f64) -> FluidResult<f64> {
        bilinear(&self.t_grid_k, &self.p_grid_pa, &self.z, t_k, p_pa).ok_or_else(|| {
            FluidError::PropertyLookup {
                what: format!(
                    "Z(T={t_k:.2} K, P={p_pa:.3e} Pa) outside table domain \
                     [{:.0}..{:.0} K, {:.2e}..{:.2e} Pa]",
                    self.t_grid_k[0],
                    self.t_grid_k[self.t_grid_k.len() - 1],
                    self.p_grid_pa[0],
                    self.p_grid_pa[self.p_grid_pa.len() - 1],
                ),
            }
        })
    }

    /// Temperature coverage [K].
    pub fn t_range(&self) -> (f64, f64) {
        (self.t_grid_k[0], self.t_grid_k[self.t_grid_k.len() - 1])
    }

    /// Pressure coverage [Pa].
    pub fn p_range(&self) -> (f64, f64) {
        (self.p_grid_pa[0], self.p_grid_pa[self.p_grid_pa.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrogen_table_lookup() {
        let table = ZTable::hydrogen();
        // Grid point: no interpolation error
        let z = table.z(300.0, 3.5e7).unwrap();
        assert!((z - 1.236).abs() < 1e-3);
        // Interior point between grid nodes
        let z = table.z(288.0, 3.5e7).unwrap();
        assert!(z > 1.2 && z < 1.3);
    }

    #[test]
    fn outside_domain_is_lookup_error() {
        let table = ZTable::hydrogen();
        let err = table.z(500.0, 1.0e6).unwrap_err();
        assert!(matches!(err, FluidError::PropertyLookup { .. }));
        let err = table.z(300.0, 2.0e8).unwrap_err();
        assert!(matches!(err, FluidError::PropertyLookup { .. }));
    }

    #[test]
    fn z_increases_with_pressure_at_storage_temps() {
        let table = ZTable::hydrogen();
        let z_low = table.z(300.0, 1.0e6).unwrap();
        let z_high = table.z(300.0, 7.0e7).unwrap();
        assert!(z_high > z_low);
    }

    #[test]
    fn malformed_grid_rejected() {
        let bad = ZTable::try_new(
            vec![300.0, 200.0],
            vec![1.0e5, 1.0e6],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        );
        assert!(bad.is_err());

        let bad_shape = ZTable::try_new(
            vec![200.0, 300.0],
            vec![1.0e5, 1.0e6],
            vec![vec![1.0, 1.0]],
        );
        assert!(bad_shape.is_err());
    }
}
