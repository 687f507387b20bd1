//! Gas blends (pure species or mole-fraction mixtures).

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use hy_core::units::constants::R_UNIVERSAL;

/// Mole-fraction sum tolerance for user-supplied blends.
const SUM_TOL: f64 = 1e-6;

/// A gas blend defined by mole fractions.
///
/// User-supplied fractions must sum to 1 within `1e-6`; a blend that does
/// not is rejected rather than silently renormalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    /// Species and mole fractions, normalized to sum exactly 1.
    items: Vec<(Species, f64)>,
}

impl Blend {
    /// Create a pure-species blend.
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Create a blend from mole fractions.
    pub fn try_new(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::Specification {
                what: "empty blend".into(),
            });
        }

        let mut sum = 0.0;
        for (sp, frac) in &fractions {
            if !frac.is_finite() || *frac < 0.0 {
                return Err(FluidError::Specification {
                    what: format!("mole fraction of {} must be finite and >= 0", sp.key()),
                });
            }
            sum += frac;
        }
        if (sum - 1.0).abs() > SUM_TOL {
            return Err(FluidError::Specification {
                what: format!("mole fractions sum to {sum:.8}, expected 1"),
            });
        }

        // Normalize away the residual and drop negligible entries
        let items: Vec<(Species, f64)> = fractions
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();

        Ok(Self { items })
    }

    /// Resolve a single species key into a pure blend.
    pub fn parse_key(key: &str) -> FluidResult<Self> {
        Ok(Self::pure(key.parse::<Species>()?))
    }

    /// Get mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Get mass fraction of a species (0.0 if not present).
    pub fn mass_fraction(&self, species: Species) -> f64 {
        self.mole_fraction(species) * species.molar_mass() / self.molar_mass()
    }

    /// Iterate over all species with non-zero mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Check if this is a pure-species blend.
    pub fn is_pure(&self) -> Option<Species> {
        if self.items.len() == 1 {
            return Some(self.items[0].0);
        }
        None
    }

    /// Mixture molar mass [kg/kmol]: M = Σ xᵢ·Mᵢ.
    pub fn molar_mass(&self) -> f64 {
        self.items
            .iter()
            .map(|(sp, x)| sp.molar_mass() * x)
            .sum()
    }

    /// Specific gas constant [J/(kg·K)].
    pub fn specific_gas_constant(&self) -> f64 {
        1.0e3 * R_UNIVERSAL / self.molar_mass()
    }

    /// Mass-weighted isobaric specific heat [J/(kg·K)].
    pub fn cp(&self) -> f64 {
        self.items
            .iter()
            .map(|(sp, x)| sp.cp() * x * sp.molar_mass())
            .sum::<f64>()
            / self.molar_mass()
    }

    /// Mass-weighted isochoric specific heat [J/(kg·K)].
    pub fn cv(&self) -> f64 {
        self.items
            .iter()
            .map(|(sp, x)| sp.cv() * x * sp.molar_mass())
            .sum::<f64>()
            / self.molar_mass()
    }

    /// Mixture heat-capacity ratio.
    pub fn gamma(&self) -> f64 {
        self.cp() / self.cv()
    }

    /// Mass-weighted Abel-Noble co-volume [m³/kg].
    pub fn co_volume(&self) -> f64 {
        self.items
            .iter()
            .map(|(sp, x)| sp.co_volume() * x * sp.molar_mass())
            .sum::<f64>()
            / self.molar_mass()
    }

    /// Total mole fraction of fuel species.
    pub fn fuel_fraction(&self) -> f64 {
        self.items
            .iter()
            .filter(|(sp, _)| sp.is_fuel())
            .map(|(_, x)| x)
            .sum()
    }

    /// Lean flammability limit of the blend [mole fraction].
    ///
    /// Le Chatelier mixing over the fuel components; inerts are excluded
    /// from the rule. `None` when the blend contains no fuel.
    pub fn lean_flammability_limit(&self) -> Option<f64> {
        let fuel_total = self.fuel_fraction();
        if fuel_total <= 0.0 {
            return None;
        }
        let denom: f64 = self
            .items
            .iter()
            .filter_map(|(sp, x)| sp.lean_flammability_limit().map(|lfl| x / lfl))
            .sum();
        Some(fuel_total / denom)
    }

    /// Mass fraction of this blend in a blend/air mixture, from the blend
    /// mole fraction.
    pub fn mass_from_mole_in_air(&self, x: f64) -> f64 {
        let mw_f = self.molar_mass();
        let mw_a = Species::Air.molar_mass();
        x * mw_f / (x * mw_f + (1.0 - x) * mw_a)
    }

    /// Mole fraction of this blend in a blend/air mixture, from the blend
    /// mass fraction.
    pub fn mole_from_mass_in_air(&self, y: f64) -> f64 {
        let mw_f = self.molar_mass();
        let mw_a = Species::Air.molar_mass();
        (y / mw_f) / (y / mw_f + (1.0 - y) / mw_a)
    }

    /// Molar mass of a blend/air mixture at the given blend mole fraction
    /// [kg/kmol].
    pub fn mixture_molar_mass(&self, x: f64) -> f64 {
        x * self.molar_mass() + (1.0 - x) * Species::Air.molar_mass()
    }

    /// Lower heating value [J per kg of blend].
    ///
    /// Inerts carry zero heating value. `None` when the blend has no fuel.
    pub fn heat_of_combustion(&self) -> Option<f64> {
        if self.fuel_fraction() <= 0.0 {
            return None;
        }
        let m_mix = self.molar_mass();
        let hc = self
            .items
            .iter()
            .filter_map(|(sp, x)| {
                sp.heat_of_combustion()
                    .map(|dh| dh * x * sp.molar_mass() / m_mix)
            })
            .sum();
        Some(hc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_blend() {
        let blend = Blend::pure(Species::H2);
        assert_eq!(blend.is_pure(), Some(Species::H2));
        assert_eq!(blend.mole_fraction(Species::H2), 1.0);
        assert_eq!(blend.mole_fraction(Species::CH4), 0.0);
        assert!((blend.molar_mass() - 2.016).abs() < 1e-12);
    }

    #[test]
    fn off_by_ten_percent_rejected() {
        let result = Blend::try_new(vec![(Species::H2, 0.5), (Species::CH4, 0.4)]);
        assert!(matches!(result, Err(FluidError::Specification { .. })));
    }

    #[test]
    fn within_tolerance_accepted() {
        let blend =
            Blend::try_new(vec![(Species::H2, 0.5000001), (Species::CH4, 0.4999998)]).unwrap();
        let sum: f64 = blend.iter().map(|(_, f)| f).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn le_chatelier_equimolar_h2_ch4() {
        let blend = Blend::try_new(vec![(Species::H2, 0.5), (Species::CH4, 0.5)]).unwrap();
        // 1 / (0.5/0.04 + 0.5/0.05) = 1/22.5
        let lfl = blend.lean_flammability_limit().unwrap();
        assert!((lfl - 1.0 / 22.5).abs() < 1e-9);
    }

    #[test]
    fn inert_blend_has_no_lfl() {
        let blend = Blend::try_new(vec![(Species::N2, 0.7), (Species::He, 0.3)]).unwrap();
        assert!(blend.lean_flammability_limit().is_none());
        assert!(blend.heat_of_combustion().is_none());
    }

    #[test]
    fn mixture_gamma_between_components() {
        let blend = Blend::try_new(vec![(Species::H2, 0.5), (Species::CH4, 0.5)]).unwrap();
        let g = blend.gamma();
        assert!(g > Species::CH4.gamma() && g < Species::H2.gamma());
    }

    #[test]
    fn parse_key_resolves_fuel() {
        let blend = Blend::parse_key("h2").unwrap();
        assert_eq!(blend.is_pure(), Some(Species::H2));
        assert!(Blend::parse_key("mystery").is_err());
    }

    #[test]
    fn mole_mass_fraction_in_air_roundtrip() {
        let blend = Blend::pure(Species::H2);
        for x in [0.0, 0.04, 0.2959, 0.75, 1.0] {
            let y = blend.mass_from_mole_in_air(x);
            assert!((blend.mole_from_mass_in_air(y) - x).abs() < 1e-12);
        }
        // Hydrogen is much lighter than air: 4% by mole is ~0.29% by mass
        let y_lfl = blend.mass_from_mole_in_air(0.04);
        assert!(y_lfl > 0.0028 && y_lfl < 0.0030);
    }
}
