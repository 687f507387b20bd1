//! Chemical species definitions.

use crate::error::FluidError;
use hy_core::units::constants::R_UNIVERSAL;

/// Chemical species relevant for release and dispersion modeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Hydrogen (H₂)
    H2,
    /// Methane (CH₄)
    CH4,
    /// Propane (C₃H₈)
    C3H8,
    /// Nitrogen (N₂)
    N2,
    /// Oxygen (O₂)
    O2,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Carbon monoxide (CO)
    CO,
    /// Water (H₂O)
    H2O,
    /// Helium (He)
    He,
    /// Air (pseudo-pure)
    Air,
}

impl Species {
    pub const ALL: [Species; 10] = [
        Species::H2,
        Species::CH4,
        Species::C3H8,
        Species::N2,
        Species::O2,
        Species::CO2,
        Species::CO,
        Species::H2O,
        Species::He,
        Species::Air,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Species::H2 => "H2",
            Species::CH4 => "CH4",
            Species::C3H8 => "C3H8",
            Species::N2 => "N2",
            Species::O2 => "O2",
            Species::CO2 => "CO2",
            Species::CO => "CO",
            Species::H2O => "H2O",
            Species::He => "He",
            Species::Air => "Air",
        }
    }

    /// Get human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Species::H2 => "Hydrogen",
            Species::CH4 => "Methane",
            Species::C3H8 => "Propane",
            Species::N2 => "Nitrogen",
            Species::O2 => "Oxygen",
            Species::CO2 => "Carbon Dioxide",
            Species::CO => "Carbon Monoxide",
            Species::H2O => "Water",
            Species::He => "Helium",
            Species::Air => "Air",
        }
    }

    /// Get molar mass [kg/kmol] for this species.
    ///
    /// Values sourced from standard reference data (e.g., NIST).
    pub fn molar_mass(&self) -> f64 {
        match self {
            Species::H2 => 2.016,
            Species::CH4 => 16.043,
            Species::C3H8 => 44.097,
            Species::N2 => 28.014,
            Species::O2 => 31.999,
            Species::CO2 => 44.010,
            Species::CO => 28.010,
            Species::H2O => 18.015,
            Species::He => 4.003,
            Species::Air => 28.965,
        }
    }

    /// Specific gas constant [J/(kg·K)].
    pub fn specific_gas_constant(&self) -> f64 {
        1.0e3 * R_UNIVERSAL / self.molar_mass()
    }

    /// Ratio of specific heats near ambient temperature.
    pub fn gamma(&self) -> f64 {
        match self {
            Species::H2 => 1.405,
            Species::CH4 => 1.304,
            Species::C3H8 => 1.132,
            Species::N2 => 1.400,
            Species::O2 => 1.395,
            Species::CO2 => 1.289,
            Species::CO => 1.400,
            Species::H2O => 1.330,
            Species::He => 1.667,
            Species::Air => 1.400,
        }
    }

    /// Abel-Noble co-volume [m³/kg].
    ///
    /// The hydrogen value is the published Abel-Noble fit; the rest are
    /// van der Waals co-volumes from critical constants.
    pub fn co_volume(&self) -> f64 {
        match self {
            Species::H2 => 7.691e-3,
            Species::CH4 => 2.684e-3,
            Species::C3H8 => 2.051e-3,
            Species::N2 => 1.379e-3,
            Species::O2 => 9.956e-4,
            Species::CO2 => 9.736e-4,
            Species::CO => 1.411e-3,
            Species::H2O => 1.692e-3,
            Species::He => 5.929e-3,
            Species::Air => 1.256e-3,
        }
    }

    /// Isobaric specific heat [J/(kg·K)], thermally perfect.
    pub fn cp(&self) -> f64 {
        let g = self.gamma();
        g / (g - 1.0) * self.specific_gas_constant()
    }

    /// Isochoric specific heat [J/(kg·K)].
    pub fn cv(&self) -> f64 {
        self.specific_gas_constant() / (self.gamma() - 1.0)
    }

    /// Whether this species burns (has flammability data).
    pub fn is_fuel(&self) -> bool {
        matches!(self, Species::H2 | Species::CH4 | Species::C3H8)
    }

    /// Lean flammability limit [mole fraction]; `None` for non-fuels.
    pub fn lean_flammability_limit(&self) -> Option<f64> {
        match self {
            Species::H2 => Some(0.04),
            Species::CH4 => Some(0.05),
            Species::C3H8 => Some(0.021),
            _ => None,
        }
    }

    /// Rich flammability limit [mole fraction]; `None` for non-fuels.
    pub fn rich_flammability_limit(&self) -> Option<f64> {
        match self {
            Species::H2 => Some(0.75),
            Species::CH4 => Some(0.15),
            Species::C3H8 => Some(0.095),
            _ => None,
        }
    }

    /// Lower heating value [J/kg]; `None` for non-fuels.
    pub fn heat_of_combustion(&self) -> Option<f64> {
        match self {
            Species::H2 => Some(1.1996e8),
            Species::CH4 => Some(5.003e7),
            Species::C3H8 => Some(4.635e7),
            _ => None,
        }
    }
}

impl std::str::FromStr for Species {
    type Err = FluidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H2" | "HYDROGEN" => Ok(Species::H2),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "C3H8" | "PROPANE" => Ok(Species::C3H8),
            "N2" | "NITROGEN" => Ok(Species::N2),
            "O2" | "OXYGEN" => Ok(Species::O2),
            "CO2" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "CO" | "CARBONMONOXIDE" | "CARBON MONOXIDE" => Ok(Species::CO),
            "H2O" | "WATER" => Ok(Species::H2O),
            "HE" | "HELIUM" => Ok(Species::He),
            "AIR" => Ok(Species::Air),
            _ => Err(FluidError::UnknownSpecies { name: s.into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fuel_aliases() {
        assert_eq!("h2".parse::<Species>().unwrap(), Species::H2);
        assert_eq!("Hydrogen".parse::<Species>().unwrap(), Species::H2);
        assert_eq!("ch4".parse::<Species>().unwrap(), Species::CH4);
        assert_eq!("propane".parse::<Species>().unwrap(), Species::C3H8);
    }

    #[test]
    fn unknown_species_is_error() {
        let err = "xenon".parse::<Species>().unwrap_err();
        assert!(matches!(err, FluidError::UnknownSpecies { .. }));
    }

    #[test]
    fn hydrogen_gas_constant() {
        // R/M for H2: 8314.46 / 2.016 ≈ 4124.2 J/(kg·K)
        assert!((Species::H2.specific_gas_constant() - 4124.2).abs() < 0.5);
    }

    #[test]
    fn cp_cv_consistency() {
        for sp in Species::ALL {
            let r = sp.specific_gas_constant();
            assert!((sp.cp() - sp.cv() - r).abs() < 1e-9 * r);
        }
    }

    #[test]
    fn flammability_data_only_for_fuels() {
        for sp in Species::ALL {
            assert_eq!(sp.is_fuel(), sp.lean_flammability_limit().is_some());
            assert_eq!(sp.is_fuel(), sp.heat_of_combustion().is_some());
        }
    }

    #[test]
    fn canonical_key_roundtrip() {
        for sp in Species::ALL {
            assert_eq!(sp.key().parse::<Species>().unwrap(), sp);
        }
    }
}
