//! Constant-volume expansion overpressure.
//!
//! Deflagration of a premixed cloud inside a closed volume is approximated
//! by adiabatic compression of the room contents: the flammable inventory
//! is recast as a stoichiometric fuel/air volume, expanded by the burned/
//! unburned ratio, and the rest of the room takes up the difference.

use crate::error::{IndoorError, IndoorResult};
use hy_core::units::constants::R_UNIVERSAL;
use hy_fluids::{Blend, Species};

/// O2 mole fraction of dry air.
const X_O2_AIR: f64 = 0.209_46;

/// Moles of O2 consumed per mole of fuel.
fn stoich_o2_moles(species: Species) -> Option<f64> {
    match species {
        Species::H2 => Some(0.5),
        Species::CH4 => Some(2.0),
        Species::C3H8 => Some(5.0),
        _ => None,
    }
}

/// Burned-to-unburned volume ratio of the stoichiometric mixture at
/// constant pressure.
fn expansion_ratio(species: Species) -> Option<f64> {
    match species {
        Species::H2 => Some(6.89),
        Species::CH4 => Some(7.52),
        Species::C3H8 => Some(7.98),
        _ => None,
    }
}

/// Peak expansion overpressure [Pa] from burning `flammable_mass_kg` of
/// fuel inside a sealed volume of `enclosure_volume_m3`.
///
/// Zero mass (or a blend with no fuel component) gives exactly zero.
pub fn dp_expansion(
    enclosure_volume_m3: f64,
    flammable_mass_kg: f64,
    blend: &Blend,
    t_amb_k: f64,
    p_amb_pa: f64,
) -> IndoorResult<f64> {
    if !enclosure_volume_m3.is_finite() || enclosure_volume_m3 <= 0.0 {
        return Err(IndoorError::NonPhysical {
            what: "enclosure volume",
        });
    }
    if !flammable_mass_kg.is_finite() || flammable_mass_kg < 0.0 {
        return Err(IndoorError::NonPhysical {
            what: "flammable mass",
        });
    }
    if flammable_mass_kg == 0.0 {
        return Ok(0.0);
    }

    // Mole-weighted stoichiometry over the fuel components of the blend
    let fuel_frac = blend.fuel_fraction();
    if fuel_frac <= 0.0 {
        return Ok(0.0);
    }
    let mut o2_moles = 0.0;
    let mut sigma = 0.0;
    for (sp, x) in blend.iter() {
        if let (Some(s), Some(e)) = (stoich_o2_moles(sp), expansion_ratio(sp)) {
            o2_moles += x * s;
            sigma += x * e;
        }
    }
    o2_moles /= fuel_frac;
    sigma /= fuel_frac;

    // Stoichiometric fuel mole fraction in air, then the unburned-mixture
    // volume carrying the flammable inventory
    let x_stoich = 1.0 / (1.0 + o2_moles / X_O2_AIR);
    let y_stoich = blend.mass_from_mole_in_air(x_stoich);
    let mw_mix = blend.mixture_molar_mass(x_stoich) * 1.0e-3; // kg/mol
    let rho_stoich = p_amb_pa * mw_mix / (R_UNIVERSAL * t_amb_k);
    let v_unburned = (flammable_mass_kg / y_stoich) / rho_stoich;

    let gamma = Species::Air.gamma();
    let ratio = (enclosure_volume_m3 + v_unburned * (sigma - 1.0)) / enclosure_volume_m3;
    Ok(p_amb_pa * (ratio.powf(gamma) - 1.0))
}
