//! Layer-mixing closures.
//!
//! Both closures reduce the enclosure to two regions: a well-mixed buoyant
//! layer descending from the ceiling and the ambient air beneath it. They
//! differ only in how buoyancy drives gas out of the ceiling vent.

use crate::enclosure::Enclosure;
use crate::error::{IndoorError, IndoorResult};
use hy_core::keys::normalize_key;

/// Which vent-exchange closure the layer ODE uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerModel {
    /// Buoyant-exhaust correlation with two regimes: no buoyant outflow
    /// until the layer has grown down to the ceiling vent, then a
    /// hydrostatic-head exchange over the submerged depth.
    Lowesmith,
    /// Single-regime closure: the exchange head is the full layer depth,
    /// regardless of where the vent sits.
    MixingBox,
}

impl LayerModel {
    pub fn from_key(key: &str) -> IndoorResult<Self> {
        match normalize_key(key).as_str() {
            "lowesmith" | "lowe" => Ok(LayerModel::Lowesmith),
            "mixingbox" | "box" | "mix" => Ok(LayerModel::MixingBox),
            _ => Err(IndoorError::UnknownModel { name: key.into() }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            LayerModel::Lowesmith => "lowesmith",
            LayerModel::MixingBox => "mixingbox",
        }
    }

    /// Buoyancy-driven volumetric outflow through the ceiling vent [m³/s].
    ///
    /// `y_bottom_m` is the layer-bottom height, `g_prime` the reduced
    /// gravity g·(ρ_amb − ρ_layer)/ρ_amb. A denser-than-air layer
    /// (negative `g_prime`) drives nothing out of a high vent, so the
    /// head term clamps at zero.
    pub(crate) fn buoyant_outflow(&self, y_bottom_m: f64, g_prime: f64, encl: &Enclosure) -> f64 {
        let vent = &encl.ceiling_vent;
        let head_m = match self {
            // Vent still below the layer: nothing buoyant leaves yet.
            // The transition is inclusive: a layer exactly at the vent
            // height starts venting.
            LayerModel::Lowesmith => {
                if y_bottom_m > vent.height_m {
                    return 0.0;
                }
                vent.height_m - y_bottom_m
            }
            LayerModel::MixingBox => encl.height_m - y_bottom_m,
        };
        vent.cd * vent.area_m2 * (2.0 * g_prime * head_m).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosure::Vent;
    use hy_core::units::{m, m2, m3ps};

    fn encl(vent_height_m: f64) -> Enclosure {
        let ceiling = Vent::new(m2(0.05), m(vent_height_m), 0.61, m3ps(0.0)).unwrap();
        Enclosure::new(m(2.72), m2(16.72), m(0.2), ceiling, Vent::sealed(), m(2.0)).unwrap()
    }

    #[test]
    fn keys_resolve_and_reject() {
        assert_eq!(LayerModel::from_key("Lowesmith").unwrap(), LayerModel::Lowesmith);
        assert_eq!(LayerModel::from_key("lowe").unwrap(), LayerModel::Lowesmith);
        assert_eq!(LayerModel::from_key("mixing-box").unwrap(), LayerModel::MixingBox);
        assert_eq!(LayerModel::from_key("box").unwrap(), LayerModel::MixingBox);
        assert!(matches!(
            LayerModel::from_key("stratified"),
            Err(IndoorError::UnknownModel { .. })
        ));
    }

    #[test]
    fn lowesmith_is_silent_until_the_layer_reaches_the_vent() {
        let encl = encl(2.5);
        let g_prime = 9.0;
        // Layer bottom above the vent: no buoyant exchange
        assert_eq!(LayerModel::Lowesmith.buoyant_outflow(2.6, g_prime, &encl), 0.0);
        // Exactly at the vent height: regime switches on (inclusive), head
        // is still zero so the flow starts from zero continuously
        assert_eq!(LayerModel::Lowesmith.buoyant_outflow(2.5, g_prime, &encl), 0.0);
        // Below the vent: positive outflow
        let q = LayerModel::Lowesmith.buoyant_outflow(2.0, g_prime, &encl);
        let expect = 0.61 * 0.05 * (2.0 * g_prime * 0.5_f64).sqrt();
        assert!((q - expect).abs() < 1e-12);
    }

    #[test]
    fn mixing_box_vents_over_the_full_layer_depth() {
        let encl = encl(2.5);
        let q = LayerModel::MixingBox.buoyant_outflow(2.0, 9.0, &encl);
        let expect = 0.61 * 0.05 * (2.0 * 9.0 * 0.72_f64).sqrt();
        assert!((q - expect).abs() < 1e-12);
    }

    #[test]
    fn dense_layer_drives_no_buoyant_outflow() {
        let encl = encl(2.5);
        assert_eq!(LayerModel::Lowesmith.buoyant_outflow(1.0, -4.0, &encl), 0.0);
        assert_eq!(LayerModel::MixingBox.buoyant_outflow(1.0, -4.0, &encl), 0.0);
    }
}
