//! Enclosure geometry: a rectangular room with a ceiling-level and a
//! floor-level vent.
//!
//! Both structs are plain immutable value types. Validation happens once at
//! construction; the layer integration reads raw fields afterward.

use crate::error::{IndoorError, IndoorResult};
use hy_core::units::{Area, Length, Volume, VolumeRate};

/// A vent opening in the enclosure wall.
///
/// `forced_flow_m3ps` is an externally imposed mechanical extraction rate
/// through the vent, on top of any buoyancy-driven exchange.
#[derive(Debug, Clone, Copy)]
pub struct Vent {
    /// Free opening area [m²].
    pub area_m2: f64,
    /// Height of the opening above the floor [m].
    pub height_m: f64,
    /// Discharge coefficient.
    pub cd: f64,
    /// Mechanical volumetric flow through the vent [m³/s].
    pub forced_flow_m3ps: f64,
}

impl Vent {
    pub fn new(
        area: Area,
        height: Length,
        cd: f64,
        forced_flow: VolumeRate,
    ) -> IndoorResult<Self> {
        let area_m2 = area.value;
        let height_m = height.value;
        let forced_flow_m3ps = forced_flow.value;
        if !area_m2.is_finite() || area_m2 < 0.0 {
            return Err(IndoorError::NonPhysical { what: "vent area" });
        }
        if !height_m.is_finite() || height_m < 0.0 {
            return Err(IndoorError::NonPhysical {
                what: "vent height",
            });
        }
        if !cd.is_finite() || cd <= 0.0 || cd > 1.0 {
            return Err(IndoorError::NonPhysical {
                what: "vent discharge coefficient",
            });
        }
        if !forced_flow_m3ps.is_finite() || forced_flow_m3ps < 0.0 {
            return Err(IndoorError::NonPhysical {
                what: "vent forced flow",
            });
        }
        Ok(Self {
            area_m2,
            height_m,
            cd,
            forced_flow_m3ps,
        })
    }

    /// A sealed opening: zero area, zero forced flow.
    pub fn sealed() -> Self {
        Self {
            area_m2: 0.0,
            height_m: 0.0,
            cd: 1.0,
            forced_flow_m3ps: 0.0,
        }
    }
}

/// A flat-ceilinged enclosure the release discharges into.
#[derive(Debug, Clone)]
pub struct Enclosure {
    /// Ceiling height above the floor [m].
    pub height_m: f64,
    /// Floor (and ceiling) area [m²].
    pub floor_area_m2: f64,
    /// Height of the release point above the floor [m].
    pub release_height_m: f64,
    /// Upper vent, in the ceiling-gas layer's reach.
    pub ceiling_vent: Vent,
    /// Lower vent, supplying make-up air.
    pub floor_vent: Vent,
    /// Horizontal distance from the release point to the facing wall [m].
    pub wall_distance_m: f64,
}

impl Enclosure {
    pub fn new(
        height: Length,
        floor_area: Area,
        release_height: Length,
        ceiling_vent: Vent,
        floor_vent: Vent,
        wall_distance: Length,
    ) -> IndoorResult<Self> {
        let height_m = height.value;
        let floor_area_m2 = floor_area.value;
        let release_height_m = release_height.value;
        let wall_distance_m = wall_distance.value;
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(IndoorError::NonPhysical {
                what: "enclosure height",
            });
        }
        if !floor_area_m2.is_finite() || floor_area_m2 <= 0.0 {
            return Err(IndoorError::NonPhysical {
                what: "enclosure floor area",
            });
        }
        if !release_height_m.is_finite() || release_height_m < 0.0 || release_height_m >= height_m
        {
            return Err(IndoorError::NonPhysical {
                what: "release height",
            });
        }
        if !wall_distance_m.is_finite() || wall_distance_m <= 0.0 {
            return Err(IndoorError::NonPhysical {
                what: "wall distance",
            });
        }
        for vent in [&ceiling_vent, &floor_vent] {
            if vent.height_m > height_m {
                return Err(IndoorError::NonPhysical {
                    what: "vent height above ceiling",
                });
            }
        }
        Ok(Self {
            height_m,
            floor_area_m2,
            release_height_m,
            ceiling_vent,
            floor_vent,
            wall_distance_m,
        })
    }

    /// Total enclosed volume [m³].
    pub fn volume_m3(&self) -> f64 {
        self.height_m * self.floor_area_m2
    }

    /// Total volume as a typed quantity.
    pub fn volume(&self) -> Volume {
        hy_core::units::m3(self.volume_m3())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hy_core::units::{m, m2, m3ps};

    fn vent() -> Vent {
        Vent::new(m2(0.1), m(2.5), 0.61, m3ps(0.0)).unwrap()
    }

    #[test]
    fn volume_is_height_times_area() {
        let encl = Enclosure::new(m(2.72), m2(16.72), m(0.2), vent(), vent(), m(2.0)).unwrap();
        assert!((encl.volume_m3() - 2.72 * 16.72).abs() < 1e-12);
    }

    #[test]
    fn release_above_ceiling_is_rejected() {
        let err = Enclosure::new(m(2.72), m2(16.72), m(3.0), vent(), vent(), m(2.0));
        assert!(matches!(err, Err(IndoorError::NonPhysical { .. })));
    }

    #[test]
    fn vent_above_ceiling_is_rejected() {
        let high = Vent::new(m2(0.1), m(5.0), 0.61, m3ps(0.0)).unwrap();
        let err = Enclosure::new(m(2.72), m2(16.72), m(0.2), high, vent(), m(2.0));
        assert!(matches!(err, Err(IndoorError::NonPhysical { .. })));
    }

    #[test]
    fn bad_discharge_coefficient_is_rejected() {
        let err = Vent::new(m2(0.1), m(2.5), 1.4, m3ps(0.0));
        assert!(matches!(err, Err(IndoorError::NonPhysical { .. })));
        let err = Vent::new(m2(0.1), m(2.5), 0.0, m3ps(0.0));
        assert!(matches!(err, Err(IndoorError::NonPhysical { .. })));
    }

    #[test]
    fn sealed_vent_has_zero_exchange() {
        let v = Vent::sealed();
        assert_eq!(v.area_m2, 0.0);
        assert_eq!(v.forced_flow_m3ps, 0.0);
    }
}
