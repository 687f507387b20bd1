//! Component categories and leak-frequency aggregation.
//!
//! Every plant component belongs to one of fourteen categories, each with
//! built-in lognormal leak-frequency parameters per standard leak size
//! [events per component-year; per meter-year for pipe runs]. The built-in
//! table is the compressed-gaseous-hydrogen dataset; methane, propane, and
//! liquid-phase service scale it by fixed log-space shifts in lieu of
//! fuel-specific data. Every default can be replaced per component with an
//! arbitrary [`DistributionSpec`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use hy_core::keys::normalize_key;
use hy_fluids::{Blend, Species};
use hy_uncertainty::DistributionSpec;

use crate::error::{QraError, QraResult};
use crate::leak::LeakSize;

/// Log-space frequency shift applied to the hydrogen table for methane.
const METHANE_MU_SHIFT: f64 = 0.26;

/// Log-space frequency shift applied to the hydrogen table for propane.
const PROPANE_MU_SHIFT: f64 = 0.41;

/// Log-space frequency shift for liquid-phase service.
const LIQUID_MU_SHIFT: f64 = 0.69;

/// Fuel family for frequency-table selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Hydrogen,
    Methane,
    Propane,
}

impl Fuel {
    pub fn from_key(key: &str) -> QraResult<Self> {
        match normalize_key(key).as_str() {
            "h2" | "hydrogen" => Ok(Fuel::Hydrogen),
            "ch4" | "methane" => Ok(Fuel::Methane),
            "c3h8" | "propane" => Ok(Fuel::Propane),
            _ => Err(QraError::UnknownModel { name: key.into() }),
        }
    }

    /// The dominant fuel species of a blend, if it has one.
    pub fn from_blend(blend: &Blend) -> Option<Self> {
        blend
            .iter()
            .filter_map(|(sp, x)| {
                let fuel = match sp {
                    Species::H2 => Fuel::Hydrogen,
                    Species::CH4 => Fuel::Methane,
                    Species::C3H8 => Fuel::Propane,
                    _ => return None,
                };
                Some((fuel, x))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(fuel, _)| fuel)
    }
}

/// Phase of the fuel inventory at the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Gas,
    Liquid,
}

/// Plant component category carrying built-in leak-frequency defaults.
/// The two `Extra` slots exist for site-specific equipment and have no
/// built-ins; they default to zero frequency until given distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    Compressor,
    Vessel,
    Valve,
    Instrument,
    Joint,
    Hose,
    Pipe,
    Filter,
    Flange,
    HeatExchanger,
    Vaporizer,
    LoadingArm,
    Extra1,
    Extra2,
}

impl ComponentCategory {
    pub const ALL: [ComponentCategory; 14] = [
        ComponentCategory::Compressor,
        ComponentCategory::Vessel,
        ComponentCategory::Valve,
        ComponentCategory::Instrument,
        ComponentCategory::Joint,
        ComponentCategory::Hose,
        ComponentCategory::Pipe,
        ComponentCategory::Filter,
        ComponentCategory::Flange,
        ComponentCategory::HeatExchanger,
        ComponentCategory::Vaporizer,
        ComponentCategory::LoadingArm,
        ComponentCategory::Extra1,
        ComponentCategory::Extra2,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ComponentCategory::Compressor => "compressor",
            ComponentCategory::Vessel => "vessel",
            ComponentCategory::Valve => "valve",
            ComponentCategory::Instrument => "instrument",
            ComponentCategory::Joint => "joint",
            ComponentCategory::Hose => "hose",
            ComponentCategory::Pipe => "pipe",
            ComponentCategory::Filter => "filter",
            ComponentCategory::Flange => "flange",
            ComponentCategory::HeatExchanger => "heat_exchanger",
            ComponentCategory::Vaporizer => "vaporizer",
            ComponentCategory::LoadingArm => "loading_arm",
            ComponentCategory::Extra1 => "extra1",
            ComponentCategory::Extra2 => "extra2",
        }
    }

    pub fn from_key(key: &str) -> QraResult<Self> {
        match normalize_key(key).as_str() {
            "compressor" => Ok(ComponentCategory::Compressor),
            "vessel" | "cylinder" | "tank" => Ok(ComponentCategory::Vessel),
            "valve" => Ok(ComponentCategory::Valve),
            "instrument" => Ok(ComponentCategory::Instrument),
            "joint" => Ok(ComponentCategory::Joint),
            "hose" => Ok(ComponentCategory::Hose),
            "pipe" => Ok(ComponentCategory::Pipe),
            "filter" => Ok(ComponentCategory::Filter),
            "flange" => Ok(ComponentCategory::Flange),
            "heatexchanger" => Ok(ComponentCategory::HeatExchanger),
            "vaporizer" => Ok(ComponentCategory::Vaporizer),
            "loadingarm" | "transferarm" => Ok(ComponentCategory::LoadingArm),
            "extra1" => Ok(ComponentCategory::Extra1),
            "extra2" => Ok(ComponentCategory::Extra2),
            _ => Err(QraError::UnknownModel { name: key.into() }),
        }
    }

    /// Built-in lognormal (mu, sigma) of the leak frequency per size, in
    /// the hydrogen-gas reference table. `None` for the extra slots.
    fn base_params(&self) -> Option<[(f64, f64); 5]> {
        let table = match self {
            ComponentCategory::Compressor => {
                [(-1.7, 0.3), (-4.6, 0.6), (-6.5, 0.8), (-7.8, 1.0), (-9.2, 1.2)]
            }
            ComponentCategory::Vessel => {
                [(-13.5, 0.7), (-13.7, 0.7), (-14.0, 0.8), (-14.5, 0.9), (-15.0, 1.1)]
            }
            ComponentCategory::Valve => {
                [(-5.2, 0.2), (-7.3, 0.4), (-9.7, 1.0), (-10.3, 0.7), (-12.6, 1.2)]
            }
            ComponentCategory::Instrument => {
                [(-7.4, 0.7), (-8.5, 0.8), (-9.1, 0.9), (-9.7, 1.1), (-12.2, 1.2)]
            }
            ComponentCategory::Joint => {
                [(-9.6, 0.8), (-11.3, 1.0), (-12.3, 1.2), (-12.8, 1.3), (-13.5, 1.5)]
            }
            ComponentCategory::Hose => {
                [(-7.0, 0.6), (-8.5, 0.8), (-8.9, 0.9), (-9.5, 1.1), (-10.2, 1.4)]
            }
            ComponentCategory::Pipe => {
                [(-11.8, 0.7), (-12.5, 0.8), (-13.3, 1.0), (-14.0, 1.2), (-14.6, 1.3)]
            }
            ComponentCategory::Filter => {
                [(-5.2, 0.6), (-5.4, 0.7), (-5.7, 0.8), (-6.0, 0.9), (-6.4, 1.1)]
            }
            ComponentCategory::Flange => {
                [(-3.9, 1.7), (-6.1, 1.2), (-8.3, 0.8), (-10.5, 1.2), (-12.7, 1.7)]
            }
            ComponentCategory::HeatExchanger => {
                [(-4.6, 0.9), (-6.8, 1.0), (-8.4, 1.1), (-10.2, 1.2), (-12.0, 1.4)]
            }
            ComponentCategory::Vaporizer => {
                [(-5.1, 1.0), (-7.0, 1.0), (-8.8, 1.1), (-10.6, 1.3), (-12.4, 1.5)]
            }
            ComponentCategory::LoadingArm => {
                [(-4.5, 0.8), (-6.6, 0.9), (-8.7, 1.0), (-10.8, 1.2), (-12.9, 1.4)]
            }
            ComponentCategory::Extra1 | ComponentCategory::Extra2 => return None,
        };
        Some(table)
    }
}

/// Built-in lognormal leak-frequency parameters for a category in a given
/// service, or `None` for the extensible slots.
pub fn default_leak_params(
    category: ComponentCategory,
    fuel: Fuel,
    phase: Phase,
    size: LeakSize,
) -> Option<(f64, f64)> {
    let (mut mu, sigma) = category.base_params()?[size.index()];
    mu += match fuel {
        Fuel::Hydrogen => 0.0,
        Fuel::Methane => METHANE_MU_SHIFT,
        Fuel::Propane => PROPANE_MU_SHIFT,
    };
    if phase == Phase::Liquid {
        mu += LIQUID_MU_SHIFT;
    }
    Some((mu, sigma))
}

/// A counted batch of one component category with its five per-size leak
/// frequency distributions [per component-year, each].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    category: ComponentCategory,
    count: u32,
    frequencies: [DistributionSpec; 5],
}

impl Component {
    /// A batch with the built-in frequency defaults for the service. The
    /// extra slots start at zero frequency.
    pub fn new(category: ComponentCategory, count: u32, fuel: Fuel, phase: Phase) -> Self {
        let frequencies = std::array::from_fn(|i| {
            match default_leak_params(category, fuel, phase, LeakSize::ALL[i]) {
                Some((mu, sigma)) => DistributionSpec::Lognormal { mu, sigma },
                None => DistributionSpec::Deterministic { value: 0.0 },
            }
        });
        Self {
            category,
            count,
            frequencies,
        }
    }

    /// A batch with caller-supplied per-size frequency distributions,
    /// ordered smallest size first.
    pub fn with_frequencies(
        category: ComponentCategory,
        count: u32,
        frequencies: [DistributionSpec; 5],
    ) -> QraResult<Self> {
        for (i, spec) in frequencies.iter().enumerate() {
            spec.validate()?;
            if spec.mean() < 0.0 {
                return Err(QraError::Validation {
                    what: format!(
                        "negative mean leak frequency for {} at {}",
                        category.key(),
                        LeakSize::ALL[i]
                    ),
                });
            }
        }
        Ok(Self {
            category,
            count,
            frequencies,
        })
    }

    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn frequency_spec(&self, size: LeakSize) -> &DistributionSpec {
        &self.frequencies[size.index()]
    }

    /// Expected leak frequency of the whole batch at one size [1/yr].
    /// A zero-count batch reports zero but stays queryable.
    pub fn mean_frequency(&self, size: LeakSize) -> f64 {
        f64::from(self.count) * self.frequencies[size.index()].mean()
    }

    /// One frequency draw per component instance, summed over the batch.
    pub fn sample_frequency<R: Rng + ?Sized>(
        &self,
        size: LeakSize,
        rng: &mut R,
    ) -> QraResult<f64> {
        let spec = &self.frequencies[size.index()];
        let mut total = 0.0;
        for _ in 0..self.count {
            total += spec.sample(rng)?.max(0.0);
        }
        Ok(total)
    }
}

/// All counted components of one system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Expected total release frequency at one leak size [1/yr].
    pub fn mean_frequency(&self, size: LeakSize) -> f64 {
        self.components.iter().map(|c| c.mean_frequency(size)).sum()
    }

    /// Sampled total release frequency at one leak size [1/yr].
    pub fn sample_frequency<R: Rng + ?Sized>(
        &self,
        size: LeakSize,
        rng: &mut R,
    ) -> QraResult<f64> {
        let mut total = 0.0;
        for c in &self.components {
            total += c.sample_frequency(size, rng)?;
        }
        Ok(total)
    }
}
