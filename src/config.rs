//! Scenario configuration and its validation.
//!
//! A [`ScenarioConfig`] is plain data, typically deserialized by whatever tool assembles the parameter tables. Nothing
//! in it is trusted until [`ScenarioConfig::compile()`] has checked it and built the sampling distributions; every
//! configuration problem is reported there, before the simulation clock starts.

use crate::error::ConfigError;
use crate::pathway::{Destination, LosKey, PatientClass, Unit};
use crate::policy::BedPolicy;
use crate::variates::{DestinationDistribution, InterArrival, LosDistribution, LosParams};

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Discharge probabilities for one unit, by patient class.
pub type DischargeTable = BTreeMap<PatientClass, BTreeMap<Destination, f64>>;

/// Everything needed to run one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Seed for the single random stream.
    pub seed: u64,
    /// Simulated days to run, warm-up included.
    pub horizon_days: u32,
    /// Leading days discarded before computing statistics.
    #[serde(default = "ScenarioConfig::default_warm_up_days")]
    pub warm_up_days: u32,
    pub policy: BedPolicy,
    pub arrivals: Vec<ArrivalStream>,
    pub length_of_stay: LosTables,
    pub discharge: DischargeTables,
}

/// Poisson arrivals of one class straight into one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrivalStream {
    pub class: PatientClass,
    /// `rehab` for patients admitted directly to rehabilitation.
    #[serde(default = "ArrivalStream::default_unit")]
    pub unit: Unit,
    pub mean_interarrival_days: f64,
}

impl ArrivalStream {
    fn default_unit() -> Unit {
        Unit::Acute
    }
}

/// Length-of-stay tables for both units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LosTables {
    pub acute: UnitLosTable,
    pub rehab: UnitLosTable,
}

/// Length-of-stay parameters for one unit. `default` is used whenever a key is missing from `entries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitLosTable {
    pub default: LosParams,
    #[serde(default)]
    pub entries: BTreeMap<LosKey, LosParams>,
}

/// Discharge destination tables for both units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DischargeTables {
    #[serde(default)]
    pub acute: DischargeTable,
    #[serde(default)]
    pub rehab: DischargeTable,
}

impl ScenarioConfig {
    /// Three simulated years.
    pub const DEFAULT_WARM_UP_DAYS: u32 = 3 * 365;

    fn default_warm_up_days() -> u32 {
        Self::DEFAULT_WARM_UP_DAYS
    }

    /// Check the configuration without keeping the compiled form.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found; see [`compile()`](Self::compile).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile().map(|_| ())
    }

    /// Check every parameter and build the distributions a run samples from.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::NonPositiveHorizon`] and [`ConfigError::WarmUpTooLong`] for unusable run lengths.
    /// * [`ConfigError::NonPositiveMean`] for an arrival stream with a mean that is not a positive number of days.
    /// * [`ConfigError::InvalidLengthOfStay`] for length-of-stay parameters that are not a log-normal distribution.
    /// * [`ConfigError::NegativeProbability`], [`ConfigError::ProbabilitySum`] and
    ///   [`ConfigError::EmptyDistribution`] for malformed discharge tables.
    /// * [`ConfigError::UnknownClass`] when a class can reach a unit that has no discharge table for it.
    /// * [`ConfigError::RehabToRehab`] for a rehabilitation table that sends patients back to rehabilitation.
    pub fn compile(&self) -> Result<CompiledScenario, ConfigError> {
        if self.horizon_days == 0 {
            return Err(ConfigError::NonPositiveHorizon(self.horizon_days));
        }
        if self.warm_up_days >= self.horizon_days {
            return Err(ConfigError::WarmUpTooLong {
                warm_up_days: self.warm_up_days,
                horizon_days: self.horizon_days,
            });
        }

        let streams = self
            .arrivals
            .iter()
            .map(|stream| {
                let inter_arrival =
                    InterArrival::new(stream.mean_interarrival_days).map_err(|_| ConfigError::NonPositiveMean {
                        what: format!("mean inter-arrival time for {} patients into {}", stream.class, stream.unit),
                        value: stream.mean_interarrival_days,
                    })?;
                Ok(ArrivalSource {
                    class: stream.class,
                    unit: stream.unit,
                    inter_arrival,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        if streams.is_empty() {
            warn!("scenario has no arrival streams; every series will stay at zero");
        }

        let los = LosLookup {
            units: [
                CompiledUnitLos::new(Unit::Acute, &self.length_of_stay.acute)?,
                CompiledUnitLos::new(Unit::Rehab, &self.length_of_stay.rehab)?,
            ],
        };

        let discharge = DischargeLookup {
            units: [
                compile_discharge(Unit::Acute, &self.discharge.acute)?,
                compile_discharge(Unit::Rehab, &self.discharge.rehab)?,
            ],
        };
        discharge.check_coverage(&streams)?;

        Ok(CompiledScenario {
            seed: self.seed,
            horizon_days: self.horizon_days,
            warm_up_days: self.warm_up_days,
            policy: self.policy,
            streams,
            los,
            discharge,
        })
    }
}

fn compile_discharge(
    unit: Unit,
    table: &DischargeTable,
) -> Result<BTreeMap<PatientClass, DestinationDistribution>, ConfigError> {
    table
        .iter()
        .map(|(class, probabilities)| {
            let distribution = DestinationDistribution::new(unit, *class, probabilities)?;
            if unit == Unit::Rehab && distribution.probability(Destination::Rehab) > 0.0 {
                return Err(ConfigError::RehabToRehab { class: *class });
            }
            Ok((*class, distribution))
        })
        .collect()
}

/// A validated scenario, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledScenario {
    pub(crate) seed: u64,
    pub(crate) horizon_days: u32,
    pub(crate) warm_up_days: u32,
    pub(crate) policy: BedPolicy,
    pub(crate) streams: Vec<ArrivalSource>,
    pub(crate) los: LosLookup,
    pub(crate) discharge: DischargeLookup,
}

impl CompiledScenario {
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn warm_up_days(&self) -> u32 {
        self.warm_up_days
    }

    pub fn policy(&self) -> &BedPolicy {
        &self.policy
    }
}

/// A compiled arrival stream.
#[derive(Debug, Clone)]
pub struct ArrivalSource {
    pub class: PatientClass,
    pub unit: Unit,
    pub inter_arrival: InterArrival,
}

#[derive(Debug, Clone)]
struct CompiledUnitLos {
    default: LosDistribution,
    entries: BTreeMap<LosKey, LosDistribution>,
}

impl CompiledUnitLos {
    fn new(unit: Unit, table: &UnitLosTable) -> Result<Self, ConfigError> {
        let build = |key: String, params: &LosParams| {
            LosDistribution::new(*params).map_err(|error| ConfigError::InvalidLengthOfStay {
                unit,
                key,
                reason: match error {
                    ConfigError::Distribution { reason, .. } => reason,
                    other => other.to_string(),
                },
            })
        };

        let default = build("default".into(), &table.default)?;
        let entries = table
            .entries
            .iter()
            .map(|(key, params)| Ok((*key, build(key.to_string(), params)?)))
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self { default, entries })
    }
}

/// Length-of-stay distributions by unit and key.
#[derive(Debug, Clone)]
pub struct LosLookup {
    units: [CompiledUnitLos; 2],
}

impl LosLookup {
    /// The distribution for `key` in `unit`. The flag is `false` when the unit's default had to stand in.
    pub fn get(&self, unit: Unit, key: LosKey) -> (&LosDistribution, bool) {
        let table = &self.units[unit.index()];
        match table.entries.get(&key) {
            Some(distribution) => (distribution, true),
            None => (&table.default, false),
        }
    }
}

/// Discharge destination distributions by unit and class.
#[derive(Debug, Clone)]
pub struct DischargeLookup {
    units: [BTreeMap<PatientClass, DestinationDistribution>; 2],
}

impl DischargeLookup {
    pub fn get(&self, unit: Unit, class: PatientClass) -> Option<&DestinationDistribution> {
        self.units[unit.index()].get(&class)
    }

    /// Every class must have a table for each unit it can reach.
    fn check_coverage(&self, streams: &[ArrivalSource]) -> Result<(), ConfigError> {
        let mut reaches_rehab = BTreeSet::new();
        for stream in streams {
            match stream.unit {
                Unit::Acute => {
                    let acute = self.get(Unit::Acute, stream.class).ok_or(ConfigError::UnknownClass {
                        class: stream.class,
                        unit: Unit::Acute,
                    })?;
                    if acute.probability(Destination::Rehab) > 0.0 {
                        reaches_rehab.insert(stream.class);
                    }
                },
                Unit::Rehab => {
                    reaches_rehab.insert(stream.class);
                },
            }
        }

        for class in reaches_rehab {
            if self.get(Unit::Rehab, class).is_none() {
                return Err(ConfigError::UnknownClass {
                    class,
                    unit: Unit::Rehab,
                });
            }
        }
        Ok(())
    }
}
