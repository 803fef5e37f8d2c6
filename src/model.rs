//! One replication of the care pathway, from configuration to report.

use crate::config::ScenarioConfig;
use crate::error::ConfigError;
use crate::pathway::{PathwayState, PatientArrival, RecordOccupancy, RunCounters, Unit};
use crate::policy::{BedPolicy, PoolStatus};
use crate::serial::Simulation;
use crate::statistics::{DelayTable, OccupancyDistribution, Summary};
use crate::Days;

use log::info;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A validated scenario with its simulation set up at day zero.
///
/// ```
/// # use carepath::{PathwaySimulation, ScenarioConfig};
/// # fn report(config: ScenarioConfig) -> carepath::Result {
/// let report = PathwaySimulation::new(&config)?.run()?;
/// if let Some(acute) = report.unit(carepath::pathway::Unit::Acute) {
///     println!("mean acute census {:.1}", acute.summary.mean);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PathwaySimulation {
    simulation: Simulation<PathwayState, Days>,
    seed: u64,
    horizon_days: u32,
    warm_up_days: u32,
    policy: BedPolicy,
}

impl PathwaySimulation {
    /// Validate `config` and build the initial state.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] found by [`ScenarioConfig::compile()`].
    pub fn new(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        let scenario = config.compile()?;
        let seed = scenario.seed();
        let horizon_days = scenario.horizon_days();
        let warm_up_days = scenario.warm_up_days();
        let policy = *scenario.policy();

        let state = PathwayState::new(scenario);
        Ok(Self {
            simulation: Simulation::new(state, OrderedFloat(0.0)),
            seed,
            horizon_days,
            warm_up_days,
            policy,
        })
    }

    /// Run to the horizon and summarise the occupancy after the warm-up.
    ///
    /// # Errors
    ///
    /// Errors raised while executing events. With a validated configuration these indicate a bug, not bad input.
    pub fn run(mut self) -> crate::Result<RunReport> {
        info!(
            "seed {}: running {} days ({} warm-up) with {} beds",
            self.seed,
            self.horizon_days,
            self.warm_up_days,
            self.policy.total_beds()
        );

        // the census is taken before anything else happens on each day
        self.simulation.schedule(RecordOccupancy, OrderedFloat(0.0))?;
        let (state, event_queue) = self.simulation.parts_mut();
        for stream in 0..state.stream_count() {
            PatientArrival::schedule(stream, state, event_queue)?;
        }

        self.simulation.run_until(OrderedFloat(f64::from(self.horizon_days)))?;

        let (recorder, counters, pools) = self.simulation.into_state().finish();
        let series = recorder
            .finish(self.warm_up_days as usize)
            .into_iter()
            .map(|(label, samples)| (label, SeriesReport::new(samples)))
            .collect();

        let report = RunReport {
            seed: self.seed,
            horizon_days: self.horizon_days,
            warm_up_days: self.warm_up_days,
            series,
            counters,
            pools,
        };
        info!(
            "seed {}: {} arrivals, {} still waiting at the horizon",
            report.seed,
            report.counters.arrivals.iter().sum::<u64>(),
            report.counters.waiting_at_end.values().sum::<u64>()
        );
        Ok(report)
    }
}

/// Statistics for one monitored series, warm-up excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub samples: Vec<u32>,
    pub summary: Summary,
    pub distribution: OccupancyDistribution,
    pub delay_table: DelayTable,
}

impl SeriesReport {
    pub fn new(samples: Vec<u32>) -> Self {
        let distribution = OccupancyDistribution::from_samples(&samples);
        Self {
            summary: Summary::of(&samples),
            delay_table: DelayTable::new(&distribution),
            distribution,
            samples,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub horizon_days: u32,
    pub warm_up_days: u32,
    /// Keyed by `acute`, `rehab` and `pool:<name>`.
    pub series: BTreeMap<String, SeriesReport>,
    pub counters: RunCounters,
    /// Pools as they stood at the horizon.
    pub pools: Vec<PoolStatus>,
}

impl RunReport {
    /// Census of a unit: patients in care there, whichever pool their bed came from.
    pub fn unit(&self, unit: Unit) -> Option<&SeriesReport> {
        self.series.get(unit.label())
    }

    /// Occupancy of the pool called `name`.
    pub fn pool(&self, name: &str) -> Option<&SeriesReport> {
        self.series.get(&format!("pool:{name}"))
    }

    /// Probability that a patient of `unit` would be delayed if the unit had `beds` beds of its own.
    pub fn delay_probability(&self, unit: Unit, beds: usize) -> Option<f64> {
        self.unit(unit).map(|series| series.distribution.delay_probability(beds))
    }
}
