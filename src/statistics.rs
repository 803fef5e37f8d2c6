//! Occupancy recording and the steady-state statistics derived from it.
//!
//! The recorder appends one sample per monitored series per simulated day. Once the run ends the first `warm_up`
//! samples of every series are dropped and the rest is turned into a distribution:
//!
//! * the PDF is the share of days spent at each occupancy from zero up to the observed maximum,
//! * the CDF is its running sum,
//! * the probability that a patient is delayed when `n` beds exist is `1 - CDF(n - 1)`, the share of days on which all
//!   `n` beds would already be full.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily occupancy samples for one monitored unit or pool. Append-only while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySeries {
    samples: Vec<u32>,
}

impl OccupancySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, occupancy: u32) {
        self.samples.push(occupancy);
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    /// The series without its first `warm_up` samples. Empty if the warm-up swallows everything.
    pub fn trimmed(&self, warm_up: usize) -> &[u32] {
        self.samples.get(warm_up..).unwrap_or(&[])
    }
}

/// Named occupancy series, sampled once per tick.
#[derive(Debug, Clone, Default)]
pub struct OccupancyRecorder {
    series: BTreeMap<String, OccupancySeries>,
    ticks: usize,
}

impl OccupancyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample to the series called `label`, creating it if needed.
    pub fn record(&mut self, label: &str, occupancy: usize) {
        let occupancy = u32::try_from(occupancy).unwrap_or(u32::MAX);
        match self.series.get_mut(label) {
            Some(series) => series.push(occupancy),
            None => {
                let mut series = OccupancySeries::new();
                series.push(occupancy);
                self.series.insert(label.to_string(), series);
            },
        }
    }

    /// Count a completed tick.
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn series(&self, label: &str) -> Option<&OccupancySeries> {
        self.series.get(label)
    }

    /// Freeze the recorder and drop the first `warm_up` samples of every series.
    pub fn finish(self, warm_up: usize) -> BTreeMap<String, Vec<u32>> {
        self.series
            .into_iter()
            .map(|(label, series)| {
                let trimmed = series.trimmed(warm_up).to_vec();
                (label, trimmed)
            })
            .collect()
    }
}

/// Empirical occupancy distribution over `0..=max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyDistribution {
    pdf: Vec<f64>,
    cdf: Vec<f64>,
}

impl OccupancyDistribution {
    pub fn from_samples(samples: &[u32]) -> Self {
        let Some(&max) = samples.iter().max() else {
            return Self {
                pdf: Vec::new(),
                cdf: Vec::new(),
            };
        };

        let mut counts = vec![0usize; max as usize + 1];
        for &sample in samples {
            counts[sample as usize] += 1;
        }

        // the CDF comes from running counts, not summed shares, so it ends at exactly one
        let total = samples.len() as f64;
        let pdf = counts.iter().map(|&count| count as f64 / total).collect();
        let cdf = counts
            .iter()
            .scan(0usize, |running, &count| {
                *running += count;
                Some(*running as f64 / total)
            })
            .collect();
        Self { pdf, cdf }
    }

    /// Share of samples at each occupancy, indexed by occupancy.
    pub fn pdf(&self) -> &[f64] {
        &self.pdf
    }

    /// Share of samples at or below each occupancy.
    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    /// Highest occupancy observed, `None` for an empty sample.
    pub fn max(&self) -> Option<usize> {
        self.pdf.len().checked_sub(1)
    }

    /// Probability that an arrival finds all of `beds` beds occupied.
    ///
    /// Always 1 for zero beds. Bed counts beyond anything observed give 0.
    pub fn delay_probability(&self, beds: usize) -> f64 {
        if beds == 0 {
            return 1.0;
        }
        match self.cdf.get(beds - 1) {
            Some(cdf) => (1.0 - cdf).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

/// Mean, population standard deviation and maximum of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub stdev: f64,
    pub max: u32,
}

impl Summary {
    /// Zeroes for an empty sample.
    pub fn of(samples: &[u32]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                stdev: 0.0,
                max: 0,
            };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&s| (f64::from(s) - mean).powi(2))
            .sum::<f64>()
            / n;
        Self {
            mean,
            stdev: variance.sqrt(),
            max: samples.iter().copied().max().unwrap_or(0),
        }
    }
}

/// "One in N patients delayed", the reciprocal of a delay probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneInN {
    /// Nobody was delayed.
    Never,
    Every(u64),
}

/// `round(1 / probability)`, or [`OneInN::Never`] for a zero probability.
pub fn one_in_n(probability: f64) -> OneInN {
    if probability <= 0.0 || !probability.is_finite() {
        return OneInN::Never;
    }
    OneInN::Every((1.0 / probability).round() as u64)
}

impl std::fmt::Display for OneInN {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OneInN::Never => f.write_str("never"),
            OneInN::Every(n) => write!(f, "1 in {n}"),
        }
    }
}

/// Delay probability for one candidate bed count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRow {
    pub beds: usize,
    pub probability: f64,
    pub one_in: OneInN,
}

/// Delay probabilities for every bed count from zero to one past the observed maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayTable {
    rows: Vec<DelayRow>,
}

impl DelayTable {
    pub fn new(distribution: &OccupancyDistribution) -> Self {
        let last = distribution.max().map_or(0, |max| max + 1);
        let rows = (0..=last)
            .map(|beds| {
                let probability = distribution.delay_probability(beds);
                DelayRow {
                    beds,
                    probability,
                    one_in: one_in_n(probability),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[DelayRow] {
        &self.rows
    }

    /// Row for `beds`, if within the table.
    pub fn get(&self, beds: usize) -> Option<&DelayRow> {
        self.rows.get(beds)
    }

    /// Fewest beds keeping the delay probability at or below `target`.
    pub fn beds_for(&self, target: f64) -> Option<usize> {
        self.rows.iter().find(|row| row.probability <= target).map(|row| row.beds)
    }
}
