//! Random variates for arrivals, lengths of stay and discharge routing.
//!
//! Every draw in a run comes from one [`VariateStream`], so fixing the seed fixes the run. Distributions are built
//! and checked once while a scenario is compiled; sampling itself never fails.

use crate::error::ConfigError;
use crate::pathway::{Destination, PatientClass, Unit};

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shortest stay a patient can be assigned, in days. Log-normal draws below this are raised to it.
pub const MIN_LOS_DAYS: f64 = 0.1;

/// Allowed gap between a discharge distribution's total and one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// The single seeded random stream shared by every process in a run.
#[derive(Debug, Clone)]
pub struct VariateStream {
    rng: Pcg64,
}

impl VariateStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Days until the next arrival on a stream.
    pub fn inter_arrival(&mut self, distribution: &InterArrival) -> f64 {
        distribution.distribution.sample(&mut self.rng)
    }

    /// Days a patient will occupy a bed, never shorter than [`MIN_LOS_DAYS`].
    pub fn length_of_stay(&mut self, distribution: &LosDistribution) -> f64 {
        distribution.distribution.sample(&mut self.rng).max(MIN_LOS_DAYS)
    }

    /// Pick a discharge destination.
    pub fn destination(&mut self, distribution: &DestinationDistribution) -> Destination {
        distribution.pick(self.rng.random::<f64>())
    }
}

/// Exponential inter-arrival times with a given mean, giving Poisson arrivals.
#[derive(Debug, Clone)]
pub struct InterArrival {
    mean_days: f64,
    distribution: Exp<f64>,
}

impl InterArrival {
    /// # Errors
    ///
    /// [`ConfigError::NonPositiveMean`] unless `mean_days` is finite and strictly positive.
    pub fn new(mean_days: f64) -> Result<Self, ConfigError> {
        if !(mean_days.is_finite() && mean_days > 0.0) {
            return Err(ConfigError::NonPositiveMean {
                what: "mean inter-arrival time".into(),
                value: mean_days,
            });
        }
        let distribution = Exp::new(1.0 / mean_days).map_err(|e| ConfigError::Distribution {
            what: "exponential".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            mean_days,
            distribution,
        })
    }

    pub fn mean_days(&self) -> f64 {
        self.mean_days
    }
}

/// Parameters of a log-normal length of stay, in either of two equivalent forms.
///
/// `LogNormal` gives `mu` and `sigma` of the underlying normal. `MeanStdev` gives the mean and standard deviation of
/// the stay itself and is converted with `sigma = sqrt(ln(1 + (stdev / mean)^2))`, `mu = ln(mean) - sigma^2 / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LosParams {
    LogNormal { mu: f64, sigma: f64 },
    MeanStdev { mean: f64, stdev: f64 },
}

impl LosParams {
    /// The `(mu, sigma)` of the underlying normal distribution.
    pub fn to_mu_sigma(&self) -> (f64, f64) {
        match *self {
            LosParams::LogNormal { mu, sigma } => (mu, sigma),
            LosParams::MeanStdev { mean, stdev } => {
                let sigma = (1.0 + (stdev / mean).powi(2)).ln().sqrt();
                let mu = mean.ln() - sigma * sigma / 2.0;
                (mu, sigma)
            },
        }
    }

    /// Explain why these parameters cannot describe a log-normal distribution, if they can't.
    pub fn problem(&self) -> Option<String> {
        match *self {
            LosParams::LogNormal { mu, sigma } => {
                if !mu.is_finite() {
                    Some(format!("mu must be finite (got {mu})"))
                } else if !(sigma.is_finite() && sigma >= 0.0) {
                    Some(format!("sigma must be finite and non-negative (got {sigma})"))
                } else {
                    None
                }
            },
            LosParams::MeanStdev { mean, stdev } => {
                if !(mean.is_finite() && mean > 0.0) {
                    Some(format!("mean must be finite and positive (got {mean})"))
                } else if !(stdev.is_finite() && stdev >= 0.0) {
                    Some(format!("stdev must be finite and non-negative (got {stdev})"))
                } else {
                    None
                }
            },
        }
    }
}

/// A ready-to-sample length-of-stay distribution.
#[derive(Debug, Clone)]
pub struct LosDistribution {
    params: LosParams,
    distribution: LogNormal<f64>,
}

impl LosDistribution {
    /// # Errors
    ///
    /// [`ConfigError::Distribution`] if the parameters are not finite or the spread is negative.
    pub fn new(params: LosParams) -> Result<Self, ConfigError> {
        if let Some(reason) = params.problem() {
            return Err(ConfigError::Distribution {
                what: "log-normal".into(),
                reason,
            });
        }
        let (mu, sigma) = params.to_mu_sigma();
        let distribution = LogNormal::new(mu, sigma).map_err(|e| ConfigError::Distribution {
            what: "log-normal".into(),
            reason: e.to_string(),
        })?;
        Ok(Self { params, distribution })
    }

    pub fn params(&self) -> &LosParams {
        &self.params
    }
}

/// Where patients of one class go on leaving one unit.
///
/// Entries keep the order of [`Destination`], so the same uniform draw always maps to the same destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationDistribution {
    entries: Vec<(Destination, f64)>,
}

impl DestinationDistribution {
    /// Check and freeze a probability table.
    ///
    /// # Errors
    ///
    /// Empty tables, negative or non-finite entries, and totals further than [`PROBABILITY_TOLERANCE`] from one are
    /// all rejected.
    pub fn new(unit: Unit, class: PatientClass, table: &BTreeMap<Destination, f64>) -> Result<Self, ConfigError> {
        if table.is_empty() {
            return Err(ConfigError::EmptyDistribution { unit, class });
        }
        if let Some(&probability) = table.values().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(ConfigError::NegativeProbability {
                unit,
                class,
                probability,
            });
        }
        let sum: f64 = table.values().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigError::ProbabilitySum { unit, class, sum });
        }

        Ok(Self {
            entries: table.iter().map(|(d, p)| (*d, *p)).collect(),
        })
    }

    /// Probability assigned to `destination`, zero if absent.
    pub fn probability(&self, destination: Destination) -> f64 {
        self.entries
            .iter()
            .find(|(d, _)| *d == destination)
            .map_or(0.0, |(_, p)| *p)
    }

    /// Map a uniform draw in `[0, 1)` onto a destination.
    fn pick(&self, draw: f64) -> Destination {
        let mut cumulative = 0.0;
        for (destination, probability) in &self.entries {
            cumulative += probability;
            if draw < cumulative {
                return *destination;
            }
        }

        // rounding left the total a hair under one; the draw belongs to the last reachable entry
        self.entries
            .iter()
            .rev()
            .find(|(_, p)| *p > 0.0)
            .or_else(|| self.entries.last())
            .map_or(Destination::Other, |(d, _)| *d)
    }
}

/// Draw one exponential inter-arrival time.
///
/// # Errors
///
/// [`ConfigError::NonPositiveMean`] unless `mean_days` is finite and strictly positive.
pub fn sample_inter_arrival<R: Rng + ?Sized>(rng: &mut R, mean_days: f64) -> Result<f64, ConfigError> {
    Ok(InterArrival::new(mean_days)?.distribution.sample(rng))
}

/// Draw one length of stay, floored at [`MIN_LOS_DAYS`].
///
/// # Errors
///
/// [`ConfigError::Distribution`] if the parameters do not describe a log-normal distribution.
pub fn sample_los<R: Rng + ?Sized>(rng: &mut R, params: &LosParams) -> Result<f64, ConfigError> {
    let distribution = LosDistribution::new(*params)?;
    Ok(distribution.distribution.sample(rng).max(MIN_LOS_DAYS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_acute() -> BTreeMap<Destination, f64> {
        BTreeMap::from([
            (Destination::Rehab, 0.24),
            (Destination::Esd, 0.13),
            (Destination::Other, 0.63),
        ])
    }

    #[test]
    fn mean_stdev_conversion_matches_closed_form() {
        let (mu, sigma) = LosParams::MeanStdev { mean: 7.4, stdev: 8.6 }.to_mu_sigma();
        let expected_sigma = (1.0 + (8.6f64 / 7.4).powi(2)).ln().sqrt();
        assert!((sigma - expected_sigma).abs() < 1e-12);
        assert!((mu - (7.4f64.ln() - expected_sigma.powi(2) / 2.0)).abs() < 1e-12);

        // the log-normal mean exp(mu + sigma^2 / 2) recovers the input mean
        assert!(((mu + sigma * sigma / 2.0).exp() - 7.4).abs() < 1e-9);
    }

    #[test]
    fn non_positive_means_are_rejected() {
        assert!(matches!(InterArrival::new(0.0), Err(ConfigError::NonPositiveMean { .. })));
        assert!(matches!(InterArrival::new(-3.0), Err(ConfigError::NonPositiveMean { .. })));
        assert!(matches!(InterArrival::new(f64::NAN), Err(ConfigError::NonPositiveMean { .. })));
        assert!(LosDistribution::new(LosParams::MeanStdev { mean: 0.0, stdev: 1.0 }).is_err());
        assert!(LosDistribution::new(LosParams::LogNormal { mu: 1.0, sigma: -0.5 }).is_err());
    }

    #[test]
    fn lengths_of_stay_respect_floor() {
        let mut stream = VariateStream::new(3);
        // median of e^-6 days, far below the floor
        let tiny = LosDistribution::new(LosParams::LogNormal { mu: -6.0, sigma: 0.1 }).unwrap();
        for _ in 0..1_000 {
            assert!(stream.length_of_stay(&tiny) >= MIN_LOS_DAYS);
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let arrivals = InterArrival::new(2.5).unwrap();
        let mut first = VariateStream::new(99);
        let mut second = VariateStream::new(99);
        let a: Vec<f64> = (0..50).map(|_| first.inter_arrival(&arrivals)).collect();
        let b: Vec<f64> = (0..50).map(|_| second.inter_arrival(&arrivals)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn inter_arrival_mean_is_close() {
        let arrivals = InterArrival::new(4.0).unwrap();
        let mut stream = VariateStream::new(2024);
        let n = 200_000;
        let mean = (0..n).map(|_| stream.inter_arrival(&arrivals)).sum::<f64>() / n as f64;
        assert!((mean - 4.0).abs() < 0.05, "sample mean {mean} too far from 4.0");
    }

    #[test]
    fn destination_table_must_sum_to_one() {
        let mut table = stroke_acute();
        assert!(DestinationDistribution::new(Unit::Acute, PatientClass::Stroke, &table).is_ok());

        table.insert(Destination::Other, 0.5);
        assert!(matches!(
            DestinationDistribution::new(Unit::Acute, PatientClass::Stroke, &table),
            Err(ConfigError::ProbabilitySum { .. })
        ));

        table.insert(Destination::Other, -0.1);
        assert!(matches!(
            DestinationDistribution::new(Unit::Acute, PatientClass::Stroke, &table),
            Err(ConfigError::NegativeProbability { .. })
        ));

        assert!(matches!(
            DestinationDistribution::new(Unit::Rehab, PatientClass::Tia, &BTreeMap::new()),
            Err(ConfigError::EmptyDistribution { .. })
        ));
    }

    #[test]
    fn destination_pick_follows_cumulative_order() {
        let distribution = DestinationDistribution::new(Unit::Acute, PatientClass::Stroke, &stroke_acute()).unwrap();
        assert_eq!(Destination::Rehab, distribution.pick(0.0));
        assert_eq!(Destination::Rehab, distribution.pick(0.2399));
        assert_eq!(Destination::Esd, distribution.pick(0.30));
        assert_eq!(Destination::Other, distribution.pick(0.999_999));
        assert_eq!(Destination::Other, distribution.pick(1.0));
        assert_eq!(0.13, distribution.probability(Destination::Esd));
    }

    #[test]
    fn destination_frequencies_match_probabilities() {
        let distribution = DestinationDistribution::new(Unit::Acute, PatientClass::Stroke, &stroke_acute()).unwrap();
        let mut stream = VariateStream::new(5);
        let n = 100_000;
        let rehab = (0..n)
            .filter(|_| stream.destination(&distribution) == Destination::Rehab)
            .count();
        let share = rehab as f64 / n as f64;
        assert!((share - 0.24).abs() < 0.01, "rehab share {share} too far from 0.24");
    }

    #[test]
    fn one_off_samplers_validate() {
        let mut rng = Pcg64::seed_from_u64(1);
        assert!(sample_inter_arrival(&mut rng, 1.0).unwrap() >= 0.0);
        assert!(sample_inter_arrival(&mut rng, 0.0).is_err());
        assert!(sample_los(&mut rng, &LosParams::MeanStdev { mean: 3.0, stdev: 1.0 }).unwrap() >= MIN_LOS_DAYS);
        assert!(sample_los(&mut rng, &LosParams::LogNormal { mu: f64::INFINITY, sigma: 1.0 }).is_err());
    }
}
