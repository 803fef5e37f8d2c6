use crate::pathway::{PatientClass, Unit};

/// Everything that can stop a run.
///
/// [`BackInTime`] and [`BadExecution`] come from the event engine: the first means an event asked the [`EventQueue`]
/// for a time already past, almost always a missing offset at the call site, and the second carries an error raised
/// inside an event through [`Simulation::run()`] untouched. [`Config`] is a scenario rejected before the clock
/// started. [`ForeignToken`] is a bed handed back to a pool that never issued it.
///
/// [`EventQueue`]: crate::serial::EventQueue
/// [`Simulation::run()`]: crate::serial::Simulation::run
/// [`BackInTime`]: Error::BackInTime
/// [`BadExecution`]: Error::BadExecution
/// [`Config`]: Error::Config
/// [`ForeignToken`]: Error::ForeignToken
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event queue rejected an event that would have been scheduled for a time that has already passed.
    #[error("event execution time is less than current simulation time")]
    BackInTime,
    /// An event failed. The original error is available through [`std::error::Error::source()`].
    #[error("error while executing event: {0}")]
    BadExecution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    /// The scenario configuration was rejected during setup.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A token was released into a pool that did not grant it, or into a pool with no beds in use.
    #[error("bed token does not belong to pool `{pool}`")]
    ForeignToken {
        /// Name of the pool that refused the token.
        pool: String,
    },
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::BackInTime, Error::BackInTime) => true,
            (Error::BadExecution(e1), Error::BadExecution(e2)) => {
                let e1: *const dyn std::error::Error = e1.as_ref();
                let e2: *const dyn std::error::Error = e2.as_ref();
                std::ptr::eq(e1, e2)
            },
            (Error::Config(c1), Error::Config(c2)) => c1 == c2,
            (Error::ForeignToken { pool: p1 }, Error::ForeignToken { pool: p2 }) => p1 == p2,
            _ => false,
        }
    }
}

/// Problems with a scenario's configuration.
///
/// All of these are fatal and are reported before the simulation clock starts. None of them are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A mean used for sampling was zero, negative or not finite.
    #[error("{what} must be a positive, finite number of days (got {value})")]
    NonPositiveMean {
        /// Which parameter was rejected.
        what: String,
        /// The offending value.
        value: f64,
    },
    /// Length-of-stay parameters that cannot describe a log-normal distribution.
    #[error("invalid length-of-stay parameters for {unit} `{key}`: {reason}")]
    InvalidLengthOfStay {
        /// Unit whose table holds the entry.
        unit: Unit,
        /// Table key, or `default`.
        key: String,
        /// Why the parameters were rejected.
        reason: String,
    },
    /// A discharge probability below zero.
    #[error("negative probability {probability} in {unit} discharge distribution for {class}")]
    NegativeProbability {
        /// Unit the patient is leaving.
        unit: Unit,
        /// Patient class of the distribution.
        class: PatientClass,
        /// The offending value.
        probability: f64,
    },
    /// Discharge probabilities that do not add up to one.
    #[error("{unit} discharge distribution for {class} sums to {sum}, expected 1")]
    ProbabilitySum {
        /// Unit the patient is leaving.
        unit: Unit,
        /// Patient class of the distribution.
        class: PatientClass,
        /// Actual total.
        sum: f64,
    },
    /// A discharge distribution with no destinations.
    #[error("{unit} discharge distribution for {class} has no destinations")]
    EmptyDistribution {
        /// Unit the patient is leaving.
        unit: Unit,
        /// Patient class of the distribution.
        class: PatientClass,
    },
    /// A class reaches a unit for which no discharge distribution is configured.
    #[error("patient class {class} reaches the {unit} unit but has no discharge distribution there")]
    UnknownClass {
        /// The unconfigured class.
        class: PatientClass,
        /// Unit missing the entry.
        unit: Unit,
    },
    /// A rehabilitation discharge table that routes patients back into rehabilitation.
    #[error("rehab discharge distribution for {class} sends patients back to rehab")]
    RehabToRehab {
        /// Patient class of the distribution.
        class: PatientClass,
    },
    /// The run horizon was zero.
    #[error("run horizon must be a positive number of days (got {0})")]
    NonPositiveHorizon(u32),
    /// The warm-up would discard every sample.
    #[error("warm-up of {warm_up_days} days leaves no samples in a {horizon_days}-day run")]
    WarmUpTooLong {
        /// Configured warm-up.
        warm_up_days: u32,
        /// Configured horizon.
        horizon_days: u32,
    },
    /// A distribution constructor refused its parameters.
    #[error("could not build {what} distribution: {reason}")]
    Distribution {
        /// Which distribution failed.
        what: String,
        /// Message from the constructor.
        reason: String,
    },
}

/// [`std::result::Result`]`<T, `[`carepath::Error`]`>`, defaulting to `T = ()`.
///
/// A type alias that simplifies the signatures of various functions in carepath, most notably
/// [`Event::execute()`].
///
/// [`carepath::Error`]: Error
/// [`Event::execute()`]: crate::serial::Event::execute
pub type Result<T = ()> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("ward {0} flooded")]
    struct WardFlooded(u32);

    #[test]
    fn bad_execution_exposes_source() {
        let error = Error::BadExecution(Box::new(WardFlooded(4)));
        let source = error.source().expect("bad execution should carry a source");
        assert_eq!("ward 4 flooded", source.to_string());
        assert_eq!("error while executing event: ward 4 flooded", error.to_string());
    }

    #[test]
    fn config_errors_convert_and_compare() {
        let error: Error = ConfigError::NonPositiveHorizon(0).into();
        assert_eq!(Error::Config(ConfigError::NonPositiveHorizon(0)), error);
        assert_ne!(Error::BackInTime, error);
    }

    #[test]
    fn bad_execution_equality_is_identity() {
        let first = Error::BadExecution(Box::new(WardFlooded(1)));
        let second = Error::BadExecution(Box::new(WardFlooded(1)));
        assert_eq!(first, first);
        assert_ne!(first, second);
    }
}
