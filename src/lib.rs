//! # Overview
//!
//! carepath simulates bed occupancy along a two-stage care pathway: patients arrive at an acute unit, some move on to
//! a rehabilitation unit, and everyone is eventually discharged. Its purpose is capacity planning. Run a scenario long
//! enough to reach steady state, then read off how often a patient would find every bed taken for each candidate bed
//! count.
//!
//! The crate is layered:
//!
//! * [`serial`] is a small discrete-event engine. An [`EventQueue`] orders events by execution time and insertion
//!   sequence, and a [`Simulation`] hands each event exclusive access to the state in turn.
//! * [`variates`] draws inter-arrival times, lengths of stay and discharge destinations from one seeded stream, so a
//!   seed fully determines a run.
//! * [`resources`] and [`policy`] model the beds. A [`ResourcePool`] serves waiting requests by priority and then
//!   arrival order, and a [`BedPolicy`] lays pools out as dedicated, fully pooled or partially pooled.
//! * [`pathway`] is the patient state machine built from those pieces, and [`statistics`] turns the daily census into
//!   a distribution and a delay table.
//! * [`model`] ties it together: [`PathwaySimulation::run()`] takes a [`ScenarioConfig`] to a [`RunReport`].
//!
//! Simulated time is measured in [`Days`], an [`OrderedFloat`] so that it can key the event queue.
//!
//! [`EventQueue`]: serial::EventQueue
//! [`Simulation`]: serial::Simulation
//! [`ResourcePool`]: resources::ResourcePool
//! [`BedPolicy`]: policy::BedPolicy
//! [`OrderedFloat`]: ordered_float::OrderedFloat

pub mod config;
mod error;
mod generic_parameters;
pub mod model;
pub mod pathway;
pub mod policy;
pub mod resources;
pub mod serial;
pub mod statistics;
pub mod variates;

pub use config::ScenarioConfig;
pub use error::{ConfigError, Error, Result};
pub use generic_parameters::{Days, SimState, SimTime};
pub use model::{PathwaySimulation, RunReport, SeriesReport};
