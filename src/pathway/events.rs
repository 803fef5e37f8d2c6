use super::{Destination, Patient, PathwayState, Unit};
use crate::resources::BedToken;
use crate::serial::{Event, EventQueue};
use crate::Days;

use ordered_float::OrderedFloat;

/// The arrival generator for one stream. Each firing admits a patient and schedules the next arrival.
#[derive(Debug)]
pub struct PatientArrival {
    stream: usize,
}

impl PatientArrival {
    /// Start the generator for `stream`: the first patient arrives one inter-arrival time after the current clock.
    ///
    /// # Errors
    ///
    /// Only [`Error::BackInTime`](crate::Error::BackInTime), which a non-negative delay cannot produce.
    pub fn schedule(
        stream: usize,
        simulation_state: &mut PathwayState,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        match simulation_state.next_arrival_delay(stream) {
            Some(delay) => event_queue.schedule_with_delay(PatientArrival { stream }, OrderedFloat(delay)),
            None => Ok(()),
        }
    }
}

impl Event<PathwayState, Days> for PatientArrival {
    fn execute(
        &mut self,
        simulation_state: &mut PathwayState,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        simulation_state.admit_arrival(self.stream, event_queue)?;
        Self::schedule(self.stream, simulation_state, event_queue)
    }
}

#[derive(Debug)]
struct Stay {
    unit: Unit,
    patient: Patient,
    token: BedToken,
    exit: Option<Destination>,
}

/// The end of a patient's stay in a unit.
#[derive(Debug)]
pub struct CareComplete {
    stay: Option<Stay>,
}

impl CareComplete {
    pub(crate) fn new(unit: Unit, patient: Patient, token: BedToken, exit: Option<Destination>) -> Self {
        Self {
            stay: Some(Stay {
                unit,
                patient,
                token,
                exit,
            }),
        }
    }
}

impl Event<PathwayState, Days> for CareComplete {
    fn execute(
        &mut self,
        simulation_state: &mut PathwayState,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        // an event only ever runs once, so the stay is always present
        let Some(stay) = self.stay.take() else {
            return Ok(());
        };
        simulation_state.end_care(stay.unit, stay.patient, stay.token, stay.exit, event_queue)
    }
}

/// Daily census. Samples every monitored series, then comes back one day later.
#[derive(Debug)]
pub struct RecordOccupancy;

impl RecordOccupancy {
    pub const INTERVAL_DAYS: f64 = 1.0;
}

impl Event<PathwayState, Days> for RecordOccupancy {
    fn execute(
        &mut self,
        simulation_state: &mut PathwayState,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        simulation_state.record_occupancy();
        event_queue.schedule_with_delay(RecordOccupancy, OrderedFloat(Self::INTERVAL_DAYS))
    }
}
