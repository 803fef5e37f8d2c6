//! Patient flow along the pathway: arrival, acute stay, optional rehabilitation stay, discharge.
//!
//! Each patient is a chain of events. An arrival asks for a bed; if none is free the patient waits in the pool's
//! queue and is picked up again when a bed is released. Holding a bed schedules a [`CareComplete`] one length of stay
//! later, which frees the bed and either discharges the patient or sends them on to rehabilitation.

mod events;
mod patient;
mod state;

pub use events::{CareComplete, PatientArrival, RecordOccupancy};
pub use patient::{Destination, LosKey, Patient, PatientClass, PatientStage, Unit};
pub use state::{PathwayState, RunCounters};
