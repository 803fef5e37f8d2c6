use super::events::CareComplete;
use super::{Destination, LosKey, Patient, PatientClass, PatientStage, Unit};
use crate::config::{ArrivalSource, CompiledScenario, DischargeLookup, LosLookup};
use crate::error::ConfigError;
use crate::policy::{Admission, Beds, PoolStatus};
use crate::resources::BedToken;
use crate::serial::EventQueue;
use crate::statistics::OccupancyRecorder;
use crate::variates::{DestinationDistribution, VariateStream};
use crate::{Days, SimState};

use log::{debug, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tallies kept over a whole run, warm-up included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Arrivals per stream, in configuration order.
    pub arrivals: Vec<u64>,
    pub acute_admissions: u64,
    pub rehab_admissions: u64,
    /// Where patients went on leaving the acute unit.
    pub acute_discharges: BTreeMap<Destination, u64>,
    /// Where patients went on leaving rehabilitation.
    pub rehab_discharges: BTreeMap<Destination, u64>,
    /// Stays sampled from a unit's default entry because their own key was missing.
    pub los_fallbacks: u64,
    /// Patients still waiting for a bed when the run stopped.
    pub waiting_at_end: BTreeMap<Unit, u64>,
}

/// Simulation state for one run of the care pathway.
///
/// Owns the random stream, the beds, the compiled parameter tables and the occupancy recorder. Every event gets
/// exclusive access to it in turn, so nothing here needs locking.
#[derive(Debug)]
pub struct PathwayState {
    variates: VariateStream,
    beds: Beds<Patient>,
    streams: Vec<ArrivalSource>,
    los: LosLookup,
    discharge: DischargeLookup,
    recorder: OccupancyRecorder,
    counters: RunCounters,
    warned_keys: BTreeSet<(Unit, LosKey)>,
    patients_created: u64,
}

impl SimState<Days> for PathwayState {}

impl PathwayState {
    pub fn new(scenario: CompiledScenario) -> Self {
        let counters = RunCounters {
            arrivals: vec![0; scenario.streams.len()],
            ..RunCounters::default()
        };
        for (index, source) in scenario.streams.iter().enumerate() {
            debug!(
                "stream {index}: {} patients for {} every {:.2} days on average",
                source.class,
                source.unit,
                source.inter_arrival.mean_days()
            );
        }
        Self {
            variates: VariateStream::new(scenario.seed),
            beds: Beds::new(&scenario.policy),
            streams: scenario.streams,
            los: scenario.los,
            discharge: scenario.discharge,
            recorder: OccupancyRecorder::new(),
            counters,
            warned_keys: BTreeSet::new(),
            patients_created: 0,
        }
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn beds(&self) -> &Beds<Patient> {
        &self.beds
    }

    pub fn recorder(&self) -> &OccupancyRecorder {
        &self.recorder
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Days until the next arrival on `stream`.
    pub(crate) fn next_arrival_delay(&mut self, stream: usize) -> Option<f64> {
        let source = self.streams.get(stream)?;
        Some(self.variates.inter_arrival(&source.inter_arrival))
    }

    /// A new patient arrives on `stream` and asks for a bed in the stream's unit.
    pub(crate) fn admit_arrival(
        &mut self,
        stream: usize,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        let Some(source) = self.streams.get(stream) else {
            return Ok(());
        };
        let (class, unit) = (source.class, source.unit);
        if let Some(count) = self.counters.arrivals.get_mut(stream) {
            *count += 1;
        }

        let patient = Patient::new(self.patients_created, class, unit);
        self.patients_created += 1;
        debug!(
            "t={:.3} patient {} ({class}) arrives for {unit}",
            event_queue.current_time(),
            patient.id
        );

        self.request_bed(unit, patient, event_queue)
    }

    fn request_bed(
        &mut self,
        unit: Unit,
        mut patient: Patient,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        patient.advance(match unit {
            Unit::Acute => PatientStage::AwaitingAcuteBed,
            Unit::Rehab => PatientStage::AwaitingRehabBed,
        });

        match self.beds.request(unit, patient) {
            Some(admission) => self.begin_care(admission, event_queue),
            None => Ok(()),
        }
    }

    /// A patient has a bed: sample their stay and schedule its end.
    fn begin_care(
        &mut self,
        admission: Admission<Patient>,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        let Admission {
            unit,
            token,
            waiter: mut patient,
        } = admission;

        let (key, exit) = match unit {
            Unit::Acute => {
                self.counters.acute_admissions += 1;
                patient.advance(PatientStage::InAcuteCare);
                if patient.class == PatientClass::Stroke && patient.acute_subtype.is_none() {
                    patient.acute_subtype = Some(self.draw_destination(Unit::Acute, patient.class)?);
                }
                let key = match patient.acute_subtype {
                    Some(subtype) => LosKey::stroke(subtype),
                    None => LosKey::class(patient.class),
                };
                (key, None)
            },
            Unit::Rehab => {
                self.counters.rehab_admissions += 1;
                patient.advance(PatientStage::InRehabCare);
                if patient.class == PatientClass::Stroke {
                    // rehab stays are tabulated by where the patient leaves to
                    let exit = self.draw_destination(Unit::Rehab, patient.class)?;
                    (LosKey::stroke(exit), Some(exit))
                } else {
                    (LosKey::class(patient.class), None)
                }
            },
        };

        let length_of_stay = self.sample_stay(unit, key);
        debug!(
            "t={:.3} patient {} starts {length_of_stay:.2} days in {unit} ({key})",
            event_queue.current_time(),
            patient.id
        );
        event_queue.schedule_with_delay(CareComplete::new(unit, patient, token, exit), OrderedFloat(length_of_stay))
    }

    fn sample_stay(&mut self, unit: Unit, key: LosKey) -> f64 {
        let (distribution, exact) = self.los.get(unit, key);
        if !exact {
            self.counters.los_fallbacks += 1;
            if self.warned_keys.insert((unit, key)) {
                warn!("no {unit} length of stay for `{key}`; using the unit's default entry");
            }
        }
        self.variates.length_of_stay(distribution)
    }

    /// A stay is over: free the bed, let the queue move, then send the patient on.
    pub(crate) fn end_care(
        &mut self,
        unit: Unit,
        mut patient: Patient,
        token: BedToken,
        exit: Option<Destination>,
        event_queue: &mut EventQueue<PathwayState, Days>,
    ) -> crate::Result {
        if let Some(next) = self.beds.release(unit, token)? {
            self.begin_care(next, event_queue)?;
        }

        match unit {
            Unit::Acute => {
                let destination = match patient.acute_subtype {
                    Some(subtype) => subtype,
                    None => self.draw_destination(Unit::Acute, patient.class)?,
                };
                *self.counters.acute_discharges.entry(destination).or_default() += 1;

                if destination == Destination::Rehab {
                    self.request_bed(Unit::Rehab, patient, event_queue)
                } else {
                    patient.advance(PatientStage::Discharged);
                    debug!(
                        "t={:.3} patient {} (admitted to {}) leaves acute care to {destination:?}",
                        event_queue.current_time(),
                        patient.id,
                        patient.origin
                    );
                    Ok(())
                }
            },
            Unit::Rehab => {
                let destination = match exit {
                    Some(exit) => exit,
                    None => self.draw_destination(Unit::Rehab, patient.class)?,
                };
                *self.counters.rehab_discharges.entry(destination).or_default() += 1;
                patient.advance(PatientStage::Discharged);
                debug!(
                    "t={:.3} patient {} (admitted to {}) leaves rehab to {destination:?}",
                    event_queue.current_time(),
                    patient.id,
                    patient.origin
                );
                Ok(())
            },
        }
    }

    fn draw_destination(&mut self, unit: Unit, class: PatientClass) -> crate::Result<Destination> {
        let distribution: &DestinationDistribution = self
            .discharge
            .get(unit, class)
            .ok_or(ConfigError::UnknownClass { class, unit })?;
        Ok(self.variates.destination(distribution))
    }

    /// Append today's census for each unit and occupancy for each pool.
    pub(crate) fn record_occupancy(&mut self) {
        let Self { recorder, beds, .. } = self;
        for unit in Unit::ALL {
            recorder.record(unit.label(), beds.census(unit));
        }
        for (name, occupancy) in beds.pool_occupancy() {
            recorder.record(&format!("pool:{name}"), occupancy);
        }
        recorder.tick();
    }

    /// Close the books: note who is still waiting and hand back the recorder and tallies.
    pub(crate) fn finish(mut self) -> (OccupancyRecorder, RunCounters, Vec<PoolStatus>) {
        for unit in Unit::ALL {
            self.counters
                .waiting_at_end
                .insert(unit, self.beds.waiting_for(unit) as u64);
        }
        let status = self.beds.status();
        (self.recorder, self.counters, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArrivalStream, DischargeTables, LosTables, ScenarioConfig, UnitLosTable};
    use crate::policy::BedPolicy;
    use crate::variates::LosParams;

    fn stroke_state(acute_beds: u32) -> PathwayState {
        let stays = |mean: f64| UnitLosTable {
            default: LosParams::MeanStdev { mean, stdev: mean / 2.0 },
            entries: BTreeMap::new(),
        };
        let config = ScenarioConfig {
            seed: 41,
            horizon_days: 100,
            warm_up_days: 10,
            policy: BedPolicy::Dedicated {
                acute_beds,
                rehab_beds: 2,
            },
            arrivals: vec![ArrivalStream {
                class: PatientClass::Stroke,
                unit: Unit::Acute,
                mean_interarrival_days: 0.5,
            }],
            length_of_stay: LosTables {
                acute: stays(6.0),
                rehab: stays(18.0),
            },
            discharge: DischargeTables {
                acute: BTreeMap::from([(
                    PatientClass::Stroke,
                    BTreeMap::from([(Destination::Rehab, 0.4), (Destination::Esd, 0.4), (Destination::Other, 0.2)]),
                )]),
                rehab: BTreeMap::from([(PatientClass::Stroke, BTreeMap::from([(Destination::Other, 1.0)]))]),
            },
        };
        PathwayState::new(config.compile().expect("scenario should compile"))
    }

    #[test]
    fn waiting_stroke_patient_draws_nothing() {
        let mut state = stroke_state(0);
        let mut event_queue = EventQueue::new(OrderedFloat(0.0));
        for _ in 0..3 {
            state.admit_arrival(0, &mut event_queue).unwrap();
        }
        assert_eq!(3, state.beds().waiting_for(Unit::Acute));
        assert_eq!(0, state.counters().acute_admissions);
        assert!(event_queue.is_empty());

        // the stream is untouched, so the next draw is the seed's first
        let mut fresh = VariateStream::new(41);
        let expected = fresh.inter_arrival(&state.streams[0].inter_arrival);
        assert_eq!(Some(expected), state.next_arrival_delay(0));
    }

    #[test]
    fn stroke_subtype_is_drawn_on_taking_an_acute_bed() {
        let mut state = stroke_state(1);
        let mut event_queue = EventQueue::new(OrderedFloat(0.0));
        state.admit_arrival(0, &mut event_queue).unwrap();
        state.admit_arrival(0, &mut event_queue).unwrap();
        assert_eq!(1, state.counters().acute_admissions);
        assert_eq!(1, state.beds().waiting_for(Unit::Acute));
        assert_eq!(1, event_queue.len());

        // the admitted patient consumed a subtype draw then a stay draw; the queued one consumed nothing
        let mut fresh = VariateStream::new(41);
        let subtype = fresh.destination(state.discharge.get(Unit::Acute, PatientClass::Stroke).unwrap());
        fresh.length_of_stay(state.los.get(Unit::Acute, LosKey::stroke(subtype)).0);
        let expected = fresh.inter_arrival(&state.streams[0].inter_arrival);
        assert_eq!(Some(expected), state.next_arrival_delay(0));
    }
}
