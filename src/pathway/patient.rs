use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnosis group a patient arrives with. Fixed for the patient's whole stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientClass {
    Stroke,
    Tia,
    ComplexNeuro,
    Other,
}

impl fmt::Display for PatientClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PatientClass::Stroke => "stroke",
            PatientClass::Tia => "TIA",
            PatientClass::ComplexNeuro => "complex neuro",
            PatientClass::Other => "other",
        };
        f.write_str(label)
    }
}

/// Inpatient stage of the pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Acute stroke unit, the first point of admission.
    Acute,
    /// Rehabilitation unit.
    Rehab,
}

impl Unit {
    pub const ALL: [Unit; 2] = [Unit::Acute, Unit::Rehab];

    /// Lowercase label used for series names.
    pub fn label(self) -> &'static str {
        match self {
            Unit::Acute => "acute",
            Unit::Rehab => "rehab",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Unit::Acute => 0,
            Unit::Rehab => 1,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a patient goes on leaving a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// On to the rehabilitation unit.
    Rehab,
    /// Early supported discharge.
    Esd,
    /// Any other exit: home, care home, another hospital, death.
    Other,
}

/// Row of a length-of-stay table.
///
/// Stroke stays are keyed by where the patient leaves to rather than by the class itself, which is why a stroke
/// patient draws a subtype before their stay can be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LosKey {
    StrokeRehab,
    StrokeEsd,
    StrokeOther,
    Tia,
    ComplexNeuro,
    Other,
}

impl LosKey {
    /// Key for a stroke patient leaving towards `destination`.
    pub fn stroke(destination: Destination) -> Self {
        match destination {
            Destination::Rehab => LosKey::StrokeRehab,
            Destination::Esd => LosKey::StrokeEsd,
            Destination::Other => LosKey::StrokeOther,
        }
    }

    /// Key for a non-stroke class. Stroke maps to [`LosKey::StrokeOther`]; callers with a subtype should use
    /// [`LosKey::stroke()`] instead.
    pub fn class(class: PatientClass) -> Self {
        match class {
            PatientClass::Stroke => LosKey::StrokeOther,
            PatientClass::Tia => LosKey::Tia,
            PatientClass::ComplexNeuro => LosKey::ComplexNeuro,
            PatientClass::Other => LosKey::Other,
        }
    }
}

impl fmt::Display for LosKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LosKey::StrokeRehab => "stroke_rehab",
            LosKey::StrokeEsd => "stroke_esd",
            LosKey::StrokeOther => "stroke_other",
            LosKey::Tia => "tia",
            LosKey::ComplexNeuro => "complex_neuro",
            LosKey::Other => "other",
        };
        f.write_str(label)
    }
}

/// Where a patient currently is on the pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientStage {
    Arrived,
    AwaitingAcuteBed,
    InAcuteCare,
    AwaitingRehabBed,
    InRehabCare,
    Discharged,
}

/// One patient moving through the pathway. Lives from arrival until final discharge.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: u64,
    pub class: PatientClass,
    /// Unit the patient was first admitted to.
    pub origin: Unit,
    pub stage: PatientStage,
    /// Stroke subtype drawn when the patient takes an acute bed; reused as the acute discharge destination.
    pub acute_subtype: Option<Destination>,
}

impl Patient {
    pub fn new(id: u64, class: PatientClass, origin: Unit) -> Self {
        Self {
            id,
            class,
            origin,
            stage: PatientStage::Arrived,
            acute_subtype: None,
        }
    }

    /// Move to `stage`, returning the stage left behind.
    pub fn advance(&mut self, stage: PatientStage) -> PatientStage {
        std::mem::replace(&mut self.stage, stage)
    }
}
