use std::fmt::Debug;

/// A clock value: anything totally ordered and printable.
///
/// Events run in ascending [`Ord`] order, ties going to whichever was scheduled first. Implemented for the unsigned
/// and common signed integers and for the [`OrderedFloat`] and [`NotNan`] wrappers; the care pathway model runs on
/// [`Days`].
///
/// [`OrderedFloat`]: ordered_float::OrderedFloat
/// [`NotNan`]: ordered_float::NotNan
/// [`Days`]: crate::Days
pub trait SimTime: Ord + Debug {}

impl SimTime for u8 {}
impl SimTime for u16 {}
impl SimTime for u32 {}
impl SimTime for u64 {}
impl SimTime for usize {}
impl SimTime for i32 {}
impl SimTime for i64 {}

impl<Float> SimTime for ordered_float::OrderedFloat<Float> where Float: ordered_float::FloatCore + Debug {}

impl<Float> SimTime for ordered_float::NotNan<Float> where Float: ordered_float::FloatCore + Debug {}

/// Simulated time in days since the start of a run.
pub type Days = ordered_float::OrderedFloat<f64>;

/// Everything a run mutates: in the pathway model, the beds, parameter tables, random stream and recorder of
/// [`PathwayState`].
///
/// [`Simulation::run()`] asks [`is_complete()`](SimState::is_complete) before every event. The default never stops
/// a run, which then ends when the queue drains or, under [`Simulation::run_until()`], at the horizon.
///
/// [`PathwayState`]: crate::pathway::PathwayState
/// [`Simulation::run()`]: crate::serial::Simulation::run
/// [`Simulation::run_until()`]: crate::serial::Simulation::run_until
pub trait SimState<Time>
where
    Time: SimTime,
{
    #[allow(unused_variables)]
    fn is_complete(&self, current_time: &Time) -> bool {
        false
    }
}
