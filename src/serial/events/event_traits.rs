use super::{EventQueue, SimState, SimTime};
use std::fmt::Debug;

/// A behavior or state change that occurs within a simulation.
///
/// Every logical process in a model (an arrival generator, a patient waiting out a length of stay, the occupancy
/// recorder) is a chain of these: each execution does its work and then schedules its own continuation on the queue.
/// Nothing blocks; a process that needs to wait simply schedules the next link for a later time.
///
/// Requiring implementors to be [`Debug`] enables printing the full contents of an [`EventQueue`] when necessary.
///
/// There is no notion of cancelling an event once scheduled. A run either reaches its horizon or is abandoned by the
/// caller.
pub trait Event<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Update the simulation according to the specific type of event. Exclusive access is provided to both the
    /// simulation's current state and the event queue, allowing for both mutation of the state and scheduling of new
    /// events. The clock on `event_queue` is updated before this method is invoked.
    ///
    /// # Errors
    ///
    /// Any error returned here halts [`Simulation::run()`] and is handed back to its caller unchanged. Errors that do
    /// not originate in carepath can be wrapped in [`Error::BadExecution`].
    ///
    /// [`Simulation::run()`]: crate::serial::Simulation::run
    /// [`Error::BadExecution`]: crate::Error::BadExecution
    fn execute(&mut self, simulation_state: &mut State, event_queue: &mut EventQueue<State, Time>) -> crate::Result;
}

/// An [`Event`] that is guaranteed not to return an error on execution.
///
/// An implementation of [`Event`] is provided for all implementors of this trait which simply invokes
/// [`OkEvent::execute()`] then returns `Ok(())`.
///
/// [`OkEvent::execute()`]: OkEvent::execute
pub trait OkEvent<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Update the simulation according to the specific type of event. See [`Event::execute()`].
    fn execute(&mut self, simulation_state: &mut State, event_queue: &mut EventQueue<State, Time>);
}

impl<State, Time, OkEventType> Event<State, Time> for OkEventType
where
    State: SimState<Time>,
    Time: SimTime,
    OkEventType: OkEvent<State, Time>,
{
    fn execute(&mut self, simulation_state: &mut State, event_queue: &mut EventQueue<State, Time>) -> crate::Result {
        OkEvent::execute(self, simulation_state, event_queue);
        Ok(())
    }
}
