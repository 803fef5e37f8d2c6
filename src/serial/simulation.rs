use super::{Event, EventQueue};
use crate::{SimState, SimTime};

/// A state and the queue of events waiting to act on it.
///
/// Typical use:
///
/// 1. Build the initial [`SimState`] and hand it to [`new()`] with the start time.
/// 2. Schedule the first events, through [`schedule()`] or, when they need the state too, [`parts_mut()`].
/// 3. Call [`run()`] or [`run_until()`] and handle any error.
/// 4. Read the outcome through [`state()`] or take it back with [`into_state()`].
///
/// [`new()`]: Simulation::new
/// [`schedule()`]: Simulation::schedule
/// [`parts_mut()`]: Simulation::parts_mut
/// [`run()`]: Simulation::run
/// [`run_until()`]: Simulation::run_until
/// [`state()`]: Simulation::state
/// [`into_state()`]: Simulation::into_state
#[derive(Debug)]
pub struct Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    event_queue: EventQueue<State, Time>,
    /// Lent exclusively to each event as it executes.
    state: State,
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// A simulation whose clock starts at `start_time` with nothing scheduled.
    pub fn new(initial_state: State, start_time: Time) -> Self {
        Self {
            event_queue: EventQueue::new(start_time),
            state: initial_state,
        }
    }

    /// Execute events in time order until the queue drains or [`SimState::is_complete()`] says to stop. Completion is
    /// checked before every event.
    ///
    /// # Errors
    ///
    /// The first error an event returns halts the run and is passed back unchanged. [`Error::BackInTime`] points at an
    /// event that tried to schedule into the past.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn run(&mut self) -> crate::Result {
        loop {
            if self.state.is_complete(self.event_queue.current_time()) {
                return Ok(());
            }

            let Some(mut next_event) = self.event_queue.next() else {
                return Ok(());
            };
            next_event.execute(&mut self.state, &mut self.event_queue)?;
        }
    }

    /// Execute every event scheduled strictly before `horizon`, then move the clock to `horizon` and stop.
    ///
    /// Events at or after the horizon stay in the queue unexecuted; processes still waiting for a resource at that
    /// point are simply abandoned with the run. [`SimState::is_complete()`] is still consulted before each event and
    /// may end the run early, in which case the clock is left where the last event put it.
    ///
    /// # Errors
    ///
    /// As with [`run()`], the first error raised by an event halts execution and is returned unchanged.
    ///
    /// [`run()`]: Simulation::run
    pub fn run_until(&mut self, horizon: Time) -> crate::Result {
        loop {
            if self.state.is_complete(self.event_queue.current_time()) {
                return Ok(());
            }

            match self.event_queue.next_time() {
                Some(time) if *time < horizon => {},
                _ => break,
            }

            let Some(mut next_event) = self.event_queue.next() else {
                break;
            };
            next_event.execute(&mut self.state, &mut self.event_queue)?;
        }

        self.event_queue.advance_to(horizon);
        Ok(())
    }

    /// Schedule the provided event at the specified time.
    ///
    /// # Errors
    ///
    /// If `time` is less than the current clock time on `self`, returns an [`Error::BackInTime`] with no
    /// modifications to the queue.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule<EventType>(&mut self, event: EventType, time: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        self.event_queue.schedule(event, time)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Tear the simulation down, keeping only its state.
    pub fn into_state(self) -> State {
        self.state
    }

    pub fn event_queue(&self) -> &EventQueue<State, Time> {
        &self.event_queue
    }

    /// Exclusive access to the state and the queue at once, for seeding initial events that need both.
    pub fn parts_mut(&mut self) -> (&mut State, &mut EventQueue<State, Time>) {
        (&mut self.state, &mut self.event_queue)
    }
}
