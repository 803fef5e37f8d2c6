mod event_holder;
pub(super) mod event_traits;

use crate::{SimState, SimTime};
use event_holder::EventHolder;
use event_traits::Event;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::Add;

/// Events waiting to execute, earliest first.
///
/// Two events due at the same instant execute in the order they were scheduled, whatever [`SimTime`] says about them.
/// Together with a seeded random stream this makes a run repeatable event for event.
///
/// Only [`Simulation`] pops from the queue. Every scheduling method checks the requested time against the clock and
/// refuses anything in the past with [`Error::BackInTime`], leaving the queue untouched.
///
/// [`Simulation`]: crate::serial::Simulation
/// [`Error::BackInTime`]: crate::Error::BackInTime
#[derive(Debug)]
pub struct EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    events: BinaryHeap<Reverse<EventHolder<State, Time>>>,
    clock: Time,
    scheduled: usize,
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub(crate) fn new(start_time: Time) -> Self {
        Self {
            events: BinaryHeap::default(),
            clock: start_time,
            scheduled: 0,
        }
    }

    /// Schedule `event` to execute at `time`.
    ///
    /// # Errors
    ///
    /// [`Error::BackInTime`] if `time` is before the clock.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule<EventType>(&mut self, event: EventType, time: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        self.schedule_from_boxed(Box::new(event), time)
    }

    /// As [`schedule()`](Self::schedule), for an event that is already boxed.
    ///
    /// # Errors
    ///
    /// [`Error::BackInTime`] if `time` is before the clock.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule_from_boxed(&mut self, event: Box<dyn Event<State, Time>>, time: Time) -> crate::Result {
        if time < self.clock {
            return Err(crate::Error::BackInTime);
        }

        self.events.push(Reverse(EventHolder {
            execution_time: time,
            event,
            insertion_sequence: self.scheduled,
        }));
        self.scheduled += 1;
        Ok(())
    }

    /// Pop the earliest event and move the clock to its execution time.
    pub(crate) fn next(&mut self) -> Option<Box<dyn Event<State, Time>>> {
        let Reverse(holder) = self.events.pop()?;
        self.clock = holder.execution_time;
        Some(holder.event)
    }

    /// Move the clock forward to `time` without executing anything. Never rewinds.
    pub(crate) fn advance_to(&mut self, time: Time) {
        if time > self.clock {
            self.clock = time;
        }
    }

    pub fn current_time(&self) -> &Time {
        &self.clock
    }

    /// Execution time of the event that would pop next.
    pub fn next_time(&self) -> Option<&Time> {
        self.events.peek().map(|Reverse(holder)| &holder.execution_time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone,
{
    /// Schedule `event` at the current time, behind anything else already due now.
    ///
    /// # Errors
    ///
    /// Only [`Error::BackInTime`], should cloning the clock somehow produce an earlier time.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule_now<EventType>(&mut self, event: EventType) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        let now = self.clock.clone();
        self.schedule(event, now)
    }
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone + Add<Output = Time>,
{
    /// Schedule `event` at `current_time() + delay`.
    ///
    /// # Errors
    ///
    /// [`Error::BackInTime`] for a delay that lands before the clock, such as a negative one.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule_with_delay<EventType>(&mut self, event: EventType, delay: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        let due = self.clock.clone() + delay;
        self.schedule(event, due)
    }
}

impl<State, Time> std::fmt::Display for EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} events pending at {:?}", self.events.len(), self.clock)
    }
}
