mod util;

use carepath::resources::{Acquisition, BedToken, Grant, ResourcePool};
use carepath::serial::*;
use carepath::{Days, SimState};
use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;

/// Time the patient started waiting.
type Arrived = f64;

/// An M/M/c ward: Poisson arrivals, exponential stays, `c` beds in one pool.
#[derive(Debug)]
struct Ward {
    beds: ResourcePool<Arrived>,
    arrivals: Exp<f64>,
    stays: Exp<f64>,
    rng: Pcg64,
    admitted: usize,
    total_wait: f64,
}

impl Ward {
    fn new(beds: usize, arrival_rate: f64, discharge_rate: f64, seed: u64) -> Self {
        Self {
            beds: ResourcePool::new(0, "ward", beds),
            arrivals: Exp::new(arrival_rate).expect("arrival rate should be positive"),
            stays: Exp::new(discharge_rate).expect("discharge rate should be positive"),
            rng: Pcg64::seed_from_u64(seed),
            admitted: 0,
            total_wait: 0.0,
        }
    }

    fn admit(&mut self, grant: Grant<Arrived>, events: &mut EventQueue<Ward, Days>) -> carepath::Result {
        self.admitted += 1;
        self.total_wait += events.current_time().0 - grant.waiter;
        let stay = self.stays.sample(&mut self.rng);
        events.schedule_with_delay(Discharge { token: Some(grant.token) }, OrderedFloat(stay))
    }
}

impl SimState<Days> for Ward {}

#[derive(Debug)]
struct Arrival;

impl Arrival {
    fn schedule(ward: &mut Ward, events: &mut EventQueue<Ward, Days>) -> carepath::Result {
        let delay = ward.arrivals.sample(&mut ward.rng);
        events.schedule_with_delay(Arrival, OrderedFloat(delay))
    }
}

impl Event<Ward, Days> for Arrival {
    fn execute(&mut self, ward: &mut Ward, events: &mut EventQueue<Ward, Days>) -> carepath::Result {
        if let Acquisition::Granted(grant) = ward.beds.request(0, events.current_time().0) {
            ward.admit(grant, events)?;
        }
        Self::schedule(ward, events)
    }
}

#[derive(Debug)]
struct Discharge {
    token: Option<BedToken>,
}

impl Event<Ward, Days> for Discharge {
    fn execute(&mut self, ward: &mut Ward, events: &mut EventQueue<Ward, Days>) -> carepath::Result {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        match ward.beds.release(token)? {
            Some(next) => ward.admit(next, events),
            None => Ok(()),
        }
    }
}

/// Mean wait before admission in an M/M/c queue, from the Erlang C formula.
fn erlang_c_wait(beds: u32, arrival_rate: f64, discharge_rate: f64) -> f64 {
    let offered = arrival_rate / discharge_rate;
    let c = f64::from(beds);
    let mut term = 1.0;
    let mut below = 0.0;
    for k in 0..beds {
        if k > 0 {
            term *= offered / f64::from(k);
        }
        below += term;
    }
    let top = term * offered / c * c / (c - offered);
    let p_wait = top / (below + top);
    p_wait / (c * discharge_rate - arrival_rate)
}

fn run_ward(seed: u64, beds: usize, discharge_rate: f64, horizon: f64) -> Ward {
    let ward = Ward::new(beds, 4.0, discharge_rate, seed);
    let mut sim = Simulation::new(ward, OrderedFloat(0.0));
    let (ward, events) = sim.parts_mut();
    Arrival::schedule(ward, events).expect("first arrival should be in the future");

    sim.run_until(OrderedFloat(horizon))
        .expect("simulation should complete normally");
    assert_eq!(horizon, sim.event_queue().current_time().0, "unexpected end time");

    let ward = sim.into_state();
    assert!(ward.beds.occupancy() <= ward.beds.capacity());
    ward
}

fn check_against_erlang_c(seed: u64, beds: u32, discharge_rate: f64) {
    let ward = run_ward(seed, beds as usize, discharge_rate, 100_000.0);
    let expected = erlang_c_wait(beds, 4.0, discharge_rate);
    let observed = ward.total_wait / ward.admitted as f64;
    let relative = (observed - expected).abs() / expected;
    assert!(
        relative < 0.15,
        "mean wait {observed:.4} too far from Erlang C {expected:.4} with {beds} beds"
    );
}

#[test]
fn erlang_c_formula_sanity() {
    assert_floats_near_equal!(1.0 / 3.0, erlang_c_wait(1, 4.0, 6.0), "M/M/1 wait should be rho / (mu - lambda)");
    assert_floats_near_equal!(4.0 / 15.0, erlang_c_wait(2, 4.0, 3.0), "unexpected M/M/2 wait");
}

#[test]
fn single_bed_matches_erlang_c() {
    check_against_erlang_c(11434450237083315284, 1, 6.0);
}

#[test]
fn double_bed_matches_erlang_c() {
    check_against_erlang_c(7082446179938253086, 2, 3.0);
}

#[test]
fn triple_bed_matches_erlang_c() {
    check_against_erlang_c(13009076887838060007, 3, 2.0);
}

#[test]
fn same_seed_same_ward() {
    let first = run_ward(42, 2, 3.0, 500.0);
    let second = run_ward(42, 2, 3.0, 500.0);
    assert_eq!(first.admitted, second.admitted);
    assert_eq!(first.total_wait, second.total_wait);
    assert_eq!(first.beds.queue_len(), second.beds.queue_len());
}
