//! Compares three ways of splitting 22 beds between an acute stroke unit and a rehabilitation unit.
//!
//! Every policy is fed the same patients: all three runs share a seed, so the arrival times, lengths of stay and
//! discharge routes line up draw for draw for as long as the policies keep patients in the same order. This is the
//! common random numbers technique, and it makes the differences between policies far less noisy than three
//! independent runs would.
//!
//! Each run goes on a thread of its own. Set `RUST_LOG=debug` to follow individual patients.

use carepath::config::{ArrivalStream, DischargeTables, LosTables, UnitLosTable};
use carepath::pathway::{Destination, LosKey, PatientClass, Unit};
use carepath::policy::{BedPolicy, PooledPriority, Routing};
use carepath::statistics::OneInN;
use carepath::variates::LosParams;
use carepath::{PathwaySimulation, RunReport, ScenarioConfig};
use std::collections::BTreeMap;
use std::thread;

fn los(mean: f64, stdev: f64) -> LosParams {
    LosParams::MeanStdev { mean, stdev }
}

fn scenario(seed: u64, policy: BedPolicy) -> ScenarioConfig {
    ScenarioConfig {
        seed,
        horizon_days: 5 * 365,
        warm_up_days: ScenarioConfig::DEFAULT_WARM_UP_DAYS,
        policy,
        arrivals: vec![
            ArrivalStream {
                class: PatientClass::Stroke,
                unit: Unit::Acute,
                mean_interarrival_days: 1.2,
            },
            ArrivalStream {
                class: PatientClass::Tia,
                unit: Unit::Acute,
                mean_interarrival_days: 9.3,
            },
            ArrivalStream {
                class: PatientClass::ComplexNeuro,
                unit: Unit::Acute,
                mean_interarrival_days: 3.6,
            },
            ArrivalStream {
                class: PatientClass::Other,
                unit: Unit::Acute,
                mean_interarrival_days: 3.2,
            },
            ArrivalStream {
                class: PatientClass::Stroke,
                unit: Unit::Rehab,
                mean_interarrival_days: 21.8,
            },
        ],
        length_of_stay: LosTables {
            acute: UnitLosTable {
                default: los(6.0, 5.0),
                entries: BTreeMap::from([
                    (LosKey::StrokeRehab, los(7.4, 8.6)),
                    (LosKey::StrokeEsd, los(4.6, 4.8)),
                    (LosKey::StrokeOther, los(7.0, 8.7)),
                    (LosKey::Tia, los(1.8, 5.0)),
                    (LosKey::ComplexNeuro, los(4.0, 5.0)),
                    (LosKey::Other, los(3.8, 5.2)),
                ]),
            },
            rehab: UnitLosTable {
                default: los(20.0, 15.0),
                entries: BTreeMap::from([
                    (LosKey::StrokeEsd, los(21.6, 12.6)),
                    (LosKey::StrokeOther, los(29.4, 20.0)),
                    (LosKey::ComplexNeuro, los(21.4, 14.8)),
                    (LosKey::Other, los(17.0, 13.0)),
                ]),
            },
        },
        discharge: DischargeTables {
            acute: BTreeMap::from([
                (
                    PatientClass::Stroke,
                    BTreeMap::from([(Destination::Rehab, 0.24), (Destination::Esd, 0.13), (Destination::Other, 0.63)]),
                ),
                (
                    PatientClass::Tia,
                    BTreeMap::from([(Destination::Rehab, 0.01), (Destination::Other, 0.99)]),
                ),
                (
                    PatientClass::ComplexNeuro,
                    BTreeMap::from([(Destination::Rehab, 0.11), (Destination::Esd, 0.05), (Destination::Other, 0.84)]),
                ),
                (
                    PatientClass::Other,
                    BTreeMap::from([(Destination::Rehab, 0.05), (Destination::Esd, 0.10), (Destination::Other, 0.85)]),
                ),
            ]),
            rehab: BTreeMap::from([
                (
                    PatientClass::Stroke,
                    BTreeMap::from([(Destination::Esd, 0.40), (Destination::Other, 0.60)]),
                ),
                (
                    PatientClass::Tia,
                    BTreeMap::from([(Destination::Esd, 0.0), (Destination::Other, 1.0)]),
                ),
                (
                    PatientClass::ComplexNeuro,
                    BTreeMap::from([(Destination::Esd, 0.09), (Destination::Other, 0.91)]),
                ),
                (
                    PatientClass::Other,
                    BTreeMap::from([(Destination::Esd, 0.13), (Destination::Other, 0.87)]),
                ),
            ]),
        },
    }
}

fn print_report(title: &str, report: &RunReport) {
    println!("{title}");
    for (label, series) in &report.series {
        let summary = &series.summary;
        println!(
            "  {label:<22} mean {:>6.2}  stdev {:>5.2}  max {:>3}",
            summary.mean, summary.stdev, summary.max
        );
    }

    for unit in Unit::ALL {
        let Some(series) = report.unit(unit) else {
            continue;
        };
        println!("  {unit} beds needed:");
        for target in [0.2, 0.1, 0.05] {
            match series.delay_table.beds_for(target) {
                Some(beds) => {
                    let one_in = series.delay_table.get(beds).map_or(OneInN::Never, |row| row.one_in);
                    println!("    {beds:>3} keeps delays at or below {target} ({one_in} patients)");
                },
                None => println!("    none observed reaching {target}"),
            }
        }
    }
    println!(
        "  still waiting at the horizon: {} acute, {} rehab",
        report.counters.waiting_at_end.get(&Unit::Acute).copied().unwrap_or(0),
        report.counters.waiting_at_end.get(&Unit::Rehab).copied().unwrap_or(0)
    );
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let seed = 20231024;
    let policies = [
        (
            "dedicated: 12 acute, 10 rehab",
            BedPolicy::Dedicated {
                acute_beds: 12,
                rehab_beds: 10,
            },
        ),
        ("pooled: 22 shared", BedPolicy::Pooled { beds: 22 }),
        (
            "partially pooled: 10 acute, 8 rehab, 4 shared",
            BedPolicy::PartiallyPooled {
                acute_beds: 10,
                rehab_beds: 8,
                pooled_beds: 4,
                acute_routing: Routing::DedicatedFirst,
                rehab_routing: Routing::DedicatedFirst,
                priority: PooledPriority::RehabFirst,
            },
        ),
    ];

    let runs: Vec<_> = policies
        .into_iter()
        .map(|(title, policy)| {
            let config = scenario(seed, policy);
            (title, thread::spawn(move || PathwaySimulation::new(&config)?.run()))
        })
        .collect();

    for (title, handle) in runs {
        let report = handle.join().expect("simulation thread should not panic")?;
        print_report(title, &report);
    }
    Ok(())
}
