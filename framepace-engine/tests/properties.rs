// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::collections::HashMap;

use framepace_engine::option::SimulationOption;
use framepace_engine::scheduler::Scheduler;
use framepace_engine::timeline::TimelineRecord;

mod common;
use common::{core_records, records_named, rich_flow, scheduler};

const SEEDS: [u64; 5] = [1, 2, 3, 42, 1234];
const MAX_STEPS: u64 = 600;

fn jittered(seed: u64, priority_queue: bool) -> SimulationOption {
    SimulationOption {
        core_count: 3,
        frame_pool_size: 3,
        jitter: 0.7,
        jitter_ceiling: 2.5,
        seed,
        priority_queue,
        ..Default::default()
    }
}

fn for_each_run(mut check: impl FnMut(&mut Scheduler)) {
    for seed in SEEDS {
        for priority_queue in [false, true] {
            let mut sim = scheduler(file!(), rich_flow(), &jittered(seed, priority_queue));
            check(&mut sim);
        }
    }
}

fn frames_with(sim: &Scheduler, name: &str) -> Vec<Vec<TimelineRecord>> {
    (0..)
        .map(|n| records_named(sim, n, name))
        .take_while(|r| !r.is_empty())
        .collect()
}

fn last_end(records: &[TimelineRecord]) -> f64 {
    records.iter().map(|r| r.end).fold(f64::MIN, f64::max)
}

fn first_start(records: &[TimelineRecord]) -> f64 {
    records.iter().map(|r| r.start).fold(f64::MAX, f64::min)
}

#[test]
fn same_seed_same_timeline() {
    for seed in SEEDS {
        let option = jittered(seed, false);
        let mut a = scheduler(file!(), rich_flow(), &option);
        let mut b = scheduler(file!(), rich_flow(), &option);
        a.run_bounded(MAX_STEPS).unwrap();
        b.run_bounded(MAX_STEPS).unwrap();
        assert_eq!(a.timeline(), b.timeline());
        assert_eq!(a.frame_rates(), b.frame_rates());
    }
}

#[test]
fn different_seeds_differ() {
    let mut a = scheduler(file!(), rich_flow(), &jittered(1, false));
    let mut b = scheduler(file!(), rich_flow(), &jittered(2, false));
    a.run_bounded(MAX_STEPS).unwrap();
    b.run_bounded(MAX_STEPS).unwrap();
    assert_ne!(a.timeline(), b.timeline());
}

#[test]
fn core_time_never_decreases() {
    for_each_run(|sim| {
        let mut last: HashMap<usize, f64> = HashMap::new();
        for _ in 0..MAX_STEPS {
            sim.step().unwrap();
            for core in sim.cores() {
                let previous = last.insert(core.id().0, core.time()).unwrap_or(0.0);
                assert!(core.time() >= previous);
            }
        }
    });
}

#[test]
fn one_job_per_core_at_a_time() {
    for_each_run(|sim| {
        sim.run_bounded(MAX_STEPS).unwrap();
        let records = core_records(sim);
        for lane in 0..sim.option().core_count {
            let mut on_lane: Vec<_> = records.iter().filter(|r| r.lane == lane).collect();
            on_lane.sort_by(|a, b| a.start.total_cmp(&b.start));
            for pair in on_lane.windows(2) {
                assert!(pair[1].start >= pair[0].end);
            }
        }
    });
}

#[test]
fn frame_pool_is_conserved() {
    for_each_run(|sim| {
        let capacity = sim.option().frame_pool_size;
        for _ in 0..MAX_STEPS {
            sim.step().unwrap();
            assert_eq!(sim.frames_available() + sim.frames_in_flight(), capacity);

            let mut numbers = sim.in_flight_numbers();
            numbers.sort_unstable();
            numbers.dedup();
            assert_eq!(numbers.len(), sim.frames_in_flight());
        }
    });
}

#[test]
fn waiting_stages_follow_the_previous_frame() {
    for_each_run(|sim| {
        sim.run_bounded(MAX_STEPS).unwrap();
        for name in ["Simulate", "Render"] {
            let frames = frames_with(sim, name);
            assert!(frames.len() > 5);
            for pair in frames.windows(2) {
                assert!(first_start(&pair[1]) >= last_end(&pair[0]));
            }
        }
    });
}

#[test]
fn split_stage_joins_before_successor() {
    for_each_run(|sim| {
        sim.run_bounded(MAX_STEPS).unwrap();
        let replicas = frames_with(sim, "Simulate");
        for (n, simulate) in replicas.iter().enumerate() {
            let render = records_named(sim, n as u64, "Render");
            if simulate.len() < 3 {
                assert!(render.is_empty());
                continue;
            }
            assert_eq!(simulate.len(), 3);
            if let [render] = render.as_slice() {
                assert!(render.start >= last_end(simulate));
            } else {
                assert!(render.is_empty());
            }
        }
    });
}

#[test]
fn latency_covers_the_critical_path_without_jitter() {
    let option = SimulationOption {
        core_count: 3,
        frame_pool_size: 3,
        ..Default::default()
    };
    let mut sim = scheduler(file!(), rich_flow(), &option);
    sim.run_bounded(MAX_STEPS).unwrap();

    let critical = sim.critical_path_time();
    assert!(!sim.frame_rates().is_empty());
    for rate in sim.frame_rates() {
        assert!(rate.latency >= critical - 1e-9);
    }
}
