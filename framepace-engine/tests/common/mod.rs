// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

#![allow(dead_code)]

use std::rc::Rc;

use framepace_engine::flow::{Flow, StageDescriptor};
use framepace_engine::option::SimulationOption;
use framepace_engine::scheduler::{Scheduler, StepOutcome};
use framepace_engine::test_helpers::start_test;
use framepace_engine::timeline::TimelineRecord;

pub fn option(core_count: usize, frame_pool_size: usize) -> SimulationOption {
    SimulationOption {
        core_count,
        frame_pool_size,
        ..Default::default()
    }
}

pub fn serial_flow() -> Flow {
    Flow::new(
        "serial",
        200.0,
        vec![StageDescriptor::new("A"), StageDescriptor::new("B")],
    )
    .unwrap()
}

/// A flow using every feature: a spawning first stage, a split stage and
/// cross-frame waits.
pub fn rich_flow() -> Flow {
    Flow::new(
        "rich",
        120.0,
        vec![
            StageDescriptor::new("Input")
                .with_tag(1)
                .spawns_next_frame(true),
            StageDescriptor::new("Simulate")
                .with_tag(2)
                .with_weight(3.0)
                .with_split(3)
                .waits_for(2),
            StageDescriptor::new("Render")
                .with_tag(3)
                .with_weight(2.0)
                .waits_for(3),
        ],
    )
    .unwrap()
}

pub fn scheduler(file: &str, flow: Flow, option: &SimulationOption) -> Scheduler {
    let top = start_test(file);
    Scheduler::new(&top, Rc::new(flow), option)
}

/// Records of jobs run on cores (excludes frame-duration and rate lanes).
pub fn core_records(scheduler: &Scheduler) -> Vec<TimelineRecord> {
    let core_count = scheduler.option().core_count;
    scheduler
        .timeline()
        .iter()
        .filter(|r| r.lane < core_count)
        .cloned()
        .collect()
}

pub fn records_named(scheduler: &Scheduler, frame: u64, name: &str) -> Vec<TimelineRecord> {
    core_records(scheduler)
        .into_iter()
        .filter(|r| r.frame == Some(frame) && r.name == name)
        .collect()
}

/// Step `n` times, collecting each outcome.
pub fn steps(scheduler: &mut Scheduler, n: usize) -> Vec<StepOutcome> {
    (0..n).map(|_| scheduler.step().unwrap()).collect()
}
