// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use framepace_engine::flow::{Flow, StageDescriptor};
use framepace_engine::option::SimulationOption;
use framepace_engine::scheduler::Scheduler;
use framepace_engine::stats::Stats;
use framepace_engine::test_helpers::start_test;
use framepace_runner::report;

fn scheduler(flow: Flow, core_count: usize, frame_pool_size: usize) -> Scheduler {
    let top = start_test(file!());
    let option = SimulationOption {
        core_count,
        frame_pool_size,
        ..Default::default()
    };
    Scheduler::new(&top, Rc::new(flow), &option)
}

fn serial() -> Flow {
    Flow::new(
        "serial",
        200.0,
        vec![StageDescriptor::new("A"), StageDescriptor::new("B")],
    )
    .unwrap()
}

#[test]
fn summary_of_a_single_frame() {
    let mut sim = scheduler(serial(), 1, 1);
    sim.run_bounded(100).unwrap();
    let text = report::summary(&sim, &Stats::from_scheduler(&sim));

    assert!(text.starts_with("Run: serial\n"));
    assert!(text.contains("  Cores: 1, Frame Pool: 1, Seed: 0\n"));
    assert!(text.contains("  Steps: 5\n"));
    assert!(text.contains("  Critical path: 200.0\n"));
    assert!(text.contains("  Frames completed: 1\n"));
    assert!(text.contains("  Latency: mean 200.0, min 200.0, max 200.0\n"));
    assert!(text.contains("  Frame interval: -\n"));
    assert!(text.ends_with("(100.0%)\n"));
    assert_eq!(text.lines().count(), 10);
}

#[test]
fn summary_mentions_priority_queue() {
    let top = start_test(file!());
    let option = SimulationOption {
        core_count: 2,
        frame_pool_size: 1,
        seed: 9,
        priority_queue: true,
        ..Default::default()
    };
    let sim = Scheduler::new(&top, Rc::new(serial()), &option);
    let text = report::summary(&sim, &Stats::from_scheduler(&sim));

    assert!(text.contains("  Cores: 2, Frame Pool: 1, Seed: 9, priority queue\n"));
    assert!(text.contains("  Frames completed: 0\n"));
    assert!(text.ends_with("  core1: busy 0.0 (0.0%)\n"));
}

#[test]
fn timeline_lines() {
    let mut sim = scheduler(serial(), 1, 1);
    sim.run_bounded(100).unwrap();
    let text = report::timeline(&sim);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "  0     0        0.0      100.0 A (entry)");
    assert_eq!(lines[1], "  0     0      100.0      200.0 B (exit)");
    assert!(lines[2].ends_with("200 (frame)"));
    assert!(lines[3].ends_with("200 (rate)"));
    assert!(lines[2].contains("    -"));
}

#[test]
fn queue_listing_shows_waiting_jobs() {
    let flow = Flow::new(
        "wait",
        100.0,
        vec![
            StageDescriptor::new("A")
                .with_tag(1)
                .spawns_next_frame(true),
            StageDescriptor::new("B")
                .with_tag(2)
                .with_weight(3.0)
                .waits_for(2),
        ],
    )
    .unwrap();
    let mut sim = scheduler(flow, 2, 3);
    sim.run(8).unwrap();

    assert_eq!(report::queue(&sim), "Job: 1, B (wait)\nJob: 2, A (ready)");
}

#[test]
fn empty_queue_listing() {
    let mut sim = scheduler(serial(), 1, 1);
    sim.run_bounded(100).unwrap();
    assert_eq!(report::queue(&sim), "");
}
