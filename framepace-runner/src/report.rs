// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Plain-text rendering of a run.

use framepace_engine::scheduler::Scheduler;
use framepace_engine::stats::Stats;
use itertools::Itertools;

fn or_none(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

/// Headline figures of a run followed by one line per core.
#[must_use]
pub fn summary(scheduler: &Scheduler, stats: &Stats) -> String {
    let option = scheduler.option();
    let priority = if option.priority_queue {
        ", priority queue"
    } else {
        ""
    };

    let mut lines = vec![
        format!("Run: {}", scheduler.name()),
        format!(
            "  Cores: {}, Frame Pool: {}, Seed: {}{}",
            option.core_count,
            option.frame_pool_size,
            scheduler.seed(),
            priority
        ),
        format!("  Steps: {}", scheduler.step_count()),
        format!("  Critical path: {:.1}", scheduler.critical_path_time()),
        format!("  Frames completed: {}", stats.frames_completed),
        format!(
            "  Latency: mean {}, min {}, max {}",
            or_none(stats.mean_latency),
            or_none(stats.min_latency),
            or_none(stats.max_latency)
        ),
        format!("  Frame interval: {}", or_none(stats.mean_interval)),
        format!("  Throughput: {:.4} frames per unit", stats.throughput),
        format!("  Makespan: {:.1}", stats.makespan),
    ];
    lines.extend(stats.cores.iter().map(|core| {
        format!(
            "  {}: busy {:.1} ({:.1}%)",
            core.core,
            core.busy_time,
            core.utilisation * 100.0
        )
    }));

    format!("{}\n", lines.iter().join("\n"))
}

/// One line per timeline record, in the order they were recorded.
#[must_use]
pub fn timeline(scheduler: &Scheduler) -> String {
    scheduler
        .timeline()
        .iter()
        .map(|r| {
            let frame = r
                .frame
                .map_or_else(|| "-".to_string(), |f| f.to_string());
            format!(
                "{:>3} {:>5} {:>10.1} {:>10.1} {} ({})",
                r.lane, frame, r.start, r.end, r.name, r.kind
            )
        })
        .join("\n")
}

/// Queued jobs in the order they would be considered.
#[must_use]
pub fn queue(scheduler: &Scheduler) -> String {
    scheduler
        .queue_entries()
        .iter()
        .map(|e| {
            format!(
                "Job: {}, {} ({})",
                e.frame,
                e.stage,
                if e.ready { "ready" } else { "wait" }
            )
        })
        .join("\n")
}
