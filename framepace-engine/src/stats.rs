// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Aggregate figures derived from a run.

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::cores::CoreId;
use crate::scheduler::Scheduler;
use crate::types::SimTime;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoreStats {
    pub core: CoreId,
    pub busy_time: SimTime,

    /// `busy_time / makespan`, 0 when nothing has run.
    pub utilisation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub frames_completed: usize,
    pub mean_latency: Option<SimTime>,
    pub min_latency: Option<SimTime>,
    pub max_latency: Option<SimTime>,

    /// Mean time between consecutive frame releases.
    pub mean_interval: Option<SimTime>,

    /// Frames completed per unit of time.
    pub throughput: f64,

    /// Largest core time.
    pub makespan: SimTime,

    /// Per core, in index order.
    pub cores: Vec<CoreStats>,
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    (n > 0).then(|| values.sum::<f64>() / n as f64)
}

impl Stats {
    #[must_use]
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let rates = scheduler.frame_rates();
        let makespan = scheduler.makespan();

        let (min_latency, max_latency) =
            match rates.iter().map(|r| r.latency).minmax_by(f64::total_cmp) {
                MinMaxResult::NoElements => (None, None),
                MinMaxResult::OneElement(v) => (Some(v), Some(v)),
                MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
            };

        // The first delta is measured from time 0, not from a release.
        let intervals = rates.iter().skip(1).map(|r| r.delta);

        let cores = scheduler
            .cores()
            .iter()
            .sorted_by_key(|c| c.id())
            .map(|c| CoreStats {
                core: c.id(),
                busy_time: c.busy_time(),
                utilisation: if makespan > 0.0 {
                    c.busy_time() / makespan
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            frames_completed: rates.len(),
            mean_latency: mean(rates.iter().map(|r| r.latency)),
            min_latency,
            max_latency,
            mean_interval: mean(intervals),
            throughput: if makespan > 0.0 {
                rates.len() as f64 / makespan
            } else {
                0.0
            },
            makespan,
            cores,
        }
    }
}
