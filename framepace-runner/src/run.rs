// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Drive a [`Workbench`] according to a [`RunConfig`].

use std::rc::Rc;

use framepace_engine::flow::{Flow, FlowFile};
use framepace_engine::types::SimError;
use framepace_engine::workbench::Workbench;
use framepace_track::entity::Entity;
use framepace_track::info;
use indicatif::ProgressBar;

use crate::config::RunConfig;

/// Load and validate the flow named by `config`.
pub fn load_flow(config: &RunConfig) -> Result<Flow, SimError> {
    FlowFile::from_file(&config.flow)?.into_flow()
}

/// Steps a single run is allowed to take.
#[must_use]
pub fn step_ceiling(config: &RunConfig) -> u64 {
    if config.control.auto_step {
        config.control.max_auto_step
    } else {
        config.steps
    }
}

/// Tick the current run until it reaches its step ceiling or stops making
/// progress. Returns the number of steps executed.
pub fn drive(
    bench: &mut Workbench,
    ceiling: u64,
    progress_bar: Option<&ProgressBar>,
) -> Result<u64, SimError> {
    let mut total = 0;
    while bench.current().step_count() < ceiling {
        let executed = bench.tick()?;
        if let Some(progress_bar) = progress_bar {
            progress_bar.inc(executed);
        }
        total += executed;
        if executed == 0 {
            break;
        }
    }
    Ok(total)
}

/// Execute `config.runs` runs, keeping every run but the last one frozen.
pub fn run_all(
    parent: &Rc<Entity>,
    config: &RunConfig,
    progress_bar: Option<&ProgressBar>,
) -> Result<Workbench, SimError> {
    let flow = Rc::new(load_flow(config)?);
    let mut bench = Workbench::new(
        parent,
        flow,
        config.simulation.clone(),
        config.control.clone(),
    );

    let ceiling = step_ceiling(config);
    for run in 0..config.runs.max(1) {
        if run > 0 {
            bench.restart(true);
        }
        let steps = drive(&mut bench, ceiling, progress_bar)?;
        info!(parent ; "run {} executed {} steps", run, steps);
    }
    Ok(bench)
}
