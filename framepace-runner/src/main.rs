// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Run a flow and print a report.
//!
//! For example, run using:
//!   cargo run --bin framepace -- --flow
//! framepace-runner/flows/sequential.yaml --cores 2 --stdout --stdout-level debug

use anyhow::Result;
use clap::Parser;
use framepace_engine::stats::Stats;
use framepace_runner::config::{Cli, RunConfig};
use framepace_runner::{report, run};
use framepace_track::builder::setup_trackers;
use framepace_track::entity::toplevel;
use indicatif::ProgressBar;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RunConfig::load(&cli)?;
    let tracker = setup_trackers(&cli.trackers_config())?;
    let top = toplevel(&tracker, "top");

    let progress_bar = cli.progress.then(|| {
        let total = run::step_ceiling(&config) * config.runs.max(1) as u64;
        ProgressBar::new(total)
    });

    let bench = run::run_all(&top, &config, progress_bar.as_ref())?;

    if let Some(progress_bar) = progress_bar {
        progress_bar.finish();
    }

    for frozen in bench.frozen() {
        println!("{}", report::summary(frozen, &Stats::from_scheduler(frozen)));
    }
    let current = bench.current();
    println!("{}", report::summary(current, &Stats::from_scheduler(current)));

    if cli.timeline {
        println!("{}", report::timeline(current));
    }
    if cli.queue {
        println!("{}", report::queue(current));
    }

    tracker.shutdown();
    Ok(())
}
