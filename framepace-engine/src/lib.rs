// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `FRAMEPACE` - frame pipeline scheduling simulator
//!
//! This library models how the stages of successive pipeline instances
//! ("frames") compete for a fixed number of simulated cores. A
//! [flow](crate::flow::Flow) describes the stages, a
//! [scheduler](crate::scheduler::Scheduler) is stepped by the caller and
//! produces [timeline](crate::timeline) records that can be rendered or
//! summarised as [statistics](crate::stats::Stats).
//!
//! # Simple Application
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use framepace_engine::flow::{Flow, StageDescriptor};
//! use framepace_engine::option::SimulationOption;
//! use framepace_engine::scheduler::Scheduler;
//! use framepace_track::entity::toplevel;
//! use framepace_track::tracker::dev_null_tracker;
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let flow = Flow::new(
//!     "serial",
//!     200.0,
//!     vec![StageDescriptor::new("simulate"), StageDescriptor::new("render")],
//! )
//! .unwrap();
//! let option = SimulationOption {
//!     core_count: 1,
//!     frame_pool_size: 1,
//!     ..Default::default()
//! };
//!
//! let mut scheduler = Scheduler::new(&top, Rc::new(flow), &option);
//! scheduler.run_bounded(100).unwrap();
//! assert_eq!(scheduler.frame_rates().len(), 1);
//! assert_eq!(scheduler.frame_rates()[0].latency, 200.0);
//! ```
//!
//! # Stepping
//!
//! Every call to [`Scheduler::step`](crate::scheduler::Scheduler::step)
//! performs exactly one of:
//!  - admit a requested frame when the frame pool has a free slot,
//!  - complete the job on the least-advanced core that is able to finish,
//!  - assign the next ready job to the earliest idle core.
//!
//! Runs are deterministic for a given flow, option set (including the seed)
//! and number of steps.

pub mod cores;
pub mod flow;
pub mod frame;
pub mod jitter;
pub mod job;
pub mod option;
pub mod pipeline;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod test_helpers;
pub mod timeline;
pub mod types;
pub mod workbench;
