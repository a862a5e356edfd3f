// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Command-line front end for the frame pipeline simulator.
//!
//! A run is described by a YAML flow file and a layered [`RunConfig`]
//! (see [`config`]). For example:
//!
//! ```text
//! framepace --flow framepace-runner/flows/frame-centric.yaml --cores 4 \
//!     --frame-pool-size 3 --jitter 0.3 --timeline
//! ```
//!
//! [`RunConfig`]: config::RunConfig

pub mod config;
pub mod report;
pub mod run;
