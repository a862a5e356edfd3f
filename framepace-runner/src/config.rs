// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Run configuration gathered from several sources.
//!
//! Values are layered, each source overriding the previous one:
//!
//!  1. built-in defaults ([`RunConfig::default`]),
//!  2. an optional TOML file given with `--config`,
//!  3. environment variables prefixed with `FRAMEPACE_` (nested keys are
//!     separated by `__`, for example `FRAMEPACE_SIMULATION__CORE_COUNT=8`),
//!  4. options given on the command line.
//!
//! Command-line options only override the other sources when they are
//! actually given.

use std::path::{Path, PathBuf};

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use framepace_engine::option::{ControlOption, SimulationOption};
use framepace_track::builder::{TrackerConfig, TrackersConfig};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "FRAMEPACE_";

/// Everything needed to run a flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// YAML flow definition.
    pub flow: PathBuf,

    /// Step ceiling for a manually stepped run.
    pub steps: u64,

    /// Number of runs; every run but the last is kept for comparison.
    pub runs: usize,

    pub simulation: SimulationOption,
    pub control: ControlOption,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            flow: PathBuf::from("flow.yaml"),
            steps: 500,
            runs: 1,
            simulation: SimulationOption::default(),
            control: ControlOption::default(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError(e.to_string())
    }
}

impl RunConfig {
    /// Defaults, then `conf_file` (when given), then the environment.
    #[must_use]
    pub fn figment(conf_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(RunConfig::default()));
        if let Some(conf_file) = conf_file {
            figment = figment.merge(Toml::file(conf_file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Gather the configuration from every source.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(conf_file) = &cli.config {
            if conf_file.is_dir() {
                return Err(ConfigError(format!(
                    "{} is not a file path",
                    conf_file.display()
                )));
            }
            if !conf_file.exists() {
                return Err(ConfigError(format!("{} not found", conf_file.display())));
            }
        }

        let mut config: RunConfig = Self::figment(cli.config.as_deref()).extract()?;
        cli.merge_into(&mut config);
        Ok(config)
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(about = "Simulate frames flowing through a pipeline of stages on a set of cores")]
pub struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    pub stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    pub stdout_level: log::Level,

    /// Set a regular expression for which entities should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    pub stdout_filter_regex: String,

    /// Write a text log to this file.
    #[arg(long)]
    pub log_file: Option<String>,

    /// Level of log message written to `--log-file`.
    #[arg(long, default_value = "Debug")]
    pub log_level: log::Level,

    /// Set a regular expression for which entities should have file logging
    /// level set to `--log-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    pub log_filter_regex: String,

    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Flow file.
    #[arg(long)]
    pub flow: Option<PathBuf>,

    /// Number of cores.
    #[arg(long)]
    pub cores: Option<usize>,

    /// Number of frames that can be in flight at once.
    #[arg(long)]
    pub frame_pool_size: Option<usize>,

    /// Amount of jitter applied to job durations (0 to 1).
    #[arg(long)]
    pub jitter: Option<f64>,

    /// Largest factor by which jitter can stretch a job.
    #[arg(long)]
    pub jitter_ceiling: Option<f64>,

    /// Seed for the jitter generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Draw a fresh seed for every run.
    #[arg(long)]
    pub auto_seed: bool,

    /// Run the jobs of the oldest frame first.
    #[arg(long)]
    pub priority_queue: bool,

    /// Step ceiling for a manually stepped run.
    #[arg(long)]
    pub steps: Option<u64>,

    /// Step until the step ceiling in a single tick.
    #[arg(long)]
    pub auto_step: bool,

    /// Step ceiling used with `--auto-step`.
    #[arg(long)]
    pub max_auto_step: Option<u64>,

    /// Number of runs to compare.
    #[arg(long)]
    pub runs: Option<usize>,

    /// Print every timeline record.
    #[arg(long)]
    pub timeline: bool,

    /// Print the jobs still queued at the end of the run.
    #[arg(long)]
    pub queue: bool,

    /// Show a progress bar of executed steps.
    #[arg(long)]
    pub progress: bool,
}

impl Cli {
    /// Override `config` with every option given on the command line.
    pub fn merge_into(&self, config: &mut RunConfig) {
        if let Some(flow) = &self.flow {
            config.flow = flow.clone();
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }

        let simulation = &mut config.simulation;
        if let Some(cores) = self.cores {
            simulation.core_count = cores;
        }
        if let Some(frame_pool_size) = self.frame_pool_size {
            simulation.frame_pool_size = frame_pool_size;
        }
        if let Some(jitter) = self.jitter {
            simulation.jitter = jitter;
        }
        if let Some(jitter_ceiling) = self.jitter_ceiling {
            simulation.jitter_ceiling = jitter_ceiling;
        }
        if let Some(seed) = self.seed {
            simulation.seed = seed;
        }
        if self.auto_seed {
            simulation.auto_seed = true;
        }
        if self.priority_queue {
            simulation.priority_queue = true;
        }

        if self.auto_step {
            config.control.auto_step = true;
        }
        if let Some(max_auto_step) = self.max_auto_step {
            config.control.max_auto_step = max_auto_step;
        }
    }

    #[must_use]
    pub fn trackers_config(&self) -> TrackersConfig<'_> {
        TrackersConfig {
            stdout: TrackerConfig {
                enable: self.stdout,
                level: self.stdout_level,
                filter_regex: &self.stdout_filter_regex,
                file: None,
            },
            file: TrackerConfig {
                enable: self.log_file.is_some(),
                level: self.log_level,
                filter_regex: &self.log_filter_regex,
                file: self.log_file.as_deref(),
            },
        }
    }
}
