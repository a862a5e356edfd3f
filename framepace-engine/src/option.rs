// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Options consumed by a [`Scheduler`](crate::scheduler::Scheduler) and the
//! [`Workbench`](crate::workbench::Workbench) that drives it.

use serde::{Deserialize, Serialize};

/// Resources and randomness used by a single simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOption {
    /// Number of simulated cores.
    pub core_count: usize,

    /// Number of frames that can be in flight at once.
    pub frame_pool_size: usize,

    /// Amount of jitter applied to job durations, 0 disables it.
    pub jitter: f64,

    /// Upper bound of the jitter multiplier when `jitter == 1`.
    pub jitter_ceiling: f64,

    /// Seed for the jitter generator.
    pub seed: u64,

    /// Draw a fresh seed every time a scheduler is built.
    pub auto_seed: bool,

    /// Pop ready jobs of the oldest frame first rather than in FIFO order.
    pub priority_queue: bool,
}

impl Default for SimulationOption {
    fn default() -> Self {
        Self {
            core_count: 4,
            frame_pool_size: 3,
            jitter: 0.0,
            jitter_ceiling: 2.0,
            seed: 0,
            auto_seed: false,
            priority_queue: false,
        }
    }
}

impl SimulationOption {
    /// Return a copy with every value brought into its valid range together
    /// with a description of each adjustment made.
    #[must_use]
    pub fn normalised(&self) -> (Self, Vec<String>) {
        let mut option = self.clone();
        let mut adjustments = Vec::new();

        if option.core_count < 1 {
            adjustments.push(format!("core_count {} raised to 1", option.core_count));
            option.core_count = 1;
        }
        if option.frame_pool_size < 1 {
            adjustments.push(format!(
                "frame_pool_size {} raised to 1",
                option.frame_pool_size
            ));
            option.frame_pool_size = 1;
        }
        if !option.jitter.is_finite() {
            adjustments.push(format!("jitter {} replaced by 0", option.jitter));
            option.jitter = 0.0;
        } else if !(0.0..=1.0).contains(&option.jitter) {
            let clamped = option.jitter.clamp(0.0, 1.0);
            adjustments.push(format!("jitter {} clamped to {clamped}", option.jitter));
            option.jitter = clamped;
        }
        if !option.jitter_ceiling.is_finite() || option.jitter_ceiling < 1.0 {
            adjustments.push(format!(
                "jitter_ceiling {} raised to 1",
                option.jitter_ceiling
            ));
            option.jitter_ceiling = 1.0;
        }

        (option, adjustments)
    }
}

/// How a [`Workbench`](crate::workbench::Workbench) tick drives its
/// scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlOption {
    /// Step repeatedly on every tick instead of once.
    pub auto_step: bool,

    /// Step ceiling for auto-stepping.
    pub max_auto_step: u64,
}

impl Default for ControlOption {
    fn default() -> Self {
        Self {
            auto_step: false,
            max_auto_step: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_valid() {
        let (option, adjustments) = SimulationOption::default().normalised();
        assert_eq!(option, SimulationOption::default());
        assert!(adjustments.is_empty());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let option = SimulationOption {
            core_count: 0,
            frame_pool_size: 0,
            jitter: 1.5,
            jitter_ceiling: 0.5,
            ..Default::default()
        };
        let (option, adjustments) = option.normalised();
        assert_eq!(option.core_count, 1);
        assert_eq!(option.frame_pool_size, 1);
        assert_eq!(option.jitter, 1.0);
        assert_eq!(option.jitter_ceiling, 1.0);
        assert_eq!(adjustments.len(), 4);
    }

    #[test]
    fn nan_jitter_is_disabled() {
        let option = SimulationOption {
            jitter: f64::NAN,
            ..Default::default()
        };
        let (option, adjustments) = option.normalised();
        assert_eq!(option.jitter, 0.0);
        assert_eq!(adjustments, vec!["jitter NaN replaced by 0"]);
    }
}
