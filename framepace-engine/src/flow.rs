// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Pipeline definitions.
//!
//! A [`Flow`] is the ordered list of [`StageDescriptor`]s that every frame
//! goes through, plus the nominal duration of a whole frame. The duration of
//! each stage is derived from its weight and split count:
//!
//! ```text
//! stage_duration(i) = duration * weight_i / (sum(weights) * split_count_i)
//! ```
//!
//! Flows can be written by hand or loaded from YAML:
//!
//! ```yaml
//! name: Frame Centric
//! duration: 33.0
//! stages:
//!   - name: Simulation
//!     spawns_next_frame: true
//!   - name: Render
//!     weight: 2.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim_error;
use crate::types::{SimError, SimTime};

/// One step of a [`Flow`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDescriptor {
    /// Display name.
    pub name: String,

    /// Share of the flow duration given to this stage.
    pub weight: f64,

    /// Number of parallel replicas (fan-out), joined again on completion.
    pub split_count: usize,

    /// Join tag recorded in the frame tally when this stage completes.
    pub tag: i32,

    /// Gate this stage until the previous frame has completed every stage
    /// carrying this tag.
    pub waits_for_tag: Option<i32>,

    /// Completing this stage requests the start of the next frame.
    pub spawns_next_frame: bool,

    /// Request the next frame before creating the successor stage's jobs.
    pub spawn_has_priority: bool,

    /// Completing this stage releases the frame (only the terminal stage).
    pub releases_frame: bool,
}

impl Default for StageDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: 1.0,
            split_count: 1,
            tag: 0,
            waits_for_tag: None,
            spawns_next_frame: false,
            spawn_has_priority: false,
            releases_frame: false,
        }
    }
}

impl StageDescriptor {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn with_split(mut self, split_count: usize) -> Self {
        self.split_count = split_count;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: i32) -> Self {
        self.tag = tag;
        self
    }

    #[must_use]
    pub fn waits_for(mut self, tag: i32) -> Self {
        self.waits_for_tag = Some(tag);
        self
    }

    /// Mark this stage as the one that requests the next frame.
    #[must_use]
    pub fn spawns_next_frame(mut self, with_priority: bool) -> Self {
        self.spawns_next_frame = true;
        self.spawn_has_priority = with_priority;
        self
    }
}

/// An immutable, validated pipeline definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Flow {
    name: String,
    duration: SimTime,
    stages: Vec<StageDescriptor>,
    spawn_stage: Option<usize>,
    weight_sum: f64,
    adjustments: Vec<String>,
}

impl Flow {
    /// Validate and normalise a list of stages into a flow.
    ///
    /// Structural defects are rejected. Values that can be repaired (a zero
    /// split count, a `releases_frame` flag on the wrong stage) are fixed and
    /// described in [`Flow::adjustments`].
    pub fn new(
        name: &str,
        duration: SimTime,
        mut stages: Vec<StageDescriptor>,
    ) -> Result<Self, SimError> {
        if stages.is_empty() {
            return sim_error!("Flow '{}' has no stages", name);
        }
        if !duration.is_finite() || duration < 0.0 {
            return sim_error!("Flow '{}' has invalid duration {}", name, duration);
        }
        if let Some(stage) = stages
            .iter()
            .find(|s| !s.weight.is_finite() || s.weight < 0.0)
        {
            return sim_error!(
                "Flow '{}' stage '{}' has invalid weight {}",
                name,
                stage.name,
                stage.weight
            );
        }

        let weight_sum: f64 = stages.iter().map(|s| s.weight).sum();
        if weight_sum <= 0.0 {
            return sim_error!("Flow '{}' stage weights sum to zero", name);
        }

        let spawners: Vec<usize> = stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.spawns_next_frame)
            .map(|(i, _)| i)
            .collect();
        if spawners.len() > 1 {
            return sim_error!(
                "Flow '{}' has {} stages that spawn the next frame (at most one allowed)",
                name,
                spawners.len()
            );
        }

        let mut adjustments = Vec::new();
        let terminal = stages.len() - 1;
        for (i, stage) in stages.iter_mut().enumerate() {
            if stage.split_count < 1 {
                adjustments.push(format!(
                    "stage '{}' split_count {} raised to 1",
                    stage.name, stage.split_count
                ));
                stage.split_count = 1;
            }
            if i != terminal && stage.releases_frame {
                adjustments.push(format!(
                    "stage '{}' cannot release the frame, only the last stage does",
                    stage.name
                ));
                stage.releases_frame = false;
            }
        }
        stages[terminal].releases_frame = true;

        for stage in &stages {
            if let Some(tag) = stage.waits_for_tag
                && !stages.iter().any(|s| s.tag == tag)
            {
                adjustments.push(format!(
                    "stage '{}' waits for tag {} that no stage carries",
                    stage.name, tag
                ));
            }
        }

        Ok(Self {
            name: name.to_string(),
            duration,
            stages,
            spawn_stage: spawners.first().copied(),
            weight_sum,
            adjustments,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nominal duration of one whole frame.
    #[must_use]
    pub fn duration(&self) -> SimTime {
        self.duration
    }

    #[must_use]
    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    #[must_use]
    pub fn stage(&self, index: usize) -> &StageDescriptor {
        &self.stages[index]
    }

    #[must_use]
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Index of the stage allowed to request the next frame, if any.
    #[must_use]
    pub fn spawn_stage(&self) -> Option<usize> {
        self.spawn_stage
    }

    #[must_use]
    pub fn spawns_next_frame(&self, index: usize) -> bool {
        self.spawn_stage == Some(index)
    }

    #[must_use]
    pub fn is_terminal(&self, index: usize) -> bool {
        index + 1 == self.stages.len()
    }

    /// Repairs made while building the flow, in a form suitable for logging.
    #[must_use]
    pub fn adjustments(&self) -> &[String] {
        &self.adjustments
    }

    /// Duration of one replica of stage `index` before jitter.
    #[must_use]
    pub fn stage_duration(&self, index: usize) -> SimTime {
        let stage = &self.stages[index];
        self.duration * stage.weight / (self.weight_sum * stage.split_count as f64)
    }

    /// Number of stages carrying the join `tag`.
    #[must_use]
    pub fn count_stage(&self, tag: i32) -> usize {
        self.stages.iter().filter(|s| s.tag == tag).count()
    }

    /// Sum of every stage's apportioned duration.
    #[must_use]
    pub fn critical_path_time(&self) -> SimTime {
        (0..self.stages.len()).map(|i| self.stage_duration(i)).sum()
    }
}

/// On-disk description of a [`Flow`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowFile {
    pub name: String,
    pub duration: SimTime,
    pub stages: Vec<StageDescriptor>,
}

impl FlowFile {
    pub fn from_file(flow_path: &Path) -> Result<Self, SimError> {
        let s = std::fs::read_to_string(flow_path)
            .map_err(|e| SimError(format!("Unable to read {}: {e}", flow_path.display())))?;
        Self::from_string(&s)
    }

    pub fn from_string(flow_str: &str) -> Result<Self, SimError> {
        serde_yaml::from_str(flow_str)
            .map_err(|e| SimError(format!("serde_yaml::from_str failed: {e}")))
    }

    pub fn into_flow(self) -> Result<Flow, SimError> {
        Flow::new(&self.name, self.duration, self.stages)
    }
}

impl From<&Flow> for FlowFile {
    fn from(flow: &Flow) -> Self {
        Self {
            name: flow.name.clone(),
            duration: flow.duration,
            stages: flow.stages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn two_stage() -> Flow {
        Flow::new(
            "serial",
            200.0,
            vec![StageDescriptor::new("a"), StageDescriptor::new("b")],
        )
        .unwrap()
    }

    #[test]
    fn durations_are_apportioned() {
        let flow = Flow::new(
            "weighted",
            300.0,
            vec![
                StageDescriptor::new("a"),
                StageDescriptor::new("b").with_weight(2.0).with_split(4),
            ],
        )
        .unwrap();
        assert_relative_eq!(flow.stage_duration(0), 100.0);
        assert_relative_eq!(flow.stage_duration(1), 50.0);
        assert_relative_eq!(flow.critical_path_time(), 150.0);
    }

    #[test]
    fn terminal_stage_releases() {
        let flow = two_stage();
        assert!(!flow.stage(0).releases_frame);
        assert!(flow.stage(1).releases_frame);
        assert!(flow.is_terminal(1));
        assert!(!flow.is_terminal(0));
        assert!(flow.adjustments().is_empty());
    }

    #[test]
    fn count_stage_by_tag() {
        let flow = Flow::new(
            "tags",
            10.0,
            vec![
                StageDescriptor::new("a").with_tag(1),
                StageDescriptor::new("b").with_tag(2),
                StageDescriptor::new("c").with_tag(1),
            ],
        )
        .unwrap();
        assert_eq!(flow.count_stage(1), 2);
        assert_eq!(flow.count_stage(2), 1);
        assert_eq!(flow.count_stage(3), 0);
    }

    #[test]
    fn spawn_stage_is_found() {
        let flow = Flow::new(
            "spawn",
            10.0,
            vec![
                StageDescriptor::new("a"),
                StageDescriptor::new("b").spawns_next_frame(true),
            ],
        )
        .unwrap();
        assert_eq!(flow.spawn_stage(), Some(1));
        assert!(flow.spawns_next_frame(1));
        assert!(!flow.spawns_next_frame(0));
        assert!(flow.stage(1).spawn_has_priority);
    }

    #[test]
    fn repairs_are_recorded() {
        let mut first = StageDescriptor::new("a").with_split(0);
        first.releases_frame = true;
        let flow = Flow::new(
            "repair",
            10.0,
            vec![first, StageDescriptor::new("b").waits_for(9)],
        )
        .unwrap();
        assert_eq!(flow.stage(0).split_count, 1);
        assert!(!flow.stage(0).releases_frame);
        assert_eq!(flow.adjustments().len(), 3);
    }

    #[test]
    fn yaml_defaults() {
        let file = FlowFile::from_string(
            "name: yaml\nduration: 60\nstages:\n  - name: a\n    spawns_next_frame: true\n  - name: b\n    weight: 2\n    tag: 3\n    waits_for_tag: 3\n",
        )
        .unwrap();
        let flow = file.into_flow().unwrap();
        assert_eq!(flow.name(), "yaml");
        assert_eq!(flow.spawn_stage(), Some(0));
        assert_eq!(flow.stage(1).waits_for_tag, Some(3));
        assert_eq!(flow.stage(0).split_count, 1);
        assert_relative_eq!(flow.stage_duration(1), 40.0);
    }

    #[test]
    fn flow_file_round_trips_through_yaml() {
        let flow = two_stage();
        let text = serde_yaml::to_string(&FlowFile::from(&flow)).unwrap();
        let reloaded = FlowFile::from_string(&text).unwrap().into_flow().unwrap();
        assert_eq!(reloaded, flow);
    }
}
