// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! One attempt to execute a stage of a frame.
//!
//! A job is *pending* while queued, *ready* once its cross-frame wait is
//! satisfied, *running* once placed on a core and *completed* when
//! [`Job::try_exec`] returns `true`. A spawn-stage job that finds the frame
//! pool empty stays running and is retried on a later step.
//!
//! Replicas of a split stage share a [`SplitCounter`]. Every replica but the
//! last one to finish only decrements the counter; the last one drives the
//! pipeline forward.

use std::cell::Cell;
use std::rc::Rc;

use crate::flow::Flow;
use crate::frame::{FrameId, FramePool};
use crate::pipeline::Pipeline;
use crate::types::{FrameNumber, SimError, SimTime};

/// Replicas of a split stage still to finish.
pub type SplitCounter = Rc<Cell<usize>>;

#[derive(Clone, Debug)]
pub struct Job {
    stage: usize,
    frame: FrameId,
    frame_number: FrameNumber,
    duration: SimTime,
    split: Option<SplitCounter>,
}

impl Job {
    #[must_use]
    pub fn new(
        stage: usize,
        frame: FrameId,
        frame_number: FrameNumber,
        duration: SimTime,
        split: Option<SplitCounter>,
    ) -> Self {
        Self {
            stage,
            frame,
            frame_number,
            duration,
            split,
        }
    }

    #[must_use]
    pub fn stage(&self) -> usize {
        self.stage
    }

    #[must_use]
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    #[must_use]
    pub fn frame_number(&self) -> FrameNumber {
        self.frame_number
    }

    #[must_use]
    pub fn duration(&self) -> SimTime {
        self.duration
    }

    #[must_use]
    pub fn split(&self) -> Option<&SplitCounter> {
        self.split.as_ref()
    }

    /// A job is ready unless its stage waits for a tag and the previous frame
    /// is still in flight without every stage of that tag completed.
    #[must_use]
    pub fn is_ready(&self, flow: &Flow, pool: &FramePool) -> bool {
        let Some(tag) = flow.stage(self.stage).waits_for_tag else {
            return true;
        };
        if self.frame_number == 0 {
            return true;
        }
        match pool.find_in_flight(self.frame_number - 1) {
            None => true,
            Some(previous) => previous.tally(tag) == flow.count_stage(tag),
        }
    }

    /// Attempt to complete this job at `time`.
    ///
    /// Returns `Ok(false)` when this is the spawn stage and no frame slot is
    /// free to start the next frame.
    pub fn try_exec(&self, time: SimTime, pipeline: &mut Pipeline) -> Result<bool, SimError> {
        let flow = Rc::clone(pipeline.flow());
        let stage = flow.stage(self.stage);
        let spawns = flow.spawns_next_frame(self.stage);

        if spawns && pipeline.pool().is_empty() {
            return Ok(false);
        }

        if let Some(counter) = &self.split
            && counter.get() > 1
        {
            counter.set(counter.get() - 1);
            return Ok(true);
        }

        if spawns && stage.spawn_has_priority {
            pipeline.request_frame();
        }

        let is_terminal = flow.is_terminal(self.stage);
        if !is_terminal {
            pipeline.create_jobs(self.stage + 1, self.frame)?;
        }

        if spawns && !stage.spawn_has_priority {
            pipeline.request_frame();
        }

        // The tally is recorded before release as releasing clears it.
        pipeline
            .pool_mut()
            .frame_mut(self.frame)?
            .record_completion(stage.tag);

        if is_terminal {
            pipeline.release_frame(self.frame, time)?;
        }

        Ok(true)
    }
}
