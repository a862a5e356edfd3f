// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Simulated execution resources.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use framepace_track::entity::Entity;
use framepace_track::{debug, trace, value};
use serde::Serialize;

use crate::job::Job;
use crate::pipeline::Pipeline;
use crate::types::{SimError, SimTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CoreId(pub usize);

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core{}", self.0)
    }
}

/// A core with its own virtual clock running at most one job.
pub struct Core {
    entity: Rc<Entity>,
    id: CoreId,
    time: SimTime,
    job: Option<Job>,
    busy_time: SimTime,
}

impl Core {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, index: usize) -> Self {
        let id = CoreId(index);
        Self {
            entity: Rc::new(Entity::new(parent, &id.to_string())),
            id,
            time: 0.0,
            job: None,
            busy_time: 0.0,
        }
    }

    #[must_use]
    pub fn id(&self) -> CoreId {
        self.id
    }

    #[must_use]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[must_use]
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }

    /// Total duration of the jobs assigned to this core.
    #[must_use]
    pub fn busy_time(&self) -> SimTime {
        self.busy_time
    }

    /// Order in which cores are considered: earliest time first, then lowest
    /// index.
    #[must_use]
    pub fn schedule_order(a: &Core, b: &Core) -> Ordering {
        a.time.total_cmp(&b.time).then(a.id.cmp(&b.id))
    }

    /// Run `job` from the current time; the clock moves to its end.
    pub fn assign(&mut self, job: Job) {
        debug!(self.entity ; "frame {} stage {} [{}, {})", job.frame_number(), job.stage(), self.time, self.time + job.duration());
        self.time += job.duration();
        self.busy_time += job.duration();
        self.job = Some(job);
        value!(self.entity ; self.time);
    }

    /// Move an idle or blocked core forward; time never goes backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.time {
            trace!(self.entity ; "catch up {} -> {}", self.time, time);
            self.time = time;
            value!(self.entity ; self.time);
        }
    }

    /// Attempt to complete the current job, returning it on success.
    pub fn try_exec(&mut self, pipeline: &mut Pipeline) -> Result<Option<Job>, SimError> {
        let Some(job) = &self.job else {
            return Ok(None);
        };
        if !job.try_exec(self.time, pipeline)? {
            trace!(self.entity ; "frame {} stage {} blocked on the frame pool", job.frame_number(), job.stage());
            return Ok(None);
        }
        Ok(self.job.take())
    }
}
