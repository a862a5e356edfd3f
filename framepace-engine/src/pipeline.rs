// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! State that a completing job may touch.
//!
//! The [`Pipeline`] is owned by the
//! [`Scheduler`](crate::scheduler::Scheduler) alongside its cores, so that a
//! core can hand it to its job while the scheduler still holds the cores.

use std::cell::Cell;
use std::rc::Rc;

use framepace_track::entity::Entity;
use framepace_track::{debug, info, trace};

use crate::flow::Flow;
use crate::frame::{FrameId, FramePool};
use crate::jitter::Jitter;
use crate::job::Job;
use crate::option::SimulationOption;
use crate::queue::JobQueue;
use crate::timeline::{FrameRateRecord, RecordKind, Timeline, TimelineRecord};
use crate::types::{FrameNumber, SimError, SimResult, SimTime};

/// Lanes between the core lanes and the first frame-duration lane.
const FRAME_LANE_OFFSET: usize = 2;

pub struct Pipeline {
    entity: Rc<Entity>,
    flow: Rc<Flow>,
    pool: FramePool,
    queue: JobQueue,
    jitter: Jitter,
    timeline: Timeline,
    pending_requests: usize,
    core_count: usize,
}

impl Pipeline {
    /// `option` must already be normalised and carry the effective seed.
    #[must_use]
    pub fn new(entity: &Rc<Entity>, flow: Rc<Flow>, option: &SimulationOption) -> Self {
        Self {
            entity: entity.clone(),
            flow,
            pool: FramePool::new(entity, option.frame_pool_size),
            queue: JobQueue::new(option.priority_queue),
            jitter: Jitter::new(option.jitter, option.jitter_ceiling, option.seed),
            timeline: Timeline::default(),
            pending_requests: 0,
            core_count: option.core_count,
        }
    }

    #[must_use]
    pub fn flow(&self) -> &Rc<Flow> {
        &self.flow
    }

    #[must_use]
    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut FramePool {
        &mut self.pool
    }

    #[must_use]
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending_requests
    }

    /// Ask for one more frame to be admitted when the pool allows.
    pub fn request_frame(&mut self) {
        self.pending_requests += 1;
        trace!(self.entity ; "frame start requested ({} pending)", self.pending_requests);
    }

    /// Admit a requested frame and queue the jobs of its first stage.
    pub fn admit(&mut self) -> Result<FrameNumber, SimError> {
        let frame = self.pool.acquire()?;
        let number = self.pool.frame(frame)?.number();
        self.create_jobs(0, frame)?;
        self.pending_requests = self.pending_requests.saturating_sub(1);
        debug!(self.entity ; "admitted frame {}", number);
        Ok(number)
    }

    /// Queue the job(s) of `stage` for `frame`; a split stage gets one job per
    /// replica sharing a counter.
    pub fn create_jobs(&mut self, stage: usize, frame: FrameId) -> SimResult {
        let frame_number = self.pool.frame(frame)?.number();
        let split_count = self.flow.stage(stage).split_count;
        let counter = (split_count > 1).then(|| Rc::new(Cell::new(split_count)));
        let nominal = self.flow.stage_duration(stage);

        for _ in 0..split_count {
            let duration = nominal * self.jitter.generate();
            self.queue.push(Job::new(
                stage,
                frame,
                frame_number,
                duration,
                counter.clone(),
            ));
        }
        trace!(self.entity ; "queued {} job(s) for frame {} stage {}", split_count, frame_number, self.flow.stage(stage).name);
        Ok(())
    }

    /// Remove the next ready job from the queue.
    pub fn pop_ready(&mut self) -> Option<Job> {
        self.queue.pop_ready(&self.flow, &self.pool)
    }

    #[must_use]
    pub fn has_ready(&self) -> bool {
        self.queue.has_ready(&self.flow, &self.pool)
    }

    /// Record a job being placed on a core.
    pub fn record_assignment(&mut self, lane: usize, job: &Job, start: SimTime) -> SimResult {
        let stage = job.stage();
        if stage == 0 {
            self.pool.frame_mut(job.frame())?.stamp_start(start);
        }

        let kind = if self.flow.is_terminal(stage) {
            RecordKind::FrameExit
        } else if stage == 0 {
            RecordKind::FrameEntry
        } else {
            RecordKind::Normal
        };

        let descriptor = self.flow.stage(stage);
        self.timeline.push_record(TimelineRecord {
            lane,
            frame: Some(job.frame_number()),
            start,
            end: start + job.duration(),
            name: descriptor.name.clone(),
            tag: descriptor.tag,
            kind,
        });
        Ok(())
    }

    /// Release a completed frame and record its latency.
    pub fn release_frame(&mut self, frame: FrameId, time: SimTime) -> SimResult {
        let release = self.pool.release(frame, time)?;

        self.timeline.push_frame_rate(FrameRateRecord {
            timestamp: release.end,
            delta: release.delta,
            latency: release.latency,
        });

        let slot = (release.number % self.pool.capacity() as FrameNumber) as usize;
        self.timeline.push_record(TimelineRecord {
            lane: self.core_count + FRAME_LANE_OFFSET + slot,
            frame: None,
            start: release.start,
            end: release.end,
            name: format!("{}", release.latency),
            tag: slot as i32,
            kind: RecordKind::FrameDuration,
        });
        self.timeline.push_record(TimelineRecord {
            lane: self.core_count,
            frame: None,
            start: release.end,
            end: release.end,
            name: format!("{}", release.delta),
            tag: 0,
            kind: RecordKind::FrameRateMarker,
        });

        info!(self.entity ; "frame {} complete at {} (latency {})", release.number, release.end, release.latency);
        Ok(())
    }
}
