// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Jobs waiting for a core.

use std::collections::VecDeque;

use itertools::Itertools;
use serde::Serialize;

use crate::flow::Flow;
use crate::frame::FramePool;
use crate::job::Job;
use crate::types::FrameNumber;

/// Summary of a queued job for debug listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueEntry {
    pub frame: FrameNumber,
    pub stage: String,
    pub stage_index: usize,
    pub ready: bool,
}

/// FIFO of pending jobs.
///
/// In priority mode the jobs of older frames are considered first; jobs of
/// the same frame keep their insertion order.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
    priority: bool,
}

impl JobQueue {
    #[must_use]
    pub fn new(priority: bool) -> Self {
        Self {
            jobs: VecDeque::new(),
            priority,
        }
    }

    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    #[must_use]
    pub fn has_ready(&self, flow: &Flow, pool: &FramePool) -> bool {
        self.jobs.iter().any(|j| j.is_ready(flow, pool))
    }

    /// Remove and return the first ready job.
    pub fn pop_ready(&mut self, flow: &Flow, pool: &FramePool) -> Option<Job> {
        if self.priority {
            self.jobs
                .make_contiguous()
                .sort_by_key(Job::frame_number);
        }
        let position = self.jobs.iter().position(|j| j.is_ready(flow, pool))?;
        self.jobs.remove(position)
    }

    /// Jobs in the order they would be considered for assignment.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_> {
        if self.priority {
            Box::new(self.jobs.iter().sorted_by_key(|j| j.frame_number()))
        } else {
            Box::new(self.jobs.iter())
        }
    }

    #[must_use]
    pub fn entries(&self, flow: &Flow, pool: &FramePool) -> Vec<QueueEntry> {
        self.iter()
            .map(|j| QueueEntry {
                frame: j.frame_number(),
                stage: flow.stage(j.stage()).name.clone(),
                stage_index: j.stage(),
                ready: j.is_ready(flow, pool),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use framepace_track::entity::toplevel;
    use framepace_track::tracker::dev_null_tracker;

    use super::*;
    use crate::flow::StageDescriptor;
    use crate::frame::FrameId;

    fn setup() -> (Flow, FramePool, [FrameId; 2]) {
        let top = toplevel(&dev_null_tracker(), "top");
        let flow = Flow::new(
            "queue",
            20.0,
            vec![StageDescriptor::new("A"), StageDescriptor::new("B")],
        )
        .unwrap();
        let mut pool = FramePool::new(&top, 3);
        let slots = [pool.acquire().unwrap(), pool.acquire().unwrap()];
        (flow, pool, slots)
    }

    fn order(queue: &mut JobQueue, flow: &Flow, pool: &FramePool) -> Vec<(FrameNumber, usize)> {
        std::iter::from_fn(|| queue.pop_ready(flow, pool))
            .map(|j| (j.frame_number(), j.stage()))
            .collect()
    }

    fn fill(queue: &mut JobQueue, [slot0, slot1]: [FrameId; 2]) {
        queue.push(Job::new(0, slot1, 1, 10.0, None));
        queue.push(Job::new(1, slot0, 0, 10.0, None));
        queue.push(Job::new(0, slot0, 0, 10.0, None));
    }

    #[test]
    fn fifo_order() {
        let (flow, pool, slots) = setup();
        let mut queue = JobQueue::new(false);
        fill(&mut queue, slots);
        assert_eq!(order(&mut queue, &flow, &pool), vec![(1, 0), (0, 1), (0, 0)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn priority_order_is_stable_per_frame() {
        let (flow, pool, slots) = setup();
        let mut queue = JobQueue::new(true);
        fill(&mut queue, slots);

        let listed: Vec<_> = queue
            .entries(&flow, &pool)
            .into_iter()
            .map(|e| (e.frame, e.stage_index))
            .collect();
        assert_eq!(listed, vec![(0, 1), (0, 0), (1, 0)]);
        assert_eq!(order(&mut queue, &flow, &pool), listed);
    }
}
