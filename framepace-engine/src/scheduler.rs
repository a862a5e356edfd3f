// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The step-driven scheduler.
//!
//! A [`Scheduler`] owns the cores and the [`Pipeline`] state. The caller
//! drives it one [`Scheduler::step`] at a time; every step performs exactly
//! one transition, in this order of preference:
//!
//!  1. **admit** a requested frame when the pool has a free slot,
//!  2. **complete** the job of the first core (by time, then index) able to
//!     finish, when no core is idle or no queued job is ready; every core
//!     ordered before it catches up to its time,
//!  3. **assign** the next ready job to the earliest idle core.
//!
//! A scheduler that hits an internal inconsistency (for example a deadlock
//! caused by a frame pool too small for the flow) returns an error and keeps
//! returning it on every later step.

use std::rc::Rc;

use framepace_track::entity::Entity;
use framepace_track::{debug, error, info, warn};

use crate::cores::{Core, CoreId};
use crate::flow::Flow;
use crate::option::SimulationOption;
use crate::pipeline::Pipeline;
use crate::queue::QueueEntry;
use crate::sim_error;
use crate::timeline::{FrameRateRecord, TimelineRecord};
use crate::types::{FrameNumber, SimError, SimResult, SimTime};

/// What a call to [`Scheduler::step`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// A new frame entered the pipeline.
    Admitted { frame: FrameNumber },

    /// A core finished its job.
    Completed {
        core: CoreId,
        frame: FrameNumber,
        stage: usize,
    },

    /// A ready job was placed on an idle core.
    Assigned {
        core: CoreId,
        frame: FrameNumber,
        stage: usize,
        start: SimTime,
        end: SimTime,
    },

    /// Nothing is queued, running or requested.
    Drained,

    /// The scheduler has been frozen.
    Frozen,
}

pub struct Scheduler {
    entity: Rc<Entity>,
    name: String,
    option: SimulationOption,
    cores: Vec<Core>,
    pipeline: Pipeline,
    step_count: u64,
    frozen: bool,
    poisoned: Option<SimError>,
}

impl Scheduler {
    /// Build a scheduler for `flow` and request the first frame.
    ///
    /// Out-of-range options are clamped (and reported as warnings). When
    /// `auto_seed` is set a fresh seed is drawn; [`Scheduler::seed`] returns
    /// the one in use.
    pub fn new(
        parent: &Rc<Entity>,
        flow: Rc<Flow>,
        option: &SimulationOption,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, "sim"));

        let (mut option, adjustments) = option.normalised();
        for adjustment in adjustments.iter().chain(flow.adjustments()) {
            warn!(entity ; "{}", adjustment);
        }
        if option.auto_seed {
            option.seed = rand::random();
        }

        let cores = (0..option.core_count)
            .map(|i| Core::new(&entity, i))
            .collect();
        let mut pipeline = Pipeline::new(&entity, flow.clone(), &option);
        pipeline.request_frame();

        info!(entity ; "flow '{}' on {} cores, frame pool {}, seed {}", flow.name(), option.core_count, option.frame_pool_size, option.seed);

        Self {
            entity,
            name: flow.name().to_string(),
            option,
            cores,
            pipeline,
            step_count: 0,
            frozen: false,
            poisoned: None,
        }
    }

    /// Perform one transition.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        if let Some(e) = &self.poisoned {
            return Err(e.clone());
        }
        if self.frozen {
            return Ok(StepOutcome::Frozen);
        }
        if self.is_drained() {
            return Ok(StepOutcome::Drained);
        }

        self.step_count += 1;
        match self.advance() {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(self.entity ; "{}", e);
                self.poisoned = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Call [`Scheduler::step`] `steps` times.
    pub fn run(&mut self, steps: u64) -> SimResult {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Step until drained or frozen, or until `max_steps` steps have been
    /// executed in total. Returns the number of steps executed by this call.
    pub fn run_bounded(&mut self, max_steps: u64) -> Result<u64, SimError> {
        let before = self.step_count;
        while self.step_count < max_steps {
            match self.step()? {
                StepOutcome::Drained | StepOutcome::Frozen => break,
                _ => {}
            }
        }
        Ok(self.step_count - before)
    }

    /// Stop the run; later steps are no-ops.
    pub fn freeze(&mut self, label: &str) {
        self.frozen = true;
        self.name = label.to_string();
        debug!(self.entity ; "frozen as '{}'", label);
    }

    fn is_drained(&self) -> bool {
        self.pipeline.queue().is_empty()
            && self.pipeline.pending_requests() == 0
            && self.cores.iter().all(Core::is_idle)
    }

    fn advance(&mut self) -> Result<StepOutcome, SimError> {
        if self.pipeline.pending_requests() > 0 && !self.pipeline.pool().is_empty() {
            let frame = self.pipeline.admit()?;
            return Ok(StepOutcome::Admitted { frame });
        }

        self.cores.sort_by(Core::schedule_order);
        let idle = self.cores.iter().position(Core::is_idle);

        match idle {
            Some(index) if self.pipeline.has_ready() => self.assign(index),
            _ => self.complete(),
        }
    }

    fn assign(&mut self, index: usize) -> Result<StepOutcome, SimError> {
        let Some(job) = self.pipeline.pop_ready() else {
            return sim_error!("step {}: no ready job to assign", self.step_count);
        };

        let core = &mut self.cores[index];
        let start = core.time();
        self.pipeline.record_assignment(core.id().0, &job, start)?;

        let outcome = StepOutcome::Assigned {
            core: core.id(),
            frame: job.frame_number(),
            stage: job.stage(),
            start,
            end: start + job.duration(),
        };
        core.assign(job);
        Ok(outcome)
    }

    fn complete(&mut self) -> Result<StepOutcome, SimError> {
        for index in 0..self.cores.len() {
            if let Some(job) = self.cores[index].try_exec(&mut self.pipeline)? {
                let time = self.cores[index].time();
                for other in &mut self.cores[..index] {
                    other.advance_to(time);
                }
                return Ok(StepOutcome::Completed {
                    core: self.cores[index].id(),
                    frame: job.frame_number(),
                    stage: job.stage(),
                });
            }
        }

        let blocked = self
            .cores
            .iter()
            .filter_map(|c| c.job().map(|j| (j.frame_number(), j.stage())))
            .map(|(frame, stage)| {
                let name = &self.pipeline.flow().stage(stage).name;
                format!("frame {frame} stage '{name}'")
            })
            .collect::<Vec<_>>();
        let queued = self
            .pipeline
            .queue()
            .entries(self.pipeline.flow(), self.pipeline.pool())
            .into_iter()
            .map(|e| format!("frame {} stage '{}'", e.frame, e.stage))
            .collect::<Vec<_>>();
        sim_error!(
            "step {}: deadlock, no core can make progress (running: [{}], queued: [{}], {} of {} frames in flight)",
            self.step_count,
            blocked.join(", "),
            queued.join(", "),
            self.pipeline.pool().num_in_flight(),
            self.pipeline.pool().capacity()
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn flow(&self) -> &Rc<Flow> {
        self.pipeline.flow()
    }

    /// Effective options (normalised, with the seed in use).
    #[must_use]
    pub fn option(&self) -> &SimulationOption {
        &self.option
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.option.seed
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Cores in their current scheduling order.
    #[must_use]
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    #[must_use]
    pub fn timeline(&self) -> &[TimelineRecord] {
        self.pipeline.timeline().records()
    }

    #[must_use]
    pub fn frame_rates(&self) -> &[FrameRateRecord] {
        self.pipeline.timeline().frame_rates()
    }

    #[must_use]
    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.pipeline
            .queue()
            .entries(self.pipeline.flow(), self.pipeline.pool())
    }

    /// Number of timeline records intersecting `[min, max]`.
    #[must_use]
    pub fn visible_record_count(&self, min: SimTime, max: SimTime) -> usize {
        self.pipeline.timeline().visible_count(min, max)
    }

    #[must_use]
    pub fn frames_available(&self) -> usize {
        self.pipeline.pool().num_available()
    }

    #[must_use]
    pub fn frames_in_flight(&self) -> usize {
        self.pipeline.pool().num_in_flight()
    }

    #[must_use]
    pub fn in_flight_numbers(&self) -> Vec<FrameNumber> {
        self.pipeline.pool().in_flight_numbers()
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pipeline.pending_requests()
    }

    #[must_use]
    pub fn critical_path_time(&self) -> SimTime {
        self.pipeline.flow().critical_path_time()
    }

    /// Largest core time.
    #[must_use]
    pub fn makespan(&self) -> SimTime {
        self.cores.iter().map(Core::time).fold(0.0, f64::max)
    }
}
