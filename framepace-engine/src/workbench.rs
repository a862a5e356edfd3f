// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Drive a scheduler tick by tick and keep frozen runs for comparison.

use std::rc::Rc;

use framepace_track::entity::Entity;
use framepace_track::info;

use crate::flow::Flow;
use crate::option::{ControlOption, SimulationOption};
use crate::scheduler::Scheduler;
use crate::types::SimError;

pub struct Workbench {
    entity: Rc<Entity>,
    flow: Rc<Flow>,
    option: SimulationOption,
    control: ControlOption,
    current: Scheduler,
    frozen: Vec<Rc<Scheduler>>,
    freeze_count: usize,
}

impl Workbench {
    pub fn new(
        parent: &Rc<Entity>,
        flow: Rc<Flow>,
        option: SimulationOption,
        control: ControlOption,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, "workbench"));
        let current = Scheduler::new(&entity, flow.clone(), &option);
        Self {
            entity,
            flow,
            option,
            control,
            current,
            frozen: Vec::new(),
            freeze_count: 0,
        }
    }

    /// Advance the current scheduler by one external tick.
    ///
    /// In manual mode a tick is a single step. In auto-step mode steps are
    /// taken until the step ceiling is reached or nothing is left to do.
    /// Returns the number of steps executed.
    pub fn tick(&mut self) -> Result<u64, SimError> {
        if !self.control.auto_step {
            let before = self.current.step_count();
            self.current.step()?;
            return Ok(self.current.step_count() - before);
        }
        self.current.run_bounded(self.control.max_auto_step)
    }

    /// Start a new run with the current flow and options, freezing the
    /// previous run into the comparison list when `keep` is set.
    pub fn restart(&mut self, keep: bool) {
        let next = Scheduler::new(&self.entity, self.flow.clone(), &self.option);
        let mut previous = std::mem::replace(&mut self.current, next);

        if keep {
            let option = previous.option();
            let label = format!(
                "{} {} (Core = {}, Frame Pool = {})",
                self.freeze_count,
                previous.flow().name(),
                option.core_count,
                option.frame_pool_size
            );
            self.freeze_count += 1;
            previous.freeze(&label);
            info!(self.entity ; "kept '{}'", label);
            self.frozen.push(Rc::new(previous));
        }
    }

    /// Takes effect on the next [`Workbench::restart`].
    pub fn set_flow(&mut self, flow: Rc<Flow>) {
        self.flow = flow;
    }

    /// Takes effect on the next [`Workbench::restart`].
    pub fn set_option(&mut self, option: SimulationOption) {
        self.option = option;
    }

    pub fn set_control(&mut self, control: ControlOption) {
        self.control = control;
    }

    #[must_use]
    pub fn current(&self) -> &Scheduler {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Scheduler {
        &mut self.current
    }

    /// Frozen runs, oldest first.
    #[must_use]
    pub fn frozen(&self) -> &[Rc<Scheduler>] {
        &self.frozen
    }

    /// Drop every frozen run; the freeze counter keeps counting.
    pub fn clear_frozen(&mut self) {
        self.frozen.clear();
    }

    #[must_use]
    pub fn freeze_count(&self) -> usize {
        self.freeze_count
    }

    #[must_use]
    pub fn control(&self) -> &ControlOption {
        &self.control
    }
}
