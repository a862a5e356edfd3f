// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Frames and the bounded pool they are drawn from.
//!
//! The [`FramePool`] is an arena: every [`Frame`] lives in a fixed slot
//! addressed by [`FrameId`] and is either available or in flight. Jobs refer
//! to frames by slot, never by owning reference.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use framepace_track::entity::Entity;
use framepace_track::{Id, create_id, enter, exit, trace, value};

use crate::sim_error;
use crate::types::{FrameNumber, SimError, SimTime};

/// Slot of a [`Frame`] within its [`FramePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

/// One pipeline instance.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    number: FrameNumber,
    start: Option<SimTime>,
    end: Option<SimTime>,
    tally: BTreeMap<i32, usize>,
    in_flight: bool,
    track_id: Id,
}

impl Frame {
    #[must_use]
    pub fn number(&self) -> FrameNumber {
        self.number
    }

    #[must_use]
    pub fn start(&self) -> Option<SimTime> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<SimTime> {
        self.end
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Number of completed stages carrying `tag` in this frame.
    #[must_use]
    pub fn tally(&self, tag: i32) -> usize {
        self.tally.get(&tag).copied().unwrap_or(0)
    }

    /// Record one more completion of a stage carrying `tag`.
    pub fn record_completion(&mut self, tag: i32) {
        *self.tally.entry(tag).or_insert(0) += 1;
    }

    /// Stamp the start time unless it has already been set.
    pub fn stamp_start(&mut self, time: SimTime) {
        if self.start.is_none() {
            self.start = Some(time);
        }
    }
}

/// What is known about a frame as it leaves the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRelease {
    pub number: FrameNumber,
    pub start: SimTime,
    pub end: SimTime,

    /// `end - start`
    pub latency: SimTime,

    /// Time since the previous frame was released (or since 0).
    pub delta: SimTime,
}

/// Fixed-capacity arena of reusable frames.
pub struct FramePool {
    entity: Rc<Entity>,
    frames: Vec<Frame>,
    available: Vec<FrameId>,
    next_number: FrameNumber,
    last_release: SimTime,
}

impl FramePool {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, capacity: usize) -> Self {
        let entity = Rc::new(Entity::new(parent, "frame_pool"));
        let frames = vec![Frame::default(); capacity];
        let available = (0..capacity).rev().map(FrameId).collect();
        Self {
            entity,
            frames,
            available,
            next_number: 0,
            last_release: 0.0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    #[must_use]
    pub fn num_available(&self) -> usize {
        self.available.len()
    }

    #[must_use]
    pub fn num_in_flight(&self) -> usize {
        self.frames.len() - self.available.len()
    }

    /// Number that the next acquired frame will be given.
    #[must_use]
    pub fn next_number(&self) -> FrameNumber {
        self.next_number
    }

    /// Take a free slot and give it the next frame number.
    pub fn acquire(&mut self) -> Result<FrameId, SimError> {
        let Some(id) = self.available.pop() else {
            return sim_error!(
                "Frame pool empty when acquiring frame {}",
                self.next_number
            );
        };

        let track_id = create_id!(self.entity);
        let frame = &mut self.frames[id.0];
        frame.number = self.next_number;
        frame.in_flight = true;
        frame.track_id = track_id;
        self.next_number += 1;

        enter!(self.entity ; track_id);
        trace!(self.entity ; "frame {} acquired ({})", frame.number, id);
        value!(self.entity ; self.num_in_flight());
        Ok(id)
    }

    /// Return a frame to the pool, resetting its state.
    pub fn release(&mut self, id: FrameId, time: SimTime) -> Result<FrameRelease, SimError> {
        let last_release = self.last_release;
        let frame = self.frame_mut(id)?;
        let start = frame.start.unwrap_or(time);
        let release = FrameRelease {
            number: frame.number,
            start,
            end: time,
            latency: time - start,
            delta: time - last_release,
        };
        let track_id = frame.track_id;
        *frame = Frame::default();

        self.available.push(id);
        self.last_release = time;

        exit!(self.entity ; track_id);
        trace!(self.entity ; "frame {} released ({})", release.number, id);
        value!(self.entity ; self.num_in_flight());
        Ok(release)
    }

    /// Access an in-flight frame.
    pub fn frame(&self, id: FrameId) -> Result<&Frame, SimError> {
        match self.frames.get(id.0) {
            Some(frame) if frame.in_flight => Ok(frame),
            _ => sim_error!("No frame in flight in {}", id),
        }
    }

    /// Mutable access to an in-flight frame.
    pub fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame, SimError> {
        match self.frames.get_mut(id.0) {
            Some(frame) if frame.in_flight => Ok(frame),
            _ => sim_error!("No frame in flight in {}", id),
        }
    }

    /// Find the in-flight frame with the given number.
    #[must_use]
    pub fn find_in_flight(&self, number: FrameNumber) -> Option<&Frame> {
        self.frames
            .iter()
            .find(|f| f.in_flight && f.number == number)
    }

    /// Numbers of all frames currently in flight, in slot order.
    #[must_use]
    pub fn in_flight_numbers(&self) -> Vec<FrameNumber> {
        self.frames
            .iter()
            .filter(|f| f.in_flight)
            .map(|f| f.number)
            .collect()
    }
}
