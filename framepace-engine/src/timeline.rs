// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Read-only output of a run.
//!
//! Each record occupies a *lane*. Lanes `0..core_count` hold the jobs run on
//! each core, lane `core_count` holds frame-rate markers and lanes from
//! `core_count + 2` hold the lifetime of each frame, one lane per pool slot.

use std::fmt;

use serde::Serialize;

use crate::types::{FrameNumber, SimTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    /// A middle stage of a frame.
    Normal,
    /// First stage of a frame.
    FrameEntry,
    /// Last stage of a frame.
    FrameExit,
    /// Whole lifetime of a frame.
    FrameDuration,
    /// Instant at which a frame was released.
    FrameRateMarker,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordKind::Normal => write!(f, "normal"),
            RecordKind::FrameEntry => write!(f, "entry"),
            RecordKind::FrameExit => write!(f, "exit"),
            RecordKind::FrameDuration => write!(f, "frame"),
            RecordKind::FrameRateMarker => write!(f, "rate"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineRecord {
    pub lane: usize,
    pub frame: Option<FrameNumber>,
    pub start: SimTime,
    pub end: SimTime,
    pub name: String,
    pub tag: i32,
    pub kind: RecordKind,
}

impl TimelineRecord {
    #[must_use]
    pub fn duration(&self) -> SimTime {
        self.end - self.start
    }
}

/// Frame completion used for throughput and latency figures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRateRecord {
    /// Release time.
    pub timestamp: SimTime,

    /// Time since the previous release.
    pub delta: SimTime,

    /// Start-to-release time of the frame.
    pub latency: SimTime,
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    records: Vec<TimelineRecord>,
    frame_rates: Vec<FrameRateRecord>,
}

impl Timeline {
    pub fn push_record(&mut self, record: TimelineRecord) {
        self.records.push(record);
    }

    pub fn push_frame_rate(&mut self, record: FrameRateRecord) {
        self.frame_rates.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[TimelineRecord] {
        &self.records
    }

    #[must_use]
    pub fn frame_rates(&self) -> &[FrameRateRecord] {
        &self.frame_rates
    }

    /// Largest end time of any record.
    #[must_use]
    pub fn max_end(&self) -> SimTime {
        self.records.iter().map(|r| r.end).fold(0.0, f64::max)
    }

    /// Number of records that intersect the window `[min, max]`.
    #[must_use]
    pub fn visible_count(&self, min: SimTime, max: SimTime) -> usize {
        self.records
            .iter()
            .filter(|r| r.start <= max && r.end >= min)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start: SimTime, end: SimTime) -> TimelineRecord {
        TimelineRecord {
            lane: 0,
            frame: Some(0),
            start,
            end,
            name: "a".to_string(),
            tag: 0,
            kind: RecordKind::Normal,
        }
    }

    #[test]
    fn visible_window() {
        let mut timeline = Timeline::default();
        timeline.push_record(record(0.0, 10.0));
        timeline.push_record(record(10.0, 20.0));
        timeline.push_record(record(30.0, 40.0));

        assert_eq!(timeline.visible_count(0.0, 100.0), 3);
        assert_eq!(timeline.visible_count(10.0, 10.0), 2);
        assert_eq!(timeline.visible_count(21.0, 29.0), 0);
        assert_eq!(timeline.visible_count(35.0, 50.0), 1);
        assert_eq!(timeline.max_end(), 40.0);
    }
}
