// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::tracker::Track;
use crate::{Id, NO_ID};

/// A tracker that can be used to suppress all output.
pub struct DevNullTracker;

impl Track for DevNullTracker {
    fn unique_id(&self) -> Id {
        NO_ID
    }

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        false
    }

    fn add_entity(&self, _id: Id, _entity_name: &str) {}
    fn enter(&self, _id: Id, _object: Id) {}
    fn exit(&self, _id: Id, _object: Id) {}
    fn value(&self, _id: Id, _value: f64) {}
    fn create(&self, _created_by: Id, _id: Id, _name: &str) {}
    fn destroy(&self, _destroyed_by: Id, _id: Id) {}
    fn log(&self, _id: Id, _level: log::Level, _msg: fmt::Arguments) {}
    fn shutdown(&self) {}
}
