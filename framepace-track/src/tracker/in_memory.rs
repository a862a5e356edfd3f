// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::Id;
use crate::tracker::{EntityManager, Track};

/// A [`Track`] event.
#[derive(Debug, Clone)]
pub struct EventCommon {
    /// The [`Id`] of the event originator.
    pub id: Id,

    /// Any event-specific state.
    pub event: Event,
}

/// The event-specific part of a recorded [`Track`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An object was created.
    Create {
        /// Name given at creation.
        name: String,
    },
    /// An object was destroyed.
    Destroy,
    /// A log message was emitted.
    Log {
        /// Level of the message.
        level: log::Level,
        /// Formatted message.
        text: String,
    },
    /// An object entered the originator.
    Enter {
        /// Object that entered.
        entered: Id,
    },
    /// An object left the originator.
    Exit {
        /// Object that left.
        exited: Id,
    },
    /// The originator reported a new value.
    Value(f64),
}

struct TrackedState {
    events: Vec<EventCommon>,
    name_to_id: HashMap<String, Id>,
}

impl TrackedState {
    fn new() -> Self {
        Self {
            events: Vec::with_capacity(INITIAL_CAPACITY),
            name_to_id: HashMap::new(),
        }
    }

    fn count_matching(&self, id: Id, pred: impl Fn(&Event) -> bool) -> usize {
        self.events
            .iter()
            .filter(|e| e.id == id)
            .filter(|e| pred(&e.event))
            .count()
    }
}

/// A tracker that keeps every event in memory so that tests can query it.
pub struct InMemoryTracker {
    entity_manager: EntityManager,
    state: RefCell<TrackedState>,
}

const INITIAL_CAPACITY: usize = 1024;

impl InMemoryTracker {
    /// Create a new [`InMemoryTracker`] with an [`EntityManager`].
    #[must_use]
    pub fn new(entity_manager: EntityManager) -> Self {
        Self {
            entity_manager,
            state: RefCell::new(TrackedState::new()),
        }
    }

    fn add_event(&self, id: Id, event: Event) {
        self.state
            .borrow_mut()
            .events
            .push(EventCommon { id, event });
    }

    /// Get the [`Id`] for the specified simulation entity (by full name).
    pub fn id_for_name(&self, name: &str) -> Option<Id> {
        self.state.borrow().name_to_id.get(name).copied()
    }

    /// Return the number of objects that entered the entity specified by `id`.
    pub fn count_enter(&self, id: Id) -> usize {
        self.state
            .borrow()
            .count_matching(id, |e| matches!(e, Event::Enter { .. }))
    }

    /// Return the number of objects that exited the entity specified by `id`.
    pub fn count_exit(&self, id: Id) -> usize {
        self.state
            .borrow()
            .count_matching(id, |e| matches!(e, Event::Exit { .. }))
    }

    /// Return all values reported by the entity specified by `id`, in order.
    pub fn values(&self, id: Id) -> Vec<f64> {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|e| e.id == id)
            .filter_map(|e| match e.event {
                Event::Value(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Return all log messages emitted by `id` at exactly `level`.
    pub fn logs(&self, id: Id, level: log::Level) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|e| e.id == id)
            .filter_map(|e| match &e.event {
                Event::Log { level: l, text } if *l == level => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Return a copy of every recorded event.
    pub fn events(&self) -> Vec<EventCommon> {
        self.state.borrow().events.clone()
    }
}

/// Implementation each [`Track`] event
impl Track for InMemoryTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_log_enabled_at_level(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
        self.state
            .borrow_mut()
            .name_to_id
            .insert(entity_name.to_owned(), id);
    }

    fn enter(&self, id: Id, object: Id) {
        self.add_event(id, Event::Enter { entered: object });
    }

    fn exit(&self, id: Id, object: Id) {
        self.add_event(id, Event::Exit { exited: object });
    }

    fn value(&self, id: Id, value: f64) {
        self.add_event(id, Event::Value(value));
    }

    fn create(&self, _created_by: Id, id: Id, name: &str) {
        self.add_event(
            id,
            Event::Create {
                name: name.to_owned(),
            },
        );
    }

    fn destroy(&self, _destroyed_by: Id, id: Id) {
        self.add_event(id, Event::Destroy);
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        self.add_event(
            id,
            Event::Log {
                level,
                text: format!("{msg}"),
            },
        );
    }

    fn shutdown(&self) {
        // Do nothing
    }
}
