//! Domain event publishing
//!
//! Every successful state change publishes one event such as `ncr.opened` or
//! `capa.closed`. Listeners are in-process only.

use std::cell::RefCell;

use serde::Serialize;
use serde_json::Value;

/// A published event as seen by a listener
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    pub name: String,
    pub payload: Value,
}

/// Sink for domain events
pub trait EventPublisher {
    fn publish(&self, name: &str, payload: Value);
}

impl<P: EventPublisher + ?Sized> EventPublisher for &P {
    fn publish(&self, name: &str, payload: Value) {
        (**self).publish(name, payload)
    }
}

/// Writes each event to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, name: &str, payload: Value) {
        tracing::info!(target: "qms::events", event = name, payload = %payload, "domain event");
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _name: &str, _payload: Value) {}
}

/// Keeps events in memory so callers can inspect them afterwards
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: RefCell<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.borrow().clone()
    }

    /// Names of published events, in order
    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|e| e.name.clone()).collect()
    }

    /// Most recent event with the given name
    pub fn last(&self, name: &str) -> Option<DomainEvent> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find(|e| e.name == name)
            .cloned()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, name: &str, payload: Value) {
        self.events.borrow_mut().push(DomainEvent {
            name: name.to_string(),
            payload,
        });
    }
}
