//! Event objects
//!
//! An [`Event`] lives for a single dispatch cycle. Listeners receive it
//! mutably so they can cancel it, stop its propagation, or flag their own
//! removal.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::dispatcher::DispatcherId;

/// Event type names used across Cadence
pub mod event_types {
    /// A timeline's position changed
    pub const CHANGE: &str = "change";
    /// A timeline reached its end and paused itself
    pub const COMPLETE: &str = "complete";
    /// A heartbeat from the ticker
    pub const TICK: &str = "tick";
}

/// Where in the propagation walk an event currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EventPhase {
    /// Not being dispatched
    #[default]
    None,
    /// Walking from the root ancestor down towards the target
    Capture,
    /// At the dispatching object itself
    AtTarget,
    /// Walking from the target's parent back up to the root
    Bubble,
}

/// Payload of a ticker heartbeat
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickData {
    /// Milliseconds since the previous tick, capped by the ticker's `max_delta`
    pub delta: f64,
    /// Whether the ticker was paused when this tick fired
    pub paused: bool,
    /// Milliseconds since the ticker was initialized
    pub time: f64,
    /// `time` minus the accumulated paused time
    pub run_time: f64,
}

/// Event-specific data
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventData {
    #[default]
    None,
    Tick(TickData),
    Number(f64),
    Text(String),
}

/// An event travelling through one dispatch cycle
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: String,
    /// The dispatcher that originally dispatched this event
    pub target: Option<DispatcherId>,
    /// The dispatcher whose listeners are currently running
    pub current_target: Option<DispatcherId>,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Wall-clock creation time in milliseconds since the Unix epoch
    pub timestamp: u64,
    pub data: EventData,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
    pub(crate) removed: bool,
}

impl Event {
    /// Create a non-bubbling, non-cancelable event
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
            current_target: None,
            phase: EventPhase::None,
            bubbles: false,
            cancelable: false,
            timestamp: now_millis(),
            data: EventData::None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            removed: false,
        }
    }

    /// Builder: set whether the event bubbles up the parent chain
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Builder: set whether `prevent_default` has any effect
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Builder: attach a payload
    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    /// A fresh event with the same type, flags and payload, ready to be
    /// dispatched again.
    pub fn reissue(&self) -> Self {
        Self::new(self.event_type.clone())
            .with_bubbles(self.bubbles)
            .with_cancelable(self.cancelable)
            .with_data(self.data.clone())
    }

    /// Mark the default action as prevented. No-op unless cancelable.
    pub fn prevent_default(&mut self) {
        self.default_prevented = self.cancelable;
    }

    /// Stop propagation after the current node's listeners finish
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip the remaining listeners on the current node
    pub fn stop_immediate_propagation(&mut self) {
        self.immediate_propagation_stopped = true;
        self.propagation_stopped = true;
    }

    /// Ask the dispatcher to unregister the listener that is currently running
    pub fn remove(&mut self) {
        self.removed = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// The tick payload, if this is a heartbeat event
    pub fn tick(&self) -> Option<&TickData> {
        match &self.data {
            EventData::Tick(tick) => Some(tick),
            _ => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Event (type={})]", self.event_type)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prevent_default_requires_cancelable() {
        let mut plain = Event::new("a");
        plain.prevent_default();
        assert!(!plain.is_default_prevented());

        let mut cancelable = Event::new("a").with_cancelable(true);
        cancelable.prevent_default();
        assert!(cancelable.is_default_prevented());
    }

    #[test]
    fn immediate_stop_implies_stop() {
        let mut event = Event::new("a");
        event.stop_immediate_propagation();
        assert!(event.is_propagation_stopped());
        assert!(event.is_immediate_propagation_stopped());
    }

    #[test]
    fn reissue_resets_dispatch_state() {
        let mut event = Event::new("tick")
            .with_bubbles(true)
            .with_data(EventData::Number(3.0));
        event.stop_propagation();
        event.remove();
        event.phase = EventPhase::Bubble;

        let fresh = event.reissue();
        assert_eq!(fresh.event_type, "tick");
        assert!(fresh.bubbles);
        assert_eq!(fresh.data, EventData::Number(3.0));
        assert!(!fresh.is_propagation_stopped());
        assert!(!fresh.is_removed());
        assert_eq!(fresh.phase, EventPhase::None);
        assert!(fresh.target.is_none());
    }

    #[test]
    fn tick_payload_accessor() {
        let tick = TickData {
            delta: 16.0,
            paused: false,
            time: 100.0,
            run_time: 100.0,
        };
        let event = Event::new(event_types::TICK).with_data(EventData::Tick(tick));
        assert_eq!(event.tick(), Some(&tick));
        assert_eq!(Event::new("change").tick(), None);
        assert_eq!(event.to_string(), "[Event (type=tick)]");
    }
}
