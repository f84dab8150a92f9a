// src/engine/event.rs — The data a trigger hands to workflows

use serde_json::Value;

/// Event payload: an unordered string-keyed map, built fresh per event.
pub type Payload = serde_json::Map<String, Value>;

/// One detected occurrence: which trigger kind saw it, and what it carried.
///
/// `trigger` is the emitting trigger's capability name; workflow handlers
/// are matched against it.
#[derive(Debug, Clone)]
pub struct Event {
    pub trigger: String,
    pub payload: Payload,
}

impl Event {
    pub fn new(trigger: impl Into<String>, payload: Payload) -> Self {
        Self {
            trigger: trigger.into(),
            payload,
        }
    }

    /// A payload-less event, e.g. a pure time tick.
    pub fn tick(trigger: impl Into<String>) -> Self {
        Self::new(trigger, Payload::new())
    }
}
