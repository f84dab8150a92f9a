// src/triggers/mod.rs — The trigger contract

pub mod email;
pub mod registry;
pub mod schedule;
pub mod scripted;
pub mod webhook;

pub use email::EmailTrigger;
pub use registry::{TriggerFactory, TriggerRegistry};
pub use schedule::ScheduleTrigger;
pub use scripted::ScriptedTrigger;
pub use webhook::WebhookTrigger;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::EventSink;

/// A capability that watches an event source and delivers events through
/// the sink once per detected occurrence.
pub trait Trigger: Send + Sync {
    /// Capability name: the registry key, the config `type` value, and the
    /// tag carried by every event this trigger emits.
    fn kind(&self) -> &str;

    /// Spawn the trigger's own task and return its handle without blocking
    /// beyond setup. The task watches its source until `shutdown` fires;
    /// a failed check cycle is logged at this trigger's boundary and the
    /// loop continues — nothing propagates to sibling triggers.
    fn start(&self, sink: EventSink, shutdown: broadcast::Receiver<()>) -> JoinHandle<()>;
}
