// src/workflows/mod.rs — The workflow contract

pub mod loader;
pub mod script;

pub use loader::load_workflows;
pub use script::ScriptWorkflow;

use crate::engine::Event;

/// A capability that reacts to delivered events.
///
/// `run` is invoked once per event, possibly concurrently from several
/// trigger tasks. Implementations select their own handlers by the event's
/// trigger tag and contain every handler failure — an error never reaches
/// the caller.
pub trait Workflow: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, event: &Event);
}

impl std::fmt::Debug for dyn Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow").field("name", &self.name()).finish()
    }
}
