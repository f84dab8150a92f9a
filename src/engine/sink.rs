// src/engine/sink.rs — Fan-out of one event to every loaded workflow
//
// Each started trigger holds a clone of the sink; delivery runs
// synchronously inside the emitting trigger's task, so a slow workflow
// delays only that trigger's next cycle.

use std::sync::Arc;

use crate::engine::Event;
use crate::workflows::Workflow;

/// The callback handed to every trigger: delivers an event to all
/// workflows, in load order. Cheap to clone.
#[derive(Clone)]
pub struct EventSink {
    workflows: Arc<[Arc<dyn Workflow>]>,
}

impl EventSink {
    pub fn new(workflows: Vec<Arc<dyn Workflow>>) -> Self {
        Self {
            workflows: workflows.into(),
        }
    }

    /// Deliver one event to every workflow. Workflows contain their own
    /// handler failures, so dispatch itself cannot fail.
    pub fn dispatch(&self, event: &Event) {
        tracing::debug!(
            trigger = %event.trigger,
            workflows = self.workflows.len(),
            "dispatching event"
        );
        for workflow in self.workflows.iter() {
            workflow.run(event);
        }
    }

    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    pub fn workflow_names(&self) -> Vec<&str> {
        self.workflows.iter().map(|w| w.name()).collect()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Mutex;

    use super::*;

    /// Records every event it receives; used across trigger tests.
    pub(crate) struct RecordingWorkflow {
        pub events: Mutex<Vec<Event>>,
    }

    impl RecordingWorkflow {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn recorded(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Workflow for RecordingWorkflow {
        fn name(&self) -> &str {
            "recording"
        }

        fn run(&self, event: &Event) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    /// A sink over a single recording workflow, plus the recorder itself.
    pub(crate) fn recording_sink() -> (EventSink, Arc<RecordingWorkflow>) {
        let recorder = RecordingWorkflow::new();
        let sink = EventSink::new(vec![recorder.clone() as Arc<dyn Workflow>]);
        (sink, recorder)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::RecordingWorkflow;
    use super::*;

    #[test]
    fn test_dispatch_reaches_every_workflow() {
        let first = RecordingWorkflow::new();
        let second = RecordingWorkflow::new();
        let sink = EventSink::new(vec![
            first.clone() as Arc<dyn Workflow>,
            second.clone() as Arc<dyn Workflow>,
        ]);

        sink.dispatch(&Event::tick("schedule"));

        assert_eq!(first.recorded().len(), 1);
        assert_eq!(second.recorded().len(), 1);
        assert_eq!(sink.workflow_count(), 2);
    }

    #[test]
    fn test_dispatch_with_no_workflows_is_noop() {
        let sink = EventSink::new(Vec::new());
        sink.dispatch(&Event::tick("schedule"));
        assert_eq!(sink.workflow_count(), 0);
    }
}
