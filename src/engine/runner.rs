// src/engine/runner.rs — Start every trigger against every workflow
//
// Owns the run/stop boundary: builds the registry, instantiates triggers,
// starts each one exactly once with a sink over all workflows, and keeps
// the task handles so the whole set can be stopped and joined.

use std::path::Path;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::EventSink;
use crate::infra::config::Config;
use crate::infra::errors::TideflowError;
use crate::triggers::TriggerRegistry;
use crate::workflows::load_workflows;

#[derive(Debug)]
struct StartedTrigger {
    kind: String,
    handle: JoinHandle<()>,
}

/// Handle to a started engine: every trigger task plus the shutdown
/// signal. Triggers run until `shutdown` is called (or the process exits).
#[derive(Debug)]
pub struct RunningEngine {
    started: Vec<StartedTrigger>,
    workflow_count: usize,
    shutdown: broadcast::Sender<()>,
}

/// Load workflows and triggers, bind them, and start every trigger.
/// Returns once all triggers are started — they do not finish under normal
/// operation. Must be called from within a tokio runtime.
pub fn start(
    config: &Config,
    triggers_dir: Option<&Path>,
    workflows_dir: &Path,
) -> Result<RunningEngine, TideflowError> {
    tracing::info!("starting tideflow");

    let workflows = load_workflows(workflows_dir)?;
    if workflows.is_empty() {
        tracing::warn!("no workflows loaded, events will have no effect");
    }

    let mut registry = TriggerRegistry::builtin();
    if let Some(dir) = triggers_dir {
        let discovered = registry.discover_scripts(dir)?;
        tracing::info!("{} trigger script(s) discovered in {}", discovered, dir.display());
    }

    let triggers = registry.instantiate(&config.triggers);

    let sink = EventSink::new(workflows);
    let (shutdown_tx, _) = broadcast::channel(1);

    let mut started = Vec::with_capacity(triggers.len());
    for trigger in &triggers {
        for workflow in sink.workflow_names() {
            tracing::info!("starting trigger '{}' for workflow '{}'", trigger.kind(), workflow);
        }
        let handle = trigger.start(sink.clone(), shutdown_tx.subscribe());
        started.push(StartedTrigger {
            kind: trigger.kind().to_string(),
            handle,
        });
    }

    tracing::info!(
        "{} trigger(s) started, {} workflow(s) bound",
        started.len(),
        sink.workflow_count()
    );

    Ok(RunningEngine {
        started,
        workflow_count: sink.workflow_count(),
        shutdown: shutdown_tx,
    })
}

impl RunningEngine {
    pub fn trigger_count(&self) -> usize {
        self.started.len()
    }

    pub fn workflow_count(&self) -> usize {
        self.workflow_count
    }

    /// Trigger-to-workflow bindings established at start.
    pub fn binding_count(&self) -> usize {
        self.started.len() * self.workflow_count
    }

    pub fn trigger_kinds(&self) -> Vec<&str> {
        self.started.iter().map(|t| t.kind.as_str()).collect()
    }

    /// Signal every trigger task to stop.
    pub fn shutdown(&self) {
        tracing::info!("stopping all triggers");
        let _ = self.shutdown.send(());
    }

    /// Join every trigger task. Under normal operation this pends for the
    /// process lifetime; after `shutdown` it completes once each task has
    /// wound down.
    pub async fn wait(&mut self) {
        while let Some(trigger) = self.started.pop() {
            if let Err(e) = trigger.handle.await {
                tracing::error!("trigger '{}' task failed: {}", trigger.kind, e);
            }
        }
    }
}
