// src/workflows/script.rs — Script-backed workflow
//
// A workflow is one Rhai file. Its top-level code runs once at load time
// and registers (trigger tag, handler function) pairs through the host
// `on` function; delivery looks handlers up by tag. Handlers receive the
// event payload as a map argument.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};

use crate::engine::Event;
use crate::script::{create_script_engine, map_to_dynamic};
use crate::workflows::Workflow;

/// A workflow loaded from a script file, with its handler table built at
/// construction.
pub struct ScriptWorkflow {
    name: String,
    engine: Engine,
    ast: AST,
    /// trigger tag -> handler function names, in registration order
    handlers: Vec<(String, Vec<String>)>,
}

impl ScriptWorkflow {
    /// Load a workflow script from a file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::load_str(path, &source)
    }

    /// Load a workflow script from a string (for testing or inline use).
    pub fn load_str(path: &Path, source: &str) -> anyhow::Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        Self::load_parts(create_script_engine(), name, source)
    }

    fn load_parts(mut engine: Engine, name: String, source: &str) -> anyhow::Result<Self> {
        let registrations: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = registrations.clone();
        engine.register_fn("on", move |tag: &str, handler: &str| {
            sink.lock().unwrap().push((tag.to_string(), handler.to_string()));
        });

        let ast = engine
            .compile(source)
            .map_err(|e| anyhow!("failed to compile workflow '{}': {}", name, e))?;

        // Run the top-level statements once: this is the workflow's
        // construction, where `on(...)` calls land.
        engine
            .eval_ast::<Dynamic>(&ast)
            .map_err(|e| anyhow!("workflow '{}' failed during load: {}", name, e))?;

        let mut handlers: Vec<(String, Vec<String>)> = Vec::new();
        let registered = std::mem::take(&mut *registrations.lock().unwrap());
        for (tag, handler) in registered {
            if !ast.iter_functions().any(|f| f.name == handler) {
                tracing::warn!(
                    "workflow '{}' registered '{}' for tag '{}' but defines no such function, dropped",
                    name,
                    handler,
                    tag
                );
                continue;
            }
            match handlers.iter().position(|(t, _)| *t == tag) {
                Some(pos) => handlers[pos].1.push(handler),
                None => handlers.push((tag, vec![handler])),
            }
        }

        tracing::info!(
            "workflow '{}' loaded ({} handler(s): [{}])",
            name,
            handlers.iter().map(|(_, fns)| fns.len()).sum::<usize>(),
            handlers
                .iter()
                .map(|(tag, _)| tag.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            name,
            engine,
            ast,
            handlers,
        })
    }

    /// Handler function names registered for a trigger tag.
    pub fn handlers_for(&self, tag: &str) -> &[String] {
        self.handlers
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, fns)| fns.as_slice())
            .unwrap_or(&[])
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.iter().map(|(_, fns)| fns.len()).sum()
    }
}

impl Workflow for ScriptWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, event: &Event) {
        let matched = self.handlers_for(&event.trigger);
        if matched.is_empty() {
            tracing::debug!(
                workflow = %self.name,
                trigger = %event.trigger,
                "no handler registered, event ignored"
            );
            return;
        }

        let payload = map_to_dynamic(&event.payload);

        for handler in matched {
            let mut scope = Scope::new();
            // Top-level statements already ran at load; only call the handler.
            let options = CallFnOptions::new().eval_ast(false);
            let result = self.engine.call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                &self.ast,
                handler,
                (payload.clone(),),
            );

            match result {
                Ok(_) => tracing::debug!(
                    workflow = %self.name,
                    handler = %handler,
                    "handler executed"
                ),
                // One failing handler never blocks its siblings.
                Err(e) => tracing::error!(
                    "workflow '{}' handler '{}' failed: {}",
                    self.name,
                    handler,
                    e
                ),
            }
        }
    }
}
