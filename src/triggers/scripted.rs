// src/triggers/scripted.rs — Script-backed external trigger
//
// A trigger plugin is one Rhai file declaring `trigger_name()` (the
// capability name) and `poll(params)` (one check cycle returning an array
// of payload maps). The host drives the poll loop; the script only decides
// what counts as an event.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure};
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::{Event, EventSink, Payload};
use crate::script::{create_script_engine, dynamic_to_map, map_to_dynamic};
use crate::triggers::registry::TriggerFactory;
use crate::triggers::Trigger;

/// A trigger script that compiled and passed the capability check.
pub struct CompiledTriggerScript {
    pub name: String,
    engine: Arc<Engine>,
    ast: Arc<AST>,
}

/// Compile a trigger script file. `Ok(None)` means the file is valid Rhai
/// but does not declare the trigger capability.
pub(crate) fn compile_trigger_script(path: &Path) -> anyhow::Result<Option<CompiledTriggerScript>> {
    let source = std::fs::read_to_string(path)?;
    compile_trigger_source(&source)
}

pub(crate) fn compile_trigger_source(source: &str) -> anyhow::Result<Option<CompiledTriggerScript>> {
    let engine = create_script_engine();
    let ast = engine
        .compile(source)
        .map_err(|e| anyhow!("compile error: {}", e))?;

    // Capability check happens here, once, not at dispatch time.
    let mut has_name = false;
    let mut has_poll = false;
    for func in ast.iter_functions() {
        match func.name {
            "trigger_name" => has_name = true,
            "poll" => has_poll = true,
            _ => {}
        }
    }
    if !has_name || !has_poll {
        return Ok(None);
    }

    let mut scope = Scope::new();
    let name: Dynamic = engine
        .call_fn(&mut scope, &ast, "trigger_name", ())
        .map_err(|e| anyhow!("trigger_name() failed: {}", e))?;
    let name = name
        .into_string()
        .map_err(|_| anyhow!("trigger_name() must return a string"))?;
    ensure!(!name.is_empty(), "trigger_name() returned an empty name");

    Ok(Some(CompiledTriggerScript {
        name,
        engine: Arc::new(engine),
        ast: Arc::new(ast),
    }))
}

impl CompiledTriggerScript {
    /// Wrap this compiled script as a registry factory. Config parameters
    /// are forwarded to `poll` verbatim; `interval` additionally paces the
    /// host loop (seconds, default 60).
    pub(crate) fn into_factory(self) -> TriggerFactory {
        Box::new(move |params: Payload| {
            let interval = params
                .get("interval")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(60);
            Ok(Box::new(ScriptedTrigger {
                name: self.name.clone(),
                engine: self.engine.clone(),
                ast: self.ast.clone(),
                params,
                interval: Duration::from_secs(interval),
            }))
        })
    }
}

/// A live trigger instance backed by a compiled script.
pub struct ScriptedTrigger {
    name: String,
    engine: Arc<Engine>,
    ast: Arc<AST>,
    params: Payload,
    interval: Duration,
}

impl Trigger for ScriptedTrigger {
    fn kind(&self) -> &str {
        &self.name
    }

    fn start(&self, sink: EventSink, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let name = self.name.clone();
        let engine = self.engine.clone();
        let ast = self.ast.clone();
        let params = self.params.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            tracing::info!(
                "scripted trigger '{}' polling every {}s",
                name,
                interval.as_secs()
            );

            loop {
                match poll_once(&engine, &ast, &params) {
                    Ok(payloads) => {
                        for payload in payloads {
                            sink.dispatch(&Event::new(name.clone(), payload));
                        }
                    }
                    Err(e) => tracing::error!("scripted trigger '{}' poll failed: {}", name, e),
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.recv() => {
                        tracing::info!("scripted trigger '{}' stopping", name);
                        break;
                    }
                }
            }
        })
    }
}

/// One check cycle: call the script's `poll(params)` and collect the
/// payload maps it returned. `()` means no events this cycle; a single map
/// counts as one event.
fn poll_once(engine: &Engine, ast: &AST, params: &Payload) -> anyhow::Result<Vec<Payload>> {
    let mut scope = Scope::new();
    let args = map_to_dynamic(params);
    // Top-level statements ran once at load; only call poll here.
    let options = CallFnOptions::new().eval_ast(false);
    let result: Dynamic = engine
        .call_fn_with_options(options, &mut scope, ast, "poll", (args,))
        .map_err(|e| anyhow!("{}", e))?;

    if result.is_unit() {
        return Ok(Vec::new());
    }

    if result.is::<rhai::Array>() {
        let items = result.cast::<rhai::Array>();
        let mut payloads = Vec::new();
        for item in &items {
            match dynamic_to_map(item) {
                Some(map) => payloads.push(map),
                None => tracing::warn!("poll() item is not a map, dropped"),
            }
        }
        return Ok(payloads);
    }

    if let Some(map) = dynamic_to_map(&result) {
        return Ok(vec![map]);
    }

    anyhow::bail!("poll() must return an array of maps, a map, or ()")
}
