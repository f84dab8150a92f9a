// src/triggers/registry.rs — Trigger registry: builtins + script discovery
//
// The registry maps capability names to factories. It is built once at
// startup (builtins first, then an optional script directory) and read
// from there on. A script with the same name as a builtin overrides it.

use std::collections::HashMap;
use std::path::Path;

use crate::engine::Payload;
use crate::infra::config::TriggerConfig;
use crate::infra::errors::TideflowError;
use crate::script::script_files;
use crate::triggers::{scripted, EmailTrigger, ScheduleTrigger, Trigger, WebhookTrigger};

/// Constructs one live trigger from the non-`type` config fields.
pub type TriggerFactory = Box<dyn Fn(Payload) -> anyhow::Result<Box<dyn Trigger>> + Send + Sync>;

pub struct TriggerRegistry {
    factories: HashMap<String, TriggerFactory>,
}

impl TriggerRegistry {
    /// Registry seeded with the builtin triggers.
    pub fn builtin() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(ScheduleTrigger::KIND, |params| {
            Ok(Box::new(ScheduleTrigger::from_params(params)?))
        });
        registry.register(EmailTrigger::KIND, |params| {
            Ok(Box::new(EmailTrigger::from_params(params)?))
        });
        registry.register(WebhookTrigger::KIND, |params| {
            Ok(Box::new(WebhookTrigger::from_params(params)?))
        });
        registry
    }

    /// Register a factory under a capability name, replacing any prior
    /// entry with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Payload) -> anyhow::Result<Box<dyn Trigger>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            tracing::info!("trigger '{}' overridden", name);
        }
    }

    /// Discover trigger scripts in `dir` (lexical filename order) and
    /// register each under its self-declared name. The directory was
    /// explicitly requested, so its absence is an error; individual bad
    /// files are logged and excluded without aborting discovery.
    pub fn discover_scripts(&mut self, dir: &Path) -> Result<usize, TideflowError> {
        let mut discovered = 0;

        for path in script_files(dir)? {
            match scripted::compile_trigger_script(&path) {
                Ok(Some(script)) => {
                    let name = script.name.clone();
                    tracing::info!("loaded trigger '{}' from {}", name, path.display());
                    self.register_factory(name, script.into_factory());
                    discovered += 1;
                }
                Ok(None) => {
                    tracing::debug!("{} declares no trigger, skipped", path.display());
                }
                Err(e) => {
                    tracing::error!("failed to load trigger script {}: {:#}", path.display(), e);
                }
            }
        }

        Ok(discovered)
    }

    fn register_factory(&mut self, name: String, factory: TriggerFactory) {
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::info!("trigger '{}' overridden", name);
        }
    }

    /// Instantiate triggers from config entries, preserving entry order.
    /// An unknown `type` or a failing construction is logged and skipped;
    /// the remaining entries still instantiate.
    pub fn instantiate(&self, entries: &[TriggerConfig]) -> Vec<Box<dyn Trigger>> {
        let mut triggers = Vec::new();

        for entry in entries {
            let Some(factory) = self.factories.get(&entry.kind) else {
                tracing::error!("unknown trigger type '{}', entry skipped", entry.kind);
                continue;
            };

            match factory(entry.params.clone()) {
                Ok(trigger) => {
                    tracing::info!("trigger '{}' loaded", entry.kind);
                    triggers.push(trigger);
                }
                Err(e) => {
                    tracing::error!("failed to construct trigger '{}': {:#}", entry.kind, e);
                }
            }
        }

        triggers
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
