// src/infra/config.rs — Configuration loading (YAML)

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::infra::errors::TideflowError;

/// Top-level configuration document.
///
/// ```yaml
/// triggers:
///   - type: schedule
///     interval: 30
///   - type: webhook
///     path: /hooks/build
///     port: 8080
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

/// One trigger entry: a required `type` naming a registered trigger, plus
/// an open set of fields forwarded verbatim as construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Config {
    /// Load a configuration file. An absent file is a distinct error so the
    /// CLI can report it without a diagnostic trace.
    pub fn load(path: &Path) -> Result<Config, TideflowError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TideflowError::ConfigMissing(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_yml::from_str(&raw).map_err(|e| TideflowError::Config(e.to_string()))
    }
}
