// src/script/mod.rs — Embedded Rhai environment for trigger/workflow plugins

pub mod convert;
pub mod engine;

pub use convert::{dynamic_to_json, dynamic_to_map, json_to_dynamic, map_to_dynamic};
pub use engine::create_script_engine;

use std::path::{Path, PathBuf};

use crate::infra::errors::TideflowError;

/// Collect the `*.rhai` plugin files in a directory, in lexical filename
/// order. The caller decided the directory must exist.
pub(crate) fn script_files(dir: &Path) -> Result<Vec<PathBuf>, TideflowError> {
    if !dir.is_dir() {
        return Err(TideflowError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("rhai"))
        .collect();
    files.sort();
    Ok(files)
}
