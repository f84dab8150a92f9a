// src/workflows/loader.rs — Workflow discovery from a directory
//
// Every `*.rhai` file in the directory is one workflow, loaded in lexical
// filename order. A file that fails to compile or errors during its
// top-level run is logged and skipped; the rest still load.

use std::path::Path;
use std::sync::Arc;

use crate::infra::errors::TideflowError;
use crate::script::script_files;
use crate::workflows::{ScriptWorkflow, Workflow};

/// Load every workflow script in `dir`. The workflows directory is
/// required: a missing directory is a startup error, not an empty set.
pub fn load_workflows(dir: &Path) -> Result<Vec<Arc<dyn Workflow>>, TideflowError> {
    let mut workflows: Vec<Arc<dyn Workflow>> = Vec::new();

    for path in script_files(dir)? {
        match ScriptWorkflow::load(&path) {
            Ok(workflow) => {
                tracing::info!("loaded workflow '{}' from {}", workflow.name(), path.display());
                workflows.push(Arc::new(workflow));
            }
            Err(e) => {
                tracing::error!("failed to load workflow {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(workflows)
}
