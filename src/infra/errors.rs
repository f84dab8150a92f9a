// src/infra/errors.rs — Error types for tideflow

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort startup. Anything recoverable (a bad plugin file, an
/// unknown trigger type, a failed poll cycle) is logged at its own boundary
/// and never surfaces here.
#[derive(Error, Debug)]
pub enum TideflowError {
    #[error("configuration file not found: {0}")]
    ConfigMissing(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
