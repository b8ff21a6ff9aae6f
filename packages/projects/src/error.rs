// ABOUTME: Error types for file synchronization and project loading
// ABOUTME: Wraps sandbox runtime failures and rejected editor paths

use thiserror::Error;
use workbench_core::ContainmentError;
use workbench_sandbox::RuntimeError;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Sandbox error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        path: String,
        reason: ContainmentError,
    },

    #[error("No open document for {0}")]
    DocumentNotFound(String),

    #[error("Invalid binary payload for {path}: {message}")]
    Decode { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;
