// ABOUTME: Core types, traits, and utilities for the Workbench action engine
// ABOUTME: Foundational package providing the action model, path containment and configuration

pub mod config;
pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    ActionData, ActionDescriptor, ActionKind, ActionState, ActionStatus, FileEntry,
    ProjectContext,
};

// Re-export configuration
pub use config::{ConfigError, PathPolicy, WorkbenchConfig};

// Re-export constants
pub use constants::{DEFAULT_PROJECT_ROOT, MAX_ERROR_MESSAGE_LENGTH, MAX_PATH_LENGTH};

// Re-export utilities
pub use utils::{basename, join_root, sanitize_message};

// Re-export validation
pub use validation::{check_path, validate_path, validate_path_with_root, ContainmentError};
