/// Virtual project root used when no other root is configured
pub const DEFAULT_PROJECT_ROOT: &str = "/home/project";

/// Longest path (in characters) accepted by the containment validator
pub const MAX_PATH_LENGTH: usize = 1000;

/// Error messages recorded on actions are truncated to this many characters
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// Default shell program used for shell actions (`<shell> -c <command>`)
pub const DEFAULT_SHELL: &str = "sh";

/// Default host directory backing the local runtime
pub const DEFAULT_SANDBOX_DIR: &str = "./sandbox";
