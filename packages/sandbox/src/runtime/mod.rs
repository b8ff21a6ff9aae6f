// ABOUTME: Runtime trait and implementations for sandboxed process and filesystem access
// ABOUTME: Defines the abstract interface the action engine uses to spawn commands and write files

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod local;
pub mod memory;

pub use local::LocalRuntime;
pub use memory::{CommandScript, MemoryRuntime, ProcessEvent};

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Spawn error: {0}")]
    SpawnError(String),

    #[error("Process error: {0}")]
    ProcessError(String),

    #[error("Filesystem error at '{path}': {message}")]
    FsError { path: String, message: String },

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Path not allowed in sandbox: {0}")]
    InvalidPath(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RuntimeError {
    pub(crate) fn fs(path: &str, err: impl std::fmt::Display) -> Self {
        RuntimeError::FsError {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Options for spawning a process inside the sandbox
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Working directory relative to the project root (`None` means the root)
    pub cwd: Option<String>,
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stream: StreamType,
    pub data: Vec<u8>,
}

impl OutputChunk {
    pub fn new(stream: StreamType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            stream,
            data: data.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }
}

/// Output of a spawned process, one chunk per read
pub type OutputStream = mpsc::UnboundedReceiver<OutputChunk>;

pub(crate) fn closed_stream() -> OutputStream {
    mpsc::unbounded_channel().1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Handle to a process spawned inside the sandbox
#[async_trait]
pub trait SandboxProcess: Send {
    /// Take the combined stdout/stderr stream.
    ///
    /// The stream ends once every holder of the output pipes has closed them,
    /// which can be later than process exit. Later calls get an empty stream.
    fn take_output(&mut self) -> OutputStream;

    /// Wait for the process to exit and return its exit code
    async fn wait(&mut self) -> Result<i32>;

    /// Terminate the process
    async fn kill(&mut self) -> Result<()>;
}

/// Sandboxed execution environment shared by every action lane.
///
/// Paths are relative to the project root; the empty string names the root
/// itself. Implementations must refuse paths that could leave the root.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Spawn `program` with `args`
    async fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> Result<Box<dyn SandboxProcess>>;

    /// Create or truncate a file; the parent directory must exist
    async fn write_file(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Read a whole file
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Create a directory, including missing parents when `recursive` is set.
    /// Creating an existing directory recursively is not an error.
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()>;

    /// List the immediate children of a directory
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Remove a file, or a directory (with its contents when `recursive` is set)
    async fn remove(&self, path: &str, recursive: bool) -> Result<()>;

    /// Check whether a file or directory exists
    async fn exists(&self, path: &str) -> Result<bool>;
}
