// ABOUTME: Sandbox runtime and tool invoker seams for the Workbench action engine
// ABOUTME: Provides the runtime trait plus local (host directory) and in-memory implementations

pub mod runtime;
pub mod tools;

pub use runtime::{
    CommandScript, DirEntry, LocalRuntime, MemoryRuntime, OutputChunk, OutputStream,
    ProcessEvent, Result, RuntimeError, SandboxProcess, SandboxRuntime, SpawnOptions, StreamType,
};
pub use tools::{ToolCallResponse, ToolError, ToolInvoker, UnavailableToolInvoker};
