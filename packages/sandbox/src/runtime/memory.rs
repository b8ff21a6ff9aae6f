// ABOUTME: In-memory runtime with scripted commands for tests and dry runs
// ABOUTME: Keeps files in a map and records process lifecycle events in spawn order

use super::{
    closed_stream, DirEntry, OutputChunk, OutputStream, Result, RuntimeError, SandboxProcess,
    SandboxRuntime, SpawnOptions, StreamType,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use workbench_core::validation::check_path;

/// Scripted behaviour for a command run through [`MemoryRuntime`]
#[derive(Debug, Clone, Default)]
pub struct CommandScript {
    pub output: Vec<(StreamType, String)>,
    pub exit_code: i32,
    /// Time between the last output chunk and exit
    pub delay: Duration,
    /// Never exit on its own; only `kill` ends the process
    pub hang: bool,
    pub spawn_error: Option<String>,
}

impl CommandScript {
    pub fn exits(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn failing_to_spawn(message: impl Into<String>) -> Self {
        Self {
            spawn_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, text: impl Into<String>) -> Self {
        self.output.push((StreamType::Stdout, text.into()));
        self
    }

    pub fn with_stderr(mut self, text: impl Into<String>) -> Self {
        self.output.push((StreamType::Stderr, text.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Process lifecycle events, recorded in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started(String),
    Exited(String, i32),
    Killed(String),
}

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    scripts: HashMap<String, CommandScript>,
    events: Vec<ProcessEvent>,
    failing_writes: HashSet<String>,
    failing_mkdirs: HashSet<String>,
    failing_removes: HashSet<String>,
}

impl MemoryState {
    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.is_dir(path) || self.files.contains_key(path)
    }
}

/// Runtime with an in-memory filesystem and scripted processes.
///
/// Commands run through `<shell> -c <command>` are matched on `<command>`;
/// anything else on the space-joined command line. Unscripted commands exit
/// with code 0 and no output.
#[derive(Clone, Default)]
pub struct MemoryRuntime {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the behaviour of `command`
    pub fn script(&self, command: impl Into<String>, script: CommandScript) {
        self.state().scripts.insert(command.into(), script);
    }

    /// Make every write to `path` fail
    pub fn fail_writes_to(&self, path: impl Into<String>) {
        self.state().failing_writes.insert(path.into());
    }

    /// Make every mkdir of `path` fail
    pub fn fail_mkdir(&self, path: impl Into<String>) {
        self.state().failing_mkdirs.insert(path.into());
    }

    /// Make every removal of `path` fail
    pub fn fail_remove(&self, path: impl Into<String>) {
        self.state().failing_removes.insert(path.into());
    }

    /// Snapshot of all files
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.state().files.clone()
    }

    /// Sorted list of file paths
    pub fn file_paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.state()
            .files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state().is_dir(path)
    }

    pub fn process_events(&self) -> Vec<ProcessEvent> {
        self.state().events.clone()
    }

    /// Commands in the order they were started
    pub fn spawned_commands(&self) -> Vec<String> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                ProcessEvent::Started(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn normalize(path: &str) -> Result<String> {
        if path.is_empty() {
            return Ok(String::new());
        }
        check_path(path, "").map_err(|e| RuntimeError::InvalidPath(format!("{path}: {e}")))
    }

    fn record(&self, event: ProcessEvent) {
        self.state().events.push(event);
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn is_child_of(candidate: &str, dir: &str) -> bool {
    if dir.is_empty() {
        !candidate.is_empty()
    } else {
        candidate
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn command_line(program: &str, args: &[String]) -> String {
    match args {
        [flag, command] if flag == "-c" => command.clone(),
        _ => std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[async_trait]
impl SandboxRuntime for MemoryRuntime {
    fn name(&self) -> &str {
        "memory"
    }

    async fn spawn(
        &self,
        program: &str,
        args: &[String],
        _options: SpawnOptions,
    ) -> Result<Box<dyn SandboxProcess>> {
        let command = command_line(program, args);
        let script = self
            .state()
            .scripts
            .get(&command)
            .cloned()
            .unwrap_or_default();

        if let Some(message) = script.spawn_error {
            return Err(RuntimeError::SpawnError(message));
        }

        debug!("Memory runtime starting: {}", command);
        self.record(ProcessEvent::Started(command.clone()));

        // Scripted output is fully buffered and the stream already closed
        let (tx, output) = tokio::sync::mpsc::unbounded_channel();
        for (stream, text) in &script.output {
            let _ = tx.send(OutputChunk::new(*stream, text.as_bytes()));
        }

        Ok(Box::new(MemoryProcess {
            runtime: self.clone(),
            command,
            output: Some(output),
            exit_code: script.exit_code,
            delay: script.delay,
            hang: script.hang,
            finished: false,
        }))
    }

    async fn write_file(&self, path: &str, contents: &[u8]) -> Result<()> {
        let path = Self::normalize(path)?;
        let mut state = self.state();
        if state.failing_writes.contains(&path) {
            return Err(RuntimeError::fs(&path, "injected write failure"));
        }
        if state.is_dir(&path) {
            return Err(RuntimeError::fs(&path, "is a directory"));
        }
        if !state.is_dir(parent_of(&path)) {
            return Err(RuntimeError::fs(&path, "parent directory does not exist"));
        }
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let path = Self::normalize(path)?;
        self.state()
            .files
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::NotFound(path))
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        let path = Self::normalize(path)?;
        let mut state = self.state();
        if state.failing_mkdirs.contains(&path) {
            return Err(RuntimeError::fs(&path, "injected mkdir failure"));
        }
        if path.is_empty() {
            return Ok(());
        }
        if state.files.contains_key(&path) {
            return Err(RuntimeError::fs(&path, "file exists"));
        }

        if recursive {
            let mut current = String::new();
            for segment in path.split('/') {
                if !current.is_empty() {
                    current.push('/');
                }
                current.push_str(segment);
                if state.files.contains_key(&current) {
                    return Err(RuntimeError::fs(&current, "not a directory"));
                }
                state.dirs.insert(current.clone());
            }
            return Ok(());
        }

        if state.dirs.contains(&path) {
            return Err(RuntimeError::fs(&path, "directory exists"));
        }
        if !state.is_dir(parent_of(&path)) {
            return Err(RuntimeError::fs(&path, "parent directory does not exist"));
        }
        state.dirs.insert(path);
        Ok(())
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let path = Self::normalize(path)?;
        let state = self.state();
        if !state.is_dir(&path) {
            return Err(RuntimeError::NotFound(path));
        }

        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter(|dir| parent_of(dir) == path)
            .map(|dir| DirEntry {
                name: dir.rsplit('/').next().unwrap_or(dir).to_string(),
                is_dir: true,
            })
            .chain(
                state
                    .files
                    .keys()
                    .filter(|file| parent_of(file) == path)
                    .map(|file| DirEntry {
                        name: file.rsplit('/').next().unwrap_or(file).to_string(),
                        is_dir: false,
                    }),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let path = Self::normalize(path)?;
        let mut state = self.state();
        if state.failing_removes.contains(&path) {
            return Err(RuntimeError::fs(&path, "injected remove failure"));
        }
        if path.is_empty() {
            return Err(RuntimeError::InvalidPath(
                "refusing to remove the project root".to_string(),
            ));
        }
        if state.files.remove(&path).is_some() {
            return Ok(());
        }
        if !state.dirs.contains(&path) {
            return Err(RuntimeError::NotFound(path));
        }

        let has_children = state.dirs.iter().any(|d| is_child_of(d, &path))
            || state.files.keys().any(|f| is_child_of(f, &path));
        if has_children && !recursive {
            return Err(RuntimeError::fs(&path, "directory not empty"));
        }

        state.dirs.retain(|d| d != &path && !is_child_of(d, &path));
        state.files.retain(|f, _| !is_child_of(f, &path));
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize(path)?;
        Ok(self.state().exists(&path))
    }
}

struct MemoryProcess {
    runtime: MemoryRuntime,
    command: String,
    output: Option<OutputStream>,
    exit_code: i32,
    delay: Duration,
    hang: bool,
    finished: bool,
}

#[async_trait]
impl SandboxProcess for MemoryProcess {
    fn take_output(&mut self) -> OutputStream {
        self.output.take().unwrap_or_else(closed_stream)
    }

    async fn wait(&mut self) -> Result<i32> {
        if self.finished {
            return Ok(self.exit_code);
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished = true;
        self.runtime
            .record(ProcessEvent::Exited(self.command.clone(), self.exit_code));
        Ok(self.exit_code)
    }

    async fn kill(&mut self) -> Result<()> {
        if !self.finished {
            self.finished = true;
            self.exit_code = 137;
            self.runtime.record(ProcessEvent::Killed(self.command.clone()));
        }
        Ok(())
    }
}
