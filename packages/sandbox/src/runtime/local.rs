// ABOUTME: Local runtime implementation backed by a host directory
// ABOUTME: Spawns processes with tokio and maps project-relative paths under the host root

use super::{
    closed_stream, DirEntry, OutputChunk, OutputStream, Result, RuntimeError, SandboxProcess,
    SandboxRuntime, SpawnOptions, StreamType,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use workbench_core::validation::check_path;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Runtime that executes directly on the host, confined to one directory.
///
/// Isolation is limited to path containment; commands run with the
/// privileges of the current user.
pub struct LocalRuntime {
    root: PathBuf,
}

impl LocalRuntime {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the host root directory if needed and return a runtime for it
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| RuntimeError::fs(&root.to_string_lossy(), e))?;
        info!("Local runtime rooted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() {
            return Ok(self.root.clone());
        }
        // No root alias here: every absolute path is refused
        let relative =
            check_path(path, "").map_err(|e| RuntimeError::InvalidPath(format!("{path}: {e}")))?;
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl SandboxRuntime for LocalRuntime {
    fn name(&self) -> &str {
        "local"
    }

    async fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> Result<Box<dyn SandboxProcess>> {
        let cwd = self.resolve(options.cwd.as_deref().unwrap_or(""))?;
        debug!("Spawning {} {:?} in {}", program, args, cwd.display());

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&cwd)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::SpawnError(format!("{program}: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, StreamType::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, StreamType::Stderr, tx));
        }

        Ok(Box::new(LocalProcess {
            child,
            output: Some(rx),
        }))
    }

    async fn write_file(&self, path: &str, contents: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::write(&target, contents)
            .await
            .map_err(|e| RuntimeError::fs(path, e))
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RuntimeError::NotFound(path.to_string()))
            }
            Err(e) => Err(RuntimeError::fs(path, e)),
        }
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        let target = self.resolve(path)?;
        let result = if recursive {
            tokio::fs::create_dir_all(&target).await
        } else {
            tokio::fs::create_dir(&target).await
        };
        result.map_err(|e| RuntimeError::fs(path, e))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let target = self.resolve(path)?;
        let mut reader = match tokio::fs::read_dir(&target).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RuntimeError::NotFound(path.to_string()))
            }
            Err(e) => return Err(RuntimeError::fs(path, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| RuntimeError::fs(path, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let target = self.resolve(path)?;
        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RuntimeError::NotFound(path.to_string()))
            }
            Err(e) => return Err(RuntimeError::fs(path, e)),
        };

        let result = if metadata.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&target).await
            } else {
                tokio::fs::remove_dir(&target).await
            }
        } else {
            tokio::fs::remove_file(&target).await
        };
        result.map_err(|e| RuntimeError::fs(path, e))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        tokio::fs::try_exists(&target)
            .await
            .map_err(|e| RuntimeError::fs(path, e))
    }
}

async fn forward_output<R>(mut reader: R, stream: StreamType, tx: mpsc::UnboundedSender<OutputChunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(OutputChunk::new(stream, &buf[..n])).is_err() {
                    break; // Receiver dropped
                }
            }
            Err(e) => {
                warn!("Error reading {:?} from process: {}", stream, e);
                break;
            }
        }
    }
}

struct LocalProcess {
    child: Child,
    output: Option<OutputStream>,
}

#[async_trait]
impl SandboxProcess for LocalProcess {
    fn take_output(&mut self) -> OutputStream {
        self.output.take().unwrap_or_else(closed_stream)
    }

    async fn wait(&mut self) -> Result<i32> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| RuntimeError::ProcessError(e.to_string()))?;
        Ok(exit_code(status))
    }

    async fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| RuntimeError::ProcessError(e.to_string()))
    }
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn collect_output(process: &mut Box<dyn SandboxProcess>) -> String {
        let mut stream = process.take_output();
        let mut output = String::new();
        while let Some(chunk) = stream.recv().await {
            output.push_str(&chunk.text());
        }
        output
    }

    #[tokio::test]
    async fn test_write_read_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::create(temp_dir.path().join("project"))
            .await
            .unwrap();

        runtime.mkdir("src/components", true).await.unwrap();
        // Recursive mkdir of an existing directory is idempotent
        runtime.mkdir("src/components", true).await.unwrap();
        runtime
            .write_file("src/components/Button.tsx", b"export {}")
            .await
            .unwrap();

        assert_eq!(
            runtime.read_file("src/components/Button.tsx").await.unwrap(),
            b"export {}"
        );
        assert!(runtime.exists("src/components").await.unwrap());
        assert!(!runtime.exists("missing.txt").await.unwrap());

        let entries = runtime.read_dir("src").await.unwrap();
        assert_eq!(
            entries,
            vec![DirEntry {
                name: "components".to_string(),
                is_dir: true
            }]
        );
    }

    #[tokio::test]
    async fn test_write_requires_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());

        let result = runtime.write_file("nested/file.txt", b"x").await;
        assert!(matches!(result, Err(RuntimeError::FsError { .. })));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path().join("root"));

        for path in ["../outside.txt", "/etc/passwd", "a/../../b"] {
            let result = runtime.write_file(path, b"x").await;
            assert!(
                matches!(result, Err(RuntimeError::InvalidPath(_))),
                "{} should be refused",
                path
            );
        }
        assert!(!temp_dir.path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_remove_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());

        runtime.mkdir("dir/sub", true).await.unwrap();
        runtime.write_file("dir/sub/a.txt", b"a").await.unwrap();
        runtime.write_file("top.txt", b"t").await.unwrap();

        assert!(runtime.remove("dir", false).await.is_err());
        runtime.remove("dir", true).await.unwrap();
        runtime.remove("top.txt", false).await.unwrap();

        assert!(runtime.read_dir("").await.unwrap().is_empty());
        assert!(matches!(
            runtime.remove("top.txt", false).await,
            Err(RuntimeError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_captures_output_and_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());

        let mut process = runtime
            .spawn(
                "sh",
                &["-c".to_string(), "echo out; echo err 1>&2; exit 3".to_string()],
                SpawnOptions::default(),
            )
            .await
            .unwrap();

        let output = collect_output(&mut process).await;
        assert!(output.contains("out"));
        assert!(output.contains("err"));
        assert_eq!(process.wait().await.unwrap(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_runs_in_project_root() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());
        runtime.write_file("marker.txt", b"here").await.unwrap();

        let mut process = runtime
            .spawn(
                "sh",
                &["-c".to_string(), "cat marker.txt".to_string()],
                SpawnOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(collect_output(&mut process).await, "here");
        assert_eq!(process.wait().await.unwrap(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_terminates_process() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());

        let mut process = runtime
            .spawn(
                "sh",
                &["-c".to_string(), "exec sleep 30".to_string()],
                SpawnOptions::default(),
            )
            .await
            .unwrap();

        process.kill().await.unwrap();
        let code = tokio::time::timeout(std::time::Duration::from_secs(5), process.wait())
            .await
            .expect("process should exit after kill")
            .unwrap();
        assert_ne!(code, 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp_dir.path());

        let result = runtime
            .spawn("definitely-not-a-real-program-xyz", &[], SpawnOptions::default())
            .await;
        assert!(matches!(result, Err(RuntimeError::SpawnError(_))));
    }
}
