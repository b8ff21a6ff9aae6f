// ABOUTME: Session-level workbench owning artifacts, files and the active project
// ABOUTME: Implements saving, project switching with full sandbox reset and batch file loading

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use workbench_core::{check_path, FileEntry, ProjectContext, WorkbenchConfig};
use workbench_executions::ArtifactRegistry;
use workbench_sandbox::{SandboxRuntime, ToolInvoker};

use crate::error::{Result, WorkbenchError};
use crate::files::FileStore;
use crate::host::decode_entry;
use crate::preview::PreviewCache;

/// Outcome of [`Workbench::load_project_files`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: usize,
    pub reset: bool,
}

/// Outcome of [`Workbench::save_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<String>,
}

fn parent_of(relative: &str) -> Option<&str> {
    relative.rsplit_once('/').map(|(parent, _)| parent)
}

pub struct Workbench {
    runtime: Arc<dyn SandboxRuntime>,
    config: WorkbenchConfig,
    registry: ArtifactRegistry,
    files: FileStore,
    previews: PreviewCache,
    project: ProjectContext,
    visible: bool,
    resets: usize,
}

impl Workbench {
    /// Must be called inside a Tokio runtime (artifact runners spawn tasks)
    pub fn new(
        runtime: Arc<dyn SandboxRuntime>,
        tools: Arc<dyn ToolInvoker>,
        config: WorkbenchConfig,
    ) -> Self {
        let registry = ArtifactRegistry::new(runtime.clone(), tools, &config);
        Self {
            runtime,
            config,
            registry,
            files: FileStore::new(),
            previews: PreviewCache::new(),
            project: ProjectContext::default(),
            visible: false,
            resets: 0,
        }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ArtifactRegistry {
        &mut self.registry
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn previews(&self) -> &PreviewCache {
        &self.previews
    }

    pub fn previews_mut(&mut self) -> &mut PreviewCache {
        &mut self.previews
    }

    pub fn project(&self) -> &ProjectContext {
        &self.project
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Number of full resets performed so far
    pub fn reset_count(&self) -> usize {
        self.resets
    }

    fn relative(&self, path: &str) -> Result<String> {
        check_path(path, &self.config.project_root).map_err(|reason| {
            WorkbenchError::InvalidPath {
                path: path.to_string(),
                reason,
            }
        })
    }

    /// Update the editor buffer for `path`; returns whether it is now unsaved
    pub fn set_document_content(&mut self, path: &str, content: &str) -> Result<bool> {
        let relative = self.relative(path)?;
        Ok(self.files.set_document_content(&relative, content))
    }

    pub fn unsaved_files(&self) -> Vec<String> {
        self.files.unsaved()
    }

    async fn write(&self, relative: &str, contents: &[u8]) -> Result<()> {
        if let Some(parent) = parent_of(relative) {
            self.runtime.mkdir(parent, true).await?;
        }
        self.runtime.write_file(relative, contents).await?;
        Ok(())
    }

    /// Write the editor content of `path` to the sandbox and mark it saved
    pub async fn save_file(&mut self, path: &str) -> Result<()> {
        let relative = self.relative(path)?;
        let content = self
            .files
            .document(&relative)
            .map(str::to_string)
            .ok_or_else(|| WorkbenchError::DocumentNotFound(path.to_string()))?;

        self.write(&relative, content.as_bytes()).await?;
        self.files.mark_saved(&relative, &content);
        debug!("Saved {}", relative);
        Ok(())
    }

    /// Save every unsaved document, continuing past individual failures
    pub async fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        for path in self.files.unsaved() {
            match self.save_file(&path).await {
                Ok(()) => report.saved.push(path),
                Err(e) => {
                    warn!("Failed to save {}: {}", path, e);
                    report.failed.push(path);
                }
            }
        }
        report
    }

    /// Tear down everything tied to the current project and empty the sandbox.
    ///
    /// Running actions are aborted and waited for before anything is
    /// removed. Entries that cannot be removed are
    /// logged and left behind; only failing to (re)create the root is an error.
    pub async fn reset_workbench(&mut self) -> Result<()> {
        info!("Resetting workbench");
        self.registry.clear().await;
        self.visible = false;
        self.files.clear();
        self.previews.clear();
        self.resets += 1;

        match self.runtime.read_dir("").await {
            Ok(entries) => {
                for entry in entries {
                    if let Err(e) = self.runtime.remove(&entry.name, true).await {
                        warn!("Failed to remove {} during reset: {}", entry.name, e);
                    }
                }
            }
            Err(e) => warn!("Could not list project root during reset: {}", e),
        }

        self.runtime.mkdir("", true).await?;
        Ok(())
    }

    /// Load a batch of files for `project_id`.
    ///
    /// Switching from a different active project resets the workbench first;
    /// loading into the same (or no) project overlays the files.
    pub async fn load_project_files(
        &mut self,
        files: Vec<FileEntry>,
        project_name: Option<&str>,
        project_id: &str,
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        let switching = self
            .project
            .project_id
            .as_deref()
            .is_some_and(|active| active != project_id);
        if switching {
            info!(
                "Switching project from {:?} to {}",
                self.project.project_id, project_id
            );
            self.reset_workbench().await?;
            report.reset = true;
        }

        self.project = ProjectContext {
            project_id: Some(project_id.to_string()),
            project_name: project_name.map(str::to_string),
        };

        for entry in files {
            let relative = match self.relative(&entry.path) {
                Ok(relative) => relative,
                Err(e) => {
                    warn!("Skipping file: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            let contents = match decode_entry(&entry) {
                Ok(contents) => contents,
                Err(e) => {
                    let error = WorkbenchError::Decode {
                        path: entry.path.clone(),
                        message: e.to_string(),
                    };
                    warn!("Skipping file: {}", error);
                    report.failed += 1;
                    continue;
                }
            };

            match self.write(&relative, &contents).await {
                Ok(()) => {
                    let entry = FileEntry {
                        path: relative.clone(),
                        ..entry
                    };
                    self.files.insert_saved(&relative, entry);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", relative, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Loaded {} files into project {} ({} failed)",
            report.loaded, project_id, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workbench_sandbox::{MemoryRuntime, UnavailableToolInvoker};

    fn workbench(runtime: &MemoryRuntime) -> Workbench {
        Workbench::new(
            Arc::new(runtime.clone()),
            Arc::new(UnavailableToolInvoker),
            WorkbenchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_save_file_writes_sandbox() {
        let runtime = MemoryRuntime::new();
        let mut workbench = workbench(&runtime);

        assert!(workbench
            .set_document_content("/home/project/src/App.tsx", "app")
            .unwrap());
        workbench.save_file("src/App.tsx").await.unwrap();

        assert_eq!(runtime.file_text("src/App.tsx").as_deref(), Some("app"));
        assert!(workbench.unsaved_files().is_empty());
    }

    #[tokio::test]
    async fn test_save_unknown_document() {
        let runtime = MemoryRuntime::new();
        let mut workbench = workbench(&runtime);
        assert!(matches!(
            workbench.save_file("missing.txt").await,
            Err(WorkbenchError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_escaping_document_path_rejected() {
        let runtime = MemoryRuntime::new();
        let mut workbench = workbench(&runtime);
        assert!(matches!(
            workbench.set_document_content("../outside.txt", "x"),
            Err(WorkbenchError::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_session_state() {
        let runtime = MemoryRuntime::new();
        let mut workbench = workbench(&runtime);
        workbench.set_visible(true);
        workbench.previews_mut().open(5173, "http://localhost:5173");
        workbench
            .registry_mut()
            .create_artifact("msg-1", "app", "App");
        workbench.set_document_content("a.txt", "draft").unwrap();

        workbench.reset_workbench().await.unwrap();

        assert!(!workbench.is_visible());
        assert!(workbench.previews().is_empty());
        assert!(workbench.registry().is_empty());
        assert!(workbench.unsaved_files().is_empty());
        assert_eq!(workbench.reset_count(), 1);
    }
}
