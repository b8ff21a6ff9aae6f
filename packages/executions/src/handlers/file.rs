// ABOUTME: File action handler writing content into the sandbox project tree
// ABOUTME: Resolves targets through the containment validator and applies the configured escape policy

use tracing::{debug, warn};
use workbench_core::{basename, check_path, join_root, PathPolicy};

use super::HandlerEnv;
use crate::context::ActionContext;
use crate::error::ActionError;

/// Root-relative destination of a file action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub relative: String,
    pub relocated_from: Option<String>,
}

/// Map a requested path onto a location inside the project root.
///
/// Under [`PathPolicy::Relocate`] a path that escapes the root is written
/// to `<root>/<basename>` instead; under [`PathPolicy::Reject`] it fails.
pub fn resolve_target(
    file_path: &str,
    root: &str,
    policy: PathPolicy,
) -> Result<FileTarget, ActionError> {
    let reason = match check_path(file_path, root) {
        Ok(relative) => {
            return Ok(FileTarget {
                relative,
                relocated_from: None,
            })
        }
        Err(reason) => reason,
    };

    if policy == PathPolicy::Reject {
        return Err(ActionError::Validation(format!(
            "Path '{}' is outside the project root: {}",
            file_path, reason
        )));
    }

    let relocated = basename(file_path)
        .ok_or_else(|| ActionError::Validation(format!("Path '{}' has no file name", file_path)))
        .and_then(|name| {
            check_path(name, "").map_err(|e| {
                ActionError::Validation(format!("Cannot relocate '{}': {}", file_path, e))
            })
        })?;

    Ok(FileTarget {
        relative: relocated,
        relocated_from: Some(file_path.to_string()),
    })
}

fn parent_of(relative: &str) -> Option<&str> {
    relative.rsplit_once('/').map(|(parent, _)| parent)
}

pub async fn run_file(
    ctx: &ActionContext,
    env: &HandlerEnv,
    file_path: &str,
    content: &str,
) -> Result<(), ActionError> {
    let root = &env.settings.project_root;
    let target = resolve_target(file_path, root, env.settings.path_policy)?;
    let shown = join_root(root, &target.relative);

    ctx.record(format!("File: {}", shown));
    if let Some(original) = &target.relocated_from {
        warn!(
            "Action {} path '{}' escapes {}; writing to {}",
            ctx.action_id, original, root, shown
        );
        ctx.record(format!(
            "Warning: '{}' is outside {}, relocated to {}",
            original, root, shown
        ));
    }

    let _guard = match &env.path_locks {
        Some(locks) => Some(tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(ActionError::Aborted),
            guard = locks.lock(&target.relative) => guard,
        }),
        None => None,
    };

    if ctx.is_cancelled() {
        return Err(ActionError::Aborted);
    }

    if let Some(parent) = parent_of(&target.relative) {
        match env.runtime.mkdir(parent, true).await {
            Ok(()) => ctx.record(format!("Directory: {}", join_root(root, parent))),
            Err(e) => {
                // The write below reports the real failure if the directory is missing
                warn!("Failed to create directory for {}: {}", shown, e);
                ctx.record(format!("Directory: failed to create {}: {}", join_root(root, parent), e));
            }
        }
    }

    if ctx.is_cancelled() {
        return Err(ActionError::Aborted);
    }

    match env.runtime.write_file(&target.relative, content.as_bytes()).await {
        Ok(()) => {
            debug!("Wrote {} bytes to {}", content.len(), shown);
            ctx.record(format!("Written: {} bytes", content.len()));
            Ok(())
        }
        Err(e) => {
            ctx.record(format!("Write failed: {}", e));
            Err(ActionError::Execution(format!(
                "Failed to write {}: {}",
                shown, e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const ROOT: &str = "/home/project";

    #[rstest]
    #[case("src/App.tsx", "src/App.tsx")]
    #[case("/home/project/package.json", "package.json")]
    #[case("./README.md", "README.md")]
    fn test_contained_paths_resolve_in_place(#[case] input: &str, #[case] expected: &str) {
        let target = resolve_target(input, ROOT, PathPolicy::Relocate).unwrap();
        assert_eq!(
            target,
            FileTarget {
                relative: expected.to_string(),
                relocated_from: None,
            }
        );
    }

    #[rstest]
    #[case("../secrets.env", "secrets.env")]
    #[case("/etc/passwd", "passwd")]
    #[case("src/../../outside/config.json", "config.json")]
    #[case("~/notes.txt", "notes.txt")]
    fn test_escaping_paths_relocate_to_basename(#[case] input: &str, #[case] expected: &str) {
        let target = resolve_target(input, ROOT, PathPolicy::Relocate).unwrap();
        assert_eq!(target.relative, expected);
        assert_eq!(target.relocated_from.as_deref(), Some(input));
    }

    #[test]
    fn test_reject_policy_fails_validation() {
        let result = resolve_target("../secrets.env", ROOT, PathPolicy::Reject);
        assert!(matches!(result, Err(ActionError::Validation(_))));
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("../..")]
    #[case("/tmp/~")]
    fn test_unrelocatable_paths_fail(#[case] input: &str) {
        let result = resolve_target(input, ROOT, PathPolicy::Relocate);
        assert!(
            matches!(result, Err(ActionError::Validation(_))),
            "{:?} should not resolve",
            input
        );
    }
}
