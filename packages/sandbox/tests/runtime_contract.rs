// ABOUTME: Contract tests shared by every sandbox runtime implementation
// ABOUTME: Verifies local and in-memory runtimes agree on filesystem and containment behaviour

use tempfile::TempDir;
use workbench_sandbox::{LocalRuntime, MemoryRuntime, RuntimeError, SandboxRuntime};

/// Exercise the filesystem operations the action engine relies on
///
/// This test verifies:
/// 1. Writes fail until the parent directory exists
/// 2. Recursive mkdir is idempotent
/// 3. Root listing and recursive removal leave an empty root
async fn assert_filesystem_contract(runtime: &dyn SandboxRuntime) {
    assert!(
        runtime.write_file("src/App.tsx", b"app").await.is_err(),
        "{}: write without parent should fail",
        runtime.name()
    );

    runtime.mkdir("src", true).await.expect("mkdir src");
    runtime.mkdir("src", true).await.expect("mkdir src again");
    runtime
        .write_file("src/App.tsx", b"app")
        .await
        .expect("write App.tsx");
    runtime
        .write_file("package.json", b"{}")
        .await
        .expect("write package.json");

    assert_eq!(runtime.read_file("src/App.tsx").await.unwrap(), b"app");

    let root: Vec<(String, bool)> = runtime
        .read_dir("")
        .await
        .expect("list root")
        .into_iter()
        .map(|entry| (entry.name, entry.is_dir))
        .collect();
    assert_eq!(
        root,
        vec![
            ("package.json".to_string(), false),
            ("src".to_string(), true)
        ],
        "{}: unexpected root listing",
        runtime.name()
    );

    for entry in runtime.read_dir("").await.unwrap() {
        runtime.remove(&entry.name, true).await.expect("remove entry");
    }
    assert!(runtime.read_dir("").await.unwrap().is_empty());
    assert!(runtime.exists("").await.unwrap());
}

/// Paths that escape the root are refused before any I/O happens
async fn assert_containment_contract(runtime: &dyn SandboxRuntime) {
    for path in ["../escape.txt", "/etc/passwd", "a/../../b", "~/x"] {
        let result = runtime.write_file(path, b"x").await;
        assert!(
            matches!(result, Err(RuntimeError::InvalidPath(_))),
            "{}: {} should be refused",
            runtime.name(),
            path
        );
    }
}

#[tokio::test]
async fn test_memory_runtime_contract() {
    let runtime = MemoryRuntime::new();
    assert_filesystem_contract(&runtime).await;
    assert_containment_contract(&runtime).await;
}

#[tokio::test]
async fn test_local_runtime_contract() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let runtime = LocalRuntime::create(temp_dir.path().join("project"))
        .await
        .expect("Failed to create local runtime");

    assert_filesystem_contract(&runtime).await;
    assert_containment_contract(&runtime).await;
    assert!(!temp_dir.path().join("escape.txt").exists());
}
