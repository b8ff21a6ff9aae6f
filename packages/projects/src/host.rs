// ABOUTME: Reads a host directory tree into file entries for project loading
// ABOUTME: Text files are passed through, anything that is not UTF-8 is base64 encoded

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;
use workbench_core::FileEntry;

use crate::error::Result;

const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "target", "dist"];

fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Collect every file below `dir` as a [`FileEntry`] with a `/`-separated
/// path relative to `dir`, sorted by path.
pub fn read_host_tree(dir: &Path) -> Result<Vec<FileEntry>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Not a directory: {}", dir.display()),
        )
        .into());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        let bytes = std::fs::read(entry.path())?;
        let file = match String::from_utf8(bytes) {
            Ok(text) => FileEntry::text(relative, text),
            Err(e) => FileEntry {
                path: relative,
                content: BASE64.encode(e.as_bytes()),
                is_binary: true,
            },
        };
        entries.push(file);
    }

    debug!("Read {} files from {}", entries.len(), dir.display());
    Ok(entries)
}

/// Decode the payload of `entry` into the bytes to write
pub fn decode_entry(entry: &FileEntry) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    if entry.is_binary {
        BASE64.decode(entry.content.as_bytes())
    } else {
        Ok(entry.content.as_bytes().to_vec())
    }
}
