// ABOUTME: Authoritative file store with editor documents and unsaved tracking
// ABOUTME: Keeps last-saved content per root-relative path and the set of dirty documents

use std::collections::{BTreeMap, BTreeSet};
use workbench_core::FileEntry;

#[derive(Debug, Default)]
pub struct FileStore {
    saved: BTreeMap<String, FileEntry>,
    documents: BTreeMap<String, String>,
    unsaved: BTreeSet<String>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entry` as the saved state of `path`, replacing any open document
    pub fn insert_saved(&mut self, path: &str, entry: FileEntry) {
        if !entry.is_binary {
            self.documents.insert(path.to_string(), entry.content.clone());
        }
        self.unsaved.remove(path);
        self.saved.insert(path.to_string(), entry);
    }

    /// Update the editor buffer for `path`; returns whether it is now unsaved
    pub fn set_document_content(&mut self, path: &str, content: &str) -> bool {
        self.documents.insert(path.to_string(), content.to_string());

        let matches_saved = self
            .saved
            .get(path)
            .is_some_and(|entry| !entry.is_binary && entry.content == content);
        if matches_saved {
            self.unsaved.remove(path);
            false
        } else {
            self.unsaved.insert(path.to_string());
            true
        }
    }

    pub fn document(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    pub fn saved(&self, path: &str) -> Option<&FileEntry> {
        self.saved.get(path)
    }

    /// Mark the current document for `path` as saved
    pub fn mark_saved(&mut self, path: &str, content: &str) {
        self.saved
            .insert(path.to_string(), FileEntry::text(path, content));
        self.unsaved.remove(path);
    }

    pub fn is_unsaved(&self, path: &str) -> bool {
        self.unsaved.contains(path)
    }

    /// Owned copy of the unsaved set, safe to iterate while saving
    pub fn unsaved(&self) -> Vec<String> {
        self.unsaved.iter().cloned().collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.saved.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn clear(&mut self) {
        self.saved.clear();
        self.documents.clear();
        self.unsaved.clear();
    }
}
