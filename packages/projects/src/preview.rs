// ABOUTME: Cache of preview servers reported by the running project
// ABOUTME: Maps listening ports to preview URLs until the next reset

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub port: u16,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct PreviewCache {
    previews: BTreeMap<u16, String>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server listening on `port`; returns the previous URL, if any
    pub fn open(&mut self, port: u16, url: impl Into<String>) -> Option<String> {
        self.previews.insert(port, url.into())
    }

    pub fn close(&mut self, port: u16) -> bool {
        self.previews.remove(&port).is_some()
    }

    /// Previews ordered by port
    pub fn list(&self) -> Vec<PreviewInfo> {
        self.previews
            .iter()
            .map(|(port, url)| PreviewInfo {
                port: *port,
                url: url.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }

    pub fn clear(&mut self) {
        self.previews.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let mut cache = PreviewCache::new();
        assert_eq!(cache.open(5173, "http://localhost:5173"), None);
        assert_eq!(
            cache.open(5173, "http://127.0.0.1:5173"),
            Some("http://localhost:5173".to_string())
        );
        cache.open(3000, "http://localhost:3000");

        let ports: Vec<u16> = cache.list().iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![3000, 5173]);

        assert!(cache.close(3000));
        assert!(!cache.close(3000));
        cache.clear();
        assert!(cache.is_empty());
    }
}
