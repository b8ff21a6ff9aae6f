// ABOUTME: Shared utility functions for the Workbench packages
// ABOUTME: Error message sanitization and virtual path helpers

use crate::constants::MAX_ERROR_MESSAGE_LENGTH;

/// Make an error message safe to record on an action and show in the UI.
///
/// Control characters other than newline and tab are dropped and the result
/// is truncated to [`MAX_ERROR_MESSAGE_LENGTH`] characters.
pub fn sanitize_message(message: &str) -> String {
    let cleaned: String = message
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return cleaned.to_string();
    }

    let mut truncated: String = cleaned.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    truncated.push_str("...");
    truncated
}

/// Join a root-relative path onto the virtual project root
pub fn join_root(root: &str, relative: &str) -> String {
    let root = root.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return if root.is_empty() { "/".to_string() } else { root.to_string() };
    }
    format!("{}/{}", root, relative)
}

/// Last non-empty path segment, accepting both separators
pub fn basename(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).find(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(
            sanitize_message("\u{1b}[31mboom\u{1b}[0m\nline two\0"),
            "[31mboom[0m\nline two"
        );
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_LENGTH * 2);
        let sanitized = sanitize_message(&long);
        assert_eq!(sanitized.chars().count(), MAX_ERROR_MESSAGE_LENGTH + 3);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_join_root() {
        assert_eq!(join_root("/home/project", "src/App.tsx"), "/home/project/src/App.tsx");
        assert_eq!(join_root("/home/project/", "/src"), "/home/project/src");
        assert_eq!(join_root("/home/project", ""), "/home/project");
        assert_eq!(join_root("/", "a"), "/a");
        assert_eq!(join_root("/", ""), "/");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/etc/passwd"), Some("passwd"));
        assert_eq!(basename("../../secret.txt"), Some("secret.txt"));
        assert_eq!(basename("dir/"), Some("dir"));
        assert_eq!(basename("C:\\temp\\evil.bat"), Some("evil.bat"));
        assert_eq!(basename("///"), None);
        assert_eq!(basename(""), None);
    }
}
