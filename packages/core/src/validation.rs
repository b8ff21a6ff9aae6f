// ABOUTME: Containment validator keeping file paths inside the project root
// ABOUTME: Pure normalization of relative paths with rejection of traversal and absolute forms

use crate::constants::{DEFAULT_PROJECT_ROOT, MAX_PATH_LENGTH};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainmentError {
    #[error("Path is empty")]
    Empty,
    #[error("Path exceeds the maximum length of 1000 characters")]
    TooLong,
    #[error("Path contains control characters")]
    ControlCharacter,
    #[error("Path traversal attempt detected")]
    Traversal,
    #[error("Home directory expansion is not allowed")]
    HomeExpansion,
    #[error("Absolute path outside the project root")]
    Absolute,
    #[error("Path does not name anything below the project root")]
    RootOnly,
}

/// Validate `path` against the default project root.
///
/// Returns the normalized root-relative path, or `None` when the path could
/// escape the root.
pub fn validate_path(path: &str) -> Option<String> {
    validate_path_with_root(path, DEFAULT_PROJECT_ROOT)
}

/// Validate `path`, treating `root` as a known alias prefix that is stripped.
pub fn validate_path_with_root(path: &str, root: &str) -> Option<String> {
    check_path(path, root).ok()
}

/// Same as [`validate_path_with_root`] but reports why a path was rejected.
pub fn check_path(path: &str, root: &str) -> Result<String, ContainmentError> {
    if path.is_empty() {
        return Err(ContainmentError::Empty);
    }

    if path.chars().count() > MAX_PATH_LENGTH {
        return Err(ContainmentError::TooLong);
    }

    if path.chars().any(is_control) {
        return Err(ContainmentError::ControlCharacter);
    }

    // Backslashes are treated as separators so Windows-style traversal is caught too
    let unified = path.replace('\\', "/");

    if has_drive_prefix(&unified) {
        return Err(ContainmentError::Absolute);
    }

    let relative = match strip_root(&unified, root) {
        Some(rest) => rest.trim_start_matches('/'),
        None if unified.starts_with('/') => return Err(ContainmentError::Absolute),
        None => unified.as_str(),
    };

    let mut segments = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(ContainmentError::Traversal),
            s if s.starts_with('~') => return Err(ContainmentError::HomeExpansion),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(ContainmentError::RootOnly);
    }

    Ok(segments.join("/"))
}

fn is_control(c: char) -> bool {
    matches!(c as u32, 0x00..=0x1F | 0x7F..=0x9F)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Strip the root alias when `path` is the root itself or lives below it
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return None;
    }

    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        // "/home/projector" is not below "/home/project"
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("src/App.tsx", "src/App.tsx")]
    #[case("src//App.tsx", "src/App.tsx")]
    #[case("src///components//Button.tsx", "src/components/Button.tsx")]
    #[case("src/components/", "src/components")]
    #[case("./package.json", "package.json")]
    #[case("src/./lib/index.ts", "src/lib/index.ts")]
    #[case("/home/project/src/App.tsx", "src/App.tsx")]
    #[case("/home/project//index.html", "index.html")]
    #[case("home/project/readme.md", "home/project/readme.md")]
    #[case("notes~/draft.md", "notes~/draft.md")]
    #[case("file..name.txt", "file..name.txt")]
    #[case("unicode/ñandú.txt", "unicode/ñandú.txt")]
    fn test_accepts_and_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate_path(input), Some(expected.to_string()));
    }

    #[rstest]
    #[case("")]
    #[case("../etc/passwd")]
    #[case("a/b/../../x")]
    #[case("src/..")]
    #[case("/abs/path")]
    #[case("/etc/passwd")]
    #[case("/home/projector/secret")]
    #[case("/home/project/../etc/passwd")]
    #[case("~/.ssh/id_rsa")]
    #[case("src/~/x")]
    #[case("~root/.bashrc")]
    #[case("C:\\Windows\\system32")]
    #[case("..\\..\\secret")]
    #[case("src\\..\\..\\secret")]
    #[case("/")]
    #[case("/home/project")]
    #[case("/home/project/")]
    #[case("//")]
    #[case(".")]
    fn test_rejects(#[case] input: &str) {
        assert_eq!(validate_path(input), None, "expected {:?} to be rejected", input);
    }

    #[rstest]
    #[case("bad\0name")]
    #[case("line\nbreak")]
    #[case("tab\there")]
    #[case("escape\u{1b}[31m")]
    #[case("delete\u{7f}")]
    #[case("c1\u{85}control")]
    #[case("c1\u{9f}control")]
    fn test_rejects_control_characters(#[case] input: &str) {
        assert_eq!(
            check_path(input, DEFAULT_PROJECT_ROOT),
            Err(ContainmentError::ControlCharacter)
        );
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(MAX_PATH_LENGTH);
        assert_eq!(validate_path(&at_limit), Some(at_limit.clone()));

        let over_limit = "a".repeat(MAX_PATH_LENGTH + 1);
        assert_eq!(validate_path(&over_limit), None);
        assert_eq!(
            check_path(&over_limit, DEFAULT_PROJECT_ROOT),
            Err(ContainmentError::TooLong)
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let multibyte = "é".repeat(MAX_PATH_LENGTH);
        assert!(multibyte.len() > MAX_PATH_LENGTH);
        assert_eq!(validate_path(&multibyte), Some(multibyte.clone()));
    }

    #[test]
    fn test_rejection_reasons() {
        let root = DEFAULT_PROJECT_ROOT;
        assert_eq!(check_path("", root), Err(ContainmentError::Empty));
        assert_eq!(check_path("a/../b", root), Err(ContainmentError::Traversal));
        assert_eq!(check_path("~/x", root), Err(ContainmentError::HomeExpansion));
        assert_eq!(check_path("/tmp/x", root), Err(ContainmentError::Absolute));
        assert_eq!(check_path("D:/x", root), Err(ContainmentError::Absolute));
        assert_eq!(check_path("/home/project", root), Err(ContainmentError::RootOnly));
    }

    #[test]
    fn test_custom_root_alias() {
        assert_eq!(
            validate_path_with_root("/workspace/app/src/main.rs", "/workspace/app/"),
            Some("src/main.rs".to_string())
        );
        assert_eq!(
            validate_path_with_root("/home/project/src/main.rs", "/workspace/app"),
            None
        );
    }

    #[test]
    fn test_empty_root_alias_rejects_all_absolute_paths() {
        assert_eq!(validate_path_with_root("/src/main.rs", ""), None);
        assert_eq!(
            validate_path_with_root("src/main.rs", ""),
            Some("src/main.rs".to_string())
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        for input in ["src//App.tsx", "/home/project/a/b/", "./x/./y"] {
            let once = validate_path(input).unwrap();
            assert_eq!(validate_path(&once), Some(once.clone()));
        }
    }
}
