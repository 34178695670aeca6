// SPDX-License-Identifier: MIT
//! Decomposition of the provider's raw payload into file entries.
//!
//! The directive asks for a single JSON object `{"files": [{"path",
//! "content"}, ...]}`. Providers routinely wrap JSON in markdown fences
//! anyway, so fences are stripped before decoding. Anything that cannot be
//! decomposed into well-formed, safely-writable entries is a [`ParseError`]
//! — a distinct failure category from the provider call itself.

use serde::{Deserialize, Serialize};

/// One generated file: a relative path and its full contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

#[derive(Deserialize)]
struct FilePayload {
    files: Vec<GeneratedFile>,
}

/// The provider replied, but its output is not a usable set of files.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("provider payload is not the expected JSON shape: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider payload contains no file entries")]
    Empty,
    #[error("unsafe file path in provider payload: {0:?}")]
    UnsafePath(String),
}

/// Strip a surrounding markdown code fence from a provider response, if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(after_fence) = trimmed.strip_prefix("```") {
        // Drop the info string ("json", "text", ...) on the opening fence line.
        let body = match after_fence.find('\n') {
            Some(nl) => &after_fence[nl + 1..],
            None => after_fence,
        };
        return match body.rfind("\n```") {
            Some(end) => &body[..end],
            None => body.strip_suffix("```").unwrap_or(body),
        };
    }
    trimmed
}

/// A path is writable only if it stays strictly inside the project root:
/// relative, forward slashes, and no `.`/`..`/empty components.
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.starts_with('~') {
        return false;
    }
    if path.contains('\\') {
        return false;
    }
    path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Decompose a raw provider payload into validated file entries.
pub fn parse_file_entries(raw: &str) -> Result<Vec<GeneratedFile>, ParseError> {
    let payload: FilePayload = serde_json::from_str(strip_code_fences(raw))?;
    if payload.files.is_empty() {
        return Err(ParseError::Empty);
    }
    for file in &payload.files {
        if !is_safe_relative_path(&file.path) {
            return Err(ParseError::UnsafePath(file.path.clone()));
        }
    }
    Ok(payload.files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_json_payload() {
        let raw = r#"{"files": [{"path": "main.py", "content": "print('hi')\n"}]}"#;
        let files = parse_file_entries(raw).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "main.py");
    }

    #[test]
    fn strips_markdown_fences_with_info_string() {
        let raw = "```json\n{\"files\": [{\"path\": \"a.txt\", \"content\": \"x\"}]}\n```";
        let files = parse_file_entries(raw).unwrap();
        assert_eq!(files[0].path, "a.txt");
    }

    #[test]
    fn leading_prose_is_a_parse_error() {
        let raw = "Sure, here is your project:\n{\"files\": []}";
        assert!(matches!(parse_file_entries(raw), Err(ParseError::Json(_))));
    }

    #[test]
    fn empty_file_list_is_rejected() {
        let raw = r#"{"files": []}"#;
        assert!(matches!(parse_file_entries(raw), Err(ParseError::Empty)));
    }

    #[test]
    fn traversal_and_absolute_paths_are_rejected() {
        for bad in ["../escape.py", "/etc/passwd", "a/../../b", "dir//file", "~/x", r"a\b"] {
            let raw = format!(
                r#"{{"files": [{{"path": {}, "content": "x"}}]}}"#,
                serde_json::to_string(bad).unwrap()
            );
            assert!(
                matches!(parse_file_entries(&raw), Err(ParseError::UnsafePath(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn nested_relative_paths_are_accepted() {
        assert!(is_safe_relative_path("app/routers/api_v1.py"));
        assert!(is_safe_relative_path(".dockerignore"));
        assert!(!is_safe_relative_path(""));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Any path that validates must keep its join inside the base dir.
            #[test]
            fn safe_paths_never_escape(segs in proptest::collection::vec("[a-zA-Z0-9_.-]{1,8}", 1..5)) {
                let path = segs.join("/");
                if is_safe_relative_path(&path) {
                    let joined = std::path::Path::new("base").join(&path);
                    prop_assert!(joined.starts_with("base"));
                    let no_escape = joined.components().all(|c| {
                        !matches!(c, std::path::Component::ParentDir | std::path::Component::RootDir)
                    });
                    prop_assert!(no_escape);
                }
            }

            #[test]
            fn parent_components_always_fail(prefix in "[a-z]{0,6}", suffix in "[a-z]{0,6}") {
                let path = format!("{prefix}/../{suffix}");
                prop_assert!(!is_safe_relative_path(&path));
            }
        }
    }
}
