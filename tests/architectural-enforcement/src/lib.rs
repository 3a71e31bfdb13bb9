//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The session core stays free of terminal/UI crates
//! - No sleep() calls in production code outside timers and frame pacing
//! - No blocking I/O inside async functions
//!
//! The helpers below are shared by the tests under `tests/`. They work on
//! source text only, so a violation is caught without building anything.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["session/core/src", "tui/src"];

/// Workspace root (two levels above this package)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// A source file split into lines
pub struct SourceFile {
    /// Where it was read from
    pub path: PathBuf,
    /// Raw lines
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Read a file; unreadable files yield `None`
    pub fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(str::to_string).collect(),
        })
    }

    /// Lines as `&str` (for the context helpers)
    pub fn line_refs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// `(index, code)` for every production line, comments stripped.
    ///
    /// Everything from the first `#[cfg(test)]` onwards counts as test code.
    pub fn production_lines(&self) -> Vec<(usize, &str)> {
        let test_start = self
            .lines
            .iter()
            .position(|l| l.trim_start().starts_with("#[cfg(test)]"))
            .unwrap_or(self.lines.len());

        self.lines[..test_start]
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx, code_part(line)))
            .filter(|(_, code)| !code.trim().is_empty())
            .collect()
    }

    /// Format a violation at `idx`
    pub fn violation(&self, idx: usize, what: &str) -> String {
        format!(
            "{}:{} - {}: {}",
            self.path.display(),
            idx + 1,
            what,
            self.lines[idx].trim()
        )
    }
}

/// Code before any `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Signature line of the function enclosing `current_idx`, if any
pub fn enclosing_fn<'a>(lines: &[&'a str], current_idx: usize) -> Option<&'a str> {
    for i in (0..=current_idx).rev() {
        let line = code_part(lines[i]).trim();

        if is_fn_signature(line) {
            return Some(line);
        }

        // Stop at module/impl boundaries
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return None;
        }
    }
    None
}

fn is_fn_signature(line: &str) -> bool {
    line.starts_with("fn ")
        || line.contains(" fn ")
        || line.starts_with("async fn ")
}

/// Check if line is inside an async function
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_fn(lines, current_idx).is_some_and(|sig| sig.contains("async fn "))
}

/// Check if any line within `before`/`after` lines of `idx` mentions a keyword
pub fn context_mentions(
    lines: &[&str],
    idx: usize,
    before: usize,
    after: usize,
    keywords: &[&str],
) -> bool {
    let end = std::cmp::min(idx + after + 1, lines.len());
    lines[idx.saturating_sub(before)..end].iter().any(|line| {
        let line = line.to_lowercase();
        keywords.iter().any(|k| line.contains(k))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "    pub async fn poll(&mut self) -> bool {",
            "        let text = std::fs::read_to_string(\"x\");",
            "    }",
        ];
        assert!(is_in_async_function(&code, 1));
    }

    #[test]
    fn test_sync_function_detection() {
        let code = vec![
            "pub fn load_config_from_path(path: Option<PathBuf>) -> Result<(), ConfigError> {",
            "    let text = std::fs::read_to_string(path);",
            "}",
        ];
        assert!(!is_in_async_function(&code, 1));
        assert!(enclosing_fn(&code, 1).is_some());
    }

    #[test]
    fn test_comments_are_stripped() {
        assert_eq!(code_part("let x = 1; // std::thread::sleep"), "let x = 1; ");
    }

    #[test]
    fn test_test_module_is_not_production() {
        let file = SourceFile {
            path: PathBuf::from("x.rs"),
            lines: vec![
                "fn real() {}".to_string(),
                "#[cfg(test)]".to_string(),
                "mod tests {".to_string(),
                "    fn helper() { std::thread::sleep(d); }".to_string(),
                "}".to_string(),
            ],
        };
        let lines = file.production_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, 0);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
