//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in production code MUST NOT use blocking I/O.
//! Blocking I/O in plain functions is fine: configuration and log files are
//! opened before the event loop starts.

use architectural_enforcement::{is_in_async_function, rust_files, SourceFile, PRODUCTION_DIRS};

/// Blocking call patterns and what they are
const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("thread::sleep", "Blocking sleep"),
];

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = find_blocking_io_violations();

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking I/O calls found in async code!\n");

        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }

        eprintln!("\n✅ REQUIRED in async fns:");
        eprintln!("  - tokio::fs, tokio::net, tokio::process");
        eprintln!("\n✅ ACCEPTABLE blocking I/O:");
        eprintln!("  - Non-async functions (config loading, log file setup)");
        eprintln!("  - Test code");

        panic!(
            "\nFound {} blocking I/O violation(s) in async code.\nFix these before merging!",
            violations.len()
        );
    }
}

fn find_blocking_io_violations() -> Vec<String> {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for path in rust_files(dir) {
            if let Some(file) = SourceFile::read(&path) {
                check_file(&file, &mut violations);
            }
        }
    }

    violations
}

fn check_file(file: &SourceFile, violations: &mut Vec<String>) {
    let lines = file.line_refs();

    for (idx, code) in file.production_lines() {
        for (pattern, what) in BLOCKING_PATTERNS {
            if code.contains(pattern) && is_in_async_function(&lines, idx) {
                violations.push(file.violation(idx, what));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading_is_allowed() {
        let code = vec![
            "pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SessionConfigFile, ConfigError> {",
            "    let text = std::fs::read_to_string(config_path)?;",
        ];
        assert!(!is_in_async_function(&code, 1));
    }

    #[test]
    fn test_async_file_read_is_flagged() {
        let code = vec![
            "    async fn open_media(&mut self) {",
            "        let text = std::fs::read_to_string(\"device\");",
        ];
        assert!(is_in_async_function(&code, 1));
    }
}
