//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep to wait for work.
//! **Exceptions**: deferred delivery timers (reply delay, simulated device
//! latency), frame rate limiting in the TUI event loop, test code.
//!
//! `std::thread::sleep` is never acceptable: it stalls a runtime worker.

use architectural_enforcement::{context_mentions, rust_files, SourceFile, PRODUCTION_DIRS};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_sleep_violations();

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }

        eprintln!("\n✅ ACCEPTABLE sleep uses:");
        eprintln!("  - tokio::time::sleep for a configured delay or latency inside a spawned task");
        eprintln!("  - Frame rate limiting in tui/src/app.rs");
        eprintln!("  - Test code (#[cfg(test)] modules, tests/ directories)");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - std::thread::sleep anywhere");
        eprintln!("  - Sleep in polling loops or as poor man's synchronization");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all sleep() calls in production code
fn find_sleep_violations() -> Vec<String> {
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
        if code.contains("thread::sleep") {
            violations.push(file.violation(idx, "Blocking thread sleep"));
            continue;
        }

        if !(code.contains("::sleep(") || code.contains(".sleep(")) {
            continue;
        }

        if is_frame_limiting_context(file, &lines, idx) || is_deferred_delivery(&lines, idx) {
            continue;
        }

        violations.push(file.violation(idx, "Sleep"));
    }
}

/// Frame pacing in the TUI event loop
fn is_frame_limiting_context(file: &SourceFile, lines: &[&str], idx: usize) -> bool {
    file.path.ends_with("tui/src/app.rs")
        && context_mentions(lines, idx, 10, 5, &["frame", "fps", "tick"])
}

/// A timer that delays delivery by a configured amount
fn is_deferred_delivery(lines: &[&str], idx: usize) -> bool {
    context_mentions(lines, idx, 5, 0, &["delay", "latency"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_timer_is_deferred_delivery() {
        let code = vec![
            "        let delay = self.config.reply_delay;",
            "        let handle = tokio::spawn(async move {",
            "            tokio::time::sleep(delay).await;",
        ];
        assert!(is_deferred_delivery(&code, 2));
    }

    #[test]
    fn test_polling_sleep_is_not_deferred_delivery() {
        let code = vec![
            "    loop {",
            "        if ready() { break; }",
            "        tokio::time::sleep(Duration::from_millis(10)).await;",
        ];
        assert!(!is_deferred_delivery(&code, 2));
    }
}
