//! Integration Test: Core Isolation
//!
//! **Policy**: `live-session-core` is headless. It MUST NOT depend on or
//! reference any terminal/UI crate; surfaces talk to it only through
//! `HostEvent` and `HostMessage`.

use architectural_enforcement::{rust_files, workspace_root, SourceFile};

const UI_CRATES: &[&str] = &["ratatui", "crossterm", "unicode-width", "textwrap"];

#[test]
fn test_core_sources_have_no_ui_imports() {
    let mut violations = Vec::new();

    for path in rust_files("session/core/src") {
        let Some(file) = SourceFile::read(&path) else {
            continue;
        };
        for (idx, code) in file.production_lines() {
            for name in UI_CRATES {
                let ident = name.replace('-', "_");
                if code.contains(&format!("{ident}::")) {
                    violations.push(file.violation(idx, "UI crate in core"));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Core must stay UI-free:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = std::fs::read_to_string(workspace_root().join("session/core/Cargo.toml"))
        .expect("core manifest readable");

    for name in UI_CRATES {
        assert!(
            !manifest.lines().any(|l| l.trim_start().starts_with(name)),
            "session/core/Cargo.toml must not depend on {name}"
        );
    }
}
