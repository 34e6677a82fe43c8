//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async code in the bridge MUST NOT block the runtime.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::process`, not `std::fs`,
//! `std::net`, `std::process`.
//!
//! Blocking calls are acceptable in plain functions that run before the
//! runtime matters (config loading) and in test code.

use std::path::Path;

use architectural_enforcement::{scan_production, FnContext, SourceLine};

/// Classify one line; `None` means it is fine
fn blocking_io(_path: &Path, line: &SourceLine) -> Option<&'static str> {
    let code = line.code.as_str();

    // A module-wide import makes blocking calls too easy to reach from async code
    if line.context == FnContext::TopLevel
        && (code.contains("use std::fs") || code.contains("use std::net"))
    {
        return Some("Blocking I/O import");
    }

    if code.contains("std::process::Command") {
        return Some("Blocking process I/O");
    }
    if code.contains("std::net::TcpStream") || code.contains("std::net::UnixStream") {
        return Some("Blocking network I/O");
    }

    if line.context == FnContext::Async {
        if code.contains("std::fs::") {
            return Some("Blocking file I/O in async fn");
        }
        if code.contains("std::io::stdin()") || code.contains("std::io::stdout()") {
            return Some("Blocking stdin/stdout in async fn");
        }
    }

    None
}

/// Test that production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = scan_production(blocking_io);

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nUse tokio::fs, tokio::net and tokio::process inside async code.");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, context: FnContext) -> SourceLine {
        SourceLine {
            number: 1,
            code: code.to_string(),
            context,
        }
    }

    #[test]
    fn test_blocking_read_in_async_fn_is_flagged() {
        let found = blocking_io(
            Path::new("x.rs"),
            &line("let s = std::fs::read_to_string(p)?;", FnContext::Async),
        );
        assert!(found.is_some());
    }

    #[test]
    fn test_blocking_read_in_sync_fn_is_allowed() {
        let found = blocking_io(
            Path::new("x.rs"),
            &line("let s = std::fs::read_to_string(p)?;", FnContext::Sync),
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_imports_and_commands_are_flagged() {
        let path = Path::new("x.rs");
        assert!(blocking_io(path, &line("use std::fs;", FnContext::TopLevel)).is_some());
        assert!(blocking_io(
            path,
            &line("std::process::Command::new(\"pactl\")", FnContext::Sync)
        )
        .is_some());
        assert!(blocking_io(
            path,
            &line("tokio::process::Command::new(\"pactl\")", FnContext::Async)
        )
        .is_none());
    }
}
