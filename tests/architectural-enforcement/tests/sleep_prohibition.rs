//! Integration Test: Sleep Prohibition
//!
//! **Policy**: production code waits on I/O, timers or the shutdown signal,
//! never on a bare sleep.
//! **Exceptions**: the pause between icon chunks (the device needs time to
//! drain its receive buffer) and the delay between reconnect attempts.
//! Periodic work uses `tokio::time::interval`.

use std::path::Path;

use architectural_enforcement::{scan_production, SourceLine};

/// Files allowed to call `tokio::time::sleep`
const PACING_FILES: [&str; 2] = ["chunked.rs", "supervisor.rs"];

fn sleep_call(path: &Path, line: &SourceLine) -> Option<&'static str> {
    let code = line.code.as_str();

    if code.contains("thread::sleep") {
        return Some("Thread sleep blocks the runtime");
    }

    let is_pacing_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| PACING_FILES.contains(&n));
    if code.contains("time::sleep(") && !is_pacing_file {
        return Some("Sleep outside pacing code");
    }

    None
}

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan_production(sleep_call);

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nWait on the link, an interval or the shutdown channel instead.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use architectural_enforcement::FnContext;

    fn line(code: &str) -> SourceLine {
        SourceLine {
            number: 1,
            code: code.to_string(),
            context: FnContext::Async,
        }
    }

    #[test]
    fn test_pacing_files_may_sleep() {
        let code = line("tokio::time::sleep(self.settle_delay).await;");
        assert!(sleep_call(Path::new("src/transport/chunked.rs"), &code).is_none());
        assert!(sleep_call(Path::new("src/protocol/controller.rs"), &code).is_some());
    }

    #[test]
    fn test_thread_sleep_is_never_allowed() {
        let code = line("std::thread::sleep(Duration::from_millis(5));");
        assert!(sleep_call(Path::new("src/supervisor.rs"), &code).is_some());
    }
}
