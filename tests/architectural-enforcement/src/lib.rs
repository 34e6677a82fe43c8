//! Architectural Enforcement Integration Tests
//!
//! Source scanners shared by the tests in `tests/`. They enforce:
//! - No blocking I/O inside async production code
//! - No thread sleeps, and async sleeps only where pacing is the point
//!
//! The scan is line based. Everything from the first `#[cfg(test)]` in a
//! file onward is treated as test code, which matches how every module in
//! the workspace places its tests.

use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of function a line sits in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FnContext {
    /// Outside any function (imports, statics, type definitions)
    TopLevel,
    /// Inside a plain `fn`
    Sync,
    /// Inside an `async fn`
    Async,
}

/// One production line with comments removed
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// 1-based line number
    pub number: usize,
    /// Code with any `//` comment removed
    pub code: String,
    /// Enclosing function kind
    pub context: FnContext,
}

/// A rule broken at a specific place
#[derive(Clone, Debug)]
pub struct Violation {
    /// File containing the line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What was found
    pub kind: &'static str,
    /// The offending code
    pub code: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.kind,
            self.code.trim()
        )
    }
}

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Source directories of shipped code
#[must_use]
pub fn production_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    vec![
        root.join("volbridge").join("core").join("src"),
        root.join("volbridge").join("daemon").join("src"),
    ]
}

/// All `.rs` files below `dir`
#[must_use]
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Function kind declared on this line, if it is a function header
#[must_use]
pub fn fn_header(code: &str) -> Option<FnContext> {
    let mut rest = code.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    for qualifier in ["const ", "unsafe "] {
        if let Some(stripped) = rest.strip_prefix(qualifier) {
            rest = stripped;
        }
    }

    if rest.starts_with("async fn ") {
        Some(FnContext::Async)
    } else if rest.starts_with("fn ") {
        Some(FnContext::Sync)
    } else {
        None
    }
}

fn is_item_boundary(code: &str) -> bool {
    let code = code.trim_start();
    ["impl ", "impl<", "mod ", "pub mod ", "trait ", "pub trait "]
        .iter()
        .any(|p| code.starts_with(p))
}

/// Production lines of a file, each tagged with its enclosing function kind
#[must_use]
pub fn production_lines(content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut context = FnContext::TopLevel;

    for (idx, raw) in content.lines().enumerate() {
        if raw.trim_start().starts_with("#[cfg(test)]") {
            break;
        }

        let code = raw.split("//").next().unwrap_or(raw);
        if let Some(kind) = fn_header(code) {
            context = kind;
        } else if is_item_boundary(code) {
            context = FnContext::TopLevel;
        }

        lines.push(SourceLine {
            number: idx + 1,
            code: code.to_string(),
            context,
        });
    }

    lines
}

/// Run `check` over every production line of every shipped file
///
/// # Panics
///
/// Panics if a production directory is missing, so a moved crate cannot
/// silently turn the scan into a no-op.
pub fn scan_production<F>(mut check: F) -> Vec<Violation>
where
    F: FnMut(&Path, &SourceLine) -> Option<&'static str>,
{
    let mut violations = Vec::new();
    for dir in production_dirs() {
        assert!(dir.is_dir(), "missing source directory {}", dir.display());
        for path in rust_files(&dir) {
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for line in production_lines(&content) {
                if let Some(kind) = check(&path, &line) {
                    violations.push(Violation {
                        path: path.clone(),
                        line: line.number,
                        kind,
                        code: line.code.clone(),
                    });
                }
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_header_detection() {
        assert_eq!(fn_header("fn main() {"), Some(FnContext::Sync));
        assert_eq!(fn_header("    pub fn load() -> X {"), Some(FnContext::Sync));
        assert_eq!(fn_header("pub(crate) async fn stop()"), Some(FnContext::Async));
        assert_eq!(fn_header("    async fn run(&self)"), Some(FnContext::Async));
        assert_eq!(fn_header("    pub const fn new() -> Self"), Some(FnContext::Sync));
        assert_eq!(fn_header("let f = foo();"), None);
    }

    #[test]
    fn test_context_tracking() {
        let code = "use std::path::Path;\n\
                    async fn read() {\n\
                    \x20   let x = 1;\n\
                    }\n\
                    impl Foo {\n\
                    \x20   fn sync() {\n\
                    \x20       let y = 2;\n\
                    \x20   }\n\
                    }\n";
        let lines = production_lines(code);
        assert_eq!(lines[0].context, FnContext::TopLevel);
        assert_eq!(lines[2].context, FnContext::Async);
        assert_eq!(lines[4].context, FnContext::TopLevel);
        assert_eq!(lines[6].context, FnContext::Sync);
    }

    #[test]
    fn test_stops_at_test_module_and_strips_comments() {
        let code = "fn a() { let p = 1; } // std::fs::read\n\
                    #[cfg(test)]\n\
                    mod tests { fn b() { std::fs::read(\"x\"); } }\n";
        let lines = production_lines(code);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].code.contains("std::fs"));
    }
}
