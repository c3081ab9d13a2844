//! Static step planner.
//!
//! Scans a test source file's text and extracts, per declared test title, the
//! ordered list of step titles the author intended to run. This is a lexical
//! scan, not a parser: it walks the file line by line with two literal
//! patterns and keeps a "current test title" as state.
//!
//! Known blind spots, kept as documented behavior:
//! - no nested-scope awareness and no brace matching
//! - a title split across lines is not recognized
//! - a title containing its own delimiting quote is not recognized
//! - steps declared outside a recognized test body are dropped
//! - two tests sharing a title fold their steps into one entry (the table is
//!   keyed by title, not by declaration instance)
//!
//! An unreadable file yields an empty plan; callers must treat that as "no
//! planning information available", not as "the test has zero steps".

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Planned steps per test title, in declaration order
pub type PlanTable = HashMap<String, Vec<String>>;

/// Matches a test declaration with a quoted title: `test("title", ...`.
/// The `.only` / `.skip` / `.fixme` modifiers are recognized as well.
static TEST_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\btest(?:\.(?:only|skip|fixme))?\s*\(\s*(?:"([^"]+)"|'([^']+)'|`([^`]+)`)\s*,"#,
    )
    .unwrap()
});

/// Matches a step declaration with a quoted title: `test.step("title", ...`.
static STEP_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\btest\.step\s*\(\s*(?:"([^"]+)"|'([^']+)'|`([^`]+)`)\s*,"#).unwrap()
});

/// Plan tables cached per absolute file path for the process lifetime.
/// Never invalidated mid-run; source files are assumed immutable during a run.
static PLAN_CACHE: Lazy<Mutex<HashMap<PathBuf, PlanTable>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Return the planned step titles for one test in the given source file.
///
/// An empty result means either the test declares no steps or no planning
/// information could be extracted at all.
pub fn planned_steps(file: &Path, test_title: &str) -> Vec<String> {
    planned_map(file)
        .get(test_title)
        .cloned()
        .unwrap_or_default()
}

/// Return the whole title-to-steps table for the given source file.
pub fn planned_map(file: &Path) -> PlanTable {
    let path = absolute(file);
    let mut cache = match PLAN_CACHE.lock() {
        Ok(guard) => guard,
        // A panic while holding the lock only loses the cache, not the data.
        Err(poisoned) => poisoned.into_inner(),
    };
    cache
        .entry(path.clone())
        .or_insert_with(|| scan_file(&path))
        .clone()
}

/// Resolve a possibly-relative path against the current working directory.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Read and scan a file, degrading to an empty table on any read failure.
fn scan_file(path: &Path) -> PlanTable {
    match fs::read_to_string(path) {
        Ok(source) => scan_source(&source),
        Err(_) => PlanTable::new(),
    }
}

/// Single linear pass over the source text.
pub fn scan_source(source: &str) -> PlanTable {
    let mut table = PlanTable::new();
    let mut current_test: Option<String> = None;

    for line in source.lines() {
        if let Some(caps) = TEST_DECL.captures(line) {
            let title = captured_title(&caps);
            table.entry(title.clone()).or_default();
            current_test = Some(title);
            continue;
        }
        if let Some(caps) = STEP_DECL.captures(line) {
            if let Some(test_title) = &current_test {
                let step_title = captured_title(&caps);
                table
                    .entry(test_title.clone())
                    .or_default()
                    .push(step_title);
            }
        }
    }

    table
}

/// Pull the title out of whichever quote-kind alternative matched.
fn captured_title(caps: &regex::Captures<'_>) -> String {
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
