//! Pretty printer for the native Playwright JSON report
//! (`playwright-report/report.json`).
//!
//! This reads the runner's own report shape (suites -> specs -> tests ->
//! retry results), not the reconciled report this crate writes. The last
//! retry attempt wins. Planned steps parsed from the test sources are
//! appended as unmarked placeholders after the executed steps.

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use zest_report::planner;

/// Print a native Playwright JSON report in a readable form
#[derive(Parser, Debug)]
#[command(name = "print-report")]
struct Args {
    /// Path to the report file (default: <cwd>/playwright-report/report.json)
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeReport {
    #[serde(default)]
    config: NativeConfig,
    #[serde(default)]
    suites: Vec<NativeSuite>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeConfig {
    root_dir: Option<PathBuf>,
    #[serde(default)]
    projects: Vec<NativeProject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeProject {
    test_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeSuite {
    title: Option<String>,
    file: Option<PathBuf>,
    #[serde(default)]
    specs: Vec<NativeSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeSpec {
    title: Option<String>,
    #[serde(default)]
    tests: Vec<NativeTest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeTest {
    project_name: Option<String>,
    expected_status: Option<String>,
    #[serde(default)]
    results: Vec<NativeResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeResult {
    status: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    steps: Vec<NativeStep>,
    #[serde(default)]
    stdout: Vec<serde_json::Value>,
    #[serde(default)]
    errors: Vec<NativeError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeStep {
    title: Option<String>,
    duration: Option<f64>,
    status: Option<String>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeError {
    message: Option<String>,
    value: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let path = args.path.unwrap_or_else(|| {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("playwright-report")
            .join("report.json")
    });

    if !path.exists() {
        eprintln!("Report file not found: {}", path.display());
        eprintln!("Generate one first: npx playwright test --reporter=json");
        return ExitCode::FAILURE;
    }

    let report: NativeReport = match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()))
    {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Could not read or parse the report: {}", path.display());
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    print_header("Playwright Test Report");
    print_suites(&report);
    println!();
    println!("Done.");
    ExitCode::SUCCESS
}

fn print_header(title: &str) {
    let line = "─".repeat(title.len().max(20) + 4);
    println!("{}", line);
    println!("  {}  ", title);
    println!("{}", line);
}

fn print_suites(report: &NativeReport) {
    for suite in &report.suites {
        let suite_title = suite
            .title
            .as_deref()
            .or(suite.file.as_deref().and_then(Path::to_str))
            .unwrap_or("Suite");
        println!();
        println!("› {}", suite_title);

        let source_file = suite_source_file(suite, report);
        let planned_by_title = planner::planned_map(&source_file);

        for spec in &suite.specs {
            let spec_title = spec.title.as_deref().unwrap_or("Spec");
            for test in &spec.tests {
                print_test(spec_title, test, planned_by_title.get(spec_title));
            }
        }
    }
}

/// Resolve the suite's source file: the report's rootDir, else the first
/// project's testDir, else `<cwd>/tests`.
fn suite_source_file(suite: &NativeSuite, report: &NativeReport) -> PathBuf {
    let suite_file = suite.file.clone().unwrap_or_default();
    if suite_file.is_absolute() {
        return suite_file;
    }
    let root = report
        .config
        .root_dir
        .clone()
        .or_else(|| {
            report
                .config
                .projects
                .first()
                .and_then(|p| p.test_dir.clone())
        })
        .unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("tests")
        });
    root.join(suite_file)
}

fn print_test(spec_title: &str, test: &NativeTest, planned: Option<&Vec<String>>) {
    // The last retry attempt is the final verdict.
    let final_result = test.results.last();
    let status = final_result
        .and_then(|r| r.status.as_deref())
        .or(test.expected_status.as_deref())
        .unwrap_or("unknown");
    let duration = final_result.and_then(|r| r.duration);
    let project = test
        .project_name
        .as_deref()
        .map(|p| format!(" [{}]", p))
        .unwrap_or_default();

    println!(
        "  {}  {}{}  {}",
        status_badge(status),
        spec_title,
        project,
        format_duration(duration)
    );

    let mut executed_count = 0;
    if let Some(result) = final_result {
        for step in &result.steps {
            executed_count += 1;
            print_step(step);
        }

        for line in &result.stdout {
            let text = line["text"].as_str().unwrap_or_default().trim_end();
            if !text.is_empty() {
                println!("        {}", text);
            }
        }

        for error in &result.errors {
            print_error(error);
        }
    }

    // Planned but never executed steps, shown without a status.
    if let Some(planned) = planned {
        for title in planned.iter().skip(executed_count) {
            println!("      • {}", title);
        }
    }
}

fn print_step(step: &NativeStep) {
    let title = step.title.as_deref().unwrap_or("step");
    // The native JSON does not always carry a step status: an explicit one
    // wins, an error means failed, anything else counts as passed.
    let status = step
        .status
        .as_deref()
        .or(step.error.as_ref().map(|_| "failed"))
        .unwrap_or("passed");
    println!(
        "      {} {}  {} {}",
        step_glyph(status),
        status,
        title,
        format_duration(step.duration)
    );
}

fn print_error(error: &NativeError) {
    let Some(raw) = error.message.as_deref().or(error.value.as_deref()) else {
        return;
    };
    let message = strip_ansi(raw);

    println!("      ─ error ─");
    let expected = capture_first(&EXPECTED_RE, &message);
    let received = capture_first(&RECEIVED_RE, &message);
    if expected.is_some() || received.is_some() {
        if let Some(expected) = expected {
            println!("      Expected: {}", expected);
        }
        if let Some(received) = received {
            println!("      Received: {}", received);
        }
    } else if let Some(first_line) = message.lines().next() {
        println!("      {}", first_line.trim());
    }
}

static ANSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
static EXPECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Expected[:\s]+([^\n]+)").unwrap());
static RECEIVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Received[:\s]+([^\n]+)").unwrap());

fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").to_string()
}

fn capture_first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn status_badge(status: &str) -> String {
    match status {
        "passed" => "✅ passed".to_string(),
        "failed" => "❌ failed".to_string(),
        "skipped" => "↷ skipped".to_string(),
        "flaky" => "⚠ flaky".to_string(),
        "timedOut" => "⏳ timeout".to_string(),
        other => other.to_string(),
    }
}

fn step_glyph(status: &str) -> &'static str {
    match status {
        "passed" => "✓",
        "failed" => "✗",
        "skipped" => "↷",
        "timedOut" => "⏳",
        _ => "•",
    }
}

fn format_duration(ms: Option<f64>) -> String {
    let Some(ms) = ms else {
        return "-".to_string();
    };
    let total_ms = ms.max(0.0).round() as u64;
    let secs = total_ms / 1000;
    let ms_remain = total_ms % 1000;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}.{:03}s", seconds, ms_remain));
    }
    parts.join(" ")
}
