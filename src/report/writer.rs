//! Report persistence: JSON file writing and screenshot export.

use std::fs;
use std::path::{Path, PathBuf};

use super::types::{Report, ReportResult, StepEntry, TestRecord};

/// Fixed report file name inside the output directory
pub const REPORT_FILENAME: &str = "test-results.json";

/// Serialize the report to `<output_dir>/test-results.json`, pretty-printed,
/// creating the directory if absent. The file is overwritten on each run.
///
/// A write failure is logged and re-thrown; silently losing the report would
/// be worse than failing the reporting phase.
pub fn save_report(report: &Report, output_dir: &Path) -> ReportResult<PathBuf> {
    let result = (|| {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(REPORT_FILENAME);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;
        Ok(path)
    })();

    match result {
        Ok(path) => {
            println!("JSON report saved: {}", path.display());
            Ok(path)
        }
        Err(err) => {
            eprintln!("Error saving JSON report: {}", err);
            Err(err)
        }
    }
}

/// Read a previously written report back from disk.
pub fn load_report(path: &Path) -> ReportResult<Report> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write every PNG attachment with an in-memory body to disk, one directory
/// per test, named `step_<n>_<sanitized-title>[_ERROR].png`. Returns the
/// written paths. Undecodable bodies are skipped with a warning.
pub fn export_screenshots(report: &Report, output_dir: &Path) -> ReportResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    for test in &report.tests {
        let test_dir = output_dir.join(test_dir_name(test));
        let mut created = false;

        for (index, step) in test.steps.iter().enumerate() {
            for attachment in step.attachments() {
                if attachment.content_type != "image/png" {
                    continue;
                }
                let Some(bytes) = attachment.decode_body() else {
                    if attachment.body.is_some() {
                        eprintln!(
                            "Warning: undecodable screenshot body for step \"{}\"",
                            step.title()
                        );
                    }
                    continue;
                };
                if !created {
                    fs::create_dir_all(&test_dir)?;
                    created = true;
                }
                let path = test_dir.join(screenshot_filename(index, step, attachment.name.as_str()));
                fs::write(&path, bytes)?;
                written.push(path);
            }
        }
    }

    Ok(written)
}

/// Directory name for a test's screenshots: `<file-stem>-<sanitized-title>`.
fn test_dir_name(test: &TestRecord) -> String {
    let file_stem = test
        .source_file
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| {
            let name = name.to_string_lossy();
            name.strip_suffix(".spec.ts")
                .map(str::to_string)
                .unwrap_or_else(|| {
                    Path::new(name.as_ref())
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| name.to_string())
                })
        })
        .unwrap_or_else(|| "test".to_string());
    format!("{}-{}", file_stem, sanitize_test_title(&test.title))
}

fn screenshot_filename(index: usize, step: &StepEntry, attachment_name: &str) -> String {
    let error_suffix = if attachment_name.contains("ERROR") {
        "_ERROR"
    } else {
        ""
    };
    format!(
        "step_{}_{}{}.png",
        index + 1,
        sanitize_step_title(step.title()),
        error_suffix
    )
}

/// Lowercase, every non-alphanumeric character replaced by `_`.
pub(crate) fn sanitize_step_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Runs of non-alphanumeric characters collapse to `-`, trimmed at both ends.
fn sanitize_test_title(title: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}
