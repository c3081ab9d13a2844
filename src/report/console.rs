//! Human-readable console rendering of a reconciled report.
//!
//! Output is meant for people, not machine parsing. Binary attachment bodies
//! are never emitted in full; only a bounded base64 preview is printed.

use std::io::{self, Write};

use super::types::{Report, Status, StepEntry};

/// Maximum number of base64 characters shown for an attachment body
pub const BODY_PREVIEW_LEN: usize = 50;

/// Maximum number of stack trace lines shown per error
const STACK_PREVIEW_LINES: usize = 3;

/// Render the report to stdout.
pub fn print_report(report: &Report) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Console output is best-effort; a closed pipe is not a reporting failure.
    let _ = render(report, &mut handle);
}

/// Render the report to any writer.
pub fn render(report: &Report, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n=== Test run details ===")?;

    for (index, test) in report.tests.iter().enumerate() {
        writeln!(out, "\nTest {}: {}", index + 1, test.title)?;
        writeln!(out, "  Status: {}", test.status)?;
        if let Some(error) = &test.error {
            writeln!(out, "  Test error: {}", error.message)?;
        }

        if test.steps.is_empty() {
            writeln!(out, "  Steps: none")?;
            continue;
        }

        let executed = test.steps.iter().filter(|s| s.is_executed()).count();
        writeln!(out, "  Steps ({}/{}):", executed, test.steps.len())?;
        for (step_index, step) in test.steps.iter().enumerate() {
            render_step(out, step_index, step)?;
        }
    }

    writeln!(out, "\n=== Run complete ===")?;
    Ok(())
}

fn render_step(out: &mut impl Write, index: usize, step: &StepEntry) -> io::Result<()> {
    writeln!(out, "    {}. \"{}\"", index + 1, step.title())?;

    let attachments = step.attachments();
    if !attachments.is_empty() {
        writeln!(out, "       actualResult:")?;
        for attachment in attachments {
            let path_suffix = attachment
                .path
                .as_ref()
                .map(|p| format!(" - Path: {}", p.display()))
                .unwrap_or_default();
            writeln!(
                out,
                "         - {} ({}){}",
                attachment.name, attachment.content_type, path_suffix
            )?;
            if let Some(body) = &attachment.body {
                let preview: String = body.chars().take(BODY_PREVIEW_LEN).collect();
                let size = attachment
                    .body_size
                    .map(|s| format!("{} bytes", s))
                    .unwrap_or_else(|| "size unknown".to_string());
                writeln!(out, "           Base64 ({}): {}...", size, preview)?;
            }
        }
    }

    writeln!(out, "       {} {}", status_glyph(step.status()), step.status())?;

    if let Some(error) = step.error() {
        writeln!(out, "       Error: {}", error.message)?;
        if let Some(stack) = &error.stack {
            for line in stack.lines().take(STACK_PREVIEW_LINES) {
                writeln!(out, "         {}", line)?;
            }
        }
    }
    Ok(())
}

fn status_glyph(status: Status) -> &'static str {
    match status {
        Status::Passed => "✓",
        Status::Failed => "✗",
        Status::Skipped => "↷",
        Status::TimedOut => "⏳",
        Status::Interrupted => "✗",
        Status::Unknown => "•",
    }
}
