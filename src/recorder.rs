//! Step execution instrumentation.
//!
//! Wraps a named unit of work so that a full-page screenshot is captured and
//! attached after the step body completes or fails. The page belonging to the
//! test is reached through the [`ScreenshotSource`] seam supplied at
//! construction time, and each concurrently running test owns its own
//! [`StepRecorder`]; context is bound to the unit of work rather than held in
//! a shared mutable variable, so parallel tests cannot capture each other's
//! pages.

use std::path::PathBuf;
use std::time::Instant;

use crate::report::types::{Attachment, ErrorInfo, ExecutedStep, Status, StepEntry, TestRecord};

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error types for screenshot capture
#[derive(Debug)]
pub enum CaptureError {
    /// The page could not be captured
    Capture(String),

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Capture(msg) => write!(f, "Capture error: {}", msg),
            CaptureError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Capture(_) => None,
            CaptureError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err)
    }
}

/// Seam to the external browser engine: whatever can produce a full-page
/// PNG of the page belonging to the current test.
pub trait ScreenshotSource {
    fn capture_full_page(&mut self) -> CaptureResult<Vec<u8>>;
}

/// Records one test's executed steps, capturing a screenshot after each.
pub struct StepRecorder<S: ScreenshotSource> {
    source: S,
    steps: Vec<ExecutedStep>,
}

impl<S: ScreenshotSource> StepRecorder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            steps: Vec::new(),
        }
    }

    /// Run a step body, then capture and attach a screenshot regardless of
    /// outcome. The body's own error, if any, propagates unchanged; a
    /// secondary failure during capture is logged and never masks it.
    pub fn step<T, E>(
        &mut self,
        title: &str,
        body: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let result = body();
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                let attachments = self.capture_after_step(title, false);
                self.steps.push(ExecutedStep {
                    title: title.to_string(),
                    status: Status::Passed,
                    duration_ms,
                    attachments,
                    error: None,
                });
            }
            Err(err) => {
                let attachments = self.capture_after_step(title, true);
                self.steps.push(ExecutedStep {
                    title: title.to_string(),
                    status: Status::Failed,
                    duration_ms,
                    attachments,
                    error: Some(ErrorInfo::new(err.to_string())),
                });
            }
        }

        result
    }

    fn capture_after_step(&mut self, title: &str, is_error: bool) -> Vec<Attachment> {
        match self.source.capture_full_page() {
            Ok(bytes) => {
                let sanitized = sanitize_title(title);
                let name = if is_error {
                    format!("step-screenshot-{}-ERROR", sanitized)
                } else {
                    format!("step-screenshot-{}", sanitized)
                };
                vec![Attachment::from_bytes(name, "image/png", &bytes)]
            }
            Err(err) => {
                eprintln!(
                    "Warning: screenshot capture failed for step \"{}\": {}",
                    title, err
                );
                Vec::new()
            }
        }
    }

    /// Steps recorded so far, in execution order.
    pub fn steps(&self) -> &[ExecutedStep] {
        &self.steps
    }

    /// Freeze the accumulated steps into a test record. The test fails if
    /// any step failed; the first step error becomes the test error.
    pub fn finish(self, title: impl Into<String>, source_file: Option<PathBuf>) -> TestRecord {
        let status = if self.steps.iter().any(|s| s.status == Status::Failed) {
            Status::Failed
        } else {
            Status::Passed
        };
        let error = self.steps.iter().find_map(|s| s.error.clone());
        let duration_ms = self.steps.iter().map(|s| s.duration_ms).sum();
        TestRecord {
            title: title.into(),
            source_file,
            status,
            duration_ms,
            error,
            steps: self.steps.into_iter().map(StepEntry::Executed).collect(),
        }
    }
}

/// Lowercase, every non-alphanumeric character replaced by `_`.
fn sanitize_title(title: &str) -> String {
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
