// Core types for the reconciled test report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a test or step.
///
/// Explicit runner-provided statuses map 1:1; steps with no explicit status
/// are classified by [`Status::derive_for_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Interrupted,
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Derive a step status from an optional explicit status and error
    /// presence: an explicit status always wins; no status plus an error
    /// means failed; no status and no error means passed.
    pub fn derive_for_step(explicit: Option<Status>, has_error: bool) -> Status {
        match explicit {
            Some(status) => status,
            None if has_error => Status::Failed,
            None => Status::Passed,
        }
    }

    /// Name used in console output and the JSON report.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::TimedOut => "timedOut",
            Status::Interrupted => "interrupted",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error captured for a failed test or step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Human-readable error message
    pub message: String,

    /// Stack trace, when the runner provided one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }
}

/// A named artifact bound to a step's result (screenshot, log, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment name (e.g., "step-screenshot-go_to_the_site")
    pub name: String,

    /// MIME type (e.g., "image/png")
    pub content_type: String,

    /// On-disk path, when the runner wrote the payload to a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Base64-encoded payload, when captured in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Size of the decoded payload in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<usize>,
}

impl Attachment {
    /// Create an attachment from raw bytes, encoding the body as base64.
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        use base64::Engine;
        Self {
            name: name.into(),
            content_type: content_type.into(),
            path: None,
            body: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            body_size: Some(bytes.len()),
        }
    }

    /// Decode the base64 body back into bytes, if present and valid.
    pub fn decode_body(&self) -> Option<Vec<u8>> {
        use base64::Engine;
        self.body
            .as_deref()
            .and_then(|b| base64::engine::general_purpose::STANDARD.decode(b).ok())
    }
}

/// A step that actually ran, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedStep {
    /// Step title as reported by the runner
    pub title: String,

    /// Derived or explicit status
    pub status: Status,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Attachments captured during the step
    pub attachments: Vec<Attachment>,

    /// Error raised by the step body, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// A planned step that was never reached (e.g., the test aborted earlier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderStep {
    /// Step title as extracted from the test source
    pub title: String,

    /// Always [`Status::Skipped`] for placeholders
    pub status: Status,

    /// Always zero; the step never ran
    pub duration_ms: u64,

    /// Always empty; nothing was captured
    pub attachments: Vec<Attachment>,
}

impl PlaceholderStep {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: Status::Skipped,
            duration_ms: 0,
            attachments: Vec::new(),
        }
    }
}

/// A reconciled step entry: either executed data or a planned placeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepEntry {
    Executed(ExecutedStep),
    Planned(PlaceholderStep),
}

impl StepEntry {
    pub fn title(&self) -> &str {
        match self {
            StepEntry::Executed(step) => &step.title,
            StepEntry::Planned(step) => &step.title,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            StepEntry::Executed(step) => step.status,
            StepEntry::Planned(step) => step.status,
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        match self {
            StepEntry::Executed(step) => &step.attachments,
            StepEntry::Planned(step) => &step.attachments,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            StepEntry::Executed(step) => step.error.as_ref(),
            StepEntry::Planned(_) => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, StepEntry::Executed(_))
    }
}

/// One test execution record (final attempt only when the runner retried)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Test title as declared in the source file
    pub title: String,

    /// Source file the test was declared in, when location metadata exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,

    /// Overall test status
    pub status: Status,

    /// Test duration in milliseconds
    pub duration_ms: u64,

    /// Test-level error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Reconciled step list (executed steps followed by placeholders)
    pub steps: Vec<StepEntry>,
}

/// Root persisted artifact; one per run, overwritten each run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// When this report was generated
    pub generated_at: DateTime<Utc>,

    /// One record per executed test, in completion order
    pub tests: Vec<TestRecord>,
}

impl Report {
    pub fn new(tests: Vec<TestRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            tests,
        }
    }
}

/// Result type for report I/O operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Error types for report reading and writing
#[derive(Debug)]
pub enum ReportError {
    /// I/O error
    Io(std::io::Error),

    /// Serialization error
    Json(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
            ReportError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            ReportError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err)
    }
}
