//! Result transformer: raw runner output into [`TestRecord`]s.
//!
//! Maps runner-native fields 1:1, derives step statuses, and normalizes
//! attachment payloads. Missing optional fields become absent values; one
//! test's incomplete data never fails the whole transformation.

use base64::Engine;

use super::raw::{RawAttachment, RawError, RawRun, RawStep, RawTest};
use super::types::{
    Attachment, ErrorInfo, ExecutedStep, Report, Status, StepEntry, TestRecord,
};

/// Transform a raw end-of-run collection into a report.
///
/// The resulting step lists contain executed steps only; reconciliation with
/// planned steps happens afterwards.
pub fn transform_run(raw: RawRun) -> Report {
    Report::new(raw.tests.into_iter().map(transform_test).collect())
}

fn transform_test(raw: RawTest) -> TestRecord {
    let has_error = raw.error.is_some();
    TestRecord {
        title: raw.title,
        source_file: raw.location.and_then(|loc| loc.file),
        status: Status::derive_for_step(raw.status, has_error),
        duration_ms: millis(raw.duration),
        error: transform_error(raw.error),
        steps: raw
            .steps
            .into_iter()
            .map(|step| StepEntry::Executed(transform_step(step)))
            .collect(),
    }
}

fn transform_step(raw: RawStep) -> ExecutedStep {
    let has_error = raw.error.is_some();
    ExecutedStep {
        title: raw.title.unwrap_or_default(),
        status: Status::derive_for_step(raw.status, has_error),
        duration_ms: millis(raw.duration),
        attachments: raw
            .attachments
            .into_iter()
            .map(transform_attachment)
            .collect(),
        error: transform_error(raw.error),
    }
}

fn transform_attachment(raw: RawAttachment) -> Attachment {
    // The raw body is already base64; decode only to learn the payload size.
    let body_size = raw.body.as_deref().and_then(|b| {
        base64::engine::general_purpose::STANDARD
            .decode(b)
            .ok()
            .map(|bytes| bytes.len())
    });
    Attachment {
        name: raw.name.unwrap_or_default(),
        content_type: raw.content_type.unwrap_or_default(),
        path: raw.path,
        body: raw.body,
        body_size,
    }
}

fn transform_error(raw: Option<RawError>) -> Option<ErrorInfo> {
    raw.map(|err| ErrorInfo {
        message: err.message.unwrap_or_default(),
        stack: err.stack,
    })
}

fn millis(duration: Option<f64>) -> u64 {
    duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0)
}
