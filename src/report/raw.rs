//! Raw end-of-run result shapes as handed over by the test runtime.
//!
//! Every field is optional or defaulted so that one test's partially-missing
//! data never fails deserialization of the whole run.

use serde::Deserialize;
use std::path::PathBuf;

use super::types::Status;

/// The runtime's end-of-run collection of executed tests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRun {
    #[serde(default)]
    pub tests: Vec<RawTest>,
}

/// One (test, result) pair from the runtime
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTest {
    #[serde(default)]
    pub title: String,
    pub location: Option<RawLocation>,
    pub status: Option<Status>,
    pub duration: Option<f64>,
    pub error: Option<RawError>,
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

/// Source location metadata for a test declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// One executed step as reported by the runtime
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStep {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub duration: Option<f64>,
    pub error: Option<RawError>,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

/// One attachment as reported by the runtime; the body, when present, is
/// already base64-encoded in the serialized run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttachment {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub path: Option<PathBuf>,
    pub body: Option<String>,
}

/// Error payload as reported by the runtime
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawError {
    pub message: Option<String>,
    pub stack: Option<String>,
}
