//! Zest Report - step-level reporting for Playwright test runs.
//!
//! This crate provides:
//! - Static extraction of planned step titles from test source files
//! - Step instrumentation that attaches a screenshot after every step
//! - Transformation of raw runner results into a serializable report
//! - Reconciliation of planned vs. executed steps (placeholders for steps
//!   never reached)
//! - JSON report writing, console rendering, and screenshot export
//! - Optional sync of per-test results to a Zephyr test cycle
//!
//! # Example
//!
//! ```rust,no_run
//! use zest_report::report::{self, raw::RawRun};
//! use std::path::Path;
//!
//! let data = std::fs::read_to_string("raw-results.json").unwrap();
//! let run: RawRun = serde_json::from_str(&data).unwrap();
//! let mut rep = report::transform_run(run);
//! report::reconcile_report(&mut rep);
//! report::save_report(&rep, Path::new("test-results")).unwrap();
//! ```

pub mod config;
pub mod planner;
pub mod recorder;
pub mod report;
pub mod zephyr;

// Re-export planner entry points
pub use planner::{planned_map, planned_steps};

// Re-export recorder types
pub use recorder::{CaptureError, CaptureResult, ScreenshotSource, StepRecorder};

// Re-export report types and pipeline stages
pub use report::{
    export_screenshots, load_report, print_report, reconcile_report, save_report, transform_run,
    Attachment, ErrorInfo, ExecutedStep, PlaceholderStep, Report, ReportError, ReportResult,
    Status, StepEntry, TestRecord, REPORT_FILENAME,
};

// Re-export Zephyr client
pub use zephyr::{CurlTransport, ZephyrClient, ZephyrError, ZephyrResult, ZephyrTransport};
