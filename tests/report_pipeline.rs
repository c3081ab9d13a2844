//! End-to-end pipeline test: raw runner output through transformation,
//! reconciliation against the test source, persistence, and reload.

use std::io::Write;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use zest_report::report::raw::RawRun;
use zest_report::report::{
    load_report, reconcile_report, save_report, transform_run, Status, StepEntry,
    REPORT_FILENAME,
};
use zest_report::{ZephyrClient, ZephyrResult, ZephyrTransport};

const SPEC_SOURCE: &str = "\
import { test, expect } from '../fixtures/fixtures'

test('Check the title', async ({ page }) => {

  await test.step('Go to the playwright website', async () => {
    await page.goto('https://playwright.dev/');
  });

  await test.step('Check the title', async () => {
    await expect(page).toHaveTitle(/Playwright/);
  });
});
";

fn write_spec_source() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SPEC_SOURCE.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn raw_run(source_file: &std::path::Path) -> RawRun {
    serde_json::from_value(serde_json::json!({
        "tests": [{
            "title": "Check the title",
            "location": { "file": source_file, "line": 3, "column": 1 },
            "status": "failed",
            "duration": 5120.4,
            "error": {
                "message": "page.goto: net::ERR_NAME_NOT_RESOLVED",
                "stack": "Error: page.goto\n    at spec.ts:6:16"
            },
            "steps": [
                { "title": "Before Hooks", "duration": 30.0 },
                {
                    "title": "Go to the playwright website",
                    "duration": 5000.0,
                    "error": { "message": "page.goto: net::ERR_NAME_NOT_RESOLVED" },
                    "attachments": [{
                        "name": "step-screenshot-go_to_the_playwright_website-ERROR",
                        "contentType": "image/png",
                        "body": "iVBORw0KGgo="
                    }]
                },
                { "title": "After Hooks", "duration": 10.0 }
            ]
        }]
    }))
    .unwrap()
}

#[test]
fn test_failed_run_gains_placeholder_for_unreached_step() {
    let source = write_spec_source();

    let mut report = transform_run(raw_run(source.path()));
    reconcile_report(&mut report);

    assert_eq!(report.tests.len(), 1);
    let test = &report.tests[0];
    assert_eq!(test.status, Status::Failed);
    assert_eq!(test.duration_ms, 5120);

    // Hooks are gone; the executed failure keeps its place and the never
    // reached second step shows up as a skipped placeholder.
    assert_eq!(test.steps.len(), 2);

    let StepEntry::Executed(first) = &test.steps[0] else {
        panic!("expected the first step to be executed");
    };
    assert_eq!(first.title, "Go to the playwright website");
    assert_eq!(first.status, Status::Failed);
    assert_eq!(first.attachments.len(), 1);
    assert!(first.error.is_some());

    let StepEntry::Planned(second) = &test.steps[1] else {
        panic!("expected the second step to be a placeholder");
    };
    assert_eq!(second.title, "Check the title");
    assert_eq!(second.status, Status::Skipped);
    assert!(second.attachments.is_empty());
}

#[test]
fn test_report_survives_disk_roundtrip() {
    let source = write_spec_source();
    let out_dir = tempfile::tempdir().unwrap();

    let mut report = transform_run(raw_run(source.path()));
    reconcile_report(&mut report);

    let path = save_report(&report, out_dir.path()).unwrap();
    assert_eq!(path, out_dir.path().join(REPORT_FILENAME));

    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded.tests.len(), 1);
    let test = &loaded.tests[0];
    assert_eq!(test.title, "Check the title");
    assert_eq!(test.steps.len(), 2);
    assert!(test.steps[0].is_executed());
    assert!(!test.steps[1].is_executed());
    assert_eq!(test.steps[1].status(), Status::Skipped);
    assert_eq!(
        test.steps[0].attachments()[0].decode_body().unwrap(),
        b"\x89PNG\r\n\x1a\n"
    );
}

type PutLog = std::rc::Rc<std::cell::RefCell<Vec<(String, serde_json::Value)>>>;

/// Transport that answers the lookup calls and records every update.
struct RecordingTransport {
    puts: PutLog,
}

impl ZephyrTransport for RecordingTransport {
    fn get(&self, url: &str) -> ZephyrResult<serde_json::Value> {
        if url.contains("testcases/") {
            Ok(serde_json::json!({ "id": 11 }))
        } else {
            Ok(serde_json::json!({
                "values": [{ "key": "EX-3", "testCase": { "id": 11 } }]
            }))
        }
    }

    fn put(&self, url: &str, body: &serde_json::Value) -> ZephyrResult<serde_json::Value> {
        self.puts.borrow_mut().push((url.to_string(), body.clone()));
        Ok(serde_json::Value::Null)
    }
}

#[test]
fn test_sync_runs_from_the_persisted_report() {
    let source = write_spec_source();
    let out_dir = tempfile::tempdir().unwrap();

    let mut report = transform_run(raw_run(source.path()));
    reconcile_report(&mut report);
    // Case-key style title, as the sync phase expects.
    report.tests[0].title = "TC-001: Check the title".to_string();
    let path = save_report(&report, out_dir.path()).unwrap();

    // The sync phase consumes what is on disk, not the in-memory value.
    let saved = load_report(&path).unwrap();
    let put_log: PutLog = Default::default();
    let client = ZephyrClient::new(
        "https://zephyr.example/v2",
        "CYCLE-1",
        RecordingTransport {
            puts: put_log.clone(),
        },
    )
    .pause(std::time::Duration::ZERO);

    assert_eq!(client.sync_report(&saved), 1);

    let puts = put_log.borrow();
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].0,
        "https://zephyr.example/v2/testexecutions/EX-3/teststeps"
    );
    let steps = puts[0].1["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["statusName"], "Fail");
    assert_eq!(steps[1]["statusName"], "Not Executed");
}

#[test]
fn test_passing_run_needs_no_placeholders() {
    let source = write_spec_source();

    let raw: RawRun = serde_json::from_value(serde_json::json!({
        "tests": [{
            "title": "Check the title",
            "location": { "file": source.path() },
            "status": "passed",
            "duration": 900.0,
            "steps": [
                { "title": "Go to the playwright website", "duration": 600.0 },
                { "title": "Check the title", "duration": 300.0 }
            ]
        }]
    }))
    .unwrap();

    let mut report = transform_run(raw);
    reconcile_report(&mut report);

    let test = &report.tests[0];
    assert_eq!(test.status, Status::Passed);
    assert_eq!(test.steps.len(), 2);
    assert!(test.steps.iter().all(StepEntry::is_executed));
}

#[test]
fn test_run_without_location_keeps_executed_steps() {
    let raw: RawRun = serde_json::from_value(serde_json::json!({
        "tests": [{
            "title": "No source available",
            "status": "passed",
            "steps": [{ "title": "only step", "duration": 5.0 }]
        }]
    }))
    .unwrap();

    let mut report = transform_run(raw);
    reconcile_report(&mut report);

    let test = &report.tests[0];
    assert_eq!(test.source_file, None::<PathBuf>);
    assert_eq!(test.steps.len(), 1);
    assert!(test.steps[0].is_executed());
}
