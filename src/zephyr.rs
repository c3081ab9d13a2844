//! Zephyr Scale sync client.
//!
//! Pushes per-test step results to a Zephyr test cycle using the fixed call
//! sequence: case key -> case id -> execution key -> step update. The sync
//! loop is strictly sequential with a pause after each update to respect the
//! service's rate limits; one test's failure never aborts the remaining
//! tests.
//!
//! # Configuration
//!
//! Credentials come from environment variables:
//! - `ZEPHYR_API_URL`: API base URL
//! - `ZEPHYR_API_KEY`: bearer token
//! - `ZEPHYR_TEST_CYCLE_KEY`: test cycle whose executions are updated
//! - `ZEST_SYNC_PAUSE_SECS`: pause after each update (seconds)

use serde_json::json;
use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::config;
use crate::report::types::{Report, Status, StepEntry, TestRecord};
use crate::report::writer::sanitize_step_title;

/// Upper bound on the execution listing scanned for a matching case id
const MAX_EXECUTION_RESULTS: u32 = 1000;

/// Result type for Zephyr operations
pub type ZephyrResult<T> = Result<T, ZephyrError>;

/// Errors that can occur during Zephyr sync
#[derive(Debug)]
pub enum ZephyrError {
    /// A required configuration value is missing
    MissingConfig(&'static str),
    /// The HTTP call itself failed
    Http(String),
    /// The service answered with an unexpected shape
    InvalidResponse(String),
    /// No execution in the cycle matches the test case
    ExecutionNotFound(i64),
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for ZephyrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZephyrError::MissingConfig(name) => write!(f, "Missing configuration: {}", name),
            ZephyrError::Http(msg) => write!(f, "HTTP error: {}", msg),
            ZephyrError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ZephyrError::ExecutionNotFound(id) => {
                write!(f, "No execution found for test case id {}", id)
            }
            ZephyrError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ZephyrError {}

impl From<std::io::Error> for ZephyrError {
    fn from(err: std::io::Error) -> Self {
        ZephyrError::Io(err)
    }
}

/// Seam to the remote service: a structured request/response exchange.
/// The production implementation shells out to curl; tests supply a fake.
pub trait ZephyrTransport {
    fn get(&self, url: &str) -> ZephyrResult<serde_json::Value>;
    fn put(&self, url: &str, body: &serde_json::Value) -> ZephyrResult<serde_json::Value>;
}

/// curl-based transport with bearer authentication
pub struct CurlTransport {
    api_key: String,
    connect_timeout: u64,
}

impl CurlTransport {
    pub fn new(api_key: impl Into<String>, connect_timeout: u64) -> Self {
        Self {
            api_key: api_key.into(),
            connect_timeout,
        }
    }

    fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> ZephyrResult<serde_json::Value> {
        let auth = format!("Authorization: Bearer {}", self.api_key);
        let timeout = self.connect_timeout.to_string();
        let mut args = vec![
            "-s",
            "-X",
            method,
            url,
            "-H",
            "Content-Type: application/json",
            "-H",
            &auth,
            "--connect-timeout",
            &timeout,
        ];

        let body_json = match body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| ZephyrError::InvalidResponse(e.to_string()))?,
            None => String::new(),
        };
        if body.is_some() {
            args.push("-d");
            args.push(&body_json);
        }

        let output = Command::new("curl").args(&args).output()?;
        if !output.status.success() {
            return Err(ZephyrError::Http(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        if output.stdout.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| ZephyrError::InvalidResponse(e.to_string()))
    }
}

impl ZephyrTransport for CurlTransport {
    fn get(&self, url: &str) -> ZephyrResult<serde_json::Value> {
        self.request("GET", url, None)
    }

    fn put(&self, url: &str, body: &serde_json::Value) -> ZephyrResult<serde_json::Value> {
        self.request("PUT", url, Some(body))
    }
}

/// Client for one test cycle's executions
pub struct ZephyrClient<T: ZephyrTransport> {
    base_url: String,
    test_cycle_key: String,
    pause: Duration,
    transport: T,
}

impl ZephyrClient<CurlTransport> {
    /// Build a client from the environment-backed settings.
    pub fn from_settings(settings: &config::ZephyrSettings) -> ZephyrResult<Self> {
        if settings.api_url.is_empty() {
            return Err(ZephyrError::MissingConfig(config::ENV_ZEPHYR_API_URL));
        }
        if settings.api_key.is_empty() {
            return Err(ZephyrError::MissingConfig(config::ENV_ZEPHYR_API_KEY));
        }
        if settings.test_cycle_key.is_empty() {
            return Err(ZephyrError::MissingConfig(config::ENV_ZEPHYR_CYCLE_KEY));
        }
        Ok(ZephyrClient::new(
            &settings.api_url,
            &settings.test_cycle_key,
            CurlTransport::new(&settings.api_key, settings.connect_timeout_secs),
        )
        .pause(Duration::from_secs(settings.sync_pause_secs)))
    }
}

impl<T: ZephyrTransport> ZephyrClient<T> {
    pub fn new(
        base_url: impl Into<String>,
        test_cycle_key: impl Into<String>,
        transport: T,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            test_cycle_key: test_cycle_key.into(),
            pause: Duration::from_secs(config::DEFAULT_SYNC_PAUSE_SECS),
            transport,
        }
    }

    /// Set the pause taken after each execution update.
    pub fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Resolve a case key (e.g., "TC-001") to the service's numeric case id.
    pub fn test_case_id(&self, case_key: &str) -> ZephyrResult<i64> {
        let value = self.transport.get(&self.url(&format!("testcases/{}", case_key)))?;
        value["id"].as_i64().ok_or_else(|| {
            ZephyrError::InvalidResponse(format!("no id in response for test case {}", case_key))
        })
    }

    /// Scan the cycle's execution listing for the one matching the case id.
    pub fn execution_key(&self, case_id: i64) -> ZephyrResult<String> {
        let url = self.url(&format!(
            "testexecutions?testCycle={}&maxResults={}",
            self.test_cycle_key, MAX_EXECUTION_RESULTS
        ));
        let value = self.transport.get(&url)?;
        value["values"]
            .as_array()
            .and_then(|executions| {
                executions
                    .iter()
                    .find(|execution| execution["testCase"]["id"].as_i64() == Some(case_id))
            })
            .and_then(|execution| execution["key"].as_str())
            .map(str::to_string)
            .ok_or(ZephyrError::ExecutionNotFound(case_id))
    }

    /// Push a step list as the status update for one execution.
    pub fn update_steps(
        &self,
        execution_key: &str,
        steps: &[serde_json::Value],
    ) -> ZephyrResult<()> {
        let url = self.url(&format!("testexecutions/{}/teststeps", execution_key));
        self.transport.put(&url, &json!({ "steps": steps }))?;
        Ok(())
    }

    fn sync_test(&self, case_key: &str, test: &TestRecord) -> ZephyrResult<()> {
        let case_id = self.test_case_id(case_key)?;
        let execution_key = self.execution_key(case_id)?;
        self.update_steps(&execution_key, &step_payload(test))
    }

    /// Sync every test in the report, one at a time. A single test's failure
    /// is logged and skipped; partial completion is acceptable and a re-run
    /// of the whole pipeline is the retry mechanism.
    ///
    /// Returns the number of tests synced successfully.
    pub fn sync_report(&self, report: &Report) -> usize {
        let mut synced = 0;
        for test in &report.tests {
            let case_key = case_key_for(test);
            match self.sync_test(&case_key, test) {
                Ok(()) => {
                    println!("Updated {} in Zephyr", case_key);
                    synced += 1;
                }
                Err(err) => {
                    eprintln!("Error syncing {}: {}", case_key, err);
                }
            }
            thread::sleep(self.pause);
        }
        synced
    }
}

/// The case key is the title prefix before the first `:`
/// (e.g., "TC-001: Check the title" -> "TC-001").
pub fn case_key_for(test: &TestRecord) -> String {
    test.title
        .split(':')
        .next()
        .unwrap_or(&test.title)
        .trim()
        .to_string()
}

/// Map a reconciled step status onto the service's status names.
fn zephyr_status(entry: &StepEntry) -> &'static str {
    match entry.status() {
        Status::Passed => "Pass",
        Status::Failed | Status::TimedOut | Status::Interrupted => "Fail",
        Status::Skipped | Status::Unknown => "Not Executed",
    }
}

/// Shape a test's reconciled steps for the execution update call.
pub fn step_payload(test: &TestRecord) -> Vec<serde_json::Value> {
    test.steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let actual_result: Vec<serde_json::Value> = step
                .attachments()
                .iter()
                .map(|attachment| {
                    let file_name = if attachment.content_type == "image/png" {
                        let error_suffix = if attachment.name.contains("ERROR") {
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
                    } else {
                        attachment.name.clone()
                    };
                    json!({
                        "fileName": file_name,
                        "image": attachment.content_type,
                        "body": attachment.body,
                    })
                })
                .collect();
            json!({
                "statusName": zephyr_status(step),
                "actualResult": actual_result,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{Attachment, ExecutedStep, PlaceholderStep};
    use std::cell::RefCell;

    fn test_record(title: &str, steps: Vec<StepEntry>) -> TestRecord {
        TestRecord {
            title: title.to_string(),
            source_file: None,
            status: Status::Passed,
            duration_ms: 1,
            error: None,
            steps,
        }
    }

    fn executed_with_screenshot(title: &str, status: Status) -> StepEntry {
        StepEntry::Executed(ExecutedStep {
            title: title.to_string(),
            status,
            duration_ms: 5,
            attachments: vec![Attachment::from_bytes(
                "step-screenshot",
                "image/png",
                b"png-bytes",
            )],
            error: None,
        })
    }

    /// Transport that serves canned lookups and records every PUT.
    struct FakeTransport {
        puts: RefCell<Vec<(String, serde_json::Value)>>,
        broken_case: Option<String>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                puts: RefCell::new(Vec::new()),
                broken_case: None,
            }
        }

        fn with_broken_case(case_key: &str) -> Self {
            Self {
                puts: RefCell::new(Vec::new()),
                broken_case: Some(case_key.to_string()),
            }
        }
    }

    impl ZephyrTransport for FakeTransport {
        fn get(&self, url: &str) -> ZephyrResult<serde_json::Value> {
            if let Some(broken) = &self.broken_case {
                if url.contains(broken.as_str()) {
                    return Err(ZephyrError::Http("connection refused".to_string()));
                }
            }
            if url.contains("testcases/") {
                Ok(json!({ "id": 42 }))
            } else if url.contains("testexecutions?") {
                Ok(json!({
                    "values": [
                        { "key": "EX-9", "testCase": { "id": 42 } },
                        { "key": "EX-1", "testCase": { "id": 7 } }
                    ]
                }))
            } else {
                Err(ZephyrError::InvalidResponse(format!("unexpected url {}", url)))
            }
        }

        fn put(&self, url: &str, body: &serde_json::Value) -> ZephyrResult<serde_json::Value> {
            self.puts.borrow_mut().push((url.to_string(), body.clone()));
            Ok(serde_json::Value::Null)
        }
    }

    fn client(transport: FakeTransport) -> ZephyrClient<FakeTransport> {
        ZephyrClient::new("https://zephyr.example/v2/", "CYCLE-1", transport)
            .pause(Duration::ZERO)
    }

    #[test]
    fn test_case_key_extraction() {
        let test = test_record("TC-001: Check the title", Vec::new());
        assert_eq!(case_key_for(&test), "TC-001");
        let test = test_record("No prefix here", Vec::new());
        assert_eq!(case_key_for(&test), "No prefix here");
    }

    #[test]
    fn test_step_payload_shape() {
        let test = test_record(
            "TC-001: Check",
            vec![
                executed_with_screenshot("Go to the site", Status::Passed),
                StepEntry::Planned(PlaceholderStep::new("Never reached")),
            ],
        );
        let payload = step_payload(&test);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0]["statusName"], "Pass");
        assert_eq!(
            payload[0]["actualResult"][0]["fileName"],
            "step_1_go_to_the_site.png"
        );
        assert_eq!(payload[0]["actualResult"][0]["image"], "image/png");
        assert_eq!(payload[1]["statusName"], "Not Executed");
        assert_eq!(payload[1]["actualResult"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_failed_step_maps_to_fail() {
        let test = test_record(
            "TC-002: x",
            vec![executed_with_screenshot("Click", Status::Failed)],
        );
        assert_eq!(step_payload(&test)[0]["statusName"], "Fail");
    }

    #[test]
    fn test_sync_resolves_and_updates() {
        let report = Report::new(vec![test_record(
            "TC-001: Check the title",
            vec![executed_with_screenshot("Go", Status::Passed)],
        )]);
        let client = client(FakeTransport::new());

        assert_eq!(client.sync_report(&report), 1);
        let puts = client.transport.puts.borrow();
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].0,
            "https://zephyr.example/v2/testexecutions/EX-9/teststeps"
        );
        assert_eq!(puts[0].1["steps"][0]["statusName"], "Pass");
    }

    #[test]
    fn test_sync_continues_after_single_failure() {
        let report = Report::new(vec![
            test_record("TC-404: broken", Vec::new()),
            test_record("TC-001: fine", Vec::new()),
        ]);
        let client = client(FakeTransport::with_broken_case("TC-404"));

        // The broken test is skipped; the rest still syncs.
        assert_eq!(client.sync_report(&report), 1);
        assert_eq!(client.transport.puts.borrow().len(), 1);
    }

    #[test]
    fn test_missing_settings_rejected() {
        let settings = config::ZephyrSettings::defaults();
        let result = ZephyrClient::from_settings(&settings);
        assert!(matches!(result, Err(ZephyrError::MissingConfig(_))));
    }
}
