//! Step reconciler: merges executed steps with statically planned ones.
//!
//! Framework-internal bookkeeping steps (hooks, fixtures, cleanup) are
//! filtered out first; they are never shown and never counted. The merge then
//! assumes executed steps form a strict prefix of the planned sequence and
//! appends `planned[executed..]` as placeholders. If a test's control flow
//! skipped a planned step without failing, the merge mislabels the remainder;
//! that prefix assumption is an accepted limitation and is not validated here.

use std::path::Path;

use crate::planner;

use super::types::{PlaceholderStep, Report, StepEntry, TestRecord};

/// Case-insensitive substrings marking runner bookkeeping steps
const INTERNAL_SUBSTRINGS: [&str; 4] =
    ["before hooks", "after hooks", "worker cleanup", "cleanup"];

/// Title prefixes marking runner bookkeeping steps
const INTERNAL_PREFIXES: [&str; 6] = [
    "hook@",
    "fixture@",
    "pw:api@",
    "test.attach@",
    "test.before",
    "test.after",
];

/// Whether a step title denotes framework-internal bookkeeping.
pub fn is_internal_step(title: &str) -> bool {
    let lower = title.to_lowercase();
    INTERNAL_SUBSTRINGS.iter().any(|s| lower.contains(s))
        || INTERNAL_PREFIXES.iter().any(|p| title.starts_with(p))
}

/// Drop framework-internal steps, keeping user steps in order.
pub fn filter_user_steps(steps: Vec<StepEntry>) -> Vec<StepEntry> {
    steps
        .into_iter()
        .filter(|step| !is_internal_step(step.title()))
        .collect()
}

/// Append placeholders for planned steps beyond the executed prefix.
pub fn merge_steps(executed: Vec<StepEntry>, planned: &[String]) -> Vec<StepEntry> {
    let executed_count = executed.len();
    let mut merged = executed;
    for title in planned.iter().skip(executed_count) {
        merged.push(StepEntry::Planned(PlaceholderStep::new(title.clone())));
    }
    merged
}

/// Reconcile one test record in place: filter internal steps, look up the
/// plan for the test's title, and append placeholders for unreached steps.
/// A test with no plan entry keeps its executed steps unchanged.
pub fn reconcile_test(test: &mut TestRecord) {
    let executed = filter_user_steps(std::mem::take(&mut test.steps));
    let planned = match &test.source_file {
        Some(file) => planner::planned_steps(Path::new(file), &test.title),
        None => Vec::new(),
    };
    test.steps = merge_steps(executed, &planned);
}

/// Reconcile every test in the report.
pub fn reconcile_report(report: &mut Report) {
    for test in &mut report.tests {
        reconcile_test(test);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{ExecutedStep, Status};
    use std::io::Write;

    fn executed(title: &str, status: Status) -> StepEntry {
        StepEntry::Executed(ExecutedStep {
            title: title.to_string(),
            status,
            duration_ms: 10,
            attachments: Vec::new(),
            error: None,
        })
    }

    #[test]
    fn test_internal_step_detection() {
        assert!(is_internal_step("Before Hooks"));
        assert!(is_internal_step("after hooks"));
        assert!(is_internal_step("Worker Cleanup"));
        assert!(is_internal_step("fixture@page"));
        assert!(is_internal_step("pw:api@page.goto"));
        assert!(is_internal_step("test.attach@screenshot"));
        assert!(!is_internal_step("Check the title"));
        // Prefix list is case-sensitive, substring list is not.
        assert!(!is_internal_step("Fixture setup for login"));
    }

    #[test]
    fn test_filter_removes_bookkeeping() {
        let steps = vec![
            executed("Before Hooks", Status::Passed),
            executed("Go to the site", Status::Passed),
            executed("fixture@page", Status::Passed),
            executed("Check the title", Status::Failed),
            executed("After Hooks", Status::Passed),
        ];
        let user = filter_user_steps(steps);
        let titles: Vec<&str> = user.iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["Go to the site", "Check the title"]);
    }

    #[test]
    fn test_merge_appends_placeholders() {
        let planned = vec![
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
        ];
        let merged = merge_steps(vec![executed("one", Status::Passed)], &planned);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].is_executed());
        assert!(!merged[1].is_executed());
        assert_eq!(merged[1].title(), "two");
        assert_eq!(merged[1].status(), Status::Skipped);
        assert_eq!(merged[2].title(), "three");
        assert!(merged[2].attachments().is_empty());
    }

    #[test]
    fn test_merge_without_plan_keeps_executed() {
        let merged = merge_steps(
            vec![
                executed("a", Status::Passed),
                executed("b", Status::Passed),
            ],
            &[],
        );
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(StepEntry::is_executed));
    }

    #[test]
    fn test_merge_is_length_based_only() {
        // Titles are not compared; the slice is purely positional.
        let planned = vec!["expected".to_string(), "next".to_string()];
        let merged = merge_steps(vec![executed("different", Status::Passed)], &planned);
        assert_eq!(merged[0].title(), "different");
        assert_eq!(merged[1].title(), "next");
    }

    #[test]
    fn test_reconcile_test_with_source_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "test('Check the title', async ({{ page }}) => {{\n\
             await test.step('Go to the playwright website', async () => {{}});\n\
             await test.step('Check the title', async () => {{}});\n\
             }});\n"
        )
        .unwrap();
        file.flush().unwrap();

        let mut test = TestRecord {
            title: "Check the title".to_string(),
            source_file: Some(file.path().to_path_buf()),
            status: Status::Failed,
            duration_ms: 100,
            error: None,
            steps: vec![
                executed("Before Hooks", Status::Passed),
                executed("Go to the playwright website", Status::Failed),
            ],
        };
        reconcile_test(&mut test);

        assert_eq!(test.steps.len(), 2);
        assert!(test.steps[0].is_executed());
        assert_eq!(test.steps[0].title(), "Go to the playwright website");
        assert!(!test.steps[1].is_executed());
        assert_eq!(test.steps[1].title(), "Check the title");
    }
}
