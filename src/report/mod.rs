pub mod console;
pub mod raw;
pub mod reconcile;
pub mod transform;
pub mod types;
pub mod writer;

pub use console::{print_report, render};
pub use reconcile::{reconcile_report, reconcile_test};
pub use transform::transform_run;
pub use types::{
    Attachment, ErrorInfo, ExecutedStep, PlaceholderStep, Report, ReportError, ReportResult,
    Status, StepEntry, TestRecord,
};
pub use writer::{export_screenshots, load_report, save_report, REPORT_FILENAME};
