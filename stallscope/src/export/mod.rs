//! Report export
//!
//! Writes a finished detection as pretty-printed JSON for CI pipelines and
//! later comparison between adapters.

pub mod json_report;

pub use json_report::{write_report, JsonReport, ReportConfiguration, ReportCounts};
