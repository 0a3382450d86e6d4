//! Helpers for the data the CLI reads and writes.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5m", "500ms")
//! - [`report`]: The JSON leak report written by `--export`

pub mod duration;
pub mod report;

pub use report::{LeakReport, ReportEntry, ReportSummary};
