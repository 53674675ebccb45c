//! remise-report: console report, run summary and the consolidated export sheet

pub mod export;
pub mod sections;
pub mod summary;

pub use export::{DelimitedSheetSink, EXPORT_HEADERS, ExportRecord, ExportSink, export_records};
pub use sections::{ReportSection, render_table, sections};
pub use summary::{CountWarning, Summary, count_warnings};
