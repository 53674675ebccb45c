//! remise-ingest: turns bank remittance export files into [`Remittance`] records.
//!
//! Pipeline per file: read + decode ([`source`], [`encoding`]), classify the
//! layout ([`classify`]), then assemble header and rows ([`assemble`]).

pub mod assemble;
pub mod classify;
pub mod encoding;
pub mod error;
pub mod metadata;
pub mod rows;
pub mod source;
pub mod tabular;

pub use assemble::Assembler;
pub use classify::{Scores, classify, score};
pub use encoding::{EncodingDetector, SniffingDetector};
pub use error::IngestError;
pub use metadata::{BatchHeader, MetadataMap, build_metadata};
pub use rows::parse_row;
pub use source::read_file_record;

use chrono::{Local, NaiveDateTime};
use remise_core::{DiagnosticKind, Diagnostics, LayoutTag, Remittance};
use std::path::Path;

/// Knobs for [`parse_remittance`]
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Skip classification and use this layout
    pub layout: Option<LayoutTag>,
    pub assembler: Assembler,
    /// Clock for missing dates; None reads the local wall clock
    pub now: Option<NaiveDateTime>,
}

/// Parse one export file, detecting its layout unless one is forced.
pub fn parse_remittance(
    path: &Path,
    options: &ParseOptions,
    diags: &mut Diagnostics,
) -> Result<Remittance, IngestError> {
    let record = read_file_record(path, &SniffingDetector)?;
    if let Some(encoding) = &record.encoding {
        diags.push(
            &record.name,
            DiagnosticKind::EncodingResolved {
                encoding: encoding.clone(),
            },
        );
    }

    let Some(lines) = record.raw_lines.as_deref() else {
        return Err(IngestError::NoText { name: record.name });
    };

    let layout = options
        .layout
        .or(record.layout)
        .unwrap_or_else(|| classify(lines));
    diags.push(&record.name, DiagnosticKind::LayoutDetected { layout });

    let now = options.now.unwrap_or_else(|| Local::now().naive_local());
    Ok(options.assembler.assemble_at(record, layout, now, diags))
}

/// Parse one export file as a known layout.
pub fn parse_remittance_as(
    path: &Path,
    layout: LayoutTag,
    options: &ParseOptions,
    diags: &mut Diagnostics,
) -> Result<Remittance, IngestError> {
    let options = ParseOptions {
        layout: Some(layout),
        ..options.clone()
    };
    parse_remittance(path, &options, diags)
}
