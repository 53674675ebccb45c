//! Unified record model for both remittance layouts

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::iban::Iban;
use crate::layout::LayoutTag;

/// The only status value with a meaning of its own
pub const ACCEPTED_STATUS: &str = "Accepté";

fn operation_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-([A-Z]+)-").expect("invalid operation code regex"))
}

/// Descriptor of one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    /// Human-readable size ("1.20 MB" or "512 bytes")
    pub size: String,
    /// Lowercase extension including the dot (".csv")
    pub extension: String,
    /// Encoding used to decode the file; None for binary formats
    pub encoding: Option<String>,
    /// Decoded lines without terminators
    pub raw_lines: Option<Vec<String>>,
    pub layout: Option<LayoutTag>,
}

impl FileRecord {
    /// Attach a layout tag unless one was set at construction
    pub fn with_layout_if_absent(mut self, layout: LayoutTag) -> Self {
        if self.layout.is_none() {
            self.layout = Some(layout);
        }
        self
    }

    pub fn lines(&self) -> &[String] {
        self.raw_lines.as_deref().unwrap_or(&[])
    }
}

/// Format a byte count the way the exports listing shows it
pub fn human_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 0.01 {
        format!("{:.2} MB", mb)
    } else {
        format!("{} bytes", bytes)
    }
}

/// One line item of a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    /// Debtor (direct debit) or beneficiary (transfer)
    pub name: String,
    pub reference: String,
    pub account: Iban,
    pub amount: f64,
    pub currency: String,
    pub status: String,
}

impl Operation {
    /// Letters-only token found between two dashes of the reference
    /// ("0021-12345678900017-ABO-0525-15582" -> "ABO").
    pub fn code(&self) -> Option<&str> {
        operation_code(&self.reference)
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED_STATUS
    }
}

/// Derive the operation code of a reference string.
pub fn operation_code(reference: &str) -> Option<&str> {
    operation_code_re()
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Declared vs parsed operation count divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub declared: u32,
    pub parsed: usize,
}

/// One batch: a source file's worth of operations plus its header fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remittance {
    pub file: FileRecord,
    pub exported_at: NaiveDateTime,
    /// Due date (direct debit) or execution date (transfer)
    pub settlement_date: NaiveDate,
    pub reference: String,
    pub label: String,
    pub account: Iban,
    pub batch_type: String,
    pub status: String,
    pub declared_total: f64,
    pub declared_count: u32,
    pub operations: Vec<Operation>,
}

impl Remittance {
    pub fn layout(&self) -> Option<LayoutTag> {
        self.file.layout
    }

    pub fn count_mismatch(&self) -> Option<CountMismatch> {
        let parsed = self.operations.len();
        if self.declared_count as usize == parsed {
            None
        } else {
            Some(CountMismatch {
                declared: self.declared_count,
                parsed,
            })
        }
    }

    pub fn accepted_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_accepted()).count()
    }

    pub fn operations_total(&self) -> f64 {
        self.operations.iter().map(|op| op.amount).sum()
    }
}
