//! Flat per-operation records and the sinks that write them out.

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use remise_core::{Remittance, strip_prefix_with};
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPORT_HEADERS: [&str; 17] = [
    "File Name",
    "File Format",
    "Date Export",
    "Date Échéance",
    "Référence Remise",
    "Libellé",
    "Compte Remise",
    "Type Remise",
    "Statut Remise",
    "Montant Total",
    "Op #",
    "Op Débiteur",
    "Op Référence",
    "Op Code",
    "Op Compte",
    "Op Montant",
    "Op Statut",
];

const UNKNOWN_LAYOUT: &str = "Unknown";

/// One operation with its batch fields repeated
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub file_name: String,
    pub layout: String,
    pub exported_on: NaiveDate,
    pub settlement_date: NaiveDate,
    pub reference: String,
    pub label: String,
    pub account: String,
    pub batch_type: String,
    pub batch_status: String,
    pub declared_total: f64,
    /// 1-based position in its batch
    pub op_number: usize,
    pub op_name: String,
    pub op_reference: String,
    pub op_code: String,
    pub op_account: String,
    pub op_amount: f64,
    pub op_status: String,
}

pub fn export_records(remittances: &[Remittance], display_prefix: &str) -> Vec<ExportRecord> {
    let mut records = Vec::new();
    for r in remittances {
        let file_name = strip_prefix_with(&r.file.name, display_prefix).to_string();
        let layout = r
            .layout()
            .map_or(UNKNOWN_LAYOUT, |l| l.as_str())
            .to_string();

        for (i, op) in r.operations.iter().enumerate() {
            records.push(ExportRecord {
                file_name: file_name.clone(),
                layout: layout.clone(),
                exported_on: r.exported_at.date(),
                settlement_date: r.settlement_date,
                reference: r.reference.clone(),
                label: r.label.clone(),
                account: r.account.to_string(),
                batch_type: r.batch_type.clone(),
                batch_status: r.status.clone(),
                declared_total: r.declared_total,
                op_number: i + 1,
                op_name: op.name.clone(),
                op_reference: op.reference.clone(),
                op_code: op.code().unwrap_or("").to_string(),
                op_account: op.account.to_string(),
                op_amount: op.amount,
                op_status: op.status.clone(),
            });
        }
    }
    records
}

/// Destination for the consolidated operations sheet
pub trait ExportSink {
    /// Write every record; returns where the output went
    fn export(&self, records: &[ExportRecord]) -> Result<PathBuf>;
}

/// French money cell: two decimals, comma separator
pub fn format_money(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

impl ExportRecord {
    fn cells(&self) -> [String; 17] {
        [
            self.file_name.clone(),
            self.layout.clone(),
            format_date(self.exported_on),
            format_date(self.settlement_date),
            self.reference.clone(),
            self.label.clone(),
            self.account.clone(),
            self.batch_type.clone(),
            self.batch_status.clone(),
            format_money(self.declared_total),
            self.op_number.to_string(),
            self.op_name.clone(),
            self.op_reference.clone(),
            self.op_code.clone(),
            self.op_account.clone(),
            format_money(self.op_amount),
            self.op_status.clone(),
        ]
    }
}

/// Writes the sheet as a delimited text file with a trailing total row
#[derive(Debug, Clone)]
pub struct DelimitedSheetSink {
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    /// Append `_YYYYmmdd_HHMMSS` to the file name
    pub timestamp: bool,
    pub delimiter: u8,
}

impl DelimitedSheetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            filename_prefix: "ops".to_string(),
            timestamp: true,
            delimiter: b';',
        }
    }

    pub fn file_name_at(&self, now: NaiveDateTime) -> String {
        if self.timestamp {
            format!("{}_{}.csv", self.filename_prefix, now.format("%Y%m%d_%H%M%S"))
        } else {
            format!("{}.csv", self.filename_prefix)
        }
    }

    pub fn export_at(&self, records: &[ExportRecord], now: NaiveDateTime) -> Result<PathBuf> {
        if records.is_empty() {
            bail!("no operations to export");
        }

        let path = self.output_dir.join(self.file_name_at(now));
        write_sheet(&path, self.delimiter, records)?;
        info!("exported {} operations to {}", records.len(), path.display());
        Ok(path)
    }
}

impl ExportSink for DelimitedSheetSink {
    fn export(&self, records: &[ExportRecord]) -> Result<PathBuf> {
        self.export_at(records, Local::now().naive_local())
    }
}

fn write_sheet(path: &Path, delimiter: u8, records: &[ExportRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    wtr.write_record(EXPORT_HEADERS)?;
    for record in records {
        wtr.write_record(record.cells())?;
    }

    // Total row: label, record count, and the two money columns summed
    let mut total = vec![String::new(); EXPORT_HEADERS.len()];
    total[0] = "Total".to_string();
    total[1] = records.len().to_string();
    total[9] = format_money(records.iter().map(|r| r.declared_total).sum());
    total[15] = format_money(records.iter().map(|r| r.op_amount).sum());
    wtr.write_record(&total)?;

    wtr.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
