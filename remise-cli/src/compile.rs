//! `remise compile`: every export in a directory into one report and sheet.

use anyhow::{Context, Result, bail};
use remise_core::{DiagnosticKind, Diagnostics, Remittance, Severity};
use remise_ingest::{ParseOptions, parse_remittance};
use remise_report::{
    DelimitedSheetSink, ExportSink, Summary, count_warnings, export_records, render_table,
    sections,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct CompileArgs {
    pub dir: PathBuf,
    pub verbose: bool,
    pub json: bool,
    pub no_export: bool,
    pub prefix: Option<String>,
    pub no_timestamp: bool,
}

/// Whether `path` is a sheet this tool wrote: `<prefix>.csv` or `<prefix>_<timestamp>.csv`
fn is_sheet_output(path: &Path, sheet_prefix: &str) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    stem == sheet_prefix
        || stem
            .strip_prefix(sheet_prefix)
            .is_some_and(|rest| rest.starts_with('_'))
}

/// `.csv` files directly inside `dir`, sorted by file name, minus earlier sheets
pub fn scan_csv_files(dir: &Path, sheet_prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        if is_sheet_output(&path, sheet_prefix) {
            debug!("skipping earlier sheet: {}", path.display());
            continue;
        }
        files.push(path);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn run_compile(args: &CompileArgs, cfg: &Config) -> Result<()> {
    let dir = &args.dir;
    if !dir.exists() {
        bail!("Directory '{}' does not exist", dir.display());
    }
    if !dir.is_dir() {
        bail!("'{}' is not a directory", dir.display());
    }

    let delimiter = cfg.export.delimiter_byte()?;
    let options = ParseOptions {
        assembler: cfg.parsing.assembler()?,
        ..ParseOptions::default()
    };
    let display_prefix = cfg.parsing.display_prefix.as_str();
    let sheet_prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| cfg.export.filename_prefix.clone());

    info!("scanning directory: {}", dir.display());
    let files = scan_csv_files(dir, &sheet_prefix)?;
    if files.is_empty() {
        println!("No CSV files found in {}", dir.display());
        return Ok(());
    }

    let mut diags = Diagnostics::new();
    let mut remittances: Vec<Remittance> = Vec::new();
    for path in &files {
        info!("processing: {}", path.display());
        match parse_remittance(path, &options, &mut diags) {
            Ok(r) => remittances.push(r),
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                diags.push(name, DiagnosticKind::FileSkipped { reason: e.to_string() });
            }
        }
    }

    if remittances.is_empty() {
        println!("No valid remises found");
        return Ok(());
    }

    if !args.json {
        for warning in count_warnings(&remittances) {
            println!("{warning}");
        }
        println!("{}", render_table(&sections(&remittances, display_prefix)));
    }

    if !args.no_export {
        let sink = DelimitedSheetSink {
            output_dir: dir.clone(),
            filename_prefix: sheet_prefix,
            timestamp: cfg.export.timestamp && !args.no_timestamp,
            delimiter,
        };
        let records = export_records(&remittances, display_prefix);
        match sink.export(&records) {
            Ok(path) if !args.json => {
                println!("\n✅ Exported to: {}", path.display());
                println!("   • {} rows exported with all available fields", records.len());
            }
            Ok(_) => {}
            Err(e) => eprintln!("Error exporting operations sheet: {e:#}"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&remittances)?);
        return Ok(());
    }

    println!("\n{}", Summary::from_remittances(&remittances));

    if args.verbose {
        println!("\nRemises details:");
        for r in &remittances {
            println!(
                "  • {}: {} ops, {:.2} EUR",
                r.file.name,
                r.operations.len(),
                r.declared_total
            );
        }
        if !diags.is_empty() {
            println!("\nDiagnostics:");
            for d in diags.iter() {
                println!("  [{:?}] {d}", d.severity());
            }
        }
    } else {
        let problems = diags.at_least(Severity::Error).count();
        if problems > 0 {
            println!("\n{problems} file(s) skipped; rerun with -v for details");
        }
    }

    Ok(())
}
