//! `remise inspect`: show what the parser sees in one file.

use anyhow::{Context, Result};
use remise_ingest::assemble::find_operations_header;
use remise_ingest::encoding::{self, SniffingDetector};
use remise_ingest::{BatchHeader, build_metadata, read_file_record, score, tabular};
use std::fs;
use std::path::Path;

const PREVIEW_ROWS: usize = 5;

pub fn run_inspect(path: &Path) -> Result<()> {
    let record = read_file_record(path, &SniffingDetector)
        .with_context(|| format!("inspecting {}", path.display()))?;

    println!("File:      {}", record.name);
    println!("Path:      {}", record.path.display());
    println!("Size:      {}", record.size);
    println!("Extension: {}", record.extension);

    let Some(lines) = record.raw_lines.as_deref() else {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let guess = encoding::resolve(path, &bytes, &SniffingDetector);
        println!("Encoding:  (not decoded; detector suggests {})", guess.name());
        return Ok(());
    };
    println!("Encoding:  {}", record.encoding.as_deref().unwrap_or("-"));
    println!("Lines:     {}", lines.len());

    let scores = score(lines);
    let layout = scores.winner();
    println!(
        "\nLayout:    {} (direct debit {} / transfer {})",
        layout.label(),
        scores.direct_debit,
        scores.transfer
    );

    let header_idx = find_operations_header(lines, layout);
    match header_idx {
        Some(i) => println!("Table:     header at line {}", i + 1),
        None => println!("Table:     no operations header found"),
    }

    let metadata = build_metadata(&lines[..header_idx.unwrap_or(lines.len())]);
    println!("\nMetadata ({} keys):", metadata.len());
    for (key, value) in metadata.iter() {
        println!("  {key:?} = {value:?}");
    }

    let header = BatchHeader::resolve(&metadata, layout);
    println!("\nResolved header:");
    println!("  export date:     {}", show(header.exported_at.map(|d| d.format("%d/%m/%Y %H:%M:%S"))));
    println!("  settlement date: {}", show(header.settlement_date.map(|d| d.format("%d/%m/%Y"))));
    println!("  reference:       {}", show(header.reference.as_deref()));
    println!("  label:           {}", show(header.label.as_deref()));
    println!("  account:         {}", show(header.account.as_ref().map(|a| a.formatted())));
    println!("  batch type:      {}", show(header.batch_type.as_deref()));
    println!("  status:          {}", show(header.status.as_deref()));
    println!("  declared total:  {}", show(header.declared_total.map(|t| format!("{t:.2}"))));
    println!("  declared count:  {}", show(header.declared_count));

    let table = header_idx
        .and_then(|i| tabular::load_from(lines, i))
        .or_else(|| tabular::load(lines));
    match table {
        Some(table) => {
            println!(
                "\nTable preview ({} rows, delimiter {:?}):",
                table.rows.len(),
                table.delimiter as char
            );
            println!("  {}", table.headers.join(" | "));
            for row in table.rows.iter().take(PREVIEW_ROWS) {
                println!("  {}", row.join(" | "));
            }
        }
        None => println!("\nNo tabular data found"),
    }

    Ok(())
}

fn show<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "(not found)".to_string(), |v| v.to_string())
}
