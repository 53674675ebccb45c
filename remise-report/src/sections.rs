//! Console report: one section per batch, batch fields only on its first row.

use remise_core::{Remittance, strip_prefix_with};

pub const REPORT_COLUMNS: [&str; 11] = [
    "Rem File",
    "Rem Export",
    "Rem Échéance",
    "Rem Montant Total",
    "Rem Nb Ops",
    "Op #",
    "Op Débiteur",
    "Op Réf",
    "Op Code",
    "Op Montant",
    "Op Statut",
];

const ACCEPTED_MARK: &str = "✅";

/// Rows of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub file: String,
    pub rows: Vec<[String; 11]>,
}

pub fn section(remittance: &Remittance, display_prefix: &str) -> ReportSection {
    let file = strip_prefix_with(&remittance.file.name, display_prefix).to_string();

    let rows = remittance
        .operations
        .iter()
        .enumerate()
        .map(|(i, op)| {
            let first = i == 0;
            let batch = |value: String| if first { value } else { String::new() };
            let status = if op.is_accepted() {
                ACCEPTED_MARK.to_string()
            } else {
                op.status.clone()
            };
            [
                batch(file.clone()),
                batch(remittance.exported_at.format("%d/%m/%Y").to_string()),
                batch(remittance.settlement_date.format("%d/%m/%Y").to_string()),
                batch(format!("{:.2}", remittance.declared_total)),
                batch(remittance.declared_count.to_string()),
                (i + 1).to_string(),
                op.name.clone(),
                op.reference.clone(),
                op.code().unwrap_or("").to_string(),
                format!("{:.2}", op.amount),
                status,
            ]
        })
        .collect();

    ReportSection { file, rows }
}

pub fn sections(remittances: &[Remittance], display_prefix: &str) -> Vec<ReportSection> {
    remittances
        .iter()
        .map(|r| section(r, display_prefix))
        .collect()
}

/// Fixed-width text table; a rule separates consecutive batches.
pub fn render_table(sections: &[ReportSection]) -> String {
    let mut widths = REPORT_COLUMNS.map(|c| c.chars().count());
    for row in sections.iter().flat_map(|s| s.rows.iter()) {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths
        .iter()
        .map(|&w| "─".repeat(w))
        .collect::<Vec<_>>()
        .join("─┼─");

    let mut out = String::new();
    out.push_str(&render_line(REPORT_COLUMNS.iter().copied(), &widths));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    let mut first = true;
    for section in sections.iter().filter(|s| !s.rows.is_empty()) {
        if !first {
            out.push_str(&rule);
            out.push('\n');
        }
        first = false;
        for row in &section.rows {
            out.push_str(&render_line(row.iter().map(String::as_str), &widths));
            out.push('\n');
        }
    }
    out
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}
