//! Best-effort loader for the data table embedded below a free-form header.

use remise_core::fold;

/// Column names that mark the start of the operations table (folded)
pub const HEADER_KEYWORDS: &[&str] = &[
    "debiteur",
    "reference",
    "compte",
    "montant",
    "statut",
    "beneficiaire",
];

/// Candidate delimiters in priority order
pub const DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// A delimited table with trimmed cells, every row as wide as the header
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of a column by folded name
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = fold(name);
        self.headers.iter().position(|h| fold(h) == wanted)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Drop fully empty rows and columns with a blank or auto-generated header
    fn cleaned(self) -> Table {
        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && !h.starts_with("Unnamed"))
            .map(|(i, _)| i)
            .collect();

        let headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Table {
            delimiter: self.delimiter,
            headers,
            rows,
        }
    }
}

/// First line that looks like the table header.
///
/// Prefers a line naming a known column; otherwise the first line with at
/// least two semicolons.
pub fn find_data_start(lines: &[String]) -> Option<usize> {
    lines
        .iter()
        .position(|line| {
            let folded = fold(line);
            HEADER_KEYWORDS.iter().any(|k| folded.contains(k))
        })
        .or_else(|| lines.iter().position(|line| line.matches(';').count() >= 2))
}

/// Locate and parse the data table. Returns None when nothing tabular is found.
pub fn load(lines: &[String]) -> Option<Table> {
    if let Some(table) = find_data_start(lines).and_then(|start| load_from(lines, start)) {
        return Some(table);
    }

    // Whole-file attempt
    parse_with_candidates(lines)
}

/// Parse the table whose header sits at a known line.
pub fn load_from(lines: &[String], header_idx: usize) -> Option<Table> {
    parse_with_candidates(lines.get(header_idx..)?)
}

fn parse_with_candidates(lines: &[String]) -> Option<Table> {
    let text = lines.join("\n");
    DELIMITERS
        .iter()
        .find_map(|&delimiter| parse_delimited(&text, delimiter))
}

fn parse_delimited(text: &str, delimiter: u8) -> Option<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.len() < 2 {
        return None;
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        // Unreadable lines are skipped, not fatal
        let Ok(record) = record else { continue };
        let mut cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();

        // Exports end rows with a trailing delimiter
        while cells.len() > headers.len() && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        if cells.len() > headers.len() {
            continue;
        }
        cells.resize(headers.len(), String::new());
        rows.push(cells);
    }
    if rows.is_empty() {
        return None;
    }

    let table = Table {
        delimiter,
        headers,
        rows,
    }
    .cleaned();

    (table.headers.len() > 1 && !table.rows.is_empty()).then_some(table)
}
