//! Header block parsing: free-form "key : value" lines into typed batch fields.
//!
//! Key spellings drift between exports (accents, trailing colons, encoding
//! damage), so every field is resolved by a [`FieldRule`]: first any key whose
//! folded form contains the required words, then a list of exact spellings.

use chrono::{NaiveDate, NaiveDateTime};
use remise_core::{Iban, LayoutTag, fold, parse_french_amount};
use tracing::warn;

/// Keys whose whole remainder (after the first colon) is kept verbatim,
/// stored under the synthetic key (the prefix without its trailing space).
const CAPTURED_PREFIXES: &[&str] = &["REF ", "COMPTE ", "STATUT "];

pub const REF_KEY: &str = "REF";
pub const ACCOUNT_KEY: &str = "COMPTE";
pub const STATUS_KEY: &str = "STATUT";

const TYPE_MARKER: &str = ";TYPE : ";
const LABEL_MARKER: &str = ";LIBELLE";

/// Raw header keys to values, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MetadataMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Parse the header lines into a map.
///
/// A line containing `;` is split on `;`, otherwise on `:`. The first part is
/// the key and the second the value. Lines with neither are ignored.
pub fn build_metadata(lines: &[String]) -> MetadataMap {
    let mut map = MetadataMap::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let delimiter = if line.contains(';') {
            ';'
        } else if line.contains(':') {
            ':'
        } else {
            continue;
        };

        let mut parts = line.split(delimiter);
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let key = key.trim();
        map.insert(key, value.trim());

        if let Some(prefix) = CAPTURED_PREFIXES.iter().find(|p| key.starts_with(*p)) {
            let rest = captured_remainder(line);
            // REF keeps its compound value as exported; the others drop a trailing `;`
            let value = if *prefix == "REF " {
                rest
            } else {
                rest.trim_end_matches(';').trim_end()
            };
            map.insert(prefix.trim_end(), value);
        }
    }

    map
}

/// Everything after the first colon, trimmed
fn captured_remainder(line: &str) -> &str {
    line.split_once(':').map_or(line, |(_, rest)| rest).trim()
}

/// How one typed field is found in a [`MetadataMap`]
pub struct FieldRule<T> {
    pub field: &'static str,
    /// Every group must have one term in the folded key
    pub required: &'static [&'static [&'static str]],
    /// Exact keys tried in order when no fuzzy match parses
    pub fallback_keys: &'static [&'static str],
    pub parse: fn(&str) -> Option<T>,
}

impl<T> FieldRule<T> {
    fn matches(&self, key: &str) -> bool {
        let folded = fold(key);
        self.required
            .iter()
            .all(|group| group.iter().any(|term| folded.contains(term)))
    }

    /// First matching key whose value parses; a value that fails to parse
    /// does not stop the search.
    pub fn resolve(&self, map: &MetadataMap) -> Option<T> {
        map.iter()
            .filter(|(key, _)| self.matches(key))
            .find_map(|(_, value)| (self.parse)(value))
            .or_else(|| {
                self.fallback_keys
                    .iter()
                    .find_map(|key| map.get(key).and_then(self.parse))
            })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()
}

/// Full timestamp, or the date part at midnight when the time is missing or broken
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%d/%m/%Y %H:%M:%S")
        .ok()
        .or_else(|| {
            let date = value.split_whitespace().next()?;
            parse_date(date)?.and_hms_opt(0, 0, 0)
        })
}

fn parse_count(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// "285,30 EUR" -> 285.30
fn parse_amount_with_currency(value: &str) -> Option<f64> {
    let number = value
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '€')
        .trim();
    if number.is_empty() {
        return None;
    }
    parse_french_amount(number)
}

pub const EXPORT_DATE: FieldRule<NaiveDateTime> = FieldRule {
    field: "export date",
    required: &[&["export"]],
    fallback_keys: &[],
    parse: parse_timestamp,
};

pub const DUE_DATE: FieldRule<NaiveDate> = FieldRule {
    field: "due date",
    required: &[&["echeance"], &["le"]],
    fallback_keys: &[
        "Echéance le",
        "Echéance le :",
        "Echeance le",
        "Echeance le :",
        "EchÃ©ance le",
        "EchÃ©ance le :",
    ],
    parse: parse_date,
};

pub const EXECUTION_DATE: FieldRule<NaiveDate> = FieldRule {
    field: "execution date",
    required: &[&["execution"], &["le"]],
    fallback_keys: &[
        "Exécution le",
        "Exécution le :",
        "Execution le",
        "Execution le :",
        "ExÃ©cution le",
        "ExÃ©cution le :",
    ],
    parse: parse_date,
};

pub const DIRECT_DEBIT_COUNT: FieldRule<u32> = FieldRule {
    field: "operation count",
    required: &[&["nombre"], &["prelevement", "prelement"]],
    fallback_keys: &[
        "Nombre de prélèvement(s)",
        "Nombre de prélèvement(s) :",
        "Nombre de prélèvements",
        "Nombre de prÃ©lÃ¨vement(s)",
        "Nombre de prÃ©lÃ¨vement(s) :",
    ],
    parse: parse_count,
};

pub const TRANSFER_COUNT: FieldRule<u32> = FieldRule {
    field: "operation count",
    required: &[&["nombre"], &["virement"]],
    fallback_keys: &[
        "Nombre de virement(s)",
        "Nombre de virement(s) :",
        "Nombre de virements",
    ],
    parse: parse_count,
};

pub const DECLARED_TOTAL: FieldRule<f64> = FieldRule {
    field: "declared total",
    required: &[&["montant"], &["total"]],
    fallback_keys: &["Montant total", "Montant total ", "Montant total :"],
    parse: parse_amount_with_currency,
};

pub fn settlement_rule(layout: LayoutTag) -> &'static FieldRule<NaiveDate> {
    match layout {
        LayoutTag::DirectDebit => &DUE_DATE,
        LayoutTag::Transfer => &EXECUTION_DATE,
    }
}

pub fn count_rule(layout: LayoutTag) -> &'static FieldRule<u32> {
    match layout {
        LayoutTag::DirectDebit => &DIRECT_DEBIT_COUNT,
        LayoutTag::Transfer => &TRANSFER_COUNT,
    }
}

/// Split the captured REF value into (reference, label).
///
/// `"FR59ZZZ86395E-412545;LIBELLE : PRINC. *5264*"` gives
/// `("FR59ZZZ86395E", "PRINC. *5264*")`.
pub fn reference_and_label(map: &MetadataMap) -> Option<(String, String)> {
    let line = map.get(REF_KEY)?.trim();
    if line.is_empty() {
        return None;
    }

    // ASCII uppercasing keeps byte offsets valid for slicing
    let (reference_part, label) = match line.to_ascii_uppercase().find(LABEL_MARKER) {
        Some(idx) => {
            let label_part = &line[idx + 1..];
            let label = label_part
                .split_once(':')
                .map_or(label_part, |(_, label)| label);
            (&line[..idx], label.trim())
        }
        None => (line, ""),
    };

    let reference = reference_part.split('-').next().unwrap_or("").trim();
    Some((reference.to_string(), label.to_string()))
}

/// Settlement account: the COMPTE value up to the first `;`, spaces removed
pub fn account(map: &MetadataMap) -> Option<Iban> {
    let line = map.get(ACCOUNT_KEY)?;
    let raw: String = line
        .split(';')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(iban) => Some(iban),
        Err(e) => {
            warn!("ignoring settlement account {raw:?}: {e}");
            None
        }
    }
}

/// Free text after `;TYPE : ` in the COMPTE value
pub fn batch_type(map: &MetadataMap) -> Option<String> {
    let line = map.get(ACCOUNT_KEY)?;
    let (_, kind) = line.rsplit_once(TYPE_MARKER)?;
    let kind = kind.trim();
    (!kind.is_empty()).then(|| kind.to_string())
}

pub fn status(map: &MetadataMap) -> Option<String> {
    let status = map.get(STATUS_KEY)?.trim();
    (!status.is_empty()).then(|| status.to_string())
}

/// Every header field the extractor knows, each absent when not found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchHeader {
    pub exported_at: Option<NaiveDateTime>,
    pub settlement_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub label: Option<String>,
    pub account: Option<Iban>,
    pub batch_type: Option<String>,
    pub status: Option<String>,
    pub declared_total: Option<f64>,
    pub declared_count: Option<u32>,
}

impl BatchHeader {
    pub fn resolve(map: &MetadataMap, layout: LayoutTag) -> Self {
        let (reference, label) = reference_and_label(map).unzip();
        BatchHeader {
            exported_at: EXPORT_DATE.resolve(map),
            settlement_date: settlement_rule(layout).resolve(map),
            reference,
            label,
            account: account(map),
            batch_type: batch_type(map),
            status: status(map),
            declared_total: DECLARED_TOTAL.resolve(map),
            declared_count: count_rule(layout).resolve(map),
        }
    }
}
