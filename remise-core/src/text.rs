//! Text helpers shared by the classifier, the metadata extractor and the reports.

/// Filename prefix the banking portal puts on every export.
pub const DISPLAY_PREFIX: &str = "LISTE_OPERATIONS_";

/// Lowercase and strip French diacritics so "Échéance" and "echeance" compare equal.
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => out.push('a'),
            'ç' => out.push('c'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' | 'ì' => out.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ÿ' | 'ý' => out.push('y'),
            'ñ' => out.push('n'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            _ => out.push(c),
        }
    }
    out
}

/// Parse an amount written with the French decimal comma ("15,3" -> 15.3).
///
/// Only surrounding whitespace is tolerated; NaN and infinities are rejected.
pub fn parse_french_amount(s: &str) -> Option<f64> {
    let normalized = s.trim().replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Strip the portal's `LISTE_OPERATIONS_` prefix for display.
pub fn strip_filename_prefix(filename: &str) -> &str {
    strip_prefix_with(filename, DISPLAY_PREFIX)
}

/// Same as [`strip_filename_prefix`] with a configurable prefix.
pub fn strip_prefix_with<'a>(filename: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return filename;
    }
    filename.strip_prefix(prefix).unwrap_or(filename)
}
