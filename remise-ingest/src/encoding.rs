//! Text encoding policy for bank exports.
//!
//! The banking portal writes its CSV exports in Windows-1252 whatever the
//! locale, so `.csv` files are never sniffed. Other files go through an
//! [`EncodingDetector`] and fall back to Windows-1252 when it is unsure.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::path::Path;

/// Extensions decoded with the legacy encoding without detection
pub const TABULAR_TEXT_EXTENSIONS: &[&str] = &["csv"];

/// Minimum detector confidence to trust its answer
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

pub fn legacy_encoding() -> &'static Encoding {
    WINDOWS_1252
}

/// A detector's answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub encoding: &'static Encoding,
    pub confidence: f32,
}

/// Statistical encoding detection capability
pub trait EncodingDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection>;
}

/// Detector based on byte-order marks and UTF-8 validity.
///
/// Anything that is neither BOM-marked nor valid UTF-8 gets no answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SniffingDetector;

impl EncodingDetector for SniffingDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection> {
        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            return Some(Detection {
                encoding,
                confidence: 1.0,
            });
        }
        if bytes.is_ascii() {
            return Some(Detection {
                encoding: UTF_8,
                confidence: 1.0,
            });
        }
        if std::str::from_utf8(bytes).is_ok() {
            return Some(Detection {
                encoding: UTF_8,
                confidence: 0.99,
            });
        }
        None
    }
}

pub fn is_tabular_text(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            TABULAR_TEXT_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Decide the encoding of a file. Never fails.
pub fn resolve(path: &Path, bytes: &[u8], detector: &dyn EncodingDetector) -> &'static Encoding {
    if is_tabular_text(path) {
        return legacy_encoding();
    }

    match detector.detect(bytes) {
        Some(detection) if detection.confidence >= CONFIDENCE_THRESHOLD => detection.encoding,
        _ => legacy_encoding(),
    }
}

/// Decode lossily and split into lines without terminators.
pub fn decode_lines(bytes: &[u8], encoding: &'static Encoding) -> Vec<String> {
    let (text, _had_errors) = encoding.decode_with_bom_removal(bytes);
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unsure;

    impl EncodingDetector for Unsure {
        fn detect(&self, _bytes: &[u8]) -> Option<Detection> {
            Some(Detection {
                encoding: UTF_8,
                confidence: 0.4,
            })
        }
    }

    #[test]
    fn test_csv_is_always_windows_1252() {
        let bytes = "Name,Value\nJean,100".as_bytes();
        let enc = resolve(Path::new("test_utf8.csv"), bytes, &SniffingDetector);
        assert_eq!(enc.name(), "windows-1252");

        let enc = resolve(Path::new("EXPORT.CSV"), bytes, &SniffingDetector);
        assert_eq!(enc, WINDOWS_1252);
    }

    #[test]
    fn test_other_extensions_use_detector() {
        let bytes = "Prénom;Montant".as_bytes();
        assert_eq!(resolve(Path::new("notes.txt"), bytes, &SniffingDetector), UTF_8);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        assert_eq!(resolve(Path::new("notes.txt"), b"abc", &Unsure), WINDOWS_1252);
    }

    #[test]
    fn test_undetectable_falls_back() {
        // "Prénom" in ISO-8859-1 is not valid UTF-8
        let bytes = b"Pr\xe9nom;Montant";
        assert_eq!(resolve(Path::new("notes.txt"), bytes, &SniffingDetector), WINDOWS_1252);
    }

    #[test]
    fn test_decode_lines_handles_crlf_and_accents() {
        let (bytes, _, _) = WINDOWS_1252.encode("Débiteur;Référence\r\nFrançois;Hélène\r\n");
        let lines = decode_lines(&bytes, WINDOWS_1252);
        assert_eq!(lines, vec!["Débiteur;Référence", "François;Hélène"]);
    }

    #[test]
    fn test_utf8_read_as_legacy_gives_mojibake() {
        let lines = decode_lines("Prénom".as_bytes(), WINDOWS_1252);
        assert_eq!(lines, vec!["PrÃ©nom"]);
    }
}
