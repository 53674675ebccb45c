//! Reading one export file into a [`FileRecord`].

use remise_core::{FileRecord, human_size};
use std::fs;
use std::path::Path;

use crate::encoding::{self, EncodingDetector};
use crate::error::IngestError;

/// Read the file once and describe it. Only tabular text exports are decoded;
/// other files get no encoding and no lines.
pub fn read_file_record(
    path: &Path,
    detector: &dyn EncodingDetector,
) -> Result<FileRecord, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let (encoding, raw_lines) = if encoding::is_tabular_text(path) {
        let enc = encoding::resolve(path, &bytes, detector);
        (
            Some(enc.name().to_string()),
            Some(encoding::decode_lines(&bytes, enc)),
        )
    } else {
        (None, None)
    };

    Ok(FileRecord {
        name,
        path: absolute,
        size: human_size(bytes.len() as u64),
        extension,
        encoding,
        raw_lines,
        layout: None,
    })
}
