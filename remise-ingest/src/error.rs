use std::path::PathBuf;
use thiserror::Error;

/// Why a file produced no remittance at all
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{name}: no decodable text (only .csv exports are read as text)")]
    NoText { name: String },
}
