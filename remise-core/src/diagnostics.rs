//! Structured diagnostics collected while parsing, reported at the CLI boundary.

use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::iban::IbanError;
use crate::layout::LayoutTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Why an operation row was left out of its batch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("expected at least 6 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("invalid account {value:?}: {source}")]
    InvalidAccount {
        value: String,
        #[source]
        source: IbanError,
    },
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    EncodingResolved { encoding: String },
    LayoutDetected { layout: LayoutTag },
    NoOperationsTable,
    RowSkipped { line: usize, reason: SkipReason },
    MetadataDefaulted { field: &'static str },
    CountMismatch { declared: u32, parsed: usize },
    FileSkipped { reason: String },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::EncodingResolved { .. } => Severity::Debug,
            DiagnosticKind::LayoutDetected { .. } => Severity::Info,
            DiagnosticKind::MetadataDefaulted { .. } => Severity::Info,
            DiagnosticKind::RowSkipped {
                reason: SkipReason::TooFewFields { .. },
                ..
            } => Severity::Debug,
            DiagnosticKind::RowSkipped { .. } => Severity::Warning,
            DiagnosticKind::NoOperationsTable => Severity::Warning,
            DiagnosticKind::CountMismatch { .. } => Severity::Warning,
            DiagnosticKind::FileSkipped { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::EncodingResolved { encoding } => write!(f, "decoded as {encoding}"),
            DiagnosticKind::LayoutDetected { layout } => write!(f, "detected format: {layout}"),
            DiagnosticKind::NoOperationsTable => write!(f, "no operations table found"),
            DiagnosticKind::RowSkipped { line, reason } => {
                write!(f, "skipping invalid operation at line {line}: {reason}")
            }
            DiagnosticKind::MetadataDefaulted { field } => {
                write!(f, "{field} missing from header, using default")
            }
            DiagnosticKind::CountMismatch { declared, parsed } => write!(
                f,
                "expected {declared} operations but found {parsed} operation lines"
            ),
            DiagnosticKind::FileSkipped { reason } => write!(f, "file skipped: {reason}"),
        }
    }
}

/// One event about one file
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub file: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.kind)
    }
}

/// Collector handed to every parsing step; events are also mirrored to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: impl Into<String>, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            file: file.into(),
            kind,
        };
        match diagnostic.severity() {
            Severity::Debug => debug!("{diagnostic}"),
            Severity::Info => info!("{diagnostic}"),
            Severity::Warning => warn!("{diagnostic}"),
            Severity::Error => error!("{diagnostic}"),
        }
        self.events.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }

    /// Events at or above a severity
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter().filter(move |d| d.severity() >= severity)
    }

    pub fn for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.events.iter().filter(move |d| d.file == file)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }
}
