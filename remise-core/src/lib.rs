//! remise-core: data model and pure helpers for French bank remittance exports

pub mod diagnostics;
pub mod iban;
pub mod layout;
pub mod model;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, SkipReason};
pub use iban::{Iban, IbanError};
pub use layout::LayoutTag;
pub use model::{
    ACCEPTED_STATUS, CountMismatch, FileRecord, Operation, Remittance, human_size, operation_code,
};
pub use text::{DISPLAY_PREFIX, fold, parse_french_amount, strip_filename_prefix, strip_prefix_with};
