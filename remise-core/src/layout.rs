//! The two known remittance export layouts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which export layout a file uses.
///
/// Direct-debit batches ("prélèvements") pull funds from debtors and carry an
/// "Echéance le" due date; transfer batches ("virements") push funds to
/// beneficiaries and carry an "Exécution le" execution date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LayoutTag {
    #[serde(rename = "prelevements")]
    DirectDebit,
    #[serde(rename = "virements")]
    Transfer,
}

impl LayoutTag {
    pub const ALL: [LayoutTag; 2] = [LayoutTag::DirectDebit, LayoutTag::Transfer];

    /// Stable tag written to reports and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutTag::DirectDebit => "prelevements",
            LayoutTag::Transfer => "virements",
        }
    }

    /// Human-readable French label
    pub fn label(&self) -> &'static str {
        match self {
            LayoutTag::DirectDebit => "Prélèvements",
            LayoutTag::Transfer => "Virements",
        }
    }

    /// Parse a stable tag back, accepting the labels too
    pub fn parse(s: &str) -> Option<LayoutTag> {
        match crate::text::fold(s.trim()).as_str() {
            "prelevements" | "prelevement" | "direct_debit" => Some(LayoutTag::DirectDebit),
            "virements" | "virement" | "transfer" => Some(LayoutTag::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
