//! Weighted keyword evidence deciding which export layout a file uses.

use remise_core::{LayoutTag, fold};

/// One piece of evidence: fires when every group has at least one of its
/// terms somewhere in the folded content.
struct Evidence {
    all_of: &'static [&'static [&'static str]],
    layout: LayoutTag,
    weight: u32,
}

const EVIDENCE: &[Evidence] = &[
    Evidence {
        all_of: &[&["beneficiaire"]],
        layout: LayoutTag::Transfer,
        weight: 2,
    },
    Evidence {
        all_of: &[&["debiteur"]],
        layout: LayoutTag::DirectDebit,
        weight: 2,
    },
    Evidence {
        all_of: &[&["execution"], &["le"]],
        layout: LayoutTag::Transfer,
        weight: 1,
    },
    Evidence {
        all_of: &[&["echeance"], &["le"]],
        layout: LayoutTag::DirectDebit,
        weight: 1,
    },
    Evidence {
        all_of: &[&["virement"]],
        layout: LayoutTag::Transfer,
        weight: 1,
    },
    Evidence {
        // "prelement" is a typo some exports carry
        all_of: &[&["prelevement", "prelement"]],
        layout: LayoutTag::DirectDebit,
        weight: 1,
    },
];

impl Evidence {
    fn fires(&self, content: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|term| content.contains(term)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub direct_debit: u32,
    pub transfer: u32,
}

impl Scores {
    /// Transfer only on a strictly higher score; ties (and no evidence at all)
    /// go to direct debit.
    pub fn winner(&self) -> LayoutTag {
        if self.transfer > self.direct_debit {
            LayoutTag::Transfer
        } else {
            LayoutTag::DirectDebit
        }
    }
}

pub fn score(lines: &[String]) -> Scores {
    let content = fold(&lines.join("\n"));
    EVIDENCE
        .iter()
        .filter(|e| e.fires(&content))
        .fold(Scores::default(), |mut scores, e| {
            match e.layout {
                LayoutTag::DirectDebit => scores.direct_debit += e.weight,
                LayoutTag::Transfer => scores.transfer += e.weight,
            }
            scores
        })
}

pub fn classify(lines: &[String]) -> LayoutTag {
    score(lines).winner()
}
