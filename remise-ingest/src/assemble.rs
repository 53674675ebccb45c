//! Combine header fields and operation rows into one [`Remittance`] per file.

use chrono::{Local, NaiveDateTime};
use remise_core::{
    DiagnosticKind, Diagnostics, FileRecord, Iban, LayoutTag, Operation, Remittance, fold,
};
use std::sync::OnceLock;

use crate::metadata::{BatchHeader, build_metadata};
use crate::rows::parse_row;

pub const FALLBACK_ACCOUNT: &str = "FR7630004008280001330030876";
pub const DEFAULT_BATCH_TYPE: &str = "Prélèvement standard";
pub const DEFAULT_STATUS: &str = "A valider";

fn fallback_account() -> &'static Iban {
    static ACCOUNT: OnceLock<Iban> = OnceLock::new();
    ACCOUNT.get_or_init(|| {
        FALLBACK_ACCOUNT
            .parse()
            .expect("built-in fallback account is a valid IBAN")
    })
}

/// Index of the operations table header for a layout (accent-insensitive).
///
/// Direct debit: "Débiteur" and "Référence". Transfer: "Bénéficiaire" and
/// "Référence" or "paiement".
pub fn find_operations_header(lines: &[String], layout: LayoutTag) -> Option<usize> {
    lines.iter().position(|line| {
        let folded = fold(line.trim());
        match layout {
            LayoutTag::DirectDebit => folded.contains("debiteur") && folded.contains("reference"),
            LayoutTag::Transfer => {
                folded.contains("beneficiaire")
                    && (folded.contains("reference") || folded.contains("paiement"))
            }
        }
    })
}

/// Defaults applied to header fields the file does not declare
#[derive(Debug, Clone, PartialEq)]
pub struct Assembler {
    pub fallback_account: Iban,
    pub default_batch_type: String,
    pub default_status: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            fallback_account: fallback_account().clone(),
            default_batch_type: DEFAULT_BATCH_TYPE.to_string(),
            default_status: DEFAULT_STATUS.to_string(),
        }
    }
}

impl Assembler {
    /// Build a remittance with the local clock as the default for missing dates
    pub fn assemble(
        &self,
        file: FileRecord,
        layout: LayoutTag,
        diags: &mut Diagnostics,
    ) -> Remittance {
        self.assemble_at(file, layout, Local::now().naive_local(), diags)
    }

    /// Never fails: malformed input yields a remittance with zero operations.
    pub fn assemble_at(
        &self,
        file: FileRecord,
        layout: LayoutTag,
        now: NaiveDateTime,
        diags: &mut Diagnostics,
    ) -> Remittance {
        let file = file.with_layout_if_absent(layout);
        let name = file.name.clone();
        let lines = file.lines();

        let header_idx = find_operations_header(lines, layout);
        if header_idx.is_none() {
            diags.push(&name, DiagnosticKind::NoOperationsTable);
        }
        let metadata_end = header_idx.unwrap_or(lines.len());

        let mut operations: Vec<Operation> = Vec::new();
        if let Some(idx) = header_idx {
            for (offset, line) in lines[idx + 1..].iter().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_row(line) {
                    Ok(op) => operations.push(op),
                    Err(reason) => diags.push(
                        &name,
                        DiagnosticKind::RowSkipped {
                            // 1-based line number in the file
                            line: idx + offset + 2,
                            reason,
                        },
                    ),
                }
            }
        }

        let metadata = build_metadata(&lines[..metadata_end]);
        let header = BatchHeader::resolve(&metadata, layout);

        let mut defaulted = |field: &'static str| {
            diags.push(&name, DiagnosticKind::MetadataDefaulted { field });
        };

        let exported_at = header.exported_at.unwrap_or_else(|| {
            defaulted("export date");
            now
        });
        let settlement_date = header.settlement_date.unwrap_or_else(|| {
            defaulted("settlement date");
            now.date()
        });
        let account = header.account.unwrap_or_else(|| {
            defaulted("account");
            self.fallback_account.clone()
        });
        let batch_type = header.batch_type.unwrap_or_else(|| {
            defaulted("batch type");
            self.default_batch_type.clone()
        });
        let status = header.status.unwrap_or_else(|| {
            defaulted("status");
            self.default_status.clone()
        });
        let declared_total = header.declared_total.unwrap_or_else(|| {
            defaulted("declared total");
            operations.iter().map(|op| op.amount).sum()
        });
        let declared_count = header.declared_count.unwrap_or_else(|| {
            defaulted("operation count");
            0
        });

        let remittance = Remittance {
            exported_at,
            settlement_date,
            reference: header.reference.unwrap_or_default(),
            label: header.label.unwrap_or_default(),
            account,
            batch_type,
            status,
            declared_total,
            declared_count,
            operations,
            file,
        };

        if let Some(mismatch) = remittance.count_mismatch() {
            diags.push(
                &name,
                DiagnosticKind::CountMismatch {
                    declared: mismatch.declared,
                    parsed: mismatch.parsed,
                },
            );
        }

        remittance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use remise_core::{Severity, SkipReason};
    use std::path::PathBuf;

    fn record(text: &str) -> FileRecord {
        FileRecord {
            name: "LISTE_OPERATIONS_TEST.csv".to_string(),
            path: PathBuf::from("/tmp/LISTE_OPERATIONS_TEST.csv"),
            size: "1 bytes".to_string(),
            extension: ".csv".to_string(),
            encoding: Some("windows-1252".to_string()),
            raw_lines: Some(text.lines().map(str::to_string).collect()),
            layout: None,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    const DIRECT_DEBIT: &str = "DATE DE L´EXPORT :;06/05/2025 14:42:10
ECRAN :;LISTE DES OPERATIONS D´UNE REMISE;
REF : FR59ZZZ86395E-412556;LIBELLE : PRINC. *5264*
COMPTE : FR76 3000 4008 2800 0132 9526 476;TYPE : Prélèvement standard
STATUT : A valider

Echéance le :;07/05/2025
Montant total :;285,30 EUR
Nombre de prélèvement(s) :;2

Liste des opérations
Débiteur;Référence;Compte ;Montant;Devise;Statut
Viet To Wok;0022-83858785500019-ABO-0525-15719;FR76 3000 3014 5000 0270 3328 526;27;EUR;Accepté;
Bijouterie L'Or en Scene Centre-Ville;0022-39828770600038-ABO-0525-15722;FR76 3000 4003 3600 0101 1190 332;15,3;EUR;Accepté;
";

    #[test]
    fn test_assembles_direct_debit_batch() {
        let mut diags = Diagnostics::new();
        let remittance =
            Assembler::default().assemble_at(record(DIRECT_DEBIT), LayoutTag::DirectDebit, now(), &mut diags);

        assert_eq!(remittance.layout(), Some(LayoutTag::DirectDebit));
        assert_eq!(remittance.declared_total, 285.30);
        assert_eq!(remittance.declared_count, 2);
        assert_eq!(remittance.operations.len(), 2);
        assert_eq!(remittance.reference, "FR59ZZZ86395E");
        assert_eq!(remittance.label, "PRINC. *5264*");
        assert_eq!(remittance.account.as_str(), "FR7630004008280001329526476");
        assert_eq!(remittance.status, "A valider");
        assert_eq!(
            remittance.settlement_date,
            NaiveDate::from_ymd_opt(2025, 5, 7).unwrap()
        );
        assert!(remittance.count_mismatch().is_none());
        assert_eq!(diags.at_least(Severity::Info).count(), 0);
    }

    #[test]
    fn test_header_row_is_not_metadata() {
        let lines: Vec<String> = DIRECT_DEBIT.lines().map(str::to_string).collect();
        let idx = find_operations_header(&lines, LayoutTag::DirectDebit).unwrap();
        assert!(lines[idx].starts_with("Débiteur"));
        assert_eq!(find_operations_header(&lines, LayoutTag::Transfer), None);
    }

    #[test]
    fn test_missing_table_and_metadata_use_defaults() {
        let mut diags = Diagnostics::new();
        let remittance = Assembler::default().assemble_at(
            record("Invalid CSV content without proper structure"),
            LayoutTag::DirectDebit,
            now(),
            &mut diags,
        );

        assert!(remittance.operations.is_empty());
        assert_eq!(remittance.exported_at, now());
        assert_eq!(remittance.settlement_date, now().date());
        assert_eq!(remittance.account.as_str(), FALLBACK_ACCOUNT);
        assert_eq!(remittance.batch_type, DEFAULT_BATCH_TYPE);
        assert_eq!(remittance.status, DEFAULT_STATUS);
        assert_eq!(remittance.declared_total, 0.0);
        assert_eq!(remittance.declared_count, 0);
        assert_eq!(remittance.reference, "");
        assert!(
            diags
                .iter()
                .any(|d| d.kind == DiagnosticKind::NoOperationsTable)
        );
        assert!(diags.iter().all(|d| !matches!(d.kind, DiagnosticKind::CountMismatch { .. })));
    }

    #[test]
    fn test_bad_rows_are_skipped_with_reason() {
        let text = "Débiteur;Référence;Compte;Montant;Devise;Statut
A;R-ABO-1;FR76 3000 3014 5000 0270 3328 526;12,5;EUR;Accepté
B;R-ABO-2;FR76 0000;12,5;EUR;Accepté
C;R-ABO-3;FR76 3000 4003 3600 0101 1190 332;n/a;EUR;Rejeté
short;line";
        let mut diags = Diagnostics::new();
        let remittance =
            Assembler::default().assemble_at(record(text), LayoutTag::DirectDebit, now(), &mut diags);

        assert_eq!(remittance.operations.len(), 1);
        // Missing total falls back to the sum of parsed amounts
        assert_eq!(remittance.declared_total, 12.5);

        let skipped: Vec<(usize, &SkipReason)> = diags
            .iter()
            .filter_map(|d| match &d.kind {
                DiagnosticKind::RowSkipped { line, reason } => Some((*line, reason)),
                _ => None,
            })
            .collect();
        assert_eq!(skipped.len(), 3);
        assert_eq!(skipped[0].0, 3);
        assert!(matches!(skipped[0].1, SkipReason::InvalidAccount { .. }));
        assert!(matches!(skipped[1].1, SkipReason::InvalidAmount(_)));
        assert_eq!(*skipped[2].1, SkipReason::TooFewFields { found: 2 });
    }

    #[test]
    fn test_count_mismatch_is_kept_and_reported() {
        let text = DIRECT_DEBIT.replace("Nombre de prélèvement(s) :;2", "Nombre de prélèvement(s) :;5");
        let mut diags = Diagnostics::new();
        let remittance =
            Assembler::default().assemble_at(record(&text), LayoutTag::DirectDebit, now(), &mut diags);

        assert_eq!(remittance.declared_count, 5);
        assert_eq!(remittance.operations.len(), 2);
        assert!(
            diags
                .iter()
                .any(|d| d.kind == DiagnosticKind::CountMismatch { declared: 5, parsed: 2 })
        );
    }

    #[test]
    fn test_existing_layout_tag_is_kept() {
        let mut file = record(DIRECT_DEBIT);
        file.layout = Some(LayoutTag::Transfer);
        let remittance =
            Assembler::default().assemble_at(file, LayoutTag::DirectDebit, now(), &mut Diagnostics::new());
        assert_eq!(remittance.layout(), Some(LayoutTag::Transfer));
    }

    #[test]
    fn test_configured_defaults() {
        let assembler = Assembler {
            fallback_account: "DE89 3704 0044 0532 0130 00".parse().unwrap(),
            default_batch_type: "Virement SEPA".to_string(),
            default_status: "Inconnu".to_string(),
        };
        let remittance =
            assembler.assemble_at(record(""), LayoutTag::Transfer, now(), &mut Diagnostics::new());
        assert_eq!(remittance.account.as_str(), "DE89370400440532013000");
        assert_eq!(remittance.batch_type, "Virement SEPA");
        assert_eq!(remittance.status, "Inconnu");
    }
}
