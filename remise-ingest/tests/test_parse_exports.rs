use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use remise_core::{DiagnosticKind, Diagnostics, LayoutTag, Severity};
use remise_ingest::{IngestError, ParseOptions, parse_remittance, parse_remittance_as};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PRELEVEMENTS: &str = "DATE DE L´EXPORT :;06/05/2025 14:42:10
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

const VIREMENTS: &str = "DATE DE L´EXPORT :;06/05/2025 14:40:13
ECRAN :;LISTE DES OPERATIONS D´UNE REMISE;
REF : FR59ZZZ86395E-412546;LIBELLE : PASS *0308*
COMPTE : FR76 3000 4008 2800 0133 0030 876;TYPE : Virement SEPA
STATUT : A valider;

Exécution le :;07/05/2025
Montant total :;1272,83 EUR
Contre valeur en euro à titre indicatif :;1272,83
Nombre de virement(s) :;2

Liste des opérations
Bénéficiaire;Référence du paiement;Compte;Montant;Devise;Statut
La Vie Claire;0021-82482310800017-DEC-0525-15595;FR76 1680 7000 0636 5823 6121 865;94,35;EUR;Accepté;
La Boucherie Gourmande;0021-88060975500017-DEC-0525-15596;FR76 1680 7000 0836 5998 4921 643;10,53;EUR;Accepté;
";

/// Write a fixture the way the banking portal does: Windows-1252, CRLF
fn write_export(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let crlf = content.replace('\n', "\r\n");
    let (bytes, _, had_errors) = WINDOWS_1252.encode(&crlf);
    assert!(!had_errors, "fixture must be representable in windows-1252");
    std::fs::write(&path, &bytes).unwrap();
    path
}

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn options() -> ParseOptions {
    ParseOptions {
        now: Some(fixed_now()),
        ..ParseOptions::default()
    }
}

fn parse(path: &Path) -> (remise_core::Remittance, Diagnostics) {
    let mut diags = Diagnostics::new();
    let remittance = parse_remittance(path, &options(), &mut diags).expect("should parse");
    (remittance, diags)
}

#[test]
fn test_prelevements_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(&dir, "LISTE_OPERATIONS_PRELEVEMENTS.csv", PRELEVEMENTS);
    let (remittance, diags) = parse(&path);

    assert_eq!(remittance.layout(), Some(LayoutTag::DirectDebit));
    assert_eq!(remittance.file.encoding.as_deref(), Some("windows-1252"));
    assert_eq!(remittance.declared_total, 285.30);
    assert_eq!(remittance.declared_count, 2);
    assert_eq!(remittance.operations.len(), 2);
    assert_eq!(remittance.reference, "FR59ZZZ86395E");
    assert_eq!(remittance.label, "PRINC. *5264*");
    assert_eq!(remittance.batch_type, "Prélèvement standard");
    assert_eq!(
        remittance.exported_at,
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(14, 42, 10)
            .unwrap()
    );
    assert_eq!(
        remittance.settlement_date,
        NaiveDate::from_ymd_opt(2025, 5, 7).unwrap()
    );
    assert_ne!(remittance.exported_at.date(), remittance.settlement_date);

    let first = &remittance.operations[0];
    assert_eq!(first.name, "Viet To Wok");
    assert_eq!(first.code(), Some("ABO"));
    assert_eq!(remittance.operations[1].amount, 15.3);
    assert_eq!(remittance.accepted_count(), 2);

    assert!(diags.iter().any(|d| d.kind
        == DiagnosticKind::LayoutDetected {
            layout: LayoutTag::DirectDebit
        }));
    assert_eq!(diags.at_least(Severity::Warning).count(), 0);
}

#[test]
fn test_virements_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(&dir, "LISTE_OPERATIONS_VIREMENTS.csv", VIREMENTS);
    let (remittance, diags) = parse(&path);

    assert_eq!(remittance.layout(), Some(LayoutTag::Transfer));
    assert_eq!(remittance.declared_total, 1272.83);
    assert_eq!(remittance.declared_count, 2);
    assert_eq!(remittance.operations.len(), 2);
    assert_eq!(remittance.reference, "FR59ZZZ86395E");
    assert_eq!(remittance.label, "PASS *0308*");
    assert_eq!(remittance.account.as_str(), "FR7630004008280001330030876");
    assert_eq!(remittance.batch_type, "Virement SEPA");
    assert_eq!(remittance.status, "A valider");
    assert_eq!(
        remittance.settlement_date,
        NaiveDate::from_ymd_opt(2025, 5, 7).unwrap()
    );
    assert_eq!(remittance.operations[0].name, "La Vie Claire");
    assert_eq!(remittance.operations[0].code(), Some("DEC"));
    assert_eq!(remittance.operations[1].amount, 10.53);
    assert_eq!(diags.at_least(Severity::Warning).count(), 0);
}

#[test]
fn test_declared_count_mismatch_is_surfaced_not_fixed() {
    let dir = tempfile::tempdir().unwrap();
    let content = PRELEVEMENTS.replace("Nombre de prélèvement(s) :;2", "Nombre de prélèvement(s) :;5");
    let path = write_export(&dir, "mismatch.csv", &content);
    let (remittance, diags) = parse(&path);

    assert_eq!(remittance.declared_count, 5);
    assert_eq!(remittance.operations.len(), 2);
    let mismatch = remittance.count_mismatch().unwrap();
    assert_eq!((mismatch.declared, mismatch.parsed), (5, 2));

    let warnings: Vec<_> = diags.at_least(Severity::Warning).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].kind.to_string(),
        "expected 5 operations but found 2 operation lines"
    );
}

#[test]
fn test_invalid_content_still_yields_a_remittance() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(&dir, "invalid.csv", "Invalid CSV content without proper structure");
    let (remittance, diags) = parse(&path);

    assert!(remittance.operations.is_empty());
    assert_eq!(remittance.layout(), Some(LayoutTag::DirectDebit));
    assert_eq!(remittance.exported_at, fixed_now());
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::NoOperationsTable));
}

#[test]
fn test_parsing_twice_gives_equal_remittances() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(&dir, "virements.csv", VIREMENTS);

    // Real clock: every date comes from the file, so nothing may differ
    let mut diags = Diagnostics::new();
    let first = parse_remittance(&path, &ParseOptions::default(), &mut diags).unwrap();
    let second = parse_remittance(&path, &ParseOptions::default(), &mut diags).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_forced_layout_overrides_classifier() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(&dir, "virements.csv", VIREMENTS);

    let mut diags = Diagnostics::new();
    let remittance =
        parse_remittance_as(&path, LayoutTag::DirectDebit, &options(), &mut diags).unwrap();

    // No "Débiteur" header in a transfer export
    assert_eq!(remittance.layout(), Some(LayoutTag::DirectDebit));
    assert!(remittance.operations.is_empty());
    assert_eq!(remittance.settlement_date, fixed_now().date());
}

#[test]
fn test_non_csv_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remise.xlsx");
    std::fs::write(&path, b"PK\x03\x04").unwrap();

    let err = parse_remittance(&path, &options(), &mut Diagnostics::new()).unwrap_err();
    assert!(matches!(err, IngestError::NoText { .. }));
}
