// tests/scan/scan_test.rs
use std::cell::RefCell;
use std::fs;
use std::path::Path;

use schemalens::config::ScanSettings;
use schemalens::scan::*;
use schemalens::semantic::SemanticType;

fn write(dir: &Path, name: &str, content: &[u8]) {
    fs::write(dir.join(name), content).unwrap();
}

fn erp_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Cliente.csv",
        b"\xEF\xBB\xBFClienteID,Nome,Ativo,DataCadastro\n1,Ana,S,2023-01-05\n2,Bia,N,2023-02-10\n3,Caio,S,\n",
    );
    write(
        dir.path(),
        "Pedido.csv",
        b"PedidoID,ClienteID,Valor\n10,1,\"1.234,50\"\n11,1,99\n12,3,10\n13,2,7",
    );
    write(dir.path(), "Quebrada.csv", b"Cliente\xFF\xFEID,Nome\n1,Ana\n");
    write(dir.path(), "Utf16.csv", b"\xFF\xFEI\x00D\x00\n\x00");
    write(dir.path(), "Vazia.csv", b"");
    write(dir.path(), "leiame.txt", b"not a table");
    dir
}

#[test]
fn test_scan_profiles_every_table_file() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();

    assert_eq!(
        profiles.names().collect::<Vec<_>>(),
        ["Cliente", "Pedido", "Quebrada", "Utf16", "Vazia"]
    );
    assert_eq!(profiles.valid().count(), 2);
    assert_eq!(profiles.failed().count(), 3);
}

#[test]
fn test_bom_is_skipped_before_counting() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();
    let cliente = profiles.get("Cliente").unwrap();

    assert_eq!(cliente.row_count, Some(3));
    assert_eq!(cliente.columns[0], "ClienteID");
    assert!((cliente.null_rate["DataCadastro"] - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(cliente.unique_count["Ativo"], 2);
}

#[test]
fn test_row_count_without_trailing_newline() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();
    assert_eq!(profiles.get("Pedido").unwrap().row_count, Some(4));
}

#[test]
fn test_failures_are_recorded_not_raised() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();

    let quebrada = profiles.get("Quebrada").unwrap();
    assert!(quebrada.is_error());
    assert!(quebrada.error.as_deref().unwrap().contains("invalid UTF-8"));
    assert!(quebrada.columns.is_empty());
    assert_eq!(quebrada.row_count, None);

    let utf16 = profiles.get("Utf16").unwrap();
    assert!(utf16.error.as_deref().unwrap().contains("UTF-16"));

    let vazia = profiles.get("Vazia").unwrap();
    assert!(vazia.error.as_deref().unwrap().contains("No header"));
}

#[test]
fn test_annotations_follow_columns() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();
    let cliente = profiles.get("Cliente").unwrap();

    assert_eq!(cliente.annotation("ClienteID").unwrap().semantic_type, SemanticType::Id);
    assert_eq!(cliente.annotation("DataCadastro").unwrap().semantic_type, SemanticType::Date);
    assert_eq!(cliente.annotation("Ativo").unwrap().semantic_type, SemanticType::Boolean);

    let pedido = profiles.get("Pedido").unwrap();
    assert_eq!(pedido.annotation("Valor").unwrap().semantic_type, SemanticType::Currency);
}

#[test]
fn test_progress_reports_every_file() {
    let dir = erp_dir();
    let seen = RefCell::new(Vec::new());
    let observer = |processed: usize, total: usize, table: &str| {
        seen.borrow_mut().push((processed, total, table.to_string()));
    };
    scan_directory(dir.path(), &ScanSettings::default(), &observer).unwrap();

    let seen = seen.into_inner();
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[0], (1, 5, "Cliente".to_string()));
    assert_eq!(seen[4].0, 5);
}

#[test]
fn test_max_tables_bounds_the_pass() {
    let dir = erp_dir();
    let settings = ScanSettings {
        max_tables: Some(2),
        ..ScanSettings::default()
    };
    let profiles = scan_directory(dir.path(), &settings, &NoProgress).unwrap();
    assert_eq!(profiles.len(), 2);
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = scan_directory(&dir.path().join("nada"), &ScanSettings::default(), &NoProgress);
    assert!(matches!(result, Err(ScanError::DirectoryNotFound(_))));
}

#[test]
fn test_profile_json_reuse() {
    let dir = erp_dir();
    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("profiles.json");
    profiles.save_json(&path).unwrap();
    assert_eq!(ProfileSet::load_json(&path).unwrap(), profiles);
}
