// tests/cache/cache_test.rs
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use polars::prelude::DataType;
use schemalens::cache::*;
use schemalens::config::{CacheSettings, CacheValidity, ScanSettings};
use schemalens::scan::{scan_directory, NoProgress, ProfileSet};

struct Fixture {
    _dir: tempfile::TempDir,
    data: PathBuf,
    artifacts: PathBuf,
    profiles: ProfileSet,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    let mut cliente = String::from("ClienteID,Nome,UF,Limite\n");
    for i in 1..=40 {
        let uf = ["SP", "RJ", "MG", "BA"][i % 4];
        writeln!(cliente, "{i},Cliente {i},{uf},\"{i}00,50\"").unwrap();
    }
    fs::write(data.join("Cliente.csv"), cliente).unwrap();
    fs::write(data.join("Quebrada.csv"), b"\xFF\xFEx\x00").unwrap();

    let profiles = scan_directory(&data, &ScanSettings::default(), &NoProgress).unwrap();
    Fixture {
        artifacts: dir.path().join("artifacts"),
        data,
        profiles,
        _dir: dir,
    }
}

fn manager(fx: &Fixture) -> CacheManager {
    let cache = CacheManager::new(&fx.artifacts, CacheSettings::default());
    cache.register(&fx.profiles);
    cache
}

fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn column_names(df: &polars::prelude::DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_full_load_round_trip_matches_scan() {
    let fx = fixture();
    let cache = manager(&fx);
    let profile = fx.profiles.get("Cliente").unwrap();

    let df = cache.load("Cliente", &LoadRequest::full()).unwrap();
    assert_eq!(df.height() as u64, profile.rows());
    assert_eq!(column_names(&df), profile.columns);

    // a fresh manager reads the persisted artifact
    let again = manager(&fx).load("Cliente", &LoadRequest::full()).unwrap();
    assert!(df.equals_missing(&again));
}

#[test]
fn test_full_artifact_narrows_numeric_columns() {
    let fx = fixture();
    let df = manager(&fx).load("Cliente", &LoadRequest::full()).unwrap();

    assert!(df.column("ClienteID").unwrap().dtype().is_integer());
    // decimal-comma values stay text
    assert_eq!(df.column("Limite").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_projection_reads_only_requested_columns() {
    let fx = fixture();
    let cache = manager(&fx);
    let df = cache
        .load("Cliente", &LoadRequest::full().with_columns(["UF", "ClienteID"]))
        .unwrap();
    assert_eq!(df.width(), 2);
    assert_eq!(df.height(), 40);
}

#[test]
fn test_filters() {
    let fx = fixture();
    let cache = manager(&fx);

    let range = cache
        .load("Cliente", &LoadRequest::full().with_filter(Filter::range("ClienteID", 5i64, 14i64)))
        .unwrap();
    assert_eq!(range.height(), 10);

    let members = cache
        .load("Cliente", &LoadRequest::full().with_filter(Filter::is_in("UF", ["SP", "RJ"])))
        .unwrap();
    assert_eq!(members.height(), 20);

    let combined = cache
        .load(
            "Cliente",
            &LoadRequest::full()
                .with_filter(Filter::equal("UF", "SP"))
                .with_filter(Filter::range("ClienteID", 1i64, 20i64)),
        )
        .unwrap();
    assert_eq!(combined.height(), 5);
}

#[test]
fn test_filter_on_missing_column_is_ignored() {
    let fx = fixture();
    let df = manager(&fx)
        .load("Cliente", &LoadRequest::full().with_filter(Filter::equal("Email", "x")))
        .unwrap();
    assert_eq!(df.height(), 40);
}

#[test]
fn test_seeded_sample_is_reproducible() {
    let fx = fixture();
    let first = manager(&fx).load("Cliente", &LoadRequest::sample(7)).unwrap();
    assert_eq!(first.height(), 7);

    let cache = manager(&fx);
    cache.purge_artifacts(None).unwrap();
    let rebuilt = cache.load("Cliente", &LoadRequest::sample(7)).unwrap();
    assert!(first.equals_missing(&rebuilt));
}

#[test]
fn test_sample_larger_than_table() {
    let fx = fixture();
    let df = manager(&fx).load("Cliente", &LoadRequest::sample(500)).unwrap();
    assert_eq!(df.height(), 40);
}

#[test]
fn test_memory_cache_counts_hits_and_misses() {
    let fx = fixture();
    let cache = manager(&fx);
    let request = LoadRequest::sample(5).with_columns(["Nome"]);

    cache.load("Cliente", &request).unwrap();
    cache.load("Cliente", &request).unwrap();
    cache.load("Cliente", &LoadRequest::sample(5)).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.memory_entries, 2);
    assert_eq!(stats.tables["Cliente"].columns_loaded, 4);
}

#[test]
fn test_error_and_unknown_tables() {
    let fx = fixture();
    let cache = manager(&fx);

    match cache.load("Quebrada", &LoadRequest::full()) {
        Err(CacheError::Unavailable { table, reason }) => {
            assert_eq!(table, "Quebrada");
            assert!(reason.contains("UTF-16"));
        }
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert!(matches!(
        cache.load("Fantasma", &LoadRequest::full()),
        Err(CacheError::NotFound { .. })
    ));
}

#[test]
fn test_conversion_failure_names_the_file() {
    let fx = fixture();
    let cache = manager(&fx);
    fs::write(fx.data.join("Cliente.csv"), b"ClienteID,Nome\n1,\xFF\n").unwrap();

    match cache.load("Cliente", &LoadRequest::full()) {
        Err(CacheError::ConversionFailed { path, .. }) => {
            assert_eq!(path, fx.data.join("Cliente.csv"));
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
    assert!(!fx.artifacts.join("Cliente.parquet").exists());
}

#[test]
fn test_concurrent_loads_convert_once() {
    let fx = fixture();
    let cache = manager(&fx);

    let frames: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| cache.load("Cliente", &LoadRequest::full()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(frames.windows(2).all(|w| w[0].equals_missing(&w[1])));
    let artifacts: Vec<_> = fs::read_dir(&fx.artifacts).unwrap().collect();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(cache.stats().conversions, 1);
}

#[test]
fn test_clear_is_always_safe() {
    let fx = fixture();
    let cache = manager(&fx);
    cache.clear(None);
    cache.clear(Some("Cliente"));

    cache.load("Cliente", &LoadRequest::full()).unwrap();
    cache.clear(None);
    assert_eq!(cache.stats().memory_entries, 0);
    assert!(cache.artifact_path("Cliente", LoadMode::Full).exists());
}

#[test]
fn test_long_numeric_keys_stay_text() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    let mut notas = String::from("ChaveNfe,Valor\n");
    for i in 0..30u64 {
        writeln!(notas, "3523011234567800019055001000012345{i:010},{i}.25").unwrap();
    }
    fs::write(data.join("NotaFiscal.csv"), notas).unwrap();

    let profiles = scan_directory(&data, &ScanSettings::default(), &NoProgress).unwrap();
    let cache = CacheManager::new(dir.path().join("artifacts"), CacheSettings::default());
    cache.register(&profiles);

    let df = cache.load("NotaFiscal", &LoadRequest::full()).unwrap();
    let keys = df.column("ChaveNfe").unwrap();
    assert_eq!(keys.dtype(), &DataType::String);
    assert_eq!(keys.n_unique().unwrap(), 30);
    assert_eq!(
        keys.str().unwrap().get(7),
        Some("35230112345678000190550010000123450000000007")
    );
    assert_eq!(df.column("Valor").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_source_modified_rebuilds_after_edit() {
    let fx = fixture();
    let settings = CacheSettings {
        validity: CacheValidity::SourceModified,
        ..CacheSettings::default()
    };
    let cache = CacheManager::new(&fx.artifacts, settings);
    cache.register(&fx.profiles);

    assert_eq!(cache.load("Cliente", &LoadRequest::full()).unwrap().height(), 40);
    assert_eq!(cache.stats().conversions, 1);

    // edited after the scan; the existing artifact predates the edit
    let mut cliente = String::from("ClienteID,Nome,UF,Limite\n");
    for i in 1..=5 {
        writeln!(cliente, "{i},Cliente {i},SP,\"{i}00,50\"").unwrap();
    }
    fs::write(fx.data.join("Cliente.csv"), cliente).unwrap();
    let artifact = cache.artifact_path("Cliente", LoadMode::Full);
    set_mtime(&artifact, SystemTime::now() - Duration::from_secs(60));

    cache.clear(None);
    assert_eq!(cache.load("Cliente", &LoadRequest::full()).unwrap().height(), 5);
    assert_eq!(cache.stats().conversions, 2);

    cache.clear(None);
    assert_eq!(cache.load("Cliente", &LoadRequest::full()).unwrap().height(), 5);
    assert_eq!(cache.stats().conversions, 2);
}

#[test]
fn test_trust_serves_existing_artifact_after_edit() {
    let fx = fixture();
    let cache = manager(&fx);
    assert_eq!(cache.load("Cliente", &LoadRequest::full()).unwrap().height(), 40);

    fs::write(fx.data.join("Cliente.csv"), "ClienteID,Nome,UF,Limite\n1,A,SP,1\n").unwrap();
    set_mtime(
        &cache.artifact_path("Cliente", LoadMode::Full),
        SystemTime::now() - Duration::from_secs(60),
    );

    cache.clear(None);
    assert_eq!(cache.load("Cliente", &LoadRequest::full()).unwrap().height(), 40);
    assert_eq!(cache.stats().conversions, 1);
}

#[test]
fn test_sample_artifact_is_narrowed() {
    let fx = fixture();
    let cache = manager(&fx);

    let sample = cache.load("Cliente", &LoadRequest::sample(7)).unwrap();
    let full = cache.load("Cliente", &LoadRequest::full()).unwrap();
    for df in [&sample, &full] {
        assert!(df.column("ClienteID").unwrap().dtype().is_integer());
        assert_eq!(df.column("Limite").unwrap().dtype(), &DataType::String);
    }
    assert_eq!(cache.stats().conversions, 2);
}
