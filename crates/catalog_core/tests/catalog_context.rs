use catalog_core::{Catalog, CatalogConfig, ConfigError, TagRef, TagSearchQuery, TagUpdate};
use std::fs;

#[test]
fn catalog_persists_tags_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite");

    let mut catalog = Catalog::open(&path).unwrap();
    let created = catalog
        .create_tag(&TagUpdate::named("Roguelike").with_aliases(["Roguelite"]))
        .unwrap();
    catalog.close().unwrap();

    let reopened = Catalog::open(&path).unwrap();
    let loaded = reopened
        .get_tag(&TagRef::Alias("Roguelite".to_string()))
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(reopened.tag_count().unwrap(), 1);
}

#[test]
fn config_file_resolves_relative_db_path() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("catalog.json");
    fs::write(&config_path, r#"{ "db_path": "data.sqlite", "log_level": "warn" }"#).unwrap();

    let config = CatalogConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.db_path, dir.path().join("data.sqlite"));
    assert_eq!(config.log_level, "warn");
    assert!(config.log_dir.is_none());

    let mut catalog = Catalog::from_config(&config).unwrap();
    catalog.create_tag(&TagUpdate::named("Metroidvania")).unwrap();
    let hits = catalog.search_tags(&TagSearchQuery::new("troid")).unwrap();
    assert_eq!(hits.len(), 1);
    catalog.close().unwrap();

    assert!(dir.path().join("data.sqlite").exists());
}

#[test]
fn config_file_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();

    let missing = CatalogConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }));

    let malformed_path = dir.path().join("malformed.json");
    fs::write(&malformed_path, "{ db_path: ").unwrap();
    let malformed = CatalogConfig::from_json_file(&malformed_path).unwrap_err();
    assert!(matches!(malformed, ConfigError::Parse { .. }));

    let empty_path = dir.path().join("empty.json");
    fs::write(&empty_path, r#"{ "db_path": "" }"#).unwrap();
    let empty = CatalogConfig::from_json_file(&empty_path).unwrap_err();
    assert!(matches!(empty, ConfigError::Invalid(_)));
}

#[test]
fn independent_in_memory_catalogs_do_not_share_state() {
    let mut first = Catalog::open_in_memory().unwrap();
    let second = Catalog::open_in_memory().unwrap();

    first.create_tag(&TagUpdate::named("Stealth")).unwrap();

    assert_eq!(first.tag_count().unwrap(), 1);
    assert_eq!(second.tag_count().unwrap(), 0);
}
