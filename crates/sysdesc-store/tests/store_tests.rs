#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for the directory store

use std::fs;

use serde_json::json;
use sysdesc_core::errors::ExErrorKind;
use sysdesc_core::migrate::DescriptionRepository;
use sysdesc_core::model::Package;
use sysdesc_core::{ExError, Scope, ScopeBuilder, SysDescError, SystemDescription};
use sysdesc_store::DescriptionStore;
use tempfile::TempDir;

fn setup_store() -> (DescriptionStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = DescriptionStore::new(temp_dir.path());
    (store, temp_dir)
}

fn unmanaged_scope(extracted: bool) -> Scope {
    let mut builder = ScopeBuilder::new("unmanaged_files", None).unwrap();
    builder
        .push_raw(&json!({"name": "/etc/motd", "type": "file"}))
        .unwrap();
    builder.set_extracted(extracted);
    builder.finish()
}

fn write_extracted(store: &DescriptionStore, name: &str, scope: &str, rel: &str, content: &[u8]) {
    let file = store.description_dir(name).join(scope).join(rel);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

#[test]
fn test_save_and_load_round_trip() {
    // Given: A description with a plain and an extracted scope
    let (store, _dir) = setup_store();
    let mut desc = SystemDescription::new("host1");
    desc.set_scope(
        Scope::from_elements("packages", vec![Package::new("bash", "4.2").into()]).unwrap(),
    )
    .unwrap();
    desc.set_scope(unmanaged_scope(true)).unwrap();
    desc.set_filter_definitions("inspect", vec!["/unmanaged_files/name=/tmp".to_string()]);

    // When: It is saved along with its extracted content and read back
    store.save(&desc).unwrap();
    write_extracted(&store, "host1", "unmanaged_files", "etc/motd", b"welcome\n");
    let loaded = store.load("host1").unwrap();

    // Then: Scopes, filters and file content survive
    assert_eq!(loaded.scope("packages").unwrap(), desc.scope("packages").unwrap());
    assert_eq!(loaded.filter_definitions("inspect"), desc.filter_definitions("inspect"));
    let unmanaged = loaded.scope("unmanaged_files").unwrap().unwrap();
    assert_eq!(
        unmanaged.file_content("/etc/motd").unwrap(),
        Some(b"welcome\n".to_vec())
    );
}

#[test]
fn test_skipped_extraction_removes_stale_files() {
    // Given: A stored description with extracted files for two scopes
    let (store, _dir) = setup_store();
    let mut desc = SystemDescription::new("host1");
    desc.set_scope(unmanaged_scope(true)).unwrap();
    store.save(&desc).unwrap();
    write_extracted(&store, "host1", "unmanaged_files", "etc/motd", b"x");
    write_extracted(&store, "host1", "changed_config_files", "etc/hosts", b"y");

    // When: The scope is re-saved without extraction
    desc.set_scope(unmanaged_scope(false)).unwrap();
    store.save(&desc).unwrap();

    // Then: Only that scope's extracted directory is gone
    let dir = store.description_dir("host1");
    assert!(!dir.join("unmanaged_files").exists());
    assert!(dir.join("changed_config_files/etc/hosts").is_file());
}

#[test]
fn test_missing_description_is_not_found() {
    let (store, _dir) = setup_store();
    let err = store.load("ghost").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.entity_id(), Some("ghost"));
}

#[test]
fn test_invalid_names_are_rejected_before_io() {
    let (store, dir) = setup_store();
    for name in ["", "../escape", ".hidden"] {
        let err = store.load(name).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput, "{:?}", name);

        let desc = SystemDescription::new(name);
        assert_eq!(store.save(&desc).unwrap_err().kind(), ExErrorKind::InvalidInput);
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_old_format_loads_but_scopes_need_upgrade() {
    // Given: A manifest written at format version 2
    let (store, _dir) = setup_store();
    store
        .write_raw(
            "host1",
            &json!({"packages": [{"name": "bash", "version": "4.2"}], "meta": {"format_version": 2}}),
        )
        .unwrap();

    // When: It is loaded
    let desc = store.load("host1").unwrap();

    // Then: Reading a scope reports the upgrade requirement
    let err = desc.scope("packages").unwrap_err();
    assert!(matches!(err, SysDescError::NeedsUpgrade { version: 2, .. }));
    let err: ExError = err.into();
    assert_eq!(err.code(), "ERR_NEEDS_UPGRADE");
}

#[test]
fn test_unparseable_manifest() {
    let (store, _dir) = setup_store();
    let manifest = store.manifest_path("host1");
    fs::create_dir_all(manifest.parent().unwrap()).unwrap();
    fs::write(&manifest, b"{ not json").unwrap();

    let err = store.load("host1").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_list_and_remove() {
    let (store, _dir) = setup_store();
    for name in ["web", "db"] {
        store.save(&SystemDescription::new(name)).unwrap();
    }
    assert_eq!(store.list().unwrap(), vec!["db".to_string(), "web".to_string()]);

    store.remove("db").unwrap();
    assert_eq!(store.list().unwrap(), vec!["web".to_string()]);
    assert!(!store.description_dir("db").exists());
}

#[test]
fn test_copy_includes_extracted_files() {
    let (store, _dir) = setup_store();
    store.save(&SystemDescription::new("host1")).unwrap();
    write_extracted(&store, "host1", "unmanaged_files", "srv/data/a", b"a");

    store.copy_description("host1", "host1.migration").unwrap();

    let copied = store
        .description_dir("host1.migration")
        .join("unmanaged_files/srv/data/a");
    assert_eq!(fs::read(copied).unwrap(), b"a");
    assert!(store.exists("host1.migration"));
}
