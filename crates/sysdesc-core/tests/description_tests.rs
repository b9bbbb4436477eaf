#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use sysdesc_core::errors::{ExError, ExErrorKind};
use sysdesc_core::file_store::{FileStore, NoFileStore};
use sysdesc_core::{Filter, FormatStatus, Scope, ScopeBuilder, SysDescError, SystemDescription};

struct MemoryFiles(HashMap<(String, String), Vec<u8>>);

impl FileStore for MemoryFiles {
    fn read_file(&self, scope: &str, path: &str) -> Result<Option<Vec<u8>>, ExError> {
        Ok(self.0.get(&(scope.to_string(), path.to_string())).cloned())
    }
}

fn unmanaged_doc(extracted: bool) -> serde_json::Value {
    json!({
        "unmanaged_files": {
            "_attributes": {"extracted": extracted},
            "_elements": [{"name": "/etc/motd", "type": "file"}]
        },
        "meta": {"format_version": 3, "filters": {}}
    })
}

fn memory_files() -> Arc<dyn FileStore> {
    let mut files = HashMap::new();
    files.insert(
        ("unmanaged_files".to_string(), "/etc/motd".to_string()),
        b"welcome\n".to_vec(),
    );
    Arc::new(MemoryFiles(files))
}

#[test]
fn test_scope_reads_content_through_description_store() {
    let desc = SystemDescription::from_raw("host1", &unmanaged_doc(true), memory_files()).unwrap();
    let scope = desc.scope("unmanaged_files").unwrap().unwrap();

    assert_eq!(scope.file_content("/etc/motd").unwrap(), Some(b"welcome\n".to_vec()));
    assert_eq!(scope.file_content("/etc/issue").unwrap(), None);
}

#[test]
fn test_unextracted_scope_has_no_content() {
    let desc = SystemDescription::from_raw("host1", &unmanaged_doc(false), memory_files()).unwrap();
    let scope = desc.scope("unmanaged_files").unwrap().unwrap();
    assert_eq!(scope.file_content("/etc/motd").unwrap(), None);
}

#[test]
fn test_scope_does_not_keep_store_alive() {
    let desc = SystemDescription::from_raw("host1", &unmanaged_doc(true), memory_files()).unwrap();
    let scope = desc.scope("unmanaged_files").unwrap().unwrap().clone();
    drop(desc);

    let err = scope.file_content("/etc/motd").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Internal);
}

#[test]
fn test_set_scope_attaches_store() {
    let mut desc = SystemDescription::from_raw(
        "host1",
        &json!({"meta": {"format_version": 3}}),
        memory_files(),
    )
    .unwrap();
    let mut builder = ScopeBuilder::new("unmanaged_files", None).unwrap();
    builder
        .push_raw(&json!({"name": "/etc/motd", "type": "file"}))
        .unwrap();
    builder.set_extracted(true);
    desc.set_scope(builder.finish()).unwrap();

    let scope = desc.scope("unmanaged_files").unwrap().unwrap();
    assert!(scope.file_content("/etc/motd").unwrap().is_some());
}

#[test]
fn test_builder_output_persists_with_filter_definitions() {
    let filter = Filter::new("/packages/name=kernel-default").unwrap();
    let mut builder = ScopeBuilder::new("packages", Some(&filter)).unwrap();
    for raw in [
        json!({"name": "bash", "version": "4.2"}),
        json!({"name": "kernel-default", "version": "3.0"}),
    ] {
        builder.push_raw(&raw).unwrap();
    }

    let mut desc = SystemDescription::new("host1");
    desc.set_scope(builder.finish()).unwrap();
    desc.set_filter_definitions("inspect", filter.to_array());

    let raw = desc.to_raw();
    assert_eq!(raw["packages"]["_elements"].as_array().unwrap().len(), 1);
    assert_eq!(raw["meta"]["filters"]["inspect"][0], "/packages/name=kernel-default");

    let reloaded = SystemDescription::from_raw("host1", &raw, Arc::new(NoFileStore)).unwrap();
    assert_eq!(reloaded.filter("inspect").unwrap(), filter);
}

#[test]
fn test_format_status_per_version() {
    let status = |meta: serde_json::Value| {
        SystemDescription::from_raw("h", &json!({ "meta": meta }), Arc::new(NoFileStore))
            .unwrap()
            .format_status()
    };
    assert_eq!(status(json!({"format_version": 3})), FormatStatus::Current);
    assert_eq!(status(json!({"format_version": 2})), FormatStatus::NeedsUpgrade { version: 2 });
    assert_eq!(status(json!({"format_version": 4})), FormatStatus::Ahead { version: 4 });
    assert_eq!(status(json!({})), FormatStatus::Unversioned);
}

#[test]
fn test_explicit_current_version() {
    let raw = json!({"packages": [], "meta": {"format_version": 4}});
    let desc = SystemDescription::from_raw_versioned("h", &raw, Arc::new(NoFileStore), 4).unwrap();
    assert!(desc.scope("packages").unwrap().is_some());
}

#[test]
fn test_old_document_rejects_scope_writes() {
    let raw = json!({"meta": {"format_version": 1}});
    let mut desc = SystemDescription::from_raw("h", &raw, Arc::new(NoFileStore)).unwrap();
    let scope = Scope::from_elements("packages", vec![]).unwrap();
    assert!(matches!(desc.set_scope(scope), Err(SysDescError::NeedsUpgrade { .. })));
}

#[test]
fn test_unknown_scope_read() {
    let desc = SystemDescription::new("h");
    let err: ExError = desc.scope("kernel_modules").unwrap_err().into();
    assert_eq!(err.kind(), ExErrorKind::UnknownScope);
}

#[test]
fn test_malformed_meta_rejected() {
    for raw in [
        json!([]),
        json!({"meta": []}),
        json!({"meta": {"format_version": "three"}}),
        json!({"meta": {"format_version": 3, "filters": {"inspect": "x"}}}),
        json!({"packages": {"_elements": 3}, "meta": {"format_version": 3}}),
    ] {
        let err = SystemDescription::from_raw("h", &raw, Arc::new(NoFileStore)).unwrap_err();
        assert!(
            matches!(err, SysDescError::MalformedDocument { .. }),
            "{} gave {:?}",
            raw,
            err
        );
    }
}

#[test]
fn test_untypable_element_loads_as_generic_node() {
    let raw = json!({
        "packages": {"_elements": [{"name": "bash"}, {"name": "vim", "version": "9.0"}]},
        "meta": {"format_version": 3, "filters": {}}
    });
    let desc = SystemDescription::from_raw("h", &raw, Arc::new(NoFileStore)).unwrap();

    let elements = desc.scope("packages").unwrap().unwrap().elements().unwrap();
    assert!(elements.items()[0].as_mapping().is_some());
    assert!(elements.items()[1].as_element().is_some());
    assert_eq!(desc.to_raw(), raw);
}

#[test]
fn test_old_document_round_trips_unchanged() {
    let raw = json!({
        "packages": [{"name": "bash", "version": "4.2"}],
        "meta": {"format_version": 1}
    });
    let desc = SystemDescription::from_raw("h", &raw, Arc::new(NoFileStore)).unwrap();
    assert_eq!(desc.to_raw(), raw);

    let with_filters = json!({"meta": {"format_version": 2, "filters": {}}});
    let desc = SystemDescription::from_raw("h", &with_filters, Arc::new(NoFileStore)).unwrap();
    assert_eq!(desc.to_raw(), with_filters);

    assert_eq!(
        SystemDescription::new("h").to_raw(),
        json!({"meta": {"format_version": 3, "filters": {}}})
    );
}
