#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::json;
use sysdesc_core::compare::{compare_descriptions, compare_scope, Side};
use sysdesc_core::logging_facility::init_test_capture;
use sysdesc_core::model::{Element, OsInfo, Package, Service};
use sysdesc_core::{Node, Scope, SysDescError, SystemDescription};

fn pkg(name: &str, version: &str) -> Element {
    Package::new(name, version).into()
}

fn node(element: Element) -> Node {
    Node::Element(element)
}

fn with_packages(name: &str, packages: Vec<Element>) -> SystemDescription {
    let mut desc = SystemDescription::new(name);
    desc.set_scope(Scope::from_elements("packages", packages).unwrap())
        .unwrap();
    desc
}

fn element_list(scope: &Option<Scope>) -> Vec<Node> {
    scope
        .as_ref()
        .and_then(Scope::elements)
        .map(|seq| seq.items().to_vec())
        .unwrap_or_default()
}

#[test]
fn test_repeated_identity_can_overlap_common() {
    let one = with_packages("one", vec![pkg("bash", "1"), pkg("bash", "2")]);
    let two = with_packages("two", vec![pkg("bash", "2")]);

    let result = compare_scope(&one, &two, "packages").unwrap();

    assert_eq!(
        result.changed,
        Some(vec![(node(pkg("bash", "1")), node(pkg("bash", "2")))])
    );
    assert_eq!(element_list(&result.only_in1), vec![node(pkg("bash", "2"))]);
    assert!(element_list(&result.only_in2).is_empty());
    assert_eq!(element_list(&result.common), vec![node(pkg("bash", "2"))]);
}

#[test]
fn test_changed_version_is_a_changed_pair() {
    let one = with_packages("one", vec![pkg("bash", "4.2"), pkg("kernel", "3")]);
    let two = with_packages("two", vec![pkg("bash", "4.2"), pkg("kernel", "4")]);

    let result = compare_scope(&one, &two, "packages").unwrap();

    assert_eq!(result.name1, "one");
    assert_eq!(result.name2, "two");
    assert!(element_list(&result.only_in1).is_empty());
    assert!(element_list(&result.only_in2).is_empty());
    assert_eq!(
        result.changed,
        Some(vec![(node(pkg("kernel", "3")), node(pkg("kernel", "4")))])
    );
    assert_eq!(element_list(&result.common), vec![node(pkg("bash", "4.2"))]);
}

#[test]
fn test_scope_missing_on_one_side() {
    let one = with_packages("one", vec![pkg("bash", "4.2")]);
    let two = SystemDescription::new("two");

    let result = compare_scope(&one, &two, "packages").unwrap();
    assert_eq!(result.only_in1, one.scope("packages").unwrap().cloned());
    assert!(result.only_in2.is_none());
    assert!(result.changed.is_none());
    assert!(result.common.is_none());

    let reversed = compare_scope(&two, &one, "packages").unwrap();
    assert!(reversed.only_in1.is_none());
    assert_eq!(reversed.only_in2, one.scope("packages").unwrap().cloned());
}

#[test]
fn test_scope_missing_on_both_sides() {
    let result = compare_scope(
        &SystemDescription::new("one"),
        &SystemDescription::new("two"),
        "services",
    )
    .unwrap();
    assert!(result.only_in1.is_none());
    assert!(result.only_in2.is_none());
    assert!(result.changed.is_none());
    assert!(result.common.is_none());
    assert!(result.is_identical());
}

#[test]
fn test_order_of_inputs_is_kept() {
    let one = with_packages(
        "one",
        vec![pkg("zsh", "5"), pkg("bash", "4"), pkg("awk", "1"), pkg("vim", "8")],
    );
    let two = with_packages("two", vec![pkg("vim", "8"), pkg("awk", "1")]);

    let result = compare_scope(&one, &two, "packages").unwrap();
    assert_eq!(
        element_list(&result.only_in1),
        vec![node(pkg("zsh", "5")), node(pkg("bash", "4"))]
    );
    assert_eq!(
        element_list(&result.common),
        vec![node(pkg("awk", "1")), node(pkg("vim", "8"))]
    );
}

#[test]
fn test_compare_leaves_inputs_untouched() {
    let one = with_packages("one", vec![pkg("bash", "4.2"), pkg("kernel", "3")]);
    let two = with_packages("two", vec![pkg("kernel", "4")]);
    let before = one.to_raw();

    compare_scope(&one, &two, "packages").unwrap();
    assert_eq!(one.to_raw(), before);
}

#[test]
fn test_record_scope_compares_as_a_whole() {
    let os = |version: &str| {
        Scope::from_record(
            "os",
            OsInfo {
                name: "SLES".to_string(),
                version: version.to_string(),
                architecture: "x86_64".to_string(),
                extra: Default::default(),
            }
            .into(),
        )
        .unwrap()
    };
    let mut one = SystemDescription::new("one");
    one.set_scope(os("12")).unwrap();
    let mut same = SystemDescription::new("same");
    same.set_scope(os("12")).unwrap();
    let mut other = SystemDescription::new("other");
    other.set_scope(os("15")).unwrap();

    let equal = compare_scope(&one, &same, "os").unwrap();
    assert!(equal.common.is_some());
    assert!(equal.only_in1.is_none() && equal.only_in2.is_none());

    let different = compare_scope(&one, &other, "os").unwrap();
    assert!(different.common.is_none());
    assert!(different.changed.is_none());
    assert_eq!(different.only_in1, Some(os("12")));
    assert_eq!(different.only_in2, Some(os("15")));
}

#[test]
fn test_as_description_rebuilds_partitions() {
    let one = with_packages("one", vec![pkg("bash", "4.2"), pkg("vim", "8")]);
    let two = with_packages("two", vec![pkg("bash", "4.2")]);
    let result = compare_scope(&one, &two, "packages").unwrap();

    let left = result.as_description(Side::One);
    assert_eq!(left.name(), "one");
    let left_packages = left.scope("packages").unwrap().unwrap();
    assert_eq!(left_packages.elements().unwrap().items(), &[node(pkg("vim", "8"))]);

    let common = result.as_description(Side::Common);
    assert_eq!(common.name(), "one_two");
    assert!(common.scope("packages").unwrap().is_some());

    let missing = compare_scope(&one, &two, "services")
        .unwrap()
        .as_description(Side::Two);
    assert!(missing.scope_names().is_empty());
}

#[test]
fn test_to_raw_uses_null_for_unset_partitions() {
    let one = with_packages("one", vec![pkg("bash", "4.2")]);
    let result = compare_scope(&one, &SystemDescription::new("two"), "packages").unwrap();
    let raw = result.to_raw();
    assert_eq!(raw["only_in2"], json!(null));
    assert_eq!(raw["changed"], json!(null));
    assert_eq!(raw["only_in1"]["_elements"][0]["name"], "bash");
}

#[test]
fn test_old_description_cannot_be_compared() {
    let raw = json!({"packages": [], "meta": {"format_version": 2}});
    let old = SystemDescription::from_raw(
        "old",
        &raw,
        std::sync::Arc::new(sysdesc_core::file_store::NoFileStore),
    )
    .unwrap();
    let err = compare_scope(&old, &SystemDescription::new("new"), "packages").unwrap_err();
    assert!(matches!(err, SysDescError::NeedsUpgrade { .. }));
}

#[test]
fn test_compare_descriptions_covers_scopes_of_either_side() {
    let capture = init_test_capture();
    let mut one = with_packages("compare_all_one", vec![pkg("bash", "4.2")]);
    one.set_scope(Scope::from_elements("services", vec![Service::new("sshd", "enabled").into()]).unwrap())
        .unwrap();
    let two = with_packages("compare_all_two", vec![pkg("bash", "4.2")]);

    let results = compare_descriptions(&one, &two, &[]).unwrap();
    let scopes: Vec<&str> = results.iter().map(|c| c.scope.as_str()).collect();
    assert_eq!(scopes, vec!["packages", "services"]);
    assert!(results[0].is_identical());
    assert!(!results[1].is_identical());

    let events = capture.events_for_op("compare_descriptions");
    assert!(events
        .iter()
        .any(|e| e.event() == Some("end") && e.field("scopes") == Some("2")));
}

proptest! {
    #[test]
    fn prop_every_element_lands_in_one_partition(
        left in prop::collection::btree_map("[a-h]", "[1-3]", 0..8),
        right in prop::collection::btree_map("[a-h]", "[1-3]", 0..8),
    ) {
        let build = |name: &str, entries: &BTreeMap<String, String>| {
            with_packages(name, entries.iter().map(|(n, v)| pkg(n, v)).collect())
        };
        let one = build("one", &left);
        let two = build("two", &right);
        let result = compare_scope(&one, &two, "packages").unwrap();

        let only1 = element_list(&result.only_in1);
        let only2 = element_list(&result.only_in2);
        let common = element_list(&result.common);
        let changed = result.changed.clone().unwrap_or_default();

        for (name, version) in &left {
            let item = node(pkg(name, version));
            let hits = only1.contains(&item) as usize
                + changed.iter().filter(|(a, _)| *a == item).count()
                + common.contains(&item) as usize;
            prop_assert_eq!(hits, 1, "left element {} in {} partitions", name, hits);
        }
        for (name, version) in &right {
            let item = node(pkg(name, version));
            let hits = only2.contains(&item) as usize
                + changed.iter().filter(|(_, b)| *b == item).count()
                + common.contains(&item) as usize;
            prop_assert_eq!(hits, 1, "right element {} in {} partitions", name, hits);
        }
    }
}
