#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use verso_core::model::{ItemKind, Tag, TagValue, ValueType};
use verso_storage::{RichVersionPayload, SqliteMetadataStore, StoreError};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("verso_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn open_store(test_name: &str) -> SqliteMetadataStore {
    SqliteMetadataStore::open(temp_dir(test_name), 0).expect("open store")
}

fn tagged_payload(key: &str) -> RichVersionPayload {
    let mut tags = BTreeMap::new();
    tags.insert(
        key.to_string(),
        Tag::new(0, key, Some(TagValue::String("v".to_string()))),
    );
    RichVersionPayload {
        tags,
        ..RichVersionPayload::default()
    }
}

#[test]
fn truncate_keeps_one_level_of_a_linear_chain() {
    let mut store = open_store("truncate_linear_chain");
    let item = store
        .create_item(ItemKind::Node, "chain", "chain", BTreeMap::new())
        .expect("create item");

    let mut versions = Vec::new();
    let mut parent: Option<i64> = None;
    for _ in 0..4 {
        let parents: Vec<i64> = parent.into_iter().collect();
        let version = store
            .create_node_version(item.id, tagged_payload("level"), &parents)
            .expect("create chained version");
        parent = Some(version.rich.id);
        versions.push(version.rich.id);
    }
    let v4 = versions[3];

    store.truncate_item("chain", 1).expect("truncate to one level");

    assert_eq!(store.item_leaves("chain").expect("leaves"), vec![v4]);

    for &old in &versions[..3] {
        let err = store
            .retrieve_rich_version(old)
            .expect_err("old versions are gone");
        assert!(matches!(err, StoreError::VersionNotFound { id } if id == old));
        assert!(store.version_tags(old).expect("tags of deleted version").is_empty());
    }

    // The cut removed v3's membership in the DAG, so it can no longer be a
    // parent, while v4 still can.
    let err = store
        .create_node_version(item.id, RichVersionPayload::default(), &[versions[2]])
        .expect_err("deleted version is no longer a valid parent");
    assert!(matches!(err, StoreError::InvalidParent { .. }));

    let v5 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[v4])
        .expect("the kept leaf is still extendable");
    assert_eq!(store.item_leaves("chain").expect("leaves"), vec![v5.rich.id]);
}

#[test]
fn truncate_handles_merge_points_once() {
    let mut store = open_store("truncate_merge");
    let item = store
        .create_item(ItemKind::Node, "merge", "merge", BTreeMap::new())
        .expect("create item");

    let p1 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create p1");
    let p2 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create p2");
    let child = store
        .create_node_version(item.id, RichVersionPayload::default(), &[p1.rich.id, p2.rich.id])
        .expect("create merge child");

    store.truncate_item("merge", 1).expect("truncate merge history");

    assert_eq!(store.leaves(item.id).expect("leaves"), vec![child.rich.id]);
    for old in [p1.rich.id, p2.rich.id] {
        assert!(matches!(
            store.retrieve_rich_version(old),
            Err(StoreError::VersionNotFound { .. })
        ));
    }
}

#[test]
fn truncate_deeper_than_history_is_a_noop() {
    let mut store = open_store("truncate_overdeep");
    let item = store
        .create_item(ItemKind::Node, "short", "short", BTreeMap::new())
        .expect("create item");

    let v1 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create v1");
    let v2 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[v1.rich.id])
        .expect("create v2");

    store
        .truncate_item("short", 5)
        .expect("truncating deeper than the history succeeds");

    assert_eq!(store.item_leaves("short").expect("leaves"), vec![v2.rich.id]);
    store
        .retrieve_rich_version(v1.rich.id)
        .expect("nothing was deleted");

    // v1 is still part of the history and can still take children.
    store
        .create_node_version(item.id, RichVersionPayload::default(), &[v1.rich.id])
        .expect("v1 remains a valid parent");
}

#[test]
fn truncate_rejects_zero_levels() {
    let mut store = open_store("truncate_zero");
    store
        .create_item(ItemKind::Node, "n", "n", BTreeMap::new())
        .expect("create item");

    let err = store
        .truncate_item("n", 0)
        .expect_err("zero levels would erase the whole history");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn truncate_structure_history_removes_attribute_rows() {
    let mut store = open_store("truncate_structure");
    let structure = store
        .create_item(ItemKind::Structure, "schema", "schema", BTreeMap::new())
        .expect("create structure item");

    let mut first = BTreeMap::new();
    first.insert("a".to_string(), ValueType::Integer);
    let sv1 = store
        .create_structure_version(structure.id, first, &[])
        .expect("create first schema version");

    let mut second = BTreeMap::new();
    second.insert("a".to_string(), ValueType::Integer);
    second.insert("b".to_string(), ValueType::String);
    let sv2 = store
        .create_structure_version(structure.id, second, &[sv1.id])
        .expect("create second schema version");

    store
        .truncate_item("schema", 1)
        .expect("truncate structure history");

    assert!(matches!(
        store.retrieve_structure_version(sv1.id),
        Err(StoreError::VersionNotFound { .. })
    ));

    let kept = store
        .retrieve_structure_version(sv2.id)
        .expect("kept schema version still loads");
    assert_eq!(kept.attributes.len(), 2);
    assert_eq!(store.leaves(structure.id).expect("leaves"), vec![sv2.id]);
}
