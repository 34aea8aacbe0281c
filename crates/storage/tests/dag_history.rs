#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use verso_core::model::{ItemKind, Tag, TagValue};
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

#[test]
fn end_to_end_node_history() {
    let mut store = open_store("end_to_end_node_history");
    let item = store
        .create_item(ItemKind::Node, "node1", "n1", BTreeMap::new())
        .expect("create item");

    assert_eq!(
        store.item_leaves("n1").expect("leaves of a fresh item"),
        Vec::<i64>::new()
    );

    let v1 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create first version");
    assert_eq!(store.item_leaves("n1").expect("leaves"), vec![v1.rich.id]);

    let v2 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[v1.rich.id])
        .expect("create second version");
    assert_eq!(store.item_leaves("n1").expect("leaves"), vec![v2.rich.id]);

    let err = store
        .create_node_version(item.id, RichVersionPayload::default(), &[9999])
        .expect_err("unknown parent must be rejected");
    assert!(matches!(
        err,
        StoreError::InvalidParent {
            parent_id: 9999,
            ..
        }
    ));

    // The failed create aborted as a unit: the heads are unchanged.
    assert_eq!(store.item_leaves("n1").expect("leaves"), vec![v2.rich.id]);
}

#[test]
fn multi_parent_merge_collapses_to_one_leaf() {
    let mut store = open_store("multi_parent_merge");
    let item = store
        .create_item(ItemKind::Node, "merge", "merge-node", BTreeMap::new())
        .expect("create item");

    let p1 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create p1");
    let p2 = store
        .create_node_version(item.id, RichVersionPayload::default(), &[])
        .expect("create p2");
    assert_eq!(
        store.leaves(item.id).expect("leaves"),
        vec![p1.rich.id, p2.rich.id]
    );

    let child = store
        .create_node_version(item.id, RichVersionPayload::default(), &[p1.rich.id, p2.rich.id])
        .expect("create merge child");

    assert_eq!(store.leaves(item.id).expect("leaves"), vec![child.rich.id]);
}

#[test]
fn update_rejects_parent_from_another_item() {
    let mut store = open_store("cross_item_parent");
    let a = store
        .create_item(ItemKind::Node, "a", "item-a", BTreeMap::new())
        .expect("create item a");
    let b = store
        .create_item(ItemKind::Node, "b", "item-b", BTreeMap::new())
        .expect("create item b");

    let va = store
        .create_node_version(a.id, RichVersionPayload::default(), &[])
        .expect("create version on a");

    let err = store
        .create_node_version(b.id, RichVersionPayload::default(), &[va.rich.id])
        .expect_err("a's version is not in b's history");
    assert!(matches!(err, StoreError::InvalidParent { item_id, .. } if item_id == b.id));
}

#[test]
fn update_rejects_a_child_that_is_not_a_version() {
    let mut store = open_store("missing_child_version");
    store
        .create_item(ItemKind::Node, "n", "bare", BTreeMap::new())
        .expect("create item");

    let err = store
        .update_item("bare", 777, &[])
        .expect_err("a successor edge needs an existing child version");
    assert!(matches!(
        err,
        StoreError::InvalidVersionReference { version_id: 777 }
    ));

    let item = store.retrieve_item("bare").expect("retrieve item");
    let err = store
        .update(item.id, 777, &[])
        .expect_err("the engine-level update applies the same check");
    assert!(matches!(
        err,
        StoreError::InvalidVersionReference { version_id: 777 }
    ));
    assert_eq!(store.item_leaves("bare").expect("leaves"), Vec::<i64>::new());
}

#[test]
fn rich_version_round_trips_reference_and_parameters() {
    let mut store = open_store("rich_round_trip");
    let item = store
        .create_item(ItemKind::Node, "dataset", "ds", BTreeMap::new())
        .expect("create item");

    let mut tags = BTreeMap::new();
    tags.insert(
        "rows".to_string(),
        Tag::new(0, "rows", Some(TagValue::Long(12_000))),
    );
    tags.insert("archived".to_string(), Tag::new(0, "archived", None));

    let mut reference_parameters = BTreeMap::new();
    reference_parameters.insert("region".to_string(), "us-west-2".to_string());

    let created = store
        .create_node_version(
            item.id,
            RichVersionPayload {
                tags,
                structure_version_id: None,
                reference: Some("s3://bucket/dataset".to_string()),
                reference_parameters,
            },
            &[],
        )
        .expect("create version");

    let retrieved = store
        .retrieve_node_version(created.rich.id)
        .expect("retrieve version");

    assert_eq!(retrieved, created);
    assert_eq!(
        retrieved.rich.reference.as_deref(),
        Some("s3://bucket/dataset")
    );
    assert_eq!(
        retrieved.rich.reference_parameters.get("region").map(String::as_str),
        Some("us-west-2")
    );
    assert_eq!(
        retrieved.rich.tags.get("rows").and_then(Tag::value_type),
        Some(verso_core::model::ValueType::Long)
    );
    assert_eq!(retrieved.rich.tags.get("archived").and_then(Tag::value_type), None);
}
