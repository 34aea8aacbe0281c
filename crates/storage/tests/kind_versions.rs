#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use verso_core::model::ItemKind;
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

fn item(store: &mut SqliteMetadataStore, kind: ItemKind, key: &str) -> i64 {
    store
        .create_item(kind, key, key, BTreeMap::new())
        .expect("create item")
        .id
}

#[test]
fn edge_version_records_its_endpoints() {
    let mut store = open_store("edge_endpoints");
    let from_node = item(&mut store, ItemKind::Node, "from-node");
    let to_node = item(&mut store, ItemKind::Node, "to-node");
    let edge = item(&mut store, ItemKind::Edge, "edge");

    let from_version = store
        .create_node_version(from_node, RichVersionPayload::default(), &[])
        .expect("create from version");
    let to_version = store
        .create_node_version(to_node, RichVersionPayload::default(), &[])
        .expect("create to version");

    let created = store
        .create_edge_version(
            edge,
            from_version.rich.id,
            to_version.rich.id,
            RichVersionPayload::default(),
            &[],
        )
        .expect("create edge version");

    let retrieved = store
        .retrieve_edge_version(created.rich.id)
        .expect("retrieve edge version");
    assert_eq!(retrieved, created);
    assert_eq!(retrieved.from_node_version_id, from_version.rich.id);
    assert_eq!(retrieved.to_node_version_id, to_version.rich.id);
    assert_eq!(store.leaves(edge).expect("edge leaves"), vec![created.rich.id]);
}

#[test]
fn graph_version_membership_round_trips() {
    let mut store = open_store("graph_membership");
    let node = item(&mut store, ItemKind::Node, "node");
    let edge = item(&mut store, ItemKind::Edge, "edge");
    let graph = item(&mut store, ItemKind::Graph, "graph");

    let node_version = store
        .create_node_version(node, RichVersionPayload::default(), &[])
        .expect("create node version");
    let edge_version = store
        .create_edge_version(
            edge,
            node_version.rich.id,
            node_version.rich.id,
            RichVersionPayload::default(),
            &[],
        )
        .expect("create edge version");

    let created = store
        .create_graph_version(
            graph,
            vec![edge_version.rich.id],
            RichVersionPayload::default(),
            &[],
        )
        .expect("create graph version");

    let retrieved = store
        .retrieve_graph_version(created.rich.id)
        .expect("retrieve graph version");
    assert_eq!(retrieved, created);
    assert_eq!(retrieved.edge_version_ids, vec![edge_version.rich.id]);
}

#[test]
fn graph_truncation_cascades_membership_rows() {
    let mut store = open_store("graph_truncation");
    let node = item(&mut store, ItemKind::Node, "node");
    let edge = item(&mut store, ItemKind::Edge, "edge");
    let graph = item(&mut store, ItemKind::Graph, "graph");

    let node_version = store
        .create_node_version(node, RichVersionPayload::default(), &[])
        .expect("create node version");
    let edge_version = store
        .create_edge_version(
            edge,
            node_version.rich.id,
            node_version.rich.id,
            RichVersionPayload::default(),
            &[],
        )
        .expect("create edge version");

    let gv1 = store
        .create_graph_version(
            graph,
            vec![edge_version.rich.id],
            RichVersionPayload::default(),
            &[],
        )
        .expect("create first graph version");
    let gv2 = store
        .create_graph_version(
            graph,
            vec![edge_version.rich.id],
            RichVersionPayload::default(),
            &[gv1.rich.id],
        )
        .expect("create second graph version");

    store
        .truncate_item("graph", 1)
        .expect("truncate graph history");

    assert!(matches!(
        store.retrieve_graph_version(gv1.rich.id),
        Err(StoreError::VersionNotFound { .. })
    ));
    let kept = store
        .retrieve_graph_version(gv2.rich.id)
        .expect("kept graph version still loads");
    assert_eq!(kept.edge_version_ids, vec![edge_version.rich.id]);
}

#[test]
fn lineage_edge_version_connects_rich_versions() {
    let mut store = open_store("lineage_edge");
    let source = item(&mut store, ItemKind::Node, "source");
    let derived = item(&mut store, ItemKind::Node, "derived");
    let lineage = item(&mut store, ItemKind::LineageEdge, "lineage");

    let source_version = store
        .create_node_version(source, RichVersionPayload::default(), &[])
        .expect("create source version");
    let derived_version = store
        .create_node_version(derived, RichVersionPayload::default(), &[])
        .expect("create derived version");

    let created = store
        .create_lineage_edge_version(
            lineage,
            source_version.rich.id,
            derived_version.rich.id,
            RichVersionPayload::default(),
            &[],
        )
        .expect("create lineage edge version");

    let retrieved = store
        .retrieve_lineage_edge_version(created.rich.id)
        .expect("retrieve lineage edge version");
    assert_eq!(retrieved, created);
    assert_eq!(retrieved.from_rich_version_id, source_version.rich.id);
    assert_eq!(retrieved.to_rich_version_id, derived_version.rich.id);
}

#[test]
fn lineage_graph_version_membership_round_trips() {
    let mut store = open_store("lineage_graph");
    let source = item(&mut store, ItemKind::Node, "source");
    let derived = item(&mut store, ItemKind::Node, "derived");
    let lineage_edge = item(&mut store, ItemKind::LineageEdge, "lineage-edge");
    let lineage_graph = item(&mut store, ItemKind::LineageGraph, "lineage-graph");

    let source_version = store
        .create_node_version(source, RichVersionPayload::default(), &[])
        .expect("create source version");
    let derived_version = store
        .create_node_version(derived, RichVersionPayload::default(), &[])
        .expect("create derived version");
    let lineage_edge_version = store
        .create_lineage_edge_version(
            lineage_edge,
            source_version.rich.id,
            derived_version.rich.id,
            RichVersionPayload::default(),
            &[],
        )
        .expect("create lineage edge version");

    let created = store
        .create_lineage_graph_version(
            lineage_graph,
            vec![lineage_edge_version.rich.id],
            RichVersionPayload::default(),
            &[],
        )
        .expect("create lineage graph version");

    let retrieved = store
        .retrieve_lineage_graph_version(created.rich.id)
        .expect("retrieve lineage graph version");
    assert_eq!(retrieved, created);
    assert_eq!(
        retrieved.lineage_edge_version_ids,
        vec![lineage_edge_version.rich.id]
    );
}
