#![forbid(unsafe_code)]

use super::items::retrieve_item_kind_tx;
use super::versions::{
    create_successor_tx, delete_successors_by_destination_tx, retrieve_successor_tx,
};
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx};
use crate::ids::IdGenerator;
use std::collections::BTreeSet;
use tracing::debug;
use verso_core::ROOT_VERSION_ID;
use verso_core::dag::VersionHistoryDag;
use verso_core::model::ItemKind;

/// Load the DAG recorded against `item_id`. No recorded edges is not an
/// error: an item with no history yet has a valid, empty DAG.
pub(in crate::store) fn retrieve_dag_tx<T: DbTx>(
    tx: &T,
    item_id: i64,
) -> Result<VersionHistoryDag, StoreError> {
    let rows = match tx.select_eq(
        "version_history_dag",
        &["version_successor_id"],
        &[ColumnValue::long("item_id", item_id)],
    ) {
        Ok(rows) => rows,
        Err(DbError::NoResults) => return Ok(VersionHistoryDag::new(item_id, Vec::new())),
        Err(err) => return Err(StoreError::Db(err)),
    };

    let mut edges = Vec::with_capacity(rows.len());
    for row in &rows {
        edges.push(retrieve_successor_tx(tx, row.get_long(0)?)?);
    }
    Ok(VersionHistoryDag::new(item_id, edges))
}

pub(in crate::store) fn add_edge_tx<T: DbTx>(
    tx: &T,
    ids: &IdGenerator,
    dag: &mut VersionHistoryDag,
    parent_id: i64,
    child_id: i64,
    item_id: i64,
) -> Result<(), StoreError> {
    let successor = create_successor_tx(tx, ids, parent_id, child_id)?;
    tx.insert(
        "version_history_dag",
        &[
            ColumnValue::long("item_id", item_id),
            ColumnValue::long("version_successor_id", successor.id),
        ],
    )?;
    dag.add_edge(parent_id, child_id, successor.id);

    debug!(item = item_id, parent = parent_id, child = child_id, "added history edge");
    Ok(())
}

/// Link `child_id` into `item_id`'s history under the declared parents. No
/// parents means the child hangs off the implicit root. Every non-root
/// parent must already be a member of this item's DAG.
pub(in crate::store) fn update_tx<T: DbTx>(
    tx: &T,
    ids: &IdGenerator,
    item_id: i64,
    child_id: i64,
    parent_ids: &[i64],
) -> Result<(), StoreError> {
    let parent_ids: Vec<i64> = if parent_ids.is_empty() {
        vec![ROOT_VERSION_ID]
    } else {
        parent_ids.to_vec()
    };

    let mut dag = retrieve_dag_tx(tx, item_id)?;

    for &parent_id in &parent_ids {
        if parent_id != ROOT_VERSION_ID && !dag.check_item_in_dag(parent_id) {
            return Err(StoreError::InvalidParent { parent_id, item_id });
        }
        add_edge_tx(tx, ids, &mut dag, parent_id, child_id, item_id)?;
    }
    Ok(())
}

/// Cut everything strictly older than `num_levels` hops from the current
/// leaves. The last kept level is re-attached directly under the root
/// sentinel, then the boundary and everything above it is deleted as a
/// unit: kind-specific payload rows, rich-version tag and parameter rows,
/// successor edges, and the version row itself.
pub(in crate::store) fn truncate_tx<T: DbTx>(
    tx: &T,
    ids: &IdGenerator,
    item_id: i64,
    num_levels: usize,
    kind: ItemKind,
) -> Result<(), StoreError> {
    let mut dag = retrieve_dag_tx(tx, item_id)?;

    let mut kept_levels = 1;
    let mut last_level: Vec<i64> = Vec::new();
    let mut previous_level: Vec<i64> = dag.leaves();

    while kept_levels <= num_levels {
        let mut current_level = Vec::new();
        for &id in &previous_level {
            current_level.extend(dag.parents_of(id));
        }
        last_level = previous_level;
        previous_level = current_level;
        kept_levels += 1;
    }

    for &id in &last_level {
        if id == ROOT_VERSION_ID {
            continue;
        }
        delete_successors_by_destination_tx(tx, id)?;
        add_edge_tx(tx, ids, &mut dag, ROOT_VERSION_ID, id, item_id)?;
    }

    // Walk upward from the boundary. Merge points are reachable along more
    // than one path, so a visited set keeps each id processed once.
    let mut delete_queue: Vec<i64> = previous_level
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut deleted: BTreeSet<i64> = BTreeSet::new();

    while let Some(id) = delete_queue.pop() {
        if id == ROOT_VERSION_ID || deleted.contains(&id) {
            continue;
        }

        delete_version_rows_tx(tx, id, kind)?;
        delete_successors_by_destination_tx(tx, id)?;
        deleted.insert(id);

        for parent_id in dag.parents_of(id) {
            if !deleted.contains(&parent_id) {
                delete_queue.push(parent_id);
            }
        }
    }

    debug!(item = item_id, removed = deleted.len(), "truncated history");
    Ok(())
}

/// Delete every row owned by a single version, selecting the structural
/// rows by the owning item's kind.
fn delete_version_rows_tx<T: DbTx>(tx: &T, id: i64, kind: ItemKind) -> Result<(), StoreError> {
    match kind {
        ItemKind::Node => {
            tx.delete("node_version", &[ColumnValue::long("id", id)])?;
        }
        ItemKind::Edge => {
            tx.delete("edge_version", &[ColumnValue::long("id", id)])?;
        }
        ItemKind::Graph => {
            tx.delete(
                "graph_version_edge",
                &[ColumnValue::long("graph_version_id", id)],
            )?;
            tx.delete("graph_version", &[ColumnValue::long("id", id)])?;
        }
        ItemKind::Structure => {
            tx.delete(
                "structure_version_attribute",
                &[ColumnValue::long("structure_version_id", id)],
            )?;
            tx.delete("structure_version", &[ColumnValue::long("id", id)])?;
        }
        ItemKind::LineageEdge => {
            tx.delete("lineage_edge_version", &[ColumnValue::long("id", id)])?;
        }
        ItemKind::LineageGraph => {
            tx.delete(
                "lineage_graph_version_edge",
                &[ColumnValue::long("lineage_graph_version_id", id)],
            )?;
            tx.delete("lineage_graph_version", &[ColumnValue::long("id", id)])?;
        }
    }

    // Structure versions are not rich versions; every other kind is.
    if kind != ItemKind::Structure {
        tx.delete(
            "rich_version_tag",
            &[ColumnValue::long("rich_version_id", id)],
        )?;
        tx.delete(
            "rich_version_external_parameter",
            &[ColumnValue::long("rich_version_id", id)],
        )?;
        tx.delete("rich_version", &[ColumnValue::long("id", id)])?;
    }

    tx.delete("version", &[ColumnValue::long("id", id)])?;
    Ok(())
}

impl<D: Database> MetadataStore<D> {
    /// Link a new version under its declared parents in an item's history.
    pub fn update(
        &mut self,
        item_id: i64,
        child_id: i64,
        parent_ids: &[i64],
    ) -> Result<(), StoreError> {
        let tx = self.db.begin()?;
        update_tx(&tx, &self.ids, item_id, child_id, parent_ids)?;
        tx.commit()?;
        Ok(())
    }

    /// Current heads of an item's history. An item with no recorded history
    /// yet has no leaves.
    pub fn leaves(&mut self, item_id: i64) -> Result<Vec<i64>, StoreError> {
        let tx = self.db.begin()?;
        let leaves = retrieve_dag_tx(&tx, item_id)?.leaves();
        tx.commit()?;
        Ok(leaves)
    }

    /// Bound an item's history to `num_levels` levels below the current
    /// leaves, deleting everything older.
    pub fn truncate(&mut self, item_id: i64, num_levels: usize) -> Result<(), StoreError> {
        if num_levels == 0 {
            return Err(StoreError::InvalidInput("num_levels must be positive"));
        }

        let tx = self.db.begin()?;
        let kind = retrieve_item_kind_tx(&tx, item_id)?;
        truncate_tx(&tx, &self.ids, item_id, num_levels, kind)?;
        tx.commit()?;
        Ok(())
    }
}
