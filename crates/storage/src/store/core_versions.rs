#![forbid(unsafe_code)]

use super::dag::update_tx;
use super::rich_versions::{RichVersionPayload, insert_rich_version_tx, retrieve_rich_version_tx};
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx};
use std::collections::BTreeMap;
use tracing::info;
use verso_core::model::{EdgeVersion, GraphVersion, NodeVersion, RichVersion, Tag};

fn built_rich(id: i64, payload: RichVersionPayload, tags: BTreeMap<String, Tag>) -> RichVersion {
    RichVersion {
        id,
        tags,
        structure_version_id: payload.structure_version_id,
        reference: payload.reference,
        reference_parameters: payload.reference_parameters,
    }
}

impl<D: Database> MetadataStore<D> {
    /// Create a new version of a node item and link it under its parents.
    pub fn create_node_version(
        &mut self,
        node_id: i64,
        payload: RichVersionPayload,
        parent_ids: &[i64],
    ) -> Result<NodeVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        let tags = insert_rich_version_tx(&tx, id, &payload)?;
        tx.insert(
            "node_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("node_id", node_id),
            ],
        )?;
        update_tx(&tx, &self.ids, node_id, id, parent_ids)?;

        tx.commit()?;
        info!(version = id, node = node_id, "created node version");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(NodeVersion {
            rich: built_rich(id, payload, tags),
            node_id,
        })
    }

    pub fn retrieve_node_version(&mut self, id: i64) -> Result<NodeVersion, StoreError> {
        let tx = self.db.begin()?;
        let rows = tx
            .select_eq("node_version", &["node_id"], &[ColumnValue::long("id", id)])
            .map_err(|err| match err {
                DbError::NoResults => StoreError::VersionNotFound { id },
                other => StoreError::Db(other),
            })?;
        let node_id = rows[0].get_long(0)?;
        let rich = retrieve_rich_version_tx(&tx, id)?;
        tx.commit()?;

        Ok(NodeVersion { rich, node_id })
    }

    /// Create a new version of an edge item, recording the endpoint node
    /// versions it connects.
    pub fn create_edge_version(
        &mut self,
        edge_id: i64,
        from_node_version_id: i64,
        to_node_version_id: i64,
        payload: RichVersionPayload,
        parent_ids: &[i64],
    ) -> Result<EdgeVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        let tags = insert_rich_version_tx(&tx, id, &payload)?;
        tx.insert(
            "edge_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("edge_id", edge_id),
                ColumnValue::long("from_node_version_id", from_node_version_id),
                ColumnValue::long("to_node_version_id", to_node_version_id),
            ],
        )?;
        update_tx(&tx, &self.ids, edge_id, id, parent_ids)?;

        tx.commit()?;
        info!(version = id, edge = edge_id, "created edge version");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(EdgeVersion {
            rich: built_rich(id, payload, tags),
            edge_id,
            from_node_version_id,
            to_node_version_id,
        })
    }

    pub fn retrieve_edge_version(&mut self, id: i64) -> Result<EdgeVersion, StoreError> {
        let tx = self.db.begin()?;
        let rows = tx
            .select_eq(
                "edge_version",
                &["edge_id", "from_node_version_id", "to_node_version_id"],
                &[ColumnValue::long("id", id)],
            )
            .map_err(|err| match err {
                DbError::NoResults => StoreError::VersionNotFound { id },
                other => StoreError::Db(other),
            })?;
        let row = &rows[0];
        let edge_id = row.get_long(0)?;
        let from_node_version_id = row.get_long(1)?;
        let to_node_version_id = row.get_long(2)?;
        let rich = retrieve_rich_version_tx(&tx, id)?;
        tx.commit()?;

        Ok(EdgeVersion {
            rich,
            edge_id,
            from_node_version_id,
            to_node_version_id,
        })
    }

    /// Create a new version of a graph item, recording the edge versions it
    /// contains.
    pub fn create_graph_version(
        &mut self,
        graph_id: i64,
        edge_version_ids: Vec<i64>,
        payload: RichVersionPayload,
        parent_ids: &[i64],
    ) -> Result<GraphVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        let tags = insert_rich_version_tx(&tx, id, &payload)?;
        tx.insert(
            "graph_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("graph_id", graph_id),
            ],
        )?;
        for &edge_version_id in &edge_version_ids {
            tx.insert(
                "graph_version_edge",
                &[
                    ColumnValue::long("graph_version_id", id),
                    ColumnValue::long("edge_version_id", edge_version_id),
                ],
            )?;
        }
        update_tx(&tx, &self.ids, graph_id, id, parent_ids)?;

        tx.commit()?;
        info!(version = id, graph = graph_id, "created graph version");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(GraphVersion {
            rich: built_rich(id, payload, tags),
            graph_id,
            edge_version_ids,
        })
    }

    pub fn retrieve_graph_version(&mut self, id: i64) -> Result<GraphVersion, StoreError> {
        let tx = self.db.begin()?;
        let rows = tx
            .select_eq(
                "graph_version",
                &["graph_id"],
                &[ColumnValue::long("id", id)],
            )
            .map_err(|err| match err {
                DbError::NoResults => StoreError::VersionNotFound { id },
                other => StoreError::Db(other),
            })?;
        let graph_id = rows[0].get_long(0)?;

        let edge_version_ids = match tx.select_eq(
            "graph_version_edge",
            &["edge_version_id"],
            &[ColumnValue::long("graph_version_id", id)],
        ) {
            Ok(rows) => rows
                .iter()
                .map(|row| row.get_long(0).map_err(StoreError::from))
                .collect::<Result<Vec<_>, _>>()?,
            Err(DbError::NoResults) => Vec::new(),
            Err(err) => return Err(StoreError::Db(err)),
        };

        let rich = retrieve_rich_version_tx(&tx, id)?;
        tx.commit()?;

        Ok(GraphVersion {
            rich,
            graph_id,
            edge_version_ids,
        })
    }
}
