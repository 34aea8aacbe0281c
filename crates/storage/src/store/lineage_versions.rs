#![forbid(unsafe_code)]

use super::dag::update_tx;
use super::rich_versions::{RichVersionPayload, insert_rich_version_tx, retrieve_rich_version_tx};
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx};
use tracing::info;
use verso_core::model::{LineageEdgeVersion, LineageGraphVersion, RichVersion};

impl<D: Database> MetadataStore<D> {
    /// Create a new version of a lineage edge, connecting two rich versions
    /// that may belong to different items.
    pub fn create_lineage_edge_version(
        &mut self,
        lineage_edge_id: i64,
        from_rich_version_id: i64,
        to_rich_version_id: i64,
        payload: RichVersionPayload,
        parent_ids: &[i64],
    ) -> Result<LineageEdgeVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        let tags = insert_rich_version_tx(&tx, id, &payload)?;
        tx.insert(
            "lineage_edge_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("lineage_edge_id", lineage_edge_id),
                ColumnValue::long("from_rich_version_id", from_rich_version_id),
                ColumnValue::long("to_rich_version_id", to_rich_version_id),
            ],
        )?;
        update_tx(&tx, &self.ids, lineage_edge_id, id, parent_ids)?;

        tx.commit()?;
        info!(version = id, lineage_edge = lineage_edge_id, "created lineage edge version");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(LineageEdgeVersion {
            rich: RichVersion {
                id,
                tags,
                structure_version_id: payload.structure_version_id,
                reference: payload.reference,
                reference_parameters: payload.reference_parameters,
            },
            lineage_edge_id,
            from_rich_version_id,
            to_rich_version_id,
        })
    }

    pub fn retrieve_lineage_edge_version(
        &mut self,
        id: i64,
    ) -> Result<LineageEdgeVersion, StoreError> {
        let tx = self.db.begin()?;
        let rows = tx
            .select_eq(
                "lineage_edge_version",
                &[
                    "lineage_edge_id",
                    "from_rich_version_id",
                    "to_rich_version_id",
                ],
                &[ColumnValue::long("id", id)],
            )
            .map_err(|err| match err {
                DbError::NoResults => StoreError::VersionNotFound { id },
                other => StoreError::Db(other),
            })?;
        let row = &rows[0];
        let lineage_edge_id = row.get_long(0)?;
        let from_rich_version_id = row.get_long(1)?;
        let to_rich_version_id = row.get_long(2)?;
        let rich = retrieve_rich_version_tx(&tx, id)?;
        tx.commit()?;

        Ok(LineageEdgeVersion {
            rich,
            lineage_edge_id,
            from_rich_version_id,
            to_rich_version_id,
        })
    }

    /// Create a new version of a lineage graph, recording the lineage edge
    /// versions it contains.
    pub fn create_lineage_graph_version(
        &mut self,
        lineage_graph_id: i64,
        lineage_edge_version_ids: Vec<i64>,
        payload: RichVersionPayload,
        parent_ids: &[i64],
    ) -> Result<LineageGraphVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        let tags = insert_rich_version_tx(&tx, id, &payload)?;
        tx.insert(
            "lineage_graph_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("lineage_graph_id", lineage_graph_id),
            ],
        )?;
        for &edge_version_id in &lineage_edge_version_ids {
            tx.insert(
                "lineage_graph_version_edge",
                &[
                    ColumnValue::long("lineage_graph_version_id", id),
                    ColumnValue::long("lineage_edge_version_id", edge_version_id),
                ],
            )?;
        }
        update_tx(&tx, &self.ids, lineage_graph_id, id, parent_ids)?;

        tx.commit()?;
        info!(version = id, lineage_graph = lineage_graph_id, "created lineage graph version");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(LineageGraphVersion {
            rich: RichVersion {
                id,
                tags,
                structure_version_id: payload.structure_version_id,
                reference: payload.reference,
                reference_parameters: payload.reference_parameters,
            },
            lineage_graph_id,
            lineage_edge_version_ids,
        })
    }

    pub fn retrieve_lineage_graph_version(
        &mut self,
        id: i64,
    ) -> Result<LineageGraphVersion, StoreError> {
        let tx = self.db.begin()?;
        let rows = tx
            .select_eq(
                "lineage_graph_version",
                &["lineage_graph_id"],
                &[ColumnValue::long("id", id)],
            )
            .map_err(|err| match err {
                DbError::NoResults => StoreError::VersionNotFound { id },
                other => StoreError::Db(other),
            })?;
        let lineage_graph_id = rows[0].get_long(0)?;

        let lineage_edge_version_ids = match tx.select_eq(
            "lineage_graph_version_edge",
            &["lineage_edge_version_id"],
            &[ColumnValue::long("lineage_graph_version_id", id)],
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

        Ok(LineageGraphVersion {
            rich,
            lineage_graph_id,
            lineage_edge_version_ids,
        })
    }
}
