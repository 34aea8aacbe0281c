#![forbid(unsafe_code)]

use super::dag::update_tx;
use super::versions::insert_version_tx;
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx};
use std::collections::BTreeMap;
use tracing::info;
use verso_core::model::{StructureVersion, ValueType};

pub(in crate::store) fn retrieve_structure_version_tx<T: DbTx>(
    tx: &T,
    id: i64,
) -> Result<StructureVersion, StoreError> {
    let rows = tx
        .select_eq(
            "structure_version",
            &["structure_id"],
            &[ColumnValue::long("id", id)],
        )
        .map_err(|err| match err {
            DbError::NoResults => StoreError::VersionNotFound { id },
            other => StoreError::Db(other),
        })?;
    let structure_id = rows[0].get_long(0)?;

    let attribute_rows = tx
        .select_eq(
            "structure_version_attribute",
            &["key", "type"],
            &[ColumnValue::long("structure_version_id", id)],
        )
        .map_err(|err| match err {
            DbError::NoResults => StoreError::InvalidInput("structure version has no attributes"),
            other => StoreError::Db(other),
        })?;

    let mut attributes = BTreeMap::new();
    for row in &attribute_rows {
        let value_type = ValueType::parse(row.get_text(1)?)
            .ok_or(StoreError::InvalidInput("unknown attribute type"))?;
        attributes.insert(row.get_text(0)?.to_string(), value_type);
    }

    Ok(StructureVersion {
        id,
        structure_id,
        attributes,
    })
}

impl<D: Database> MetadataStore<D> {
    /// Create an immutable attribute schema version and link it into the
    /// owning structure item's history.
    pub fn create_structure_version(
        &mut self,
        structure_id: i64,
        attributes: BTreeMap<String, ValueType>,
        parent_ids: &[i64],
    ) -> Result<StructureVersion, StoreError> {
        let id = self.ids.generate_version_id();
        let tx = self.db.begin()?;

        insert_version_tx(&tx, id)?;
        tx.insert(
            "structure_version",
            &[
                ColumnValue::long("id", id),
                ColumnValue::long("structure_id", structure_id),
            ],
        )?;

        for (key, value_type) in &attributes {
            tx.insert(
                "structure_version_attribute",
                &[
                    ColumnValue::long("structure_version_id", id),
                    ColumnValue::text("key", key.clone()),
                    ColumnValue::text("type", value_type.as_str()),
                ],
            )?;
        }

        update_tx(&tx, &self.ids, structure_id, id, parent_ids)?;
        tx.commit()?;
        info!(version = id, structure = structure_id, "created structure version");

        Ok(StructureVersion {
            id,
            structure_id,
            attributes,
        })
    }

    pub fn retrieve_structure_version(&mut self, id: i64) -> Result<StructureVersion, StoreError> {
        let tx = self.db.begin()?;
        let version = retrieve_structure_version_tx(&tx, id)?;
        tx.commit()?;
        Ok(version)
    }
}
