#![forbid(unsafe_code)]

use super::structures::retrieve_structure_version_tx;
use super::tags::{TagNamespace, insert_tags_tx, tags_by_owner_tx};
use super::versions::insert_version_tx;
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx};
use std::collections::BTreeMap;
use verso_core::model::{RichVersion, Tag, check_structure_tags};

/// The rich-version fields shared by every version kind: tags, an optional
/// structure to conform to, and an optional external reference with its
/// access parameters.
#[derive(Clone, Debug, Default)]
pub struct RichVersionPayload {
    pub tags: BTreeMap<String, Tag>,
    pub structure_version_id: Option<i64>,
    pub reference: Option<String>,
    pub reference_parameters: BTreeMap<String, String>,
}

/// Persist the bare version fact and the rich-version data for `id`. When a
/// structure is declared, the tags must conform before anything beyond the
/// version fact is written; the surrounding transaction discards even that
/// on failure. Returns the tags re-keyed to the new version id.
pub(in crate::store) fn insert_rich_version_tx<T: DbTx>(
    tx: &T,
    id: i64,
    payload: &RichVersionPayload,
) -> Result<BTreeMap<String, Tag>, StoreError> {
    insert_version_tx(tx, id)?;

    if let Some(structure_version_id) = payload.structure_version_id {
        let structure = retrieve_structure_version_tx(tx, structure_version_id)?;
        check_structure_tags(&structure, &payload.tags)?;
    }

    tx.insert(
        "rich_version",
        &[
            ColumnValue::long("id", id),
            ColumnValue::opt_long("structure_version_id", payload.structure_version_id),
            ColumnValue::opt_text("reference", payload.reference.as_deref()),
        ],
    )?;

    let tags: BTreeMap<String, Tag> = payload
        .tags
        .iter()
        .map(|(key, tag)| (key.clone(), Tag::new(id, key.clone(), tag.value.clone())))
        .collect();
    insert_tags_tx(tx, TagNamespace::Version, id, &tags)?;

    for (key, value) in &payload.reference_parameters {
        tx.insert(
            "rich_version_external_parameter",
            &[
                ColumnValue::long("rich_version_id", id),
                ColumnValue::text("key", key.clone()),
                ColumnValue::text("value", value.clone()),
            ],
        )?;
    }

    Ok(tags)
}

pub(in crate::store) fn retrieve_rich_version_tx<T: DbTx>(
    tx: &T,
    id: i64,
) -> Result<RichVersion, StoreError> {
    let rows = tx
        .select_eq(
            "rich_version",
            &["structure_version_id", "reference"],
            &[ColumnValue::long("id", id)],
        )
        .map_err(|err| match err {
            DbError::NoResults => StoreError::VersionNotFound { id },
            other => StoreError::Db(other),
        })?;
    let row = &rows[0];
    let structure_version_id = row.get_opt_long(0)?;
    let reference = row.get_opt_text(1)?.map(str::to_string);

    let reference_parameters = match tx.select_eq(
        "rich_version_external_parameter",
        &["key", "value"],
        &[ColumnValue::long("rich_version_id", id)],
    ) {
        Ok(rows) => {
            let mut out = BTreeMap::new();
            for row in &rows {
                out.insert(row.get_text(0)?.to_string(), row.get_text(1)?.to_string());
            }
            out
        }
        Err(DbError::NoResults) => BTreeMap::new(),
        Err(err) => return Err(StoreError::Db(err)),
    };

    let tags = tags_by_owner_tx(tx, TagNamespace::Version, id)?;

    Ok(RichVersion {
        id,
        tags,
        structure_version_id,
        reference,
        reference_parameters,
    })
}

impl<D: Database> MetadataStore<D> {
    pub fn retrieve_rich_version(&mut self, id: i64) -> Result<RichVersion, StoreError> {
        let tx = self.db.begin()?;
        let version = retrieve_rich_version_tx(&tx, id)?;
        tx.commit()?;
        Ok(version)
    }
}
