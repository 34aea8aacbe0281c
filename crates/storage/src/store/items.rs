#![forbid(unsafe_code)]

use super::dag::{retrieve_dag_tx, truncate_tx, update_tx};
use super::tags::{TagNamespace, insert_tags_tx, tags_by_owner_tx};
use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx, Row};
use std::collections::BTreeMap;
use tracing::info;
use verso_core::model::{Item, ItemKind, Tag};

const ITEM_COLUMNS: [&str; 4] = ["id", "kind", "name", "source_key"];

fn item_from_row<T: DbTx>(tx: &T, row: &Row) -> Result<Item, StoreError> {
    let id = row.get_long(0)?;
    let kind = ItemKind::parse(row.get_text(1)?)
        .ok_or(StoreError::InvalidInput("unknown item kind"))?;
    let name = row.get_text(2)?.to_string();
    let source_key = row.get_text(3)?.to_string();
    let tags = tags_by_owner_tx(tx, TagNamespace::Item, id)?;

    Ok(Item {
        id,
        kind,
        name,
        source_key,
        tags,
    })
}

pub(in crate::store) fn retrieve_item_by_source_key_tx<T: DbTx>(
    tx: &T,
    source_key: &str,
) -> Result<Item, StoreError> {
    let rows = tx
        .select_eq(
            "item",
            &ITEM_COLUMNS,
            &[ColumnValue::text("source_key", source_key)],
        )
        .map_err(|err| match err {
            DbError::NoResults => StoreError::ItemNotFound {
                field: "source_key",
                value: source_key.to_string(),
            },
            other => StoreError::Db(other),
        })?;
    item_from_row(tx, &rows[0])
}

pub(in crate::store) fn retrieve_item_by_id_tx<T: DbTx>(
    tx: &T,
    id: i64,
) -> Result<Item, StoreError> {
    let rows = tx
        .select_eq("item", &ITEM_COLUMNS, &[ColumnValue::long("id", id)])
        .map_err(|err| match err {
            DbError::NoResults => StoreError::ItemNotFound {
                field: "id",
                value: id.to_string(),
            },
            other => StoreError::Db(other),
        })?;
    item_from_row(tx, &rows[0])
}

pub(in crate::store) fn retrieve_item_kind_tx<T: DbTx>(
    tx: &T,
    id: i64,
) -> Result<ItemKind, StoreError> {
    let rows = tx
        .select_eq("item", &["kind"], &[ColumnValue::long("id", id)])
        .map_err(|err| match err {
            DbError::NoResults => StoreError::ItemNotFound {
                field: "id",
                value: id.to_string(),
            },
            other => StoreError::Db(other),
        })?;
    ItemKind::parse(rows[0].get_text(0)?).ok_or(StoreError::InvalidInput("unknown item kind"))
}

impl<D: Database> MetadataStore<D> {
    /// Create a named item. The source key must be new; item-level tags are
    /// fixed at creation time.
    pub fn create_item(
        &mut self,
        kind: ItemKind,
        name: &str,
        source_key: &str,
        tags: BTreeMap<String, Tag>,
    ) -> Result<Item, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }
        if source_key.trim().is_empty() {
            return Err(StoreError::InvalidInput("source key must not be empty"));
        }

        let id = self.ids.generate_item_id();
        let tx = self.db.begin()?;

        match tx.select_eq("item", &["id"], &[ColumnValue::text("source_key", source_key)]) {
            Ok(_) => {
                return Err(StoreError::DuplicateItem {
                    source_key: source_key.to_string(),
                });
            }
            Err(DbError::NoResults) => {}
            Err(err) => return Err(StoreError::Db(err)),
        }

        tx.insert(
            "item",
            &[
                ColumnValue::long("id", id),
                ColumnValue::text("kind", kind.as_str()),
                ColumnValue::text("name", name),
                ColumnValue::text("source_key", source_key),
            ],
        )?;

        let tags: BTreeMap<String, Tag> = tags
            .into_iter()
            .map(|(key, tag)| (key.clone(), Tag::new(id, key, tag.value)))
            .collect();
        insert_tags_tx(&tx, TagNamespace::Item, id, &tags)?;

        tx.commit()?;
        info!(item = id, kind = kind.as_str(), name, "created item");
        self.notify_tag_index(tags.keys().map(String::as_str), id);

        Ok(Item {
            id,
            kind,
            name: name.to_string(),
            source_key: source_key.to_string(),
            tags,
        })
    }

    pub fn retrieve_item(&mut self, source_key: &str) -> Result<Item, StoreError> {
        let tx = self.db.begin()?;
        let item = retrieve_item_by_source_key_tx(&tx, source_key)?;
        tx.commit()?;
        info!(item = item.id, source_key, "retrieved item");
        Ok(item)
    }

    pub fn retrieve_item_by_id(&mut self, id: i64) -> Result<Item, StoreError> {
        let tx = self.db.begin()?;
        let item = retrieve_item_by_id_tx(&tx, id)?;
        tx.commit()?;
        Ok(item)
    }

    /// Current heads of the item with the given source key.
    pub fn item_leaves(&mut self, source_key: &str) -> Result<Vec<i64>, StoreError> {
        let tx = self.db.begin()?;
        let item = retrieve_item_by_source_key_tx(&tx, source_key)?;
        let leaves = retrieve_dag_tx(&tx, item.id)?.leaves();
        tx.commit()?;
        Ok(leaves)
    }

    /// Bound the history of the item with the given source key.
    pub fn truncate_item(
        &mut self,
        source_key: &str,
        num_levels: usize,
    ) -> Result<(), StoreError> {
        if num_levels == 0 {
            return Err(StoreError::InvalidInput("num_levels must be positive"));
        }

        let tx = self.db.begin()?;
        let item = retrieve_item_by_source_key_tx(&tx, source_key)?;
        truncate_tx(&tx, &self.ids, item.id, num_levels, item.kind)?;
        tx.commit()?;
        Ok(())
    }

    /// Link a new version into the item's history, resolving the item by
    /// source key first.
    pub fn update_item(
        &mut self,
        source_key: &str,
        child_id: i64,
        parent_ids: &[i64],
    ) -> Result<(), StoreError> {
        let tx = self.db.begin()?;
        let item = retrieve_item_by_source_key_tx(&tx, source_key)?;
        update_tx(&tx, &self.ids, item.id, child_id, parent_ids)?;
        tx.commit()?;
        Ok(())
    }
}
