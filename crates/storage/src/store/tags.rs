#![forbid(unsafe_code)]

use super::{MetadataStore, StoreError};
use crate::db::{ColumnValue, Database, DbError, DbTx, DbValue};
use std::collections::BTreeMap;
use verso_core::model::{Tag, TagValue, ValueType};

/// Item tags and rich-version tags share one physical row shape; only the
/// relation and the owning-id column differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::store) enum TagNamespace {
    Item,
    Version,
}

impl TagNamespace {
    fn relation(self) -> &'static str {
        match self {
            Self::Item => "item_tag",
            Self::Version => "rich_version_tag",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Item => "item_id",
            Self::Version => "rich_version_id",
        }
    }
}

pub(in crate::store) fn encode_tag_value(value: &TagValue) -> String {
    match value {
        TagValue::String(value) => serde_json::Value::from(value.as_str()).to_string(),
        TagValue::Integer(value) => serde_json::Value::from(*value).to_string(),
        TagValue::Long(value) => serde_json::Value::from(*value).to_string(),
        TagValue::Boolean(value) => serde_json::Value::from(*value).to_string(),
    }
}

pub(in crate::store) fn decode_tag_value(
    value_type: ValueType,
    raw: &str,
) -> Result<TagValue, StoreError> {
    let parsed: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| StoreError::InvalidInput("malformed tag value"))?;

    let value = match value_type {
        ValueType::String => parsed.as_str().map(|value| TagValue::String(value.to_string())),
        ValueType::Integer => parsed
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .map(TagValue::Integer),
        ValueType::Long => parsed.as_i64().map(TagValue::Long),
        ValueType::Boolean => parsed.as_bool().map(TagValue::Boolean),
    };

    value.ok_or(StoreError::InvalidInput(
        "tag value does not match its declared type",
    ))
}

pub(in crate::store) fn insert_tags_tx<T: DbTx>(
    tx: &T,
    namespace: TagNamespace,
    owner_id: i64,
    tags: &BTreeMap<String, Tag>,
) -> Result<(), StoreError> {
    for (key, tag) in tags {
        let (value, value_type) = match &tag.value {
            Some(value) => (
                DbValue::Text(encode_tag_value(value)),
                DbValue::Text(value.value_type().as_str().to_string()),
            ),
            None => (DbValue::Null, DbValue::Null),
        };

        tx.insert(
            namespace.relation(),
            &[
                ColumnValue::long(namespace.owner_column(), owner_id),
                ColumnValue::text("key", key.clone()),
                ColumnValue {
                    column: "value",
                    value,
                },
                ColumnValue {
                    column: "type",
                    value: value_type,
                },
            ],
        )?;
    }
    Ok(())
}

pub(in crate::store) fn tags_by_owner_tx<T: DbTx>(
    tx: &T,
    namespace: TagNamespace,
    owner_id: i64,
) -> Result<BTreeMap<String, Tag>, StoreError> {
    let rows = match tx.select_eq(
        namespace.relation(),
        &["key", "value", "type"],
        &[ColumnValue::long(namespace.owner_column(), owner_id)],
    ) {
        Ok(rows) => rows,
        Err(DbError::NoResults) => return Ok(BTreeMap::new()),
        Err(err) => return Err(StoreError::Db(err)),
    };

    let mut out = BTreeMap::new();
    for row in &rows {
        let key = row.get_text(0)?.to_string();
        let value = match (row.get_opt_text(1)?, row.get_opt_text(2)?) {
            (Some(raw), Some(type_name)) => {
                let value_type = ValueType::parse(type_name)
                    .ok_or(StoreError::InvalidInput("unknown tag value type"))?;
                Some(decode_tag_value(value_type, raw)?)
            }
            _ => None,
        };
        out.insert(key.clone(), Tag::new(owner_id, key, value));
    }
    Ok(out)
}

pub(in crate::store) fn ids_by_tag_tx<T: DbTx>(
    tx: &T,
    namespace: TagNamespace,
    key: &str,
) -> Result<Vec<i64>, StoreError> {
    let rows = match tx.select_eq(
        namespace.relation(),
        &[namespace.owner_column()],
        &[ColumnValue::text("key", key)],
    ) {
        Ok(rows) => rows,
        Err(DbError::NoResults) => return Ok(Vec::new()),
        Err(err) => return Err(StoreError::Db(err)),
    };

    rows.iter()
        .map(|row| row.get_long(0).map_err(StoreError::from))
        .collect()
}

impl<D: Database> MetadataStore<D> {
    /// Item ids carrying a tag with the given key.
    pub fn item_ids_by_tag(&mut self, key: &str) -> Result<Vec<i64>, StoreError> {
        let tx = self.db.begin()?;
        let ids = ids_by_tag_tx(&tx, TagNamespace::Item, key)?;
        tx.commit()?;
        Ok(ids)
    }

    /// Rich-version ids carrying a tag with the given key.
    pub fn version_ids_by_tag(&mut self, key: &str) -> Result<Vec<i64>, StoreError> {
        let tx = self.db.begin()?;
        let ids = ids_by_tag_tx(&tx, TagNamespace::Version, key)?;
        tx.commit()?;
        Ok(ids)
    }

    pub fn item_tags(&mut self, item_id: i64) -> Result<BTreeMap<String, Tag>, StoreError> {
        let tx = self.db.begin()?;
        let tags = tags_by_owner_tx(&tx, TagNamespace::Item, item_id)?;
        tx.commit()?;
        Ok(tags)
    }

    pub fn version_tags(&mut self, version_id: i64) -> Result<BTreeMap<String, Tag>, StoreError> {
        let tx = self.db.begin()?;
        let tags = tags_by_owner_tx(&tx, TagNamespace::Version, version_id)?;
        tx.commit()?;
        Ok(tags)
    }
}
