#![forbid(unsafe_code)]

use super::StoreError;
use crate::db::{ColumnValue, DbError, DbTx};
use crate::ids::IdGenerator;
use verso_core::ROOT_VERSION_ID;
use verso_core::model::VersionSuccessor;

pub(in crate::store) fn insert_version_tx<T: DbTx>(tx: &T, id: i64) -> Result<(), StoreError> {
    tx.insert("version", &[ColumnValue::long("id", id)])?;
    Ok(())
}

pub(in crate::store) fn version_exists_tx<T: DbTx>(tx: &T, id: i64) -> Result<bool, StoreError> {
    match tx.select_eq("version", &["id"], &[ColumnValue::long("id", id)]) {
        Ok(_) => Ok(true),
        Err(DbError::NoResults) => Ok(false),
        Err(err) => Err(StoreError::Db(err)),
    }
}

/// Persist a successor edge. Both endpoints must already exist as versions;
/// the root sentinel is exempt on the `from` side. Nothing is written when
/// the check fails.
pub(in crate::store) fn create_successor_tx<T: DbTx>(
    tx: &T,
    ids: &IdGenerator,
    from_id: i64,
    to_id: i64,
) -> Result<VersionSuccessor, StoreError> {
    if from_id != ROOT_VERSION_ID && !version_exists_tx(tx, from_id)? {
        return Err(StoreError::InvalidVersionReference {
            version_id: from_id,
        });
    }
    if !version_exists_tx(tx, to_id)? {
        return Err(StoreError::InvalidVersionReference { version_id: to_id });
    }

    let id = ids.generate_successor_id();
    tx.insert(
        "version_successor",
        &[
            ColumnValue::long("id", id),
            ColumnValue::long("from_version_id", from_id),
            ColumnValue::long("to_version_id", to_id),
        ],
    )?;

    Ok(VersionSuccessor { id, from_id, to_id })
}

pub(in crate::store) fn retrieve_successor_tx<T: DbTx>(
    tx: &T,
    id: i64,
) -> Result<VersionSuccessor, StoreError> {
    let rows = tx.select_eq(
        "version_successor",
        &["from_version_id", "to_version_id"],
        &[ColumnValue::long("id", id)],
    )?;
    let row = &rows[0];

    Ok(VersionSuccessor {
        id,
        from_id: row.get_long(0)?,
        to_id: row.get_long(1)?,
    })
}

/// Remove every successor edge pointing at `to_id` together with its DAG
/// membership row. A destination with no incoming edges is benign; during
/// truncation the root-level boundary may already be fully detached.
pub(in crate::store) fn delete_successors_by_destination_tx<T: DbTx>(
    tx: &T,
    to_id: i64,
) -> Result<(), StoreError> {
    let rows = match tx.select_eq(
        "version_successor",
        &["id"],
        &[ColumnValue::long("to_version_id", to_id)],
    ) {
        Ok(rows) => rows,
        Err(DbError::NoResults) => return Ok(()),
        Err(err) => return Err(StoreError::Db(err)),
    };

    for row in &rows {
        let successor_id = row.get_long(0)?;
        tx.delete(
            "version_history_dag",
            &[ColumnValue::long("version_successor_id", successor_id)],
        )?;
        tx.delete("version_successor", &[ColumnValue::long("id", successor_id)])?;
    }
    Ok(())
}
