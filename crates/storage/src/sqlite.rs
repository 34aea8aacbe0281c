#![forbid(unsafe_code)]

use crate::db::{ColumnValue, Database, DbError, DbTx, DbValue, Row};
use crate::schema;
use crate::store::StoreError;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, Transaction, params_from_iter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite-backed persistence adapter. Relation and column names come from
/// the engine's own code; caller-supplied values are always bound as
/// parameters.
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteDatabase {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("verso.db");
        let conn = Connection::open(db_path).map_err(map_sqlite_err)?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(map_sqlite_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\n             PRAGMA synchronous=NORMAL;\n             PRAGMA foreign_keys=ON;",
        )
        .map_err(map_sqlite_err)?;

        schema::install(&conn).map_err(map_sqlite_err)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

impl Database for SqliteDatabase {
    type Tx<'a>
        = SqliteTx<'a>
    where
        Self: 'a;

    fn begin(&mut self) -> Result<SqliteTx<'_>, DbError> {
        let tx = self.conn.transaction().map_err(map_db_err)?;
        Ok(SqliteTx { tx })
    }
}

pub struct SqliteTx<'a> {
    tx: Transaction<'a>,
}

impl DbTx for SqliteTx<'_> {
    fn insert(&self, relation: &str, values: &[ColumnValue]) -> Result<(), DbError> {
        let columns = values
            .iter()
            .map(|value| value.column)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO {relation}({columns}) VALUES ({placeholders})");

        self.tx
            .execute(&sql, params_from_iter(values.iter().map(|value| &value.value)))
            .map_err(map_db_err)?;
        Ok(())
    }

    fn select_eq(
        &self,
        relation: &str,
        columns: &[&str],
        predicates: &[ColumnValue],
    ) -> Result<Vec<Row>, DbError> {
        let mut sql = format!("SELECT {} FROM {relation}", columns.join(", "));
        if !predicates.is_empty() {
            let clauses = predicates
                .iter()
                .enumerate()
                .map(|(index, predicate)| format!("{} = ?{}", predicate.column, index + 1))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&clauses);
        }

        let mut stmt = self.tx.prepare(&sql).map_err(map_db_err)?;
        let mut rows = stmt
            .query(params_from_iter(
                predicates.iter().map(|predicate| &predicate.value),
            ))
            .map_err(map_db_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_db_err)? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(read_value(row.get_ref(index).map_err(map_db_err)?)?);
            }
            out.push(Row::new(values));
        }

        if out.is_empty() {
            return Err(DbError::NoResults);
        }
        Ok(out)
    }

    fn delete(&self, relation: &str, predicates: &[ColumnValue]) -> Result<(), DbError> {
        let clauses = predicates
            .iter()
            .enumerate()
            .map(|(index, predicate)| format!("{} = ?{}", predicate.column, index + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("DELETE FROM {relation} WHERE {clauses}");

        self.tx
            .execute(
                &sql,
                params_from_iter(predicates.iter().map(|predicate| &predicate.value)),
            )
            .map_err(map_db_err)?;
        Ok(())
    }

    fn commit(self) -> Result<(), DbError> {
        self.tx.commit().map_err(map_db_err)
    }
}

impl ToSql for DbValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Long(value) => Ok(ToSqlOutput::from(*value)),
            Self::Text(value) => Ok(ToSqlOutput::from(value.as_str())),
            Self::Null => Ok(ToSqlOutput::Owned(Value::Null)),
        }
    }
}

fn read_value(value: ValueRef<'_>) -> Result<DbValue, DbError> {
    match value {
        ValueRef::Null => Ok(DbValue::Null),
        ValueRef::Integer(value) => Ok(DbValue::Long(value)),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(DbValue::Text(text.to_string())),
            Err(err) => Err(DbError::Backend(format!("invalid utf-8 in text column: {err}"))),
        },
        other => Err(DbError::Backend(format!(
            "unsupported column value: {other:?}"
        ))),
    }
}

fn map_db_err(err: rusqlite::Error) -> DbError {
    DbError::Backend(err.to_string())
}

fn map_sqlite_err(err: rusqlite::Error) -> StoreError {
    StoreError::Db(map_db_err(err))
}
