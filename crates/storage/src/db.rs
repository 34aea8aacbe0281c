#![forbid(unsafe_code)]

/// A single column value, as written to or read from a relation.
#[derive(Clone, Debug, PartialEq)]
pub enum DbValue {
    Long(i64),
    Text(String),
    Null,
}

/// One named column binding, used both for inserts and for equality
/// predicates.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnValue {
    pub column: &'static str,
    pub value: DbValue,
}

impl ColumnValue {
    pub fn long(column: &'static str, value: i64) -> Self {
        Self {
            column,
            value: DbValue::Long(value),
        }
    }

    pub fn text(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: DbValue::Text(value.into()),
        }
    }

    pub fn opt_long(column: &'static str, value: Option<i64>) -> Self {
        Self {
            column,
            value: match value {
                Some(value) => DbValue::Long(value),
                None => DbValue::Null,
            },
        }
    }

    pub fn opt_text(column: &'static str, value: Option<&str>) -> Self {
        Self {
            column,
            value: match value {
                Some(value) => DbValue::Text(value.to_string()),
                None => DbValue::Null,
            },
        }
    }
}

/// A positional result row. Columns appear in the order they were selected.
#[derive(Clone, Debug, Default)]
pub struct Row {
    values: Vec<DbValue>,
}

impl Row {
    pub fn new(values: Vec<DbValue>) -> Self {
        Self { values }
    }

    pub fn get_long(&self, index: usize) -> Result<i64, DbError> {
        match self.values.get(index) {
            Some(DbValue::Long(value)) => Ok(*value),
            other => Err(Self::mismatch(index, "integer", other)),
        }
    }

    pub fn get_opt_long(&self, index: usize) -> Result<Option<i64>, DbError> {
        match self.values.get(index) {
            Some(DbValue::Long(value)) => Ok(Some(*value)),
            Some(DbValue::Null) => Ok(None),
            other => Err(Self::mismatch(index, "integer or null", other)),
        }
    }

    pub fn get_text(&self, index: usize) -> Result<&str, DbError> {
        match self.values.get(index) {
            Some(DbValue::Text(value)) => Ok(value),
            other => Err(Self::mismatch(index, "text", other)),
        }
    }

    pub fn get_opt_text(&self, index: usize) -> Result<Option<&str>, DbError> {
        match self.values.get(index) {
            Some(DbValue::Text(value)) => Ok(Some(value)),
            Some(DbValue::Null) => Ok(None),
            other => Err(Self::mismatch(index, "text or null", other)),
        }
    }

    fn mismatch(index: usize, expected: &str, found: Option<&DbValue>) -> DbError {
        DbError::Backend(format!(
            "column {index} is not {expected} (found {found:?})"
        ))
    }
}

#[derive(Debug)]
pub enum DbError {
    /// The query ran but matched nothing. Signaled distinctly so callers can
    /// tell "not found" from "query failed".
    NoResults,
    Backend(String),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResults => write!(f, "no results found for query"),
            Self::Backend(message) => write!(f, "backend: {message}"),
        }
    }
}

impl std::error::Error for DbError {}

/// A persistence backend. Each engine operation runs inside exactly one
/// transaction obtained from `begin`.
pub trait Database {
    type Tx<'a>: DbTx
    where
        Self: 'a;

    fn begin(&mut self) -> Result<Self::Tx<'_>, DbError>;
}

/// Transaction-scoped persistence primitives over named relations. Dropping
/// an uncommitted transaction aborts it.
pub trait DbTx {
    fn insert(&self, relation: &str, values: &[ColumnValue]) -> Result<(), DbError>;

    /// Select `columns` from `relation` where every predicate matches by
    /// equality. An empty result is `Err(DbError::NoResults)`.
    fn select_eq(
        &self,
        relation: &str,
        columns: &[&str],
        predicates: &[ColumnValue],
    ) -> Result<Vec<Row>, DbError>;

    fn delete(&self, relation: &str, predicates: &[ColumnValue]) -> Result<(), DbError>;

    fn commit(self) -> Result<(), DbError>;
}
