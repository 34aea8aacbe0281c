#![forbid(unsafe_code)]

use crate::db::DbError;
use verso_core::model::ConformanceError;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Db(DbError),
    InvalidInput(&'static str),
    DuplicateItem {
        source_key: String,
    },
    ItemNotFound {
        field: &'static str,
        value: String,
    },
    VersionNotFound {
        id: i64,
    },
    InvalidParent {
        parent_id: i64,
        item_id: i64,
    },
    InvalidVersionReference {
        version_id: i64,
    },
    StructureConformance(ConformanceError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Db(err) => write!(f, "db: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::DuplicateItem { source_key } => {
                write!(f, "an item with source key {source_key} already exists")
            }
            Self::ItemNotFound { field, value } => {
                write!(f, "no item found with {field} {value}")
            }
            Self::VersionNotFound { id } => write!(f, "no version found with id {id}"),
            Self::InvalidParent { parent_id, item_id } => {
                write!(f, "parent {parent_id} is not in item {item_id}")
            }
            Self::InvalidVersionReference { version_id } => {
                write!(f, "version {version_id} does not exist")
            }
            Self::StructureConformance(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ConformanceError> for StoreError {
    fn from(value: ConformanceError) -> Self {
        Self::StructureConformance(value)
    }
}
