#![forbid(unsafe_code)]

mod core_versions;
mod dag;
mod error;
mod items;
mod lineage_versions;
mod rich_versions;
mod structures;
mod tags;
mod versions;

pub use error::StoreError;
pub use rich_versions::RichVersionPayload;

use crate::db::Database;
use crate::ids::IdGenerator;
use crate::sqlite::SqliteDatabase;
use std::path::Path;

/// Optional secondary index notified of (tag key, owner id) pairs after a
/// successful commit. An accelerator for reverse lookups; correctness never
/// depends on it.
pub trait TagIndex {
    fn tag_added(&self, key: &str, owner_id: i64);
}

/// The versioned metadata engine: items, their version history DAGs, rich
/// versions, structure schemas and tags, written once against the
/// persistence contract. Every public operation runs in a single
/// transaction of the injected backend.
pub struct MetadataStore<D: Database> {
    db: D,
    ids: IdGenerator,
    tag_index: Option<Box<dyn TagIndex>>,
}

pub type SqliteMetadataStore = MetadataStore<SqliteDatabase>;

impl MetadataStore<SqliteDatabase> {
    pub fn open(storage_dir: impl AsRef<Path>, machine_id: u16) -> Result<Self, StoreError> {
        let db = SqliteDatabase::open(storage_dir)?;
        Ok(Self::new(db, IdGenerator::new(machine_id)))
    }
}

impl<D: Database> MetadataStore<D> {
    pub fn new(db: D, ids: IdGenerator) -> Self {
        Self {
            db,
            ids,
            tag_index: None,
        }
    }

    pub fn set_tag_index(&mut self, index: Box<dyn TagIndex>) {
        self.tag_index = Some(index);
    }

    fn notify_tag_index<'a>(&self, keys: impl Iterator<Item = &'a str>, owner_id: i64) {
        if let Some(index) = &self.tag_index {
            for key in keys {
                index.tag_added(key, owner_id);
            }
        }
    }
}
