#![forbid(unsafe_code)]

mod db;
mod ids;
mod schema;
mod sqlite;
mod store;

pub use db::{ColumnValue, Database, DbError, DbTx, DbValue, Row};
pub use ids::IdGenerator;
pub use sqlite::{SqliteDatabase, SqliteTx};
pub use store::*;
