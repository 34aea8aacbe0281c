#![forbid(unsafe_code)]

use rusqlite::Connection;

const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS item (
          id INTEGER PRIMARY KEY,
          kind TEXT NOT NULL,
          name TEXT NOT NULL,
          source_key TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS item_tag (
          item_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          value TEXT,
          type TEXT,
          PRIMARY KEY (item_id, key)
        );

        CREATE TABLE IF NOT EXISTS version (
          id INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS version_successor (
          id INTEGER PRIMARY KEY,
          from_version_id INTEGER NOT NULL,
          to_version_id INTEGER NOT NULL
        );

        -- Membership of successor edges in a specific item's history.
        CREATE TABLE IF NOT EXISTS version_history_dag (
          item_id INTEGER NOT NULL,
          version_successor_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rich_version (
          id INTEGER PRIMARY KEY,
          structure_version_id INTEGER,
          reference TEXT
        );

        CREATE TABLE IF NOT EXISTS rich_version_tag (
          rich_version_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          value TEXT,
          type TEXT,
          PRIMARY KEY (rich_version_id, key)
        );

        CREATE TABLE IF NOT EXISTS rich_version_external_parameter (
          rich_version_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          PRIMARY KEY (rich_version_id, key)
        );

        CREATE TABLE IF NOT EXISTS structure_version (
          id INTEGER PRIMARY KEY,
          structure_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS structure_version_attribute (
          structure_version_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          type TEXT NOT NULL,
          PRIMARY KEY (structure_version_id, key)
        );

        CREATE TABLE IF NOT EXISTS node_version (
          id INTEGER PRIMARY KEY,
          node_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS edge_version (
          id INTEGER PRIMARY KEY,
          edge_id INTEGER NOT NULL,
          from_node_version_id INTEGER NOT NULL,
          to_node_version_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS graph_version (
          id INTEGER PRIMARY KEY,
          graph_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS graph_version_edge (
          graph_version_id INTEGER NOT NULL,
          edge_version_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lineage_edge_version (
          id INTEGER PRIMARY KEY,
          lineage_edge_id INTEGER NOT NULL,
          from_rich_version_id INTEGER NOT NULL,
          to_rich_version_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lineage_graph_version (
          id INTEGER PRIMARY KEY,
          lineage_graph_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lineage_graph_version_edge (
          lineage_graph_version_id INTEGER NOT NULL,
          lineage_edge_version_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_version_history_dag_item
          ON version_history_dag(item_id);
        CREATE INDEX IF NOT EXISTS idx_version_successor_to
          ON version_successor(to_version_id);
        CREATE INDEX IF NOT EXISTS idx_item_tag_key ON item_tag(key);
        CREATE INDEX IF NOT EXISTS idx_rich_version_tag_key
          ON rich_version_tag(key);
"#;

pub(crate) fn install(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SQL)
}
