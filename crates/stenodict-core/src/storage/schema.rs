//! SQLite schema for dictionary files
//!
//! A dictionary is a single table. The secondary indexes are not part of
//! table creation; they are added the first time a query needs them, so
//! dictionaries that are written often and searched rarely don't pay for
//! index maintenance.

use rusqlite::{Connection, Result};

/// Index on stroke count, used for the longest-key query
pub const LENGTH_INDEX: &str = "dict_length";

/// Index on translation, used for reverse lookups
pub const TRANSLATION_INDEX: &str = "dict_translation";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS dict (
        outline TEXT PRIMARY KEY NOT NULL,
        translation TEXT NOT NULL,
        length INTEGER NOT NULL
    );
"#;

const CREATE_LENGTH_INDEX: &str = "CREATE INDEX IF NOT EXISTS dict_length ON dict (length)";

const CREATE_TRANSLATION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS dict_translation ON dict (translation)";

/// Create the dictionary table if it doesn't exist
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE)
}

pub fn create_length_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_LENGTH_INDEX)
}

pub fn create_translation_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TRANSLATION_INDEX)
}

/// Check whether a named index exists
pub fn index_exists(conn: &Connection, name: &str) -> bool {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1")
        .and_then(|mut stmt| stmt.exists([name]))
        .unwrap_or(false)
}
