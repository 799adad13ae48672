//! Store engine
//!
//! Owns the single SQLite connection behind a dictionary and exposes the
//! table primitives the dictionary layer is built from. Keys arrive here
//! already joined; the engine never sees stroke lists.
//!
//! ## Transactions
//!
//! On a file target, the first write opens a transaction that stays pending
//! until [`StoreEngine::commit`]. Dropping the engine with pending writes
//! discards them. On the memory target each write settles immediately, since
//! there is nothing to make durable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::error::{DictResult, DictionaryError};
use super::{schema, temp_path_for};
use crate::outline::key_length;

/// Where a connection points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Transient in-memory database
    Memory,
    /// Database file on disk
    File(PathBuf),
}

impl Target {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Target::File(path.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Memory => f.write_str(":memory:"),
            Target::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Connection owner for one dictionary table
#[derive(Default)]
pub struct StoreEngine {
    conn: Option<Connection>,
    target: Option<Target>,
    length_indexed: bool,
    translation_indexed: bool,
}

impl StoreEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The target of the live connection, if any
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn is_connected_to(&self, target: &Target) -> bool {
        self.conn.is_some() && self.target.as_ref() == Some(target)
    }

    /// Connect to `target`, creating the table if absent
    ///
    /// No-op when already connected to `target`. Otherwise the new
    /// connection is fully set up before the old one is dropped, so a
    /// failure leaves the previous connection in place. Returns whether a
    /// new connection was made.
    pub fn connect(&mut self, target: &Target) -> DictResult<bool> {
        if self.is_connected_to(target) {
            return Ok(false);
        }

        let conn = open_connection(target)?;
        schema::init_schema(&conn)?;

        if self.has_pending_writes() {
            warn!(
                from = %self.target.as_ref().map(ToString::to_string).unwrap_or_default(),
                to = %target,
                "switching connection with uncommitted writes; they are discarded"
            );
        }

        debug!(store = %target, "connected dictionary store");
        self.length_indexed = schema::index_exists(&conn, schema::LENGTH_INDEX);
        self.translation_indexed = schema::index_exists(&conn, schema::TRANSLATION_INDEX);
        self.conn = Some(conn);
        self.target = Some(target.clone());
        Ok(true)
    }

    /// Commit pending writes
    pub fn commit(&mut self) -> DictResult<()> {
        let conn = self.conn.as_ref().ok_or(DictionaryError::NotConnected)?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
            debug!(store = %self.target_label(), "committed dictionary store");
        }
        Ok(())
    }

    /// Discard pending writes
    pub fn rollback(&mut self) -> DictResult<()> {
        let conn = self.conn.as_ref().ok_or(DictionaryError::NotConnected)?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
            debug!(store = %self.target_label(), "rolled back dictionary store");
        }
        Ok(())
    }

    /// Whether a write transaction is open
    pub fn has_pending_writes(&self) -> bool {
        self.conn
            .as_ref()
            .map(|conn| !conn.is_autocommit())
            .unwrap_or(false)
    }

    /// Translation stored under `key`
    pub fn get(&self, key: &str) -> DictResult<Option<String>> {
        let conn = self.conn()?;
        let translation = conn
            .query_row(
                "SELECT translation FROM dict WHERE outline = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(translation)
    }

    /// Insert or replace one entry
    pub fn replace(&self, key: &str, translation: &str) -> DictResult<()> {
        self.write(|conn| {
            conn.execute(
                "REPLACE INTO dict (outline, translation, length) VALUES (?1, ?2, ?3)",
                params![key, translation, key_length(key) as i64],
            )?;
            Ok(())
        })
    }

    /// Insert or replace a batch of entries with one prepared statement
    ///
    /// Returns the number of entries written.
    pub fn replace_many<I, K, V>(&self, entries: I) -> DictResult<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.write(|conn| {
            let mut stmt = conn.prepare_cached(
                "REPLACE INTO dict (outline, translation, length) VALUES (?1, ?2, ?3)",
            )?;
            let mut written = 0;
            for (key, translation) in entries {
                let key = key.as_ref();
                stmt.execute(params![key, translation.as_ref(), key_length(key) as i64])?;
                written += 1;
            }
            Ok(written)
        })
    }

    /// Delete the entry under `key`, returning the number of rows removed
    pub fn delete(&self, key: &str) -> DictResult<usize> {
        self.write(|conn| conn.execute("DELETE FROM dict WHERE outline = ?1", params![key]))
    }

    /// Remove every entry
    pub fn clear(&self) -> DictResult<()> {
        self.write(|conn| {
            conn.execute("DELETE FROM dict", [])?;
            Ok(())
        })
    }

    pub fn count(&self) -> DictResult<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM dict", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All `(key, translation)` rows
    pub fn entries(&self) -> DictResult<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT outline, translation FROM dict")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Largest stroke count in the table, 0 when empty
    ///
    /// Creates the length index on first use.
    pub fn max_length(&mut self) -> DictResult<usize> {
        self.ensure_length_index()?;
        let max: Option<i64> = self
            .conn()?
            .query_row("SELECT MAX(length) FROM dict", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0) as usize)
    }

    /// Keys whose translation equals `translation` exactly
    ///
    /// Creates the translation index on first use.
    pub fn outlines_for(&mut self, translation: &str) -> DictResult<Vec<String>> {
        self.ensure_translation_index()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT outline FROM dict WHERE translation = ?1")?;
        let keys = stmt
            .query_map(params![translation], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Distinct stored translations equal to `translation` ignoring case
    ///
    /// Case is folded with Unicode rules, so every distinct translation is
    /// read and compared here rather than in SQL.
    pub fn translations_like(&mut self, translation: &str) -> DictResult<Vec<String>> {
        self.ensure_translation_index()?;
        let folded = translation.to_lowercase();
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT DISTINCT translation FROM dict")?;
        let mut rows = stmt.query([])?;
        let mut translations = Vec::new();
        while let Some(row) = rows.next()? {
            let candidate: String = row.get(0)?;
            if candidate.to_lowercase() == folded {
                translations.push(candidate);
            }
        }
        Ok(translations)
    }

    /// Copy the committed database into a new file at `path`
    ///
    /// Writes to a temporary file next to `path` and renames it into place.
    pub fn vacuum_into(&mut self, path: &Path) -> DictResult<()> {
        self.commit()?;
        let conn = self.conn()?;

        ensure_parent_dir(path)?;
        let temp_path = temp_path_for(path);
        if temp_path.exists() {
            fs::remove_file(&temp_path)
                .map_err(|e| DictionaryError::from_io(e, temp_path.clone()))?;
        }

        conn.execute(
            "VACUUM INTO ?1",
            params![temp_path.to_string_lossy().into_owned()],
        )?;

        fs::rename(&temp_path, path).map_err(|source| DictionaryError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "copied dictionary store");
        Ok(())
    }

    fn conn(&self) -> DictResult<&Connection> {
        self.conn.as_ref().ok_or(DictionaryError::NotConnected)
    }

    fn target_label(&self) -> String {
        self.target
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Run a write inside the pending transaction
    ///
    /// Memory targets commit (or roll back) right away.
    fn write<T, F>(&self, f: F) -> DictResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }

        let result = f(conn);

        if matches!(self.target, Some(Target::Memory)) {
            match &result {
                Ok(_) => conn.execute_batch("COMMIT")?,
                Err(e) => {
                    if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rollback, cause = %e, "rollback failed");
                    }
                }
            }
        }

        Ok(result?)
    }

    fn ensure_length_index(&mut self) -> DictResult<()> {
        if !self.length_indexed {
            schema::create_length_index(self.conn()?)?;
            self.length_indexed = true;
            debug!(store = %self.target_label(), "created length index");
        }
        Ok(())
    }

    fn ensure_translation_index(&mut self) -> DictResult<()> {
        if !self.translation_indexed {
            schema::create_translation_index(self.conn()?)?;
            self.translation_indexed = true;
            debug!(store = %self.target_label(), "created translation index");
        }
        Ok(())
    }
}

fn open_connection(target: &Target) -> DictResult<Connection> {
    match target {
        Target::Memory => Ok(Connection::open_in_memory()?),
        Target::File(path) => {
            ensure_parent_dir(path)?;
            Ok(Connection::open(path)?)
        }
    }
}

fn ensure_parent_dir(path: &Path) -> DictResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| DictionaryError::from_io(e, parent.to_path_buf()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{index_exists, LENGTH_INDEX, TRANSLATION_INDEX};
    use tempfile::TempDir;

    fn memory_engine() -> StoreEngine {
        let mut engine = StoreEngine::new();
        engine.connect(&Target::Memory).unwrap();
        engine
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut engine = StoreEngine::new();
        assert!(!engine.is_connected());

        assert!(engine.connect(&Target::Memory).unwrap());
        engine.replace("T", "it").unwrap();

        // Same target: same connection, data still there
        assert!(!engine.connect(&Target::Memory).unwrap());
        assert_eq!(engine.get("T").unwrap().as_deref(), Some("it"));
    }

    #[test]
    fn test_unconnected_operations_fail() {
        let mut engine = StoreEngine::new();
        assert!(matches!(engine.commit(), Err(DictionaryError::NotConnected)));
        assert!(matches!(engine.get("T"), Err(DictionaryError::NotConnected)));
    }

    #[test]
    fn test_replace_and_get() {
        let engine = memory_engine();
        engine.replace("T/H/R", "three").unwrap();
        engine.replace("T/H/R", "3").unwrap();

        assert_eq!(engine.get("T/H/R").unwrap().as_deref(), Some("3"));
        assert_eq!(engine.get("T/W/O").unwrap(), None);
        assert_eq!(engine.count().unwrap(), 1);
    }

    #[test]
    fn test_replace_many_and_max_length() {
        let mut engine = memory_engine();
        assert_eq!(engine.max_length().unwrap(), 0);

        let written = engine
            .replace_many([("A", "alpha"), ("B/C", "beta"), ("D/E/F/G", "delta")])
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(engine.max_length().unwrap(), 4);
    }

    #[test]
    fn test_delete_reports_rows() {
        let engine = memory_engine();
        engine.replace("A", "alpha").unwrap();

        assert_eq!(engine.delete("A").unwrap(), 1);
        assert_eq!(engine.delete("A").unwrap(), 0);
    }

    #[test]
    fn test_indexes_created_lazily() {
        let mut engine = memory_engine();
        engine.replace("A", "alpha").unwrap();

        let conn = engine.conn().unwrap();
        assert!(!index_exists(conn, LENGTH_INDEX));
        assert!(!index_exists(conn, TRANSLATION_INDEX));

        engine.max_length().unwrap();
        assert!(index_exists(engine.conn().unwrap(), LENGTH_INDEX));
        assert!(!index_exists(engine.conn().unwrap(), TRANSLATION_INDEX));

        engine.outlines_for("alpha").unwrap();
        assert!(index_exists(engine.conn().unwrap(), TRANSLATION_INDEX));
    }

    #[test]
    fn test_outlines_for_is_exact() {
        let mut engine = memory_engine();
        engine
            .replace_many([("A", "two"), ("B", "two words"), ("C", "Two"), ("D", "two")])
            .unwrap();

        let mut keys = engine.outlines_for("two").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["A", "D"]);

        let mut like = engine.translations_like("TWO").unwrap();
        like.sort();
        assert_eq!(like, vec!["Two", "two"]);
    }

    #[test]
    fn test_translations_like_folds_unicode_case() {
        let mut engine = memory_engine();
        engine
            .replace_many([("KAF", "café"), ("KA*F", "CAFÉ"), ("KAEF", "cafe")])
            .unwrap();

        let mut like = engine.translations_like("Café").unwrap();
        like.sort();
        assert_eq!(like, vec!["CAFÉ", "café"]);
    }

    #[test]
    fn test_rollback_discards_pending_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.db");

        let mut engine = StoreEngine::new();
        engine.connect(&Target::file(&path)).unwrap();
        engine.replace("A", "alpha").unwrap();
        engine.commit().unwrap();

        engine.clear().unwrap();
        assert_eq!(engine.count().unwrap(), 0);

        engine.rollback().unwrap();
        assert!(!engine.has_pending_writes());
        assert_eq!(engine.get("A").unwrap().as_deref(), Some("alpha"));

        // Nothing pending: no-op
        engine.rollback().unwrap();
    }

    #[test]
    fn test_connect_adopts_existing_indexes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.db");

        {
            let mut engine = StoreEngine::new();
            engine.connect(&Target::file(&path)).unwrap();
            engine.replace("A/B", "ab").unwrap();
            engine.max_length().unwrap();
            engine.commit().unwrap();
        }

        let mut engine = StoreEngine::new();
        engine.connect(&Target::file(&path)).unwrap();
        assert!(engine.length_indexed);
        assert!(!engine.translation_indexed);
    }

    #[test]
    fn test_file_writes_pending_until_commit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dict.db");
        let target = Target::file(&path);

        {
            let mut engine = StoreEngine::new();
            engine.connect(&target).unwrap();
            engine.replace("A", "alpha").unwrap();
            assert!(engine.has_pending_writes());
            // Dropped without commit
        }

        {
            let mut engine = StoreEngine::new();
            engine.connect(&target).unwrap();
            assert_eq!(engine.count().unwrap(), 0);

            engine.replace("B", "beta").unwrap();
            engine.commit().unwrap();
            assert!(!engine.has_pending_writes());
        }

        let mut engine = StoreEngine::new();
        engine.connect(&target).unwrap();
        assert_eq!(engine.get("B").unwrap().as_deref(), Some("beta"));
    }

    #[test]
    fn test_memory_writes_settle_immediately() {
        let engine = memory_engine();
        engine.replace("A", "alpha").unwrap();
        assert!(!engine.has_pending_writes());
    }

    #[test]
    fn test_connect_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("dict.db");

        let mut engine = StoreEngine::new();
        engine.connect(&Target::file(&path)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_connect_keeps_previous_connection() {
        let temp_dir = TempDir::new().unwrap();
        let bogus = temp_dir.path().join("not-a-db.db");
        fs::write(&bogus, vec![b'x'; 4096]).unwrap();

        let mut engine = memory_engine();
        engine.replace("A", "alpha").unwrap();

        assert!(engine.connect(&Target::file(&bogus)).is_err());
        assert_eq!(engine.target(), Some(&Target::Memory));
        assert_eq!(engine.get("A").unwrap().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_vacuum_into_copies_committed_data() {
        let temp_dir = TempDir::new().unwrap();
        let copy = temp_dir.path().join("copy.db");

        let mut engine = memory_engine();
        engine.replace_many([("A", "alpha"), ("B/C", "beta")]).unwrap();
        engine.vacuum_into(&copy).unwrap();
        assert!(!temp_dir.path().join("copy.db.tmp").exists());

        let mut other = StoreEngine::new();
        other.connect(&Target::file(&copy)).unwrap();
        assert_eq!(other.count().unwrap(), 2);
        assert_eq!(other.max_length().unwrap(), 2);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Memory.to_string(), ":memory:");
        assert_eq!(Target::file("/tmp/d.db").to_string(), "/tmp/d.db");
    }
}
