//! Lifecycle variants
//!
//! A dictionary is either backed directly by its SQLite file, or kept in
//! memory and hydrated from / flushed to a JSON snapshot. The variant
//! decides where the connection points and what `load` and `save` mean;
//! everything else is shared.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::DictionaryKind;
use crate::snapshot::{read_snapshot, write_snapshot, SnapshotEntries};
use crate::storage::{DictResult, DictionaryError, StoreEngine, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// The file at `path` is the dictionary
    ///
    /// `lazy_clear` is set while the only pending write on the connection is
    /// the clear from connecting before the first load.
    FileBacked {
        path: Option<PathBuf>,
        lazy_clear: bool,
    },
    /// Permanent in-memory table; `path` is the last snapshot loaded
    SnapshotCached { path: Option<PathBuf> },
}

impl Lifecycle {
    pub fn new(kind: DictionaryKind, path: Option<PathBuf>) -> Self {
        match kind {
            DictionaryKind::FileBacked => Lifecycle::FileBacked {
                path,
                lazy_clear: false,
            },
            DictionaryKind::SnapshotCached => Lifecycle::SnapshotCached { path },
        }
    }

    pub fn kind(&self) -> DictionaryKind {
        match self {
            Lifecycle::FileBacked { .. } => DictionaryKind::FileBacked,
            Lifecycle::SnapshotCached { .. } => DictionaryKind::SnapshotCached,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Lifecycle::FileBacked { path, .. } | Lifecycle::SnapshotCached { path } => {
                path.as_deref()
            }
        }
    }

    /// Connect the engine where this variant expects it, if it isn't yet
    ///
    /// Returns true when a fresh, empty table was just set up.
    pub fn resolve_connection_target(&mut self, engine: &mut StoreEngine) -> DictResult<bool> {
        if engine.is_connected() {
            return Ok(false);
        }

        match self {
            Lifecycle::FileBacked {
                path: Some(path),
                lazy_clear,
            } => {
                // Known path but never loaded: start from an empty table.
                engine.connect(&Target::file(path.as_path()))?;
                engine.clear()?;
                *lazy_clear = true;
                debug!(path = %path.display(), "lazily connected before first load");
            }
            Lifecycle::FileBacked { path: None, .. } => {
                engine.connect(&Target::Memory)?;
                debug!("no dictionary path yet, using placeholder in-memory store");
            }
            Lifecycle::SnapshotCached { .. } => {
                engine.connect(&Target::Memory)?;
            }
        }
        Ok(true)
    }

    /// Bring the table in line with the file at `path`
    pub fn load(&mut self, engine: &mut StoreEngine, path: &Path) -> DictResult<()> {
        match self {
            Lifecycle::FileBacked {
                path: identity,
                lazy_clear,
            } => {
                // Existing content is adopted, not cleared.
                let already_connected = !engine.connect(&Target::file(path))?;
                if already_connected && *lazy_clear {
                    engine.rollback()?;
                    debug!(path = %path.display(), "dropped clear from lazy connect");
                }
                *lazy_clear = false;
                *identity = Some(path.to_path_buf());
            }
            Lifecycle::SnapshotCached { path: identity } => {
                engine.connect(&Target::Memory)?;
                // Point of no return: a failure past this line leaves the
                // dictionary empty.
                engine.clear()?;
                let entries = read_snapshot(path)?;
                engine.replace_many(&entries)?;
                *identity = Some(path.to_path_buf());
            }
        }
        Ok(())
    }

    /// Persist the table, to `path` if given, otherwise to the known path
    ///
    /// The engine must already be connected.
    pub fn save(&mut self, engine: &mut StoreEngine, path: Option<&Path>) -> DictResult<()> {
        match self {
            Lifecycle::FileBacked {
                path: identity,
                lazy_clear,
            } => {
                match path {
                    Some(other) if !engine.is_connected_to(&Target::file(other)) => {
                        engine.vacuum_into(other)?
                    }
                    Some(_) => engine.commit()?,
                    None if identity.is_none() => return Err(DictionaryError::NoPath),
                    None => engine.commit()?,
                }
                // Both paths commit, so the clear is now on disk.
                *lazy_clear = false;
                Ok(())
            }
            Lifecycle::SnapshotCached { path: identity } => {
                let target = path.or(identity.as_deref()).ok_or(DictionaryError::NoPath)?;
                let entries: SnapshotEntries = engine.entries()?.into_iter().collect();
                write_snapshot(target, &entries)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_backed_placeholder_connection() {
        let mut lifecycle = Lifecycle::new(DictionaryKind::FileBacked, None);
        let mut engine = StoreEngine::new();

        assert!(lifecycle.resolve_connection_target(&mut engine).unwrap());
        assert_eq!(engine.target(), Some(&Target::Memory));

        // Already connected: nothing to do
        assert!(!lifecycle.resolve_connection_target(&mut engine).unwrap());
    }

    #[test]
    fn test_file_backed_lazy_connect_clears_known_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.db");

        {
            let mut engine = StoreEngine::new();
            engine.connect(&Target::file(&path)).unwrap();
            engine.replace("A", "alpha").unwrap();
            engine.commit().unwrap();
        }

        let mut lifecycle = Lifecycle::new(DictionaryKind::FileBacked, Some(path.clone()));
        let mut engine = StoreEngine::new();
        lifecycle.resolve_connection_target(&mut engine).unwrap();

        assert_eq!(engine.target(), Some(&Target::file(&path)));
        assert_eq!(engine.count().unwrap(), 0);
    }

    #[test]
    fn test_file_backed_load_adopts_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.db");

        {
            let mut engine = StoreEngine::new();
            engine.connect(&Target::file(&path)).unwrap();
            engine.replace("A/B", "ab").unwrap();
            engine.commit().unwrap();
        }

        let mut lifecycle = Lifecycle::new(DictionaryKind::FileBacked, None);
        let mut engine = StoreEngine::new();
        lifecycle.load(&mut engine, &path).unwrap();

        assert_eq!(lifecycle.path(), Some(path.as_path()));
        assert_eq!(engine.get("A/B").unwrap().as_deref(), Some("ab"));
    }

    #[test]
    fn test_file_backed_load_after_lazy_connect_keeps_file_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.db");

        {
            let mut engine = StoreEngine::new();
            engine.connect(&Target::file(&path)).unwrap();
            engine.replace("A/B", "ab").unwrap();
            engine.commit().unwrap();
        }

        let mut lifecycle = Lifecycle::new(DictionaryKind::FileBacked, Some(path.clone()));
        let mut engine = StoreEngine::new();
        lifecycle.resolve_connection_target(&mut engine).unwrap();
        assert_eq!(engine.count().unwrap(), 0);

        lifecycle.load(&mut engine, &path).unwrap();
        assert!(!engine.has_pending_writes());
        assert_eq!(engine.get("A/B").unwrap().as_deref(), Some("ab"));

        lifecycle.save(&mut engine, None).unwrap();
        let mut reopened = StoreEngine::new();
        reopened.connect(&Target::file(&path)).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_file_backed_save_without_path() {
        let mut lifecycle = Lifecycle::new(DictionaryKind::FileBacked, None);
        let mut engine = StoreEngine::new();
        lifecycle.resolve_connection_target(&mut engine).unwrap();

        let err = lifecycle.save(&mut engine, None).unwrap_err();
        assert!(matches!(err, DictionaryError::NoPath));
    }

    #[test]
    fn test_snapshot_load_and_save() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("main.json");
        let copy = temp_dir.path().join("copy.json");
        std::fs::write(&source, r#"{"T/H/R": "three", "T/W/O": "two"}"#).unwrap();

        let mut lifecycle = Lifecycle::new(DictionaryKind::SnapshotCached, None);
        let mut engine = StoreEngine::new();
        lifecycle.resolve_connection_target(&mut engine).unwrap();
        lifecycle.load(&mut engine, &source).unwrap();
        assert_eq!(engine.count().unwrap(), 2);

        lifecycle.save(&mut engine, Some(&copy)).unwrap();
        let saved = read_snapshot(&copy).unwrap();
        assert_eq!(saved.get("T/W/O").map(String::as_str), Some("two"));

        // Explicit save path doesn't move the dictionary
        assert_eq!(lifecycle.path(), Some(source.as_path()));
    }

    #[test]
    fn test_snapshot_failed_load_leaves_table_empty() {
        let temp_dir = TempDir::new().unwrap();
        let broken = temp_dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();

        let mut lifecycle = Lifecycle::new(DictionaryKind::SnapshotCached, None);
        let mut engine = StoreEngine::new();
        lifecycle.resolve_connection_target(&mut engine).unwrap();
        engine.replace("A", "alpha").unwrap();

        let err = lifecycle.load(&mut engine, &broken).unwrap_err();
        assert!(matches!(err, DictionaryError::MalformedSnapshot { .. }));
        assert_eq!(engine.count().unwrap(), 0);
        assert_eq!(lifecycle.path(), None);
    }
}
