//! Dictionary adapter
//!
//! [`Dictionary`] implements the lookup contract on top of a
//! [`StoreEngine`]. Every operation takes the dictionary's exclusion guard
//! for its whole duration, so callers on different threads are totally
//! ordered and never observe half of a batch.
//!
//! ## Longest key
//!
//! The longest outline length is cached and recomputed inside the guard
//! after every mutation (once per batch for `update`), so
//! [`Dictionary::longest_key`] is a plain atomic read that is never stale
//! once a mutating call has returned.
//!
//! ## Variants
//!
//! - [`DictionaryKind::FileBacked`]: the SQLite file is the dictionary;
//!   `load` connects to it, `save` commits.
//! - [`DictionaryKind::SnapshotCached`]: an in-memory table filled from a
//!   JSON snapshot by `load` and written back by `save`.

mod lifecycle;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::MutexGuard;
use serde::{Deserialize, Serialize};
use tracing::debug;

use self::lifecycle::Lifecycle;
use crate::config::Config;
use crate::outline::Outline;
use crate::storage::{
    DictResult, DictionaryError, ExclusiveCell, StoreEngine, DEFAULT_LOCK_TIMEOUT,
};

/// One dictionary entry
pub type Entry = (Outline, String);

/// Which lifecycle a dictionary follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DictionaryKind {
    /// SQLite file on disk is the dictionary
    #[default]
    FileBacked,
    /// In-memory table persisted as a JSON snapshot
    SnapshotCached,
}

impl DictionaryKind {
    /// Pick a variant from a file extension, if it names one
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DictionaryKind::SnapshotCached),
            "db" | "sqlite" | "sqlite3" => Some(DictionaryKind::FileBacked),
            _ => None,
        }
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictionaryKind::FileBacked => f.write_str("file-backed"),
            DictionaryKind::SnapshotCached => f.write_str("snapshot-cached"),
        }
    }
}

/// Anything that can produce `(outline, translation)` pairs for a batch update
pub trait EntrySource {
    fn entries(&self) -> DictResult<Vec<Entry>>;
}

impl EntrySource for Dictionary {
    fn entries(&self) -> DictResult<Vec<Entry>> {
        Ok(self.items()?.collect())
    }
}

impl<S: BuildHasher> EntrySource for HashMap<Outline, String, S> {
    fn entries(&self) -> DictResult<Vec<Entry>> {
        Ok(self.iter().map(|(o, t)| (o.clone(), t.clone())).collect())
    }
}

impl EntrySource for BTreeMap<Outline, String> {
    fn entries(&self) -> DictResult<Vec<Entry>> {
        Ok(self.iter().map(|(o, t)| (o.clone(), t.clone())).collect())
    }
}

impl EntrySource for [Entry] {
    fn entries(&self) -> DictResult<Vec<Entry>> {
        Ok(self.to_vec())
    }
}

impl EntrySource for Vec<Entry> {
    fn entries(&self) -> DictResult<Vec<Entry>> {
        Ok(self.clone())
    }
}

/// Entries read out of a dictionary
///
/// Rows are read under the guard; outlines are split as the iterator
/// advances.
pub struct Items {
    rows: std::vec::IntoIter<(String, String)>,
}

impl Iterator for Items {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|(key, translation)| (Outline::from_key(&key), translation))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Items {}

/// State reachable only through the guard
struct Session {
    engine: StoreEngine,
    lifecycle: Lifecycle,
}

/// A thread-safe steno dictionary backed by SQLite
pub struct Dictionary {
    state: ExclusiveCell<Session>,
    kind: DictionaryKind,
    longest_key: AtomicUsize,
    readonly: AtomicBool,
    #[cfg(test)]
    cache_refreshes: AtomicUsize,
}

impl Dictionary {
    fn new(lifecycle: Lifecycle, lock_timeout: Duration) -> Self {
        Self {
            kind: lifecycle.kind(),
            state: ExclusiveCell::new(
                Session {
                    engine: StoreEngine::new(),
                    lifecycle,
                },
                lock_timeout,
            ),
            longest_key: AtomicUsize::new(0),
            readonly: AtomicBool::new(false),
            #[cfg(test)]
            cache_refreshes: AtomicUsize::new(0),
        }
    }

    /// A file-backed dictionary with no path yet
    ///
    /// Nothing is opened until first use; lookups before `load` are served
    /// from an empty placeholder store.
    pub fn file_backed() -> Self {
        Self::new(Lifecycle::new(DictionaryKind::FileBacked, None), DEFAULT_LOCK_TIMEOUT)
    }

    /// A file-backed dictionary that already knows its path
    ///
    /// Using it before `load` connects to `path` and starts from an empty
    /// table. A later `load` of the same path adopts the file's content.
    pub fn file_backed_at(path: impl Into<PathBuf>) -> Self {
        Self::new(
            Lifecycle::new(DictionaryKind::FileBacked, Some(path.into())),
            DEFAULT_LOCK_TIMEOUT,
        )
    }

    /// A snapshot-cached dictionary, connected to its in-memory store
    pub fn snapshot_cached() -> DictResult<Self> {
        Self::with_config(DictionaryKind::SnapshotCached, &Config::default())
    }

    /// A dictionary of the given kind using `config`'s lock bound and flags
    pub fn with_config(kind: DictionaryKind, config: &Config) -> DictResult<Self> {
        let dict = Self::new(Lifecycle::new(kind, None), config.lock_timeout());
        dict.readonly.store(config.readonly, Ordering::Release);
        if kind == DictionaryKind::SnapshotCached {
            // Always queryable, even before load.
            drop(dict.session()?);
        }
        Ok(dict)
    }

    /// Create a dictionary for the file at `path` and load it
    ///
    /// The variant comes from the extension, falling back to
    /// `config.default_kind`.
    pub fn open(path: impl AsRef<Path>, config: &Config) -> DictResult<Self> {
        let path = path.as_ref();
        let dict = Self::with_config(config.kind_for(path), config)?;
        dict.load(path)?;
        Ok(dict)
    }

    pub fn kind(&self) -> DictionaryKind {
        self.kind
    }

    /// The dictionary's file, once known
    pub fn path(&self) -> DictResult<Option<PathBuf>> {
        let session = self.state.acquire()?;
        Ok(session.lifecycle.path().map(Path::to_path_buf))
    }

    pub fn readonly(&self) -> bool {
        self.readonly.load(Ordering::Acquire)
    }

    pub fn set_readonly(&self, readonly: bool) {
        self.readonly.store(readonly, Ordering::Release);
    }

    /// Length of the longest outline, in strokes; 0 when empty
    pub fn longest_key(&self) -> usize {
        self.longest_key.load(Ordering::Acquire)
    }

    // ==================== Lifecycle ====================

    /// Load the dictionary from `path`
    ///
    /// File-backed dictionaries connect to the file and adopt its content.
    /// Snapshot-cached dictionaries clear their table, then read the JSON
    /// file; if reading or parsing fails after the clear, the dictionary is
    /// left empty.
    pub fn load(&self, path: impl AsRef<Path>) -> DictResult<()> {
        let path = path.as_ref();
        let mut guard = self.state.acquire()?;
        let session = &mut *guard;

        let result = session.lifecycle.load(&mut session.engine, path);
        if session.engine.is_connected() {
            self.refresh_longest_key(&mut session.engine)?;
        }
        result?;

        debug!(
            path = %path.display(),
            kind = %self.kind,
            longest_key = self.longest_key(),
            "loaded dictionary"
        );
        Ok(())
    }

    /// Persist to the dictionary's own path
    pub fn save(&self) -> DictResult<()> {
        let mut guard = self.session()?;
        let session = &mut *guard;
        session.lifecycle.save(&mut session.engine, None)?;
        debug!(kind = %self.kind, "saved dictionary");
        Ok(())
    }

    /// Persist to `path`
    ///
    /// For a file-backed dictionary connected elsewhere, this commits and
    /// copies the database to `path`.
    pub fn save_as(&self, path: impl AsRef<Path>) -> DictResult<()> {
        let path = path.as_ref();
        let mut guard = self.session()?;
        let session = &mut *guard;
        session.lifecycle.save(&mut session.engine, Some(path))?;
        debug!(path = %path.display(), kind = %self.kind, "saved dictionary");
        Ok(())
    }

    // ==================== Lookups ====================

    /// Translation for `outline`, or `None` when absent
    pub fn get(&self, outline: &Outline) -> DictResult<Option<String>> {
        let session = self.session()?;
        session.engine.get(&outline.to_key())
    }

    /// Translation for `outline`, failing with `NotFound` when absent
    pub fn lookup(&self, outline: &Outline) -> DictResult<String> {
        self.get(outline)?
            .ok_or_else(|| DictionaryError::NotFound {
                outline: outline.to_key(),
            })
    }

    /// Translation for `outline`, or `fallback` when absent
    pub fn get_or(&self, outline: &Outline, fallback: &str) -> DictResult<String> {
        Ok(self.get(outline)?.unwrap_or_else(|| fallback.to_string()))
    }

    pub fn contains(&self, outline: &Outline) -> DictResult<bool> {
        Ok(self.get(outline)?.is_some())
    }

    /// Outlines whose translation is exactly `translation`
    pub fn reverse_lookup(&self, translation: &str) -> DictResult<BTreeSet<Outline>> {
        let mut session = self.session()?;
        let keys = session.engine.outlines_for(translation)?;
        Ok(keys.iter().map(|key| Outline::from_key(key)).collect())
    }

    /// Stored translations equal to `translation` ignoring case
    ///
    /// Case is compared with Unicode lowercasing, so `CAFÉ` finds `café`.
    pub fn casereverse_lookup(&self, translation: &str) -> DictResult<BTreeSet<String>> {
        let mut session = self.session()?;
        Ok(session
            .engine
            .translations_like(translation)?
            .into_iter()
            .collect())
    }

    /// All entries
    pub fn items(&self) -> DictResult<Items> {
        let session = self.session()?;
        let rows = session.engine.entries()?;
        Ok(Items {
            rows: rows.into_iter(),
        })
    }

    /// Number of entries
    pub fn len(&self) -> DictResult<usize> {
        self.session()?.engine.count()
    }

    pub fn is_empty(&self) -> DictResult<bool> {
        Ok(self.len()? == 0)
    }

    // ==================== Mutations ====================

    /// Insert or replace the entry for `outline`
    pub fn set(&self, outline: &Outline, translation: &str) -> DictResult<()> {
        let key = outline.to_key();
        self.mutate("set", |engine| engine.replace(&key, translation))
    }

    /// Remove the entry for `outline`, failing with `NotFound` when absent
    pub fn delete(&self, outline: &Outline) -> DictResult<()> {
        let key = outline.to_key();
        self.mutate("delete", |engine| match engine.delete(&key)? {
            0 => Err(DictionaryError::NotFound { outline: key.clone() }),
            _ => Ok(()),
        })
    }

    /// Upsert the entries of every source as one batch
    ///
    /// Sources are read before the guard is taken, so a dictionary can be
    /// updated from itself. Returns the number of entries written.
    pub fn update(&self, sources: &[&dyn EntrySource]) -> DictResult<usize> {
        self.ensure_writable("update")?;
        let mut batch = Vec::new();
        for source in sources {
            batch.extend(source.entries()?);
        }
        self.write_batch(batch)
    }

    /// Upsert entries from a single iterator as one batch
    pub fn extend<I>(&self, entries: I) -> DictResult<usize>
    where
        I: IntoIterator<Item = Entry>,
    {
        self.ensure_writable("update")?;
        self.write_batch(entries.into_iter().collect())
    }

    /// Remove every entry
    pub fn clear(&self) -> DictResult<()> {
        self.mutate("clear", |engine| engine.clear())
    }

    fn write_batch(&self, batch: Vec<Entry>) -> DictResult<usize> {
        let keyed: Vec<(String, String)> = batch
            .into_iter()
            .map(|(outline, translation)| (outline.to_key(), translation))
            .collect();
        self.mutate("update", |engine| engine.replace_many(keyed))
    }

    // ==================== Internals ====================

    /// Acquire the guard and make sure the engine is connected
    fn session(&self) -> DictResult<MutexGuard<'_, Session>> {
        let mut guard = self.state.acquire()?;
        let session = &mut *guard;
        if session
            .lifecycle
            .resolve_connection_target(&mut session.engine)?
        {
            self.longest_key.store(0, Ordering::Release);
        }
        Ok(guard)
    }

    /// Run a write under the guard, then recompute the longest key once
    ///
    /// The cache is refreshed even when the write fails, so it always
    /// matches what the table holds.
    fn mutate<T, F>(&self, operation: &'static str, f: F) -> DictResult<T>
    where
        F: FnOnce(&mut StoreEngine) -> DictResult<T>,
    {
        self.ensure_writable(operation)?;
        let mut session = self.session()?;
        let result = f(&mut session.engine);
        self.refresh_longest_key(&mut session.engine)?;
        result
    }

    fn refresh_longest_key(&self, engine: &mut StoreEngine) -> DictResult<()> {
        let longest = engine.max_length()?;
        self.longest_key.store(longest, Ordering::Release);
        #[cfg(test)]
        self.cache_refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn ensure_writable(&self, operation: &'static str) -> DictResult<()> {
        if self.readonly() {
            return Err(DictionaryError::ReadOnly { operation });
        }
        Ok(())
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("kind", &self.kind)
            .field("longest_key", &self.longest_key())
            .field("readonly", &self.readonly())
            .finish_non_exhaustive()
    }
}
