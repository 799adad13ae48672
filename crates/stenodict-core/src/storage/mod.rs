//! Storage layer
//!
//! The SQLite side of a dictionary: one connection, one table, and the lock
//! that serializes access to them.
//!
//! ## Architecture
//!
//! - **Engine**: owns the connection and the table primitives
//! - **Guard**: bounded-wait mutual exclusion around the engine
//! - **Schema**: table and on-demand index definitions

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod engine;
pub mod error;
pub mod guard;
pub mod schema;

pub use engine::{StoreEngine, Target};
pub use error::{DictResult, DictionaryError};
pub use guard::{ExclusiveCell, DEFAULT_LOCK_TIMEOUT};

/// Temporary sibling of `path` used while replacing it
///
/// Keeps the full file name, so `main.db` and `main.json` never share one.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("dictionary"));
    name.push(".tmp");
    path.with_file_name(name)
}
