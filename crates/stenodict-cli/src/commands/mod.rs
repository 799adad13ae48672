//! Command handlers

pub mod convert;
pub mod entry;
pub mod stats;

use std::path::Path;

use anyhow::{Context, Result};

use stenodict_core::{Config, Dictionary, DictionaryKind};

/// Open and load an existing dictionary file
pub fn open(path: &Path, config: &Config) -> Result<Dictionary> {
    Dictionary::open(path, config)
        .with_context(|| format!("Failed to open dictionary {:?}", path))
}

/// Open a dictionary file for writing, starting empty if it doesn't exist
///
/// Save with `save_as(path)`: that commits a file-backed dictionary in
/// place and writes a snapshot-cached one to `path`.
pub fn open_for_write(path: &Path, config: &Config) -> Result<Dictionary> {
    let kind = config.kind_for(path);
    if path.exists() || kind == DictionaryKind::FileBacked {
        return open(path, config);
    }
    Dictionary::with_config(kind, config).context("Failed to create dictionary")
}
