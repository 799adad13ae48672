//! JSON snapshot files
//!
//! A snapshot is one flat JSON object: outline keys (strokes joined with
//! `/`) mapped to translation strings. Files are written with newline-
//! separated entries and no indentation, keys in sorted order, and non-ASCII
//! text written literally.
//!
//! Writes are atomic: the data goes to a temporary file in the same
//! directory, is synced, then renamed over the target.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::storage::{temp_path_for, DictResult, DictionaryError};

/// Snapshot contents, keyed by joined outline
pub type SnapshotEntries = BTreeMap<String, String>;

/// Read and parse a snapshot file
pub fn read_snapshot(path: &Path) -> DictResult<SnapshotEntries> {
    let bytes = fs::read(path).map_err(|e| DictionaryError::from_read(e, path.to_path_buf()))?;
    let entries = parse_snapshot(&bytes).map_err(|source| DictionaryError::MalformedSnapshot {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), entries = entries.len(), "read snapshot");
    Ok(entries)
}

/// Parse snapshot bytes; anything but a flat object of strings is rejected
pub fn parse_snapshot(bytes: &[u8]) -> serde_json::Result<SnapshotEntries> {
    serde_json::from_slice(bytes)
}

/// Serialize entries in snapshot layout
pub fn encode_snapshot(entries: &SnapshotEntries) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b""));
    entries.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write entries to `path` atomically
pub fn write_snapshot(path: &Path, entries: &SnapshotEntries) -> DictResult<()> {
    let data = encode_snapshot(entries).map_err(|e| DictionaryError::Io(e.into()))?;
    atomic_write(path, &data)?;
    debug!(path = %path.display(), entries = entries.len(), "wrote snapshot");
    Ok(())
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> DictResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| DictionaryError::from_io(e, parent.to_path_buf()))?;
        }
    }

    let temp_path = temp_path_for(path);

    let file =
        File::create(&temp_path).map_err(|e| DictionaryError::from_io(e, temp_path.clone()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .map_err(|e| DictionaryError::from_io(e, temp_path.clone()))?;
    let file = writer
        .into_inner()
        .map_err(|e| DictionaryError::from_io(e.into_error(), temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| DictionaryError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| DictionaryError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SnapshotEntries {
        let mut entries = SnapshotEntries::new();
        entries.insert("T/H/R".to_string(), "three".to_string());
        entries.insert("T/W/O".to_string(), "two".to_string());
        entries
    }

    #[test]
    fn test_layout() {
        let bytes = encode_snapshot(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n\"T/H/R\": \"three\",\n\"T/W/O\": \"two\"\n}");
    }

    #[test]
    fn test_non_ascii_written_literally() {
        let mut entries = SnapshotEntries::new();
        entries.insert("KAFR".to_string(), "café ☕".to_string());

        let text = String::from_utf8(encode_snapshot(&entries).unwrap()).unwrap();
        assert!(text.contains("café ☕"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("main.json");

        write_snapshot(&path, &sample()).unwrap();
        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());

        assert_eq!(read_snapshot(&path).unwrap(), sample());
    }

    #[test]
    fn test_rejects_nested_values() {
        let err = parse_snapshot(br#"{"A": {"nested": "no"}}"#);
        assert!(err.is_err());

        let err = parse_snapshot(br#"["A", "B"]"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{\"A\": \"alpha\",").unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, DictionaryError::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_snapshot(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DictionaryError::ReadError { .. }));
    }
}
