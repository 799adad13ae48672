//! Entry command handlers

use std::path::Path;

use anyhow::{Context, Result};

use stenodict_core::{Config, DictionaryError, Outline};

use super::{open, open_for_write};
use crate::output::Output;

/// Look up the translation for an outline
pub fn lookup(path: &Path, outline: &str, config: &Config, output: &Output) -> Result<()> {
    let dict = open(path, config)?;
    let outline = Outline::from_key(outline);

    let translation = dict.lookup(&outline)?;
    output.print_translation(&outline, &translation);
    Ok(())
}

/// Find every outline producing a translation
pub fn reverse(
    path: &Path,
    translation: &str,
    ignore_case: bool,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let dict = open(path, config)?;

    if ignore_case {
        let variants = dict.casereverse_lookup(translation)?;
        output.print_translations(&variants);
    } else {
        let outlines = dict.reverse_lookup(translation)?;
        output.print_outlines(translation, &outlines);
    }
    Ok(())
}

/// Add or replace an entry and save
pub fn set(
    path: &Path,
    outline: &str,
    translation: &str,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let dict = open_for_write(path, config)?;
    let outline = Outline::from_key(outline);

    dict.set(&outline, translation)
        .with_context(|| format!("Failed to set {}", outline))?;
    dict.save_as(path)
        .with_context(|| format!("Failed to save {:?}", path))?;

    output.success(&format!("{} → {}", outline, translation));
    Ok(())
}

/// Remove an entry and save
pub fn delete(path: &Path, outline: &str, config: &Config, output: &Output) -> Result<()> {
    let dict = open(path, config)?;
    let outline = Outline::from_key(outline);

    match dict.delete(&outline) {
        Ok(()) => {}
        Err(DictionaryError::NotFound { .. }) => {
            anyhow::bail!("No entry for {} in {:?}", outline, path)
        }
        Err(e) => return Err(e).context("Failed to delete entry"),
    }
    dict.save_as(path)
        .with_context(|| format!("Failed to save {:?}", path))?;

    output.success(&format!("Deleted {}", outline));
    Ok(())
}

/// List entries, sorted by outline
pub fn list(path: &Path, limit: Option<usize>, config: &Config, output: &Output) -> Result<()> {
    let dict = open(path, config)?;

    let mut entries: Vec<_> = dict.items()?.collect();
    entries.sort();
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    output.print_entries(&entries);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use stenodict_core::Dictionary;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_set_creates_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user.json");
        let config = Config::default();

        set(&path, "TEFT/-G", "testing", &config, &quiet()).unwrap();
        assert!(path.exists());

        let dict = open(&path, &config).unwrap();
        assert_eq!(
            dict.lookup(&Outline::new(["TEFT", "-G"])).unwrap(),
            "testing"
        );
    }

    #[test]
    fn test_set_and_delete_in_database() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user.db");
        let config = Config::default();

        set(&path, "A", "alpha", &config, &quiet()).unwrap();
        set(&path, "B/C", "beta", &config, &quiet()).unwrap();
        delete(&path, "A", &config, &quiet()).unwrap();

        let dict = Dictionary::file_backed();
        dict.load(&path).unwrap();
        assert_eq!(dict.len().unwrap(), 1);
        assert_eq!(dict.longest_key(), 2);
    }

    #[test]
    fn test_delete_missing_entry_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user.json");
        let config = Config::default();

        set(&path, "A", "alpha", &config, &quiet()).unwrap();
        let err = delete(&path, "Z", &config, &quiet()).unwrap_err();
        assert!(err.to_string().contains("No entry"));
    }

    #[test]
    fn test_lookup_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        assert!(lookup(&path, "A", &Config::default(), &quiet()).is_err());
    }

    #[test]
    fn test_readonly_config_blocks_set() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user.json");
        std::fs::write(&path, "{}").unwrap();

        let config = Config {
            readonly: true,
            ..Config::default()
        };
        let err = set(&path, "A", "alpha", &config, &quiet()).unwrap_err();
        assert!(err.to_string().contains("Failed to set"));
    }
}
