//! Convert command handler

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use stenodict_core::{Config, Dictionary, DictionaryKind};

use super::open;
use crate::output::Output;

/// Copy every entry of one dictionary file into another
///
/// The destination's variant follows its extension, so this converts
/// between JSON snapshots and SQLite files. Existing destination content is
/// replaced.
pub fn convert(from: &Path, to: &Path, config: &Config, output: &Output) -> Result<()> {
    let source = open(from, config)?;
    let target = copy_into(&source, to, config)?;

    info!(
        from = %from.display(),
        to = %to.display(),
        entries = target.len()?,
        "converted dictionary"
    );
    output.success(&format!(
        "Converted {:?} ({}) to {:?} ({})",
        from,
        source.kind(),
        to,
        target.kind()
    ));
    Ok(())
}

fn copy_into(source: &Dictionary, to: &Path, config: &Config) -> Result<Dictionary> {
    let kind = config.kind_for(to);
    let target = Dictionary::with_config(kind, config).context("Failed to create dictionary")?;

    if kind == DictionaryKind::FileBacked {
        target
            .load(to)
            .with_context(|| format!("Failed to open {:?}", to))?;
        target.clear()?;
    }

    target
        .update(&[source])
        .context("Failed to copy entries")?;
    target
        .save_as(to)
        .with_context(|| format!("Failed to save {:?}", to))?;
    Ok(target)
}
