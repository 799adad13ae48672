//! Stats command handler

use std::path::Path;

use anyhow::Result;

use stenodict_core::Config;

use super::open;
use crate::output::{DictionaryStats, Output};

/// Show entry count, longest key and variant of a dictionary
pub fn show(path: &Path, config: &Config, output: &Output) -> Result<()> {
    let dict = open(path, config)?;

    let stats = DictionaryStats {
        path: path.display().to_string(),
        kind: dict.kind(),
        entries: dict.len()?,
        longest_key: dict.longest_key(),
        readonly: dict.readonly(),
    };

    output.print_stats(&stats);
    Ok(())
}
