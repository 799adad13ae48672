//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::collections::BTreeSet;

use serde::Serialize;

use stenodict_core::{DictionaryKind, Entry, Outline};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Summary of one dictionary file
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryStats {
    pub path: String,
    pub kind: DictionaryKind,
    pub entries: usize,
    pub longest_key: usize,
    pub readonly: bool,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the translation found for an outline
    pub fn print_translation(&self, outline: &Outline, translation: &str) {
        match self.format {
            OutputFormat::Human => println!("{} → {}", outline, translation),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"outline": outline, "translation": translation})
                );
            }
            OutputFormat::Quiet => println!("{}", translation),
        }
    }

    /// Print the outlines that produce a translation
    pub fn print_outlines(&self, translation: &str, outlines: &BTreeSet<Outline>) {
        match self.format {
            OutputFormat::Human => {
                if outlines.is_empty() {
                    println!("No outlines for \"{}\".", translation);
                    return;
                }
                for outline in outlines {
                    println!("{}", outline);
                }
                println!("\n{} outline(s)", outlines.len());
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"translation": translation, "outlines": outlines})
                );
            }
            OutputFormat::Quiet => {
                for outline in outlines {
                    println!("{}", outline);
                }
            }
        }
    }

    /// Print case variants of a translation
    pub fn print_translations(&self, translations: &BTreeSet<String>) {
        match self.format {
            OutputFormat::Human | OutputFormat::Quiet => {
                for translation in translations {
                    println!("{}", translation);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"translations": translations}));
            }
        }
    }

    /// Print a list of entries
    pub fn print_entries(&self, entries: &[Entry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No entries found.");
                    return;
                }
                let width = entries
                    .iter()
                    .map(|(outline, _)| outline.to_key().chars().count())
                    .max()
                    .unwrap_or(0)
                    .min(30);
                for (outline, translation) in entries {
                    println!(
                        "{:<width$} | {}",
                        truncate(&outline.to_key(), 30),
                        truncate_line(translation, 60),
                        width = width
                    );
                }
                println!("\n{} entr{}", entries.len(), plural_y(entries.len()));
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(outline, translation)| {
                        (outline.to_key(), serde_json::Value::from(translation.as_str()))
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_default()
                );
            }
            OutputFormat::Quiet => {
                for (outline, _) in entries {
                    println!("{}", outline);
                }
            }
        }
    }

    /// Print dictionary statistics
    pub fn print_stats(&self, stats: &DictionaryStats) {
        match self.format {
            OutputFormat::Human => {
                println!("Dictionary: {}", stats.path);
                println!("  Kind:        {}", stats.kind);
                println!("  Entries:     {}", stats.entries);
                println!("  Longest key: {} stroke(s)", stats.longest_key);
                println!("  Read-only:   {}", if stats.readonly { "yes" } else { "no" });
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(stats).unwrap_or_default()
                );
            }
            OutputFormat::Quiet => {
                println!("{}", stats.entries);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
