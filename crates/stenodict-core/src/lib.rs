//! stenodict core library
//!
//! An embedded steno dictionary store: outlines (chord sequences) map to
//! translations, with fast lookup in both directions and a cached longest
//! outline length that callers use to bound lookahead while matching live
//! input.
//!
//! # Architecture
//!
//! - **SQLite**: one `dict` table per dictionary, behind a single guarded
//!   connection
//! - **Lifecycles**: either the SQLite file is the dictionary, or an
//!   in-memory table is loaded from and saved to a JSON snapshot
//!
//! # Quick Start
//!
//! ```text
//! let dict = Dictionary::snapshot_cached()?;
//! dict.load("main.json")?;
//!
//! let outline: Outline = "T/H/R".parse()?;
//! let translation = dict.get(&outline)?;
//! let lookahead = dict.longest_key();
//! ```
//!
//! # Modules
//!
//! - `dictionary`: The dictionary contract and its two lifecycle variants
//! - `outline`: Outline keys and their `/`-joined storage form
//! - `storage`: SQLite engine, exclusion guard, schema, errors
//! - `snapshot`: JSON snapshot reading and writing
//! - `config`: Configuration

pub mod config;
pub mod dictionary;
pub mod outline;
pub mod snapshot;
pub mod storage;

pub use config::Config;
pub use dictionary::{Dictionary, DictionaryKind, Entry, EntrySource, Items};
pub use outline::Outline;
pub use storage::{DictResult, DictionaryError};
