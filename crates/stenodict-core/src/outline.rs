//! Outline model
//!
//! An outline is an ordered, non-empty sequence of chord tokens. Its storage
//! key is the tokens joined with `/`; splitting that key by `/` gives the
//! tokens back. Tokens never contain `/` themselves, which callers guarantee.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between strokes in a joined outline key
pub const STROKE_SEPARATOR: char = '/';

/// A chord sequence used as a dictionary key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Outline(Vec<String>);

impl Outline {
    /// Create an outline from its strokes
    pub fn new<I, S>(strokes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(strokes.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-joined storage key
    pub fn from_key(key: &str) -> Self {
        Self(key.split(STROKE_SEPARATOR).map(str::to_string).collect())
    }

    /// Join the strokes into the storage key
    pub fn to_key(&self) -> String {
        self.0.join("/")
    }

    /// Number of strokes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn strokes(&self) -> &[String] {
        &self.0
    }
}

/// Stroke count of an already-joined key
pub fn key_length(key: &str) -> usize {
    key.split(STROKE_SEPARATOR).count()
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

impl FromStr for Outline {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

impl From<String> for Outline {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

impl From<&str> for Outline {
    fn from(key: &str) -> Self {
        Self::from_key(key)
    }
}

impl From<Outline> for String {
    fn from(outline: Outline) -> Self {
        outline.to_key()
    }
}
