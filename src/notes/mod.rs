//! Per-module notes
//!
//! Each module has at most one free-text note, stored under its own key so
//! that editing one note never rewrites the others.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use storage::NotesStore;

/// A reader's note on one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNote {
    /// Module the note belongs to
    pub slug: String,
    /// Note text
    pub content: String,
    /// Last edit time
    pub updated_at: DateTime<Utc>,
}

impl ModuleNote {
    /// First non-empty line, for listings
    pub fn headline(&self) -> &str {
        self.content.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
    }

    /// Number of words in the note
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
