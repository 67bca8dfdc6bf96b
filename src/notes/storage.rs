//! Note persistence

use std::sync::Arc;

use crate::clock::Clock;
use crate::storage::{KeyValueStore, NOTES_KEY_PREFIX, StorageError, load_record, try_save_record};

use super::ModuleNote;

/// Notes keyed by module slug
pub struct NotesStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl NotesStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    fn key(slug: &str) -> String {
        format!("{NOTES_KEY_PREFIX}{slug}")
    }

    /// Get the note for a module
    pub fn get(&self, slug: &str) -> Option<ModuleNote> {
        load_record(self.storage.as_ref(), &Self::key(slug))
    }

    /// Replace the note for a module. Blank content deletes the note; a
    /// failed write is returned.
    pub fn save(&self, slug: &str, content: &str) -> Result<Option<ModuleNote>, StorageError> {
        if content.trim().is_empty() {
            self.delete(slug);
            return Ok(None);
        }

        let note = ModuleNote {
            slug: slug.to_string(),
            content: content.to_string(),
            updated_at: self.clock.now(),
        };
        try_save_record(self.storage.as_ref(), &Self::key(slug), &note)?;
        tracing::debug!("Saved note for {} ({} words)", slug, note.word_count());
        Ok(Some(note))
    }

    /// Delete the note for a module, returning whether one existed
    pub fn delete(&self, slug: &str) -> bool {
        let existed = self.get(slug).is_some();
        if let Err(e) = self.storage.remove(&Self::key(slug)) {
            tracing::warn!("Failed to delete note for {}: {}", slug, e);
            return false;
        }
        existed
    }

    /// All notes, most recently edited first
    pub fn list(&self) -> Vec<ModuleNote> {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Failed to list notes: {}", e);
                return Vec::new();
            }
        };

        let mut notes: Vec<ModuleNote> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(NOTES_KEY_PREFIX))
            .filter_map(|slug| self.get(slug))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.slug.cmp(&b.slug)));
        notes
    }

    /// Number of stored notes
    pub fn count(&self) -> usize {
        self.list().len()
    }
}
