// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! In-memory note store

use super::{NoteStore, StoreError};
use crate::model::{Note, NoteId, Notebook, NotebookId};
use chrono::Utc;
use std::collections::BTreeMap;

/// Keeps notes in a map; can be told to fail writes
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    notes: BTreeMap<NoteId, Note>,
    notebooks: BTreeMap<NotebookId, Notebook>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note, returning its id
    pub fn insert(&mut self, note: Note) -> NoteId {
        let id = note.id.clone();
        self.notes.insert(id.clone(), note);
        id
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Make every following `persist` fail (or succeed again)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Successful writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl NoteStore for MemoryStore {
    fn load_note(&self, id: &NoteId) -> Result<Note, StoreError> {
        self.notes
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NoteNotFound(id.clone()))
    }

    fn persist(&mut self, id: &NoteId, content: &str, title: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let note = self
            .notes
            .get_mut(id)
            .ok_or_else(|| StoreError::NoteNotFound(id.clone()))?;
        note.content = content.to_string();
        note.title = title.to_string();
        note.updated_at = Utc::now();
        self.writes += 1;
        Ok(())
    }

    fn create_notebook(&mut self, title: &str) -> Result<NotebookId, StoreError> {
        let notebook = Notebook::new(title);
        let id = notebook.id.clone();
        self.notebooks.insert(id.clone(), notebook);
        Ok(id)
    }

    fn create_note(
        &mut self,
        notebook_id: Option<NotebookId>,
        title: &str,
    ) -> Result<NoteId, StoreError> {
        if let Some(notebook) = &notebook_id {
            if !self.notebooks.contains_key(notebook) {
                return Err(StoreError::NotebookNotFound(notebook.clone()));
            }
        }
        Ok(self.insert(Note::new(notebook_id, title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_updates_content_and_title() {
        let mut store = MemoryStore::new();
        let id = store.create_note(None, "").unwrap();
        store.persist(&id, "<p>x</p>", "Title").unwrap();
        assert_eq!(store.load_note_content(&id).unwrap(), "<p>x</p>");
        assert_eq!(store.note(&id).unwrap().title, "Title");
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn failing_writes_leave_note_alone() {
        let mut store = MemoryStore::new();
        let id = store.create_note(None, "a").unwrap();
        store.set_fail_writes(true);
        assert!(matches!(
            store.persist(&id, "new", "b"),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.note(&id).unwrap().content, "");
    }

    #[test]
    fn notes_need_an_existing_notebook() {
        let mut store = MemoryStore::new();
        let missing = NotebookId::new("ghost");
        assert!(store.create_note(Some(missing), "").is_err());
        let book = store.create_notebook("Work").unwrap();
        let id = store.create_note(Some(book.clone()), "").unwrap();
        assert_eq!(store.note(&id).unwrap().notebook_id, Some(book));
    }

    #[test]
    fn unknown_note_is_an_error() {
        let store = MemoryStore::new();
        let missing = NoteId::new("nope");
        assert!(matches!(
            store.load_note(&missing),
            Err(StoreError::NoteNotFound(_))
        ));
    }
}
