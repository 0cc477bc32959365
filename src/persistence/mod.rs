// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Note storage collaborators.
//!
//! The editor only needs two things from storage: the content of a note
//! when a session starts, and somewhere to put content and title when it
//! saves. How and where that happens is up to the `NoteStore`.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::model::{Note, NoteId, NotebookId};
use std::path::PathBuf;
use thiserror::Error;

/// Save indicator state shown by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Saving,
    Saved,
    Error,
}

impl SaveState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Notebook not found: {0}")]
    NotebookNotFound(NotebookId),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed note store {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Where notes come from and go to
pub trait NoteStore {
    fn load_note(&self, id: &NoteId) -> Result<Note, StoreError>;

    /// Write a note's content and title
    fn persist(&mut self, id: &NoteId, content: &str, title: &str) -> Result<(), StoreError>;

    fn load_note_content(&self, id: &NoteId) -> Result<String, StoreError> {
        Ok(self.load_note(id)?.content)
    }

    fn create_notebook(&mut self, title: &str) -> Result<NotebookId, StoreError>;

    /// Create a blank note. An unknown notebook is an error.
    fn create_note(
        &mut self,
        notebook_id: Option<NotebookId>,
        title: &str,
    ) -> Result<NoteId, StoreError>;
}
