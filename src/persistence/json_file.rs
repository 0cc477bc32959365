// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! JSON file note store.
//!
//! The whole store lives in one file holding `notebooks` and `notes`
//! arrays. Every write rewrites the file through a sibling temp file and a
//! rename, so a crash mid-write leaves the previous version intact.

use super::{NoteStore, StoreError};
use crate::model::{Note, NoteId, Notebook, NotebookId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    notebooks: Vec<Notebook>,
    #[serde(default)]
    notes: Vec<Note>,
}

/// Notes and notebooks in a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    data: StoreFile,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            if text.trim().is_empty() {
                StoreFile::default()
            } else {
                serde_json::from_str(&text).map_err(|source| StoreError::Format {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            StoreFile::default()
        };
        tracing::info!(
            "Opened note store: {} ({} notes, {} notebooks)",
            path.display(),
            data.notes.len(),
            data.notebooks.len()
        );
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn notes(&self) -> &[Note] {
        &self.data.notes
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.data.notebooks
    }

    fn write(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(&self.data).map_err(|source| {
            StoreError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, text).map_err(io_err)?;
        fs::rename(&temp, &self.path).map_err(io_err)?;
        tracing::debug!("Wrote note store: {}", self.path.display());
        Ok(())
    }
}

impl NoteStore for JsonFileStore {
    fn load_note(&self, id: &NoteId) -> Result<Note, StoreError> {
        self.data
            .notes
            .iter()
            .find(|note| &note.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NoteNotFound(id.clone()))
    }

    fn persist(&mut self, id: &NoteId, content: &str, title: &str) -> Result<(), StoreError> {
        let note = self
            .data
            .notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| StoreError::NoteNotFound(id.clone()))?;
        note.content = content.to_string();
        note.title = title.to_string();
        note.updated_at = Utc::now();
        self.write()
    }

    fn create_notebook(&mut self, title: &str) -> Result<NotebookId, StoreError> {
        let notebook = Notebook::new(title);
        let id = notebook.id.clone();
        self.data.notebooks.insert(0, notebook);
        self.write()?;
        Ok(id)
    }

    fn create_note(
        &mut self,
        notebook_id: Option<NotebookId>,
        title: &str,
    ) -> Result<NoteId, StoreError> {
        if let Some(notebook) = &notebook_id {
            if !self.data.notebooks.iter().any(|n| &n.id == notebook) {
                return Err(StoreError::NotebookNotFound(notebook.clone()));
            }
        }
        let note = Note::new(notebook_id, title);
        let id = note.id.clone();
        self.data.notes.insert(0, note);
        self.write()?;
        Ok(id)
    }
}
