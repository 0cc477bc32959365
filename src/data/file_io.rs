// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Store and file access for AppState (open store, create notes, images)

use super::AppState;
use crate::config::EditorConfig;
use crate::editing::ImageUpload;
use crate::model::{NoteId, NotebookId};
use crate::persistence::{JsonFileStore, NoteStore};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

impl AppState {
    /// Application state backed by a JSON note file
    pub fn open_json(path: &Path, config: EditorConfig) -> Result<Self> {
        let store = JsonFileStore::open(path)
            .with_context(|| format!("Failed to open note store: {}", path.display()))?;
        Ok(Self::new(Box::new(store), config))
    }

    pub fn create_notebook(&mut self, title: &str) -> Result<NotebookId> {
        let id = self.store.create_notebook(title)?;
        tracing::info!("Created notebook {}: {}", id, title);
        Ok(id)
    }

    /// Create a note and open it
    pub fn create_note(
        &mut self,
        notebook_id: Option<NotebookId>,
        title: &str,
        now: Instant,
    ) -> Result<NoteId> {
        let id = match self.store.create_note(notebook_id, title) {
            Ok(id) => id,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return Err(e.into());
            }
        };
        self.open_note(&id, now)?;
        self.error_message = None;
        Ok(id)
    }

    /// Insert an image file into the open note.
    ///
    /// Returns `Ok(false)` when there is no open note or the file was
    /// refused; the refusal reaches the shell as a message event.
    pub fn insert_image_file(
        &mut self,
        path: &Path,
        media_type: Option<&str>,
        now: Instant,
    ) -> Result<bool> {
        let Some(session) = &mut self.session else {
            return Ok(false);
        };
        let upload = read_image(path, media_type)?;
        Ok(session.insert_image(&upload, now).is_ok())
    }
}

/// Read a file as an upload. Without an explicit media type it is guessed
/// from the file extension.
pub fn read_image(path: &Path, media_type: Option<&str>) -> Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    let media_type = match media_type {
        Some(media_type) => media_type.to_string(),
        None => image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string()),
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageUpload::new(name, media_type, bytes))
}
