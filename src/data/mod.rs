// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Central application state (`AppState`).
//!
//! `AppState` owns the note store, the editor configuration and the active
//! edit session. Hosts drive it with events and a clock; it never reaches
//! for global state. Sub-modules split the methods by domain: store and
//! file access, and editor lifecycle.

mod editor;
mod file_io;

use crate::config::EditorConfig;
use crate::editing::{EditorSession, ShellEvent};
use crate::persistence::NoteStore;

/// Main application state
pub struct AppState {
    /// Where notes are loaded from and saved to
    store: Box<dyn NoteStore>,

    /// Settings handed to every new session
    config: EditorConfig,

    /// The open note, if any
    session: Option<EditorSession>,

    /// Events left over from sessions that have been closed
    pending_events: Vec<ShellEvent>,

    /// Last store error, for display
    pub error_message: Option<String>,
}

impl AppState {
    pub fn new(store: Box<dyn NoteStore>, config: EditorConfig) -> Self {
        Self {
            store,
            config,
            session: None,
            pending_events: Vec::new(),
            error_message: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn NoteStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn NoteStore {
        self.store.as_mut()
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        self.session.as_mut()
    }

    pub fn has_open_note(&self) -> bool {
        self.session.is_some()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}
