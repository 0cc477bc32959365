// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Editor session management for AppState

use super::AppState;
use crate::editing::{EditorSession, KeyPress, ShellEvent};
use crate::model::NoteId;
use crate::persistence::{NoteStore, StoreError};
use std::time::Instant;

impl AppState {
    /// Open a note in a fresh session.
    ///
    /// The previous note is saved first if it has unsaved changes. The new
    /// session starts with an empty timeline whose baseline is the note's
    /// stored content.
    pub fn open_note(&mut self, id: &NoteId, now: Instant) -> Result<(), StoreError> {
        let note = self.store.load_note(id)?;
        self.close_note();

        let session = EditorSession::open(
            note.id.clone(),
            note.title.clone(),
            &note.content,
            self.config.clone(),
            now,
        );
        tracing::info!("Editing note {} ({})", note.id, session.title());
        self.session = Some(session);
        Ok(())
    }

    /// Save any pending changes and drop the session
    pub fn close_note(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.flush(self.store.as_mut());
        self.pending_events.extend(session.drain_events());
        tracing::debug!("Closed note {}", session.note_id());
    }

    /// Run the open session's due tasks
    pub fn tick(&mut self, now: Instant) {
        if let Some(session) = &mut self.session {
            session.tick(now, self.store.as_mut());
        }
    }

    /// When `tick` should next be called
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(EditorSession::next_deadline)
    }

    /// Forward a key press; the store is needed for Ctrl/Cmd+S
    pub fn press_key(&mut self, press: KeyPress, now: Instant) -> bool {
        match &mut self.session {
            Some(session) => session.press_key(press, now, self.store.as_mut()),
            None => false,
        }
    }

    pub fn blur(&mut self) {
        if let Some(session) = &mut self.session {
            session.blur(self.store.as_mut());
        }
    }

    /// Save the open note immediately
    pub fn save(&mut self) -> bool {
        match &mut self.session {
            Some(session) => session.save_now(self.store.as_mut()),
            None => true,
        }
    }

    /// Everything the shell should react to since the last call
    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        if let Some(session) = &mut self.session {
            events.extend(session.drain_events());
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EditorConfig;
    use crate::data::AppState;
    use crate::editing::{Key, KeyPress, ShellEvent};
    use crate::persistence::{MemoryStore, NoteStore, SaveState};
    use std::time::{Duration, Instant};

    fn app_with_notes(count: usize) -> (AppState, Vec<crate::model::NoteId>) {
        let mut store = MemoryStore::new();
        let ids = (0..count)
            .map(|_| store.create_note(None, "").unwrap())
            .collect();
        (AppState::new(Box::new(store), EditorConfig::default()), ids)
    }

    #[test]
    fn switching_notes_saves_and_resets_history() {
        let (mut app, ids) = app_with_notes(2);
        let now = Instant::now();
        app.open_note(&ids[0], now).unwrap();
        app.session_mut().unwrap().insert_text("first", now);
        assert!(app.session().unwrap().has_pending_save());

        app.open_note(&ids[1], now).unwrap();
        assert_eq!(app.store().load_note_content(&ids[0]).unwrap(), "first");
        let session = app.session().unwrap();
        assert_eq!(session.note_id(), &ids[1]);
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo());

        let events = app.drain_events();
        assert!(events.contains(&ShellEvent::SaveStateChanged(SaveState::Saved)));
    }

    #[test]
    fn opening_a_missing_note_keeps_the_current_one() {
        let (mut app, ids) = app_with_notes(1);
        let now = Instant::now();
        app.open_note(&ids[0], now).unwrap();
        let missing = crate::model::NoteId::new("missing");
        assert!(app.open_note(&missing, now).is_err());
        assert_eq!(app.session().unwrap().note_id(), &ids[0]);
    }

    #[test]
    fn tick_drives_autosave() {
        let (mut app, ids) = app_with_notes(1);
        let now = Instant::now();
        app.open_note(&ids[0], now).unwrap();
        app.press_key(KeyPress::plain(Key::Char('x')), now);
        assert_eq!(app.next_deadline(), Some(now + Duration::from_millis(1000)));

        app.tick(now + Duration::from_millis(1000));
        assert_eq!(app.store().load_note_content(&ids[0]).unwrap(), "x");
        assert_eq!(app.next_deadline(), None);
    }

    #[test]
    fn without_a_session_everything_is_a_no_op() {
        let (mut app, _) = app_with_notes(0);
        app.tick(Instant::now());
        app.blur();
        assert!(app.save());
        assert!(!app.press_key(KeyPress::plain(Key::Enter), Instant::now()));
        assert!(app.drain_events().is_empty());
    }
}
