// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Keyboard, typing, paste and focus handling for EditorSession

use super::EditorSession;
use crate::editing::commands::FormatIntent;
use crate::editing::edit_types::CheckpointTrigger;
use crate::persistence::NoteStore;
use crate::surface::{Element, MarkupNode};
use std::time::Instant;

/// Keys the session cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    Char(char),
    Other,
}

/// A key press with its modifiers. `command` is Ctrl, or Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub command: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            command: false,
            shift: false,
        }
    }

    pub fn command(key: Key) -> Self {
        Self {
            key,
            command: true,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

impl EditorSession {
    /// Text typed at the caret
    pub fn insert_text(&mut self, text: &str, now: Instant) {
        if text.is_empty() {
            return;
        }
        self.surface.insert_text(text);
        self.content_changed(now);
    }

    /// Paste plain text: lines become text separated by line breaks
    pub fn paste_plain_text(&mut self, text: &str, now: Instant) {
        if text.is_empty() {
            return;
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let last = lines.len().saturating_sub(1);
        for (index, line) in lines.iter().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                if index > 0 {
                    self.insert_line_break();
                }
            } else {
                self.surface.insert_text(line);
                if index < last {
                    self.insert_line_break();
                }
            }
        }
        self.content_changed(now);
    }

    fn insert_line_break(&mut self) {
        self.surface
            .insert_fragment(MarkupNode::element(Element::new("br")));
    }

    /// Handle a key press. Returns true if the session consumed it.
    pub fn press_key(
        &mut self,
        press: KeyPress,
        now: Instant,
        store: &mut dyn NoteStore,
    ) -> bool {
        if press.command {
            return self.shortcut(press, now, store);
        }
        match press.key {
            Key::Enter => {
                self.insert_line_break();
                self.content_changed(now);
            }
            Key::Backspace => {
                if self.surface.delete_backward() {
                    self.content_changed(now);
                }
            }
            Key::Delete => {
                if self.surface.delete_forward() {
                    self.content_changed(now);
                }
            }
            Key::Char(c) => {
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf), now);
                return true;
            }
            Key::Other => return false,
        }
        // Structural edits get their own checkpoint shortly after the key.
        self.schedule_checkpoint(CheckpointTrigger::StructuralKey, now);
        true
    }

    fn shortcut(&mut self, press: KeyPress, now: Instant, store: &mut dyn NoteStore) -> bool {
        let Key::Char(c) = press.key else {
            return false;
        };
        match (c.to_ascii_lowercase(), press.shift) {
            ('z', false) => {
                self.undo(now);
            }
            ('z', true) | ('y', _) => {
                self.redo(now);
            }
            ('b', _) => {
                self.format(FormatIntent::Bold, now);
            }
            ('i', _) => {
                self.format(FormatIntent::Italic, now);
            }
            ('u', _) => {
                self.format(FormatIntent::Underline, now);
            }
            ('s', _) => {
                self.save_now(store);
            }
            _ => return false,
        }
        true
    }

    /// Surface gained focus; checkpoints immediately
    pub fn focus(&mut self, now: Instant) {
        if self.surface.is_focused() {
            return;
        }
        self.surface.focus();
        self.checkpoint(CheckpointTrigger::Focus, now);
    }

    /// Surface lost focus; saves immediately
    pub fn blur(&mut self, store: &mut dyn NoteStore) {
        self.surface.blur();
        self.save_now(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::model::NoteId;
    use crate::persistence::MemoryStore;
    use crate::surface::{Boundary, Range};
    use std::time::Duration;

    fn caret_at(session: &mut EditorSession, path: &[usize], offset: usize) {
        let node = session.surface().node_at_path(path).unwrap();
        let caret = Range::collapsed(Boundary::new(node, offset));
        assert!(session.surface_mut().set_selection(caret));
    }

    fn session(content: &str) -> (EditorSession, MemoryStore, Instant) {
        let mut store = MemoryStore::new();
        let id = store.create_note(None, "").unwrap();
        let now = Instant::now();
        let session =
            EditorSession::open(id, "", content, EditorConfig::default(), now);
        (session, store, now)
    }

    #[test]
    fn paste_turns_lines_into_breaks() {
        let (mut session, _store, now) = session("");
        session.paste_plain_text("one\ntwo\n\nthree", now);
        assert_eq!(session.content(), "one<br>two<br><br>three");
    }

    #[test]
    fn paste_skips_leading_empty_line() {
        let (mut session, _store, now) = session("");
        session.paste_plain_text("\nfirst", now);
        assert_eq!(session.content(), "first");
    }

    #[test]
    fn paste_leaves_the_caret_after_the_pasted_text() {
        let (mut session, _store, now) = session("<p>ab</p>");
        caret_at(&mut session, &[0, 0], 1);
        session.paste_plain_text("x", now);
        session.insert_text("y", now);
        assert_eq!(session.content(), "<p>axyb</p>");

        let (mut session, _store, now) = self::session("<p>ab</p>");
        caret_at(&mut session, &[0, 0], 1);
        session.paste_plain_text("x\ny", now);
        session.insert_text("z", now);
        assert_eq!(session.content(), "<p>ax<br>yzb</p>");
    }

    #[test]
    fn empty_paste_changes_nothing() {
        let (mut session, _store, now) = session("<p>ab</p>");
        caret_at(&mut session, &[0, 0], 1);
        session.drain_events();
        session.paste_plain_text("", now);
        assert_eq!(session.content(), "<p>ab</p>");
        assert!(!session.has_pending_save());
        assert!(session.drain_events().is_empty());
        let text = session.surface().node_at_path(&[0, 0]).unwrap();
        assert_eq!(
            session.surface().selection(),
            Some(&Range::collapsed(Boundary::new(text, 1)))
        );
    }

    #[test]
    fn enter_inserts_break_and_checkpoints_later() {
        let (mut session, mut store, now) = session("<p>ab</p>");
        session.surface_mut().caret_to_end();
        session.press_key(KeyPress::plain(Key::Enter), now, &mut store);
        assert_eq!(session.content(), "<p>ab</p><br>");
        assert_eq!(session.history().len(), 1);

        session.tick(now + Duration::from_millis(100), &mut store);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn backspace_removes_a_character() {
        let (mut session, mut store, now) = session("<p>abc</p>");
        caret_at(&mut session, &[0, 0], 3);
        session.press_key(KeyPress::plain(Key::Backspace), now, &mut store);
        assert_eq!(session.content(), "<p>ab</p>");
    }

    #[test]
    fn shortcuts_undo_and_redo() {
        let (mut session, mut store, now) = session("<p>a</p>");
        caret_at(&mut session, &[0, 0], 1);
        session.insert_text("b", now);
        session.checkpoint(CheckpointTrigger::Command, now);

        let z = KeyPress::command(Key::Char('z'));
        assert!(session.press_key(z, now, &mut store));
        assert_eq!(session.content(), "<p>a</p>");
        assert!(session.press_key(z.with_shift(), now, &mut store));
        assert_eq!(session.content(), "<p>ab</p>");
    }

    #[test]
    fn command_s_saves_now() {
        let (mut session, mut store, now) = session("<p>a</p>");
        session.insert_text("!", now);
        assert!(session.press_key(KeyPress::command(Key::Char('s')), now, &mut store));
        assert_eq!(store.writes(), 1);
        assert!(!session.has_pending_save());
    }

    #[test]
    fn unknown_shortcut_is_not_consumed() {
        let (mut session, mut store, now) = session("");
        assert!(!session.press_key(KeyPress::command(Key::Char('q')), now, &mut store));
        assert!(!session.press_key(KeyPress::plain(Key::Other), now, &mut store));
    }

    #[test]
    fn focus_checkpoints_only_on_gain() {
        let (mut session, mut store, now) = session("<p>a</p>");
        caret_at(&mut session, &[0, 0], 1);
        session.surface_mut().insert_text("b");
        session.focus(now);
        assert_eq!(session.history().len(), 2);

        session.surface_mut().insert_text("c");
        session.focus(now);
        assert_eq!(session.history().len(), 2);

        session.blur(&mut store);
        assert_eq!(store.note(session.note_id()).unwrap().content, "<p>abc</p>");
    }

    #[test]
    fn note_id_round_trips_through_session() {
        let id = NoteId::new("n1");
        let session = EditorSession::open(
            id.clone(),
            "t",
            "",
            EditorConfig::default(),
            Instant::now(),
        );
        assert_eq!(session.note_id(), &id);
    }
}
