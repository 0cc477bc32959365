// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Edit session - binds one note's surface to its undo timeline
//!
//! The session is the command dispatcher. It owns the content surface, the
//! history engine, the image registry and the deferred-task scheduler, and
//! turns host events (typing, keys, pointer, toolbar intents) into surface
//! mutations and checkpoints. Everything asynchronous runs through the
//! scheduler, so the host only has to call `tick` from its event loop and
//! `animation_frame` once per display frame.

mod images;
mod input;

pub use input::{Key, KeyPress};

use super::commands::{self, FormatIntent, NativeCommands, NoNativeCommands};
use super::edit_types::{CheckpointTrigger, CommandOutcome};
use super::gesture::{FrameUpdate, Gesture};
use super::history::HistoryEngine;
use super::image_registry::ImageRegistry;
use super::scheduler::{Debouncer, FrameThrottle, Scheduler, TimerHandle};
use super::selection::{self, SelectionPath};
use crate::config::EditorConfig;
use crate::model::NoteId;
use crate::model::note::display_title;
use crate::persistence::{NoteStore, SaveState};
use crate::surface::ContentSurface;
use std::collections::VecDeque;
use std::time::Instant;

/// Notifications for the UI shell, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// Undo/redo availability changed
    CheckpointStateChanged { can_undo: bool, can_redo: bool },
    SaveStateChanged(SaveState),
    /// User-visible message (rejected upload, missing selection)
    Message(String),
    /// Show an image at full size
    ImagePreview { src: String, name: String },
}

/// Work deferred through the scheduler
#[derive(Debug, Clone, PartialEq)]
enum SessionTask {
    Checkpoint(CheckpointTrigger),
    AutoSave,
    RestoreSelection(SelectionPath),
    RebindImages,
    ReleaseGuard,
}

/// Editing state for one open note
pub struct EditorSession {
    note_id: NoteId,
    title: String,
    config: EditorConfig,
    surface: ContentSurface,
    history: HistoryEngine,
    images: ImageRegistry,
    native: Box<dyn NativeCommands>,
    scheduler: Scheduler<SessionTask>,
    typing: Debouncer,
    autosave: Debouncer,
    /// Follow-ups of the most recent undo/redo
    restore_tasks: Vec<TimerHandle>,
    gesture: Option<Gesture>,
    frame: FrameThrottle<FrameUpdate>,
    events: VecDeque<ShellEvent>,
    checkpoint_state: Option<(bool, bool)>,
    save_state: Option<SaveState>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("note_id", &self.note_id)
            .field("title", &self.title)
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("images", &self.images.len())
            .field("pending_tasks", &self.scheduler.len())
            .finish()
    }
}

impl EditorSession {
    /// Start a session on `content` with a fresh timeline.
    ///
    /// The loaded content becomes the baseline checkpoint at index 0.
    pub fn open(
        note_id: NoteId,
        title: impl Into<String>,
        content: &str,
        config: EditorConfig,
        now: Instant,
    ) -> Self {
        Self::with_native(note_id, title, content, config, Box::new(NoNativeCommands), now)
    }

    /// Like `open`, with the platform's native formatting commands
    pub fn with_native(
        note_id: NoteId,
        title: impl Into<String>,
        content: &str,
        config: EditorConfig,
        native: Box<dyn NativeCommands>,
        now: Instant,
    ) -> Self {
        let mut surface = ContentSurface::with_markup(content);
        surface.set_client_size(config.surface_size());
        let mut session = Self {
            note_id,
            title: title.into(),
            history: HistoryEngine::new(config.history_limit),
            typing: Debouncer::new(config.typing_debounce()),
            autosave: Debouncer::new(config.autosave_debounce()),
            config,
            surface,
            images: ImageRegistry::new(),
            native,
            scheduler: Scheduler::new(),
            restore_tasks: Vec::new(),
            gesture: None,
            frame: FrameThrottle::new(),
            events: VecDeque::new(),
            checkpoint_state: None,
            save_state: None,
        };
        session.images.rebind(&mut session.surface);
        session.checkpoint(CheckpointTrigger::Load, now);
        tracing::info!(
            "Opened note {} ({} image object(s))",
            session.note_id,
            session.images.len()
        );
        session
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &ContentSurface {
        &self.surface
    }

    /// Direct surface access for host-driven selection changes
    pub fn surface_mut(&mut self) -> &mut ContentSurface {
        &mut self.surface
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn content(&self) -> String {
        self.surface.markup()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn save_state(&self) -> Option<SaveState> {
        self.save_state
    }

    /// When the host should call `tick` next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// True if an automatic save is waiting for its quiet period
    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending(&self.scheduler)
    }

    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        self.events.drain(..).collect()
    }

    // ========================================================================
    // CHECKPOINTS
    // ========================================================================

    /// Checkpoint the surface. Input-originated triggers are dropped while
    /// an undo/redo restore is in flight.
    pub fn checkpoint(&mut self, trigger: CheckpointTrigger, now: Instant) -> bool {
        if trigger.is_input() && self.history.is_restoring() {
            tracing::trace!("Ignoring {:?} checkpoint during restore", trigger);
            return false;
        }
        let appended = self.history.checkpoint(&self.surface, now);
        if appended {
            tracing::debug!(
                "Checkpoint ({:?}) at index {:?}",
                trigger,
                self.history.index()
            );
        }
        self.emit_checkpoint_state();
        appended
    }

    fn schedule_checkpoint(&mut self, trigger: CheckpointTrigger, now: Instant) {
        self.scheduler.schedule_after(
            now,
            self.config.interaction_checkpoint_delay(),
            SessionTask::Checkpoint(trigger),
        );
    }

    /// Behave as if the surface raised an input event
    fn content_changed(&mut self, now: Instant) {
        if !self.history.is_restoring() {
            self.typing.trigger(
                &mut self.scheduler,
                now,
                SessionTask::Checkpoint(CheckpointTrigger::Typing),
            );
        }
        self.request_autosave(now);
    }

    fn emit_checkpoint_state(&mut self) {
        let state = (self.history.can_undo(), self.history.can_redo());
        if self.checkpoint_state != Some(state) {
            self.checkpoint_state = Some(state);
            self.events.push_back(ShellEvent::CheckpointStateChanged {
                can_undo: state.0,
                can_redo: state.1,
            });
        }
    }

    // ========================================================================
    // UNDO / REDO
    // ========================================================================

    pub fn undo(&mut self, now: Instant) -> bool {
        let restore = self.history.undo(&mut self.surface);
        self.finish_restore(restore.map(|r| r.selection), now, "Undo")
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let restore = self.history.redo(&mut self.surface);
        self.finish_restore(restore.map(|r| r.selection), now, "Redo")
    }

    /// Content is already swapped; defer the cosmetic follow-ups
    fn finish_restore(
        &mut self,
        restored: Option<Option<SelectionPath>>,
        now: Instant,
        what: &str,
    ) -> bool {
        let Some(selection) = restored else {
            return false;
        };
        tracing::debug!("{}: restored index {:?}", what, self.history.index());

        // Old handles and gestures point at nodes that no longer exist.
        self.images.clear();
        self.gesture = None;
        self.frame.cancel();
        self.surface.focus();

        // A newer restore supersedes the follow-ups of an earlier one.
        for handle in self.restore_tasks.drain(..) {
            self.scheduler.cancel(handle);
        }
        let delay = self.config.restore_delay();
        if let Some(path) = selection {
            self.restore_tasks.push(self.scheduler.schedule_after(
                now,
                delay,
                SessionTask::RestoreSelection(path),
            ));
        }
        self.restore_tasks.push(
            self.scheduler
                .schedule_after(now, delay, SessionTask::RebindImages),
        );
        self.restore_tasks.push(self.scheduler.schedule_after(
            now,
            self.config.guard_release(),
            SessionTask::ReleaseGuard,
        ));
        self.emit_checkpoint_state();
        self.request_autosave(now);
        true
    }

    // ========================================================================
    // FORMATTING
    // ========================================================================

    /// Apply a formatting intent.
    ///
    /// The pre-state is checkpointed before the surface changes, so undo
    /// always lands strictly before the command.
    pub fn format(&mut self, intent: FormatIntent, now: Instant) -> CommandOutcome {
        self.surface.focus();
        if !intent.accepts_selection(&self.surface.selected_text()) {
            if let Some(prompt) = intent.selection_prompt() {
                self.events.push_back(ShellEvent::Message(prompt.to_string()));
            }
            return CommandOutcome::NeedsSelection;
        }

        self.checkpoint(CheckpointTrigger::Command, now);
        let outcome = commands::dispatch(self.native.as_mut(), &mut self.surface, &intent);
        if outcome.applied() {
            self.content_changed(now);
        } else {
            self.request_autosave(now);
        }
        outcome
    }

    // ========================================================================
    // TITLE AND PERSISTENCE
    // ========================================================================

    /// Replace the title; line breaks become spaces
    pub fn set_title(&mut self, title: &str, now: Instant) {
        self.title = title
            .split(['\r', '\n'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.request_autosave(now);
    }

    fn request_autosave(&mut self, now: Instant) {
        self.autosave
            .trigger(&mut self.scheduler, now, SessionTask::AutoSave);
        self.set_save_state(SaveState::Saving);
    }

    fn set_save_state(&mut self, state: SaveState) {
        if self.save_state != Some(state) {
            self.save_state = Some(state);
            self.events.push_back(ShellEvent::SaveStateChanged(state));
        }
    }

    /// Save immediately, dropping any pending automatic save
    pub fn save_now(&mut self, store: &mut dyn NoteStore) -> bool {
        self.autosave.cancel(&mut self.scheduler);
        self.save(store)
    }

    /// Save if an automatic save is still pending; used before the session
    /// is dropped
    pub fn flush(&mut self, store: &mut dyn NoteStore) -> bool {
        if self.has_pending_save() {
            return self.save_now(store);
        }
        true
    }

    fn save(&mut self, store: &mut dyn NoteStore) -> bool {
        let content = self.surface.markup();
        let title = display_title(&self.title);
        match store.persist(&self.note_id, &content, &title) {
            Ok(()) => {
                tracing::debug!("Saved note {}", self.note_id);
                self.set_save_state(SaveState::Saved);
                true
            }
            Err(e) => {
                tracing::error!("Failed to save note {}: {}", self.note_id, e);
                self.set_save_state(SaveState::Error);
                false
            }
        }
    }

    // ========================================================================
    // DEFERRED WORK
    // ========================================================================

    /// Run every task due at `now`
    pub fn tick(&mut self, now: Instant, store: &mut dyn NoteStore) {
        loop {
            let due = self.scheduler.take_due(now);
            if due.is_empty() {
                break;
            }
            for task in due {
                self.run_task(task, now, store);
            }
        }
    }

    fn run_task(&mut self, task: SessionTask, now: Instant, store: &mut dyn NoteStore) {
        match task {
            SessionTask::Checkpoint(trigger) => {
                self.checkpoint(trigger, now);
            }
            SessionTask::AutoSave => {
                self.save(store);
            }
            SessionTask::RestoreSelection(path) => {
                if !selection::restore(&path, &mut self.surface) {
                    tracing::trace!("Selection path no longer resolves");
                }
            }
            SessionTask::RebindImages => {
                let path = selection::capture(&self.surface);
                self.images.rebind(&mut self.surface);
                if let Some(path) = path {
                    selection::restore(&path, &mut self.surface);
                }
            }
            SessionTask::ReleaseGuard => {
                self.history.release_guard();
                self.restore_tasks.clear();
            }
        }
    }
}
