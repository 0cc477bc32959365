// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Snapshot-based undo/redo timeline.
//!
//! Each checkpoint stores the full serialized content plus a structural
//! selection path. The timeline is linear: checkpointing after an undo drops
//! the redo branch. It is bounded; the oldest snapshot is evicted once the
//! limit is exceeded and the cursor shifts so it keeps naming the same entry.
//!
//! The engine also owns the re-entrancy guard. `undo`/`redo` raise it and
//! the caller releases it once the restore's deferred side effects have run;
//! while it is raised, input-driven checkpoints must not be taken.

use super::selection::{self, SelectionPath};
use crate::surface::ContentSurface;
use std::time::Instant;

/// One captured state of the surface
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub content: String,
    pub timestamp: Instant,
    pub selection: Option<SelectionPath>,
}

/// What an undo/redo applied, for the caller to finish asynchronously
#[derive(Debug, Clone, PartialEq)]
pub struct Restore {
    /// Timeline index now current
    pub index: usize,
    /// Cursor to put back once the surface has settled
    pub selection: Option<SelectionPath>,
}

/// Bounded linear undo timeline
#[derive(Debug, Clone)]
pub struct HistoryEngine {
    snapshots: Vec<Snapshot>,
    index: Option<usize>,
    max_size: usize,
    restoring: bool,
}

impl HistoryEngine {
    /// Create an empty timeline holding at most `max_size` snapshots
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            index: None,
            max_size: max_size.max(1),
            restoring: false,
        }
    }

    /// Capture the surface as the new head of the timeline.
    ///
    /// No-op (returning false) when the current entry already holds
    /// byte-identical content.
    pub fn checkpoint(&mut self, surface: &ContentSurface, now: Instant) -> bool {
        let content = surface.markup();
        if let Some(current) = self.current() {
            if current.content == content {
                tracing::trace!("Checkpoint coalesced at index {:?}", self.index);
                return false;
            }
        }

        let keep = self.index.map(|i| i + 1).unwrap_or(0);
        if keep < self.snapshots.len() {
            tracing::debug!(
                "Discarding {} redo snapshot(s)",
                self.snapshots.len() - keep
            );
            self.snapshots.truncate(keep);
        }

        self.snapshots.push(Snapshot {
            content,
            timestamp: now,
            selection: selection::capture(surface),
        });
        let mut index = self.snapshots.len() - 1;

        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
            index -= 1;
        }
        self.index = Some(index);
        tracing::debug!(
            "Checkpoint {} of {} appended",
            index + 1,
            self.snapshots.len()
        );
        true
    }

    /// Step back one snapshot and load it into the surface
    pub fn undo(&mut self, surface: &mut ContentSurface) -> Option<Restore> {
        if !self.can_undo() {
            return None;
        }
        let index = self.index? - 1;
        Some(self.apply(index, surface))
    }

    /// Step forward one snapshot and load it into the surface
    pub fn redo(&mut self, surface: &mut ContentSurface) -> Option<Restore> {
        if !self.can_redo() {
            return None;
        }
        let index = self.index? + 1;
        Some(self.apply(index, surface))
    }

    fn apply(&mut self, index: usize, surface: &mut ContentSurface) -> Restore {
        self.index = Some(index);
        self.restoring = true;
        let snapshot = &self.snapshots[index];
        surface.set_markup(&snapshot.content);
        Restore {
            index,
            selection: snapshot.selection.clone(),
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.snapshots.len())
    }

    /// Current cursor; `None` for an empty timeline
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.index?)
    }

    /// Drop every snapshot, e.g. when a different note is opened
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = None;
        self.restoring = false;
    }

    /// True between an undo/redo and the matching `release_guard`
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn release_guard(&mut self) {
        self.restoring = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(history: &HistoryEngine) -> Vec<&str> {
        history
            .snapshots()
            .iter()
            .map(|s| s.content.as_str())
            .collect()
    }

    fn checkpoint_markup(
        history: &mut HistoryEngine,
        surface: &mut ContentSurface,
        markup: &str,
    ) -> bool {
        surface.set_markup(markup);
        history.checkpoint(surface, Instant::now())
    }

    #[test]
    fn empty_timeline_has_no_cursor() {
        let history = HistoryEngine::new(10);
        assert_eq!(history.index(), None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn k_checkpoints_allow_k_minus_one_undos() {
        for k in 1..6 {
            let mut history = HistoryEngine::new(100);
            let mut surface = ContentSurface::new();
            for i in 0..k {
                checkpoint_markup(&mut history, &mut surface, &format!("v{i}"));
            }
            let mut undos = 0;
            while history.undo(&mut surface).is_some() {
                history.release_guard();
                undos += 1;
            }
            assert_eq!(undos, k - 1);
            assert!(!history.can_undo());
            assert_eq!(surface.markup(), "v0");
        }
    }

    #[test]
    fn identical_content_is_coalesced() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::with_markup("<p>a</p>");
        assert!(history.checkpoint(&surface, Instant::now()));
        assert!(!history.checkpoint(&surface, Instant::now()));
        assert_eq!(history.len(), 1);

        surface.focus();
        assert!(!history.checkpoint(&surface, Instant::now()));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn checkpoint_after_undo_discards_redo_branch() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        for markup in ["A", "B", "C"] {
            checkpoint_markup(&mut history, &mut surface, markup);
        }
        assert_eq!(history.index(), Some(2));

        history.undo(&mut surface).unwrap();
        history.release_guard();
        checkpoint_markup(&mut history, &mut surface, "D");

        assert_eq!(contents(&history), vec!["A", "B", "D"]);
        assert_eq!(history.index(), Some(2));
        assert!(history.redo(&mut surface).is_none());
    }

    #[test]
    fn oldest_snapshot_is_evicted() {
        let mut history = HistoryEngine::new(3);
        let mut surface = ContentSurface::new();
        for markup in ["A", "B", "C", "D"] {
            checkpoint_markup(&mut history, &mut surface, markup);
        }
        assert_eq!(contents(&history), vec!["B", "C", "D"]);
        assert_eq!(history.index(), Some(2));
    }

    #[test]
    fn undo_at_start_and_redo_at_end_fail() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        checkpoint_markup(&mut history, &mut surface, "A");
        assert!(history.undo(&mut surface).is_none());
        assert!(history.redo(&mut surface).is_none());
        assert!(!history.is_restoring());
    }

    #[test]
    fn undo_restores_content_and_raises_guard() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        checkpoint_markup(&mut history, &mut surface, "");
        checkpoint_markup(&mut history, &mut surface, "hello");

        let restore = history.undo(&mut surface).unwrap();
        assert_eq!(restore.index, 0);
        assert_eq!(surface.markup(), "");
        assert!(history.is_restoring());
        assert!(history.can_redo());

        history.release_guard();
        history.redo(&mut surface).unwrap();
        assert_eq!(surface.markup(), "hello");
        assert!(!history.can_redo());
    }

    #[test]
    fn coalescing_compares_the_current_entry_only() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        checkpoint_markup(&mut history, &mut surface, "A");
        checkpoint_markup(&mut history, &mut surface, "B");
        // Returning to earlier content still records a new entry.
        assert!(checkpoint_markup(&mut history, &mut surface, "A"));
        assert_eq!(contents(&history), vec!["A", "B", "A"]);
    }

    #[test]
    fn snapshots_carry_the_selection() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        surface.insert_text("hey");
        history.checkpoint(&surface, Instant::now());
        let selection = history.current().unwrap().selection.clone().unwrap();
        assert_eq!(selection.start_container_path, vec![0]);
        assert_eq!(selection.start_offset, 3);
    }

    #[test]
    fn clear_resets_everything() {
        let mut history = HistoryEngine::new(10);
        let mut surface = ContentSurface::new();
        checkpoint_markup(&mut history, &mut surface, "A");
        checkpoint_markup(&mut history, &mut surface, "B");
        history.undo(&mut surface);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
        assert!(!history.is_restoring());
    }
}
