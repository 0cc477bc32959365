// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Editor settings and compile-time defaults.
//!
//! These constants seed `EditorConfig::default()`. Anything a host may want
//! to tune at runtime is mirrored in `config.rs`; the values here stay the
//! single source for the defaults.

// ============================================================================
// HISTORY SETTINGS
// ============================================================================
/// Maximum number of snapshots kept in the undo timeline
const HISTORY_LIMIT: usize = 100;

// ============================================================================
// TIMING SETTINGS (milliseconds)
// ============================================================================
/// Quiet period after a burst of typing before a checkpoint is taken
const TYPING_DEBOUNCE_MS: u64 = 1000;

/// Quiet period before an automatic save runs
const AUTOSAVE_DEBOUNCE_MS: u64 = 1000;

/// Delay before checkpointing after pointer-up or a structural key
const INTERACTION_CHECKPOINT_DELAY_MS: u64 = 100;

/// Delay between a content swap and cursor/image restoration
const RESTORE_DELAY_MS: u64 = 10;

/// How long input-driven checkpoints stay suppressed after undo/redo
const GUARD_RELEASE_MS: u64 = 50;

// ============================================================================
// IMAGE SETTINGS
// ============================================================================
/// Largest accepted upload (5 MiB)
const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Default container size for a freshly inserted image
const IMAGE_DEFAULT_WIDTH: f64 = 300.0;
const IMAGE_DEFAULT_HEIGHT: f64 = 200.0;

/// Freeform resize limits
const IMAGE_MIN_WIDTH: f64 = 100.0;
const IMAGE_MAX_WIDTH: f64 = 800.0;
const IMAGE_MIN_HEIGHT: f64 = 100.0;
const IMAGE_MAX_HEIGHT: f64 = 600.0;

/// Margin kept between a dragged image and the surface edge
const DRAG_PADDING: f64 = 10.0;

/// Stacking order at rest and while dragging
const IMAGE_Z_REST: i32 = 10;
const IMAGE_Z_DRAGGING: i32 = 25;

// ============================================================================
// SURFACE SETTINGS
// ============================================================================
/// Content box assumed until the host reports a real one
const SURFACE_WIDTH: f64 = 800.0;
const SURFACE_HEIGHT: f64 = 600.0;

/// Title used when a note is saved with an empty title
const UNTITLED_NOTE: &str = "Untitled Note";

// ============================================================================
// PUBLIC API - Don't edit below this line unless you know what you're doing
// ============================================================================

/// Undo timeline settings
pub mod history {
    /// Maximum snapshots kept before the oldest is evicted
    pub const LIMIT: usize = super::HISTORY_LIMIT;
}

/// Debounce and deferral timings, in milliseconds
pub mod timing {
    pub const TYPING_DEBOUNCE_MS: u64 = super::TYPING_DEBOUNCE_MS;
    pub const AUTOSAVE_DEBOUNCE_MS: u64 = super::AUTOSAVE_DEBOUNCE_MS;
    pub const INTERACTION_CHECKPOINT_DELAY_MS: u64 =
        super::INTERACTION_CHECKPOINT_DELAY_MS;
    pub const RESTORE_DELAY_MS: u64 = super::RESTORE_DELAY_MS;
    pub const GUARD_RELEASE_MS: u64 = super::GUARD_RELEASE_MS;
}

/// Embedded image sizing and interaction settings
pub mod image {
    pub const MAX_BYTES: u64 = super::MAX_IMAGE_BYTES;
    pub const DEFAULT_WIDTH: f64 = super::IMAGE_DEFAULT_WIDTH;
    pub const DEFAULT_HEIGHT: f64 = super::IMAGE_DEFAULT_HEIGHT;
    pub const MIN_WIDTH: f64 = super::IMAGE_MIN_WIDTH;
    pub const MAX_WIDTH: f64 = super::IMAGE_MAX_WIDTH;
    pub const MIN_HEIGHT: f64 = super::IMAGE_MIN_HEIGHT;
    pub const MAX_HEIGHT: f64 = super::IMAGE_MAX_HEIGHT;
    pub const DRAG_PADDING: f64 = super::DRAG_PADDING;
    pub const Z_REST: i32 = super::IMAGE_Z_REST;
    pub const Z_DRAGGING: i32 = super::IMAGE_Z_DRAGGING;
}

/// Content surface defaults
pub mod surface {
    pub const WIDTH: f64 = super::SURFACE_WIDTH;
    pub const HEIGHT: f64 = super::SURFACE_HEIGHT;
}

/// Note persistence defaults
pub mod note {
    pub const UNTITLED: &str = super::UNTITLED_NOTE;
}
