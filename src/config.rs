// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Runtime editor configuration.
//!
//! `EditorConfig` mirrors the defaults in `settings.rs` and can be
//! overridden from a TOML file. Every field is optional in the file;
//! missing keys fall back to the compiled defaults.

use crate::settings;
use anyhow::{Context, Result, bail};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable editor behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum snapshots in the undo timeline
    pub history_limit: usize,
    /// Quiet period after typing before a checkpoint (ms)
    pub typing_debounce_ms: u64,
    /// Quiet period before an automatic save (ms)
    pub autosave_debounce_ms: u64,
    /// Delay before checkpointing after pointer-up / structural keys (ms)
    pub interaction_checkpoint_delay_ms: u64,
    /// Delay before cursor and image restoration after undo/redo (ms)
    pub restore_delay_ms: u64,
    /// How long input checkpoints stay suppressed after undo/redo (ms)
    pub guard_release_ms: u64,
    /// Largest accepted image upload in bytes
    pub max_image_bytes: u64,
    /// Margin kept between a dragged image and the surface edge
    pub drag_padding: f64,
    /// Initial content box of the surface
    pub surface_width: f64,
    pub surface_height: f64,
    /// Freeform image resize limits
    pub image_min_width: f64,
    pub image_max_width: f64,
    pub image_min_height: f64,
    pub image_max_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: settings::history::LIMIT,
            typing_debounce_ms: settings::timing::TYPING_DEBOUNCE_MS,
            autosave_debounce_ms: settings::timing::AUTOSAVE_DEBOUNCE_MS,
            interaction_checkpoint_delay_ms:
                settings::timing::INTERACTION_CHECKPOINT_DELAY_MS,
            restore_delay_ms: settings::timing::RESTORE_DELAY_MS,
            guard_release_ms: settings::timing::GUARD_RELEASE_MS,
            max_image_bytes: settings::image::MAX_BYTES,
            drag_padding: settings::image::DRAG_PADDING,
            surface_width: settings::surface::WIDTH,
            surface_height: settings::surface::HEIGHT,
            image_min_width: settings::image::MIN_WIDTH,
            image_max_width: settings::image::MAX_WIDTH,
            image_min_height: settings::image::MIN_HEIGHT,
            image_max_height: settings::image::MAX_HEIGHT,
        }
    }
}

impl EditorConfig {
    /// Load a configuration file, falling back to defaults for missing keys
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read config: {}", path.display())
        })?;
        let config = Self::from_toml(&text).with_context(|| {
            format!("Failed to parse config: {}", path.display())
        })?;
        tracing::info!("Loaded config: {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the editor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            bail!("history_limit must be at least 1");
        }
        if !ordered(self.image_min_width, self.image_max_width) {
            bail!(
                "image_min_width ({}) exceeds image_max_width ({})",
                self.image_min_width,
                self.image_max_width
            );
        }
        if !ordered(self.image_min_height, self.image_max_height) {
            bail!(
                "image_min_height ({}) exceeds image_max_height ({})",
                self.image_min_height,
                self.image_max_height
            );
        }
        if !ordered(0.0, self.drag_padding) {
            bail!("drag_padding must not be negative");
        }
        if self.restore_delay_ms >= self.guard_release_ms {
            bail!(
                "restore_delay_ms ({}) must be shorter than guard_release_ms ({})",
                self.restore_delay_ms,
                self.guard_release_ms
            );
        }
        Ok(())
    }

    pub fn typing_debounce(&self) -> Duration {
        Duration::from_millis(self.typing_debounce_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn interaction_checkpoint_delay(&self) -> Duration {
        Duration::from_millis(self.interaction_checkpoint_delay_ms)
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.restore_delay_ms)
    }

    pub fn guard_release(&self) -> Duration {
        Duration::from_millis(self.guard_release_ms)
    }

    /// Initial surface content box
    pub fn surface_size(&self) -> Size {
        Size::new(self.surface_width, self.surface_height)
    }

    /// Clamp a requested image size to the resize limits
    pub fn clamp_image_size(&self, size: Size) -> Size {
        Size::new(
            size.width
                .clamp(self.image_min_width, self.image_max_width),
            size.height
                .clamp(self.image_min_height, self.image_max_height),
        )
    }
}

/// `min <= max`, false if either is NaN
fn ordered(min: f64, max: f64) -> bool {
    min <= max
}
