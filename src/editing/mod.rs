// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Editing model and interaction

pub mod commands;
pub mod edit_types;
pub mod gesture;
pub mod history;
pub mod image_object;
pub mod image_registry;
pub mod scheduler;
pub mod selection;
pub mod session;

pub use commands::{Alignment, BlockFormat, FormatIntent, NativeCommands, NoNativeCommands};
pub use edit_types::{CheckpointTrigger, CommandOutcome};
pub use gesture::PointerEvent;
pub use history::HistoryEngine;
pub use image_object::{ImageUpload, SizePreset, UploadError};
pub use image_registry::{ImagePart, ImageRegistry};
pub use selection::SelectionPath;
pub use session::{EditorSession, Key, KeyPress, ShellEvent};
