// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Note data model

pub mod entity_id;
pub mod note;

pub use entity_id::BindingId;
pub use note::{Note, NoteId, Notebook, NotebookId};
