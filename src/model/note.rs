// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Note and notebook records as they are persisted.

use crate::settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp plus a process counter, both in base 36
fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}", base36(millis), base36(count))
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// A fresh, process-unique id
            pub fn generate() -> Self {
                Self(generate_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a note
    NoteId
);

string_id!(
    /// Identifier of a notebook
    NotebookId
);

/// A stored note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub notebook_id: Option<NotebookId>,
    pub title: String,
    /// Serialized surface markup
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// A blank note, optionally inside a notebook
    pub fn new(notebook_id: Option<NotebookId>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::generate(),
            notebook_id,
            title: title.into(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A group of notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: NotebookId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notebook {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NotebookId::generate(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Title a note is saved under: trimmed, or the placeholder when empty
pub fn display_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        settings::note::UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}
