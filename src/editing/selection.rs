// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Root-relative selection paths.
//!
//! A `SelectionPath` records each endpoint of the selection as the chain of
//! child indices leading from the surface root to the endpoint's node, plus
//! the offset inside it. Unlike `NodeId`s, paths stay meaningful across a
//! full content replace as long as the new tree has the same shape, which is
//! what lets history snapshots carry the cursor.

use crate::surface::{Boundary, ContentSurface, Range};
use serde::{Deserialize, Serialize};

/// Structural encoding of a selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPath {
    pub start_container_path: Vec<usize>,
    pub start_offset: usize,
    pub end_container_path: Vec<usize>,
    pub end_offset: usize,
}

impl SelectionPath {
    pub fn is_collapsed(&self) -> bool {
        self.start_container_path == self.end_container_path
            && self.start_offset == self.end_offset
    }
}

/// Encode the surface's active selection.
///
/// Returns `None` without a selection, or when an endpoint no longer
/// belongs to the surface.
pub fn capture(surface: &ContentSurface) -> Option<SelectionPath> {
    let range = surface.selection()?;
    Some(SelectionPath {
        start_container_path: surface.path_of(range.start.node)?,
        start_offset: range.start.offset,
        end_container_path: surface.path_of(range.end.node)?,
        end_offset: range.end.offset,
    })
}

/// Rebuild a selection from `path`.
///
/// Fails, leaving the current selection alone, when any index along either
/// path is out of range. Offsets past the end of their node are clamped.
pub fn restore(path: &SelectionPath, surface: &mut ContentSurface) -> bool {
    let Some(start) =
        resolve(surface, &path.start_container_path, path.start_offset)
    else {
        return false;
    };
    let Some(end) = resolve(surface, &path.end_container_path, path.end_offset)
    else {
        return false;
    };
    surface.set_selection(Range::new(start, end))
}

fn resolve(
    surface: &ContentSurface,
    path: &[usize],
    offset: usize,
) -> Option<Boundary> {
    let node = surface.node_at_path(path)?;
    Some(Boundary::new(node, offset.min(surface.max_offset(node))))
}
