// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Boundary points, ranges and the range-based edits built on them.
//!
//! A boundary is `(node, offset)`: a character offset inside a text node or
//! a child index inside an element. Boundaries are ordered in document order
//! by mapping them to integer keys: a node at child path `[i1, .., ik]` sits
//! at key `[2*i1+1, .., 2*ik+1]`, an element boundary `(E, o)` at
//! `key(E) ++ [2*o]` and a text boundary `(T, o)` at `key(T) ++ [o]`.
//! Keys compare lexicographically.

use super::{ContentSurface, MarkupNode, NodeId, NodeKind};
use std::cmp::Ordering;

/// A position inside the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The active selection: an anchor/focus pair, possibly reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A caret
    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

type OrderKey = Vec<usize>;

impl ContentSurface {
    // ========================================================================
    // PATHS AND ORDERING
    // ========================================================================

    /// Child-index path from the root to `id`; `None` for stale ids
    pub fn path_of(&self, id: NodeId) -> Option<Vec<usize>> {
        if !self.contains(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root() {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Follow a child-index path from the root
    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, &index| self.child(node, index))
    }

    fn node_key(&self, id: NodeId) -> Option<OrderKey> {
        Some(
            self.path_of(id)?
                .into_iter()
                .map(|index| 2 * index + 1)
                .collect(),
        )
    }

    fn boundary_key(&self, boundary: Boundary) -> Option<OrderKey> {
        let mut key = self.node_key(boundary.node)?;
        if self.is_text(boundary.node) {
            key.push(boundary.offset);
        } else {
            key.push(2 * boundary.offset);
        }
        Some(key)
    }

    /// Document order of two boundaries; `None` if either is stale
    pub fn compare_boundaries(
        &self,
        a: Boundary,
        b: Boundary,
    ) -> Option<Ordering> {
        Some(self.boundary_key(a)?.cmp(&self.boundary_key(b)?))
    }

    /// True if `boundary` names a live node and an in-range offset
    pub fn is_valid_boundary(&self, boundary: Boundary) -> bool {
        self.contains(boundary.node)
            && boundary.offset <= self.max_offset(boundary.node)
    }

    /// `range` with start and end in document order
    pub fn ordered(&self, range: Range) -> Option<Range> {
        match self.compare_boundaries(range.start, range.end)? {
            Ordering::Greater => Some(Range::new(range.end, range.start)),
            _ => Some(range),
        }
    }

    // ========================================================================
    // SELECTION STATE
    // ========================================================================

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Install a selection. Rejected (returning false) if either boundary is
    /// stale or out of range.
    pub fn set_selection(&mut self, range: Range) -> bool {
        if !self.is_valid_boundary(range.start) || !self.is_valid_boundary(range.end)
        {
            return false;
        }
        self.selection = Some(range);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Collapse the selection to a caret after the last child of the root
    pub fn caret_to_end(&mut self) {
        let root = self.root();
        let end = Boundary::new(root, self.children(root).len());
        self.selection = Some(Range::collapsed(end));
    }

    /// Select the whole contents of `id`
    pub fn select_contents(&mut self, id: NodeId) -> bool {
        let range = Range::new(
            Boundary::new(id, 0),
            Boundary::new(id, self.max_offset(id)),
        );
        self.set_selection(range)
    }

    /// The live selection in document order, if any
    pub fn ordered_selection(&self) -> Option<Range> {
        let range = *self.selection()?;
        self.ordered(range)
    }

    // ========================================================================
    // RANGE QUERIES
    // ========================================================================

    /// Character span `[a, b)` of text node `id` covered by the keyed range
    fn covered_span(
        &self,
        id: NodeId,
        start: &[usize],
        end: &[usize],
    ) -> Option<(usize, usize)> {
        let base = self.node_key(id)?;
        let len = self.max_offset(id);
        let key_at = |offset: usize| {
            let mut key = base.clone();
            key.push(offset);
            key
        };

        let from = if start <= key_at(0).as_slice() {
            0
        } else if start.len() == base.len() + 1 && start.starts_with(&base) {
            start[base.len()].min(len)
        } else {
            len
        };
        let to = if end >= key_at(len).as_slice() {
            len
        } else if end.len() == base.len() + 1 && end.starts_with(&base) {
            end[base.len()].min(len)
        } else {
            0
        };
        (from < to).then_some((from, to))
    }

    /// The plain text covered by `range`
    pub fn text_in_range(&self, range: Range) -> String {
        let Some(range) = self.ordered(range) else {
            return String::new();
        };
        let (Some(start), Some(end)) = (
            self.boundary_key(range.start),
            self.boundary_key(range.end),
        ) else {
            return String::new();
        };
        let mut out = String::new();
        for id in self.descendants(self.root()) {
            let Some(text) = self.text(id) else {
                continue;
            };
            if let Some((from, to)) = self.covered_span(id, &start, &end) {
                out.extend(text.chars().skip(from).take(to - from));
            }
        }
        out
    }

    /// The plain text of the current selection
    pub fn selected_text(&self) -> String {
        self.selection()
            .map(|range| self.text_in_range(*range))
            .unwrap_or_default()
    }

    // ========================================================================
    // RANGE EDITS
    // ========================================================================

    /// Delete everything covered by `range`, collapsing the selection to
    /// the returned start boundary.
    ///
    /// Text is trimmed in partially covered text nodes; nodes lying entirely
    /// inside the range are removed. Ancestors of either boundary survive.
    pub fn delete_range(&mut self, range: Range) -> Option<Boundary> {
        let range = self.ordered(range)?;
        if range.is_collapsed() {
            self.selection = Some(range);
            return Some(range.start);
        }
        let start = self.boundary_key(range.start)?;
        let end = self.boundary_key(range.end)?;

        let mut doomed = Vec::new();
        let mut trims = Vec::new();
        let mut stack: Vec<NodeId> =
            self.children(self.root()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let (Some(parent), Some(index)) =
                (self.parent(id), self.index_in_parent(id))
            else {
                continue;
            };
            let Some(mut before) = self.node_key(parent) else {
                continue;
            };
            let mut after = before.clone();
            before.push(2 * index);
            after.push(2 * index + 2);
            if start <= before && after <= end {
                doomed.push(id);
                continue;
            }
            if self.is_text(id) {
                if let Some(span) = self.covered_span(id, &start, &end) {
                    trims.push((id, span));
                }
            } else {
                stack.extend(self.children(id).iter().rev().copied());
            }
        }

        for (id, (from, to)) in trims {
            if let Some(text) = self.text(id) {
                let kept: String = text
                    .chars()
                    .take(from)
                    .chain(text.chars().skip(to))
                    .collect();
                self.set_text(id, kept);
            }
        }
        for id in doomed {
            self.remove(id);
        }

        let mut caret = range.start;
        caret.offset = caret.offset.min(self.max_offset(caret.node));
        self.selection = Some(Range::collapsed(caret));
        Some(caret)
    }

    /// The caret for an insertion: the collapsed selection after deleting
    /// any selected content, or the end of the content without a selection
    fn insertion_point(&mut self) -> Boundary {
        let live = self
            .selection()
            .copied()
            .filter(|range| {
                self.is_valid_boundary(range.start)
                    && self.is_valid_boundary(range.end)
            });
        match live {
            Some(range) => self.delete_range(range).unwrap_or(range.start),
            None => {
                self.caret_to_end();
                Boundary::new(self.root(), self.children(self.root()).len())
            }
        }
    }

    /// Insert a fragment at `at`, splitting a text node if needed.
    /// Returns the new node; the selection is not touched.
    pub fn insert_node_at(
        &mut self,
        at: Boundary,
        fragment: MarkupNode,
    ) -> Option<NodeId> {
        if !self.is_valid_boundary(at) {
            return None;
        }
        let Some(text) = self.text(at.node).map(str::to_string) else {
            return self.insert(at.node, at.offset, fragment);
        };
        let parent = self.parent(at.node)?;
        let index = self.index_in_parent(at.node)?;
        let len = text.chars().count();
        if at.offset == 0 {
            return self.insert(parent, index, fragment);
        }
        if at.offset < len {
            let head: String = text.chars().take(at.offset).collect();
            let tail: String = text.chars().skip(at.offset).collect();
            self.set_text(at.node, head);
            self.insert(parent, index + 1, MarkupNode::Text(tail));
        }
        self.insert(parent, index + 1, fragment)
    }

    /// Replace the selection with `fragment` and put the caret after it
    pub fn insert_fragment(&mut self, fragment: MarkupNode) -> Option<NodeId> {
        let at = self.insertion_point();
        let id = self.insert_node_at(at, fragment)?;
        self.caret_after(id);
        Some(id)
    }

    /// Collapse the selection just after `id`
    pub fn caret_after(&mut self, id: NodeId) {
        if let (Some(parent), Some(index)) =
            (self.parent(id), self.index_in_parent(id))
        {
            self.selection =
                Some(Range::collapsed(Boundary::new(parent, index + 1)));
        }
    }

    /// Replace the selection with `text` and put the caret after it
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let at = self.insertion_point();
        let added = text.chars().count();

        if let Some(current) = self.text(at.node).map(str::to_string) {
            let spliced: String = current
                .chars()
                .take(at.offset)
                .chain(text.chars())
                .chain(current.chars().skip(at.offset))
                .collect();
            self.set_text(at.node, spliced);
            self.selection = Some(Range::collapsed(Boundary::new(
                at.node,
                at.offset + added,
            )));
            return;
        }

        // Element boundary: extend a neighbouring text node where possible.
        let before = at
            .offset
            .checked_sub(1)
            .and_then(|index| self.child(at.node, index))
            .filter(|&id| self.is_text(id));
        if let Some(id) = before {
            let mut current = self.text(id).unwrap_or_default().to_string();
            current.push_str(text);
            let len = current.chars().count();
            self.set_text(id, current);
            self.selection = Some(Range::collapsed(Boundary::new(id, len)));
            return;
        }
        let after = self.child(at.node, at.offset).filter(|&id| self.is_text(id));
        if let Some(id) = after {
            let current = self.text(id).unwrap_or_default();
            let joined = format!("{text}{current}");
            self.set_text(id, joined);
            self.selection = Some(Range::collapsed(Boundary::new(id, added)));
            return;
        }
        if let Some(id) = self.insert(at.node, at.offset, MarkupNode::text(text)) {
            self.selection = Some(Range::collapsed(Boundary::new(id, added)));
        }
    }

    /// Delete the selection, or the character/node before the caret
    pub fn delete_backward(&mut self) -> bool {
        self.delete_adjacent(true)
    }

    /// Delete the selection, or the character/node after the caret
    pub fn delete_forward(&mut self) -> bool {
        self.delete_adjacent(false)
    }

    fn delete_adjacent(&mut self, backward: bool) -> bool {
        let Some(range) = self.selection().copied() else {
            return false;
        };
        if !range.is_collapsed() {
            return self.delete_range(range).is_some();
        }
        let caret = range.start;
        if !self.is_valid_boundary(caret) {
            return false;
        }

        if let Some(text) = self.text(caret.node).map(str::to_string) {
            let len = text.chars().count();
            let target = if backward {
                caret.offset.checked_sub(1)
            } else {
                (caret.offset < len).then_some(caret.offset)
            };
            if let Some(index) = target {
                let kept: String = text
                    .chars()
                    .enumerate()
                    .filter(|&(i, _)| i != index)
                    .map(|(_, c)| c)
                    .collect();
                self.set_text(caret.node, kept);
                self.selection = Some(Range::collapsed(Boundary::new(
                    caret.node,
                    if backward { index } else { caret.offset },
                )));
                return true;
            }
            // At the edge of the text node: act on the sibling.
            let (Some(parent), Some(index)) =
                (self.parent(caret.node), self.index_in_parent(caret.node))
            else {
                return false;
            };
            let offset = if backward { index } else { index + 1 };
            return self.delete_sibling(Boundary::new(parent, offset), backward);
        }
        self.delete_sibling(caret, backward)
    }

    /// Delete next to an element boundary: one character of a text
    /// neighbour or the whole neighbouring element
    fn delete_sibling(&mut self, at: Boundary, backward: bool) -> bool {
        let neighbour = if backward {
            at.offset.checked_sub(1).and_then(|i| self.child(at.node, i))
        } else {
            self.child(at.node, at.offset)
        };
        let Some(neighbour) = neighbour else {
            return false;
        };
        match self.kind(neighbour) {
            Some(NodeKind::Text(text)) if !text.is_empty() => {
                let mut chars: Vec<char> = text.chars().collect();
                let len = chars.len();
                if backward {
                    chars.pop();
                } else {
                    chars.remove(0);
                }
                self.set_text(neighbour, chars.into_iter().collect::<String>());
                let offset = if backward { len - 1 } else { 0 };
                self.selection =
                    Some(Range::collapsed(Boundary::new(neighbour, offset)));
                true
            }
            _ => {
                self.remove(neighbour);
                let offset = if backward { at.offset - 1 } else { at.offset };
                self.selection =
                    Some(Range::collapsed(Boundary::new(at.node, offset)));
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(surface: &ContentSurface, path: &[usize]) -> NodeId {
        surface.node_at_path(path).unwrap()
    }

    #[test]
    fn paths_resolve_both_ways() {
        let surface = ContentSurface::with_markup("<p>a</p><p>b<b>c</b></p>");
        let c = text_at(&surface, &[1, 1, 0]);
        assert_eq!(surface.text(c), Some("c"));
        assert_eq!(surface.path_of(c), Some(vec![1, 1, 0]));
        assert_eq!(surface.path_of(surface.root()), Some(vec![]));
        assert!(surface.node_at_path(&[5]).is_none());
    }

    #[test]
    fn boundary_ordering_follows_document_order() {
        let surface = ContentSurface::with_markup("<p>ab</p><p>cd</p>");
        let root = surface.root();
        let first = text_at(&surface, &[0, 0]);
        let second = text_at(&surface, &[1, 0]);

        let a = Boundary::new(first, 2);
        let b = Boundary::new(root, 1);
        let c = Boundary::new(second, 0);
        assert_eq!(surface.compare_boundaries(a, b), Some(Ordering::Less));
        assert_eq!(surface.compare_boundaries(b, c), Some(Ordering::Less));
        assert_eq!(
            surface.compare_boundaries(Boundary::new(root, 0), a),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn selected_text_spans_elements() {
        let mut surface =
            ContentSurface::with_markup("<p>hello</p><p>big <b>world</b></p>");
        let start = Boundary::new(text_at(&surface, &[0, 0]), 3);
        let end = Boundary::new(text_at(&surface, &[1, 1, 0]), 2);
        assert!(surface.set_selection(Range::new(end, start)));
        assert_eq!(surface.selected_text(), "lobig wo");
    }

    #[test]
    fn delete_range_trims_and_removes() {
        let mut surface =
            ContentSurface::with_markup("<p>hello</p><p>mid</p><p>world</p>");
        let start = Boundary::new(text_at(&surface, &[0, 0]), 2);
        let end = Boundary::new(text_at(&surface, &[2, 0]), 3);
        let caret = surface.delete_range(Range::new(start, end)).unwrap();
        assert_eq!(caret, start);
        assert_eq!(surface.markup(), "<p>he</p><p>ld</p>");
        assert!(surface.selection().unwrap().is_collapsed());
    }

    #[test]
    fn delete_range_removes_whole_elements_inside() {
        let mut surface = ContentSurface::with_markup("ab<b>cd</b>ef");
        let start = Boundary::new(text_at(&surface, &[0]), 1);
        let end = Boundary::new(text_at(&surface, &[2]), 1);
        surface.delete_range(Range::new(start, end));
        assert_eq!(surface.markup(), "af");
    }

    #[test]
    fn insert_node_splits_text() {
        let mut surface = ContentSurface::with_markup("<p>abcd</p>");
        let text = text_at(&surface, &[0, 0]);
        let br = MarkupNode::element(super::super::Element::new("br"));
        surface.insert_node_at(Boundary::new(text, 2), br).unwrap();
        assert_eq!(surface.markup(), "<p>ab<br>cd</p>");
    }

    #[test]
    fn insert_text_at_caret_and_end() {
        let mut surface = ContentSurface::new();
        surface.insert_text("hello");
        assert_eq!(surface.markup(), "hello");
        surface.insert_text(" world");
        assert_eq!(surface.markup(), "hello world");

        let text = text_at(&surface, &[0]);
        surface.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 5)));
        surface.insert_text("bye");
        assert_eq!(surface.markup(), "bye world");
        assert_eq!(
            surface.selection().copied(),
            Some(Range::collapsed(Boundary::new(text, 3)))
        );
    }

    #[test]
    fn insert_text_after_element_starts_new_text() {
        let mut surface = ContentSurface::with_markup("<p>a</p>");
        surface.caret_to_end();
        surface.insert_text("b");
        assert_eq!(surface.markup(), "<p>a</p>b");
    }

    #[test]
    fn backspace_deletes_characters_then_elements() {
        let mut surface = ContentSurface::with_markup("ab<br>");
        surface.caret_to_end();
        assert!(surface.delete_backward());
        assert_eq!(surface.markup(), "ab");
        assert!(surface.delete_backward());
        assert_eq!(surface.markup(), "a");

        let text = text_at(&surface, &[0]);
        surface.set_selection(Range::collapsed(Boundary::new(text, 0)));
        assert!(surface.delete_forward());
        assert_eq!(surface.markup(), "");
        assert!(!surface.delete_backward());
    }

    #[test]
    fn stale_selection_is_rejected() {
        let mut surface = ContentSurface::with_markup("<p>a</p>");
        let text = text_at(&surface, &[0, 0]);
        surface.set_markup("<p>a</p>");
        assert!(!surface.set_selection(Range::collapsed(Boundary::new(text, 0))));
        let fresh = text_at(&surface, &[0, 0]);
        assert!(!surface.set_selection(Range::collapsed(Boundary::new(fresh, 9))));
    }
}
