// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! The content surface: the editable rich-text tree of the open note.
//!
//! Nodes live in a generational arena (`HopSlotMap`). A full content replace
//! frees every node, so ids handed out before the replace stop resolving;
//! anything that held on to them (selection ranges, image handles) has to be
//! re-derived from the tree. The root element is the editing region itself
//! and is never serialized, only its children are.

mod markup;
mod range;
mod style;

pub use markup::{MarkupError, MarkupNode, is_void_element, parse};
pub use range::{Boundary, Range};
pub use style::InlineStyle;

use kurbo::Size;
use slotmap::HopSlotMap;

slotmap::new_key_type! {
    /// Handle to a live node in a `ContentSurface`
    pub struct NodeId;
}

// ============================================================================
// NODE TYPES
// ============================================================================

/// An element with an ordered attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Builder form of `set_attr`
    pub fn with_attr(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// True if the whitespace-separated `class` attribute lists `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// ============================================================================
// CONTENT SURFACE
// ============================================================================

/// The editable region holding the note's current formatted markup
#[derive(Debug, Clone)]
pub struct ContentSurface {
    nodes: HopSlotMap<NodeId, NodeData>,
    root: NodeId,
    selection: Option<Range>,
    focused: bool,
    client_size: Size,
}

impl Default for ContentSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSurface {
    /// Create an empty surface
    pub fn new() -> Self {
        let mut nodes = HopSlotMap::with_key();
        let root = nodes.insert(NodeData {
            kind: NodeKind::Element(
                Element::new("div").with_attr("contenteditable", "true"),
            ),
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes,
            root,
            selection: None,
            focused: false,
            client_size: Size::new(
                crate::settings::surface::WIDTH,
                crate::settings::surface::HEIGHT,
            ),
        }
    }

    /// Create a surface already holding `markup`
    pub fn with_markup(markup: &str) -> Self {
        let mut surface = Self::new();
        surface.set_markup(markup);
        surface
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ========================================================================
    // FULL CONTENT ACCESS
    // ========================================================================

    /// Serialize the root's children
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root) {
            markup::write_node(self, child, &mut out);
        }
        out
    }

    /// Replace the whole content with `markup`.
    ///
    /// Every previously issued `NodeId` below the root becomes stale and the
    /// selection is dropped. Markup that cannot be parsed is loaded as one
    /// text node.
    pub fn set_markup(&mut self, markup: &str) {
        let old_children = std::mem::take(&mut self.node_mut_unchecked(self.root).children);
        for child in old_children {
            self.free_subtree(child);
        }
        self.selection = None;

        let fragments = match parse(markup) {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::warn!("Loading unparseable markup as text: {}", e);
                if markup.is_empty() {
                    Vec::new()
                } else {
                    vec![MarkupNode::Text(markup.to_string())]
                }
            }
        };
        for fragment in fragments {
            self.append(self.root, fragment);
        }
    }

    // ========================================================================
    // NODE QUERIES
    // ========================================================================

    /// True if `id` refers to a node of the current content
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    /// Replace the contents of a text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match self.nodes.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Text(current)) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Children of `id`; empty for text nodes and stale ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Largest valid boundary offset inside `id`: characters for text
    /// nodes, children for elements
    pub fn max_offset(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.chars().count(),
            Some(NodeKind::Element(_)) => self.children(id).len(),
            None => 0,
        }
    }

    /// Concatenated text of `id` and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element(_)) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> =
            self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Elements carrying `class`, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| {
                self.element(id)
                    .map(|element| element.has_class(class))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// `id` itself or its nearest ancestor carrying `class`, stopping at
    /// `limit` (inclusive)
    pub fn closest_with_class(
        &self,
        id: NodeId,
        class: &str,
        limit: NodeId,
    ) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self
                .element(node)
                .map(|element| element.has_class(class))
                .unwrap_or(false)
            {
                return Some(node);
            }
            if node == limit {
                break;
            }
            current = self.parent(node);
        }
        None
    }

    /// True if `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // ========================================================================
    // STRUCTURAL MUTATION
    // ========================================================================

    /// Append a detached fragment as the last child of `parent`
    pub fn append(
        &mut self,
        parent: NodeId,
        fragment: MarkupNode,
    ) -> Option<NodeId> {
        let index = self.children(parent).len();
        self.insert(parent, index, fragment)
    }

    /// Insert a detached fragment as child number `index` of `parent`
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        fragment: MarkupNode,
    ) -> Option<NodeId> {
        if !matches!(self.kind(parent), Some(NodeKind::Element(_))) {
            return None;
        }
        let id = self.build(fragment, parent);
        let children = &mut self.node_mut_unchecked(parent).children;
        let index = index.min(children.len());
        children.insert(index, id);
        Some(id)
    }

    fn build(&mut self, fragment: MarkupNode, parent: NodeId) -> NodeId {
        match fragment {
            MarkupNode::Text(text) => self.nodes.insert(NodeData {
                kind: NodeKind::Text(text),
                parent: Some(parent),
                children: Vec::new(),
            }),
            MarkupNode::Element { element, children } => {
                let id = self.nodes.insert(NodeData {
                    kind: NodeKind::Element(element),
                    parent: Some(parent),
                    children: Vec::new(),
                });
                let built: Vec<NodeId> = children
                    .into_iter()
                    .map(|child| self.build(child, id))
                    .collect();
                self.node_mut_unchecked(id).children = built;
                id
            }
        }
    }

    /// Detach and free `id` with its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            self.node_mut_unchecked(parent)
                .children
                .retain(|&child| child != id);
        }
        self.free_subtree(id);
        true
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
            }
        }
    }

    /// Copy of `id`'s subtree as a detached fragment
    pub fn to_fragment(&self, id: NodeId) -> Option<MarkupNode> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(MarkupNode::Text(text.clone())),
            NodeKind::Element(element) => Some(MarkupNode::Element {
                element: element.clone(),
                children: self
                    .children(id)
                    .iter()
                    .filter_map(|&child| self.to_fragment(child))
                    .collect(),
            }),
        }
    }

    /// Replace `id` by a structurally identical copy with fresh ids.
    ///
    /// Anything keyed by the old ids (including the selection, if it pointed
    /// into the subtree) no longer resolves afterwards.
    pub fn replace_with_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        let fragment = self.to_fragment(id)?;
        self.remove(id);
        self.insert(parent, index, fragment)
    }

    /// Replace `id` with `fragment` in place
    pub fn replace(
        &mut self,
        id: NodeId,
        fragment: MarkupNode,
    ) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.remove(id);
        self.insert(parent, index, fragment)
    }

    fn node_mut_unchecked(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id]
    }

    // ========================================================================
    // FOCUS AND GEOMETRY
    // ========================================================================

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Content box of the editing region, in surface pixels
    pub fn client_size(&self) -> Size {
        self.client_size
    }

    pub fn set_client_size(&mut self, size: Size) {
        self.client_size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_markup_round_trips() {
        let markup = "<p>Hello <b>world</b></p><p>second<br>line</p>";
        let surface = ContentSurface::with_markup(markup);
        assert_eq!(surface.markup(), markup);
    }

    #[test]
    fn set_markup_invalidates_old_ids() {
        let mut surface = ContentSurface::with_markup("<p>a</p>");
        let old = surface.child(surface.root(), 0).unwrap();
        surface.set_markup("<p>a</p>");
        assert!(!surface.contains(old));
        assert!(surface.child(surface.root(), 0).is_some());
    }

    #[test]
    fn set_markup_clears_selection() {
        let mut surface = ContentSurface::with_markup("<p>abc</p>");
        let text = surface.descendants(surface.root())[1];
        assert!(surface.set_selection(Range::collapsed(Boundary::new(text, 1))));
        surface.set_markup("<p>abc</p>");
        assert!(surface.selection().is_none());
    }

    #[test]
    fn find_and_closest_by_class() {
        let surface = ContentSurface::with_markup(
            r#"<div class="box outer"><span class="inner">x</span></div><div class="box"></div>"#,
        );
        let boxes = surface.find_by_class("box");
        assert_eq!(boxes.len(), 2);

        let text = surface.descendants(boxes[0])[1];
        assert_eq!(
            surface.closest_with_class(text, "box", surface.root()),
            Some(boxes[0])
        );
        assert_eq!(
            surface.closest_with_class(text, "missing", surface.root()),
            None
        );
    }

    #[test]
    fn replace_with_clone_keeps_markup_and_changes_ids() {
        let mut surface =
            ContentSurface::with_markup("<p>a</p><div><i>b</i></div><p>c</p>");
        let div = surface.child(surface.root(), 1).unwrap();
        let before = surface.markup();

        let clone = surface.replace_with_clone(div).unwrap();
        assert_ne!(clone, div);
        assert!(!surface.contains(div));
        assert_eq!(surface.index_in_parent(clone), Some(1));
        assert_eq!(surface.markup(), before);
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut surface = ContentSurface::new();
        let root = surface.root();
        assert!(!surface.remove(root));
        assert!(surface.contains(root));
    }

    #[test]
    fn text_content_and_max_offset() {
        let surface = ContentSurface::with_markup("<p>ab<b>cd</b></p>");
        let p = surface.child(surface.root(), 0).unwrap();
        assert_eq!(surface.text_content(p), "abcd");
        assert_eq!(surface.max_offset(p), 2);
        let text = surface.child(p, 0).unwrap();
        assert_eq!(surface.max_offset(text), 2);
    }

    #[test]
    fn element_attribute_helpers() {
        let mut element = Element::new("DIV").with_attr("class", "a b");
        assert_eq!(element.tag, "div");
        assert!(element.has_class("b"));
        assert!(!element.has_class("c"));

        element.set_attr("class", "c");
        assert_eq!(element.attrs.len(), 1);
        assert_eq!(element.remove_attr("class").as_deref(), Some("c"));
        assert!(element.attr("class").is_none());
    }
}
