// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Formatting intents and how they reach the surface.
//!
//! Each intent is first offered to the platform's native rich-text
//! primitive. If the platform does not support it, or reports failure, the
//! intent is applied by manual tree manipulation instead. If that fails too
//! the intent is abandoned and the surface is left untouched.

use super::edit_types::CommandOutcome;
use super::image_object::CONTAINER_CLASS;
use crate::surface::{Boundary, ContentSurface, Element, MarkupNode, NodeId, Range};

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Block-level format for the block holding the caret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    Paragraph,
    /// `h1` to `h6`
    Heading(u8),
}

impl BlockFormat {
    pub fn tag(self) -> String {
        match self {
            Self::Paragraph => "p".to_string(),
            Self::Heading(level) => format!("h{}", level.clamp(1, 6)),
        }
    }

    /// Parse `p`, `h1`..`h6`
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag == "p" {
            return Some(Self::Paragraph);
        }
        let level: u8 = tag.strip_prefix('h')?.parse().ok()?;
        (1..=6).contains(&level).then_some(Self::Heading(level))
    }
}

/// A toolbar or keyboard formatting request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIntent {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    UnorderedList,
    OrderedList,
    Align(Alignment),
    Block(BlockFormat),
    Link(String),
    Quote,
    Code,
    TextColor(String),
    Highlight(String),
}

impl FormatIntent {
    /// Prompt shown when the intent needs selected text and there is none
    pub fn selection_prompt(&self) -> Option<&'static str> {
        match self {
            Self::Link(_) => Some("Please select some text first to create a link."),
            Self::Quote => Some("Please select some text to apply quote formatting."),
            Self::Code => Some("Please select some text first."),
            _ => None,
        }
    }

    /// True if `selected` satisfies the intent's selection requirement
    pub fn accepts_selection(&self, selected: &str) -> bool {
        match self {
            Self::Link(_) => !selected.is_empty(),
            Self::Quote | Self::Code => !selected.trim().is_empty(),
            _ => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::UnorderedList => "unordered-list",
            Self::OrderedList => "ordered-list",
            Self::Align(_) => "align",
            Self::Block(_) => "format-block",
            Self::Link(_) => "link",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::TextColor(_) => "text-color",
            Self::Highlight(_) => "highlight",
        }
    }
}

// ============================================================================
// NATIVE PRIMITIVES
// ============================================================================

/// The host platform's built-in rich-text commands
pub trait NativeCommands {
    /// Capability check; unsupported intents go straight to the fallback
    fn supports(&self, intent: &FormatIntent) -> bool;

    /// Apply `intent`. Returns false on failure, in which case the surface
    /// must be unchanged.
    fn execute(&mut self, intent: &FormatIntent, surface: &mut ContentSurface) -> bool;
}

/// A platform without native commands: everything uses the fallback path
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNativeCommands;

impl NativeCommands for NoNativeCommands {
    fn supports(&self, _intent: &FormatIntent) -> bool {
        false
    }

    fn execute(&mut self, _intent: &FormatIntent, _surface: &mut ContentSurface) -> bool {
        false
    }
}

/// Capability check, native attempt, then manual fallback
pub fn dispatch(
    native: &mut dyn NativeCommands,
    surface: &mut ContentSurface,
    intent: &FormatIntent,
) -> CommandOutcome {
    if !intent.accepts_selection(&surface.selected_text()) {
        return CommandOutcome::NeedsSelection;
    }
    if native.supports(intent) {
        if native.execute(intent, surface) {
            return CommandOutcome::Native;
        }
        tracing::warn!("Native {} failed, trying fallback", intent.name());
    }
    if apply_fallback(surface, intent) {
        tracing::debug!("Applied {} by fallback", intent.name());
        CommandOutcome::Fallback
    } else {
        tracing::warn!("Abandoned {}: no way to apply it here", intent.name());
        CommandOutcome::Abandoned
    }
}

// ============================================================================
// FALLBACKS
// ============================================================================

/// Apply `intent` by editing the tree directly
pub fn apply_fallback(surface: &mut ContentSurface, intent: &FormatIntent) -> bool {
    match intent {
        FormatIntent::Bold => wrap_selection(surface, Element::new("b")),
        FormatIntent::Italic => wrap_selection(surface, Element::new("i")),
        FormatIntent::Underline => wrap_selection(surface, Element::new("u")),
        FormatIntent::Strikethrough => wrap_selection(surface, Element::new("s")),
        FormatIntent::Link(url) => {
            wrap_selection(surface, Element::new("a").with_attr("href", url.trim()))
        }
        FormatIntent::Quote => wrap_selection(surface, Element::new("blockquote")),
        FormatIntent::Code => wrap_selection(surface, Element::new("code")),
        FormatIntent::TextColor(color) => wrap_selection(
            surface,
            Element::new("span").with_attr("style", format!("color: {color};")),
        ),
        FormatIntent::Highlight(color) => wrap_selection(
            surface,
            Element::new("span")
                .with_attr("style", format!("background-color: {color};")),
        ),
        FormatIntent::UnorderedList => make_list(surface, "ul"),
        FormatIntent::OrderedList => make_list(surface, "ol"),
        FormatIntent::Align(alignment) => {
            let Some(block) = caret_block(surface) else {
                return false;
            };
            let mut style = surface.style_of(block);
            style.set("text-align", alignment.css());
            surface.set_style(block, &style)
        }
        FormatIntent::Block(format) => {
            let Some(block) = caret_block(surface) else {
                return false;
            };
            match surface.element_mut(block) {
                Some(element) => {
                    element.tag = format.tag();
                    true
                }
                None => false,
            }
        }
    }
}

/// Replace the selected content with `element` holding the selected text,
/// then put the caret after it
fn wrap_selection(surface: &mut ContentSurface, element: Element) -> bool {
    let text = surface.selected_text();
    if text.is_empty() {
        return false;
    }
    let wrapper = MarkupNode::element(element).with_child(MarkupNode::Text(text));
    surface.insert_fragment(wrapper).is_some()
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "li" | "pre"
    )
}

/// The block holding the selection start.
///
/// An inline run directly under the root (text between `br`s or blocks) is
/// first wrapped in a `p` so there is a block to format. Image containers
/// are never treated as blocks.
fn caret_block(surface: &mut ContentSurface) -> Option<NodeId> {
    let root = surface.root();
    let start = surface.ordered_selection()?.start;
    let mut node = if start.node == root {
        let count = surface.children(root).len();
        surface.child(root, start.offset.min(count.checked_sub(1)?))?
    } else {
        start.node
    };

    loop {
        if let Some(element) = surface.element(node) {
            if element.has_class(CONTAINER_CLASS) {
                return None;
            }
            if is_block_tag(&element.tag) {
                return Some(node);
            }
        }
        match surface.parent(node) {
            Some(parent) if parent != root => node = parent,
            _ => break,
        }
    }
    wrap_top_level_run(surface, node)
}

fn wrap_top_level_run(surface: &mut ContentSurface, top: NodeId) -> Option<NodeId> {
    let root = surface.root();
    let breaks = |surface: &ContentSurface, id: NodeId| {
        surface
            .element(id)
            .map(|element| element.tag == "br" || is_block_tag(&element.tag))
            .unwrap_or(false)
    };
    if breaks(surface, top) {
        return None;
    }
    let siblings = surface.children(root).to_vec();
    let index = surface.index_in_parent(top)?;
    let mut first = index;
    while first > 0 && !breaks(surface, siblings[first - 1]) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < siblings.len() && !breaks(surface, siblings[last + 1]) {
        last += 1;
    }

    let children: Vec<MarkupNode> = siblings[first..=last]
        .iter()
        .filter_map(|&id| surface.to_fragment(id))
        .collect();
    for &id in &siblings[first..=last] {
        surface.remove(id);
    }
    let paragraph = MarkupNode::Element {
        element: Element::new("p"),
        children,
    };
    let block = surface.insert(root, first, paragraph)?;
    let end = surface.max_offset(block);
    surface.set_selection(Range::collapsed(Boundary::new(block, end)));
    Some(block)
}

/// Turn the caret block into a one-item list, or switch the kind of list it
/// is already in
fn make_list(surface: &mut ContentSurface, list_tag: &str) -> bool {
    let Some(block) = caret_block(surface) else {
        return false;
    };
    let tag = surface
        .element(block)
        .map(|element| element.tag.clone())
        .unwrap_or_default();

    if tag == "li" {
        let list = surface.parent(block).filter(|&parent| {
            surface
                .element(parent)
                .map(|element| element.tag == "ul" || element.tag == "ol")
                .unwrap_or(false)
        });
        if let Some(element) = list.and_then(|list| surface.element_mut(list)) {
            element.tag = list_tag.to_string();
            return true;
        }
        return false;
    }

    let item_children = if tag == "p" || tag == "div" {
        surface
            .children(block)
            .iter()
            .filter_map(|&child| surface.to_fragment(child))
            .collect()
    } else {
        surface.to_fragment(block).into_iter().collect()
    };
    let list = MarkupNode::element(Element::new(list_tag)).with_child(MarkupNode::Element {
        element: Element::new("li"),
        children: item_children,
    });
    let Some(list) = surface.replace(block, list) else {
        return false;
    };
    if let Some(item) = surface.child(list, 0) {
        let end = surface.max_offset(item);
        surface.set_selection(Range::collapsed(Boundary::new(item, end)));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_text(surface: &mut ContentSurface, path: &[usize], from: usize, to: usize) {
        let node = surface.node_at_path(path).unwrap();
        assert!(surface.set_selection(Range::new(
            Boundary::new(node, from),
            Boundary::new(node, to)
        )));
    }

    fn caret(surface: &mut ContentSurface, path: &[usize], offset: usize) {
        select_text(surface, path, offset, offset);
    }

    struct RecordingNative {
        supported: bool,
        succeed: bool,
        calls: usize,
    }

    impl NativeCommands for RecordingNative {
        fn supports(&self, _intent: &FormatIntent) -> bool {
            self.supported
        }

        fn execute(&mut self, _intent: &FormatIntent, surface: &mut ContentSurface) -> bool {
            self.calls += 1;
            if self.succeed {
                surface.insert_text("!");
            }
            self.succeed
        }
    }

    #[test]
    fn bold_wraps_selected_text() {
        let mut surface = ContentSurface::with_markup("<p>hello world</p>");
        select_text(&mut surface, &[0, 0], 6, 11);
        let outcome = dispatch(&mut NoNativeCommands, &mut surface, &FormatIntent::Bold);
        assert_eq!(outcome, CommandOutcome::Fallback);
        assert_eq!(surface.markup(), "<p>hello <b>world</b></p>");
        assert!(surface.selection().unwrap().is_collapsed());
    }

    #[test]
    fn bold_without_selection_is_abandoned() {
        let mut surface = ContentSurface::with_markup("<p>hello</p>");
        caret(&mut surface, &[0, 0], 2);
        let outcome = dispatch(&mut NoNativeCommands, &mut surface, &FormatIntent::Bold);
        assert_eq!(outcome, CommandOutcome::Abandoned);
        assert_eq!(surface.markup(), "<p>hello</p>");
    }

    #[test]
    fn link_quote_and_code_need_a_selection() {
        for intent in [
            FormatIntent::Link("https://example.com".into()),
            FormatIntent::Quote,
            FormatIntent::Code,
        ] {
            let mut surface = ContentSurface::with_markup("<p>hello</p>");
            caret(&mut surface, &[0, 0], 1);
            assert_eq!(
                dispatch(&mut NoNativeCommands, &mut surface, &intent),
                CommandOutcome::NeedsSelection
            );
            assert!(intent.selection_prompt().is_some());
            assert_eq!(surface.markup(), "<p>hello</p>");
        }
    }

    #[test]
    fn whitespace_only_selection_does_not_satisfy_quote() {
        let mut surface = ContentSurface::with_markup("<p>a   b</p>");
        select_text(&mut surface, &[0, 0], 1, 4);
        assert_eq!(
            dispatch(&mut NoNativeCommands, &mut surface, &FormatIntent::Quote),
            CommandOutcome::NeedsSelection
        );
    }

    #[test]
    fn link_and_colors_use_attributes() {
        let mut surface = ContentSurface::with_markup("<p>go here now</p>");
        select_text(&mut surface, &[0, 0], 3, 7);
        dispatch(
            &mut NoNativeCommands,
            &mut surface,
            &FormatIntent::Link(" https://example.com ".into()),
        );
        assert_eq!(
            surface.markup(),
            "<p>go <a href=\"https://example.com\">here</a> now</p>"
        );

        let mut surface = ContentSurface::with_markup("<p>red</p>");
        select_text(&mut surface, &[0, 0], 0, 3);
        dispatch(
            &mut NoNativeCommands,
            &mut surface,
            &FormatIntent::Highlight("#ff0".into()),
        );
        assert_eq!(
            surface.markup(),
            "<p><span style=\"background-color: #ff0;\">red</span></p>"
        );
    }

    #[test]
    fn native_primitive_is_preferred() {
        let mut surface = ContentSurface::with_markup("<p>x</p>");
        select_text(&mut surface, &[0, 0], 0, 1);
        let mut native = RecordingNative {
            supported: true,
            succeed: true,
            calls: 0,
        };
        assert_eq!(
            dispatch(&mut native, &mut surface, &FormatIntent::Italic),
            CommandOutcome::Native
        );
        assert_eq!(native.calls, 1);
        assert_eq!(surface.markup(), "<p>!</p>");
    }

    #[test]
    fn failed_native_falls_back() {
        let mut surface = ContentSurface::with_markup("<p>x</p>");
        select_text(&mut surface, &[0, 0], 0, 1);
        let mut native = RecordingNative {
            supported: true,
            succeed: false,
            calls: 0,
        };
        assert_eq!(
            dispatch(&mut native, &mut surface, &FormatIntent::Underline),
            CommandOutcome::Fallback
        );
        assert_eq!(surface.markup(), "<p><u>x</u></p>");
    }

    #[test]
    fn heading_renames_the_block() {
        let mut surface = ContentSurface::with_markup("<p>title</p><p>body</p>");
        caret(&mut surface, &[0, 0], 2);
        let outcome = dispatch(
            &mut NoNativeCommands,
            &mut surface,
            &FormatIntent::Block(BlockFormat::Heading(2)),
        );
        assert_eq!(outcome, CommandOutcome::Fallback);
        assert_eq!(surface.markup(), "<h2>title</h2><p>body</p>");
    }

    #[test]
    fn alignment_wraps_loose_text_in_a_paragraph() {
        let mut surface = ContentSurface::with_markup("one<br>two<b>!</b>");
        caret(&mut surface, &[2], 1);
        dispatch(
            &mut NoNativeCommands,
            &mut surface,
            &FormatIntent::Align(Alignment::Center),
        );
        assert_eq!(
            surface.markup(),
            "one<br><p style=\"text-align: center;\">two<b>!</b></p>"
        );
    }

    #[test]
    fn lists_wrap_and_switch() {
        let mut surface = ContentSurface::with_markup("<p>item</p>");
        caret(&mut surface, &[0, 0], 1);
        dispatch(&mut NoNativeCommands, &mut surface, &FormatIntent::UnorderedList);
        assert_eq!(surface.markup(), "<ul><li>item</li></ul>");

        dispatch(&mut NoNativeCommands, &mut surface, &FormatIntent::OrderedList);
        assert_eq!(surface.markup(), "<ol><li>item</li></ol>");
    }

    #[test]
    fn block_format_parsing() {
        assert_eq!(BlockFormat::parse("H3"), Some(BlockFormat::Heading(3)));
        assert_eq!(BlockFormat::parse("p"), Some(BlockFormat::Paragraph));
        assert_eq!(BlockFormat::parse("h7"), None);
        assert_eq!(Alignment::parse("Justify"), Some(Alignment::Justify));
    }
}
