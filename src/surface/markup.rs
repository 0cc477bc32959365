// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Lenient markup reading and deterministic writing.
//!
//! Reading goes through `quick-xml` with end-name checks relaxed so the
//! HTML-ish content an editing region produces (void `<br>`/`<img>`, stray
//! close tags, unclosed elements, named HTML entities) loads without error.

use super::{ContentSurface, Element, NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Errors from reading markup
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup at byte {position}: {message}")]
    Syntax { position: u64, message: String },
}

/// A detached markup subtree, not yet part of any surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element {
        element: Element,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

impl MarkupNode {
    /// An element with no children
    pub fn element(element: Element) -> Self {
        Self::Element {
            element,
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Builder: append a child. Ignored on text nodes.
    pub fn with_child(mut self, child: MarkupNode) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}

// ============================================================================
// READING
// ============================================================================

/// Parse a markup fragment into detached nodes.
///
/// Adjacent text (including resolved entity references) is merged into a
/// single text node so the result is stable across a write/read cycle.
pub fn parse(markup: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut top: Vec<MarkupNode> = Vec::new();
    let mut open: Vec<(Element, Vec<MarkupNode>)> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| MarkupError::Syntax {
            position: reader.buffer_position(),
            message: e.to_string(),
        })?;
        match event {
            Event::Start(e) => {
                let element = read_element(&reader, &e);
                if element.is_void() {
                    push_node(&mut top, &mut open, MarkupNode::element(element));
                } else {
                    open.push((element, Vec::new()));
                }
            }
            Event::Empty(e) => {
                let element = read_element(&reader, &e);
                push_node(&mut top, &mut open, MarkupNode::element(element));
            }
            Event::End(e) => {
                let tag = reader
                    .decoder()
                    .decode(e.name().as_ref())
                    .map(|name| name.to_ascii_lowercase())
                    .unwrap_or_default();
                // Close everything down to the matching open element; stray
                // end tags are dropped.
                if let Some(depth) = open.iter().rposition(|(el, _)| el.tag == tag) {
                    while open.len() > depth {
                        close_top(&mut top, &mut open);
                    }
                }
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|err| MarkupError::Syntax {
                    position: reader.buffer_position(),
                    message: err.to_string(),
                })?;
                push_text(&mut top, &mut open, &text);
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| MarkupError::Syntax {
                    position: reader.buffer_position(),
                    message: err.to_string(),
                })?;
                let raw = format!("&{name};");
                let resolved = unescape_with(&raw, resolve_html5_entity)
                    .map(|text| text.into_owned())
                    .unwrap_or(raw);
                push_text(&mut top, &mut open, &resolved);
            }
            Event::CData(e) => {
                let text = reader.decoder().decode(&e).map_err(|err| {
                    MarkupError::Syntax {
                        position: reader.buffer_position(),
                        message: err.to_string(),
                    }
                })?;
                push_text(&mut top, &mut open, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while !open.is_empty() {
        close_top(&mut top, &mut open);
    }
    Ok(top)
}

fn read_element(
    reader: &Reader<&[u8]>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Element {
    let decoder = reader.decoder();
    let tag = decoder
        .decode(start.name().as_ref())
        .map(|name| name.to_ascii_lowercase())
        .unwrap_or_default();
    let mut element = Element::new(tag);
    for attr in start.html_attributes().flatten() {
        let Ok(key) = decoder.decode(attr.key.as_ref()) else {
            continue;
        };
        let raw = decoder
            .decode(&attr.value)
            .map(|value| value.into_owned())
            .unwrap_or_default();
        let value = unescape_with(&raw, resolve_html5_entity)
            .map(|value| value.into_owned())
            .unwrap_or(raw);
        element.set_attr(key.to_ascii_lowercase(), value);
    }
    element
}

fn current<'a>(
    top: &'a mut Vec<MarkupNode>,
    open: &'a mut [(Element, Vec<MarkupNode>)],
) -> &'a mut Vec<MarkupNode> {
    match open.last_mut() {
        Some((_, children)) => children,
        None => top,
    }
}

fn push_node(
    top: &mut Vec<MarkupNode>,
    open: &mut [(Element, Vec<MarkupNode>)],
    node: MarkupNode,
) {
    current(top, open).push(node);
}

fn push_text(
    top: &mut Vec<MarkupNode>,
    open: &mut [(Element, Vec<MarkupNode>)],
    text: &str,
) {
    if text.is_empty() {
        return;
    }
    let siblings = current(top, open);
    if let Some(MarkupNode::Text(previous)) = siblings.last_mut() {
        previous.push_str(text);
    } else {
        siblings.push(MarkupNode::Text(text.to_string()));
    }
}

fn close_top(top: &mut Vec<MarkupNode>, open: &mut Vec<(Element, Vec<MarkupNode>)>) {
    if let Some((element, children)) = open.pop() {
        push_node(top, open, MarkupNode::Element { element, children });
    }
}

// ============================================================================
// WRITING
// ============================================================================

/// Append the markup of `id` and its subtree to `out`
pub(super) fn write_node(surface: &ContentSurface, id: NodeId, out: &mut String) {
    match surface.kind(id) {
        Some(NodeKind::Text(text)) => out.push_str(&partial_escape(text)),
        Some(NodeKind::Element(element)) => {
            out.push('<');
            out.push_str(&element.tag);
            for (key, value) in &element.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            out.push('>');
            if element.is_void() {
                return;
            }
            for &child in surface.children(id) {
                write_node(surface, child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_elements_have_no_children() {
        let nodes = parse("a<br>b<img src=\"x.png\">c").unwrap();
        assert_eq!(nodes.len(), 5);
        assert!(matches!(&nodes[1], MarkupNode::Element { element, children }
            if element.tag == "br" && children.is_empty()));
        assert!(matches!(&nodes[3], MarkupNode::Element { element, .. }
            if element.attr("src") == Some("x.png")));
    }

    #[test]
    fn html_entities_merge_into_text() {
        let nodes = parse("<p>a&nbsp;b &amp; c</p>").unwrap();
        let MarkupNode::Element { children, .. } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(children, &vec![MarkupNode::text("a\u{a0}b & c")]);
    }

    #[test]
    fn unclosed_and_stray_tags_are_tolerated() {
        let nodes = parse("<p>one<b>two</p></span>three").unwrap();
        assert_eq!(nodes.len(), 2);
        let MarkupNode::Element { element, children } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(element.tag, "p");
        assert_eq!(children.len(), 2);
        assert_eq!(nodes[1], MarkupNode::text("three"));
    }

    #[test]
    fn tags_and_attributes_are_lowercased() {
        let nodes = parse("<DIV CLASS=\"Box\">x</DIV>").unwrap();
        let MarkupNode::Element { element, .. } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(element.tag, "div");
        assert_eq!(element.attr("class"), Some("Box"));
    }

    #[test]
    fn writing_escapes_text_and_attributes() {
        let surface = ContentSurface::with_markup(
            "<span title=\"a &quot;b&quot;\">1 &lt; 2</span>",
        );
        assert_eq!(
            surface.markup(),
            "<span title=\"a &quot;b&quot;\">1 &lt; 2</span>"
        );
    }

    #[test]
    fn whitespace_is_preserved() {
        let surface = ContentSurface::with_markup("<p> a  b </p>\n");
        assert_eq!(surface.markup(), "<p> a  b </p>\n");
    }
}
