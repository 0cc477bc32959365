// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Inline `style` attribute handling.

use super::{ContentSurface, NodeId};

/// Ordered CSS declarations of a `style` attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse `prop: value; prop: value`. Malformed declarations are skipped.
    pub fn parse(text: &str) -> Self {
        let decls = text
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim().to_ascii_lowercase();
                let value = value.trim();
                (!prop.is_empty() && !value.is_empty())
                    .then(|| (prop, value.to_string()))
            })
            .collect();
        Self { decls }
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(key, _)| key == prop)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, prop: &str, value: impl Into<String>) {
        let value = value.into();
        match self.decls.iter_mut().find(|(key, _)| key == prop) {
            Some(slot) => slot.1 = value,
            None => self.decls.push((prop.to_string(), value)),
        }
    }

    pub fn remove(&mut self, prop: &str) {
        self.decls.retain(|(key, _)| key != prop);
    }

    /// A pixel length such as `300px`
    pub fn px(&self, prop: &str) -> Option<f64> {
        let value = self.get(prop)?;
        value.strip_suffix("px").unwrap_or(value).trim().parse().ok()
    }

    pub fn set_px(&mut self, prop: &str, value: f64) {
        self.set(prop, format_px(value));
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl std::fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (prop, value)) in self.decls.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{prop}: {value};")?;
        }
        Ok(())
    }
}

/// Whole pixels print without a fraction
pub fn format_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{value}px")
    }
}

impl ContentSurface {
    /// The parsed `style` attribute of an element (empty for text nodes)
    pub fn style_of(&self, id: NodeId) -> InlineStyle {
        self.element(id)
            .and_then(|element| element.attr("style"))
            .map(InlineStyle::parse)
            .unwrap_or_default()
    }

    /// Write `style` back to an element, dropping the attribute when empty
    pub fn set_style(&mut self, id: NodeId, style: &InlineStyle) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        if style.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", style.to_string());
        }
        true
    }
}
