// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Live handles for the image objects currently in the surface.
//!
//! Image objects carry no identity of their own; after a full content
//! replace every old handle is void. The registry re-derives handles by
//! scanning for container markers, replacing each container with a fresh
//! copy first so no stale binding can survive on the new nodes.

use super::image_object::{
    self, CONTAINER_CLASS, DRAG_HANDLE_CLASS, PRESET_BUTTON_CLASS,
    RESIZE_HANDLE_CLASS, SizePreset,
};
use crate::model::BindingId;
use crate::surface::{ContentSurface, NodeId};

/// The interactive parts of one bound image object
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub binding: BindingId,
    pub container: NodeId,
    pub image: Option<NodeId>,
    pub drag_handle: Option<NodeId>,
    pub resize_handle: Option<NodeId>,
    pub presets: Vec<(SizePreset, NodeId)>,
}

impl ImageHandle {
    fn bind(surface: &ContentSurface, container: NodeId) -> Self {
        let mut handle = Self {
            binding: BindingId::next(),
            container,
            image: None,
            drag_handle: None,
            resize_handle: None,
            presets: Vec::new(),
        };
        for id in surface.descendants(container) {
            let Some(element) = surface.element(id) else {
                continue;
            };
            if element.tag == "img" && handle.image.is_none() {
                handle.image = Some(id);
            } else if element.has_class(DRAG_HANDLE_CLASS) {
                handle.drag_handle.get_or_insert(id);
            } else if element.has_class(RESIZE_HANDLE_CLASS) {
                handle.resize_handle.get_or_insert(id);
            } else if element.has_class(PRESET_BUTTON_CLASS) {
                let label = element
                    .attr("data-size")
                    .map(str::to_string)
                    .unwrap_or_else(|| surface.text_content(id));
                if let Some(preset) = SizePreset::from_label(&label) {
                    handle.presets.push((preset, id));
                }
            }
        }
        handle
    }
}

/// Which part of an image object a pointer landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePart {
    /// The picture itself: opens the preview
    Preview,
    DragHandle,
    ResizeHandle,
    Preset(SizePreset),
    /// Anywhere else inside the container
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHit {
    pub binding: BindingId,
    pub container: NodeId,
    pub part: ImagePart,
}

/// Arena-by-scan registry of bound image objects
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    handles: Vec<ImageHandle>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every image container with a fresh copy and bind it.
    ///
    /// Safe to call repeatedly: each call drops all previous handles and
    /// yields exactly one handle per container. Returns the handle count.
    pub fn rebind(&mut self, surface: &mut ContentSurface) -> usize {
        self.handles.clear();
        for container in surface.find_by_class(CONTAINER_CLASS) {
            if surface.contains(container) {
                surface.replace_with_clone(container);
            }
        }
        for container in surface.find_by_class(CONTAINER_CLASS) {
            self.handles.push(ImageHandle::bind(surface, container));
        }
        tracing::debug!("Rebound {} image object(s)", self.handles.len());
        self.handles.len()
    }

    /// Bind a container that was just inserted
    pub fn bind(
        &mut self,
        surface: &ContentSurface,
        container: NodeId,
    ) -> Option<&ImageHandle> {
        let is_container = surface
            .element(container)
            .map(|element| element.has_class(CONTAINER_CLASS))
            .unwrap_or(false);
        if !is_container {
            return None;
        }
        self.handles.retain(|handle| handle.container != container);
        self.handles.push(ImageHandle::bind(surface, container));
        self.handles.last()
    }

    pub fn handles(&self) -> &[ImageHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, container: NodeId) -> Option<&ImageHandle> {
        self.handles
            .iter()
            .find(|handle| handle.container == container)
    }

    /// True if `binding` is still current
    pub fn is_live(&self, binding: BindingId) -> bool {
        self.handles.iter().any(|handle| handle.binding == binding)
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }

    /// Resolve a pointer target to the image part under it
    pub fn hit_test(&self, surface: &ContentSurface, target: NodeId) -> Option<ImageHit> {
        let container =
            surface.closest_with_class(target, CONTAINER_CLASS, surface.root())?;
        let handle = self.get(container)?;
        let within = |part: Option<NodeId>| {
            part.map(|node| surface.is_inclusive_ancestor(node, target))
                .unwrap_or(false)
        };

        let part = if within(handle.image) {
            ImagePart::Preview
        } else if within(handle.drag_handle) {
            ImagePart::DragHandle
        } else if within(handle.resize_handle) {
            ImagePart::ResizeHandle
        } else if let Some((preset, _)) = handle
            .presets
            .iter()
            .find(|(_, node)| surface.is_inclusive_ancestor(*node, target))
        {
            ImagePart::Preset(*preset)
        } else {
            ImagePart::Body
        };
        Some(ImageHit {
            binding: handle.binding,
            container,
            part,
        })
    }
}

/// Image source and display name of a bound container, for previews
pub fn preview_of(surface: &ContentSurface, handle: &ImageHandle) -> Option<(String, String)> {
    let image = surface.element(handle.image?)?;
    Some((
        image.attr("src").unwrap_or_default().to_string(),
        image.attr("alt").unwrap_or_default().to_string(),
    ))
}

/// Geometry helper re-exported for callers holding a handle
pub fn geometry_of(
    surface: &ContentSurface,
    handle: &ImageHandle,
) -> Option<image_object::ImageGeometry> {
    image_object::geometry(surface, handle.container)
}
