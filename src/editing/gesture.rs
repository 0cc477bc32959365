// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Pointer gestures on image objects: freeform resize and drag.
//!
//! Both gestures capture their starting state on pointer-down and compute
//! every later value from that state plus the current pointer position, so
//! dropped intermediate updates never accumulate error.

use super::image_object;
use crate::surface::NodeId;
use kurbo::{Point, Size, Vec2};

/// A pointer press as reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position relative to the surface's content box
    pub position: Point,
    /// Deepest node under the pointer
    pub target: NodeId,
    /// Laid-out origin of the target's image container, when the host knows
    /// it. Flow-positioned containers have no origin in their markup.
    pub target_origin: Option<Point>,
}

impl PointerEvent {
    pub fn new(position: Point, target: NodeId) -> Self {
        Self {
            position,
            target,
            target_origin: None,
        }
    }

    pub fn with_target_origin(mut self, origin: Point) -> Self {
        self.target_origin = Some(origin);
        self
    }
}

/// Freeform resize from the bottom-right handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeGesture {
    pub container: NodeId,
    start_pointer: Point,
    start_size: Size,
}

impl ResizeGesture {
    pub fn begin(container: NodeId, pointer: Point, start_size: Size) -> Self {
        Self {
            container,
            start_pointer: pointer,
            start_size,
        }
    }

    /// Unclamped size for the pointer at `pointer`
    pub fn size_at(&self, pointer: Point) -> Size {
        let delta = pointer - self.start_pointer;
        Size::new(
            self.start_size.width + delta.x,
            self.start_size.height + delta.y,
        )
    }
}

/// Drag by the drag handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub container: NodeId,
    grab: Vec2,
    size: Size,
}

impl DragGesture {
    /// `origin` is the container's top-left when the press happened
    pub fn begin(container: NodeId, pointer: Point, origin: Point, size: Size) -> Self {
        Self {
            container,
            grab: pointer - origin,
            size,
        }
    }

    /// Clamped container origin for the pointer at `pointer`
    pub fn origin_at(&self, pointer: Point, bounds: Size, padding: f64) -> Point {
        image_object::clamp_origin(pointer - self.grab, self.size, bounds, padding)
    }
}

/// The gesture in progress, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Resize(ResizeGesture),
    Drag(DragGesture),
}

/// A style update waiting for the next display frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameUpdate {
    Size { container: NodeId, size: Size },
    Position { container: NodeId, origin: Point },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ContentSurface;

    fn any_node() -> NodeId {
        ContentSurface::new().root()
    }

    #[test]
    fn resize_follows_pointer_delta() {
        let gesture = ResizeGesture::begin(
            any_node(),
            Point::new(300.0, 200.0),
            Size::new(300.0, 200.0),
        );
        assert_eq!(
            gesture.size_at(Point::new(900.0, 700.0)),
            Size::new(900.0, 700.0)
        );
        assert_eq!(
            gesture.size_at(Point::new(250.0, 260.0)),
            Size::new(250.0, 260.0)
        );
    }

    #[test]
    fn drag_keeps_grab_offset_and_clamps() {
        let gesture = DragGesture::begin(
            any_node(),
            Point::new(60.0, 30.0),
            Point::new(50.0, 20.0),
            Size::new(300.0, 200.0),
        );
        let bounds = Size::new(800.0, 600.0);
        assert_eq!(
            gesture.origin_at(Point::new(110.0, 130.0), bounds, 10.0),
            Point::new(100.0, 120.0)
        );
        assert_eq!(
            gesture.origin_at(Point::new(-400.0, 9000.0), bounds, 10.0),
            Point::new(10.0, 390.0)
        );
    }
}
