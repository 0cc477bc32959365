// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Image insertion and pointer gestures for EditorSession

use super::{EditorSession, ShellEvent};
use crate::editing::edit_types::CheckpointTrigger;
use crate::editing::gesture::{DragGesture, FrameUpdate, Gesture, PointerEvent, ResizeGesture};
use crate::editing::image_object::{self, ImageUpload, Placement, UploadError};
use crate::editing::image_registry::{self, ImagePart};
use crate::settings;
use kurbo::Point;
use std::time::Instant;

impl EditorSession {
    /// Validate an upload and insert it as an image object at the caret.
    ///
    /// A rejected upload leaves the surface alone and queues the rejection
    /// message for the shell.
    pub fn insert_image(
        &mut self,
        upload: &ImageUpload,
        now: Instant,
    ) -> Result<(), UploadError> {
        if let Err(e) = image_object::validate(upload, self.config.max_image_bytes) {
            tracing::warn!("Rejected image upload {}: {}", upload.name, e);
            self.events.push_back(ShellEvent::Message(e.to_string()));
            return Err(e);
        }

        self.surface.focus();
        self.checkpoint(CheckpointTrigger::Command, now);

        let fragment = image_object::create(&image_object::data_uri(upload), &upload.name);
        let Some(container) = self.surface.insert_fragment(fragment) else {
            return Ok(());
        };
        self.images.bind(&self.surface, container);
        self.surface.caret_to_end();
        tracing::info!("Inserted image {} ({} bytes)", upload.name, upload.byte_size());
        self.content_changed(now);
        Ok(())
    }

    /// Pointer pressed on the surface. Returns true if an image object
    /// consumed the press.
    pub fn pointer_down(&mut self, event: PointerEvent, now: Instant) -> bool {
        let Some(hit) = self.images.hit_test(&self.surface, event.target) else {
            return false;
        };
        let Some(handle) = self.images.get(hit.container).cloned() else {
            return false;
        };
        let Some(geometry) = image_registry::geometry_of(&self.surface, &handle) else {
            return false;
        };

        match hit.part {
            ImagePart::Preview => {
                if let Some((src, name)) = image_registry::preview_of(&self.surface, &handle) {
                    self.events.push_back(ShellEvent::ImagePreview { src, name });
                }
            }
            ImagePart::DragHandle => {
                self.checkpoint(CheckpointTrigger::ImageGesture, now);
                let origin = match geometry.placement {
                    Placement::Absolute(origin) => origin,
                    Placement::Flow => event.target_origin.unwrap_or(Point::ZERO),
                };
                let origin = image_object::clamp_origin(
                    origin,
                    geometry.size,
                    self.surface.client_size(),
                    self.config.drag_padding,
                );
                image_object::set_position(&mut self.surface, hit.container, origin);
                image_object::set_z_layer(
                    &mut self.surface,
                    hit.container,
                    settings::image::Z_DRAGGING,
                );
                self.gesture = Some(Gesture::Drag(DragGesture::begin(
                    hit.container,
                    event.position,
                    origin,
                    geometry.size,
                )));
            }
            ImagePart::ResizeHandle => {
                self.checkpoint(CheckpointTrigger::ImageGesture, now);
                self.gesture = Some(Gesture::Resize(ResizeGesture::begin(
                    hit.container,
                    event.position,
                    geometry.size,
                )));
            }
            ImagePart::Preset(preset) => {
                self.checkpoint(CheckpointTrigger::ImageGesture, now);
                image_object::apply_preset(&mut self.surface, hit.container, preset);
                self.checkpoint(CheckpointTrigger::ImageGesture, now);
                self.request_autosave(now);
            }
            ImagePart::Body => return false,
        }
        true
    }

    /// Pointer moved; queues at most one style update per frame
    pub fn pointer_move(&mut self, position: Point) {
        let Some(gesture) = self.gesture else {
            return;
        };
        let update = match gesture {
            Gesture::Resize(resize) => FrameUpdate::Size {
                container: resize.container,
                size: self.config.clamp_image_size(resize.size_at(position)),
            },
            Gesture::Drag(drag) => FrameUpdate::Position {
                container: drag.container,
                origin: drag.origin_at(
                    position,
                    self.surface.client_size(),
                    self.config.drag_padding,
                ),
            },
        };
        self.frame.request(update);
    }

    /// Apply the pending gesture update, if any
    pub fn animation_frame(&mut self) -> bool {
        let Some(update) = self.frame.take() else {
            return false;
        };
        match update {
            FrameUpdate::Size { container, size } => {
                image_object::set_size(&mut self.surface, container, size)
            }
            FrameUpdate::Position { container, origin } => {
                image_object::set_position(&mut self.surface, container, origin)
            }
        }
    }

    /// Pointer released anywhere.
    ///
    /// Ends an image gesture with a checkpoint; otherwise schedules the
    /// delayed pointer-up checkpoint for plain content edits.
    pub fn pointer_up(&mut self, now: Instant) {
        let Some(gesture) = self.gesture.take() else {
            self.schedule_checkpoint(CheckpointTrigger::PointerUp, now);
            return;
        };
        self.animation_frame();
        if let Gesture::Drag(drag) = gesture {
            image_object::set_z_layer(
                &mut self.surface,
                drag.container,
                settings::image::Z_REST,
            );
        }
        self.checkpoint(CheckpointTrigger::ImageGesture, now);
        self.request_autosave(now);
    }

    /// True while a resize or drag is in progress
    pub fn is_gesturing(&self) -> bool {
        self.gesture.is_some()
    }
}
