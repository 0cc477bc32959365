// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Embedded image objects.
//!
//! An image object has no identity outside the surface markup. It is a
//! `div.resizable-image-container` holding the image, a drag handle, a bank
//! of size preset buttons and a freeform resize handle. Size, position and
//! stacking live in the container's inline style, so they survive a
//! serialize/restore cycle along with the rest of the content.

use crate::settings;
use crate::surface::{ContentSurface, Element, InlineStyle, MarkupNode, NodeId};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use kurbo::{Point, Size};
use thiserror::Error;

// ============================================================================
// STRUCTURAL MARKERS
// ============================================================================
pub const CONTAINER_CLASS: &str = "resizable-image-container";
pub const DRAG_HANDLE_CLASS: &str = "drag-handle";
pub const SIZE_CONTROLS_CLASS: &str = "image-size-controls";
pub const PRESET_BUTTON_CLASS: &str = "size-control-btn";
pub const RESIZE_HANDLE_CLASS: &str = "resize-handle";

/// Discrete size presets offered on every image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizePreset {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl SizePreset {
    pub const ALL: [SizePreset; 4] = [
        SizePreset::Small,
        SizePreset::Medium,
        SizePreset::Large,
        SizePreset::ExtraLarge,
    ];

    /// Button label, also stored in `data-size`
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
            Self::ExtraLarge => "XL",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label() == label.trim())
    }

    pub fn size(self) -> Size {
        match self {
            Self::Small => Size::new(150.0, 100.0),
            Self::Medium => Size::new(300.0, 200.0),
            Self::Large => Size::new(450.0, 300.0),
            Self::ExtraLarge => Size::new(600.0, 400.0),
        }
    }
}

/// Where the container sits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// In the text flow
    Flow,
    /// Absolutely positioned; `left`/`top` relative to the surface
    Absolute(Point),
}

/// Layout state read from a container's inline style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub size: Size,
    pub placement: Placement,
    pub z_layer: i32,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Build the markup for a new image object: default size, flow-positioned
pub fn create(source_data: &str, display_name: &str) -> MarkupNode {
    let mut style = InlineStyle::default();
    style.set_px("width", settings::image::DEFAULT_WIDTH);
    style.set_px("height", settings::image::DEFAULT_HEIGHT);
    style.set("z-index", settings::image::Z_REST.to_string());

    let image = Element::new("img")
        .with_attr("src", source_data)
        .with_attr("alt", display_name)
        .with_attr("title", display_name)
        .with_attr("draggable", "false");
    let drag_handle = Element::new("div")
        .with_attr("class", DRAG_HANDLE_CLASS)
        .with_attr("title", "Drag to move image");

    let controls = SizePreset::ALL.into_iter().fold(
        MarkupNode::element(
            Element::new("div").with_attr("class", SIZE_CONTROLS_CLASS),
        ),
        |controls, preset| {
            let size = preset.size();
            let button = Element::new("button")
                .with_attr("class", PRESET_BUTTON_CLASS)
                .with_attr("data-size", preset.label())
                .with_attr(
                    "title",
                    format!("Resize to {}px × {}px", size.width, size.height),
                );
            controls.with_child(
                MarkupNode::element(button)
                    .with_child(MarkupNode::text(preset.label())),
            )
        },
    );

    MarkupNode::element(
        Element::new("div")
            .with_attr("class", CONTAINER_CLASS)
            .with_attr("style", style.to_string()),
    )
    .with_child(MarkupNode::element(image))
    .with_child(MarkupNode::element(drag_handle))
    .with_child(controls)
    .with_child(MarkupNode::element(
        Element::new("div").with_attr("class", RESIZE_HANDLE_CLASS),
    ))
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Read size, placement and stacking from a container
pub fn geometry(surface: &ContentSurface, container: NodeId) -> Option<ImageGeometry> {
    surface.element(container)?;
    let style = surface.style_of(container);
    let size = Size::new(
        style.px("width").unwrap_or(settings::image::DEFAULT_WIDTH),
        style.px("height").unwrap_or(settings::image::DEFAULT_HEIGHT),
    );
    let placement = match style.get("position") {
        Some("absolute") => Placement::Absolute(Point::new(
            style.px("left").unwrap_or(0.0),
            style.px("top").unwrap_or(0.0),
        )),
        _ => Placement::Flow,
    };
    let z_layer = style
        .get("z-index")
        .and_then(|z| z.trim().parse().ok())
        .unwrap_or(settings::image::Z_REST);
    Some(ImageGeometry {
        size,
        placement,
        z_layer,
    })
}

pub fn set_size(surface: &mut ContentSurface, container: NodeId, size: Size) -> bool {
    let mut style = surface.style_of(container);
    style.set_px("width", size.width);
    style.set_px("height", size.height);
    surface.set_style(container, &style)
}

/// Switch the container to absolute positioning at `origin`
pub fn set_position(
    surface: &mut ContentSurface,
    container: NodeId,
    origin: Point,
) -> bool {
    let mut style = surface.style_of(container);
    style.set("position", "absolute");
    style.set_px("left", origin.x);
    style.set_px("top", origin.y);
    surface.set_style(container, &style)
}

pub fn set_z_layer(surface: &mut ContentSurface, container: NodeId, z: i32) -> bool {
    let mut style = surface.style_of(container);
    style.set("z-index", z.to_string());
    surface.set_style(container, &style)
}

pub fn apply_preset(
    surface: &mut ContentSurface,
    container: NodeId,
    preset: SizePreset,
) -> bool {
    set_size(surface, container, preset.size())
}

/// Keep a dragged container inside `bounds`, `padding` away from each edge.
///
/// The lower bound wins when the container is too large to fit.
pub fn clamp_origin(origin: Point, size: Size, bounds: Size, padding: f64) -> Point {
    Point::new(
        padding.max((bounds.width - size.width - padding).min(origin.x)),
        padding.max((bounds.height - size.height - padding).min(origin.y)),
    )
}

// ============================================================================
// UPLOADS
// ============================================================================

/// A file handed over by the host's file picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Reasons an upload is refused. The messages are shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please select a valid image file.")]
    NotAnImage { media_type: String },

    #[error(
        "Image file is too large. Please select an image under {}MB.",
        .limit / (1024 * 1024)
    )]
    TooLarge { size: u64, limit: u64 },
}

/// Check the declared media type and the byte ceiling
pub fn validate(upload: &ImageUpload, max_bytes: u64) -> Result<(), UploadError> {
    if !upload.media_type.starts_with("image/") {
        return Err(UploadError::NotAnImage {
            media_type: upload.media_type.clone(),
        });
    }
    if upload.byte_size() > max_bytes {
        return Err(UploadError::TooLarge {
            size: upload.byte_size(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Encode an upload as a base64 data URI.
///
/// The media type is sniffed from the bytes when the format is recognised,
/// otherwise the declared type is used.
pub fn data_uri(upload: &ImageUpload) -> String {
    let media_type = image::guess_format(&upload.bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| upload.media_type.clone());
    format!("data:{};base64,{}", media_type, STANDARD.encode(&upload.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn inserted() -> (ContentSurface, NodeId) {
        let mut surface = ContentSurface::new();
        let container = surface
            .append(surface.root(), create("data:image/png;base64,AA==", "cat.png"))
            .unwrap();
        (surface, container)
    }

    #[test]
    fn create_builds_the_full_structure() {
        let (surface, container) = inserted();
        let children = surface.children(container);
        assert_eq!(children.len(), 4);
        assert_eq!(surface.element(children[0]).unwrap().tag, "img");
        assert_eq!(
            surface.element(children[0]).unwrap().attr("alt"),
            Some("cat.png")
        );
        assert!(surface.element(children[1]).unwrap().has_class(DRAG_HANDLE_CLASS));
        assert_eq!(surface.children(children[2]).len(), 4);
        assert!(surface.element(children[3]).unwrap().has_class(RESIZE_HANDLE_CLASS));

        let geometry = geometry(&surface, container).unwrap();
        assert_eq!(geometry.size, Size::new(300.0, 200.0));
        assert_eq!(geometry.placement, Placement::Flow);
        assert_eq!(geometry.z_layer, 10);
    }

    #[test]
    fn geometry_survives_serialization() {
        let (mut surface, container) = inserted();
        apply_preset(&mut surface, container, SizePreset::Large);
        set_position(&mut surface, container, Point::new(40.0, 12.5));
        set_z_layer(&mut surface, container, 25);

        let copy = ContentSurface::with_markup(&surface.markup());
        let restored = copy.find_by_class(CONTAINER_CLASS)[0];
        let geometry = geometry(&copy, restored).unwrap();
        assert_eq!(geometry.size, Size::new(450.0, 300.0));
        assert_eq!(geometry.placement, Placement::Absolute(Point::new(40.0, 12.5)));
        assert_eq!(geometry.z_layer, 25);
    }

    #[test]
    fn preset_labels_round_trip() {
        for preset in SizePreset::ALL {
            assert_eq!(SizePreset::from_label(preset.label()), Some(preset));
        }
        assert_eq!(SizePreset::from_label("XXL"), None);
        assert_eq!(SizePreset::ExtraLarge.size(), Size::new(600.0, 400.0));
    }

    #[test]
    fn clamp_origin_keeps_padding() {
        let bounds = Size::new(800.0, 600.0);
        let size = Size::new(300.0, 200.0);
        assert_eq!(
            clamp_origin(Point::new(-50.0, -50.0), size, bounds, 10.0),
            Point::new(10.0, 10.0)
        );
        assert_eq!(
            clamp_origin(Point::new(5000.0, 5000.0), size, bounds, 10.0),
            Point::new(490.0, 390.0)
        );
        assert_eq!(
            clamp_origin(Point::new(120.0, 80.0), size, bounds, 10.0),
            Point::new(120.0, 80.0)
        );
    }

    #[test]
    fn uploads_are_validated() {
        let limit = settings::image::MAX_BYTES;
        let text = ImageUpload::new("notes.txt", "text/plain", b"hi".to_vec());
        let err = validate(&text, limit).unwrap_err();
        assert_eq!(err.to_string(), "Please select a valid image file.");

        let huge = ImageUpload::new("big.png", "image/png", vec![0; limit as usize + 1]);
        let err = validate(&huge, limit).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Image file is too large. Please select an image under 5MB."
        );

        let exact = ImageUpload::new("ok.png", "image/png", vec![0; limit as usize]);
        assert!(validate(&exact, limit).is_ok());
    }

    #[test]
    fn data_uri_sniffs_media_type() {
        let upload = ImageUpload::new("x.jpg", "image/jpeg", PNG_MAGIC.to_vec());
        assert!(data_uri(&upload).starts_with("data:image/png;base64,"));

        let unknown = ImageUpload::new("x.webp", "image/webp", vec![1, 2, 3]);
        assert_eq!(data_uri(&unknown), "data:image/webp;base64,AQID");
    }
}
