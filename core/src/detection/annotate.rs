//! Overlay rendering of detections onto radiographs
//!
//! Each detection is drawn as a coloured hollow box with a caption of the
//! form `"<label> <confidence>"`. Captions need a TrueType font; without one
//! only boxes are drawn.

use crate::error::{OrthoscanError, Result};
use crate::types::{BoundingBox, Detection};

use ab_glyph::{Font, FontVec, ScaleFont};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use log::{debug, info};
use std::fmt;
use std::path::Path;

const CAPTION_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 56, 56]),
    Rgb([255, 157, 151]),
    Rgb([255, 112, 31]),
    Rgb([72, 249, 10]),
    Rgb([0, 194, 255]),
    Rgb([146, 204, 23]),
];

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Styling for annotated pages
pub struct AnnotationStyle {
    /// Caption font. Captions are skipped when `None`.
    pub font: Option<FontVec>,

    /// Caption font size in pixels
    pub font_scale: f32,

    /// Box line thickness in pixels
    pub box_thickness: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 18.0,
            box_thickness: 2,
        }
    }
}

impl fmt::Debug for AnnotationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStyle")
            .field("font", &self.font.as_ref().map(|_| "<font>"))
            .field("font_scale", &self.font_scale)
            .field("box_thickness", &self.box_thickness)
            .finish()
    }
}

impl AnnotationStyle {
    /// Loads the caption font from `path`
    pub fn with_font_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|_| {
            OrthoscanError::InvalidValue(format!("Failed to parse font file: {}", path.display()))
        })?;
        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Tries a few common system font locations
    ///
    /// Falls back to box-only overlays when none can be loaded.
    pub fn with_system_font() -> Self {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(style) = Self::with_font_path(Path::new(path)) {
                info!("Loaded system font: {}", path);
                return style;
            }
        }
        debug!("No system font found, captions will be skipped");
        Self::default()
    }

    /// Builder: Set the box thickness
    pub fn box_thickness(mut self, thickness: u32) -> Self {
        self.box_thickness = thickness.max(1);
        self
    }
}

/// Draws boxes and captions for `detections` over a copy of `image`
pub fn render_annotated(
    image: &DynamicImage,
    detections: &[Detection],
    style: &AnnotationStyle,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let bounds = (canvas.width() as i32, canvas.height() as i32);

    for detection in detections {
        let color = label_color(&detection.label);
        let Some(rect) = bbox_to_rect(&detection.bbox, bounds) else {
            continue;
        };
        draw_box(&mut canvas, rect, color, style.box_thickness, bounds);
        if let Some(font) = &style.font {
            draw_caption(&mut canvas, rect, &detection.caption(), color, font, style.font_scale);
        }
    }

    canvas
}

/// Stable colour per label so the same finding looks the same on every page
fn label_color(label: &str) -> Rgb<u8> {
    let hash = label
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

/// Converts a box to an integer rectangle clipped to the image
fn bbox_to_rect(bbox: &BoundingBox, bounds: (i32, i32)) -> Option<Rect> {
    let (width, height) = bounds;
    let clamped = bbox.clamped((width - 1).max(0) as f32, (height - 1).max(0) as f32);

    let left = clamped.x_min.round() as i32;
    let top = clamped.y_min.round() as i32;
    let w = clamped.width().round() as u32;
    let h = clamped.height().round() as u32;

    (w > 0 && h > 0).then(|| Rect::at(left, top).of_size(w, h))
}

fn is_rect_in_bounds(rect: &Rect, bounds: (i32, i32)) -> bool {
    rect.left() >= 0 && rect.top() >= 0 && rect.right() < bounds.0 && rect.bottom() < bounds.1
}

fn draw_box(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>, thickness: u32, bounds: (i32, i32)) {
    for t in 0..thickness as i32 {
        // Grow inward so thick lines never leave the image
        let w = rect.width() as i32 - 2 * t;
        let h = rect.height() as i32 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        let inner = Rect::at(rect.left() + t, rect.top() + t).of_size(w as u32, h as u32);
        if is_rect_in_bounds(&inner, bounds) {
            draw_hollow_rect_mut(canvas, inner, color);
        }
    }
}

fn draw_caption(
    canvas: &mut RgbImage,
    rect: Rect,
    text: &str,
    color: Rgb<u8>,
    font: &FontVec,
    scale: f32,
) {
    let text_width = measure_text_width(text, font, scale).ceil() as u32 + 4;
    let text_height = scale.ceil() as u32 + 2;

    // Above the box when there is room, otherwise just inside its top edge
    let top = if rect.top() >= text_height as i32 {
        rect.top() - text_height as i32
    } else {
        rect.top()
    };
    let left = rect.left();

    let max_width = (canvas.width() as i32 - left).max(0) as u32;
    let background = Rect::at(left, top).of_size(text_width.min(max_width).max(1), text_height);
    draw_filled_rect_mut(canvas, background, color);
    draw_text_mut(canvas, CAPTION_TEXT_COLOR, left + 2, top + 1, scale, font, text);
}

fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    let scaled_font = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.glyph_id(ch)))
        .sum()
}
