//! # Rendering Module
//!
//! Drawing goes through the [`RenderTarget`] trait so the tile/room runtime
//! never touches a global screen. [`MacroquadDisplay`] is the real target;
//! [`DrawRecorder`] records calls for headless use.

pub mod display;
pub mod ui;

pub use display::*;
pub use ui::*;

use macroquad::color::Color;
use macroquad::math::Vec2;
use serde::{Deserialize, Serialize};

/// Handle to an image in the asset store, e.g. `"tiles/walls/3"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(key: impl Into<String>) -> Self {
        ImageRef(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

/// Something the game can draw onto.
pub trait RenderTarget {
    /// Draws an image with its top-left corner at `pos`, scaled to `size`.
    fn draw_image(&mut self, image: &ImageRef, pos: Vec2, size: Vec2);

    /// Draws a line of text with its baseline starting at `pos`.
    fn draw_text(&mut self, text: &str, pos: Vec2, font_size: f32);

    /// Fills a rectangle with a flat colour.
    fn draw_rect(&mut self, pos: Vec2, size: Vec2, color: Color);
}

/// A single recorded draw operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Image {
        image: ImageRef,
        pos: Vec2,
        size: Vec2,
    },
    Text {
        text: String,
        pos: Vec2,
        font_size: f32,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: Color,
    },
}

/// Render target that only records what would have been drawn.
#[derive(Debug, Default)]
pub struct DrawRecorder {
    pub calls: Vec<DrawCall>,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Images drawn so far, in order.
    pub fn images(&self) -> Vec<&ImageRef> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Image { image, .. } => Some(image),
                DrawCall::Text { .. } | DrawCall::Rect { .. } => None,
            })
            .collect()
    }

    /// Filled rectangles drawn so far, as `(pos, size)`.
    pub fn rects(&self) -> Vec<(Vec2, Vec2)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Rect { pos, size, .. } => Some((*pos, *size)),
                DrawCall::Image { .. } | DrawCall::Text { .. } => None,
            })
            .collect()
    }

    /// Text drawn so far, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                DrawCall::Image { .. } | DrawCall::Rect { .. } => None,
            })
            .collect()
    }
}

impl RenderTarget for DrawRecorder {
    fn draw_image(&mut self, image: &ImageRef, pos: Vec2, size: Vec2) {
        self.calls.push(DrawCall::Image {
            image: image.clone(),
            pos,
            size,
        });
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, font_size: f32) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            pos,
            font_size,
        });
    }

    fn draw_rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        self.calls.push(DrawCall::Rect { pos, size, color });
    }
}
