//! # Game Mathematics
//!
//! Rectangle and vector helpers for pixel-space calculations.

use macroquad::math::{Rect, Vec2};

/// Strict rectangle intersection: rectangles that only share an edge do not
/// overlap.
///
/// # Examples
///
/// ```
/// use tilebound::rects_overlap;
/// use macroquad::math::Rect;
///
/// let a = Rect::new(0.0, 0.0, 16.0, 16.0);
/// assert!(rects_overlap(&a, &Rect::new(15.0, 0.0, 16.0, 16.0)));
/// assert!(!rects_overlap(&a, &Rect::new(16.0, 0.0, 16.0, 16.0)));
/// ```
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Unit vector pointing from `from` to `to`, or zero if they coincide.
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Centre point of a rectangle.
pub fn rect_center(rect: &Rect) -> Vec2 {
    Vec2::new(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rects_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!rects_overlap(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!rects_overlap(&a, &Rect::new(0.0, 10.0, 10.0, 10.0)));
        assert!(!rects_overlap(&a, &Rect::new(30.0, 30.0, 1.0, 1.0)));
    }

    #[test]
    fn test_direction_to() {
        assert_eq!(direction_to(Vec2::ZERO, Vec2::new(0.0, 5.0)), Vec2::new(0.0, 1.0));
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }
}
