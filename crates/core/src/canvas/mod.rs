//! Drawing surface abstraction supplied by the host.
//!
//! Plugins only ever talk to [`Canvas`]; concrete backends (GPU, raster,
//! the [`RecordingCanvas`](crate::record::RecordingCanvas) used by tests and
//! the CLI) live elsewhere.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Point in canvas pixel space, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self` in direction `angle` (radians).
    pub fn polar(self, radius: f32, angle: f32) -> Self {
        Self::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }

    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` surface.
    pub fn full(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Immediate-mode 2D drawing surface.
pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn draw_line(&mut self, from: Point, to: Point, color: Rgba);
    /// Draws a polyline through `points`, closing it when `closed` is set.
    fn draw_lines(&mut self, points: &[Point], color: Rgba, closed: bool);
    fn draw_circle(&mut self, center: Point, radius: f32, color: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgba);
    fn draw_text(&mut self, text: &str, at: Point, size: f32, color: Rgba);
    fn set_line_width(&mut self, width: f32);

    /// Center of the surface.
    fn center(&self) -> Point {
        Point::new(self.width() * 0.5, self.height() * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_offsets_from_origin() {
        let p = Point::new(10.0, 10.0).polar(5.0, 0.0);
        assert!((p.x - 15.0).abs() < 1e-6);
        assert!((p.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn rect_center() {
        let rect = Rect::full(200.0, 100.0);
        assert_eq!(rect.center(), Point::new(100.0, 50.0));
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }
}
