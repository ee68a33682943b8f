//! Raster surface backed by a `tiny_skia::Pixmap`.
//!
//! RGBA8, row-major, top-left origin with y growing downward. Every drawing
//! primitive composites source-over, scaled by the canvas `global_alpha`, and
//! silently clips anything outside the surface. The surface starts opaque and
//! source-over keeps it opaque, so the premultiplied bytes are plain RGBA.

use glam::Vec2;
use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Point,
    PremultipliedColorU8, RadialGradient, Rect, SpreadMode, Stroke, Transform,
};

use crate::color::Rgba;
use crate::error::{EngineError, Result};

/// Largest surface the engine agrees to allocate (8K square).
pub const MAX_SURFACE_PIXELS: usize = 8192 * 8192;

/// Glyph cell grid used by [`Canvas::fill_glyph`]
const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

pub struct Canvas {
    pixmap: Pixmap,
    global_alpha: f32,
}

impl Canvas {
    /// Allocates an opaque black surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let fits = (width as usize)
            .checked_mul(height as usize)
            .is_some_and(|n| n <= MAX_SURFACE_PIXELS);
        let pixmap = fits.then(|| Pixmap::new(width, height)).flatten();
        let Some(mut pixmap) = pixmap else {
            return Err(EngineError::InvalidSurface { width, height });
        };
        pixmap.fill(Color::BLACK);
        Ok(Self {
            pixmap,
            global_alpha: 1.0,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Raw RGBA8 bytes, ready to blit into an image or texture.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.pixmap.pixel(x, y)?;
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Solid paint for `color` at the current global alpha; `None` when
    /// nothing would be drawn.
    fn paint(&self, color: Rgba) -> Option<Paint<'static>> {
        let alpha = color.a * self.global_alpha;
        if !(alpha > 0.0) {
            return None;
        }
        let color = Color::from_rgba(
            color.r.clamp(0.0, 1.0),
            color.g.clamp(0.0, 1.0),
            color.b.clamp(0.0, 1.0),
            alpha.min(1.0),
        )?;
        let mut paint = Paint::default();
        paint.set_color(color);
        Some(paint)
    }

    /// Composites `color` over the whole surface (the per-frame fade).
    pub fn fill(&mut self, color: Rgba) {
        let size = self.size();
        self.fill_rect(0.0, 0.0, size.x, size.y, color);
    }

    /// Fills a `size`×`size` block; half-resolution patterns use `size = 2`.
    ///
    /// Writes pixels directly instead of going through the rasterizer, so a
    /// full-surface sweep of blocks costs one blend per pixel.
    pub fn blend_block(&mut self, x: i32, y: i32, size: i32, color: Rgba) {
        let alpha = color.a * self.global_alpha;
        if !(alpha > 0.0) {
            return;
        }
        let alpha = alpha.min(1.0);
        let (w, h) = (self.width() as i32, self.height() as i32);
        let (x0, y0) = (x.max(0), y.max(0));
        let (x1, y1) = (x.saturating_add(size).min(w), y.saturating_add(size).min(h));
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let src = [color.r, color.g, color.b].map(|c| c.clamp(0.0, 1.0) * 255.0);
        let mix = |s: f32, d: u8| (d as f32 + (s - d as f32) * alpha + 0.5) as u8;
        let pixels = self.pixmap.pixels_mut();
        for py in y0..y1 {
            let row = py as usize * w as usize;
            for px in x0..x1 {
                let dst = &mut pixels[row + px as usize];
                let out = PremultipliedColorU8::from_rgba(
                    mix(src[0], dst.red()),
                    mix(src[1], dst.green()),
                    mix(src[2], dst.blue()),
                    255,
                );
                if let Some(out) = out {
                    *dst = out;
                }
            }
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let (Some(rect), Some(paint)) = (Rect::from_xywh(x, y, w, h), self.paint(color)) else {
            return;
        };
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if !(radius > 0.0 && radius.is_finite() && center.is_finite()) {
            return;
        }
        let (Some(path), Some(paint)) = (PathBuilder::from_circle(center.x, center.y, radius), self.paint(color))
        else {
            return;
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Fills a disc whose colour is interpolated between `stops`
    /// (`(offset 0..1 from center, colour)`, sorted by offset).
    pub fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[(f32, Rgba)]) {
        if stops.is_empty() || !(radius > 0.0 && radius.is_finite() && center.is_finite()) {
            return;
        }
        let stops: Vec<GradientStop> = stops
            .iter()
            .filter_map(|&(offset, c)| {
                let color = Color::from_rgba(
                    c.r.clamp(0.0, 1.0),
                    c.g.clamp(0.0, 1.0),
                    c.b.clamp(0.0, 1.0),
                    c.a.clamp(0.0, 1.0),
                )?;
                Some(GradientStop::new(offset, color))
            })
            .collect();
        let origin = Point::from_xy(center.x, center.y);
        let Some(mut shader) = RadialGradient::new(
            origin,
            0.0,
            origin,
            radius,
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        shader.apply_opacity(self.global_alpha);
        let paint = Paint {
            shader,
            ..Paint::default()
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Anti-aliased line of the given width with round caps.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.stroke_polyline(&[from, to], width, color);
    }

    /// Strokes the whole polyline as one path, so every pixel is composited
    /// once even where segments meet.
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: Rgba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        if rest.is_empty() || !width.is_finite() || points.iter().any(|p| !p.is_finite()) {
            return;
        }
        let mut pb = PathBuilder::with_capacity(points.len(), points.len());
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
        self.stroke(pb, width, color);
    }

    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        if !(radius > 0.0 && radius.is_finite() && center.is_finite() && width.is_finite()) {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.push_circle(center.x, center.y, radius);
        self.stroke(pb, width, color);
    }

    fn stroke(&mut self, pb: PathBuilder, width: f32, color: Rgba) {
        let (Some(path), Some(paint)) = (pb.finish(), self.paint(color)) else {
            return;
        };
        let stroke = Stroke {
            width: width.max(1.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Even-odd fill of a closed polygon.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
            return;
        }
        let mut pb = PathBuilder::with_capacity(points.len() + 1, points.len());
        pb.move_to(points[0].x, points[0].y);
        for p in &points[1..] {
            pb.line_to(p.x, p.y);
        }
        pb.close();
        let (Some(path), Some(paint)) = (pb.finish(), self.paint(color)) else {
            return;
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }

    /// Draws a blocky procedural glyph for `ch` whose cell is `size` pixels tall.
    pub fn fill_glyph(&mut self, ch: char, origin: Vec2, size: f32, color: Rgba) {
        if !(size > 0.0 && size.is_finite() && origin.is_finite()) {
            return;
        }
        let bits = glyph_bits(ch);
        let cell = size / GLYPH_ROWS as f32;
        let mut pb = PathBuilder::new();
        for row in 0..GLYPH_ROWS {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (row * GLYPH_COLS + col)) == 0 {
                    continue;
                }
                let x = origin.x + col as f32 * cell;
                let y = origin.y + row as f32 * cell;
                if let Some(rect) = Rect::from_xywh(x, y, cell.max(1.0), cell.max(1.0)) {
                    pb.push_rect(rect);
                }
            }
        }
        let (Some(path), Some(paint)) = (pb.finish(), self.paint(color)) else {
            return;
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// 35-bit pattern for a 5x7 glyph, mirrored left/right so it reads as a symbol.
fn glyph_bits(ch: char) -> u64 {
    let mut h = (ch as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= h >> 29;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 32;

    let mut bits = 0u64;
    for row in 0..GLYPH_ROWS as u64 {
        let half = (h >> (row * 3)) & 0b111;
        let full = half | ((half & 0b1) << 4) | ((half & 0b10) << 2);
        bits |= full << (row * GLYPH_COLS as u64);
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(actual: u8, expected: u8, tolerance: u8) -> bool {
        actual.abs_diff(expected) <= tolerance
    }

    #[test]
    fn test_rejects_empty_surface() {
        assert!(Canvas::new(0, 100).is_err());
        assert!(Canvas::new(100, 0).is_err());
        assert!(Canvas::new(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_new_canvas_is_opaque_black() {
        let canvas = Canvas::new(4, 3).unwrap();
        assert_eq!(canvas.as_bytes().len(), 4 * 3 * 4);
        assert_eq!(canvas.pixel(3, 2), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_global_alpha_scales_fill() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.set_global_alpha(0.5);
        canvas.fill(Rgba::WHITE);
        let [r, g, b, a] = canvas.pixel(0, 0).unwrap();
        assert!(near(r, 128, 1) && r == g && g == b);
        assert_eq!(a, 255);

        canvas.set_global_alpha(0.0);
        canvas.fill(Rgba::WHITE);
        assert_eq!(canvas.pixel(1, 1).unwrap()[0], r);
    }

    #[test]
    fn test_fill_circle_clips_offscreen() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.fill_circle(Vec2::new(-50.0, -50.0), 5.0, Rgba::WHITE);
        canvas.fill_circle(Vec2::new(5.0, 5.0), 2.0, Rgba::WHITE);
        assert_eq!(canvas.pixel(5, 5), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_fill_polygon_covers_interior() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        let square = [
            Vec2::new(2.0, 2.0),
            Vec2::new(8.0, 2.0),
            Vec2::new(8.0, 8.0),
            Vec2::new(2.0, 8.0),
        ];
        canvas.fill_polygon(&square, Rgba::rgb(1.0, 0.0, 0.0));
        assert_eq!(canvas.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(9, 9), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_polyline_joint_is_composited_once() {
        let mut canvas = Canvas::new(40, 21).unwrap();
        let points = [Vec2::new(2.0, 10.5), Vec2::new(20.0, 10.5), Vec2::new(38.0, 10.5)];
        canvas.stroke_polyline(&points, 4.0, Rgba::WHITE.with_alpha(0.5));

        let mid = canvas.pixel(10, 10).unwrap()[0];
        let joint = canvas.pixel(20, 10).unwrap()[0];
        assert!(near(mid, 128, 2), "mid-segment {mid}");
        assert!(near(joint, mid, 1), "joint {joint} vs mid-segment {mid}");
    }

    #[test]
    fn test_blend_block_respects_global_alpha_and_clips() {
        let mut canvas = Canvas::new(5, 5).unwrap();
        canvas.set_global_alpha(0.25);
        canvas.blend_block(4, 4, 2, Rgba::rgb(1.0, 1.0, 0.0));
        assert_eq!(canvas.pixel(4, 4), Some([64, 64, 0, 255]));
        assert_eq!(canvas.pixel(3, 4), Some([0, 0, 0, 255]));
        canvas.blend_block(-3, -3, 2, Rgba::WHITE);
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.stroke_line(Vec2::new(f32::NAN, 0.0), Vec2::new(4.0, 4.0), 2.0, Rgba::WHITE);
        canvas.fill_circle(Vec2::new(4.0, 4.0), f32::INFINITY, Rgba::WHITE);
        canvas.fill_rect(0.0, 0.0, f32::NAN, 3.0, Rgba::WHITE);
        canvas.blend_block(0, 0, 4, Rgba::WHITE.with_alpha(f32::NAN));
        assert!(canvas.as_bytes().chunks_exact(4).all(|px| px[0] == 0));
    }

    #[test]
    fn test_radial_gradient_interpolates_stops() {
        let mut canvas = Canvas::new(41, 41).unwrap();
        let stops = [(0.0, Rgba::WHITE), (1.0, Rgba::BLACK)];
        canvas.fill_radial_gradient(Vec2::new(20.5, 20.5), 20.0, &stops);

        let center = canvas.pixel(20, 20).unwrap()[0];
        let halfway = canvas.pixel(30, 20).unwrap()[0];
        let edge = canvas.pixel(38, 20).unwrap()[0];
        assert!(center > 245, "center {center}");
        assert!(near(halfway, 128, 12), "halfway {halfway}");
        assert!(edge < halfway);
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_glyphs_are_stable_per_char() {
        let mut a = Canvas::new(14, 14).unwrap();
        let mut b = Canvas::new(14, 14).unwrap();
        a.fill_glyph('7', Vec2::ZERO, 14.0, Rgba::WHITE);
        b.fill_glyph('7', Vec2::ZERO, 14.0, Rgba::WHITE);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert!(a.as_bytes().chunks_exact(4).any(|px| px[1] > 0));
    }
}
