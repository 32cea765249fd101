//! Software RGBA drawing surface for one overlay layer.
//!
//! Callers draw in logical pixels; the surface multiplies by the viewport's
//! scale factor so strokes stay crisp on dense displays. Pixels are stored as
//! premultiplied linear RGBA and composited over the presented frame with
//! source-over in linear light.

use kurbo::{Affine, BezPath, PathEl, Point, Vec2};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, Mask};

/// Largest backing-store side we are willing to allocate.
pub const MAX_SIDE: usize = 16_384;

/// Peak opacity of a glow halo relative to the shape casting it.
const GLOW_PEAK: f32 = 0.6;

/// Curve flattening tolerance in physical pixels.
const FLATTEN_TOLERANCE: f64 = 0.25;

/// Logical size of the drawing area plus its pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self { width, height, scale }
    }

    /// Backing-store size: `ceil(logical * scale)` per side.
    pub fn physical_size(&self) -> Result<(usize, usize)> {
        let Viewport { width, height, scale } = *self;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::surface(format!("invalid scale factor {scale}")));
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::surface(format!("invalid viewport {width}x{height}")));
        }
        let w = (width * scale).ceil();
        let h = (height * scale).ceil();
        if w > MAX_SIDE as f64 || h > MAX_SIDE as f64 {
            return Err(Error::surface(format!("{w}x{h} exceeds {MAX_SIDE} px per side")));
        }
        Ok((w as usize, h as usize))
    }
}

/// Premultiplied linear RGBA.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Premul {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Two-stop linear gradient between `start` and `end` (logical coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub from: Color,
    pub to: Color,
}

impl LinearGradient {
    /// Color at `p`, projected onto the gradient axis and clamped to the stops.
    /// A zero-length axis paints the end stop everywhere.
    pub fn color_at(&self, p: Point) -> Color {
        let axis = self.end - self.start;
        let len2 = axis.hypot2();
        let t = if len2 <= f64::EPSILON {
            1.0
        } else {
            (p - self.start).dot(axis) / len2
        };
        self.from.lerp(self.to, t)
    }
}

/// Pen for [`Surface::stroke_path`]. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub width: f64,
    /// Halo radius in logical px, 0 for none.
    pub glow: f64,
    pub glow_color: Color,
}

pub struct Surface {
    viewport: Viewport,
    width: usize,
    height: usize,
    pixels: Vec<Premul>,
    mask: Mask,
}

impl Surface {
    /// Allocate a transparent surface. Fails for empty, non-finite or oversized viewports.
    pub fn new(viewport: Viewport) -> Result<Self> {
        let (width, height) = viewport.physical_size()?;
        let len = width
            .checked_mul(height)
            .ok_or_else(|| Error::surface("pixel count overflow"))?;
        Ok(Self {
            viewport,
            width,
            height,
            pixels: vec![Premul::default(); len],
            mask: Mask::new(width, height),
        })
    }

    /// Recompute the backing store for a new size or density. Contents are cleared.
    pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
        if viewport == self.viewport {
            return Ok(());
        }
        *self = Surface::new(viewport)?;
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Physical size in pixels.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Premul::default());
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p.a == 0.0)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Premul> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Un-premultiplied sRGB value of a physical pixel.
    pub fn pixel_color(&self, x: usize, y: usize) -> Option<Color> {
        let p = self.pixel(x, y)?;
        if p.a <= 0.0 {
            return Some(Color::rgba(0, 0, 0, 0));
        }
        let lut = GammaLut::shared();
        Some(Color::rgba(
            lut.linear_to_srgb_u8(p.r / p.a),
            lut.linear_to_srgb_u8(p.g / p.a),
            lut.linear_to_srgb_u8(p.b / p.a),
            (p.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ))
    }

    /// Solid disc with an anti-aliased edge.
    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Color, opacity: f64) {
        let s = self.viewport.scale;
        let r = radius * s;
        let alpha = color.alpha_f32() * opacity.clamp(0.0, 1.0) as f32;
        if r <= 0.0 || alpha <= 0.0 {
            return;
        }
        let rgb = GammaLut::shared().color_to_linear(color);
        self.for_each_near(center, r + 1.0, |surface, idx, d| {
            let cov = (r + 0.5 - d).clamp(0.0, 1.0) as f32;
            surface.blend(idx, rgb, cov * alpha);
        });
    }

    /// Circle outline of the given pen width.
    pub fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color) {
        let s = self.viewport.scale;
        let (r, hw) = (radius * s, width * s / 2.0);
        if hw <= 0.0 {
            return;
        }
        let rgb = GammaLut::shared().color_to_linear(color);
        let alpha = color.alpha_f32();
        self.for_each_near(center, r + hw + 1.0, |surface, idx, d| {
            let cov = (hw + 0.5 - (d - r).abs()).clamp(0.0, 1.0) as f32;
            surface.blend(idx, rgb, cov * alpha);
        });
    }

    /// Soft halo around a disc of `radius`, fading over `blur` logical px.
    pub fn glow_circle(&mut self, center: Point, radius: f64, blur: f64, color: Color) {
        let s = self.viewport.scale;
        let (r, blur) = (radius * s, blur * s);
        if blur <= 0.0 {
            return;
        }
        let sigma = blur / 2.0;
        let denom = 2.0 * sigma * sigma;
        let rgb = GammaLut::shared().color_to_linear(color);
        let alpha = color.alpha_f32();
        self.for_each_near(center, r + blur * 1.5, |surface, idx, d| {
            let out = (d - r).max(0.0);
            let w = (-(out * out) / denom).exp() as f32;
            surface.blend(idx, rgb, GLOW_PEAK * w * alpha);
        });
    }

    /// Stroke `path` with a round pen, painting each pixel from `paint`.
    /// The glow, if any, is laid down first in `pen.glow_color`, weighted by
    /// the paint's opacity at that pixel.
    pub fn stroke_path(&mut self, path: &BezPath, pen: Pen, paint: &LinearGradient) {
        let s = self.viewport.scale;
        let hw = pen.width * s / 2.0;
        if hw <= 0.0 {
            return;
        }
        let glow = (pen.glow * s).max(0.0);
        let sigma = glow / 2.0;
        let reach = hw + if glow > 0.0 { glow * 1.5 } else { 0.0 } + 1.0;

        let device = Affine::scale(s) * path.clone();
        let mut segments: Vec<(Point, Point)> = Vec::new();
        let mut cursor: Option<Point> = None;
        let mut subpath_start: Option<Point> = None;
        let mut subpath_drawn = false;
        kurbo::flatten(device.iter(), FLATTEN_TOLERANCE, |el| match el {
            PathEl::MoveTo(p) => {
                if let (Some(start), false) = (subpath_start, subpath_drawn) {
                    segments.push((start, start));
                }
                cursor = Some(p);
                subpath_start = Some(p);
                subpath_drawn = false;
            }
            PathEl::LineTo(p) if p.is_finite() => {
                if let Some(a) = cursor {
                    segments.push((a, p));
                    subpath_drawn = true;
                }
                cursor = Some(p);
            }
            PathEl::ClosePath => {
                if let (Some(a), Some(b)) = (cursor, subpath_start) {
                    segments.push((a, b));
                    subpath_drawn = true;
                    cursor = Some(b);
                }
            }
            _ => {}
        });
        if let (Some(start), false) = (subpath_start, subpath_drawn) {
            segments.push((start, start));
        }

        for &(a, b) in &segments {
            let Some(rect) = self.mask.touch(
                a.x.min(b.x) - reach,
                a.y.min(b.y) - reach,
                a.x.max(b.x) + reach,
                a.y.max(b.y) + reach,
            ) else {
                continue;
            };
            for y in rect.y0..rect.y1 {
                for x in rect.x0..rect.x1 {
                    let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    let d = distance_to_segment(p, a, b);
                    let idx = y * self.width + x;
                    let cov = (hw + 0.5 - d).clamp(0.0, 1.0) as f32;
                    if cov > self.mask.coverage[idx] {
                        self.mask.coverage[idx] = cov;
                    }
                    if glow > 0.0 {
                        let out = (d - hw).max(0.0);
                        let g = GLOW_PEAK * (-(out * out) / (2.0 * sigma * sigma)).exp() as f32;
                        if g > self.mask.glow[idx] {
                            self.mask.glow[idx] = g;
                        }
                    }
                }
            }
        }

        if let Some(rect) = self.mask.dirty() {
            let lut = GammaLut::shared();
            let glow_rgb = lut.color_to_linear(pen.glow_color);
            let glow_alpha = pen.glow_color.alpha_f32();
            for y in rect.y0..rect.y1 {
                for x in rect.x0..rect.x1 {
                    let idx = y * self.width + x;
                    let (cov, g) = (self.mask.coverage[idx], self.mask.glow[idx]);
                    if cov <= 0.0 && g <= 0.0 {
                        continue;
                    }
                    let logical = Point::new((x as f64 + 0.5) / s, (y as f64 + 0.5) / s);
                    let c = paint.color_at(logical);
                    let paint_alpha = c.alpha_f32();
                    if g > 0.0 {
                        self.blend(idx, glow_rgb, g * glow_alpha * paint_alpha);
                    }
                    if cov > 0.0 {
                        self.blend(idx, lut.color_to_linear(c), cov * paint_alpha);
                    }
                }
            }
        }
        self.mask.reset();
    }

    /// Source-over this layer onto a presented frame.
    pub fn composite_onto(&self, fb: &mut FrameBuffer) {
        let lut = GammaLut::shared();
        let w = self.width.min(fb.width);
        let h = self.height.min(fb.height);
        for y in 0..h {
            for x in 0..w {
                let src = self.pixels[y * self.width + x];
                if src.a <= 0.0 {
                    continue;
                }
                let out = &mut fb.pixels[y * fb.width + x];
                let dst = lut.unpack_linear(*out);
                let inv = 1.0 - src.a;
                *out = lut.pack_linear([
                    src.r + dst[0] * inv,
                    src.g + dst[1] * inv,
                    src.b + dst[2] * inv,
                ]);
            }
        }
    }

    #[inline]
    fn blend(&mut self, idx: usize, rgb: [f32; 3], alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let a = alpha.min(1.0);
        let dst = &mut self.pixels[idx];
        let inv = 1.0 - a;
        dst.r = rgb[0] * a + dst.r * inv;
        dst.g = rgb[1] * a + dst.g * inv;
        dst.b = rgb[2] * a + dst.b * inv;
        dst.a = a + dst.a * inv;
    }

    /// Visit pixels whose centers lie within `reach` physical px of `center`
    /// (logical), passing the distance to it.
    fn for_each_near(
        &mut self,
        center: Point,
        reach: f64,
        mut f: impl FnMut(&mut Self, usize, f64),
    ) {
        let c = center.to_vec2() * self.viewport.scale;
        let clip = |v: f64, max: usize| v.clamp(0.0, max as f64) as usize;
        let (x0, x1) = (clip((c.x - reach).floor(), self.width), clip((c.x + reach).ceil(), self.width));
        let (y0, y1) = (clip((c.y - reach).floor(), self.height), clip((c.y + reach).ceil(), self.height));
        for y in y0..y1 {
            for x in x0..x1 {
                let d = (Vec2::new(x as f64 + 0.5, y as f64 + 0.5) - c).hypot();
                if d <= reach {
                    f(self, y * self.width + x, d);
                }
            }
        }
    }
}

/// Distance from `p` to the segment `a..b`; degenerate segments act as points.
fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    let t = if len2 > 0.0 { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
    (p - (a + ab * t)).hypot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::midpoint_spline;

    fn surface(w: f64, h: f64, scale: f64) -> Surface {
        Surface::new(Viewport::new(w, h, scale)).unwrap()
    }

    #[test]
    fn physical_size_follows_scale() {
        let s = surface(100.0, 50.0, 2.0);
        assert_eq!(s.size(), (200, 100));
        assert_eq!(Viewport::new(10.5, 3.0, 1.5).physical_size().unwrap(), (16, 5));
    }

    #[test]
    fn bad_viewports_are_rejected() {
        for vp in [
            Viewport::new(0.0, 10.0, 1.0),
            Viewport::new(10.0, 10.0, 0.0),
            Viewport::new(f64::NAN, 10.0, 1.0),
            Viewport::new(20_000.0, 10.0, 1.0),
        ] {
            assert!(matches!(Surface::new(vp), Err(Error::Surface(_))), "{vp:?}");
        }
    }

    #[test]
    fn resize_reallocates_and_clears() {
        let mut s = surface(20.0, 20.0, 1.0);
        s.fill_circle(Point::new(10.0, 10.0), 3.0, Color::WHITE, 1.0);
        assert!(!s.is_blank());
        s.resize(Viewport::new(20.0, 20.0, 2.0)).unwrap();
        assert_eq!(s.size(), (40, 40));
        assert!(s.is_blank());
    }

    #[test]
    fn disc_is_opaque_inside_and_empty_outside() {
        let mut s = surface(40.0, 40.0, 1.0);
        s.fill_circle(Point::new(20.0, 20.0), 5.0, Color::rgb(255, 0, 0), 1.0);
        assert_eq!(s.pixel_color(20, 20), Some(Color::rgb(255, 0, 0)));
        assert_eq!(s.pixel(30, 20).unwrap().a, 0.0);
    }

    #[test]
    fn opacity_scales_alpha() {
        let mut s = surface(20.0, 20.0, 1.0);
        s.fill_circle(Point::new(10.0, 10.0), 4.0, Color::WHITE, 0.25);
        assert!((s.pixel(10, 10).unwrap().a - 0.25).abs() < 1e-6);
    }

    #[test]
    fn scaled_disc_covers_scaled_pixels() {
        let mut s = surface(20.0, 20.0, 2.0);
        s.fill_circle(Point::new(10.0, 10.0), 4.0, Color::WHITE, 1.0);
        // 4 logical px = 8 physical px from the center at (20, 20)
        assert_eq!(s.pixel(26, 20).unwrap().a, 1.0);
        assert_eq!(s.pixel(30, 20).unwrap().a, 0.0);
    }

    #[test]
    fn ring_leaves_its_center_empty() {
        let mut s = surface(40.0, 40.0, 1.0);
        s.stroke_circle(Point::new(20.0, 20.0), 8.0, 2.0, Color::WHITE);
        assert_eq!(s.pixel(20, 20).unwrap().a, 0.0);
        assert!(s.pixel(27, 19).unwrap().a > 0.9);
    }

    #[test]
    fn gradient_stroke_fades_toward_the_start() {
        let mut s = surface(120.0, 20.0, 1.0);
        let (a, b) = (Point::new(10.0, 10.0), Point::new(110.0, 10.0));
        let theme = Color::rgb(0, 255, 0);
        let paint = LinearGradient { start: a, end: b, from: theme.with_alpha(0.0), to: theme };
        let pen = Pen { width: 4.0, glow: 0.0, glow_color: theme };
        s.stroke_path(&midpoint_spline(&[a, b]), pen, &paint);
        let near_start = s.pixel(15, 10).unwrap().a;
        let middle = s.pixel(60, 10).unwrap().a;
        let near_end = s.pixel(105, 10).unwrap().a;
        assert!(near_start < middle && middle < near_end, "{near_start} {middle} {near_end}");
        assert!(near_end > 0.9);
    }

    #[test]
    fn coincident_points_draw_a_round_dot() {
        let mut s = surface(40.0, 40.0, 1.0);
        let p = Point::new(20.0, 20.0);
        let paint = LinearGradient { start: p, end: p, from: Color::WHITE.with_alpha(0.0), to: Color::WHITE };
        let pen = Pen { width: 6.0, glow: 0.0, glow_color: Color::WHITE };
        s.stroke_path(&midpoint_spline(&[p, p, p]), pen, &paint);
        assert!(s.pixel(20, 20).unwrap().a > 0.99);
        assert!(s.pixels.iter().all(|px| px.a.is_finite() && px.r.is_finite()));
        assert_eq!(s.pixel(30, 20).unwrap().a, 0.0);
    }

    #[test]
    fn glow_reaches_beyond_the_pen() {
        let mut s = surface(60.0, 40.0, 1.0);
        let (a, b) = (Point::new(10.0, 20.0), Point::new(50.0, 20.0));
        let color = Color::rgb(255, 0, 255);
        let paint = LinearGradient { start: a, end: b, from: color, to: color };
        s.stroke_path(&midpoint_spline(&[a, b]), Pen { width: 2.0, glow: 8.0, glow_color: color }, &paint);
        assert!(s.pixel(30, 25).unwrap().a > 0.0);
        assert_eq!(s.pixel(30, 38).unwrap().a, 0.0);
    }

    #[test]
    fn composite_blends_over_backdrop() {
        let mut s = surface(4.0, 4.0, 1.0);
        s.fill_circle(Point::new(2.0, 2.0), 10.0, Color::WHITE, 1.0);
        let mut fb = FrameBuffer::new(4, 4);
        s.composite_onto(&mut fb);
        assert!(fb.pixels.iter().all(|&p| p == 0x00FF_FFFF));

        let blank = surface(4.0, 4.0, 1.0);
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill(0x0012_3456);
        blank.composite_onto(&mut fb);
        assert!(fb.pixels.iter().all(|&p| p == 0x0012_3456));
    }
}
