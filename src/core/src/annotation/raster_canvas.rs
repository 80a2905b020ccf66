use log::trace;

use super::types::{Color, DrawingSurface, Point, Rect, Segment, StrokeStyle};

/// In-memory RGBA raster implementing [`DrawingSurface`].
///
/// Lines are rasterized with Bresenham's algorithm and stamped with a square
/// brush of the stroke width; fills blend source-over.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    visible: bool,
    saved: Option<Vec<Color>>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; (width as usize) * (height as usize)],
            visible: false,
            saved: None,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    /// Number of pixels that are not fully transparent.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0).count()
    }

    pub fn has_checkpoint(&self) -> bool {
        self.saved.is_some()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = self.offset(x as u32, y as u32);
        let src_a = (f32::from(color.a) / 255.0) * alpha.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let dst = self.pixels[index];
        let dst_a = f32::from(dst.a) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        let mix = |s: u8, d: u8| -> u8 {
            if out_a <= 0.0 {
                return 0;
            }
            let v = (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        self.pixels[index] = Color {
            r: mix(color.r, dst.r),
            g: mix(color.g, dst.g),
            b: mix(color.b, dst.b),
            a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        };
    }

    fn stamp(&mut self, x: i64, y: i64, stroke: &StrokeStyle) {
        let size = stroke.width.max(1.0).round() as i64;
        let start = -(size - 1) / 2;
        for dy in start..start + size {
            for dx in start..start + size {
                self.blend(x + dx, y + dy, stroke.color, 1.0);
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, stroke: &StrokeStyle) {
        // Keep a brush-sized margin so strokes entering from off-canvas still
        // cover the edge pixels.
        let pad = stroke.width.max(1.0).round();
        let min = Point::new(-pad, -pad);
        let max = Point::new(f64::from(self.width) - 1.0 + pad, f64::from(self.height) - 1.0 + pad);
        let Some((from, to)) = clip_segment(from, to, min, max) else {
            return;
        };
        let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
        let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0, stroke);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

/// Liang-Barsky clip of `from -> to` against the box `[min, max]`.
///
/// Returns `None` when the segment misses the box or has a non-finite
/// coordinate.
fn clip_segment(from: Point, to: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, from.x - min.x),
        (dx, max.x - from.x),
        (-dy, from.y - min.y),
        (dy, max.y - from.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        Point::new(from.x + t0 * dx, from.y + t0 * dy),
        Point::new(from.x + t1 * dx, from.y + t1 * dy),
    ))
}

impl DrawingSurface for RasterCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        trace!("Resizing canvas to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.pixels = vec![Color::TRANSPARENT; (width as usize) * (height as usize)];
        self.saved = None;
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn stroke_segments(&mut self, segments: &[Segment], stroke: &StrokeStyle) {
        for segment in segments {
            self.line(segment.from, segment.to, stroke);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        let [a, b, c, d] = rect.corners();
        let edges = [
            Segment { from: a, to: b },
            Segment { from: b, to: c },
            Segment { from: c, to: d },
            Segment { from: d, to: a },
        ];
        self.stroke_segments(&edges, stroke);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f32) {
        let r = rect.normalized();
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let x0 = (r.x.round() as i64).clamp(0, w);
        let y0 = (r.y.round() as i64).clamp(0, h);
        let x1 = ((r.x + r.width).round() as i64).clamp(0, w);
        let y1 = ((r.y + r.height).round() as i64).clamp(0, h);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, alpha);
            }
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(Color::TRANSPARENT);
    }

    fn checkpoint(&mut self) {
        self.saved = Some(self.pixels.clone());
    }

    fn rollback(&mut self) {
        if let Some(saved) = &self.saved {
            self.pixels.copy_from_slice(saved);
        }
    }

    fn discard_checkpoint(&mut self) {
        self.saved = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: f64) -> StrokeStyle {
        StrokeStyle {
            color: Color::BLACK,
            width,
        }
    }

    #[test]
    fn horizontal_line_paints_every_pixel_between_endpoints() {
        let mut canvas = RasterCanvas::new(20, 5);
        canvas.stroke_segments(
            &[Segment {
                from: Point::new(2.0, 2.0),
                to: Point::new(12.0, 2.0),
            }],
            &black(1.0),
        );
        assert_eq!(canvas.painted_pixels(), 11);
        assert_eq!(canvas.pixel(7, 2), Some(Color::BLACK));
        assert_eq!(canvas.pixel(7, 3), Some(Color::TRANSPARENT));
    }

    #[test]
    fn thick_strokes_use_a_square_brush() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.stroke_segments(
            &[Segment {
                from: Point::new(5.0, 5.0),
                to: Point::new(5.0, 5.0),
            }],
            &black(3.0),
        );
        assert_eq!(canvas.painted_pixels(), 9);
    }

    #[test]
    fn highlight_fill_blends_at_reduced_alpha() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_rect(
            Rect::from_corners(Point::new(8.0, 8.0), Point::new(2.0, 2.0)),
            Color::RED,
            0.3,
        );
        assert_eq!(canvas.painted_pixels(), 36);
        let p = canvas.pixel(4, 4).unwrap();
        assert_eq!((p.r, p.g, p.b), (255, 0, 0));
        assert_eq!(p.a, 77);
    }

    #[test]
    fn rollback_restores_checkpointed_pixels() {
        let mut canvas = RasterCanvas::new(30, 30);
        canvas.checkpoint();
        canvas.stroke_rect(
            Rect::from_corners(Point::new(1.0, 1.0), Point::new(20.0, 20.0)),
            &black(1.0),
        );
        assert!(canvas.painted_pixels() > 0);
        canvas.rollback();
        assert_eq!(canvas.painted_pixels(), 0);
        assert!(canvas.has_checkpoint());
        canvas.discard_checkpoint();
        assert!(!canvas.has_checkpoint());
    }

    #[test]
    fn out_of_bounds_drawing_is_clipped() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.stroke_segments(
            &[Segment {
                from: Point::new(-10.0, 1.0),
                to: Point::new(10.0, 1.0),
            }],
            &black(1.0),
        );
        assert_eq!(canvas.painted_pixels(), 4);
        assert_eq!(canvas.pixel(4, 1), None);
    }

    #[test]
    fn far_away_endpoints_only_rasterize_the_visible_part() {
        let mut canvas = RasterCanvas::new(8, 8);
        canvas.stroke_segments(
            &[
                Segment {
                    from: Point::new(1.0, 1.0),
                    to: Point::new(1e9, 1.0),
                },
                Segment {
                    from: Point::new(-1e12, -1e12),
                    to: Point::new(1e12, 1e12),
                },
            ],
            &black(1.0),
        );
        // 7 pixels on row 1 plus the 8 diagonal ones, sharing (1, 1).
        assert_eq!(canvas.painted_pixels(), 14);
        assert_eq!(canvas.pixel(7, 1), Some(Color::BLACK));
        assert_eq!(canvas.pixel(7, 7), Some(Color::BLACK));
        assert_eq!(canvas.pixel(0, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn segments_missing_the_canvas_paint_nothing() {
        let mut canvas = RasterCanvas::new(8, 8);
        canvas.stroke_segments(
            &[
                Segment {
                    from: Point::new(100.0, 100.0),
                    to: Point::new(200.0, 3e9),
                },
                Segment {
                    from: Point::new(f64::NAN, 2.0),
                    to: Point::new(4.0, 2.0),
                },
                Segment {
                    from: Point::new(2.0, f64::INFINITY),
                    to: Point::new(2.0, 2.0),
                },
            ],
            &black(3.0),
        );
        assert_eq!(canvas.painted_pixels(), 0);
    }

    #[test]
    fn huge_fill_is_bounded_by_the_canvas() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.fill_rect(
            Rect::from_corners(Point::new(-1e15, -1e15), Point::new(1e15, 1e15)),
            Color::RED,
            0.3,
        );
        assert_eq!(canvas.painted_pixels(), 16);
    }

    #[test]
    fn resize_discards_pixels() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.fill_rect(
            Rect::from_corners(Point::new(0.0, 0.0), Point::new(4.0, 4.0)),
            Color::BLACK,
            1.0,
        );
        canvas.resize(8, 6);
        assert_eq!(canvas.dimensions(), (8, 6));
        assert_eq!(canvas.painted_pixels(), 0);
    }
}
