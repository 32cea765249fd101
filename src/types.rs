// Pixel buffers shared by the surface, the presenter and snapshots.

/// What the window shows: one 0x00RRGGBB word per physical pixel.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Reallocate for a new window size; contents are cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }
}

/// Scratch coverage for one stroke, in physical pixels.
/// `coverage` is the anti-aliased pen footprint, `glow` the blurred halo
/// beneath it. Both are max-combined so overlapping segments never double up.
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<f32>,
    pub glow: Vec<f32>,
    dirty: Option<PixelRect>,
}

/// Inclusive-exclusive pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            coverage: vec![0.0; width * height],
            glow: vec![0.0; width * height],
            dirty: None,
        }
    }

    /// Clip a float box to the mask and remember it as touched.
    pub fn touch(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<PixelRect> {
        let clip = |v: f64, max: usize| v.clamp(0.0, max as f64) as usize;
        let rect = PixelRect {
            x0: clip(x0.floor(), self.width),
            y0: clip(y0.floor(), self.height),
            x1: clip(x1.ceil() + 1.0, self.width),
            y1: clip(y1.ceil() + 1.0, self.height),
        };
        if rect.x0 >= rect.x1 || rect.y0 >= rect.y1 {
            return None;
        }
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(rect),
            None => rect,
        });
        Some(rect)
    }

    pub fn dirty(&self) -> Option<PixelRect> {
        self.dirty
    }

    /// Zero only what the last stroke touched.
    pub fn reset(&mut self) {
        if let Some(r) = self.dirty.take() {
            for y in r.y0..r.y1 {
                let row = y * self.width;
                self.coverage[row + r.x0..row + r.x1].fill(0.0);
                self.glow[row + r.x0..row + r.x1].fill(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_clips_to_bounds_and_reset_clears_it() {
        let mut mask = Mask::new(10, 10);
        let r = mask.touch(-5.0, 2.0, 3.2, 40.0).unwrap();
        assert_eq!(r, PixelRect { x0: 0, y0: 2, x1: 5, y1: 10 });
        mask.coverage[2 * 10 + 1] = 1.0;
        mask.reset();
        assert!(mask.coverage.iter().all(|&c| c == 0.0));
        assert!(mask.dirty().is_none());
    }

    #[test]
    fn fully_offscreen_box_is_ignored() {
        let mut mask = Mask::new(4, 4);
        assert!(mask.touch(10.0, 10.0, 12.0, 12.0).is_none());
        assert!(mask.dirty().is_none());
    }
}
