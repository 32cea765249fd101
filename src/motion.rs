//! Pointer sampling and head smoothing.

use kurbo::Point;

/// Latest pointer position. Every event overwrites the previous one;
/// positions between two frames are not kept.
#[derive(Debug, Default, Clone)]
pub struct InputSampler {
    latest: Option<Point>,
}

impl InputSampler {
    pub fn record(&mut self, p: Point) {
        self.latest = Some(p);
    }

    pub fn latest(&self) -> Option<Point> {
        self.latest
    }
}

/// Exponential low-pass on the head position:
/// `head' = head + (target - head) * k`.
///
/// The head is undefined until the first pointer sample, which it adopts
/// exactly so the trail does not fly in from the origin.
#[derive(Debug, Clone)]
pub struct MotionIntegrator {
    head: Option<Point>,
    smoothing: f64,
}

impl MotionIntegrator {
    pub fn new(smoothing: f64) -> Self {
        Self { head: None, smoothing }
    }

    /// Snap to `p` if this is the first sample. Returns true on that transition.
    pub fn observe(&mut self, p: Point) -> bool {
        if self.head.is_some() {
            return false;
        }
        self.head = Some(p);
        true
    }

    /// Ease the head one frame toward `target`. No-op while inactive.
    pub fn advance(&mut self, target: Point) -> Option<Point> {
        let head = self.head.as_mut()?;
        *head += (target - *head) * self.smoothing;
        Some(*head)
    }

    pub fn head(&self) -> Option<Point> {
        self.head
    }

    pub fn is_active(&self) -> bool {
        self.head.is_some()
    }
}
