//! Fixed-capacity window of recent head positions and the spline drawn through it.

use std::collections::VecDeque;

use kurbo::{BezPath, Point};

/// FIFO of head positions, oldest first. Pushing past capacity evicts from the front.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<Point>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { points: VecDeque::with_capacity(capacity + 1), capacity }
    }

    pub fn push(&mut self, p: Point) {
        self.points.push_back(p);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Point> + '_ {
        self.points.iter()
    }

    pub fn oldest(&self) -> Option<Point> {
        self.points.front().copied()
    }

    pub fn newest(&self) -> Option<Point> {
        self.points.back().copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Smooth path through the buffer, `None` below two points.
    pub fn smooth_path(&self) -> Option<BezPath> {
        if self.points.len() < 2 {
            return None;
        }
        let (front, back) = self.points.as_slices();
        let pts: Vec<Point> = front.iter().chain(back).copied().collect();
        Some(midpoint_spline(&pts))
    }
}

/// Quadratic spline through `pts`: each interior point is a control point and
/// the curve passes through the midpoints between neighbours, ending with a
/// straight run into the last point. Coincident points yield zero-length
/// segments, never NaN.
pub fn midpoint_spline(pts: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((&first, rest)) = pts.split_first() else {
        return path;
    };
    path.move_to(first);
    if rest.is_empty() {
        return path;
    }
    for pair in pts[1..].windows(2) {
        let (ctrl, next) = (pair[0], pair[1]);
        path.quad_to(ctrl, ctrl.midpoint(next));
    }
    if let Some(&last) = pts.last() {
        path.line_to(last);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn p(i: usize) -> Point {
        Point::new(i as f64, (i * 2) as f64)
    }

    #[test]
    fn length_is_min_of_capacity_and_pushes() {
        let mut t = TrailBuffer::new(5);
        for i in 1..=12 {
            t.push(p(i));
            assert_eq!(t.len(), i.min(5));
        }
    }

    #[test]
    fn keeps_the_newest_points_in_order() {
        let mut t = TrailBuffer::new(18);
        for i in 1..=20 {
            t.push(p(i));
        }
        let kept: Vec<Point> = t.iter().copied().collect();
        let expected: Vec<Point> = (3..=20).map(p).collect();
        assert_eq!(kept, expected);
        assert_eq!(t.oldest(), Some(p(3)));
        assert_eq!(t.newest(), Some(p(20)));
    }

    #[test]
    fn spline_uses_midpoints_and_ends_on_last_point() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let els: Vec<PathEl> = midpoint_spline(&pts).elements().to_vec();
        assert_eq!(
            els,
            vec![
                PathEl::MoveTo(pts[0]),
                PathEl::QuadTo(pts[1], Point::new(10.0, 5.0)),
                PathEl::LineTo(pts[2]),
            ]
        );
    }

    #[test]
    fn two_points_are_a_straight_line() {
        let pts = [Point::new(1.0, 1.0), Point::new(4.0, 5.0)];
        let els: Vec<PathEl> = midpoint_spline(&pts).elements().to_vec();
        assert_eq!(els, vec![PathEl::MoveTo(pts[0]), PathEl::LineTo(pts[1])]);
    }

    #[test]
    fn idle_pointer_path_is_finite() {
        let mut t = TrailBuffer::new(12);
        for _ in 0..12 {
            t.push(Point::new(50.0, 50.0));
        }
        let path = t.smooth_path().unwrap();
        for el in path.elements() {
            let finite = match *el {
                PathEl::MoveTo(a) | PathEl::LineTo(a) => a.is_finite(),
                PathEl::QuadTo(a, b) => a.is_finite() && b.is_finite(),
                _ => false,
            };
            assert!(finite);
        }
    }

    #[test]
    fn fewer_than_two_points_draw_nothing() {
        let mut t = TrailBuffer::new(4);
        assert!(t.smooth_path().is_none());
        t.push(Point::ORIGIN);
        assert!(t.smooth_path().is_none());
    }
}
