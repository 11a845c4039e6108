//! Axis-aligned rectangles in screen space (y grows downward)

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box holding every point, or `None` for an empty iterator
    pub fn enclosing(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::new(min.x, min.y, max.x, max.y))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn centre(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Same box moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(
            self.left + offset.x,
            self.top + offset.y,
            self.right + offset.x,
            self.bottom + offset.y,
        )
    }

    /// Same box grown by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(
            self.left - margin,
            self.top - margin,
            self.right + margin,
            self.bottom + margin,
        )
    }

    /// Half-open containment: left and top edges are inside, right and bottom are not
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Closed-interval overlap test (touching boxes intersect)
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.left > self.right
            || other.right < self.left
            || other.top > self.bottom
            || other.bottom < self.top)
    }

    /// Strict overlap used for "is it on screen" checks
    #[inline]
    pub fn overlaps_open(&self, other: &Bounds) -> bool {
        other.right > self.left
            && other.left < self.right
            && other.bottom > self.top
            && other.top < self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(Vec2::new(0.0, 0.0)));
        assert!(!b.contains(Vec2::new(10.0, 5.0)));
        assert!(!b.contains(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn test_enclosing_and_expand() {
        let b = Bounds::enclosing([Vec2::new(-1.0, 2.0), Vec2::new(3.0, -4.0)]).unwrap();
        assert_eq!(b, Bounds::new(-1.0, -4.0, 3.0, 2.0));
        assert_eq!(b.expanded(1.0), Bounds::new(-2.0, -5.0, 4.0, 3.0));
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = Bounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&Bounds::new(1.0, 0.0, 2.0, 1.0)));
        assert!(!a.overlaps_open(&Bounds::new(1.0, 0.0, 2.0, 1.0)));
        assert!(!a.intersects(&Bounds::new(1.5, 0.0, 2.0, 1.0)));
    }
}
