//! Polygon collision geometry
//!
//! A polygon's shape is fixed at construction and stored relative to its
//! centre; moving a polygon only moves the centre. Every gameplay collision
//! goes through one of the queries here:
//! - ship vs asteroid: [`Polygon::overlaps_rotated_polygon`]
//! - projectile vs asteroid: [`Polygon::overlaps_circle`]
//!
//! Polygon/polygon overlap is a one-directional vertex test: `a.overlaps_polygon(b)`
//! asks whether any vertex of `b` lies inside `a`. It does not test the reverse
//! direction or edge crossings, so the result is not symmetric.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

use super::bounds::Bounds;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    centre: Vec2,
    points: Vec<Vec2>,
    /// Bounds of `points`, relative to the centre
    local_bounds: Bounds,
}

impl Polygon {
    /// Build a polygon from at least 3 points whose rough centre is the origin
    pub fn new(centre: Vec2, points: Vec<Vec2>) -> SimResult<Self> {
        if points.len() < 3 {
            return Err(SimError::InvalidPolygon {
                points: points.len(),
            });
        }
        let local_bounds = Bounds::enclosing(points.iter().copied())
            .ok_or(SimError::InvalidPolygon { points: 0 })?;
        Ok(Self {
            centre,
            points,
            local_bounds,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// World-space position of the ith vertex
    #[inline]
    pub fn vertex(&self, i: usize) -> Vec2 {
        self.points[i] + self.centre
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().map(move |p| *p + self.centre)
    }

    /// Shape points relative to the centre
    pub fn shape(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn centre(&self) -> Vec2 {
        self.centre
    }

    /// World-space bounding box
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.local_bounds.translated(self.centre)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.centre += delta;
    }

    pub fn move_to(&mut self, centre: Vec2) {
        self.centre = centre;
    }

    /// Even-odd ray cast. Points exactly on an edge may land either side.
    pub fn contains_point(&self, p: Vec2, quick_reject: bool) -> bool {
        // Work in local space instead of offsetting every vertex
        let p = p - self.centre;
        let b = &self.local_bounds;
        if quick_reject && (p.x < b.left || p.y < b.top || p.x > b.right || p.y > b.bottom) {
            return false;
        }

        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// True if every vertex of `other` is inside this polygon
    pub fn contains_polygon(&self, other: &Polygon, quick_reject: bool) -> bool {
        if quick_reject && !self.bounds().intersects(&other.bounds()) {
            return false;
        }
        other.vertices().all(|v| self.contains_point(v, false))
    }

    /// True if at least one vertex of `other` is inside this polygon.
    ///
    /// One-directional: `a.overlaps_polygon(b)` may differ from `b.overlaps_polygon(a)`.
    pub fn overlaps_polygon(&self, other: &Polygon, quick_reject: bool) -> bool {
        if quick_reject && !self.bounds().intersects(&other.bounds()) {
            return false;
        }
        other.vertices().any(|v| self.contains_point(v, false))
    }

    /// Like [`Self::overlaps_polygon`], but each vertex of `other` is first
    /// rotated about `other`'s centre by `other_rotation + π/2`.
    ///
    /// Shapes authored pointing up (-y) then face along `other_rotation`.
    pub fn overlaps_rotated_polygon(
        &self,
        other: &Polygon,
        other_rotation: f32,
        quick_reject: bool,
    ) -> bool {
        let (sin, cos) = (other_rotation + FRAC_PI_2).sin_cos();
        other.shape().iter().any(|local| {
            let rotated = Vec2::new(
                cos * local.x - sin * local.y,
                sin * local.x + cos * local.y,
            );
            self.contains_point(rotated + other.centre, quick_reject)
        })
    }

    /// True if the circle centre is inside, or any edge comes within `radius`
    pub fn overlaps_circle(&self, centre: Vec2, radius: f32, quick_reject: bool) -> bool {
        if quick_reject {
            let circle = Bounds::new(
                centre.x - radius,
                centre.y - radius,
                centre.x + radius,
                centre.y + radius,
            );
            if !self.bounds().intersects(&circle) {
                return false;
            }
        }
        if self.contains_point(centre, false) {
            return true;
        }

        let n = self.points.len();
        (0..n).any(|i| {
            let a = self.vertex(i);
            let b = self.vertex((i + 1) % n);
            closest_point_on_segment(a, b, centre).distance(centre) <= radius
        })
    }
}

/// Closest point to `p` on the segment `a`-`b`
fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    a + seg * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(centre: Vec2, half: f32) -> Polygon {
        Polygon::new(
            centre,
            vec![
                Vec2::new(-half, -half),
                Vec2::new(half, -half),
                Vec2::new(half, half),
                Vec2::new(-half, half),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_degenerate_polygon() {
        let err = Polygon::new(Vec2::ZERO, vec![Vec2::ZERO, Vec2::X]).unwrap_err();
        assert!(matches!(err, SimError::InvalidPolygon { points: 2 }));
    }

    #[test]
    fn test_vertex_and_bounds_follow_centre() {
        let mut poly = square(Vec2::ZERO, 5.0);
        poly.translate(Vec2::new(10.0, 20.0));
        assert_eq!(poly.vertex(0), Vec2::new(5.0, 15.0));
        assert_eq!(poly.bounds(), Bounds::new(5.0, 15.0, 15.0, 25.0));

        poly.move_to(Vec2::new(-1.0, -1.0));
        assert_eq!(poly.centre(), Vec2::new(-1.0, -1.0));
        assert_eq!(poly.shape()[0], Vec2::new(-5.0, -5.0));
    }

    #[test]
    fn test_contains_point() {
        let poly = square(Vec2::new(100.0, 100.0), 10.0);
        assert!(poly.contains_point(Vec2::new(100.0, 100.0), true));
        assert!(poly.contains_point(Vec2::new(105.0, 95.0), false));
        assert!(!poly.contains_point(Vec2::new(120.0, 100.0), true));
        assert!(!poly.contains_point(Vec2::new(120.0, 100.0), false));
    }

    #[test]
    fn test_contains_point_concave() {
        // "U" shape opening upward; the notch is outside
        let poly = Polygon::new(
            Vec2::ZERO,
            vec![
                Vec2::new(-10.0, -10.0),
                Vec2::new(-5.0, -10.0),
                Vec2::new(-5.0, 5.0),
                Vec2::new(5.0, 5.0),
                Vec2::new(5.0, -10.0),
                Vec2::new(10.0, -10.0),
                Vec2::new(10.0, 10.0),
                Vec2::new(-10.0, 10.0),
            ],
        )
        .unwrap();
        assert!(!poly.contains_point(Vec2::new(0.0, -5.0), true));
        assert!(poly.contains_point(Vec2::new(-7.0, -5.0), true));
        assert!(poly.contains_point(Vec2::new(0.0, 8.0), true));
    }

    #[test]
    fn test_contains_polygon() {
        let big = square(Vec2::ZERO, 20.0);
        let small = square(Vec2::new(2.0, 2.0), 5.0);
        let straddling = square(Vec2::new(18.0, 0.0), 5.0);
        assert!(big.contains_polygon(&small, true));
        assert!(!big.contains_polygon(&straddling, true));
        assert!(!small.contains_polygon(&big, true));
    }

    #[test]
    fn test_overlaps_polygon_is_one_directional() {
        // A small square sitting entirely inside a big one: the big square
        // contains the small one's vertices, but none of the big square's
        // vertices are inside the small one.
        let big = square(Vec2::ZERO, 20.0);
        let small = square(Vec2::ZERO, 5.0);
        assert!(big.overlaps_polygon(&small, true));
        assert!(!small.overlaps_polygon(&big, true));
    }

    #[test]
    fn test_overlaps_polygon_quick_reject() {
        let a = square(Vec2::ZERO, 5.0);
        let b = square(Vec2::new(100.0, 0.0), 5.0);
        assert!(!a.overlaps_polygon(&b, true));
        assert!(!a.overlaps_polygon(&b, false));
    }

    #[test]
    fn test_overlaps_rotated_polygon_uses_heading() {
        // A thin needle authored pointing up (-y), 30 long
        let needle = Polygon::new(
            Vec2::ZERO,
            vec![Vec2::new(0.0, -30.0), Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)],
        )
        .unwrap();
        // Target box around where the tip lands at heading 0
        let target = Polygon::new(
            Vec2::new(28.0, 0.0),
            vec![
                Vec2::new(-3.0, -3.0),
                Vec2::new(3.0, -3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(-3.0, 3.0),
            ],
        )
        .unwrap();

        // Heading 0 points the tip along +x, into the target
        assert!(target.overlaps_rotated_polygon(&needle, 0.0, true));
        // Heading π points the tip away
        assert!(!target.overlaps_rotated_polygon(&needle, std::f32::consts::PI, true));
        // Unrotated, the tip points up and misses
        assert!(!target.overlaps_polygon(&needle, true));
    }

    #[test]
    fn test_overlaps_circle() {
        let poly = square(Vec2::ZERO, 10.0);
        // Centre inside
        assert!(poly.overlaps_circle(Vec2::new(1.0, 1.0), 1.0, true));
        // Edge within radius
        assert!(poly.overlaps_circle(Vec2::new(15.0, 0.0), 5.0, true));
        // Corner within radius (closing edge from last vertex to first)
        assert!(poly.overlaps_circle(Vec2::new(-13.0, -13.0), 5.0, true));
        // Too far
        assert!(!poly.overlaps_circle(Vec2::new(16.0, 0.0), 5.0, true));
        assert!(!poly.overlaps_circle(Vec2::new(16.0, 0.0), 5.0, false));
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(-5.0, 3.0)), a);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(15.0, 3.0)), b);
        assert_eq!(closest_point_on_segment(a, a, Vec2::new(1.0, 1.0)), a);
    }
}
