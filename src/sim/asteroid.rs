//! Asteroids: randomly shaped rocks that drift in a straight line until they
//! leave the world or get shot.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::bounds::Bounds;
use super::polygon::Polygon;
use super::rng::DeterministicRandom;
use crate::error::SimResult;

/// Asteroid size class. Smaller asteroids are lighter and faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    /// Lower bound on the distance of any outline point from the centre
    pub fn min_internal_radius(self) -> f32 {
        match self {
            AsteroidSize::Small => 20.0,
            AsteroidSize::Medium => 30.0,
            AsteroidSize::Large => 60.0,
        }
    }

    /// Upper bound on the distance of any outline point from the centre
    pub fn max_external_radius(self) -> f32 {
        match self {
            AsteroidSize::Small => 40.0,
            AsteroidSize::Medium => 70.0,
            AsteroidSize::Large => 90.0,
        }
    }

    pub fn mass(self) -> f32 {
        match self {
            AsteroidSize::Small => 52.0,
            AsteroidSize::Medium => 134.0,
            AsteroidSize::Large => 234.0,
        }
    }

    /// Travel speed in units per tick
    pub fn speed(self) -> f32 {
        200.0 / self.mass()
    }

    /// The size fragments take when this asteroid is destroyed
    pub fn smaller(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Small => None,
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Large => Some(AsteroidSize::Medium),
        }
    }

    /// Pick a size for a freshly spawned asteroid: 1/2 small, 1/4 medium, 1/4 large
    pub fn random(rng: &mut DeterministicRandom) -> SimResult<Self> {
        Ok(match rng.next_int(0, 4)? {
            0 | 1 => AsteroidSize::Small,
            2 => AsteroidSize::Medium,
            3 => AsteroidSize::Large,
            roll => unreachable!("size roll {roll} outside [0, 4)"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub id: u32,
    pub shape: Polygon,
    pub velocity: Vec2,
    pub size: AsteroidSize,
    pub alive: bool,
}

impl Asteroid {
    pub fn new(
        id: u32,
        rng: &mut DeterministicRandom,
        centre: Vec2,
        size: AsteroidSize,
        velocity: Vec2,
    ) -> SimResult<Self> {
        let shape = random_polygon(
            rng,
            centre,
            size.min_internal_radius() as f64,
            size.max_external_radius() as f64,
        )?;
        Ok(Self {
            id,
            shape,
            velocity,
            size,
            alive: true,
        })
    }

    /// Drift one tick; leaving `world_bounds` takes the asteroid out of play
    pub fn update(&mut self, world_bounds: &Bounds) {
        self.shape.translate(self.velocity);
        if !world_bounds.contains(self.shape.centre()) {
            self.alive = false;
        }
    }
}

/// Generate a star-shaped outline around `centre`.
///
/// Points are laid out at strictly increasing angles, so the outline may be
/// concave but never folds back over itself.
pub fn random_polygon(
    rng: &mut DeterministicRandom,
    centre: Vec2,
    min_radius: f64,
    max_radius: f64,
) -> SimResult<Polygon> {
    let mut points = vec![Vec2::new(rng.next_double(min_radius, max_radius)? as f32, 0.0)];

    let mut angle = random_step(rng)?;
    while angle < TAU {
        let radius = rng.next_double(min_radius, max_radius)?;
        points.push(Vec2::new(
            (radius * angle.cos()) as f32,
            (radius * angle.sin()) as f32,
        ));
        angle += random_step(rng)?;
    }

    Polygon::new(centre, points)
}

fn random_step(rng: &mut DeterministicRandom) -> SimResult<f64> {
    rng.next_double(PI / 16.0, PI / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_size_table() {
        assert_eq!(AsteroidSize::Large.smaller(), Some(AsteroidSize::Medium));
        assert_eq!(AsteroidSize::Medium.smaller(), Some(AsteroidSize::Small));
        assert_eq!(AsteroidSize::Small.smaller(), None);
        assert!((AsteroidSize::Small.speed() - 200.0 / 52.0).abs() < 1e-6);
        assert!(AsteroidSize::Small.speed() > AsteroidSize::Large.speed());
    }

    #[test]
    fn test_leaves_world_bounds() {
        let mut rng = DeterministicRandom::new(3);
        let world = Bounds::new(-100.0, -100.0, 100.0, 100.0);
        let mut asteroid = Asteroid::new(
            1,
            &mut rng,
            Vec2::new(95.0, 0.0),
            AsteroidSize::Small,
            Vec2::new(4.0, 0.0),
        )
        .unwrap();

        asteroid.update(&world);
        assert!(asteroid.alive);
        assert_eq!(asteroid.shape.centre(), Vec2::new(99.0, 0.0));

        asteroid.update(&world);
        assert!(!asteroid.alive);
    }

    #[test]
    fn test_random_size_distribution_covers_all_sizes() {
        let mut rng = DeterministicRandom::new(11);
        let mut counts = [0u32; 3];
        for _ in 0..4000 {
            match AsteroidSize::random(&mut rng).unwrap() {
                AsteroidSize::Small => counts[0] += 1,
                AsteroidSize::Medium => counts[1] += 1,
                AsteroidSize::Large => counts[2] += 1,
            }
        }
        // Expected 2000 / 1000 / 1000
        assert!((1800..2200).contains(&counts[0]), "{counts:?}");
        assert!((850..1150).contains(&counts[1]), "{counts:?}");
        assert!((850..1150).contains(&counts[2]), "{counts:?}");
    }

    proptest! {
        #[test]
        fn outline_respects_radius_limits(seed in any::<u64>()) {
            let mut rng = DeterministicRandom::new(seed);
            let size = AsteroidSize::Medium;
            let poly = random_polygon(
                &mut rng,
                Vec2::ZERO,
                size.min_internal_radius() as f64,
                size.max_external_radius() as f64,
            ).unwrap();

            prop_assert!(poly.vertex_count() >= 7);
            for p in poly.shape() {
                let r = p.length();
                prop_assert!(r >= size.min_internal_radius() - 1e-3);
                prop_assert!(r <= size.max_external_radius() + 1e-3);
            }
            // Star-shaped around the centre, so the centre is inside
            prop_assert!(poly.contains_point(Vec2::ZERO, true));
        }
    }
}
