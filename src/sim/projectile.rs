//! Projectiles fired by the ship

use glam::Vec2;

use super::asteroid::Asteroid;
use super::bounds::Bounds;
use crate::consts::PROJECTILE_RADIUS;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub alive: bool,
}

impl Projectile {
    pub fn new(id: u32, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
            radius: PROJECTILE_RADIUS,
            alive: true,
        }
    }

    /// Move one tick and look for a hit.
    ///
    /// Returns the index of the first live asteroid struck, in iteration order.
    /// A projectile that hits something or leaves `world_bounds` is no longer alive.
    pub fn update(&mut self, world_bounds: &Bounds, asteroids: &[Asteroid]) -> Option<usize> {
        self.position += self.velocity;

        if !world_bounds.contains(self.position) {
            self.alive = false;
            return None;
        }

        let hit = asteroids.iter().position(|asteroid| {
            asteroid.alive
                && asteroid
                    .shape
                    .overlaps_circle(self.position, self.radius, true)
        });
        if hit.is_some() {
            self.alive = false;
        }
        hit
    }
}
