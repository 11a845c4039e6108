//! Read-only view of the world between ticks, for renderers and replay checks

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::AsteroidSize;
use super::bounds::Bounds;
use super::world::World;
use crate::error::SimResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSnapshot {
    pub centre: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
    pub alive: bool,
    /// Hull outline with heading applied
    pub vertices: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteroidSnapshot {
    pub id: u32,
    pub size: AsteroidSize,
    pub centre: Vec2,
    pub vertices: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub score: u32,
    pub game_over: bool,
    pub asteroid_spawn_probability: f32,
    pub screen_bounds: Bounds,
    pub ship: ShipSnapshot,
    pub asteroids: Vec<AsteroidSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let ship = &world.ship;
        Self {
            tick: world.tick,
            score: world.score,
            game_over: world.game_over,
            asteroid_spawn_probability: world.asteroid_spawn_probability,
            screen_bounds: world.screen_bounds,
            ship: ShipSnapshot {
                centre: ship.shape.centre(),
                heading: ship.heading,
                velocity: ship.velocity,
                alive: ship.alive,
                vertices: ship.hull_vertices(),
            },
            asteroids: world
                .asteroids
                .iter()
                .map(|a| AsteroidSnapshot {
                    id: a.id,
                    size: a.size,
                    centre: a.shape.centre(),
                    vertices: a.shape.vertices().collect(),
                })
                .collect(),
            projectiles: world
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    position: p.position,
                    radius: p.radius,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
