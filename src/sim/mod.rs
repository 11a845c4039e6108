//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per call, no wall-clock time
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod asteroid;
pub mod autopilot;
pub mod bounds;
pub mod input;
pub mod polygon;
pub mod projectile;
pub mod rng;
pub mod ship;
pub mod snapshot;
pub mod world;

pub use asteroid::{Asteroid, AsteroidSize, random_polygon};
pub use autopilot::Autopilot;
pub use bounds::Bounds;
pub use input::{InputEvent, InputQueue, InputReceiver, InputSender};
pub use polygon::Polygon;
pub use projectile::Projectile;
pub use rng::DeterministicRandom;
pub use ship::{Pilot, ProjectileLaunch, Ship};
pub use snapshot::{AsteroidSnapshot, ProjectileSnapshot, ShipSnapshot, WorldSnapshot};
pub use world::{World, WorldOptions};
