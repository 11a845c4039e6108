//! Asteroid Field - simulation core for an arcade asteroid shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, geometry, world tick)
//! - `scheduler`: Fixed-timestep loop driving updates and draws
//! - `audio`: Sound cue state machine in front of an external player
//! - `telemetry`: Injected observability sink
//! - `settings`: Game and loop configuration

pub mod audio;
pub mod error;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod telemetry;

pub use error::{SimError, SimResult};
pub use scheduler::{LoopState, Scheduler, SchedulerHandle};
pub use settings::{GameConfig, SchedulerConfig};
pub use sim::{InputEvent, World};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Default update period (40 updates per second)
    pub const DEFAULT_UPDATE_PERIOD_MS: u64 = 1000 / 40;
    /// Default draw period (50 frames per second)
    pub const DEFAULT_DRAW_PERIOD_MS: u64 = 1000 / 50;
    /// Reserved cap on catch-up updates between draws (not enforced)
    pub const DEFAULT_MAX_UPDATES_PER_FRAME: u32 = 3;
    /// Poll interval while the loop is paused
    pub const PAUSED_POLL_MS: u64 = 100;

    /// Margin added around the screen to form the world bounds
    pub const WORLD_MARGIN: f32 = 100.0;
    /// Asteroids spawned when the world is initialized
    pub const INITIAL_ASTEROIDS: usize = 3;
    /// Starting value of the spawn probability knob
    pub const INITIAL_SPAWN_PROBABILITY: f32 = 100.0;
    /// Hardest the game gets: one spawn roll in ten succeeds
    pub const MIN_SPAWN_PROBABILITY: f32 = 10.0;
    /// Spawn probability decays by `p / SPAWN_DECAY_DIVISOR` every tick
    pub const SPAWN_DECAY_DIVISOR: f32 = 5000.0;
    /// New asteroids never spawn closer than this to the ship centre
    pub const SPAWN_EXCLUSION_RADIUS: f32 = 130.0;

    /// Ship hull scale applied to the authored outline
    pub const SHIP_SCALE: f32 = 0.4;
    /// Rotation speed while a rotate control is held (6 degrees per tick)
    pub const SHIP_ROTATION_SPEED: f32 = 6.0 * std::f32::consts::PI / 180.0;
    /// Acceleration while thrusting
    pub const SHIP_THRUST: f32 = 0.2;
    /// Ship speed cap (units per tick)
    pub const SHIP_MAX_SPEED: f32 = 15.0;

    /// Projectile radius
    pub const PROJECTILE_RADIUS: f32 = 8.0;
    /// Speed added along the heading on top of the ship velocity
    pub const PROJECTILE_BOOST: f32 = 12.0;

    /// Autopilot re-evaluates its target this often
    pub const AUTOPILOT_TARGET_PERIOD_MS: u64 = 1000;
    /// Autopilot never fires more often than this
    pub const AUTOPILOT_FIRE_PERIOD_MS: u64 = 300;
    /// Width of the "pointing at target" window (10 degrees)
    pub const AUTOPILOT_FOLLOW_MARGIN: f32 = 10.0 * std::f32::consts::PI / 180.0;

    /// Default input queue capacity
    pub const INPUT_QUEUE_CAPACITY: usize = 20;
}

/// Normalize a heading into [0, 2π)
#[inline]
pub fn normalize_heading(mut angle: f32) -> f32 {
    use std::f32::consts::TAU;
    while angle < 0.0 {
        angle += TAU;
    }
    while angle >= TAU {
        angle -= TAU;
    }
    angle
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
