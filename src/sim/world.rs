//! The game world
//!
//! Owns every entity and advances them one fixed tick at a time. All
//! randomness comes from the world's own [`DeterministicRandom`], so a seed
//! plus an input sequence fully determines a game.

use glam::Vec2;
use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_4;
use std::sync::Arc;

use super::asteroid::{Asteroid, AsteroidSize};
use super::autopilot::Autopilot;
use super::bounds::Bounds;
use super::input::{InputEvent, InputReceiver};
use super::projectile::Projectile;
use super::rng::DeterministicRandom;
use super::ship::{Pilot, Ship};
use super::snapshot::WorldSnapshot;
use crate::audio::{AudioController, SoundPlayer};
use crate::consts::*;
use crate::direction;
use crate::error::SimResult;
use crate::scheduler::UpdateSubscriber;
use crate::telemetry::{Telemetry, TelemetryEvent};

/// Edge spawns give up after this many positions too close to the ship
const SPAWN_ATTEMPTS: usize = 100;

/// Heading range in degrees, `[start, end)`, for spawns on the left, top,
/// right and bottom edges
const SPAWN_HEADINGS: [(f32, f32); 4] = [(-67.5, 67.5), (67.5, 157.5), (67.5, 247.5), (157.5, 337.5)];

/// Construction parameters for a [`World`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldOptions {
    pub seed: u64,
    pub autopilot: bool,
    pub audio_enabled: bool,
    /// 0.0 - 1.0
    pub master_volume: f32,
    /// Used to convert the autopilot's timings into ticks
    pub update_period_ms: u64,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            autopilot: false,
            audio_enabled: true,
            master_volume: 1.0,
            update_period_ms: DEFAULT_UPDATE_PERIOD_MS,
        }
    }
}

pub struct World {
    pub screen_bounds: Bounds,
    /// Screen plus margin; asteroids and projectiles outside it are gone
    pub world_bounds: Bounds,
    pub ship: Ship,
    pub asteroids: Vec<Asteroid>,
    pub projectiles: Vec<Projectile>,
    pub score: u32,
    /// Lower means more frequent spawns; decays towards `MIN_SPAWN_PROBABILITY`
    pub asteroid_spawn_probability: f32,
    pub game_over: bool,
    /// Ticks advanced so far
    pub tick: u64,

    rng: DeterministicRandom,
    next_id: u32,
    input: InputReceiver,
    /// Autopilot decisions, applied before external input on the next tick
    pending: VecDeque<InputEvent>,
    audio: AudioController,
    telemetry: Arc<dyn Telemetry>,
    on_game_end: Option<Box<dyn FnOnce(u32) + Send>>,
    initialized: bool,
}

impl World {
    pub fn new(
        options: WorldOptions,
        input: InputReceiver,
        telemetry: Arc<dyn Telemetry>,
        sound: Box<dyn SoundPlayer>,
    ) -> SimResult<Self> {
        let pilot = if options.autopilot {
            Pilot::Autopilot(Autopilot::new(options.update_period_ms))
        } else {
            Pilot::Human
        };
        let mut audio = AudioController::new(sound, options.audio_enabled);
        audio.set_master_volume(options.master_volume);
        Ok(Self {
            screen_bounds: Bounds::default(),
            world_bounds: Bounds::default(),
            ship: Ship::new(Vec2::ZERO, pilot)?,
            asteroids: Vec::new(),
            projectiles: Vec::new(),
            score: 0,
            asteroid_spawn_probability: INITIAL_SPAWN_PROBABILITY,
            game_over: false,
            tick: 0,
            rng: DeterministicRandom::new(options.seed),
            next_id: 0,
            input,
            pending: VecDeque::new(),
            audio,
            telemetry,
            on_game_end: None,
            initialized: false,
        })
    }

    /// Register the observer told the final score when a human game ends
    pub fn set_on_game_end(&mut self, observer: impl FnOnce(u32) + Send + 'static) {
        self.on_game_end = Some(Box::new(observer));
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Place the ship at the centre of `screen` and seed the first asteroids.
    /// Ticks before this call do nothing; later calls are ignored.
    pub fn initialize(&mut self, screen: Bounds) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.screen_bounds = screen;
        self.world_bounds = screen.expanded(WORLD_MARGIN);
        self.ship.shape.move_to(screen.centre());
        self.initialized = true;

        for _ in 0..INITIAL_ASTEROIDS {
            self.spawn_asteroid_at_edge()?;
        }
        Ok(())
    }

    /// Advance the world by one tick
    pub fn tick(&mut self) -> SimResult<()> {
        if !self.initialized {
            return Ok(());
        }

        // Input: autopilot decisions first, then external events, both FIFO
        let external: Vec<InputEvent> = self.input.drain().collect();
        let events: Vec<InputEvent> = self.pending.drain(..).chain(external).collect();
        for event in events {
            self.dispatch(event);
        }

        if self.game_over {
            return Ok(());
        }
        self.tick += 1;

        // Ship
        self.ship.update(&self.screen_bounds, &self.asteroids);
        if !self.ship.alive {
            if self.ship.is_autopilot() {
                self.ship.alive = true;
                self.telemetry.record(TelemetryEvent::ShipHit { revived: true });
            } else {
                self.telemetry.record(TelemetryEvent::ShipHit { revived: false });
                self.finish_game();
                return Ok(());
            }
        }
        self.run_autopilot();

        // Projectiles
        for i in 0..self.projectiles.len() {
            if let Some(hit) = self.projectiles[i].update(&self.world_bounds, &self.asteroids) {
                self.destroy_asteroid(hit)?;
            }
        }
        self.projectiles.retain(|p| p.alive);

        // Asteroids
        for asteroid in self.asteroids.iter_mut().filter(|a| a.alive) {
            asteroid.update(&self.world_bounds);
            if !asteroid.alive {
                self.telemetry
                    .record(TelemetryEvent::AsteroidDespawned { id: asteroid.id });
            }
        }
        self.asteroids.retain(|a| a.alive);

        // Spawning and difficulty
        let roll = self
            .rng
            .next_int(0, self.asteroid_spawn_probability.floor() as i32)?;
        if roll == 0 {
            self.spawn_asteroid_at_edge()?;
        }
        let p = self.asteroid_spawn_probability;
        self.asteroid_spawn_probability = (p - p / SPAWN_DECAY_DIVISOR).max(MIN_SPAWN_PROBABILITY);

        Ok(())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }

    /// Add an asteroid with a fresh random outline. Returns its id.
    pub fn spawn_asteroid(
        &mut self,
        size: AsteroidSize,
        centre: Vec2,
        velocity: Vec2,
    ) -> SimResult<u32> {
        self.add_asteroid(size, centre, velocity, false)
    }

    /// Spawn a random-sized asteroid on a random edge of the world, heading
    /// inward and clear of the ship. Returns `None` if no clear spot was found.
    pub fn spawn_asteroid_at_edge(&mut self) -> SimResult<Option<u32>> {
        let ship_centre = self.ship.shape.centre();
        for _ in 0..SPAWN_ATTEMPTS {
            let (position, heading) = self.random_edge_point()?;
            if too_close_to_ship(position, ship_centre) {
                continue;
            }
            let size = AsteroidSize::random(&mut self.rng)?;
            let velocity = direction(heading) * size.speed();
            return self.add_asteroid(size, position, velocity, false).map(Some);
        }
        self.telemetry.record(TelemetryEvent::AsteroidSpawnSkipped);
        Ok(None)
    }

    /// A point on a world edge and a heading from that edge's range. Points
    /// on the right and bottom edges lie on the excluded side of the bounds;
    /// the first move carries them inside unless the heading points outward,
    /// in which case they despawn on that tick.
    fn random_edge_point(&mut self) -> SimResult<(Vec2, f32)> {
        let b = self.world_bounds;
        let edge = self.rng.next_int(0, 4)? as usize;
        let position = match edge {
            0 => Vec2::new(b.left, self.rng.next_float(b.top, b.bottom)?),
            1 => Vec2::new(self.rng.next_float(b.left, b.right)?, b.top),
            2 => Vec2::new(b.right, self.rng.next_float(b.top, b.bottom)?),
            _ => Vec2::new(self.rng.next_float(b.left, b.right)?, b.bottom),
        };
        let (start, end) = SPAWN_HEADINGS[edge];
        let heading = self.rng.next_float(start, end)?.to_radians();
        Ok((position, heading))
    }

    fn add_asteroid(
        &mut self,
        size: AsteroidSize,
        centre: Vec2,
        velocity: Vec2,
        split: bool,
    ) -> SimResult<u32> {
        let id = self.allocate_id();
        let asteroid = Asteroid::new(id, &mut self.rng, centre, size, velocity)?;
        self.asteroids.push(asteroid);
        self.telemetry
            .record(TelemetryEvent::AsteroidSpawned { id, size, split });
        Ok(id)
    }

    /// Score the asteroid at `index` and break it into smaller pieces
    fn destroy_asteroid(&mut self, index: usize) -> SimResult<()> {
        let parent = &mut self.asteroids[index];
        parent.alive = false;
        let (id, size, centre, velocity) =
            (parent.id, parent.size, parent.shape.centre(), parent.velocity);

        self.score += 1;
        self.telemetry.record(TelemetryEvent::AsteroidDestroyed {
            id,
            size,
            score: self.score,
        });
        self.audio.on_asteroid_destroyed();

        let Some(child_size) = size.smaller() else {
            return Ok(());
        };

        let count = if self.rng.next_int(0, 6)? == 0 { 3 } else { 2 };
        let parent_heading = velocity.y.atan2(velocity.x) as f64;
        for i in 0..count {
            // Children alternate between the parent's velocity and a new one
            let child_velocity = if i % 2 == 0 {
                velocity
            } else {
                let offset = self.rng.next_double(-FRAC_PI_4, FRAC_PI_4)?;
                direction((parent_heading + offset) as f32) * child_size.speed()
            };
            self.add_asteroid(child_size, centre, child_velocity, true)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: InputEvent) {
        self.audio.handle_input(event);
        if self.game_over {
            return;
        }
        if let Some(launch) = self.ship.handle_input(event) {
            let id = self.allocate_id();
            self.projectiles
                .push(Projectile::new(id, launch.position, launch.velocity));
            self.telemetry.record(TelemetryEvent::ProjectileFired { id });
        }
    }

    fn run_autopilot(&mut self) {
        let centre = self.ship.shape.centre();
        let heading = self.ship.heading;
        if let Pilot::Autopilot(pilot) = &mut self.ship.pilot {
            pilot.decide(
                self.tick,
                centre,
                heading,
                &self.asteroids,
                &self.screen_bounds,
                &mut self.pending,
            );
        }
    }

    /// Freeze everything in place and report the final score. Runs once.
    fn finish_game(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;

        self.ship.velocity = Vec2::ZERO;
        self.ship.acceleration = 0.0;
        self.ship.angular_velocity = 0.0;
        for asteroid in &mut self.asteroids {
            asteroid.velocity = Vec2::ZERO;
        }
        for projectile in &mut self.projectiles {
            projectile.velocity = Vec2::ZERO;
        }

        self.telemetry.record(TelemetryEvent::GameEnded {
            score: self.score,
            tick: self.tick,
        });
        if let Some(observer) = self.on_game_end.take() {
            observer(self.score);
        }
        self.audio.release();
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Edge spawns this close to the ship are re-rolled
fn too_close_to_ship(position: Vec2, ship_centre: Vec2) -> bool {
    position.distance(ship_centre) <= SPAWN_EXCLUSION_RADIUS
}

impl UpdateSubscriber for World {
    fn on_update(&mut self) -> SimResult<()> {
        self.tick()
    }
}
