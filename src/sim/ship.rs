//! The player's ship
//!
//! The ship is steered by discrete control events and is the one entity that
//! wraps around the screen instead of leaving the world.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

use super::asteroid::Asteroid;
use super::autopilot::Autopilot;
use super::bounds::Bounds;
use super::input::InputEvent;
use super::polygon::Polygon;
use crate::consts::*;
use crate::error::SimResult;
use crate::{direction, normalize_heading};

/// Hull outline authored pointing up (-y), clockwise, before scaling
const HULL: [(f32, f32); 16] = [
    (1.0, -138.0),
    (50.0, -25.0),
    (66.0, -25.0),
    (66.0, -5.0),
    (59.0, -5.0),
    (117.0, 129.0),
    (60.5, 129.0),
    (60.5, 137.0),
    (-60.5, 137.0),
    (-60.5, 129.0),
    (-117.0, 129.0),
    (-59.0, -5.0),
    (-66.0, -5.0),
    (-66.0, -25.0),
    (-50.0, -25.0),
    (-1.0, -138.0),
];

/// Who is flying the ship
#[derive(Debug, Clone)]
pub enum Pilot {
    Human,
    Autopilot(Autopilot),
}

/// Where and how fast a newly fired projectile starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone)]
pub struct Ship {
    /// Hull, stored unrotated; `heading` is applied at collision and render time
    pub shape: Polygon,
    pub velocity: Vec2,
    pub acceleration: f32,
    /// Radians in [0, 2π); 0 faces +x, π/2 faces down the screen
    pub heading: f32,
    /// Radians per tick
    pub angular_velocity: f32,
    pub alive: bool,
    pub pilot: Pilot,
}

impl Ship {
    /// A stationary ship at `centre`, pointing up the screen
    pub fn new(centre: Vec2, pilot: Pilot) -> SimResult<Self> {
        let points = HULL
            .iter()
            .map(|&(x, y)| Vec2::new(x, y) * SHIP_SCALE)
            .collect();
        Ok(Self {
            shape: Polygon::new(centre, points)?,
            velocity: Vec2::ZERO,
            acceleration: 0.0,
            heading: 3.0 * FRAC_PI_2,
            angular_velocity: 0.0,
            alive: true,
            pilot,
        })
    }

    pub fn is_autopilot(&self) -> bool {
        matches!(self.pilot, Pilot::Autopilot(_))
    }

    /// Apply a control event. Returns a launch request when the event fires a projectile.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<ProjectileLaunch> {
        match event {
            InputEvent::RotateLeftStart => self.angular_velocity = -SHIP_ROTATION_SPEED,
            InputEvent::RotateRightStart => self.angular_velocity = SHIP_ROTATION_SPEED,
            InputEvent::RotateStop => self.angular_velocity = 0.0,
            InputEvent::ThrustStart => self.acceleration = SHIP_THRUST,
            InputEvent::ThrustStop => self.acceleration = 0.0,
            InputEvent::Fire => return Some(self.launch()),
            InputEvent::ToggleAudioMute => {}
        }
        None
    }

    /// Projectile starting at the nose, moving with the ship plus a forward boost
    pub fn launch(&self) -> ProjectileLaunch {
        let bounds = self.shape.bounds();
        let forward = direction(self.heading);
        ProjectileLaunch {
            position: bounds.centre() + forward * (bounds.height() / 2.0),
            velocity: self.velocity + forward * PROJECTILE_BOOST,
        }
    }

    /// Advance one tick: rotate, accelerate, move, wrap, then check for asteroid hits
    pub fn update(&mut self, screen: &Bounds, asteroids: &[Asteroid]) {
        self.heading = normalize_heading(self.heading + self.angular_velocity);

        self.velocity += direction(self.heading) * self.acceleration;
        self.velocity = self.velocity.clamp_length_max(SHIP_MAX_SPEED);

        self.shape.translate(self.velocity);
        self.wrap(screen);

        if asteroids.iter().any(|asteroid| {
            asteroid
                .shape
                .overlaps_rotated_polygon(&self.shape, self.heading, true)
        }) {
            self.alive = false;
        }
    }

    /// Once the hull is entirely off one side of the screen, move it to the other side
    fn wrap(&mut self, screen: &Bounds) {
        let bounds = self.shape.bounds();
        let centre = self.shape.centre();

        let x = if screen.left - bounds.right > 0.0 {
            screen.right - (screen.left - bounds.right)
        } else if screen.right - bounds.left < 0.0 {
            screen.left + (bounds.left - screen.right)
        } else {
            centre.x
        };
        let y = if screen.top - bounds.bottom > 0.0 {
            screen.bottom - (screen.top - bounds.bottom)
        } else if screen.bottom - bounds.top < 0.0 {
            screen.top + (bounds.top - screen.bottom)
        } else {
            centre.y
        };

        if x != centre.x || y != centre.y {
            self.shape.move_to(Vec2::new(x, y));
        }
    }

    /// Hull vertices in world space with `heading` applied
    pub fn hull_vertices(&self) -> Vec<Vec2> {
        let (sin, cos) = (self.heading + FRAC_PI_2).sin_cos();
        let centre = self.shape.centre();
        self.shape
            .shape()
            .iter()
            .map(|p| centre + Vec2::new(cos * p.x - sin * p.y, sin * p.x + cos * p.y))
            .collect()
    }
}
