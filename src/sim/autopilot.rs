//! Computer pilot
//!
//! Picks the nearest asteroid on screen, turns toward it the short way round
//! and fires when lined up. Decisions are emitted as ordinary control events,
//! so an autopiloted ship obeys exactly the same rules as a human one.
//!
//! Time is counted in ticks, which keeps autopilot games reproducible.

use glam::Vec2;
use std::collections::VecDeque;

use super::asteroid::Asteroid;
use super::bounds::Bounds;
use super::input::InputEvent;
use crate::consts::{AUTOPILOT_FIRE_PERIOD_MS, AUTOPILOT_FOLLOW_MARGIN, AUTOPILOT_TARGET_PERIOD_MS};
use crate::{normalize_angle, normalize_heading};

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Id of the asteroid being hunted
    target: Option<u32>,
    next_target_tick: u64,
    next_fire_tick: u64,
    target_period: u64,
    fire_period: u64,
}

impl Autopilot {
    /// `update_period_ms` converts the pilot's millisecond timings into ticks
    pub fn new(update_period_ms: u64) -> Self {
        Self {
            target: None,
            next_target_tick: 0,
            next_fire_tick: 0,
            target_period: ms_to_ticks(AUTOPILOT_TARGET_PERIOD_MS, update_period_ms),
            fire_period: ms_to_ticks(AUTOPILOT_FIRE_PERIOD_MS, update_period_ms),
        }
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    /// Decide this tick's controls and append them to `out`
    pub fn decide(
        &mut self,
        tick: u64,
        ship_centre: Vec2,
        heading: f32,
        asteroids: &[Asteroid],
        screen: &Bounds,
        out: &mut VecDeque<InputEvent>,
    ) {
        if let Some(id) = self.target {
            if !asteroids.iter().any(|a| a.id == id && a.alive) {
                self.target = None;
            }
        }
        if self.target.is_none() || tick >= self.next_target_tick {
            self.target = nearest_visible(ship_centre, asteroids, screen);
            self.next_target_tick = tick + self.target_period;
        }

        let Some(target) = self
            .target
            .and_then(|id| asteroids.iter().find(|a| a.id == id))
        else {
            return;
        };

        let to_target = target.shape.centre() - ship_centre;
        let bearing = normalize_heading(to_target.y.atan2(to_target.x));
        let error = normalize_angle(bearing - heading);

        if error.abs() <= AUTOPILOT_FOLLOW_MARGIN / 2.0 {
            out.push_back(InputEvent::RotateStop);
            if tick >= self.next_fire_tick {
                self.next_fire_tick = tick + self.fire_period;
                out.push_back(InputEvent::Fire);
            }
        } else if error > 0.0 {
            out.push_back(InputEvent::RotateRightStart);
        } else {
            out.push_back(InputEvent::RotateLeftStart);
        }
    }
}

/// Closest live asteroid whose bounds overlap the screen
fn nearest_visible(from: Vec2, asteroids: &[Asteroid], screen: &Bounds) -> Option<u32> {
    asteroids
        .iter()
        .filter(|a| a.alive && screen.overlaps_open(&a.shape.bounds()))
        .min_by(|a, b| {
            let da = a.shape.centre().distance_squared(from);
            let db = b.shape.centre().distance_squared(from);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|a| a.id)
}

fn ms_to_ticks(ms: u64, update_period_ms: u64) -> u64 {
    ms.div_ceil(update_period_ms.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::AsteroidSize;
    use crate::sim::rng::DeterministicRandom;

    fn screen() -> Bounds {
        Bounds::new(-400.0, -300.0, 400.0, 300.0)
    }

    fn rock(id: u32, at: Vec2) -> Asteroid {
        let mut rng = DeterministicRandom::new(id as u64);
        Asteroid::new(id, &mut rng, at, AsteroidSize::Small, Vec2::ZERO).unwrap()
    }

    #[test]
    fn test_tick_conversion() {
        assert_eq!(ms_to_ticks(1000, 25), 40);
        assert_eq!(ms_to_ticks(300, 25), 12);
        assert_eq!(ms_to_ticks(300, 0), 300);
        assert_eq!(ms_to_ticks(10, 25), 1);
    }

    #[test]
    fn test_targets_nearest_on_screen() {
        let asteroids = vec![
            rock(1, Vec2::new(250.0, 0.0)),
            rock(2, Vec2::new(-150.0, 0.0)),
            // Closer, but entirely off screen
            rock(3, Vec2::new(0.0, 460.0)),
        ];
        let mut pilot = Autopilot::new(25);
        let mut out = VecDeque::new();
        pilot.decide(0, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(pilot.target(), Some(2));
    }

    #[test]
    fn test_fires_when_lined_up_and_respects_interval() {
        let asteroids = vec![rock(1, Vec2::new(200.0, 0.0))];
        let mut pilot = Autopilot::new(25);
        let mut out = VecDeque::new();

        pilot.decide(0, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(
            out.drain(..).collect::<Vec<_>>(),
            vec![InputEvent::RotateStop, InputEvent::Fire]
        );

        pilot.decide(1, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(out.drain(..).collect::<Vec<_>>(), vec![InputEvent::RotateStop]);

        pilot.decide(12, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(
            out.drain(..).collect::<Vec<_>>(),
            vec![InputEvent::RotateStop, InputEvent::Fire]
        );
    }

    #[test]
    fn test_turns_the_short_way_round() {
        // Target just below the +x axis (bearing ~10°), ship facing ~350°
        let asteroids = vec![rock(1, Vec2::new(200.0, 35.0))];
        let mut pilot = Autopilot::new(25);
        let mut out = VecDeque::new();
        let heading = 350f32.to_radians();
        pilot.decide(0, Vec2::ZERO, heading, &asteroids, &screen(), &mut out);
        assert_eq!(out.pop_front(), Some(InputEvent::RotateRightStart));

        // Target above the axis, ship facing down-right: turn left
        let asteroids = vec![rock(1, Vec2::new(200.0, -100.0))];
        let mut pilot = Autopilot::new(25);
        pilot.decide(0, Vec2::ZERO, 0.3, &asteroids, &screen(), &mut out);
        assert_eq!(out.pop_front(), Some(InputEvent::RotateLeftStart));
    }

    #[test]
    fn test_drops_dead_target() {
        let mut asteroids = vec![rock(1, Vec2::new(100.0, 0.0)), rock(2, Vec2::new(300.0, 0.0))];
        let mut pilot = Autopilot::new(25);
        let mut out = VecDeque::new();
        pilot.decide(0, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(pilot.target(), Some(1));

        asteroids[0].alive = false;
        pilot.decide(1, Vec2::ZERO, 0.0, &asteroids, &screen(), &mut out);
        assert_eq!(pilot.target(), Some(2));
    }

    #[test]
    fn test_no_target_no_input() {
        let mut pilot = Autopilot::new(25);
        let mut out = VecDeque::new();
        pilot.decide(0, Vec2::ZERO, 0.0, &[], &screen(), &mut out);
        assert!(out.is_empty());
        assert_eq!(pilot.target(), None);
    }
}
