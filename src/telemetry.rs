//! Observability sink
//!
//! The world and the scheduler report what happens through a [`Telemetry`]
//! handed to them at construction. [`LogTelemetry`] forwards to the `log`
//! facade, which is what the binary uses.

use std::sync::Mutex;
use std::time::Duration;

use crate::scheduler::LoopState;
use crate::sim::{AsteroidSize, InputEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    AsteroidSpawned {
        id: u32,
        size: AsteroidSize,
        split: bool,
    },
    /// No spawn position far enough from the ship was found
    AsteroidSpawnSkipped,
    AsteroidDestroyed {
        id: u32,
        size: AsteroidSize,
        score: u32,
    },
    AsteroidDespawned {
        id: u32,
    },
    ProjectileFired {
        id: u32,
    },
    /// The ship touched an asteroid; autopilot ships are revived immediately
    ShipHit {
        revived: bool,
    },
    GameEnded {
        score: u32,
        tick: u64,
    },
    InputDropped {
        event: InputEvent,
    },
    UpdateTimed {
        elapsed: Duration,
    },
    NewSlowestUpdate {
        elapsed: Duration,
    },
    NewFastestUpdate {
        elapsed: Duration,
    },
    DrawSkipped,
    LoopStateChanged {
        from: LoopState,
        to: LoopState,
    },
    SubscriberFailed {
        error: String,
    },
}

pub trait Telemetry: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Forwards every event to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::AsteroidSpawned { id, size, split } => {
                log::trace!("Asteroid {} ({:?}) entering the game, split={}", id, size, split);
            }
            TelemetryEvent::AsteroidSpawnSkipped => {
                log::debug!("No clear spawn position found, skipping asteroid spawn");
            }
            TelemetryEvent::AsteroidDestroyed { id, size, score } => {
                log::debug!("Asteroid {} ({:?}) destroyed, score {}", id, size, score);
            }
            TelemetryEvent::AsteroidDespawned { id } => {
                log::trace!("Asteroid {} left the game", id);
            }
            TelemetryEvent::ProjectileFired { id } => log::trace!("Projectile {} fired", id),
            TelemetryEvent::ShipHit { revived } => {
                if revived {
                    log::trace!("Autopilot ship hit, reviving");
                } else {
                    log::info!("Ship destroyed");
                }
            }
            TelemetryEvent::GameEnded { score, tick } => {
                log::info!("Game over at tick {} with score {}", tick, score);
            }
            TelemetryEvent::InputDropped { event } => {
                log::warn!("Input queue saturated, dropped {:?}", event);
            }
            TelemetryEvent::UpdateTimed { elapsed } => log::trace!("Update took {:?}", elapsed),
            TelemetryEvent::NewSlowestUpdate { elapsed } => {
                log::debug!("New slowest update: {:?}", elapsed);
            }
            TelemetryEvent::NewFastestUpdate { elapsed } => {
                log::debug!("New fastest update: {:?}", elapsed);
            }
            TelemetryEvent::DrawSkipped => log::debug!("Draw surface unavailable, frame skipped"),
            TelemetryEvent::LoopStateChanged { from, to } => {
                log::info!("Loop state {:?} -> {:?}", from, to);
            }
            TelemetryEvent::SubscriberFailed { error } => {
                log::error!("Subscriber failed: {}", error);
            }
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Keeps every event in memory, for tests and replay tooling
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
