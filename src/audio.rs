//! Sound cues
//!
//! [`AudioController`] turns control events and game events into play/stop
//! calls on a [`SoundPlayer`] backend. The backend is whatever the host
//! platform provides; [`SilentPlayer`] is used when there is none.

use crate::sim::InputEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Asteroid shot
    AsteroidDestroyed,
    /// Projectile leaves the ship
    ProjectileFired,
    /// Looping engine noise while rotating or thrusting
    Thruster,
}

impl SoundEffect {
    /// Backend priority; higher wins when streams run out
    pub fn priority(self) -> u8 {
        match self {
            SoundEffect::AsteroidDestroyed => 2,
            SoundEffect::ProjectileFired => 1,
            SoundEffect::Thruster => 2,
        }
    }
}

/// Handle to a playing stream, used to stop looping sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u32);

/// Audio backend
pub trait SoundPlayer: Send {
    /// Start playing an effect. `None` means nothing is playing.
    fn play(&mut self, effect: SoundEffect, volume: f32, priority: u8, looping: bool)
    -> Option<StreamId>;

    fn stop(&mut self, stream: StreamId);

    /// Free backend resources. The player is not used again afterwards.
    fn release(&mut self);
}

/// Backend that plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, _: SoundEffect, _: f32, _: u8, _: bool) -> Option<StreamId> {
        None
    }

    fn stop(&mut self, _: StreamId) {}

    fn release(&mut self) {}
}

/// Tracks mute and thruster state for one game
pub struct AudioController {
    player: Box<dyn SoundPlayer>,
    master_volume: f32,
    muted: bool,
    released: bool,
    rotating: bool,
    thrusting: bool,
    thruster: Option<StreamId>,
}

impl AudioController {
    pub fn new(player: Box<dyn SoundPlayer>, enabled: bool) -> Self {
        Self {
            player,
            master_volume: 1.0,
            muted: !enabled,
            released: false,
            rotating: false,
            thrusting: false,
            thruster: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// React to a control event, whoever issued it
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Fire => {
                self.play(SoundEffect::ProjectileFired, false);
            }
            InputEvent::RotateLeftStart | InputEvent::RotateRightStart => {
                self.rotating = true;
                self.start_thruster();
            }
            InputEvent::RotateStop => {
                self.rotating = false;
                if !self.thrusting {
                    self.stop_thruster();
                }
            }
            InputEvent::ThrustStart => {
                self.thrusting = true;
                self.start_thruster();
            }
            InputEvent::ThrustStop => {
                self.thrusting = false;
                if !self.rotating {
                    self.stop_thruster();
                }
            }
            InputEvent::ToggleAudioMute => {
                if self.released {
                    return;
                }
                self.muted = !self.muted;
                if self.muted {
                    self.stop_thruster();
                } else if self.rotating || self.thrusting {
                    self.start_thruster();
                }
            }
        }
    }

    pub fn on_asteroid_destroyed(&mut self) {
        self.play(SoundEffect::AsteroidDestroyed, false);
    }

    /// Silence everything for good and free the backend
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stop_thruster();
        self.muted = true;
        self.released = true;
        self.player.release();
    }

    fn start_thruster(&mut self) {
        if self.thruster.is_none() {
            self.thruster = self.play(SoundEffect::Thruster, true);
        }
    }

    fn stop_thruster(&mut self) {
        if let Some(stream) = self.thruster.take() {
            self.player.stop(stream);
        }
    }

    fn play(&mut self, effect: SoundEffect, looping: bool) -> Option<StreamId> {
        if self.muted {
            return None;
        }
        self.player
            .play(effect, self.master_volume, effect.priority(), looping)
    }
}
