//! Discrete control input and the queue that carries it into the simulation
//!
//! Input is produced on whatever thread the host UI runs on and consumed by the
//! world at the start of each tick. The queue is bounded; a full queue is
//! backpressure, never a crash.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use crate::error::{SimError, SimResult};
use crate::telemetry::{Telemetry, TelemetryEvent};

/// A single control event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    RotateLeftStart,
    RotateRightStart,
    RotateStop,
    ThrustStart,
    ThrustStop,
    Fire,
    /// Audio only; never reaches the ship
    ToggleAudioMute,
}

/// How many times a full queue is retried before the event is dropped
const SEND_RETRIES: u32 = 3;
const SEND_RETRY_WAIT: Duration = Duration::from_millis(1);

/// Bounded multi-producer, single-consumer input queue
pub struct InputQueue;

impl InputQueue {
    pub fn bounded(capacity: usize, telemetry: Arc<dyn Telemetry>) -> (InputSender, InputReceiver) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (InputSender { tx, telemetry }, InputReceiver { rx })
    }
}

/// Producer half. Cheap to clone; one per input source.
#[derive(Clone)]
pub struct InputSender {
    tx: SyncSender<InputEvent>,
    telemetry: Arc<dyn Telemetry>,
}

impl InputSender {
    /// Queue an event for the next tick.
    ///
    /// Waits briefly if the queue is full, then gives up with
    /// [`SimError::QueueSaturated`]. A dropped event never reorders the
    /// events already queued.
    pub fn send(&self, event: InputEvent) -> SimResult<()> {
        for attempt in 0..=SEND_RETRIES {
            match self.tx.try_send(event) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(_)) if attempt < SEND_RETRIES => {
                    thread::sleep(SEND_RETRY_WAIT);
                }
                Err(TrySendError::Full(_)) => break,
                Err(TrySendError::Disconnected(_)) => return Err(SimError::QueueDisconnected),
            }
        }
        self.telemetry.record(TelemetryEvent::InputDropped { event });
        Err(SimError::QueueSaturated)
    }
}

/// Consumer half, owned by the world
pub struct InputReceiver {
    rx: Receiver<InputEvent>,
}

impl InputReceiver {
    /// Everything queued so far, oldest first, without blocking
    pub fn drain(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{NullTelemetry, RecordingTelemetry};

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = InputQueue::bounded(8, Arc::new(NullTelemetry));
        tx.send(InputEvent::ThrustStart).unwrap();
        tx.send(InputEvent::Fire).unwrap();
        tx.send(InputEvent::ThrustStop).unwrap();
        let drained: Vec<_> = rx.drain().collect();
        assert_eq!(
            drained,
            vec![InputEvent::ThrustStart, InputEvent::Fire, InputEvent::ThrustStop]
        );
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn test_full_queue_saturates_without_reordering() {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let (tx, rx) = InputQueue::bounded(2, telemetry.clone());
        tx.send(InputEvent::RotateLeftStart).unwrap();
        tx.send(InputEvent::RotateStop).unwrap();
        assert!(matches!(tx.send(InputEvent::Fire), Err(SimError::QueueSaturated)));
        assert!(telemetry
            .events()
            .contains(&TelemetryEvent::InputDropped { event: InputEvent::Fire }));

        let drained: Vec<_> = rx.drain().collect();
        assert_eq!(drained, vec![InputEvent::RotateLeftStart, InputEvent::RotateStop]);
    }

    #[test]
    fn test_multiple_producers() {
        let (tx, rx) = InputQueue::bounded(64, Arc::new(NullTelemetry));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..8 {
                        tx.send(InputEvent::Fire).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(rx.drain().count(), 32);
    }

    #[test]
    fn test_disconnected_consumer() {
        let (tx, rx) = InputQueue::bounded(4, Arc::new(NullTelemetry));
        drop(rx);
        assert!(matches!(tx.send(InputEvent::Fire), Err(SimError::QueueDisconnected)));
    }
}
