//! Fixed-timestep loop
//!
//! Runs update subscribers on one fixed period and draw subscribers on
//! another. Updates catch up after a stall so the long-run update rate holds;
//! draws are best effort and simply skip missed frames.
//!
//! The loop owns its subscribers and runs on a single execution context,
//! usually a dedicated thread started with [`Scheduler::spawn`]. Other
//! threads only ever touch the shared [`LoopState`] through a
//! [`LoopControl`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::consts::PAUSED_POLL_MS;
use crate::error::{SimError, SimResult};
use crate::settings::SchedulerConfig;
use crate::telemetry::{Telemetry, TelemetryEvent};

/// Fraction of the remaining wait spent asleep when idle
const IDLE_SLEEP_FRACTION: f64 = 0.9;

/// Time source for the loop
pub trait Clock: Send {
    /// Time elapsed since some fixed origin
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Called once per update tick. An error stops the loop.
pub trait UpdateSubscriber {
    fn on_update(&mut self) -> SimResult<()>;
}

impl<F> UpdateSubscriber for F
where
    F: FnMut() -> SimResult<()>,
{
    fn on_update(&mut self) -> SimResult<()> {
        self()
    }
}

/// Called once per draw tick. [`SimError::SurfaceUnavailable`] skips the frame.
pub trait DrawSubscriber {
    fn on_draw(&mut self) -> SimResult<()>;
}

impl<F> DrawSubscriber for F
where
    F: FnMut() -> SimResult<()>,
{
    fn on_draw(&mut self) -> SimResult<()> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopState {
    Running = 0,
    Paused = 1,
    /// Terminal
    Stopped = 2,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Running,
            1 => LoopState::Paused,
            2 => LoopState::Stopped,
            other => unreachable!("invalid loop state {other}"),
        }
    }
}

/// Shared handle on a loop's state, usable from any thread
#[derive(Clone)]
pub struct LoopControl {
    state: Arc<AtomicU8>,
    telemetry: Arc<dyn Telemetry>,
}

impl LoopControl {
    fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(LoopState::Running as u8)),
            telemetry,
        }
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn pause(&self) -> SimResult<()> {
        self.transition(LoopState::Paused)
    }

    pub fn resume(&self) -> SimResult<()> {
        self.transition(LoopState::Running)
    }

    /// Ask the loop to exit after its current iteration. Stopping twice is fine.
    pub fn stop(&self) -> SimResult<()> {
        self.transition(LoopState::Stopped)
    }

    fn transition(&self, to: LoopState) -> SimResult<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let from = LoopState::from_u8(current);
            if from == to {
                return Ok(());
            }
            if from == LoopState::Stopped {
                return Err(SimError::SchedulerStopped);
            }
            match self.state.compare_exchange(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.telemetry
                        .record(TelemetryEvent::LoopStateChanged { from, to });
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// Counters collected over one run of the loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    pub updates: u64,
    /// Draw ticks, including skipped ones
    pub draws: u64,
    pub skipped_draws: u64,
    pub slowest_update: Option<Duration>,
    pub fastest_update: Option<Duration>,
}

pub struct Scheduler {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    telemetry: Arc<dyn Telemetry>,
    control: LoopControl,
    update_subscribers: Vec<Box<dyn UpdateSubscriber>>,
    draw_subscribers: Vec<Box<dyn DrawSubscriber>>,
    stats: LoopStats,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, clock: Box<dyn Clock>, telemetry: Arc<dyn Telemetry>) -> Self {
        let control = LoopControl::new(telemetry.clone());
        Self {
            config,
            clock,
            telemetry,
            control,
            update_subscribers: Vec::new(),
            draw_subscribers: Vec::new(),
            stats: LoopStats::default(),
        }
    }

    /// Start a loop on its own thread.
    ///
    /// `setup` runs on that thread before the first tick and registers the
    /// subscribers, so they never have to cross threads. An error from
    /// `setup` is returned here and the loop never starts.
    pub fn spawn<S>(
        config: SchedulerConfig,
        clock: Box<dyn Clock>,
        telemetry: Arc<dyn Telemetry>,
        setup: S,
    ) -> SimResult<SchedulerHandle>
    where
        S: FnOnce(&mut Scheduler) -> SimResult<()> + Send + 'static,
    {
        let control = LoopControl::new(telemetry.clone());
        let thread_control = control.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<SimResult<()>>(1);

        let thread = thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || {
                let mut scheduler = Scheduler::new(config, clock, telemetry);
                scheduler.control = thread_control;
                match setup(&mut scheduler) {
                    Ok(()) => {
                        let _ = ready_tx.send(Ok(()));
                        scheduler.run()
                    }
                    Err(e) => {
                        let _ = scheduler.control.stop();
                        let _ = ready_tx.send(Err(e));
                        LoopStats::default()
                    }
                }
            })
            .map_err(SimError::ThreadSpawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(SchedulerHandle {
                control,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            // Setup panicked before reporting back
            Err(_) => match thread.join() {
                Err(panic) => std::panic::resume_unwind(panic),
                Ok(_) => Err(SimError::SchedulerStopped),
            },
        }
    }

    pub fn control(&self) -> LoopControl {
        self.control.clone()
    }

    pub fn add_update_subscriber(&mut self, subscriber: impl UpdateSubscriber + 'static) {
        self.update_subscribers.push(Box::new(subscriber));
    }

    pub fn add_draw_subscriber(&mut self, subscriber: impl DrawSubscriber + 'static) {
        self.draw_subscribers.push(Box::new(subscriber));
    }

    /// Run on the calling thread until the state becomes [`LoopState::Stopped`]
    pub fn run(&mut self) -> LoopStats {
        let update_period = Duration::from_millis(self.config.update_period_ms);
        let draw_period = Duration::from_millis(self.config.draw_period_ms);
        let paused_poll = Duration::from_millis(PAUSED_POLL_MS);

        let mut next_update = self.clock.now();
        let mut next_draw = next_update;
        let mut resumed = false;

        loop {
            match self.control.state() {
                LoopState::Stopped => break,
                LoopState::Paused => {
                    self.clock.sleep(paused_poll);
                    resumed = true;
                    continue;
                }
                LoopState::Running => {}
            }

            let now = self.clock.now();
            if resumed {
                // No catch-up for time spent paused
                next_update = now;
                next_draw = now;
                resumed = false;
            }

            if now >= next_update {
                next_update += update_period;
                if let Err(e) = self.update() {
                    self.telemetry.record(TelemetryEvent::SubscriberFailed {
                        error: e.to_string(),
                    });
                    let _ = self.control.stop();
                    break;
                }
            } else if now >= next_draw {
                next_draw = now + draw_period;
                self.draw();
            } else if self.config.allow_idle_sleep {
                let wait = (next_update - now).min(next_draw - now);
                self.clock.sleep(wait.mul_f64(IDLE_SLEEP_FRACTION));
            }
        }

        self.stats.clone()
    }

    fn update(&mut self) -> SimResult<()> {
        let start = self.clock.now();
        for subscriber in &mut self.update_subscribers {
            subscriber.on_update()?;
        }
        let elapsed = self.clock.now().saturating_sub(start);

        self.stats.updates += 1;
        self.telemetry.record(TelemetryEvent::UpdateTimed { elapsed });
        if self.stats.slowest_update.is_none_or(|slowest| elapsed > slowest) {
            self.stats.slowest_update = Some(elapsed);
            self.telemetry
                .record(TelemetryEvent::NewSlowestUpdate { elapsed });
        }
        if self.stats.fastest_update.is_none_or(|fastest| elapsed < fastest) {
            self.stats.fastest_update = Some(elapsed);
            self.telemetry
                .record(TelemetryEvent::NewFastestUpdate { elapsed });
        }
        Ok(())
    }

    fn draw(&mut self) {
        self.stats.draws += 1;
        let mut skipped = false;
        for subscriber in &mut self.draw_subscribers {
            match subscriber.on_draw() {
                Ok(()) => {}
                Err(SimError::SurfaceUnavailable) => skipped = true,
                Err(e) => {
                    skipped = true;
                    self.telemetry.record(TelemetryEvent::SubscriberFailed {
                        error: e.to_string(),
                    });
                }
            }
        }
        if skipped {
            self.stats.skipped_draws += 1;
            self.telemetry.record(TelemetryEvent::DrawSkipped);
        }
    }
}

/// Owner's handle on a spawned loop. Dropping it stops the loop and waits for it.
pub struct SchedulerHandle {
    control: LoopControl,
    thread: Option<JoinHandle<LoopStats>>,
}

impl SchedulerHandle {
    pub fn state(&self) -> LoopState {
        self.control.state()
    }

    pub fn pause(&self) -> SimResult<()> {
        self.control.pause()
    }

    pub fn resume(&self) -> SimResult<()> {
        self.control.resume()
    }

    pub fn stop(&self) -> SimResult<()> {
        self.control.stop()
    }

    pub fn control(&self) -> LoopControl {
        self.control.clone()
    }

    /// Wait for the loop to exit. Does not stop it; call [`Self::stop`] first.
    pub fn join(mut self) -> LoopStats {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(panic)) => std::panic::resume_unwind(panic),
            None => LoopStats::default(),
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.control.stop();
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{NullTelemetry, RecordingTelemetry};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU64;

    /// Clock that only moves when slept on or advanced by hand
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        fn sleep(&mut self, duration: Duration) {
            // Millisecond granularity, like a real sleep
            self.advance(duration.max(Duration::from_millis(1)));
        }
    }

    fn config(update_period_ms: u64, draw_period_ms: u64) -> SchedulerConfig {
        SchedulerConfig {
            update_period_ms,
            draw_period_ms,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_stalled_update_is_caught_up_before_next_draw() {
        let clock = ManualClock::default();
        let mut scheduler = Scheduler::new(config(10, 20), Box::new(clock.clone()), Arc::new(NullTelemetry));
        let control = scheduler.control();
        let log = Rc::new(RefCell::new(String::new()));

        {
            let log = log.clone();
            let clock = clock.clone();
            scheduler.add_update_subscriber(move || -> SimResult<()> {
                let mut log = log.borrow_mut();
                if log.is_empty() {
                    clock.advance(Duration::from_millis(35));
                }
                log.push('U');
                Ok(())
            });
        }
        {
            let log = log.clone();
            scheduler.add_draw_subscriber(move || -> SimResult<()> {
                log.borrow_mut().push('D');
                if log.borrow().matches('D').count() == 2 {
                    control.stop()?;
                }
                Ok(())
            });
        }

        let stats = scheduler.run();
        let log = log.borrow();
        assert!(log.starts_with("UUUUD"), "got {log}");
        assert_eq!(stats.draws, 2);
        assert!(stats.slowest_update >= Some(Duration::from_millis(35)));
        assert_eq!(stats.fastest_update, Some(Duration::ZERO));
    }

    #[test]
    fn test_update_error_stops_loop() {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let mut scheduler =
            Scheduler::new(config(10, 20), Box::new(ManualClock::default()), telemetry.clone());
        let control = scheduler.control();
        let mut calls = 0;
        scheduler.add_update_subscriber(move || -> SimResult<()> {
            calls += 1;
            if calls == 3 {
                Err(SimError::QueueDisconnected)
            } else {
                Ok(())
            }
        });

        let stats = scheduler.run();
        assert_eq!(stats.updates, 2);
        assert_eq!(control.state(), LoopState::Stopped);
        assert!(
            telemetry
                .events()
                .iter()
                .any(|e| matches!(e, TelemetryEvent::SubscriberFailed { .. }))
        );
    }

    #[test]
    fn test_unavailable_surface_skips_frame() {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let mut scheduler =
            Scheduler::new(config(10, 20), Box::new(ManualClock::default()), telemetry.clone());
        let control = scheduler.control();
        let mut frames = 0;
        scheduler.add_draw_subscriber(move || -> SimResult<()> {
            frames += 1;
            if frames == 4 {
                control.stop()?;
            }
            if frames % 2 == 0 {
                Err(SimError::SurfaceUnavailable)
            } else {
                Ok(())
            }
        });

        let stats = scheduler.run();
        assert_eq!(stats.draws, 4);
        assert_eq!(stats.skipped_draws, 2);
        let skipped = telemetry
            .events()
            .iter()
            .filter(|e| **e == TelemetryEvent::DrawSkipped)
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let control = LoopControl::new(telemetry.clone());
        control.pause().unwrap();
        control.resume().unwrap();
        control.stop().unwrap();
        control.stop().unwrap();
        assert!(matches!(control.resume(), Err(SimError::SchedulerStopped)));
        assert!(matches!(control.pause(), Err(SimError::SchedulerStopped)));
        assert_eq!(
            telemetry.events(),
            vec![
                TelemetryEvent::LoopStateChanged { from: LoopState::Running, to: LoopState::Paused },
                TelemetryEvent::LoopStateChanged { from: LoopState::Paused, to: LoopState::Running },
                TelemetryEvent::LoopStateChanged { from: LoopState::Running, to: LoopState::Stopped },
            ]
        );
    }

    #[test]
    fn test_spawned_loop_lifecycle() {
        let counter = Arc::new(AtomicU64::new(0));
        let thread_counter = counter.clone();
        let handle = Scheduler::spawn(
            config(5, 20),
            Box::new(SystemClock::default()),
            Arc::new(NullTelemetry),
            move |scheduler| {
                scheduler.add_update_subscriber(move || -> SimResult<()> {
                    thread_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                Ok(())
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        handle.pause().unwrap();
        assert_eq!(handle.state(), LoopState::Paused);
        thread::sleep(Duration::from_millis(20));
        let paused_at = counter.load(Ordering::SeqCst);
        assert!(paused_at > 0);
        thread::sleep(Duration::from_millis(150));
        assert_eq!(counter.load(Ordering::SeqCst), paused_at);

        handle.resume().unwrap();
        thread::sleep(Duration::from_millis(250));
        assert!(counter.load(Ordering::SeqCst) > paused_at);

        let control = handle.control();
        handle.stop().unwrap();
        let stats = handle.join();
        assert_eq!(stats.updates, counter.load(Ordering::SeqCst));
        assert!(matches!(control.resume(), Err(SimError::SchedulerStopped)));
    }

    #[test]
    fn test_setup_error_is_returned() {
        let result = Scheduler::spawn(
            SchedulerConfig::default(),
            Box::new(SystemClock::default()),
            Arc::new(NullTelemetry),
            |_| Err(SimError::InvalidPolygon { points: 1 }),
        );
        assert!(matches!(result, Err(SimError::InvalidPolygon { points: 1 })));
    }
}
