//! Asteroid Field - headless session runner
//!
//! Runs one game on the scheduler thread and logs what a renderer would see.

use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use asteroid_field::audio::SilentPlayer;
use asteroid_field::scheduler::{DrawSubscriber, SystemClock};
use asteroid_field::sim::{InputQueue, InputSender, WorldOptions};
use asteroid_field::telemetry::{LogTelemetry, Telemetry};
use asteroid_field::{GameConfig, InputEvent, LoopState, Scheduler, SimError, SimResult, World};

/// How often the main thread checks on the session
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Scripted fire rate for the headless human pilot
const HUMAN_FIRE_INTERVAL: Duration = Duration::from_millis(400);

#[derive(Parser, Debug)]
#[command(name = "asteroid-field", version, about = "Run a headless asteroid shooter session")]
struct Args {
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// Session length in seconds
    #[arg(long, default_value = "10", value_parser = parse_seconds)]
    seconds: Duration,

    /// Fly with scripted controls instead of the autopilot; the session ends when the ship is hit
    #[arg(long)]
    human: bool,

    /// Start with audio muted
    #[arg(long)]
    mute: bool,

    /// Log a JSON snapshot every N frames (0 = never)
    #[arg(long, default_value_t = 0)]
    dump_every: u64,
}

/// Draw subscriber that reports the world to the log
struct ConsoleRenderer {
    world: Rc<RefCell<World>>,
    score: Arc<AtomicU32>,
    dump_every: u64,
    frame: u64,
}

impl DrawSubscriber for ConsoleRenderer {
    fn on_draw(&mut self) -> SimResult<()> {
        let world = self
            .world
            .try_borrow()
            .map_err(|_| SimError::SurfaceUnavailable)?;
        self.frame += 1;
        self.score.store(world.score, Ordering::Relaxed);

        if self.dump_every > 0 && self.frame % self.dump_every == 0 {
            log::info!("frame {}: {}", self.frame, world.snapshot().to_json()?);
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(score) => {
            println!("Final score: {}", score);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> SimResult<u32> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.human {
        config.autopilot = false;
    }
    if args.mute {
        config.audio_enabled = false;
    }

    let seed = config.resolve_seed();
    log::info!(
        "Asteroid Field starting with seed {} ({})",
        seed,
        if config.autopilot { "autopilot" } else { "human" }
    );

    let telemetry: Arc<dyn Telemetry> = Arc::new(LogTelemetry);
    let (input, receiver) = InputQueue::bounded(config.input_queue_capacity, telemetry.clone());
    let score = Arc::new(AtomicU32::new(0));
    let game_over = Arc::new(AtomicBool::new(false));

    let options = config.world_options(seed);
    let screen = config.screen_bounds();
    let dump_every = args.dump_every;
    let handle = {
        let score = score.clone();
        let game_over = game_over.clone();
        let telemetry = telemetry.clone();
        Scheduler::spawn(
            config.scheduler,
            Box::new(SystemClock::default()),
            telemetry.clone(),
            move |scheduler| {
                let world = build_world(options, receiver, telemetry, score.clone(), game_over)?;
                let world = Rc::new(RefCell::new(world));
                world.borrow_mut().initialize(screen)?;

                let updating = world.clone();
                scheduler.add_update_subscriber(move || -> SimResult<()> { updating.borrow_mut().tick() });
                scheduler.add_draw_subscriber(ConsoleRenderer {
                    world,
                    score,
                    dump_every,
                    frame: 0,
                });
                Ok(())
            },
        )?
    };

    let deadline = Instant::now() + args.seconds;
    let mut pilot = (!config.autopilot).then(|| ScriptedPilot::new(input.clone()));
    while Instant::now() < deadline
        && !game_over.load(Ordering::Acquire)
        && handle.state() != LoopState::Stopped
    {
        if let Some(pilot) = pilot.as_mut() {
            if !pilot.step()? {
                break;
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    handle.stop()?;
    let stats = handle.join();
    log::info!(
        "Ran {} updates and {} draws ({} skipped); update time {:?} .. {:?}",
        stats.updates,
        stats.draws,
        stats.skipped_draws,
        stats.fastest_update.unwrap_or_default(),
        stats.slowest_update.unwrap_or_default()
    );
    Ok(score.load(Ordering::Acquire))
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("{e}"))
}

fn build_world(
    options: WorldOptions,
    receiver: asteroid_field::sim::InputReceiver,
    telemetry: Arc<dyn Telemetry>,
    score: Arc<AtomicU32>,
    game_over: Arc<AtomicBool>,
) -> SimResult<World> {
    let mut world = World::new(options, receiver, telemetry, Box::new(SilentPlayer))?;
    world.set_on_game_end(move |final_score| {
        score.store(final_score, Ordering::Release);
        game_over.store(true, Ordering::Release);
    });
    Ok(world)
}

/// Stand-in for a player: spins slowly and fires on a timer
struct ScriptedPilot {
    input: InputSender,
    started: bool,
    last_fire: Instant,
}

impl ScriptedPilot {
    fn new(input: InputSender) -> Self {
        Self {
            input,
            started: false,
            last_fire: Instant::now(),
        }
    }

    /// Returns false once the world no longer takes input
    fn step(&mut self) -> SimResult<bool> {
        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            events.push(InputEvent::RotateRightStart);
        }
        if self.last_fire.elapsed() >= HUMAN_FIRE_INTERVAL {
            self.last_fire = Instant::now();
            events.push(InputEvent::Fire);
        }

        for event in events {
            match self.input.send(event) {
                Ok(()) => {}
                Err(SimError::QueueSaturated) => log::warn!("Dropped {:?}", event),
                Err(SimError::QueueDisconnected) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}
