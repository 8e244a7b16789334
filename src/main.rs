//! Downhill Ski entry point
//!
//! The browser build starts from `web.rs`. Native builds run a headless
//! session steered by a simple autopilot, for smoke-testing the simulation.
//!
//! Environment:
//! - `DOWNHILL_TUNING`: path to a JSON tuning override file
//! - `DOWNHILL_SEED`: session seed (defaults to the clock)
//! - `DOWNHILL_BEST_FILE`: best score file (defaults to `downhill-ski-best.json`)

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{SystemTime, UNIX_EPOCH};

    use downhill_ski::best_score::{BestScore, BestScoreError};
    use downhill_ski::platform::{FrameHandle, FrameLoop, FrameOutcome, FrameScheduler, RenderSurface};
    use downhill_ski::renderer::FrameView;
    use downhill_ski::sim::{Canvas, TurnDirection, World};
    use downhill_ski::tuning::{Tuning, TuningError};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Ten minutes of play
    const MAX_FRAMES: u64 = 60 * 60 * 10;
    /// How far below the skier the autopilot looks for trouble
    const LOOKAHEAD: f32 = 220.0;
    /// Obstacles closer than this horizontally are in the way
    const CLEARANCE: f32 = 45.0;

    #[derive(Debug, thiserror::Error)]
    pub enum SessionError {
        #[error(transparent)]
        Tuning(#[from] TuningError),
        #[error(transparent)]
        BestScore(#[from] BestScoreError),
    }

    /// Hands out a frame whenever asked; the session pumps it
    #[derive(Default)]
    struct StepScheduler {
        next: FrameHandle,
        pending: Option<FrameHandle>,
    }

    impl FrameScheduler for StepScheduler {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            self.next += 1;
            self.pending = Some(self.next);
            self.pending
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            if self.pending == Some(handle) {
                self.pending = None;
            }
        }
    }

    struct HeadlessSurface {
        canvas: Canvas,
        frames: u64,
    }

    impl RenderSurface for HeadlessSurface {
        fn size(&self) -> Canvas {
            self.canvas
        }

        fn draw(&mut self, view: &FrameView) {
            self.frames += 1;
            if self.frames % 600 == 0 {
                log::info!(
                    "{}s: {}m, level {}, {} trees on screen",
                    self.frames / 60,
                    view.score,
                    view.level,
                    view.trees.len()
                );
            }
        }
    }

    /// Which way the skier should be turning, if at all
    fn desired_turn(world: &World) -> Option<TurnDirection> {
        let skier = world.skier.pos;
        let width = world.canvas.width;

        if skier.x < width * 0.2 {
            return Some(TurnDirection::Right);
        }
        if skier.x > width * 0.8 {
            return Some(TurnDirection::Left);
        }

        let obstacles = world
            .trees
            .iter()
            .map(|t| t.pos)
            .chain(world.npcs.iter().map(|n| n.pos));
        let nearest = obstacles
            .filter(|p| p.y > skier.y && p.y - skier.y < LOOKAHEAD)
            .filter(|p| (p.x - skier.x).abs() < CLEARANCE)
            .min_by(|a, b| a.y.total_cmp(&b.y))?;

        if nearest.x >= skier.x {
            Some(TurnDirection::Left)
        } else {
            Some(TurnDirection::Right)
        }
    }

    /// Hold while turning the right way; tap to flip the next direction
    fn autopilot(world: &World) -> bool {
        let skier = &world.skier;
        match desired_turn(world) {
            Some(direction) if skier.holding => direction == skier.next_direction,
            // A press now and a release next frame flips the direction
            Some(_) => true,
            None => false,
        }
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    pub fn run() -> Result<(), SessionError> {
        let tuning = match std::env::var("DOWNHILL_TUNING") {
            Ok(path) => Tuning::load(&path)?,
            Err(_) => Tuning::default(),
        };
        let seed = std::env::var("DOWNHILL_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(now_ms);
        let best_path = std::env::var("DOWNHILL_BEST_FILE")
            .unwrap_or_else(|_| "downhill-ski-best.json".to_string());

        let mut best = BestScore::load_from(&best_path)?;
        let canvas = Canvas::default();
        let world = World::new(seed, canvas, best.best);
        log::info!("Headless session, seed {}, best {}m", seed, best.best);

        let mut frame_loop = FrameLoop::new(world, tuning, StepScheduler::default());
        let mut surface = HeadlessSurface { canvas, frames: 0 };
        frame_loop.start();

        let mut timestamp = 0.0;
        let mut result = None;
        while frame_loop.scheduler().pending.is_some() && surface.frames < MAX_FRAMES {
            timestamp += FRAME_MS;
            let holding = autopilot(frame_loop.world());
            frame_loop.set_holding(holding);
            if let FrameOutcome::GameOver(over) = frame_loop.on_frame(timestamp, Some(&mut surface)) {
                result = Some(over);
            }
        }

        match result {
            Some(over) => {
                println!(
                    "Game over after {:.1}s: {}m ({:?})",
                    timestamp / 1000.0,
                    over.score,
                    over.cause
                );
                if best.record(over.score) {
                    println!("New best score!");
                    best.save_to(&best_path)?;
                }
            }
            None => println!(
                "Survived {:.0}s, {}m",
                timestamp / 1000.0,
                frame_loop.world().floored_score()
            ),
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Downhill Ski (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `web::init`, this is just to satisfy the compiler
}
