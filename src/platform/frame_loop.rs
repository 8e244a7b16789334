//! Frame loop driver
//!
//! One simulation step per scheduled display-frame callback. The loop owns
//! the world, requests the next frame only after the current one finished,
//! and cancels whatever is still pending when it stops.

use crate::renderer::FrameView;
use crate::sim::state::{Canvas, World};
use crate::sim::tick::{FrameInput, GameOver, step};
use crate::tuning::Tuning;

/// Id of a pending frame request (what `requestAnimationFrame` returns)
pub type FrameHandle = i32;

/// Source of display-frame callbacks
pub trait FrameScheduler {
    /// Request one callback on the next display frame. None if the request failed.
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Something the loop can draw to
pub trait RenderSurface {
    /// Current drawable size (may change between frames)
    fn size(&self) -> Canvas;
    fn draw(&mut self, view: &FrameView);
}

/// What a frame callback did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Loop stopped; the callback was stale
    NotRunning,
    /// No surface this frame: skipped and not rescheduled
    Stalled,
    /// Stepped, drew and requested the next frame
    Continued,
    GameOver(GameOver),
}

type GameOverCallback = Box<dyn FnMut(&GameOver)>;

pub struct FrameLoop<S: FrameScheduler> {
    world: World,
    tuning: Tuning,
    scheduler: S,
    pending: Option<FrameHandle>,
    running: bool,
    holding: bool,
    on_game_over: Option<GameOverCallback>,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(world: World, tuning: Tuning, scheduler: S) -> Self {
        Self {
            world,
            tuning,
            scheduler,
            pending: None,
            running: false,
            holding: false,
            on_game_over: None,
        }
    }

    /// Called once with the record on the frame a run ends
    pub fn set_on_game_over(&mut self, callback: impl FnMut(&GameOver) + 'static) {
        self.on_game_over = Some(Box::new(callback));
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Running but with nothing scheduled (stalled on a missing surface)
    pub fn is_stalled(&self) -> bool {
        self.running && self.pending.is_none()
    }

    /// Pointer went down. Applied to the skier right away, not at the next frame.
    pub fn press(&mut self) {
        self.holding = true;
        self.world.skier.press();
    }

    /// Pointer went up. Flips the next turn direction even if the press and
    /// release both land between two frames.
    pub fn release(&mut self) {
        self.holding = false;
        self.world.skier.release();
    }

    /// Level-triggered form of `press` / `release`
    pub fn set_holding(&mut self, holding: bool) {
        if holding {
            self.press();
        } else {
            self.release();
        }
    }

    /// Start the loop, or resume a stalled one
    pub fn start(&mut self) {
        if self.running && self.pending.is_some() {
            return;
        }
        if self.world.is_over() {
            log::warn!("Not starting a finished run; restart it first");
            return;
        }
        self.running = true;
        self.schedule();
    }

    /// Stop and cancel any pending frame
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
            log::debug!("Cancelled pending frame {}", handle);
        }
    }

    /// Fresh run with a new seed, keeping canvas and best score
    pub fn restart(&mut self, seed: u64) {
        self.stop();
        self.world.restart(seed);
        self.holding = false;
        self.start();
    }

    /// The scheduled callback
    pub fn on_frame(
        &mut self,
        timestamp_ms: f64,
        surface: Option<&mut dyn RenderSurface>,
    ) -> FrameOutcome {
        self.pending = None;
        if !self.running {
            return FrameOutcome::NotRunning;
        }

        let Some(surface) = surface else {
            log::warn!("No render surface at {:.0}ms; frame skipped and loop stalled", timestamp_ms);
            return FrameOutcome::Stalled;
        };

        let input = FrameInput {
            timestamp_ms,
            holding: self.holding,
            canvas: surface.size(),
        };
        let over = step(&mut self.world, &input, &self.tuning);
        surface.draw(&FrameView::capture(&self.world, timestamp_ms));

        match over {
            Some(over) => {
                self.stop();
                if over.new_best {
                    self.world.best_score = over.score;
                }
                if let Some(callback) = self.on_game_over.as_mut() {
                    callback(&over);
                }
                FrameOutcome::GameOver(over)
            }
            None => {
                self.schedule();
                FrameOutcome::Continued
            }
        }
    }

    fn schedule(&mut self) {
        match self.scheduler.request_frame() {
            Some(handle) => self.pending = Some(handle),
            None => log::warn!("Frame request failed; loop stalled"),
        }
    }
}

impl<S: FrameScheduler> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::AVALANCHE_CATCH_THRESHOLD;
    use crate::sim::state::TurnDirection;
    use crate::sim::tick::GameOverCause;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        requested: Vec<FrameHandle>,
        cancelled: Vec<FrameHandle>,
    }

    #[derive(Clone, Default)]
    struct FakeScheduler {
        log: Rc<RefCell<Log>>,
    }

    impl FrameScheduler for FakeScheduler {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            let mut log = self.log.borrow_mut();
            let handle = log.requested.len() as FrameHandle + 1;
            log.requested.push(handle);
            Some(handle)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.log.borrow_mut().cancelled.push(handle);
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        draws: usize,
        last_score: u64,
    }

    impl RenderSurface for FakeSurface {
        fn size(&self) -> Canvas {
            Canvas::default()
        }

        fn draw(&mut self, view: &FrameView) {
            self.draws += 1;
            self.last_score = view.score;
        }
    }

    fn new_loop() -> (FrameLoop<FakeScheduler>, Rc<RefCell<Log>>) {
        let scheduler = FakeScheduler::default();
        let log = scheduler.log.clone();
        let world = World::new(7, Canvas::default(), 0);
        (FrameLoop::new(world, Tuning::default(), scheduler), log)
    }

    #[test]
    fn test_start_requests_one_frame() {
        let (mut frame_loop, log) = new_loop();
        frame_loop.start();
        frame_loop.start();
        assert_eq!(log.borrow().requested.len(), 1);
        assert!(frame_loop.is_running());
        assert!(!frame_loop.is_stalled());
    }

    #[test]
    fn test_each_frame_steps_draws_and_reschedules() {
        let (mut frame_loop, log) = new_loop();
        let mut surface = FakeSurface::default();
        frame_loop.start();

        for i in 0..3 {
            let outcome = frame_loop.on_frame(1000.0 + i as f64 * 16.0, Some(&mut surface));
            assert_eq!(outcome, FrameOutcome::Continued);
        }
        assert_eq!(surface.draws, 3);
        assert_eq!(log.borrow().requested.len(), 4);
        assert_eq!(frame_loop.world().last_frame_ms, Some(1032.0));
    }

    #[test]
    fn test_missing_surface_stalls_without_rescheduling() {
        let (mut frame_loop, log) = new_loop();
        frame_loop.start();

        assert_eq!(frame_loop.on_frame(1000.0, None), FrameOutcome::Stalled);
        assert_eq!(log.borrow().requested.len(), 1);
        assert!(frame_loop.is_stalled());
        // Nothing was simulated
        assert_eq!(frame_loop.world().last_frame_ms, None);

        // Resuming asks for a new frame
        frame_loop.start();
        assert_eq!(log.borrow().requested.len(), 2);
        assert!(!frame_loop.is_stalled());
    }

    #[test]
    fn test_stop_and_drop_cancel_pending() {
        let (mut frame_loop, log) = new_loop();
        frame_loop.start();
        frame_loop.stop();
        assert_eq!(log.borrow().cancelled, vec![1]);

        // Stale callbacks after stop do nothing
        let mut surface = FakeSurface::default();
        assert_eq!(frame_loop.on_frame(1000.0, Some(&mut surface)), FrameOutcome::NotRunning);
        assert_eq!(surface.draws, 0);

        frame_loop.start();
        drop(frame_loop);
        assert_eq!(log.borrow().cancelled, vec![1, 2]);
    }

    #[test]
    fn test_game_over_stops_and_reports_once() {
        let (mut frame_loop, log) = new_loop();
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        frame_loop.set_on_game_over(move |over| sink.borrow_mut().push(*over));

        frame_loop.world.score = 55.5;
        frame_loop.world.avalanche_y = frame_loop.world.skier.pos.y - AVALANCHE_CATCH_THRESHOLD;
        frame_loop.start();

        let mut surface = FakeSurface::default();
        let outcome = frame_loop.on_frame(1000.0, Some(&mut surface));
        let FrameOutcome::GameOver(over) = outcome else {
            panic!("expected game over, got {outcome:?}");
        };
        assert_eq!(over.cause, GameOverCause::Avalanche);
        assert_eq!(over.score, 55);
        assert!(over.new_best);
        // The final frame is still drawn
        assert_eq!(surface.draws, 1);
        assert_eq!(surface.last_score, 55);

        assert!(!frame_loop.is_running());
        assert_eq!(log.borrow().requested.len(), 1);
        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(frame_loop.world().best_score, 55);

        // A finished run can't be started again without a restart
        frame_loop.start();
        assert!(!frame_loop.is_running());

        frame_loop.restart(8);
        assert!(frame_loop.is_running());
        assert_eq!(frame_loop.world().score, 0.0);
        assert_eq!(frame_loop.world().best_score, 55);
        assert_eq!(log.borrow().requested.len(), 2);
    }

    #[test]
    fn test_tap_between_frames_flips_direction() {
        let (mut frame_loop, _log) = new_loop();
        let mut surface = FakeSurface::default();
        frame_loop.start();
        frame_loop.on_frame(1000.0, Some(&mut surface));

        frame_loop.press();
        frame_loop.release();
        frame_loop.on_frame(1016.0, Some(&mut surface));
        assert_eq!(frame_loop.world().skier.next_direction, TurnDirection::Right);
        assert!(!frame_loop.world().skier.holding);

        // Exactly once per tap
        frame_loop.on_frame(1032.0, Some(&mut surface));
        assert_eq!(frame_loop.world().skier.next_direction, TurnDirection::Right);

        frame_loop.set_holding(true);
        frame_loop.set_holding(false);
        frame_loop.on_frame(1048.0, Some(&mut surface));
        assert_eq!(frame_loop.world().skier.next_direction, TurnDirection::Left);
    }

    #[test]
    fn test_holding_reaches_the_skier() {
        let (mut frame_loop, _log) = new_loop();
        let mut surface = FakeSurface::default();
        frame_loop.start();
        frame_loop.set_holding(true);
        frame_loop.on_frame(1000.0, Some(&mut surface));
        assert!(frame_loop.world().skier.holding);

        frame_loop.set_holding(false);
        frame_loop.on_frame(1016.0, Some(&mut surface));
        assert!(!frame_loop.world().skier.holding);
    }
}
