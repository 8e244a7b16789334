//! Browser binding
//!
//! `SkiGame` runs the frame loop on `requestAnimationFrame`. The host page
//! owns the canvas: it passes a draw callback that receives each frame's
//! `FrameView` as JSON, forwards pointer down/up, and listens for game over.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::best_score::BestScore;
use crate::platform::{FrameHandle, FrameLoop, FrameOutcome, FrameScheduler, RenderSurface};
use crate::renderer::FrameView;
use crate::sim::state::{Canvas, World};
use crate::tuning::Tuning;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger already set: {}", e)));
    }
    log::info!("Downhill Ski loaded");
}

/// `requestAnimationFrame` scheduler around a single reusable callback
struct RafScheduler {
    callback: FrameCallback,
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = web_sys::window()?;
        let callback = self.callback.borrow();
        let callback = callback.as_ref()?;
        window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .ok()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle);
        }
    }
}

/// Canvas owned by the host page
struct JsSurface {
    width: f32,
    height: f32,
    draw: js_sys::Function,
}

impl RenderSurface for JsSurface {
    fn size(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    fn draw(&mut self, view: &FrameView) {
        match serde_json::to_string(view) {
            Ok(json) => {
                if let Err(e) = self.draw.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::error!("Draw callback failed: {:?}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize frame: {}", e),
        }
    }
}

#[wasm_bindgen]
pub struct SkiGame {
    frame_loop: Rc<RefCell<FrameLoop<RafScheduler>>>,
    surface: Rc<RefCell<Option<JsSurface>>>,
    listener: Rc<RefCell<Option<js_sys::Function>>>,
    best: Rc<RefCell<BestScore>>,
    // Keeps the rAF closure alive for the game's lifetime
    _callback: FrameCallback,
}

#[wasm_bindgen]
impl SkiGame {
    /// New game. `tuning_json` optionally overrides difficulty scaling.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<SkiGame, JsValue> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => Tuning::default(),
        };

        let best = Rc::new(RefCell::new(BestScore::load()));
        let seed = js_sys::Date::now() as u64;
        let world = World::new(seed, Canvas::default(), best.borrow().best);

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let scheduler = RafScheduler {
            callback: callback.clone(),
        };
        let frame_loop = Rc::new(RefCell::new(FrameLoop::new(world, tuning, scheduler)));

        {
            let best = best.clone();
            frame_loop.borrow_mut().set_on_game_over(move |over| {
                let mut best = best.borrow_mut();
                if best.record(over.score) {
                    if let Err(e) = best.save() {
                        log::warn!("Could not save best score: {}", e);
                    }
                }
            });
        }

        let surface: Rc<RefCell<Option<JsSurface>>> = Rc::new(RefCell::new(None));
        let listener: Rc<RefCell<Option<js_sys::Function>>> = Rc::new(RefCell::new(None));

        {
            let weak = Rc::downgrade(&frame_loop);
            let surface = surface.clone();
            let listener = listener.clone();
            *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
                let Some(frame_loop) = weak.upgrade() else {
                    return;
                };
                let outcome = {
                    let mut surface = surface.borrow_mut();
                    frame_loop.borrow_mut().on_frame(
                        timestamp,
                        surface.as_mut().map(|s| s as &mut dyn RenderSurface),
                    )
                };
                // Notify after releasing the loop so the host may restart from the callback
                if let FrameOutcome::GameOver(over) = outcome {
                    if let Some(listener) = listener.borrow().as_ref() {
                        let _ = listener.call2(
                            &JsValue::NULL,
                            &JsValue::from_f64(over.score as f64),
                            &JsValue::from_bool(over.new_best),
                        );
                    }
                }
            }));
        }

        log::info!("Game initialized with seed: {}", seed);
        Ok(SkiGame {
            frame_loop,
            surface,
            listener,
            best,
            _callback: callback,
        })
    }

    /// Provide the drawing target. `draw` receives each frame as JSON.
    pub fn attach_surface(&self, width: f32, height: f32, draw: js_sys::Function) {
        *self.surface.borrow_mut() = Some(JsSurface {
            width,
            height,
            draw,
        });
    }

    /// Frames without a surface stall the loop until `start` is called again
    pub fn detach_surface(&self) {
        self.surface.borrow_mut().take();
    }

    pub fn resize(&self, width: f32, height: f32) {
        if let Some(surface) = self.surface.borrow_mut().as_mut() {
            surface.width = width;
            surface.height = height;
        }
    }

    /// `callback(score, newBest)` on game over
    pub fn on_game_over(&self, callback: js_sys::Function) {
        *self.listener.borrow_mut() = Some(callback);
    }

    /// Pointer/touch down; call from the event handler
    pub fn press(&self) {
        self.frame_loop.borrow_mut().press();
    }

    /// Pointer/touch up. A tap shorter than one frame still flips the turn.
    pub fn release(&self) {
        self.frame_loop.borrow_mut().release();
    }

    pub fn set_holding(&self, holding: bool) {
        self.frame_loop.borrow_mut().set_holding(holding);
    }

    pub fn start(&self) {
        self.frame_loop.borrow_mut().start();
    }

    pub fn stop(&self) {
        self.frame_loop.borrow_mut().stop();
    }

    pub fn restart(&self) {
        self.frame_loop
            .borrow_mut()
            .restart(js_sys::Date::now() as u64);
    }

    pub fn best_score(&self) -> f64 {
        self.best.borrow().best as f64
    }
}

impl Drop for SkiGame {
    fn drop(&mut self) {
        self.frame_loop.borrow_mut().stop();
    }
}
