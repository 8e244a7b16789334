//! World state and core simulation types
//!
//! Everything one play session mutates lives in [`World`]; the step function
//! takes it by `&mut` and nothing else holds on to it.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, skier_hitbox};
use crate::consts::*;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Frames advance the world
    Playing,
    /// Run ended; stepping is a no-op until restart
    GameOver,
}

/// Side the next (or current) turn goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }

    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }
}

/// What the skier is doing this frame (HUD arrow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Straight,
    Left,
    Right,
}

impl From<TurnDirection> for Heading {
    fn from(dir: TurnDirection) -> Self {
        match dir {
            TurnDirection::Left => Heading::Left,
            TurnDirection::Right => Heading::Right,
        }
    }
}

/// Drawable area in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Skier screen y at full speed
    #[inline]
    pub fn skier_y_far(&self) -> f32 {
        self.height * SKIER_Y_FAR_FRACTION
    }

    /// Screen y where new entities appear
    #[inline]
    pub fn spawn_y(&self) -> f32 {
        self.height + SPAWN_BELOW_SCREEN
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(600.0, 800.0)
    }
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skier {
    pub pos: Vec2,
    pub velocity_x: f32,
    /// Filtered rotation (radians, negative = left)
    pub rotation: f32,
    pub target_rotation: f32,
    /// Downhill speed, also the world scroll rate (px/s)
    pub speed: f32,
    pub holding: bool,
    /// Timestamp of the frame the current hold was first seen
    pub hold_start_ms: Option<f64>,
    /// Direction the next hold turns toward
    pub next_direction: TurnDirection,
    pub heading: Heading,
}

impl Skier {
    pub fn new(x: f32) -> Self {
        Self {
            pos: Vec2::new(x, SKIER_Y_NEAR),
            velocity_x: 0.0,
            rotation: 0.0,
            target_rotation: 0.0,
            speed: INITIAL_SPEED,
            holding: false,
            hold_start_ms: None,
            next_direction: TurnDirection::Left,
            heading: Heading::Straight,
        }
    }

    /// Pointer went down
    pub fn press(&mut self) {
        self.holding = true;
    }

    /// Pointer went up. Flips the next turn direction once per hold.
    pub fn release(&mut self) {
        if self.holding {
            self.holding = false;
            self.next_direction = self.next_direction.flipped();
        }
    }

    /// Apply the boundary's current hold signal
    pub fn set_holding(&mut self, holding: bool) {
        if holding {
            self.press();
        } else {
            self.release();
        }
    }

    /// Collision box: the skier square shrunk by the collision margin
    pub fn hitbox(&self) -> Rect {
        skier_hitbox(self.pos)
    }
}

/// Vertical projectile state for ramp jumps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JumpState {
    /// Height above the snow (never negative)
    pub height: f32,
    /// Vertical velocity (px/s, positive = up)
    pub velocity: f32,
    pub airborne: bool,
    /// Ramp that launched the current or most recent jump
    pub ramp_id: Option<u32>,
}

impl JumpState {
    /// Leave the ground from the given ramp
    pub fn launch(&mut self, ramp_id: u32) {
        self.airborne = true;
        self.velocity = JUMP_LAUNCH_VELOCITY;
        self.height = 0.0;
        self.ramp_id = Some(ramp_id);
    }

    /// Advance the projectile. Returns true on the frame the skier lands.
    pub fn integrate(&mut self, dt: f32) -> bool {
        if !self.airborne {
            return false;
        }
        self.velocity -= GRAVITY * dt;
        self.height += self.velocity * dt;
        if self.height <= 0.0 {
            self.height = 0.0;
            self.velocity = 0.0;
            self.airborne = false;
            return true;
        }
        false
    }

    /// High enough to pass over trees and NPC skiers
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.height >= JUMP_CLEAR_HEIGHT
    }
}

/// Apex height of a ramp jump
pub fn jump_peak_height() -> f32 {
    JUMP_LAUNCH_VELOCITY * JUMP_LAUNCH_VELOCITY / (2.0 * GRAVITY)
}

/// A tree obstacle. `pos` is the canopy anchor; the trunk hangs below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: u32,
    pub pos: Vec2,
}

impl Tree {
    /// The trunk-only collision box
    pub fn trunk_rect(&self) -> Rect {
        Rect {
            left: self.pos.x - TRUNK_HALF_WIDTH,
            right: self.pos.x + TRUNK_HALF_WIDTH,
            top: self.pos.y + TRUNK_OFFSET_Y,
            bottom: self.pos.y + TRUNK_OFFSET_Y + TRUNK_HEIGHT,
        }
    }
}

/// A jump ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jump {
    pub id: u32,
    pub pos: Vec2,
    /// Tree this ramp lets the skier clear
    pub tree_id: Option<u32>,
}

impl Jump {
    /// Area that launches the skier when their lower edge enters it
    pub fn footprint(&self) -> Rect {
        Rect {
            left: self.pos.x - JUMP_WIDTH / 2.0,
            right: self.pos.x + JUMP_WIDTH / 2.0,
            top: self.pos.y,
            bottom: self.pos.y + JUMP_DEPTH,
        }
    }
}

/// An AI-controlled skier sharing the slope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcSkier {
    pub id: u32,
    pub pos: Vec2,
    pub rotation: f32,
    pub target_rotation: f32,
    pub velocity_x: f32,
    /// Own downhill speed (px/s)
    pub speed: f32,
    pub turn_direction: TurnDirection,
    /// Seconds until the turn direction flips
    pub turn_timer: f32,
}

impl NpcSkier {
    /// Full skier-sized bounding box
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, SKIER_SIZE / 2.0)
    }
}

/// A point of the skier's track in the snow
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub timestamp_ms: f64,
}

fn unseeded_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete state of one play session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Session seed for reproducibility
    pub seed: u64,
    /// Session RNG; restored with [`World::reseed`] after deserializing
    #[serde(skip, default = "unseeded_rng")]
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub canvas: Canvas,
    pub skier: Skier,
    pub jump: JumpState,
    /// Metres descended (unfloored)
    pub score: f32,
    /// Derived from score, starts at 1
    pub level: u32,
    /// Best score known when the session started
    pub best_score: u64,
    pub avalanche_y: f32,
    pub avalanche_speed: f32,
    pub camera_shake: Vec2,
    pub background_offset: f32,
    pub last_frame_ms: Option<f64>,
    pub game_start_ms: Option<f64>,
    pub last_tree_spawn_ms: f64,
    pub last_npc_spawn_ms: f64,
    /// Trees in spawn order
    pub trees: Vec<Tree>,
    /// Jump ramps in spawn order
    pub jumps: Vec<Jump>,
    /// NPC skiers in spawn order
    pub npcs: Vec<NpcSkier>,
    /// Oldest point first
    pub trail: Vec<TrailPoint>,
    next_tree_id: u32,
    next_jump_id: u32,
    next_npc_id: u32,
}

impl World {
    /// Create a fresh session
    pub fn new(seed: u64, canvas: Canvas, best_score: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            canvas,
            skier: Skier::new(canvas.width / 2.0),
            jump: JumpState::default(),
            score: 0.0,
            level: 1,
            best_score,
            avalanche_y: AVALANCHE_START_Y,
            avalanche_speed: AVALANCHE_BASE_SPEED,
            camera_shake: Vec2::ZERO,
            background_offset: 0.0,
            last_frame_ms: None,
            game_start_ms: None,
            last_tree_spawn_ms: 0.0,
            last_npc_spawn_ms: 0.0,
            trees: Vec::new(),
            jumps: Vec::new(),
            npcs: Vec::new(),
            trail: Vec::new(),
            next_tree_id: 0,
            next_jump_id: 0,
            next_npc_id: 0,
        }
    }

    /// Start over with a new seed, keeping canvas and best score
    pub fn restart(&mut self, seed: u64) {
        *self = Self::new(seed, self.canvas, self.best_score);
    }

    /// Reset the RNG stream to the start of `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    pub fn next_tree_id(&mut self) -> u32 {
        let id = self.next_tree_id;
        self.next_tree_id += 1;
        id
    }

    pub fn next_jump_id(&mut self) -> u32 {
        let id = self.next_jump_id;
        self.next_jump_id += 1;
        id
    }

    pub fn next_npc_id(&mut self) -> u32 {
        let id = self.next_npc_id;
        self.next_npc_id += 1;
        id
    }

    /// Score as shown to the player
    #[inline]
    pub fn floored_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    /// Whether the session ended
    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}
