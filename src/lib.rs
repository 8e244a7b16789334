//! Downhill Ski - an endless downhill arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (turning, jumps, spawning, NPC skiers, collisions)
//! - `tuning`: Data-driven difficulty scaling
//! - `best_score`: Best-score persistence
//! - `renderer`: Render-facing projections of the world (sprite frames, layering)
//! - `platform`: Frame loop driver (scheduling, cancellation)

pub mod best_score;
pub mod platform;
pub mod renderer;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use best_score::BestScore;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

    /// Largest frame delta the simulation accepts (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    // === Speed ===
    /// Downhill speed at session start (px/s)
    pub const INITIAL_SPEED: f32 = 140.0;
    /// Speed gained per second while going straight
    pub const SPEED_ACCELERATION: f32 = 80.0;
    /// Base speed lost per second while turning
    pub const SPEED_DECELERATION: f32 = 40.0;
    pub const MIN_SPEED: f32 = 100.0;
    pub const MAX_SPEED: f32 = 700.0;
    /// How strongly rotation depth scales the turning speed loss
    pub const ROTATION_SPEED_PENALTY: f32 = 2.5;

    // === Turning ===
    pub const BASE_TURN_ACCELERATION: f32 = 0.08;
    pub const MAX_TURN_VELOCITY: f32 = 4.0;
    /// Global multiplier for sideways movement
    pub const HORIZONTAL_SPEED_MULTIPLIER: f32 = 0.8;
    /// Per-frame velocity-x retention while going straight
    pub const TURN_DAMPING: f32 = 0.12;
    /// Velocity-x below this snaps to zero
    pub const VELOCITY_EPSILON: f32 = 0.01;
    /// Fraction of the rotation error closed each frame
    pub const ROTATION_SPEED: f32 = 0.12;
    /// 30 degrees, reached at the end of the initial turn
    pub const MAX_ROTATION: f32 = FRAC_PI_6;
    /// 90 degrees (horizontal), reached at the end of the extended turn
    pub const MAX_EXTENDED_ROTATION: f32 = FRAC_PI_2;
    /// Seconds of holding to reach MAX_ROTATION
    pub const TURN_PROGRESSION_TIME: f32 = 0.5;
    /// Further seconds of holding to reach MAX_EXTENDED_ROTATION
    pub const EXTENDED_TURN_TIME: f32 = 2.0;
    /// How much rotation bends the path sideways
    pub const CURVE_FACTOR: f32 = 0.95;

    // === Skier ===
    pub const SKIER_SIZE: f32 = 44.0;
    pub const SKIER_COLLISION_MARGIN: f32 = 14.0;
    /// Screen y of the skier when slow
    pub const SKIER_Y_NEAR: f32 = 150.0;
    /// Screen y of the skier at max speed, as a fraction of canvas height
    pub const SKIER_Y_FAR_FRACTION: f32 = 0.75;
    /// Speed above which the skier drifts down the screen
    pub const SPEED_THRESHOLD_MIN: f32 = 300.0;
    /// Per-frame smoothing rate of the skier's screen y
    pub const SKIER_Y_EASE: f32 = 0.05;

    // === Trail ===
    /// Minimum distance between recorded trail points (px)
    pub const TRAIL_SPACING: f32 = 15.0;
    /// Trail point lifetime (ms)
    pub const TRAIL_MAX_AGE_MS: f64 = 1500.0;

    // === Trees ===
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 550.0;
    pub const SPAWN_INTERVAL_MEDIUM_MS: f64 = 480.0;
    pub const SPAWN_INTERVAL_FAST_MS: f64 = 420.0;
    pub const SPAWN_SPEED_MEDIUM: f32 = 200.0;
    pub const SPAWN_SPEED_FAST: f32 = 260.0;
    /// Trees keep this far from either canvas edge
    pub const TREE_SPAWN_MARGIN_X: f32 = 50.0;
    /// Entities spawn this far below the bottom edge
    pub const SPAWN_BELOW_SCREEN: f32 = 50.0;
    /// Entities above this y are culled
    pub const CULL_ABOVE_Y: f32 = -100.0;
    /// Trunk collision box, relative to the tree anchor
    pub const TRUNK_HALF_WIDTH: f32 = 8.0;
    pub const TRUNK_OFFSET_Y: f32 = 20.0;
    pub const TRUNK_HEIGHT: f32 = 20.0;

    // === Jumps ===
    pub const JUMP_WIDTH: f32 = 48.0;
    /// Vertical span of the ramp footprint
    pub const JUMP_DEPTH: f32 = 16.0;
    /// Ramp sits this far above (in front of) its tree
    pub const JUMP_TREE_OFFSET: f32 = 80.0;
    /// Initial upward velocity on launch (px/s)
    pub const JUMP_LAUNCH_VELOCITY: f32 = 320.0;
    pub const GRAVITY: f32 = 900.0;
    /// Height at which ground obstacles no longer collide
    pub const JUMP_CLEAR_HEIGHT: f32 = 20.0;
    /// Sprite scale at the apex of a jump
    pub const JUMP_MAX_SCALE: f32 = 1.5;

    // === Avalanche ===
    pub const AVALANCHE_START_Y: f32 = -200.0;
    pub const AVALANCHE_BASE_SPEED: f32 = 120.0;
    /// Avalanche speed gained per second of session time
    pub const AVALANCHE_ACCELERATION: f32 = 15.0;
    pub const AVALANCHE_MAX_SPEED: f32 = 500.0;
    /// The avalanche catches the skier within this many px above them
    pub const AVALANCHE_CATCH_THRESHOLD: f32 = 30.0;

    // === NPC skiers ===
    pub const NPC_MIN_SPEED: f32 = 80.0;
    pub const NPC_MAX_SPEED: f32 = 200.0;
    /// Range of the turn-direction countdown (seconds)
    pub const NPC_TURN_TIMER_MIN: f32 = 0.8;
    pub const NPC_TURN_TIMER_MAX: f32 = 2.2;
    pub const NPC_MAX_VELOCITY: f32 = 90.0;
    /// Fraction of NPC_MAX_VELOCITY the zigzag aims for
    pub const NPC_TARGET_FRACTION: f32 = 0.7;
    pub const NPC_TURN_RESPONSE: f32 = 0.06;
    pub const NPC_DAMPING: f32 = 0.98;
    pub const NPC_LOW_SPEED_DAMPING: f32 = 0.995;
    /// Below this |velocity-x| the lighter damping applies
    pub const NPC_LOW_SPEED: f32 = 10.0;
    pub const NPC_AVOID_RADIUS: f32 = 70.0;
    pub const NPC_AVOID_STRENGTH: f32 = 8000.0;
    pub const NPC_EDGE_AVOID_DISTANCE: f32 = 60.0;
    pub const NPC_AVOIDANCE_WEIGHT: f32 = 0.3;
    pub const NPC_ROTATION_EASE: f32 = 0.2;
    /// NPCs drifting further than this below the canvas are culled
    pub const NPC_DESPAWN_BELOW: f32 = 200.0;

    // === Scoring ===
    /// Speed divisor for score accrual (score is metres descended)
    pub const SCORE_SPEED_DIVISOR: f32 = 100.0;

    // === Sprites ===
    pub const SPRITE_FRAME_COUNT: u32 = 5;
}

/// Exponential smoothing step: close `rate` of the gap to `target`
#[inline]
pub fn ease_toward(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Level derived from accumulated score (starts at 1)
#[inline]
pub fn level_for_score(score: f32, score_per_level: f32) -> u32 {
    if score <= 0.0 || score_per_level <= 0.0 {
        return 1;
    }
    (score / score_per_level).floor() as u32 + 1
}
