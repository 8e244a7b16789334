//! Per-frame simulation step
//!
//! Advances the world by one display frame, in a fixed order:
//! time delta, avalanche, turning, vertical placement and jumps, horizontal
//! motion, trail, spawning, scroll/cull, NPCs, terminal checks, score.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionKind, avalanche_caught, find_collision, ramp_under_skier};
use super::npc::update_npcs;
use super::spawn::{scroll_obstacles, spawn_npcs, spawn_trees};
use super::state::{Canvas, GamePhase, Heading, World};
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{ease_toward, level_for_score};

/// Boundary inputs for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Monotonic frame timestamp (ms)
    pub timestamp_ms: f64,
    /// Pointer currently held
    pub holding: bool,
    /// Current canvas size (may change between frames)
    pub canvas: Canvas,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    Avalanche,
    Collision(CollisionKind),
}

/// Emitted once, on the frame the run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    /// Floored final score
    pub score: u64,
    pub cause: GameOverCause,
    /// Score beat the best known when the session started
    pub new_best: bool,
}

/// Seconds since the previous frame, clamped to `[0, MAX_FRAME_DT]`
pub fn frame_delta(last_ms: Option<f64>, now_ms: f64) -> f32 {
    match last_ms {
        Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
        None => 0.0,
    }
}

/// Turn depth for a hold of the given length.
///
/// 0 → 1 over the initial turn, then 1 → MAX_EXTENDED_ROTATION / MAX_ROTATION
/// over the extended turn.
pub fn rotation_progress(hold_secs: f32) -> f32 {
    let hold_secs = hold_secs.max(0.0);
    if hold_secs <= TURN_PROGRESSION_TIME {
        hold_secs / TURN_PROGRESSION_TIME
    } else {
        let extended = ((hold_secs - TURN_PROGRESSION_TIME) / EXTENDED_TURN_TIME).min(1.0);
        1.0 + extended * (MAX_EXTENDED_ROTATION / MAX_ROTATION - 1.0)
    }
}

/// Scale on turn acceleration and max sideways velocity for extended turns
#[inline]
pub fn rotation_multiplier(progress: f32) -> f32 {
    1.0 + (progress - 1.0).max(0.0) * 2.0
}

/// Advance the world by one frame.
///
/// Returns the game-over record on the frame the run ends; later calls are
/// no-ops until the world is restarted.
pub fn step(world: &mut World, input: &FrameInput, tuning: &Tuning) -> Option<GameOver> {
    if world.phase == GamePhase::GameOver {
        return None;
    }

    world.canvas = input.canvas;
    world.skier.set_holding(input.holding);

    // Time
    let now = input.timestamp_ms;
    let dt = frame_delta(world.last_frame_ms, now);
    world.last_frame_ms = Some(now);
    if world.game_start_ms.is_none() {
        // The surface size is only known now
        world.skier.pos.x = input.canvas.width / 2.0;
        world.game_start_ms = Some(now);
        world.last_npc_spawn_ms = now;
        log::info!(
            "Run started (seed {}, {}x{})",
            world.seed,
            input.canvas.width,
            input.canvas.height
        );
    }
    let elapsed = world
        .game_start_ms
        .map_or(0.0, |start| ((now - start) / 1000.0).max(0.0) as f32);

    world.background_offset += world.skier.speed * dt;

    advance_avalanche(world, elapsed, dt, tuning);
    update_turning(world, now, dt);
    update_camera_shake(world);
    update_vertical(world, dt);
    integrate_horizontal(world, dt);

    let scroll = world.skier.speed * dt;
    update_trail(world, now, scroll);

    spawn_trees(world, now, tuning);
    spawn_npcs(world, now, tuning);

    scroll_obstacles(world, scroll);
    world.avalanche_y -= scroll;

    update_npcs(world, dt);

    if let Some(over) = check_terminal(world) {
        return Some(over);
    }

    accrue_score(world, dt, tuning);
    None
}

/// Avalanche speed ramps with session time (and level), then it advances
fn advance_avalanche(world: &mut World, elapsed: f32, dt: f32, tuning: &Tuning) {
    let level_bonus = tuning.avalanche_level_acceleration * world.level.saturating_sub(1) as f32;
    world.avalanche_speed = (AVALANCHE_BASE_SPEED + (AVALANCHE_ACCELERATION + level_bonus) * elapsed)
        .min(AVALANCHE_MAX_SPEED);
    world.avalanche_y += world.avalanche_speed * dt;
}

/// Hold/release state machine: target rotation, speed and velocity-x
fn update_turning(world: &mut World, now: f64, dt: f32) {
    let airborne = world.jump.airborne;
    let skier = &mut world.skier;
    let speed_factor = (skier.speed - MIN_SPEED) / (MAX_SPEED - MIN_SPEED);

    if skier.holding {
        let start = *skier.hold_start_ms.get_or_insert(now);
        let hold_secs = ((now - start) / 1000.0) as f32;
        let progress = rotation_progress(hold_secs);
        let direction = skier.next_direction;

        skier.target_rotation = direction.sign() * MAX_ROTATION * progress;
        skier.heading = direction.into();

        // In the air the turn is cosmetic only
        if !airborne {
            let rotation_factor = (MAX_ROTATION * progress).abs() / MAX_EXTENDED_ROTATION;
            let penalty = SPEED_DECELERATION * (1.0 + rotation_factor * ROTATION_SPEED_PENALTY);
            skier.speed = (skier.speed - penalty * dt).max(MIN_SPEED);

            let multiplier = rotation_multiplier(progress);
            let max_velocity = MAX_TURN_VELOCITY
                * (0.4 + speed_factor * 1.2)
                * multiplier
                * HORIZONTAL_SPEED_MULTIPLIER;
            let acceleration = BASE_TURN_ACCELERATION
                * (1.0 + speed_factor * 1.5)
                * multiplier
                * HORIZONTAL_SPEED_MULTIPLIER;
            skier.velocity_x = (skier.velocity_x + direction.sign() * acceleration)
                .clamp(-max_velocity, max_velocity);
        }
    } else {
        skier.hold_start_ms = None;
        skier.target_rotation = 0.0;
        skier.heading = Heading::Straight;

        if !airborne {
            // Recovery is slower while still visibly turned
            let rotation_factor = skier.rotation.abs() / MAX_EXTENDED_ROTATION;
            let recovery = 1.0 - rotation_factor * 0.5;
            skier.speed = (skier.speed + SPEED_ACCELERATION * recovery * dt).min(MAX_SPEED);

            skier.velocity_x *= TURN_DAMPING;
            if skier.velocity_x.abs() < VELOCITY_EPSILON {
                skier.velocity_x = 0.0;
            }
        }
    }

    skier.rotation = ease_toward(skier.rotation, skier.target_rotation, ROTATION_SPEED)
        .clamp(-MAX_EXTENDED_ROTATION, MAX_EXTENDED_ROTATION);
    skier.speed = skier.speed.clamp(MIN_SPEED, MAX_SPEED);
}

/// Screen shake grows with speed above 300 px/s
fn update_camera_shake(world: &mut World) {
    let intensity = ((world.skier.speed - 300.0) / (MAX_SPEED - 300.0)).max(0.0) * 3.0;
    let x = (world.rng.random::<f32>() - 0.5) * intensity;
    let y = (world.rng.random::<f32>() - 0.5) * intensity;
    world.camera_shake = Vec2::new(x, y);
}

/// Speed-driven screen y, then ramp launch / projectile update
fn update_vertical(world: &mut World, dt: f32) {
    let speed = world.skier.speed;
    let target_y = if speed >= SPEED_THRESHOLD_MIN {
        let progress = ((speed - SPEED_THRESHOLD_MIN) / (MAX_SPEED - SPEED_THRESHOLD_MIN)).min(1.0);
        SKIER_Y_NEAR + (world.canvas.skier_y_far() - SKIER_Y_NEAR) * progress
    } else {
        SKIER_Y_NEAR
    };
    world.skier.pos.y = ease_toward(world.skier.pos.y, target_y, SKIER_Y_EASE);

    if world.jump.airborne {
        if world.jump.integrate(dt) {
            log::debug!("Landed");
        }
        return;
    }

    let ramp_id = ramp_under_skier(world.skier.pos, &world.jumps).map(|j| j.id);
    if let Some(id) = ramp_id {
        // Each ramp launches at most once
        if world.jump.ramp_id != Some(id) {
            world.jump.launch(id);
            log::debug!("Jump launched from ramp {}", id);
        }
    }
}

/// Curved motion on the ground, ballistic sideways drift in the air
fn integrate_horizontal(world: &mut World, dt: f32) {
    let skier = &mut world.skier;
    let lateral = if world.jump.airborne {
        skier.velocity_x
    } else {
        skier.velocity_x
            + skier.rotation.sin() * CURVE_FACTOR * skier.speed * HORIZONTAL_SPEED_MULTIPLIER
    };
    skier.pos.x += lateral * dt;
}

/// Record a trail point when far enough from the last one, age out, scroll
fn update_trail(world: &mut World, now: f64, scroll: f32) {
    let pos = world.skier.pos;
    let far_enough = world
        .trail
        .last()
        .is_none_or(|last| last.pos.distance(pos) >= TRAIL_SPACING);
    if far_enough {
        world.trail.push(super::state::TrailPoint {
            pos,
            timestamp_ms: now,
        });
    }

    world.trail.retain(|p| now - p.timestamp_ms < TRAIL_MAX_AGE_MS);
    for point in &mut world.trail {
        point.pos.y -= scroll;
    }
}

/// Avalanche catch first, then the collision oracle
fn check_terminal(world: &mut World) -> Option<GameOver> {
    let cause = if avalanche_caught(world.avalanche_y, world.skier.pos.y) {
        GameOverCause::Avalanche
    } else {
        let hit = find_collision(
            world.skier.pos,
            &world.trees,
            world.canvas.width,
            world.jump.height,
            &world.npcs,
        )?;
        GameOverCause::Collision(hit)
    };

    world.phase = GamePhase::GameOver;
    let over = GameOver {
        score: world.floored_score(),
        cause,
        new_best: world.score > world.best_score as f32,
    };
    log::info!(
        "Game over: {:?}, score {}m{}",
        over.cause,
        over.score,
        if over.new_best { " (new best)" } else { "" }
    );
    Some(over)
}

/// Score is distance descended; level follows from it
fn accrue_score(world: &mut World, dt: f32, tuning: &Tuning) {
    world.score += (world.skier.speed / SCORE_SPEED_DIVISOR) * dt;
    let level = level_for_score(world.score, tuning.score_per_level);
    if level != world.level {
        log::debug!("Level {} at {}m", level, world.floored_score());
        world.level = level;
    }
}
