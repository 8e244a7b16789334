//! Per-frame draw snapshot
//!
//! `FrameView` is everything a drawing backend needs for one frame, with the
//! camera shake already applied. Draw order: background, avalanche, trail,
//! ramps, trunks, NPCs, skier (below canopies), canopies, skier (above).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sprite::{jump_scale, sprite_frame};
use crate::consts::{JUMP_CLEAR_HEIGHT, TRAIL_MAX_AGE_MS};
use crate::sim::state::{Heading, World};

/// The avalanche is not drawn while further above the screen than this
pub const AVALANCHE_DRAW_MIN_Y: f32 = -50.0;

/// Where the player sprite goes relative to tree canopies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkierLayer {
    /// Grounded: canopies overlap the skier
    BelowCanopies,
    /// High enough in a jump to pass over trees
    AboveCanopies,
}

pub fn skier_layer(jump_height: f32) -> SkierLayer {
    if jump_height >= JUMP_CLEAR_HEIGHT {
        SkierLayer::AboveCanopies
    } else {
        SkierLayer::BelowCanopies
    }
}

/// Trail opacity for a point of the given age: fades linearly to 0
pub fn trail_opacity(age_ms: f64) -> f32 {
    (1.0 - age_ms / TRAIL_MAX_AGE_MS).max(0.0) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkierView {
    pub pos: Vec2,
    pub frame: u32,
    pub scale: f32,
    pub layer: SkierLayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    pub width: f32,
    pub height: f32,
    pub background_offset: f32,
    /// None while the avalanche is off-screen
    pub avalanche_y: Option<f32>,
    pub trail: Vec<TrailSegment>,
    pub ramps: Vec<Vec2>,
    pub trees: Vec<Vec2>,
    /// NPC positions with their sprite frames
    pub npcs: Vec<(Vec2, u32)>,
    pub skier: SkierView,
    /// HUD values
    pub score: u64,
    pub level: u32,
    pub best_score: u64,
    pub heading: Heading,
}

impl FrameView {
    /// Snapshot the world as of `now_ms`
    pub fn capture(world: &World, now_ms: f64) -> Self {
        let shake = world.camera_shake;

        let avalanche_y = (world.avalanche_y >= AVALANCHE_DRAW_MIN_Y)
            .then_some(world.avalanche_y + shake.y);

        let trail = world
            .trail
            .windows(2)
            .filter_map(|pair| {
                let opacity = trail_opacity(now_ms - pair[0].timestamp_ms);
                (opacity > 0.0).then_some(TrailSegment {
                    from: pair[0].pos + shake,
                    to: pair[1].pos + shake,
                    opacity,
                })
            })
            .collect();

        Self {
            width: world.canvas.width,
            height: world.canvas.height,
            background_offset: world.background_offset,
            avalanche_y,
            trail,
            ramps: world.jumps.iter().map(|j| j.pos + shake).collect(),
            trees: world.trees.iter().map(|t| t.pos + shake).collect(),
            npcs: world
                .npcs
                .iter()
                .map(|n| (n.pos + shake, sprite_frame(n.rotation)))
                .collect(),
            skier: SkierView {
                pos: world.skier.pos + shake,
                frame: sprite_frame(world.skier.rotation),
                scale: jump_scale(world.jump.height),
                layer: skier_layer(world.jump.height),
            },
            score: world.floored_score(),
            level: world.level,
            best_score: world.best_score,
            heading: world.skier.heading,
        }
    }
}
