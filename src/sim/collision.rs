//! Collision detection
//!
//! All checks are discrete, per-frame axis-aligned box overlaps. Frame-to-frame
//! displacement is small next to entity sizes, so nothing here is swept.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Jump, NpcSkier, Tree};
use crate::consts::*;

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    /// Square of the given half extent around `center`
    pub fn centered(center: Vec2, half: f32) -> Self {
        Self {
            left: center.x - half,
            right: center.x + half,
            top: center.y - half,
            bottom: center.y + half,
        }
    }

    /// Strict overlap; touching edges don't count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right > other.left
            && self.left < other.right
            && self.bottom > other.top
            && self.top < other.bottom
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    Edge,
    Tree { id: u32 },
    Npc { id: u32 },
}

/// Player hitbox: the skier square shrunk by the collision margin
#[inline]
pub fn skier_hitbox(skier_pos: Vec2) -> Rect {
    Rect::centered(skier_pos, (SKIER_SIZE - SKIER_COLLISION_MARGIN) / 2.0)
}

/// Find the first thing the skier is hitting, if any.
///
/// Rules, in order:
/// 1. hitbox past either canvas edge (never suppressed)
/// 2. tree trunk overlap, unless the jump clears obstacles
/// 3. NPC skier overlap, unless the jump clears obstacles
pub fn find_collision(
    skier_pos: Vec2,
    trees: &[Tree],
    canvas_width: f32,
    jump_height: f32,
    npcs: &[NpcSkier],
) -> Option<CollisionKind> {
    let hitbox = skier_hitbox(skier_pos);

    if hitbox.left < 0.0 || hitbox.right > canvas_width {
        return Some(CollisionKind::Edge);
    }

    if jump_height >= JUMP_CLEAR_HEIGHT {
        return None;
    }

    if let Some(tree) = trees.iter().find(|t| hitbox.overlaps(&t.trunk_rect())) {
        return Some(CollisionKind::Tree { id: tree.id });
    }

    npcs.iter()
        .find(|npc| hitbox.overlaps(&npc.bounds()))
        .map(|npc| CollisionKind::Npc { id: npc.id })
}

/// Collision oracle: does the skier hit anything this frame?
#[inline]
pub fn collides(
    skier_pos: Vec2,
    trees: &[Tree],
    canvas_width: f32,
    jump_height: f32,
    npcs: &[NpcSkier],
) -> bool {
    find_collision(skier_pos, trees, canvas_width, jump_height, npcs).is_some()
}

/// Ramp whose footprint the skier's lower edge is entering.
///
/// The lower edge must lie within the ramp's vertical span and the skier
/// must overlap it horizontally.
pub fn ramp_under_skier(skier_pos: Vec2, jumps: &[Jump]) -> Option<&Jump> {
    let lower_edge = skier_pos.y + SKIER_SIZE / 2.0;
    let left = skier_pos.x - SKIER_SIZE / 2.0;
    let right = skier_pos.x + SKIER_SIZE / 2.0;
    jumps.iter().find(|jump| {
        let ramp = jump.footprint();
        lower_edge >= ramp.top && lower_edge <= ramp.bottom && right > ramp.left && left < ramp.right
    })
}

/// Has the avalanche front reached the skier?
#[inline]
pub fn avalanche_caught(avalanche_y: f32, skier_y: f32) -> bool {
    avalanche_y >= skier_y - AVALANCHE_CATCH_THRESHOLD
}
