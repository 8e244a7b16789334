//! NPC skier controller
//!
//! Each NPC zigzags on its own timer, shies away from nearby trees and the
//! canvas edges, and scrolls relative to the player by the difference between
//! the world speed and its own. NPCs never interact with each other.

use glam::Vec2;
use rand::Rng;

use super::state::{NpcSkier, Tree, TurnDirection, World};
use crate::consts::*;
use crate::ease_toward;

/// Fresh countdown until the next turn flip
pub fn random_turn_timer(rng: &mut impl Rng) -> f32 {
    rng.random_range(NPC_TURN_TIMER_MIN..=NPC_TURN_TIMER_MAX)
}

/// A new NPC at the given position with randomized speed and zigzag phase
pub fn new_npc(id: u32, pos: Vec2, rng: &mut impl Rng) -> NpcSkier {
    let turn_direction = if rng.random_bool(0.5) {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    };
    NpcSkier {
        id,
        pos,
        rotation: 0.0,
        target_rotation: 0.0,
        velocity_x: 0.0,
        speed: rng.random_range(NPC_MIN_SPEED..=NPC_MAX_SPEED),
        turn_direction,
        turn_timer: random_turn_timer(rng),
    }
}

/// Horizontal push away from close trees and canvas edges (px/s²)
pub fn avoidance_force(pos: Vec2, trees: &[Tree], canvas_width: f32) -> f32 {
    let mut force = 0.0;

    for tree in trees {
        let offset = pos - tree.pos;
        let dist = offset.length();
        if dist < NPC_AVOID_RADIUS {
            let away = if offset.x >= 0.0 { 1.0 } else { -1.0 };
            force += away * NPC_AVOID_STRENGTH / dist.max(1.0);
        }
    }

    let left_gap = pos.x;
    if left_gap < NPC_EDGE_AVOID_DISTANCE {
        force += NPC_AVOID_STRENGTH / left_gap.max(1.0);
    }
    let right_gap = canvas_width - pos.x;
    if right_gap < NPC_EDGE_AVOID_DISTANCE {
        force -= NPC_AVOID_STRENGTH / right_gap.max(1.0);
    }

    force
}

/// Advance one NPC's steering for this frame (does not scroll it)
pub fn steer(npc: &mut NpcSkier, trees: &[Tree], canvas_width: f32, dt: f32, rng: &mut impl Rng) {
    npc.turn_timer -= dt;
    if npc.turn_timer <= 0.0 {
        npc.turn_direction = npc.turn_direction.flipped();
        npc.turn_timer = random_turn_timer(rng);
    }

    // Ease toward the zigzag target, harder when far from it
    let target_velocity = npc.turn_direction.sign() * NPC_MAX_VELOCITY * NPC_TARGET_FRACTION;
    let gap = target_velocity - npc.velocity_x;
    let response = if gap.abs() > NPC_MAX_VELOCITY * 0.5 {
        2.0
    } else if gap.abs() > NPC_MAX_VELOCITY * 0.1 {
        1.0
    } else {
        0.5
    };
    let correction = gap * NPC_TURN_RESPONSE * response;
    npc.velocity_x += correction;

    if correction.abs() > 0.01 {
        npc.velocity_x += avoidance_force(npc.pos, trees, canvas_width) * NPC_AVOIDANCE_WEIGHT * dt;
    }

    npc.velocity_x *= if npc.velocity_x.abs() < NPC_LOW_SPEED {
        NPC_LOW_SPEED_DAMPING
    } else {
        NPC_DAMPING
    };
    npc.velocity_x = npc.velocity_x.clamp(-NPC_MAX_VELOCITY, NPC_MAX_VELOCITY);

    // Lean follows velocity directly
    npc.target_rotation = (npc.velocity_x / NPC_MAX_VELOCITY) * MAX_ROTATION;
    npc.rotation = ease_toward(npc.rotation, npc.target_rotation, NPC_ROTATION_EASE);

    npc.pos.x += npc.velocity_x * dt;
    let min_x = SKIER_COLLISION_MARGIN + SKIER_SIZE / 2.0;
    let max_x = canvas_width - min_x;
    npc.pos.x = if max_x >= min_x {
        npc.pos.x.clamp(min_x, max_x)
    } else {
        canvas_width / 2.0
    };
}

/// Scroll, steer and cull every NPC
pub fn update_npcs(world: &mut World, dt: f32) {
    let World {
        npcs,
        trees,
        rng,
        canvas,
        skier,
        ..
    } = world;

    let world_speed = skier.speed;
    for npc in npcs.iter_mut() {
        // Faster NPCs than the world drift down-screen
        npc.pos.y -= (world_speed - npc.speed) * dt;
        steer(npc, trees, canvas.width, dt, rng);
    }

    let below = canvas.height + NPC_DESPAWN_BELOW;
    let before = npcs.len();
    npcs.retain(|npc| npc.pos.y > CULL_ABOVE_Y && npc.pos.y < below);
    if npcs.len() != before {
        log::trace!("Culled {} NPC skiers", before - npcs.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Canvas;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn npc(x: f32, dir: TurnDirection, timer: f32) -> NpcSkier {
        NpcSkier {
            id: 0,
            pos: Vec2::new(x, 400.0),
            rotation: 0.0,
            target_rotation: 0.0,
            velocity_x: 0.0,
            speed: 150.0,
            turn_direction: dir,
            turn_timer: timer,
        }
    }

    #[test]
    fn test_new_npc_is_randomized_within_ranges() {
        let mut rng = Pcg32::seed_from_u64(5);
        for id in 0..50 {
            let n = new_npc(id, Vec2::new(100.0, 850.0), &mut rng);
            assert!((NPC_MIN_SPEED..=NPC_MAX_SPEED).contains(&n.speed));
            assert!((NPC_TURN_TIMER_MIN..=NPC_TURN_TIMER_MAX).contains(&n.turn_timer));
        }
    }

    #[test]
    fn test_turn_flips_when_timer_expires() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut n = npc(300.0, TurnDirection::Left, 0.01);
        steer(&mut n, &[], 600.0, 1.0 / 60.0, &mut rng);
        assert_eq!(n.turn_direction, TurnDirection::Right);
        assert!(n.turn_timer >= NPC_TURN_TIMER_MIN);

        // Timer not yet expired: direction holds
        let mut n = npc(300.0, TurnDirection::Left, 1.0);
        steer(&mut n, &[], 600.0, 1.0 / 60.0, &mut rng);
        assert_eq!(n.turn_direction, TurnDirection::Left);
    }

    #[test]
    fn test_zigzag_velocity_follows_direction() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut n = npc(300.0, TurnDirection::Right, 100.0);
        for _ in 0..60 {
            steer(&mut n, &[], 600.0, 1.0 / 60.0, &mut rng);
        }
        assert!(n.velocity_x > 0.0);
        assert!(n.velocity_x <= NPC_MAX_VELOCITY * NPC_TARGET_FRACTION);
        assert!(n.rotation > 0.0 && n.rotation <= MAX_ROTATION);
    }

    #[test]
    fn test_position_clamped_to_canvas() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut n = npc(0.0, TurnDirection::Left, 100.0);
        n.velocity_x = -NPC_MAX_VELOCITY;
        steer(&mut n, &[], 600.0, 1.0 / 60.0, &mut rng);
        assert_eq!(n.pos.x, SKIER_COLLISION_MARGIN + SKIER_SIZE / 2.0);
    }

    #[test]
    fn test_avoidance_pushes_away_from_tree_and_edges() {
        let tree = Tree {
            id: 0,
            pos: Vec2::new(300.0, 400.0),
        };
        let right_of_tree = Vec2::new(320.0, 400.0);
        assert!(avoidance_force(right_of_tree, &[tree.clone()], 600.0) > 0.0);
        let left_of_tree = Vec2::new(280.0, 400.0);
        assert!(avoidance_force(left_of_tree, &[tree.clone()], 600.0) < 0.0);
        // Out of range
        assert_eq!(avoidance_force(Vec2::new(300.0, 600.0), &[tree], 600.0), 0.0);

        assert!(avoidance_force(Vec2::new(20.0, 0.0), &[], 600.0) > 0.0);
        assert!(avoidance_force(Vec2::new(580.0, 0.0), &[], 600.0) < 0.0);
    }

    #[test]
    fn test_update_scrolls_by_speed_difference_and_culls() {
        let mut world = World::new(1, Canvas::new(600.0, 800.0), 0);
        world.skier.speed = 300.0;
        let mut slow = npc(300.0, TurnDirection::Left, 100.0);
        slow.id = 1;
        slow.speed = 100.0;
        let mut gone = npc(300.0, TurnDirection::Left, 100.0);
        gone.id = 2;
        gone.pos.y = CULL_ABOVE_Y + 1.0;
        world.npcs = vec![slow, gone];

        update_npcs(&mut world, 0.1);

        assert_eq!(world.npcs.len(), 1);
        assert_eq!(world.npcs[0].id, 1);
        assert!((world.npcs[0].pos.y - (400.0 - 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_faster_npc_drifts_down_and_is_culled_below() {
        let mut world = World::new(1, Canvas::new(600.0, 800.0), 0);
        world.skier.speed = 100.0;
        let mut fast = npc(300.0, TurnDirection::Left, 100.0);
        fast.speed = 200.0;
        fast.pos.y = 800.0 + NPC_DESPAWN_BELOW - 5.0;
        world.npcs = vec![fast];

        update_npcs(&mut world, 0.1);
        assert!(world.npcs.is_empty());
    }
}
