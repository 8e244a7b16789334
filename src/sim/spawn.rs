//! Entity spawning and level-based spawn scaling
//!
//! Trees arrive on a speed-tiered timer that tightens with level; each tree
//! may bring a jump ramp. NPC skiers arrive on a flat wall-clock interval.

use glam::Vec2;
use rand::Rng;

use super::npc::new_npc;
use super::state::{Jump, Tree, World};
use crate::consts::*;
use crate::tuning::Tuning;

/// Tree spawn interval before level scaling (ms)
pub fn base_spawn_interval(speed: f32) -> f64 {
    if speed >= SPAWN_SPEED_FAST {
        SPAWN_INTERVAL_FAST_MS
    } else if speed >= SPAWN_SPEED_MEDIUM {
        SPAWN_INTERVAL_MEDIUM_MS
    } else {
        BASE_SPAWN_INTERVAL_MS
    }
}

/// Compounded per-level interval factor: `reduction^(level-1) / density^(level-1)`
pub fn level_multiplier(level: u32, tuning: &Tuning) -> f64 {
    let steps = level.saturating_sub(1) as i32;
    let reduction = (tuning.level_spawn_interval_reduction as f64).powi(steps);
    let density = (tuning.level_density_multiplier as f64).powi(steps);
    reduction / density
}

/// Effective tree spawn interval (ms), floored at the tuning minimum
pub fn tree_spawn_interval(speed: f32, level: u32, tuning: &Tuning) -> f64 {
    (base_spawn_interval(speed) * level_multiplier(level, tuning)).max(tuning.min_spawn_interval_ms)
}

/// Random spawn x keeping clear of the canvas edges
fn random_spawn_x(rng: &mut impl Rng, canvas_width: f32) -> f32 {
    let min = TREE_SPAWN_MARGIN_X;
    let max = canvas_width - TREE_SPAWN_MARGIN_X;
    if max > min {
        rng.random_range(min..max)
    } else {
        canvas_width / 2.0
    }
}

/// Spawn a tree (and maybe its ramp) if the tree timer has elapsed
pub fn spawn_trees(world: &mut World, now_ms: f64, tuning: &Tuning) {
    let interval = tree_spawn_interval(world.skier.speed, world.level, tuning);
    if now_ms - world.last_tree_spawn_ms <= interval {
        return;
    }
    if let Some(max) = tuning.max_trees {
        if world.trees.len() >= max {
            return;
        }
    }

    let x = random_spawn_x(&mut world.rng, world.canvas.width);
    let y = world.canvas.spawn_y();
    let tree_id = world.next_tree_id();
    world.trees.push(Tree {
        id: tree_id,
        pos: Vec2::new(x, y),
    });
    world.last_tree_spawn_ms = now_ms;
    log::trace!("Spawned tree {} at x={:.0}", tree_id, x);

    let chance = tuning.jump_spawn_chance.clamp(0.0, 1.0);
    if world.rng.random_bool(chance) {
        let jump_id = world.next_jump_id();
        world.jumps.push(Jump {
            id: jump_id,
            pos: Vec2::new(x, y - JUMP_TREE_OFFSET),
            tree_id: Some(tree_id),
        });
        log::trace!("Spawned jump {} in front of tree {}", jump_id, tree_id);
    }
}

/// Spawn an NPC skier if the NPC timer has elapsed
pub fn spawn_npcs(world: &mut World, now_ms: f64, tuning: &Tuning) {
    if now_ms - world.last_npc_spawn_ms <= tuning.npc_spawn_interval_ms {
        return;
    }

    let x = random_spawn_x(&mut world.rng, world.canvas.width);
    let pos = Vec2::new(x, world.canvas.spawn_y());
    let id = world.next_npc_id();
    let npc = new_npc(id, pos, &mut world.rng);
    log::trace!("Spawned NPC skier {} (speed {:.0})", id, npc.speed);
    world.npcs.push(npc);
    world.last_npc_spawn_ms = now_ms;
}

/// Scroll trees and ramps up by `dy`, dropping those past the top
pub fn scroll_obstacles(world: &mut World, dy: f32) {
    for tree in &mut world.trees {
        tree.pos.y -= dy;
    }
    world.trees.retain(|t| t.pos.y > CULL_ABOVE_Y);

    for jump in &mut world.jumps {
        jump.pos.y -= dy;
    }
    world.jumps.retain(|j| j.pos.y > CULL_ABOVE_Y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Canvas;

    #[test]
    fn test_speed_tiers() {
        assert_eq!(base_spawn_interval(INITIAL_SPEED), BASE_SPAWN_INTERVAL_MS);
        assert_eq!(base_spawn_interval(SPAWN_SPEED_MEDIUM), SPAWN_INTERVAL_MEDIUM_MS);
        assert_eq!(base_spawn_interval(SPAWN_SPEED_FAST), SPAWN_INTERVAL_FAST_MS);
        assert_eq!(base_spawn_interval(MAX_SPEED), SPAWN_INTERVAL_FAST_MS);
    }

    #[test]
    fn test_level_scaling_compounds_and_floors() {
        let tuning = Tuning::default();
        assert_eq!(level_multiplier(1, &tuning), 1.0);

        let l2 = tree_spawn_interval(INITIAL_SPEED, 2, &tuning);
        let l3 = tree_spawn_interval(INITIAL_SPEED, 3, &tuning);
        assert!(l2 < BASE_SPAWN_INTERVAL_MS);
        assert!(l3 < l2);
        let expected = BASE_SPAWN_INTERVAL_MS / (tuning.level_density_multiplier as f64).powi(2);
        assert!((l3 - expected).abs() < 1e-6);

        assert_eq!(
            tree_spawn_interval(INITIAL_SPEED, 200, &tuning),
            tuning.min_spawn_interval_ms
        );
    }

    #[test]
    fn test_interval_reduction_knob() {
        let tuning = Tuning {
            level_spawn_interval_reduction: 0.5,
            level_density_multiplier: 1.0,
            ..Tuning::default()
        };
        assert!((level_multiplier(3, &tuning) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_tree_spawn_timer_and_placement() {
        let tuning = Tuning {
            jump_spawn_chance: 1.0,
            ..Tuning::default()
        };
        let mut world = World::new(11, Canvas::new(600.0, 800.0), 0);

        spawn_trees(&mut world, 1000.0, &tuning);
        assert_eq!(world.trees.len(), 1);
        let tree = world.trees[0].clone();
        assert!(tree.pos.x >= TREE_SPAWN_MARGIN_X && tree.pos.x < 600.0 - TREE_SPAWN_MARGIN_X);
        assert_eq!(tree.pos.y, 850.0);

        // Ramp sits in front of its tree
        assert_eq!(world.jumps.len(), 1);
        assert_eq!(world.jumps[0].tree_id, Some(tree.id));
        assert_eq!(world.jumps[0].pos, Vec2::new(tree.pos.x, tree.pos.y - JUMP_TREE_OFFSET));

        // Too soon for another
        spawn_trees(&mut world, 1100.0, &tuning);
        assert_eq!(world.trees.len(), 1);

        spawn_trees(&mut world, 1000.0 + BASE_SPAWN_INTERVAL_MS + 1.0, &tuning);
        assert_eq!(world.trees.len(), 2);
        assert_ne!(world.trees[0].id, world.trees[1].id);
    }

    #[test]
    fn test_no_jumps_when_chance_zero() {
        let tuning = Tuning {
            jump_spawn_chance: 0.0,
            ..Tuning::default()
        };
        let mut world = World::new(3, Canvas::default(), 0);
        for i in 1..20 {
            spawn_trees(&mut world, i as f64 * 1000.0, &tuning);
        }
        assert_eq!(world.trees.len(), 19);
        assert!(world.jumps.is_empty());
    }

    #[test]
    fn test_tree_cap_suppresses_spawning() {
        let tuning = Tuning {
            max_trees: Some(2),
            ..Tuning::default()
        };
        let mut world = World::new(3, Canvas::default(), 0);
        for i in 1..10 {
            spawn_trees(&mut world, i as f64 * 1000.0, &tuning);
        }
        assert_eq!(world.trees.len(), 2);
    }

    #[test]
    fn test_npc_spawn_interval() {
        let tuning = Tuning::default();
        let mut world = World::new(3, Canvas::default(), 0);
        world.last_npc_spawn_ms = 1000.0;

        spawn_npcs(&mut world, 1000.0 + tuning.npc_spawn_interval_ms, &tuning);
        assert!(world.npcs.is_empty());

        spawn_npcs(&mut world, 1001.0 + tuning.npc_spawn_interval_ms, &tuning);
        assert_eq!(world.npcs.len(), 1);
        assert_eq!(world.npcs[0].pos.y, world.canvas.spawn_y());
    }

    #[test]
    fn test_scroll_culls_in_order() {
        let mut world = World::new(3, Canvas::default(), 0);
        for (id, y) in [(0, -95.0), (1, 300.0), (2, 500.0)] {
            world.trees.push(Tree {
                id,
                pos: Vec2::new(100.0, y),
            });
        }
        scroll_obstacles(&mut world, 10.0);
        let ids: Vec<u32> = world.trees.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(world.trees[0].pos.y, 290.0);
    }
}
