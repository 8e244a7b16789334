//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time enters only through `FrameInput` timestamps
//! - Seeded RNG only (owned by `World`)
//! - Stable iteration order (entities kept in spawn order)

pub mod collision;
pub mod npc;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionKind, Rect, avalanche_caught, collides, find_collision};
pub use state::{
    Canvas, GamePhase, Heading, Jump, JumpState, NpcSkier, Skier, TrailPoint, Tree, TurnDirection,
    World,
};
pub use tick::{FrameInput, GameOver, GameOverCause, step};
